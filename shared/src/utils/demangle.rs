//! Symbol demangling
//!
//! Backends report kernels by their raw (mangled) symbol name; this wraps
//! the demangler so callers always get something printable back.

use symbolic::common::{Language, Name, NameMangling};
use symbolic::demangle::{Demangle, DemangleOptions};

/// Demangle a raw symbol name.
///
/// Returns the input unchanged if it does not demangle.
pub fn demangle(symbol: &str) -> String {
    let name = Name::new(symbol, NameMangling::Unknown, Language::Unknown);
    name.try_demangle(DemangleOptions::complete()).into_owned()
}
