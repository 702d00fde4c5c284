//! Qualified names have the shape `namespace::Name`, where the namespace
//! itself may contain dots (`com.example::Widget`).

use ecow::{EcoString, eco_format};

pub const SEPARATOR: &str = "::";

pub fn make_qualified(namespace: &str, name: &str) -> EcoString {
    eco_format!("{namespace}{SEPARATOR}{name}")
}

pub fn is_qualified(name: &str) -> bool {
    name.contains(SEPARATOR)
}

/// Namespace part of a qualified name, `None` for plain names.
pub fn namespace_of(name: &str) -> Option<&str> {
    name.rsplit_once(SEPARATOR).map(|(namespace, _)| namespace)
}

/// The last segment of a possibly qualified name.
pub fn unqualified(name: &str) -> &str {
    name.rsplit_once(SEPARATOR)
        .map_or(name, |(_, unqualified)| unqualified)
}

/// Qualifies `name` with `namespace` unless it already carries one.
pub fn qualify_if_plain(namespace: &str, name: &str) -> EcoString {
    if is_qualified(name) {
        EcoString::from(name)
    } else {
        make_qualified(namespace, name)
    }
}
