//! Human-readable JSON rendering for the explorer.

use std::fmt::Debug;

use serde::Serialize;

/// Render a value as indented JSON with object keys sorted.
///
/// Falls back to the pretty `Debug` form if the value cannot be serialized.
pub fn pretty<T: Serialize + Debug + ?Sized>(value: &T) -> String {
    serde_json::to_value(value)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|_| format!("{:#?}", value))
}

/// Extension for rendering ledger values as pretty JSON.
pub trait ToPrettyJson {
    /// See [`pretty`].
    fn to_pretty_json(&self) -> String;
}

impl<T: Serialize + Debug + ?Sized> ToPrettyJson for T {
    fn to_pretty_json(&self) -> String {
        pretty(self)
    }
}
