//! # Canonicalization
//!
//! Signatures are computed over a deterministic serialization of the document
//! so they are reproducible regardless of member ordering. The algorithm is
//! pluggable: hosts that need RDF dataset canonicalization (with their own
//! JSON-LD document loader) implement [`Canonicalize`] themselves.

use serde_json::Value;

use crate::error::{Error, Result};

/// Deterministic byte serialization of a JSON(-LD) document.
pub trait Canonicalize: Send + Sync {
    /// Canonicalize `input`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Canonicalization`] if the input cannot be serialized.
    fn canonicalize(&self, input: &Value) -> Result<Vec<u8>>;
}

impl<T: Canonicalize + ?Sized> Canonicalize for &T {
    fn canonicalize(&self, input: &Value) -> Result<Vec<u8>> {
        (**self).canonicalize(input)
    }
}

/// JSON Canonicalization Scheme ([RFC 8785](https://www.rfc-editor.org/rfc/rfc8785)).
#[derive(Clone, Copy, Debug, Default)]
pub struct Jcs;

impl Canonicalize for Jcs {
    fn canonicalize(&self, input: &Value) -> Result<Vec<u8>> {
        serde_json_canonicalizer::to_vec(input).map_err(|e| Error::Canonicalization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn member_order_ignored() {
        let a = json!({"b": 1, "a": {"d": true, "c": [1, 2]}});
        let b = json!({"a": {"c": [1, 2], "d": true}, "b": 1});
        let ca = Jcs.canonicalize(&a).expect("should canonicalize");
        assert_eq!(ca, Jcs.canonicalize(&b).expect("should canonicalize"));
        assert_eq!(ca, br#"{"a":{"c":[1,2],"d":true},"b":1}"#);
    }
}
