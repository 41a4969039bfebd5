//! # DID Document
//!
//! The subset of a DID document needed to select a signing key. Members not
//! modelled here are preserved in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::Kind;

/// A verification relationship entry: a reference (usually a relative
/// `#fragment`) or an embedded verification method.
pub type Relationship = Kind<Map<String, Value>>;

/// DID Document
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// The context of the DID document.
    #[serde(rename = "@context")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// The DID for the DID subject. Empty for a `did:peer:4` input document.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Other identifiers for the subject of the DID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub also_known_as: Option<Vec<String>>,

    /// Verification methods for the DID subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<Vec<Map<String, Value>>>,

    /// How the DID subject is expected to be authenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Vec<Relationship>>,

    /// How the DID subject is expected to express claims, such as for the
    /// purposes of issuing a Verifiable Credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_method: Option<Vec<Relationship>>,

    /// How an entity can generate encryption material to communicate
    /// confidentially with the DID subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_agreement: Option<Vec<Relationship>>,

    /// Verification method(s) the DID subject can use to invoke a
    /// cryptographic capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_invocation: Option<Vec<Relationship>>,

    /// Verification method(s) the DID subject can use to delegate a
    /// cryptographic capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_delegation: Option<Vec<Relationship>>,

    /// Services for communicating with the DID subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<Value>>,

    /// Members not otherwise modelled.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// The id of the first `assertionMethod` entry: the reference itself, or
    /// the `id` of an embedded method.
    #[must_use]
    pub fn first_assertion_method(&self) -> Option<&str> {
        let first = self.assertion_method.as_ref()?.first()?;
        first.as_str().or_else(|| first.as_object()?.get("id")?.as_str())
    }

    // All embedded verification methods, wherever they appear.
    pub(crate) fn embedded_methods_mut(&mut self) -> impl Iterator<Item = &mut Map<String, Value>> {
        let relationships = [
            &mut self.authentication,
            &mut self.assertion_method,
            &mut self.key_agreement,
            &mut self.capability_invocation,
            &mut self.capability_delegation,
        ];
        let embedded = relationships.into_iter().flatten().flatten().filter_map(|r| match r {
            Kind::Object(vm) => Some(vm),
            Kind::String(_) => None,
        });
        self.verification_method.iter_mut().flatten().chain(embedded)
    }
}
