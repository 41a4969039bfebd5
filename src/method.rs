//! # DID Method
//!
//! Descriptor for the DID method registered with the host agent. DIDs of this
//! method are supplied by the holder (the KMS-backed key already exists) and
//! their keys are never rotated by the agent.

use serde::{Deserialize, Serialize};

use crate::kms::KeyAlgorithm;

/// Whether a DID method requires the holder to supply the DID.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HolderDefinedDid {
    /// The agent derives the DID.
    #[default]
    No,

    /// The holder may supply the DID.
    Allowed,

    /// The holder must supply the DID.
    Required,
}

/// A DID method the host agent may create DIDs for.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DidMethod {
    /// Method name token, as in `did:<name>:...`.
    pub name: String,

    /// Key types usable with the method.
    pub key_types: Vec<KeyAlgorithm>,

    /// Whether keys may be rotated.
    pub rotation: bool,

    /// Whether the DID is supplied by the holder.
    pub holder_defined_did: HolderDefinedDid,
}

/// The `temp` method used for DIDs whose keys live in the KMS.
#[must_use]
pub fn temp() -> DidMethod {
    DidMethod {
        name: "temp".to_string(),
        key_types: vec![KeyAlgorithm::Ed25519],
        rotation: false,
        holder_defined_did: HolderDefinedDid::Required,
    }
}
