//! Test utilities: an in-process key management service.

mod kms;

pub use crate::kms::{MockKms, SignRequest, public_key};
