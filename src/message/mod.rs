//! Signed message verification

pub mod verifier;

pub use verifier::{sign_message_base64, MessageError, SignatureVerifier};
