//! Signed-message digests and compact recoverable signatures
//!
//! A compact signature is 65 bytes: a header byte `27 + recid (+4 if the
//! signing key is compressed)` followed by the 64-byte `r || s`.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1, SecretKey};

use super::hash::double_sha256;
use super::keys::{KeyError, PubKey};

/// Prefix mixed into every signed-message digest
pub const MESSAGE_MAGIC: &str = "DarkNet Signed Message:\n";

/// Length of a compact recoverable signature
pub const COMPACT_SIGNATURE_SIZE: usize = 65;

/// Append a compact-size length prefix
pub fn write_compact_size(out: &mut Vec<u8>, len: u64) {
    match len {
        0..=0xfc => out.push(len as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(len as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(len as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&len.to_le_bytes());
        }
    }
}

fn write_var_str(out: &mut Vec<u8>, data: &[u8]) {
    write_compact_size(out, data.len() as u64);
    out.extend_from_slice(data);
}

/// Digest signed by `signmessage` and checked by `verifymessage`
pub fn signed_message_hash(message: &[u8]) -> [u8; 32] {
    let mut data = Vec::with_capacity(MESSAGE_MAGIC.len() + message.len() + 10);
    write_var_str(&mut data, MESSAGE_MAGIC.as_bytes());
    write_var_str(&mut data, message);
    double_sha256(&data)
}

/// Sign a message, producing a compact recoverable signature
pub fn sign_message(
    secret_key: &SecretKey,
    compressed: bool,
    message: &[u8],
) -> Result<[u8; COMPACT_SIGNATURE_SIZE], KeyError> {
    let digest = signed_message_hash(message);
    let msg = Message::from_digest_slice(&digest)?;
    let secp = Secp256k1::signing_only();
    let sig: RecoverableSignature = secp.sign_ecdsa_recoverable(&msg, secret_key);
    let (rec_id, sig_bytes) = sig.serialize_compact();

    let mut out = [0u8; COMPACT_SIGNATURE_SIZE];
    out[0] = 27 + rec_id.to_i32() as u8 + if compressed { 4 } else { 0 };
    out[1..].copy_from_slice(&sig_bytes);
    Ok(out)
}

/// Recover the signing key from a compact signature over `digest`
///
/// The recovered key is serialized compressed or uncompressed according to
/// the header byte, so its HASH160 matches the signer's address.
pub fn recover_compact(digest: &[u8; 32], signature: &[u8]) -> Result<PubKey, KeyError> {
    if signature.len() != COMPACT_SIGNATURE_SIZE {
        return Err(KeyError::InvalidSignature);
    }
    let header = signature[0];
    if !(27..=34).contains(&header) {
        return Err(KeyError::InvalidSignature);
    }
    let compressed = header >= 31;
    let rec_id = RecoveryId::from_i32(i32::from((header - 27) & 3))?;

    let sig = RecoverableSignature::from_compact(&signature[1..], rec_id)?;
    let msg = Message::from_digest_slice(digest)?;
    let secp = Secp256k1::verification_only();
    let public_key = secp.recover_ecdsa(&msg, &sig)?;
    Ok(PubKey::from_public_key(&public_key, compressed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_compact_size_encoding() {
        let mut out = Vec::new();
        write_compact_size(&mut out, 0xfc);
        assert_eq!(out, vec![0xfc]);

        out.clear();
        write_compact_size(&mut out, 0xfd);
        assert_eq!(out, vec![0xfd, 0xfd, 0x00]);

        out.clear();
        write_compact_size(&mut out, 0x1_0000);
        assert_eq!(out, vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_digest_depends_on_message() {
        assert_ne!(signed_message_hash(b"a"), signed_message_hash(b"b"));
        assert_eq!(signed_message_hash(b"a"), signed_message_hash(b"a"));
    }

    #[test]
    fn test_sign_and_recover() {
        for compressed in [true, false] {
            let secret = SecretKey::from_slice(&[9u8; 32]).unwrap();
            let kp = KeyPair::from_secret_key(secret, compressed);
            let sig = sign_message(&secret, compressed, b"hello").unwrap();

            let recovered = recover_compact(&signed_message_hash(b"hello"), &sig).unwrap();
            assert_eq!(recovered, kp.pubkey());
            assert_eq!(recovered.is_compressed(), compressed);
        }
    }

    #[test]
    fn test_recover_rejects_bad_header() {
        let secret = SecretKey::from_slice(&[9u8; 32]).unwrap();
        let mut sig = sign_message(&secret, true, b"hello").unwrap();
        sig[0] = 0;
        assert!(recover_compact(&signed_message_hash(b"hello"), &sig).is_err());
        assert!(recover_compact(&signed_message_hash(b"hello"), &sig[..64]).is_err());
    }
}
