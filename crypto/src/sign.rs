//! Ed25519 message signing and verification.

use btcb_types::{Block, PrivateKey, PublicKey, Signature};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};

/// Sign a message with a private key, returning the signature.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    Signature(signing_key.sign(message).to_bytes())
}

/// Verify a signature against a message and public key.
///
/// Returns `true` if the signature is valid, `false` otherwise.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify(message, &dalek_sig).is_ok()
}

/// Sign a block's hash in place.
pub fn sign_block(block: &mut Block, private_key: &PrivateKey) {
    let signature = sign_message(block.hash().as_bytes(), private_key);
    block.set_signature(signature);
}

pub fn verify_block(block: &Block, public_key: &PublicKey) -> bool {
    verify_signature(block.hash().as_bytes(), block.signature(), public_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::keypair_from_seed;
    use btcb_types::{Account, Amount, BlockHash, SendBlock};

    #[test]
    fn sign_and_verify() {
        let kp = keypair_from_seed(&[7u8; 32]);
        let msg = b"test message";
        let sig = sign_message(msg, &kp.private);
        assert!(verify_signature(msg, &sig, &kp.public));
        assert!(!verify_signature(b"other message", &sig, &kp.public));
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = keypair_from_seed(&[1u8; 32]);
        let kp2 = keypair_from_seed(&[2u8; 32]);
        let sig = sign_message(b"test", &kp1.private);
        assert!(!verify_signature(b"test", &sig, &kp2.public));
    }

    #[test]
    fn invalid_public_key() {
        let kp = keypair_from_seed(&[3u8; 32]);
        let sig = sign_message(b"test", &kp.private);
        assert!(!verify_signature(b"test", &sig, &PublicKey([0xFF; 32])));
    }

    #[test]
    fn signed_block_verifies_and_keeps_hash() {
        let kp = keypair_from_seed(&[9u8; 32]);
        let mut block: Block =
            SendBlock::new(BlockHash::from_u64(1), Account::from_u64(2), Amount::new(3), 4).into();
        let hash = block.hash();
        sign_block(&mut block, &kp.private);
        assert_eq!(block.hash(), hash);
        assert!(verify_block(&block, &kp.public));
        block.set_work(5);
        assert!(verify_block(&block, &kp.public));
    }
}
