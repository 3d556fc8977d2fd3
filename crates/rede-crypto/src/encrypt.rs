use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit, OsRng, rand_core::RngCore},
};
use anyhow::{Result, anyhow};

const NONCE_LEN: usize = 12;

/// Encrypt and authenticate `plaintext` with AES-256-GCM.
/// Output layout: 12-byte nonce followed by the ciphertext and tag.
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| anyhow!("Encryption failed: {}", e))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Reverse of [`seal`]. Fails on a wrong key or any modified byte.
pub fn open(key: &[u8; 32], sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_LEN {
        return Err(anyhow!("Sealed value too short"));
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| anyhow!("Decryption failed: {}", e))?;

    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_key;

    #[test]
    fn seal_open_roundtrip() {
        let key = generate_key();
        let message = b"{\"id\":\"7\",\"token\":\"Bearer APPTCSS$x$y\"}";

        let sealed = seal(&key, message).unwrap();
        assert_ne!(&sealed[NONCE_LEN..], message);

        assert_eq!(open(&key, &sealed).unwrap(), message);
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = seal(&generate_key(), b"secret").unwrap();
        assert!(open(&generate_key(), &sealed).is_err());
    }

    #[test]
    fn tampering_is_detected() {
        let key = generate_key();
        let mut sealed = seal(&key, b"secret").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(open(&key, &sealed).is_err());
        assert!(open(&key, &sealed[..4]).is_err());
    }
}
