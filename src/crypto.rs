use std::fmt::{self, Debug};

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower_cookies::Key;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const NONCE_LEN: usize = 12;
const HMAC_KEY_LEN: usize = 64;

/// Signing and encryption facility consumed by the session codec.
///
/// Signatures must never contain `-`: the codec splits the signed payload at the first one.
pub trait CookieCrypto: Debug + Clone + Send + Sync + 'static {
    fn sign(&self, data: &str) -> String;

    fn verify(&self, data: &str, signature: &str) -> bool {
        self.sign(data) == signature
    }

    fn encrypt(&self, data: &str) -> Result<String>;

    fn decrypt(&self, data: &str) -> Result<String>;
}

/// HMAC-SHA256 signatures and AES-256-GCM encryption derived from a cookie [`Key`].
#[derive(Clone)]
pub struct KeyCrypto {
    mac: HmacSha256,
    cipher: Aes256Gcm,
}

impl KeyCrypto {
    pub fn new(key: &Key) -> Self {
        // HMAC zero-pads short keys to the block size, so the padded key yields the same MAC.
        let mut block = [0u8; HMAC_KEY_LEN];
        for (dst, src) in block.iter_mut().zip(key.signing()) {
            *dst = *src;
        }
        let mac = <HmacSha256 as KeyInit>::new(&block.into());
        let cipher = Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(key.encryption()));
        Self { mac, cipher }
    }
}

impl From<Key> for KeyCrypto {
    fn from(key: Key) -> Self {
        Self::new(&key)
    }
}

impl Debug for KeyCrypto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyCrypto").finish_non_exhaustive()
    }
}

impl CookieCrypto for KeyCrypto {
    fn sign(&self, data: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(data.as_bytes());
        STANDARD_NO_PAD.encode(mac.finalize().into_bytes())
    }

    fn verify(&self, data: &str, signature: &str) -> bool {
        let Ok(expected) = STANDARD_NO_PAD.decode(signature) else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(data.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }

    fn encrypt(&self, data: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, data.as_bytes())
            .map_err(|_| Error::Encrypt)?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&ciphertext);
        Ok(STANDARD_NO_PAD.encode(combined))
    }

    fn decrypt(&self, data: &str) -> Result<String> {
        let combined = STANDARD_NO_PAD
            .decode(data)
            .map_err(|err| Error::Decrypt(err.to_string()))?;
        if combined.len() < NONCE_LEN {
            return Err(Error::Decrypt("ciphertext is too short".into()));
        }

        let (nonce, ciphertext) = combined.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::Decrypt("authentication failed".into()))?;
        String::from_utf8(plaintext).map_err(|err| Error::Decrypt(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_never_contains_hyphen() {
        let crypto = KeyCrypto::new(&Key::generate());
        for data in ["", "a\u{1}1", "user\u{1}alice\u{0}___TS\u{1}1000"] {
            let signature = crypto.sign(data);
            assert!(!signature.contains('-'));
            assert!(crypto.verify(data, &signature));
        }
    }

    #[test]
    fn padded_signing_key_matches_plain_hmac() {
        let key = Key::generate();
        let crypto = KeyCrypto::new(&key);

        let mut mac = <HmacSha256 as Mac>::new_from_slice(key.signing()).expect("any key length");
        mac.update(b"user\x01alice");
        let expected = STANDARD_NO_PAD.encode(mac.finalize().into_bytes());

        assert_eq!(crypto.sign("user\u{1}alice"), expected);
    }

    #[test]
    fn verify_rejects_other_payloads_and_keys() {
        let crypto = KeyCrypto::new(&Key::generate());
        let other = KeyCrypto::new(&Key::generate());
        let signature = crypto.sign("user\u{1}alice");

        assert!(!crypto.verify("user\u{1}mallory", &signature));
        assert!(!other.verify("user\u{1}alice", &signature));
        assert!(!crypto.verify("user\u{1}alice", "not base64!"));
    }

    #[test]
    fn encrypt_round_trips_and_rejects_tampering() {
        let crypto = KeyCrypto::new(&Key::generate());
        let encrypted = crypto.encrypt("sig-user\u{1}alice").expect("encrypts");

        assert_ne!(encrypted, "sig-user\u{1}alice");
        assert_eq!(
            crypto.decrypt(&encrypted).expect("decrypts"),
            "sig-user\u{1}alice"
        );

        let mut tampered = encrypted.into_bytes();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).expect("still ascii");
        assert!(crypto.decrypt(&tampered).is_err());
        assert!(crypto.decrypt("short").is_err());
    }
}
