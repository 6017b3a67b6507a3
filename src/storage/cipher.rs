// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AES-256-CBC encryption of the serialized record.
//!
//! Every encryption draws a fresh 16-byte IV from the system CSPRNG. The
//! ciphertext carries PKCS#7 padding, so a 195-byte record encrypts to 208
//! bytes.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use ring::error::Unspecified;
use ring::rand::{SecureRandom, SystemRandom};

use super::error::{StoreError, StoreResult};
use super::kdf::DerivedKey;
use super::record::RECORD_SIZE;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

pub const IV_LEN: usize = 16;
pub const BLOCK_LEN: usize = 16;

/// Ciphertext length produced for a record plaintext.
pub const CIPHERTEXT_LEN: usize = (RECORD_SIZE / BLOCK_LEN + 1) * BLOCK_LEN;

/// Output of a single encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
}

/// Source of initialization vectors.
pub trait IvSource {
    fn fill_iv(&self, iv: &mut [u8; IV_LEN]) -> Result<(), Unspecified>;
}

impl IvSource for SystemRandom {
    fn fill_iv(&self, iv: &mut [u8; IV_LEN]) -> Result<(), Unspecified> {
        self.fill(iv)
    }
}

/// Generate a single-use IV.
pub fn generate_iv(rng: &impl IvSource) -> StoreResult<[u8; IV_LEN]> {
    let mut iv = [0u8; IV_LEN];
    rng.fill_iv(&mut iv)
        .map_err(|_| StoreError::Crypto("IV generation failed".into()))?;
    Ok(iv)
}

/// Encrypt a serialized record under `key` with a fresh IV.
pub fn encrypt(plaintext: &[u8; RECORD_SIZE], key: &DerivedKey) -> StoreResult<Sealed> {
    encrypt_with(&SystemRandom::new(), plaintext, key)
}

pub(crate) fn encrypt_with(
    rng: &impl IvSource,
    plaintext: &[u8; RECORD_SIZE],
    key: &DerivedKey,
) -> StoreResult<Sealed> {
    let iv = generate_iv(rng)?;
    let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), &iv)
        .map_err(|e| StoreError::Crypto(format!("Encryption init failed: {e}")))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    if ciphertext.len() != CIPHERTEXT_LEN {
        return Err(StoreError::Crypto(format!(
            "Encryption produced {} bytes, expected {CIPHERTEXT_LEN}",
            ciphertext.len()
        )));
    }
    Ok(Sealed { iv, ciphertext })
}

/// Decrypt a record ciphertext.
///
/// Any failure (bad padding, wrong key, unexpected plaintext size) is
/// reported as corruption; nothing is truncated or padded to fit.
pub fn decrypt(
    ciphertext: &[u8],
    iv: &[u8; IV_LEN],
    key: &DerivedKey,
) -> StoreResult<[u8; RECORD_SIZE]> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(StoreError::corruption(format!(
            "ciphertext length {} is not block aligned",
            ciphertext.len()
        )));
    }

    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| StoreError::corruption(format!("Decryption init failed: {e}")))?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| StoreError::corruption("Decryption finalization failed"))?;

    <[u8; RECORD_SIZE]>::try_from(plaintext.as_slice()).map_err(|_| {
        StoreError::corruption(format!(
            "Invalid decrypted data size: {} bytes, expected {RECORD_SIZE}",
            plaintext.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kdf::{derive_key, KdfParams, Secrets};
    use std::num::NonZeroU32;

    fn key(secret: &str) -> DerivedKey {
        derive_key(
            &Secrets::new(secret, "salt"),
            KdfParams::new(NonZeroU32::new(1000).unwrap()),
        )
    }

    fn plaintext() -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = (i % 251) as u8;
        }
        buf
    }

    struct FailingRng;

    impl IvSource for FailingRng {
        fn fill_iv(&self, _iv: &mut [u8; IV_LEN]) -> Result<(), Unspecified> {
            Err(Unspecified)
        }
    }

    #[test]
    fn ciphertext_length_is_block_aligned() {
        assert_eq!(CIPHERTEXT_LEN, 208);
        let sealed = encrypt(&plaintext(), &key("k")).unwrap();
        assert_eq!(sealed.ciphertext.len(), CIPHERTEXT_LEN);
    }

    #[test]
    fn round_trip() {
        let key = key("k");
        let sealed = encrypt(&plaintext(), &key).unwrap();
        let opened = decrypt(&sealed.ciphertext, &sealed.iv, &key).unwrap();
        assert_eq!(opened, plaintext());
    }

    #[test]
    fn fresh_iv_per_encryption() {
        let key = key("k");
        let mut seen = std::collections::HashSet::new();
        for _ in 0..256 {
            let sealed = encrypt(&plaintext(), &key).unwrap();
            assert!(seen.insert(sealed.iv), "IV reused");
        }
    }

    #[test]
    fn same_plaintext_encrypts_differently() {
        let key = key("k");
        let a = encrypt(&plaintext(), &key).unwrap();
        let b = encrypt(&plaintext(), &key).unwrap();
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn wrong_key_is_not_silently_accepted() {
        let sealed = encrypt(&plaintext(), &key("k")).unwrap();
        match decrypt(&sealed.ciphertext, &sealed.iv, &key("other")) {
            Err(StoreError::Corruption(_)) => {}
            Ok(opened) => assert_ne!(opened, plaintext()),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn misaligned_ciphertext_is_corruption() {
        let key = key("k");
        let sealed = encrypt(&plaintext(), &key).unwrap();
        let err = decrypt(&sealed.ciphertext[..200], &sealed.iv, &key).unwrap_err();
        assert!(matches!(err, StoreError::Corruption(_)));

        let err = decrypt(&[], &sealed.iv, &key).unwrap_err();
        assert!(matches!(err, StoreError::Corruption(_)));
    }

    #[test]
    fn short_plaintext_is_size_mismatch() {
        let key = key("k");
        let iv = [7u8; IV_LEN];
        let short = Aes256CbcEnc::new_from_slices(key.as_bytes(), &iv)
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(&[1u8; 40]);
        let err = decrypt(&short, &iv, &key).unwrap_err();
        assert!(matches!(err, StoreError::Corruption(ref m) if m.contains("decrypted data size")));
    }

    #[test]
    fn rng_failure_aborts_encryption() {
        let err = encrypt_with(&FailingRng, &plaintext(), &key("k")).unwrap_err();
        assert!(matches!(err, StoreError::Crypto(ref m) if m == "IV generation failed"));
    }
}
