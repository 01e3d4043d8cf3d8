use cipher::{KeyIvInit, StreamCipher};
use digest::Mac;
use paseto_core::PasetoError;
use paseto_core::key::{KeyHandle, KeyPair, KeyUsage};
use paseto_core::pae::{WriteBytes, pre_auth_encode};
use paseto_core::version::{Algorithm, AlgorithmParams, Engine};
use zeroize::Zeroizing;

type HmacSha384 = hmac::Hmac<sha2::Sha384>;
type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

pub const PARAMS: AlgorithmParams = AlgorithmParams::AesCtrHmac {
    key_len: 32,
    nonce_len: 32,
    tag_len: 48,
};

#[derive(Clone)]
pub struct LocalKey(Zeroizing<[u8; 32]>);

impl LocalKey {
    pub fn as_raw_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_raw_bytes(b: [u8; 32]) -> Self {
        Self(Zeroizing::new(b))
    }

    /// Derive the encryption cipher and authentication MAC for one nonce.
    fn keys(&self, nonce: &[u8; 32]) -> Result<(Aes256Ctr, HmacSha384), PasetoError> {
        let (salt, iv) = nonce.split_at(16);

        let ek = kdf(&self.0[..], b"paseto-encryption-key", salt)?;
        let ak = kdf(&self.0[..], b"paseto-auth-key-for-aead", salt)?;

        let cipher = Aes256Ctr::new_from_slices(&ek[..], iv).map_err(|_| PasetoError::Crypto)?;
        let mac = HmacSha384::new_from_slice(&ak[..]).map_err(|_| PasetoError::Crypto)?;
        Ok((cipher, mac))
    }
}

/// AES-256-CTR then HMAC-SHA-384, keys split with HKDF-SHA-384.
pub struct AesCtrHmac;

impl AesCtrHmac {
    /// Encrypt with caller-provided randomness. Reusing `random` leaks whether
    /// two plaintexts are equal.
    pub(crate) fn dangerous_encrypt_with_nonce(
        key: &LocalKey,
        random: &[u8; 32],
        header: &str,
        plaintext: &[u8],
        footer: &[u8],
    ) -> Result<Vec<u8>, PasetoError> {
        let mut n = HmacSha384::new_from_slice(random).map_err(|_| PasetoError::Crypto)?;
        n.update(plaintext);
        let mut nonce = [0; 32];
        nonce.copy_from_slice(&n.finalize().into_bytes()[..32]);

        let mut body = Vec::with_capacity(32 + plaintext.len() + 48);
        body.extend_from_slice(&nonce);
        body.extend_from_slice(plaintext);

        let (mut cipher, mut mac) = key.keys(&nonce)?;
        cipher.apply_keystream(&mut body[32..]);
        preauth_local(&mut mac, header, &nonce, &body[32..], footer);
        body.extend_from_slice(&mac.finalize().into_bytes());

        Ok(body)
    }
}

impl Engine for AesCtrHmac {
    fn generate(&self, params: &AlgorithmParams) -> Result<KeyPair, PasetoError> {
        check_params(params)?;

        let mut bytes = Zeroizing::new([0; 32]);
        getrandom::fill(&mut bytes[..]).map_err(|err| {
            tracing::warn!(%err, "os randomness unavailable");
            PasetoError::Crypto
        })?;
        Ok(pair(LocalKey(bytes)))
    }

    fn import(
        &self,
        params: &AlgorithmParams,
        usage: KeyUsage,
        bytes: &[u8],
    ) -> Result<KeyPair, PasetoError> {
        check_params(params)?;
        if usage != KeyUsage::Local {
            return Err(PasetoError::KeyPurpose);
        }

        let bytes: [u8; 32] = bytes.try_into().map_err(|_| PasetoError::InvalidKey)?;
        Ok(pair(LocalKey::from_raw_bytes(bytes)))
    }

    fn export(&self, key: &KeyHandle) -> Result<Box<[u8]>, PasetoError> {
        Ok(key.material::<LocalKey>()?.as_raw_bytes()[..].into())
    }

    fn encrypt(
        &self,
        key: &KeyHandle,
        header: &str,
        plaintext: &[u8],
        footer: &[u8],
    ) -> Result<Vec<u8>, PasetoError> {
        let key = key.material::<LocalKey>()?;

        let mut random = Zeroizing::new([0; 32]);
        getrandom::fill(&mut random[..]).map_err(|_| PasetoError::Crypto)?;

        Self::dangerous_encrypt_with_nonce(key, &random, header, plaintext, footer)
    }

    fn decrypt(
        &self,
        key: &KeyHandle,
        header: &str,
        sealed: &[u8],
        tag: &[u8],
        footer: &[u8],
    ) -> Result<Vec<u8>, PasetoError> {
        let key = key.material::<LocalKey>()?;

        let (nonce, ciphertext) = sealed
            .split_first_chunk::<32>()
            .ok_or(PasetoError::Verification)?;

        let (mut cipher, mut mac) = key.keys(nonce)?;
        preauth_local(&mut mac, header, nonce, ciphertext, footer);
        mac.verify_slice(tag)
            .map_err(|_| PasetoError::Verification)?;

        let mut plaintext = ciphertext.to_vec();
        cipher.apply_keystream(&mut plaintext);
        Ok(plaintext)
    }
}

fn check_params(params: &AlgorithmParams) -> Result<(), PasetoError> {
    match params {
        AlgorithmParams::AesCtrHmac {
            key_len: 32,
            nonce_len: 32,
            tag_len: 48,
        } => Ok(()),
        _ => Err(PasetoError::Unsupported),
    }
}

fn pair(key: LocalKey) -> KeyPair {
    KeyPair::Symmetric(KeyHandle::new(
        KeyUsage::Local,
        Algorithm::Aes256CtrHmacSha384,
        key,
    ))
}

fn kdf(
    key: &[u8],
    info: &'static [u8],
    salt: &[u8],
) -> Result<Zeroizing<[u8; 32]>, PasetoError> {
    let mut output = Zeroizing::new([0; 32]);
    hkdf::Hkdf::<sha2::Sha384>::new(Some(salt), key)
        .expand(info, &mut output[..])
        .map_err(|_| PasetoError::Crypto)?;
    Ok(output)
}

fn preauth_local(
    mac: &mut HmacSha384,
    header: &str,
    nonce: &[u8],
    ciphertext: &[u8],
    footer: &[u8],
) {
    struct Context<'a>(&'a mut HmacSha384);
    impl WriteBytes for Context<'_> {
        fn write(&mut self, slice: &[u8]) {
            self.0.update(slice);
        }
    }

    pre_auth_encode(&[header.as_bytes(), nonce, ciphertext, footer], Context(mac));
}
