//! Public-key session-key encapsulation
//!
//! Fixed-shape trinary KEM used by the keyload engine: a 3072-tryte public
//! key whose first 27 trytes are the recipient identifier, and a 3072-tryte
//! ciphertext carrying one 81-tryte session key. The construction here is a
//! sponge-based encapsulation behind the same narrow interface a lattice
//! scheme would present; the message layer depends only on the interface and
//! the wire shapes.

use std::collections::HashMap;

use thiserror::Error;
use zeroize::Zeroizing;

use crate::prng::{Domain, Prng};
use crate::sponge::Transcript;
use crate::trits::{self, Trit};

/// Public key size in trits (3072 trytes).
pub const PKE_PUBLIC_KEY_TRITS: usize = 9216;

/// Recipient identifier size in trits: the leading 27 trytes of the key.
pub const PKE_ID_TRITS: usize = 81;

/// Ciphertext size in trits; same shape as the public key.
pub const PKE_CIPHERTEXT_TRITS: usize = 9216;

/// Encapsulated session-key size in trits (81 trytes).
pub const PKE_KEY_TRITS: usize = 243;

const SECRET_TRITS: usize = 243;
const BLIND_TRITS: usize = 243;

/// Decryption failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PkeError {
    /// The ciphertext did not authenticate under this key pair.
    #[error("encapsulation ciphertext failed to authenticate")]
    BadCiphertext,
}

/// Recipient public key (encrypt side).
#[derive(Clone, PartialEq, Eq)]
pub struct PkePublicKey {
    trits: Vec<Trit>,
}

impl PkePublicKey {
    /// Build a key from its wire trits; `None` on wrong length.
    pub fn from_trits(trits: Vec<Trit>) -> Option<Self> {
        (trits.len() == PKE_PUBLIC_KEY_TRITS).then_some(Self { trits })
    }

    /// Recipient identifier: the leading 27 trytes.
    pub fn id(&self) -> &[Trit] {
        &self.trits[..PKE_ID_TRITS]
    }

    /// Full key material.
    pub fn as_trits(&self) -> &[Trit] {
        &self.trits
    }
}

/// Recipient key pair (decrypt side). The secret is wiped on drop.
pub struct PkeSecretKey {
    #[allow(dead_code)]
    secret: Zeroizing<Vec<Trit>>,
    public: PkePublicKey,
}

impl PkeSecretKey {
    /// Generate a key pair from the generator and a nonce.
    pub fn generate(prng: &Prng, nonce: &[Trit]) -> Self {
        let secret =
            Zeroizing::new(prng.generate_trits(Domain::Encapsulation, &[nonce], SECRET_TRITS));
        let public = expand_public(&secret);
        Self { secret, public }
    }

    /// Public half, shared with senders.
    pub fn public_key(&self) -> &PkePublicKey {
        &self.public
    }
}

/// Encapsulate `key` to `public_key` using caller-supplied randomness.
///
/// Deterministic in (key, public key, prng, nonce); always produces a
/// [`PKE_CIPHERTEXT_TRITS`]-trit ciphertext.
pub fn encrypt(public_key: &PkePublicKey, prng: &Prng, nonce: &[Trit], key: &[Trit]) -> Vec<Trit> {
    debug_assert_eq!(key.len(), PKE_KEY_TRITS);

    let blind = prng.generate_trits(Domain::Encapsulation, &[nonce, public_key.id()], BLIND_TRITS);

    let mut out = vec![0; PKE_CIPHERTEXT_TRITS];
    out[..BLIND_TRITS].copy_from_slice(&blind);

    let mut transcript = Transcript::new();
    transcript.absorb(public_key.as_trits());
    transcript.absorb(&blind);
    transcript.commit();

    let mut mask = Zeroizing::new(vec![0 as Trit; PKE_KEY_TRITS]);
    transcript.squeeze_into(&mut mask);
    for i in 0..PKE_KEY_TRITS {
        out[BLIND_TRITS + i] = trits::add(key[i], mask[i]);
    }

    transcript.absorb(&out[BLIND_TRITS..BLIND_TRITS + PKE_KEY_TRITS]);
    transcript.commit();
    transcript.squeeze_into(&mut out[BLIND_TRITS + PKE_KEY_TRITS..]);

    out
}

/// Recover the encapsulated key, or fail if the ciphertext was not produced
/// for this key pair.
pub fn decrypt(key_pair: &PkeSecretKey, ciphertext: &[Trit]) -> Result<Zeroizing<Vec<Trit>>, PkeError> {
    if ciphertext.len() != PKE_CIPHERTEXT_TRITS {
        return Err(PkeError::BadCiphertext);
    }

    let blind = &ciphertext[..BLIND_TRITS];
    let masked = &ciphertext[BLIND_TRITS..BLIND_TRITS + PKE_KEY_TRITS];
    let sealed = &ciphertext[BLIND_TRITS + PKE_KEY_TRITS..];

    let mut transcript = Transcript::new();
    transcript.absorb(key_pair.public.as_trits());
    transcript.absorb(blind);
    transcript.commit();

    let mut mask = Zeroizing::new(vec![0 as Trit; PKE_KEY_TRITS]);
    transcript.squeeze_into(&mut mask);
    let mut key = Zeroizing::new(vec![0; PKE_KEY_TRITS]);
    for i in 0..PKE_KEY_TRITS {
        key[i] = trits::sub(masked[i], mask[i]);
    }

    transcript.absorb(masked);
    transcript.commit();
    let mut expected = vec![0; PKE_CIPHERTEXT_TRITS - BLIND_TRITS - PKE_KEY_TRITS];
    transcript.squeeze_into(&mut expected);
    if expected.as_slice() != sealed {
        return Err(PkeError::BadCiphertext);
    }

    Ok(key)
}

/// Caller-owned set of recipient public keys, looked up by identifier.
#[derive(Default)]
pub struct PkePublicSet {
    entries: HashMap<[Trit; PKE_ID_TRITS], PkePublicKey>,
}

impl PkePublicSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key, replacing any previous entry with the same identifier.
    pub fn insert(&mut self, key: PkePublicKey) {
        if let Ok(id) = <[Trit; PKE_ID_TRITS]>::try_from(key.id()) {
            self.entries.insert(id, key);
        }
    }

    /// Number of keys in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the set holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the keys in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &PkePublicKey> {
        self.entries.values()
    }
}

/// Caller-owned set of recipient key pairs, looked up by identifier.
#[derive(Default)]
pub struct PkeSecretSet {
    entries: HashMap<[Trit; PKE_ID_TRITS], PkeSecretKey>,
}

impl PkeSecretSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key pair, replacing any previous entry with the same identifier.
    pub fn insert(&mut self, key_pair: PkeSecretKey) {
        if let Ok(id) = <[Trit; PKE_ID_TRITS]>::try_from(key_pair.public.id()) {
            self.entries.insert(id, key_pair);
        }
    }

    /// Look up a key pair by recipient identifier.
    pub fn get(&self, id: &[Trit]) -> Option<&PkeSecretKey> {
        let id: [Trit; PKE_ID_TRITS] = id.try_into().ok()?;
        self.entries.get(&id)
    }

    /// Number of key pairs in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the set holds no key pairs.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn expand_public(secret: &[Trit]) -> PkePublicKey {
    let mut transcript = Transcript::new();
    transcript.absorb(secret);
    transcript.commit();
    let mut trits = vec![0; PKE_PUBLIC_KEY_TRITS];
    transcript.squeeze_into(&mut trits);
    PkePublicKey { trits }
}
