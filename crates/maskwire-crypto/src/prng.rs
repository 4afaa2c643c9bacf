//! Deterministic keyed trit generator
//!
//! All randomness in the protocol flows through one keyed generator so that
//! wrap output is reproducible from the key and nonces alone. Callers tag
//! every request with a destination to separate the key-derivation domains.

use zeroize::Zeroizing;

use crate::sponge::Transcript;
use crate::trits::{TRITS_PER_TRYTE, Trit, encode_int};

/// Generator key size in trits.
pub const PRNG_KEY_TRITS: usize = 243;

/// Domain tag separating the uses of one generator key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// Session keys and pre-shared key material
    SecretKey,
    /// Merkle signer seeds
    SignerKey,
    /// Public-key encapsulation key pairs and randomness
    Encapsulation,
}

impl Domain {
    fn tag(self) -> i8 {
        match self {
            Self::SecretKey => 0,
            Self::SignerKey => 1,
            Self::Encapsulation => 2,
        }
    }
}

/// Keyed deterministic generator.
pub struct Prng {
    key: Zeroizing<Vec<Trit>>,
}

impl Prng {
    /// Generator from a 243-trit key.
    pub fn new(key: &[Trit]) -> Self {
        debug_assert_eq!(key.len(), PRNG_KEY_TRITS);
        Self { key: Zeroizing::new(key.to_vec()) }
    }

    /// Fill `out` from (key, domain, nonces).
    ///
    /// Same inputs always produce the same output; different domains or
    /// nonces produce unrelated output.
    pub fn generate(&self, domain: Domain, nonces: &[&[Trit]], out: &mut [Trit]) {
        let mut transcript = Transcript::new();
        transcript.absorb(&self.key);
        let mut tag = [0; TRITS_PER_TRYTE];
        encode_int(i64::from(domain.tag()), &mut tag);
        transcript.absorb(&tag);
        for nonce in nonces {
            transcript.absorb(nonce);
        }
        transcript.commit();
        transcript.squeeze_into(out);
    }

    /// Allocate and fill `n` trits; see [`generate`](Self::generate).
    pub fn generate_trits(&self, domain: Domain, nonces: &[&[Trit]], n: usize) -> Vec<Trit> {
        let mut out = vec![0; n];
        self.generate(domain, nonces, &mut out);
        out
    }
}
