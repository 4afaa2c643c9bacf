//! Merkle-tree one-time signatures over trit digests
//!
//! A key tree of height `h` holds `2^h` Winternitz-style one-time leaves.
//! Signing is stateful: every signature consumes the next leaf, and reusing a
//! leaf would leak key material, so the signer refuses once all leaves are
//! spent. The public key is the 243-trit Merkle root; verification is
//! stateless against that root.
//!
//! A signature is `leaf index (18 trits) || 240 chain segments of 81 trits ||
//! one 243-trit authentication node per tree level`, so its size is a pure
//! function of the tree height — the message layer's size estimator depends
//! on that.

use thiserror::Error;
use zeroize::Zeroizing;

use crate::prng::{Domain, Prng};
use crate::sponge::Transcript;
use crate::trits::{self, Trit};

/// Digest size a signature covers, in trits (78 trytes).
pub const MSS_DIGEST_TRITS: usize = 234;

/// Public root (and tree node) size in trits.
pub const MSS_ROOT_TRITS: usize = 243;

/// Leaf-index field size in trits.
pub const MSS_SKN_TRITS: usize = 18;

const SEGMENT_TRITS: usize = 81;
const CHECKSUM_CHAINS: usize = 6;
const CHAIN_COUNT: usize = MSS_DIGEST_TRITS + CHECKSUM_CHAINS;
const MAX_HEIGHT: usize = 20;

/// Signature size in trits for a tree of the given height.
pub const fn signature_trits(height: usize) -> usize {
    MSS_SKN_TRITS + CHAIN_COUNT * SEGMENT_TRITS + height * MSS_ROOT_TRITS
}

/// Errors from signing operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MssError {
    /// Every one-time leaf of the tree has been used.
    #[error("signing key exhausted: all {leaves} one-time leaves used")]
    Exhausted {
        /// Number of leaves the tree was created with
        leaves: u32,
    },
}

/// A Merkle signing key: seed, precomputed tree, and next-leaf counter.
///
/// The seed is wiped on drop. The tree nodes are public material.
pub struct MssPrivateKey {
    height: usize,
    next_leaf: u32,
    seed: Zeroizing<Vec<Trit>>,
    nodes: Vec<[Trit; MSS_ROOT_TRITS]>,
}

impl MssPrivateKey {
    /// Generate a key tree of `height` from the generator and a name nonce.
    ///
    /// Heights above 20 are clamped; tests and protocol use stay far below.
    pub fn generate(prng: &Prng, height: usize, nonce: &[Trit]) -> Self {
        let height = height.min(MAX_HEIGHT);
        let seed =
            Zeroizing::new(prng.generate_trits(Domain::SignerKey, &[nonce], MSS_ROOT_TRITS));
        let leaves = 1usize << height;

        let mut nodes = vec![[0; MSS_ROOT_TRITS]; 2 * leaves - 1];
        for leaf in 0..leaves {
            nodes[leaves - 1 + leaf] = leaf_public(&seed, leaf as u32);
        }
        for idx in (0..leaves - 1).rev() {
            nodes[idx] = node_hash(&nodes[2 * idx + 1], &nodes[2 * idx + 2]);
        }

        Self { height, next_leaf: 0, seed, nodes }
    }

    /// Tree height this key was created with.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Public root; doubles as the identity bound to this key.
    pub fn root(&self) -> &[Trit] {
        &self.nodes[0]
    }

    /// Index of the leaf the next signature will consume.
    pub fn next_leaf(&self) -> u32 {
        self.next_leaf
    }

    /// One-time signatures still available.
    pub fn remaining_signatures(&self) -> u32 {
        (1u32 << self.height) - self.next_leaf
    }

    /// Size in trits of the signatures this key produces.
    pub fn signature_size(&self) -> usize {
        signature_trits(self.height)
    }

    /// Sign a 234-trit digest into `out`, consuming the next leaf.
    ///
    /// `out` must be exactly [`signature_size`](Self::signature_size) trits.
    pub fn sign(&mut self, digest: &[Trit], out: &mut [Trit]) -> Result<(), MssError> {
        debug_assert_eq!(digest.len(), MSS_DIGEST_TRITS);
        debug_assert_eq!(out.len(), self.signature_size());

        let leaves = 1u32 << self.height;
        if self.next_leaf >= leaves {
            return Err(MssError::Exhausted { leaves });
        }
        let leaf = self.next_leaf;

        trits::encode_int(i64::from(leaf), &mut out[..MSS_SKN_TRITS]);

        let values = chain_values(digest);
        for (chain, &value) in values.iter().enumerate() {
            let mut segment = leaf_secret(&self.seed, leaf, chain as u32);
            for _ in 0..value {
                chain_step(&mut segment);
            }
            let start = MSS_SKN_TRITS + chain * SEGMENT_TRITS;
            out[start..start + SEGMENT_TRITS].copy_from_slice(&segment);
        }

        let mut idx = (leaves - 1 + leaf) as usize;
        let mut start = MSS_SKN_TRITS + CHAIN_COUNT * SEGMENT_TRITS;
        while idx > 0 {
            let sibling = if idx % 2 == 1 { idx + 1 } else { idx - 1 };
            out[start..start + MSS_ROOT_TRITS].copy_from_slice(&self.nodes[sibling]);
            start += MSS_ROOT_TRITS;
            idx = (idx - 1) / 2;
        }

        self.next_leaf += 1;
        Ok(())
    }
}

/// Verify a signature over `digest` against a 243-trit public root.
///
/// The tree height is recovered from the signature length; any malformed
/// shape verifies as false.
pub fn verify(digest: &[Trit], signature: &[Trit], root: &[Trit]) -> bool {
    if digest.len() != MSS_DIGEST_TRITS || root.len() != MSS_ROOT_TRITS {
        return false;
    }
    let base = MSS_SKN_TRITS + CHAIN_COUNT * SEGMENT_TRITS;
    if signature.len() < base || (signature.len() - base) % MSS_ROOT_TRITS != 0 {
        return false;
    }
    let height = (signature.len() - base) / MSS_ROOT_TRITS;
    if height > MAX_HEIGHT {
        return false;
    }

    let leaf = trits::decode_int(&signature[..MSS_SKN_TRITS]);
    if leaf < 0 || leaf >= (1i64 << height) {
        return false;
    }
    let leaf = leaf as u32;

    // Run every chain to its end and recompute the leaf public value
    let values = chain_values(digest);
    let mut transcript = Transcript::new();
    for (chain, &value) in values.iter().enumerate() {
        let start = MSS_SKN_TRITS + chain * SEGMENT_TRITS;
        let mut segment = [0; SEGMENT_TRITS];
        segment.copy_from_slice(&signature[start..start + SEGMENT_TRITS]);
        for _ in value..2 {
            chain_step(&mut segment);
        }
        transcript.absorb(&segment);
    }
    transcript.commit();
    let mut current = [0; MSS_ROOT_TRITS];
    transcript.squeeze_into(&mut current);

    // Walk the authentication path up to the root
    for level in 0..height {
        let start = base + level * MSS_ROOT_TRITS;
        let mut sibling = [0; MSS_ROOT_TRITS];
        sibling.copy_from_slice(&signature[start..start + MSS_ROOT_TRITS]);
        current = if (leaf >> level) & 1 == 0 {
            node_hash(&current, &sibling)
        } else {
            node_hash(&sibling, &current)
        };
    }

    current == root
}

/// Per-chain Winternitz values: one value in `0..=2` per digest trit plus a
/// six-digit base-3 checksum running the opposite direction.
fn chain_values(digest: &[Trit]) -> [u8; CHAIN_COUNT] {
    let mut values = [0u8; CHAIN_COUNT];
    let mut checksum: u32 = 0;
    for (j, &t) in digest.iter().enumerate() {
        let v = (t + 1) as u8;
        values[j] = v;
        checksum += u32::from(2 - v);
    }
    for k in 0..CHECKSUM_CHAINS {
        values[MSS_DIGEST_TRITS + k] = (checksum % 3) as u8;
        checksum /= 3;
    }
    values
}

/// Public value of one leaf: every chain run to its end, hashed together.
/// Must agree with the recomputation in [`verify`].
fn leaf_public(seed: &[Trit], leaf: u32) -> [Trit; MSS_ROOT_TRITS] {
    let mut transcript = Transcript::new();
    for chain in 0..CHAIN_COUNT as u32 {
        let mut segment = leaf_secret(seed, leaf, chain);
        chain_step(&mut segment);
        chain_step(&mut segment);
        transcript.absorb(&segment);
    }
    transcript.commit();
    let mut out = [0; MSS_ROOT_TRITS];
    transcript.squeeze_into(&mut out);
    out
}

fn leaf_secret(seed: &[Trit], leaf: u32, chain: u32) -> [Trit; SEGMENT_TRITS] {
    let mut transcript = Transcript::new();
    transcript.absorb(seed);
    let mut index = [0; 2 * MSS_SKN_TRITS];
    trits::encode_int(i64::from(leaf), &mut index[..MSS_SKN_TRITS]);
    trits::encode_int(i64::from(chain), &mut index[MSS_SKN_TRITS..]);
    transcript.absorb(&index);
    transcript.commit();
    let mut out = [0; SEGMENT_TRITS];
    transcript.squeeze_into(&mut out);
    out
}

fn chain_step(segment: &mut [Trit; SEGMENT_TRITS]) {
    let mut transcript = Transcript::new();
    transcript.absorb(segment);
    transcript.commit();
    transcript.squeeze_into(segment);
}

fn node_hash(left: &[Trit; MSS_ROOT_TRITS], right: &[Trit; MSS_ROOT_TRITS]) -> [Trit; MSS_ROOT_TRITS] {
    let mut transcript = Transcript::new();
    transcript.absorb(left);
    transcript.absorb(right);
    transcript.commit();
    let mut out = [0; MSS_ROOT_TRITS];
    transcript.squeeze_into(&mut out);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::trits::trits_from_str;

    use super::*;

    fn test_key(height: usize) -> MssPrivateKey {
        let key = trits_from_str(
            "SENDERPRNGKEYASENDERPRNGKEYSENDERPRNGKEYASENDERPRNGKEYSENDERPRNGKEYASENDERPRNGKEY",
        )
        .unwrap();
        let prng = Prng::new(&key);
        let nonce = trits_from_str("CHANAME").unwrap();
        MssPrivateKey::generate(&prng, height, &nonce)
    }

    fn test_digest(fill: Trit) -> Vec<Trit> {
        (0..MSS_DIGEST_TRITS)
            .map(|i| if i % 7 == 0 { fill } else { (i % 3) as Trit - 1 })
            .collect()
    }

    #[test]
    fn sign_verify_roundtrip() {
        let mut key = test_key(1);
        let digest = test_digest(1);
        let mut sig = vec![0; key.signature_size()];
        key.sign(&digest, &mut sig).unwrap();

        assert!(verify(&digest, &sig, key.root()));
        assert_eq!(key.next_leaf(), 1);
    }

    #[test]
    fn every_leaf_verifies() {
        let mut key = test_key(2);
        let digest = test_digest(0);
        for _ in 0..4 {
            let mut sig = vec![0; key.signature_size()];
            key.sign(&digest, &mut sig).unwrap();
            assert!(verify(&digest, &sig, key.root()));
        }
        let mut sig = vec![0; key.signature_size()];
        assert_eq!(key.sign(&digest, &mut sig), Err(MssError::Exhausted { leaves: 4 }));
    }

    #[test]
    fn wrong_digest_fails() {
        let mut key = test_key(1);
        let digest = test_digest(1);
        let mut sig = vec![0; key.signature_size()];
        key.sign(&digest, &mut sig).unwrap();

        assert!(!verify(&test_digest(-1), &sig, key.root()));
    }

    #[test]
    fn tampered_signature_fails() {
        let mut key = test_key(1);
        let digest = test_digest(1);
        let mut sig = vec![0; key.signature_size()];
        key.sign(&digest, &mut sig).unwrap();

        sig[MSS_SKN_TRITS + 40] = crate::trits::add(sig[MSS_SKN_TRITS + 40], 1);
        assert!(!verify(&digest, &sig, key.root()));
    }

    #[test]
    fn wrong_root_fails() {
        let mut key = test_key(1);
        let other = test_key(1);
        let digest = test_digest(1);
        let mut sig = vec![0; key.signature_size()];
        key.sign(&digest, &mut sig).unwrap();

        // One flipped trit in the root must be enough to reject
        let mut wrong = other.root().to_vec();
        wrong[0] = crate::trits::add(wrong[0], 1);
        assert!(!verify(&digest, &sig, &wrong));
    }

    #[test]
    fn signature_size_formula() {
        assert_eq!(signature_trits(0), 18 + 240 * 81);
        assert_eq!(signature_trits(1), 18 + 240 * 81 + 243);
        assert_eq!(test_key(1).signature_size(), signature_trits(1));
        assert_eq!(signature_trits(1) % 3, 0);
    }

    #[test]
    fn malformed_signature_shapes_fail() {
        let key = test_key(1);
        let digest = test_digest(1);
        assert!(!verify(&digest, &[0; 100], key.root()));
        assert!(!verify(&digest[..10], &[0; 100], key.root()));
    }
}
