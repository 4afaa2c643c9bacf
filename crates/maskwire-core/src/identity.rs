//! Channels and endpoints: the two identity roles a sender can hold
//!
//! A channel owns the root signing key its subscribers trust; endpoints are
//! per-sender sub-identities keyed under the channel's name. Both are thin
//! wrappers over a Merkle signing key, and both expose their public root as
//! the 243-trit identity other parties see.

use maskwire_crypto::mss::MSS_ROOT_TRITS;
use maskwire_crypto::{MssPrivateKey, Prng, Trit};

/// Size of a channel or endpoint identity in trits.
pub const IDENTITY_TRITS: usize = MSS_ROOT_TRITS;

/// Size of a message identifier in trits (27 trytes).
pub const MESSAGE_ID_TRITS: usize = 81;

/// A channel: the root identity of a message stream.
///
/// The channel identifier is the public root of its signing key, so
/// possession of the key is what it means to own the channel.
pub struct Channel {
    name: Vec<Trit>,
    key: MssPrivateKey,
}

impl Channel {
    /// Create a channel with a signing tree of `height` (2^height one-time
    /// signatures), keyed from the generator and the channel name.
    pub fn new(prng: &Prng, height: usize, name: &[Trit]) -> Self {
        let key = MssPrivateKey::generate(prng, height, name);
        Self { name: name.to_vec(), key }
    }

    /// Channel name used as key-derivation context.
    pub fn name(&self) -> &[Trit] {
        &self.name
    }

    /// Public channel identifier: the signing key's Merkle root.
    pub fn id(&self) -> &[Trit] {
        self.key.root()
    }

    /// Signing key, for header signatures and signed packets.
    pub fn signer_mut(&mut self) -> &mut MssPrivateKey {
        &mut self.key
    }

    /// Signing key, read-only.
    pub fn signer(&self) -> &MssPrivateKey {
        &self.key
    }
}

/// An endpoint: a per-sender sub-identity within a channel.
///
/// Endpoint keys are derived under both the channel name and the endpoint
/// name, so distinct endpoints of one channel never share material.
pub struct Endpoint {
    name: Vec<Trit>,
    key: MssPrivateKey,
}

impl Endpoint {
    /// Create an endpoint of `channel` with its own signing tree.
    pub fn new(prng: &Prng, height: usize, channel: &Channel, name: &[Trit]) -> Self {
        let mut nonce = channel.name().to_vec();
        nonce.extend_from_slice(name);
        let key = MssPrivateKey::generate(prng, height, &nonce);
        Self { name: name.to_vec(), key }
    }

    /// Endpoint name used as key-derivation context.
    pub fn name(&self) -> &[Trit] {
        &self.name
    }

    /// Public endpoint identifier: the signing key's Merkle root.
    pub fn id(&self) -> &[Trit] {
        self.key.root()
    }

    /// Signing key, for signed packets sent as this endpoint.
    pub fn signer_mut(&mut self) -> &mut MssPrivateKey {
        &mut self.key
    }

    /// Signing key, read-only.
    pub fn signer(&self) -> &MssPrivateKey {
        &self.key
    }
}
