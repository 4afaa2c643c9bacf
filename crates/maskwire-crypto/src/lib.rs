//! Maskwire Cryptographic Primitives
//!
//! Trinary building blocks consumed by the Maskwire message layer: balanced
//! trits and their field codec, the duplex sponge transcript, a deterministic
//! keyed generator, Merkle-tree one-time signatures, public-key session-key
//! encapsulation, and the caller-owned recipient key stores.
//!
//! Everything here is deterministic given its inputs; callers provide all
//! randomness through [`Prng`] keys, which keeps wrap/unwrap testable
//! trit-for-trit. Secret material (generator keys, signer seeds, pre-shared
//! keys, recovered session keys) is wiped on drop via `zeroize`.
//!
//! The message layer treats these modules as external collaborators with
//! narrow interfaces: the transcript's absorb/commit/squeeze/crypt/fork
//! operations, stateful signing against a public root, encapsulation
//! encrypt/decrypt, and lookup-by-identifier key sets.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod mss;
pub mod pke;
pub mod prng;
pub mod psk;
pub mod sponge;
pub mod trits;

pub use codec::{CodecError, TritReader, TritWriter};
pub use mss::{MssError, MssPrivateKey};
pub use pke::{PkeError, PkePublicKey, PkePublicSet, PkeSecretKey, PkeSecretSet};
pub use prng::{Domain, Prng};
pub use psk::{Psk, PskSet};
pub use sponge::Transcript;
pub use trits::Trit;
