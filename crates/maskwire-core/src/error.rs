//! Error taxonomy for message wrap/unwrap
//!
//! Callers need to branch on tampering vs. misaddressing vs. malformed
//! input, so every failure carries its kind explicitly and maps into one of
//! four classes. No error is retried internally; any failure aborts the
//! in-progress operation and leaves the session unusable.

use maskwire_crypto::CodecError;
use maskwire_crypto::mss::MssError;
use thiserror::Error;

/// Coarse classification of a [`MessageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed or truncated input; never indicates tampering by itself
    Format,
    /// Integrity failure; may indicate tampering
    Authentication,
    /// Key material disagreement or a message not addressed to this recipient
    Consistency,
    /// A required resource is spent or unavailable
    Resource,
}

/// Errors from message wrap and unwrap operations.
#[derive(Debug, Error)]
pub enum MessageError {
    /// The message declares a protocol version this build does not speak.
    #[error("message version {found} not supported")]
    UnsupportedVersion {
        /// Version tryte found on the wire
        found: i8,
    },

    /// A one-trit discriminator held a value outside its valid range.
    #[error("bad {field} discriminator: {value}")]
    BadDiscriminator {
        /// Which discriminator field was malformed
        field: &'static str,
        /// The out-of-range value
        value: i8,
    },

    /// A field ran past the end of the buffer or held an impossible value.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A caller-supplied payload buffer cannot hold the decoded payload.
    #[error("payload buffer too small: needed {needed} trits, capacity {capacity}")]
    BufferTooSmall {
        /// Trits the decoded length prefix requires
        needed: usize,
        /// Capacity of the buffer the caller supplied
        capacity: usize,
    },

    /// A Merkle signature failed to verify.
    #[error("bad signature")]
    BadSignature,

    /// A MAC trailer did not match the transcript.
    #[error("bad authentication tag")]
    BadMac,

    /// A session-key encapsulation ciphertext failed to authenticate.
    #[error("bad session-key encapsulation")]
    BadEncapsulation,

    /// Two keyload entries resolved to different session keys.
    #[error("overloaded keyload: recovered session keys disagree")]
    KeyloadOverloaded,

    /// No keyload entry resolved under any available key.
    #[error("irrelevant keyload: message is not addressed to this recipient")]
    KeyloadIrrelevant,

    /// The signing key has no one-time leaves left.
    #[error(transparent)]
    Signer(#[from] MssError),
}

impl MessageError {
    /// Classification for callers that branch on failure kind rather than
    /// the specific error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::UnsupportedVersion { .. }
            | Self::BadDiscriminator { .. }
            | Self::Codec(_)
            | Self::BufferTooSmall { .. } => ErrorClass::Format,
            Self::BadSignature | Self::BadMac | Self::BadEncapsulation => {
                ErrorClass::Authentication
            },
            Self::KeyloadOverloaded | Self::KeyloadIrrelevant => ErrorClass::Consistency,
            Self::Signer(_) => ErrorClass::Resource,
        }
    }
}
