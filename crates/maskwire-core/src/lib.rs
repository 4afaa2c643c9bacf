//! Maskwire Message Layer
//!
//! Encapsulation of channel messages over a balanced-trinary wire: a header
//! exchange that binds the channel, announces the sender identity, and
//! encapsulates a session key to pre-shared and public-key recipients,
//! followed by ordered payload packets sealed with a MAC or a Merkle
//! signature.
//!
//! The usual flow:
//!
//! 1. The sender calls [`send_message`] to produce the header wire trits and
//!    a [`SendSession`].
//! 2. Each recipient calls [`recv_message`] with the identifiers it knows out
//!    of band and its key material, obtaining a [`RecvSession`].
//! 3. Payload packets flow through [`SendSession::send_packet`] and
//!    [`RecvSession::recv_packet`], strictly in order.
//!
//! Sessions serialize to fixed trit layouts so either side can persist
//! mid-stream. All failures surface as [`MessageError`], classified by
//! [`MessageError::class`] into format, authentication, consistency, and
//! resource failures.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod identity;
pub mod message;

pub use error::{ErrorClass, MessageError};
pub use identity::{Channel, Endpoint};
pub use message::{
    ChecksumKind, IdentityKind, MessageHeader, PacketSeal, RecvSession, SendSession,
    SenderIdentity, recv_message, send_message,
};
