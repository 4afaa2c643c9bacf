//! Message header: version, channel binding, sender identity, type tag
//!
//! The header pins the message to its channel and announces who is speaking.
//! The channel identifier and message identifier are external fields: both
//! sides know them out of band, so they shape the transcript without taking
//! wire space. The sender identity is one of four shapes; the two delegate
//! shapes carry a fresh identity signed by the channel's root key, and a
//! verified delegate replaces the key later packet signatures check against.

use maskwire_crypto::codec::{self, CodecError, TritReader, TritWriter};
use maskwire_crypto::{Transcript, Trit};

use crate::error::MessageError;
use crate::identity::{Channel, Endpoint, IDENTITY_TRITS};
use crate::message::seal;

/// Wire protocol version carried in every header.
pub const MESSAGE_VERSION: i8 = 0;

/// Sender identity shape, wrap side.
pub enum SenderIdentity<'a> {
    /// Speak as the channel itself; no identity payload.
    Channel,
    /// Speak as a known endpoint; its identifier travels unsigned.
    Endpoint(&'a Endpoint),
    /// Announce a successor channel, signed by the current channel key.
    DelegateChannel(&'a Channel),
    /// Announce an endpoint, signed by the channel key.
    DelegateEndpoint(&'a Endpoint),
}

impl SenderIdentity<'_> {
    pub(crate) fn tag(&self) -> i8 {
        match self {
            Self::Channel => 0,
            Self::Endpoint(_) => 1,
            Self::DelegateChannel(_) => 2,
            Self::DelegateEndpoint(_) => 3,
        }
    }

    pub(crate) fn kind(&self) -> IdentityKind {
        match self {
            Self::Channel => IdentityKind::Channel,
            Self::Endpoint(_) => IdentityKind::Endpoint,
            Self::DelegateChannel(_) => IdentityKind::DelegateChannel,
            Self::DelegateEndpoint(_) => IdentityKind::DelegateEndpoint,
        }
    }
}

/// Sender identity shape recovered from a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    /// The channel spoke directly.
    Channel,
    /// A known endpoint spoke; its identifier was not signed.
    Endpoint,
    /// A successor channel identity, verified against the channel key.
    DelegateChannel,
    /// An endpoint identity, verified against the channel key.
    DelegateEndpoint,
}

/// Wrap the header for a message sent on `channel`.
///
/// Delegate identities consume one of the channel key's one-time signatures.
pub fn wrap_header(
    transcript: &mut Transcript,
    writer: &mut TritWriter<'_>,
    channel: &mut Channel,
    identity: &SenderIdentity<'_>,
    message_id: &[Trit],
    message_type: i16,
) -> Result<(), MessageError> {
    codec::wrap_absorb_tryte(transcript, writer, MESSAGE_VERSION)?;

    let mut channel_id = [0 as Trit; IDENTITY_TRITS];
    channel_id.copy_from_slice(channel.id());
    codec::absorb_external(transcript, &channel_id);

    codec::wrap_absorb_tryte(transcript, writer, identity.tag())?;
    match identity {
        SenderIdentity::Channel => {},
        SenderIdentity::Endpoint(endpoint) => {
            codec::wrap_absorb_trits(transcript, writer, endpoint.id())?;
        },
        SenderIdentity::DelegateChannel(successor) => {
            codec::wrap_absorb_trits(transcript, writer, successor.id())?;
            seal::wrap_signature(transcript, writer, channel.signer_mut())?;
        },
        SenderIdentity::DelegateEndpoint(endpoint) => {
            codec::wrap_absorb_trits(transcript, writer, endpoint.id())?;
            seal::wrap_signature(transcript, writer, channel.signer_mut())?;
        },
    }

    codec::absorb_external(transcript, message_id);
    codec::wrap_absorb_trint(transcript, writer, message_type)?;
    Ok(())
}

/// Unwrap a header against the expected channel and message identifiers.
///
/// Returns the identity shape, the type tag, and the public key later packet
/// signatures must verify against: the channel identifier for a bare channel,
/// or the (verified, for delegates) identity carried in the header.
pub fn unwrap_header(
    transcript: &mut Transcript,
    reader: &mut TritReader<'_>,
    channel_id: &[Trit],
    message_id: &[Trit],
) -> Result<(IdentityKind, i16, [Trit; IDENTITY_TRITS]), MessageError> {
    if channel_id.len() != IDENTITY_TRITS {
        return Err(CodecError::InvalidValue { field: "channel id" }.into());
    }

    let version = codec::unwrap_absorb_tryte(transcript, reader)?;
    if version != MESSAGE_VERSION {
        return Err(MessageError::UnsupportedVersion { found: version });
    }

    codec::absorb_external(transcript, channel_id);

    let mut trusted = [0 as Trit; IDENTITY_TRITS];
    trusted.copy_from_slice(channel_id);

    let tag = codec::unwrap_absorb_tryte(transcript, reader)?;
    let kind = match tag {
        0 => IdentityKind::Channel,
        1 => {
            codec::unwrap_absorb_trits(transcript, reader, &mut trusted)?;
            IdentityKind::Endpoint
        },
        2 | 3 => {
            let mut announced = [0 as Trit; IDENTITY_TRITS];
            codec::unwrap_absorb_trits(transcript, reader, &mut announced)?;
            seal::unwrap_signature(transcript, reader, channel_id)?;
            trusted = announced;
            if tag == 2 { IdentityKind::DelegateChannel } else { IdentityKind::DelegateEndpoint }
        },
        value => return Err(MessageError::BadDiscriminator { field: "identity", value }),
    };

    codec::absorb_external(transcript, message_id);
    let message_type = codec::unwrap_absorb_trint(transcript, reader)?;
    Ok((kind, message_type, trusted))
}
