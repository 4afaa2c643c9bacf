//! Message encapsulation: header exchange and payload packets
//!
//! A message stream starts with one header message that binds the channel,
//! announces the sender identity, and encapsulates a session key to the
//! recipients. Both sides leave the header exchange with a session context;
//! payload packets then ride on that context in order.
//!
//! Wire layout is predicted exactly by the [`size`] functions, so senders
//! allocate once and never reallocate mid-wrap.

pub mod context;
pub mod header;
pub mod keyload;
pub mod packet;
pub mod seal;
pub mod size;

use maskwire_crypto::codec::{TritReader, TritWriter};
use maskwire_crypto::trits::{self, TRITS_PER_TRYTE};
use maskwire_crypto::{Domain, PkePublicSet, PkeSecretSet, Prng, PskSet, Transcript, Trit};
use zeroize::Zeroizing;

pub use context::{RecvSession, SendSession};
pub use header::{IdentityKind, MESSAGE_VERSION, SenderIdentity};
pub use packet::{ChecksumKind, PacketSeal};

use crate::error::MessageError;
use crate::identity::{Channel, IDENTITY_TRITS};
use crate::message::keyload::SESSION_KEY_TRITS;

/// What a receiver learns from a header message, beyond the session itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Application-level type tag carried in the header.
    pub message_type: i16,
    /// Identity shape the sender announced.
    pub identity: IdentityKind,
}

/// Wrap a header message on `channel`, returning the wire trits and the send
/// session packets will ride on.
///
/// With no recipients at all the session key is all zeros and the stream is
/// publicly readable. Delegate identities consume one one-time signature of
/// the channel key.
pub fn send_message(
    prng: &Prng,
    channel: &mut Channel,
    identity: &SenderIdentity<'_>,
    message_id: &[Trit],
    message_type: i16,
    psks: &PskSet,
    recipients: &PkePublicSet,
) -> Result<(SendSession, Vec<Trit>), MessageError> {
    let session_key = derive_session_key(prng, channel, identity, psks, recipients);

    let mut buf = vec![0; size::message_size(channel, identity, psks.len(), recipients.len())];
    let mut writer = TritWriter::new(&mut buf);
    let mut transcript = Transcript::new();

    header::wrap_header(&mut transcript, &mut writer, channel, identity, message_id, message_type)?;
    keyload::wrap_keyload(
        &mut transcript,
        &mut writer,
        prng,
        message_id,
        psks,
        recipients,
        &session_key,
    )?;
    debug_assert_eq!(writer.written(), buf.len());

    let mut signer_root = [0 as Trit; IDENTITY_TRITS];
    signer_root.copy_from_slice(match identity {
        SenderIdentity::Channel => channel.id(),
        SenderIdentity::Endpoint(endpoint) | SenderIdentity::DelegateEndpoint(endpoint) => {
            endpoint.id()
        },
        SenderIdentity::DelegateChannel(successor) => successor.id(),
    });

    tracing::debug!(
        psks = psks.len(),
        recipients = recipients.len(),
        identity = ?identity.kind(),
        "wrapped header message"
    );
    Ok((SendSession::new(transcript, signer_root), buf))
}

/// Unwrap a header message against the expected channel and message
/// identifiers, returning the receive session and what the header announced.
pub fn recv_message(
    channel_id: &[Trit],
    message_id: &[Trit],
    psks: &PskSet,
    key_pairs: &PkeSecretSet,
    message: &[Trit],
) -> Result<(RecvSession, MessageHeader), MessageError> {
    let mut transcript = Transcript::new();
    let mut reader = TritReader::new(message);

    let (identity, message_type, trusted) =
        header::unwrap_header(&mut transcript, &mut reader, channel_id, message_id)?;
    let _session_key = keyload::unwrap_keyload(&mut transcript, &mut reader, psks, key_pairs)?;

    tracing::debug!(?identity, message_type, "unwrapped header message");
    Ok((RecvSession::new(transcript, trusted), MessageHeader { message_type, identity }))
}

/// Session key for a header message: all zeros when nobody is addressed,
/// otherwise derived from the channel context and the key position in use.
fn derive_session_key(
    prng: &Prng,
    channel: &Channel,
    identity: &SenderIdentity<'_>,
    psks: &PskSet,
    recipients: &PkePublicSet,
) -> Zeroizing<Vec<Trit>> {
    if psks.is_empty() && recipients.is_empty() {
        return Zeroizing::new(vec![0; SESSION_KEY_TRITS]);
    }

    let mut skn = [0; 6 * TRITS_PER_TRYTE];
    trits::encode_int(i64::from(channel.signer().next_leaf()), &mut skn);

    let mut nonces: Vec<&[Trit]> = vec![channel.name()];
    if let SenderIdentity::Endpoint(endpoint) | SenderIdentity::DelegateEndpoint(endpoint) =
        identity
    {
        nonces.push(endpoint.name());
    }
    nonces.push(&skn);

    Zeroizing::new(prng.generate_trits(Domain::SecretKey, &nonces, SESSION_KEY_TRITS))
}
