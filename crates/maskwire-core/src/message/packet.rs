//! Payload packets: ordinal binding, keystream encryption, checksum seal
//!
//! Packets ride on a session transcript established by the header exchange.
//! Each packet mixes the session ordinal into the transcript before anything
//! else, so packets decrypt only in the order they were sent. The payload is
//! keystream-encrypted, then sealed with the sender's choice of nothing, a
//! MAC, or a Merkle signature.

use maskwire_crypto::codec::{self, CodecError, TritReader, TritWriter, sizeof_ntrytes};
use maskwire_crypto::trits::TRITS_PER_TRYTE;
use maskwire_crypto::{MssPrivateKey, Transcript, Trit};

use crate::error::MessageError;
use crate::message::seal;

/// Checksum shape recovered from a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    /// No integrity seal; the payload is only keystream-bound.
    None,
    /// MAC trailer, checkable by anyone holding the session key.
    Mac,
    /// Merkle signature, checkable against the sender's public key.
    Signature,
}

/// Seal requested for an outgoing packet.
pub enum PacketSeal<'a> {
    /// No integrity seal.
    None,
    /// MAC trailer over the session transcript.
    Mac,
    /// Merkle signature; consumes one one-time leaf of the signer.
    Signature(&'a mut MssPrivateKey),
}

impl PacketSeal<'_> {
    /// Checksum shape this seal writes.
    pub fn kind(&self) -> ChecksumKind {
        match self {
            Self::None => ChecksumKind::None,
            Self::Mac => ChecksumKind::Mac,
            Self::Signature(_) => ChecksumKind::Signature,
        }
    }

    fn tag(&self) -> i8 {
        match self {
            Self::None => 0,
            Self::Mac => 1,
            Self::Signature(_) => 2,
        }
    }
}

/// Wrap one packet and advance the session ordinal.
///
/// `payload` must be a whole number of trytes.
pub fn wrap_packet(
    transcript: &mut Transcript,
    writer: &mut TritWriter<'_>,
    ord: &mut i64,
    payload: &[Trit],
    seal: PacketSeal<'_>,
) -> Result<(), MessageError> {
    debug_assert_eq!(payload.len() % TRITS_PER_TRYTE, 0);

    codec::absorb_external_long_trint(transcript, *ord);
    // Commit so the payload keystream depends on the ordinal
    transcript.commit();
    codec::wrap_absorb_size(transcript, writer, payload.len() / TRITS_PER_TRYTE)?;
    codec::wrap_crypt(transcript, writer, payload)?;

    codec::wrap_absorb_tryte(transcript, writer, seal.tag())?;
    match seal {
        PacketSeal::None => {},
        PacketSeal::Mac => seal::wrap_mac(transcript, writer)?,
        PacketSeal::Signature(signer) => seal::wrap_signature(transcript, writer, signer)?,
    }

    transcript.commit();
    *ord += 1;
    Ok(())
}

/// Unwrap one packet into a fresh buffer and advance the session ordinal.
///
/// Signed packets verify against `public_key`, the identity the header
/// established for this session.
pub fn unwrap_packet(
    transcript: &mut Transcript,
    reader: &mut TritReader<'_>,
    ord: &mut i64,
    public_key: &[Trit],
) -> Result<Vec<Trit>, MessageError> {
    codec::absorb_external_long_trint(transcript, *ord);
    transcript.commit();
    let trytes = codec::unwrap_absorb_size(transcript, reader)?;
    if trytes > reader.remaining() {
        return Err(CodecError::Eof { needed: trytes, remaining: reader.remaining() }.into());
    }
    let needed = sizeof_ntrytes(trytes);
    if needed > reader.remaining() {
        return Err(CodecError::Eof { needed, remaining: reader.remaining() }.into());
    }

    let mut payload = vec![0 as Trit; needed];
    codec::unwrap_crypt(transcript, reader, &mut payload)?;
    unwrap_seal(transcript, reader, public_key)?;
    *ord += 1;
    Ok(payload)
}

/// Unwrap one packet into a caller-supplied buffer; returns the payload size
/// in trits.
///
/// Fails with [`MessageError::BufferTooSmall`] before consuming the payload
/// when `out` cannot hold it.
pub fn unwrap_packet_into(
    transcript: &mut Transcript,
    reader: &mut TritReader<'_>,
    ord: &mut i64,
    public_key: &[Trit],
    out: &mut [Trit],
) -> Result<usize, MessageError> {
    codec::absorb_external_long_trint(transcript, *ord);
    transcript.commit();
    let trytes = codec::unwrap_absorb_size(transcript, reader)?;
    if trytes > reader.remaining() {
        return Err(CodecError::Eof { needed: trytes, remaining: reader.remaining() }.into());
    }
    let needed = sizeof_ntrytes(trytes);
    if needed > out.len() {
        return Err(MessageError::BufferTooSmall { needed, capacity: out.len() });
    }

    codec::unwrap_crypt(transcript, reader, &mut out[..needed])?;
    unwrap_seal(transcript, reader, public_key)?;
    *ord += 1;
    Ok(needed)
}

fn unwrap_seal(
    transcript: &mut Transcript,
    reader: &mut TritReader<'_>,
    public_key: &[Trit],
) -> Result<(), MessageError> {
    let tag = codec::unwrap_absorb_tryte(transcript, reader)?;
    match tag {
        0 => {},
        1 => seal::unwrap_mac(transcript, reader)?,
        2 => seal::unwrap_signature(transcript, reader, public_key)?,
        value => return Err(MessageError::BadDiscriminator { field: "checksum", value }),
    }
    transcript.commit();
    Ok(())
}
