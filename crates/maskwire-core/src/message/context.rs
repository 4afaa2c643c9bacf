//! Serializable send and receive session contexts
//!
//! A header exchange leaves each side with a session: the transcript, the
//! packet ordinal, and the identity packets verify against. Sessions
//! serialize to a fixed trit layout so a sender or receiver can persist
//! mid-stream and resume later; signing keys are not part of the state and
//! stay with their owner.

use maskwire_crypto::codec::{TritReader, TritWriter, sizeof_long_trint, sizeof_ntrytes};
use maskwire_crypto::trits;
use maskwire_crypto::{Transcript, Trit};

use crate::error::MessageError;
use crate::identity::IDENTITY_TRITS;
use crate::message::packet::{self, PacketSeal};

/// Sender side of an established session.
pub struct SendSession {
    transcript: Transcript,
    ord: i64,
    signer_root: [Trit; IDENTITY_TRITS],
}

impl SendSession {
    pub(crate) fn new(transcript: Transcript, signer_root: [Trit; IDENTITY_TRITS]) -> Self {
        Self { transcript, ord: 0, signer_root }
    }

    /// Packet ordinal the next [`send_packet`](Self::send_packet) will bind.
    pub fn ord(&self) -> i64 {
        self.ord
    }

    /// Public root receivers verify this session's signed packets against.
    pub fn signer_root(&self) -> &[Trit] {
        &self.signer_root
    }

    /// Wrap one payload packet, advancing the ordinal on success.
    ///
    /// `payload` must be a whole number of trytes. On failure the session is
    /// left exactly as it was.
    pub fn send_packet(
        &mut self,
        payload: &[Trit],
        seal: PacketSeal<'_>,
    ) -> Result<Vec<Trit>, MessageError> {
        let mut transcript = self.transcript.clone();
        let mut ord = self.ord;
        let mut buf = vec![0; crate::message::size::packet_size(&seal, payload.len())];
        let mut writer = TritWriter::new(&mut buf);
        packet::wrap_packet(&mut transcript, &mut writer, &mut ord, payload, seal)?;
        debug_assert_eq!(writer.written(), buf.len());
        self.transcript = transcript;
        self.ord = ord;
        Ok(buf)
    }

    /// Serialized size in trits.
    pub const fn serialized_size() -> usize {
        Transcript::serialized_size() + sizeof_long_trint() + sizeof_ntrytes(IDENTITY_TRITS / 3)
    }

    /// Serialize the session state.
    pub fn serialize(&self) -> Vec<Trit> {
        let mut buf = vec![0; Self::serialized_size()];
        // Sized for the layout below; the writes cannot fail
        let _ = self.write_state(&mut TritWriter::new(&mut buf));
        buf
    }

    fn write_state(&self, writer: &mut TritWriter<'_>) -> Result<(), MessageError> {
        self.transcript.serialize_into(writer)?;
        let mut ord = [0; sizeof_long_trint()];
        trits::encode_int(self.ord, &mut ord);
        writer.take(ord.len())?.copy_from_slice(&ord);
        writer.take(IDENTITY_TRITS)?.copy_from_slice(&self.signer_root);
        Ok(())
    }

    /// Reconstruct a session written by [`serialize`](Self::serialize).
    pub fn deserialize(trits_in: &[Trit]) -> Result<Self, MessageError> {
        let mut reader = TritReader::new(trits_in);
        let transcript = Transcript::deserialize(&mut reader)?;
        let ord = trits::decode_int(reader.take(sizeof_long_trint())?);
        let mut signer_root = [0 as Trit; IDENTITY_TRITS];
        signer_root.copy_from_slice(reader.take(IDENTITY_TRITS)?);
        Ok(Self { transcript, ord, signer_root })
    }
}

/// Receiver side of an established session.
#[derive(Debug)]
pub struct RecvSession {
    transcript: Transcript,
    public_key: [Trit; IDENTITY_TRITS],
    ord: i64,
}

impl RecvSession {
    pub(crate) fn new(transcript: Transcript, public_key: [Trit; IDENTITY_TRITS]) -> Self {
        Self { transcript, public_key, ord: 0 }
    }

    /// Packet ordinal the next [`recv_packet`](Self::recv_packet) expects.
    pub fn ord(&self) -> i64 {
        self.ord
    }

    /// Public key signed packets in this session verify against.
    pub fn public_key(&self) -> &[Trit] {
        &self.public_key
    }

    /// Unwrap one payload packet into a fresh buffer, advancing the ordinal
    /// on success.
    ///
    /// A rejected packet leaves the session untouched, so the stream resumes
    /// once the right packet arrives.
    pub fn recv_packet(&mut self, packet: &[Trit]) -> Result<Vec<Trit>, MessageError> {
        let mut transcript = self.transcript.clone();
        let mut ord = self.ord;
        let mut reader = TritReader::new(packet);
        let payload =
            packet::unwrap_packet(&mut transcript, &mut reader, &mut ord, &self.public_key)?;
        self.transcript = transcript;
        self.ord = ord;
        Ok(payload)
    }

    /// Unwrap one payload packet into `out`; returns the payload size in
    /// trits, or [`MessageError::BufferTooSmall`] without consuming it.
    ///
    /// Like [`recv_packet`](Self::recv_packet), failure leaves the session
    /// untouched.
    pub fn recv_packet_into(
        &mut self,
        packet: &[Trit],
        out: &mut [Trit],
    ) -> Result<usize, MessageError> {
        let mut transcript = self.transcript.clone();
        let mut ord = self.ord;
        let mut reader = TritReader::new(packet);
        let n = packet::unwrap_packet_into(
            &mut transcript,
            &mut reader,
            &mut ord,
            &self.public_key,
            out,
        )?;
        self.transcript = transcript;
        self.ord = ord;
        Ok(n)
    }

    /// Serialized size in trits.
    pub const fn serialized_size() -> usize {
        Transcript::serialized_size() + sizeof_ntrytes(IDENTITY_TRITS / 3) + sizeof_long_trint()
    }

    /// Serialize the session state.
    pub fn serialize(&self) -> Vec<Trit> {
        let mut buf = vec![0; Self::serialized_size()];
        // Sized for the layout below; the writes cannot fail
        let _ = self.write_state(&mut TritWriter::new(&mut buf));
        buf
    }

    fn write_state(&self, writer: &mut TritWriter<'_>) -> Result<(), MessageError> {
        self.transcript.serialize_into(writer)?;
        writer.take(IDENTITY_TRITS)?.copy_from_slice(&self.public_key);
        let mut ord = [0; sizeof_long_trint()];
        trits::encode_int(self.ord, &mut ord);
        writer.take(ord.len())?.copy_from_slice(&ord);
        Ok(())
    }

    /// Reconstruct a session written by [`serialize`](Self::serialize).
    pub fn deserialize(trits_in: &[Trit]) -> Result<Self, MessageError> {
        let mut reader = TritReader::new(trits_in);
        let transcript = Transcript::deserialize(&mut reader)?;
        let mut public_key = [0 as Trit; IDENTITY_TRITS];
        public_key.copy_from_slice(reader.take(IDENTITY_TRITS)?);
        let ord = trits::decode_int(reader.take(sizeof_long_trint())?);
        Ok(Self { transcript, public_key, ord })
    }
}
