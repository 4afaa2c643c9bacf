//! Duplex sponge transcript over balanced trits
//!
//! The transcript is the running protocol state: every field of a message is
//! mixed into it, and it produces both the keystream for payload encryption
//! and the basis for integrity tags. Wrap and unwrap sides must perform the
//! same sequence of operations to stay in lockstep.
//!
//! The permutation is a fixed-width trit permutation (neighbour S-box,
//! stride-5 dispersion, per-round constants). It is deliberately simple; the
//! message layer only relies on the duplex interface exposed here.

use crate::codec::{CodecError, TritReader, TritWriter, sizeof_long_trint};
use crate::trits::{self, Trit};

/// Total sponge width in trits.
pub const SPONGE_WIDTH: usize = 243;

/// Rate portion of the state; trits beyond this are capacity.
pub const SPONGE_RATE: usize = 162;

const ROUNDS: usize = 9;

/// Running transcript state for one wrap or unwrap session.
///
/// [`fork`](Self::fork) yields an independent branch that shares all state
/// mixed in so far; the branch never affects the parent afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transcript {
    state: [Trit; SPONGE_WIDTH],
    pos: usize,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// Fresh transcript with an all-zero state.
    pub fn new() -> Self {
        Self { state: [0; SPONGE_WIDTH], pos: 0 }
    }

    /// Mix data into the state.
    ///
    /// Whether the same data is also written to an output buffer is decided
    /// by the codec layer; "external" fields are absorbed without being
    /// written.
    pub fn absorb(&mut self, data: &[Trit]) {
        for &t in data {
            self.state[self.pos] = trits::add(self.state[self.pos], t);
            self.advance();
        }
    }

    /// Finalize pending input so subsequent output depends on all of it.
    pub fn commit(&mut self) {
        if self.pos > 0 {
            self.permute();
        }
    }

    /// Produce keystream trits.
    pub fn squeeze_into(&mut self, out: &mut [Trit]) {
        for slot in out.iter_mut() {
            *slot = self.state[self.pos];
            self.advance();
        }
    }

    /// Encrypt in place under the current keystream.
    ///
    /// The ciphertext replaces the touched state trits, binding later output
    /// to what was actually put on the wire.
    pub fn encrypt(&mut self, data: &mut [Trit]) {
        for t in data.iter_mut() {
            let c = trits::add(*t, self.state[self.pos]);
            self.state[self.pos] = c;
            *t = c;
            self.advance();
        }
    }

    /// Inverse of [`encrypt`](Self::encrypt).
    pub fn decrypt(&mut self, data: &mut [Trit]) {
        for t in data.iter_mut() {
            let p = trits::sub(*t, self.state[self.pos]);
            self.state[self.pos] = *t;
            *t = p;
            self.advance();
        }
    }

    /// Branch an independent transcript seeded from the current state.
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Serialized size in trits.
    pub const fn serialized_size() -> usize {
        SPONGE_WIDTH + sizeof_long_trint()
    }

    /// Write the full state for later [`deserialize`](Self::deserialize).
    pub fn serialize_into(&self, writer: &mut TritWriter<'_>) -> Result<(), CodecError> {
        writer.take(SPONGE_WIDTH)?.copy_from_slice(&self.state);
        let mut pos = [0; sizeof_long_trint()];
        trits::encode_int(self.pos as i64, &mut pos);
        writer.take(pos.len())?.copy_from_slice(&pos);
        Ok(())
    }

    /// Reconstruct a transcript written by [`serialize_into`](Self::serialize_into).
    pub fn deserialize(reader: &mut TritReader<'_>) -> Result<Self, CodecError> {
        let mut state = [0; SPONGE_WIDTH];
        state.copy_from_slice(reader.take(SPONGE_WIDTH)?);
        let pos = trits::decode_int(reader.take(sizeof_long_trint())?);
        if !(0..SPONGE_RATE as i64).contains(&pos) {
            return Err(CodecError::InvalidValue { field: "transcript position" });
        }
        Ok(Self { state, pos: pos as usize })
    }

    fn advance(&mut self) {
        self.pos += 1;
        if self.pos == SPONGE_RATE {
            self.permute();
        }
    }

    fn permute(&mut self) {
        let mut mixed = [0; SPONGE_WIDTH];
        for round in 0..ROUNDS {
            // Neighbour S-box: a + b + a*b is non-linear in both inputs
            for i in 0..SPONGE_WIDTH {
                let a = self.state[i];
                let b = self.state[(i + 1) % SPONGE_WIDTH];
                mixed[i] = trits::add(trits::add(a, b), a * b);
            }
            // Stride-5 dispersion (gcd(5, 243) == 1) plus round constants
            for i in 0..SPONGE_WIDTH {
                let rc = ((i.wrapping_mul(7) + round.wrapping_mul(13) + 1) % 3) as Trit - 1;
                self.state[i] = trits::add(mixed[(5 * i + 1) % SPONGE_WIDTH], rc);
            }
        }
        self.pos = 0;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample(n: usize) -> Vec<Trit> {
        (0..n).map(|i| ((i * 5 + 2) % 3) as Trit - 1).collect()
    }

    #[test]
    fn absorb_is_deterministic() {
        let data = sample(300);
        let mut a = Transcript::new();
        let mut b = Transcript::new();
        a.absorb(&data);
        b.absorb(&data);
        a.commit();
        b.commit();

        let mut out_a = [0; 81];
        let mut out_b = [0; 81];
        a.squeeze_into(&mut out_a);
        b.squeeze_into(&mut out_b);
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn single_trit_difference_changes_output() {
        let mut data = sample(100);
        let mut a = Transcript::new();
        a.absorb(&data);
        a.commit();

        data[57] = trits::add(data[57], 1);
        let mut b = Transcript::new();
        b.absorb(&data);
        b.commit();

        let mut out_a = [0; 243];
        let mut out_b = [0; 243];
        a.squeeze_into(&mut out_a);
        b.squeeze_into(&mut out_b);
        assert_ne!(out_a, out_b);
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = sample(243);
        let payload = sample(33);

        let mut enc = Transcript::new();
        enc.absorb(&key);
        enc.commit();
        let mut wire = payload.clone();
        enc.encrypt(&mut wire);
        assert_ne!(wire, payload);

        let mut dec = Transcript::new();
        dec.absorb(&key);
        dec.commit();
        dec.decrypt(&mut wire);
        assert_eq!(wire, payload);
        assert_eq!(enc, dec, "both directions must leave the same state");
    }

    #[test]
    fn fork_does_not_affect_parent() {
        let mut parent = Transcript::new();
        parent.absorb(&sample(50));

        let before = parent.clone();
        let mut branch = parent.fork();
        branch.absorb(&sample(200));
        branch.commit();
        assert_eq!(parent, before);
    }

    #[test]
    fn serialize_roundtrip_preserves_behavior() {
        let mut original = Transcript::new();
        original.absorb(&sample(77));

        let mut buf = vec![0; Transcript::serialized_size()];
        let mut writer = TritWriter::new(&mut buf);
        original.serialize_into(&mut writer).unwrap();
        assert_eq!(writer.written(), Transcript::serialized_size());

        let mut reader = TritReader::new(&buf);
        let mut restored = Transcript::deserialize(&mut reader).unwrap();
        assert_eq!(restored, original);

        let mut out_a = [0; 81];
        let mut out_b = [0; 81];
        original.commit();
        restored.commit();
        original.squeeze_into(&mut out_a);
        restored.squeeze_into(&mut out_b);
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn deserialize_rejects_bad_position() {
        let mut buf = vec![0; Transcript::serialized_size()];
        {
            let mut writer = TritWriter::new(&mut buf);
            Transcript::new().serialize_into(&mut writer).unwrap();
        }
        // Overwrite the position field with an out-of-range value
        let mut pos = [0; sizeof_long_trint()];
        trits::encode_int(SPONGE_RATE as i64, &mut pos);
        buf[SPONGE_WIDTH..].copy_from_slice(&pos);

        let mut reader = TritReader::new(&buf);
        assert!(matches!(
            Transcript::deserialize(&mut reader),
            Err(CodecError::InvalidValue { .. })
        ));
    }
}
