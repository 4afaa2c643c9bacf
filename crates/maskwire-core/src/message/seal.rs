//! Transcript seals: MAC trailers and Merkle signature elements
//!
//! Both seal kinds bind everything absorbed into the transcript so far. A MAC
//! is 81 trytes of squeezed keystream the receiver recomputes; a signature
//! element is a length-prefixed Merkle signature over a squeezed digest,
//! verifiable against a public root. The digest and the signature body are
//! never absorbed back into the transcript, so wrap and unwrap stay in
//! lockstep through either seal.

use maskwire_crypto::codec::{
    self, CodecError, TritReader, TritWriter, sizeof_ntrytes, sizeof_size,
};
use maskwire_crypto::mss::{self, MSS_DIGEST_TRITS, signature_trits};
use maskwire_crypto::trits::TRITS_PER_TRYTE;
use maskwire_crypto::{MssPrivateKey, Transcript, Trit};

use crate::error::MessageError;

/// MAC trailer size in trits (81 trytes).
pub const MAC_TRITS: usize = 243;

/// Wire size of a MAC seal.
pub const fn mac_size() -> usize {
    MAC_TRITS
}

/// Wire size of a signature seal for a signing tree of `height`.
pub const fn mss_signature_size(height: usize) -> usize {
    let trytes = signature_trits(height) / TRITS_PER_TRYTE;
    sizeof_size(trytes) + sizeof_ntrytes(trytes)
}

/// Commit the transcript and squeeze a MAC trailer to the wire.
pub fn wrap_mac(
    transcript: &mut Transcript,
    writer: &mut TritWriter<'_>,
) -> Result<(), MessageError> {
    transcript.commit();
    codec::wrap_squeeze(transcript, writer, MAC_TRITS)?;
    Ok(())
}

/// Commit the transcript and check the wire MAC against the recomputed one.
pub fn unwrap_mac(
    transcript: &mut Transcript,
    reader: &mut TritReader<'_>,
) -> Result<(), MessageError> {
    transcript.commit();
    if !codec::unwrap_squeeze_check(transcript, reader, MAC_TRITS)? {
        return Err(MessageError::BadMac);
    }
    Ok(())
}

/// Commit, squeeze a digest, and sign it to the wire with `signer`.
///
/// Consumes one one-time leaf; fails without writing when the key is spent.
pub fn wrap_signature(
    transcript: &mut Transcript,
    writer: &mut TritWriter<'_>,
    signer: &mut MssPrivateKey,
) -> Result<(), MessageError> {
    transcript.commit();
    let mut digest = [0 as Trit; MSS_DIGEST_TRITS];
    transcript.squeeze_into(&mut digest);

    let trytes = signer.signature_size() / TRITS_PER_TRYTE;
    codec::wrap_absorb_size(transcript, writer, trytes)?;
    signer.sign(&digest, writer.take(signer.signature_size())?)?;
    Ok(())
}

/// Commit, squeeze the digest, and verify the wire signature against `root`.
pub fn unwrap_signature(
    transcript: &mut Transcript,
    reader: &mut TritReader<'_>,
    root: &[Trit],
) -> Result<(), MessageError> {
    transcript.commit();
    let mut digest = [0 as Trit; MSS_DIGEST_TRITS];
    transcript.squeeze_into(&mut digest);

    let trytes = codec::unwrap_absorb_size(transcript, reader)?;
    if trytes > reader.remaining() {
        return Err(CodecError::Eof { needed: trytes, remaining: reader.remaining() }.into());
    }
    let signature = reader.take(sizeof_ntrytes(trytes))?;
    if !mss::verify(&digest, signature, root) {
        return Err(MessageError::BadSignature);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use maskwire_crypto::Prng;
    use maskwire_crypto::trits::{self, trits_from_str};

    use super::*;

    fn primed_transcripts() -> (Transcript, Transcript) {
        let mut t = Transcript::new();
        t.absorb(&trits_from_str("HEADERCONTEXT").unwrap());
        (t.clone(), t)
    }

    fn test_signer(height: usize) -> MssPrivateKey {
        let key = trits_from_str(
            "SENDERPRNGKEYASENDERPRNGKEYSENDERPRNGKEYASENDERPRNGKEYSENDERPRNGKEYASENDERPRNGKEY",
        )
        .unwrap();
        MssPrivateKey::generate(&Prng::new(&key), height, &trits_from_str("CHANAME").unwrap())
    }

    #[test]
    fn mac_roundtrip_and_tamper() {
        let (mut sender, mut receiver) = primed_transcripts();
        let mut buf = vec![0; mac_size()];
        wrap_mac(&mut sender, &mut TritWriter::new(&mut buf)).unwrap();
        unwrap_mac(&mut receiver, &mut TritReader::new(&buf)).unwrap();
        assert_eq!(sender, receiver);

        let (_, mut receiver) = primed_transcripts();
        buf[7] = trits::add(buf[7], 1);
        assert!(matches!(
            unwrap_mac(&mut receiver, &mut TritReader::new(&buf)),
            Err(MessageError::BadMac)
        ));
    }

    #[test]
    fn signature_roundtrip_and_tamper() {
        let mut signer = test_signer(1);
        let (mut sender, mut receiver) = primed_transcripts();
        let mut buf = vec![0; mss_signature_size(1)];
        wrap_signature(&mut sender, &mut TritWriter::new(&mut buf), &mut signer).unwrap();
        assert_eq!(signer.next_leaf(), 1);

        let root = signer.root().to_vec();
        unwrap_signature(&mut receiver, &mut TritReader::new(&buf), &root).unwrap();
        assert_eq!(sender, receiver);

        let (_, mut receiver) = primed_transcripts();
        let last = buf.len() - 1;
        buf[last] = trits::add(buf[last], 1);
        assert!(matches!(
            unwrap_signature(&mut receiver, &mut TritReader::new(&buf), &root),
            Err(MessageError::BadSignature)
        ));
    }

    #[test]
    fn signature_against_wrong_root_fails() {
        let mut signer = test_signer(1);
        let (mut sender, mut receiver) = primed_transcripts();
        let mut buf = vec![0; mss_signature_size(1)];
        wrap_signature(&mut sender, &mut TritWriter::new(&mut buf), &mut signer).unwrap();

        let wrong = vec![0 as Trit; 243];
        assert!(matches!(
            unwrap_signature(&mut receiver, &mut TritReader::new(&buf), &wrong),
            Err(MessageError::BadSignature)
        ));
    }

    #[test]
    fn seal_sizes_match_wire() {
        let mut signer = test_signer(2);
        let mut t = Transcript::new();
        let mut buf = vec![0; mss_signature_size(2)];
        let mut writer = TritWriter::new(&mut buf);
        wrap_signature(&mut t, &mut writer, &mut signer).unwrap();
        assert_eq!(writer.written(), mss_signature_size(2));
    }
}
