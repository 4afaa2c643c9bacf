//! Keyload: session-key encapsulation to pre-shared and public-key recipients
//!
//! The keyload is a counted list of entries, one per recipient. Each entry's
//! discriminator lands on the main transcript; the entry body runs on a fork,
//! so recipients who cannot open an entry still track the main transcript by
//! consuming the entry's fixed trit count and discarding the fork.
//!
//! A receiver opens every entry it has a key for. Opening none (with a
//! non-empty list) is an addressing failure; opening two that disagree is a
//! consistency failure. An empty list means the session key is all zeros and
//! the message is publicly readable.

use maskwire_crypto::codec::{self, TritReader, TritWriter};
use maskwire_crypto::pke::{self, PKE_CIPHERTEXT_TRITS, PKE_ID_TRITS};
use maskwire_crypto::psk::PSK_ID_TRITS;
use maskwire_crypto::{PkePublicSet, PkeSecretSet, Prng, PskSet, Transcript, Trit};
use zeroize::Zeroizing;

use crate::error::MessageError;

/// Session key size in trits (81 trytes).
pub const SESSION_KEY_TRITS: usize = 243;

/// Keyload entry discriminator: pre-shared key.
pub(crate) const KEYLOAD_PSK: i8 = 1;

/// Keyload entry discriminator: public-key encapsulation.
pub(crate) const KEYLOAD_PKE: i8 = 2;

/// Wrap one keyload entry per pre-shared key and per recipient public key,
/// then bind the session key itself into the transcript.
pub fn wrap_keyload(
    transcript: &mut Transcript,
    writer: &mut TritWriter<'_>,
    prng: &Prng,
    nonce: &[Trit],
    psks: &PskSet,
    recipients: &PkePublicSet,
    session_key: &[Trit],
) -> Result<(), MessageError> {
    debug_assert_eq!(session_key.len(), SESSION_KEY_TRITS);

    codec::wrap_absorb_size(transcript, writer, psks.len() + recipients.len())?;

    for psk in psks.iter() {
        codec::wrap_absorb_tryte(transcript, writer, KEYLOAD_PSK)?;
        let mut fork = transcript.fork();
        codec::wrap_absorb_trits(&mut fork, writer, psk.id())?;
        fork.absorb(psk.secret());
        fork.commit();
        codec::wrap_crypt(&mut fork, writer, session_key)?;
    }

    for public_key in recipients.iter() {
        codec::wrap_absorb_tryte(transcript, writer, KEYLOAD_PKE)?;
        let mut fork = transcript.fork();
        codec::wrap_absorb_trits(&mut fork, writer, public_key.id())?;
        let ekey = pke::encrypt(public_key, prng, nonce, session_key);
        fork.absorb(&ekey);
        writer.take(PKE_CIPHERTEXT_TRITS)?.copy_from_slice(&ekey);
    }

    codec::absorb_external(transcript, session_key);
    transcript.commit();
    Ok(())
}

/// Unwrap the keyload and recover the session key.
///
/// Entries this receiver holds no key for are skipped at full wire size.
/// Returns [`MessageError::KeyloadIrrelevant`] when a non-empty keyload
/// yields no key, and [`MessageError::KeyloadOverloaded`] when two opened
/// entries disagree.
pub fn unwrap_keyload(
    transcript: &mut Transcript,
    reader: &mut TritReader<'_>,
    psks: &PskSet,
    key_pairs: &PkeSecretSet,
) -> Result<Zeroizing<Vec<Trit>>, MessageError> {
    let count = codec::unwrap_absorb_size(transcript, reader)?;

    let mut found: Option<Zeroizing<Vec<Trit>>> = None;
    for _ in 0..count {
        let tag = codec::unwrap_absorb_tryte(transcript, reader)?;
        match tag {
            KEYLOAD_PSK => {
                let mut fork = transcript.fork();
                let mut id = [0 as Trit; PSK_ID_TRITS];
                codec::unwrap_absorb_trits(&mut fork, reader, &mut id)?;
                match psks.get(&id) {
                    Some(psk) => {
                        fork.absorb(psk.secret());
                        fork.commit();
                        let mut key = Zeroizing::new(vec![0 as Trit; SESSION_KEY_TRITS]);
                        codec::unwrap_crypt(&mut fork, reader, &mut key)?;
                        accept(&mut found, key)?;
                    },
                    None => {
                        tracing::trace!("skipping keyload entry for unknown pre-shared key");
                        reader.take(SESSION_KEY_TRITS)?;
                    },
                }
            },
            KEYLOAD_PKE => {
                let mut fork = transcript.fork();
                let mut id = [0 as Trit; PKE_ID_TRITS];
                codec::unwrap_absorb_trits(&mut fork, reader, &mut id)?;
                let ekey = reader.take(PKE_CIPHERTEXT_TRITS)?;
                match key_pairs.get(&id) {
                    Some(key_pair) => {
                        let key = pke::decrypt(key_pair, ekey)
                            .map_err(|_| MessageError::BadEncapsulation)?;
                        accept(&mut found, key)?;
                    },
                    None => {
                        tracing::trace!("skipping keyload entry for unknown recipient key");
                    },
                }
            },
            value => {
                return Err(MessageError::BadDiscriminator { field: "keyload entry", value });
            },
        }
    }

    let key = match found {
        Some(key) => key,
        None if count == 0 => Zeroizing::new(vec![0 as Trit; SESSION_KEY_TRITS]),
        None => return Err(MessageError::KeyloadIrrelevant),
    };

    codec::absorb_external(transcript, &key);
    transcript.commit();
    Ok(key)
}

/// Record a recovered session key, rejecting disagreement with an earlier one.
fn accept(
    found: &mut Option<Zeroizing<Vec<Trit>>>,
    key: Zeroizing<Vec<Trit>>,
) -> Result<(), MessageError> {
    match found {
        Some(existing) if existing.as_slice() != key.as_slice() => {
            Err(MessageError::KeyloadOverloaded)
        },
        Some(_) => Ok(()),
        None => {
            *found = Some(key);
            Ok(())
        },
    }
}
