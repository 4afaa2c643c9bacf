//! Exact wire-size prediction for every wrap operation
//!
//! Senders allocate buffers up front, so each wrap has a size function that
//! predicts its output to the trit from shapes alone: identity shape, signing
//! tree heights, recipient counts, payload length. Sizes never depend on key
//! material.

use maskwire_crypto::codec::{
    sizeof_ntrytes, sizeof_oneof, sizeof_repeated, sizeof_size, sizeof_trint, sizeof_tryte,
};
use maskwire_crypto::pke::{PKE_CIPHERTEXT_TRITS, PKE_ID_TRITS};
use maskwire_crypto::psk::PSK_ID_TRITS;
use maskwire_crypto::trits::TRITS_PER_TRYTE;

use crate::identity::{Channel, IDENTITY_TRITS};
use crate::message::header::SenderIdentity;
use crate::message::keyload::SESSION_KEY_TRITS;
use crate::message::packet::PacketSeal;
use crate::message::seal::{mac_size, mss_signature_size};

/// Wire size of a header sent on `channel` with the given identity shape.
pub fn header_size(channel: &Channel, identity: &SenderIdentity<'_>) -> usize {
    let identity_payload = match identity {
        SenderIdentity::Channel => 0,
        SenderIdentity::Endpoint(_) => IDENTITY_TRITS,
        SenderIdentity::DelegateChannel(_) | SenderIdentity::DelegateEndpoint(_) => {
            IDENTITY_TRITS + mss_signature_size(channel.signer().height())
        },
    };
    sizeof_tryte() + sizeof_oneof() + identity_payload + sizeof_trint()
}

/// Wire size of a keyload addressing `psk_count` pre-shared keys and
/// `pke_count` public-key recipients.
pub const fn keyload_size(psk_count: usize, pke_count: usize) -> usize {
    sizeof_repeated(psk_count + pke_count)
        + psk_count * (sizeof_oneof() + PSK_ID_TRITS + SESSION_KEY_TRITS)
        + pke_count * (sizeof_oneof() + PKE_ID_TRITS + PKE_CIPHERTEXT_TRITS)
}

/// Wire size of a complete header message: header plus keyload.
pub fn message_size(
    channel: &Channel,
    identity: &SenderIdentity<'_>,
    psk_count: usize,
    pke_count: usize,
) -> usize {
    header_size(channel, identity) + keyload_size(psk_count, pke_count)
}

/// Wire size of one packet carrying `payload_trits` trits under `seal`.
pub fn packet_size(seal: &PacketSeal<'_>, payload_trits: usize) -> usize {
    let seal_trits = match seal {
        PacketSeal::None => 0,
        PacketSeal::Mac => mac_size(),
        PacketSeal::Signature(signer) => mss_signature_size(signer.height()),
    };
    sizeof_size(payload_trits / TRITS_PER_TRYTE)
        + sizeof_ntrytes(payload_trits / TRITS_PER_TRYTE)
        + sizeof_oneof()
        + seal_trits
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn keyload_entry_sizes() {
        // count prefix for zero entries is a lone digit-count tryte
        assert_eq!(keyload_size(0, 0), 3);
        // one entry grows the count prefix by one digit tryte
        assert_eq!(keyload_size(1, 0), 6 + 3 + 81 + 243);
        assert_eq!(keyload_size(0, 1), 6 + 3 + 81 + 9216);
        assert_eq!(keyload_size(2, 1), 6 + 2 * (3 + 324) + (3 + 9297));
    }

    #[test]
    fn packet_size_grows_with_payload() {
        let small = packet_size(&PacketSeal::None, 30);
        let large = packet_size(&PacketSeal::None, 60);
        assert_eq!(large - small, 30);
        assert_eq!(packet_size(&PacketSeal::Mac, 30) - small, mac_size());
    }
}
