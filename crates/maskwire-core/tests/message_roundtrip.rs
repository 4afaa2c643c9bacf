//! End-to-end wrap/unwrap across every identity, keyload, and seal shape.

use maskwire_core::message::size;
use maskwire_core::{
    Channel, Endpoint, ErrorClass, IdentityKind, MessageError, PacketSeal, RecvSession,
    SendSession, SenderIdentity, recv_message, send_message,
};
use maskwire_crypto::pke::PkeSecretKey;
use maskwire_crypto::psk::{PSK_ID_TRITS, PSK_KEY_TRITS, Psk};
use maskwire_crypto::trits::{self, Trit, trits_from_str};
use maskwire_crypto::{PkePublicSet, PkeSecretSet, Prng, PskSet};

const SENDER_KEY: &str =
    "SENDERPRNGKEYASENDERPRNGKEYSENDERPRNGKEYASENDERPRNGKEYSENDERPRNGKEYASENDERPRNGKEY";
const RECIPIENT_KEY: &str =
    "RECIPIPRNGKEYBRECIPIPRNGKEYRECIPIPRNGKEYBRECIPIPRNGKEYRECIPIPRNGKEYBRECIPIPRNGKEY";
const MESSAGE_ID: &str = "SENDERMSGIDAAAAASENDERMSGID";
const PLAINTEXT: &str = "WHATANONSENSEMESSAGE";

fn prng(seed: &str) -> Prng {
    Prng::new(&trits_from_str(seed).unwrap())
}

fn psk(id: &str, seed: &str) -> Psk {
    let mut id = trits_from_str(id).unwrap();
    id.resize(PSK_ID_TRITS, 0);
    let mut secret = trits_from_str(seed).unwrap();
    secret.resize(PSK_KEY_TRITS, 0);
    Psk::from_parts(&id, &secret).unwrap()
}

#[derive(Clone, Copy)]
enum Keyload {
    Public,
    PreShared,
    PublicKey,
}

/// One full exchange: header message, then a sealed payload packet.
fn run_case(identity_tag: u8, keyload: Keyload, seal_tag: u8) {
    let sender_prng = prng(SENDER_KEY);
    let recipient_prng = prng(RECIPIENT_KEY);

    let mut channel = Channel::new(&sender_prng, 2, &trits_from_str("CHANAME").unwrap());
    let mut endpoint =
        Endpoint::new(&sender_prng, 1, &channel, &trits_from_str("EPANAME").unwrap());
    let mut successor = Channel::new(&sender_prng, 1, &trits_from_str("CHANAMENEXT").unwrap());
    let channel_id = channel.id().to_vec();
    let message_id = trits_from_str(MESSAGE_ID).unwrap();

    let mut psks = PskSet::new();
    let mut recipients = PkePublicSet::new();
    let mut key_pairs = PkeSecretSet::new();
    match keyload {
        Keyload::Public => {},
        Keyload::PreShared => {
            psks.insert(psk("PSKIDAPSKIDAPSKIDAPSKIDAPSK", "PSKANONCE"));
        },
        Keyload::PublicKey => {
            let key_pair =
                PkeSecretKey::generate(&recipient_prng, &trits_from_str("NTRUBNONCE").unwrap());
            recipients.insert(key_pair.public_key().clone());
            key_pairs.insert(key_pair);
        },
    }

    let expected_kind = match identity_tag {
        0 => IdentityKind::Channel,
        1 => IdentityKind::Endpoint,
        2 => IdentityKind::DelegateChannel,
        _ => IdentityKind::DelegateEndpoint,
    };

    let (mut send, wire) = {
        let identity = match identity_tag {
            0 => SenderIdentity::Channel,
            1 => SenderIdentity::Endpoint(&endpoint),
            2 => SenderIdentity::DelegateChannel(&successor),
            _ => SenderIdentity::DelegateEndpoint(&endpoint),
        };
        let out = send_message(
            &sender_prng,
            &mut channel,
            &identity,
            &message_id,
            3,
            &psks,
            &recipients,
        )
        .unwrap();
        assert_eq!(
            out.1.len(),
            size::message_size(&channel, &identity, psks.len(), recipients.len()),
            "estimator must predict the wire exactly"
        );
        out
    };

    let (mut recv, header) =
        recv_message(&channel_id, &message_id, &psks, &key_pairs, &wire).unwrap();
    assert_eq!(header.message_type, 3);
    assert_eq!(header.identity, expected_kind);

    let payload = trits_from_str(PLAINTEXT).unwrap();
    let seal = match seal_tag {
        0 => PacketSeal::None,
        1 => PacketSeal::Mac,
        _ => PacketSeal::Signature(match identity_tag {
            0 => channel.signer_mut(),
            2 => successor.signer_mut(),
            _ => endpoint.signer_mut(),
        }),
    };
    let packet = send.send_packet(&payload, seal).unwrap();
    assert_eq!(recv.recv_packet(&packet).unwrap(), payload);
}

#[test]
fn matrix_unsealed_packets() {
    for identity in 0..4 {
        for keyload in [Keyload::Public, Keyload::PreShared, Keyload::PublicKey] {
            run_case(identity, keyload, 0);
        }
    }
}

#[test]
fn matrix_mac_packets() {
    for identity in 0..4 {
        for keyload in [Keyload::Public, Keyload::PreShared, Keyload::PublicKey] {
            run_case(identity, keyload, 1);
        }
    }
}

#[test]
fn matrix_signed_packets() {
    for identity in 0..4 {
        for keyload in [Keyload::Public, Keyload::PreShared, Keyload::PublicKey] {
            run_case(identity, keyload, 2);
        }
    }
}

/// A receiver holding only the second of two pre-shared keys still recovers
/// the stream.
#[test]
fn second_psk_holder_reads_the_stream() {
    let sender_prng = prng(SENDER_KEY);
    let mut channel = Channel::new(&sender_prng, 1, &trits_from_str("CHANAME").unwrap());
    let channel_id = channel.id().to_vec();
    let message_id = trits_from_str(MESSAGE_ID).unwrap();

    let mut both = PskSet::new();
    both.insert(psk("PSKIDAPSKIDAPSKIDAPSKIDAPSK", "PSKANONCE"));
    both.insert(psk("PSKIDBPSKIDBPSKIDBPSKIDBPSK", "PSKBNONCE"));

    let (mut send, wire) = send_message(
        &sender_prng,
        &mut channel,
        &SenderIdentity::Channel,
        &message_id,
        0,
        &both,
        &PkePublicSet::new(),
    )
    .unwrap();

    let mut only_b = PskSet::new();
    only_b.insert(psk("PSKIDBPSKIDBPSKIDBPSKIDBPSK", "PSKBNONCE"));
    let (mut recv, _) =
        recv_message(&channel_id, &message_id, &only_b, &PkeSecretSet::new(), &wire).unwrap();

    let payload = trits_from_str("PAYLOAD9999").unwrap();
    let packet = send.send_packet(&payload, PacketSeal::Mac).unwrap();
    assert_eq!(recv.recv_packet(&packet).unwrap(), payload);
}

#[test]
fn unaddressed_receiver_gets_irrelevant() {
    let sender_prng = prng(SENDER_KEY);
    let mut channel = Channel::new(&sender_prng, 1, &trits_from_str("CHANAME").unwrap());
    let channel_id = channel.id().to_vec();
    let message_id = trits_from_str(MESSAGE_ID).unwrap();

    let mut psks = PskSet::new();
    psks.insert(psk("PSKIDAPSKIDAPSKIDAPSKIDAPSK", "PSKANONCE"));
    let (_, wire) = send_message(
        &sender_prng,
        &mut channel,
        &SenderIdentity::Channel,
        &message_id,
        0,
        &psks,
        &PkePublicSet::new(),
    )
    .unwrap();

    let err = recv_message(&channel_id, &message_id, &PskSet::new(), &PkeSecretSet::new(), &wire)
        .unwrap_err();
    assert!(matches!(err, MessageError::KeyloadIrrelevant));
    assert_eq!(err.class(), ErrorClass::Consistency);
}

#[test]
fn wrong_channel_id_fails_the_mac() {
    let sender_prng = prng(SENDER_KEY);
    let mut channel = Channel::new(&sender_prng, 1, &trits_from_str("CHANAME").unwrap());
    let message_id = trits_from_str(MESSAGE_ID).unwrap();

    let (mut send, wire) = send_message(
        &sender_prng,
        &mut channel,
        &SenderIdentity::Channel,
        &message_id,
        0,
        &PskSet::new(),
        &PkePublicSet::new(),
    )
    .unwrap();

    // A receiver bound to a different channel derives a diverged transcript;
    // the first sealed packet catches the mismatch.
    let wrong_id = vec![0 as Trit; channel.id().len()];
    let (mut recv, _) =
        recv_message(&wrong_id, &message_id, &PskSet::new(), &PkeSecretSet::new(), &wire).unwrap();

    let payload = trits_from_str("PAYLOAD9999").unwrap();
    let packet = send.send_packet(&payload, PacketSeal::Mac).unwrap();
    assert!(matches!(recv.recv_packet(&packet), Err(MessageError::BadMac)));
}

#[test]
fn packets_only_unwrap_in_order() {
    let sender_prng = prng(SENDER_KEY);
    let mut channel = Channel::new(&sender_prng, 1, &trits_from_str("CHANAME").unwrap());
    let channel_id = channel.id().to_vec();
    let message_id = trits_from_str(MESSAGE_ID).unwrap();

    let (mut send, wire) = send_message(
        &sender_prng,
        &mut channel,
        &SenderIdentity::Channel,
        &message_id,
        0,
        &PskSet::new(),
        &PkePublicSet::new(),
    )
    .unwrap();
    let (mut recv, _) =
        recv_message(&channel_id, &message_id, &PskSet::new(), &PkeSecretSet::new(), &wire)
            .unwrap();

    let first = trits_from_str("PAYLOAD9999").unwrap();
    let second = trits_from_str(PLAINTEXT).unwrap();
    let packet_one = send.send_packet(&first, PacketSeal::Mac).unwrap();
    let packet_two = send.send_packet(&second, PacketSeal::Mac).unwrap();

    // Skipping ahead fails and leaves the ordinal untouched
    assert!(matches!(recv.recv_packet(&packet_two), Err(MessageError::BadMac)));
    assert_eq!(recv.ord(), 0);

    assert_eq!(recv.recv_packet(&packet_one).unwrap(), first);
    assert_eq!(recv.recv_packet(&packet_two).unwrap(), second);
    assert_eq!(send.ord(), 2);
    assert_eq!(recv.ord(), 2);
}

#[test]
fn sessions_survive_serialization() {
    let sender_prng = prng(SENDER_KEY);
    let mut channel = Channel::new(&sender_prng, 1, &trits_from_str("CHANAME").unwrap());
    let channel_id = channel.id().to_vec();
    let message_id = trits_from_str(MESSAGE_ID).unwrap();

    let (mut send, wire) = send_message(
        &sender_prng,
        &mut channel,
        &SenderIdentity::Channel,
        &message_id,
        0,
        &PskSet::new(),
        &PkePublicSet::new(),
    )
    .unwrap();
    let (mut recv, _) =
        recv_message(&channel_id, &message_id, &PskSet::new(), &PkeSecretSet::new(), &wire)
            .unwrap();

    let payload = trits_from_str("PAYLOAD9999").unwrap();
    let packet = send.send_packet(&payload, PacketSeal::Mac).unwrap();
    recv.recv_packet(&packet).unwrap();

    let mut send = SendSession::deserialize(&send.serialize()).unwrap();
    let mut recv = RecvSession::deserialize(&recv.serialize()).unwrap();
    assert_eq!(send.signer_root(), channel.id());
    assert_eq!(recv.public_key(), channel.id());

    // Signed packet across the resume: the restored receiver still holds the
    // key to verify against
    let seal = PacketSeal::Signature(channel.signer_mut());
    let packet = send.send_packet(&payload, seal).unwrap();
    assert_eq!(recv.recv_packet(&packet).unwrap(), payload);
}

#[test]
fn undersized_payload_buffer_is_reported() {
    let sender_prng = prng(SENDER_KEY);
    let mut channel = Channel::new(&sender_prng, 1, &trits_from_str("CHANAME").unwrap());
    let channel_id = channel.id().to_vec();
    let message_id = trits_from_str(MESSAGE_ID).unwrap();

    let (mut send, wire) = send_message(
        &sender_prng,
        &mut channel,
        &SenderIdentity::Channel,
        &message_id,
        0,
        &PskSet::new(),
        &PkePublicSet::new(),
    )
    .unwrap();
    let (mut recv, _) =
        recv_message(&channel_id, &message_id, &PskSet::new(), &PkeSecretSet::new(), &wire)
            .unwrap();

    let payload = trits_from_str(PLAINTEXT).unwrap();
    let packet = send.send_packet(&payload, PacketSeal::Mac).unwrap();

    let mut small = vec![0 as Trit; payload.len() - 3];
    let err = recv.recv_packet_into(&packet, &mut small).unwrap_err();
    assert!(matches!(err, MessageError::BufferTooSmall { .. }));
    assert_eq!(err.class(), ErrorClass::Format);
    assert_eq!(recv.ord(), 0);

    // Retry with enough room succeeds on the same packet
    let mut enough = vec![0 as Trit; payload.len()];
    let n = recv.recv_packet_into(&packet, &mut enough).unwrap();
    assert_eq!(&enough[..n], payload.as_slice());
}

#[test]
fn tampered_signed_packet_is_rejected() {
    let sender_prng = prng(SENDER_KEY);
    let mut channel = Channel::new(&sender_prng, 1, &trits_from_str("CHANAME").unwrap());
    let channel_id = channel.id().to_vec();
    let message_id = trits_from_str(MESSAGE_ID).unwrap();

    let (mut send, wire) = send_message(
        &sender_prng,
        &mut channel,
        &SenderIdentity::Channel,
        &message_id,
        0,
        &PskSet::new(),
        &PkePublicSet::new(),
    )
    .unwrap();
    let (mut recv, _) =
        recv_message(&channel_id, &message_id, &PskSet::new(), &PkeSecretSet::new(), &wire)
            .unwrap();

    let payload = trits_from_str(PLAINTEXT).unwrap();
    let seal = PacketSeal::Signature(channel.signer_mut());
    let mut packet = send.send_packet(&payload, seal).unwrap();
    packet[10] = trits::add(packet[10], 1);

    let err = recv.recv_packet(&packet).unwrap_err();
    assert!(matches!(err, MessageError::BadSignature));
    assert_eq!(err.class(), ErrorClass::Authentication);
}

#[test]
fn exhausted_signer_reports_resource_failure() {
    let sender_prng = prng(SENDER_KEY);
    // Height 0: a single one-time signature
    let mut channel = Channel::new(&sender_prng, 0, &trits_from_str("CHANAME").unwrap());
    let channel_id = channel.id().to_vec();
    let message_id = trits_from_str(MESSAGE_ID).unwrap();

    let (mut send, wire) = send_message(
        &sender_prng,
        &mut channel,
        &SenderIdentity::Channel,
        &message_id,
        0,
        &PskSet::new(),
        &PkePublicSet::new(),
    )
    .unwrap();
    let (mut recv, _) =
        recv_message(&channel_id, &message_id, &PskSet::new(), &PkeSecretSet::new(), &wire)
            .unwrap();

    let payload = trits_from_str("PAYLOAD9999").unwrap();
    let packet = send
        .send_packet(&payload, PacketSeal::Signature(channel.signer_mut()))
        .unwrap();
    assert_eq!(recv.recv_packet(&packet).unwrap(), payload);

    let err = send
        .send_packet(&payload, PacketSeal::Signature(channel.signer_mut()))
        .unwrap_err();
    assert!(matches!(err, MessageError::Signer(_)));
    assert_eq!(err.class(), ErrorClass::Resource);
}
