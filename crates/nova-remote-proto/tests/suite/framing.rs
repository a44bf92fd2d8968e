use nova_core::{Fingerprint, KeySegment, ProjectId, SearchScope, SymbolFilter, SymbolKey, SymbolKind};
use nova_remote_proto::{
    decode_frame, decode_message, encode_frame, encode_message, FindDeclarationsRequest,
    ProtoError, QueryDescriptor, RpcMessage, SerializableSymbol, MAX_MESSAGE_BYTES,
    MAX_SMALL_STRING_BYTES, PROTOCOL_VERSION,
};

fn request() -> RpcMessage {
    RpcMessage::FindDeclarations(FindDeclarationsRequest {
        solution_checksum: Fingerprint::from_bytes(b"solution"),
        project: None,
        query: QueryDescriptor::ExactIgnoreCase("testcase".into()),
        filter: SymbolFilter::TYPE_AND_MEMBER,
        scope: SearchScope::SourceAndMetadata,
    })
}

fn declarations() -> RpcMessage {
    let key = SymbolKey::new(vec![
        KeySegment::new(SymbolKind::Namespace, "TestCases"),
        KeySegment::new(SymbolKind::Class, "TestCase"),
        KeySegment::new(SymbolKind::Method, "Test").with_parameters(["string[]"]),
    ]);
    RpcMessage::Declarations(vec![
        SerializableSymbol {
            key: key.clone(),
            project: ProjectId::new(1),
        },
        SerializableSymbol {
            key,
            project: ProjectId::new(2),
        },
    ])
}

#[test]
fn messages_survive_framing() {
    for message in [
        request(),
        declarations(),
        RpcMessage::Declarations(Vec::new()),
        RpcMessage::Error {
            message: "unknown solution snapshot".into(),
        },
    ] {
        let frame = encode_message(&message).unwrap();
        assert_eq!(decode_message(&frame).unwrap(), message);
    }
}

#[test]
fn frame_prefix_is_little_endian_payload_length() {
    let frame = encode_message(&request()).unwrap();
    let declared = u32::from_le_bytes(frame[..4].try_into().unwrap()) as usize;
    assert_eq!(declared, frame.len() - 4);
    assert_eq!(&frame[4..8], &PROTOCOL_VERSION.to_le_bytes());
}

#[test]
fn decode_rejects_truncated_frame() {
    let frame = encode_message(&declarations()).unwrap();
    for len in 0..frame.len() {
        assert!(decode_message(&frame[..len]).is_err(), "len={len}");
    }
}

#[test]
fn decode_rejects_trailing_bytes() {
    let mut frame = encode_message(&request()).unwrap();
    frame.push(0);
    assert!(matches!(
        decode_message(&frame),
        Err(ProtoError::LengthMismatch { .. })
    ));

    // Trailing bytes inside a correctly sized frame are rejected too.
    let mut payload = decode_frame(&encode_message(&request()).unwrap())
        .unwrap()
        .to_vec();
    payload.push(0);
    let reframed = encode_frame(&payload).unwrap();
    assert!(matches!(
        decode_message(&reframed),
        Err(ProtoError::Bincode(_))
    ));
}

#[test]
fn decode_rejects_invalid_payload() {
    let mut payload = PROTOCOL_VERSION.to_le_bytes().to_vec();
    payload.push(0xff);
    let frame = encode_frame(&payload).unwrap();
    assert!(matches!(decode_message(&frame), Err(ProtoError::Bincode(_))));
}

#[test]
fn decode_rejects_oversized_len_prefix() {
    let oversized = (MAX_MESSAGE_BYTES as u32).saturating_add(1);
    let bytes = oversized.to_le_bytes();
    assert!(matches!(
        decode_message(&bytes),
        Err(ProtoError::FrameTooLarge { .. })
    ));
}

#[test]
fn decode_rejects_other_versions() {
    let frame = encode_message(&request()).unwrap();
    let mut newer = frame.clone();
    newer[4..8].copy_from_slice(&(PROTOCOL_VERSION + 1).to_le_bytes());
    assert!(matches!(
        decode_message(&newer),
        Err(ProtoError::UnsupportedVersion { found, .. }) if found == PROTOCOL_VERSION + 1
    ));
}

#[test]
fn decode_enforces_string_limits() {
    // Build an over-limit message by hand; the encoder would refuse it.
    let long = "x".repeat(MAX_SMALL_STRING_BYTES + 1);
    let mut payload = PROTOCOL_VERSION.to_le_bytes().to_vec();
    payload.extend_from_slice(&2u32.to_le_bytes()); // RpcMessage::Error
    payload.extend_from_slice(&(long.len() as u64).to_le_bytes());
    payload.extend_from_slice(long.as_bytes());
    let frame = encode_frame(&payload).unwrap();

    assert!(matches!(
        decode_message(&frame),
        Err(ProtoError::LimitExceeded { what: "error message", .. })
    ));
}

#[test]
fn invalid_filter_bits_are_rejected() {
    let frame = encode_message(&request()).unwrap();
    // The filter byte sits right before the scope tag (u32) at the end.
    let mut bad = frame.clone();
    let filter_at = bad.len() - 5;
    assert_eq!(bad[filter_at], SymbolFilter::TYPE_AND_MEMBER.bits());
    bad[filter_at] = 0x80;
    assert!(decode_message(&bad).is_err());
}
