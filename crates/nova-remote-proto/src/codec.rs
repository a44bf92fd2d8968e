use bincode::Options;
use serde::Serialize;

use crate::{
    Envelope, ProtoError, RpcMessage, SerializableSymbol, MAX_KEY_SEGMENTS,
    MAX_MESSAGE_BYTES, MAX_SMALL_STRING_BYTES, MAX_SYMBOLS_PER_MESSAGE, PROTOCOL_VERSION,
};

const LEN_PREFIX: usize = 4;

fn bincode_options() -> impl bincode::Options + Copy {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

fn bincode_options_limited() -> impl bincode::Options + Copy {
    bincode_options()
        .with_limit(MAX_MESSAGE_BYTES as u64)
        .reject_trailing_bytes()
}

/// Borrowed twin of [`Envelope`]; encodes to identical bytes.
#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    message: &'a RpcMessage,
}

/// Prefixes `payload` with its little-endian `u32` length.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, ProtoError> {
    if payload.len() > MAX_MESSAGE_BYTES {
        return Err(ProtoError::FrameTooLarge {
            len: payload.len(),
            max: MAX_MESSAGE_BYTES,
        });
    }
    let mut out = Vec::with_capacity(LEN_PREFIX + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// Returns the payload of a single complete frame.
pub fn decode_frame(frame: &[u8]) -> Result<&[u8], ProtoError> {
    let Some((prefix, payload)) = frame.split_first_chunk::<LEN_PREFIX>() else {
        return Err(ProtoError::LengthMismatch {
            declared: LEN_PREFIX,
            actual: frame.len(),
        });
    };
    let declared = u32::from_le_bytes(*prefix) as usize;
    if declared > MAX_MESSAGE_BYTES {
        return Err(ProtoError::FrameTooLarge {
            len: declared,
            max: MAX_MESSAGE_BYTES,
        });
    }
    if declared != payload.len() {
        return Err(ProtoError::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }
    Ok(payload)
}

/// Encodes `message` into a complete frame.
///
/// Messages a peer would reject for exceeding protocol limits are rejected
/// here as well.
pub fn encode_message(message: &RpcMessage) -> Result<Vec<u8>, ProtoError> {
    validate_message(message)?;
    let payload = bincode_options().serialize(&EnvelopeRef {
        version: PROTOCOL_VERSION,
        message,
    })?;
    encode_frame(&payload)
}

/// Decodes one complete frame produced by [`encode_message`].
pub fn decode_message(frame: &[u8]) -> Result<RpcMessage, ProtoError> {
    let payload = decode_frame(frame)?;

    // Check the version before the body so a newer peer gets a clear error
    // rather than a bincode failure on an unfamiliar layout.
    if let Some(version) = payload.first_chunk::<4>() {
        let found = u32::from_le_bytes(*version);
        if found != PROTOCOL_VERSION {
            return Err(ProtoError::UnsupportedVersion {
                expected: PROTOCOL_VERSION,
                found,
            });
        }
    }

    let envelope: Envelope = bincode_options_limited().deserialize(payload)?;
    validate_message(&envelope.message)?;
    Ok(envelope.message)
}

fn check_len(what: &'static str, len: usize, max: usize) -> Result<(), ProtoError> {
    if len > max {
        Err(ProtoError::LimitExceeded { what, len, max })
    } else {
        Ok(())
    }
}

fn check_str(what: &'static str, value: &str) -> Result<(), ProtoError> {
    check_len(what, value.len(), MAX_SMALL_STRING_BYTES)
}

fn validate_message(message: &RpcMessage) -> Result<(), ProtoError> {
    match message {
        RpcMessage::FindDeclarations(request) => check_str("query text", request.query.text()),
        RpcMessage::Declarations(symbols) => {
            check_len("declarations", symbols.len(), MAX_SYMBOLS_PER_MESSAGE)?;
            symbols.iter().try_for_each(validate_symbol)
        }
        RpcMessage::Error { message } => check_str("error message", message),
    }
}

fn validate_symbol(symbol: &SerializableSymbol) -> Result<(), ProtoError> {
    let segments = symbol.key.segments();
    check_len("key segments", segments.len(), MAX_KEY_SEGMENTS)?;
    for segment in segments {
        check_str("segment name", &segment.name)?;
        check_len("parameters", segment.parameters.len(), MAX_KEY_SEGMENTS)?;
        for param in &segment.parameters {
            check_str("parameter", param)?;
        }
    }
    Ok(())
}
