//! Wire protocol between the declaration-search router and an out-of-process
//! worker.
//!
//! Every message travels as one frame: a 4-byte little-endian length prefix
//! followed by a bincode-encoded [`Envelope`]. Live symbols never cross the
//! boundary; results are [`SerializableSymbol`] descriptors that the caller
//! resolves against its own copy of the snapshot.

use nova_core::{Fingerprint, ProjectId, SearchScope, SymbolFilter, SymbolKey};
use serde::{Deserialize, Serialize};

mod codec;
mod error;

pub use codec::{decode_frame, decode_message, encode_frame, encode_message};
pub use error::ProtoError;

// Hard limits enforced while decoding untrusted payloads. A malformed length
// prefix or collection count must fail fast instead of requesting an outsized
// allocation.

/// Maximum size of a single payload (not including the 4-byte length prefix).
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024 * 1024; // 64 MiB

/// Maximum number of descriptors in one `Declarations` reply.
pub const MAX_SYMBOLS_PER_MESSAGE: usize = 1_000_000;

/// Maximum number of segments in one symbol key.
pub const MAX_KEY_SEGMENTS: usize = 256;

/// Maximum UTF-8 byte length for small strings (names, patterns, messages).
pub const MAX_SMALL_STRING_BYTES: usize = 16 * 1024; // 16 KiB

/// Version carried by every [`Envelope`]; peers reject anything else.
pub const PROTOCOL_VERSION: u32 = 1;

/// A query that can be shipped to another process.
///
/// Predicate queries are closures and have no descriptor.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum QueryDescriptor {
    Exact(String),
    ExactIgnoreCase(String),
    Fuzzy(String),
}

impl QueryDescriptor {
    pub fn text(&self) -> &str {
        match self {
            QueryDescriptor::Exact(text)
            | QueryDescriptor::ExactIgnoreCase(text)
            | QueryDescriptor::Fuzzy(text) => text,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FindDeclarationsRequest {
    /// Identifies the solution snapshot the caller is searching.
    pub solution_checksum: Fingerprint,
    /// `None` searches every project of the solution.
    pub project: Option<ProjectId>,
    pub query: QueryDescriptor,
    pub filter: SymbolFilter,
    pub scope: SearchScope,
}

/// Process-independent stand-in for a live symbol.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SerializableSymbol {
    pub key: SymbolKey,
    pub project: ProjectId,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RpcMessage {
    FindDeclarations(FindDeclarationsRequest),
    Declarations(Vec<SerializableSymbol>),
    Error { message: String },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope {
    pub version: u32,
    pub message: RpcMessage,
}

impl Envelope {
    pub fn new(message: RpcMessage) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            message,
        }
    }
}
