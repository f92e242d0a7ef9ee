//! Neutral string bridge
//!
//! Neutral strings are host-allocated text buffers handed across the bridge
//! as a small `(id, length)` view. Whoever receives a storage from
//! [`NeutralStringHeap::allocate`] must release it exactly once. Ids are
//! never reused, so a second release is detected and reported.

use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::bridge::error::{BridgeError, BridgeResult};

/// Default cap on live neutral string bytes per instance.
pub const DEFAULT_NEUTRAL_LIMIT: usize = 1 << 20;

/// View over a host-allocated text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NeutralStringStorage {
    id: u64,
    len: usize,
}

impl NeutralStringStorage {
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Length of the buffer in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for NeutralStringStorage {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "neutral string #{} ({} bytes)", self.id, self.len)
    }
}

/// Byte encoding used for neutral buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringEncoding {
    /// One byte per character, truncating code points above 0xFF.
    #[default]
    Latin1,
    Utf8,
}

impl StringEncoding {
    pub fn encode(
        self,
        text: &str,
    ) -> Vec<u8> {
        match self {
            StringEncoding::Latin1 => text.chars().map(|c| c as u32 as u8).collect(),
            StringEncoding::Utf8 => text.as_bytes().to_vec(),
        }
    }

    pub fn decode(
        self,
        bytes: &[u8],
    ) -> String {
        match self {
            StringEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            StringEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

/// Buffers backing the neutral strings of one script instance.
#[derive(Debug)]
pub struct NeutralStringHeap {
    encoding: StringEncoding,
    buffers: HashMap<u64, Box<[u8]>>,
    next_id: u64,
    live_bytes: usize,
    limit: usize,
}

impl NeutralStringHeap {
    pub fn new(encoding: StringEncoding) -> Self {
        Self::with_limit(encoding, DEFAULT_NEUTRAL_LIMIT)
    }

    /// Create a heap that refuses to hold more than `limit` live bytes.
    pub fn with_limit(
        encoding: StringEncoding,
        limit: usize,
    ) -> Self {
        Self {
            encoding,
            buffers: HashMap::new(),
            next_id: 1,
            live_bytes: 0,
            limit,
        }
    }

    pub fn encoding(&self) -> StringEncoding {
        self.encoding
    }

    /// Number of storages allocated and not yet released.
    pub fn live_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_bytes(&self) -> usize {
        self.live_bytes
    }

    /// Copy `text` into a new buffer. The caller owns the returned storage.
    pub fn allocate(
        &mut self,
        text: &str,
    ) -> BridgeResult<NeutralStringStorage> {
        let bytes = self.encoding.encode(text);
        let requested = self.live_bytes + bytes.len();
        if requested > self.limit {
            return Err(BridgeError::AllocationFailure {
                what: "neutral string",
                requested,
                limit: self.limit,
            });
        }

        let storage = NeutralStringStorage {
            id: self.next_id,
            len: bytes.len(),
        };
        self.next_id += 1;
        self.live_bytes = requested;
        self.buffers.insert(storage.id, bytes.into_boxed_slice());
        trace!("neutral allocate: {}", storage);
        Ok(storage)
    }

    /// Free a storage. Releasing the same storage twice is an error.
    pub fn release(
        &mut self,
        storage: NeutralStringStorage,
    ) -> BridgeResult<()> {
        self.check(&storage)?;
        if let Some(buffer) = self.buffers.remove(&storage.id) {
            self.live_bytes -= buffer.len();
        }
        trace!("neutral release: {}", storage);
        Ok(())
    }

    /// Decode a storage. The storage stays valid afterwards.
    pub fn to_native_text(
        &self,
        storage: &NeutralStringStorage,
    ) -> BridgeResult<String> {
        Ok(self.encoding.decode(self.bytes(storage)?))
    }

    /// Raw bytes of a live storage.
    pub fn bytes(
        &self,
        storage: &NeutralStringStorage,
    ) -> BridgeResult<&[u8]> {
        match self.buffers.get(&storage.id) {
            Some(buffer) if buffer.len() == storage.len => Ok(&buffer[..]),
            _ => Err(BridgeError::InvalidStorage(*storage)),
        }
    }

    fn check(
        &self,
        storage: &NeutralStringStorage,
    ) -> BridgeResult<()> {
        match self.buffers.get(&storage.id) {
            Some(buffer) if buffer.len() == storage.len => Ok(()),
            Some(_) => Err(BridgeError::InvalidStorage(*storage)),
            None if storage.id != 0 && storage.id < self.next_id => {
                Err(BridgeError::DoubleRelease(*storage))
            }
            None => Err(BridgeError::InvalidStorage(*storage)),
        }
    }
}
