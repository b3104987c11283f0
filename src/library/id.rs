use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::Serialize;

const ID_BYTES: usize = 12;
const ID_HEX_LEN: usize = ID_BYTES * 2;
const COUNTER_MASK: u32 = 0x00FF_FFFF;

static PROCESS_UNIQUE: LazyLock<[u8; 5]> = LazyLock::new(rand::random::<[u8; 5]>);

static COUNTER: LazyLock<AtomicU32> = LazyLock::new(|| AtomicU32::new(rand::random::<u32>()));

/// Identifier of a stored book.
///
/// Laid out like a document-store object id: 4 bytes of creation time in
/// seconds, 5 bytes unique to the running process and a 3 byte counter,
/// rendered as 24 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    pub fn generate() -> Self {
        let secs = chrono::Utc::now().timestamp() as u32;
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; ID_BYTES];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);

        BookId(hex::encode(bytes))
    }

    /// Accepts 24 hex characters, or any 12-byte string taken as the raw id
    /// bytes. Everything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() == ID_HEX_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Some(BookId(raw.to_ascii_lowercase()));
        }
        if raw.len() == ID_BYTES {
            return Some(BookId(hex::encode(raw.as_bytes())));
        }
        None
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
