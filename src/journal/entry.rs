//! Journal entry definitions
//!
//! Defines a single journal entry and its on-disk frame.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Frame header: LSN (8) + Len (4) + Header CRC (4) + CRC (4)
pub const HEADER_SIZE: usize = 20;

/// Bytes covered by the header CRC: LSN + Len
const CHECKED_HEADER: usize = 12;

/// A single entry in the journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Log Sequence Number - monotonically increasing, starts at 1
    pub lsn: u64,

    /// Timestamp (unix millis) when the entry was created
    pub timestamp_ms: u64,

    /// The record payload as it was handed to `save`
    pub payload: Vec<u8>,
}

/// Outcome of decoding the frame at the start of a byte slice
#[derive(Debug)]
pub enum Frame {
    /// A complete, checksummed entry spanning `len` bytes
    Entry { entry: JournalEntry, len: usize },

    /// A frame of `len` bytes with a sound header but bad contents.
    /// Scanning can continue after it.
    Corrupt { len: usize, reason: String },

    /// The header itself failed its checksum. Its length cannot be
    /// trusted, so nothing after it can be located.
    Damaged { reason: String },

    /// Not enough bytes for a whole frame (torn write at the tail)
    Incomplete,
}

impl JournalEntry {
    pub fn new(lsn: u64, payload: &[u8]) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            lsn,
            timestamp_ms,
            payload: payload.to_vec(),
        }
    }

    /// Encode this entry as a complete frame
    pub fn encode(&self) -> Result<Bytes> {
        let data = bincode::serialize(self)?;

        let mut frame = BytesMut::with_capacity(HEADER_SIZE + data.len());
        frame.put_u64_le(self.lsn);
        frame.put_u32_le(data.len() as u32);

        let header_crc = crc32fast::hash(&frame[..CHECKED_HEADER]);
        frame.put_u32_le(header_crc);
        frame.put_u32_le(frame_crc(&frame[..CHECKED_HEADER], &data));
        frame.put_slice(&data);

        Ok(frame.freeze())
    }

    /// Decode the frame at the start of `buf`
    pub fn decode(buf: &[u8]) -> Frame {
        if buf.len() < HEADER_SIZE {
            return Frame::Incomplete;
        }

        let checked = &buf[..CHECKED_HEADER];
        let mut header = &buf[..HEADER_SIZE];
        let lsn = header.get_u64_le();
        let data_len = header.get_u32_le() as usize;
        let header_crc = header.get_u32_le();
        let crc = header.get_u32_le();

        if crc32fast::hash(checked) != header_crc {
            return Frame::Damaged {
                reason: format!("header checksum mismatch (claimed LSN {})", lsn),
            };
        }

        let len = HEADER_SIZE + data_len;
        if buf.len() < len {
            return Frame::Incomplete;
        }

        let data = &buf[HEADER_SIZE..len];
        let actual = frame_crc(checked, data);
        if actual != crc {
            return Frame::Corrupt {
                len,
                reason: format!(
                    "CRC mismatch at LSN {}: stored {:08x}, computed {:08x}",
                    lsn, crc, actual
                ),
            };
        }

        match bincode::deserialize::<JournalEntry>(data) {
            Ok(entry) if entry.lsn == lsn => Frame::Entry { entry, len },
            Ok(entry) => Frame::Corrupt {
                len,
                reason: format!("header LSN {} disagrees with entry LSN {}", lsn, entry.lsn),
            },
            Err(e) => Frame::Corrupt {
                len,
                reason: format!("undecodable entry at LSN {}: {}", lsn, e),
            },
        }
    }
}

/// CRC32 over the LSN/Len header followed by the data
fn frame_crc(header: &[u8], data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(header);
    hasher.update(data);
    hasher.finalize()
}
