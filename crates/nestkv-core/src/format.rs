//! Canonical byte encoding of a database
//!
//! Used to fingerprint a database (two databases with equal encodings have
//! the same contents in the same listing order). It is an in-memory encoding
//! only; nothing reads it back into a database.
//!
//! Layout: Header (16 bytes) + records
//!
//! Records, in order:
//!   Namespace    tag(u8=1) + name_len(u32 LE) + name + sub_count(u32 LE) + entry_count(u32 LE)
//!   SubNamespace tag(u8=2) + name_len(u32 LE) + name + entry_count(u32 LE)
//!   Entry        tag(u8=3) + key_len(u32 LE) + value_len(u32 LE) + key + value
//!
//! Namespaces come newest first. Each namespace record is followed by its
//! sub-namespaces in creation order (each followed by its entries), then by
//! its own entries. Entries are always newest first.

use crate::database::Database;
use crate::entry::EntryStore;

/// Magic bytes identifying a NestKV encoding: "NSKV" in ASCII
pub const MAGIC_ARRAY: [u8; 4] = *b"NSKV";

/// Current layout version
pub const FORMAT_VERSION: u8 = 1;

/// Header size in bytes
pub const HEADER_SIZE: usize = 16;

/// Record type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordTag {
    Namespace = 1,
    SubNamespace = 2,
    Entry = 3,
}

/// Fixed-size header at the start of every encoding
///
/// Layout:
///   [0..4]   magic:          [u8;4] - "NSKV"
///   [4]      version:        u8
///   [5..8]   reserved:       [u8;3] - zero
///   [8..12]  namespace_count u32
///   [12..16] body_checksum:  u32    - CRC32C of everything after the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 4],
    pub version: u8,
    pub namespace_count: u32,
    pub body_checksum: u32,
}

impl Header {
    /// Serialize header to bytes
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.magic);
        buf[4] = self.version;
        buf[8..12].copy_from_slice(&self.namespace_count.to_le_bytes());
        buf[12..16].copy_from_slice(&self.body_checksum.to_le_bytes());
        buf
    }

    /// Parse the header at the start of `data`, if there is one.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let bytes: &[u8; HEADER_SIZE] = data.get(..HEADER_SIZE)?.try_into().ok()?;
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        if magic != MAGIC_ARRAY {
            return None;
        }
        Some(Self {
            magic,
            version: bytes[4],
            namespace_count: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            body_checksum: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        })
    }
}

/// Encode the whole database.
pub fn encode(db: &Database) -> Vec<u8> {
    let namespaces = db.ordered_namespaces();

    let mut body = Vec::new();
    for (name, ns) in &namespaces {
        let subs = ns.subs();
        body.push(RecordTag::Namespace as u8);
        put_str(&mut body, name);
        body.extend_from_slice(&(subs.len() as u32).to_le_bytes());
        body.extend_from_slice(&(ns.entries().len() as u32).to_le_bytes());

        for (sub_name, sub) in subs {
            body.push(RecordTag::SubNamespace as u8);
            put_str(&mut body, sub_name);
            body.extend_from_slice(&(sub.entries().len() as u32).to_le_bytes());
            put_entries(&mut body, sub.entries());
        }
        put_entries(&mut body, ns.entries());
    }

    let header = Header {
        magic: MAGIC_ARRAY,
        version: FORMAT_VERSION,
        namespace_count: namespaces.len() as u32,
        body_checksum: crc32c::crc32c(&body),
    };

    let mut buffer = Vec::with_capacity(HEADER_SIZE + body.len());
    buffer.extend_from_slice(&header.to_bytes());
    buffer.extend_from_slice(&body);
    buffer
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

fn put_entries(buf: &mut Vec<u8>, entries: &EntryStore) {
    for (key, value) in entries.ordered() {
        buf.push(RecordTag::Entry as u8);
        buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
        buf.extend_from_slice(key.as_bytes());
        buf.extend_from_slice(value.as_bytes());
    }
}
