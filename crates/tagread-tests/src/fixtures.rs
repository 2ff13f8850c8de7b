//! Byte builders for the sample formats.
//!
//! Each builder lays out bytes exactly as the matching record schema reads
//! them, so decoding a builder's output must reproduce its inputs. The
//! fixed samples (`sample_*`) are also committed under `tests/fixtures/`
//! as hex by the `generate_fixtures` binary.

use crate::frame::{CHECKSUMMED, MAGIC, MULTIPLEXED};
use crate::resource::SIGNATURE;

// ── Frames (little-endian) ──────────────────────────────────────────────────

/// One chunk of a frame built by [`frame`].
#[derive(Clone, Copy, Debug)]
pub struct ChunkSpec<'a> {
    pub kind: u8,
    pub stream_id: u32,
    pub priority: u8,
    pub body: &'a [u8],
}

/// Lay out a frame. The checksum, when `flags` asks for one, is computed
/// from the chunk bodies.
pub fn frame(version: u8, flags: u8, chunks: &[ChunkSpec<'_>], trailer: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.push(version);
    out.push(flags);
    out.extend_from_slice(&u16_len(chunks.len()).to_le_bytes());
    if flags & CHECKSUMMED != 0 {
        let sum = chunks
            .iter()
            .flat_map(|c| c.body.iter())
            .fold(0u32, |acc, &b| acc.wrapping_add(u32::from(b)));
        out.extend_from_slice(&sum.to_le_bytes());
    }
    for chunk in chunks {
        out.push(chunk.kind);
        out.extend_from_slice(&u16_len(chunk.body.len()).to_le_bytes());
        if flags & MULTIPLEXED != 0 {
            out.extend_from_slice(&chunk.stream_id.to_le_bytes());
        }
        if version >= 3 {
            out.push(chunk.priority);
        }
        out.extend_from_slice(chunk.body);
    }
    out.extend_from_slice(trailer);
    out
}

/// Version 2, checksummed and multiplexed, two chunks and a CRLF trailer.
pub fn sample_frame() -> Vec<u8> {
    frame(
        2,
        CHECKSUMMED | MULTIPLEXED,
        &[
            ChunkSpec {
                kind: 1,
                stream_id: 7,
                priority: 0,
                body: b"abc",
            },
            ChunkSpec {
                kind: 2,
                stream_id: 9,
                priority: 0,
                body: &[0xFF, 0x01],
            },
        ],
        b"\r\n",
    )
}

/// A version 3 multiplexed frame with `chunks` chunks of `body_len` bytes.
pub fn large_frame(chunks: usize, body_len: usize) -> Vec<u8> {
    let body: Vec<u8> = (0..body_len).map(|i| (i % 251) as u8).collect();
    let specs: Vec<ChunkSpec<'_>> = (0..chunks)
        .map(|i| ChunkSpec {
            kind: 1 + (i % 4) as u8,
            stream_id: i as u32,
            priority: (i % 8) as u8,
            body: &body,
        })
        .collect();
    frame(3, CHECKSUMMED | MULTIPLEXED, &specs, &[])
}

// ── Resource sections (big-endian) ─────────────────────────────────────────

/// Lay out a resource section from `(id, name, data)` triples, padding
/// each name and data field to an even size.
pub fn resource_section(blocks: &[(u16, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for &(id, name, data) in blocks {
        body.extend_from_slice(&SIGNATURE);
        body.extend_from_slice(&id.to_be_bytes());
        body.push(u8::try_from(name.len()).unwrap_or(u8::MAX));
        body.extend_from_slice(name.as_bytes());
        if (1 + name.len()) % 2 != 0 {
            body.push(0);
        }
        body.extend_from_slice(&u32_len(data.len()).to_be_bytes());
        body.extend_from_slice(data);
        if data.len() % 2 != 0 {
            body.push(0);
        }
    }
    let mut out = u32_len(body.len()).to_be_bytes().to_vec();
    out.extend_from_slice(&body);
    out
}

/// Two blocks: `#1005 "res"` with five data bytes and an unnamed `#1028`.
pub fn sample_resource_section() -> Vec<u8> {
    resource_section(&[
        (1005, "res", &[1, 2, 3, 4, 5]),
        (1028, "", &[0xDE, 0xAD, 0xBE, 0xEF]),
    ])
}

/// `blocks` blocks of `data_len` bytes each.
pub fn large_resource_section(blocks: usize, data_len: usize) -> Vec<u8> {
    let data = vec![0xA5; data_len];
    let entries: Vec<(u16, &str, &[u8])> = (0..blocks)
        .map(|i| (1000 + (i % 1000) as u16, "block", data.as_slice()))
        .collect();
    resource_section(&entries)
}

// ── Tables (little-endian) ─────────────────────────────────────────────────

/// Rows of `(id, label)`, each padded out to `row_size` bytes with zeros.
pub fn table(row_size: u16, rows: &[(u16, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&u16_len(rows.len()).to_le_bytes());
    out.extend_from_slice(&row_size.to_le_bytes());
    for &(id, label) in rows {
        let mut row = id.to_le_bytes().to_vec();
        row.extend_from_slice(label);
        row.resize(usize::from(row_size), 0);
        out.extend_from_slice(&row);
    }
    out
}

pub fn sample_table() -> Vec<u8> {
    table(5, &[(1, b"abc"), (2, b"xyz")])
}

/// Three entries sized 1, 0 and 2 bytes.
pub fn sample_directory() -> Vec<u8> {
    vec![3, 1, 0, 2, 0, 0xAA, 0xBB, 0xCC]
}

fn u16_len(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

fn u32_len(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
