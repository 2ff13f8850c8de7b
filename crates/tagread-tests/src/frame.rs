//! Chunked network frames.
//!
//! ```text
//!   Frame (little-endian)
//!   ├── magic: [u8; 2]        "TR"
//!   ├── version: u8
//!   ├── flags: u8             bit 0 checksummed, bit 1 multiplexed
//!   ├── chunk_count: u16
//!   ├── checksum: u32         only when checksummed
//!   ├── chunks: [Chunk]       length = chunk_count
//!   │   ├── kind: u8          0 is reserved
//!   │   ├── length: u16
//!   │   ├── stream_id: u32    only when the frame is multiplexed
//!   │   ├── priority: u8      only from frame version 3
//!   │   └── body: [u8]        size = length
//!   └── trailer: [u8]         everything left
//! ```
//!
//! Chunks look at the frame's `flags` and `version` through the decode
//! context; the checksum is the wrapping sum of every body byte.

use std::fmt;
use std::sync::OnceLock;

use tagread_decoder::{DecodeContext, HookError, Record, Schema};
use tagread_wire::Scalar;

pub const MAGIC: [u8; 2] = *b"TR";
pub const CHECKSUMMED: u8 = 0b01;
pub const MULTIPLEXED: u8 = 0b10;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Chunk {
    pub kind: u8,
    pub length: u16,
    pub stream_id: u32,
    pub priority: u8,
    pub body: Vec<u8>,
}

impl Record for Chunk {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Chunk>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Chunk>::builder("Chunk")
                .primitive("kind", |r| &mut r.kind)
                .primitive("length", |r| &mut r.length)
                .primitive("stream_id", |r| &mut r.stream_id)
                .when("multiplexed")
                .primitive("priority", |r| &mut r.priority)
                .when("prioritized")
                .sequence("body", |r| &mut r.body)
                .size("length")
                .condition_ctx("multiplexed", |_: &Chunk, ctx| {
                    outer_u64(ctx, "flags") & u64::from(MULTIPLEXED) != 0
                })
                .condition_ctx("prioritized", |_: &Chunk, ctx| outer_u64(ctx, "version") >= 3)
                .build()
        })
    }

    fn verify(&self, _ctx: &DecodeContext<'_, '_>) -> Result<(), HookError> {
        if self.kind == 0 {
            return Err("chunk kind 0 is reserved".into());
        }
        Ok(())
    }
}

fn outer_u64(ctx: &DecodeContext<'_, '_>, field: &str) -> u64 {
    match ctx.outer(field) {
        Some(Scalar::Unsigned(v)) => v,
        _ => 0,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub magic: [u8; 2],
    pub version: u8,
    pub flags: u8,
    pub chunk_count: u16,
    pub checksum: u32,
    pub chunks: Vec<Chunk>,
    pub trailer: Vec<u8>,
}

impl Frame {
    pub fn is_checksummed(&self) -> bool {
        self.flags & CHECKSUMMED != 0
    }

    /// Wrapping sum of every chunk body byte.
    pub fn body_sum(&self) -> u32 {
        self.chunks
            .iter()
            .flat_map(|c| c.body.iter())
            .fold(0u32, |acc, &b| acc.wrapping_add(u32::from(b)))
    }
}

impl Record for Frame {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Frame>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Frame>::builder("Frame")
                .array("magic", |r| &mut r.magic)
                .after("magic")
                .primitive("version", |r| &mut r.version)
                .primitive("flags", |r| &mut r.flags)
                .primitive("chunk_count", |r| &mut r.chunk_count)
                .primitive("checksum", |r| &mut r.checksum)
                .when("checksummed")
                .records("chunks", |r| &mut r.chunks)
                .length("chunk_count")
                .sequence("trailer", |r| &mut r.trailer)
                .size_to_end()
                .condition("checksummed", Frame::is_checksummed)
                .hook("magic", |r: &Frame, _| {
                    if r.magic == MAGIC {
                        Ok(())
                    } else {
                        Err(format!("bad magic {}", hex::encode(r.magic)).into())
                    }
                })
                .build()
        })
    }

    fn verify(&self, _ctx: &DecodeContext<'_, '_>) -> Result<(), HookError> {
        if self.is_checksummed() && self.checksum != self.body_sum() {
            return Err(format!(
                "checksum {:#010x} does not match body sum {:#010x}",
                self.checksum,
                self.body_sum()
            )
            .into());
        }
        Ok(())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "frame v{} flags={:#04x} checksum={:#010x}",
            self.version, self.flags, self.checksum
        )?;
        for chunk in &self.chunks {
            writeln!(
                f,
                "  chunk kind={} stream={} priority={} {}",
                chunk.kind,
                chunk.stream_id,
                chunk.priority,
                hex::encode(&chunk.body)
            )?;
        }
        writeln!(f, "  trailer {}", hex::encode(&self.trailer))
    }
}
