#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tagread_decoder::Decoder;
use tagread_tests::fixtures::{self, ChunkSpec};
use tagread_tests::frame::Frame;

#[derive(Debug, Arbitrary)]
struct FuzzChunk {
    kind: u8,
    stream_id: u32,
    priority: u8,
    body: Vec<u8>,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    version: u8,
    flags: u8,
    chunks: Vec<FuzzChunk>,
    trailer: Vec<u8>,
}

// Fuzz target: build a frame from arbitrary parts, decode it, and compare.
//
// Chunk kind 0 is reserved and must be rejected by verification; any other
// frame decodes back to exactly what was built.
fuzz_target!(|input: FuzzInput| {
    if input.chunks.len() > usize::from(u16::MAX)
        || input.chunks.iter().any(|c| c.body.len() > usize::from(u16::MAX))
    {
        return;
    }
    let flags = input.flags & 0b11;
    let specs: Vec<ChunkSpec<'_>> = input
        .chunks
        .iter()
        .map(|c| ChunkSpec {
            kind: c.kind,
            stream_id: c.stream_id,
            priority: c.priority,
            body: &c.body,
        })
        .collect();
    let wire = fixtures::frame(input.version, flags, &specs, &input.trailer);

    let result = Decoder::default().decode_slice::<Frame>(&wire);
    if input.chunks.iter().any(|c| c.kind == 0) {
        assert!(result.is_err());
        return;
    }

    let (frame, consumed) = result.unwrap();
    assert_eq!(consumed, wire.len() as u64);
    assert_eq!(frame.version, input.version);
    assert_eq!(frame.flags, flags);
    assert_eq!(frame.chunks.len(), input.chunks.len());
    for (got, want) in frame.chunks.iter().zip(&input.chunks) {
        assert_eq!(got.kind, want.kind);
        assert_eq!(got.body, want.body);
        if flags & 0b10 != 0 {
            assert_eq!(got.stream_id, want.stream_id);
        }
        if input.version >= 3 {
            assert_eq!(got.priority, want.priority);
        }
    }
    assert_eq!(frame.trailer, input.trailer);
});
