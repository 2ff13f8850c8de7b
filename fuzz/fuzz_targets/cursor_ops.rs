#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tagread_wire::{ByteCursor, ViewMark};

#[derive(Debug, Arbitrary)]
enum Op {
    ReadExact(u8),
    ReadToEnd,
    Skip(u16),
    PushLimit(u8),
    PushRegion(Option<u8>),
    Release,
    Abandon,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    data: Vec<u8>,
    ops: Vec<Op>,
}

// Fuzz target: arbitrary sequences of cursor operations.
//
// The offset never moves backwards and never passes the bytes supplied.
// A truncated read moves it not at all; only `skip` may fail part way.
fuzz_target!(|input: FuzzInput| {
    let total = input.data.len() as u64;
    let mut cursor = ByteCursor::new(&input.data[..]);
    let mut marks: Vec<ViewMark> = Vec::new();

    for op in input.ops {
        let before = cursor.offset();
        let all_or_nothing = !matches!(op, Op::Skip(_));
        let outcome = match op {
            Op::ReadExact(n) => cursor.read_exact(usize::from(n)).map(|_| ()),
            Op::ReadToEnd => cursor.read_to_end().map(|_| ()),
            Op::Skip(n) => cursor.skip(u64::from(n)),
            Op::PushLimit(n) => {
                marks.push(cursor.push_limit(u64::from(n)));
                Ok(())
            }
            Op::PushRegion(n) => cursor
                .push_region(n.map(usize::from))
                .map(|mark| marks.push(mark)),
            Op::Release => match marks.pop() {
                Some(mark) => cursor.release(mark),
                None => Ok(()),
            },
            Op::Abandon => {
                if let Some(mark) = marks.pop() {
                    cursor.abandon(mark);
                }
                Ok(())
            }
        };

        let after = cursor.offset();
        assert!(after >= before);
        assert!(after <= total);
        if let Err(err) = outcome {
            if all_or_nothing && err.is_truncated() {
                assert_eq!(after, before);
            }
        }
        assert_eq!(cursor.view_depth(), marks.len());
    }
});
