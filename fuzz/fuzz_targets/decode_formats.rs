#![no_main]

use libfuzzer_sys::fuzz_target;
use tagread_decoder::{DecodeOptions, Decoder, Record};
use tagread_tests::frame::Frame;
use tagread_tests::resource::{Descriptor, ResourceSection};
use tagread_tests::table::{Directory, Table};
use tagread_wire::ByteOrder;

// Fuzz target: decode every sample format from arbitrary bytes.
//
// Catches bugs in:
// - Counts and sizes taken from the input (huge, zero, negative)
// - Bounded view and region restoration on error paths
// - Padding past the end of input
// - Offsets running past the bytes actually supplied
fn check<T: Record>(data: &[u8], order: ByteOrder) {
    let options = DecodeOptions::default()
        .with_byte_order(order)
        .with_max_region(1 << 16);
    if let Ok((_, consumed)) = Decoder::new(options).decode_slice::<T>(data) {
        assert!(consumed <= data.len() as u64);
    }
}

fuzz_target!(|data: &[u8]| {
    for order in [ByteOrder::Little, ByteOrder::Big] {
        check::<Frame>(data, order);
        check::<ResourceSection>(data, order);
        check::<Descriptor>(data, order);
        check::<Table>(data, order);
        check::<Directory>(data, order);
    }
});
