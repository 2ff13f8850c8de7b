//! Fixture generator for the format tests.
//!
//! Writes every sample from `tagread_tests::fixtures` to
//! `tests/fixtures/<name>.hex` as one line of lowercase hex. Run it after
//! changing a sample builder; the snapshot files are updated separately
//! via `cargo insta review`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin generate_fixtures -p tagread-tests
//! ```
//!
//! | File                  | Contents                                      |
//! |-----------------------|-----------------------------------------------|
//! | resource_section.hex  | Two 8BIM blocks, big-endian                   |
//! | frame.hex             | v2 checksummed multiplexed frame, two chunks  |
//! | table.hex             | Two rows of five bytes                        |
//! | directory.hex         | Three entries with indexed sizes              |

#![allow(clippy::pedantic)]

use std::path::Path;

use tagread_tests::fixtures;

fn main() {
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let fixture_dir = manifest_dir.join("tests/fixtures");

    write_hex(&fixture_dir, "resource_section", &fixtures::sample_resource_section());
    write_hex(&fixture_dir, "frame", &fixtures::sample_frame());
    write_hex(&fixture_dir, "table", &fixtures::sample_table());
    write_hex(&fixture_dir, "directory", &fixtures::sample_directory());

    println!("All fixtures written to {}", fixture_dir.display());
}

fn write_hex(dir: &Path, name: &str, data: &[u8]) {
    std::fs::create_dir_all(dir).expect("create_dir_all");
    let path = dir.join(format!("{name}.hex"));
    std::fs::write(&path, format!("{}\n", hex::encode(data))).expect("write_file");
    println!("  wrote {}", path.display());
}
