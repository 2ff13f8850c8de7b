//! Image-resource style blocks.
//!
//! ```text
//!   ResourceSection
//!   ├── length: u32                     bytes of blocks that follow
//!   └── blocks: [ResourceBlock]         size = length
//!       ├── signature: [u8; 4]          "8BIM", checked after read
//!       ├── id: u16
//!       ├── name: PascalString          padded to an even size
//!       ├── data_size: u32
//!       └── data: [u8]                  size = data_size, padded to even
//! ```
//!
//! Sizes are big-endian in the files these come from.

use std::fmt;
use std::sync::OnceLock;

use tagread_decoder::{DecodeContext, HookError, Record, Schema};

pub const SIGNATURE: [u8; 4] = *b"8BIM";

/// One-byte length followed by that many bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PascalString {
    pub length: u8,
    pub chars: Vec<u8>,
}

impl PascalString {
    pub fn as_str(&self) -> String {
        String::from_utf8_lossy(&self.chars).into_owned()
    }
}

impl Record for PascalString {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<PascalString>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<PascalString>::builder("PascalString")
                .primitive("length", |r| &mut r.length)
                .sequence("chars", |r| &mut r.chars)
                .length("length")
                .build()
        })
    }
}

/// Four-byte code-unit count followed by UTF-16 code units.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnicodeString {
    pub length: u32,
    pub units: Vec<u16>,
}

impl UnicodeString {
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.units)
    }
}

impl Record for UnicodeString {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<UnicodeString>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<UnicodeString>::builder("UnicodeString")
                .primitive("length", |r| &mut r.length)
                .sequence("units", |r| &mut r.units)
                .length("length")
                .build()
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceBlock {
    pub signature: [u8; 4],
    pub id: u16,
    pub name: PascalString,
    pub data_size: u32,
    pub data: Vec<u8>,
}

impl Record for ResourceBlock {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<ResourceBlock>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<ResourceBlock>::builder("ResourceBlock")
                .array("signature", |r| &mut r.signature)
                .after("signature")
                .primitive("id", |r| &mut r.id)
                .record("name", |r| &mut r.name)
                .pad_to(2)
                .primitive("data_size", |r| &mut r.data_size)
                .sequence("data", |r| &mut r.data)
                .size("data_size")
                .pad_to(2)
                .hook("signature", check_signature)
                .build()
        })
    }
}

fn check_signature(block: &ResourceBlock, ctx: &DecodeContext<'_, '_>) -> Result<(), HookError> {
    if block.signature == SIGNATURE {
        return Ok(());
    }
    Err(format!(
        "expected signature 8BIM before offset {}, found {}",
        ctx.offset(),
        hex::encode(block.signature)
    )
    .into())
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceSection {
    pub length: u32,
    pub blocks: Vec<ResourceBlock>,
}

impl Record for ResourceSection {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<ResourceSection>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<ResourceSection>::builder("ResourceSection")
                .primitive("length", |r| &mut r.length)
                .records("blocks", |r| &mut r.blocks)
                .size("length")
                .build()
        })
    }
}

impl fmt::Display for ResourceSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "resource section, {} bytes, {} blocks",
            self.length,
            self.blocks.len()
        )?;
        for block in &self.blocks {
            writeln!(
                f,
                "  #{} {:?} {} bytes {}",
                block.id,
                block.name.as_str(),
                block.data_size,
                hex::encode(&block.data)
            )?;
        }
        Ok(())
    }
}

/// Class identifier: a named class when `length` is non-zero, otherwise
/// a four-byte code.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassId {
    pub length: u32,
    pub name: Vec<u8>,
    pub code: [u8; 4],
}

impl Record for ClassId {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<ClassId>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<ClassId>::builder("ClassId")
                .primitive("length", |r| &mut r.length)
                .sequence("name", |r| &mut r.name)
                .length("length")
                .when("named")
                .array("code", |r| &mut r.code)
                .when("!named")
                .condition("named", |r: &ClassId| r.length != 0)
                .build()
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Descriptor {
    pub name: UnicodeString,
    pub class: ClassId,
    pub item_count: u32,
}

impl Record for Descriptor {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Descriptor>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Descriptor>::builder("Descriptor")
                .record("name", |r| &mut r.name)
                .record("class", |r| &mut r.class)
                .primitive("item_count", |r| &mut r.item_count)
                .build()
        })
    }
}
