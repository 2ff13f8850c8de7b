//! Tables whose rows are framed by an explicit per-row byte size.
//!
//! `Table` gives every row the same size through a sibling field;
//! `Directory` looks each entry's size up in a size list by index.

use std::sync::OnceLock;

use tagread_decoder::{Record, Schema};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    pub id: u16,
    pub label: Vec<u8>,
}

impl Record for Row {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Row>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Row>::builder("Row")
                .primitive("id", |r| &mut r.id)
                .sequence("label", |r| &mut r.label)
                .size_to_end()
                .build()
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    pub row_count: u16,
    pub row_size: u16,
    pub rows: Vec<Row>,
}

impl Record for Table {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Table>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Table>::builder("Table")
                .primitive("row_count", |r| &mut r.row_count)
                .primitive("row_size", |r| &mut r.row_size)
                .records("rows", |r| &mut r.rows)
                .length("row_count")
                .element_size("row_size")
                .build()
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Entry {
    pub bytes: Vec<u8>,
}

impl Record for Entry {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Entry>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Entry>::builder("Entry")
                .sequence("bytes", |r| &mut r.bytes)
                .size_to_end()
                .build()
        })
    }
}

/// Up to four entries, each sized by the matching slot of `sizes`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Directory {
    pub count: u8,
    pub sizes: [u8; 4],
    pub entries: Vec<Entry>,
}

impl Record for Directory {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Directory>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Directory>::builder("Directory")
                .primitive("count", |r| &mut r.count)
                .array("sizes", |r| &mut r.sizes)
                .records("entries", |r| &mut r.entries)
                .length("count")
                .element_size("entry_size()")
                .indexed_resolver("entry_size", |r: &Directory, _, index| {
                    r.sizes.get(index).copied().unwrap_or(0)
                })
                .build()
        })
    }
}
