//! Annotation semantics and error paths: conditions, resolvers, hooks,
//! schema errors, limits and fail-hard mode.

use std::sync::OnceLock;

use tagread_decoder::{
    Annotation, DecodeContext, DecodeError, DecodeMode, DecodeOptions, Decoder, FieldKind,
    HookError, Record, Schema, SchemaError,
};
use tagread_tests::fixtures::{self, ChunkSpec};
use tagread_tests::frame::{CHECKSUMMED, Frame};
use tagread_tests::resource::{ClassId, ResourceSection};
use tagread_wire::{ByteCursor, ByteOrder, Scalar};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    static ONCE: OnceLock<()> = OnceLock::new();
    ONCE.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

fn decode_with<T: Record>(bytes: &[u8], options: DecodeOptions) -> (T, u64) {
    init_tracing();
    Decoder::new(options)
        .decode_slice(bytes)
        .unwrap_or_else(|e| panic!("decode of {} failed: {e}", T::schema().name()))
}

fn decode<T: Record>(bytes: &[u8]) -> (T, u64) {
    decode_with(bytes, DecodeOptions::default())
}

fn decode_err_with<T: Record>(bytes: &[u8], options: DecodeOptions) -> (DecodeError, u64) {
    init_tracing();
    let mut cursor = ByteCursor::new(bytes);
    let mut dest = T::default();
    let err = Decoder::new(options)
        .decode(&mut dest, &mut cursor)
        .expect_err("decode should fail");
    (err, cursor.offset())
}

fn decode_err<T: Record>(bytes: &[u8]) -> (DecodeError, u64) {
    decode_err_with::<T>(bytes, DecodeOptions::default())
}

// ── Conditions ────────────────────────────────────────────────────────────────

#[test]
fn false_condition_skips_field_without_consuming() {
    let bytes = fixtures::frame(
        2,
        0,
        &[ChunkSpec {
            kind: 1,
            stream_id: 0,
            priority: 0,
            body: b"xy",
        }],
        &[],
    );
    let (frame, offset) = decode::<Frame>(&bytes);
    assert_eq!(frame.checksum, 0);
    assert_eq!(frame.chunks[0].stream_id, 0);
    assert_eq!(frame.chunks[0].body, b"xy");
    assert_eq!(offset, bytes.len() as u64);
    // magic, version, flags, count; kind, length, body
    assert_eq!(bytes.len(), 6 + 5);
}

#[test]
fn negated_condition_takes_the_other_branch() {
    let (named, offset) = decode::<ClassId>(&[3, 0, 0, 0, b'a', b'b', b'c']);
    assert_eq!(named.name, b"abc");
    assert_eq!(named.code, [0; 4]);
    assert_eq!(offset, 7);

    let (coded, offset) = decode::<ClassId>(&[0, 0, 0, 0, b'n', b'u', b'l', b'l']);
    assert!(coded.name.is_empty());
    assert_eq!(&coded.code, b"null");
    assert_eq!(offset, 8);
}

#[test]
fn condition_reads_outer_record_values() {
    let chunk = ChunkSpec {
        kind: 3,
        stream_id: 0,
        priority: 6,
        body: &[1, 2],
    };
    let (v2, _) = decode::<Frame>(&fixtures::frame(2, 0, &[chunk], &[]));
    let (v3, _) = decode::<Frame>(&fixtures::frame(3, 0, &[chunk], &[]));
    assert_eq!(v2.chunks[0].priority, 0);
    assert_eq!(v3.chunks[0].priority, 6);
    assert_eq!(v2.chunks[0].body, v3.chunks[0].body);
}

// ── Resolvers ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Body {
    data: Vec<u8>,
}

impl Record for Body {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Body>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Body>::builder("Body")
                .sequence("data", |r| &mut r.data)
                .length("data_len()")
                .resolver_ctx("data_len", |_: &Body, ctx: &DecodeContext<'_, '_>| {
                    match (ctx.root(), ctx.depth(), ctx.outer("version")) {
                        (Some("Versioned"), 2, Some(Scalar::Unsigned(v))) => v,
                        _ => 0,
                    }
                })
                .build()
        })
    }
}

#[derive(Debug, Default)]
struct Versioned {
    version: u16,
    body: Body,
}

impl Record for Versioned {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Versioned>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Versioned>::builder("Versioned")
                .primitive("version", |r| &mut r.version)
                .record("body", |r| &mut r.body)
                .build()
        })
    }
}

#[test]
fn context_resolver_sees_root_depth_and_outer_values() {
    let (rec, offset) = decode::<Versioned>(&[3, 0, 7, 8, 9, 10]);
    assert_eq!(rec.version, 3);
    assert_eq!(rec.body.data, [7, 8, 9]);
    assert_eq!(offset, 5);
}

#[test]
fn outer_values_are_absent_when_decoded_as_root() {
    let (rec, offset) = decode::<Body>(&[1, 2, 3]);
    assert!(rec.data.is_empty());
    assert_eq!(offset, 0);
}

#[derive(Debug, Default)]
struct Counted {
    count: i8,
    data: Vec<u8>,
}

impl Record for Counted {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Counted>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Counted>::builder("Counted")
                .primitive("count", |r| &mut r.count)
                .sequence("data", |r| &mut r.data)
                .length("count")
                .build()
        })
    }
}

#[derive(Debug, Default)]
struct Ratioed {
    ratio: f32,
    data: Vec<u8>,
}

impl Record for Ratioed {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Ratioed>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Ratioed>::builder("Ratioed")
                .primitive("ratio", |r| &mut r.ratio)
                .sequence("data", |r| &mut r.data)
                .length("ratio")
                .build()
        })
    }
}

#[test]
fn signed_count_is_accepted() {
    let (rec, offset) = decode::<Counted>(&[2, 0xAA, 0xBB, 0xCC]);
    assert_eq!(rec.data, [0xAA, 0xBB]);
    assert_eq!(offset, 3);
}

#[test]
fn negative_count_is_rejected() {
    let (err, offset) = decode_err::<Counted>(&[0xFF, 1, 2]);
    assert!(
        matches!(
            err,
            DecodeError::NegativeCount {
                field: "data",
                annotation: Annotation::Length,
                value: -1,
                ..
            }
        ),
        "got {err}"
    );
    assert_eq!(offset, 1);
}

#[test]
fn float_count_is_a_schema_error() {
    let mut bytes = 2f32.to_le_bytes().to_vec();
    bytes.extend_from_slice(&[1, 2]);
    let (err, offset) = decode_err::<Ratioed>(&bytes);
    assert!(
        matches!(
            err,
            DecodeError::Schema(SchemaError::NotAnInteger {
                field: "data",
                found: "float",
                ..
            })
        ),
        "got {err}"
    );
    assert_eq!(offset, 4);
}

#[derive(Debug, Default)]
struct Dangling {
    n: u8,
    data: Vec<u8>,
}

impl Record for Dangling {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Dangling>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Dangling>::builder("Dangling")
                .primitive("n", |r| &mut r.n)
                .sequence("data", |r| &mut r.data)
                .length("missing")
                .build()
        })
    }
}

#[derive(Debug, Default)]
struct DanglingHolder {
    inner: Dangling,
}

impl Record for DanglingHolder {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<DanglingHolder>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<DanglingHolder>::builder("DanglingHolder")
                .record("inner", |r| &mut r.inner)
                .build()
        })
    }
}

#[test]
fn unknown_field_reference_is_reported_at_the_field() {
    let (err, offset) = decode_err::<Dangling>(&[1, 2]);
    assert!(
        matches!(
            err,
            DecodeError::Schema(SchemaError::UnknownField {
                record: "Dangling",
                field: "data",
                name: "missing",
                annotation: Annotation::Length,
            })
        ),
        "got {err}"
    );
    assert_eq!(offset, 1);
}

#[test]
fn nested_schema_errors_surface_from_the_entry_point() {
    let (err, _) = decode_err::<DanglingHolder>(&[1, 2]);
    assert!(err.is_schema(), "got {err}");
    assert!(err.to_string().contains("Dangling.data"), "got {err}");
}

#[derive(Debug, Default)]
struct Hooked {
    tag: u8,
    value: u16,
}

impl Record for Hooked {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Hooked>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Hooked>::builder("Hooked")
                .primitive("tag", |r| &mut r.tag)
                .after("tag_known")
                .primitive("value", |r| &mut r.value)
                .after("ghost_hook")
                .hook("tag_known", |r: &Hooked, ctx| {
                    if r.tag == 0x7F {
                        return Err(format!("unknown tag before offset {}", ctx.offset()).into());
                    }
                    Ok(())
                })
                .build()
        })
    }
}

#[test]
fn after_hook_failure_is_verification_error() {
    let (err, offset) = decode_err::<Hooked>(&[0x7F, 0, 0]);
    assert!(
        matches!(
            err,
            DecodeError::Verification {
                record: "Hooked",
                hook: "tag_known",
                ..
            }
        ),
        "got {err}"
    );
    assert!(err.to_string().contains("unknown tag before offset 1"), "got {err}");
    assert_eq!(offset, 1);
}

#[test]
fn unregistered_hook_is_reported_after_its_field() {
    let (err, offset) = decode_err::<Hooked>(&[1, 2, 3, 4]);
    assert!(
        matches!(
            err,
            DecodeError::Schema(SchemaError::UnknownHook {
                field: "value",
                name: "ghost_hook",
                ..
            })
        ),
        "got {err}"
    );
    assert_eq!(offset, 3);
}

#[derive(Debug, Default)]
struct GhostCondition {
    gated: u8,
}

impl Record for GhostCondition {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<GhostCondition>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<GhostCondition>::builder("GhostCondition")
                .primitive("gated", |r| &mut r.gated)
                .when("!ghost()")
                .build()
        })
    }
}

#[test]
fn unregistered_condition_is_unknown_resolver() {
    let (err, offset) = decode_err::<GhostCondition>(&[1]);
    assert!(
        matches!(
            err,
            DecodeError::Schema(SchemaError::UnknownResolver {
                annotation: Annotation::Condition,
                name: "ghost",
                ..
            })
        ),
        "got {err}"
    );
    assert_eq!(offset, 0);
}

#[derive(Debug, Default)]
struct WrongResolver {
    data: Vec<u8>,
}

impl Record for WrongResolver {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<WrongResolver>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<WrongResolver>::builder("WrongResolver")
                .sequence("data", |r| &mut r.data)
                .length("per_index()")
                .indexed_resolver("per_index", |_: &WrongResolver, _, index| index)
                .build()
        })
    }
}

#[test]
fn indexed_resolver_outside_element_size_is_rejected() {
    let (err, _) = decode_err::<WrongResolver>(&[1, 2]);
    assert!(
        matches!(
            err,
            DecodeError::Schema(SchemaError::ResolverSignature {
                annotation: Annotation::Length,
                name: "per_index",
                ..
            })
        ),
        "got {err}"
    );
}

#[derive(Debug, Default)]
struct MissingResolver {
    data: Vec<u8>,
}

impl Record for MissingResolver {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<MissingResolver>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<MissingResolver>::builder("MissingResolver")
                .sequence("data", |r| &mut r.data)
                .size("nowhere()")
                .build()
        })
    }
}

#[test]
fn unregistered_resolver_is_reported() {
    let (err, _) = decode_err::<MissingResolver>(&[1, 2]);
    assert!(
        matches!(
            err,
            DecodeError::Schema(SchemaError::UnknownResolver {
                annotation: Annotation::Size,
                name: "nowhere",
                ..
            })
        ),
        "got {err}"
    );
}

// ── Verification ──────────────────────────────────────────────────────────────

#[test]
fn bad_checksum_fails_frame_verify() {
    let mut bytes = fixtures::sample_frame();
    // checksum is the u32 after magic, version, flags and chunk count
    bytes[6] ^= 0xFF;
    let (err, offset) = decode_err::<Frame>(&bytes);
    assert!(
        matches!(
            err,
            DecodeError::Verification {
                record: "Frame",
                hook: "verify",
                ..
            }
        ),
        "got {err}"
    );
    assert_eq!(offset, bytes.len() as u64);
}

#[test]
fn reserved_chunk_kind_fails_chunk_verify() {
    let bytes = fixtures::frame(
        2,
        CHECKSUMMED,
        &[ChunkSpec {
            kind: 0,
            stream_id: 0,
            priority: 0,
            body: b"z",
        }],
        &[],
    );
    let (err, _) = decode_err::<Frame>(&bytes);
    assert!(
        matches!(
            err,
            DecodeError::Verification {
                record: "Chunk",
                hook: "verify",
                ..
            }
        ),
        "got {err}"
    );
}

#[test]
fn bad_signature_fails_after_hook() {
    let mut bytes = fixtures::sample_resource_section();
    bytes[4] = b'X';
    let options = DecodeOptions::default().with_byte_order(ByteOrder::Big);
    let (err, offset) = decode_err_with::<ResourceSection>(&bytes, options);
    assert!(
        matches!(
            err,
            DecodeError::Verification {
                record: "ResourceBlock",
                hook: "signature",
                ..
            }
        ),
        "got {err}"
    );
    assert!(err.to_string().contains("5842494d"), "got {err}");
    // the size region is read ahead before its elements
    assert_eq!(offset, 8);
}

#[derive(Debug, Default)]
struct Positive {
    value: i16,
}

impl Record for Positive {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Positive>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Positive>::builder("Positive")
                .primitive("value", |r| &mut r.value)
                .build()
        })
    }

    fn verify(&self, _ctx: &DecodeContext<'_, '_>) -> Result<(), HookError> {
        if self.value < 0 {
            return Err(format!("{} is negative", self.value).into());
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Positives {
    count: u8,
    values: Vec<Positive>,
}

impl Record for Positives {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Positives>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Positives>::builder("Positives")
                .primitive("count", |r| &mut r.count)
                .records("values", |r| &mut r.values)
                .length("count")
                .build()
        })
    }
}

#[test]
fn fixed_record_sequence_still_verifies_each_element() {
    let (ok, _) = decode::<Positives>(&[2, 1, 0, 2, 0]);
    let values: Vec<i16> = ok.values.iter().map(|p| p.value).collect();
    assert_eq!(values, [1, 2]);

    let (err, _) = decode_err::<Positives>(&[2, 1, 0, 0xFF, 0xFF]);
    assert!(
        matches!(
            err,
            DecodeError::Verification {
                record: "Positive",
                hook: "verify",
                ..
            }
        ),
        "got {err}"
    );
    assert!(err.to_string().contains("-1 is negative"), "got {err}");
}

#[derive(Debug, Default)]
struct Leaf {
    v: u8,
}

impl Record for Leaf {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Leaf>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Leaf>::builder("Leaf")
                .primitive("v", |r| &mut r.v)
                .build()
        })
    }

    fn verify(&self, _ctx: &DecodeContext<'_, '_>) -> Result<(), HookError> {
        if self.v == 0xFF {
            return Err("0xff is reserved".into());
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Branch {
    leaf: Leaf,
}

impl Record for Branch {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Branch>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Branch>::builder("Branch")
                .record("leaf", |r| &mut r.leaf)
                .build()
        })
    }
}

#[derive(Debug, Default)]
struct Trunk {
    branch: Branch,
}

impl Record for Trunk {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Trunk>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Trunk>::builder("Trunk")
                .record("branch", |r| &mut r.branch)
                .build()
        })
    }
}

#[derive(Debug, Default)]
struct Branches {
    count: u8,
    branches: Vec<Branch>,
}

impl Record for Branches {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Branches>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Branches>::builder("Branches")
                .primitive("count", |r| &mut r.count)
                .records("branches", |r| &mut r.branches)
                .length("count")
                .build()
        })
    }
}

fn assert_leaf_rejected(err: &DecodeError) {
    assert!(
        matches!(
            err,
            DecodeError::Verification {
                record: "Leaf",
                hook: "verify",
                ..
            }
        ),
        "got {err}"
    );
}

#[test]
fn deeply_nested_fixed_record_is_verified() {
    let (ok, _) = decode::<Trunk>(&[0x07]);
    assert_eq!(ok.branch.leaf.v, 0x07);

    let (err, _) = decode_err::<Branch>(&[0xFF]);
    assert_leaf_rejected(&err);
    let (err, offset) = decode_err::<Trunk>(&[0xFF]);
    assert_leaf_rejected(&err);
    assert_eq!(offset, 1);
}

#[test]
fn fixed_record_sequence_verifies_nested_elements() {
    let (ok, _) = decode::<Branches>(&[2, 1, 2]);
    let leaves: Vec<u8> = ok.branches.iter().map(|b| b.leaf.v).collect();
    assert_eq!(leaves, [1, 2]);

    let (err, _) = decode_err::<Branches>(&[2, 1, 0xFF]);
    assert_leaf_rejected(&err);
}

// ── Nested records with a size ────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Holder {
    size: u8,
    inner: Positive,
    tail: u8,
}

impl Record for Holder {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Holder>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Holder>::builder("Holder")
                .primitive("size", |r| &mut r.size)
                .record("inner", |r| &mut r.inner)
                .size("size")
                .primitive("tail", |r| &mut r.tail)
                .build()
        })
    }
}

#[test]
fn sized_nested_record_consumes_its_extent() {
    let (rec, offset) = decode::<Holder>(&[2, 5, 0, 9]);
    assert_eq!((rec.inner.value, rec.tail), (5, 9));
    assert_eq!(offset, 4);
}

#[test]
fn zero_sized_nested_record_is_left_untouched() {
    let (rec, offset) = decode::<Holder>(&[0, 9]);
    assert_eq!((rec.inner.value, rec.tail), (0, 9));
    assert_eq!(offset, 2);
}

#[test]
fn nested_record_smaller_than_its_extent_is_mismatch() {
    let (err, _) = decode_err::<Holder>(&[3, 5, 0, 0, 9]);
    assert!(
        matches!(
            err,
            DecodeError::SizeMismatch {
                record: "Holder",
                field: "inner",
                declared: 3,
                consumed: 2,
            }
        ),
        "got {err}"
    );
}

#[test]
fn nested_record_larger_than_its_extent_is_truncated() {
    let (err, offset) = decode_err::<Holder>(&[1, 5, 0, 9]);
    assert!(err.is_truncated(), "got {err}");
    assert_eq!(offset, 1);
}

#[derive(Debug, Default)]
struct ToEndRecord {
    inner: Positive,
}

impl Record for ToEndRecord {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<ToEndRecord>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<ToEndRecord>::builder("ToEndRecord")
                .record("inner", |r| &mut r.inner)
                .size_to_end()
                .build()
        })
    }
}

#[test]
fn read_to_end_on_nested_record_is_rejected() {
    let (err, offset) = decode_err::<ToEndRecord>(&[1, 0]);
    assert!(
        matches!(
            err,
            DecodeError::Schema(SchemaError::ReadToEndOnRecord {
                field: "inner",
                ..
            })
        ),
        "got {err}"
    );
    assert_eq!(offset, 0);
}

#[derive(Debug, Default)]
struct ElementSized {
    count: u8,
    points: Vec<Positive>,
}

impl Record for ElementSized {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<ElementSized>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<ElementSized>::builder("ElementSized")
                .primitive("count", |r| &mut r.count)
                .records("points", |r| &mut r.points)
                .length("count")
                .element_size("three()")
                .resolver("three", |_: &ElementSized| 3u8)
                .build()
        })
    }
}

#[test]
fn element_size_must_be_consumed_exactly() {
    let (err, _) = decode_err::<ElementSized>(&[1, 4, 0, 0]);
    assert!(
        matches!(
            err,
            DecodeError::SizeMismatch {
                field: "points",
                declared: 3,
                consumed: 2,
                ..
            }
        ),
        "got {err}"
    );
}

#[derive(Debug, Default)]
struct Empty;

impl Record for Empty {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Empty>> = OnceLock::new();
        SCHEMA.get_or_init(|| Schema::<Empty>::builder("Empty").build())
    }
}

#[derive(Debug, Default)]
struct Stalled {
    size: u8,
    items: Vec<Empty>,
}

impl Record for Stalled {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Stalled>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Stalled>::builder("Stalled")
                .primitive("size", |r| &mut r.size)
                .records("items", |r| &mut r.items)
                .size("size")
                .build()
        })
    }
}

#[test]
fn zero_width_elements_cannot_fill_a_region() {
    let (err, _) = decode_err::<Stalled>(&[2, 0, 0]);
    assert!(
        matches!(
            err,
            DecodeError::SizeMismatch {
                declared: 2,
                consumed: 0,
                ..
            }
        ),
        "got {err}"
    );
}

// ── Misplaced and invalid annotations ─────────────────────────────────────────

#[derive(Debug, Default)]
struct ZeroPad {
    value: u8,
}

impl Record for ZeroPad {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<ZeroPad>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<ZeroPad>::builder("ZeroPad")
                .primitive("value", |r| &mut r.value)
                .pad_to(0)
                .build()
        })
    }
}

#[test]
fn zero_padding_modulus_is_rejected() {
    let (err, offset) = decode_err::<ZeroPad>(&[1]);
    assert!(
        matches!(err, DecodeError::Schema(SchemaError::InvalidPadding { .. })),
        "got {err}"
    );
    assert_eq!(offset, 0);
}

#[derive(Debug, Default)]
struct SizedArray {
    n: u8,
    values: [u8; 2],
}

impl Record for SizedArray {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<SizedArray>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<SizedArray>::builder("SizedArray")
                .primitive("n", |r| &mut r.n)
                .array("values", |r| &mut r.values)
                .size("n")
                .build()
        })
    }
}

#[test]
fn size_on_array_is_misplaced() {
    let (err, _) = decode_err::<SizedArray>(&[2, 1, 2]);
    assert!(
        matches!(
            err,
            DecodeError::Schema(SchemaError::MisplacedAnnotation {
                annotation: Annotation::Size,
                kind: FieldKind::FixedArray,
                ..
            })
        ),
        "got {err}"
    );
}

// ── Limits ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Blob {
    length: u32,
    data: Vec<u8>,
}

impl Record for Blob {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Blob>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Blob>::builder("Blob")
                .primitive("length", |r| &mut r.length)
                .sequence("data", |r| &mut r.data)
                .size("length")
                .build()
        })
    }
}

#[test]
fn declared_extent_over_limit_is_rejected_before_reading() {
    let options = DecodeOptions::default().with_max_region(4);
    let (err, offset) = decode_err_with::<Blob>(&[10, 0, 0, 0, 1, 2], options);
    assert!(
        matches!(
            err,
            DecodeError::RegionTooLarge {
                size: 10,
                limit: 4,
                ..
            }
        ),
        "got {err}"
    );
    assert_eq!(offset, 4);
}

#[test]
fn huge_declared_extent_on_short_input_fails_cleanly() {
    let (err, offset) = decode_err::<Blob>(&[0xFF, 0xFF, 0xFF, 0xFF, 1, 2]);
    assert!(
        matches!(
            err,
            DecodeError::RegionTooLarge {
                size: 0xFFFF_FFFF,
                ..
            }
        ),
        "got {err}"
    );
    assert_eq!(offset, 4);
}

#[derive(Debug, Default)]
struct Trailer {
    tag: u8,
    rest: Vec<u8>,
}

impl Record for Trailer {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Trailer>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Trailer>::builder("Trailer")
                .primitive("tag", |r| &mut r.tag)
                .sequence("rest", |r| &mut r.rest)
                .size_to_end()
                .build()
        })
    }
}

#[derive(Debug, Default)]
struct PositiveTail {
    values: Vec<Positive>,
}

impl Record for PositiveTail {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<PositiveTail>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<PositiveTail>::builder("PositiveTail")
                .records("values", |r| &mut r.values)
                .size_to_end()
                .build()
        })
    }
}

#[test]
fn read_to_end_is_held_to_the_region_limit() {
    let options = DecodeOptions::default().with_max_region(4);
    let (ok, offset) = decode_with::<Trailer>(&[9, 1, 2, 3, 4], options);
    assert_eq!(ok.rest, [1, 2, 3, 4]);
    assert_eq!(offset, 5);

    let (err, _) = decode_err_with::<Trailer>(&[9, 1, 2, 3, 4, 5], options);
    assert!(
        matches!(
            err,
            DecodeError::RegionTooLarge {
                record: "Trailer",
                field: "rest",
                size: 5,
                limit: 4,
            }
        ),
        "got {err}"
    );

    let (err, offset) = decode_err_with::<PositiveTail>(&[1, 0, 2, 0, 3, 0], options);
    assert!(
        matches!(
            err,
            DecodeError::RegionTooLarge {
                record: "PositiveTail",
                field: "values",
                size: 5,
                limit: 4,
            }
        ),
        "got {err}"
    );
    assert_eq!(offset, 0);
}

#[derive(Debug, Default)]
struct Node {
    count: u8,
    children: Vec<Node>,
}

impl Record for Node {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Node>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Node>::builder("Node")
                .primitive("count", |r| &mut r.count)
                .records("children", |r| &mut r.children)
                .length("count")
                .build()
        })
    }
}

#[test]
fn recursion_within_limit_decodes() {
    let (root, offset) = decode::<Node>(&[2, 1, 0, 0]);
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[0].children.len(), 1);
    assert!(root.children[1].children.is_empty());
    assert_eq!(offset, 4);
}

#[test]
fn recursion_past_max_depth_is_rejected() {
    let options = DecodeOptions::default().with_max_depth(4);
    let (err, offset) = decode_err_with::<Node>(&[1, 1, 1, 1, 0], options);
    assert!(
        matches!(
            err,
            DecodeError::DepthExceeded {
                record: "Node",
                limit: 4
            }
        ),
        "got {err}"
    );
    assert_eq!(offset, 4);
}

// ── Modes ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Secretive {
    id: u8,
    key: u32,
}

impl Record for Secretive {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Secretive>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Secretive>::builder("Secretive")
                .primitive("id", |r| &mut r.id)
                .primitive("key", |r| &mut r.key)
                .private()
                .build()
        })
    }
}

#[test]
fn private_field_policy_follows_mode() {
    let bytes = [7, 1, 0, 0, 0];

    let (lenient, offset) = decode::<Secretive>(&bytes);
    assert_eq!((lenient.id, lenient.key), (7, 0));
    assert_eq!(offset, 1);

    let strict = DecodeOptions::default().with_mode(DecodeMode::STRICT);
    let (err, _) = decode_err_with::<Secretive>(&bytes, strict);
    assert!(
        matches!(err, DecodeError::Schema(SchemaError::PrivateField { field: "key", .. })),
        "got {err}"
    );

    let include = DecodeOptions::default().with_mode(DecodeMode::INCLUDE_PRIVATE);
    let (full, offset) = decode_with::<Secretive>(&bytes, include);
    assert_eq!((full.id, full.key), (7, 1));
    assert_eq!(offset, 5);
}

#[test]
fn free_function_matches_decoder() {
    let bytes = fixtures::sample_frame();
    let mut cursor = ByteCursor::new(&bytes[..]);
    let mut frame = Frame::default();
    tagread_decoder::decode(&mut frame, &mut cursor, ByteOrder::Little, DecodeMode::DEFAULT)
        .expect("decode");
    let (expected, _) = decode::<Frame>(&bytes);
    assert_eq!(frame, expected);
    assert_eq!(cursor.offset(), bytes.len() as u64);
}

#[test]
#[should_panic(expected = "decoding Dangling failed")]
fn fail_hard_mode_panics_at_the_entry_point() {
    let options = DecodeOptions::default().with_mode(DecodeMode::FAIL_HARD);
    let _ = decode_err_with::<Dangling>(&[1, 2], options);
}

#[test]
fn fail_hard_mode_returns_successes_normally() {
    let options = DecodeOptions::default().with_mode(DecodeMode::FAIL_HARD);
    let (frame, _) = decode_with::<Frame>(&fixtures::sample_frame(), options);
    assert_eq!(frame.chunks.len(), 2);
}
