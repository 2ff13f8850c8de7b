use tagread_wire::ByteOrder;

/// Decode mode switches.
///
/// Bit layout:
///   bit 0 = strict           (private fields are an error, not a skip)
///   bit 1 = fail hard        (panic at the entry point instead of returning)
///   bit 2 = include private  (decode private fields as if they were public)
///   bits 3-7 = reserved
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeMode(u8);

impl DecodeMode {
    /// Lenient, recoverable. Private fields are skipped silently.
    pub const DEFAULT: Self = Self(0);

    /// A private field is a [`SchemaError::PrivateField`](crate::SchemaError::PrivateField).
    pub const STRICT: Self = Self(0b0000_0001);

    /// Any error aborts with a panic at the entry point. Intended for
    /// callers that treat every decode failure as a bug in their own
    /// schema rather than bad input.
    pub const FAIL_HARD: Self = Self(0b0000_0010);

    /// Decode private fields too. Overrides `STRICT` for them.
    pub const INCLUDE_PRIVATE: Self = Self(0b0000_0100);

    pub fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    pub fn is_strict(self) -> bool {
        self.0 & Self::STRICT.0 != 0
    }

    pub fn is_fail_hard(self) -> bool {
        self.0 & Self::FAIL_HARD.0 != 0
    }

    pub fn includes_private(self) -> bool {
        self.0 & Self::INCLUDE_PRIVATE.0 != 0
    }
}

impl std::ops::BitOr for DecodeMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Configuration for one [`Decoder`](crate::Decoder).
///
/// ```text
/// ┌─────────────┬──────────────────────────────────────────────────┐
/// │ Field       │ Purpose                                          │
/// ├─────────────┼──────────────────────────────────────────────────┤
/// │ byte_order  │ Applied to every multi-byte primitive            │
/// │ mode        │ Strict / fail-hard / include-private switches    │
/// │ max_depth   │ Deepest record nesting accepted                  │
/// │ max_region  │ Largest size- or length-driven read accepted     │
/// └─────────────┴──────────────────────────────────────────────────┘
/// ```
///
/// Nesting past `max_depth` fails with `DepthExceeded`; a resolved
/// extent past `max_region` fails with `RegionTooLarge` before anything
/// is allocated for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    pub byte_order: ByteOrder,
    pub mode: DecodeMode,
    pub max_depth: usize,
    pub max_region: u64,
}

impl DecodeOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 64;
    pub const DEFAULT_MAX_REGION: u64 = 256 * 1024 * 1024;

    #[must_use]
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: DecodeMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_max_region(mut self, max_region: u64) -> Self {
        self.max_region = max_region;
        self
    }
}

impl Default for DecodeOptions {
    /// Little-endian, lenient, errors returned, 64 levels, 256 MiB.
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::Little,
            mode: DecodeMode::DEFAULT,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_region: Self::DEFAULT_MAX_REGION,
        }
    }
}
