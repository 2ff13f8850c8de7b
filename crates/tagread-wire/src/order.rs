/// Byte ordering applied to every multi-byte primitive within one decode
/// call.
///
/// ```text
///   value 0x0A000100 as u32
///   ┌────────┬─────────────────────┐
///   │ Big    │ 0A 00 01 00         │
///   │ Little │ 00 01 00 0A         │
///   └────────┴─────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Most-significant byte first (network order).
    Big,
    /// Least-significant byte first.
    #[default]
    Little,
}

impl ByteOrder {
    /// Copy `bytes` into a fixed array laid out little-endian, reversing
    /// them first when the source is big-endian.
    ///
    /// `bytes.len()` must equal `N`; the primitive codec guarantees it.
    pub(crate) fn to_le_array<const N: usize>(self, bytes: &[u8]) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&bytes[..N]);
        if self == Self::Big {
            out.reverse();
        }
        out
    }
}

impl std::fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Big => f.write_str("big-endian"),
            Self::Little => f.write_str("little-endian"),
        }
    }
}
