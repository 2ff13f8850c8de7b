/// Errors raised by the byte cursor.
///
/// Every variant carries the cursor offset at which the problem was
/// detected, so a failure deep inside a nested record still points at
/// an absolute position in the source stream.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The source (or the active bounded view) yielded fewer bytes than
    /// an exact-size read demanded.
    #[error("truncated input at offset {offset}: needed {expected} bytes, {available} available")]
    Truncated {
        offset: u64,
        expected: usize,
        available: usize,
    },

    /// A bounded view was released before its declared byte count was
    /// fully consumed.
    #[error("bounded view of {declared} bytes ended at offset {offset} with {consumed} consumed")]
    Unconsumed {
        offset: u64,
        declared: u64,
        consumed: u64,
    },

    /// A read to the end of the unbounded source found more than `limit`
    /// bytes left.
    #[error("input at offset {offset} runs past the {limit}-byte read-to-end limit")]
    Overlong { offset: u64, limit: u64 },

    /// Any other fault reported by the underlying byte source.
    #[error("i/o error at offset {offset}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: std::io::Error,
    },
}

impl WireError {
    /// The cursor offset the error was raised at.
    pub fn offset(&self) -> u64 {
        match self {
            Self::Truncated { offset, .. }
            | Self::Unconsumed { offset, .. }
            | Self::Overlong { offset, .. }
            | Self::Io { offset, .. } => *offset,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}
