use tagread_wire::{ByteCursor, ByteOrder};

use crate::context::DecodeContext;
use crate::error::DecodeError;
use crate::options::{DecodeMode, DecodeOptions};
use crate::schema::Record;
use crate::walker;

/// Top-level entry point.
///
/// Each call builds a fresh [`DecodeContext`] over the caller's cursor,
/// walks the destination record and drops the context again. Every
/// failure, whatever depth it happened at, surfaces here: it is returned
/// as a [`DecodeError`], or in [`DecodeMode::FAIL_HARD`] mode turned into
/// a panic carrying the error message.
///
/// A `Decoder` holds only its options; one instance can serve any number
/// of calls, on any number of threads.
///
/// # Example
///
/// ```rust
/// use tagread_decoder::{DecodeOptions, Decoder};
/// use tagread_wire::{ByteCursor, ByteOrder};
/// # use std::sync::OnceLock;
/// # use tagread_decoder::{Record, Schema};
/// # #[derive(Default)]
/// # struct Version { major: u16, minor: u16 }
/// # impl Record for Version {
/// #     fn schema() -> &'static Schema<Self> {
/// #         static S: OnceLock<Schema<Version>> = OnceLock::new();
/// #         S.get_or_init(|| Schema::<Version>::builder("Version")
/// #             .primitive("major", |r| &mut r.major)
/// #             .primitive("minor", |r| &mut r.minor)
/// #             .build())
/// #     }
/// # }
///
/// let decoder = Decoder::new(DecodeOptions::default().with_byte_order(ByteOrder::Big));
/// let bytes = [0x00, 0x02, 0x00, 0x07];
/// let mut cursor = ByteCursor::new(&bytes[..]);
/// let mut version = Version::default();
/// decoder.decode(&mut version, &mut cursor)?;
/// assert_eq!((version.major, version.minor), (2, 7));
/// # Ok::<(), tagread_decoder::DecodeError>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Decoder {
    options: DecodeOptions,
}

impl Decoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Populate `dest` from `cursor`.
    ///
    /// On failure `dest` is left partially populated and must not be
    /// trusted. The cursor's offset tells how far the decode got.
    ///
    /// # Errors
    ///
    /// Any [`DecodeError`] raised while walking the record.
    ///
    /// # Panics
    ///
    /// In [`DecodeMode::FAIL_HARD`] mode, instead of returning an error.
    /// Panics raised by resolvers and hooks are never caught.
    pub fn decode<T: Record>(
        &self,
        dest: &mut T,
        cursor: &mut ByteCursor<'_>,
    ) -> Result<(), DecodeError> {
        let record = T::schema().name();
        let start = cursor.offset();
        tracing::debug!(
            record,
            byte_order = %self.options.byte_order,
            offset = start,
            "decode start"
        );

        let mut ctx = DecodeContext::new(cursor, self.options);
        let outcome = walker::walk(dest, &mut ctx);
        let offset = ctx.offset();

        match outcome {
            Ok(()) => {
                tracing::debug!(record, offset, consumed = offset - start, "decode complete");
                Ok(())
            }
            Err(err) if self.options.mode.is_fail_hard() => {
                panic!("decoding {record} failed: {err}");
            }
            Err(err) => {
                tracing::debug!(record, offset, error = %err, "decode aborted");
                Err(err)
            }
        }
    }

    /// Decode a fresh `T` from a byte slice, returning it with the number
    /// of bytes consumed.
    ///
    /// # Errors
    ///
    /// Same as [`decode`](Self::decode).
    pub fn decode_slice<T: Record>(&self, bytes: &[u8]) -> Result<(T, u64), DecodeError> {
        let mut cursor = ByteCursor::new(bytes);
        let mut dest = T::default();
        self.decode(&mut dest, &mut cursor)?;
        Ok((dest, cursor.offset()))
    }
}

/// Decode `dest` with the given byte order and mode and default limits.
///
/// # Errors
///
/// See [`Decoder::decode`].
pub fn decode<T: Record>(
    dest: &mut T,
    cursor: &mut ByteCursor<'_>,
    byte_order: ByteOrder,
    mode: DecodeMode,
) -> Result<(), DecodeError> {
    Decoder::new(
        DecodeOptions::default()
            .with_byte_order(byte_order)
            .with_mode(mode),
    )
    .decode(dest, cursor)
}
