use crate::order::ByteOrder;

/// A numeric value as seen by count and size resolution.
///
/// Every [`Primitive`] widens into one of these. The decoder only
/// accepts the two integer representations when it needs a count;
/// `Float` exists so that a resolver returning a float is reported as a
/// schema problem instead of being silently truncated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

impl Scalar {
    /// Human readable name of the representation, used in diagnostics.
    pub fn kind_name(self) -> &'static str {
        match self {
            Self::Unsigned(_) => "unsigned integer",
            Self::Signed(_) => "signed integer",
            Self::Float(_) => "float",
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Float(_))
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsigned(v) => write!(f, "{v}"),
            Self::Signed(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<usize> for Scalar {
    fn from(value: usize) -> Self {
        Self::Unsigned(value as u64)
    }
}

impl From<isize> for Scalar {
    fn from(value: isize) -> Self {
        Self::Signed(value as i64)
    }
}

/// A fixed-width numeric type the fixed-layout codec can read in one
/// step.
///
/// ```text
/// ┌──────────────┬───────┐
/// │ Type         │ WIDTH │
/// ├──────────────┼───────┤
/// │ u8  / i8     │ 1     │
/// │ u16 / i16    │ 2     │
/// │ u32 / i32    │ 4     │
/// │ f32          │ 4     │
/// │ u64 / i64    │ 8     │
/// │ f64          │ 8     │
/// └──────────────┴───────┘
/// ```
pub trait Primitive: Copy + Default + std::fmt::Debug + Send + Sync + 'static {
    /// Encoded size in bytes.
    const WIDTH: usize;

    /// Type name for diagnostics.
    const NAME: &'static str;

    /// True only for `u8`: a sequence of these is raw bytes and can be
    /// assigned from a byte region without per-element decoding.
    const RAW_BYTE: bool = false;

    /// Decode one value from exactly [`WIDTH`](Self::WIDTH) bytes.
    fn from_bytes(bytes: &[u8], order: ByteOrder) -> Self;

    fn to_scalar(self) -> Scalar;
}

macro_rules! impl_primitive {
    ($ty:ty, $width:expr, $variant:ident, $wide:ty) => {
        impl Primitive for $ty {
            const WIDTH: usize = $width;
            const NAME: &'static str = stringify!($ty);

            fn from_bytes(bytes: &[u8], order: ByteOrder) -> Self {
                <$ty>::from_le_bytes(order.to_le_array::<$width>(bytes))
            }

            fn to_scalar(self) -> Scalar {
                Scalar::$variant(<$wide>::from(self))
            }
        }

        impl From<$ty> for Scalar {
            fn from(value: $ty) -> Self {
                value.to_scalar()
            }
        }
    };
}

impl_primitive!(u16, 2, Unsigned, u64);
impl_primitive!(u32, 4, Unsigned, u64);
impl_primitive!(u64, 8, Unsigned, u64);
impl_primitive!(i8, 1, Signed, i64);
impl_primitive!(i16, 2, Signed, i64);
impl_primitive!(i32, 4, Signed, i64);
impl_primitive!(i64, 8, Signed, i64);
impl_primitive!(f32, 4, Float, f64);
impl_primitive!(f64, 8, Float, f64);

impl Primitive for u8 {
    const WIDTH: usize = 1;
    const NAME: &'static str = "u8";
    const RAW_BYTE: bool = true;

    fn from_bytes(bytes: &[u8], _order: ByteOrder) -> Self {
        bytes[0]
    }

    fn to_scalar(self) -> Scalar {
        Scalar::Unsigned(u64::from(self))
    }
}

impl From<u8> for Scalar {
    fn from(value: u8) -> Self {
        value.to_scalar()
    }
}

/// Decode `out.len()` consecutive primitives from `bytes`.
///
/// `bytes.len()` must be `out.len() * P::WIDTH`.
pub fn read_slice<P: Primitive>(bytes: &[u8], order: ByteOrder, out: &mut [P]) {
    for (slot, chunk) in out.iter_mut().zip(bytes.chunks_exact(P::WIDTH)) {
        *slot = P::from_bytes(chunk, order);
    }
}
