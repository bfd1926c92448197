//! Target endianness and the `Arithmetic` trait for primitives that can be
//! byte-swapped in place.

/// Byte order the serializer encodes to/decodes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// The default endianness for KVS binary and the package archive format
    /// (spec §9 Open Question, resolved as little-endian).
    #[must_use]
    pub const fn default_target() -> Self {
        Self::Little
    }

    #[must_use]
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }
}

/// Fixed-width values whose wire representation can be byte-swapped.
/// Implemented for every integer and float primitive; `bool`/`u8`/`i8` are
/// single-byte and so are swap-invariant.
pub trait Arithmetic: Copy + Default {
    const SIZE: usize;
    fn to_le_array(self) -> Vec<u8>;
    fn to_be_array(self) -> Vec<u8>;
    fn from_le_array(bytes: &[u8]) -> Self;
    fn from_be_array(bytes: &[u8]) -> Self;
}

macro_rules! impl_arithmetic {
    ($ty:ty) => {
        impl Arithmetic for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn to_le_array(self) -> Vec<u8> {
                self.to_le_bytes().to_vec()
            }

            fn to_be_array(self) -> Vec<u8> {
                self.to_be_bytes().to_vec()
            }

            fn from_le_array(bytes: &[u8]) -> Self {
                let mut arr = [0u8; std::mem::size_of::<$ty>()];
                arr.copy_from_slice(bytes);
                Self::from_le_bytes(arr)
            }

            fn from_be_array(bytes: &[u8]) -> Self {
                let mut arr = [0u8; std::mem::size_of::<$ty>()];
                arr.copy_from_slice(bytes);
                Self::from_be_bytes(arr)
            }
        }
    };
}

impl_arithmetic!(u8);
impl_arithmetic!(i8);
impl_arithmetic!(u16);
impl_arithmetic!(i16);
impl_arithmetic!(u32);
impl_arithmetic!(i32);
impl_arithmetic!(u64);
impl_arithmetic!(i64);
impl_arithmetic!(f32);
impl_arithmetic!(f64);

impl Arithmetic for bool {
    const SIZE: usize = 1;

    fn to_le_array(self) -> Vec<u8> {
        vec![u8::from(self)]
    }

    fn to_be_array(self) -> Vec<u8> {
        vec![u8::from(self)]
    }

    fn from_le_array(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }

    fn from_be_array(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}
