//! Element decoding for source arrays.
//!
//! Source arrays may hold any of a small closed set of numeric encodings.
//! Each one knows how to widen itself to `f32`; the choice is made once, when
//! the array is bound, by monomorphizing [`DataMatrix`](crate::DataMatrix)
//! over the element type. There is no per-element dispatch.

use serde::{Deserialize, Serialize};

// Sealed trait pattern to prevent external implementations
mod sealed {
    pub trait Sealed {}
}

/// Tag naming the storage encoding of a source array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    F32,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl ElementKind {
    /// Size of one stored element in bytes.
    pub fn byte_width(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::F64 | Self::I64 | Self::U64 => 8,
        }
    }
}

/// A numeric element that can be read out of a source array as `f32`.
///
/// Sealed; implemented for the primitive float and integer types.
pub trait Element: sealed::Sealed + Copy + std::fmt::Debug + Send + Sync + 'static {
    /// Encoding tag for this element type.
    const KIND: ElementKind;

    /// Widen (or narrow, for 64-bit types) to `f32`.
    fn to_f32(self) -> f32;
}

macro_rules! impl_element {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty {
                const KIND: ElementKind = ElementKind::$kind;

                #[inline(always)]
                fn to_f32(self) -> f32 {
                    self as f32
                }
            }
        )*
    };
}

impl_element! {
    f32 => F32,
    f64 => F64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
}
