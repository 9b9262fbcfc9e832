//! Conversion between the external (storage) and internal (working)
//! representation of a feature vector.
//!
//! A [`ConversionSpec`] is an ordered list of [`ConvertOp`]s. Each op moves one
//! scalar from an offset in the external vector to an offset in the internal
//! vector, re-encoding it on the way. Encodings are expressed relative to a
//! common linear value, so any pair can be chained.
//!
//! # Textual Form
//!
//! One token per vector element, separated by whitespace or commas. A token
//! is two encoding codes, `<external><internal>`:
//!
//! | code | encoding |
//! |------|----------|
//! | `l`  | [`Encoding::Linear`] |
//! | `L`  | [`Encoding::Log`] |
//! | `p`  | [`Encoding::Log1p`] |
//! | `s`  | [`Encoding::Sqrt`] |
//! | `%`  | [`Encoding::Percent`] |
//!
//! ```
//! use datamatrix::{ConversionSpec, Encoding};
//!
//! // Element 0 unchanged, element 1 stored linear but worked on in log space.
//! let spec: ConversionSpec = "ll lL".parse().unwrap();
//! assert_eq!(spec.len(), 2);
//! assert_eq!(spec.ops()[1].internal, Encoding::Log);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

// =============================================================================
// Encoding
// =============================================================================

/// Scalar encoding of one vector element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// The value itself.
    #[default]
    Linear,
    /// Natural logarithm of the value.
    Log,
    /// `ln(1 + value)`.
    Log1p,
    /// Square root of the value.
    Sqrt,
    /// Value times 100.
    Percent,
}

impl Encoding {
    /// Single-character code used in the textual form.
    pub fn code(self) -> char {
        match self {
            Self::Linear => 'l',
            Self::Log => 'L',
            Self::Log1p => 'p',
            Self::Sqrt => 's',
            Self::Percent => '%',
        }
    }

    /// Map an encoded value back to its linear value.
    #[inline]
    pub fn decode(self, v: f32) -> f32 {
        match self {
            Self::Linear => v,
            Self::Log => v.exp(),
            Self::Log1p => v.exp_m1(),
            Self::Sqrt => v * v,
            Self::Percent => v / 100.0,
        }
    }

    /// Encode a linear value.
    #[inline]
    pub fn encode(self, v: f32) -> f32 {
        match self {
            Self::Linear => v,
            Self::Log => v.ln(),
            Self::Log1p => v.ln_1p(),
            Self::Sqrt => v.sqrt(),
            Self::Percent => v * 100.0,
        }
    }
}

impl TryFrom<char> for Encoding {
    type Error = ParseError;

    fn try_from(code: char) -> Result<Self, Self::Error> {
        match code {
            'l' => Ok(Self::Linear),
            'L' => Ok(Self::Log),
            'p' => Ok(Self::Log1p),
            's' => Ok(Self::Sqrt),
            '%' => Ok(Self::Percent),
            other => Err(ParseError::UnknownEncoding(other)),
        }
    }
}

// =============================================================================
// ConvertOp
// =============================================================================

/// Moves one scalar between the external and internal vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOp {
    /// Encoding in the external vector.
    pub external: Encoding,
    /// Encoding in the internal vector.
    pub internal: Encoding,
    /// Element offset in the external vector.
    pub offset_external: usize,
    /// Element offset in the internal vector.
    pub offset_internal: usize,
}

impl ConvertOp {
    /// Op that keeps the element at `offset` in both vectors.
    pub fn new(external: Encoding, internal: Encoding, offset: usize) -> Self {
        Self {
            external,
            internal,
            offset_external: offset,
            offset_internal: offset,
        }
    }

    /// Whether this op leaves the value untouched.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.external == self.internal
    }

    /// External value to internal value.
    #[inline]
    pub fn to_internal(&self, v: f32) -> f32 {
        if self.is_identity() {
            return v;
        }
        self.internal.encode(self.external.decode(v))
    }

    /// Internal value to external value.
    #[inline]
    pub fn to_external(&self, v: f32) -> f32 {
        if self.is_identity() {
            return v;
        }
        self.external.encode(self.internal.decode(v))
    }
}

// =============================================================================
// ConversionSpec
// =============================================================================

/// Ordered list of conversion ops.
///
/// Serialized in its textual form when every op keeps its offset, which is
/// always the case for parsed specs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConversionSpec {
    ops: Vec<ConvertOp>,
}

impl ConversionSpec {
    /// Build from an explicit op list.
    ///
    /// Offsets are checked against the vector length when the spec is bound
    /// to a [`DataMatrix`](crate::DataMatrix).
    pub fn from_ops(ops: Vec<ConvertOp>) -> Self {
        Self { ops }
    }

    /// Parse the textual form.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let ops = text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .enumerate()
            .map(|(position, token)| {
                let mut chars = token.chars();
                match (chars.next(), chars.next(), chars.next()) {
                    (Some(ext), Some(int), None) => Ok(ConvertOp::new(
                        Encoding::try_from(ext)?,
                        Encoding::try_from(int)?,
                        position,
                    )),
                    _ => Err(ParseError::MalformedToken {
                        token: token.to_string(),
                        position,
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { ops })
    }

    #[inline]
    pub fn ops(&self) -> &[ConvertOp] {
        &self.ops
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Bytes held by the op list.
    pub(crate) fn byte_size(&self) -> usize {
        self.ops.capacity() * std::mem::size_of::<ConvertOp>()
    }

    /// Check that the ops cover a vector of `len` elements on both sides.
    ///
    /// Returns a description of the first problem found.
    pub(crate) fn check_fits(&self, len: usize) -> Result<(), String> {
        if self.ops.len() != len {
            return Err(format!("{} ops for {} elements", self.ops.len(), len));
        }
        let mut written = vec![false; len];
        for (i, op) in self.ops.iter().enumerate() {
            if op.offset_external >= len || op.offset_internal >= len {
                return Err(format!(
                    "op {} offsets ({}, {}) out of range",
                    i, op.offset_external, op.offset_internal
                ));
            }
            if std::mem::replace(&mut written[op.offset_internal], true) {
                return Err(format!("internal offset {} written twice", op.offset_internal));
            }
        }
        Ok(())
    }

    /// Apply every op, external to internal.
    #[inline]
    pub fn apply_to_internal(&self, external: &[f32], internal: &mut [f32]) {
        for op in &self.ops {
            internal[op.offset_internal] = op.to_internal(external[op.offset_external]);
        }
    }

    /// Apply every op, internal to external.
    #[inline]
    pub fn apply_to_external(&self, internal: &[f32], external: &mut [f32]) {
        for op in &self.ops {
            external[op.offset_external] = op.to_external(internal[op.offset_internal]);
        }
    }

    fn is_positional(&self) -> bool {
        self.ops.iter().enumerate().all(|(i, op)| {
            op.offset_external == i && op.offset_internal == i
        })
    }
}

impl FromStr for ConversionSpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ConversionSpec {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ConversionSpec> for String {
    fn from(spec: ConversionSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for ConversionSpec {
    /// Textual form. Ops that move elements between offsets have no textual
    /// representation and are written as `<ext><int>@<from>:<to>`, which
    /// does not parse back.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let positional = self.is_positional();
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}{}", op.external.code(), op.internal.code())?;
            if !positional {
                write!(f, "@{}:{}", op.offset_external, op.offset_internal)?;
            }
        }
        Ok(())
    }
}
