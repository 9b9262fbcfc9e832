//! Dimension classification and index linearization.
//!
//! Every axis of the source array is tagged with a [`DimType`]:
//!
//! - [`DimType::Data`]: iterated by the exemplar index.
//! - [`DimType::Dual`]: iterated by the exemplar index *and* emitted as a
//!   feature, namely the exemplar's coordinate along that axis.
//! - [`DimType::Feature`]: flattened, row-major, into the feature vector.
//!
//! The exemplar index walks all data and dual axes in declared order,
//! row-major (the last such axis varies fastest). Within a feature vector,
//! dual coordinates come first, in axis order, followed by the feature
//! elements in row-major order with the weight slot (if any) removed.
//!
//! # Example
//!
//! ```
//! use datamatrix::DimType;
//!
//! let dims = DimType::parse_codes("bbf").unwrap();
//! assert_eq!(dims, vec![DimType::Dual, DimType::Dual, DimType::Feature]);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{DataMatrixError, ParseError};

// =============================================================================
// DimType
// =============================================================================

/// Role of one axis of the source array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimType {
    /// Exemplar axis.
    Data,
    /// Exemplar axis whose coordinate is also a feature.
    Dual,
    /// Feature axis.
    Feature,
}

impl DimType {
    /// Single-character code: `d`, `b` (both) or `f`.
    pub fn code(self) -> char {
        match self {
            Self::Data => 'd',
            Self::Dual => 'b',
            Self::Feature => 'f',
        }
    }

    /// Whether the exemplar index iterates over this axis.
    #[inline]
    pub fn is_exemplar_axis(self) -> bool {
        matches!(self, Self::Data | Self::Dual)
    }

    /// Parse a string of dimension codes, one per axis.
    ///
    /// Whitespace is ignored.
    pub fn parse_codes(codes: &str) -> Result<Vec<DimType>, ParseError> {
        codes
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(DimType::try_from)
            .collect()
    }
}

impl TryFrom<char> for DimType {
    type Error = ParseError;

    fn try_from(code: char) -> Result<Self, Self::Error> {
        match code {
            'd' => Ok(Self::Data),
            'b' => Ok(Self::Dual),
            'f' => Ok(Self::Feature),
            other => Err(ParseError::UnknownDimCode(other)),
        }
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// One axis walked by the exemplar index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExemplarAxis {
    pub size: usize,
    pub stride: isize,
    pub dual: bool,
}

/// Shape metadata derived from an array and its dimension tags.
///
/// Recomputed on every bind; never shared between views.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Geometry {
    /// Number of exemplars (product of data and dual axis sizes).
    pub exemplars: usize,
    /// Number of dual axes.
    pub dual_features: usize,
    /// Feature elements per exemplar, weight excluded.
    pub features: usize,
    /// Exemplar axes in declared order.
    pub exemplar_axes: Vec<ExemplarAxis>,
    /// Element offset of each visible feature relative to the exemplar base.
    pub feature_offsets: Vec<isize>,
    /// Element offset of the weight feature, if one is designated.
    pub weight_offset: Option<isize>,
}

impl Geometry {
    /// Classify the axes of an array with the given shape and element strides.
    pub fn classify(
        shape: &[usize],
        strides: &[isize],
        dims: &[DimType],
        weight_index: Option<usize>,
    ) -> Result<Self, DataMatrixError> {
        if dims.len() != shape.len() {
            return Err(DataMatrixError::RankMismatch {
                tags: dims.len(),
                rank: shape.len(),
            });
        }
        if !dims.iter().any(|d| d.is_exemplar_axis()) {
            return Err(DataMatrixError::NoDataAxis);
        }

        let mut exemplar_axes = Vec::new();
        let mut feature_offsets: Vec<isize> = vec![0];

        for ((&dim, &size), &stride) in dims.iter().zip(shape).zip(strides) {
            match dim {
                DimType::Data | DimType::Dual => exemplar_axes.push(ExemplarAxis {
                    size,
                    stride,
                    dual: dim == DimType::Dual,
                }),
                DimType::Feature => {
                    // Expanding axis by axis keeps earlier axes outermost.
                    feature_offsets = feature_offsets
                        .iter()
                        .flat_map(|&base| (0..size).map(move |k| base + k as isize * stride))
                        .collect();
                }
            }
        }

        let exemplars: usize = exemplar_axes.iter().map(|a| a.size).product();
        if exemplars == 0 {
            return Err(DataMatrixError::NoExemplars);
        }

        let weight_offset = match weight_index {
            Some(index) if index >= feature_offsets.len() => {
                return Err(DataMatrixError::WeightIndexOutOfRange {
                    index,
                    features: feature_offsets.len(),
                });
            }
            Some(index) => Some(feature_offsets.remove(index)),
            None => None,
        };
        feature_offsets.shrink_to_fit();

        Ok(Self {
            exemplars,
            dual_features: exemplar_axes.iter().filter(|a| a.dual).count(),
            features: feature_offsets.len(),
            exemplar_axes,
            feature_offsets,
            weight_offset,
        })
    }

    /// Length of the per-exemplar vector: dual coordinates plus features.
    #[inline]
    pub fn vector_len(&self) -> usize {
        self.dual_features + self.features
    }

    /// Element offset of exemplar `index` relative to the array origin.
    ///
    /// Dual coordinates are written, in axis order, into `duals`, which must
    /// hold exactly `dual_features` entries.
    #[inline]
    pub fn locate(&self, index: usize, duals: &mut [f32]) -> isize {
        debug_assert!(
            index < self.exemplars,
            "exemplar index {} out of range for {} exemplars",
            index,
            self.exemplars
        );
        debug_assert_eq!(duals.len(), self.dual_features);

        let mut rem = index;
        let mut offset = 0isize;
        let mut dual = self.dual_features;
        for axis in self.exemplar_axes.iter().rev() {
            let coord = rem % axis.size;
            rem /= axis.size;
            offset += coord as isize * axis.stride;
            if axis.dual {
                dual -= 1;
                duals[dual] = coord as f32;
            }
        }
        offset
    }

    /// Element offset of exemplar `index`, ignoring dual coordinates.
    #[inline]
    pub fn base_offset(&self, index: usize) -> isize {
        let mut rem = index;
        let mut offset = 0isize;
        for axis in self.exemplar_axes.iter().rev() {
            offset += (rem % axis.size) as isize * axis.stride;
            rem /= axis.size;
        }
        offset
    }

    /// Bytes held by the cached index structures.
    pub fn byte_size(&self) -> usize {
        self.exemplar_axes.capacity() * std::mem::size_of::<ExemplarAxis>()
            + self.feature_offsets.capacity() * std::mem::size_of::<isize>()
    }
}
