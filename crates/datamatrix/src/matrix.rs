//! The data matrix view.
//!
//! [`DataMatrix`] wraps a borrowed N-dimensional array and presents it as a
//! list of exemplars, each with a flat feature vector. See the [`dims`]
//! module for how axes map onto exemplars and features.
//!
//! # Lifecycle
//!
//! 1. [`DataMatrix::set`] binds an array, its dimension tags, an optional
//!    weight feature and an optional [`ConversionSpec`]. All derived counts
//!    and index caches are computed here; scale, conversion and weight caches
//!    from any previous binding are dropped.
//! 2. [`DataMatrix::set_scale`] supplies per-feature multipliers and the
//!    weight multiplier, and builds the cumulative weights used by weighted
//!    draws.
//! 3. [`DataMatrix::fv`], [`DataMatrix::ext_fv`] and [`DataMatrix::draw`] are
//!    the per-exemplar hot path.
//!
//! # Scratch Buffers
//!
//! Feature vectors are returned as slices into scratch buffers owned by the
//! view. They are overwritten by the next extraction call, which the borrow
//! checker enforces: a returned slice borrows the view mutably.
//!
//! # Preconditions
//!
//! Exemplar indices must lie in `[0, exemplars())`. This is checked with
//! `debug_assert!`; in release builds an out-of-range index wraps around the
//! leading exemplar axis; reads never leave the array.
//!
//! [`dims`]: crate::dims

use std::borrow::Cow;
use std::mem::size_of;

use ndarray::{ArrayView, ArrayViewD, Dimension};
use rand::Rng;

use crate::config::check_scale;
use crate::convert::ConversionSpec;
use crate::dims::{DimType, Geometry};
use crate::element::{Element, ElementKind};
use crate::error::DataMatrixError;
use crate::sampling::{draw_uniform, CumulativeWeights};

/// Read element `offset` (in elements, relative to `origin`) as `f32`.
///
/// # Safety
///
/// `origin.offset(offset)` must address an element of the array `origin`
/// belongs to.
#[inline(always)]
unsafe fn read<T: Element>(origin: *const T, offset: isize) -> f32 {
    // SAFETY: guaranteed by the caller.
    unsafe { (*origin.offset(offset)).to_f32() }
}

// =============================================================================
// DataMatrix
// =============================================================================

/// Exemplar/feature view over a borrowed N-dimensional array.
///
/// Generic over the array's element type; decoding to `f32` is resolved at
/// compile time.
///
/// Not internally synchronized. Extraction takes `&mut self`, so sharing a
/// view between threads requires external locking; give each worker its own
/// view instead.
///
/// # Example
///
/// ```
/// use datamatrix::{DataMatrix, DimType};
/// use ndarray::array;
///
/// // 3 exemplars, 3 features; feature 1 is the weight.
/// let data = array![[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
/// let mut dm = DataMatrix::new(data.view(), &[DimType::Data, DimType::Feature], Some(1), None)
///     .unwrap();
///
/// assert_eq!(dm.exemplars(), 3);
/// assert_eq!(dm.features(), 2);
///
/// dm.set_scale(&[2.0, 1.0], 0.5).unwrap();
/// let (fv, weight) = dm.fv(1);
/// assert_eq!(fv, &[8.0, 6.0]);
/// assert_eq!(weight, 2.5);
/// ```
#[derive(Debug, Clone)]
pub struct DataMatrix<'a, T: Element = f32> {
    array: Option<ArrayViewD<'a, T>>,
    dims: Vec<DimType>,
    weight_index: Option<usize>,
    weight_scale: f32,
    geometry: Geometry,
    scale: Vec<f32>,
    /// External-representation scratch vector.
    fv: Vec<f32>,
    /// Internal-representation scratch vector; empty without a conversion.
    fv_conv: Vec<f32>,
    conversion: Option<ConversionSpec>,
    weight_cum: Option<CumulativeWeights>,
}

impl<T: Element> Default for DataMatrix<'_, T> {
    fn default() -> Self {
        Self {
            array: None,
            dims: Vec::new(),
            weight_index: None,
            weight_scale: 1.0,
            geometry: Geometry::default(),
            scale: Vec::new(),
            fv: Vec::new(),
            fv_conv: Vec::new(),
            conversion: None,
            weight_cum: None,
        }
    }
}

impl<'a, T: Element> DataMatrix<'a, T> {
    /// Create a view and bind it in one step. See [`set`](Self::set).
    pub fn new<D: Dimension>(
        array: ArrayView<'a, T, D>,
        dims: &[DimType],
        weight_index: Option<usize>,
        conversion: Option<ConversionSpec>,
    ) -> Result<Self, DataMatrixError> {
        let mut dm = Self::default();
        dm.set(array, dims, weight_index, conversion)?;
        Ok(dm)
    }

    // =========================================================================
    // Binding
    // =========================================================================

    /// Bind an array.
    ///
    /// `dims` assigns a role to every axis. `weight_index`, if given, picks
    /// one element of the flattened feature axes to act as the exemplar
    /// weight; it is removed from the feature vector. `conversion` defines an
    /// internal representation different from the stored one and must cover
    /// the whole vector (`dual_features() + features()` elements).
    ///
    /// Resets scale to all ones, weight scale to one, and discards the
    /// cumulative weights. On error the view keeps its previous binding.
    ///
    /// # Errors
    ///
    /// - [`DataMatrixError::RankMismatch`] if `dims.len()` differs from the rank
    /// - [`DataMatrixError::NoDataAxis`] if no axis is tagged data or dual
    /// - [`DataMatrixError::NoExemplars`] if an exemplar axis has length zero
    /// - [`DataMatrixError::WeightIndexOutOfRange`]
    /// - [`DataMatrixError::ConversionMismatch`] if the ops do not fit the vector
    pub fn set<D: Dimension>(
        &mut self,
        array: ArrayView<'a, T, D>,
        dims: &[DimType],
        weight_index: Option<usize>,
        conversion: Option<ConversionSpec>,
    ) -> Result<(), DataMatrixError> {
        let array = array.into_dyn();
        let geometry = Geometry::classify(array.shape(), array.strides(), dims, weight_index)?;
        let vector_len = geometry.vector_len();

        if let Some(spec) = &conversion {
            spec.check_fits(vector_len)
                .map_err(|reason| DataMatrixError::ConversionMismatch { vector_len, reason })?;
        }

        tracing::debug!(
            shape = ?array.shape(),
            dims = %dims.iter().map(|d| d.code()).collect::<String>(),
            element = ?T::KIND,
            exemplars = geometry.exemplars,
            features = geometry.features,
            dual_features = geometry.dual_features,
            weighted = weight_index.is_some(),
            converted = conversion.is_some(),
            "bound data matrix"
        );

        self.fv_conv = match conversion {
            Some(_) => vec![0.0; vector_len],
            None => Vec::new(),
        };
        self.fv = vec![0.0; vector_len];
        self.scale = vec![1.0; geometry.features];
        self.weight_scale = 1.0;
        self.weight_cum = None;
        self.conversion = conversion;
        self.weight_index = weight_index;
        self.dims = dims.to_vec();
        self.geometry = geometry;
        self.array = Some(array);
        Ok(())
    }

    /// Set per-feature multipliers and the weight multiplier.
    ///
    /// `scale` must hold exactly [`features()`](Self::features) entries; it
    /// applies to the ordinary features, not to dual coordinates. When a
    /// weight feature is designated this rebuilds the cumulative weights
    /// (O(exemplars)), using `weight_scale` as it is now.
    ///
    /// # Errors
    ///
    /// - [`DataMatrixError::NotBound`] before [`set`](Self::set)
    /// - [`DataMatrixError::ScaleLengthMismatch`]
    /// - [`DataMatrixError::InvalidConfig`] if `weight_scale` is not positive
    ///   and finite, or a scale entry is zero or not finite
    ///
    /// On error the previous scale and cumulative weights are kept.
    pub fn set_scale(&mut self, scale: &[f32], weight_scale: f32) -> Result<(), DataMatrixError> {
        let Some(array) = self.array.as_ref() else {
            return Err(DataMatrixError::NotBound);
        };
        if scale.len() != self.geometry.features {
            return Err(DataMatrixError::ScaleLengthMismatch {
                expected: self.geometry.features,
                got: scale.len(),
            });
        }
        check_scale(scale, weight_scale)?;

        self.scale.clear();
        self.scale.extend_from_slice(scale);
        self.weight_scale = weight_scale;

        if let Some(weight_offset) = self.geometry.weight_offset {
            let origin = array.as_ptr();
            let geometry = &self.geometry;
            let cum = CumulativeWeights::from_weights((0..geometry.exemplars).map(|i| {
                let offset = geometry.base_offset(i) + weight_offset;
                // SAFETY: every exemplar coordinate is below its axis length and
                // the weight offset addresses an in-range feature element.
                unsafe { read(origin, offset) * weight_scale }
            }));
            tracing::debug!(
                exemplars = cum.len(),
                total_weight = cum.total(),
                weight_scale,
                "built cumulative weights"
            );
            self.weight_cum = Some(cum);
        }
        Ok(())
    }

    // =========================================================================
    // Counts
    // =========================================================================

    /// Whether an array is bound.
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.array.is_some()
    }

    /// Number of exemplars.
    #[inline]
    pub fn exemplars(&self) -> usize {
        self.geometry.exemplars
    }

    /// Number of ordinary features per exemplar, weight excluded.
    #[inline]
    pub fn features(&self) -> usize {
        self.geometry.features
    }

    /// Number of dual coordinates leading each feature vector.
    #[inline]
    pub fn dual_features(&self) -> usize {
        self.geometry.dual_features
    }

    /// Length of a returned feature vector: duals plus features.
    #[inline]
    pub fn vector_len(&self) -> usize {
        self.geometry.vector_len()
    }

    /// Length of the external-representation vector.
    #[inline]
    pub fn ext_features(&self) -> usize {
        self.fv.len()
    }

    /// Length of the internal-representation vector.
    ///
    /// Equal to [`ext_features`](Self::ext_features) whether or not a
    /// conversion is active, so callers never need to branch on it.
    #[inline]
    pub fn int_features(&self) -> usize {
        self.fv.len()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The bound array, as a dynamic-rank view.
    #[inline]
    pub fn array(&self) -> Option<&ArrayViewD<'a, T>> {
        self.array.as_ref()
    }

    /// Storage encoding of the bound array's elements.
    #[inline]
    pub fn element_kind(&self) -> ElementKind {
        T::KIND
    }

    /// Dimension tags of the current binding.
    #[inline]
    pub fn dims(&self) -> &[DimType] {
        &self.dims
    }

    /// Flattened feature index of the weight feature, if any.
    #[inline]
    pub fn weight_index(&self) -> Option<usize> {
        self.weight_index
    }

    /// Multiplier applied to the raw weight.
    #[inline]
    pub fn weight_scale(&self) -> f32 {
        self.weight_scale
    }

    /// Per-feature multipliers; all ones until [`set_scale`](Self::set_scale).
    #[inline]
    pub fn scale(&self) -> &[f32] {
        &self.scale
    }

    /// Active conversion, if any.
    #[inline]
    pub fn conversion(&self) -> Option<&ConversionSpec> {
        self.conversion.as_ref()
    }

    /// Whether the internal representation differs from the stored one.
    #[inline]
    pub fn has_conversion(&self) -> bool {
        self.conversion.is_some()
    }

    /// Cumulative weights, if built.
    #[inline]
    pub fn cumulative_weights(&self) -> Option<&CumulativeWeights> {
        self.weight_cum.as_ref()
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    /// Fill the external scratch vector for exemplar `index` and return the
    /// scaled weight.
    #[inline]
    fn extract(&mut self, index: usize) -> f32 {
        let Some(array) = self.array.as_ref() else {
            panic!("feature vector requested from an unbound DataMatrix");
        };
        let geometry = &self.geometry;
        let origin = array.as_ptr();

        let (duals, features) = self.fv.split_at_mut(geometry.dual_features);
        let base = geometry.locate(index, duals);

        for (dst, &offset) in features.iter_mut().zip(&geometry.feature_offsets) {
            // SAFETY: `locate` keeps every exemplar coordinate below its axis
            // length, and feature offsets were built from in-range coordinates.
            *dst = unsafe { read(origin, base + offset) };
        }

        match geometry.weight_offset {
            // SAFETY: as above.
            Some(offset) => (unsafe { read(origin, base + offset) }) * self.weight_scale,
            None => 1.0,
        }
    }

    /// Feature vector of exemplar `index` in the internal representation,
    /// with scale applied, plus its weight.
    ///
    /// Dual coordinates occupy `[0, dual_features())`, features the rest.
    /// The weight is the raw weight feature times the weight scale, or `1.0`
    /// when no weight feature is designated.
    ///
    /// The slice is overwritten by the next extraction call.
    ///
    /// # Panics
    ///
    /// Panics if no array is bound. In debug builds, also panics if `index`
    /// is not below [`exemplars()`](Self::exemplars).
    pub fn fv(&mut self, index: usize) -> (&[f32], f32) {
        let weight = self.extract(index);
        let dual = self.geometry.dual_features;

        let out = match &self.conversion {
            Some(spec) => {
                spec.apply_to_internal(&self.fv, &mut self.fv_conv);
                &mut self.fv_conv
            }
            None => &mut self.fv,
        };
        for (v, s) in out[dual..].iter_mut().zip(&self.scale) {
            *v *= s;
        }
        (out.as_slice(), weight)
    }

    /// Feature vector of exemplar `index` as stored: no conversion, no scale.
    ///
    /// The weight is still multiplied by the weight scale.
    ///
    /// # Panics
    ///
    /// Same conditions as [`fv`](Self::fv).
    pub fn ext_fv(&mut self, index: usize) -> (&[f32], f32) {
        let weight = self.extract(index);
        (self.fv.as_slice(), weight)
    }

    // =========================================================================
    // Sampling
    // =========================================================================

    /// Draw an exemplar index.
    ///
    /// Weighted by the weight feature when one is designated, uniform
    /// otherwise. Consumes one value from `rng`.
    ///
    /// # Errors
    ///
    /// - [`DataMatrixError::NotBound`] before [`set`](Self::set)
    /// - [`DataMatrixError::WeightCacheNotBuilt`] if weighted and
    ///   [`set_scale`](Self::set_scale) has not run since the last bind
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<usize, DataMatrixError> {
        if !self.is_bound() {
            return Err(DataMatrixError::NotBound);
        }
        if self.geometry.weight_offset.is_none() {
            return Ok(draw_uniform(self.geometry.exemplars, rng));
        }
        match &self.weight_cum {
            Some(cum) => Ok(cum.draw(rng)),
            None => Err(DataMatrixError::WeightCacheNotBuilt),
        }
    }

    // =========================================================================
    // Representation conversion
    // =========================================================================

    /// Convert an external vector to the internal representation and apply
    /// scale.
    ///
    /// Without a conversion the scale is applied in place and the same buffer
    /// is returned borrowed. With a conversion `external` is left untouched
    /// and a new buffer is returned.
    pub fn to_internal<'b>(&self, external: &'b mut [f32]) -> Cow<'b, [f32]> {
        debug_assert_eq!(external.len(), self.vector_len(), "external vector length mismatch");
        match &self.conversion {
            Some(spec) => {
                let mut internal = vec![0.0; external.len()];
                spec.apply_to_internal(external, &mut internal);
                self.apply_scale(&mut internal);
                Cow::Owned(internal)
            }
            None => {
                self.apply_scale(external);
                Cow::Borrowed(&*external)
            }
        }
    }

    /// Inverse of [`to_internal`](Self::to_internal).
    ///
    /// The scale is removed from `internal` in place. Without a conversion
    /// the same buffer is returned borrowed; with one, a new buffer.
    pub fn to_external<'b>(&self, internal: &'b mut [f32]) -> Cow<'b, [f32]> {
        debug_assert_eq!(internal.len(), self.vector_len(), "internal vector length mismatch");
        let dual = self.geometry.dual_features;
        for (v, s) in internal[dual..].iter_mut().zip(&self.scale) {
            *v /= s;
        }
        match &self.conversion {
            Some(spec) => {
                let mut external = vec![0.0; internal.len()];
                spec.apply_to_external(internal, &mut external);
                Cow::Owned(external)
            }
            None => Cow::Borrowed(&*internal),
        }
    }

    #[inline]
    fn apply_scale(&self, v: &mut [f32]) {
        let dual = self.geometry.dual_features;
        for (v, s) in v[dual..].iter_mut().zip(&self.scale) {
            *v *= s;
        }
    }

    // =========================================================================
    // Footprint
    // =========================================================================

    /// Bytes consumed by the view and the buffers it owns.
    ///
    /// The bound array is not counted.
    pub fn byte_size(&self) -> usize {
        size_of::<Self>()
            + self.dims.capacity() * size_of::<DimType>()
            + self.scale.capacity() * size_of::<f32>()
            + self.fv.capacity() * size_of::<f32>()
            + self.fv_conv.capacity() * size_of::<f32>()
            + self.conversion.as_ref().map_or(0, ConversionSpec::byte_size)
            + self.weight_cum.as_ref().map_or(0, CumulativeWeights::byte_size)
            + self.geometry.byte_size()
    }
}
