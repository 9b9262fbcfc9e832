//! Declarative binding configuration.
//!
//! [`DataMatrixConfig`] captures everything needed to bind and scale a
//! [`DataMatrix`] apart from the array itself. It can be built with a
//! validating builder or deserialized (e.g. from JSON), and applied with
//! [`DataMatrix::from_config`].
//!
//! # Example
//!
//! ```
//! use datamatrix::{DataMatrix, DataMatrixConfig, DimType};
//! use ndarray::array;
//!
//! let config = DataMatrixConfig::builder()
//!     .dims(vec![DimType::Data, DimType::Feature])
//!     .weight_index(2)
//!     .scale(vec![0.5, 0.5])
//!     .build()
//!     .unwrap();
//!
//! let data = array![[2.0f32, 4.0, 1.0], [6.0, 8.0, 3.0]];
//! let mut dm = DataMatrix::from_config(data.view(), &config).unwrap();
//! assert_eq!(dm.fv(1), (&[3.0f32, 4.0][..], 3.0));
//! ```

use bon::Builder;
use ndarray::{ArrayView, Dimension};
use serde::{Deserialize, Serialize};

use crate::convert::ConversionSpec;
use crate::dims::DimType;
use crate::element::Element;
use crate::error::DataMatrixError;
use crate::matrix::DataMatrix;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors found while validating a [`DataMatrixConfig`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("dims must tag at least one axis as data or dual")]
    NoDataAxis,

    #[error("weight_scale must be positive and finite, got {0}")]
    InvalidWeightScale(f32),

    #[error("scale[{index}] must be finite, got {value}")]
    NonFiniteScale { index: usize, value: f32 },

    #[error("scale[{index}] must be non-zero")]
    ZeroScale { index: usize },
}

/// Check per-feature multipliers and the weight multiplier.
///
/// Shared by [`DataMatrixConfig::validate`] and
/// [`DataMatrix::set_scale`], so both paths reject the same inputs.
pub(crate) fn check_scale(scale: &[f32], weight_scale: f32) -> Result<(), ConfigError> {
    if !(weight_scale.is_finite() && weight_scale > 0.0) {
        return Err(ConfigError::InvalidWeightScale(weight_scale));
    }
    for (index, &value) in scale.iter().enumerate() {
        if !value.is_finite() {
            return Err(ConfigError::NonFiniteScale { index, value });
        }
        if value == 0.0 {
            return Err(ConfigError::ZeroScale { index });
        }
    }
    Ok(())
}

// =============================================================================
// DataMatrixConfig
// =============================================================================

/// Binding and scaling parameters for a [`DataMatrix`].
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct DataMatrixConfig {
    /// Role of each array axis.
    pub dims: Vec<DimType>,

    /// Flattened feature index used as the exemplar weight.
    #[serde(default)]
    pub weight_index: Option<usize>,

    /// Internal representation, if different from storage.
    #[serde(default)]
    pub conversion: Option<ConversionSpec>,

    /// Per-feature multipliers. `None` means all ones.
    #[serde(default)]
    pub scale: Option<Vec<f32>>,

    /// Multiplier for the weight feature. Default: 1.0.
    #[builder(default = 1.0)]
    #[serde(default = "default_weight_scale")]
    pub weight_scale: f32,
}

fn default_weight_scale() -> f32 {
    1.0
}

impl<S: data_matrix_config_builder::IsComplete> DataMatrixConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if no axis is an exemplar axis, the weight
    /// scale is not positive, or a scale entry is zero or not finite.
    pub fn build(self) -> Result<DataMatrixConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl DataMatrixConfig {
    /// Check the parts of the configuration that do not depend on the array.
    ///
    /// Shape-dependent checks (rank, weight index range, scale length) run
    /// when the config is applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dims.iter().any(|d| d.is_exemplar_axis()) {
            return Err(ConfigError::NoDataAxis);
        }
        check_scale(self.scale.as_deref().unwrap_or_default(), self.weight_scale)
    }
}

impl<'a, T: Element> DataMatrix<'a, T> {
    /// Bind `array` and apply scale according to `config`.
    ///
    /// Always runs [`set_scale`](Self::set_scale), which re-checks the scale
    /// against the bound shape, so weighted draws are ready on return.
    pub fn from_config<D: Dimension>(
        array: ArrayView<'a, T, D>,
        config: &DataMatrixConfig,
    ) -> Result<Self, DataMatrixError> {
        config.validate()?;
        let mut dm = Self::new(array, &config.dims, config.weight_index, config.conversion.clone())?;
        match &config.scale {
            Some(scale) => dm.set_scale(scale, config.weight_scale)?,
            None => {
                let ones = vec![1.0; dm.features()];
                dm.set_scale(&ones, config.weight_scale)?;
            }
        }
        Ok(dm)
    }
}
