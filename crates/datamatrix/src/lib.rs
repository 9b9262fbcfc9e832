//! datamatrix: exemplar/feature views over N-dimensional arrays.
//!
//! Wraps a borrowed ndarray view and presents it as a list of exemplars, each
//! with a flat `f32` feature vector, for algorithms that draw exemplars and
//! fetch their features in tight loops.
//!
//! # Key Types
//!
//! - [`DataMatrix`] - The view: binding, extraction, sampling, conversion
//! - [`DimType`] - Role of each array axis (data, dual, feature)
//! - [`ConversionSpec`] - External/internal representation mapping
//! - [`CumulativeWeights`] - Weighted exemplar selection
//! - [`DataMatrixConfig`] - Declarative binding configuration
//!
//! # Example
//!
//! ```
//! use datamatrix::{DataMatrix, DimType};
//! use ndarray::Array3;
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256PlusPlus;
//!
//! // A 4x5 RGB image: every pixel is an exemplar with features [y, x, r, g, b].
//! let image = Array3::<u8>::zeros((4, 5, 3));
//! let dims = DimType::parse_codes("bbf").unwrap();
//! let mut dm = DataMatrix::new(image.view(), &dims, None, None).unwrap();
//!
//! assert_eq!(dm.exemplars(), 20);
//! assert_eq!(dm.vector_len(), 5);
//!
//! let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
//! let i = dm.draw(&mut rng).unwrap();
//! let (fv, weight) = dm.fv(i);
//! assert_eq!(fv.len(), 5);
//! assert_eq!(weight, 1.0);
//! ```

pub mod config;
pub mod convert;
pub mod dims;
pub mod element;
pub mod error;
pub mod matrix;
pub mod sampling;
pub mod testing;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use config::{ConfigError, DataMatrixConfig};
pub use convert::{ConversionSpec, ConvertOp, Encoding};
pub use dims::DimType;
pub use element::{Element, ElementKind};
pub use error::{DataMatrixError, ParseError};
pub use matrix::DataMatrix;
pub use sampling::CumulativeWeights;
