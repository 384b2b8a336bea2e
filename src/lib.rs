//! # Dendrite - an HTM sequence-learning core
//!
//! Dendrite implements the learning core of a Hierarchical Temporal Memory style engine
//! operating on Sparse Distributed Representations (SDRs).
//!
//! ## Overview
//!
//! - **Sparse Distributed Representations (SDR)**: fixed-width binary vectors with few active bits
//! - **Encoders**: turn scalars and categories into SDRs
//! - **Spatial Pooler**: maps an input SDR onto a fixed number of winning columns
//! - **Temporal Memory**: learns sequences of column activations and predicts the next one
//! - **Decoders**: map SDRs back onto values seen during learning
//!
//! Per timestep data flows as
//! `value -> Encoder -> SpatialPooler -> TemporalMemory -> Decoder -> value`.
//!
//! ## Quick Start
//!
//! ```rust
//! use dendrite::prelude::*;
//!
//! let encoder = ScalarEncoder::new(ScalarEncoderParams {
//!     minimum: 0.0,
//!     maximum: 100.0,
//!     num_buckets: 100,
//!     active_bits: 5,
//! })?;
//!
//! let mut sp = SpatialPooler::new(SpatialPoolerParams {
//!     input_size: encoder.size(),
//!     num_columns: 200,
//!     ..Default::default()
//! })?;
//!
//! let mut tm = TemporalMemory::new(TemporalMemoryParams {
//!     num_columns: 200,
//!     cells_per_column: 4,
//!     ..Default::default()
//! })?;
//!
//! let input = encoder.encode_to_sdr(42.0)?;
//! let mut columns = Sdr::new(&[200]);
//! let mut cells = Sdr::new(&[200 * 4]);
//!
//! sp.compute(&input, true, true, &mut columns)?;
//! tm.compute(&columns, true, &mut cells)?;
//! assert_eq!(columns.get_sum(), sp.num_active_columns());
//! # Ok::<(), dendrite::DendriteError>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: derive `Serialize`/`Deserialize` for parameters, SDRs and components

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

pub mod types;
pub mod algorithms;
pub mod encoders;
pub mod decoders;
pub mod utils;

/// Re-export of commonly used types and traits for convenience.
pub mod prelude {
    pub use crate::types::{
        Sdr, SdrDense, SdrSparse,
        CellIdx, SynapseIdx, Segment, Synapse, Permanence,
        Real, UInt, ElemDense, ElemSparse,
    };
    pub use crate::algorithms::{
        Connections, ConnectionsParams,
        SpatialPooler, SpatialPoolerParams,
        TemporalMemory, TemporalMemoryParams,
    };
    pub use crate::encoders::{
        Encoder,
        ScalarEncoder, ScalarEncoderParams,
        CategoryEncoder, CategoryEncoderParams,
    };
    pub use crate::decoders::{Decoder, ScalarDecoder, CategoryDecoder};
    pub use crate::utils::Random;
    pub use crate::error::{DendriteError, Result};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for the library.
pub mod error {
    use thiserror::Error;

    /// Main error type for dendrite operations.
    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum DendriteError {
        /// Invalid parameter value.
        #[error("Invalid parameter '{name}': {message}")]
        InvalidParameter {
            /// Name of the invalid parameter.
            name: &'static str,
            /// Description of the error.
            message: String,
        },

        /// Dimension mismatch between an SDR and the structure consuming it.
        #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
        DimensionMismatch {
            /// Expected dimensions.
            expected: Vec<u32>,
            /// Actual dimensions.
            actual: Vec<u32>,
        },

        /// Index out of bounds.
        #[error("Index {index} out of bounds (size: {size})")]
        IndexOutOfBounds {
            /// The invalid index.
            index: usize,
            /// The valid size.
            size: usize,
        },

        /// SDR data is invalid (e.g., unsorted sparse indices).
        #[error("Invalid SDR data: {0}")]
        InvalidSdrData(String),

        /// A value falls outside an encoder's configured range.
        #[error("Value {value} outside of range [{minimum}, {maximum})")]
        ValueOutOfRange {
            /// The rejected value.
            value: f64,
            /// Inclusive lower bound.
            minimum: f64,
            /// Exclusive upper bound.
            maximum: f64,
        },
    }

    /// Result type alias using DendriteError.
    pub type Result<T> = std::result::Result<T, DendriteError>;
}

pub use error::{DendriteError, Result};
