//! Scalar Encoder implementation.
//!
//! The Scalar Encoder converts numerical values into a contiguous run of
//! active bits whose start is the value's bucket. Nearby values share bits.

use crate::encoders::Encoder;
use crate::error::{DendriteError, Result};
use crate::types::{Sdr, UInt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for creating a Scalar Encoder.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScalarEncoderParams {
    /// Minimum value of the input range (inclusive).
    pub minimum: f64,

    /// Maximum value of the input range (exclusive).
    pub maximum: f64,

    /// Number of buckets the range is divided into.
    pub num_buckets: UInt,

    /// Number of active bits for each encoding.
    pub active_bits: UInt,
}

impl Default for ScalarEncoderParams {
    fn default() -> Self {
        Self {
            minimum: 0.0,
            maximum: 100.0,
            num_buckets: 100,
            active_bits: 21,
        }
    }
}

/// Encodes scalar values into SDR representations.
///
/// The output has `num_buckets + active_bits - 1` bits. A value in bucket `b`
/// activates bits `b .. b + active_bits`.
///
/// # Example
///
/// ```rust
/// use dendrite::encoders::{ScalarEncoder, ScalarEncoderParams, Encoder};
///
/// let encoder = ScalarEncoder::new(ScalarEncoderParams {
///     minimum: 0.0,
///     maximum: 100.0,
///     num_buckets: 100,
///     active_bits: 5,
/// }).unwrap();
///
/// let sdr = encoder.encode_to_sdr(50.0).unwrap();
/// assert_eq!(sdr.size(), 104);
/// assert_eq!(sdr.get_sparse(), &[50, 51, 52, 53, 54]);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScalarEncoder {
    minimum: f64,
    maximum: f64,
    num_buckets: UInt,
    active_bits: UInt,

    /// Precomputed: input units per bucket.
    bucket_width: f64,

    /// Output dimensions.
    dimensions: Vec<UInt>,
}

impl ScalarEncoder {
    /// Creates a new Scalar Encoder.
    pub fn new(params: ScalarEncoderParams) -> Result<Self> {
        if !params.minimum.is_finite() || !params.maximum.is_finite() {
            return Err(DendriteError::InvalidParameter {
                name: "minimum",
                message: "Range bounds must be finite".to_string(),
            });
        }
        if params.maximum <= params.minimum {
            return Err(DendriteError::InvalidParameter {
                name: "maximum",
                message: "Maximum must be greater than minimum".to_string(),
            });
        }
        if params.num_buckets == 0 {
            return Err(DendriteError::InvalidParameter {
                name: "num_buckets",
                message: "Must be > 0".to_string(),
            });
        }
        if params.active_bits == 0 {
            return Err(DendriteError::InvalidParameter {
                name: "active_bits",
                message: "Must be > 0".to_string(),
            });
        }

        let size = params
            .num_buckets
            .checked_add(params.active_bits - 1)
            .ok_or(DendriteError::InvalidParameter {
                name: "num_buckets",
                message: "Encoding size overflows".to_string(),
            })?;

        Ok(Self {
            minimum: params.minimum,
            maximum: params.maximum,
            num_buckets: params.num_buckets,
            active_bits: params.active_bits,
            bucket_width: (params.maximum - params.minimum) / f64::from(params.num_buckets),
            dimensions: vec![size],
        })
    }

    /// Returns the bucket index for a value.
    ///
    /// Values outside `[minimum, maximum)` and NaN are rejected.
    pub fn bucket_index(&self, value: f64) -> Result<UInt> {
        if !(value >= self.minimum && value < self.maximum) {
            return Err(DendriteError::ValueOutOfRange {
                value,
                minimum: self.minimum,
                maximum: self.maximum,
            });
        }

        let bucket = ((value - self.minimum) / self.bucket_width).floor() as UInt;
        Ok(bucket.min(self.num_buckets - 1))
    }

    /// Returns the minimum value.
    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    /// Returns the maximum value.
    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    /// Returns the number of buckets.
    pub fn num_buckets(&self) -> UInt {
        self.num_buckets
    }

    /// Returns the width of a bucket in input units.
    pub fn bucket_width(&self) -> f64 {
        self.bucket_width
    }

    /// Returns the number of active bits.
    pub fn active_bits(&self) -> UInt {
        self.active_bits
    }
}

impl Encoder<f64> for ScalarEncoder {
    fn dimensions(&self) -> &[UInt] {
        &self.dimensions
    }

    fn size(&self) -> usize {
        self.dimensions[0] as usize
    }

    fn encode(&self, value: f64, output: &mut Sdr) -> Result<()> {
        output.ensure_size(self.size())?;

        let start = self.bucket_index(value)?;
        output.set_sparse_unchecked((start..start + self.active_bits).collect());
        Ok(())
    }
}
