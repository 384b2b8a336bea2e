//! Encoders for converting values into SDR representations.
//!
//! - [`ScalarEncoder`]: numbers as a contiguous block of active bits positioned by bucket
//! - [`CategoryEncoder`]: strings as non-overlapping blocks, with a reserved unknown block
//!
//! # Example
//!
//! ```rust
//! use dendrite::encoders::{ScalarEncoder, ScalarEncoderParams, Encoder};
//!
//! let encoder = ScalarEncoder::new(ScalarEncoderParams {
//!     minimum: 0.0,
//!     maximum: 100.0,
//!     num_buckets: 100,
//!     active_bits: 5,
//! }).unwrap();
//!
//! let sdr = encoder.encode_to_sdr(42.0).unwrap();
//! assert_eq!(sdr.get_sum(), 5);
//! ```

mod base;
mod category;
mod scalar;

pub use base::Encoder;
pub use category::{CategoryEncoder, CategoryEncoderParams};
pub use scalar::{ScalarEncoder, ScalarEncoderParams};
