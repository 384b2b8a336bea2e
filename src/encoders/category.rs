//! Category Encoder implementation.
//!
//! The Category Encoder maps discrete string categories onto non-overlapping
//! blocks of bits. Block 0 is reserved for values that are not a known
//! category.

use crate::encoders::Encoder;
use crate::error::{DendriteError, Result};
use crate::types::{Sdr, UInt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for creating a Category Encoder.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CategoryEncoderParams {
    /// Category names. Duplicates are ignored and the encoding order is alphabetical.
    pub categories: Vec<String>,

    /// Number of active bits for each category encoding.
    pub active_bits: UInt,
}

impl Default for CategoryEncoderParams {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            active_bits: 21,
        }
    }
}

/// Encodes discrete categories into SDR representations.
///
/// # Example
///
/// ```rust
/// use dendrite::encoders::{CategoryEncoder, CategoryEncoderParams, Encoder};
///
/// let encoder = CategoryEncoder::new(CategoryEncoderParams {
///     categories: vec!["red".to_string(), "green".to_string(), "blue".to_string()],
///     active_bits: 10,
/// }).unwrap();
///
/// let sdr_red = encoder.encode_to_sdr("red").unwrap();
/// let sdr_blue = encoder.encode_to_sdr("blue").unwrap();
///
/// // Different categories have no overlap
/// assert_eq!(sdr_red.get_overlap(&sdr_blue), 0);
/// assert_eq!(encoder.bucket_index("purple"), 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CategoryEncoder {
    /// Sorted, unique categories.
    categories: Vec<String>,

    /// Number of active bits per category.
    active_bits: UInt,

    /// Output dimensions.
    dimensions: Vec<UInt>,
}

impl CategoryEncoder {
    /// Creates a new Category Encoder.
    pub fn new(params: CategoryEncoderParams) -> Result<Self> {
        if params.active_bits == 0 {
            return Err(DendriteError::InvalidParameter {
                name: "active_bits",
                message: "Must be > 0".to_string(),
            });
        }

        let mut categories = params.categories;
        categories.sort_unstable();
        categories.dedup();

        let size = UInt::try_from(categories.len() + 1)
            .ok()
            .and_then(|buckets| buckets.checked_mul(params.active_bits))
            .ok_or(DendriteError::InvalidParameter {
                name: "categories",
                message: "Encoding size overflows".to_string(),
            })?;

        Ok(Self {
            categories,
            active_bits: params.active_bits,
            dimensions: vec![size],
        })
    }

    /// Returns the bucket of a category; unknown categories map to bucket 0.
    pub fn bucket_index(&self, category: &str) -> UInt {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(category))
            .map_or(0, |i| i as UInt + 1)
    }

    /// Returns the known categories in encoding order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Returns the number of active bits.
    pub fn active_bits(&self) -> UInt {
        self.active_bits
    }

    /// Returns the total number of output bits.
    pub fn size(&self) -> usize {
        self.dimensions[0] as usize
    }
}

impl Encoder<&str> for CategoryEncoder {
    fn dimensions(&self) -> &[UInt] {
        &self.dimensions
    }

    fn size(&self) -> usize {
        CategoryEncoder::size(self)
    }

    fn encode(&self, value: &str, output: &mut Sdr) -> Result<()> {
        output.ensure_size(CategoryEncoder::size(self))?;

        let start = self.bucket_index(value) * self.active_bits;
        output.set_sparse_unchecked((start..start + self.active_bits).collect());
        Ok(())
    }
}

impl Encoder<String> for CategoryEncoder {
    fn dimensions(&self) -> &[UInt] {
        &self.dimensions
    }

    fn size(&self) -> usize {
        CategoryEncoder::size(self)
    }

    fn encode(&self, value: String, output: &mut Sdr) -> Result<()> {
        Encoder::<&str>::encode(self, value.as_str(), output)
    }
}
