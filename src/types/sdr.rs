//! Sparse Distributed Representation (SDR) implementation.
//!
//! An SDR is a fixed-size group of boolean values (bits) of which only a small
//! fraction is active. It is stored as the sorted list of active indices; the
//! dense form is derived on demand.

use crate::error::{DendriteError, Result};
use crate::types::{ElemDense, ElemSparse, Real, UInt};
use crate::utils::Random;

use std::cmp::Ordering;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type alias for dense SDR data (array of bytes, 0 or 1).
pub type SdrDense = Vec<ElemDense>;

/// Type alias for sparse SDR data (sorted indices of active bits).
pub type SdrSparse = Vec<ElemSparse>;

/// Sparse Distributed Representation.
///
/// # Example
///
/// ```rust
/// use dendrite::types::Sdr;
///
/// let mut sdr = Sdr::new(&[10, 10]);
/// sdr.set_sparse(&[1, 4, 8, 15, 42]).unwrap();
///
/// assert_eq!(sdr.get_sum(), 5);
/// assert!(sdr.contains(42));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "SdrData"))]
pub struct Sdr {
    dimensions: Vec<UInt>,
    size: usize,
    sparse: SdrSparse,
}

/// Unvalidated serialized form of an [`Sdr`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct SdrData {
    dimensions: Vec<UInt>,
    size: usize,
    sparse: SdrSparse,
}

#[cfg(feature = "serde")]
impl TryFrom<SdrData> for Sdr {
    type Error = DendriteError;

    fn try_from(data: SdrData) -> Result<Self> {
        let size: usize = data.dimensions.iter().map(|&d| d as usize).product();
        if data.dimensions.is_empty()
            || (data.dimensions.len() > 1 && data.dimensions.contains(&0))
            || size != data.size
        {
            return Err(DendriteError::InvalidSdrData(format!(
                "Dimensions {:?} do not describe {} bits",
                data.dimensions, data.size
            )));
        }

        let mut sdr = Self {
            dimensions: data.dimensions,
            size,
            sparse: Vec::new(),
        };
        sdr.set_sparse(&data.sparse)?;
        Ok(sdr)
    }
}

impl Sdr {
    /// Creates a new SDR with the given dimensions, initialized to all zeros.
    ///
    /// # Panics
    ///
    /// Panics if dimensions is empty, or if a multi-dimensional shape contains a zero.
    #[must_use]
    pub fn new(dimensions: &[UInt]) -> Self {
        assert!(!dimensions.is_empty(), "Dimensions cannot be empty");

        // Allow size 0 for placeholder SDRs
        for (i, &dim) in dimensions.iter().enumerate() {
            if dim == 0 && dimensions.len() > 1 {
                panic!("Dimension {} cannot be zero in multi-dimensional SDR", i);
            }
        }

        Self {
            dimensions: dimensions.to_vec(),
            size: dimensions.iter().map(|&d| d as usize).product(),
            sparse: Vec::new(),
        }
    }

    /// Creates a one-dimensional SDR of `size` bits with the given active indices.
    pub fn from_sparse(size: usize, indices: &[ElemSparse]) -> Result<Self> {
        let mut sdr = Self::new(&[size as UInt]);
        sdr.set_sparse(indices)?;
        Ok(sdr)
    }

    /// Returns the dimensions of this SDR.
    #[inline]
    #[must_use]
    pub fn dimensions(&self) -> &[UInt] {
        &self.dimensions
    }

    /// Returns the total number of bits in the SDR.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Fails with `DimensionMismatch` unless this SDR holds exactly `expected` bits.
    pub fn ensure_size(&self, expected: usize) -> Result<()> {
        if self.size != expected {
            return Err(DendriteError::DimensionMismatch {
                expected: vec![expected as UInt],
                actual: self.dimensions.clone(),
            });
        }
        Ok(())
    }

    /// Sets all bits to zero.
    pub fn zero(&mut self) {
        self.sparse.clear();
    }

    // ========================================================================
    // Dense format operations
    // ========================================================================

    /// Sets the SDR value from a dense array, where non-zero means active.
    ///
    /// # Errors
    ///
    /// Returns an error if the data length doesn't match the SDR size.
    pub fn set_dense(&mut self, data: &[ElemDense]) -> Result<()> {
        if data.len() != self.size {
            return Err(DendriteError::DimensionMismatch {
                expected: vec![self.size as UInt],
                actual: vec![data.len() as UInt],
            });
        }

        self.sparse = data
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0)
            .map(|(i, _)| i as ElemSparse)
            .collect();
        Ok(())
    }

    /// Returns the dense representation of the SDR.
    #[must_use]
    pub fn get_dense(&self) -> SdrDense {
        let mut dense = vec![0; self.size];
        for &idx in &self.sparse {
            dense[idx as usize] = 1;
        }
        dense
    }

    // ========================================================================
    // Sparse format operations
    // ========================================================================

    /// Sets the SDR value from sparse indices.
    ///
    /// # Errors
    ///
    /// Returns an error if indices are not sorted, contain duplicates, or are out of bounds.
    pub fn set_sparse(&mut self, indices: &[ElemSparse]) -> Result<()> {
        self.validate_sparse(indices)?;
        self.sparse.clear();
        self.sparse.extend_from_slice(indices);
        Ok(())
    }

    /// Sets sparse indices without validation (for internal use).
    pub(crate) fn set_sparse_unchecked(&mut self, indices: SdrSparse) {
        debug_assert!(self.validate_sparse(&indices).is_ok());
        self.sparse = indices;
    }

    fn validate_sparse(&self, indices: &[ElemSparse]) -> Result<()> {
        let mut prev: Option<ElemSparse> = None;
        for &idx in indices {
            if idx as usize >= self.size {
                return Err(DendriteError::IndexOutOfBounds {
                    index: idx as usize,
                    size: self.size,
                });
            }
            if matches!(prev, Some(p) if idx <= p) {
                return Err(DendriteError::InvalidSdrData(
                    "Sparse indices must be sorted and unique".to_string(),
                ));
            }
            prev = Some(idx);
        }
        Ok(())
    }

    /// Returns the sorted indices of the active bits.
    #[inline]
    #[must_use]
    pub fn get_sparse(&self) -> &[ElemSparse] {
        &self.sparse
    }

    /// Returns true if bit `index` is active.
    #[must_use]
    pub fn contains(&self, index: ElemSparse) -> bool {
        self.sparse.binary_search(&index).is_ok()
    }

    // ========================================================================
    // Value queries
    // ========================================================================

    /// Returns the number of active bits.
    #[inline]
    #[must_use]
    pub fn get_sum(&self) -> usize {
        self.sparse.len()
    }

    /// Returns the fraction of active bits.
    #[must_use]
    pub fn get_sparsity(&self) -> Real {
        if self.size == 0 {
            return 0.0;
        }
        self.get_sum() as Real / self.size as Real
    }

    /// Returns the number of bits that are active in both SDRs.
    #[must_use]
    pub fn get_overlap(&self, other: &Sdr) -> usize {
        overlap(&self.sparse, &other.sparse)
    }

    // ========================================================================
    // SDR operations
    // ========================================================================

    /// Sets this SDR to the intersection of `a` and `b`.
    pub fn intersection(&mut self, a: &Sdr, b: &Sdr) -> Result<()> {
        self.check_same_shape(a)?;
        self.check_same_shape(b)?;

        let (x, y) = (&a.sparse, &b.sparse);
        let mut out = Vec::with_capacity(x.len().min(y.len()));
        let (mut i, mut j) = (0, 0);
        while i < x.len() && j < y.len() {
            match x[i].cmp(&y[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    out.push(x[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        self.sparse = out;
        Ok(())
    }

    /// Sets this SDR to the union of `a` and `b`.
    pub fn set_union(&mut self, a: &Sdr, b: &Sdr) -> Result<()> {
        self.check_same_shape(a)?;
        self.check_same_shape(b)?;

        let (x, y) = (&a.sparse, &b.sparse);
        let mut out = Vec::with_capacity(x.len() + y.len());
        let (mut i, mut j) = (0, 0);
        while i < x.len() && j < y.len() {
            match x[i].cmp(&y[j]) {
                Ordering::Less => {
                    out.push(x[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    out.push(y[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    out.push(x[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&x[i..]);
        out.extend_from_slice(&y[j..]);
        self.sparse = out;
        Ok(())
    }

    /// Activates a random `sparsity` fraction of the bits.
    pub fn randomize(&mut self, sparsity: Real, rng: &mut Random) {
        let num_active = ((self.size as Real) * sparsity).round() as usize;
        let mut indices: SdrSparse = rng
            .sample_indices(self.size, num_active)
            .into_iter()
            .map(|i| i as ElemSparse)
            .collect();
        indices.sort_unstable();
        self.sparse = indices;
    }

    fn check_same_shape(&self, other: &Sdr) -> Result<()> {
        if self.dimensions != other.dimensions {
            return Err(DendriteError::DimensionMismatch {
                expected: self.dimensions.clone(),
                actual: other.dimensions.clone(),
            });
        }
        Ok(())
    }
}

/// Counts common elements of two sorted index lists.
pub(crate) fn overlap(a: &[ElemSparse], b: &[ElemSparse]) -> usize {
    let mut count = 0;
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }

    count
}

impl fmt::Debug for Sdr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SDR({:?}) {:?}", self.dimensions, self.sparse)
    }
}

impl fmt::Display for Sdr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.dimensions.iter().map(ToString::to_string).collect();
        let bits: Vec<String> = self.sparse.iter().map(ToString::to_string).collect();
        write!(f, "SDR( {} ) {}", dims.join(", "), bits.join(", "))
    }
}

impl Default for Sdr {
    fn default() -> Self {
        Self::new(&[0])
    }
}
