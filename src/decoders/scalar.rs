//! Scalar Decoder implementation.
//!
//! Keeps a running mean of the values observed with each distinct SDR.

use crate::decoders::base::{Decoder, SdrTable};
use crate::error::Result;
use crate::types::Sdr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Running mean of the values seen with one SDR.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct RunningMean {
    mean: f64,
    count: u64,
}

/// Decodes SDRs into scalar values by online averaging.
///
/// # Example
///
/// ```rust
/// use dendrite::decoders::{Decoder, ScalarDecoder};
/// use dendrite::encoders::{Encoder, ScalarEncoder, ScalarEncoderParams};
///
/// let encoder = ScalarEncoder::new(ScalarEncoderParams {
///     minimum: 0.0,
///     maximum: 100.0,
///     num_buckets: 100,
///     active_bits: 5,
/// }).unwrap();
/// let mut decoder = ScalarDecoder::new(encoder.size()).unwrap();
///
/// let sdr = encoder.encode_to_sdr(50.0).unwrap();
/// decoder.decode(&sdr, Some(50.0), true).unwrap();
/// assert_eq!(decoder.infer(&sdr).unwrap(), Some(50.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScalarDecoder {
    table: SdrTable<RunningMean>,
}

impl ScalarDecoder {
    /// Creates a decoder for SDRs of `size` bits.
    pub fn new(size: usize) -> Result<Self> {
        Ok(Self {
            table: SdrTable::new(size)?,
        })
    }

    /// Returns the number of distinct SDRs stored.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if nothing has been learned.
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }
}

impl Decoder<f64> for ScalarDecoder {
    fn size(&self) -> usize {
        self.table.size()
    }

    fn decode(&mut self, sdr: &Sdr, value: Option<f64>, learn: bool) -> Result<Option<f64>> {
        self.table.check_request(sdr, value.is_some(), learn)?;
        let value = value.filter(|_| learn);

        if let Some(entry) = self.table.get_mut(sdr) {
            if let Some(value) = value {
                let n = entry.count as f64;
                entry.mean = (entry.mean * n + value) / (n + 1.0);
                entry.count += 1;
            }
            return Ok(Some(entry.mean));
        }

        let nearest = self.table.nearest(sdr, |_| true).map(|entry| entry.mean);

        if let Some(value) = value {
            self.table.insert(
                sdr,
                RunningMean {
                    mean: value,
                    count: 1,
                },
            );
        }

        Ok(nearest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DendriteError;
    use approx::assert_relative_eq;

    fn sdr(indices: &[u32]) -> Sdr {
        let mut sdr = Sdr::new(&[20]);
        sdr.set_sparse(indices).unwrap();
        sdr
    }

    #[test]
    fn test_empty_decoder() {
        let mut decoder = ScalarDecoder::new(20).unwrap();
        assert!(decoder.is_empty());
        assert_eq!(decoder.infer(&sdr(&[1, 2, 3])).unwrap(), None);
    }

    #[test]
    fn test_first_observation_returns_previous_estimate() {
        let mut decoder = ScalarDecoder::new(20).unwrap();

        // Nothing stored yet, so learning a new SDR returns None
        assert_eq!(decoder.decode(&sdr(&[1, 2, 3]), Some(4.0), true).unwrap(), None);
        assert_eq!(decoder.len(), 1);
    }

    #[test]
    fn test_running_mean() {
        let mut decoder = ScalarDecoder::new(20).unwrap();
        let a = sdr(&[1, 2, 3]);

        decoder.decode(&a, Some(10.0), true).unwrap();
        decoder.decode(&a, Some(20.0), true).unwrap();
        let mean = decoder.decode(&a, Some(30.0), true).unwrap().unwrap();

        assert_relative_eq!(mean, 20.0);
        assert_relative_eq!(decoder.infer(&a).unwrap().unwrap(), 20.0);
        assert_eq!(decoder.len(), 1);
    }

    #[test]
    fn test_reshaped_sdr_updates_same_mean() {
        let mut decoder = ScalarDecoder::new(104).unwrap();
        let flat = Sdr::from_sparse(104, &[50, 51, 52, 53, 54]).unwrap();
        let mut shaped = Sdr::new(&[4, 26]);
        shaped.set_sparse(&[50, 51, 52, 53, 54]).unwrap();

        decoder.decode(&flat, Some(10.0), true).unwrap();
        let mean = decoder.decode(&shaped, Some(20.0), true).unwrap().unwrap();

        assert_relative_eq!(mean, 15.0);
        assert_eq!(decoder.len(), 1);
        assert_relative_eq!(decoder.infer(&flat).unwrap().unwrap(), 15.0);
    }

    #[test]
    fn test_nearest_match() {
        let mut decoder = ScalarDecoder::new(20).unwrap();
        decoder.decode(&sdr(&[1, 2, 3, 4]), Some(1.0), true).unwrap();
        decoder.decode(&sdr(&[10, 11, 12, 13]), Some(2.0), true).unwrap();

        assert_eq!(decoder.infer(&sdr(&[2, 3, 4, 5])).unwrap(), Some(1.0));
        assert_eq!(decoder.infer(&sdr(&[11, 12, 13, 14])).unwrap(), Some(2.0));
        assert_eq!(decoder.infer(&sdr(&[17, 18])).unwrap(), None);
    }

    #[test]
    fn test_ties_go_to_first_seen() {
        let mut decoder = ScalarDecoder::new(20).unwrap();
        decoder.decode(&sdr(&[1, 2]), Some(1.0), true).unwrap();
        decoder.decode(&sdr(&[3, 4]), Some(2.0), true).unwrap();

        assert_eq!(decoder.infer(&sdr(&[2, 3])).unwrap(), Some(1.0));
    }

    #[test]
    fn test_value_ignored_without_learning() {
        let mut decoder = ScalarDecoder::new(20).unwrap();
        let a = sdr(&[1, 2, 3]);
        decoder.decode(&a, Some(10.0), true).unwrap();

        assert_eq!(decoder.decode(&a, Some(99.0), false).unwrap(), Some(10.0));
        assert_eq!(decoder.infer(&a).unwrap(), Some(10.0));
    }

    #[test]
    fn test_errors() {
        let mut decoder = ScalarDecoder::new(20).unwrap();

        assert!(matches!(
            decoder.infer(&Sdr::new(&[21])),
            Err(DendriteError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            decoder.decode(&sdr(&[1]), None, true),
            Err(DendriteError::InvalidParameter { .. })
        ));
        assert!(decoder.is_empty());
        assert!(ScalarDecoder::new(0).is_err());
    }
}
