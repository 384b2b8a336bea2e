//! Category Decoder implementation.
//!
//! Counts how often each value was observed with each distinct SDR and
//! answers with the majority.

use crate::decoders::base::{Decoder, SdrTable};
use crate::error::Result;
use crate::types::Sdr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Value counts for one SDR, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct Votes<T> {
    counts: Vec<(T, u64)>,
}

impl<T: Clone + Eq> Votes<T> {
    fn new() -> Self {
        Self { counts: Vec::new() }
    }

    fn add(&mut self, value: T) {
        match self.counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((value, 1)),
        }
    }

    fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Most frequent value; ties go to the first seen.
    fn majority(&self) -> Option<T> {
        let mut best: Option<&(T, u64)> = None;
        for entry in &self.counts {
            if best.map_or(true, |(_, count)| entry.1 > *count) {
                best = Some(entry);
            }
        }
        best.map(|(value, _)| value.clone())
    }
}

/// Decodes SDRs into discrete values by majority vote.
///
/// # Example
///
/// ```rust
/// use dendrite::decoders::{CategoryDecoder, Decoder};
/// use dendrite::encoders::{CategoryEncoder, CategoryEncoderParams, Encoder};
///
/// let encoder = CategoryEncoder::new(CategoryEncoderParams {
///     categories: vec!["cat".to_string(), "dog".to_string()],
///     active_bits: 4,
/// }).unwrap();
/// let mut decoder = CategoryDecoder::new(12).unwrap();
///
/// let sdr = encoder.encode_to_sdr("dog").unwrap();
/// decoder.decode(&sdr, Some("dog".to_string()), true).unwrap();
/// assert_eq!(decoder.infer(&sdr).unwrap(), Some("dog".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CategoryDecoder<T> {
    table: SdrTable<Votes<T>>,
}

impl<T: Clone + Eq> CategoryDecoder<T> {
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

impl<T: Clone + Eq> Decoder<T> for CategoryDecoder<T> {
    fn size(&self) -> usize {
        self.table.size()
    }

    fn decode(&mut self, sdr: &Sdr, value: Option<T>, learn: bool) -> Result<Option<T>> {
        self.table.check_request(sdr, value.is_some(), learn)?;

        if let Some(value) = value.filter(|_| learn) {
            match self.table.get_mut(sdr) {
                Some(votes) => votes.add(value),
                None => {
                    let mut votes = Votes::new();
                    votes.add(value);
                    self.table.insert(sdr, votes);
                }
            }
        }

        if let Some(votes) = self.table.get(sdr) {
            if !votes.is_empty() {
                return Ok(votes.majority());
            }
        }

        Ok(self
            .table
            .nearest(sdr, |votes| !votes.is_empty())
            .and_then(Votes::majority))
    }
}
