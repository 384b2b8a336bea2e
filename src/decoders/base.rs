//! Base decoder trait and the SDR lookup table shared by decoders.

use crate::error::{DendriteError, Result};
use crate::types::{Sdr, SdrSparse};

use ahash::AHashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Trait for all decoders.
///
/// Decoders remember the values observed together with SDRs and map an SDR
/// back onto a value: exact matches first, otherwise the stored SDR with the
/// largest overlap.
pub trait Decoder<T> {
    /// Returns the size of the SDRs this decoder accepts.
    fn size(&self) -> usize;

    /// Decodes an SDR, optionally learning `value` for it first.
    ///
    /// Returns `None` when nothing stored overlaps the SDR. `learn` requires
    /// a value.
    fn decode(&mut self, sdr: &Sdr, value: Option<T>, learn: bool) -> Result<Option<T>>;

    /// Decodes an SDR without learning.
    fn infer(&mut self, sdr: &Sdr) -> Result<Option<T>> {
        self.decode(sdr, None, false)
    }
}

/// SDRs and their associated entries, in first-seen order.
///
/// Entries are keyed by the active bits alone, so the same bits arriving with
/// a different shape resolve to the same entry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) struct SdrTable<V> {
    size: usize,
    entries: Vec<(Sdr, V)>,
    index: AHashMap<SdrSparse, usize>,
}

impl<V> SdrTable<V> {
    pub(crate) fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(DendriteError::InvalidParameter {
                name: "size",
                message: "Must be > 0".to_string(),
            });
        }
        Ok(Self {
            size,
            entries: Vec::new(),
            index: AHashMap::new(),
        })
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks the SDR size and that a value accompanies learning.
    pub(crate) fn check_request(&self, sdr: &Sdr, has_value: bool, learn: bool) -> Result<()> {
        sdr.ensure_size(self.size)?;
        if learn && !has_value {
            return Err(DendriteError::InvalidParameter {
                name: "value",
                message: "Learning requires a value".to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn get(&self, sdr: &Sdr) -> Option<&V> {
        let &slot = self.index.get(sdr.get_sparse())?;
        Some(&self.entries[slot].1)
    }

    pub(crate) fn get_mut(&mut self, sdr: &Sdr) -> Option<&mut V> {
        let &slot = self.index.get(sdr.get_sparse())?;
        Some(&mut self.entries[slot].1)
    }

    /// Stores a new entry, replacing the value of an existing one with the
    /// same active bits.
    pub(crate) fn insert(&mut self, sdr: &Sdr, value: V) {
        if let Some(&slot) = self.index.get(sdr.get_sparse()) {
            self.entries[slot].1 = value;
            return;
        }
        self.index.insert(sdr.get_sparse().to_vec(), self.entries.len());
        self.entries.push((sdr.clone(), value));
    }

    /// Returns the accepted entry with the largest strictly positive overlap.
    /// Ties go to the first-seen entry.
    pub(crate) fn nearest(&self, sdr: &Sdr, accept: impl Fn(&V) -> bool) -> Option<&V> {
        let mut best: Option<(usize, &V)> = None;
        for (stored, value) in &self.entries {
            if !accept(value) {
                continue;
            }
            let overlap = sdr.get_overlap(stored);
            if overlap > best.map_or(0, |(o, _)| o) {
                best = Some((overlap, value));
            }
        }
        best.map(|(_, value)| value)
    }
}
