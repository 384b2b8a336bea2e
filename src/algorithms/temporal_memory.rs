//! Temporal Memory implementation.
//!
//! The Temporal Memory learns sequences of column activations. Each column
//! holds several cells; cells own dendritic segments whose synapses listen to
//! the cells active on the previous step. A segment with enough connected
//! active synapses makes its cell predictive. A predicted column activates
//! only its predictive cells, an unpredicted one bursts (all cells fire).
//!
//! Segments are owned per cell, bounded per cell by `max_segments_per_cell`
//! and globally by `max_segments`. Once a bound is reached no new segment is
//! created; segments and synapses are never removed.

use crate::algorithms::{Connections, ConnectionsParams};
use crate::error::{DendriteError, Result};
use crate::types::{CellIdx, Permanence, Real, Sdr, Segment, SynapseIdx, UInt};
use crate::utils::Random;

use log::{debug, trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for creating a Temporal Memory.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TemporalMemoryParams {
    /// Number of columns.
    pub num_columns: usize,

    /// Number of cells per column.
    pub cells_per_column: usize,

    /// Total number of segments across all cells.
    pub max_segments: usize,

    /// Maximum number of segments per cell.
    pub max_segments_per_cell: usize,

    /// Maximum number of synapses per segment.
    pub max_synapses_per_segment: usize,

    /// Maximum number of new synapses added to a segment per learning step.
    pub max_new_synapse_count: usize,

    /// Lower permanence bound.
    pub synapse_min: Permanence,

    /// Initial permanence for new synapses.
    pub synapse_init: Permanence,

    /// Upper permanence bound.
    pub synapse_max: Permanence,

    /// Permanence at or above which a synapse is connected.
    pub synapse_threshold: Permanence,

    /// Amount to increment permanence for synapses from previously active cells.
    pub synapse_inc: Permanence,

    /// Amount to decrement permanence for all other synapses of a learning segment.
    pub synapse_dec: Permanence,

    /// Amount to decrement matching segments in columns that did not become active.
    pub predicted_segment_decrement: Permanence,

    /// Connected active synapses needed for a segment to be active.
    pub segment_active_threshold: SynapseIdx,

    /// Potential active synapses needed for a segment to be matching.
    pub segment_match_threshold: SynapseIdx,

    /// Random seed (negative for a seed from system entropy).
    pub seed: i64,
}

impl Default for TemporalMemoryParams {
    fn default() -> Self {
        Self {
            num_columns: 2048,
            cells_per_column: 32,
            max_segments: 1 << 16,
            max_segments_per_cell: 255,
            max_synapses_per_segment: 255,
            max_new_synapse_count: 20,
            synapse_min: 0,
            synapse_init: 60,
            synapse_max: 100,
            synapse_threshold: 50,
            synapse_inc: 2,
            synapse_dec: 1,
            predicted_segment_decrement: 0,
            segment_active_threshold: 10,
            segment_match_threshold: 7,
            seed: 42,
        }
    }
}

impl TemporalMemoryParams {
    fn validate(&self) -> Result<()> {
        if self.num_columns == 0 {
            return Err(DendriteError::InvalidParameter {
                name: "num_columns",
                message: "Must be > 0".to_string(),
            });
        }
        if self.cells_per_column == 0 {
            return Err(DendriteError::InvalidParameter {
                name: "cells_per_column",
                message: "Must be > 0".to_string(),
            });
        }
        if self.num_columns.saturating_mul(self.cells_per_column) > CellIdx::MAX as usize {
            return Err(DendriteError::InvalidParameter {
                name: "cells_per_column",
                message: "Too many cells for the cell index type".to_string(),
            });
        }
        if self.max_segments == 0 {
            return Err(DendriteError::InvalidParameter {
                name: "max_segments",
                message: "Must be > 0".to_string(),
            });
        }
        if self.max_segments_per_cell == 0 {
            return Err(DendriteError::InvalidParameter {
                name: "max_segments_per_cell",
                message: "Must be > 0".to_string(),
            });
        }
        if self.max_synapses_per_segment == 0 {
            return Err(DendriteError::InvalidParameter {
                name: "max_synapses_per_segment",
                message: "Must be > 0".to_string(),
            });
        }
        if self.synapse_min > self.synapse_max {
            return Err(DendriteError::InvalidParameter {
                name: "synapse_min",
                message: "Must not exceed synapse_max".to_string(),
            });
        }
        if self.synapse_threshold < self.synapse_min || self.synapse_threshold > self.synapse_max
        {
            return Err(DendriteError::InvalidParameter {
                name: "synapse_threshold",
                message: "Must be in range [synapse_min, synapse_max]".to_string(),
            });
        }
        if self.synapse_init < self.synapse_min || self.synapse_init > self.synapse_max {
            return Err(DendriteError::InvalidParameter {
                name: "synapse_init",
                message: "Must be in range [synapse_min, synapse_max]".to_string(),
            });
        }
        if self.synapse_inc < 0 || self.synapse_dec < 0 || self.predicted_segment_decrement < 0 {
            return Err(DendriteError::InvalidParameter {
                name: "synapse_inc",
                message: "Permanence deltas must be non-negative".to_string(),
            });
        }
        if self.segment_active_threshold == 0 {
            return Err(DendriteError::InvalidParameter {
                name: "segment_active_threshold",
                message: "Must be > 0".to_string(),
            });
        }
        if self.segment_match_threshold == 0 {
            return Err(DendriteError::InvalidParameter {
                name: "segment_match_threshold",
                message: "Must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// The Temporal Memory algorithm.
///
/// # Example
///
/// ```rust
/// use dendrite::algorithms::{TemporalMemory, TemporalMemoryParams};
/// use dendrite::types::Sdr;
///
/// let mut tm = TemporalMemory::new(TemporalMemoryParams {
///     num_columns: 100,
///     cells_per_column: 4,
///     ..Default::default()
/// }).unwrap();
///
/// let mut active_columns = Sdr::new(&[100]);
/// active_columns.set_sparse(&[1, 5, 10, 20]).unwrap();
///
/// let active_cells = tm.inference(&active_columns).unwrap();
///
/// // Nothing was predicted, so every column bursts
/// assert_eq!(active_cells.get_sum(), 16);
/// assert_eq!(tm.bursting_columns(), &[1, 5, 10, 20]);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TemporalMemory {
    // Configuration
    num_columns: usize,
    cells_per_column: usize,
    num_cells: usize,
    max_segments_per_cell: usize,
    max_synapses_per_segment: usize,
    max_new_synapse_count: usize,
    synapse_init: Permanence,
    synapse_inc: Permanence,
    synapse_dec: Permanence,
    predicted_segment_decrement: Permanence,
    segment_active_threshold: SynapseIdx,
    segment_match_threshold: SynapseIdx,

    // Connections
    connections: Connections,

    // State
    active_cells: Vec<CellIdx>,
    winner_cells: Vec<CellIdx>,
    predictive_cells: Vec<CellIdx>,
    bursting_columns: Vec<UInt>,
    predictive_columns: Vec<UInt>,
    active_segments: Vec<Segment>,
    matching_segments: Vec<Segment>,
    num_active_potential_synapses_for_segment: Vec<SynapseIdx>,

    anomaly: Real,

    rng: Random,

    iteration: u64,
}

impl TemporalMemory {
    /// Creates a new Temporal Memory with the given parameters.
    pub fn new(params: TemporalMemoryParams) -> Result<Self> {
        params.validate()?;

        let num_cells = params.num_columns * params.cells_per_column;

        debug!(
            "temporal memory: {} columns x {} cells, at most {} segments",
            params.num_columns, params.cells_per_column, params.max_segments
        );

        Ok(Self {
            num_columns: params.num_columns,
            cells_per_column: params.cells_per_column,
            num_cells,
            max_segments_per_cell: params.max_segments_per_cell,
            max_synapses_per_segment: params.max_synapses_per_segment,
            max_new_synapse_count: params.max_new_synapse_count,
            synapse_init: params.synapse_init,
            synapse_inc: params.synapse_inc,
            synapse_dec: params.synapse_dec,
            predicted_segment_decrement: params.predicted_segment_decrement,
            segment_active_threshold: params.segment_active_threshold,
            segment_match_threshold: params.segment_match_threshold,

            connections: Connections::new(ConnectionsParams {
                num_cells: num_cells as CellIdx,
                connected_threshold: params.synapse_threshold,
                min_permanence: params.synapse_min,
                max_permanence: params.synapse_max,
                max_segments: Some(params.max_segments),
            }),

            active_cells: Vec::new(),
            winner_cells: Vec::new(),
            predictive_cells: Vec::new(),
            bursting_columns: Vec::new(),
            predictive_columns: Vec::new(),
            active_segments: Vec::new(),
            matching_segments: Vec::new(),
            num_active_potential_synapses_for_segment: Vec::new(),

            anomaly: 0.0,
            rng: Random::new(params.seed),
            iteration: 0,
        })
    }

    /// Main compute method.
    ///
    /// Predictions are derived from the cells active on the previous call.
    /// Given the currently active columns, writes the active cells into
    /// `output` (size `num_columns * cells_per_column`). When `learn` is set,
    /// segments are reinforced, grown and created; winner cells are selected
    /// either way. Both SDR sizes are checked before any state is touched.
    pub fn compute(&mut self, active_columns: &Sdr, learn: bool, output: &mut Sdr) -> Result<()> {
        active_columns.ensure_size(self.num_columns)?;
        output.ensure_size(self.num_cells)?;

        self.iteration += 1;

        let prev_active_cells = std::mem::take(&mut self.active_cells);
        let prev_winner_cells = std::mem::take(&mut self.winner_cells);

        self.activate_dendrites(&prev_active_cells);

        self.bursting_columns.clear();
        self.predictive_columns.clear();

        for &column in active_columns.get_sparse() {
            let predicted_cells = self.predictive_cells_in_column(column);

            if predicted_cells.is_empty() {
                self.bursting_columns.push(column);
                self.burst_column(column, &prev_active_cells, &prev_winner_cells, learn);
            } else {
                self.predictive_columns.push(column);
                self.activate_predicted_column(
                    &predicted_cells,
                    &prev_active_cells,
                    &prev_winner_cells,
                    learn,
                );
            }
        }

        if learn && self.predicted_segment_decrement > 0 {
            self.punish_predicted_segments(active_columns, &prev_active_cells);
        }

        self.anomaly = if active_columns.get_sum() == 0 {
            0.0
        } else {
            self.bursting_columns.len() as Real / active_columns.get_sum() as Real
        };

        output.set_sparse_unchecked(self.active_cells.clone());

        trace!(
            "temporal memory step {}: {} active columns, {} bursting, {} active cells, {} segments",
            self.iteration,
            active_columns.get_sum(),
            self.bursting_columns.len(),
            self.active_cells.len(),
            self.connections.num_segments()
        );

        Ok(())
    }

    /// Runs one step without learning and returns the active cells.
    pub fn inference(&mut self, active_columns: &Sdr) -> Result<Sdr> {
        let mut output = Sdr::new(&[self.num_cells as UInt]);
        self.compute(active_columns, false, &mut output)?;
        Ok(output)
    }

    /// Computes active and matching segments and the predictive cells from
    /// the previous active cells.
    fn activate_dendrites(&mut self, prev_active_cells: &[CellIdx]) {
        let activity = self.connections.compute_activity(prev_active_cells);

        self.active_segments.clear();
        self.matching_segments.clear();
        for segment in 0..self.connections.num_segments() {
            if activity.connected[segment] >= self.segment_active_threshold {
                self.active_segments.push(segment as Segment);
            }
            if activity.potential[segment] >= self.segment_match_threshold {
                self.matching_segments.push(segment as Segment);
            }
        }
        self.num_active_potential_synapses_for_segment = activity.potential;

        self.predictive_cells = self
            .active_segments
            .iter()
            .map(|&segment| self.connections.cell_for_segment(segment))
            .collect();
        self.predictive_cells.sort_unstable();
        self.predictive_cells.dedup();
    }

    fn predictive_cells_in_column(&self, column: UInt) -> Vec<CellIdx> {
        let first = self.column_cell(column, 0);
        let last = first + self.cells_per_column as CellIdx;
        let start = self.predictive_cells.partition_point(|&c| c < first);
        let end = self.predictive_cells.partition_point(|&c| c < last);
        self.predictive_cells[start..end].to_vec()
    }

    /// Activates the predictive cells of a correctly predicted column.
    fn activate_predicted_column(
        &mut self,
        predicted_cells: &[CellIdx],
        prev_active_cells: &[CellIdx],
        prev_winner_cells: &[CellIdx],
        learn: bool,
    ) {
        for &cell in predicted_cells {
            self.active_cells.push(cell);
            self.winner_cells.push(cell);

            if learn {
                let segments: Vec<Segment> = self
                    .connections
                    .segments_for_cell(cell)
                    .iter()
                    .copied()
                    .filter(|s| self.active_segments.binary_search(s).is_ok())
                    .collect();

                for segment in segments {
                    self.learn_on_segment(segment, prev_active_cells, prev_winner_cells);
                }
            }
        }
    }

    /// Bursts a column: every cell becomes active and one winner is chosen.
    fn burst_column(
        &mut self,
        column: UInt,
        prev_active_cells: &[CellIdx],
        prev_winner_cells: &[CellIdx],
        learn: bool,
    ) {
        for offset in 0..self.cells_per_column {
            let cell = self.column_cell(column, offset);
            self.active_cells.push(cell);
        }

        let winner_cell = if let Some(segment) = self.best_matching_segment_in_column(column) {
            if learn {
                self.learn_on_segment(segment, prev_active_cells, prev_winner_cells);
            }
            self.connections.cell_for_segment(segment)
        } else {
            let cell = self.least_used_cell(column);
            if learn && !prev_winner_cells.is_empty() {
                self.grow_new_segment(cell, prev_winner_cells);
            }
            cell
        };

        self.winner_cells.push(winner_cell);
    }

    /// Reinforces a segment against the previous active cells and grows
    /// synapses towards the previous winner cells.
    fn learn_on_segment(
        &mut self,
        segment: Segment,
        prev_active_cells: &[CellIdx],
        prev_winner_cells: &[CellIdx],
    ) {
        self.connections.adapt_segment(
            segment,
            prev_active_cells,
            self.synapse_inc,
            self.synapse_dec,
        );

        let num_active_potential = self
            .num_active_potential_synapses_for_segment
            .get(segment as usize)
            .copied()
            .unwrap_or(0) as usize;
        let num_new = self.max_new_synapse_count.saturating_sub(num_active_potential);

        if num_new > 0 {
            self.connections.grow_synapses(
                segment,
                prev_winner_cells,
                self.synapse_init,
                &mut self.rng,
                num_new,
                self.max_synapses_per_segment,
            );
        }
    }

    fn grow_new_segment(&mut self, cell: CellIdx, prev_winner_cells: &[CellIdx]) {
        let Some(segment) = self
            .connections
            .create_segment(cell, Some(self.max_segments_per_cell))
        else {
            warn!(
                "temporal memory: segment capacity exhausted on cell {} ({} segments total)",
                cell,
                self.connections.num_segments()
            );
            return;
        };

        self.connections.grow_synapses(
            segment,
            prev_winner_cells,
            self.synapse_init,
            &mut self.rng,
            self.max_new_synapse_count,
            self.max_synapses_per_segment,
        );
    }

    /// Decrements matching segments whose column did not become active.
    fn punish_predicted_segments(&mut self, active_columns: &Sdr, prev_active_cells: &[CellIdx]) {
        let segments: Vec<Segment> = self
            .matching_segments
            .iter()
            .copied()
            .filter(|&segment| {
                let cell = self.connections.cell_for_segment(segment);
                !active_columns.contains(self.cell_column(cell))
            })
            .collect();

        for segment in segments {
            self.connections.adapt_segment(
                segment,
                prev_active_cells,
                -self.predicted_segment_decrement,
                0,
            );
        }
    }

    /// Finds the matching segment in a column with the most active potential
    /// synapses. Ties go to the lowest segment id.
    fn best_matching_segment_in_column(&self, column: UInt) -> Option<Segment> {
        let mut best: Option<(Segment, SynapseIdx)> = None;

        for &segment in &self.matching_segments {
            let cell = self.connections.cell_for_segment(segment);
            if self.cell_column(cell) != column {
                continue;
            }
            let score = self.num_active_potential_synapses_for_segment[segment as usize];
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((segment, score));
            }
        }

        best.map(|(segment, _)| segment)
    }

    /// Returns a cell with the fewest segments in a column, ties broken at random.
    fn least_used_cell(&mut self, column: UInt) -> CellIdx {
        let mut min_segments = usize::MAX;
        let mut candidates = Vec::new();

        for offset in 0..self.cells_per_column {
            let cell = self.column_cell(column, offset);
            let num_segments = self.connections.num_segments_on_cell(cell);

            if num_segments < min_segments {
                min_segments = num_segments;
                candidates.clear();
            }
            if num_segments == min_segments {
                candidates.push(cell);
            }
        }

        candidates[self.rng.get_usize(candidates.len())]
    }

    // ========================================================================
    // Cell/Column utilities
    // ========================================================================

    /// Returns the cell index for a column and cell offset.
    #[inline]
    fn column_cell(&self, column: UInt, cell_offset: usize) -> CellIdx {
        (column as usize * self.cells_per_column + cell_offset) as CellIdx
    }

    /// Returns the column for a cell index.
    #[inline]
    fn cell_column(&self, cell: CellIdx) -> UInt {
        (cell as usize / self.cells_per_column) as UInt
    }

    /// Returns the column for a cell index.
    pub fn column_for_cell(&self, cell: CellIdx) -> UInt {
        self.cell_column(cell)
    }

    /// Clears the carried cell state at a sequence boundary.
    ///
    /// Learned segments and synapses are kept.
    pub fn reset(&mut self) {
        self.active_cells.clear();
        self.winner_cells.clear();
        self.predictive_cells.clear();
        self.bursting_columns.clear();
        self.predictive_columns.clear();
        self.active_segments.clear();
        self.matching_segments.clear();
        self.num_active_potential_synapses_for_segment.clear();
        self.anomaly = 0.0;
    }

    /// Cells that will be predictive on the next call, given the current
    /// active cells. Does not change any state.
    pub fn next_predictive_cells(&self) -> Vec<CellIdx> {
        let activity = self.connections.compute_activity(&self.active_cells);
        let mut cells: Vec<CellIdx> = activity
            .connected
            .iter()
            .enumerate()
            .filter(|(_, count)| **count >= self.segment_active_threshold)
            .map(|(segment, _)| self.connections.cell_for_segment(segment as Segment))
            .collect();
        cells.sort_unstable();
        cells.dedup();
        cells
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Returns the number of columns.
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Returns the number of cells per column.
    pub fn cells_per_column(&self) -> usize {
        self.cells_per_column
    }

    /// Returns the total number of cells.
    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    /// Returns the active cells, ascending.
    pub fn active_cells(&self) -> &[CellIdx] {
        &self.active_cells
    }

    /// Returns the winner cells, ascending.
    pub fn winner_cells(&self) -> &[CellIdx] {
        &self.winner_cells
    }

    /// Returns the cells predicted for the last call, ascending.
    pub fn predictive_cells(&self) -> &[CellIdx] {
        &self.predictive_cells
    }

    /// Returns the active columns that had no predictive cell on the last call.
    pub fn bursting_columns(&self) -> &[UInt] {
        &self.bursting_columns
    }

    /// Returns the active columns that were correctly predicted on the last call.
    pub fn predictive_columns(&self) -> &[UInt] {
        &self.predictive_columns
    }

    /// Returns the active segments of the last call, ascending.
    pub fn active_segments(&self) -> &[Segment] {
        &self.active_segments
    }

    /// Returns the matching segments of the last call, ascending.
    pub fn matching_segments(&self) -> &[Segment] {
        &self.matching_segments
    }

    /// Returns the active cells as an SDR.
    pub fn active_cells_sdr(&self) -> Sdr {
        let mut sdr = Sdr::new(&[self.num_cells as UInt]);
        sdr.set_sparse_unchecked(self.active_cells.clone());
        sdr
    }

    /// Returns the raw anomaly of the last call: bursting / active columns.
    pub fn anomaly(&self) -> Real {
        self.anomaly
    }

    /// Returns a reference to the connections.
    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    /// Returns the segment activation threshold.
    pub fn segment_active_threshold(&self) -> SynapseIdx {
        self.segment_active_threshold
    }

    /// Returns the segment matching threshold.
    pub fn segment_match_threshold(&self) -> SynapseIdx {
        self.segment_match_threshold
    }

    /// Returns the initial permanence of new synapses.
    pub fn synapse_init(&self) -> Permanence {
        self.synapse_init
    }

    /// Returns the number of compute calls.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tm() -> TemporalMemory {
        TemporalMemory::new(TemporalMemoryParams {
            num_columns: 100,
            cells_per_column: 4,
            segment_active_threshold: 8,
            segment_match_threshold: 5,
            ..Default::default()
        })
        .unwrap()
    }

    fn columns(indices: &[u32]) -> Sdr {
        let mut sdr = Sdr::new(&[100]);
        sdr.set_sparse(indices).unwrap();
        sdr
    }

    fn pattern(start: u32) -> Sdr {
        columns(&(start..start + 10).collect::<Vec<_>>())
    }

    #[test]
    fn test_create_temporal_memory() {
        let tm = small_tm();

        assert_eq!(tm.num_columns(), 100);
        assert_eq!(tm.cells_per_column(), 4);
        assert_eq!(tm.num_cells(), 400);
        assert_eq!(tm.connections().num_segments(), 0);
    }

    #[test]
    fn test_invalid_params() {
        assert!(TemporalMemory::new(TemporalMemoryParams {
            cells_per_column: 0,
            ..Default::default()
        })
        .is_err());
        assert!(TemporalMemory::new(TemporalMemoryParams {
            max_segments: 0,
            ..Default::default()
        })
        .is_err());
        assert!(TemporalMemory::new(TemporalMemoryParams {
            synapse_init: 101,
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_burst_without_segments() {
        let mut tm = small_tm();
        let input = columns(&[1, 5, 10, 20]);

        for _ in 0..2 {
            let active = tm.inference(&input).unwrap();
            assert_eq!(active.get_sum(), 16);
            assert_eq!(tm.bursting_columns(), &[1, 5, 10, 20]);
            assert!(tm.predictive_columns().is_empty());
            assert_eq!(tm.anomaly(), 1.0);
        }
        assert_eq!(tm.connections().num_segments(), 0);
    }

    #[test]
    fn test_winner_cells_selected_without_learning() {
        let mut tm = small_tm();
        tm.inference(&columns(&[3, 7])).unwrap();

        let winners = tm.winner_cells();
        assert_eq!(winners.len(), 2);
        assert_eq!(tm.column_for_cell(winners[0]), 3);
        assert_eq!(tm.column_for_cell(winners[1]), 7);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut tm = small_tm();
        let wrong = Sdr::new(&[99]);
        assert!(tm.inference(&wrong).is_err());

        let mut output = Sdr::new(&[100]);
        assert!(matches!(
            tm.compute(&pattern(0), true, &mut output),
            Err(DendriteError::DimensionMismatch { .. })
        ));
        assert_eq!(tm.iteration(), 0);
    }

    #[test]
    fn test_learns_new_segments_on_burst() {
        let mut tm = small_tm();
        let mut output = Sdr::new(&[400]);

        tm.compute(&pattern(0), true, &mut output).unwrap();
        assert_eq!(tm.connections().num_segments(), 0);

        tm.compute(&pattern(50), true, &mut output).unwrap();
        assert_eq!(tm.connections().num_segments(), 10);

        for segment in 0..10 {
            assert_eq!(tm.connections().num_synapses_on_segment(segment), 10);
        }
    }

    #[test]
    fn test_burst_adapts_matching_segment() {
        // Synapses start below the connected threshold, so the first learned
        // segments match but cannot predict until reinforced.
        let mut tm = TemporalMemory::new(TemporalMemoryParams {
            num_columns: 100,
            cells_per_column: 4,
            segment_active_threshold: 8,
            segment_match_threshold: 5,
            synapse_init: 40,
            ..Default::default()
        })
        .unwrap();
        let mut output = Sdr::new(&[400]);
        let a = pattern(0);
        let b = pattern(50);

        tm.compute(&a, true, &mut output).unwrap();
        tm.compute(&b, true, &mut output).unwrap();
        assert_eq!(tm.connections().num_segments(), 10);
        let learning_cells = tm.winner_cells().to_vec();
        tm.reset();

        tm.compute(&a, true, &mut output).unwrap();
        tm.compute(&b, true, &mut output).unwrap();
        assert_eq!(tm.bursting_columns(), b.get_sparse());
        assert_eq!(tm.matching_segments().len(), 10);
        assert!(tm.active_segments().is_empty());
        // The owners of the matching segments win again; nothing new is created
        assert_eq!(tm.winner_cells(), learning_cells.as_slice());
        assert_eq!(tm.connections().num_segments(), 10);
        tm.reset();

        let mut predicted = false;
        for _ in 0..10 {
            tm.compute(&a, true, &mut output).unwrap();
            tm.compute(&b, true, &mut output).unwrap();
            assert_eq!(tm.connections().num_segments(), 10);
            predicted |= tm.bursting_columns().is_empty();
            tm.reset();
        }
        assert!(predicted);
    }

    #[test]
    fn test_new_segment_goes_to_least_used_cell() {
        let mut tm = small_tm();
        let mut output = Sdr::new(&[400]);
        let target = columns(&[0]);

        // Each context is disjoint from the others, so no earlier segment on
        // column 0 matches and a fresh cell must be picked every time.
        for context in 0..4 {
            tm.compute(&pattern(10 + context * 10), true, &mut output).unwrap();
            tm.compute(&target, true, &mut output).unwrap();

            let winner = tm.winner_cells()[0];
            assert_eq!(tm.connections().num_segments_on_cell(winner), 1);
            tm.reset();
        }

        for cell in 0..4 {
            assert_eq!(tm.connections().num_segments_on_cell(cell), 1);
        }

        tm.compute(&pattern(50), true, &mut output).unwrap();
        tm.compute(&target, true, &mut output).unwrap();
        let counts: Vec<usize> = (0..4)
            .map(|cell| tm.connections().num_segments_on_cell(cell))
            .collect();
        assert_eq!(counts.iter().sum::<usize>(), 5);
        assert_eq!(counts.iter().max(), Some(&2));
    }

    #[test]
    fn test_prediction() {
        let mut tm = small_tm();
        let mut output = Sdr::new(&[400]);
        let a = pattern(0);
        let b = pattern(50);

        tm.compute(&a, true, &mut output).unwrap();
        tm.compute(&b, true, &mut output).unwrap();
        tm.reset();

        tm.compute(&a, false, &mut output).unwrap();
        let next = tm.next_predictive_cells();
        assert_eq!(next.len(), 10);
        assert!(next.iter().all(|&c| b.contains(tm.column_for_cell(c))));

        tm.compute(&b, false, &mut output).unwrap();
        assert_eq!(output.get_sum(), 10);
        assert!(tm.bursting_columns().is_empty());
        assert_eq!(tm.predictive_columns(), b.get_sparse());
        assert_eq!(tm.anomaly(), 0.0);
    }

    #[test]
    fn test_partition_of_active_columns() {
        let mut tm = small_tm();
        let mut output = Sdr::new(&[400]);

        tm.compute(&pattern(0), true, &mut output).unwrap();
        tm.compute(&pattern(50), true, &mut output).unwrap();
        tm.reset();
        tm.compute(&pattern(0), false, &mut output).unwrap();

        // Half predicted, half new
        let mixed = columns(&(55..65).collect::<Vec<_>>());
        tm.compute(&mixed, false, &mut output).unwrap();

        assert_eq!(tm.predictive_columns(), &[55, 56, 57, 58, 59]);
        assert_eq!(tm.bursting_columns(), &[60, 61, 62, 63, 64]);
        assert_eq!(output.get_sum(), 5 + 5 * 4);
        assert!((tm.anomaly() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_reinforcement_of_active_segments() {
        let mut tm = small_tm();
        let mut output = Sdr::new(&[400]);
        let a = pattern(0);
        let b = pattern(50);

        tm.compute(&a, true, &mut output).unwrap();
        tm.compute(&b, true, &mut output).unwrap();
        tm.reset();
        tm.compute(&a, true, &mut output).unwrap();
        tm.compute(&b, true, &mut output).unwrap();

        // No new segments: B was predicted
        assert_eq!(tm.connections().num_segments(), 10);
        let conn = tm.connections();
        for segment in 0..10 {
            for &synapse in conn.synapses_for_segment(segment) {
                let perm = conn.data_for_synapse(synapse).permanence;
                assert!(perm == 62 || perm == 60);
            }
        }
    }

    #[test]
    fn test_predicted_segment_decrement() {
        let mut tm = TemporalMemory::new(TemporalMemoryParams {
            num_columns: 100,
            cells_per_column: 4,
            segment_active_threshold: 8,
            segment_match_threshold: 5,
            predicted_segment_decrement: 3,
            ..Default::default()
        })
        .unwrap();
        let mut output = Sdr::new(&[400]);

        tm.compute(&pattern(0), true, &mut output).unwrap();
        tm.compute(&pattern(50), true, &mut output).unwrap();
        tm.reset();

        tm.compute(&pattern(0), true, &mut output).unwrap();
        tm.compute(&pattern(80), true, &mut output).unwrap();

        let conn = tm.connections();
        for segment in 0..10 {
            for &synapse in conn.synapses_for_segment(segment) {
                assert_eq!(conn.data_for_synapse(synapse).permanence, 57);
            }
        }
    }

    #[test]
    fn test_segment_capacity() {
        let mut tm = TemporalMemory::new(TemporalMemoryParams {
            num_columns: 100,
            cells_per_column: 4,
            max_segments: 3,
            segment_active_threshold: 8,
            segment_match_threshold: 5,
            ..Default::default()
        })
        .unwrap();
        let mut output = Sdr::new(&[400]);

        tm.compute(&pattern(0), true, &mut output).unwrap();
        tm.compute(&pattern(50), true, &mut output).unwrap();

        assert_eq!(tm.connections().num_segments(), 3);
        // Activity is unaffected by exhausted capacity
        assert_eq!(output.get_sum(), 40);
    }

    #[test]
    fn test_max_segments_per_cell() {
        let mut tm = TemporalMemory::new(TemporalMemoryParams {
            num_columns: 100,
            cells_per_column: 1,
            max_segments_per_cell: 1,
            segment_active_threshold: 8,
            segment_match_threshold: 5,
            ..Default::default()
        })
        .unwrap();
        let mut output = Sdr::new(&[100]);

        tm.compute(&pattern(0), true, &mut output).unwrap();
        tm.compute(&pattern(50), true, &mut output).unwrap();
        tm.compute(&pattern(20), true, &mut output).unwrap();
        tm.compute(&pattern(50), true, &mut output).unwrap();

        for cell in 0..100 {
            assert!(tm.connections().num_segments_on_cell(cell) <= 1);
        }
    }

    #[test]
    fn test_reset() {
        let mut tm = small_tm();
        tm.inference(&pattern(0)).unwrap();
        assert!(!tm.active_cells().is_empty());

        tm.reset();
        assert!(tm.active_cells().is_empty());
        assert!(tm.winner_cells().is_empty());
        assert!(tm.predictive_cells().is_empty());
        assert_eq!(tm.anomaly(), 0.0);
    }

    #[test]
    fn test_empty_active_columns() {
        let mut tm = small_tm();
        let active = tm.inference(&Sdr::new(&[100])).unwrap();
        assert_eq!(active.get_sum(), 0);
        assert_eq!(tm.anomaly(), 0.0);
    }

    #[test]
    fn test_cell_column_mapping() {
        let tm = small_tm();
        assert_eq!(tm.column_for_cell(0), 0);
        assert_eq!(tm.column_for_cell(3), 0);
        assert_eq!(tm.column_for_cell(4), 1);
        assert_eq!(tm.column_for_cell(399), 99);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_round_trip() {
        let mut tm = small_tm();
        let a = Sdr::from_sparse(100, &(0..10).collect::<Vec<_>>()).unwrap();
        let b = Sdr::from_sparse(100, &(50..60).collect::<Vec<_>>()).unwrap();
        let mut output = Sdr::new(&[400]);
        tm.compute(&a, true, &mut output).unwrap();
        tm.compute(&b, true, &mut output).unwrap();

        let json = serde_json::to_string(&tm).unwrap();
        let mut restored: TemporalMemory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.connections(), tm.connections());

        let expected = tm.inference(&a).unwrap();
        let actual = restored.inference(&a).unwrap();
        assert_eq!(expected, actual);
        assert_eq!(restored.winner_cells(), tm.winner_cells());
    }
}
