//! Connections - the synaptic connectivity graph.
//!
//! Cells own segments, segments own synapses, and every synapse carries an
//! integer permanence towards one presynaptic cell. The Spatial Pooler stores
//! one segment per column (presynaptic cells are input bits); the Temporal
//! Memory stores segments per cell (presynaptic cells are the previous step's
//! cells).
//!
//! Nothing is ever removed: segments and synapses live until the owning
//! component is dropped. A synapse is connected iff its permanence is at least
//! the connected threshold; this is evaluated from the current permanence on
//! every query rather than cached separately.

use crate::types::{CellIdx, Permanence, Segment, Synapse, SynapseIdx};
use crate::utils::Random;

use ahash::AHashMap;
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Data associated with a synapse.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SynapseData {
    /// The presynaptic cell this synapse listens to.
    pub presynaptic_cell: CellIdx,

    /// The permanence strength of this synapse.
    pub permanence: Permanence,

    /// The segment this synapse belongs to.
    pub segment: Segment,
}

/// Data associated with a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentData {
    /// The synapses on this segment.
    pub synapses: SmallVec<[Synapse; 32]>,

    /// The cell this segment belongs to.
    pub cell: CellIdx,

    /// Number of connected synapses (permanence >= threshold).
    pub num_connected: SynapseIdx,
}

impl SegmentData {
    fn new(cell: CellIdx) -> Self {
        Self {
            synapses: SmallVec::new(),
            cell,
            num_connected: 0,
        }
    }
}

/// Data associated with a cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellData {
    /// The segments on this cell.
    pub segments: SmallVec<[Segment; 8]>,
}

/// Parameters for creating a Connections instance.
#[derive(Debug, Clone)]
pub struct ConnectionsParams {
    /// Number of cells that can own segments.
    pub num_cells: CellIdx,

    /// Permanence threshold for a synapse to be considered connected.
    pub connected_threshold: Permanence,

    /// Lower permanence bound.
    pub min_permanence: Permanence,

    /// Upper permanence bound.
    pub max_permanence: Permanence,

    /// Total number of segments the graph may hold, `None` for unbounded.
    pub max_segments: Option<usize>,
}

impl Default for ConnectionsParams {
    fn default() -> Self {
        Self {
            num_cells: 0,
            connected_threshold: 50,
            min_permanence: 0,
            max_permanence: 100,
            max_segments: None,
        }
    }
}

/// Segment activity computed from a set of active presynaptic cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentActivity {
    /// Per segment: active presynaptic cells reached through connected synapses.
    pub connected: Vec<SynapseIdx>,

    /// Per segment: active presynaptic cells reached through any synapse.
    pub potential: Vec<SynapseIdx>,
}

/// The synaptic connectivity graph.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Connections {
    cells: Vec<CellData>,
    segments: Vec<SegmentData>,
    synapses: Vec<SynapseData>,

    connected_threshold: Permanence,
    min_permanence: Permanence,
    max_permanence: Permanence,
    max_segments: Option<usize>,

    /// Maps presynaptic cell -> every synapse listening to it.
    synapses_for_presynaptic_cell: AHashMap<CellIdx, Vec<Synapse>>,
}

impl Connections {
    /// Creates a new, empty Connections instance.
    pub fn new(params: ConnectionsParams) -> Self {
        Self {
            cells: vec![CellData::default(); params.num_cells as usize],
            segments: Vec::new(),
            synapses: Vec::new(),
            connected_threshold: params.connected_threshold,
            min_permanence: params.min_permanence,
            max_permanence: params.max_permanence,
            max_segments: params.max_segments,
            synapses_for_presynaptic_cell: AHashMap::new(),
        }
    }

    /// Returns the number of cells.
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Returns the connected threshold.
    #[inline]
    pub fn connected_threshold(&self) -> Permanence {
        self.connected_threshold
    }

    /// Returns the permanence bounds as `(min, max)`.
    #[inline]
    pub fn permanence_bounds(&self) -> (Permanence, Permanence) {
        (self.min_permanence, self.max_permanence)
    }

    /// Returns the segment capacity, if bounded.
    #[inline]
    pub fn max_segments(&self) -> Option<usize> {
        self.max_segments
    }

    /// Returns the number of segments.
    #[inline]
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Returns true when no further segment can be created.
    pub fn is_full(&self) -> bool {
        self.max_segments
            .map_or(false, |max| self.segments.len() >= max)
    }

    /// Returns the number of segments on a specific cell.
    pub fn num_segments_on_cell(&self, cell: CellIdx) -> usize {
        self.cells[cell as usize].segments.len()
    }

    /// Returns the number of synapses.
    #[inline]
    pub fn num_synapses(&self) -> usize {
        self.synapses.len()
    }

    /// Returns the number of synapses on a specific segment.
    pub fn num_synapses_on_segment(&self, segment: Segment) -> usize {
        self.segments[segment as usize].synapses.len()
    }

    // ========================================================================
    // Segment operations
    // ========================================================================

    /// Creates a new segment on `cell`.
    ///
    /// Returns `None` when the global capacity or the per-cell limit
    /// `max_segments_per_cell` is already reached.
    pub fn create_segment(
        &mut self,
        cell: CellIdx,
        max_segments_per_cell: Option<usize>,
    ) -> Option<Segment> {
        if self.is_full() {
            return None;
        }
        if let Some(max) = max_segments_per_cell {
            if self.cells[cell as usize].segments.len() >= max {
                return None;
            }
        }

        let segment = self.segments.len() as Segment;
        self.segments.push(SegmentData::new(cell));
        self.cells[cell as usize].segments.push(segment);
        Some(segment)
    }

    /// Gets the segments for a cell.
    #[inline]
    pub fn segments_for_cell(&self, cell: CellIdx) -> &[Segment] {
        &self.cells[cell as usize].segments
    }

    /// Gets the cell that owns a segment.
    #[inline]
    pub fn cell_for_segment(&self, segment: Segment) -> CellIdx {
        self.segments[segment as usize].cell
    }

    /// Gets the segment data.
    #[inline]
    pub fn data_for_segment(&self, segment: Segment) -> &SegmentData {
        &self.segments[segment as usize]
    }

    // ========================================================================
    // Synapse operations
    // ========================================================================

    /// Creates a synapse from `presynaptic_cell` on `segment`.
    ///
    /// If the segment already listens to that cell, the existing synapse is
    /// returned and its permanence raised to `permanence` if that is higher.
    pub fn create_synapse(
        &mut self,
        segment: Segment,
        presynaptic_cell: CellIdx,
        permanence: Permanence,
    ) -> Synapse {
        let existing = self.segments[segment as usize]
            .synapses
            .iter()
            .find(|&&s| self.synapses[s as usize].presynaptic_cell == presynaptic_cell)
            .copied();

        if let Some(existing_synapse) = existing {
            if permanence > self.synapses[existing_synapse as usize].permanence {
                self.update_synapse_permanence(existing_synapse, permanence);
            }
            return existing_synapse;
        }

        let permanence = self.clamp(permanence);
        let synapse = self.synapses.len() as Synapse;
        self.synapses.push(SynapseData {
            presynaptic_cell,
            permanence,
            segment,
        });

        let segment_data = &mut self.segments[segment as usize];
        segment_data.synapses.push(synapse);
        if permanence >= self.connected_threshold {
            segment_data.num_connected += 1;
        }

        self.synapses_for_presynaptic_cell
            .entry(presynaptic_cell)
            .or_default()
            .push(synapse);

        synapse
    }

    /// Sets a synapse's permanence, clamped to the permanence bounds.
    pub fn update_synapse_permanence(&mut self, synapse: Synapse, permanence: Permanence) {
        let permanence = self.clamp(permanence);
        let threshold = self.connected_threshold;
        let synapse_data = &mut self.synapses[synapse as usize];
        let was_connected = synapse_data.permanence >= threshold;
        let is_connected = permanence >= threshold;
        synapse_data.permanence = permanence;

        if was_connected != is_connected {
            let segment_data = &mut self.segments[synapse_data.segment as usize];
            if is_connected {
                segment_data.num_connected += 1;
            } else {
                segment_data.num_connected = segment_data.num_connected.saturating_sub(1);
            }
        }
    }

    /// Gets the synapses on a segment.
    #[inline]
    pub fn synapses_for_segment(&self, segment: Segment) -> &[Synapse] {
        &self.segments[segment as usize].synapses
    }

    /// Gets the synapse data.
    #[inline]
    pub fn data_for_synapse(&self, synapse: Synapse) -> &SynapseData {
        &self.synapses[synapse as usize]
    }

    /// Gets the presynaptic cells for a segment, in synapse creation order.
    pub fn presynaptic_cells_for_segment(&self, segment: Segment) -> Vec<CellIdx> {
        self.segments[segment as usize]
            .synapses
            .iter()
            .map(|&s| self.synapses[s as usize].presynaptic_cell)
            .collect()
    }

    /// Returns true if `synapse` is connected under the current permanences.
    #[inline]
    pub fn is_connected(&self, synapse: Synapse) -> bool {
        self.synapses[synapse as usize].permanence >= self.connected_threshold
    }

    #[inline]
    fn clamp(&self, permanence: Permanence) -> Permanence {
        permanence.clamp(self.min_permanence, self.max_permanence)
    }

    // ========================================================================
    // Activity computation
    // ========================================================================

    /// Computes connected and potential activity of every segment.
    ///
    /// Only the synapses of active presynaptic cells are visited.
    pub fn compute_activity(&self, active_presynaptic_cells: &[CellIdx]) -> SegmentActivity {
        let mut activity = SegmentActivity {
            connected: vec![0; self.segments.len()],
            potential: vec![0; self.segments.len()],
        };

        for cell in active_presynaptic_cells {
            let Some(synapses) = self.synapses_for_presynaptic_cell.get(cell) else {
                continue;
            };
            for &synapse in synapses {
                let data = &self.synapses[synapse as usize];
                let segment = data.segment as usize;
                activity.potential[segment] += 1;
                if data.permanence >= self.connected_threshold {
                    activity.connected[segment] += 1;
                }
            }
        }

        activity
    }

    // ========================================================================
    // Learning operations
    // ========================================================================

    /// Hebbian update of one segment.
    ///
    /// Synapses whose presynaptic cell is in `active_presynaptic_cells`
    /// (sorted ascending) gain `increment`, all others lose `decrement`.
    /// Results are clamped to the permanence bounds.
    pub fn adapt_segment(
        &mut self,
        segment: Segment,
        active_presynaptic_cells: &[CellIdx],
        increment: Permanence,
        decrement: Permanence,
    ) {
        let synapses = self.segments[segment as usize].synapses.clone();
        for synapse in synapses {
            let data = &self.synapses[synapse as usize];
            let new_perm = if active_presynaptic_cells
                .binary_search(&data.presynaptic_cell)
                .is_ok()
            {
                data.permanence + increment
            } else {
                data.permanence - decrement
            };
            self.update_synapse_permanence(synapse, new_perm);
        }
    }

    /// Adds `delta` to every synapse permanence on `segment` (clamped).
    pub fn bump_segment(&mut self, segment: Segment, delta: Permanence) {
        let synapses = self.segments[segment as usize].synapses.clone();
        for synapse in synapses {
            let perm = self.synapses[synapse as usize].permanence;
            self.update_synapse_permanence(synapse, perm + delta);
        }
    }

    /// Grows synapses on `segment` towards cells from `growth_candidates`.
    ///
    /// Candidates the segment already listens to are skipped. At most
    /// `max_new` synapses are added and the segment never exceeds
    /// `max_synapses_per_segment`; when more candidates remain than room,
    /// a random subset is chosen. Returns the number of synapses created.
    pub fn grow_synapses(
        &mut self,
        segment: Segment,
        growth_candidates: &[CellIdx],
        initial_permanence: Permanence,
        rng: &mut Random,
        max_new: usize,
        max_synapses_per_segment: usize,
    ) -> usize {
        let existing = self.presynaptic_cells_for_segment(segment);
        let candidates: Vec<CellIdx> = growth_candidates
            .iter()
            .copied()
            .filter(|c| !existing.contains(c))
            .collect();

        let room = max_synapses_per_segment.saturating_sub(existing.len());
        let num_new = max_new.min(room).min(candidates.len());
        if num_new == 0 {
            return 0;
        }

        let mut chosen = rng.sample(candidates, num_new);
        chosen.sort_unstable();
        for candidate in &chosen {
            self.create_synapse(segment, *candidate, initial_permanence);
        }
        chosen.len()
    }
}
