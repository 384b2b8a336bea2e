//! Spatial Pooler implementation.
//!
//! The Spatial Pooler maps an input SDR onto a sparse code over a fixed set of
//! columns. Every call selects exactly `num_active_columns` winners by
//! (optionally boosted) overlap, adapts the winners' permanences when learning
//! and updates the per-column activity average used for boosting.

use crate::algorithms::{Connections, ConnectionsParams};
use crate::error::{DendriteError, Result};
use crate::types::{CellIdx, Permanence, Real, Sdr, Segment, SynapseIdx, UInt};
use crate::utils::Random;

use log::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for creating a Spatial Pooler.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpatialPoolerParams {
    /// Number of input bits.
    pub input_size: usize,

    /// Number of columns (output bits).
    pub num_columns: usize,

    /// Fraction of the input each column can potentially connect to (0.0-1.0].
    pub potential_synapse_ratio: Real,

    /// Fraction of columns active after every compute (0.0-1.0].
    pub active_column_ratio: Real,

    /// Lower permanence bound.
    pub synapse_min: Permanence,

    /// Permanence at or above which a synapse is connected.
    pub synapse_threshold: Permanence,

    /// Initial permanence of every potential synapse.
    pub synapse_init: Permanence,

    /// Upper permanence bound.
    pub synapse_max: Permanence,

    /// Amount to increase permanence of synapses from active inputs.
    pub synapse_inc: Permanence,

    /// Amount to decrease permanence of synapses from inactive inputs.
    pub synapse_dec: Permanence,

    /// Decay of the per-column activity moving average, in [0, 1).
    pub activity_decay: Real,

    /// Smallest accepted column count.
    pub min_columns: usize,

    /// Random seed (negative for a seed from system entropy).
    pub seed: i64,
}

impl Default for SpatialPoolerParams {
    fn default() -> Self {
        Self {
            input_size: 100,
            num_columns: 2048,
            potential_synapse_ratio: 0.5,
            active_column_ratio: 0.02,
            synapse_min: 0,
            synapse_threshold: 50,
            synapse_init: 60,
            synapse_max: 100,
            synapse_inc: 2,
            synapse_dec: 1,
            activity_decay: 0.999,
            min_columns: 100,
            seed: 1,
        }
    }
}

impl SpatialPoolerParams {
    fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(DendriteError::InvalidParameter {
                name: "input_size",
                message: "Must be greater than 0".to_string(),
            });
        }
        if self.num_columns < self.min_columns {
            return Err(DendriteError::InvalidParameter {
                name: "num_columns",
                message: format!("Must be at least {}", self.min_columns),
            });
        }
        if !(self.potential_synapse_ratio > 0.0 && self.potential_synapse_ratio <= 1.0) {
            return Err(DendriteError::InvalidParameter {
                name: "potential_synapse_ratio",
                message: "Must be in range (0, 1]".to_string(),
            });
        }
        if !(self.active_column_ratio > 0.0 && self.active_column_ratio <= 1.0) {
            return Err(DendriteError::InvalidParameter {
                name: "active_column_ratio",
                message: "Must be in range (0, 1]".to_string(),
            });
        }
        if self.num_potential_synapses() == 0 {
            return Err(DendriteError::InvalidParameter {
                name: "potential_synapse_ratio",
                message: "Must select at least one input per column".to_string(),
            });
        }
        if self.num_active_columns() == 0 {
            return Err(DendriteError::InvalidParameter {
                name: "active_column_ratio",
                message: "Must select at least one column".to_string(),
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
        if !(0.0..1.0).contains(&self.activity_decay) {
            return Err(DendriteError::InvalidParameter {
                name: "activity_decay",
                message: "Must be in range [0, 1)".to_string(),
            });
        }
        Ok(())
    }

    fn num_active_columns(&self) -> usize {
        ((self.num_columns as Real) * self.active_column_ratio).round() as usize
    }

    fn num_potential_synapses(&self) -> usize {
        ((self.input_size as Real) * self.potential_synapse_ratio).round() as usize
    }
}

/// The Spatial Pooler algorithm.
///
/// Each column owns a fixed, randomly chosen potential pool of input bits,
/// stored as a single segment in a [`Connections`] graph. The pool never
/// changes after construction; only permanences evolve.
///
/// # Example
///
/// ```rust
/// use dendrite::algorithms::{SpatialPooler, SpatialPoolerParams};
/// use dendrite::types::Sdr;
///
/// let mut sp = SpatialPooler::new(SpatialPoolerParams {
///     input_size: 100,
///     num_columns: 200,
///     ..Default::default()
/// }).unwrap();
///
/// let mut input = Sdr::new(&[100]);
/// let mut output = Sdr::new(&[200]);
///
/// input.set_sparse(&[1, 5, 10, 20, 30]).unwrap();
/// sp.compute(&input, true, true, &mut output).unwrap();
/// assert_eq!(output.get_sum(), 4);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpatialPooler {
    // Configuration
    num_inputs: usize,
    num_columns: usize,
    num_active_columns: usize,
    potential_synapse_ratio: Real,
    active_column_ratio: Real,
    activity_decay: Real,

    // Permanence parameters
    synapse_min: Permanence,
    synapse_threshold: Permanence,
    synapse_init: Permanence,
    synapse_max: Permanence,
    synapse_inc: Permanence,
    synapse_dec: Permanence,

    // State
    activity: Vec<Real>,
    overlaps: Vec<SynapseIdx>,
    boosted_overlaps: Vec<Real>,

    // Synaptic connections (one segment per column)
    connections: Connections,

    // Iteration counters
    iteration_num: UInt,
    iteration_learn_num: UInt,

    rng: Random,
}

impl SpatialPooler {
    /// Creates a new Spatial Pooler with the given parameters.
    pub fn new(params: SpatialPoolerParams) -> Result<Self> {
        params.validate()?;

        let num_columns = params.num_columns;
        let mut sp = Self {
            num_inputs: params.input_size,
            num_columns,
            num_active_columns: params.num_active_columns(),
            potential_synapse_ratio: params.potential_synapse_ratio,
            active_column_ratio: params.active_column_ratio,
            activity_decay: params.activity_decay,

            synapse_min: params.synapse_min,
            synapse_threshold: params.synapse_threshold,
            synapse_init: params.synapse_init,
            synapse_max: params.synapse_max,
            synapse_inc: params.synapse_inc,
            synapse_dec: params.synapse_dec,

            activity: vec![0.0; num_columns],
            overlaps: vec![0; num_columns],
            boosted_overlaps: vec![0.0; num_columns],

            connections: Connections::new(ConnectionsParams {
                num_cells: num_columns as CellIdx,
                connected_threshold: params.synapse_threshold,
                min_permanence: params.synapse_min,
                max_permanence: params.synapse_max,
                max_segments: None,
            }),

            iteration_num: 0,
            iteration_learn_num: 0,

            rng: Random::new(params.seed),
        };

        sp.initialize_columns(params.num_potential_synapses())?;

        debug!(
            "spatial pooler: {} inputs, {} columns, {} active, {} potential synapses per column",
            sp.num_inputs,
            sp.num_columns,
            sp.num_active_columns,
            params.num_potential_synapses()
        );

        Ok(sp)
    }

    /// Draws every column's potential pool and creates its synapses at `synapse_init`.
    fn initialize_columns(&mut self, num_potential: usize) -> Result<()> {
        for column in 0..self.num_columns {
            let mut potential = self.rng.sample_indices(self.num_inputs, num_potential);
            potential.sort_unstable();

            let segment = self
                .connections
                .create_segment(column as CellIdx, None)
                .ok_or_else(|| DendriteError::InvalidParameter {
                    name: "num_columns",
                    message: "Segment capacity exhausted".to_string(),
                })?;

            for input in potential {
                self.connections
                    .create_synapse(segment, input as CellIdx, self.synapse_init);
            }
        }

        Ok(())
    }

    /// The main compute method.
    ///
    /// Writes exactly `num_active_columns` winning columns into `output`.
    /// Both SDR sizes are checked before any state is touched. When `learn`
    /// is set the winners' permanences are adapted to `input`; the activity
    /// average is updated either way. `boost` divides every overlap by the
    /// column's activity average (where it is nonzero) before selection.
    pub fn compute(
        &mut self,
        input: &Sdr,
        learn: bool,
        boost: bool,
        output: &mut Sdr,
    ) -> Result<()> {
        input.ensure_size(self.num_inputs)?;
        output.ensure_size(self.num_columns)?;

        self.update_bookkeeping_vars(learn);

        // Overlap with connected synapses
        self.overlaps = self.calculate_overlaps(input);

        // Boosting
        self.boosted_overlaps = self.boost_overlaps(boost);

        // Inhibition
        let active_columns = self.inhibit_columns();
        output.set_sparse_unchecked(active_columns);

        // Learning
        if learn {
            self.adapt_synapses(input, output);
        }

        self.update_activity(output);

        trace!(
            "spatial pooler step {}: {} active inputs, {} active columns, learn={}",
            self.iteration_num,
            input.get_sum(),
            output.get_sum(),
            learn
        );

        Ok(())
    }

    /// Counts active inputs reached through connected synapses, per column.
    fn calculate_overlaps(&self, input: &Sdr) -> Vec<SynapseIdx> {
        let activity = self.connections.compute_activity(input.get_sparse());

        let mut overlaps = vec![0; self.num_columns];
        for (segment, &count) in activity.connected.iter().enumerate() {
            let column = self.connections.cell_for_segment(segment as Segment);
            overlaps[column as usize] += count;
        }
        overlaps
    }

    /// Divides overlaps by the column activity where that activity is nonzero.
    fn boost_overlaps(&self, boost: bool) -> Vec<Real> {
        self.overlaps
            .iter()
            .zip(&self.activity)
            .map(|(&overlap, &activity)| {
                if boost && activity > 0.0 {
                    overlap as Real / activity
                } else {
                    overlap as Real
                }
            })
            .collect()
    }

    /// Selects the `num_active_columns` columns with the largest boosted overlap.
    ///
    /// Columns are stably sorted by ascending overlap and the last k are taken,
    /// so ties favor the higher column index.
    fn inhibit_columns(&self) -> Vec<CellIdx> {
        let mut columns: Vec<CellIdx> = (0..self.num_columns as CellIdx).collect();
        columns.sort_by(|&a, &b| {
            self.boosted_overlaps[a as usize].total_cmp(&self.boosted_overlaps[b as usize])
        });

        let mut winners = columns.split_off(self.num_columns - self.num_active_columns);
        winners.sort_unstable();
        winners
    }

    /// Hebbian update of every active column's potential synapses.
    fn adapt_synapses(&mut self, input: &Sdr, active: &Sdr) {
        for &column in active.get_sparse() {
            for segment in self.connections.segments_for_cell(column).to_vec() {
                self.connections.adapt_segment(
                    segment,
                    input.get_sparse(),
                    self.synapse_inc,
                    self.synapse_dec,
                );
            }
        }
    }

    /// Exponential moving average of each column's win indicator.
    fn update_activity(&mut self, active: &Sdr) {
        let decay = self.activity_decay;
        for (column, activity) in self.activity.iter_mut().enumerate() {
            let win = if active.contains(column as u32) { 1.0 } else { 0.0 };
            *activity = decay * *activity + (1.0 - decay) * win;
        }
    }

    fn update_bookkeeping_vars(&mut self, learn: bool) {
        self.iteration_num += 1;
        if learn {
            self.iteration_learn_num += 1;
        }
    }

    fn segment_for_column(&self, column: UInt) -> Result<Segment> {
        if column as usize >= self.num_columns {
            return Err(DendriteError::IndexOutOfBounds {
                index: column as usize,
                size: self.num_columns,
            });
        }
        self.connections
            .segments_for_cell(column)
            .first()
            .copied()
            .ok_or(DendriteError::IndexOutOfBounds {
                index: column as usize,
                size: self.connections.num_segments(),
            })
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Returns the number of inputs.
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Returns the number of columns.
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Returns the number of columns active after every compute.
    pub fn num_active_columns(&self) -> usize {
        self.num_active_columns
    }

    /// Returns the potential synapse ratio.
    pub fn potential_synapse_ratio(&self) -> Real {
        self.potential_synapse_ratio
    }

    /// Returns the active column ratio.
    pub fn active_column_ratio(&self) -> Real {
        self.active_column_ratio
    }

    /// Returns the activity decay.
    pub fn activity_decay(&self) -> Real {
        self.activity_decay
    }

    /// Returns the permanence bounds as `(min, max)`.
    pub fn synapse_bounds(&self) -> (Permanence, Permanence) {
        (self.synapse_min, self.synapse_max)
    }

    /// Returns the connected threshold.
    pub fn synapse_threshold(&self) -> Permanence {
        self.synapse_threshold
    }

    /// Returns the initial permanence.
    pub fn synapse_init(&self) -> Permanence {
        self.synapse_init
    }

    /// Returns the permanence increment.
    pub fn synapse_inc(&self) -> Permanence {
        self.synapse_inc
    }

    /// Returns the permanence decrement.
    pub fn synapse_dec(&self) -> Permanence {
        self.synapse_dec
    }

    /// Returns the number of compute calls.
    pub fn iteration_num(&self) -> UInt {
        self.iteration_num
    }

    /// Returns the number of compute calls with learning enabled.
    pub fn iteration_learn_num(&self) -> UInt {
        self.iteration_learn_num
    }

    /// Returns the per-column activity averages.
    pub fn activity(&self) -> &[Real] {
        &self.activity
    }

    /// Returns the raw overlaps from the last compute.
    pub fn overlaps(&self) -> &[SynapseIdx] {
        &self.overlaps
    }

    /// Returns the boosted overlaps from the last compute.
    pub fn boosted_overlaps(&self) -> &[Real] {
        &self.boosted_overlaps
    }

    /// Returns a reference to the connections.
    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    /// Gets the potential pool of a column, ascending.
    pub fn potential_pool(&self, column: UInt) -> Result<Vec<UInt>> {
        let segment = self.segment_for_column(column)?;
        Ok(self.connections.presynaptic_cells_for_segment(segment))
    }

    /// Gets the permanences of a column, aligned with [`Self::potential_pool`].
    pub fn permanences(&self, column: UInt) -> Result<Vec<Permanence>> {
        let segment = self.segment_for_column(column)?;
        Ok(self
            .connections
            .synapses_for_segment(segment)
            .iter()
            .map(|&s| self.connections.data_for_synapse(s).permanence)
            .collect())
    }

    /// Gets the inputs a column is currently connected to, ascending.
    pub fn connected_inputs(&self, column: UInt) -> Result<Vec<UInt>> {
        let segment = self.segment_for_column(column)?;
        Ok(self
            .connections
            .synapses_for_segment(segment)
            .iter()
            .filter(|&&s| self.connections.is_connected(s))
            .map(|&s| self.connections.data_for_synapse(s).presynaptic_cell)
            .collect())
    }

    /// Gets connected counts for all columns.
    pub fn connected_counts(&self) -> Vec<SynapseIdx> {
        (0..self.num_columns as CellIdx)
            .filter_map(|column| self.connections.segments_for_cell(column).first())
            .map(|&segment| self.connections.data_for_segment(segment).num_connected)
            .collect()
    }
}

impl PartialEq for SpatialPooler {
    fn eq(&self, other: &Self) -> bool {
        self.num_inputs == other.num_inputs
            && self.num_columns == other.num_columns
            && self.num_active_columns == other.num_active_columns
            && self.iteration_num == other.iteration_num
            && self.iteration_learn_num == other.iteration_learn_num
            && self.activity == other.activity
            && self.connections == other.connections
    }
}
