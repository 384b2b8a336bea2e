//! Primitive type definitions shared by the learning components.
//!
//! Index types are kept narrow so that segment and synapse tables stay compact.

/// Default unsigned integer type.
pub type UInt = u32;

/// Default floating point type.
pub type Real = f32;

/// Index type for cells (and columns and input bits) in the connections graph.
/// Must match `ElemSparse` for SDR compatibility.
pub type CellIdx = u32;

/// Count type for synapses on a single segment.
pub type SynapseIdx = UInt;

/// Unique identifier for a segment in the connections flat list.
pub type Segment = u32;

/// Unique identifier for a synapse in the connections flat list.
pub type Synapse = u32;

/// Synapse permanence. Permanences are bounded integers, not probabilities.
pub type Permanence = i32;

/// Element type for dense SDR representation.
pub type ElemDense = u8;

/// Element type for sparse SDR representation (indices).
pub type ElemSparse = u32;
