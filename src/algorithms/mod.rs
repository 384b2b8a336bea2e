//! HTM learning algorithms.
//!
//! - **Connections**: the synaptic connectivity graph shared by both learners
//! - **Spatial Pooler**: maps input SDRs onto a fixed number of active columns
//! - **Temporal Memory**: learns sequences of column activations

mod connections;
mod spatial_pooler;
mod temporal_memory;

pub use connections::{
    CellData, Connections, ConnectionsParams, SegmentActivity, SegmentData, SynapseData,
};
pub use spatial_pooler::{SpatialPooler, SpatialPoolerParams};
pub use temporal_memory::{TemporalMemory, TemporalMemoryParams};
