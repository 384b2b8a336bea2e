//! Decoders for mapping SDRs back onto values.
//!
//! - [`ScalarDecoder`]: running mean of the values seen with each SDR
//! - [`CategoryDecoder`]: majority vote over the values seen with each SDR
//!
//! Both look up an exact match first and otherwise fall back to the stored
//! SDR with the largest overlap, preferring the first seen on ties.

mod base;
mod category;
mod scalar;

pub use base::Decoder;
pub use category::CategoryDecoder;
pub use scalar::ScalarDecoder;
