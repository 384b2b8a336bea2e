//! Core types.
//!
//! This module contains the primitive type aliases and the SDR (Sparse Distributed
//! Representation) container that every component consumes and produces.

mod primitives;
mod sdr;

pub use primitives::*;
pub use sdr::*;
