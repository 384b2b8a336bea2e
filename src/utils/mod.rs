//! Utility modules.

mod random;

pub use random::Random;
