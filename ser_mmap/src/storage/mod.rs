//! In-memory output buffers.

mod aligned_vec;
pub use aligned_vec::{AlignedVec, DEFAULT_ALIGNMENT};
