mod compound;
mod primitives;

pub use compound::MappedPair;
pub(crate) use compound::PairRef;
