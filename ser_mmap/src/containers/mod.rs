//! Containers: contiguous sequences, sorted sequences and hash tables.

mod hashtable;
mod sorted;
mod string;
mod vec;

pub use hashtable::{hash_of, HashTable, MappedHashMap, MappedHashSet};
pub use sorted::{First, Identity, KeyOf, MappedMap, MappedSet, SortedSeq};
pub use string::MappedString;
pub use vec::MappedVec;
