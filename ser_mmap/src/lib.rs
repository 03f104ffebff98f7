//! Zero-copy serializer.
//!
//! Writes a value into a flat buffer which can later be mapped into memory
//! (e.g. from a file) and read in place, with no deserialization step.
//!
//! Every [`Serialize`] type has a fixed-layout mapped form, its
//! [`Mapped`](Serialize::Mapped) type. Variable-length data (vector
//! elements, string bytes, pointees) is written ahead of the records which
//! refer to it, and those records point to it with self-relative
//! [`Offset`]s, so a buffer reads the same wherever it is mapped.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use ser_mmap::{safe_cast, to_bytes, Serialize};
//!
//! #[derive(Serialize)]
//! struct Config {
//! 	id: u32,
//! 	name: String,
//! 	limits: BTreeMap<String, u64>,
//! }
//!
//! let config = Config {
//! 	id: 1,
//! 	name: "main".to_string(),
//! 	limits: BTreeMap::from([("cpu".to_string(), 4), ("mem".to_string(), 1024)]),
//! };
//! let (_, buf) = to_bytes(&config).unwrap();
//!
//! let mapped = unsafe { safe_cast::<MappedConfig>(&buf) }.unwrap();
//! assert_eq!(mapped.id, 1);
//! assert_eq!(mapped.name, "main");
//! assert_eq!(mapped.limits["mem"], 1024);
//! ```

// Allows derive output, which refers to `::ser_mmap`, to be used in this crate
extern crate self as ser_mmap;

#[cfg(feature = "derive")]
pub use ser_mmap_derive::Serialize;

mod cast;
mod containers;
mod error;
mod impls;
mod offset;
mod padding;
mod protocol;
mod ptrs;
mod serialize;
pub mod storage;
pub mod util;
mod version;
mod writer;

pub use cast::{cast, cast_at, copy, read, read_at, safe_cast, safe_read, unsafe_cast};
pub use containers::{
	hash_of, First, HashTable, Identity, KeyOf, MappedHashMap, MappedHashSet, MappedMap, MappedSet,
	MappedString, MappedVec, SortedSeq,
};
pub use error::{Error, Result};
pub use impls::MappedPair;
pub use offset::{Offset, Offsets, NULL_POS};
pub use padding::{align, align_to, align_transient_for, pad_to};
pub use protocol::{
	safe_write, to_bytes, unsafe_write, write, write_offset, write_range, write_ref, write_value,
};
pub use ptrs::{Back, MappedOption, MappedPtr, MappedTransient, PointeeHeader, Shared, Transient};
pub use serialize::{bytes_of, slice_bytes, FromMapped, Pod, Serialize};
pub use version::{FormatVersion, Versioned, Versions};
pub use writer::{LayoutWriter, StreamWriter, Writer, WriterId};
