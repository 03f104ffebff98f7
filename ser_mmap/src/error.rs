use std::{io, str};

use thiserror::Error;

use crate::FormatVersion;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while writing or reading mapped buffers.
#[derive(Error, Debug)]
pub enum Error {
	#[error("buffer of {actual} bytes is too small: {required} bytes required")]
	BufferTooSmall { required: usize, actual: usize },

	#[error("position {pos} is not aligned to {align} bytes")]
	Misaligned { pos: usize, align: usize },

	#[error("format version mismatch for {type_name}: expected {expected:#x}, found {found:#x}")]
	VersionMismatch {
		type_name: &'static str,
		expected: FormatVersion,
		found: FormatVersion,
	},

	#[error("key not found")]
	KeyNotFound,

	#[error("the string has no trailing zero")]
	MissingTerminator,

	#[error("string is not valid UTF-8: {0}")]
	Utf8(#[from] str::Utf8Error),

	#[error("pointee header has bad magic {magic:#x}; value was not allocated with `Shared::new`")]
	CorruptPointee { magic: u32 },

	#[error("pointee written at position {pos}, which is not word-aligned")]
	MisalignedPointee { pos: usize },

	#[error("dereferenced a null relative pointer")]
	NullPointer,

	#[error("hash table entry in bucket {bucket} belongs in bucket {expected}")]
	BucketMismatch { bucket: usize, expected: usize },

	#[error(transparent)]
	Io(#[from] io::Error),
}
