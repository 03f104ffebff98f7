//! Reinterpreting buffers as mapped views, and copying views back out.

use std::{any::type_name, mem};

use tracing::debug;

use crate::{util::WORD, Error, FormatVersion, FromMapped, Result, Versioned, Versions};

/// View the last `size_of::<T>()` bytes of `buffer` as a `T`, without checks.
///
/// # Safety
///
/// `buffer` must end with a `T` written by [`write`](crate::write) or
/// [`unsafe_write`](crate::unsafe_write), and must start at an address
/// aligned at least to word size. Everything `T` refers to must lie within
/// the same buffer at the positions it was written at.
#[inline]
pub unsafe fn unsafe_cast<T>(buffer: &[u8]) -> &T {
	debug_assert!(buffer.len() >= mem::size_of::<T>());
	let ptr = buffer.as_ptr().add(buffer.len() - mem::size_of::<T>()) as *const T;
	debug_assert!(ptr as usize % mem::align_of::<T>() == 0);
	&*ptr
}

/// Alias for [`unsafe_cast`].
///
/// # Safety
///
/// As for [`unsafe_cast`].
#[inline]
pub unsafe fn cast<T>(buffer: &[u8]) -> &T {
	unsafe_cast(buffer)
}

/// View the end of `buffer` as a `T` after checking size, alignment, and the
/// fingerprint stored in front of it by [`safe_write`](crate::safe_write).
///
/// # Errors
///
/// * [`Error::BufferTooSmall`] if `buffer` cannot hold a fingerprint and a `T`.
/// * [`Error::Misaligned`] if the `T` would not be correctly aligned in memory.
/// * [`Error::VersionMismatch`] if the stored fingerprint is not `T`'s.
///
/// # Safety
///
/// Content of `buffer` cannot be validated beyond the fingerprint.
/// `buffer` must have been produced by [`safe_write`](crate::safe_write)
/// (or be a bit-identical copy of such output).
pub unsafe fn safe_cast<T: Versioned>(buffer: &[u8]) -> Result<&T> {
	let required = mem::size_of::<T>() + mem::size_of::<FormatVersion>();
	if buffer.len() < required {
		return Err(Error::BufferTooSmall {
			required,
			actual: buffer.len(),
		});
	}

	let pos = buffer.len() - mem::size_of::<T>();
	check_alignment::<T>(buffer, pos)?;

	let mut word = [0u8; WORD];
	word.copy_from_slice(&buffer[pos - WORD..pos]);
	let found = FormatVersion::from_ne_bytes(word);
	let expected = Versions::new().get::<T>();
	if found != expected {
		return Err(Error::VersionMismatch {
			type_name: type_name::<T>(),
			expected,
			found,
		});
	}

	debug!(pos, version = expected, "cast {}", type_name::<T>());
	Ok(&*(buffer.as_ptr().add(pos) as *const T))
}

/// View bytes of `buffer` at `pos` as a `T`.
///
/// For reading a value at a position returned by a write, when it is not
/// the last thing in the buffer.
///
/// # Errors
///
/// * [`Error::BufferTooSmall`] if `buffer` does not extend to end of the `T`.
/// * [`Error::Misaligned`] if the `T` would not be correctly aligned in memory.
///
/// # Safety
///
/// A `T` must have been written at `pos`, with everything it refers to at
/// the positions it was written at.
pub unsafe fn cast_at<T>(buffer: &[u8], pos: usize) -> Result<&T> {
	let required = pos.saturating_add(mem::size_of::<T>());
	if buffer.len() < required {
		return Err(Error::BufferTooSmall {
			required,
			actual: buffer.len(),
		});
	}
	check_alignment::<T>(buffer, pos)?;
	Ok(&*(buffer.as_ptr().add(pos) as *const T))
}

fn check_alignment<T>(buffer: &[u8], pos: usize) -> Result<()> {
	let align = mem::align_of::<T>();
	if (buffer.as_ptr() as usize + pos) % align != 0 {
		return Err(Error::Misaligned { pos, align });
	}
	Ok(())
}

/// Deep copy mapped value into a standalone one.
#[inline]
pub fn copy<T: FromMapped>(from: &T::Mapped, to: &mut T) {
	*to = T::from_mapped(from);
}

/// Copy a standalone `T` out of the end of `buffer`.
///
/// Checks size and alignment, but not fingerprint.
///
/// # Safety
///
/// As for [`unsafe_cast`].
pub unsafe fn read<T: FromMapped>(buffer: &[u8]) -> Result<T> {
	let size = mem::size_of::<T::Mapped>();
	if buffer.len() < size {
		return Err(Error::BufferTooSmall {
			required: size,
			actual: buffer.len(),
		});
	}
	let mapped = cast_at::<T::Mapped>(buffer, buffer.len() - size)?;
	Ok(T::from_mapped(mapped))
}

/// Copy a standalone `T` out of the end of `buffer`, checking fingerprint.
///
/// # Safety
///
/// As for [`safe_cast`].
pub unsafe fn safe_read<T: FromMapped>(buffer: &[u8]) -> Result<T> {
	safe_cast::<T::Mapped>(buffer).map(T::from_mapped)
}

/// Copy a standalone `T` out of `buffer` at `pos`.
///
/// # Safety
///
/// As for [`cast_at`].
pub unsafe fn read_at<T: FromMapped>(buffer: &[u8], pos: usize) -> Result<T> {
	cast_at::<T::Mapped>(buffer, pos).map(T::from_mapped)
}
