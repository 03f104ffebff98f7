use std::{
	alloc::{self, Layout},
	cmp, fmt, io,
	ops::{Deref, DerefMut},
	ptr::{self, NonNull},
	slice,
};

use crate::util::{aligned_max_capacity, WORD};

/// Default alignment of [`AlignedVec`]'s memory.
pub const DEFAULT_ALIGNMENT: usize = 16;

/// Growable byte buffer whose memory is aligned to `ALIGNMENT`.
///
/// Serialized output must start at an address aligned at least to word size
/// for the mapped views inside it to be readable in place. A `Vec<u8>` gives no
/// such guarantee, so use this as the sink when writing in memory, or copy
/// bytes into it with [`from_slice`](AlignedVec::from_slice) before casting.
///
/// Implements [`std::io::Write`], so can be wrapped in a
/// [`StreamWriter`](crate::StreamWriter).
///
/// # Example
///
/// ```
/// use ser_mmap::storage::AlignedVec;
///
/// let mut buf: AlignedVec = AlignedVec::with_capacity(10);
///
/// // Memory is aligned to `ALIGNMENT` (default 16)
/// assert!(buf.as_ptr() as usize % 16 == 0);
///
/// // Capacity grows in powers of 2
/// assert_eq!(buf.capacity(), 16);
/// buf.extend_from_slice(&[1; 20]);
/// assert_eq!(buf.len(), 20);
/// assert_eq!(buf.capacity(), 32);
/// ```
pub struct AlignedVec<const ALIGNMENT: usize = DEFAULT_ALIGNMENT> {
	ptr: NonNull<u8>,
	capacity: usize,
	len: usize,
}

// SAFETY: `AlignedVec` owns its memory exclusively, same as `Vec<u8>`
unsafe impl<const ALIGNMENT: usize> Send for AlignedVec<ALIGNMENT> {}
unsafe impl<const ALIGNMENT: usize> Sync for AlignedVec<ALIGNMENT> {}

impl<const ALIGNMENT: usize> AlignedVec<ALIGNMENT> {
	/// Maximum capacity of buffer.
	pub const MAX_CAPACITY: usize = aligned_max_capacity(ALIGNMENT);

	/// Assertions for validity of `ALIGNMENT`.
	/// Must be referenced in all code paths creating an `AlignedVec`,
	/// to produce a compile-time error if they fail.
	const ASSERT_ALIGNMENT_VALID: () = {
		assert!(ALIGNMENT.is_power_of_two(), "ALIGNMENT must be a power of 2");
		assert!(ALIGNMENT >= WORD, "ALIGNMENT must be at least word size");
		assert!(
			ALIGNMENT < isize::MAX as usize,
			"ALIGNMENT must be less than isize::MAX"
		);
	};

	/// Create new empty [`AlignedVec`]. Does not allocate.
	#[inline]
	pub fn new() -> Self {
		let _ = Self::ASSERT_ALIGNMENT_VALID;

		// SAFETY: `ALIGNMENT` is non-zero
		let ptr = unsafe { NonNull::new_unchecked(ALIGNMENT as *mut u8) };
		Self {
			ptr,
			capacity: 0,
			len: 0,
		}
	}

	/// Create new [`AlignedVec`] with pre-allocated capacity.
	///
	/// Capacity is rounded up to a power of 2, minimum `ALIGNMENT`.
	///
	/// # Panics
	///
	/// Panics if `capacity` exceeds [`MAX_CAPACITY`](Self::MAX_CAPACITY).
	pub fn with_capacity(capacity: usize) -> Self {
		let mut vec = Self::new();
		if capacity > 0 {
			vec.grow_for_reserve(capacity);
		}
		vec
	}

	/// Create new [`AlignedVec`] containing a copy of `bytes`.
	pub fn from_slice(bytes: &[u8]) -> Self {
		let mut vec = Self::with_capacity(bytes.len());
		vec.extend_from_slice(bytes);
		vec
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.len
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	#[inline]
	pub fn capacity(&self) -> usize {
		self.capacity
	}

	#[inline]
	pub fn as_ptr(&self) -> *const u8 {
		self.ptr.as_ptr()
	}

	#[inline]
	pub fn as_mut_ptr(&mut self) -> *mut u8 {
		self.ptr.as_ptr()
	}

	#[inline]
	pub fn as_slice(&self) -> &[u8] {
		// SAFETY: First `len` bytes are initialized
		unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
	}

	#[inline]
	pub fn as_mut_slice(&mut self) -> &mut [u8] {
		// SAFETY: First `len` bytes are initialized
		unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
	}

	/// Remove all bytes. Capacity is retained.
	#[inline]
	pub fn clear(&mut self) {
		self.len = 0;
	}

	/// Reserve space for at least `additional` more bytes.
	#[inline]
	pub fn reserve(&mut self, additional: usize) {
		let required = match self.len.checked_add(additional) {
			Some(required) => required,
			None => panic!("capacity overflow"),
		};
		if required > self.capacity {
			self.grow_for_reserve(required);
		}
	}

	/// Append `bytes`.
	#[inline]
	pub fn extend_from_slice(&mut self, bytes: &[u8]) {
		self.reserve(bytes.len());
		// SAFETY: `reserve` ensured capacity. `bytes` cannot overlap our spare capacity.
		unsafe {
			ptr::copy_nonoverlapping(bytes.as_ptr(), self.ptr.as_ptr().add(self.len), bytes.len());
		}
		self.len += bytes.len();
	}

	/// Append `count` zero bytes.
	pub fn extend_zeroed(&mut self, count: usize) {
		self.reserve(count);
		// SAFETY: `reserve` ensured capacity
		unsafe {
			ptr::write_bytes(self.ptr.as_ptr().add(self.len), 0, count);
		}
		self.len += count;
	}

	/// Grow capacity to next power of 2 which accommodates `required` bytes.
	#[cold]
	fn grow_for_reserve(&mut self, required: usize) {
		assert!(
			required <= Self::MAX_CAPACITY,
			"capacity cannot exceed MAX_CAPACITY"
		);
		let new_capacity = cmp::max(required.next_power_of_two(), ALIGNMENT);
		let new_capacity = cmp::min(new_capacity, Self::MAX_CAPACITY);

		// SAFETY: `ALIGNMENT` is a power of 2 and `new_capacity` is within `MAX_CAPACITY`
		let new_layout = unsafe { Layout::from_size_align_unchecked(new_capacity, ALIGNMENT) };
		let new_ptr = if self.capacity == 0 {
			// SAFETY: `new_capacity` is non-zero
			unsafe { alloc::alloc(new_layout) }
		} else {
			// SAFETY: `self.ptr` was allocated with `current_layout()`
			unsafe { alloc::realloc(self.ptr.as_ptr(), self.current_layout(), new_capacity) }
		};
		self.ptr = match NonNull::new(new_ptr) {
			Some(ptr) => ptr,
			None => alloc::handle_alloc_error(new_layout),
		};
		self.capacity = new_capacity;
	}

	#[inline]
	fn current_layout(&self) -> Layout {
		// SAFETY: Same parameters as allocation was made with
		unsafe { Layout::from_size_align_unchecked(self.capacity, ALIGNMENT) }
	}
}

impl<const ALIGNMENT: usize> Drop for AlignedVec<ALIGNMENT> {
	fn drop(&mut self) {
		if self.capacity > 0 {
			// SAFETY: Allocated with this layout
			unsafe { alloc::dealloc(self.ptr.as_ptr(), self.current_layout()) };
		}
	}
}

impl<const ALIGNMENT: usize> Default for AlignedVec<ALIGNMENT> {
	#[inline]
	fn default() -> Self {
		Self::new()
	}
}

impl<const ALIGNMENT: usize> Clone for AlignedVec<ALIGNMENT> {
	fn clone(&self) -> Self {
		Self::from_slice(self.as_slice())
	}
}

impl<const ALIGNMENT: usize> Deref for AlignedVec<ALIGNMENT> {
	type Target = [u8];

	#[inline]
	fn deref(&self) -> &[u8] {
		self.as_slice()
	}
}

impl<const ALIGNMENT: usize> DerefMut for AlignedVec<ALIGNMENT> {
	#[inline]
	fn deref_mut(&mut self) -> &mut [u8] {
		self.as_mut_slice()
	}
}

impl<const ALIGNMENT: usize> AsRef<[u8]> for AlignedVec<ALIGNMENT> {
	#[inline]
	fn as_ref(&self) -> &[u8] {
		self.as_slice()
	}
}

impl<const ALIGNMENT: usize> fmt::Debug for AlignedVec<ALIGNMENT> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AlignedVec")
			.field("len", &self.len)
			.field("capacity", &self.capacity)
			.finish()
	}
}

impl<const ALIGNMENT: usize> io::Write for AlignedVec<ALIGNMENT> {
	#[inline]
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.extend_from_slice(buf);
		Ok(buf.len())
	}

	#[inline]
	fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
		self.extend_from_slice(buf);
		Ok(())
	}

	#[inline]
	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn grows_in_powers_of_two() {
		let mut vec: AlignedVec = AlignedVec::new();
		assert_eq!(vec.capacity(), 0);
		vec.extend_from_slice(&[1, 2, 3]);
		assert_eq!(vec.capacity(), 16);
		vec.extend_zeroed(14);
		assert_eq!(vec.len(), 17);
		assert_eq!(vec.capacity(), 32);
		assert_eq!(&vec[..4], &[1, 2, 3, 0]);
		assert_eq!(vec.as_ptr() as usize % 16, 0);
	}

	#[test]
	fn large_alignment() {
		let vec = AlignedVec::<4096>::from_slice(&[7; 100]);
		assert_eq!(vec.as_ptr() as usize % 4096, 0);
		assert_eq!(vec.capacity(), 4096);
		assert!(vec.iter().all(|&b| b == 7));
	}
}
