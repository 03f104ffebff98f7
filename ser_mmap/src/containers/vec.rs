use std::{
	borrow::Borrow,
	fmt,
	hash::{Hash, Hasher},
	marker::PhantomData,
	ops::Deref,
	slice,
};

use crate::{
	padding::align,
	protocol::{write_range, write_ref},
	FormatVersion, FromMapped, Offset, Offsets, Result, Serialize, Versioned, Versions, Writer,
	NULL_POS,
};

/// Mapped form of [`Vec<T>`].
///
/// Relative pointer to first element, and element count.
/// Derefs to `[T]`.
#[repr(C)]
pub struct MappedVec<T> {
	offset: Offset,
	len: usize,
	marker: PhantomData<T>,
}

impl<T> MappedVec<T> {
	#[inline]
	pub fn len(&self) -> usize {
		self.len
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	#[inline]
	pub fn as_slice(&self) -> &[T] {
		if self.len == 0 {
			return &[];
		}
		// SAFETY: A `MappedVec` is only ever obtained by casting a buffer it was
		// written into, where `len` elements lie contiguously at its target
		unsafe { slice::from_raw_parts(self.offset.ptr::<T>(), self.len) }
	}

	/// Relative pointer to first element. Null if empty.
	#[inline]
	pub fn offset(&self) -> &Offset {
		&self.offset
	}
}

impl<T> Deref for MappedVec<T> {
	type Target = [T];

	#[inline]
	fn deref(&self) -> &[T] {
		self.as_slice()
	}
}

impl<T> Borrow<[T]> for MappedVec<T> {
	#[inline]
	fn borrow(&self) -> &[T] {
		self.as_slice()
	}
}

impl<'a, T> IntoIterator for &'a MappedVec<T> {
	type Item = &'a T;
	type IntoIter = slice::Iter<'a, T>;

	#[inline]
	fn into_iter(self) -> slice::Iter<'a, T> {
		self.as_slice().iter()
	}
}

impl<T: fmt::Debug> fmt::Debug for MappedVec<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.as_slice()).finish()
	}
}

impl<T: PartialEq> PartialEq for MappedVec<T> {
	fn eq(&self, other: &Self) -> bool {
		self.as_slice() == other.as_slice()
	}
}

impl<T: Eq> Eq for MappedVec<T> {}

impl<T: PartialEq> PartialEq<[T]> for MappedVec<T> {
	fn eq(&self, other: &[T]) -> bool {
		self.as_slice() == other
	}
}

impl<T: PartialOrd> PartialOrd for MappedVec<T> {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		self.as_slice().partial_cmp(other.as_slice())
	}
}

impl<T: Ord> Ord for MappedVec<T> {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.as_slice().cmp(other.as_slice())
	}
}

/// Hashes same as `[T]`, and so same as `Vec<T>` when `T`'s mapped form
/// hashes same as `T`.
impl<T: Hash> Hash for MappedVec<T> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.as_slice().hash(state);
	}
}

impl<T: Versioned> Versioned for MappedVec<T> {
	fn format_version(versions: &mut Versions) -> Option<FormatVersion> {
		Some(versions.dependent::<T>("vector"))
	}
}

/// Write elements of a sequence so their field records lie contiguously.
///
/// Plain old data is copied in bulk. Returns position of first element,
/// or [`NULL_POS`] if `items` is empty.
pub(crate) fn write_seq<T: Serialize, W: Writer + ?Sized>(writer: &mut W, items: &[T]) -> Result<usize> {
	if items.is_empty() {
		return Ok(NULL_POS);
	}
	match T::pod_bytes(items) {
		Some(bytes) => {
			align(writer)?;
			let pos = writer.pos();
			writer.write(bytes)?;
			Ok(pos)
		}
		None => write_range(writer, items),
	}
}

impl<T: Serialize> Serialize for Vec<T> {
	type Mapped = MappedVec<T::Mapped>;

	fn write_data<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		offsets.push(write_seq(writer, self.as_slice())?);
		Ok(())
	}

	fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		write_ref(writer, offsets.pop(), self.len())?;
		Ok(())
	}
}

impl<T: FromMapped> FromMapped for Vec<T> {
	fn from_mapped(mapped: &MappedVec<T::Mapped>) -> Self {
		mapped.iter().map(T::from_mapped).collect()
	}
}
