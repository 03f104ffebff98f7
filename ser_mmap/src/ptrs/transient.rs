use std::{fmt, marker::PhantomData, mem, ptr};

use crate::{
	padding::align_transient_for, protocol::write_offset, FormatVersion, FromMapped, Offset,
	Offsets, Pod, Result, Serialize, Versioned, Versions, Writer,
};

/// Placeholder for a value which lives in the transient region of output.
///
/// Every top-level write reserves a zeroed region in front of the value for
/// all the `Transient`s it contains. Once the buffer is mapped writable, the
/// values there can be changed in place through [`MappedTransient`], e.g. a
/// counter shared by processes mapping the same file.
pub struct Transient<T>(PhantomData<fn() -> T>);

impl<T> Transient<T> {
	pub fn new() -> Self {
		Self(PhantomData)
	}
}

impl<T> Default for Transient<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Clone for Transient<T> {
	fn clone(&self) -> Self {
		Self::new()
	}
}

impl<T> fmt::Debug for Transient<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Transient")
	}
}

impl<T> PartialEq for Transient<T> {
	fn eq(&self, _: &Self) -> bool {
		true
	}
}

impl<T: Pod + Versioned> Serialize for Transient<T> {
	type Mapped = MappedTransient<T>;

	fn write_data<W: Writer + ?Sized>(&self, _: &mut W, offsets: &mut Offsets) -> Result<()> {
		offsets.push(crate::NULL_POS);
		Ok(())
	}

	fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		offsets.pop();
		align_transient_for::<T, W>(writer);
		let pos = writer.transient_pos();
		writer.put_transient(mem::size_of::<T>());
		write_offset(writer, pos)?;
		Ok(())
	}
}

impl<T: Pod + Versioned> FromMapped for Transient<T> {
	fn from_mapped(_: &MappedTransient<T>) -> Self {
		Self::new()
	}
}

/// Mapped form of [`Transient<T>`]. A relative pointer into the transient
/// region.
#[repr(C)]
pub struct MappedTransient<T> {
	offset: Offset,
	marker: PhantomData<T>,
}

impl<T: Pod> MappedTransient<T> {
	/// Address of value.
	#[inline]
	pub fn as_ptr(&self) -> *mut T {
		self.offset.ptr_mut()
	}

	/// Read current value.
	///
	/// # Safety
	///
	/// No other thread or process may be writing the value concurrently.
	#[inline]
	pub unsafe fn get(&self) -> T {
		ptr::read_volatile(self.as_ptr())
	}

	/// Overwrite value in place.
	///
	/// # Safety
	///
	/// Buffer must be mapped writable, and no one else may access the value
	/// concurrently.
	#[inline]
	pub unsafe fn set(&self, value: T) {
		ptr::write_volatile(self.as_ptr(), value);
	}

	/// Mutable reference to value.
	///
	/// # Safety
	///
	/// As for [`set`](MappedTransient::set), for the lifetime of the reference.
	#[allow(clippy::mut_from_ref)]
	#[inline]
	pub unsafe fn get_mut(&self) -> &mut T {
		&mut *self.as_ptr()
	}
}

impl<T> fmt::Debug for MappedTransient<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("MappedTransient").field(&self.offset).finish()
	}
}

impl<T: Versioned> Versioned for MappedTransient<T> {
	fn format_version(versions: &mut Versions) -> Option<FormatVersion> {
		Some(versions.dependent::<T>("transient"))
	}
}
