use std::{fmt, ops::Deref};

use crate::{
	protocol::{write_offset, write_value},
	Error, FormatVersion, FromMapped, Offset, Offsets, Result, Serialize, Versioned, Versions,
	Writer,
};

/// Mapped form of [`Box<T>`], [`Shared<T>`](crate::Shared) and
/// [`Back<T>`](crate::Back). A single relative pointer.
///
/// Derefs to `T`. Dereferencing a null pointer panics; use
/// [`get`](MappedPtr::get) where null is possible.
#[repr(C)]
pub struct MappedPtr<T> {
	offset: Offset,
	marker: std::marker::PhantomData<T>,
}

impl<T> MappedPtr<T> {
	#[inline]
	pub fn is_null(&self) -> bool {
		self.offset.is_null()
	}

	#[inline]
	pub fn as_ptr(&self) -> *const T {
		self.offset.ptr()
	}

	#[inline]
	pub fn get(&self) -> Option<&T> {
		// SAFETY: Non-null target is a `T` in the same buffer
		unsafe { self.as_ptr().as_ref() }
	}

	/// Pointee, or [`Error::NullPointer`].
	#[inline]
	pub fn try_get(&self) -> Result<&T> {
		self.get().ok_or(Error::NullPointer)
	}
}

impl<T> Deref for MappedPtr<T> {
	type Target = T;

	#[inline]
	fn deref(&self) -> &T {
		match self.get() {
			Some(value) => value,
			None => panic!("{}", Error::NullPointer),
		}
	}
}

/// Prints address only. Pointers may form cycles.
impl<T> fmt::Debug for MappedPtr<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_null() {
			f.write_str("MappedPtr(null)")
		} else {
			write!(f, "MappedPtr({:p})", self.as_ptr())
		}
	}
}

impl<T: Versioned> Versioned for MappedPtr<T> {
	fn format_version(versions: &mut Versions) -> Option<FormatVersion> {
		Some(versions.dependent::<T>("ptr"))
	}
}

impl<T: Serialize> Serialize for Box<T> {
	type Mapped = MappedPtr<T::Mapped>;

	fn write_data<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		offsets.push(write_value(writer, &**self)?);
		Ok(())
	}

	fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		write_offset(writer, offsets.pop())?;
		Ok(())
	}
}

/// # Panics
///
/// Panics if `mapped` is null, which a written `Box` never is.
impl<T: FromMapped> FromMapped for Box<T> {
	fn from_mapped(mapped: &MappedPtr<T::Mapped>) -> Self {
		Box::new(T::from_mapped(mapped))
	}
}
