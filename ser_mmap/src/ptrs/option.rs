use std::fmt;

use crate::{
	protocol::{write_offset, write_value},
	Error, FormatVersion, FromMapped, Offset, Offsets, Result, Serialize, Versioned, Versions,
	Writer, NULL_POS,
};

/// Mapped form of [`Option<T>`]. A relative pointer to the value, null if `None`.
#[repr(C)]
pub struct MappedOption<T> {
	offset: Offset,
	marker: std::marker::PhantomData<T>,
}

impl<T> MappedOption<T> {
	#[inline]
	pub fn is_some(&self) -> bool {
		!self.offset.is_null()
	}

	#[inline]
	pub fn is_none(&self) -> bool {
		self.offset.is_null()
	}

	#[inline]
	pub fn as_ref(&self) -> Option<&T> {
		// SAFETY: Non-null target is a `T` in the same buffer
		unsafe { self.offset.ptr::<T>().as_ref() }
	}

	/// Contained value, or [`Error::NullPointer`] if `None`.
	#[inline]
	pub fn get(&self) -> Result<&T> {
		self.as_ref().ok_or(Error::NullPointer)
	}
}

impl<T: fmt::Debug> fmt::Debug for MappedOption<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&self.as_ref(), f)
	}
}

impl<T: PartialEq> PartialEq for MappedOption<T> {
	fn eq(&self, other: &Self) -> bool {
		self.as_ref() == other.as_ref()
	}
}

impl<T: Versioned> Versioned for MappedOption<T> {
	fn format_version(versions: &mut Versions) -> Option<FormatVersion> {
		Some(versions.dependent::<T>("optional"))
	}
}

impl<T: Serialize> Serialize for Option<T> {
	type Mapped = MappedOption<T::Mapped>;

	fn write_data<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		let pos = match self {
			Some(value) => write_value(writer, value)?,
			None => NULL_POS,
		};
		offsets.push(pos);
		Ok(())
	}

	fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		write_offset(writer, offsets.pop())?;
		Ok(())
	}
}

impl<T: FromMapped> FromMapped for Option<T> {
	fn from_mapped(mapped: &MappedOption<T::Mapped>) -> Self {
		mapped.as_ref().map(T::from_mapped)
	}
}
