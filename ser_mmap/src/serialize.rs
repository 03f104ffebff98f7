use std::{mem, slice};

use crate::{Offsets, Result, Versioned, Writer};

/// Trait for types which can be written to a mapped buffer.
///
/// Each implementing type names its fixed-layout mapped form as
/// [`Mapped`](Serialize::Mapped). Writing happens in two passes:
///
/// 1. [`write_data`](Serialize::write_data) writes whatever the value refers to
///    (vector elements, string bytes, pointees) and pushes the position of that
///    data to `offsets`.
/// 2. [`write_field`](Serialize::write_field) writes the value's mapped form in
///    place, popping the position(s) its data pass pushed.
///
/// A type with no out-of-line data pushes nothing and pops nothing. A type
/// which has out-of-line data pushes exactly one position, or [`NULL_POS`] if
/// there is nothing to point to. A struct does whatever its fields do, in
/// field order, in both passes.
///
/// `write_field` must write exactly `size_of::<Self::Mapped>()` bytes.
///
/// Usually implemented with `#[derive(Serialize)]`.
///
/// [`NULL_POS`]: crate::NULL_POS
pub trait Serialize {
	type Mapped: Versioned;

	/// Data pass.
	fn write_data<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()>;

	/// Field pass.
	fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets)
		-> Result<()>;

	/// Raw bytes of a slice of values, if `Self` is plain old data whose mapped
	/// form is itself. Sequences of such values are copied in one go.
	#[inline]
	fn pod_bytes(values: &[Self]) -> Option<&[u8]>
	where Self: Sized {
		let _ = values;
		None
	}
}

impl<T: Serialize + ?Sized> Serialize for &T {
	type Mapped = T::Mapped;

	#[inline]
	fn write_data<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		(**self).write_data(writer, offsets)
	}

	#[inline]
	fn write_field<W: Writer + ?Sized>(
		&self,
		writer: &mut W,
		offsets: &mut Offsets,
	) -> Result<()> {
		(**self).write_field(writer, offsets)
	}
}

/// Deep copy from mapped form back to a standalone value.
pub trait FromMapped: Serialize + Sized {
	fn from_mapped(mapped: &Self::Mapped) -> Self;
}

/// Plain old data: fixed layout, no pointers, no padding bytes.
///
/// # Safety
///
/// Implementing types must contain no padding and no pointers, and every
/// byte pattern written from a valid value must read back as the same value.
pub unsafe trait Pod: Copy + 'static {}

/// Bytes of a POD value.
#[inline]
pub fn bytes_of<T: Pod>(value: &T) -> &[u8] {
	// SAFETY: `Pod` types have no padding, so all bytes are initialized
	unsafe { slice::from_raw_parts(value as *const T as *const u8, mem::size_of::<T>()) }
}

/// Bytes of a slice of POD values.
#[inline]
pub fn slice_bytes<T: Pod>(values: &[T]) -> &[u8] {
	// SAFETY: `Pod` types have no padding, so all bytes are initialized
	unsafe { slice::from_raw_parts(values.as_ptr() as *const u8, mem::size_of_val(values)) }
}
