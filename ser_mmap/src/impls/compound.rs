use std::{
	array,
	mem::{self, offset_of},
	slice,
};

use crate::{
	padding::{align, pad_to},
	FormatVersion, FromMapped, Offsets, Pod, Result, Serialize, Versioned, Versions, Writer,
};

// SAFETY: Array of POD has no padding between elements
unsafe impl<T: Pod, const N: usize> Pod for [T; N] {}

impl<T: Serialize, const N: usize> Serialize for [T; N] {
	type Mapped = [T::Mapped; N];

	fn write_data<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		for item in self {
			item.write_data(writer, offsets)?;
		}
		Ok(())
	}

	fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		for item in self {
			item.write_field(writer, offsets)?;
		}
		Ok(())
	}

	#[inline]
	fn pod_bytes(values: &[Self]) -> Option<&[u8]> {
		// SAFETY: `[[T; N]]` has same layout as `[T]` of `N` times the length
		let flat = unsafe { slice::from_raw_parts(values.as_ptr() as *const T, values.len() * N) };
		T::pod_bytes(flat)
	}
}

impl<T: FromMapped, const N: usize> FromMapped for [T; N] {
	fn from_mapped(mapped: &[T::Mapped; N]) -> Self {
		array::from_fn(|index| T::from_mapped(&mapped[index]))
	}
}

impl<T: Versioned, const N: usize> Versioned for [T; N] {
	fn format_version(versions: &mut Versions) -> Option<FormatVersion> {
		Some(Versions::combine(versions.dependent::<T>("array"), N))
	}
}

/// Mapped form of a pair, and of map entries.
#[repr(C)]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MappedPair<A, B>(pub A, pub B);

impl<A, B> MappedPair<A, B> {
	#[inline]
	pub fn key(&self) -> &A {
		&self.0
	}

	#[inline]
	pub fn value(&self) -> &B {
		&self.1
	}
}

impl<A: Versioned, B: Versioned> Versioned for MappedPair<A, B> {
	fn field_versions(versions: &mut Versions) -> Option<FormatVersion> {
		let version = Versions::combine(0, versions.get::<A>());
		Some(Versions::combine(version, versions.get::<B>()))
	}
}

/// Pair of references, written as a [`MappedPair`].
/// Map entries are written through this without cloning keys or values.
pub(crate) struct PairRef<'a, A, B>(pub &'a A, pub &'a B);

impl<A, B> Clone for PairRef<'_, A, B> {
	#[inline]
	fn clone(&self) -> Self {
		Self(self.0, self.1)
	}
}

impl<A: Serialize, B: Serialize> Serialize for PairRef<'_, A, B> {
	type Mapped = MappedPair<A::Mapped, B::Mapped>;

	fn write_data<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		self.0.write_data(writer, offsets)?;
		self.1.write_data(writer, offsets)?;
		align(writer)
	}

	fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		let start = writer.pos();
		pad_to(writer, start + offset_of!(MappedPair<A::Mapped, B::Mapped>, 0))?;
		self.0.write_field(writer, offsets)?;
		pad_to(writer, start + offset_of!(MappedPair<A::Mapped, B::Mapped>, 1))?;
		self.1.write_field(writer, offsets)?;
		pad_to(writer, start + mem::size_of::<MappedPair<A::Mapped, B::Mapped>>())
	}
}

impl<A: Serialize, B: Serialize> Serialize for (A, B) {
	type Mapped = MappedPair<A::Mapped, B::Mapped>;

	#[inline]
	fn write_data<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		PairRef(&self.0, &self.1).write_data(writer, offsets)
	}

	#[inline]
	fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		PairRef(&self.0, &self.1).write_field(writer, offsets)
	}
}

impl<A: FromMapped, B: FromMapped> FromMapped for (A, B) {
	fn from_mapped(mapped: &MappedPair<A::Mapped, B::Mapped>) -> Self {
		(A::from_mapped(&mapped.0), B::from_mapped(&mapped.1))
	}
}
