use std::num;

use crate::{
	serialize::{bytes_of, slice_bytes},
	FromMapped, Offsets, Pod, Result, Serialize, Versioned, Writer,
};

macro_rules! impl_primitive {
	($ty:ty) => {
		unsafe impl Pod for $ty {}

		impl Serialize for $ty {
			type Mapped = $ty;

			#[inline]
			fn write_data<W: Writer + ?Sized>(&self, _: &mut W, _: &mut Offsets) -> Result<()> {
				Ok(())
			}

			#[inline]
			fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, _: &mut Offsets) -> Result<()> {
				writer.write(bytes_of(self))
			}

			#[inline]
			fn pod_bytes(values: &[Self]) -> Option<&[u8]> {
				Some(slice_bytes(values))
			}
		}

		impl FromMapped for $ty {
			#[inline]
			fn from_mapped(mapped: &$ty) -> Self {
				*mapped
			}
		}

		impl Versioned for $ty {
			const ATOMIC: bool = true;
		}
	};
}

impl_primitive!(u8);
impl_primitive!(u16);
impl_primitive!(u32);
impl_primitive!(u64);
impl_primitive!(usize);

impl_primitive!(i8);
impl_primitive!(i16);
impl_primitive!(i32);
impl_primitive!(i64);
impl_primitive!(isize);

impl_primitive!(num::NonZeroU8);
impl_primitive!(num::NonZeroU16);
impl_primitive!(num::NonZeroU32);
impl_primitive!(num::NonZeroU64);
impl_primitive!(num::NonZeroUsize);

impl_primitive!(num::NonZeroI8);
impl_primitive!(num::NonZeroI16);
impl_primitive!(num::NonZeroI32);
impl_primitive!(num::NonZeroI64);
impl_primitive!(num::NonZeroIsize);

impl_primitive!(f32);
impl_primitive!(f64);

impl_primitive!(bool);
impl_primitive!(char);

// NB: No impls for `u128` and `i128`. Their alignment exceeds word size on
// some targets, and output only guarantees word alignment.
