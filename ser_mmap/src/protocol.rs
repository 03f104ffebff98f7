//! Two-pass write protocol.

use std::io;

use tracing::debug;

use crate::{
	padding::align,
	storage::AlignedVec,
	util::{align_up_to, WORD},
	LayoutWriter, Offset, Offsets, Result, Serialize, StreamWriter, Versions, Writer,
};

/// Write a relative pointer at current position, pointing at `data_pos`.
/// [`NULL_POS`] writes a null pointer.
///
/// Returns position the pointer was written at.
#[inline]
pub fn write_offset<W: Writer + ?Sized>(writer: &mut W, data_pos: usize) -> Result<usize> {
	let pos = writer.pos();
	writer.write(&Offset::encode(pos, data_pos).to_ne_bytes())?;
	Ok(pos)
}

/// Write a relative pointer to `data_pos` followed by `len`.
///
/// Returns position the pointer was written at.
#[inline]
pub fn write_ref<W: Writer + ?Sized>(writer: &mut W, data_pos: usize, len: usize) -> Result<usize> {
	let pos = write_offset(writer, data_pos)?;
	writer.write(&len.to_ne_bytes())?;
	Ok(pos)
}

/// Write `value` completely: its data, then its field record.
///
/// Returns position of field record, which is word-aligned.
pub fn write_value<T, W>(writer: &mut W, value: &T) -> Result<usize>
where
	T: Serialize + ?Sized,
	W: Writer + ?Sized,
{
	write_root(writer, value, false)
}

fn write_root<T, W>(writer: &mut W, value: &T, with_version: bool) -> Result<usize>
where
	T: Serialize + ?Sized,
	W: Writer + ?Sized,
{
	let mut offsets = Offsets::new();
	value.write_data(writer, &mut offsets)?;
	align(writer)?;

	if with_version {
		let version = Versions::new().get::<T::Mapped>();
		writer.write(&version.to_ne_bytes())?;
		align(writer)?;
	}

	let pos = writer.pos();
	value.write_field(writer, &mut offsets)?;
	debug_assert!(offsets.is_empty(), "data pass pushed more offsets than field pass popped");
	Ok(pos)
}

/// Write a run of values so their field records lie contiguously.
///
/// Writes data of every item, aligns, then writes field records of every item.
/// Returns position of first field record.
pub fn write_range<T, W, I>(writer: &mut W, items: I) -> Result<usize>
where
	T: Serialize,
	W: Writer + ?Sized,
	I: IntoIterator<Item = T>,
	I::IntoIter: Clone,
{
	let items = items.into_iter();
	let mut offsets = Offsets::new();
	for item in items.clone() {
		item.write_data(writer, &mut offsets)?;
	}
	align(writer)?;

	let pos = writer.pos();
	for item in items {
		item.write_field(writer, &mut offsets)?;
	}
	Ok(pos)
}

/// Write `value` with its format version fingerprint in front of it.
///
/// Returns position of `value`'s field record. Output ends with the field
/// record, so the buffer can be read with [`safe_cast`](crate::safe_cast).
pub fn safe_write<T, S>(writer: &mut StreamWriter<S>, value: &T) -> Result<usize>
where
	T: Serialize + ?Sized,
	S: io::Write,
{
	write_top(writer, value, true)
}

/// Write `value` without a fingerprint.
///
/// Output can only be read with [`unsafe_cast`](crate::unsafe_cast).
pub fn unsafe_write<T, S>(writer: &mut StreamWriter<S>, value: &T) -> Result<usize>
where
	T: Serialize + ?Sized,
	S: io::Write,
{
	write_top(writer, value, false)
}

/// Alias for [`safe_write`].
#[inline]
pub fn write<T, S>(writer: &mut StreamWriter<S>, value: &T) -> Result<usize>
where
	T: Serialize + ?Sized,
	S: io::Write,
{
	safe_write(writer, value)
}

/// Write `value` to a new in-memory buffer with [`safe_write`].
///
/// ```
/// use std::collections::BTreeMap;
///
/// let map = BTreeMap::from([(1u32, "one".to_string()), (2, "two".to_string())]);
/// let (_, buf) = ser_mmap::to_bytes(&map).unwrap();
///
/// let mapped = unsafe { ser_mmap::safe_cast::<ser_mmap::MappedMap<u32, ser_mmap::MappedString>>(&buf) }.unwrap();
/// assert_eq!(mapped[&2u32], "two");
/// ```
pub fn to_bytes<T: Serialize + ?Sized>(value: &T) -> Result<(usize, AlignedVec)> {
	let mut writer = StreamWriter::new(AlignedVec::new());
	let pos = safe_write(&mut writer, value)?;
	Ok((pos, writer.into_inner()))
}

/// Lay out `value` with a dry run to size the transient region, reserve it,
/// then write for real.
fn write_top<T, S>(writer: &mut StreamWriter<S>, value: &T, with_version: bool) -> Result<usize>
where
	T: Serialize + ?Sized,
	S: io::Write,
{
	align(writer)?;

	let mut layout = LayoutWriter::new(writer);
	write_root(&mut layout, value, with_version)?;
	let transient_size = align_up_to(layout.transient_size(), WORD);

	writer.reserve_transient(transient_size)?;
	// SAFETY: Every pointee the layout saw is reachable from `value`, which is
	// borrowed for the whole of this function
	unsafe { layout.shift_pointees(transient_size) };

	let pos = write_root(writer, value, with_version)?;
	debug!(
		pos,
		transient_size,
		pointees = layout.pointee_count(),
		with_version,
		"wrote {}",
		std::any::type_name::<T>()
	);
	Ok(pos)
}
