//! Alignment and padding. All padding bytes are zero.

use std::mem;

use crate::{
	util::{align_up_to, is_value_aligned, sanitize_alignment, WORD},
	Result, Writer,
};

/// Pad output with zeroes to next multiple of word size.
#[inline]
pub fn align<W: Writer + ?Sized>(writer: &mut W) -> Result<()> {
	align_to(writer, WORD)
}

/// Pad output with zeroes to next multiple of `alignment`
/// (capped at word size).
#[inline]
pub fn align_to<W: Writer + ?Sized>(writer: &mut W, alignment: usize) -> Result<()> {
	let pos = writer.pos();
	let aligned = align_up_to(pos, sanitize_alignment(alignment));
	if aligned > pos {
		writer.write_zeroes(aligned - pos)?;
	}
	Ok(())
}

/// Pad output with zeroes up to `target` position.
///
/// # Panics
///
/// Panics if output is already past `target`, which means a field wrote more
/// bytes than its mapped type occupies.
#[inline]
pub fn pad_to<W: Writer + ?Sized>(writer: &mut W, target: usize) -> Result<()> {
	let pos = writer.pos();
	assert!(pos <= target, "wrote past end of field: at {pos}, field ends at {target}");
	if target > pos {
		writer.write_zeroes(target - pos)?;
	}
	Ok(())
}

/// Move transient cursor to next word boundary, unless a `T` already fits
/// where it is without straddling a word.
#[inline]
pub fn align_transient_for<T, W: Writer + ?Sized>(writer: &mut W) {
	let pos = writer.transient_pos();
	if !is_value_aligned(pos, mem::size_of::<T>(), mem::align_of::<T>()) {
		writer.put_transient(align_up_to(pos, WORD) - pos);
	}
}
