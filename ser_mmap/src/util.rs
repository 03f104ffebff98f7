use std::mem;

/// Native word size. All structured boundaries in output are aligned to this.
pub const WORD: usize = mem::size_of::<usize>();

/// Round up `pos` to alignment of `alignment`.
///
/// `alignment` must be a power of 2.
///
/// Caller must ensure `pos + alignment` cannot overflow `usize`.
/// This is satisfied if both `pos` and `alignment` are less than `isize::MAX`.
#[inline]
pub const fn align_up_to(pos: usize, alignment: usize) -> usize {
	debug_assert!(alignment.is_power_of_two());
	(pos + alignment - 1) & !(alignment - 1)
}

/// Check if `pos` is a multiple of `alignment`.
///
/// `alignment` must be a power of 2.
#[inline]
pub const fn is_aligned_to(pos: usize, alignment: usize) -> bool {
	debug_assert!(alignment.is_power_of_two());
	pos & (alignment - 1) == 0
}

/// Cap `alignment` at word size.
///
/// Output is only ever word-aligned, so no value can rely on more than that.
#[inline]
pub const fn sanitize_alignment(alignment: usize) -> usize {
	if alignment > WORD {
		WORD
	} else {
		alignment
	}
}

/// Check that a value of `size` bytes at `pos` is aligned to `alignment`
/// (after capping it at word size) and does not straddle a word boundary
/// unless it is itself word-aligned.
#[inline]
pub const fn is_value_aligned(pos: usize, size: usize, alignment: usize) -> bool {
	let alignment = sanitize_alignment(alignment);
	if !is_aligned_to(pos, alignment) {
		return false;
	}
	if size == 0 || is_aligned_to(pos, WORD) {
		return true;
	}
	// Value must fit before the next word boundary
	align_up_to(pos + 1, WORD) >= pos + size
}

/// Maximum capacity for an allocation with alignment `alignment`.
///
/// Rust's allocator API requires allocations not to exceed `isize::MAX` bytes
/// when rounded up to a multiple of alignment.
pub const fn aligned_max_capacity(alignment: usize) -> usize {
	isize::MAX as usize - (alignment - 1)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn align_up() {
		assert_eq!(align_up_to(0, 8), 0);
		assert_eq!(align_up_to(1, 8), 8);
		assert_eq!(align_up_to(8, 8), 8);
		assert_eq!(align_up_to(9, 4), 12);
	}

	#[test]
	fn alignment_is_capped_at_word() {
		assert_eq!(sanitize_alignment(1), 1);
		assert_eq!(sanitize_alignment(WORD), WORD);
		assert_eq!(sanitize_alignment(WORD * 4), WORD);
	}

	#[test]
	fn value_alignment() {
		assert!(is_value_aligned(0, 8, 8));
		assert!(is_value_aligned(4, 4, 4));
		assert!(!is_value_aligned(2, 4, 4));
		assert!(is_value_aligned(WORD - 2, 2, 2));
		// Straddles a word boundary
		assert!(!is_value_aligned(WORD - 1, 2, 1));
		assert!(is_value_aligned(3, 0, 1));
	}
}
