//! Relative pointers, and the queue of data positions passed between the
//! data pass and the field pass.

use std::{collections::VecDeque, fmt, ptr};

/// Position sentinel meaning "no data". Written out as a null [`Offset`].
pub const NULL_POS: usize = usize::MAX;

/// Self-relative pointer.
///
/// Stores the signed distance in bytes from its own address to its target.
/// A distance of 0 is null, so an all-zero `Offset` is null wherever it lives.
///
/// `Offset` is deliberately neither `Clone` nor `Copy`: copying the raw
/// distance to another location would point somewhere else.
/// Use [`assign_from`](Offset::assign_from) to retarget a copy.
#[repr(transparent)]
#[derive(Default)]
pub struct Offset {
	distance: isize,
}

impl Offset {
	/// Null offset.
	#[inline]
	pub const fn null() -> Self {
		Self { distance: 0 }
	}

	/// Raw distance from this offset's address to its target.
	#[inline]
	pub const fn distance(&self) -> isize {
		self.distance
	}

	#[inline]
	pub const fn is_null(&self) -> bool {
		self.distance == 0
	}

	/// Point at `target`. Null `target` makes the offset null.
	#[inline]
	pub fn store<T>(&mut self, target: *const T) {
		self.distance = if target.is_null() {
			0
		} else {
			(target as isize).wrapping_sub(self.addr() as isize)
		};
	}

	/// Point at whatever `other` points at, recomputing the distance
	/// for this offset's own address.
	#[inline]
	pub fn assign_from(&mut self, other: &Offset) {
		self.store(other.ptr::<u8>());
	}

	/// Target address, or null pointer.
	///
	/// Obtaining the pointer is safe. Dereferencing it is only valid if this
	/// `Offset` lives inside the buffer it was written into.
	#[inline]
	pub fn ptr<T>(&self) -> *const T {
		if self.is_null() {
			ptr::null()
		} else {
			(self as *const Self as *const u8).wrapping_offset(self.distance) as *const T
		}
	}

	/// Mutable target address, or null pointer.
	#[inline]
	pub fn ptr_mut<T>(&self) -> *mut T {
		self.ptr::<T>() as *mut T
	}

	#[inline]
	fn addr(&self) -> usize {
		self as *const Self as usize
	}

	/// Distance to encode in a field written at `field_pos` pointing at `data_pos`.
	///
	/// [`NULL_POS`] encodes as 0.
	#[inline]
	pub const fn encode(field_pos: usize, data_pos: usize) -> isize {
		if data_pos == NULL_POS {
			0
		} else {
			(data_pos as isize).wrapping_sub(field_pos as isize)
		}
	}
}

impl fmt::Debug for Offset {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_null() {
			f.write_str("Offset(null)")
		} else {
			write!(f, "Offset({:+})", self.distance)
		}
	}
}

/// FIFO of data positions.
///
/// Every non-trivial value pushes exactly one position during its data pass
/// and pops exactly one during its field pass, in the same order.
#[derive(Debug, Default)]
pub struct Offsets {
	queue: VecDeque<usize>,
}

impl Offsets {
	pub fn new() -> Self {
		Self::default()
	}

	#[inline]
	pub fn push(&mut self, pos: usize) {
		self.queue.push_back(pos);
	}

	/// Take the oldest position.
	///
	/// # Panics
	///
	/// Panics if queue is empty. That means a [`Serialize`](crate::Serialize)
	/// impl popped more positions in its field pass than it pushed in its data pass.
	#[inline]
	pub fn pop(&mut self) -> usize {
		match self.queue.pop_front() {
			Some(pos) => pos,
			None => panic!("offsets queue exhausted: field pass popped more than data pass pushed"),
		}
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.queue.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.queue.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn assign_from_retargets() {
		let values = [0u64, 1, 2, 3];
		let mut offsets = [Offset::null(), Offset::null()];
		offsets[0].store(&values[2] as *const u64);
		assert_eq!(offsets[0].ptr::<u64>(), &values[2] as *const u64);

		let (first, second) = offsets.split_at_mut(1);
		second[0].assign_from(&first[0]);
		assert_eq!(second[0].ptr::<u64>(), &values[2] as *const u64);
		assert_ne!(second[0].distance(), first[0].distance());
	}

	#[test]
	fn null() {
		let mut offset = Offset::default();
		assert!(offset.is_null());
		assert!(offset.ptr::<u8>().is_null());
		offset.store::<u8>(ptr::null());
		assert!(offset.is_null());
		assert_eq!(Offset::encode(16, NULL_POS), 0);
		assert_eq!(Offset::encode(16, 8), -8);
	}

	#[test]
	fn queue_is_fifo() {
		let mut offsets = Offsets::new();
		offsets.push(8);
		offsets.push(NULL_POS);
		offsets.push(24);
		assert_eq!(offsets.pop(), 8);
		assert_eq!(offsets.pop(), NULL_POS);
		assert_eq!(offsets.pop(), 24);
		assert!(offsets.is_empty());
	}

	#[test]
	#[should_panic(expected = "offsets queue exhausted")]
	fn queue_underflow_panics() {
		Offsets::new().pop();
	}
}
