use std::cell::Cell;

use crate::{util::is_aligned_to, util::WORD, Error, Result, WriterId};

const MAGIC: u32 = 0x0044_5450; // "PTD\0"
const HAS_POS: usize = 1;

/// Bookkeeping attached to every [`Shared`](crate::Shared) allocation.
///
/// Records which writer last started writing the pointee, and where it was
/// written. A pointee reached again by the same writer is not written again,
/// which both deduplicates shared nodes and stops recursion on cycles.
///
/// Positions of field records are always word-aligned, so bit 0 of the
/// stored position flags whether a position has been recorded.
#[repr(C)]
pub struct PointeeHeader {
	magic: u32,
	writer: Cell<Option<WriterId>>,
	pos: Cell<usize>,
}

impl PointeeHeader {
	pub(crate) fn new() -> Self {
		Self {
			magic: MAGIC,
			writer: Cell::new(None),
			pos: Cell::new(0),
		}
	}

	/// Fail if header is not intact.
	#[inline]
	pub(crate) fn check(&self) -> Result<()> {
		if self.magic != MAGIC {
			return Err(Error::CorruptPointee { magic: self.magic });
		}
		Ok(())
	}

	/// Writer which last began writing the pointee.
	#[inline]
	pub fn writer(&self) -> Option<WriterId> {
		self.writer.get()
	}

	/// Whether `writer` has already begun writing the pointee.
	#[inline]
	pub fn is_written_by(&self, writer: WriterId) -> bool {
		self.writer.get() == Some(writer)
	}

	/// Recorded position of pointee's field record, if any.
	#[inline]
	pub fn position(&self) -> Option<usize> {
		let pos = self.pos.get();
		(pos & HAS_POS != 0).then_some(pos & !HAS_POS)
	}

	#[inline]
	pub(crate) fn began_writing(&self, writer: WriterId) {
		self.writer.set(Some(writer));
	}

	/// Record position of pointee, unless one is already recorded.
	///
	/// Once set, position is kept: a layout pass assigns positions, and the
	/// real pass must land pointees on the same ones.
	pub(crate) fn ended_writing(&self, pos: usize) -> Result<()> {
		if !is_aligned_to(pos, WORD) {
			return Err(Error::MisalignedPointee { pos });
		}
		if self.position().is_none() {
			self.pos.set(pos | HAS_POS);
		}
		Ok(())
	}

	/// Forget writer and position.
	#[inline]
	pub(crate) fn reset(&self) {
		self.writer.set(None);
		self.pos.set(0);
	}

	/// Move recorded position forward by `delta`.
	#[inline]
	pub(crate) fn shift(&self, delta: usize) {
		if let Some(pos) = self.position() {
			self.pos.set((pos + delta) | HAS_POS);
		}
	}

	#[cfg(test)]
	pub(crate) fn corrupt(&mut self) {
		self.magic = 0xdead;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn position_set_once() {
		let header = PointeeHeader::new();
		assert_eq!(header.position(), None);
		header.ended_writing(16).unwrap();
		header.ended_writing(32).unwrap();
		assert_eq!(header.position(), Some(16));
		header.shift(8);
		assert_eq!(header.position(), Some(24));
		header.reset();
		assert_eq!(header.position(), None);
	}

	#[test]
	fn rejects_misaligned_position() {
		let header = PointeeHeader::new();
		assert!(matches!(header.ended_writing(3), Err(Error::MisalignedPointee { pos: 3 })));
	}

	#[test]
	fn tracks_writer() {
		let header = PointeeHeader::new();
		let (a, b) = (WriterId::next(), WriterId::next());
		header.began_writing(a);
		assert!(header.is_written_by(a));
		assert!(!header.is_written_by(b));
		assert_eq!(header.writer(), Some(a));
	}

	#[test]
	fn detects_bad_magic() {
		let mut header = PointeeHeader::new();
		assert!(header.check().is_ok());
		header.corrupt();
		assert!(matches!(header.check(), Err(Error::CorruptPointee { magic: 0xdead })));
	}
}
