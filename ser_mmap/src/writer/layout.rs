use std::ptr::NonNull;

use super::{Writer, WriterId};
use crate::{ptrs::PointeeHeader, Result};

/// Dry-run [`Writer`] which emits nothing.
///
/// Run over a value before the real write to learn the size of the transient
/// region, and to assign positions to shared pointees. Those positions are
/// computed as if the transient region were empty, so once its size is known
/// they must be shifted with [`shift_pointees`](LayoutWriter::shift_pointees).
pub struct LayoutWriter {
	pos: usize,
	transient_pos: usize,
	id: WriterId,
	parent: WriterId,
	pointees: Vec<NonNull<PointeeHeader>>,
}

impl LayoutWriter {
	/// Create layout writer starting from `parent`'s current position.
	pub fn new<W: Writer + ?Sized>(parent: &W) -> Self {
		Self {
			pos: parent.pos(),
			transient_pos: 0,
			id: WriterId::next(),
			parent: parent.id(),
			pointees: Vec::new(),
		}
	}

	/// Bytes of transient region claimed during layout.
	#[inline]
	pub fn transient_size(&self) -> usize {
		self.transient_pos
	}

	/// Number of pointees this layout assigned positions to.
	#[inline]
	pub fn pointee_count(&self) -> usize {
		self.pointees.len()
	}

	/// Shift positions of all pointees laid out by this writer by `delta`.
	///
	/// # Safety
	///
	/// Every pointee passed to [`begin_pointee`](Writer::begin_pointee) must
	/// still be alive. This holds if the value laid out is still borrowed.
	pub unsafe fn shift_pointees(&self, delta: usize) {
		if delta == 0 {
			return;
		}
		for header in &self.pointees {
			header.as_ref().shift(delta);
		}
	}
}

impl Writer for LayoutWriter {
	#[inline]
	fn pos(&self) -> usize {
		self.pos
	}

	#[inline]
	fn write(&mut self, bytes: &[u8]) -> Result<()> {
		self.pos += bytes.len();
		Ok(())
	}

	#[inline]
	fn write_zeroes(&mut self, count: usize) -> Result<()> {
		self.pos += count;
		Ok(())
	}

	#[inline]
	fn transient_pos(&self) -> usize {
		self.transient_pos
	}

	#[inline]
	fn put_transient(&mut self, size: usize) {
		self.transient_pos += size;
	}

	#[inline]
	fn id(&self) -> WriterId {
		self.id
	}

	/// Pointees the parent finished writing earlier are already in its output.
	fn has_written(&self, header: &PointeeHeader) -> bool {
		match header.writer() {
			Some(writer) if writer == self.id => true,
			Some(writer) if writer == self.parent => header.position().is_some(),
			_ => false,
		}
	}

	/// Pointees last written by another writer hold positions in another
	/// buffer. Forget those and remember the pointee so its new position can be
	/// shifted once transient size is known.
	fn begin_pointee(&mut self, header: &PointeeHeader) {
		header.reset();
		self.pointees.push(NonNull::from(header));
	}
}
