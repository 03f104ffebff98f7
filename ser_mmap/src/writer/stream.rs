use std::io;

use tracing::trace;

use super::{Writer, WriterId};
use crate::{util::is_aligned_to, util::WORD, Result};

/// [`Writer`] which writes to any [`io::Write`] sink.
///
/// Positions are counted from where the writer starts, not from the start of
/// the underlying stream. Use [`with_position`](StreamWriter::with_position)
/// when appending to a stream which already has content.
///
/// ```
/// use ser_mmap::{storage::AlignedVec, StreamWriter, Writer};
///
/// let mut writer = StreamWriter::new(AlignedVec::<16>::new());
/// writer.write(&[1, 2, 3]).unwrap();
/// assert_eq!(writer.pos(), 3);
/// assert_eq!(writer.into_inner().as_slice(), &[1, 2, 3]);
/// ```
pub struct StreamWriter<W: io::Write> {
	sink: W,
	pos: usize,
	transient_pos: usize,
	id: WriterId,
}

impl<W: io::Write> StreamWriter<W> {
	pub fn new(sink: W) -> Self {
		Self::with_position(sink, 0)
	}

	/// Create writer for a sink which already contains `pos` bytes.
	///
	/// # Panics
	///
	/// Panics if `pos` is not word-aligned.
	pub fn with_position(sink: W, pos: usize) -> Self {
		assert!(is_aligned_to(pos, WORD), "start position must be word-aligned");
		Self {
			sink,
			pos,
			transient_pos: pos,
			id: WriterId::next(),
		}
	}

	pub fn get_ref(&self) -> &W {
		&self.sink
	}

	pub fn get_mut(&mut self) -> &mut W {
		&mut self.sink
	}

	/// Unwrap the sink. Does not flush.
	pub fn into_inner(self) -> W {
		self.sink
	}

	/// Flush underlying sink.
	pub fn flush(&mut self) -> Result<()> {
		self.sink.flush()?;
		Ok(())
	}

	/// Write `size` zero bytes at current position to form the transient
	/// region, and point transient cursor at its start.
	pub(crate) fn reserve_transient(&mut self, size: usize) -> Result<()> {
		debug_assert!(is_aligned_to(self.pos, WORD));
		self.transient_pos = self.pos;
		if size > 0 {
			trace!(pos = self.pos, size, "reserving transient region");
			self.write_zeroes(size)?;
		}
		Ok(())
	}
}

impl<W: io::Write> Writer for StreamWriter<W> {
	#[inline]
	fn pos(&self) -> usize {
		self.pos
	}

	#[inline]
	fn write(&mut self, bytes: &[u8]) -> Result<()> {
		self.sink.write_all(bytes)?;
		self.pos += bytes.len();
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
}
