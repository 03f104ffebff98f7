//! Output sinks.
//!
//! A [`Writer`] tracks two cursors: the main position, advanced by every byte
//! written, and the transient position, which hands out space in the region
//! reserved for [`Transient`](crate::Transient) values.

use std::{
	sync::atomic::{AtomicU64, Ordering},
	thread::{self, ThreadId},
};

use crate::{ptrs::PointeeHeader, Result};

mod layout;
mod stream;
pub use layout::LayoutWriter;
pub use stream::StreamWriter;

/// Identity of a writer instance.
///
/// Unique among all writers created in the process. Pointee headers record
/// which writer last wrote them, so a node reached a second time by the same
/// writer is not written again.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct WriterId {
	serial: u64,
	thread: ThreadId,
}

impl WriterId {
	/// Allocate a fresh identity.
	pub fn next() -> Self {
		static COUNTER: AtomicU64 = AtomicU64::new(0);
		Self {
			serial: COUNTER.fetch_add(1, Ordering::Relaxed),
			thread: thread::current().id(),
		}
	}
}

/// Sink which serialized output is written to.
pub trait Writer {
	/// Current position in output.
	fn pos(&self) -> usize;

	/// Append `bytes` to output.
	fn write(&mut self, bytes: &[u8]) -> Result<()>;

	/// Next free position in transient region.
	fn transient_pos(&self) -> usize;

	/// Claim `size` bytes of transient region. Writes nothing.
	fn put_transient(&mut self, size: usize);

	/// Identity of this writer.
	fn id(&self) -> WriterId;

	/// Whether pointee has already been written (or is being written) to this
	/// writer's output.
	#[inline]
	fn has_written(&self, header: &PointeeHeader) -> bool {
		header.is_written_by(self.id())
	}

	/// Called just before a shared pointee is written.
	#[allow(unused_variables)]
	fn begin_pointee(&mut self, header: &PointeeHeader) {}

	/// Append `count` zero bytes.
	fn write_zeroes(&mut self, mut count: usize) -> Result<()> {
		const ZEROES: [u8; 64] = [0; 64];
		while count > 0 {
			let len = count.min(ZEROES.len());
			self.write(&ZEROES[..len])?;
			count -= len;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ids_are_unique() {
		let ids = (0..100).map(|_| WriterId::next()).collect::<Vec<_>>();
		for (index, id) in ids.iter().enumerate() {
			assert!(ids[index + 1..].iter().all(|other| other != id));
		}
	}

	#[test]
	fn ids_unique_across_threads() {
		let here = WriterId::next();
		let there = thread::spawn(WriterId::next).join().unwrap();
		assert_ne!(here, there);
	}
}
