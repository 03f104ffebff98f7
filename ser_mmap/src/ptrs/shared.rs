use std::{
	fmt,
	ops::Deref,
	rc::{Rc, Weak},
};

use tracing::trace;

use super::{MappedPtr, PointeeHeader};
use crate::{
	protocol::{write_offset, write_value},
	Offsets, Result, Serialize, Writer, NULL_POS,
};

/// Allocation of a shared value: header, then value.
#[repr(C)]
struct Pointee<T> {
	header: PointeeHeader,
	value: T,
}

/// Reference-counted pointer to a value which may be reachable by several
/// paths, including cycles.
///
/// However many times a `Shared` value is reached during one write, it is
/// written once, and every pointer to it in output points at that one copy.
///
/// Cycles are formed with [`Shared::new_cyclic`] and [`Back`] references.
///
/// A graph of `Shared` values must not be written by two writers at once
/// (which `Rc` already prevents across threads).
pub struct Shared<T>(Rc<Pointee<T>>);

impl<T> Shared<T> {
	pub fn new(value: T) -> Self {
		Self(Rc::new(Pointee {
			header: PointeeHeader::new(),
			value,
		}))
	}

	/// Create value which holds a [`Back`] reference to itself, or hands one
	/// to its children.
	///
	/// `Back` references cannot be upgraded until `init` returns.
	///
	/// ```
	/// use ser_mmap::{Back, Shared};
	///
	/// struct Node {
	/// 	me: Back<Node>,
	/// }
	///
	/// let node = Shared::new_cyclic(|me| Node { me: me.clone() });
	/// assert!(Shared::ptr_eq(&node.me.upgrade().unwrap(), &node));
	/// ```
	pub fn new_cyclic<F>(init: F) -> Self
	where F: FnOnce(&Back<T>) -> T {
		Self(Rc::new_cyclic(|weak| Pointee {
			header: PointeeHeader::new(),
			value: init(&Back(weak.clone())),
		}))
	}

	/// Create a [`Back`] reference to this value.
	pub fn downgrade(this: &Self) -> Back<T> {
		Back(Rc::downgrade(&this.0))
	}

	/// Whether `a` and `b` point to same allocation.
	pub fn ptr_eq(a: &Self, b: &Self) -> bool {
		Rc::ptr_eq(&a.0, &b.0)
	}

	/// Mutable access to value, if there are no other `Shared` or `Back`
	/// references to it.
	pub fn get_mut(this: &mut Self) -> Option<&mut T> {
		Rc::get_mut(&mut this.0).map(|pointee| &mut pointee.value)
	}

	pub fn header(this: &Self) -> &PointeeHeader {
		&this.0.header
	}

	/// Write pointee, unless `writer` has already written it.
	/// Returns position of pointee's field record.
	fn write_pointee<W: Writer + ?Sized>(&self, writer: &mut W) -> Result<usize>
	where T: Serialize {
		let header = &self.0.header;
		header.check()?;

		if writer.has_written(header) {
			trace!(pos = ?header.position(), "pointee already written");
		} else {
			writer.begin_pointee(header);
			header.began_writing(writer.id());
			let pos = write_value(writer, &self.0.value)?;
			header.ended_writing(pos)?;
		}

		// Only a pointee still being written by a writer which did no layout
		// pass can lack a position
		Ok(header.position().unwrap_or(NULL_POS))
	}
}

impl<T> Deref for Shared<T> {
	type Target = T;

	#[inline]
	fn deref(&self) -> &T {
		&self.0.value
	}
}

impl<T> Clone for Shared<T> {
	#[inline]
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Shared").field(&self.0.value).finish()
	}
}

impl<T: Serialize> Serialize for Shared<T> {
	type Mapped = MappedPtr<T::Mapped>;

	fn write_data<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		offsets.push(self.write_pointee(writer)?);
		Ok(())
	}

	fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		write_offset(writer, offsets.pop())?;
		Ok(())
	}
}

/// Weak reference to a [`Shared`] value, for pointing back up a tree.
///
/// Written as a pointer to the shared value. If the value has been dropped,
/// written as null.
pub struct Back<T>(Weak<Pointee<T>>);

impl<T> Back<T> {
	/// Reference to nothing. Written as null.
	pub fn new() -> Self {
		Self(Weak::new())
	}

	pub fn upgrade(&self) -> Option<Shared<T>> {
		self.0.upgrade().map(Shared)
	}
}

impl<T> Default for Back<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Clone for Back<T> {
	#[inline]
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl<T> fmt::Debug for Back<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("(Back)")
	}
}

impl<T: Serialize> Serialize for Back<T> {
	type Mapped = MappedPtr<T::Mapped>;

	fn write_data<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		let pos = match self.upgrade() {
			Some(shared) => shared.write_pointee(writer)?,
			None => NULL_POS,
		};
		offsets.push(pos);
		Ok(())
	}

	fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		write_offset(writer, offsets.pop())?;
		Ok(())
	}
}
