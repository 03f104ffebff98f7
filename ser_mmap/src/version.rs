//! Format version fingerprints.
//!
//! Every mapped type has a fingerprint computed from its shape. Safe writes
//! store the fingerprint of the top-level type in front of it, and
//! [`safe_cast`](crate::safe_cast) refuses to read a buffer whose fingerprint
//! differs from the requested type's.

use std::{
	any::{type_name, TypeId},
	mem,
};

use rustc_hash::FxHashSet;

/// Fingerprint of a mapped type's layout. One native word.
pub type FormatVersion = usize;

/// Fingerprint contributions of a mapped type.
///
/// Resolution order:
///
/// 1. [`enforce_version`](Versioned::enforce_version), if `Some`, is used as is.
/// 2. Otherwise a base is computed from [`field_versions`](Versioned::field_versions)
///    and, for [`ATOMIC`](Versioned::ATOMIC) types, the type's name and size.
/// 3. [`format_version`](Versioned::format_version), if `Some`, is combined with that base.
pub trait Versioned: 'static {
	/// Type is a leaf whose name and size identify its layout.
	const ATOMIC: bool = false;

	#[allow(unused_variables)]
	fn enforce_version(versions: &mut Versions) -> Option<FormatVersion> {
		None
	}

	#[allow(unused_variables)]
	fn format_version(versions: &mut Versions) -> Option<FormatVersion> {
		None
	}

	/// Fold of field fingerprints, in field order.
	#[allow(unused_variables)]
	fn field_versions(versions: &mut Versions) -> Option<FormatVersion> {
		None
	}
}

/// Fingerprint calculator.
///
/// Tracks types currently being resolved, so a type which contains itself
/// (directly, or through a cycle of types) resolves to [`Versions::RECURSIVE`]
/// at the point of recursion rather than looping.
///
/// ```
/// use ser_mmap::{MappedVec, Versions};
///
/// let mut versions = Versions::new();
/// assert_ne!(versions.get::<MappedVec<u32>>(), versions.get::<MappedVec<i32>>());
/// assert_eq!(versions.get::<u32>(), Versions::new().get::<u32>());
/// ```
#[derive(Debug, Default)]
pub struct Versions {
	resolving: FxHashSet<TypeId>,
}

impl Versions {
	/// Fingerprint substituted for a type found inside itself.
	pub const RECURSIVE: FormatVersion = Self::hash("recursive");

	pub fn new() -> Self {
		Self::default()
	}

	/// Fingerprint of mapped type `T`.
	pub fn get<T: Versioned>(&mut self) -> FormatVersion {
		let id = TypeId::of::<T>();
		if !self.resolving.insert(id) {
			return Self::RECURSIVE;
		}
		let version = self.resolve::<T>();
		self.resolving.remove(&id);
		version
	}

	fn resolve<T: Versioned>(&mut self) -> FormatVersion {
		if let Some(version) = T::enforce_version(self) {
			return version;
		}

		let leaf = if T::ATOMIC {
			Self::combine(Self::hash(type_name::<T>()), mem::size_of::<T>())
		} else {
			0
		};
		let base = match T::field_versions(self) {
			Some(fields) => Self::combine(fields, leaf),
			None => leaf,
		};

		match T::format_version(self) {
			Some(version) => Self::combine(version, base),
			None => base,
		}
	}

	/// Fingerprint of a container of `T`, distinguished by `salt`.
	pub fn dependent<T: Versioned>(&mut self, salt: &str) -> FormatVersion {
		Self::combine(self.get::<T>(), Self::hash(salt))
	}

	/// Fingerprint of a container of `T1` and `T2`, distinguished by `salt`.
	///
	/// Folds `T1` then `T2` as fields are folded, so swapping them changes the result.
	pub fn dependent2<T1: Versioned, T2: Versioned>(&mut self, salt: &str) -> FormatVersion {
		let first = Self::combine(0, self.get::<T1>());
		let both = Self::combine(first, self.get::<T2>());
		Self::combine(both, Self::hash(salt))
	}

	/// Order-sensitive mix of two fingerprints.
	#[inline]
	pub const fn combine(lhs: FormatVersion, rhs: FormatVersion) -> FormatVersion {
		lhs.wrapping_mul(478278233).wrapping_add(rhs)
	}

	/// Hash of a string.
	pub const fn hash(s: &str) -> FormatVersion {
		let bytes = s.as_bytes();
		let mut hash: FormatVersion = 0;
		let mut index = 0;
		while index < bytes.len() {
			let mix = (bytes[index] as FormatVersion)
				.wrapping_add(0x9e3779b9)
				.wrapping_add(hash << 6)
				.wrapping_add(hash >> 2);
			hash ^= mix;
			index += 1;
		}
		hash
	}
}
