//! Sorted sequences: mapped forms of `BTreeMap` and `BTreeSet`.
//!
//! Entries are written in the order the standalone collection iterates them,
//! which is ascending key order. Lookups are binary searches.

use std::{
	borrow::Borrow,
	collections::{BTreeMap, BTreeSet},
	fmt,
	marker::PhantomData,
	ops::{Deref, Index, Range},
	slice,
};

use crate::{
	impls::{MappedPair, PairRef},
	protocol::{write_range, write_ref},
	Error, FormatVersion, FromMapped, MappedVec, Offsets, Result, Serialize, Versioned, Versions,
	Writer, NULL_POS,
};

/// Projects the key an entry is ordered or hashed by.
pub trait KeyOf<E> {
	type Key: ?Sized;

	fn key(entry: &E) -> &Self::Key;
}

/// Entry is its own key (sets).
pub struct Identity;

impl<T> KeyOf<T> for Identity {
	type Key = T;

	#[inline]
	fn key(entry: &T) -> &T {
		entry
	}
}

/// Entry is a pair keyed by its first element (maps).
pub struct First;

impl<K, V> KeyOf<MappedPair<K, V>> for First {
	type Key = K;

	#[inline]
	fn key(entry: &MappedPair<K, V>) -> &K {
		&entry.0
	}
}

/// Sequence of entries in ascending order of key projected by `S`.
///
/// Queries take any `Q` the key can be borrowed as, as `BTreeMap` does,
/// so a map keyed by [`MappedString`](crate::MappedString) can be searched
/// with a `&str`.
#[repr(C)]
pub struct SortedSeq<E, S> {
	entries: MappedVec<E>,
	marker: PhantomData<S>,
}

impl<E, S: KeyOf<E>> SortedSeq<E, S> {
	#[inline]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	#[inline]
	pub fn as_slice(&self) -> &[E] {
		self.entries.as_slice()
	}

	#[inline]
	pub fn iter(&self) -> slice::Iter<'_, E> {
		self.entries.iter()
	}

	/// Index of first entry whose key is not less than `key`.
	pub fn lower_bound<Q>(&self, key: &Q) -> usize
	where
		S::Key: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.as_slice().partition_point(|entry| S::key(entry).borrow() < key)
	}

	/// Index of first entry whose key is greater than `key`.
	pub fn upper_bound<Q>(&self, key: &Q) -> usize
	where
		S::Key: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.as_slice().partition_point(|entry| S::key(entry).borrow() <= key)
	}

	/// Range of indexes of entries whose key equals `key`.
	pub fn equal_range<Q>(&self, key: &Q) -> Range<usize>
	where
		S::Key: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		let start = self.lower_bound(key);
		let len = self.as_slice()[start..].partition_point(|entry| S::key(entry).borrow() <= key);
		start..start + len
	}

	/// Entry with key equal to `key`.
	pub fn find<Q>(&self, key: &Q) -> Option<&E>
	where
		S::Key: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		let index = self.lower_bound(key);
		self.as_slice().get(index).filter(|entry| S::key(entry).borrow() == key)
	}

	/// Number of entries with key equal to `key`.
	pub fn count<Q>(&self, key: &Q) -> usize
	where
		S::Key: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.equal_range(key).len()
	}

	pub fn contains<Q>(&self, key: &Q) -> bool
	where
		S::Key: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.find(key).is_some()
	}
}

impl<E: fmt::Debug, S> fmt::Debug for SortedSeq<E, S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&self.entries, f)
	}
}

impl<E: PartialEq, S> PartialEq for SortedSeq<E, S> {
	fn eq(&self, other: &Self) -> bool {
		self.entries == other.entries
	}
}

impl<E: Eq, S> Eq for SortedSeq<E, S> {}

/// Mapped form of [`BTreeMap<K, V>`].
#[repr(transparent)]
pub struct MappedMap<K, V> {
	seq: SortedSeq<MappedPair<K, V>, First>,
}

impl<K, V> MappedMap<K, V> {
	/// Value for `key`.
	pub fn get<Q>(&self, key: &Q) -> Option<&V>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.seq.find(key).map(|entry| &entry.1)
	}

	/// Value for `key`, or [`Error::KeyNotFound`].
	pub fn at<Q>(&self, key: &Q) -> Result<&V>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.get(key).ok_or(Error::KeyNotFound)
	}

	/// Value for `key`, or `default`.
	pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.get(key).unwrap_or(default)
	}

	pub fn contains_key<Q>(&self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.seq.contains(key)
	}

	/// Iterate entries in key order.
	pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
		self.seq.iter().map(|entry| (&entry.0, &entry.1))
	}

	pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
		self.seq.iter().map(|entry| &entry.0)
	}

	pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
		self.seq.iter().map(|entry| &entry.1)
	}
}

impl<K, V> Deref for MappedMap<K, V> {
	type Target = SortedSeq<MappedPair<K, V>, First>;

	#[inline]
	fn deref(&self) -> &Self::Target {
		&self.seq
	}
}

/// # Panics
///
/// Panics if `key` is not in map.
impl<K, V, Q> Index<&Q> for MappedMap<K, V>
where
	K: Borrow<Q>,
	Q: Ord + ?Sized,
{
	type Output = V;

	fn index(&self, key: &Q) -> &V {
		match self.get(key) {
			Some(value) => value,
			None => panic!("{}", Error::KeyNotFound),
		}
	}
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MappedMap<K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}

impl<K: PartialEq, V: PartialEq> PartialEq for MappedMap<K, V> {
	fn eq(&self, other: &Self) -> bool {
		self.seq == other.seq
	}
}

impl<K: Eq, V: Eq> Eq for MappedMap<K, V> {}

impl<K: Versioned, V: Versioned> Versioned for MappedMap<K, V> {
	fn format_version(versions: &mut Versions) -> Option<FormatVersion> {
		Some(versions.dependent2::<K, V>("map"))
	}
}

/// Mapped form of [`BTreeSet<T>`].
#[repr(transparent)]
pub struct MappedSet<T> {
	seq: SortedSeq<T, Identity>,
}

impl<T> Deref for MappedSet<T> {
	type Target = SortedSeq<T, Identity>;

	#[inline]
	fn deref(&self) -> &Self::Target {
		&self.seq
	}
}

impl<'a, T> IntoIterator for &'a MappedSet<T> {
	type Item = &'a T;
	type IntoIter = slice::Iter<'a, T>;

	#[inline]
	fn into_iter(self) -> slice::Iter<'a, T> {
		self.seq.iter()
	}
}

impl<T: fmt::Debug> fmt::Debug for MappedSet<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.seq.iter()).finish()
	}
}

impl<T: PartialEq> PartialEq for MappedSet<T> {
	fn eq(&self, other: &Self) -> bool {
		self.seq == other.seq
	}
}

impl<T: Eq> Eq for MappedSet<T> {}

impl<T: Versioned> Versioned for MappedSet<T> {
	fn format_version(versions: &mut Versions) -> Option<FormatVersion> {
		Some(versions.dependent::<T>("set"))
	}
}

impl<K: Serialize, V: Serialize> Serialize for BTreeMap<K, V> {
	type Mapped = MappedMap<K::Mapped, V::Mapped>;

	fn write_data<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		let pos = if self.is_empty() {
			NULL_POS
		} else {
			write_range(writer, self.iter().map(|(key, value)| PairRef(key, value)))?
		};
		offsets.push(pos);
		Ok(())
	}

	fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		write_ref(writer, offsets.pop(), self.len())?;
		Ok(())
	}
}

impl<K: FromMapped + Ord, V: FromMapped> FromMapped for BTreeMap<K, V> {
	fn from_mapped(mapped: &Self::Mapped) -> Self {
		mapped
			.iter()
			.map(|(key, value)| (K::from_mapped(key), V::from_mapped(value)))
			.collect()
	}
}

impl<T: Serialize> Serialize for BTreeSet<T> {
	type Mapped = MappedSet<T::Mapped>;

	fn write_data<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		let pos = if self.is_empty() {
			NULL_POS
		} else {
			write_range(writer, self.iter())?
		};
		offsets.push(pos);
		Ok(())
	}

	fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		write_ref(writer, offsets.pop(), self.len())?;
		Ok(())
	}
}

impl<T: FromMapped + Ord> FromMapped for BTreeSet<T> {
	fn from_mapped(mapped: &Self::Mapped) -> Self {
		mapped.iter().map(T::from_mapped).collect()
	}
}
