//! Bucketed hash tables: mapped forms of `HashMap` and `HashSet`.
//!
//! Layout is `bucket_count + 1` relative pointers into one contiguous run of
//! entries. Entries of bucket `i` lie between pointers `i` and `i + 1`, in
//! the order the standalone collection yielded them. Final pointer marks end
//! of entries.
//!
//! Keys are hashed with [`FxHasher`], which is stable between runs, so
//! tables can be searched by any process mapping the buffer. The key's `Hash`
//! impl must produce the same hash for standalone and mapped forms, which
//! holds for all types this crate provides.

use std::{
	borrow::Borrow,
	collections::{HashMap, HashSet},
	fmt,
	hash::{BuildHasher, Hash, Hasher},
	marker::PhantomData,
	mem,
	ops::{Deref, Index},
	ptr::NonNull,
	slice,
};

use rustc_hash::FxHasher;
use tracing::trace;

use super::sorted::{First, Identity, KeyOf};
use crate::{
	impls::{MappedPair, PairRef},
	padding::align,
	protocol::{write_offset, write_ref},
	Error, FormatVersion, FromMapped, MappedVec, Offset, Offsets, Result, Serialize, Versioned,
	Versions, Writer, NULL_POS,
};

/// Hash of `key`, as used to place entries in buckets.
#[inline]
pub fn hash_of<Q: Hash + ?Sized>(key: &Q) -> u64 {
	let mut hasher = FxHasher::default();
	key.hash(&mut hasher);
	hasher.finish()
}

#[inline]
fn bucket_for<Q: Hash + ?Sized>(key: &Q, bucket_count: usize) -> usize {
	(hash_of(key) % bucket_count as u64) as usize
}

/// Hash table of entries keyed by key projected by `S`.
#[repr(C)]
pub struct HashTable<E, S> {
	buckets: MappedVec<Offset>,
	marker: PhantomData<(E, S)>,
}

impl<E, S: KeyOf<E>> HashTable<E, S> {
	/// Number of buckets. 0 if table is empty.
	#[inline]
	pub fn bucket_count(&self) -> usize {
		self.buckets.len().saturating_sub(1)
	}

	/// Entries in bucket `index`.
	///
	/// # Panics
	///
	/// Panics if `index >= bucket_count()`.
	pub fn bucket(&self, index: usize) -> &[E] {
		let start = self.buckets[index].ptr::<E>();
		let end = self.buckets[index + 1].ptr::<E>();
		// SAFETY: Bucket pointers point into one run of entries, in ascending order
		unsafe { entries_between(start, end) }
	}

	/// All entries, in bucket order.
	pub fn entries(&self) -> &[E] {
		match (self.buckets.first(), self.buckets.last()) {
			(Some(first), Some(last)) => {
				// SAFETY: As for `bucket`
				unsafe { entries_between(first.ptr::<E>(), last.ptr::<E>()) }
			}
			_ => &[],
		}
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.entries().len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.buckets.is_empty()
	}

	#[inline]
	pub fn iter(&self) -> slice::Iter<'_, E> {
		self.entries().iter()
	}

	/// Bucket `key` belongs in. `None` if table has no buckets.
	pub fn bucket_index<Q: Hash + ?Sized>(&self, key: &Q) -> Option<usize> {
		match self.bucket_count() {
			0 => None,
			count => Some(bucket_for(key, count)),
		}
	}

	/// Entry with key equal to `key`.
	pub fn find<Q>(&self, key: &Q) -> Option<&E>
	where
		S::Key: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		let index = self.bucket_index(key)?;
		self.bucket(index).iter().find(|entry| S::key(entry).borrow() == key)
	}

	/// Number of entries with key equal to `key`.
	pub fn count<Q>(&self, key: &Q) -> usize
	where
		S::Key: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		match self.bucket_index(key) {
			Some(index) => self.bucket(index).iter().filter(|entry| S::key(entry).borrow() == key).count(),
			None => 0,
		}
	}

	pub fn contains<Q>(&self, key: &Q) -> bool
	where
		S::Key: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		self.find(key).is_some()
	}

	/// Check every entry is in the bucket its key hashes to.
	///
	/// # Errors
	///
	/// [`Error::BucketMismatch`] for first misplaced entry.
	pub fn validate(&self) -> Result<()>
	where S::Key: Hash {
		for bucket in 0..self.bucket_count() {
			for entry in self.bucket(bucket) {
				let expected = bucket_for(S::key(entry), self.bucket_count());
				if expected != bucket {
					return Err(Error::BucketMismatch { bucket, expected });
				}
			}
		}
		Ok(())
	}
}

/// # Safety
///
/// `start` and `end` must point into the same run of `E`s, with `start <= end`.
///
/// Zero-sized entries occupy one byte each in the buffer (see [`write_table`]).
unsafe fn entries_between<'a, E>(start: *const E, end: *const E) -> &'a [E] {
	let size = mem::size_of::<E>();
	let len = (end as usize - start as usize) / size.max(1);
	if len == 0 {
		&[]
	} else if size == 0 {
		slice::from_raw_parts(NonNull::dangling().as_ptr(), len)
	} else {
		slice::from_raw_parts(start, len)
	}
}

impl<E: fmt::Debug, S: KeyOf<E>> fmt::Debug for HashTable<E, S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.iter()).finish()
	}
}

/// Write entries grouped by bucket, then bucket table.
///
/// `entries` are `(bucket, entry)` pairs. Entries of same bucket keep their
/// relative order. Returns position of bucket table, or [`NULL_POS`] if
/// `entries` is empty.
pub(crate) fn write_table<E, W>(
	writer: &mut W,
	mut entries: Vec<(usize, E)>,
	bucket_count: usize,
) -> Result<usize>
where
	E: Serialize,
	W: Writer + ?Sized,
{
	if entries.is_empty() {
		return Ok(NULL_POS);
	}
	debug_assert!(entries.iter().all(|&(bucket, _)| bucket < bucket_count));

	// Stable sort, so order within bucket is preserved
	entries.sort_by_key(|&(bucket, _)| bucket);

	let mut offsets = Offsets::new();
	for (_, entry) in &entries {
		entry.write_data(writer, &mut offsets)?;
	}
	align(writer)?;

	// Zero-sized entries get a byte each, so bucket pointers still count them
	let zero_sized = mem::size_of::<E::Mapped>() == 0;
	let mut bucket_starts = Vec::with_capacity(bucket_count + 1);
	for (bucket, entry) in &entries {
		while bucket_starts.len() <= *bucket {
			bucket_starts.push(writer.pos());
		}
		entry.write_field(writer, &mut offsets)?;
		if zero_sized {
			writer.write(&[0])?;
		}
	}
	// Empty trailing buckets, and end marker
	while bucket_starts.len() <= bucket_count {
		bucket_starts.push(writer.pos());
	}
	align(writer)?;

	let pos = writer.pos();
	for start in bucket_starts {
		write_offset(writer, start)?;
	}
	trace!(pos, entries = entries.len(), bucket_count, "wrote hash table");
	Ok(pos)
}

/// Bucket count for a standalone table: its capacity, so a table built with
/// `with_capacity(n)` gets at least `n` buckets.
#[inline]
fn bucket_count_for(len: usize, capacity: usize) -> usize {
	if len == 0 {
		0
	} else {
		capacity.max(len)
	}
}

#[inline]
fn table_len(bucket_count: usize) -> usize {
	if bucket_count == 0 {
		0
	} else {
		bucket_count + 1
	}
}

/// Mapped form of [`HashMap<K, V>`].
#[repr(transparent)]
pub struct MappedHashMap<K, V> {
	table: HashTable<MappedPair<K, V>, First>,
}

impl<K, V> MappedHashMap<K, V> {
	/// Value for `key`.
	pub fn get<Q>(&self, key: &Q) -> Option<&V>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		self.table.find(key).map(|entry| &entry.1)
	}

	/// Value for `key`, or [`Error::KeyNotFound`].
	pub fn at<Q>(&self, key: &Q) -> Result<&V>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		self.get(key).ok_or(Error::KeyNotFound)
	}

	/// Value for `key`, or `default`.
	pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		self.get(key).unwrap_or(default)
	}

	pub fn contains_key<Q>(&self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		self.table.contains(key)
	}

	/// Iterate entries in bucket order.
	pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
		self.table.iter().map(|entry| (&entry.0, &entry.1))
	}
}

impl<K, V> Deref for MappedHashMap<K, V> {
	type Target = HashTable<MappedPair<K, V>, First>;

	#[inline]
	fn deref(&self) -> &Self::Target {
		&self.table
	}
}

/// # Panics
///
/// Panics if `key` is not in map.
impl<K, V, Q> Index<&Q> for MappedHashMap<K, V>
where
	K: Borrow<Q>,
	Q: Hash + Eq + ?Sized,
{
	type Output = V;

	fn index(&self, key: &Q) -> &V {
		match self.get(key) {
			Some(value) => value,
			None => panic!("{}", Error::KeyNotFound),
		}
	}
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MappedHashMap<K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}

impl<K: Versioned, V: Versioned> Versioned for MappedHashMap<K, V> {
	fn format_version(versions: &mut Versions) -> Option<FormatVersion> {
		Some(versions.dependent2::<K, V>("unordered_map"))
	}
}

/// Mapped form of [`HashSet<T>`].
#[repr(transparent)]
pub struct MappedHashSet<T> {
	table: HashTable<T, Identity>,
}

impl<T> Deref for MappedHashSet<T> {
	type Target = HashTable<T, Identity>;

	#[inline]
	fn deref(&self) -> &Self::Target {
		&self.table
	}
}

impl<T: fmt::Debug> fmt::Debug for MappedHashSet<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.table.iter()).finish()
	}
}

impl<T: Versioned> Versioned for MappedHashSet<T> {
	fn format_version(versions: &mut Versions) -> Option<FormatVersion> {
		Some(versions.dependent::<T>("unordered_set"))
	}
}

impl<K, V, H> Serialize for HashMap<K, V, H>
where
	K: Serialize + Hash,
	V: Serialize,
{
	type Mapped = MappedHashMap<K::Mapped, V::Mapped>;

	fn write_data<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		let bucket_count = bucket_count_for(self.len(), self.capacity());
		let entries = self
			.iter()
			.map(|(key, value)| (bucket_for(key, bucket_count), PairRef(key, value)))
			.collect();
		offsets.push(write_table(writer, entries, bucket_count)?);
		Ok(())
	}

	fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		let bucket_count = bucket_count_for(self.len(), self.capacity());
		write_ref(writer, offsets.pop(), table_len(bucket_count))?;
		Ok(())
	}
}

impl<K, V, H> FromMapped for HashMap<K, V, H>
where
	K: FromMapped + Hash + Eq,
	V: FromMapped,
	H: BuildHasher + Default,
{
	fn from_mapped(mapped: &Self::Mapped) -> Self {
		let mut map = HashMap::with_capacity_and_hasher(mapped.len(), H::default());
		map.extend(mapped.iter().map(|(key, value)| (K::from_mapped(key), V::from_mapped(value))));
		map
	}
}

impl<T, H> Serialize for HashSet<T, H>
where T: Serialize + Hash
{
	type Mapped = MappedHashSet<T::Mapped>;

	fn write_data<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		let bucket_count = bucket_count_for(self.len(), self.capacity());
		let entries = self.iter().map(|item| (bucket_for(item, bucket_count), item)).collect();
		offsets.push(write_table(writer, entries, bucket_count)?);
		Ok(())
	}

	fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		let bucket_count = bucket_count_for(self.len(), self.capacity());
		write_ref(writer, offsets.pop(), table_len(bucket_count))?;
		Ok(())
	}
}

impl<T, H> FromMapped for HashSet<T, H>
where
	T: FromMapped + Hash + Eq,
	H: BuildHasher + Default,
{
	fn from_mapped(mapped: &Self::Mapped) -> Self {
		let mut set = HashSet::with_capacity_and_hasher(mapped.len(), H::default());
		set.extend(mapped.iter().map(T::from_mapped));
		set
	}
}
