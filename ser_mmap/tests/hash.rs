use std::collections::{HashMap, HashSet};

use rand::Rng;

mod common;
use common::{random_string, rng, serialize};
use ser_mmap::{
	hash_of, safe_cast, safe_read, Error, MappedHashMap, MappedHashSet, MappedString, Serialize,
};

#[test]
fn entries_placed_in_hashed_bucket() {
	for capacity in [1, 3, 10, 100, 1000] {
		let mut map = HashMap::with_capacity(capacity);
		for key in 0..capacity as u64 {
			map.insert(key * 7919, key);
		}
		let (_, buf) = serialize(&map);
		let mapped = unsafe { safe_cast::<MappedHashMap<u64, u64>>(&buf) }.unwrap();

		assert_eq!(mapped.len(), map.len());
		assert_eq!(mapped.bucket_count(), map.capacity());
		mapped.validate().unwrap();

		let bucket_count = mapped.bucket_count();
		let mut seen = 0;
		for index in 0..bucket_count {
			for entry in mapped.bucket(index) {
				assert_eq!((hash_of(&entry.0) % bucket_count as u64) as usize, index);
				assert_eq!(mapped.bucket_index(&entry.0), Some(index));
				seen += 1;
			}
		}
		assert_eq!(seen, map.len());
	}
}

#[test]
fn lookups_match_source() {
	let mut rng = rng(500);
	let map: HashMap<u32, i64> = (0..2000).map(|_| (rng.gen_range(0..5000), rng.gen())).collect();
	let (_, buf) = serialize(&map);
	let mapped = unsafe { safe_cast::<MappedHashMap<u32, i64>>(&buf) }.unwrap();

	assert_eq!(mapped.len(), map.len());
	for key in 0..5000u32 {
		assert_eq!(mapped.get(&key), map.get(&key));
		assert_eq!(mapped.contains_key(&key), map.contains_key(&key));
		assert_eq!(mapped.count(&key), usize::from(map.contains_key(&key)));
		if let Some(value) = map.get(&key) {
			assert_eq!(mapped.at(&key).unwrap(), value);
			assert_eq!(mapped[&key], *value);
		} else {
			assert!(matches!(mapped.at(&key), Err(Error::KeyNotFound)));
			assert_eq!(*mapped.get_or(&key, &-1), -1);
		}
	}

	let mut pairs: Vec<(u32, i64)> = mapped.iter().map(|(&key, &value)| (key, value)).collect();
	let mut expected: Vec<(u32, i64)> = map.into_iter().collect();
	pairs.sort_unstable();
	expected.sort_unstable();
	assert_eq!(pairs, expected);
}

#[test]
fn string_keys_searched_by_str() {
	let mut rng = rng(600);
	let map: HashMap<String, usize> =
		(0..500).map(|index| (random_string(&mut rng, 10), index)).collect();
	let (_, buf) = serialize(&map);
	let mapped = unsafe { safe_cast::<MappedHashMap<MappedString, usize>>(&buf) }.unwrap();
	mapped.validate().unwrap();

	for (key, value) in &map {
		assert_eq!(mapped.get(key.as_str()), Some(value));
	}
	assert!(mapped.get("not alphanumeric!").is_none());
}

#[test]
fn set_contains() {
	let set: HashSet<String> = ["one", "two", "three", "four", "five"]
		.into_iter()
		.map(String::from)
		.collect();
	let (_, buf) = serialize(&set);
	let mapped = unsafe { safe_cast::<MappedHashSet<MappedString>>(&buf) }.unwrap();

	assert_eq!(mapped.len(), 5);
	for item in &set {
		assert!(mapped.contains(item.as_str()));
		assert_eq!(mapped.find(item.as_str()).map(MappedString::as_str), Some(item.as_str()));
	}
	assert!(!mapped.contains("six"));
	assert!(!mapped.contains(""));
}

#[test]
fn empty_tables() {
	let map: HashMap<u32, u32> = HashMap::with_capacity(64);
	let (_, buf) = serialize(&map);
	let mapped = unsafe { safe_cast::<MappedHashMap<u32, u32>>(&buf) }.unwrap();

	assert!(mapped.is_empty());
	assert_eq!(mapped.len(), 0);
	assert_eq!(mapped.bucket_count(), 0);
	assert_eq!(mapped.bucket_index(&1u32), None);
	assert_eq!(mapped.get(&1u32), None);
	assert_eq!(mapped.iter().count(), 0);
	mapped.validate().unwrap();

	let set: HashSet<String> = HashSet::new();
	let (_, buf) = serialize(&set);
	let mapped = unsafe { safe_cast::<MappedHashSet<MappedString>>(&buf) }.unwrap();
	assert!(mapped.is_empty());
	assert!(!mapped.contains("anything"));
}

#[test]
fn nested_tables() {
	let map: HashMap<String, HashSet<u16>> = (0..20u16)
		.map(|index| (format!("set{index}"), (0..index).map(|item| item * 3).collect()))
		.collect();
	let (_, buf) = serialize(&map);
	let mapped =
		unsafe { safe_cast::<MappedHashMap<MappedString, MappedHashSet<u16>>>(&buf) }.unwrap();

	for index in 0..20u16 {
		let inner = mapped.at(format!("set{index}").as_str()).unwrap();
		assert_eq!(inner.len(), index as usize);
		assert!(inner.contains(&0u16) == (index > 0));
		assert!(!inner.contains(&1u16));
		inner.validate().unwrap();
	}
}

#[test]
fn zero_sized_entries() {
	#[derive(Serialize, PartialEq, Eq, Hash, Debug)]
	#[mapped(derive(PartialEq, Eq, Hash, Debug))]
	struct Unit;

	let set = HashSet::from([Unit]);
	let (_, buf) = serialize(&set);
	let mapped = unsafe { safe_cast::<MappedHashSet<MappedUnit>>(&buf) }.unwrap();

	assert!(!mapped.is_empty());
	assert_eq!(mapped.len(), 1);
	assert_eq!(mapped.iter().count(), 1);
	assert!(mapped.contains(&MappedUnit));
	assert_eq!(mapped.count(&MappedUnit), 1);
	mapped.validate().unwrap();
	assert_eq!(unsafe { safe_read::<HashSet<Unit>>(&buf) }.unwrap(), set);

	let map = HashMap::from([(Unit, Unit)]);
	let (_, buf) = serialize(&map);
	let copied = unsafe { safe_read::<HashMap<Unit, Unit>>(&buf) }.unwrap();
	assert_eq!(copied, map);
}
