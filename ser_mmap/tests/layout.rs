use std::{
	collections::{BTreeMap, BTreeSet, HashMap},
	mem,
};

mod common;
use common::{assert_word_aligned, pos_in, serialize, WORD};
use ser_mmap::{
	safe_cast, safe_read, slice_bytes, MappedHashMap, MappedMap, MappedSet, MappedString, MappedVec,
	Serialize, Versions,
};

fn word(bytes: &[u8], pos: usize) -> isize {
	let mut buf = [0u8; WORD];
	buf.copy_from_slice(&bytes[pos..pos + WORD]);
	isize::from_ne_bytes(buf)
}

#[cfg(target_pointer_width = "64")]
#[test]
fn vec_of_pods_layout() {
	let (pos, buf) = serialize(&vec![1u32, 2, 3]);

	// Elements, padded to word
	assert_eq!(&buf[..12], [1u32, 2, 3].map(u32::to_ne_bytes).concat());
	assert!(buf[12..WORD * 2].iter().all(|&byte| byte == 0));
	// Fingerprint word directly before field record
	assert_eq!(pos, WORD * 2 + WORD);
	assert_eq!(word(&buf, pos - WORD) as usize, Versions::new().get::<MappedVec<u32>>());
	// Relative pointer back to start of buffer, then length
	assert_eq!(word(&buf, pos), -(pos as isize));
	assert_eq!(word(&buf, pos + WORD), 3);
	assert_eq!(buf.len(), pos + 2 * WORD);
}

#[test]
fn string_layout() {
	let (pos, buf) = serialize(&"abc".to_string());

	assert_eq!(&buf[..4], b"abc\0");
	assert!(buf[4..WORD].iter().all(|&byte| byte == 0));
	assert_eq!(pos, WORD * 2);
	assert_eq!(word(&buf, pos), -(pos as isize));
	assert_eq!(word(&buf, pos + WORD), 3);
}

#[test]
fn struct_padding_is_zeroed() {
	#[derive(Serialize)]
	struct Foo {
		a: u8,
		b: u64,
		c: u16,
	}

	let (pos, buf) = serialize(&Foo {
		a: 0xff,
		b: u64::MAX,
		c: 0xffff,
	});
	assert_eq!(buf.len() - pos, mem::size_of::<MappedFoo>());

	let record = &buf[pos..];
	let b_offset = mem::offset_of!(MappedFoo, b);
	assert_eq!(record[0], 0xff);
	assert!(record[1..b_offset].iter().all(|&byte| byte == 0));
	let c_end = mem::offset_of!(MappedFoo, c) + 2;
	assert!(record[c_end..].iter().all(|&byte| byte == 0));
}

#[test]
fn vec_of_pod_structs_copied_whole() {
	#[derive(Serialize, Clone, Copy, PartialEq, Debug)]
	#[repr(C)]
	#[mapped(pod)]
	struct Pixel {
		x: u32,
		y: u32,
		weight: u64,
	}

	let pixels: Vec<Pixel> = (0..5u32)
		.map(|index| Pixel {
			x: index,
			y: index * 2,
			weight: u64::from(index) << 40,
		})
		.collect();
	assert_eq!(
		<Pixel as Serialize>::pod_bytes(&pixels),
		Some(slice_bytes(&pixels))
	);

	let (pos, buf) = serialize(&pixels);
	let len = pixels.len() * mem::size_of::<MappedPixel>();
	assert_eq!(&buf[..len], slice_bytes(&pixels));
	assert_eq!(word(&buf, pos), -(pos as isize));
	assert_eq!(word(&buf, pos + WORD), 5);

	let mapped = unsafe { safe_cast::<MappedVec<MappedPixel>>(&buf) }.unwrap();
	assert_eq!(mapped.len(), 5);
	assert_eq!(mapped[3].y, 6);
	assert_eq!(mapped[4].weight, 4 << 40);
	assert_eq!(unsafe { safe_read::<Vec<Pixel>>(&buf) }.unwrap(), pixels);
}

#[test]
fn nested_vecs_aligned() {
	let value: Vec<Vec<String>> = (0..5)
		.map(|outer| (0..outer).map(|inner| "x".repeat(inner * 3 + 1)).collect())
		.collect();
	let (pos, buf) = serialize(&value);
	assert_eq!(pos % WORD, 0);

	let mapped = unsafe { safe_cast::<MappedVec<MappedVec<MappedString>>>(&buf) }.unwrap();
	assert_word_aligned(&buf, mapped.as_ptr());
	for inner in mapped.iter() {
		assert_word_aligned(&buf, inner);
		if !inner.is_empty() {
			assert_word_aligned(&buf, inner.as_ptr());
		}
		for string in inner.iter() {
			assert_word_aligned(&buf, string);
			assert_word_aligned(&buf, string.as_ptr());
		}
	}
}

#[test]
fn map_of_sets_aligned() {
	let value: BTreeMap<String, BTreeSet<u16>> = (0..10)
		.map(|index| (format!("key{index}"), (0..index).collect()))
		.collect();
	let (_, buf) = serialize(&value);

	let mapped = unsafe { safe_cast::<MappedMap<MappedString, MappedSet<u16>>>(&buf) }.unwrap();
	assert_eq!(mapped.len(), 10);
	assert_word_aligned(&buf, mapped.as_slice().as_ptr());
	for (key, set) in mapped.iter() {
		assert_word_aligned(&buf, key);
		assert_word_aligned(&buf, key.as_ptr());
		assert_word_aligned(&buf, set);
		if !set.is_empty() {
			assert_word_aligned(&buf, set.as_slice().as_ptr());
		}
		assert_eq!(set.len(), key[3..].parse::<usize>().unwrap());
	}
}

#[test]
fn hash_table_layout() {
	let mut map = HashMap::with_capacity(8);
	for key in 0..5u32 {
		map.insert(key, format!("v{key}"));
	}
	let (_, buf) = serialize(&map);

	let mapped = unsafe { safe_cast::<MappedHashMap<u32, MappedString>>(&buf) }.unwrap();
	assert_eq!(mapped.bucket_count(), map.capacity());
	assert_eq!(mapped.len(), 5);

	// Entries lie contiguously, word-aligned, ahead of the bucket table
	let entries = mapped.entries();
	assert_word_aligned(&buf, entries.as_ptr());
	for entry in entries {
		assert_word_aligned(&buf, entry);
		assert_word_aligned(&buf, entry.1.as_ptr());
	}
	let end_of_entries = pos_in(&buf, entries.as_ptr()) + mem::size_of_val(entries);
	let table = buf.len() - mem::size_of::<MappedHashMap<u32, MappedString>>() - WORD;
	assert!(end_of_entries <= table);
}
