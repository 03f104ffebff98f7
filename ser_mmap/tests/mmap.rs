use std::{
	collections::BTreeMap,
	fs::File,
	io::{BufWriter, Write},
};

use memmap2::{Mmap, MmapMut};
use ser_mmap::{safe_cast, write, MappedString, MappedVec, Serialize, StreamWriter, Transient};

mod common;
use common::pos_in;

#[derive(Serialize)]
struct My {
	i: i32,
	str: String,
	map: BTreeMap<String, i32>,
}

fn write_to_file<T: Serialize>(file: &File, value: &T) -> usize {
	let mut writer = StreamWriter::new(BufWriter::new(file));
	let pos = write(&mut writer, value).unwrap();
	writer.flush().unwrap();
	pos
}

#[test]
fn map_file_and_read() {
	let file = tempfile::tempfile().unwrap();
	let my = My {
		i: 22,
		str: "a string".to_string(),
		map: BTreeMap::from([
			("ten".to_string(), 10),
			("eleven".to_string(), 11),
			("twelve".to_string(), 12),
		]),
	};
	write_to_file(&file, &my);

	let mmap = unsafe { Mmap::map(&file) }.unwrap();
	let mapped = unsafe { safe_cast::<MappedMy>(&mmap) }.unwrap();
	assert_eq!(mapped.i, 22);
	assert_eq!(mapped.str, "a string");
	assert_eq!(mapped.map["ten"], 10);
	assert_eq!(mapped.map["eleven"], 11);
	assert_eq!(mapped.map["twelve"], 12);
	assert!(!mapped.map.contains_key("thirteen"));
}

#[test]
fn file_with_leading_header() {
	let mut file = tempfile::tempfile().unwrap();
	file.write_all(b"MMAPFILE").unwrap();

	let value = vec!["one".to_string(), "two".to_string()];
	let mut writer = StreamWriter::with_position(BufWriter::new(&file), 8);
	let pos = write(&mut writer, &value).unwrap();
	writer.flush().unwrap();
	drop(writer);

	let mmap = unsafe { Mmap::map(&file) }.unwrap();
	assert_eq!(&mmap[..8], b"MMAPFILE");
	assert_eq!(mmap.len(), pos + std::mem::size_of::<MappedVec<MappedString>>());
	let mapped = unsafe { safe_cast::<MappedVec<MappedString>>(&mmap) }.unwrap();
	assert_eq!(mapped[0], "one");
	assert_eq!(mapped[1], "two");
}

#[test]
fn transient_mutated_in_mapping() {
	#[derive(Serialize)]
	struct Stats {
		name: String,
		counter: Transient<u64>,
	}

	let file = tempfile::tempfile().unwrap();
	write_to_file(
		&file,
		&Stats {
			name: "stats".to_string(),
			counter: Transient::new(),
		},
	);

	let counter_pos = {
		let mmap = unsafe { Mmap::map(&file) }.unwrap();
		let mapped = unsafe { safe_cast::<MappedStats>(&mmap) }.unwrap();
		assert_eq!(unsafe { mapped.counter.get() }, 0);
		pos_in(&mmap, mapped.counter.as_ptr())
	};
	assert_eq!(counter_pos, 0);

	for expected in 1..=3u64 {
		let mut mmap = unsafe { MmapMut::map_mut(&file) }.unwrap();
		let mut bytes = [0u8; 8];
		bytes.copy_from_slice(&mmap[counter_pos..counter_pos + 8]);
		let next = u64::from_ne_bytes(bytes) + 1;
		mmap[counter_pos..counter_pos + 8].copy_from_slice(&next.to_ne_bytes());
		mmap.flush().unwrap();
		assert_eq!(next, expected);
	}

	let mmap = unsafe { Mmap::map(&file) }.unwrap();
	let mapped = unsafe { safe_cast::<MappedStats>(&mmap) }.unwrap();
	assert_eq!(unsafe { mapped.counter.get() }, 3);
	assert_eq!(mapped.name, "stats");
}
