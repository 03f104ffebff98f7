use ser_mmap::{
	cast_at, safe_cast, storage::AlignedVec, write, Back, MappedPtr, Serialize,
	Shared, StreamWriter, Transient, Writer,
};

mod common;
use common::{pos_in, serialize, WORD};

fn occurrences(haystack: &[u8], needle: &[u8]) -> usize {
	haystack.windows(needle.len()).filter(|window| *window == needle).count()
}

#[test]
fn shared_value_written_once() {
	#[derive(Serialize)]
	#[mapped(no_copy)]
	struct Pair {
		left: Shared<String>,
		right: Shared<String>,
		other: Shared<String>,
	}

	let marker = "a rather distinctive marker";
	let leaf = Shared::new(marker.to_string());
	let pair = Pair {
		left: leaf.clone(),
		right: leaf,
		other: Shared::new(marker.to_string()),
	};
	let (_, buf) = serialize(&pair);
	let mapped = unsafe { safe_cast::<MappedPair>(&buf) }.unwrap();

	assert_eq!(occurrences(&buf, marker.as_bytes()), 2);
	assert_eq!(mapped.left.as_ptr(), mapped.right.as_ptr());
	assert_ne!(mapped.left.as_ptr(), mapped.other.as_ptr());
	assert_eq!(*mapped.left, marker);
	assert_eq!(*mapped.other, marker);
}

#[derive(Serialize)]
#[mapped(no_copy)]
struct Parent {
	name: String,
	children: Vec<Shared<Child>>,
}

#[derive(Serialize)]
#[mapped(no_copy)]
struct Child {
	name: String,
	parent: Back<Parent>,
}

fn family(count: usize) -> Shared<Parent> {
	Shared::new_cyclic(|me| Parent {
		name: "parent".to_string(),
		children: (0..count)
			.map(|index| {
				Shared::new(Child {
					name: format!("child{index}"),
					parent: me.clone(),
				})
			})
			.collect(),
	})
}

#[test]
fn children_point_back_to_parent() {
	let root = family(3);
	let (_, buf) = serialize(&root);
	let mapped = unsafe { safe_cast::<MappedPtr<MappedParent>>(&buf) }.unwrap();

	let parent = mapped.get().unwrap();
	assert_eq!(parent.name, "parent");
	assert_eq!(parent.children.len(), 3);
	for (index, child) in parent.children.iter().enumerate() {
		assert_eq!(child.name, format!("child{index}"));
		assert_eq!(child.parent.as_ptr(), parent as *const MappedParent);
		assert_eq!(child.parent.name, "parent");
	}
	assert_eq!(occurrences(&buf, b"parent\0"), 1);
}

#[test]
fn writing_twice_reuses_pointees() {
	let root = family(2);
	let mut writer = StreamWriter::new(AlignedVec::<16>::new());
	let first = write(&mut writer, &root).unwrap();
	let end_of_first = writer.pos();
	let second = write(&mut writer, &root).unwrap();
	let buf = writer.into_inner();

	// Second write is only a fingerprint and a pointer
	assert_eq!(second, end_of_first + WORD);
	assert_eq!(buf.len(), second + WORD);

	let first = unsafe { cast_at::<MappedPtr<MappedParent>>(&buf, first) }.unwrap();
	let second = unsafe { cast_at::<MappedPtr<MappedParent>>(&buf, second) }.unwrap();
	assert_eq!(first.as_ptr(), second.as_ptr());
	assert_eq!(occurrences(&buf, b"child1\0"), 1);
}

#[test]
fn separate_writers_write_own_copies() {
	let root = family(2);
	let (_, first) = serialize(&root);
	let (_, second) = serialize(&root);
	assert_eq!(first.as_slice(), second.as_slice());

	for buf in [&first, &second] {
		let mapped = unsafe { safe_cast::<MappedPtr<MappedParent>>(buf) }.unwrap();
		let parent = mapped.get().unwrap();
		pos_in(buf, parent);
		for child in parent.children.iter() {
			pos_in(buf, child.as_ptr());
			assert_eq!(child.parent.as_ptr(), parent as *const MappedParent);
		}
	}
}

#[test]
fn write_after_existing_content() {
	let root = family(1);
	let mut writer = StreamWriter::new(AlignedVec::<16>::new());
	writer.write(b"HEADER").unwrap();
	let pos = write(&mut writer, &root).unwrap();
	let buf = writer.into_inner();

	assert_eq!(&buf[..6], b"HEADER");
	assert_eq!(pos % WORD, 0);
	let mapped = unsafe { safe_cast::<MappedPtr<MappedParent>>(&buf) }.unwrap();
	let parent = mapped.get().unwrap();
	assert_eq!(parent.children[0].name, "child0");
	assert_eq!(parent.children[0].parent.as_ptr(), parent as *const MappedParent);
}

#[test]
fn self_reference() {
	#[derive(Serialize)]
	#[mapped(no_copy)]
	struct Node {
		value: u32,
		me: Back<Node>,
		dangling: Back<Node>,
	}

	let node = Shared::new_cyclic(|me| Node {
		value: 7,
		me: me.clone(),
		dangling: Back::new(),
	});
	let (_, buf) = serialize(&node);
	let mapped = unsafe { safe_cast::<MappedPtr<MappedNode>>(&buf) }.unwrap();

	let node = mapped.get().unwrap();
	assert_eq!(node.value, 7);
	assert_eq!(node.me.as_ptr(), node as *const MappedNode);
	assert!(node.dangling.is_null());
	assert!(node.dangling.get().is_none());
}

#[test]
fn dropped_parent_written_as_null() {
	let orphan = {
		let root = family(1);
		root.children[0].clone()
	};
	assert!(orphan.parent.upgrade().is_none());

	let (_, buf) = serialize(&orphan);
	let mapped = unsafe { safe_cast::<MappedPtr<MappedChild>>(&buf) }.unwrap();
	assert_eq!(mapped.name, "child0");
	assert!(mapped.parent.is_null());
}

#[test]
fn transients_at_start_of_output() {
	#[derive(Serialize)]
	#[mapped(no_copy)]
	struct Counters {
		hits: Transient<u64>,
		name: String,
		misses: Transient<u32>,
		shared: Shared<Vec<Transient<u16>>>,
	}

	let counters = Counters {
		hits: Transient::new(),
		name: "counters".to_string(),
		misses: Transient::new(),
		shared: Shared::new(vec![Transient::new(); 3]),
	};
	let (pos, mut buf) = serialize(&counters);
	assert_eq!(pos % WORD, 0);

	{
		let mapped = unsafe { safe_cast::<MappedCounters>(&buf) }.unwrap();
		// Pointee is written during data pass of `Counters`, so claims its
		// transients before fields of `Counters` do
		let inner = mapped.shared.get().unwrap();
		let inner_positions: Vec<usize> =
			inner.iter().map(|transient| pos_in(&buf, transient.as_ptr())).collect();
		assert_eq!(inner_positions, [0, 2, 4]);
		assert_eq!(pos_in(&buf, mapped.hits.as_ptr()), 8);
		assert_eq!(pos_in(&buf, mapped.misses.as_ptr()), 16);

		assert_eq!(unsafe { mapped.hits.get() }, 0);
		assert_eq!(unsafe { mapped.misses.get() }, 0);
		assert_eq!(mapped.name, "counters");
	}

	buf[8..16].copy_from_slice(&42u64.to_ne_bytes());
	buf[16..20].copy_from_slice(&7u32.to_ne_bytes());
	buf[2..4].copy_from_slice(&3u16.to_ne_bytes());

	let mapped = unsafe { safe_cast::<MappedCounters>(&buf) }.unwrap();
	assert_eq!(unsafe { mapped.hits.get() }, 42);
	assert_eq!(unsafe { mapped.misses.get() }, 7);
	let inner = mapped.shared.get().unwrap();
	assert_eq!(unsafe { inner[1].get() }, 3);
	assert_eq!(unsafe { inner[2].get() }, 0);
}
