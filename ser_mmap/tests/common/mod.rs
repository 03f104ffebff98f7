#![allow(dead_code)]

use rand::{distributions::Alphanumeric, Rng, SeedableRng};
use rand_pcg::Lcg64Xsh32;
use ser_mmap::{storage::AlignedVec, to_bytes, Serialize};

pub const WORD: usize = std::mem::size_of::<usize>();

/// Write `value` with fingerprint to an in-memory buffer.
pub fn serialize<T: Serialize + ?Sized>(value: &T) -> (usize, AlignedVec) {
	to_bytes(value).unwrap()
}

/// Position of `ptr` within `buf`.
pub fn pos_in<T>(buf: &[u8], ptr: *const T) -> usize {
	let base = buf.as_ptr() as usize;
	let addr = ptr as usize;
	assert!(addr >= base && addr <= base + buf.len(), "pointer outside buffer");
	addr - base
}

/// Assert `ptr` points to a word-aligned position within `buf`.
pub fn assert_word_aligned<T>(buf: &[u8], ptr: *const T) {
	let pos = pos_in(buf, ptr);
	assert_eq!(pos % WORD, 0, "position {pos} is not word-aligned");
}

pub fn rng(seed: u64) -> Lcg64Xsh32 {
	Lcg64Xsh32::seed_from_u64(seed)
}

pub fn random_string<R: Rng>(rng: &mut R, max_len: usize) -> String {
	let len = rng.gen_range(0..=max_len);
	rng.sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}
