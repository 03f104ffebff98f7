use std::{
	borrow::Borrow,
	cmp::Ordering,
	ffi::CStr,
	fmt,
	hash::{Hash, Hasher},
	ops::Deref,
	slice, str,
};

use crate::{
	padding::align, protocol::write_ref, Error, FormatVersion, FromMapped, Offset, Offsets, Result,
	Serialize, Versioned, Versions, Writer,
};

/// Mapped form of [`String`].
///
/// Same shape as [`MappedVec<u8>`](crate::MappedVec), but a zero byte always
/// follows the last byte of string in the buffer, so contents can be passed
/// on as a C string without copying. The terminator is not counted in `len`.
///
/// Compares, orders and hashes the same as `str`, so mapped maps and hash
/// maps with string keys can be searched with a `&str`.
#[repr(C)]
#[derive(Default)]
pub struct MappedString {
	offset: Offset,
	len: usize,
}

impl MappedString {
	#[inline]
	pub fn len(&self) -> usize {
		self.len
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	#[inline]
	pub fn as_bytes(&self) -> &[u8] {
		let bytes = self.as_bytes_with_nul();
		&bytes[..bytes.len() - 1]
	}

	/// Bytes of string including trailing zero.
	#[inline]
	pub fn as_bytes_with_nul(&self) -> &[u8] {
		if self.offset.is_null() {
			return b"\0";
		}
		// SAFETY: String bytes plus terminator lie at target of `offset`
		unsafe { slice::from_raw_parts(self.offset.ptr::<u8>(), self.len + 1) }
	}

	#[inline]
	pub fn as_str(&self) -> &str {
		// SAFETY: Bytes were written from a `String`, or checked by `assign`
		unsafe { str::from_utf8_unchecked(self.as_bytes()) }
	}

	/// View as a C string. Ends at first zero byte, which may be before `len`.
	pub fn as_c_str(&self) -> Result<&CStr> {
		CStr::from_bytes_until_nul(self.as_bytes_with_nul()).map_err(|_| Error::MissingTerminator)
	}

	/// Point this string at `bytes`, which must end with a zero byte.
	/// Length excludes the zero byte.
	///
	/// # Errors
	///
	/// * [`Error::MissingTerminator`] if last byte of `bytes` is not zero
	///   (or `bytes` is empty).
	/// * [`Error::Utf8`] if the rest of `bytes` is not valid UTF-8.
	///
	/// On error, `self` is unchanged.
	///
	/// # Safety
	///
	/// `bytes` must outlive every later read through `self`, and `self` must
	/// not be moved while it is read from.
	pub unsafe fn assign(&mut self, bytes: &[u8]) -> Result<()> {
		let Some((&0, content)) = bytes.split_last() else {
			return Err(Error::MissingTerminator);
		};
		str::from_utf8(content)?;
		self.offset.store(bytes.as_ptr());
		self.len = content.len();
		Ok(())
	}
}

impl Deref for MappedString {
	type Target = str;

	#[inline]
	fn deref(&self) -> &str {
		self.as_str()
	}
}

impl Borrow<str> for MappedString {
	#[inline]
	fn borrow(&self) -> &str {
		self.as_str()
	}
}

impl AsRef<str> for MappedString {
	#[inline]
	fn as_ref(&self) -> &str {
		self.as_str()
	}
}

impl PartialEq for MappedString {
	fn eq(&self, other: &Self) -> bool {
		self.as_str() == other.as_str()
	}
}

impl Eq for MappedString {}

impl PartialEq<str> for MappedString {
	fn eq(&self, other: &str) -> bool {
		self.as_str() == other
	}
}

impl PartialEq<&str> for MappedString {
	fn eq(&self, other: &&str) -> bool {
		self.as_str() == *other
	}
}

impl PartialEq<String> for MappedString {
	fn eq(&self, other: &String) -> bool {
		self.as_str() == other.as_str()
	}
}

impl PartialOrd for MappedString {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for MappedString {
	fn cmp(&self, other: &Self) -> Ordering {
		self.as_str().cmp(other.as_str())
	}
}

impl Hash for MappedString {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.as_str().hash(state);
	}
}

impl fmt::Debug for MappedString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self.as_str(), f)
	}
}

impl fmt::Display for MappedString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Versioned for MappedString {
	fn format_version(_: &mut Versions) -> Option<FormatVersion> {
		Some(Versions::hash("string"))
	}
}

impl Serialize for str {
	type Mapped = MappedString;

	fn write_data<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		align(writer)?;
		let pos = writer.pos();
		writer.write(self.as_bytes())?;
		writer.write(&[0])?;
		offsets.push(pos);
		Ok(())
	}

	fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		write_ref(writer, offsets.pop(), self.len())?;
		Ok(())
	}
}

impl Serialize for String {
	type Mapped = MappedString;

	#[inline]
	fn write_data<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		self.as_str().write_data(writer, offsets)
	}

	#[inline]
	fn write_field<W: Writer + ?Sized>(&self, writer: &mut W, offsets: &mut Offsets) -> Result<()> {
		self.as_str().write_field(writer, offsets)
	}
}

impl FromMapped for String {
	fn from_mapped(mapped: &MappedString) -> Self {
		mapped.as_str().to_owned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_is_empty_with_terminator() {
		let s = MappedString::default();
		assert_eq!(s.as_str(), "");
		assert_eq!(s.as_bytes_with_nul(), b"\0");
		assert_eq!(s.as_c_str().unwrap().to_bytes(), b"");
	}

	#[test]
	fn assign_requires_terminator() {
		let bytes = b"abc".to_vec();
		let mut s = MappedString::default();
		let err = unsafe { s.assign(&bytes) }.unwrap_err();
		assert!(matches!(err, Error::MissingTerminator));
		assert!(matches!(unsafe { s.assign(&[]) }, Err(Error::MissingTerminator)));
		assert!(s.is_empty());

		let bytes = b"abc\0".to_vec();
		unsafe { s.assign(&bytes) }.unwrap();
		assert_eq!(s.len(), 3);
		assert_eq!(s, "abc");
		assert_eq!(s.as_c_str().unwrap().to_str().unwrap(), "abc");
	}

	#[test]
	fn assign_rejects_invalid_utf8() {
		let mut s = MappedString::default();
		assert!(matches!(unsafe { s.assign(&[0xff, 0]) }, Err(Error::Utf8(_))));
	}
}
