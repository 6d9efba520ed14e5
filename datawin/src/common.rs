// SPDX-FileCopyrightText: 2025 Chiel Douwes
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{
	collections::HashMap,
	fmt::{Debug, Display, Formatter},
};

use binrw::{binrw, parser, writer, BinRead, BinResult, BinWrite};

/// Four character identifier of a chunk in the container, e.g. `CODE` or `SPRT`.
#[binrw]
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct ChunkTag(pub [u8; 4]);

impl ChunkTag {
	pub const fn new(tag: &[u8; 4]) -> Self {
		Self(*tag)
	}
}

impl Display for ChunkTag {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", String::from_utf8_lossy(&self.0))
	}
}

impl Debug for ChunkTag {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "\"{self}\"")
	}
}

/// Offset of a string in the container's string pool, 0 when there is no string.
#[binrw]
#[derive(Copy, Clone, Default, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct StringRef(pub u32);

impl StringRef {
	pub fn is_none(&self) -> bool {
		self.0 == 0
	}
}

/// Lookup of interned strings, provided by whatever owns the string chunk.
pub trait StringPool {
	fn read(&self, string: StringRef) -> Option<&str>;
}

impl StringPool for HashMap<u32, String> {
	fn read(&self, string: StringRef) -> Option<&str> {
		if string.is_none() {
			return None;
		}
		self.get(&string.0).map(String::as_str)
	}
}

/// Booleans are stored as a full `u32` holding either 0 or 1.
#[parser(reader, endian)]
pub(crate) fn wide_bool() -> BinResult<bool> {
	let pos = reader.stream_position()?;
	match u32::read_options(reader, endian, ())? {
		0 => Ok(false),
		1 => Ok(true),
		value => Err(binrw::Error::AssertFail {
			pos,
			message: format!("invalid boolean value {value}"),
		}),
	}
}

#[writer(writer, endian)]
pub(crate) fn write_wide_bool(value: &bool) -> BinResult<()> {
	u32::from(*value).write_options(writer, endian, ())
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use binrw::Endian;

	use super::*;

	#[test]
	fn wide_bool_rejects_other_values() {
		let mut cursor = Cursor::new(2u32.to_le_bytes().to_vec());
		let err = wide_bool(&mut cursor, Endian::Little, ()).unwrap_err();
		assert!(matches!(err, binrw::Error::AssertFail { pos: 0, .. }));
	}

	#[test]
	fn wide_bool_takes_four_bytes() {
		let mut cursor = Cursor::new(Vec::new());
		write_wide_bool(&true, &mut cursor, Endian::Little, ()).unwrap();
		write_wide_bool(&false, &mut cursor, Endian::Little, ()).unwrap();
		assert_eq!(cursor.into_inner(), [1, 0, 0, 0, 0, 0, 0, 0]);
	}

	#[test]
	fn string_pool_skips_empty_reference() {
		let pool = HashMap::from([(0, "zero".to_string()), (0x20, "room_start".to_string())]);
		assert_eq!(pool.read(StringRef(0)), None);
		assert_eq!(pool.read(StringRef(0x20)), Some("room_start"));
		assert_eq!(pool.read(StringRef(0x24)), None);
	}

	#[test]
	fn chunk_tag_display() {
		assert_eq!(ChunkTag::new(b"SPRT").to_string(), "SPRT");
		assert_eq!(format!("{:?}", ChunkTag::new(b"CODE")), "\"CODE\"");
	}
}
