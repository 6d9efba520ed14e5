// SPDX-FileCopyrightText: 2025 Chiel Douwes
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::{Read, Seek, SeekFrom, Write};

use binrw::{binrw, BinRead, BinResult, BinWrite, Endian, NamedArgs};
use derive_more::{Deref, DerefMut, From};
use log::{debug, trace};

use crate::{
	resource_ref::{CrossReferences, Reference},
	room::RoomObject,
	CodecError,
};

/// The offset a [`BoundedList`] pointer names, read before the list body itself.
#[binrw]
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct ListHandle {
	pub offset: u32,
}

/// A reserved `u32` in the output that gets the offset of something written later.
#[derive(Debug)]
#[must_use = "the reserved offset stays zero unless it is patched"]
pub struct Placeholder {
	position: u64,
}

impl Placeholder {
	pub fn reserve<W: Write + Seek>(writer: &mut W, endian: Endian) -> BinResult<Self> {
		let position = writer.stream_position()?;
		0u32.write_options(writer, endian, ())?;
		Ok(Self { position })
	}

	pub fn position(&self) -> u64 {
		self.position
	}

	/// Writes `target` into the reserved space and returns to the current position.
	pub fn patch<W: Write + Seek>(self, writer: &mut W, endian: Endian, target: u64) -> BinResult<()> {
		let target = u32::try_from(target).map_err(|_| binrw::Error::AssertFail {
			pos: self.position,
			message: format!("offset {target:#x} does not fit in 32 bits"),
		})?;
		let before = writer.stream_position()?;
		writer.seek(SeekFrom::Start(self.position))?;
		target.write_options(writer, endian, ())?;
		writer.seek(SeekFrom::Start(before))?;
		Ok(())
	}
}

/// Arguments for reading and writing the body of a [`BoundedList`].
#[derive(Clone, Debug, NamedArgs)]
pub struct BoundedListArgs<Inner: Clone> {
	/// Name of the list, used in misalignment errors.
	pub list: &'static str,

	/// The [arguments](BinRead::Args) for the element type.
	pub inner: Inner,
}

/// Elements reachable through an absolute offset that is written before the list itself.
///
/// The body consists of the element count, a table with the absolute offset of every
/// element, and the elements. Reading checks that the body and every element sit exactly
/// where those offsets say; anything else means the file is corrupt.
#[derive(Clone, Debug, PartialEq, Deref, DerefMut, From)]
pub struct BoundedList<T> {
	items: Vec<T>,
}

impl<T> BoundedList<T> {
	pub fn new() -> Self {
		Self { items: Vec::new() }
	}

	pub fn into_inner(self) -> Vec<T> {
		self.items
	}

	pub fn read_pointer<R: Read + Seek>(reader: &mut R, endian: Endian) -> BinResult<ListHandle> {
		ListHandle::read_options(reader, endian, ())
	}

	pub fn write_pointer<W: Write + Seek>(&self, writer: &mut W, endian: Endian) -> BinResult<Placeholder> {
		Placeholder::reserve(writer, endian)
	}

	pub fn read_body<'a, R: Read + Seek>(
		reader: &mut R,
		endian: Endian,
		handle: ListHandle,
		args: BoundedListArgs<T::Args<'a>>,
	) -> BinResult<Self>
	where
		T: BinRead,
		T::Args<'a>: Clone,
	{
		let start = reader.stream_position()?;
		if start != u64::from(handle.offset) {
			return Err(CodecError::MisalignedList {
				list: args.list,
				index: None,
				expected: handle.offset.into(),
				found: start,
			}
			.at(start));
		}

		let count = u32::read_options(reader, endian, ())?;
		debug!("reading {count} {} at {start:#x}", args.list);
		let offsets = (0..count)
			.map(|_| u32::read_options(reader, endian, ()))
			.collect::<BinResult<Vec<_>>>()?;

		let mut items = Vec::new();
		for (index, offset) in offsets.into_iter().enumerate() {
			let pos = reader.stream_position()?;
			if pos != u64::from(offset) {
				return Err(CodecError::MisalignedList {
					list: args.list,
					index: Some(index),
					expected: offset.into(),
					found: pos,
				}
				.at(pos));
			}
			trace!("{} element {index} at {pos:#x}", args.list);
			items.push(T::read_options(reader, endian, args.inner.clone())?);
		}

		Ok(Self { items })
	}

	/// Writes the body at the current position and points `pointer` at it.
	pub fn write_body<'a, W: Write + Seek>(
		&self,
		writer: &mut W,
		endian: Endian,
		pointer: Placeholder,
		args: BoundedListArgs<T::Args<'a>>,
	) -> BinResult<()>
	where
		T: BinWrite,
		T::Args<'a>: Clone,
	{
		let start = writer.stream_position()?;
		debug!("writing {} {} at {start:#x}", self.items.len(), args.list);
		pointer.patch(writer, endian, start)?;

		let count = u32::try_from(self.items.len()).map_err(|_| binrw::Error::AssertFail {
			pos: start,
			message: format!("too many {}", args.list),
		})?;
		count.write_options(writer, endian, ())?;
		let slots = self
			.items
			.iter()
			.map(|_| Placeholder::reserve(writer, endian))
			.collect::<BinResult<Vec<_>>>()?;

		for (item, slot) in self.items.iter().zip(slots) {
			let pos = writer.stream_position()?;
			slot.patch(writer, endian, pos)?;
			item.write_options(writer, endian, args.inner.clone())?;
		}
		Ok(())
	}
}

impl<T: RoomObject> BoundedList<T> {
	pub fn find_by_instance_id(&self, id: u32) -> Option<&T> {
		crate::room::find_by_instance_id(&self.items, id)
	}
}

impl<T: CrossReferences> CrossReferences for BoundedList<T> {
	fn cross_references(&self) -> Vec<&dyn Reference> {
		self.items.as_slice().cross_references()
	}
}

impl<T> Default for BoundedList<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> FromIterator<T> for BoundedList<T> {
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		Self {
			items: iter.into_iter().collect(),
		}
	}
}

impl<'a, T> IntoIterator for &'a BoundedList<T> {
	type Item = &'a T;
	type IntoIter = std::slice::Iter<'a, T>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.iter()
	}
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use super::*;

	fn args() -> BoundedListArgs<()> {
		BoundedListArgs {
			list: "numbers",
			inner: (),
		}
	}

	fn encode(list: &BoundedList<u16>) -> Vec<u8> {
		let mut cursor = Cursor::new(Vec::new());
		let pointer = list.write_pointer(&mut cursor, Endian::Little).unwrap();
		0xAAAAu16.write_le(&mut cursor).unwrap();
		list.write_body(&mut cursor, Endian::Little, pointer, args()).unwrap();
		cursor.into_inner()
	}

	#[test]
	fn pointer_and_offsets_are_patched() {
		let list = BoundedList::from(vec![7u16, 9]);
		assert_eq!(encode(&list), [
			6, 0, 0, 0, // pointer to the body
			0xAA, 0xAA, // unrelated data in between
			2, 0, 0, 0, // count
			18, 0, 0, 0, // element 0
			20, 0, 0, 0, // element 1
			7, 0, 9, 0,
		]);
	}

	#[test]
	fn body_matches_pointer() {
		let list = BoundedList::from(vec![1u16, 2, 3]);
		let mut cursor = Cursor::new(encode(&list));
		let handle = BoundedList::<u16>::read_pointer(&mut cursor, Endian::Little).unwrap();
		assert_eq!(handle, ListHandle { offset: 6 });
		cursor.set_position(6);
		let read = BoundedList::<u16>::read_body(&mut cursor, Endian::Little, handle, args()).unwrap();
		assert_eq!(read, list);
	}

	#[test]
	fn body_elsewhere_is_misaligned() {
		let list = BoundedList::from(vec![1u16]);
		let mut cursor = Cursor::new(encode(&list));
		cursor.set_position(6);
		let err = BoundedList::<u16>::read_body(
			&mut cursor,
			Endian::Little,
			ListHandle { offset: 4 },
			args(),
		)
		.unwrap_err();
		assert!(matches!(
			CodecError::from(err),
			CodecError::MisalignedList {
				list: "numbers",
				index: None,
				expected: 4,
				found: 6
			}
		));
	}

	#[test]
	fn element_elsewhere_is_misaligned() {
		let mut bytes = encode(&BoundedList::from(vec![1u16, 2]));
		// point element 1 back at element 0
		bytes[14] = 18;
		let mut cursor = Cursor::new(bytes);
		cursor.set_position(6);
		let err = BoundedList::<u16>::read_body(
			&mut cursor,
			Endian::Little,
			ListHandle { offset: 6 },
			args(),
		)
		.unwrap_err();
		assert!(matches!(
			CodecError::from(err),
			CodecError::MisalignedList {
				index: Some(1),
				expected: 18,
				found: 20,
				..
			}
		));
	}
}
