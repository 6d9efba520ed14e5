// SPDX-FileCopyrightText: 2025 Chiel Douwes
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{
	fmt::{Debug, Formatter},
	io::{Read, Seek, Write},
	marker::PhantomData,
	sync::OnceLock,
};

use binrw::{BinRead, BinResult, BinWrite, Endian};

use crate::{ChunkTag, CodecError, Handle, ResourceKind, ResourceTable};

/// Location of a resource in the container.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct ResourceKey {
	pub tag: ChunkTag,
	pub offset: u32,
}

/// Nullable link to a resource in another chunk, stored as its absolute file offset.
///
/// Both 0 and -1 mean "no resource"; whichever of the two was read is written back.
pub struct ResourceRef<K: ResourceKind> {
	raw: i32,
	handle: OnceLock<Handle<K::Resource>>,
	kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> ResourceRef<K> {
	pub const NULL: i32 = -1;

	pub fn null() -> Self {
		Self::from_raw(Self::NULL)
	}

	/// A reference to the resource at `offset`, or `None` if the offset does not fit the
	/// signed on-disk field.
	pub fn at(offset: u32) -> Option<Self> {
		i32::try_from(offset).ok().map(Self::from_raw)
	}

	pub fn from_raw(raw: i32) -> Self {
		Self {
			raw,
			handle: OnceLock::new(),
			kind: PhantomData,
		}
	}

	/// The value written in place of this reference.
	pub fn serialize(&self) -> i32 {
		self.raw
	}

	pub fn is_null(&self) -> bool {
		self.raw == 0 || self.raw == -1
	}

	pub fn offset(&self) -> Option<u32> {
		if self.is_null() {
			None
		} else {
			u32::try_from(self.raw).ok()
		}
	}

	pub fn key(&self) -> Option<ResourceKey> {
		self.offset().map(|offset| ResourceKey { tag: K::TAG, offset })
	}

	/// Looks the target up in the table, leaving a pending slot behind if it was not decoded
	/// yet. The handle is remembered, so later calls do not touch the table.
	pub fn resolve(
		&self,
		table: &mut ResourceTable,
	) -> Result<Option<Handle<K::Resource>>, CodecError> {
		if self.is_null() {
			return Ok(None);
		}
		if let Some(handle) = self.handle.get() {
			return Ok(Some(handle.clone()));
		}
		let offset = self.offset().ok_or(CodecError::InvalidReference {
			tag: K::TAG,
			raw: self.raw,
		})?;
		let handle = table.resolve::<K>(offset)?;
		Ok(Some(self.handle.get_or_init(|| handle).clone()))
	}

	/// The target, if this reference was resolved and the target has been defined since.
	pub fn get(&self) -> Option<&K::Resource> {
		self.handle.get()?.get()
	}
}

impl<K: ResourceKind> Default for ResourceRef<K> {
	fn default() -> Self {
		Self::null()
	}
}

impl<K: ResourceKind> Clone for ResourceRef<K> {
	fn clone(&self) -> Self {
		Self {
			raw: self.raw,
			handle: self.handle.clone(),
			kind: PhantomData,
		}
	}
}

impl<K: ResourceKind> PartialEq for ResourceRef<K> {
	fn eq(&self, other: &Self) -> bool {
		self.raw == other.raw
	}
}

impl<K: ResourceKind> Eq for ResourceRef<K> {}

impl<K: ResourceKind> Debug for ResourceRef<K> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self.offset() {
			Some(offset) => write!(f, "{}@{offset:#x}", K::TAG),
			None => write!(f, "{}@null({})", K::TAG, self.raw),
		}
	}
}

impl<K: ResourceKind> BinRead for ResourceRef<K> {
	type Args<'a> = ();

	fn read_options<R: Read + Seek>(
		reader: &mut R,
		endian: Endian,
		_args: Self::Args<'_>,
	) -> BinResult<Self> {
		i32::read_options(reader, endian, ()).map(Self::from_raw)
	}
}

impl<K: ResourceKind> BinWrite for ResourceRef<K> {
	type Args<'a> = ();

	fn write_options<W: Write + Seek>(
		&self,
		writer: &mut W,
		endian: Endian,
		_args: Self::Args<'_>,
	) -> BinResult<()> {
		self.serialize().write_options(writer, endian, ())
	}
}

/// Type-erased view of a [`ResourceRef`].
pub trait Reference {
	fn key(&self) -> Option<ResourceKey>;
	fn link(&self, table: &mut ResourceTable) -> Result<(), CodecError>;
}

impl<K: ResourceKind> Reference for ResourceRef<K> {
	fn key(&self) -> Option<ResourceKey> {
		ResourceRef::key(self)
	}

	fn link(&self, table: &mut ResourceTable) -> Result<(), CodecError> {
		self.resolve(table).map(|_| ())
	}
}

/// Anything holding references into other chunks.
pub trait CrossReferences {
	fn cross_references(&self) -> Vec<&dyn Reference>;

	/// Registers every non-null reference with the table.
	fn link(&self, table: &mut ResourceTable) -> Result<(), CodecError> {
		self.cross_references()
			.into_iter()
			.try_for_each(|reference| reference.link(table))
	}
}

impl<T: CrossReferences> CrossReferences for [T] {
	fn cross_references(&self) -> Vec<&dyn Reference> {
		self.iter().flat_map(T::cross_references).collect()
	}
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use binrw::{BinReaderExt, BinWriterExt};

	use super::*;
	use crate::{kind::Code, Asset, StringRef};

	#[test]
	fn null_sentinels_round_trip() {
		for raw in [0i32, -1] {
			let mut cursor = Cursor::new(raw.to_le_bytes().to_vec());
			let reference: ResourceRef<Code> = cursor.read_le().unwrap();
			assert!(reference.is_null());

			let mut table = ResourceTable::new();
			assert!(reference.resolve(&mut table).unwrap().is_none());
			assert_eq!(table.pending(Code::TAG).count(), 0);

			let mut out = Cursor::new(Vec::new());
			out.write_le(&reference).unwrap();
			assert_eq!(out.into_inner(), raw.to_le_bytes());
		}
	}

	#[test]
	fn resolution_is_memoized() {
		let mut table = ResourceTable::new();
		let reference = ResourceRef::<Code>::at(0x80).unwrap();
		let first = reference.resolve(&mut table).unwrap().unwrap();
		assert!(reference.get().is_none());

		table.define::<Code>(0x80, Asset { name: StringRef(4) }).unwrap();
		let second = reference.resolve(&mut table).unwrap().unwrap();
		assert!(first.ptr_eq(&second));
		assert_eq!(reference.get(), Some(&Asset { name: StringRef(4) }));
	}

	#[test]
	fn offsets_past_the_signed_range() {
		assert_eq!(ResourceRef::<Code>::at(0x7FFF_FFFF).map(|r| r.serialize()), Some(i32::MAX));
		assert!(ResourceRef::<Code>::at(0x8000_0000).is_none());
		assert!(ResourceRef::<Code>::at(u32::MAX).is_none());
	}

	#[test]
	fn negative_offsets_are_invalid() {
		let mut table = ResourceTable::new();
		assert!(matches!(
			ResourceRef::<Code>::from_raw(-8).resolve(&mut table),
			Err(CodecError::InvalidReference { raw: -8, .. })
		));
	}
}
