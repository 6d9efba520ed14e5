// SPDX-FileCopyrightText: 2025 Chiel Douwes
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{
	any::{type_name, Any},
	collections::{BTreeMap, HashMap},
	fmt::{Debug, Formatter},
	sync::{Arc, OnceLock},
};

use log::{debug, trace};

use crate::{ChunkTag, CodecError, StringRef};

/// A category of resources living in one chunk of the container.
pub trait ResourceKind: 'static {
	const TAG: ChunkTag;
	type Resource: Send + Sync + 'static;
}

/// Identity of a resource whose own layout is decoded outside this crate.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Asset {
	pub name: StringRef,
}

pub mod kind {
	use super::{Asset, ResourceKind};
	use crate::ChunkTag;

	#[derive(Copy, Clone, Debug, Eq, PartialEq)]
	pub enum Code {}

	#[derive(Copy, Clone, Debug, Eq, PartialEq)]
	pub enum Background {}

	#[derive(Copy, Clone, Debug, Eq, PartialEq)]
	pub enum Object {}

	#[derive(Copy, Clone, Debug, Eq, PartialEq)]
	pub enum Sprite {}

	impl ResourceKind for Code {
		const TAG: ChunkTag = ChunkTag::new(b"CODE");
		type Resource = Asset;
	}

	/// Backgrounds, which double as tilesets in GMS2.
	impl ResourceKind for Background {
		const TAG: ChunkTag = ChunkTag::new(b"BGND");
		type Resource = Asset;
	}

	impl ResourceKind for Object {
		const TAG: ChunkTag = ChunkTag::new(b"OBJT");
		type Resource = Asset;
	}

	impl ResourceKind for Sprite {
		const TAG: ChunkTag = ChunkTag::new(b"SPRT");
		type Resource = Asset;
	}
}

/// Shared view of a table slot, filled once its owner has been decoded.
pub struct Handle<T>(Arc<OnceLock<T>>);

impl<T> Handle<T> {
	pub fn get(&self) -> Option<&T> {
		self.0.get()
	}

	pub fn is_resolved(&self) -> bool {
		self.0.get().is_some()
	}

	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl<T> Clone for Handle<T> {
	fn clone(&self) -> Self {
		Self(Arc::clone(&self.0))
	}
}

impl<T: Debug> Debug for Handle<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Handle").field(&self.0.get()).finish()
	}
}

trait Slot: Send + Sync {
	fn is_resolved(&self) -> bool;
	fn type_name(&self) -> &'static str;
	fn as_any(&self) -> &dyn Any;
	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Send + Sync + 'static> Slot for OnceLock<T> {
	fn is_resolved(&self) -> bool {
		self.get().is_some()
	}

	fn type_name(&self) -> &'static str {
		type_name::<T>()
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
		self
	}
}

#[derive(Default)]
struct ChunkSlots {
	slots: BTreeMap<u32, Arc<dyn Slot>>,
	sealed: bool,
}

/// Resources of a single document, keyed by chunk tag and absolute file offset.
///
/// Slots are created on first mention, either by a reference asking for them or by the
/// decoder of the owning chunk defining them, in whichever order the file is read.
#[derive(Default)]
pub struct ResourceTable {
	chunks: HashMap<ChunkTag, ChunkSlots>,
}

impl ResourceTable {
	pub fn new() -> Self {
		Self::default()
	}

	fn slot<K: ResourceKind>(
		&mut self,
		offset: u32,
	) -> Result<Arc<OnceLock<K::Resource>>, CodecError> {
		let slot = self
			.chunks
			.entry(K::TAG)
			.or_default()
			.slots
			.entry(offset)
			.or_insert_with(|| -> Arc<dyn Slot> { Arc::new(OnceLock::<K::Resource>::new()) })
			.clone();
		let found = slot.type_name();
		slot.into_any()
			.downcast::<OnceLock<K::Resource>>()
			.map_err(|_| CodecError::ResourceKindMismatch {
				tag: K::TAG,
				offset,
				expected: type_name::<K::Resource>(),
				found,
			})
	}

	/// Returns the handle for the resource at `offset`, which is only filled in once the
	/// resource is [defined](Self::define). Fails if the chunk was already sealed without it.
	pub fn resolve<K: ResourceKind>(
		&mut self,
		offset: u32,
	) -> Result<Handle<K::Resource>, CodecError> {
		if let Some(chunk) = self.chunks.get(&K::TAG) {
			let known = chunk.slots.get(&offset).is_some_and(|slot| slot.is_resolved());
			if chunk.sealed && !known {
				return Err(CodecError::DanglingReference {
					tag: K::TAG,
					offset,
				});
			}
		}
		let slot = self.slot::<K>(offset)?;
		if slot.get().is_none() {
			trace!("deferring {} resource at {offset:#x}", K::TAG);
		}
		Ok(Handle(slot))
	}

	pub fn define<K: ResourceKind>(
		&mut self,
		offset: u32,
		resource: K::Resource,
	) -> Result<Handle<K::Resource>, CodecError> {
		let slot = self.slot::<K>(offset)?;
		slot.set(resource).map_err(|_| CodecError::DuplicateResource {
			tag: K::TAG,
			offset,
		})?;
		Ok(Handle(slot))
	}

	pub fn get<K: ResourceKind>(&self, offset: u32) -> Option<&K::Resource> {
		self.chunks
			.get(&K::TAG)?
			.slots
			.get(&offset)?
			.as_any()
			.downcast_ref::<OnceLock<K::Resource>>()?
			.get()
	}

	/// Offsets in the chunk that were asked for but not defined yet.
	pub fn pending(&self, tag: ChunkTag) -> impl Iterator<Item = u32> + '_ {
		self.chunks
			.get(&tag)
			.into_iter()
			.flat_map(|chunk| chunk.slots.iter())
			.filter(|(_, slot)| !slot.is_resolved())
			.map(|(&offset, _)| offset)
	}

	/// Marks the chunk as fully decoded. Every offset still pending is dangling, and later
	/// requests for unknown offsets fail right away.
	pub fn seal(&mut self, tag: ChunkTag) -> Result<(), CodecError> {
		let chunk = self.chunks.entry(tag).or_default();
		chunk.sealed = true;
		debug!("sealed {tag} with {} resources", chunk.slots.len());
		match self.pending(tag).next() {
			Some(offset) => Err(CodecError::DanglingReference { tag, offset }),
			None => Ok(()),
		}
	}
}

impl Debug for ResourceTable {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_map()
			.entries(self.chunks.iter().map(|(tag, chunk)| {
				(tag, chunk.slots.keys().collect::<Vec<_>>())
			}))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::{kind::*, *};

	struct Strings;

	impl ResourceKind for Strings {
		const TAG: ChunkTag = ChunkTag::new(b"CODE");
		type Resource = String;
	}

	#[test]
	fn deferred_handle_fills_in() {
		let mut table = ResourceTable::new();
		let early = table.resolve::<Code>(0x100).unwrap();
		assert!(!early.is_resolved());
		assert_eq!(table.pending(Code::TAG).collect::<Vec<_>>(), [0x100]);

		let defined = table
			.define::<Code>(0x100, Asset { name: StringRef(8) })
			.unwrap();
		assert!(early.ptr_eq(&defined));
		assert_eq!(early.get(), Some(&Asset { name: StringRef(8) }));
		assert_eq!(table.get::<Code>(0x100), Some(&Asset { name: StringRef(8) }));
		assert_eq!(table.pending(Code::TAG).count(), 0);
		table.seal(Code::TAG).unwrap();
	}

	#[test]
	fn seal_reports_dangling() {
		let mut table = ResourceTable::new();
		table.define::<Sprite>(0x10, Asset::default()).unwrap();
		table.resolve::<Sprite>(0x20).unwrap();
		assert!(matches!(
			table.seal(Sprite::TAG),
			Err(CodecError::DanglingReference { offset: 0x20, .. })
		));
	}

	#[test]
	fn sealed_chunk_rejects_unknown_offsets() {
		let mut table = ResourceTable::new();
		table.define::<Object>(0x10, Asset::default()).unwrap();
		table.seal(Object::TAG).unwrap();

		assert!(table.resolve::<Object>(0x10).unwrap().is_resolved());
		assert!(matches!(
			table.resolve::<Object>(0x14),
			Err(CodecError::DanglingReference { offset: 0x14, .. })
		));
	}

	#[test]
	fn duplicate_definition() {
		let mut table = ResourceTable::new();
		table.define::<Background>(0x40, Asset::default()).unwrap();
		assert!(matches!(
			table.define::<Background>(0x40, Asset::default()),
			Err(CodecError::DuplicateResource { offset: 0x40, .. })
		));
	}

	#[test]
	fn kind_mismatch() {
		let mut table = ResourceTable::new();
		table.resolve::<Code>(0x40).unwrap();
		assert!(matches!(
			table.resolve::<Strings>(0x40),
			Err(CodecError::ResourceKindMismatch { offset: 0x40, .. })
		));
	}
}
