// SPDX-FileCopyrightText: 2025 Chiel Douwes
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Structural codec for the room resources of a GameMaker data container.
//!
//! Resources in the container point at each other by absolute file offset. This crate decodes
//! those links into a [`ResourceTable`], reads and writes the offset-table prefixed
//! [`BoundedList`]s that rooms are made of, and gates optional fields on the negotiated
//! [`VersionContext`].

pub mod bounded_list;
pub mod common;
pub mod resource_ref;
pub mod resource_table;
pub mod room;
pub mod version;

use thiserror::Error;

pub use crate::{
	bounded_list::{BoundedList, ListHandle, Placeholder},
	common::{ChunkTag, StringPool, StringRef},
	resource_ref::{CrossReferences, Reference, ResourceKey, ResourceRef},
	resource_table::{kind, Asset, Handle, ResourceKind, ResourceTable},
	room::{
		find_by_instance_id,
		layer::{Layer, LayerData, LayerType},
		Room, RoomEntryFlags, RoomObject,
	},
	version::VersionContext,
};

#[derive(Error, Debug)]
pub enum CodecError {
	#[error("reference to {tag} at offset {offset:#x} never resolved")]
	DanglingReference { tag: ChunkTag, offset: u32 },
	#[error("invalid reference value {raw} into {tag}")]
	InvalidReference { tag: ChunkTag, raw: i32 },
	#[error("{tag} resource at offset {offset:#x} was defined twice")]
	DuplicateResource { tag: ChunkTag, offset: u32 },
	#[error("{tag} slot at offset {offset:#x} holds a {found}, not a {expected}")]
	ResourceKindMismatch {
		tag: ChunkTag,
		offset: u32,
		expected: &'static str,
		found: &'static str,
	},
	/// `index` is `None` when the list body itself is out of place, `Some` for one of its
	/// elements.
	#[error("{list} list misaligned (element {index:?}): expected {expected:#x}, found {found:#x}")]
	MisalignedList {
		list: &'static str,
		index: Option<usize>,
		expected: u64,
		found: u64,
	},
	#[error("unsupported layer type {value} at {pos:#x}")]
	UnsupportedLayerType { value: u32, pos: u64 },
	#[error("tile layer data at {pos:#x} has {found} entries, the {tiles_x}x{tiles_y} grid needs {expected}")]
	InvalidTileGrid {
		tiles_x: u32,
		tiles_y: u32,
		expected: u64,
		found: usize,
		pos: u64,
	},
	#[error(transparent)]
	Binary(binrw::Error),
}

impl CodecError {
	/// Wraps this error so it can travel through [`binrw`] read and write implementations.
	pub(crate) fn at(self, pos: u64) -> binrw::Error {
		binrw::Error::Custom {
			pos,
			err: Box::new(self),
		}
	}
}

impl From<binrw::Error> for CodecError {
	fn from(value: binrw::Error) -> Self {
		match value {
			binrw::Error::Custom { pos, err } => match err.downcast::<CodecError>() {
				Ok(err) => *err,
				Err(err) => CodecError::Binary(binrw::Error::Custom { pos, err }),
			},
			err => CodecError::Binary(err),
		}
	}
}

impl From<std::io::Error> for CodecError {
	fn from(value: std::io::Error) -> Self {
		CodecError::Binary(binrw::Error::Io(value))
	}
}
