// SPDX-FileCopyrightText: 2025 Chiel Douwes
//
// SPDX-License-Identifier: GPL-3.0-or-later

use binrw::binrw;

use crate::{
	kind,
	resource_ref::{CrossReferences, Reference},
	ResourceKind, ResourceRef, RoomObject, VersionContext,
};

/// An object instance placed in a room.
#[binrw]
#[brw(import_raw(version: VersionContext))]
#[derive(Clone, Debug, PartialEq)]
pub struct GameObject {
	pub x: i32,
	pub y: i32,
	pub object: ResourceRef<kind::Object>,
	pub instance_id: u32,
	pub creation_code: ResourceRef<kind::Code>,
	pub scale_x: f32,
	pub scale_y: f32,
	pub color: u32,
	pub rotation: f32,
	#[brw(if(version.has_pre_create_code()))]
	pub pre_create_code: ResourceRef<kind::Code>,
}

impl GameObject {
	pub fn new(object: ResourceRef<kind::Object>, instance_id: u32) -> Self {
		Self {
			object,
			instance_id,
			..Self::default()
		}
	}
}

impl Default for GameObject {
	fn default() -> Self {
		Self {
			x: 0,
			y: 0,
			object: ResourceRef::null(),
			instance_id: 0,
			creation_code: ResourceRef::null(),
			scale_x: 1.0,
			scale_y: 1.0,
			color: 0xFFFFFFFF,
			rotation: 0.0,
			pre_create_code: ResourceRef::null(),
		}
	}
}

impl RoomObject for GameObject {
	fn x(&self) -> i32 {
		self.x
	}

	fn y(&self) -> i32 {
		self.y
	}

	fn instance_id(&self) -> u32 {
		self.instance_id
	}
}

impl CrossReferences for GameObject {
	fn cross_references(&self) -> Vec<&dyn Reference> {
		vec![&self.object, &self.creation_code, &self.pre_create_code]
	}
}

/// A tile cut out of a background (in rooms) or a sprite (in asset layers).
#[binrw]
#[derive(Clone, Debug, PartialEq)]
pub struct Tile<K: ResourceKind> {
	pub x: i32,
	pub y: i32,
	pub source: ResourceRef<K>,
	pub source_x: u32,
	pub source_y: u32,
	pub width: u32,
	pub height: u32,
	pub depth: i32,
	pub instance_id: u32,
	pub scale_x: f32,
	pub scale_y: f32,
	pub color: u32,
}

pub type RoomTile = Tile<kind::Background>;
pub type LegacyTile = Tile<kind::Sprite>;

impl<K: ResourceKind> Default for Tile<K> {
	fn default() -> Self {
		Self {
			x: 0,
			y: 0,
			source: ResourceRef::null(),
			source_x: 0,
			source_y: 0,
			width: 0,
			height: 0,
			depth: 0,
			instance_id: 0,
			scale_x: 1.0,
			scale_y: 1.0,
			color: 0xFFFFFFFF,
		}
	}
}

impl<K: ResourceKind> RoomObject for Tile<K> {
	fn x(&self) -> i32 {
		self.x
	}

	fn y(&self) -> i32 {
		self.y
	}

	fn instance_id(&self) -> u32 {
		self.instance_id
	}
}

impl<K: ResourceKind> CrossReferences for Tile<K> {
	fn cross_references(&self) -> Vec<&dyn Reference> {
		vec![&self.source]
	}
}
