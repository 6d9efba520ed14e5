// SPDX-FileCopyrightText: 2025 Chiel Douwes
//
// SPDX-License-Identifier: GPL-3.0-or-later

use binrw::binrw;

use crate::{
	common::{wide_bool, write_wide_bool},
	kind,
	resource_ref::{CrossReferences, Reference},
	ResourceRef,
};

/// One of the eight background slots of a pre-layer room.
#[binrw]
#[derive(Clone, Debug, PartialEq)]
pub struct Background {
	#[br(parse_with = wide_bool)]
	#[bw(write_with = write_wide_bool)]
	pub enabled: bool,
	#[br(parse_with = wide_bool)]
	#[bw(write_with = write_wide_bool)]
	pub foreground: bool,
	pub definition: ResourceRef<kind::Background>,
	pub x: u32,
	pub y: u32,
	pub tile_x: u32,
	pub tile_y: u32,
	pub speed_x: i32,
	pub speed_y: i32,
	pub object: ResourceRef<kind::Object>,
}

impl Default for Background {
	fn default() -> Self {
		Self {
			enabled: false,
			foreground: false,
			definition: ResourceRef::null(),
			x: 0,
			y: 0,
			tile_x: 1,
			tile_y: 1,
			speed_x: 0,
			speed_y: 0,
			object: ResourceRef::null(),
		}
	}
}

impl CrossReferences for Background {
	fn cross_references(&self) -> Vec<&dyn Reference> {
		vec![&self.definition, &self.object]
	}
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
pub struct View {
	#[br(parse_with = wide_bool)]
	#[bw(write_with = write_wide_bool)]
	pub enabled: bool,
	pub view_x: i32,
	pub view_y: i32,
	pub view_width: i32,
	pub view_height: i32,
	pub port_x: i32,
	pub port_y: i32,
	pub port_width: i32,
	pub port_height: i32,
	pub border_x: u32,
	pub border_y: u32,
	/// -1 follows the object without a speed limit
	pub speed_x: i32,
	pub speed_y: i32,
	/// The object the view follows.
	pub object: ResourceRef<kind::Object>,
}

impl Default for View {
	fn default() -> Self {
		Self {
			enabled: false,
			view_x: 0,
			view_y: 0,
			view_width: 640,
			view_height: 480,
			port_x: 0,
			port_y: 0,
			port_width: 640,
			port_height: 480,
			border_x: 32,
			border_y: 32,
			speed_x: -1,
			speed_y: -1,
			object: ResourceRef::null(),
		}
	}
}

impl CrossReferences for View {
	fn cross_references(&self) -> Vec<&dyn Reference> {
		vec![&self.object]
	}
}
