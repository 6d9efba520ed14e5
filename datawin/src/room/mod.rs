// SPDX-FileCopyrightText: 2025 Chiel Douwes
//
// SPDX-License-Identifier: GPL-3.0-or-later

// the bitfield macro will create unused parens, ignore them
#![allow(unused_parens)]

pub mod background;
pub mod instance;
pub mod layer;

use std::io::{Read, Seek, Write};

use binrw::{binrw, BinRead, BinReaderExt, BinResult, BinWrite, BinWriterExt, Endian};
use log::{debug, warn};
use modular_bitfield::{bitfield, prelude::*};

pub use background::{Background, View};
pub use instance::{GameObject, LegacyTile, RoomTile, Tile};

use crate::{
	bounded_list::BoundedListArgs,
	common::{wide_bool, write_wide_bool},
	kind,
	resource_ref::{CrossReferences, Reference},
	BoundedList, CodecError, Layer, ResourceKey, ResourceRef, ResourceTable, StringPool,
	StringRef, VersionContext,
};

/// Rooms have a fixed number of legacy background and view slots.
pub const SLOT_COUNT: usize = 8;
/// The engine hands out instance ids starting here.
pub const FIRST_INSTANCE_ID: u32 = 100000;

/// Something placed in a room at a position, under an instance id.
pub trait RoomObject {
	fn x(&self) -> i32;
	fn y(&self) -> i32;
	fn instance_id(&self) -> u32;
}

pub fn find_by_instance_id<T: RoomObject>(objects: &[T], id: u32) -> Option<&T> {
	objects.iter().find(|object| object.instance_id() == id)
}

#[bitfield]
#[binrw]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RoomEntryFlags {
	pub enable_views: bool,
	pub show_color: bool,
	pub clear_display_buffer: bool,
	unused: B29,
}

impl Default for RoomEntryFlags {
	fn default() -> Self {
		Self::new().with_enable_views(true)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Room {
	pub name: StringRef,
	pub caption: StringRef,
	pub width: u32,
	pub height: u32,
	pub speed: u32,
	pub persistent: bool,
	pub background_color: u32,
	pub draw_background_color: bool,
	pub creation_code: ResourceRef<kind::Code>,
	pub flags: RoomEntryFlags,
	pub world: u32,
	pub top: u32,
	pub left: u32,
	pub right: u32,
	pub bottom: u32,
	pub gravity_x: f32,
	pub gravity_y: f32,
	pub meters_per_pixel: f32,

	pub backgrounds: BoundedList<Background>,
	pub views: BoundedList<View>,
	pub game_objects: BoundedList<GameObject>,
	pub tiles: BoundedList<RoomTile>,
	/// Only stored from major version 2 on. GMS2 rooms leave backgrounds and tiles empty and
	/// use these instead.
	pub layers: BoundedList<Layer>,
}

impl Default for Room {
	fn default() -> Self {
		Self::with_flags(RoomEntryFlags::default())
	}
}

impl Room {
	/// An empty room with all background and view slots present. The first view is turned
	/// on if `flags` enables views.
	pub fn with_flags(flags: RoomEntryFlags) -> Self {
		let mut views: BoundedList<View> = (0..SLOT_COUNT).map(|_| View::default()).collect();
		views[0].enabled = flags.enable_views();

		Self {
			name: StringRef::default(),
			caption: StringRef::default(),
			width: 320,
			height: 240,
			speed: 30,
			persistent: false,
			background_color: 0,
			draw_background_color: true,
			creation_code: ResourceRef::null(),
			flags,
			world: 0,
			top: 0,
			left: 0,
			right: 1024,
			bottom: 768,
			gravity_x: 0.0,
			gravity_y: 10.0,
			meters_per_pixel: 0.1,
			backgrounds: (0..SLOT_COUNT).map(|_| Background::default()).collect(),
			views,
			game_objects: BoundedList::new(),
			tiles: BoundedList::new(),
			layers: BoundedList::new(),
		}
	}

	/// Reads a room at the reader's position and registers everything it references with
	/// `table`.
	pub fn decode<R: Read + Seek>(
		reader: &mut R,
		version: VersionContext,
		table: &mut ResourceTable,
	) -> Result<Self, CodecError> {
		let room = Self::read_le_args(reader, version)?;
		room.link(table)?;
		Ok(room)
	}

	pub fn encode<W: Write + Seek>(
		&self,
		writer: &mut W,
		version: VersionContext,
	) -> Result<(), CodecError> {
		self.write_le_args(writer, version)?;
		Ok(())
	}

	pub fn name_in<'a>(&self, pool: &'a impl StringPool) -> Option<&'a str> {
		pool.read(self.name)
	}

	pub fn caption_in<'a>(&self, pool: &'a impl StringPool) -> Option<&'a str> {
		pool.read(self.caption)
	}

	/// Every resource this room points at.
	pub fn references(&self) -> Vec<ResourceKey> {
		self.cross_references()
			.into_iter()
			.filter_map(|reference| reference.key())
			.collect()
	}

	/// The lowest instance id above every one in use, or `None` once `u32::MAX` is taken.
	pub fn next_instance_id(&self) -> Option<u32> {
		let objects = self.game_objects.iter().map(RoomObject::instance_id);
		let tiles = self.tiles.iter().map(RoomObject::instance_id);
		let legacy_tiles = self
			.layers
			.iter()
			.filter_map(Layer::assets_data)
			.flat_map(|assets| assets.legacy_tiles.iter().map(RoomObject::instance_id));

		objects
			.chain(tiles)
			.chain(legacy_tiles)
			.max()
			.map_or(Some(FIRST_INSTANCE_ID), |id| {
				id.checked_add(1).map(|next| next.max(FIRST_INSTANCE_ID))
			})
	}
}

impl CrossReferences for Room {
	fn cross_references(&self) -> Vec<&dyn Reference> {
		let mut references: Vec<&dyn Reference> = vec![&self.creation_code];
		references.extend(self.backgrounds.cross_references());
		references.extend(self.views.cross_references());
		references.extend(self.game_objects.cross_references());
		references.extend(self.tiles.cross_references());
		references.extend(self.layers.cross_references());
		references
	}
}

fn list_args<Inner: Clone>(list: &'static str, inner: Inner) -> BoundedListArgs<Inner> {
	BoundedListArgs { list, inner }
}

impl BinRead for Room {
	type Args<'a> = VersionContext;

	fn read_options<R: Read + Seek>(
		reader: &mut R,
		endian: Endian,
		version: Self::Args<'_>,
	) -> BinResult<Self> {
		let start = reader.stream_position()?;
		debug!(
			"reading room at {start:#x} (major {}, bytecode {})",
			version.major_version(),
			version.bytecode_version()
		);

		let name = reader.read_type(endian)?;
		let caption = reader.read_type(endian)?;
		let width = reader.read_type(endian)?;
		let height = reader.read_type(endian)?;
		let speed = reader.read_type(endian)?;
		let persistent = wide_bool(reader, endian, ())?;
		let background_color = reader.read_type(endian)?;
		let draw_background_color = wide_bool(reader, endian, ())?;
		let creation_code = reader.read_type(endian)?;
		let flags = reader.read_type(endian)?;

		let backgrounds = BoundedList::<Background>::read_pointer(reader, endian)?;
		let views = BoundedList::<View>::read_pointer(reader, endian)?;
		let game_objects = BoundedList::<GameObject>::read_pointer(reader, endian)?;
		let tiles = BoundedList::<RoomTile>::read_pointer(reader, endian)?;

		let world = reader.read_type(endian)?;
		let top = reader.read_type(endian)?;
		let left = reader.read_type(endian)?;
		let right = reader.read_type(endian)?;
		let bottom = reader.read_type(endian)?;
		let gravity_x = reader.read_type(endian)?;
		let gravity_y = reader.read_type(endian)?;
		let meters_per_pixel = reader.read_type(endian)?;

		let layers = if version.has_layers() {
			Some(BoundedList::<Layer>::read_pointer(reader, endian)?)
		} else {
			None
		};

		let backgrounds = BoundedList::<Background>::read_body(
			reader,
			endian,
			backgrounds,
			list_args("backgrounds", ()),
		)?;
		let views =
			BoundedList::<View>::read_body(reader, endian, views, list_args("views", ()))?;
		let game_objects = BoundedList::<GameObject>::read_body(
			reader,
			endian,
			game_objects,
			list_args("game objects", version),
		)?;
		let tiles =
			BoundedList::<RoomTile>::read_body(reader, endian, tiles, list_args("tiles", ()))?;
		let layers = match layers {
			Some(layers) => {
				BoundedList::<Layer>::read_body(reader, endian, layers, list_args("layers", ()))?
			}
			None => BoundedList::new(),
		};

		Ok(Self {
			name,
			caption,
			width,
			height,
			speed,
			persistent,
			background_color,
			draw_background_color,
			creation_code,
			flags,
			world,
			top,
			left,
			right,
			bottom,
			gravity_x,
			gravity_y,
			meters_per_pixel,
			backgrounds,
			views,
			game_objects,
			tiles,
			layers,
		})
	}
}

impl BinWrite for Room {
	type Args<'a> = VersionContext;

	fn write_options<W: Write + Seek>(
		&self,
		writer: &mut W,
		endian: Endian,
		version: Self::Args<'_>,
	) -> BinResult<()> {
		debug!("writing room at {:#x}", writer.stream_position()?);

		writer.write_type(&self.name, endian)?;
		writer.write_type(&self.caption, endian)?;
		writer.write_type(&self.width, endian)?;
		writer.write_type(&self.height, endian)?;
		writer.write_type(&self.speed, endian)?;
		write_wide_bool(&self.persistent, writer, endian, ())?;
		writer.write_type(&self.background_color, endian)?;
		write_wide_bool(&self.draw_background_color, writer, endian, ())?;
		writer.write_type(&self.creation_code, endian)?;
		writer.write_type(&self.flags, endian)?;

		let backgrounds = self.backgrounds.write_pointer(writer, endian)?;
		let views = self.views.write_pointer(writer, endian)?;
		let game_objects = self.game_objects.write_pointer(writer, endian)?;
		let tiles = self.tiles.write_pointer(writer, endian)?;

		writer.write_type(&self.world, endian)?;
		writer.write_type(&self.top, endian)?;
		writer.write_type(&self.left, endian)?;
		writer.write_type(&self.right, endian)?;
		writer.write_type(&self.bottom, endian)?;
		writer.write_type(&self.gravity_x, endian)?;
		writer.write_type(&self.gravity_y, endian)?;
		writer.write_type(&self.meters_per_pixel, endian)?;

		let layers = if version.has_layers() {
			Some(self.layers.write_pointer(writer, endian)?)
		} else {
			if !self.layers.is_empty() {
				warn!(
					"dropping {} layers, major version {} has no layer system",
					self.layers.len(),
					version.major_version()
				);
			}
			None
		};

		self.backgrounds.write_body(writer, endian, backgrounds, list_args("backgrounds", ()))?;
		self.views.write_body(writer, endian, views, list_args("views", ()))?;
		self.game_objects.write_body(
			writer,
			endian,
			game_objects,
			list_args("game objects", version),
		)?;
		self.tiles.write_body(writer, endian, tiles, list_args("tiles", ()))?;
		if let Some(layers) = layers {
			self.layers.write_body(writer, endian, layers, list_args("layers", ()))?;
		}
		Ok(())
	}
}
