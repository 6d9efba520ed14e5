// SPDX-FileCopyrightText: 2025 Chiel Douwes
//
// SPDX-License-Identifier: GPL-3.0-or-later

mod assets;

use std::io::{Read, Seek, Write};

use binrw::{binread, binrw, BinRead, BinReaderExt, BinResult, BinWrite, BinWriterExt, Endian};
use derive_more::TryFrom;
use enum_iterator::Sequence;
use log::{trace, warn};

pub use assets::{LayerAssetsData, SpriteItem};

use crate::{
	common::{wide_bool, write_wide_bool},
	kind,
	resource_ref::{CrossReferences, Reference},
	CodecError, ResourceRef, StringRef,
};

#[derive(BinWrite, Copy, Clone, Debug, Eq, PartialEq, TryFrom, Sequence)]
#[bw(repr = u32)]
#[repr(u32)]
#[try_from(repr)]
pub enum LayerType {
	Background = 1,
	Instances = 2,
	Assets = 3,
	Tiles = 4,
}

/// Ids of the room's game objects drawn on this layer.
#[binrw]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LayerInstancesData {
	#[br(temp)]
	#[bw(calc = instance_ids.len() as u32)]
	count: u32,
	#[br(count = count)]
	pub instance_ids: Vec<u32>,
}

impl LayerInstancesData {
	pub fn new(instance_ids: Vec<u32>) -> Self {
		Self { instance_ids }
	}
}

/// A grid of tile ids into a tileset. Ids are row major, `tiles_x` per row.
#[binread]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LayerTilesData {
	/// In GMS2 tilesets live in the background chunk.
	pub tileset: ResourceRef<kind::Background>,
	pub tiles_x: u32,
	pub tiles_y: u32,
	#[br(count = tiles_x as usize * tiles_y as usize)]
	pub tile_data: Vec<u32>,
}

impl LayerTilesData {
	/// Checks the grid size, reporting `pos` as the location of this payload.
	pub fn validate(&self, pos: u64) -> Result<(), CodecError> {
		let expected = u64::from(self.tiles_x) * u64::from(self.tiles_y);
		if self.tile_data.len() as u64 == expected {
			Ok(())
		} else {
			Err(CodecError::InvalidTileGrid {
				tiles_x: self.tiles_x,
				tiles_y: self.tiles_y,
				expected,
				found: self.tile_data.len(),
				pos,
			})
		}
	}
}

impl BinWrite for LayerTilesData {
	type Args<'a> = ();

	fn write_options<W: Write + Seek>(
		&self,
		writer: &mut W,
		endian: Endian,
		_args: Self::Args<'_>,
	) -> BinResult<()> {
		let pos = writer.stream_position()?;
		self.validate(pos).map_err(|err| err.at(pos))?;
		writer.write_type(&self.tileset, endian)?;
		writer.write_type(&self.tiles_x, endian)?;
		writer.write_type(&self.tiles_y, endian)?;
		writer.write_type(&self.tile_data, endian)
	}
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
pub struct LayerBackgroundData {
	#[br(parse_with = wide_bool)]
	#[bw(write_with = write_wide_bool)]
	pub visible: bool,
	#[br(parse_with = wide_bool)]
	#[bw(write_with = write_wide_bool)]
	pub foreground: bool,
	pub sprite: ResourceRef<kind::Sprite>,
	#[br(parse_with = wide_bool)]
	#[bw(write_with = write_wide_bool)]
	pub tiled_horizontally: bool,
	#[br(parse_with = wide_bool)]
	#[bw(write_with = write_wide_bool)]
	pub tiled_vertically: bool,
	#[br(parse_with = wide_bool)]
	#[bw(write_with = write_wide_bool)]
	pub stretch: bool,
	/// ABGR, alpha included
	pub color: u32,
	pub first_frame: f32,
	pub animation_speed: f32,
	/// 0 is frames per second, 1 is frames per game frame
	pub animation_speed_type: i32,
}

impl Default for LayerBackgroundData {
	fn default() -> Self {
		Self {
			visible: true,
			foreground: false,
			sprite: ResourceRef::null(),
			tiled_horizontally: false,
			tiled_vertically: false,
			stretch: false,
			color: 0xFFFFFFFF,
			first_frame: 0.0,
			animation_speed: 15.0,
			animation_speed_type: 0,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum LayerData {
	Background(LayerBackgroundData),
	Instances(LayerInstancesData),
	Assets(LayerAssetsData),
	Tiles(LayerTilesData),
}

impl LayerData {
	pub fn layer_type(&self) -> LayerType {
		match self {
			LayerData::Background(_) => LayerType::Background,
			LayerData::Instances(_) => LayerType::Instances,
			LayerData::Assets(_) => LayerType::Assets,
			LayerData::Tiles(_) => LayerType::Tiles,
		}
	}

	fn read<R: Read + Seek>(reader: &mut R, endian: Endian, layer_type: LayerType) -> BinResult<Self> {
		Ok(match layer_type {
			LayerType::Background => LayerData::Background(reader.read_type(endian)?),
			LayerType::Instances => LayerData::Instances(reader.read_type(endian)?),
			LayerType::Assets => LayerData::Assets(reader.read_type(endian)?),
			LayerType::Tiles => {
				let tiles: LayerTilesData = reader.read_type(endian)?;
				if (tiles.tiles_x == 0) != (tiles.tiles_y == 0) {
					warn!("tile layer has a degenerate {}x{} grid", tiles.tiles_x, tiles.tiles_y);
				}
				LayerData::Tiles(tiles)
			}
		})
	}

	fn validate(&self, pos: u64) -> Result<(), CodecError> {
		match self {
			LayerData::Tiles(tiles) => tiles.validate(pos),
			LayerData::Background(_) | LayerData::Instances(_) | LayerData::Assets(_) => Ok(()),
		}
	}
}

impl BinWrite for LayerData {
	type Args<'a> = ();

	fn write_options<W: Write + Seek>(
		&self,
		writer: &mut W,
		endian: Endian,
		_args: Self::Args<'_>,
	) -> BinResult<()> {
		match self {
			LayerData::Background(data) => writer.write_type(data, endian),
			LayerData::Instances(data) => writer.write_type(data, endian),
			LayerData::Assets(data) => writer.write_type(data, endian),
			LayerData::Tiles(data) => writer.write_type(data, endian),
		}
	}
}

impl CrossReferences for LayerData {
	fn cross_references(&self) -> Vec<&dyn Reference> {
		match self {
			LayerData::Background(data) => vec![&data.sprite],
			LayerData::Instances(_) => vec![],
			LayerData::Assets(data) => data.cross_references(),
			LayerData::Tiles(data) => vec![&data.tileset],
		}
	}
}

/// Bytes from the start of a layer to its payload.
const HEADER_SIZE: u64 = 36;

/// A GMS2 room layer. Its type is given by the payload it carries.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
	pub name: StringRef,
	pub id: u32,
	pub depth: u32,
	pub x_offset: f32,
	pub y_offset: f32,
	pub h_speed: f32,
	pub v_speed: f32,
	pub visible: bool,
	pub data: LayerData,
}

impl Layer {
	pub fn new(name: StringRef, id: u32, data: LayerData) -> Self {
		Self {
			name,
			id,
			depth: 0,
			x_offset: 0.0,
			y_offset: 0.0,
			h_speed: 0.0,
			v_speed: 0.0,
			visible: true,
			data,
		}
	}

	pub fn layer_type(&self) -> LayerType {
		self.data.layer_type()
	}

	pub fn instances_data(&self) -> Option<&LayerInstancesData> {
		match &self.data {
			LayerData::Instances(data) => Some(data),
			_ => None,
		}
	}

	pub fn tiles_data(&self) -> Option<&LayerTilesData> {
		match &self.data {
			LayerData::Tiles(data) => Some(data),
			_ => None,
		}
	}

	pub fn background_data(&self) -> Option<&LayerBackgroundData> {
		match &self.data {
			LayerData::Background(data) => Some(data),
			_ => None,
		}
	}

	pub fn assets_data(&self) -> Option<&LayerAssetsData> {
		match &self.data {
			LayerData::Assets(data) => Some(data),
			_ => None,
		}
	}
}

impl BinRead for Layer {
	type Args<'a> = ();

	fn read_options<R: Read + Seek>(
		reader: &mut R,
		endian: Endian,
		_args: Self::Args<'_>,
	) -> BinResult<Self> {
		let name = reader.read_type(endian)?;
		let id = reader.read_type(endian)?;

		let type_pos = reader.stream_position()?;
		let raw_type: u32 = reader.read_type(endian)?;
		let layer_type = LayerType::try_from(raw_type).map_err(|_| {
			CodecError::UnsupportedLayerType {
				value: raw_type,
				pos: type_pos,
			}
			.at(type_pos)
		})?;
		trace!("{layer_type:?} layer {id} at {type_pos:#x}");

		Ok(Self {
			name,
			id,
			depth: reader.read_type(endian)?,
			x_offset: reader.read_type(endian)?,
			y_offset: reader.read_type(endian)?,
			h_speed: reader.read_type(endian)?,
			v_speed: reader.read_type(endian)?,
			visible: wide_bool(reader, endian, ())?,
			data: LayerData::read(reader, endian, layer_type)?,
		})
	}
}

impl BinWrite for Layer {
	type Args<'a> = ();

	fn write_options<W: Write + Seek>(
		&self,
		writer: &mut W,
		endian: Endian,
		_args: Self::Args<'_>,
	) -> BinResult<()> {
		let pos = writer.stream_position()?;
		self.data
			.validate(pos + HEADER_SIZE)
			.map_err(|err| err.at(pos))?;

		writer.write_type(&self.name, endian)?;
		writer.write_type(&self.id, endian)?;
		writer.write_type(&self.layer_type(), endian)?;
		writer.write_type(&self.depth, endian)?;
		writer.write_type(&self.x_offset, endian)?;
		writer.write_type(&self.y_offset, endian)?;
		writer.write_type(&self.h_speed, endian)?;
		writer.write_type(&self.v_speed, endian)?;
		write_wide_bool(&self.visible, writer, endian, ())?;
		writer.write_type(&self.data, endian)
	}
}

impl CrossReferences for Layer {
	fn cross_references(&self) -> Vec<&dyn Reference> {
		self.data.cross_references()
	}
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use super::*;

	fn encode(layer: &Layer) -> Result<Vec<u8>, CodecError> {
		let mut cursor = Cursor::new(Vec::new());
		layer.write_le(&mut cursor)?;
		Ok(cursor.into_inner())
	}

	#[test]
	fn every_layer_type_round_trips() {
		for layer_type in enum_iterator::all::<LayerType>() {
			let data = match layer_type {
				LayerType::Background => LayerData::Background(LayerBackgroundData {
					sprite: ResourceRef::at(0x900).unwrap(),
					stretch: true,
					..LayerBackgroundData::default()
				}),
				LayerType::Instances => {
					LayerData::Instances(LayerInstancesData::new(vec![100000, 100001]))
				}
				LayerType::Assets => LayerData::Assets(LayerAssetsData::default()),
				LayerType::Tiles => LayerData::Tiles(LayerTilesData {
					tileset: ResourceRef::at(0x400).unwrap(),
					tiles_x: 3,
					tiles_y: 2,
					tile_data: vec![0, 1, 2, 3, 4, 5],
				}),
			};
			let layer = Layer {
				depth: 100,
				x_offset: 4.5,
				..Layer::new(StringRef(0x80), 3, data)
			};
			let bytes = encode(&layer).unwrap();
			assert_eq!(bytes[8..12], (layer_type as u32).to_le_bytes());

			let read = Layer::read_le(&mut Cursor::new(bytes)).unwrap();
			assert_eq!(read.layer_type(), layer_type);
			assert_eq!(read, layer);
		}
	}

	#[test]
	fn unknown_layer_type() {
		let mut bytes = encode(&Layer::new(
			StringRef(0),
			1,
			LayerData::Instances(LayerInstancesData::default()),
		))
		.unwrap();
		bytes[8..12].copy_from_slice(&5u32.to_le_bytes());

		let err = Layer::read_le(&mut Cursor::new(bytes)).unwrap_err();
		assert!(matches!(
			CodecError::from(err),
			CodecError::UnsupportedLayerType { value: 5, pos: 8 }
		));
	}

	#[test]
	fn bad_tile_grid_writes_nothing() {
		let tiles = LayerTilesData {
			tileset: ResourceRef::null(),
			tiles_x: 4,
			tiles_y: 4,
			tile_data: vec![0; 15],
		};

		let mut cursor = Cursor::new(Vec::new());
		let err = tiles.write_le(&mut cursor).unwrap_err();
		assert!(matches!(
			CodecError::from(err),
			CodecError::InvalidTileGrid {
				expected: 16,
				found: 15,
				pos: 0,
				..
			}
		));
		assert!(cursor.get_ref().is_empty());

		let layer = Layer::new(StringRef(0), 2, LayerData::Tiles(tiles));
		let mut cursor = Cursor::new(vec![0; 0x20]);
		cursor.set_position(0x20);
		let err = layer.write_le(&mut cursor).unwrap_err();
		assert!(matches!(
			CodecError::from(err),
			CodecError::InvalidTileGrid { pos: 0x44, .. }
		));
		assert_eq!(cursor.get_ref().len(), 0x20);
	}
}
