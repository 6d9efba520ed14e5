// SPDX-FileCopyrightText: 2025 Chiel Douwes
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::{Read, Seek, Write};

use binrw::{binrw, BinRead, BinResult, BinWrite, Endian};

use crate::{
	bounded_list::BoundedListArgs,
	kind,
	resource_ref::{CrossReferences, Reference},
	room::instance::LegacyTile,
	BoundedList, ResourceRef, StringRef,
};

#[binrw]
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteItem {
	pub name: StringRef,
	pub sprite: ResourceRef<kind::Sprite>,
	pub x: i32,
	pub y: i32,
	pub scale_x: f32,
	pub scale_y: f32,
	pub color: u32,
	pub animation_speed: f32,
	/// 0 is frames per second, 1 is frames per game frame
	pub animation_speed_type: i32,
	pub frame_index: f32,
	pub rotation: f32,
}

impl Default for SpriteItem {
	fn default() -> Self {
		Self {
			name: StringRef::default(),
			sprite: ResourceRef::null(),
			x: 0,
			y: 0,
			scale_x: 1.0,
			scale_y: 1.0,
			color: 0xFFFFFFFF,
			animation_speed: 1.0,
			animation_speed_type: 0,
			frame_index: 0.0,
			rotation: 0.0,
		}
	}
}

impl CrossReferences for SpriteItem {
	fn cross_references(&self) -> Vec<&dyn Reference> {
		vec![&self.sprite]
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerAssetsData {
	pub legacy_tiles: BoundedList<LegacyTile>,
	pub sprites: BoundedList<SpriteItem>,
}

impl BinRead for LayerAssetsData {
	type Args<'a> = ();

	fn read_options<R: Read + Seek>(
		reader: &mut R,
		endian: Endian,
		_args: Self::Args<'_>,
	) -> BinResult<Self> {
		let legacy_tiles = BoundedList::<LegacyTile>::read_pointer(reader, endian)?;
		let sprites = BoundedList::<SpriteItem>::read_pointer(reader, endian)?;
		Ok(Self {
			legacy_tiles: BoundedList::read_body(reader, endian, legacy_tiles, BoundedListArgs {
				list: "legacy tiles",
				inner: (),
			})?,
			sprites: BoundedList::read_body(reader, endian, sprites, BoundedListArgs {
				list: "sprites",
				inner: (),
			})?,
		})
	}
}

impl BinWrite for LayerAssetsData {
	type Args<'a> = ();

	fn write_options<W: Write + Seek>(
		&self,
		writer: &mut W,
		endian: Endian,
		_args: Self::Args<'_>,
	) -> BinResult<()> {
		let legacy_tiles = self.legacy_tiles.write_pointer(writer, endian)?;
		let sprites = self.sprites.write_pointer(writer, endian)?;
		self.legacy_tiles.write_body(writer, endian, legacy_tiles, BoundedListArgs {
			list: "legacy tiles",
			inner: (),
		})?;
		self.sprites.write_body(writer, endian, sprites, BoundedListArgs {
			list: "sprites",
			inner: (),
		})
	}
}

impl CrossReferences for LayerAssetsData {
	fn cross_references(&self) -> Vec<&dyn Reference> {
		let mut references = self.legacy_tiles.cross_references();
		references.extend(self.sprites.cross_references());
		references
	}
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use super::*;
	use crate::{CodecError, RoomObject};

	fn assets() -> LayerAssetsData {
		LayerAssetsData {
			legacy_tiles: BoundedList::from(vec![LegacyTile {
				source: ResourceRef::at(0x1000).unwrap(),
				width: 16,
				height: 16,
				instance_id: 10000042,
				..LegacyTile::default()
			}]),
			sprites: BoundedList::from(vec![
				SpriteItem {
					name: StringRef(0x44),
					sprite: ResourceRef::at(0x1000).unwrap(),
					x: 32,
					..SpriteItem::default()
				},
				SpriteItem::default(),
			]),
		}
	}

	#[test]
	fn round_trip() {
		let mut cursor = Cursor::new(Vec::new());
		assets().write_le(&mut cursor).unwrap();
		cursor.set_position(0);
		let read = LayerAssetsData::read_le(&mut cursor).unwrap();
		assert_eq!(read, assets());
		assert_eq!(read.legacy_tiles.find_by_instance_id(10000042).map(|t| t.x()), Some(0));
		assert_eq!(read.cross_references().len(), 3);
	}

	#[test]
	fn sprites_misaligned() {
		let mut cursor = Cursor::new(Vec::new());
		assets().write_le(&mut cursor).unwrap();
		let mut bytes = cursor.into_inner();
		// move the sprite list pointer one word ahead
		let pointer = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
		bytes[4..8].copy_from_slice(&(pointer + 4).to_le_bytes());

		let err = LayerAssetsData::read_le(&mut Cursor::new(bytes)).unwrap_err();
		assert!(matches!(
			CodecError::from(err),
			CodecError::MisalignedList {
				list: "sprites",
				index: None,
				..
			}
		));
	}
}
