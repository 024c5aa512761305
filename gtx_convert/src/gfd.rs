//! Reading and writing GFD files like `.gtx` textures.
//!
//! A GFD file is a header followed by a list of blocks.
//! Each texture is stored as a surface block describing the [Gx2Surface],
//! an image block with the tiled base level, and an optional mip block with the remaining tiled levels.
//! All values are big endian.
use binread::prelude::*;
use binwrite::BinWrite;
use log::{debug, warn};
use std::{
    convert::TryFrom,
    io::{Cursor, Write},
};
use wiiu_swizzle::{
    deswizzle, mip_level_dimensions, mip_surface_infos, swizzle, HardwareProfile,
    SurfaceDescriptor, SurfaceDim, SurfaceError, TileMode,
};

use crate::ConvertError;

const GFD_MAGIC: [u8; 4] = *b"Gfx2";
const BLOCK_MAGIC: [u8; 4] = *b"BLK{";
const HEADER_SIZE: u32 = 0x20;
const SURFACE_SIZE: u32 = 0x9c;

const BLOCK_END_OF_FILE: u32 = 0x01;
const BLOCK_PADDING: u32 = 0x02;

const GX2_SURFACE_USE_TEXTURE: u32 = 0x1;
const GX2_SURFACE_USE_DEPTH_BUFFER: u32 = 0x4;

#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[br(big)]
#[binwrite(big)]
pub struct GfdHeader {
    pub magic: [u8; 4],
    pub header_size: u32,
    pub major_version: u32,
    pub minor_version: u32,
    pub gpu_version: u32,
    pub align_mode: u32,
    pub reserved1: u32,
    pub reserved2: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[br(big)]
#[binwrite(big)]
pub struct BlockHeader {
    pub magic: [u8; 4],
    pub header_size: u32,
    pub major_version: u32,
    pub minor_version: u32,
    pub block_type: u32,
    pub data_size: u32,
    pub id: u32,
    pub type_index: u32,
}

/// The GX2Surface stored in a surface block along with the texture view and component selectors.
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[br(big)]
#[binwrite(big)]
pub struct Gx2Surface {
    pub dim: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub num_mips: u32,
    pub format: u32,
    pub aa: u32,
    pub usage: u32,
    pub image_size: u32,
    pub image_ptr: u32,
    pub mip_size: u32,
    pub mip_ptr: u32,
    pub tile_mode: u32,
    pub swizzle: u32,
    pub alignment: u32,
    pub pitch: u32,
    pub mip_offsets: [u32; 13],
    pub view_first_mip: u32,
    pub view_num_mips: u32,
    pub view_first_slice: u32,
    pub view_num_slices: u32,
    pub comp_sel: [u8; 4],
    pub tex_regs: [u32; 5],
}

impl Gx2Surface {
    /// The descriptor for the base level of this surface.
    pub fn descriptor(&self) -> Result<SurfaceDescriptor, SurfaceError> {
        Ok(SurfaceDescriptor {
            format: self.format,
            width: self.width,
            height: self.height,
            depth: self.depth,
            dim: SurfaceDim::try_from(self.dim)?,
            tile_mode: TileMode::try_from(self.tile_mode)?,
            sample_count: 1 << self.aa.min(31),
            mip_level: 0,
            pipe_swizzle: 0,
            bank_swizzle: 0,
            is_depth_buffer: self.usage & GX2_SURFACE_USE_DEPTH_BUFFER != 0,
        }
        .with_swizzle(self.swizzle))
    }

    /// The offset of mip level `level` in the mip data.
    /// The first offset is relative to the start of the image data of size `base_size`.
    pub fn mip_offset(&self, level: u32, base_size: u64) -> usize {
        match level {
            0 => 0,
            1 => (self.mip_offsets[0] as u64).saturating_sub(base_size) as usize,
            _ => self
                .mip_offsets
                .get(level as usize - 1)
                .copied()
                .unwrap_or(0) as usize,
        }
    }
}

/// The block type codes, which differ between GFD versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTypes {
    pub surface: u32,
    pub image: u32,
    pub mip: u32,
}

impl BlockTypes {
    pub fn from_version(major_version: u32) -> Result<Self, ConvertError> {
        match major_version {
            6 => Ok(Self {
                surface: 0x0a,
                image: 0x0b,
                mip: 0x0c,
            }),
            7 => Ok(Self {
                surface: 0x0b,
                image: 0x0c,
                mip: 0x0d,
            }),
            _ => Err(ConvertError::UnsupportedGfdVersion(major_version)),
        }
    }
}

/// The largest number of mip levels a surface can have for a GFD major version.
pub const fn max_mip_count(major_version: u32) -> u32 {
    if major_version == 6 {
        14
    } else {
        13
    }
}

/// A single texture with tiled image and mip data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfdTexture {
    pub surface: Gx2Surface,
    pub image_data: Vec<u8>,
    pub mip_data: Vec<u8>,
}

impl GfdTexture {
    /// Tiles the tightly packed `mipmaps` of a 2D texture.
    ///
    /// `swizzle_value` is the GX2 swizzle value and is ignored for linear and 1D tiled modes.
    pub fn from_mipmaps(
        format: u32,
        width: u32,
        height: u32,
        comp_sel: [u8; 4],
        mipmaps: &[Vec<u8>],
        tile_mode: TileMode,
        swizzle_value: u32,
        hw: &HardwareProfile,
    ) -> Result<Self, ConvertError> {
        let num_mips = mipmaps.len() as u32;
        let max_mip_count = max_mip_count(7);
        if num_mips == 0 || num_mips > max_mip_count {
            return Err(SurfaceError::InvalidMipCount {
                mip_count: num_mips,
                max_mip_count,
            }
            .into());
        }

        let swizzle_value = match tile_mode {
            TileMode::LinearAligned
            | TileMode::Tiled1dThin1
            | TileMode::Tiled1dThick
            | TileMode::LinearSpecial => 0,
            _ => swizzle_value & 0x700,
        };

        let descriptor =
            SurfaceDescriptor::new_2d(format, width, height, tile_mode).with_swizzle(swizzle_value);
        let infos = mip_surface_infos(&descriptor, num_mips, hw)?;

        let mut image_data = Vec::new();
        let mut mip_data = Vec::new();
        let mut mip_offsets = [0u32; 13];
        for (level, (info, mip)) in infos.iter().zip(mipmaps).enumerate() {
            let (mip_width, mip_height) = mip_level_dimensions(width, height, level as u32);
            let tiled = swizzle(mip_width, mip_height, info, swizzle_value, mip, hw);

            if level == 0 {
                image_data = tiled;
            } else {
                let align = info.base_align.max(1) as usize;
                let offset = (mip_data.len() + align - 1) / align * align;
                mip_data.resize(offset, 0);
                mip_data.extend_from_slice(&tiled);

                mip_offsets[level - 1] = if level == 1 {
                    (image_data.len() + offset) as u32
                } else {
                    offset as u32
                };
            }
        }

        let (alignment, pitch) = infos
            .first()
            .map(|info| (info.base_align, info.pitch))
            .unwrap_or((1, 0));

        Ok(Self {
            surface: Gx2Surface {
                dim: SurfaceDim::Dim2d as u32,
                width,
                height,
                depth: 1,
                num_mips,
                format,
                aa: 0,
                usage: GX2_SURFACE_USE_TEXTURE,
                image_size: image_data.len() as u32,
                image_ptr: 0,
                mip_size: mip_data.len() as u32,
                mip_ptr: 0,
                tile_mode: tile_mode as u32,
                swizzle: swizzle_value,
                alignment,
                pitch,
                mip_offsets,
                view_first_mip: 0,
                view_num_mips: num_mips,
                view_first_slice: 0,
                view_num_slices: 1,
                comp_sel,
                tex_regs: [0; 5],
            },
            image_data,
            mip_data,
        })
    }

    /// Untiles all the mip levels of a 2D texture.
    /// Each level is tightly packed like the input to [GfdTexture::from_mipmaps].
    pub fn deswizzle_mipmaps(&self, hw: &HardwareProfile) -> Result<Vec<Vec<u8>>, ConvertError> {
        let descriptor = self.surface.descriptor()?;
        if descriptor.dim != SurfaceDim::Dim2d {
            warn!(
                "Skipping {:?} texture with {} slices. Only 2D textures are supported.",
                descriptor.dim, self.surface.depth
            );
            return Err(SurfaceError::UnsupportedSurfaceDim(self.surface.dim).into());
        }

        let infos = mip_surface_infos(&descriptor, self.surface.num_mips, hw)?;
        let base_size = infos.first().map(|info| info.surf_size).unwrap_or(0);

        infos
            .iter()
            .enumerate()
            .map(|(level, info)| {
                let level = level as u32;
                let (width, height) =
                    mip_level_dimensions(self.surface.width, self.surface.height, level);
                let source = if level == 0 {
                    &self.image_data[..]
                } else {
                    let offset = self.surface.mip_offset(level, base_size);
                    self.mip_data.get(offset..).unwrap_or(&[])
                };
                deswizzle(width, height, info, self.surface.swizzle, source, hw)
                    .map_err(Into::into)
            })
            .collect()
    }
}

/// A GFD file containing zero or more textures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfdFile {
    pub major_version: u32,
    pub minor_version: u32,
    pub gpu_version: u32,
    pub align_mode: u32,
    pub textures: Vec<GfdTexture>,
}

impl GfdFile {
    /// A version 7.1 file for `textures`.
    pub fn new(textures: Vec<GfdTexture>) -> Self {
        Self {
            major_version: 7,
            minor_version: 1,
            gpu_version: 2,
            align_mode: 1,
            textures,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConvertError> {
        let mut reader = Cursor::new(bytes);
        let header: GfdHeader = reader.read_be()?;
        if header.magic != GFD_MAGIC {
            return Err(ConvertError::InvalidMagic(header.magic));
        }
        let block_types = BlockTypes::from_version(header.major_version)?;
        let max_mip_count = max_mip_count(header.major_version);

        let mut textures: Vec<GfdTexture> = Vec::new();
        let mut position = header.header_size.max(HEADER_SIZE) as usize;
        loop {
            if position.saturating_add(HEADER_SIZE as usize) > bytes.len() {
                warn!("Missing end of file block at offset 0x{:x}.", position);
                break;
            }

            reader.set_position(position as u64);
            let block: BlockHeader = reader.read_be()?;
            if block.magic != BLOCK_MAGIC {
                return Err(ConvertError::InvalidMagic(block.magic));
            }
            if block.block_type == BLOCK_END_OF_FILE {
                break;
            }

            let start = position + block.header_size.max(HEADER_SIZE) as usize;
            let end = start.saturating_add(block.data_size as usize);
            if end > bytes.len() {
                warn!(
                    "Block at offset 0x{:x} expects 0x{:x} bytes of data but only 0x{:x} bytes remain.",
                    position,
                    block.data_size,
                    bytes.len().saturating_sub(start)
                );
            }
            let data = &bytes[start.min(bytes.len())..end.min(bytes.len())];

            if block.block_type == block_types.surface {
                if block.data_size != SURFACE_SIZE {
                    return Err(ConvertError::InvalidSurfaceBlock(block.data_size));
                }
                let surface: Gx2Surface = Cursor::new(data).read_be()?;
                if surface.num_mips > max_mip_count {
                    return Err(SurfaceError::InvalidMipCount {
                        mip_count: surface.num_mips,
                        max_mip_count,
                    }
                    .into());
                }
                textures.push(GfdTexture {
                    surface,
                    image_data: Vec::new(),
                    mip_data: Vec::new(),
                });
            } else if block.block_type == block_types.image {
                match textures.last_mut() {
                    Some(texture) => texture.image_data = data.to_vec(),
                    None => warn!("Skipping image block without a surface block."),
                }
            } else if block.block_type == block_types.mip {
                match textures.last_mut() {
                    Some(texture) => texture.mip_data = data.to_vec(),
                    None => warn!("Skipping mip block without a surface block."),
                }
            } else {
                debug!("Skipping block type 0x{:x}.", block.block_type);
            }

            position = end;
        }

        Ok(Self {
            major_version: header.major_version,
            minor_version: header.minor_version,
            gpu_version: header.gpu_version,
            align_mode: header.align_mode,
            textures,
        })
    }

    /// Writes the file with padding blocks so image and mip data start at a multiple of the surface alignment.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), ConvertError> {
        let block_types = BlockTypes::from_version(self.major_version)?;

        GfdHeader {
            magic: GFD_MAGIC,
            header_size: HEADER_SIZE,
            major_version: self.major_version,
            minor_version: self.minor_version,
            gpu_version: self.gpu_version,
            align_mode: self.align_mode,
            reserved1: 0,
            reserved2: 0,
        }
        .write(writer)?;

        let mut offset = HEADER_SIZE as usize;
        for (i, texture) in self.textures.iter().enumerate() {
            let type_index = i as u32;

            let mut surface = Vec::new();
            texture.surface.write(&mut surface)?;
            write_block(writer, &mut offset, block_types.surface, type_index, &surface)?;

            write_padding(writer, &mut offset, texture.surface.alignment)?;
            write_block(
                writer,
                &mut offset,
                block_types.image,
                type_index,
                &texture.image_data,
            )?;

            if !texture.mip_data.is_empty() {
                write_padding(writer, &mut offset, texture.surface.alignment)?;
                write_block(
                    writer,
                    &mut offset,
                    block_types.mip,
                    type_index,
                    &texture.mip_data,
                )?;
            }
        }

        write_block(writer, &mut offset, BLOCK_END_OF_FILE, 0, &[])?;
        Ok(())
    }
}

fn write_block<W: Write>(
    writer: &mut W,
    offset: &mut usize,
    block_type: u32,
    type_index: u32,
    data: &[u8],
) -> std::io::Result<()> {
    BlockHeader {
        magic: BLOCK_MAGIC,
        header_size: HEADER_SIZE,
        major_version: 1,
        minor_version: 0,
        block_type,
        data_size: data.len() as u32,
        id: 0,
        type_index,
    }
    .write(writer)?;
    writer.write_all(data)?;

    *offset += HEADER_SIZE as usize + data.len();
    Ok(())
}

// Aligns the data of the next block, which starts after its header.
fn write_padding<W: Write>(writer: &mut W, offset: &mut usize, alignment: u32) -> std::io::Result<()> {
    let alignment = alignment.max(1) as usize;
    let data_start = *offset + HEADER_SIZE as usize;
    if data_start % alignment != 0 {
        let padded_data_start = data_start + HEADER_SIZE as usize;
        let padding = (alignment - padded_data_start % alignment) % alignment;
        write_block(writer, offset, BLOCK_PADDING, 0, &vec![0u8; padding])?;
    }
    Ok(())
}
