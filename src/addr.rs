//! Functions for calculating the byte offset of an element within a surface.
//!
//! All offsets are relative to the start of the mip level and assume the padded
//! `pitch` and `height` from [SurfaceInfo](crate::SurfaceInfo).
//! Coordinates are in elements, so block compressed formats use block coordinates.
use std::cmp::max;

use crate::{
    compute_surface_bank_swapped_width,
    surface::{macro_tile_height, macro_tile_width},
    HardwareProfile, SurfaceInfo, TileMode,
};

/// The XOR pattern applied to the bank of bank swapped macro tiles.
const BANK_SWAP_ORDER: [u32; 8] = [0, 1, 3, 2, 6, 7, 5, 4];

/// The location of a single element within a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coord {
    pub x: u32,
    pub y: u32,
    pub slice: u32,
    pub sample: u32,
}

impl Coord {
    pub const fn new(x: u32, y: u32, slice: u32) -> Self {
        Self {
            x,
            y,
            slice,
            sample: 0,
        }
    }
}

/// Calculates the offset of an element using the row-major layout of linear tile modes.
/// # Examples
/**
```rust
use wiiu_swizzle::addr::{addr_linear, Coord};

// R8G8B8A8 with a pitch and height of 64.
assert_eq!(788, addr_linear(Coord::new(5, 3, 0), 32, 64, 64, 1));
```
 */
pub fn addr_linear(coord: Coord, bpp: u32, pitch: u32, height: u32, num_slices: u32) -> u64 {
    let pitch = pitch as u64;
    let slice_offset =
        pitch * height as u64 * (coord.slice as u64 + num_slices as u64 * coord.sample as u64);
    (coord.x as u64 + pitch * coord.y as u64 + slice_offset) * bpp as u64 / 8
}

/// Calculates the index of the element at `x`, `y`, `z` within its micro tile.
///
/// The low coordinate bits are interleaved in an order that depends on `bpp`.
/// Thick micro tiles place the slice bits above the x and y bits.
pub fn pixel_index_within_micro_tile(x: u32, y: u32, z: u32, bpp: u32, thickness: u32) -> u32 {
    let (x0, x1, x2) = (x & 1, (x >> 1) & 1, (x >> 2) & 1);
    let (y0, y1, y2) = (y & 1, (y >> 1) & 1, (y >> 2) & 1);

    let bits = match bpp {
        8 => [x0, x1, x2, y1, y0, y2],
        16 => [x0, x1, x2, y0, y1, y2],
        64 => [x0, y0, x1, x2, y1, y2],
        128 => [y0, x0, x1, x2, y1, y2],
        _ => [x0, x1, y0, x2, y1, y2],
    };

    let (z0, z1, z2) = match thickness {
        1 => (0, 0, 0),
        8 => (z & 1, (z >> 1) & 1, (z >> 2) & 1),
        _ => (z & 1, (z >> 1) & 1, 0),
    };

    bits.iter()
        .enumerate()
        .fold(0, |index, (i, bit)| index | (*bit << i))
        | (z0 << 6)
        | (z1 << 7)
        | (z2 << 8)
}

/// Calculates the offset of an element for the micro tiled modes
/// [TileMode::Tiled1dThin1] and [TileMode::Tiled1dThick].
///
/// Micro tiles are stored in row-major order.
pub fn addr_micro_tiled(coord: Coord, bpp: u32, pitch: u32, height: u32, tile_mode: TileMode) -> u64 {
    let thickness = tile_mode.thickness();
    let bpp64 = bpp as u64;

    let micro_tile_bytes = (64 * thickness as u64 * bpp64 + 7) / 8;
    let micro_tiles_per_row = (pitch >> 3) as u64;
    let micro_tile_offset =
        micro_tile_bytes * ((coord.x >> 3) as u64 + (coord.y >> 3) as u64 * micro_tiles_per_row);

    let slice_bytes = (pitch as u64 * height as u64 * thickness as u64 * bpp64 + 7) / 8;
    let slice_offset = slice_bytes * (coord.slice / thickness) as u64;

    let pixel_index = pixel_index_within_micro_tile(coord.x, coord.y, coord.slice, bpp, thickness);
    let pixel_offset = (bpp64 * pixel_index as u64) >> 3;

    pixel_offset + micro_tile_offset + slice_offset
}

fn pipe_from_coord(x: u32, y: u32, hw: &HardwareProfile) -> u32 {
    ((y >> 3) ^ (x >> 3)) & (hw.num_pipes - 1)
}

fn bank_from_coord(x: u32, y: u32, hw: &HardwareProfile) -> u32 {
    let pipes = hw.num_pipes;
    match hw.num_banks {
        4 => {
            let bit0 = ((y / (16 * pipes)) ^ (x >> 3)) & 1;
            let bit1 = ((y / (8 * pipes)) ^ (x >> 4)) & 1;
            bit0 | (bit1 << 1)
        }
        8 => {
            let bit0 = ((y / (32 * pipes)) ^ (x >> 3)) & 1;
            let bit1 = ((y / (32 * pipes)) ^ (y / (16 * pipes)) ^ (x >> 4)) & 1;
            let bit2 = ((y / (8 * pipes)) ^ (x >> 5)) & 1;
            bit0 | (bit1 << 1) | (bit2 << 2)
        }
        _ => 0,
    }
}

/// Calculates the offset of the macro tile containing `x` and `y` within a slice.
/// # Examples
/**
```rust
use wiiu_swizzle::{addr::macro_tile_offset, HardwareProfile, TileMode};

// 32 bpp 2D thin macro tiles are 32x16 elements.
let hw = HardwareProfile::WII_U;
assert_eq!(0, macro_tile_offset(31, 15, 32, 32, TileMode::Tiled2dThin1, 1, &hw));
assert_eq!(2048, macro_tile_offset(32, 0, 32, 64, TileMode::Tiled2dThin1, 1, &hw));
```
 */
pub fn macro_tile_offset(
    x: u32,
    y: u32,
    bpp: u32,
    pitch: u32,
    tile_mode: TileMode,
    num_samples: u32,
    hw: &HardwareProfile,
) -> u64 {
    let macro_width = macro_tile_width(tile_mode, hw);
    let macro_height = macro_tile_height(tile_mode, hw);
    let macro_tiles_per_row = (pitch / macro_width) as u64;
    let macro_tile_bytes = (num_samples as u64
        * tile_mode.thickness() as u64
        * bpp as u64
        * macro_height as u64
        * macro_width as u64
        + 7)
        / 8;

    let index_x = (x / macro_width) as u64;
    let index_y = (y / macro_height) as u64;
    (index_x + macro_tiles_per_row * index_y) * macro_tile_bytes
}

/// Calculates the offset of an element for the macro tiled modes 4 to 15.
///
/// Micro tiles within a macro tile are distributed across pipes and banks.
/// The pipe and bank swizzle as well as the slice rotation change this assignment.
pub fn addr_macro_tiled(
    coord: Coord,
    bpp: u32,
    pitch: u32,
    height: u32,
    num_samples: u32,
    tile_mode: TileMode,
    pipe_swizzle: u32,
    bank_swizzle: u32,
    hw: &HardwareProfile,
) -> u64 {
    let Coord { x, y, slice, sample } = coord;
    let num_pipes = hw.num_pipes;
    let num_banks = hw.num_banks;
    let num_group_bits = hw.num_group_bits();
    let num_pipe_bits = hw.num_pipe_bits();
    let num_bank_bits = hw.num_bank_bits();
    let group_mask = (1u64 << num_group_bits) - 1;

    let num_samples = max(num_samples, 1);
    let thickness = tile_mode.thickness();
    let micro_tile_bits = num_samples as u64 * bpp as u64 * (thickness as u64 * 64);
    let micro_tile_bytes = micro_tile_bits >> 3;

    let pixel_index = pixel_index_within_micro_tile(x, y, slice, bpp, thickness) as u64;
    let sample_offset = sample as u64 * bpp as u64;
    let pixel_offset = num_samples as u64 * bpp as u64 * pixel_index;
    let mut elem_offset = pixel_offset + sample_offset;

    let mut samples = num_samples;
    let mut num_sample_splits = 1;
    let mut sample_slice = 0;
    if num_samples > 1 && micro_tile_bytes > hw.split_size as u64 {
        let bytes_per_sample = max(1, micro_tile_bytes / num_samples as u64);
        let samples_per_slice = max(1, hw.split_size as u64 / bytes_per_sample);
        num_sample_splits = max(1, num_samples as u64 / samples_per_slice);
        samples = samples_per_slice as u32;

        let tile_slice_bits = max(1, micro_tile_bits / num_sample_splits);
        sample_slice = elem_offset / tile_slice_bits;
        elem_offset %= tile_slice_bits;
    }
    let elem_offset = (elem_offset + 7) / 8;

    let pipe = pipe_from_coord(x, y, hw);
    let bank = bank_from_coord(x, y, hw);
    let mut bank_pipe = (pipe + num_pipes * bank) as u64;

    let swizzle = (pipe_swizzle + num_pipes * bank_swizzle) as u64;
    let slice_in = if tile_mode.is_thick_macro_tiled() {
        slice >> 2
    } else {
        slice
    };
    let rotation = tile_mode.rotation(hw) as u64;
    bank_pipe ^= num_pipes as u64 * sample_slice * ((num_banks >> 1) as u64 + 1)
        ^ (swizzle + slice_in as u64 * rotation);
    bank_pipe %= (num_pipes * num_banks) as u64;

    let pipe = bank_pipe % num_pipes as u64;
    let mut bank = bank_pipe / num_pipes as u64;

    let slice_bytes = (height as u64
        * pitch as u64
        * thickness as u64
        * bpp as u64
        * samples as u64
        + 7)
        / 8;
    let slice_offset =
        slice_bytes * ((sample_slice + num_sample_splits * slice as u64) / thickness as u64);

    let macro_offset = macro_tile_offset(x, y, bpp, pitch, tile_mode, samples, hw);

    if tile_mode.is_bank_swapped() {
        let macro_width = macro_tile_width(tile_mode, hw);
        let bank_swap_width = max(
            1,
            compute_surface_bank_swapped_width(tile_mode, bpp, pitch, num_samples, hw),
        );
        let swap_index = macro_width * (x / macro_width) / bank_swap_width;
        bank ^= BANK_SWAP_ORDER[(swap_index & (num_banks - 1)) as usize & 7] as u64;
    }

    let total_offset =
        elem_offset + ((macro_offset + slice_offset) >> (num_bank_bits + num_pipe_bits));

    let offset_high = (total_offset & !group_mask) << (num_bank_bits + num_pipe_bits);
    let offset_low = total_offset & group_mask;
    let bank_bits = bank << (num_pipe_bits + num_group_bits);
    let pipe_bits = pipe << num_group_bits;

    bank_bits | pipe_bits | offset_low | offset_high
}

/// Calculates the offset of an element of the surface described by `info`.
///
/// Linear modes including [TileMode::LinearSpecial] use [addr_linear].
pub fn element_offset(
    coord: Coord,
    info: &SurfaceInfo,
    pipe_swizzle: u32,
    bank_swizzle: u32,
    hw: &HardwareProfile,
) -> u64 {
    if info.tile_mode.is_linear() {
        addr_linear(coord, info.bpp, info.pitch, info.height, info.depth)
    } else if info.tile_mode.is_micro_tiled() {
        addr_micro_tiled(coord, info.bpp, info.pitch, info.height, info.tile_mode)
    } else {
        addr_macro_tiled(
            coord,
            info.bpp,
            info.pitch,
            info.height,
            1,
            info.tile_mode,
            pipe_swizzle,
            bank_swizzle,
            hw,
        )
    }
}
