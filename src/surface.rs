//! Surface geometry for each mip level of a GX2 surface.
//!
//! The geometry of a tiled surface depends on the resolved tile mode.
//! Each tile mode family pads the pitch, height, and slice count of the surface
//! to a multiple of its tile dimensions.
//! Use [compute_surface_info] to calculate the padded layout of a single mip level.
//!
//! For block compressed formats, [SurfaceInfo::pitch] and [SurfaceInfo::height]
//! are in 4x4 blocks rather than pixels.
use std::cmp::{max, min};
use std::convert::TryFrom;

use crate::{
    format::is_three_component, is_pow2, lookup_format, next_pow2, pow2_align, resolve_tile_mode,
    FormatInfo, HardwareProfile, SurfaceError, TileMode, MAX_DEPTH, MAX_DIMENSION,
};

/// The dimension of a GX2 surface. This determines how the depth is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[repr(u32)]
pub enum SurfaceDim {
    Dim1d = 0,
    Dim2d = 1,
    Dim3d = 2,
    Cube = 3,
    Dim1dArray = 4,
    Dim2dArray = 5,
    Dim2dMsaa = 6,
    Dim2dMsaaArray = 7,
}

impl TryFrom<u32> for SurfaceDim {
    type Error = SurfaceError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SurfaceDim::Dim1d),
            1 => Ok(SurfaceDim::Dim2d),
            2 => Ok(SurfaceDim::Dim3d),
            3 => Ok(SurfaceDim::Cube),
            4 => Ok(SurfaceDim::Dim1dArray),
            5 => Ok(SurfaceDim::Dim2dArray),
            6 => Ok(SurfaceDim::Dim2dMsaa),
            7 => Ok(SurfaceDim::Dim2dMsaaArray),
            _ => Err(SurfaceError::UnsupportedSurfaceDim(value)),
        }
    }
}

/// The parameters of a single surface mip level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct SurfaceDescriptor {
    /// The GX2 surface format code like `0x1a` for R8G8B8A8_UNORM.
    pub format: u32,
    /// The width of the base level in pixels.
    pub width: u32,
    /// The height of the base level in pixels.
    pub height: u32,
    /// The depth for 3D surfaces or the number of array layers or cube faces.
    pub depth: u32,
    pub dim: SurfaceDim,
    /// The requested tile mode. The mode actually used is [SurfaceInfo::tile_mode].
    pub tile_mode: TileMode,
    pub sample_count: u32,
    pub mip_level: u32,
    pub pipe_swizzle: u32,
    pub bank_swizzle: u32,
    pub is_depth_buffer: bool,
}

impl SurfaceDescriptor {
    /// A single sampled 2D surface without any swizzle.
    pub fn new_2d(format: u32, width: u32, height: u32, tile_mode: TileMode) -> Self {
        Self {
            format,
            width,
            height,
            depth: 1,
            dim: SurfaceDim::Dim2d,
            tile_mode,
            sample_count: 1,
            mip_level: 0,
            pipe_swizzle: 0,
            bank_swizzle: 0,
            is_depth_buffer: false,
        }
    }

    /// Sets the pipe and bank swizzle from a GX2 swizzle value.
    pub fn with_swizzle(self, swizzle: u32) -> Self {
        Self {
            pipe_swizzle: pipe_swizzle(swizzle),
            bank_swizzle: bank_swizzle(swizzle),
            ..self
        }
    }

    /// The GX2 swizzle value for the pipe and bank swizzle.
    pub fn swizzle(&self) -> u32 {
        ((self.pipe_swizzle & 1) << 8) | ((self.bank_swizzle & 3) << 9)
    }
}

/// The pipe swizzle stored in bit 8 of a GX2 swizzle value.
pub const fn pipe_swizzle(swizzle: u32) -> u32 {
    (swizzle >> 8) & 1
}

/// The bank swizzle stored in bits 9 and 10 of a GX2 swizzle value.
pub const fn bank_swizzle(swizzle: u32) -> u32 {
    (swizzle >> 9) & 3
}

/// The padded layout of a single surface mip level.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceInfo {
    /// The padded width in elements.
    pub pitch: u32,
    /// The padded height in elements.
    pub height: u32,
    /// The padded number of slices.
    pub depth: u32,
    /// The bits per pixel or bits per 4x4 block for compressed formats.
    pub bpp: u32,
    /// The size in bytes of the tiled mip level.
    pub surf_size: u64,
    /// The tile mode used for this mip level after resolution.
    pub tile_mode: TileMode,
    pub base_align: u32,
    pub pitch_align: u32,
    pub height_align: u32,
    pub depth_align: u32,
    pub is_block_compressed: bool,
}

impl SurfaceInfo {
    /// The size of a single pixel or compressed block in bytes.
    pub const fn bytes_per_element(&self) -> u32 {
        self.bpp / 8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dims {
    pitch: u32,
    height: u32,
    slices: u32,
}

// The element dimensions of a mip level before padding.
#[derive(Debug, Clone, Copy)]
struct MipInput {
    width: u32,
    height: u32,
    num_slices: u32,
    bpp: u32,
    num_samples: u32,
    mip_level: u32,
    is_cube: bool,
    is_depth_buffer: bool,
    pad_dims: u32,
}

#[derive(Debug, Clone, Copy)]
struct Alignments {
    base: u32,
    pitch: u32,
    height: u32,
}

/// Computes the padded layout of a surface mip level.
/// # Examples
/**
```rust
use wiiu_swizzle::{compute_surface_info, HardwareProfile, SurfaceDescriptor, TileMode};

// R8G8B8A8_UNORM
let descriptor = SurfaceDescriptor::new_2d(0x1a, 64, 64, TileMode::LinearAligned);
let info = compute_surface_info(&descriptor, &HardwareProfile::WII_U).unwrap();
assert_eq!(64, info.pitch);
assert_eq!(64, info.pitch_align);
assert_eq!(16384, info.surf_size);
```
 */
pub fn compute_surface_info(
    desc: &SurfaceDescriptor,
    hw: &HardwareProfile,
) -> Result<SurfaceInfo, SurfaceError> {
    let format = lookup_format(desc.format)?;
    validate_descriptor(desc)?;

    if desc.tile_mode == TileMode::LinearSpecial {
        return Ok(linear_special_info(desc, format));
    }

    let input = mip_input(desc, format);
    let tile_mode = resolve_tile_mode(
        desc.tile_mode,
        input.bpp,
        input.mip_level,
        input.width,
        input.height,
        input.num_slices,
        input.num_samples,
        input.is_depth_buffer,
        hw,
    );

    let mut info = if tile_mode.is_linear() {
        linear_info(tile_mode, &input, hw)
    } else if tile_mode.is_micro_tiled() {
        micro_info(tile_mode, &input, hw)
    } else {
        macro_info(tile_mode, desc.tile_mode, &input, hw)
    };
    info.is_block_compressed = format.is_block_compressed;
    Ok(info)
}

/// Computes the layout of mip levels `0..mip_count` of the surface described by `desc`.
/// The [SurfaceDescriptor::mip_level] of `desc` is ignored.
pub fn mip_surface_infos(
    desc: &SurfaceDescriptor,
    mip_count: u32,
    hw: &HardwareProfile,
) -> Result<Vec<SurfaceInfo>, SurfaceError> {
    (0..max(mip_count, 1))
        .map(|mip_level| {
            compute_surface_info(
                &SurfaceDescriptor {
                    mip_level,
                    ..*desc
                },
                hw,
            )
        })
        .collect()
}

/// The width and height in pixels of mip level `mip_level` for a base level of `width` x `height`.
pub fn mip_level_dimensions(width: u32, height: u32, mip_level: u32) -> (u32, u32) {
    (mip_dim(width, mip_level), mip_dim(height, mip_level))
}

fn validate_descriptor(desc: &SurfaceDescriptor) -> Result<(), SurfaceError> {
    if desc.width == 0
        || desc.height == 0
        || desc.width > MAX_DIMENSION
        || desc.height > MAX_DIMENSION
        || desc.depth > MAX_DEPTH
    {
        return Err(SurfaceError::InvalidDimensions {
            width: desc.width,
            height: desc.height,
            depth: desc.depth,
        });
    }

    if desc.sample_count > 1 {
        return Err(SurfaceError::UnsupportedSampleCount(desc.sample_count));
    }

    Ok(())
}

fn mip_dim(x: u32, mip_level: u32) -> u32 {
    max(1, x.checked_shr(mip_level).unwrap_or(0))
}

// Element dimensions and slice count of the level before any padding.
fn mip_slices(desc: &SurfaceDescriptor) -> (u32, u32) {
    let level = desc.mip_level;
    let depth = max(1, desc.depth);
    match desc.dim {
        SurfaceDim::Dim1d => (1, 1),
        SurfaceDim::Dim2d | SurfaceDim::Dim2dMsaa => (mip_dim(desc.height, level), 1),
        SurfaceDim::Dim3d => (mip_dim(desc.height, level), mip_dim(depth, level)),
        SurfaceDim::Cube => (mip_dim(desc.height, level), max(depth, 6)),
        SurfaceDim::Dim1dArray => (1, depth),
        SurfaceDim::Dim2dArray | SurfaceDim::Dim2dMsaaArray => (mip_dim(desc.height, level), depth),
    }
}

fn mip_input(desc: &SurfaceDescriptor, format: FormatInfo) -> MipInput {
    let level = desc.mip_level;
    let is_cube = desc.dim == SurfaceDim::Cube;
    let (height, num_slices) = mip_slices(desc);
    let mut width = mip_dim(desc.width, level);
    let mut height = height;

    if format.is_block_compressed {
        let (w, h) = if level == 0 {
            (pow2_align(width, 4), pow2_align(height, 4))
        } else {
            (next_pow2(width), next_pow2(height))
        };
        width = max(1, w / 4);
        height = max(1, h / 4);
    }

    MipInput {
        width,
        height,
        num_slices,
        bpp: format.bits_per_pixel,
        num_samples: max(1, desc.sample_count),
        mip_level: level,
        is_cube,
        is_depth_buffer: desc.is_depth_buffer,
        pad_dims: if is_cube && level == 0 { 2 } else { 0 },
    }
}

// Mip levels are padded to power of two dimensions before alignment.
fn expand_mip_dims(input: &MipInput) -> (Dims, u32) {
    if input.mip_level == 0 {
        let dims = Dims {
            pitch: input.width,
            height: input.height,
            slices: input.num_slices,
        };
        return (dims, input.pad_dims);
    }

    let (slices, pad_dims) = if input.is_cube {
        // Cube faces are never expanded but may still need padding.
        let pad_dims = if input.num_slices <= 1 { 2 } else { 0 };
        (input.num_slices, pad_dims)
    } else {
        (next_pow2(input.num_slices), input.pad_dims)
    };

    let dims = Dims {
        pitch: next_pow2(input.width),
        height: next_pow2(input.height),
        slices,
    };
    (dims, pad_dims)
}

fn pad_dimensions(
    dims: Dims,
    tile_mode: TileMode,
    pad_dims: u32,
    is_cube: bool,
    pitch_align: u32,
    height_align: u32,
    hw: &HardwareProfile,
) -> Dims {
    let thickness = tile_mode.thickness();
    let pad_dims = if pad_dims == 0 { 3 } else { pad_dims };

    let pitch = if is_pow2(pitch_align) {
        pow2_align(dims.pitch, pitch_align)
    } else {
        round_up(dims.pitch, pitch_align)
    };

    let height = if pad_dims > 1 {
        pow2_align(dims.height, height_align)
    } else {
        dims.height
    };

    let mut slices = dims.slices;
    if pad_dims > 2 || thickness > 1 {
        if is_cube && hw.pad_cube_slices {
            slices = next_pow2(slices);
        }
        if thickness > 1 {
            slices = pow2_align(slices, thickness);
        }
    }

    Dims {
        pitch,
        height,
        slices,
    }
}

fn round_up(x: u32, align: u32) -> u32 {
    if align == 0 {
        x
    } else {
        (x + align - 1) / align * align
    }
}

fn surface_size(dims: Dims, bpp: u32, num_samples: u32) -> u64 {
    (dims.height as u64
        * dims.pitch as u64
        * dims.slices as u64
        * bpp as u64
        * num_samples as u64
        + 7)
        / 8
}

fn linear_alignments(tile_mode: TileMode, bpp: u32, hw: &HardwareProfile) -> Alignments {
    match tile_mode {
        TileMode::LinearAligned => Alignments {
            base: hw.pipe_interleave_bytes,
            pitch: max(64, 8 * hw.pipe_interleave_bytes / max(bpp, 1)),
            height: 1,
        },
        _ => Alignments {
            base: 1,
            pitch: if bpp == 1 { 8 } else { 1 },
            height: 1,
        },
    }
}

fn linear_info(tile_mode: TileMode, input: &MipInput, hw: &HardwareProfile) -> SurfaceInfo {
    let align = linear_alignments(tile_mode, input.bpp, hw);
    let (dims, pad_dims) = expand_mip_dims(input);
    let dims = pad_dimensions(
        dims,
        tile_mode,
        pad_dims,
        input.is_cube,
        align.pitch,
        align.height,
        hw,
    );

    SurfaceInfo {
        pitch: dims.pitch,
        height: dims.height,
        depth: dims.slices,
        bpp: input.bpp,
        surf_size: surface_size(dims, input.bpp, input.num_samples),
        tile_mode,
        base_align: align.base,
        pitch_align: align.pitch,
        height_align: align.height,
        depth_align: tile_mode.thickness(),
        is_block_compressed: false,
    }
}

fn alignment_bpp(bpp: u32) -> u32 {
    let bpp = if is_three_component(bpp) { bpp / 3 } else { bpp };
    max(bpp, 1)
}

fn micro_alignments(tile_mode: TileMode, bpp: u32, num_samples: u32, hw: &HardwareProfile) -> Alignments {
    let bpp = alignment_bpp(bpp);
    let group = hw.pipe_interleave_bytes;
    Alignments {
        base: group,
        pitch: max(8, group / bpp / num_samples / tile_mode.thickness()),
        height: 8,
    }
}

fn micro_info(tile_mode: TileMode, input: &MipInput, hw: &HardwareProfile) -> SurfaceInfo {
    let (dims, pad_dims) = expand_mip_dims(input);

    let tile_mode = if input.mip_level > 0 && tile_mode == TileMode::Tiled1dThick && dims.slices < 4 {
        TileMode::Tiled1dThin1
    } else {
        tile_mode
    };

    let align = micro_alignments(tile_mode, input.bpp, input.num_samples, hw);
    let dims = pad_dimensions(
        dims,
        tile_mode,
        pad_dims,
        input.is_cube,
        align.pitch,
        align.height,
        hw,
    );

    SurfaceInfo {
        pitch: dims.pitch,
        height: dims.height,
        depth: dims.slices,
        bpp: input.bpp,
        surf_size: surface_size(dims, input.bpp, input.num_samples),
        tile_mode,
        base_align: align.base,
        pitch_align: align.pitch,
        height_align: align.height,
        depth_align: tile_mode.thickness(),
        is_block_compressed: false,
    }
}

/// The width in elements of a macro tile for `tile_mode`.
pub(crate) const fn macro_tile_width(tile_mode: TileMode, hw: &HardwareProfile) -> u32 {
    8 * hw.num_banks / tile_mode.aspect_ratio()
}

/// The height in elements of a macro tile for `tile_mode`.
pub(crate) const fn macro_tile_height(tile_mode: TileMode, hw: &HardwareProfile) -> u32 {
    8 * hw.num_pipes * tile_mode.aspect_ratio()
}

fn macro_alignments(tile_mode: TileMode, bpp: u32, num_samples: u32, hw: &HardwareProfile) -> Alignments {
    let bpp = match alignment_bpp(bpp) {
        3 => 1,
        bpp => bpp,
    };
    let thickness = tile_mode.thickness();
    let group = hw.pipe_interleave_bytes;

    let macro_width = macro_tile_width(tile_mode, hw);
    let macro_height = macro_tile_height(tile_mode, hw);

    let pitch_align = max(
        macro_width,
        macro_width * (group / bpp / (8 * thickness) / num_samples),
    );
    let height_align = macro_height;

    let mut macro_tile_bytes = num_samples * ((bpp * macro_height * macro_width + 7) >> 3);
    if hw.is_r6xx() && num_samples == 1 {
        macro_tile_bytes *= 2;
    }

    let mut base_align = if thickness == 1 {
        max(
            macro_tile_bytes,
            (num_samples * height_align * bpp * pitch_align + 7) >> 3,
        )
    } else {
        max(group, (4 * height_align * bpp * pitch_align + 7) >> 3)
    };

    let micro_tile_bytes = (thickness * num_samples * (bpp << 6) + 7) >> 3;
    let slices_per_micro_tile = if micro_tile_bytes < hw.split_size {
        1
    } else {
        micro_tile_bytes / hw.split_size
    };
    base_align /= slices_per_micro_tile;

    if hw.is_r6xx() {
        let macro_bytes = (bpp * macro_height * macro_width + 7) >> 3;
        if (base_align / macro_bytes) % 2 != 0 {
            base_align += macro_bytes;
        }
    }

    Alignments {
        base: base_align,
        pitch: pitch_align,
        height: height_align,
    }
}

fn macro_info(
    tile_mode: TileMode,
    requested: TileMode,
    input: &MipInput,
    hw: &HardwareProfile,
) -> SurfaceInfo {
    let (dims, pad_dims) = expand_mip_dims(input);
    let bpp = input.bpp;
    let num_samples = input.num_samples;

    let tile_mode = if input.mip_level > 0 && tile_mode == TileMode::Tiled2dThick && dims.slices < 4 {
        TileMode::Tiled2dThin1
    } else {
        tile_mode
    };

    // Thin mips of thick surfaces still need to fit the thick macro tile.
    if tile_mode != requested
        && input.mip_level > 0
        && requested.is_thick_macro_tiled()
        && !tile_mode.is_thick_macro_tiled()
    {
        let align = macro_alignments(requested, bpp, num_samples, hw);
        let pitch_align_factor = max(1, (hw.pipe_interleave_bytes >> 3) / max(bpp, 1));
        if dims.pitch < align.pitch * pitch_align_factor || dims.height < align.height {
            return micro_info(TileMode::Tiled1dThin1, input, hw);
        }
    }

    let align = macro_alignments(tile_mode, bpp, num_samples, hw);
    let bank_swapped_width =
        compute_surface_bank_swapped_width(tile_mode, bpp, input.width, num_samples, hw);
    let pitch_align = max(align.pitch, bank_swapped_width);

    let mut dims = dims;
    if needs_dual_pitch_align(tile_mode, input, hw) {
        let macro_width = macro_tile_width(tile_mode, hw);
        let macro_height = macro_tile_height(tile_mode, hw);
        let tiles_per_group = max(
            1,
            (hw.pipe_interleave_bytes >> 3) / bpp / num_samples / tile_mode.thickness(),
        );
        let even_height = ((dims.height - 1) / macro_height) & 1 == 0;
        let even_width = ((dims.pitch - 1) / macro_width) & 1 == 0;

        if num_samples == 1
            && tiles_per_group == 1
            && even_width
            && (dims.pitch > macro_width || (even_height && dims.height > macro_height))
        {
            dims.pitch += macro_width;
        }
    }

    let dims = pad_dimensions(
        dims,
        tile_mode,
        pad_dims,
        input.is_cube,
        pitch_align,
        align.height,
        hw,
    );

    SurfaceInfo {
        pitch: dims.pitch,
        height: dims.height,
        depth: dims.slices,
        bpp,
        surf_size: surface_size(dims, bpp, num_samples),
        tile_mode,
        base_align: align.base,
        pitch_align,
        height_align: align.height,
        depth_align: tile_mode.thickness(),
        is_block_compressed: false,
    }
}

fn needs_dual_pitch_align(tile_mode: TileMode, input: &MipInput, hw: &HardwareProfile) -> bool {
    hw.is_r6xx()
        && !input.is_depth_buffer
        && input.mip_level == 0
        && !tile_mode.is_thick_macro_tiled()
        && !matches!(
            tile_mode,
            TileMode::LinearGeneral
                | TileMode::LinearAligned
                | TileMode::Tiled1dThin1
                | TileMode::Tiled1dThick
        )
}

/// Computes the minimum pitch alignment in elements for bank swapped tile modes.
/// Returns 0 for modes without bank swapping.
///
/// The result is always less than `2 * pitch`.
/// # Examples
/**
```rust
use wiiu_swizzle::{compute_surface_bank_swapped_width, HardwareProfile, TileMode};

let hw = HardwareProfile::WII_U;
assert_eq!(128, compute_surface_bank_swapped_width(TileMode::Tiled2bThin1, 32, 256, 1, &hw));
assert_eq!(0, compute_surface_bank_swapped_width(TileMode::Tiled2dThin1, 32, 256, 1, &hw));
```
 */
pub fn compute_surface_bank_swapped_width(
    tile_mode: TileMode,
    bpp: u32,
    pitch: u32,
    num_samples: u32,
    hw: &HardwareProfile,
) -> u32 {
    if !tile_mode.is_bank_swapped() || bpp == 0 || pitch == 0 {
        return 0;
    }

    let bytes_per_sample = 8 * bpp;
    let slices_per_tile = match hw.split_size / bytes_per_sample {
        0 => 1,
        samples_per_tile => max(1, num_samples / samples_per_tile),
    };

    let num_samples = if tile_mode.is_thick_macro_tiled() {
        4
    } else {
        max(num_samples, 1)
    };
    let bytes_per_tile_slice = num_samples * bytes_per_sample / slices_per_tile;

    let swap_tiles = max(1, (hw.swap_size >> 1) / bpp);
    let swap_width = swap_tiles * 8 * hw.num_banks;
    let height_bytes = num_samples * tile_mode.aspect_ratio() * hw.num_pipes * bpp / slices_per_tile;
    let swap_max = hw.num_pipes * hw.num_banks * hw.row_size / max(1, height_bytes);
    let swap_min = hw.pipe_interleave_bytes * 8 * hw.num_banks / max(1, bytes_per_tile_slice);

    let mut bank_swap_width = min(swap_max, max(swap_min, swap_width));
    while bank_swap_width > 0 && bank_swap_width as u64 >= 2 * pitch as u64 {
        bank_swap_width >>= 1;
    }
    bank_swap_width
}

fn linear_special_info(desc: &SurfaceDescriptor, format: FormatInfo) -> SurfaceInfo {
    let block = format.block_dim();
    let bpp = format.bits_per_pixel;

    let width = desc.width.checked_shr(desc.mip_level).unwrap_or(0);
    let pitch = max(1, pow2_align(width, block) / block);

    let (height, slices) = mip_slices(desc);
    let height = max(1, pow2_align(height, block) / block);

    let dims = Dims {
        pitch,
        height,
        slices,
    };

    SurfaceInfo {
        pitch,
        height,
        depth: slices,
        bpp,
        surf_size: surface_size(dims, bpp, 1),
        tile_mode: TileMode::LinearSpecial,
        base_align: 1,
        pitch_align: 1,
        height_align: 1,
        depth_align: 1,
        is_block_compressed: format.is_block_compressed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HW: HardwareProfile = HardwareProfile::WII_U;
    const RGBA8: u32 = 0x1a;
    const BC1: u32 = 0x31;

    fn all_modes() -> impl Iterator<Item = TileMode> {
        (0..=16).filter_map(TileMode::new)
    }

    fn info(desc: SurfaceDescriptor) -> SurfaceInfo {
        compute_surface_info(&desc, &HW).unwrap()
    }

    #[test]
    fn linear_aligned_rgba8() {
        let info = info(SurfaceDescriptor::new_2d(RGBA8, 64, 64, TileMode::LinearAligned));
        assert_eq!(64, info.pitch);
        assert_eq!(64, info.height);
        assert_eq!(64, info.pitch_align);
        assert_eq!(1, info.height_align);
        assert_eq!(256, info.base_align);
        assert_eq!(16384, info.surf_size);
        assert_eq!(TileMode::LinearAligned, info.tile_mode);
    }

    #[test]
    fn linear_general_is_unpadded() {
        let info = info(SurfaceDescriptor::new_2d(RGBA8, 10, 3, TileMode::LinearGeneral));
        assert_eq!(10, info.pitch);
        assert_eq!(3, info.height);
        assert_eq!(10 * 3 * 4, info.surf_size);
    }

    #[test]
    fn macro_tiled_single_tile() {
        let info = info(SurfaceDescriptor::new_2d(RGBA8, 32, 16, TileMode::Tiled2dThin1));
        assert_eq!(TileMode::Tiled2dThin1, info.tile_mode);
        assert_eq!(32, info.pitch);
        assert_eq!(16, info.height);
        assert_eq!(32, info.pitch_align);
        assert_eq!(16, info.height_align);
        assert_eq!(2048, info.base_align);
        assert_eq!(2048, info.surf_size);
    }

    #[test]
    fn bc1_base_level() {
        let info = info(SurfaceDescriptor::new_2d(BC1, 256, 256, TileMode::Tiled2dThin1));
        assert_eq!(64, info.pitch);
        assert_eq!(64, info.height);
        assert_eq!(64, info.bpp);
        assert_eq!(32768, info.surf_size);
        assert!(info.is_block_compressed);
    }

    #[test]
    fn bc1_small_mip_uses_micro_tiling() {
        let info = info(SurfaceDescriptor {
            mip_level: 4,
            ..SurfaceDescriptor::new_2d(BC1, 256, 256, TileMode::Tiled2dThin1)
        });
        assert_eq!(TileMode::Tiled1dThin1, info.tile_mode);
        assert_eq!(8, info.pitch);
        assert_eq!(8, info.height);
        assert_eq!(8, info.pitch_align);
        assert_eq!(512, info.surf_size);
    }

    #[test]
    fn cube_map_slices() {
        let desc = SurfaceDescriptor {
            dim: SurfaceDim::Cube,
            ..SurfaceDescriptor::new_2d(RGBA8, 64, 64, TileMode::Tiled2dThin1)
        };
        let base = info(desc);
        assert_eq!(6, base.depth);
        assert_eq!(64 * 64 * 6 * 4, base.surf_size);

        // Mip levels pad the face count to a power of two.
        let mip1 = info(SurfaceDescriptor {
            mip_level: 1,
            ..desc
        });
        assert_eq!(TileMode::Tiled2dThin1, mip1.tile_mode);
        assert_eq!(32, mip1.pitch);
        assert_eq!(8, mip1.depth);
        assert_eq!(32 * 32 * 8 * 4, mip1.surf_size);
    }

    #[test]
    fn thick_3d_surface() {
        let info = info(SurfaceDescriptor {
            depth: 4,
            dim: SurfaceDim::Dim3d,
            ..SurfaceDescriptor::new_2d(RGBA8, 64, 64, TileMode::Tiled2dThick)
        });
        assert_eq!(TileMode::Tiled2dThick, info.tile_mode);
        assert_eq!(4, info.depth);
        assert_eq!(4, info.depth_align);
        assert_eq!(8192, info.base_align);
        assert_eq!(65536, info.surf_size);
    }

    #[test]
    fn thick_3d_mip_becomes_thin() {
        let info = info(SurfaceDescriptor {
            depth: 4,
            dim: SurfaceDim::Dim3d,
            mip_level: 1,
            ..SurfaceDescriptor::new_2d(RGBA8, 64, 64, TileMode::Tiled2dThick)
        });
        assert_eq!(TileMode::Tiled2dThin1, info.tile_mode);
        assert_eq!(32, info.pitch);
        assert_eq!(32, info.height);
        assert_eq!(2, info.depth);
        assert_eq!(8192, info.surf_size);
    }

    #[test]
    fn thick_3d_mip_falls_back_to_micro() {
        // 8 bpp thick macro tiles need a pitch of at least 128 elements.
        let info = info(SurfaceDescriptor {
            depth: 4,
            dim: SurfaceDim::Dim3d,
            mip_level: 1,
            ..SurfaceDescriptor::new_2d(0x01, 64, 64, TileMode::Tiled2dThick)
        });
        assert_eq!(TileMode::Tiled1dThin1, info.tile_mode);
        assert_eq!(32, info.pitch);
        assert_eq!(32, info.height);
        assert_eq!(2, info.depth);
        assert_eq!(2048, info.surf_size);
    }

    #[test]
    fn bank_swapped_pitch_align() {
        let info = info(SurfaceDescriptor::new_2d(RGBA8, 256, 64, TileMode::Tiled2bThin1));
        assert_eq!(TileMode::Tiled2bThin1, info.tile_mode);
        assert_eq!(128, info.pitch_align);
        assert_eq!(256, info.pitch);
    }

    #[test]
    fn bank_swapped_width_halves_for_small_pitch() {
        assert_eq!(
            128,
            compute_surface_bank_swapped_width(TileMode::Tiled2bThin1, 32, 256, 1, &HW)
        );
        assert_eq!(
            32,
            compute_surface_bank_swapped_width(TileMode::Tiled2bThin1, 32, 32, 1, &HW)
        );
        assert_eq!(
            0,
            compute_surface_bank_swapped_width(TileMode::Tiled2bThin1, 32, 0, 1, &HW)
        );
        assert_eq!(
            0,
            compute_surface_bank_swapped_width(TileMode::Tiled3dThin1, 32, 256, 1, &HW)
        );
    }

    #[test]
    fn bank_swapped_width_less_than_twice_pitch() {
        let swapped = all_modes().filter(|m| m.is_bank_swapped());
        for mode in swapped {
            for bpp in [8, 16, 32, 64, 96, 128] {
                for pitch in (6..=13).map(|i| 1 << i) {
                    let width = compute_surface_bank_swapped_width(mode, bpp, pitch, 1, &HW);
                    assert!(width < 2 * pitch, "{:?} {} {}", mode, bpp, pitch);
                }
            }
        }
    }

    #[test]
    fn alignment_invariants() {
        for mode in all_modes() {
            for format in [0x01, 0x07, RGBA8, 0x1f, 0x22, BC1, 0x33] {
                for width in (4..=12).map(|i| 1 << i) {
                    for height in (4..=12).map(|i| 1 << i) {
                        let desc = SurfaceDescriptor::new_2d(format, width, height, mode);
                        let info = info(desc);
                        assert_eq!(0, info.pitch % info.pitch_align, "{:?}", desc);
                        assert_eq!(0, info.height % info.height_align, "{:?}", desc);
                        assert_eq!(info.tile_mode.thickness(), info.depth_align);
                        assert!(info.tile_mode.tiling_rank() <= mode.tiling_rank());

                        let expected_size = (info.pitch as u64
                            * info.height as u64
                            * info.depth as u64
                            * info.bpp as u64
                            + 7)
                            / 8;
                        assert_eq!(expected_size, info.surf_size, "{:?}", desc);
                    }
                }
            }
        }
    }

    #[test]
    fn mip_levels_never_increase_rank() {
        let desc = SurfaceDescriptor::new_2d(RGBA8, 300, 200, TileMode::Tiled2bThin2);
        let infos = mip_surface_infos(&desc, 9, &HW).unwrap();
        assert_eq!(9, infos.len());
        for window in infos.windows(2) {
            assert!(window[1].tile_mode.tiling_rank() <= window[0].tile_mode.tiling_rank());
        }
        assert_eq!(TileMode::Tiled1dThin1, infos[8].tile_mode);
    }

    #[test]
    fn linear_special_bc1() {
        let info = info(SurfaceDescriptor::new_2d(BC1, 10, 10, TileMode::LinearSpecial));
        assert_eq!(3, info.pitch);
        assert_eq!(3, info.height);
        assert_eq!(1, info.pitch_align);
        assert_eq!(72, info.surf_size);
    }

    #[test]
    fn linear_special_bc5() {
        let info = info(SurfaceDescriptor::new_2d(0x35, 16, 16, TileMode::LinearSpecial));
        assert_eq!(4, info.pitch);
        assert_eq!(256, info.surf_size);
    }

    #[test]
    fn mip_dimensions() {
        assert_eq!((64, 32), mip_level_dimensions(256, 128, 2));
        assert_eq!((1, 1), mip_level_dimensions(256, 128, 10));
        assert_eq!((1, 1), mip_level_dimensions(256, 128, 40));
    }

    #[test]
    fn swizzle_value() {
        let desc = SurfaceDescriptor::new_2d(RGBA8, 4, 4, TileMode::Tiled2dThin1).with_swizzle(0x700);
        assert_eq!(1, desc.pipe_swizzle);
        assert_eq!(3, desc.bank_swizzle);
        assert_eq!(0x700, desc.swizzle());
    }

    #[test]
    fn surface_dim_from_u32() {
        assert_eq!(Ok(SurfaceDim::Cube), SurfaceDim::try_from(3));
        assert_eq!(
            Err(SurfaceError::UnsupportedSurfaceDim(8)),
            SurfaceDim::try_from(8)
        );
    }

    #[test]
    fn three_component_surface() {
        // R32_G32_B32_UINT aligns like a 32 bpp format but stores 12 bytes per pixel.
        let desc = SurfaceDescriptor::new_2d(0x2f, 64, 64, TileMode::Tiled2dThin1);
        let base = info(desc);
        assert_eq!(TileMode::Tiled2dThin1, base.tile_mode);
        assert_eq!(96, base.bpp);
        assert_eq!(32, base.pitch_align);
        assert_eq!(16, base.height_align);
        assert_eq!(64, base.pitch);
        assert_eq!(64 * 64 * 12, base.surf_size);

        let mip1 = info(SurfaceDescriptor { mip_level: 1, ..desc });
        assert_eq!(TileMode::Tiled2dThin1, mip1.tile_mode);
        assert_eq!(32 * 32 * 12, mip1.surf_size);

        let mip2 = info(SurfaceDescriptor { mip_level: 2, ..desc });
        assert_eq!(TileMode::Tiled1dThin1, mip2.tile_mode);
    }

    #[test]
    fn invalid_surfaces() {
        let desc = SurfaceDescriptor::new_2d(RGBA8, 64, 64, TileMode::Tiled2dThin1);
        assert_eq!(
            Err(SurfaceError::UnsupportedFormat(0x3f)),
            compute_surface_info(&SurfaceDescriptor { format: 0x3f, ..desc }, &HW)
        );
        assert_eq!(
            Err(SurfaceError::InvalidDimensions {
                width: 0,
                height: 64,
                depth: 1
            }),
            compute_surface_info(&SurfaceDescriptor { width: 0, ..desc }, &HW)
        );
        assert_eq!(
            Err(SurfaceError::InvalidDimensions {
                width: 64,
                height: 32768,
                depth: 1
            }),
            compute_surface_info(&SurfaceDescriptor { height: 32768, ..desc }, &HW)
        );
        assert_eq!(
            Err(SurfaceError::UnsupportedSampleCount(4)),
            compute_surface_info(&SurfaceDescriptor { sample_count: 4, ..desc }, &HW)
        );
        // A sample count of 0 is treated as single sampled.
        assert!(compute_surface_info(&SurfaceDescriptor { sample_count: 0, ..desc }, &HW).is_ok());
    }
}
