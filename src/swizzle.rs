//! Functions for tiling and untiling a single surface mip level.
//!
//! The tiled layout is described by the [SurfaceInfo] of the mip level.
//! The untiled layout is tightly packed with rows of `width` elements,
//! so block compressed formats have rows of `div_round_up(width, 4)` blocks.
//!
//! Tiled data found in files is frequently smaller than the padded surface size.
//! Elements that would read or write outside the provided buffers are skipped
//! and counted in [SwizzleStats] rather than returning an error.
use log::{debug, warn};

use crate::{
    addr::{element_offset, Coord},
    bank_swizzle, div_round_up, pipe_swizzle, HardwareProfile, SurfaceError, SurfaceInfo,
};

/// The number of elements copied and skipped by a swizzle or deswizzle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwizzleStats {
    pub copied: usize,
    /// Elements whose source or destination range was outside the buffer.
    pub skipped: usize,
}

/// The number of elements in each dimension of a mip level that is `width` x `height` pixels.
pub fn element_dimensions(width: u32, height: u32, info: &SurfaceInfo) -> (u32, u32) {
    if info.is_block_compressed {
        (div_round_up(width, 4), div_round_up(height, 4))
    } else {
        (width, height)
    }
}

/// The size in bytes of the untiled data for `depth` slices of a mip level that is `width` x `height` pixels.
/// Returns [SurfaceError::InvalidDimensions] if the size does not fit in a `usize`.
/// # Examples
/**
```rust
use wiiu_swizzle::{compute_surface_info, swizzle::deswizzled_size, HardwareProfile, SurfaceDescriptor, TileMode};

// BC1 has 4x4 pixel blocks that each take up 8 bytes.
let descriptor = SurfaceDescriptor::new_2d(0x31, 30, 30, TileMode::Tiled2dThin1);
let info = compute_surface_info(&descriptor, &HardwareProfile::WII_U).unwrap();
assert_eq!(Ok(8 * 8 * 8), deswizzled_size(30, 30, 1, &info));
```
 */
pub fn deswizzled_size(
    width: u32,
    height: u32,
    depth: u32,
    info: &SurfaceInfo,
) -> Result<usize, SurfaceError> {
    let (element_width, element_height) = element_dimensions(width, height, info);
    (element_width as usize)
        .checked_mul(element_height as usize)
        .and_then(|size| size.checked_mul(depth as usize))
        .and_then(|size| size.checked_mul(info.bytes_per_element() as usize))
        .ok_or(SurfaceError::InvalidDimensions {
            width,
            height,
            depth,
        })
}

/// Tiles the bytes from `source` using the tiling described by `info`.
///
/// The result has a size of [SurfaceInfo::surf_size] bytes.
/// Any padding not covered by `source` is set to zero.
/// `swizzle` is the GX2 swizzle value containing the pipe and bank swizzle.
/// # Examples
/**
```rust
use wiiu_swizzle::{compute_surface_info, swizzle, HardwareProfile, SurfaceDescriptor, TileMode};

let hw = HardwareProfile::WII_U;
let descriptor = SurfaceDescriptor::new_2d(0x1a, 64, 64, TileMode::Tiled2dThin1);
let info = compute_surface_info(&descriptor, &hw).unwrap();

let input = vec![0u8; 64 * 64 * 4];
let output = swizzle(64, 64, &info, 0, &input, &hw);
assert_eq!(info.surf_size as usize, output.len());
```
 */
pub fn swizzle(
    width: u32,
    height: u32,
    info: &SurfaceInfo,
    swizzle: u32,
    source: &[u8],
    hw: &HardwareProfile,
) -> Vec<u8> {
    swizzle_with_stats(width, height, info, swizzle, source, hw).0
}

/// Untiles the bytes from `source` using the tiling described by `info`.
///
/// The result has a size of [deswizzled_size] bytes.
/// Elements not covered by `source` are set to zero.
/// Fails only if the untiled size does not fit in memory.
/// # Examples
/**
```rust
use wiiu_swizzle::{compute_surface_info, deswizzle, HardwareProfile, SurfaceDescriptor, TileMode};

let hw = HardwareProfile::WII_U;
let descriptor = SurfaceDescriptor::new_2d(0x1a, 64, 64, TileMode::Tiled2dThin1);
let info = compute_surface_info(&descriptor, &hw).unwrap();

let input = vec![0u8; info.surf_size as usize];
let output = deswizzle(64, 64, &info, 0, &input, &hw).unwrap();
assert_eq!(64 * 64 * 4, output.len());
```
 */
pub fn deswizzle(
    width: u32,
    height: u32,
    info: &SurfaceInfo,
    swizzle: u32,
    source: &[u8],
    hw: &HardwareProfile,
) -> Result<Vec<u8>, SurfaceError> {
    deswizzle_with_stats(width, height, info, swizzle, source, hw).map(|(data, _)| data)
}

/// Identical to [swizzle] but also returns the number of copied and skipped elements.
pub fn swizzle_with_stats(
    width: u32,
    height: u32,
    info: &SurfaceInfo,
    swizzle: u32,
    source: &[u8],
    hw: &HardwareProfile,
) -> (Vec<u8>, SwizzleStats) {
    let destination = vec![0u8; info.surf_size as usize];
    surface_with_stats(width, height, 1, info, swizzle, source, destination, hw, false)
}

/// Identical to [deswizzle] but also returns the number of copied and skipped elements.
pub fn deswizzle_with_stats(
    width: u32,
    height: u32,
    info: &SurfaceInfo,
    swizzle: u32,
    source: &[u8],
    hw: &HardwareProfile,
) -> Result<(Vec<u8>, SwizzleStats), SurfaceError> {
    let destination = vec![0u8; deswizzled_size(width, height, 1, info)?];
    Ok(surface_with_stats(
        width,
        height,
        1,
        info,
        swizzle,
        source,
        destination,
        hw,
        true,
    ))
}

/// Tiles `depth` slices of a mip level like the depth slices of a 3D surface or the faces of a cube map.
///
/// Slices in `source` are stored one after another.
pub fn swizzle_surface(
    width: u32,
    height: u32,
    depth: u32,
    info: &SurfaceInfo,
    swizzle: u32,
    source: &[u8],
    hw: &HardwareProfile,
) -> Vec<u8> {
    let destination = vec![0u8; info.surf_size as usize];
    surface_with_stats(width, height, depth, info, swizzle, source, destination, hw, false).0
}

/// Untiles `depth` slices of a mip level. The inverse of [swizzle_surface].
pub fn deswizzle_surface(
    width: u32,
    height: u32,
    depth: u32,
    info: &SurfaceInfo,
    swizzle: u32,
    source: &[u8],
    hw: &HardwareProfile,
) -> Result<Vec<u8>, SurfaceError> {
    let destination = vec![0u8; deswizzled_size(width, height, depth, info)?];
    Ok(surface_with_stats(width, height, depth, info, swizzle, source, destination, hw, true).0)
}

fn surface_with_stats(
    width: u32,
    height: u32,
    depth: u32,
    info: &SurfaceInfo,
    swizzle: u32,
    source: &[u8],
    mut destination: Vec<u8>,
    hw: &HardwareProfile,
    deswizzle: bool,
) -> (Vec<u8>, SwizzleStats) {
    let stats = swizzle_inner(
        width,
        height,
        depth,
        info,
        swizzle,
        source,
        &mut destination,
        hw,
        deswizzle,
    );
    (destination, stats)
}

pub(crate) fn swizzle_inner(
    width: u32,
    height: u32,
    depth: u32,
    info: &SurfaceInfo,
    swizzle: u32,
    source: &[u8],
    destination: &mut [u8],
    hw: &HardwareProfile,
    deswizzle: bool,
) -> SwizzleStats {
    let (width, height) = element_dimensions(width, height, info);
    let bytes_per_element = info.bytes_per_element() as usize;
    let pipe_swizzle = pipe_swizzle(swizzle);
    let bank_swizzle = bank_swizzle(swizzle);

    let mut stats = SwizzleStats::default();
    for z in 0..depth {
        for y in 0..height {
            for x in 0..width {
                let tiled = element_offset(Coord::new(x, y, z), info, pipe_swizzle, bank_swizzle, hw)
                    as usize;
                let linear = ((z as usize * height as usize + y as usize) * width as usize
                    + x as usize)
                    * bytes_per_element;

                // Swap the offsets for swizzling or deswizzling.
                let (src, dst) = if deswizzle {
                    (tiled, linear)
                } else {
                    (linear, tiled)
                };

                if src + bytes_per_element <= source.len()
                    && dst + bytes_per_element <= destination.len()
                {
                    destination[dst..dst + bytes_per_element]
                        .copy_from_slice(&source[src..src + bytes_per_element]);
                    stats.copied += 1;
                } else {
                    stats.skipped += 1;
                }
            }
        }
    }

    if stats.skipped > 0 {
        warn!(
            "Skipped {} of {} elements for {}x{}x{} {:?} surface outside buffer bounds.",
            stats.skipped,
            stats.copied + stats.skipped,
            width,
            height,
            depth,
            info.tile_mode
        );
    } else {
        debug!(
            "Copied {} elements for {}x{}x{} {:?} surface.",
            stats.copied, width, height, depth, info.tile_mode
        );
    }

    stats
}
