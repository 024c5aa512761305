//! # wiiu_swizzle
//! wiiu_swizzle is an unofficial CPU implementation of the Wii U (GX2) surface tiling
//! and address computation used by the R600/R700 family address library.
//!
//! # Getting Started
//! The following example demonstrates deswizzling the mipmaps of a BC1 compressed 2D surface.
//! BC1 has 4x4 pixel blocks that each take up 8 bytes.
//! The surface geometry for each mip level is computed with [compute_surface_info].
/*!
```rust no_run
use wiiu_swizzle::{
    compute_surface_info, deswizzle, HardwareProfile, SurfaceDescriptor, TileMode,
};
# fn main() -> Result<(), wiiu_swizzle::SurfaceError> {
# let image_data = vec![0u8; 4];
# let mip_data = vec![0u8; 4];
# let mip_offsets = [0u32; 13];
let hw = HardwareProfile::WII_U;
let width = 256;
let height = 128;
let mipmap_count = 4;
// GX2 stores the pipe and bank swizzle in bits 8 to 10 of the swizzle value.
let swizzle = 0x200;

for mip in 0..mipmap_count {
    let descriptor = SurfaceDescriptor {
        mip_level: mip,
        ..SurfaceDescriptor::new_2d(0x31, width, height, TileMode::Tiled2dThin1)
    };
    let info = compute_surface_info(&descriptor, &hw)?;

    // The first level is stored separately from the remaining levels.
    let data = if mip == 0 {
        &image_data[..]
    } else {
        &mip_data[mip_offsets[mip as usize - 1] as usize..]
    };

    let mip_width = std::cmp::max(width >> mip, 1);
    let mip_height = std::cmp::max(height >> mip, 1);
    let deswizzled = deswizzle(mip_width, mip_height, &info, swizzle, data, &hw)?;
}
# Ok(())
# }
```
*/
//! # Surface Tiling
//! GX2 surfaces are laid out in one of several tile modes.
//! Linear modes store rows of elements one after another with some padding.
//! Micro tiled modes store 8x8 element tiles contiguously.
//! Macro tiled modes additionally distribute the micro tiles of a macro tile
//! across memory pipes and banks to increase bandwidth.
//!
//! The padded geometry of a surface depends on the format, the dimensions,
//! the mip level, and the requested tile mode. Small mip levels may use
//! a simpler tile mode than the one requested. See [resolve_tile_mode].
//!
//! # Limitations
//! Only single sampled surfaces are supported.
//! Block compressed data is moved as opaque 4x4 blocks and never decoded.
use thiserror::Error;

pub mod addr;
mod format;
mod hardware;
mod surface;
pub mod swizzle;
mod tilemode;

// Avoid making this module public to prevent people importing it accidentally.
#[cfg(feature = "ffi")]
mod ffi;

pub use format::*;
pub use hardware::*;
pub use surface::*;
pub use swizzle::{deswizzle, deswizzle_surface, swizzle, swizzle_surface, SwizzleStats};
pub use tilemode::*;

/// The number of pixels in an 8x8 micro tile.
pub const MICRO_TILE_PIXELS: u32 = 64;

/// The largest supported width or height in pixels.
pub const MAX_DIMENSION: u32 = 16384;

/// The largest supported depth or array layer count.
pub const MAX_DEPTH: u32 = 8192;

/// Errors than can occur while computing surface layouts or swizzling.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum SurfaceError {
    /// The format code does not have an entry in the format table.
    #[error("Unsupported surface format 0x{0:x}.")]
    UnsupportedFormat(u32),

    /// The tile mode code is outside the range 0 to 16.
    #[error("Unsupported tile mode {0}.")]
    UnsupportedTileMode(u32),

    /// The surface dimension code is outside the range 0 to 7.
    #[error("Unsupported surface dimension {0}.")]
    UnsupportedSurfaceDim(u32),

    /// Multisampled surfaces are not supported.
    #[error("Unsupported sample count {0}. Only single sampled surfaces are supported.")]
    UnsupportedSampleCount(u32),

    /// The width or height is zero or the surface exceeds the supported size.
    #[error("Invalid surface dimensions {width}x{height}x{depth}.")]
    InvalidDimensions { width: u32, height: u32, depth: u32 },

    /// The container specifies more mip levels than it can store.
    #[error("Invalid mipmap count {mip_count}. Expected at most {max_mip_count}.")]
    InvalidMipCount { mip_count: u32, max_mip_count: u32 },

    /// The source data does not contain enough bytes.
    #[error("Not enough data. Expected {expected_size} bytes but found {actual_size} bytes.")]
    NotEnoughData {
        expected_size: usize,
        actual_size: usize,
    },
}

/// Calculates the division of `x` by `d` but rounds up rather than truncating.
///
/// # Examples
/// Use this function when calculating dimensions for block compressed formats like BC1.
/**
```rust
# use wiiu_swizzle::div_round_up;
assert_eq!(2, div_round_up(8, 4));
assert_eq!(3, div_round_up(10, 4));
```
 */
#[inline]
pub const fn div_round_up(x: u32, d: u32) -> u32 {
    (x + d - 1) / d
}

/// Rounds `x` up to the next multiple of `align`, which must be a power of two.
#[inline]
pub(crate) const fn pow2_align(x: u32, align: u32) -> u32 {
    (x + align - 1) & !(align - 1)
}

/// The smallest power of two greater than or equal to `x` with a minimum of 1.
#[inline]
pub(crate) const fn next_pow2(x: u32) -> u32 {
    if x > 0x8000_0000 {
        0x8000_0000
    } else {
        x.next_power_of_two()
    }
}

#[inline]
pub(crate) const fn is_pow2(x: u32) -> bool {
    x & x.wrapping_sub(1) == 0
}
