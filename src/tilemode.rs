use std::convert::TryFrom;

use log::{trace, warn};

use crate::{format::is_three_component, next_pow2, HardwareProfile, SurfaceError};

/// The maximum number of legalization passes used by [resolve_tile_mode].
pub const MAX_TILE_MODE_PASSES: usize = 4;

/// An enumeration of GX2 tile modes.
///
/// The "2B" and "3B" modes are the bank swapped variants of the "2D" and "3D" modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[repr(u32)]
pub enum TileMode {
    LinearGeneral = 0,
    LinearAligned = 1,
    Tiled1dThin1 = 2,
    Tiled1dThick = 3,
    Tiled2dThin1 = 4,
    Tiled2dThin2 = 5,
    Tiled2dThin4 = 6,
    Tiled2dThick = 7,
    Tiled2bThin1 = 8,
    Tiled2bThin2 = 9,
    Tiled2bThin4 = 10,
    Tiled2bThick = 11,
    Tiled3dThin1 = 12,
    Tiled3dThick = 13,
    Tiled3bThin1 = 14,
    Tiled3bThick = 15,
    LinearSpecial = 16,
}

impl TryFrom<u32> for TileMode {
    type Error = SurfaceError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        TileMode::new(value).ok_or(SurfaceError::UnsupportedTileMode(value))
    }
}

impl TileMode {
    /// Attempts to construct a tile mode from `value`.
    /// Returns [None] if `value` is not a supported tile mode.
    /// # Examples
    /**
    ```rust
    use wiiu_swizzle::TileMode;

    assert_eq!(Some(TileMode::Tiled2dThin1), TileMode::new(4));
    assert_eq!(None, TileMode::new(17));
    ```
    */
    pub fn new(value: u32) -> Option<Self> {
        match value {
            0 => Some(TileMode::LinearGeneral),
            1 => Some(TileMode::LinearAligned),
            2 => Some(TileMode::Tiled1dThin1),
            3 => Some(TileMode::Tiled1dThick),
            4 => Some(TileMode::Tiled2dThin1),
            5 => Some(TileMode::Tiled2dThin2),
            6 => Some(TileMode::Tiled2dThin4),
            7 => Some(TileMode::Tiled2dThick),
            8 => Some(TileMode::Tiled2bThin1),
            9 => Some(TileMode::Tiled2bThin2),
            10 => Some(TileMode::Tiled2bThin4),
            11 => Some(TileMode::Tiled2bThick),
            12 => Some(TileMode::Tiled3dThin1),
            13 => Some(TileMode::Tiled3dThick),
            14 => Some(TileMode::Tiled3bThin1),
            15 => Some(TileMode::Tiled3bThick),
            16 => Some(TileMode::LinearSpecial),
            _ => None,
        }
    }

    /// The number of slices stored in a single micro tile.
    pub const fn thickness(self) -> u32 {
        match self {
            TileMode::Tiled1dThick
            | TileMode::Tiled2dThick
            | TileMode::Tiled2bThick
            | TileMode::Tiled3dThick
            | TileMode::Tiled3bThick => 4,
            _ => 1,
        }
    }

    /// Linear modes address elements in row-major order.
    pub const fn is_linear(self) -> bool {
        matches!(
            self,
            TileMode::LinearGeneral | TileMode::LinearAligned | TileMode::LinearSpecial
        )
    }

    pub const fn is_micro_tiled(self) -> bool {
        matches!(self, TileMode::Tiled1dThin1 | TileMode::Tiled1dThick)
    }

    pub const fn is_macro_tiled(self) -> bool {
        !self.is_linear() && !self.is_micro_tiled()
    }

    pub const fn is_bank_swapped(self) -> bool {
        matches!(
            self,
            TileMode::Tiled2bThin1
                | TileMode::Tiled2bThin2
                | TileMode::Tiled2bThin4
                | TileMode::Tiled2bThick
                | TileMode::Tiled3bThin1
                | TileMode::Tiled3bThick
        )
    }

    pub const fn is_thick_macro_tiled(self) -> bool {
        matches!(
            self,
            TileMode::Tiled2dThick
                | TileMode::Tiled2bThick
                | TileMode::Tiled3dThick
                | TileMode::Tiled3bThick
        )
    }

    /// The ratio of macro tile height to width relative to a square macro tile.
    pub const fn aspect_ratio(self) -> u32 {
        match self {
            TileMode::Tiled2dThin2 | TileMode::Tiled2bThin2 => 2,
            TileMode::Tiled2dThin4 | TileMode::Tiled2bThin4 => 4,
            _ => 1,
        }
    }

    /// The equivalent mode without bank swapping.
    pub const fn non_bank_swapped(self) -> Self {
        match self {
            TileMode::Tiled2bThin1 => TileMode::Tiled2dThin1,
            TileMode::Tiled2bThin2 => TileMode::Tiled2dThin2,
            TileMode::Tiled2bThin4 => TileMode::Tiled2dThin4,
            TileMode::Tiled2bThick => TileMode::Tiled2dThick,
            TileMode::Tiled3bThin1 => TileMode::Tiled3dThin1,
            TileMode::Tiled3bThick => TileMode::Tiled3dThick,
            mode => mode,
        }
    }

    /// The pipe and bank rotation applied to each successive slice.
    pub const fn rotation(self, hw: &HardwareProfile) -> u32 {
        match self {
            TileMode::Tiled2dThin1
            | TileMode::Tiled2dThin2
            | TileMode::Tiled2dThin4
            | TileMode::Tiled2dThick
            | TileMode::Tiled2bThin1
            | TileMode::Tiled2bThin2
            | TileMode::Tiled2bThin4
            | TileMode::Tiled2bThick => hw.num_pipes * ((hw.num_banks >> 1).saturating_sub(1)),
            TileMode::Tiled3dThin1
            | TileMode::Tiled3dThick
            | TileMode::Tiled3bThin1
            | TileMode::Tiled3bThick => 1,
            _ => 0,
        }
    }

    /// Linear modes rank 0, micro tiled modes rank 1, and macro tiled modes rank 2.
    /// Resolving a tile mode never increases the rank.
    pub const fn tiling_rank(self) -> u32 {
        if self.is_linear() {
            0
        } else if self.is_micro_tiled() {
            1
        } else {
            2
        }
    }
}

/// The number of slices a single tile is split into for the given element size.
pub(crate) fn tile_slices(tile_mode: TileMode, bpp: u32, num_samples: u32, hw: &HardwareProfile) -> u32 {
    let bytes_per_sample = ((bpp << 6) + 7) >> 3;
    let num_samples = if tile_mode.thickness() > 1 {
        4
    } else {
        num_samples
    };

    if bytes_per_sample == 0 {
        return 1;
    }
    match hw.split_size / bytes_per_sample {
        0 => 1,
        samples_per_tile => std::cmp::max(1, num_samples / samples_per_tile),
    }
}

/// Computes the tile mode actually used for a surface mip level.
///
/// The requested mode is degraded to a simpler mode when the surface is too small
/// for the requested tiling or the tiling is not legal for the surface.
/// The result is never more complex than `requested`.
/// # Examples
/**
```rust
use wiiu_swizzle::{resolve_tile_mode, HardwareProfile, TileMode};

let hw = HardwareProfile::WII_U;

// The base level is large enough for 2D tiling.
let mode = resolve_tile_mode(TileMode::Tiled2dThin1, 32, 0, 64, 64, 1, 1, false, &hw);
assert_eq!(TileMode::Tiled2dThin1, mode);

// A 4x4 mip is smaller than a single macro tile.
let mode = resolve_tile_mode(TileMode::Tiled2dThin1, 32, 4, 4, 4, 1, 1, false, &hw);
assert_eq!(TileMode::Tiled1dThin1, mode);
```
 */
pub fn resolve_tile_mode(
    requested: TileMode,
    bpp: u32,
    mip_level: u32,
    width: u32,
    height: u32,
    num_slices: u32,
    num_samples: u32,
    is_depth_buffer: bool,
    hw: &HardwareProfile,
) -> TileMode {
    if requested == TileMode::LinearSpecial {
        return requested;
    }

    // Mip levels are legalized against power of two dimensions and a single component size.
    let (mip_bpp, width, height, num_slices) = if mip_level > 0 {
        let bpp = if is_three_component(bpp) { bpp / 3 } else { bpp };
        (bpp, next_pow2(width), next_pow2(height), next_pow2(num_slices))
    } else {
        (bpp, width, height, num_slices)
    };

    // A demoted mode may itself need legalizing, so later passes repeat the checks until nothing changes.
    // This also runs a confirming pass for the base level, which never changes the single pass result.
    let mut mode = requested;
    for pass in 0..MAX_TILE_MODE_PASSES {
        let pass_bpp = if pass == 0 { bpp } else { mip_bpp };
        let mut next = legalize_tile_mode(mode, pass_bpp, num_samples, is_depth_buffer, hw);

        if mip_level > 0 && pass == 0 {
            next = degrade_for_mip(next, mip_bpp, width, height, num_slices, num_samples, hw);
        }

        if next == mode && pass > 0 {
            return mode;
        }

        if next != mode {
            trace!("Tile mode {:?} resolved to {:?} for mip {}", mode, next, mip_level);
        }
        mode = next;
    }

    warn!(
        "Tile mode {:?} did not stabilize after {} passes. Using {:?}.",
        requested, MAX_TILE_MODE_PASSES, mode
    );
    mode
}

// A single pass of tile mode legalization independent of the mip dimensions.
fn legalize_tile_mode(
    tile_mode: TileMode,
    bpp: u32,
    num_samples: u32,
    is_depth_buffer: bool,
    hw: &HardwareProfile,
) -> TileMode {
    let slices = tile_slices(tile_mode, bpp, num_samples, hw);
    let thin_needed = num_samples > 1 || slices > 1 || is_depth_buffer;
    let group = hw.pipe_interleave_bytes;

    let mode = match tile_mode {
        TileMode::Tiled2dThin2 if 2 * group > hw.split_size => TileMode::Tiled2dThin1,
        TileMode::Tiled2dThin4 if 4 * group > hw.split_size => TileMode::Tiled2dThin2,
        TileMode::Tiled2bThin2 if 2 * group > hw.split_size => TileMode::Tiled2bThin1,
        TileMode::Tiled2bThin4 if 4 * group > hw.split_size => TileMode::Tiled2bThin2,
        TileMode::Tiled2dThick if thin_needed => TileMode::Tiled2dThin1,
        TileMode::Tiled3dThick if thin_needed => TileMode::Tiled3dThin1,
        TileMode::Tiled2bThick if thin_needed => TileMode::Tiled2bThin1,
        TileMode::Tiled3bThick if thin_needed => TileMode::Tiled3bThin1,
        TileMode::Tiled1dThin1 if num_samples > 1 && hw.promote_msaa_micro_tiling => {
            TileMode::Tiled2dThin1
        }
        TileMode::Tiled1dThick if matches!(num_samples, 2 | 4) => TileMode::Tiled2dThick,
        TileMode::Tiled1dThick if num_samples > 1 || is_depth_buffer => TileMode::Tiled1dThin1,
        mode => mode,
    };

    // 3D tiling without rotation across pipes is equivalent to 2D tiling.
    if mode.rotation(hw) % hw.num_pipes == 0 {
        match mode {
            TileMode::Tiled3dThin1 => TileMode::Tiled2dThin1,
            TileMode::Tiled3bThin1 => TileMode::Tiled2bThin1,
            TileMode::Tiled3dThick => TileMode::Tiled2dThick,
            TileMode::Tiled3bThick => TileMode::Tiled2bThick,
            mode => mode,
        }
    } else {
        mode
    }
}

// Mips smaller than a macro tile use micro tiling, and thick modes need at least 4 slices.
fn degrade_for_mip(
    tile_mode: TileMode,
    bpp: u32,
    width: u32,
    height: u32,
    num_slices: u32,
    num_samples: u32,
    hw: &HardwareProfile,
) -> TileMode {
    let tile_mode = tile_mode.non_bank_swapped();

    let micro_tile_bytes = (num_samples * bpp * (tile_mode.thickness() << 6) + 7) >> 3;
    let width_align_factor = if micro_tile_bytes >= hw.pipe_interleave_bytes || micro_tile_bytes == 0 {
        1
    } else {
        hw.pipe_interleave_bytes / micro_tile_bytes
    };

    let aspect_ratio = tile_mode.aspect_ratio();
    let macro_tile_width = 8 * hw.num_banks / aspect_ratio;
    let macro_tile_height = 8 * hw.num_pipes * aspect_ratio;
    let too_small = width < width_align_factor * macro_tile_width || height < macro_tile_height;

    let tile_mode = match tile_mode {
        TileMode::Tiled2dThin1
        | TileMode::Tiled3dThin1
        | TileMode::Tiled2dThin2
        | TileMode::Tiled2dThin4
            if too_small =>
        {
            TileMode::Tiled1dThin1
        }
        TileMode::Tiled2dThick | TileMode::Tiled3dThick if too_small => TileMode::Tiled1dThick,
        mode => mode,
    };

    if num_slices < 4 {
        match tile_mode {
            TileMode::Tiled1dThick => TileMode::Tiled1dThin1,
            TileMode::Tiled2dThick => TileMode::Tiled2dThin1,
            TileMode::Tiled3dThick => TileMode::Tiled3dThin1,
            mode => mode,
        }
    } else {
        tile_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HW: HardwareProfile = HardwareProfile::WII_U;

    fn all_modes() -> impl Iterator<Item = TileMode> {
        (0..=16).filter_map(TileMode::new)
    }

    #[test]
    fn tile_mode_from_u32() {
        for value in 0..=16 {
            assert_eq!(value, TileMode::try_from(value).unwrap() as u32);
        }
        assert_eq!(
            Err(SurfaceError::UnsupportedTileMode(17)),
            TileMode::try_from(17)
        );
    }

    #[test]
    fn tile_mode_properties() {
        let thick: Vec<_> = all_modes().filter(|m| m.thickness() == 4).map(|m| m as u32).collect();
        assert_eq!(vec![3, 7, 11, 13, 15], thick);

        let swapped: Vec<_> = all_modes().filter(|m| m.is_bank_swapped()).map(|m| m as u32).collect();
        assert_eq!(vec![8, 9, 10, 11, 14, 15], swapped);

        let macro_tiled: Vec<_> = all_modes().filter(|m| m.is_macro_tiled()).map(|m| m as u32).collect();
        assert_eq!((4..=15).collect::<Vec<_>>(), macro_tiled);

        assert_eq!(2, TileMode::Tiled2bThin2.aspect_ratio());
        assert_eq!(4, TileMode::Tiled2dThin4.aspect_ratio());
        assert_eq!(1, TileMode::Tiled3dThin1.aspect_ratio());

        assert_eq!(2, TileMode::Tiled2dThin1.rotation(&HW));
        assert_eq!(1, TileMode::Tiled3bThick.rotation(&HW));
        assert_eq!(0, TileMode::LinearAligned.rotation(&HW));
    }

    #[test]
    fn resolve_never_increases_rank() {
        for mode in all_modes() {
            for bpp in [8, 16, 32, 64, 128] {
                for level in 0..8 {
                    for size in [1, 4, 16, 64, 256] {
                        let resolved = resolve_tile_mode(mode, bpp, level, size, size, 1, 1, false, &HW);
                        assert!(resolved.tiling_rank() <= mode.tiling_rank());
                        assert!(resolved.thickness() <= mode.thickness());
                    }
                }
            }
        }
    }

    #[test]
    fn resolve_three_component_mips() {
        // 96 bpp mips are legalized as 32 bpp.
        let mode = resolve_tile_mode(TileMode::Tiled2dThin1, 96, 1, 32, 16, 1, 1, false, &HW);
        assert_eq!(TileMode::Tiled2dThin1, mode);
        let mode = resolve_tile_mode(TileMode::Tiled2dThin1, 96, 1, 16, 16, 1, 1, false, &HW);
        assert_eq!(TileMode::Tiled1dThin1, mode);
    }

    #[test]
    fn resolve_base_level_keeps_mode() {
        for mode in all_modes().filter(|m| m.thickness() == 1) {
            assert_eq!(mode, resolve_tile_mode(mode, 32, 0, 8, 8, 1, 1, false, &HW));
        }
    }

    #[test]
    fn resolve_thick_128bpp() {
        // 128 bpp thick tiles would need multiple slices per tile.
        assert_eq!(
            TileMode::Tiled2dThin1,
            resolve_tile_mode(TileMode::Tiled2dThick, 128, 0, 256, 256, 8, 1, false, &HW)
        );
        assert_eq!(
            TileMode::Tiled2dThick,
            resolve_tile_mode(TileMode::Tiled2dThick, 32, 0, 256, 256, 8, 1, false, &HW)
        );
    }

    #[test]
    fn resolve_depth_buffer() {
        assert_eq!(
            TileMode::Tiled1dThin1,
            resolve_tile_mode(TileMode::Tiled1dThick, 32, 0, 64, 64, 4, 1, true, &HW)
        );
        assert_eq!(
            TileMode::Tiled2bThin1,
            resolve_tile_mode(TileMode::Tiled2bThick, 32, 0, 64, 64, 4, 1, true, &HW)
        );
    }

    #[test]
    fn resolve_mip_degrades_to_micro() {
        // 32 bpp 2D thin macro tiles are 32x16 pixels.
        assert_eq!(
            TileMode::Tiled2dThin1,
            resolve_tile_mode(TileMode::Tiled2dThin1, 32, 1, 32, 16, 1, 1, false, &HW)
        );
        assert_eq!(
            TileMode::Tiled1dThin1,
            resolve_tile_mode(TileMode::Tiled2dThin1, 32, 1, 16, 16, 1, 1, false, &HW)
        );
        assert_eq!(
            TileMode::Tiled1dThin1,
            resolve_tile_mode(TileMode::Tiled2dThin1, 32, 1, 32, 8, 1, 1, false, &HW)
        );
    }

    #[test]
    fn resolve_mip_width_align_factor() {
        // 8 bpp micro tiles are only 64 bytes, so 4 macro tiles are needed per group.
        assert_eq!(
            TileMode::Tiled1dThin1,
            resolve_tile_mode(TileMode::Tiled2dThin1, 8, 1, 64, 64, 1, 1, false, &HW)
        );
        assert_eq!(
            TileMode::Tiled2dThin1,
            resolve_tile_mode(TileMode::Tiled2dThin1, 8, 1, 128, 64, 1, 1, false, &HW)
        );
    }

    #[test]
    fn resolve_mip_removes_bank_swapping() {
        assert_eq!(
            TileMode::Tiled2dThin1,
            resolve_tile_mode(TileMode::Tiled2bThin1, 32, 1, 256, 256, 1, 1, false, &HW)
        );
        assert_eq!(
            TileMode::Tiled2bThin1,
            resolve_tile_mode(TileMode::Tiled2bThin1, 32, 0, 256, 256, 1, 1, false, &HW)
        );
    }

    #[test]
    fn resolve_mip_thick_needs_four_slices() {
        assert_eq!(
            TileMode::Tiled2dThin1,
            resolve_tile_mode(TileMode::Tiled2dThick, 32, 1, 256, 256, 2, 1, false, &HW)
        );
        assert_eq!(
            TileMode::Tiled2dThick,
            resolve_tile_mode(TileMode::Tiled2dThick, 32, 1, 256, 256, 4, 1, false, &HW)
        );
        assert_eq!(
            TileMode::Tiled1dThin1,
            resolve_tile_mode(TileMode::Tiled2dThick, 32, 1, 8, 8, 2, 1, false, &HW)
        );
    }

    #[test]
    fn resolve_linear_special() {
        assert_eq!(
            TileMode::LinearSpecial,
            resolve_tile_mode(TileMode::LinearSpecial, 32, 3, 1, 1, 1, 1, false, &HW)
        );
    }

    #[test]
    fn tile_slices_thick() {
        assert_eq!(1, tile_slices(TileMode::Tiled2dThick, 32, 1, &HW));
        assert_eq!(1, tile_slices(TileMode::Tiled2dThick, 64, 1, &HW));
        assert_eq!(2, tile_slices(TileMode::Tiled2dThick, 128, 1, &HW));
        assert_eq!(1, tile_slices(TileMode::Tiled2dThin1, 128, 1, &HW));
        assert_eq!(1, tile_slices(TileMode::Tiled2dThin1, 0, 1, &HW));
    }
}
