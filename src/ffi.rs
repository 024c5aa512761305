//! Documentation for the C API.
//!
//! For easier integration, none of the FFI methods allocate memory.
//! When tiling or untiling, make sure to allocate
//! the appropriate amount of memory for the destination array
//! using [SurfaceInfo::surf_size] or [wiiu_deswizzled_size].
//!
//! Surface layouts should always be computed with [wiiu_compute_surface_info]
//! rather than filled in manually.
use std::convert::TryFrom;

use crate::{
    compute_surface_info, HardwareProfile, SurfaceDescriptor, SurfaceDim, SurfaceInfo, TileMode,
};

/// See [crate::compute_surface_info].
/// Returns `false` and leaves `info` unmodified if the surface is not supported.
///
/// # Safety
/// `info` must be a valid pointer to a [SurfaceInfo].
#[no_mangle]
pub unsafe extern "C" fn wiiu_compute_surface_info(
    format: u32,
    width: u32,
    height: u32,
    depth: u32,
    dim: u32,
    tile_mode: u32,
    sample_count: u32,
    mip_level: u32,
    info: *mut SurfaceInfo,
) -> bool {
    if info.is_null() {
        return false;
    }

    let descriptor = match (SurfaceDim::try_from(dim), TileMode::try_from(tile_mode)) {
        (Ok(dim), Ok(tile_mode)) => SurfaceDescriptor {
            depth,
            dim,
            sample_count,
            mip_level,
            ..SurfaceDescriptor::new_2d(format, width, height, tile_mode)
        },
        _ => return false,
    };

    match compute_surface_info(&descriptor, &HardwareProfile::WII_U) {
        Ok(result) => {
            *info = result;
            true
        }
        Err(_) => false,
    }
}

/// See [crate::swizzle_surface].
/// Returns the number of elements that were skipped.
/// Returns 0 without copying anything if `info` is null.
///
/// # Safety
/// `info` must be null or point to a [SurfaceInfo] computed by [wiiu_compute_surface_info].
/// `source` and `source_len` should refer to an array with at least as many bytes as the result of [wiiu_deswizzled_size].
/// Similarly, `destination` and `destination_len` should refer to an array with at least [SurfaceInfo::surf_size] bytes.
/// A null `source` or `destination` is treated as an empty array.
#[no_mangle]
pub unsafe extern "C" fn wiiu_swizzle(
    width: u32,
    height: u32,
    depth: u32,
    info: *const SurfaceInfo,
    swizzle: u32,
    source: *const u8,
    source_len: usize,
    destination: *mut u8,
    destination_len: usize,
) -> usize {
    if info.is_null() {
        return 0;
    }
    let source = source_slice(source, source_len);
    let destination = destination_slice(destination, destination_len);

    crate::swizzle::swizzle_inner(
        width,
        height,
        depth,
        &*info,
        swizzle,
        source,
        destination,
        &HardwareProfile::WII_U,
        false,
    )
    .skipped
}

/// See [crate::deswizzle_surface].
/// Returns the number of elements that were skipped.
/// Returns 0 without copying anything if `info` is null.
///
/// # Safety
/// `info` must be null or point to a [SurfaceInfo] computed by [wiiu_compute_surface_info].
/// `source` and `source_len` should refer to an array with at least [SurfaceInfo::surf_size] bytes.
/// Similarly, `destination` and `destination_len` should refer to an array with at least as many bytes as the result of [wiiu_deswizzled_size].
/// A null `source` or `destination` is treated as an empty array.
#[no_mangle]
pub unsafe extern "C" fn wiiu_deswizzle(
    width: u32,
    height: u32,
    depth: u32,
    info: *const SurfaceInfo,
    swizzle: u32,
    source: *const u8,
    source_len: usize,
    destination: *mut u8,
    destination_len: usize,
) -> usize {
    if info.is_null() {
        return 0;
    }
    let source = source_slice(source, source_len);
    let destination = destination_slice(destination, destination_len);

    crate::swizzle::swizzle_inner(
        width,
        height,
        depth,
        &*info,
        swizzle,
        source,
        destination,
        &HardwareProfile::WII_U,
        true,
    )
    .skipped
}

/// See [crate::swizzle::deswizzled_size].
/// Returns 0 if `info` is null or the size does not fit in a `usize`.
///
/// # Safety
/// `info` must be null or point to a [SurfaceInfo] computed by [wiiu_compute_surface_info].
#[no_mangle]
pub unsafe extern "C" fn wiiu_deswizzled_size(
    width: u32,
    height: u32,
    depth: u32,
    info: *const SurfaceInfo,
) -> usize {
    if info.is_null() {
        return 0;
    }
    crate::swizzle::deswizzled_size(width, height, depth, &*info).unwrap_or(0)
}

// Null pointers are never valid for slices even with a length of 0.
unsafe fn source_slice<'a>(data: *const u8, len: usize) -> &'a [u8] {
    if data.is_null() {
        &[]
    } else {
        std::slice::from_raw_parts(data, len)
    }
}

unsafe fn destination_slice<'a>(data: *mut u8, len: usize) -> &'a mut [u8] {
    if data.is_null() {
        &mut []
    } else {
        std::slice::from_raw_parts_mut(data, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_info(format: u32, width: u32, height: u32, tile_mode: u32) -> SurfaceInfo {
        let mut info = compute_surface_info(
            &SurfaceDescriptor::new_2d(format, 1, 1, TileMode::LinearGeneral),
            &HardwareProfile::WII_U,
        )
        .unwrap();
        assert!(unsafe {
            wiiu_compute_surface_info(format, width, height, 1, 1, tile_mode, 1, 0, &mut info)
        });
        info
    }

    #[test]
    fn compute_surface_info_rgba8() {
        let info = surface_info(0x1a, 64, 64, 1);
        assert_eq!(64, info.pitch);
        assert_eq!(16384, info.surf_size);
        assert_eq!(TileMode::LinearAligned, info.tile_mode);
    }

    #[test]
    fn compute_surface_info_invalid() {
        let mut info = surface_info(0x1a, 64, 64, 4);
        let expected = info;
        unsafe {
            assert!(!wiiu_compute_surface_info(0x3f, 64, 64, 1, 1, 4, 1, 0, &mut info));
            assert!(!wiiu_compute_surface_info(0x1a, 64, 64, 1, 8, 4, 1, 0, &mut info));
            assert!(!wiiu_compute_surface_info(0x1a, 64, 64, 1, 1, 17, 1, 0, &mut info));
            assert!(!wiiu_compute_surface_info(0x1a, 0, 64, 1, 1, 4, 1, 0, &mut info));
            assert!(!wiiu_compute_surface_info(0x1a, 64, 64, 1, 1, 4, 1, 0, std::ptr::null_mut()));
        }
        assert_eq!(expected, info);
    }

    #[test]
    fn swizzle_deswizzle_bc3() {
        let info = surface_info(0x33, 128, 128, 4);
        let size = unsafe { wiiu_deswizzled_size(128, 128, 1, &info) };
        assert_eq!(32 * 32 * 16, size);

        let input: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        let mut swizzled = vec![0u8; info.surf_size as usize];
        let skipped = unsafe {
            wiiu_swizzle(
                128,
                128,
                1,
                &info,
                0x200,
                input.as_ptr(),
                input.len(),
                swizzled.as_mut_ptr(),
                swizzled.len(),
            )
        };
        assert_eq!(0, skipped);

        let mut deswizzled = vec![0u8; size];
        let skipped = unsafe {
            wiiu_deswizzle(
                128,
                128,
                1,
                &info,
                0x200,
                swizzled.as_ptr(),
                swizzled.len(),
                deswizzled.as_mut_ptr(),
                deswizzled.len(),
            )
        };
        assert_eq!(0, skipped);
        assert_eq!(input, deswizzled);
    }

    #[test]
    fn deswizzle_small_destination() {
        let info = surface_info(0x1a, 32, 32, 2);
        let input = vec![0u8; info.surf_size as usize];
        let mut output = vec![0u8; 32 * 4];
        let skipped = unsafe {
            wiiu_deswizzle(
                32,
                32,
                1,
                &info,
                0,
                input.as_ptr(),
                input.len(),
                output.as_mut_ptr(),
                output.len(),
            )
        };
        assert_eq!(32 * 31, skipped);
    }

    #[test]
    fn null_pointers() {
        let info = surface_info(0x1a, 16, 16, 4);
        let mut output = vec![0u8; 16 * 16 * 4];
        let skipped = unsafe {
            wiiu_deswizzle(
                16,
                16,
                1,
                &info,
                0,
                std::ptr::null(),
                0,
                output.as_mut_ptr(),
                output.len(),
            )
        };
        assert_eq!(16 * 16, skipped);

        let input = vec![1u8; 16 * 16 * 4];
        let skipped = unsafe {
            wiiu_swizzle(
                16,
                16,
                1,
                &info,
                0,
                input.as_ptr(),
                input.len(),
                std::ptr::null_mut(),
                0,
            )
        };
        assert_eq!(16 * 16, skipped);

        unsafe {
            assert_eq!(0, wiiu_deswizzled_size(16, 16, 1, std::ptr::null()));
            assert_eq!(
                0,
                wiiu_deswizzle(
                    16,
                    16,
                    1,
                    std::ptr::null(),
                    0,
                    input.as_ptr(),
                    input.len(),
                    output.as_mut_ptr(),
                    output.len(),
                )
            );
        }
    }

    #[test]
    fn deswizzled_size_overflow() {
        let info = surface_info(0x22, 16, 16, 4);
        assert_eq!(16 * 16 * 16, unsafe { wiiu_deswizzled_size(16, 16, 1, &info) });
        assert_eq!(0, unsafe {
            wiiu_deswizzled_size(u32::MAX, u32::MAX, u32::MAX, &info)
        });
    }
}
