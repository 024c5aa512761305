use crate::SurfaceError;

/// The size and block layout of a GX2 surface format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// The bits per pixel for uncompressed formats or the bits per 4x4 block for compressed formats.
    pub bits_per_pixel: u32,
    /// `true` for BC1 to BC5 formats that store 4x4 pixel blocks.
    pub is_block_compressed: bool,
}

impl FormatInfo {
    /// The size of a single pixel or compressed block in bytes.
    pub const fn bytes_per_element(&self) -> u32 {
        self.bits_per_pixel / 8
    }

    /// The width and height in pixels of a single element.
    pub const fn block_dim(&self) -> u32 {
        if self.is_block_compressed {
            4
        } else {
            1
        }
    }
}

/// Returns the hardware format without the type bits (UNORM, SNORM, SRGB, ...).
pub const fn hardware_format(format: u32) -> u32 {
    format & 0x3f
}

// Bits per element indexed by the hardware format.
// Zero marks formats with no surface layout.
const HW_FORMAT_BITS: [u8; 64] = [
    0, 8, 8, 0, 0, 16, 16, 16, 16, 16, 16, 16, 16, 32, 32, 32, // 0x00
    32, 32, 0, 32, 0, 0, 32, 0, 0, 32, 32, 32, 64, 64, 64, 64, // 0x10
    64, 0, 128, 128, 0, 0, 0, 16, 16, 32, 32, 32, 0, 0, 0, 96, // 0x20
    96, 64, 128, 128, 64, 128, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0x30
];

/// Looks up the format metadata for the GX2 surface format code `format`.
/// Only the hardware format in the low 6 bits is used, so the UNORM, SNORM, SRGB, ... variants all share an entry.
/// # Examples
/**
```rust
use wiiu_swizzle::lookup_format;

// R8G8B8A8_UNORM
let info = lookup_format(0x1a).unwrap();
assert_eq!(32, info.bits_per_pixel);
assert!(!info.is_block_compressed);

// BC1_SRGB
let info = lookup_format(0x431).unwrap();
assert_eq!(64, info.bits_per_pixel);
assert!(info.is_block_compressed);

// R32_G32_B32_FLOAT
assert_eq!(96, lookup_format(0x830).unwrap().bits_per_pixel);

assert!(lookup_format(0x3f).is_err());
```
 */
pub fn lookup_format(format: u32) -> Result<FormatInfo, SurfaceError> {
    let hw_format = hardware_format(format);
    match HW_FORMAT_BITS[hw_format as usize] {
        0 => Err(SurfaceError::UnsupportedFormat(format)),
        bits => Ok(FormatInfo {
            bits_per_pixel: bits as u32,
            // BC1 to BC5
            is_block_compressed: (0x31..=0x35).contains(&hw_format),
        }),
    }
}

/// Returns `true` if `bits_per_pixel` belongs to a format with three equally sized components.
/// Alignments for these formats are computed using the size of a single component.
pub(crate) const fn is_three_component(bits_per_pixel: u32) -> bool {
    matches!(bits_per_pixel, 24 | 48 | 96)
}
