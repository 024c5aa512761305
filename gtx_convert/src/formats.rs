use std::str::FromStr;

/// GX2 surface formats that can be stored in a legacy DDS file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdsFormat {
    Rgba8,
    Rgb10a2,
    Rgb565,
    Rgb5a1,
    Rgba4,
    L8,
    L8a8,
    L4a4,
    Bc1,
    Bc2,
    Bc3,
    Bc4U,
    Bc4S,
    Bc5U,
    Bc5S,
}

impl FromStr for DdsFormat {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rgba8" => Ok(DdsFormat::Rgba8),
            "rgb10a2" => Ok(DdsFormat::Rgb10a2),
            "rgb565" => Ok(DdsFormat::Rgb565),
            "rgb5a1" => Ok(DdsFormat::Rgb5a1),
            "rgba4" => Ok(DdsFormat::Rgba4),
            "l8" => Ok(DdsFormat::L8),
            "l8a8" => Ok(DdsFormat::L8a8),
            "l4a4" => Ok(DdsFormat::L4a4),
            "bc1" => Ok(DdsFormat::Bc1),
            "bc2" => Ok(DdsFormat::Bc2),
            "bc3" => Ok(DdsFormat::Bc3),
            "bc4u" => Ok(DdsFormat::Bc4U),
            "bc4s" => Ok(DdsFormat::Bc4S),
            "bc5u" => Ok(DdsFormat::Bc5U),
            "bc5s" => Ok(DdsFormat::Bc5S),
            _ => Err("Unsupported format"),
        }
    }
}

impl DdsFormat {
    /// Finds the DDS representation for the GX2 surface format code `format`.
    pub fn from_gx2(format: u32) -> Option<Self> {
        match format {
            0x01a | 0x41a => Some(DdsFormat::Rgba8),
            0x019 => Some(DdsFormat::Rgb10a2),
            0x008 => Some(DdsFormat::Rgb565),
            0x00a => Some(DdsFormat::Rgb5a1),
            0x00b => Some(DdsFormat::Rgba4),
            0x001 => Some(DdsFormat::L8),
            0x007 => Some(DdsFormat::L8a8),
            0x002 => Some(DdsFormat::L4a4),
            0x031 | 0x431 => Some(DdsFormat::Bc1),
            0x032 | 0x432 => Some(DdsFormat::Bc2),
            0x033 | 0x433 => Some(DdsFormat::Bc3),
            0x034 => Some(DdsFormat::Bc4U),
            0x234 => Some(DdsFormat::Bc4S),
            0x035 => Some(DdsFormat::Bc5U),
            0x235 => Some(DdsFormat::Bc5S),
            _ => None,
        }
    }

    /// The GX2 surface format code. Only RGBA8 and BC1 to BC3 have an SRGB variant.
    pub const fn gx2_format(&self, srgb: bool) -> u32 {
        let format = match self {
            DdsFormat::Rgba8 => 0x01a,
            DdsFormat::Rgb10a2 => 0x019,
            DdsFormat::Rgb565 => 0x008,
            DdsFormat::Rgb5a1 => 0x00a,
            DdsFormat::Rgba4 => 0x00b,
            DdsFormat::L8 => 0x001,
            DdsFormat::L8a8 => 0x007,
            DdsFormat::L4a4 => 0x002,
            DdsFormat::Bc1 => 0x031,
            DdsFormat::Bc2 => 0x032,
            DdsFormat::Bc3 => 0x033,
            DdsFormat::Bc4U => 0x034,
            DdsFormat::Bc4S => 0x234,
            DdsFormat::Bc5U => 0x035,
            DdsFormat::Bc5S => 0x235,
        };
        match self {
            DdsFormat::Rgba8 | DdsFormat::Bc1 | DdsFormat::Bc2 | DdsFormat::Bc3 if srgb => {
                format | 0x400
            }
            _ => format,
        }
    }

    pub const fn is_compressed(&self) -> bool {
        matches!(
            self,
            DdsFormat::Bc1
                | DdsFormat::Bc2
                | DdsFormat::Bc3
                | DdsFormat::Bc4U
                | DdsFormat::Bc4S
                | DdsFormat::Bc5U
                | DdsFormat::Bc5S
        )
    }

    /// The FourCC code for compressed formats.
    pub const fn fourcc(&self) -> Option<[u8; 4]> {
        match self {
            DdsFormat::Bc1 => Some(*b"DXT1"),
            DdsFormat::Bc2 => Some(*b"DXT3"),
            DdsFormat::Bc3 => Some(*b"DXT5"),
            DdsFormat::Bc4U => Some(*b"ATI1"),
            DdsFormat::Bc4S => Some(*b"BC4S"),
            DdsFormat::Bc5U => Some(*b"ATI2"),
            DdsFormat::Bc5S => Some(*b"BC5S"),
            _ => None,
        }
    }

    /// Finds the compressed format for a FourCC code.
    /// `BC4U` and `BC5U` are accepted as aliases of `ATI1` and `ATI2`.
    pub fn from_fourcc(fourcc: [u8; 4]) -> Option<Self> {
        match &fourcc {
            b"DXT1" => Some(DdsFormat::Bc1),
            b"DXT3" => Some(DdsFormat::Bc2),
            b"DXT5" => Some(DdsFormat::Bc3),
            b"ATI1" | b"BC4U" => Some(DdsFormat::Bc4U),
            b"BC4S" => Some(DdsFormat::Bc4S),
            b"ATI2" | b"BC5U" => Some(DdsFormat::Bc5U),
            b"BC5S" => Some(DdsFormat::Bc5S),
            _ => None,
        }
    }

    /// The size of a pixel for uncompressed formats or a 4x4 block for compressed formats.
    pub const fn bytes_per_element(&self) -> u32 {
        match self {
            DdsFormat::Rgba8 | DdsFormat::Rgb10a2 => 4,
            DdsFormat::Rgb565 | DdsFormat::Rgb5a1 | DdsFormat::Rgba4 | DdsFormat::L8a8 => 2,
            DdsFormat::L8 | DdsFormat::L4a4 => 1,
            DdsFormat::Bc1 | DdsFormat::Bc4U | DdsFormat::Bc4S => 8,
            DdsFormat::Bc2 | DdsFormat::Bc3 | DdsFormat::Bc5U | DdsFormat::Bc5S => 16,
        }
    }

    /// The default red, green, blue, and alpha channel masks.
    pub const fn masks(&self) -> [u32; 4] {
        match self {
            DdsFormat::Rgba8 => [0xff, 0xff00, 0xff0000, 0xff000000],
            DdsFormat::Rgb10a2 => [0x3ff, 0xffc00, 0x3ff00000, 0xc0000000],
            DdsFormat::Rgb565 => [0xf800, 0x7e0, 0x1f, 0],
            DdsFormat::Rgb5a1 => [0x7c00, 0x3e0, 0x1f, 0x8000],
            DdsFormat::Rgba4 => [0xf00, 0xf0, 0xf, 0xf000],
            DdsFormat::L8 => [0xff, 0xff, 0xff, 0],
            DdsFormat::L8a8 => [0xff, 0xff, 0xff, 0xff00],
            DdsFormat::L4a4 => [0xf, 0xf, 0xf, 0xf0],
            _ => [0; 4],
        }
    }

    /// The GX2 component selector for a DDS channel `mask`.
    ///
    /// Selectors 0 to 3 read red, green, blue, or alpha and 4 is constant zero.
    /// `alpha_only` treats the single L8 channel as alpha.
    pub fn component_selector(&self, mask: u32, alpha_only: bool) -> Option<u8> {
        if mask == 0 {
            return Some(4);
        }

        match self {
            DdsFormat::L8 if mask == 0xff => Some(if alpha_only { 3 } else { 0 }),
            DdsFormat::L8a8 | DdsFormat::L4a4 => {
                let [luminance, _, _, alpha] = self.masks();
                if mask == luminance {
                    Some(0)
                } else if mask == alpha {
                    Some(3)
                } else {
                    None
                }
            }
            DdsFormat::L8 => None,
            _ => self
                .masks()
                .iter()
                .position(|m| *m == mask)
                .map(|i| i as u8),
        }
    }

    /// Finds the GX2 component selectors for all four DDS channel masks.
    pub fn component_selectors(&self, masks: [u32; 4], alpha_only: bool) -> Option<[u8; 4]> {
        let mut comp_sel = [0u8; 4];
        for (sel, mask) in comp_sel.iter_mut().zip(masks.iter()) {
            *sel = self.component_selector(*mask, alpha_only)?;
        }
        Some(comp_sel)
    }
}
