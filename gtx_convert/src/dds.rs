//! Reading and writing uncompressed and BC1 to BC5 DDS files with a legacy header.
use binread::prelude::*;
use binwrite::BinWrite;
use std::io::{Cursor, Write};
use wiiu_swizzle::{div_round_up, mip_level_dimensions, SurfaceError};

use crate::{
    formats::DdsFormat,
    pixels::{rgb5a1_to_dds, rgb5a1_to_gx2, rgb8_to_rgbx8},
    ConvertError,
};

const DDSD_CAPS: u32 = 0x1;
const DDSD_HEIGHT: u32 = 0x2;
const DDSD_WIDTH: u32 = 0x4;
const DDSD_PITCH: u32 = 0x8;
const DDSD_PIXELFORMAT: u32 = 0x1000;
const DDSD_MIPMAPCOUNT: u32 = 0x20000;
const DDSD_LINEARSIZE: u32 = 0x80000;

const DDPF_ALPHAPIXELS: u32 = 0x1;
const DDPF_ALPHA: u32 = 0x2;
const DDPF_FOURCC: u32 = 0x4;
const DDPF_RGB: u32 = 0x40;
const DDPF_LUMINANCE: u32 = 0x20000;

const DDSCAPS_COMPLEX: u32 = 0x8;
const DDSCAPS_TEXTURE: u32 = 0x1000;
const DDSCAPS_MIPMAP: u32 = 0x400000;

#[derive(Debug, Clone, Default, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[binwrite(little)]
pub struct DdsHeader {
    pub magic: [u8; 4],
    pub size: u32,
    pub flags: u32,
    pub height: u32,
    pub width: u32,
    pub pitch_or_linear_size: u32,
    pub depth: u32,
    pub mip_map_count: u32,
    pub reserved1: [u32; 11],
    pub pixel_format: DdsPixelFormat,
    pub caps: u32,
    pub caps2: u32,
    pub caps3: u32,
    pub caps4: u32,
    pub reserved2: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[binwrite(little)]
pub struct DdsPixelFormat {
    pub size: u32,
    pub flags: u32,
    pub fourcc: [u8; 4],
    pub rgb_bit_count: u32,
    pub r_bit_mask: u32,
    pub g_bit_mask: u32,
    pub b_bit_mask: u32,
    pub a_bit_mask: u32,
}

/// A 2D texture with linear mip levels in the GX2 channel layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdsImage {
    pub width: u32,
    pub height: u32,
    pub format: DdsFormat,
    /// The GX2 component selectors for red, green, blue, and alpha.
    pub comp_sel: [u8; 4],
    /// The tightly packed data for each mip level starting from the base level.
    pub mipmaps: Vec<Vec<u8>>,
}

/// The size in bytes of a tightly packed `width` x `height` mip level.
pub fn mip_size(format: DdsFormat, width: u32, height: u32) -> usize {
    let bytes_per_element = format.bytes_per_element() as usize;
    if format.is_compressed() {
        div_round_up(width, 4) as usize * div_round_up(height, 4) as usize * bytes_per_element
    } else {
        width as usize * height as usize * bytes_per_element
    }
}

/// Reads a DDS file with a legacy header. DX10 headers are not supported.
pub fn read_dds(bytes: &[u8]) -> Result<DdsImage, ConvertError> {
    let header: DdsHeader = Cursor::new(bytes).read_le()?;
    if &header.magic != b"DDS " {
        return Err(ConvertError::InvalidMagic(header.magic));
    }
    if &header.pixel_format.fourcc == b"DX10" {
        return Err(ConvertError::UnsupportedDx10);
    }
    if header.caps != DDSCAPS_TEXTURE
        && header.caps != DDSCAPS_TEXTURE | DDSCAPS_COMPLEX | DDSCAPS_MIPMAP
    {
        return Err(ConvertError::UnsupportedDdsCaps(header.caps));
    }

    let dds = ddsfile::Dds::read(&mut Cursor::new(bytes))
        .map_err(|e| ConvertError::Dds(format!("{:?}", e)))?;
    if dds.header10.is_some() {
        return Err(ConvertError::UnsupportedDx10);
    }

    let (format, comp_sel, is_rgb8) = detect_format(&header.pixel_format)?;

    let mut offset = 0;
    let mut mipmaps = Vec::new();
    for level in 0..dds.get_num_mipmap_levels().max(1) {
        let (width, height) = mip_level_dimensions(header.width, header.height, level);
        let size = if is_rgb8 {
            width as usize * height as usize * 3
        } else {
            mip_size(format, width, height)
        };

        let end = offset + size;
        let data = dds
            .data
            .get(offset..end)
            .ok_or(SurfaceError::NotEnoughData {
                expected_size: end,
                actual_size: dds.data.len(),
            })?;

        mipmaps.push(match format {
            DdsFormat::Rgba8 if is_rgb8 => rgb8_to_rgbx8(data),
            DdsFormat::Rgb5a1 => rgb5a1_to_gx2(data),
            _ => data.to_vec(),
        });
        offset = end;
    }

    Ok(DdsImage {
        width: header.width,
        height: header.height,
        format,
        comp_sel,
        mipmaps,
    })
}

fn detect_format(
    pixel_format: &DdsPixelFormat,
) -> Result<(DdsFormat, [u8; 4], bool), ConvertError> {
    let unsupported = || ConvertError::UnsupportedPixelFormat {
        flags: pixel_format.flags,
        fourcc: pixel_format.fourcc,
        bit_count: pixel_format.rgb_bit_count,
    };

    if pixel_format.flags & DDPF_FOURCC != 0 {
        let format = DdsFormat::from_fourcc(pixel_format.fourcc).ok_or_else(unsupported)?;
        return Ok((format, [0, 1, 2, 3], false));
    }

    let candidates: &[(DdsFormat, u32)] = match pixel_format.flags {
        DDPF_LUMINANCE | DDPF_ALPHA => &[(DdsFormat::L8, 1)],
        f if f == DDPF_LUMINANCE | DDPF_ALPHAPIXELS => {
            &[(DdsFormat::L8a8, 2), (DdsFormat::L4a4, 1)]
        }
        f if f == DDPF_RGB | DDPF_ALPHAPIXELS => &[
            (DdsFormat::Rgba8, 4),
            (DdsFormat::Rgb10a2, 4),
            (DdsFormat::Rgb5a1, 2),
            (DdsFormat::Rgba4, 2),
        ],
        DDPF_RGB => &[(DdsFormat::Rgba8, 3), (DdsFormat::Rgb565, 2)],
        _ => &[],
    };

    let masks = [
        pixel_format.r_bit_mask,
        pixel_format.g_bit_mask,
        pixel_format.b_bit_mask,
        pixel_format.a_bit_mask,
    ];
    let bytes_per_pixel = pixel_format.rgb_bit_count / 8;
    let alpha_only = pixel_format.flags == DDPF_ALPHA;

    candidates
        .iter()
        .filter(|(_, bpp)| *bpp == bytes_per_pixel)
        .find_map(|(format, bpp)| {
            let mut comp_sel = format.component_selectors(masks, alpha_only)?;
            let is_rgb8 = *bpp == 3;
            if is_rgb8 {
                // The expanded alpha channel is always opaque.
                comp_sel[3] = 3;
            }
            Some((*format, comp_sel, is_rgb8))
        })
        .ok_or_else(unsupported)
}

/// Creates the legacy DDS header for `image` with channel masks encoding [DdsImage::comp_sel].
pub fn dds_header(image: &DdsImage) -> DdsHeader {
    let format = image.format;
    let mip_count = (image.mipmaps.len() as u32).max(1);

    let mut flags = DDSD_CAPS | DDSD_PIXELFORMAT | DDSD_WIDTH | DDSD_HEIGHT;
    let mut caps = DDSCAPS_TEXTURE;
    if mip_count != 1 {
        flags |= DDSD_MIPMAPCOUNT;
        caps |= DDSCAPS_COMPLEX | DDSCAPS_MIPMAP;
    }

    let mut defaults = format.masks();
    let mut has_alpha = defaults[3] != 0;
    if format == DdsFormat::L8 && image.comp_sel.iter().filter(|s| **s == 3).count() == 1 {
        has_alpha = true;
        defaults[3] = 0xff;
    }

    let mut pixel_format = DdsPixelFormat {
        size: 32,
        ..Default::default()
    };

    let pitch_or_linear_size = if let Some(fourcc) = format.fourcc() {
        flags |= DDSD_LINEARSIZE;
        pixel_format.flags = DDPF_FOURCC;
        pixel_format.fourcc = fourcc;
        mip_size(format, image.width, image.height) as u32
    } else {
        flags |= DDSD_PITCH;

        let bytes_per_pixel = format.bytes_per_element();
        pixel_format.flags = match format {
            DdsFormat::L8 if has_alpha => DDPF_ALPHA,
            DdsFormat::L8 | DdsFormat::L8a8 | DdsFormat::L4a4 => DDPF_LUMINANCE,
            _ => DDPF_RGB,
        };
        if has_alpha && pixel_format.flags != DDPF_ALPHA {
            pixel_format.flags |= DDPF_ALPHAPIXELS;
        }
        pixel_format.rgb_bit_count = bytes_per_pixel * 8;

        let mut masks = [0u32; 4];
        for (i, (mask, sel)) in masks.iter_mut().zip(image.comp_sel.iter()).enumerate() {
            *mask = match *sel {
                0..=3 => defaults[*sel as usize],
                4 => 0,
                _ => defaults[i],
            };
        }
        let [r, g, b, a] = masks;
        pixel_format.r_bit_mask = r;
        pixel_format.g_bit_mask = g;
        pixel_format.b_bit_mask = b;
        pixel_format.a_bit_mask = a;

        image.width * bytes_per_pixel
    };

    DdsHeader {
        magic: *b"DDS ",
        size: 124,
        flags,
        height: image.height,
        width: image.width,
        pitch_or_linear_size,
        depth: 0,
        mip_map_count: mip_count,
        pixel_format,
        caps,
        ..Default::default()
    }
}

/// Writes `image` as a DDS file with a legacy header.
pub fn write_dds<W: Write>(writer: &mut W, image: &DdsImage) -> Result<(), ConvertError> {
    dds_header(image).write(writer)?;
    for mip in &image.mipmaps {
        match image.format {
            DdsFormat::Rgb5a1 => writer.write_all(&rgb5a1_to_dds(mip))?,
            _ => writer.write_all(mip)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(format: DdsFormat, width: u32, height: u32, comp_sel: [u8; 4], mips: u32) -> DdsImage {
        let mipmaps = (0..mips)
            .map(|level| {
                let (w, h) = mip_level_dimensions(width, height, level);
                (0..mip_size(format, w, h)).map(|i| (i % 251) as u8).collect()
            })
            .collect();
        DdsImage {
            width,
            height,
            format,
            comp_sel,
            mipmaps,
        }
    }

    fn write_read(image: &DdsImage) -> DdsImage {
        let mut bytes = Vec::new();
        write_dds(&mut bytes, image).unwrap();
        read_dds(&bytes).unwrap()
    }

    #[test]
    fn header_size() {
        let mut bytes = Vec::new();
        dds_header(&image(DdsFormat::Rgba8, 4, 4, [0, 1, 2, 3], 1))
            .write(&mut bytes)
            .unwrap();
        assert_eq!(128, bytes.len());
        assert_eq!(b"DDS ", &bytes[..4]);
        assert_eq!(124u32.to_le_bytes(), bytes[4..8]);
    }

    #[test]
    fn header_rgba8_mipmaps() {
        let header = dds_header(&image(DdsFormat::Rgba8, 64, 32, [0, 1, 2, 3], 7));
        assert_eq!(0x2100f, header.flags);
        assert_eq!(0x401008, header.caps);
        assert_eq!(7, header.mip_map_count);
        assert_eq!(256, header.pitch_or_linear_size);
        assert_eq!(0x41, header.pixel_format.flags);
        assert_eq!(32, header.pixel_format.rgb_bit_count);
        assert_eq!(0xff, header.pixel_format.r_bit_mask);
        assert_eq!(0xff000000, header.pixel_format.a_bit_mask);
    }

    #[test]
    fn header_bc1() {
        let header = dds_header(&image(DdsFormat::Bc1, 30, 30, [0, 1, 2, 3], 1));
        assert_eq!(0x81007, header.flags);
        assert_eq!(0x1000, header.caps);
        assert_eq!(DDPF_FOURCC, header.pixel_format.flags);
        assert_eq!(*b"DXT1", header.pixel_format.fourcc);
        assert_eq!(8 * 8 * 8, header.pitch_or_linear_size);
    }

    #[test]
    fn header_swapped_channels() {
        let header = dds_header(&image(DdsFormat::Rgb565, 4, 4, [2, 1, 0, 5], 1));
        assert_eq!(DDPF_RGB, header.pixel_format.flags);
        assert_eq!(0x1f, header.pixel_format.r_bit_mask);
        assert_eq!(0x7e0, header.pixel_format.g_bit_mask);
        assert_eq!(0xf800, header.pixel_format.b_bit_mask);
        assert_eq!(0, header.pixel_format.a_bit_mask);
    }

    #[test]
    fn header_luminance() {
        let header = dds_header(&image(DdsFormat::L8, 4, 4, [0, 0, 0, 5], 1));
        assert_eq!(DDPF_LUMINANCE, header.pixel_format.flags);
        assert_eq!(0xff, header.pixel_format.r_bit_mask);
        assert_eq!(0, header.pixel_format.a_bit_mask);

        let header = dds_header(&image(DdsFormat::L8, 4, 4, [4, 4, 4, 3], 1));
        assert_eq!(DDPF_ALPHA, header.pixel_format.flags);
        assert_eq!(0, header.pixel_format.r_bit_mask);
        assert_eq!(0xff, header.pixel_format.a_bit_mask);

        let header = dds_header(&image(DdsFormat::L8a8, 4, 4, [0, 0, 0, 3], 1));
        assert_eq!(DDPF_LUMINANCE | DDPF_ALPHAPIXELS, header.pixel_format.flags);
        assert_eq!(16, header.pixel_format.rgb_bit_count);
    }

    #[test]
    fn write_read_formats() {
        for (format, comp_sel) in [
            (DdsFormat::Rgba8, [0, 1, 2, 3]),
            (DdsFormat::Rgba8, [2, 1, 0, 3]),
            (DdsFormat::Rgb10a2, [0, 1, 2, 3]),
            (DdsFormat::Rgb565, [0, 1, 2, 4]),
            (DdsFormat::Rgb5a1, [0, 1, 2, 3]),
            (DdsFormat::Rgba4, [0, 1, 2, 3]),
            (DdsFormat::L8, [0, 4, 4, 4]),
            (DdsFormat::L8, [4, 4, 4, 3]),
            (DdsFormat::L8a8, [0, 0, 0, 3]),
            (DdsFormat::L4a4, [0, 0, 0, 3]),
            (DdsFormat::Bc1, [0, 1, 2, 3]),
            (DdsFormat::Bc2, [0, 1, 2, 3]),
            (DdsFormat::Bc3, [0, 1, 2, 3]),
            (DdsFormat::Bc4U, [0, 1, 2, 3]),
            (DdsFormat::Bc4S, [0, 1, 2, 3]),
            (DdsFormat::Bc5U, [0, 1, 2, 3]),
            (DdsFormat::Bc5S, [0, 1, 2, 3]),
        ] {
            let expected = image(format, 20, 12, comp_sel, 3);
            assert_eq!(expected, write_read(&expected), "{:?}", format);
        }
    }

    #[test]
    fn read_rgb8() {
        let header = DdsHeader {
            magic: *b"DDS ",
            size: 124,
            flags: DDSD_CAPS | DDSD_PIXELFORMAT | DDSD_WIDTH | DDSD_HEIGHT | DDSD_PITCH,
            width: 2,
            height: 1,
            pitch_or_linear_size: 6,
            pixel_format: DdsPixelFormat {
                size: 32,
                flags: DDPF_RGB,
                rgb_bit_count: 24,
                r_bit_mask: 0xff0000,
                g_bit_mask: 0xff00,
                b_bit_mask: 0xff,
                ..Default::default()
            },
            caps: DDSCAPS_TEXTURE,
            ..Default::default()
        };
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6]);

        let image = read_dds(&bytes).unwrap();
        assert_eq!(DdsFormat::Rgba8, image.format);
        assert_eq!([2, 1, 0, 3], image.comp_sel);
        assert_eq!(vec![vec![1, 2, 3, 255, 4, 5, 6, 255]], image.mipmaps);
    }

    #[test]
    fn read_rgb5a1_channels() {
        let mut bytes = Vec::new();
        write_dds(
            &mut bytes,
            &DdsImage {
                width: 1,
                height: 1,
                format: DdsFormat::Rgb5a1,
                comp_sel: [0, 1, 2, 3],
                mipmaps: vec![vec![0xf8, 0x01]],
            },
        )
        .unwrap();
        assert_eq!([0xfc, 0x00], bytes[128..]);
    }

    #[test]
    fn read_not_enough_data() {
        let mut bytes = Vec::new();
        write_dds(&mut bytes, &image(DdsFormat::Bc3, 16, 16, [0, 1, 2, 3], 1)).unwrap();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            read_dds(&bytes),
            Err(ConvertError::Surface(SurfaceError::NotEnoughData {
                expected_size: 256,
                actual_size: 255
            }))
        ));
    }

    #[test]
    fn read_invalid() {
        assert!(matches!(
            read_dds(&[0u8; 128]),
            Err(ConvertError::InvalidMagic([0, 0, 0, 0]))
        ));

        let mut header = dds_header(&image(DdsFormat::Bc1, 4, 4, [0, 1, 2, 3], 1));
        header.pixel_format.fourcc = *b"DX10";
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        assert!(matches!(read_dds(&bytes), Err(ConvertError::UnsupportedDx10)));

        let mut header = dds_header(&image(DdsFormat::Bc1, 4, 4, [0, 1, 2, 3], 1));
        header.pixel_format.fourcc = *b"BC7U";
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        bytes.extend_from_slice(&[0u8; 8]);
        assert!(matches!(
            read_dds(&bytes),
            Err(ConvertError::UnsupportedPixelFormat { .. })
        ));

        let mut header = dds_header(&image(DdsFormat::Bc1, 4, 4, [0, 1, 2, 3], 1));
        header.caps = 0x1008;
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        assert!(matches!(
            read_dds(&bytes),
            Err(ConvertError::UnsupportedDdsCaps(0x1008))
        ));
    }
}
