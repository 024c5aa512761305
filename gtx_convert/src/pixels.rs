//! Pixel reformatting between the GX2 and DDS channel layouts.
//!
//! 16-bit pixels are processed as big-endian values.

/// Converts DDS `A1R5G5B5` pixels to GX2 `R5G5B5A1` pixels.
pub fn rgb5a1_to_gx2(data: &[u8]) -> Vec<u8> {
    map_u16_be(data, |pixel| {
        let red = (pixel >> 10) & 0x1f;
        let green = (pixel >> 5) & 0x1f;
        let blue = pixel & 0x1f;
        let alpha = (pixel >> 15) & 0x1;
        (red << 11) | (green << 6) | (blue << 1) | alpha
    })
}

/// Converts GX2 `R5G5B5A1` pixels to DDS `A1R5G5B5` pixels.
pub fn rgb5a1_to_dds(data: &[u8]) -> Vec<u8> {
    map_u16_be(data, |pixel| {
        let red = (pixel >> 11) & 0x1f;
        let green = (pixel >> 6) & 0x1f;
        let blue = (pixel >> 1) & 0x1f;
        let alpha = pixel & 0x1;
        (red << 10) | (green << 5) | blue | (alpha << 15)
    })
}

/// Expands 24-bit RGB pixels to 32-bit RGBA pixels with an opaque alpha channel.
pub fn rgb8_to_rgbx8(data: &[u8]) -> Vec<u8> {
    data.chunks_exact(3)
        .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 0xff])
        .collect()
}

// A trailing odd byte is copied unchanged.
fn map_u16_be<F: Fn(u16) -> u16>(data: &[u8], f: F) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len());
    for chunk in data.chunks(2) {
        match *chunk {
            [high, low] => output.extend_from_slice(&f(u16::from_be_bytes([high, low])).to_be_bytes()),
            _ => output.extend_from_slice(chunk),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn rgb5a1_channels() {
        // Opaque red.
        assert_eq!(vec![0xf8, 0x01], rgb5a1_to_gx2(&[0xfc, 0x00]));
        assert_eq!(vec![0xfc, 0x00], rgb5a1_to_dds(&[0xf8, 0x01]));

        // Transparent blue.
        assert_eq!(vec![0x00, 0x3e], rgb5a1_to_gx2(&[0x00, 0x1f]));
        assert_eq!(vec![0x00, 0x1f], rgb5a1_to_dds(&[0x00, 0x3e]));
    }

    #[test]
    fn rgb5a1_inverse() {
        let mut rng = StdRng::from_seed([13u8; 32]);
        let input: Vec<_> = (0..256).map(|_| rng.gen_range::<u8, _>(0..=255)).collect();

        assert_eq!(input, rgb5a1_to_dds(&rgb5a1_to_gx2(&input)));
        assert_eq!(input, rgb5a1_to_gx2(&rgb5a1_to_dds(&input)));
    }

    #[test]
    fn rgb5a1_odd_length() {
        assert_eq!(vec![0x00, 0x3e, 0x7f], rgb5a1_to_gx2(&[0x00, 0x1f, 0x7f]));
    }

    #[test]
    fn rgb8_expand() {
        assert_eq!(
            vec![1, 2, 3, 255, 4, 5, 6, 255],
            rgb8_to_rgbx8(&[1, 2, 3, 4, 5, 6, 7])
        );
        assert!(rgb8_to_rgbx8(&[]).is_empty());
    }
}
