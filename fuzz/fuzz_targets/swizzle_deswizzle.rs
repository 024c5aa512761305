#![no_main]
use libfuzzer_sys::fuzz_target;

extern crate arbitrary;
use arbitrary::{Arbitrary, Result, Unstructured};

extern crate rand;
use rand::{rngs::StdRng, Rng, SeedableRng};

use wiiu_swizzle::{HardwareProfile, SurfaceDescriptor, TileMode};

#[derive(Debug)]
struct Input {
    format: u32,
    width: u32,
    height: u32,
    tile_mode: TileMode,
    mip_level: u32,
    swizzle: u32,
}

// Formats with a known size.
const FORMATS: [u32; 10] = [0x01, 0x07, 0x08, 0x19, 0x1a, 0x1f, 0x22, 0x31, 0x33, 0x35];

impl<'a> Arbitrary<'a> for Input {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        Ok(Input {
            format: *u.choose(&FORMATS)?,
            width: u.int_in_range(1..=256)?,
            height: u.int_in_range(1..=256)?,
            tile_mode: u.arbitrary()?,
            mip_level: u.int_in_range(0..=8)?,
            swizzle: u.arbitrary()?,
        })
    }
}

fuzz_target!(|input: Input| {
    let hw = HardwareProfile::WII_U;
    let descriptor = SurfaceDescriptor {
        mip_level: input.mip_level,
        ..SurfaceDescriptor::new_2d(input.format, input.width, input.height, input.tile_mode)
    };
    let info = wiiu_swizzle::compute_surface_info(&descriptor, &hw).unwrap();

    let (width, height) =
        wiiu_swizzle::mip_level_dimensions(input.width, input.height, input.mip_level);
    let deswizzled_size = wiiu_swizzle::swizzle::deswizzled_size(width, height, 1, &info).unwrap();

    let seed = [13u8; 32];
    let mut rng: StdRng = SeedableRng::from_seed(seed);
    let deswizzled: Vec<_> = (0..deswizzled_size)
        .map(|_| rng.gen_range::<u8, _>(0..=255))
        .collect();

    let swizzled = wiiu_swizzle::swizzle(width, height, &info, input.swizzle, &deswizzled, &hw);
    let new_deswizzled =
        wiiu_swizzle::deswizzle(width, height, &info, input.swizzle, &swizzled, &hw).unwrap();

    if deswizzled != new_deswizzled {
        panic!("Swizzle deswizzle is not 1:1");
    }
});
