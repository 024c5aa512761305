#![no_main]
use libfuzzer_sys::fuzz_target;

extern crate arbitrary;
use arbitrary::{Arbitrary, Result, Unstructured};
use wiiu_swizzle::{HardwareProfile, SurfaceDescriptor, SurfaceDim, TileMode};

#[derive(Debug)]
struct Input {
    format: u32,
    width: u32,
    height: u32,
    depth: u32,
    dim: SurfaceDim,
    tile_mode: TileMode,
    mip_level: u32,
    swizzle: u32,
    input_size: usize,
}

impl<'a> Arbitrary<'a> for Input {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        Ok(Input {
            format: u.int_in_range(0..=0x823)?,
            width: u.int_in_range(0..=1024)?,
            height: u.int_in_range(0..=1024)?,
            depth: u.int_in_range(0..=8)?,
            dim: u.arbitrary()?,
            tile_mode: u.arbitrary()?,
            mip_level: u.int_in_range(0..=12)?,
            swizzle: u.arbitrary()?,
            input_size: u.int_in_range(0..=4194304)?,
        })
    }
}

fuzz_target!(|input: Input| {
    let hw = HardwareProfile::WII_U;
    let descriptor = SurfaceDescriptor {
        depth: input.depth,
        dim: input.dim,
        mip_level: input.mip_level,
        ..SurfaceDescriptor::new_2d(input.format, input.width, input.height, input.tile_mode)
    };

    if let Ok(info) = wiiu_swizzle::compute_surface_info(&descriptor, &hw) {
        let swizzled = vec![0u8; input.input_size];

        // This should never panic even if the input size is incorrect.
        let (width, height) =
            wiiu_swizzle::mip_level_dimensions(input.width, input.height, input.mip_level);
        let _ = wiiu_swizzle::deswizzle(width, height, &info, input.swizzle, &swizzled, &hw);
    }
});
