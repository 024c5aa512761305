#![no_main]
use libfuzzer_sys::fuzz_target;

use wiiu_swizzle::{HardwareProfile, SurfaceDescriptor};

fuzz_target!(|descriptor: SurfaceDescriptor| {
    // This should never panic even for unsupported surfaces.
    if let Ok(info) = wiiu_swizzle::compute_surface_info(&descriptor, &HardwareProfile::WII_U) {
        assert_eq!(0, info.pitch % info.pitch_align);
        assert_eq!(0, info.height % info.height_align);
        assert_eq!(info.tile_mode.thickness(), info.depth_align);
        assert!(info.tile_mode.tiling_rank() <= descriptor.tile_mode.tiling_rank());
    }
});
