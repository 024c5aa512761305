//! Memory interleaving constants for the target GPU.

/// The GPU generation. Some alignment corrections only apply to R6xx chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipFamily {
    R6xx,
    R7xx,
}

/// Describes how the memory controller interleaves surface data across pipes and banks.
///
/// The [HardwareProfile::WII_U] profile is the only configuration used by GX2.
/// Every computation takes the profile explicitly rather than reading global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareProfile {
    pub num_pipes: u32,
    pub num_banks: u32,
    /// The number of consecutive bytes assigned to one pipe (the group size).
    pub pipe_interleave_bytes: u32,
    pub row_size: u32,
    pub swap_size: u32,
    pub split_size: u32,
    pub chip_family: ChipFamily,
    /// Multisampled 1D tiled surfaces are promoted to 2D tiling.
    pub promote_msaa_micro_tiling: bool,
    /// Cube maps pad their slice count to a power of two.
    pub pad_cube_slices: bool,
}

impl HardwareProfile {
    /// The Wii U's Latte GPU.
    pub const WII_U: HardwareProfile = HardwareProfile {
        num_pipes: 2,
        num_banks: 4,
        pipe_interleave_bytes: 256,
        row_size: 2048,
        swap_size: 256,
        split_size: 2048,
        chip_family: ChipFamily::R7xx,
        promote_msaa_micro_tiling: true,
        pad_cube_slices: true,
    };

    /// Attempts to construct a profile with the given interleaving parameters.
    /// Returns [None] if a value is not a power of two
    /// or the bank count is not one of the supported values 4 or 8.
    /// # Examples
    /**
    ```rust
    use wiiu_swizzle::{ChipFamily, HardwareProfile};

    let hw = HardwareProfile::new(2, 4, 256, 2048, 256, 2048, ChipFamily::R7xx);
    assert_eq!(Some(HardwareProfile::WII_U), hw);

    assert_eq!(None, HardwareProfile::new(3, 4, 256, 2048, 256, 2048, ChipFamily::R7xx));
    ```
    */
    pub fn new(
        num_pipes: u32,
        num_banks: u32,
        pipe_interleave_bytes: u32,
        row_size: u32,
        swap_size: u32,
        split_size: u32,
        chip_family: ChipFamily,
    ) -> Option<Self> {
        let valid = num_pipes.is_power_of_two()
            && matches!(num_banks, 4 | 8)
            && pipe_interleave_bytes.is_power_of_two()
            && row_size > 0
            && swap_size > 0
            && split_size > 0;

        if valid {
            Some(Self {
                num_pipes,
                num_banks,
                pipe_interleave_bytes,
                row_size,
                swap_size,
                split_size,
                chip_family,
                ..Self::WII_U
            })
        } else {
            None
        }
    }

    pub const fn num_pipe_bits(&self) -> u32 {
        self.num_pipes.trailing_zeros()
    }

    pub const fn num_bank_bits(&self) -> u32 {
        self.num_banks.trailing_zeros()
    }

    /// The number of address bits below the pipe and bank bits.
    pub const fn num_group_bits(&self) -> u32 {
        self.pipe_interleave_bytes.trailing_zeros()
    }

    pub(crate) fn is_r6xx(&self) -> bool {
        self.chip_family == ChipFamily::R6xx
    }
}

impl Default for HardwareProfile {
    fn default() -> Self {
        Self::WII_U
    }
}
