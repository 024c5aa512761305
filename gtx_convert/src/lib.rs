//! Conversion between Wii U GTX textures and DDS files.
//!
//! GTX files are read and written with [gfd::GfdFile].
//! The tiled surface data is converted to and from the tightly packed mip levels of a [dds::DdsImage]
//! using the surface layouts computed by [wiiu_swizzle].
use log::{error, info};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;
use wiiu_swizzle::{HardwareProfile, SurfaceError, TileMode};

use dds::{read_dds, write_dds, DdsImage};
use formats::DdsFormat;
use gfd::{GfdFile, GfdTexture};

pub mod dds;
pub mod formats;
pub mod gfd;
pub mod pixels;

/// Errors while reading, writing, or converting texture files.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error reading binary data: {0}")]
    BinRead(#[from] binread::Error),

    #[error("Error reading DDS file: {0}")]
    Dds(String),

    #[error("Invalid magic {0:?}.")]
    InvalidMagic([u8; 4]),

    #[error("Unsupported GFD major version {0}. Expected 6 or 7.")]
    UnsupportedGfdVersion(u32),

    #[error("Invalid surface block size 0x{0:x}. Expected 0x9c.")]
    InvalidSurfaceBlock(u32),

    #[error("The surface format 0x{0:x} cannot be stored in a DDS file.")]
    UnsupportedFormat(u32),

    #[error("DDS files with a DX10 header are not supported.")]
    UnsupportedDx10,

    #[error("Unsupported DDS caps 0x{0:x}.")]
    UnsupportedDdsCaps(u32),

    #[error("Unsupported DDS pixel format with flags 0x{flags:x}, FourCC {fourcc:?}, and {bit_count} bits per pixel.")]
    UnsupportedPixelFormat {
        flags: u32,
        fourcc: [u8; 4],
        bit_count: u32,
    },

    #[error("The file does not contain any textures.")]
    NoTextures,

    #[error("Unsupported file extension for {0:?}. Expected .gtx, .gfd, or .dds.")]
    UnsupportedExtension(PathBuf),
}

/// Settings for creating GTX files from DDS files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GtxOptions {
    pub tile_mode: TileMode,
    /// The swizzle from 0 to 7 stored in bits 8 to 10 of the GX2 swizzle value.
    pub swizzle: u32,
    /// Use the SRGB variant for RGBA8 and BC1 to BC3.
    pub srgb: bool,
    /// The number of numbered DDS files like `name.dds`, `name_1.dds`, ... to combine into one GTX file.
    pub multi: u32,
}

impl Default for GtxOptions {
    fn default() -> Self {
        Self {
            tile_mode: TileMode::Tiled2dThin1,
            swizzle: 0,
            srgb: false,
            multi: 1,
        }
    }
}

/// The number of files converted successfully by [convert_files].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub converted: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Gtx,
    Dds,
}

impl FileKind {
    fn from_path(path: &Path) -> Result<Self, ConvertError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "gtx" | "gfd" => Ok(FileKind::Gtx),
            "dds" => Ok(FileKind::Dds),
            _ => Err(ConvertError::UnsupportedExtension(path.to_owned())),
        }
    }

    const fn output_extension(&self) -> &'static str {
        match self {
            FileKind::Gtx => "dds",
            FileKind::Dds => "gtx",
        }
    }
}

/// Untiles a single texture.
pub fn texture_to_dds(texture: &GfdTexture, hw: &HardwareProfile) -> Result<DdsImage, ConvertError> {
    let surface = &texture.surface;
    let format = DdsFormat::from_gx2(surface.format)
        .ok_or(ConvertError::UnsupportedFormat(surface.format))?;
    Ok(DdsImage {
        width: surface.width,
        height: surface.height,
        format,
        comp_sel: surface.comp_sel,
        mipmaps: texture.deswizzle_mipmaps(hw)?,
    })
}

/// Untiles every texture in `gtx` and returns each image with the index of its texture.
///
/// Textures that fail to convert are logged and skipped.
/// The error for the first texture is returned only if no texture converts.
pub fn gtx_to_dds(
    gtx: &GfdFile,
    hw: &HardwareProfile,
) -> Result<Vec<(usize, DdsImage)>, ConvertError> {
    if gtx.textures.is_empty() {
        return Err(ConvertError::NoTextures);
    }

    let mut images = Vec::new();
    let mut first_error = None;
    for (i, texture) in gtx.textures.iter().enumerate() {
        match texture_to_dds(texture, hw) {
            Ok(image) => images.push((i, image)),
            Err(e) => {
                error!("Error converting texture {}: {}", i, e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if images.is_empty() => Err(e),
        _ => Ok(images),
    }
}

/// Tiles each image in `images` to create a GTX file with one texture per image.
pub fn dds_to_gtx(
    images: &[DdsImage],
    options: &GtxOptions,
    hw: &HardwareProfile,
) -> Result<GfdFile, ConvertError> {
    if images.is_empty() {
        return Err(ConvertError::NoTextures);
    }

    let swizzle = (options.swizzle & 0x7) << 8;
    let textures = images
        .iter()
        .map(|image| {
            GfdTexture::from_mipmaps(
                image.format.gx2_format(options.srgb),
                image.width,
                image.height,
                image.comp_sel,
                &image.mipmaps,
                options.tile_mode,
                swizzle,
                hw,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GfdFile::new(textures))
}

/// The path for the file at `index` in a numbered sequence like `name.dds`, `name_1.dds`, `name_2.dds`.
pub fn numbered_path(path: &Path, index: usize) -> PathBuf {
    if index == 0 {
        return path.to_owned();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(extension) => format!("{}_{}.{}", stem, index, extension.to_string_lossy()),
        None => format!("{}_{}", stem, index),
    };
    path.with_file_name(name)
}

/// Converts a `.gtx` or `.gfd` file to DDS or a `.dds` file to GTX based on the extension of `input`.
///
/// The output defaults to `input` with the extension changed.
/// GTX files with multiple textures write numbered DDS files.
/// Returns the paths of the written files.
pub fn convert_file(
    input: &Path,
    output: Option<&Path>,
    options: &GtxOptions,
) -> Result<Vec<PathBuf>, ConvertError> {
    let hw = HardwareProfile::WII_U;
    let kind = FileKind::from_path(input)?;
    let output = output
        .map(Path::to_owned)
        .unwrap_or_else(|| input.with_extension(kind.output_extension()));

    match kind {
        FileKind::Gtx => {
            let gtx = GfdFile::from_bytes(&std::fs::read(input)?)?;
            let images = gtx_to_dds(&gtx, &hw)?;

            let mut paths = Vec::new();
            for (i, image) in &images {
                let path = numbered_path(&output, *i);
                let mut writer = BufWriter::new(File::create(&path)?);
                write_dds(&mut writer, image)?;
                writer.flush()?;
                paths.push(path);
            }
            Ok(paths)
        }
        FileKind::Dds => {
            let images = (0..options.multi.max(1) as usize)
                .map(|i| read_dds(&std::fs::read(numbered_path(input, i))?))
                .collect::<Result<Vec<_>, _>>()?;
            let gtx = dds_to_gtx(&images, options, &hw)?;

            let mut writer = BufWriter::new(File::create(&output)?);
            gtx.write(&mut writer)?;
            writer.flush()?;
            Ok(vec![output])
        }
    }
}

/// Converts each file in `inputs` in parallel with [convert_file].
///
/// Outputs are written to `output_folder` if present or next to the input otherwise.
/// Errors are logged and do not stop the remaining conversions.
pub fn convert_files(
    inputs: &[PathBuf],
    output_folder: Option<&Path>,
    options: &GtxOptions,
) -> BatchSummary {
    let converted = inputs
        .par_iter()
        .filter(|input| {
            let output = match output_folder {
                Some(folder) => match FileKind::from_path(input) {
                    Ok(kind) => input
                        .with_extension(kind.output_extension())
                        .file_name()
                        .map(|name| folder.join(name)),
                    Err(e) => {
                        error!("Error converting {:?}: {}", input, e);
                        return false;
                    }
                },
                None => None,
            };

            match convert_file(input, output.as_deref(), options) {
                Ok(paths) => {
                    info!("Converted {:?} to {:?}", input, paths);
                    true
                }
                Err(e) => {
                    error!("Error converting {:?}: {}", input, e);
                    false
                }
            }
        })
        .count();

    BatchSummary {
        converted,
        failed: inputs.len() - converted,
    }
}
