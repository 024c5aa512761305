use clap::{App, Arg, ArgMatches};
use gtx_convert::{convert_file, convert_files, GtxOptions};
use log::{Level, LevelFilter, Metadata, Record};
use std::path::{Path, PathBuf};
use wiiu_swizzle::TileMode;

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            match record.level() {
                Level::Error | Level::Warn => eprintln!("{}: {}", record.level(), record.args()),
                _ => eprintln!("{}", record.args()),
            }
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn parse_options(matches: &ArgMatches) -> Result<GtxOptions, String> {
    let tile_mode: u32 = matches
        .value_of("tilemode")
        .unwrap_or("4")
        .parse()
        .map_err(|_| "The tile mode must be an integer.".to_string())?;
    let tile_mode = TileMode::new(tile_mode)
        .ok_or_else(|| format!("Unsupported tile mode {}. Expected 0 to 16.", tile_mode))?;

    let swizzle: u32 = matches
        .value_of("swizzle")
        .unwrap_or("0")
        .parse()
        .map_err(|_| "The swizzle must be an integer.".to_string())?;
    if swizzle > 7 {
        return Err(format!("Unsupported swizzle {}. Expected 0 to 7.", swizzle));
    }

    let multi: u32 = matches
        .value_of("multi")
        .unwrap_or("1")
        .parse()
        .map_err(|_| "The texture count must be an integer.".to_string())?;
    if multi == 0 {
        return Err("The texture count must be at least 1.".to_string());
    }

    Ok(GtxOptions {
        tile_mode,
        swizzle,
        srgb: matches.is_present("srgb"),
        multi,
    })
}

fn main() {
    let matches = App::new("gtx_convert")
        .version("0.1")
        .author("SMG")
        .about("Convert Wii U GTX textures to DDS and DDS files to GTX.")
        .arg(
            Arg::with_name("input")
                .help("The input .gtx, .gfd, or .dds files")
                .required(true)
                .multiple(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .help("The output file for a single input or the output folder for multiple inputs")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("tilemode")
                .long("tile-mode")
                .help("The GX2 tile mode for created GTX files")
                .takes_value(true)
                .default_value("4"),
        )
        .arg(
            Arg::with_name("swizzle")
                .long("swizzle")
                .help("The swizzle from 0 to 7 for created GTX files")
                .takes_value(true)
                .default_value("0"),
        )
        .arg(
            Arg::with_name("srgb")
                .long("srgb")
                .help("Use SRGB formats for created GTX files"),
        )
        .arg(
            Arg::with_name("multi")
                .long("multi")
                .help("The number of numbered DDS files like name.dds, name_1.dds to combine into one GTX file")
                .takes_value(true)
                .default_value("1"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Print information for each converted file"),
        )
        .get_matches();

    let level = if matches.is_present("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }

    let options = match parse_options(&matches) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let inputs: Vec<PathBuf> = matches
        .values_of("input")
        .map(|values| values.map(PathBuf::from).collect())
        .unwrap_or_default();
    let output = matches.value_of("output").map(Path::new);

    let start = std::time::Instant::now();
    match inputs.as_slice() {
        [input] => match convert_file(input, output, &options) {
            Ok(paths) => {
                for path in paths {
                    println!("Converted {:?} to {:?}", input, path);
                }
            }
            Err(e) => {
                eprintln!("Error converting {:?}: {}", input, e);
                std::process::exit(1);
            }
        },
        _ => {
            if let Some(folder) = output {
                if let Err(e) = std::fs::create_dir_all(folder) {
                    eprintln!("Error creating output folder {:?}: {}", folder, e);
                    std::process::exit(1);
                }
            }

            let summary = convert_files(&inputs, output, &options);
            println!(
                "Converted {} of {} files in {:?}",
                summary.converted,
                inputs.len(),
                start.elapsed()
            );
            if summary.failed > 0 {
                std::process::exit(1);
            }
        }
    }
}
