use std::path::PathBuf;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use mbtiles::CopyDuplicateMode;

use crate::config::file::Config;
use crate::input::InputCrs;

/// Defines the styles used for the CLI help output.
const HELP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Blue.on_default().bold())
    .usage(AnsiColor::Blue.on_default().bold())
    .literal(AnsiColor::White.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug, PartialEq, Default)]
#[command(
    about = "Generate a Mapbox Vector Tile pyramid from a GeoJSON file into an MBTiles file or a directory",
    version,
    after_help = "Use RUST_LOG environment variable to control logging level, e.g. RUST_LOG=debug or RUST_LOG=mvtiler=debug.\nUse MVTILER_LOG_FORMAT environment variable to control output format: compact (default), bare or json.\nSee https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html for more information.",
    styles = HELP_STYLES
)]
pub struct Args {
    #[command(flatten)]
    pub meta: MetaArgs,
    #[command(flatten)]
    pub tiling: TilingArgs,
    #[command(flatten)]
    pub output: OutputArgs,
}

// Only `input` is transferred to the config
#[derive(clap::Args, Debug, Clone, PartialEq, Default)]
pub struct MetaArgs {
    /// Path to config file. Command line arguments override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Save resulting config to a file or use "-" to print to stdout.
    #[arg(long)]
    pub save_config: Option<PathBuf>,
    /// Print a summary of a generated tile file and exit.
    #[arg(long, value_name = "TILE_FILE", conflicts_with = "input")]
    pub inspect: Option<PathBuf>,
    /// `GeoJSON` file to generate tiles from.
    pub input: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone, PartialEq, Default)]
pub struct TilingArgs {
    /// Coordinate system of the input. [DEFAULT: wgs84]
    #[arg(long, value_enum)]
    pub input_crs: Option<InputCrs>,
    /// Minimum zoom level to generate. [DEFAULT: 0]
    #[arg(long, alias = "minzoom")]
    pub min_zoom: Option<u8>,
    /// Maximum zoom level to generate. [DEFAULT: 14]
    #[arg(long, alias = "maxzoom")]
    pub max_zoom: Option<u8>,
    /// Tile size in pixels, also used as the layer extent. [DEFAULT: 512]
    #[arg(long)]
    pub tile_size: Option<u32>,
    /// Simplification tolerance in pixels. [DEFAULT: 1.0]
    #[arg(long, value_name = "PIXELS")]
    pub simplify: Option<f64>,
    /// Clip margin around each tile in pixels. [DEFAULT: 20]
    #[arg(long, value_name = "PIXELS")]
    pub buffer: Option<u32>,
    /// Name of the layer. [DEFAULT: input file name without extension]
    #[arg(short, long)]
    pub layer: Option<String>,
    /// Number of tiles to generate at the same time. [DEFAULT: number of CPUs]
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Maximum number of source features to cache, 0 to disable. [DEFAULT: 100000]
    #[arg(long)]
    pub feature_cache_size: Option<usize>,
    /// Store uncompressed tiles instead of gzipped ones.
    #[arg(long)]
    pub no_compress: bool,
}

#[derive(clap::Args, Debug, Clone, PartialEq, Default)]
pub struct OutputArgs {
    /// Path to an `.mbtiles` file, or a directory for individual `.mvt` files.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Allow writing into an existing MBTiles file, and indicate what to do if a tile with the same Z/X/Y already exists.
    #[arg(long, value_enum)]
    pub on_duplicate: Option<CopyDuplicateMode>,
    /// MBTiles `attribution` metadata value.
    #[arg(long)]
    pub attribution: Option<String>,
    /// MBTiles `description` metadata value.
    #[arg(long)]
    pub description: Option<String>,
    /// Set additional metadata values. Must be set as `"key=value"` pairs. Can be specified multiple times.
    #[arg(long, value_name="KEY=VALUE", value_parser = parse_key_value)]
    pub set_meta: Vec<(String, String)>,
}

impl Args {
    /// Override config values with the ones given on the command line
    pub fn merge_into_config(self, config: &mut Config) {
        let Self {
            meta,
            tiling,
            output,
        } = self;

        if meta.input.is_some() {
            config.input = meta.input;
        }

        if tiling.input_crs.is_some() {
            config.input_crs = tiling.input_crs;
        }
        if tiling.min_zoom.is_some() {
            config.min_zoom = tiling.min_zoom;
        }
        if tiling.max_zoom.is_some() {
            config.max_zoom = tiling.max_zoom;
        }
        if tiling.tile_size.is_some() {
            config.tile_size = tiling.tile_size;
        }
        if tiling.simplify.is_some() {
            config.simplify = tiling.simplify;
        }
        if tiling.buffer.is_some() {
            config.buffer = tiling.buffer;
        }
        if tiling.layer.is_some() {
            config.layer = tiling.layer;
        }
        if tiling.concurrency.is_some() {
            config.concurrency = tiling.concurrency;
        }
        if tiling.feature_cache_size.is_some() {
            config.feature_cache_size = tiling.feature_cache_size;
        }
        if tiling.no_compress {
            config.compress = Some(false);
        }

        if output.output.is_some() {
            config.output = output.output;
        }
        if output.on_duplicate.is_some() {
            config.on_duplicate = output.on_duplicate;
        }
        if output.attribution.is_some() {
            config.attribution = output.attribution;
        }
        if output.description.is_some() {
            config.description = output.description;
        }
        config.metadata.extend(output.set_meta);
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let mut parts = s.splitn(2, '=');
    let key = parts
        .next()
        .ok_or_else(|| format!("Invalid key=value pair: {s}"))?;
    let value = parts
        .next()
        .ok_or_else(|| format!("Invalid key=value pair: {s}"))?;
    if key.is_empty() || value.is_empty() {
        Err(format!("Invalid key=value pair: {s}"))
    } else {
        Ok((key.to_string(), value.to_string()))
    }
}
