use std::collections::{BTreeMap, HashMap};
use std::ffi::OsStr;
use std::fs::File;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use mbtiles::CopyDuplicateMode;
use mvtiler_core::TilerError;
use mvtiler_core::pyramid::{
    DEFAULT_BUFFER, DEFAULT_FEATURE_CACHE_SIZE, DEFAULT_SIMPLIFY_TOLERANCE, DEFAULT_TILE_SIZE,
    TilingOptions, ZoomRange,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::input::InputCrs;
use crate::output::OutputTarget;
use crate::{MvtilerError, MvtilerResult};

/// Layer name used when neither `layer` nor an input file stem is available
pub const DEFAULT_LAYER_NAME: &str = "features";

pub type UnrecognizedValues = HashMap<String, serde_yaml::Value>;

/// Everything needed for one run, as read from a YAML file and overridden by the command line.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// `GeoJSON` file to read
    pub input: Option<PathBuf>,
    /// Coordinate system of the input [DEFAULT: wgs84]
    pub input_crs: Option<InputCrs>,
    /// MBTiles file (ending in `.mbtiles`) or directory to write into
    pub output: Option<PathBuf>,
    /// What to do with tiles that already exist in an MBTiles file
    pub on_duplicate: Option<CopyDuplicateMode>,
    /// Minimum zoom level [DEFAULT: 0]
    pub min_zoom: Option<u8>,
    /// Maximum zoom level [DEFAULT: 14]
    pub max_zoom: Option<u8>,
    /// Tile size and layer extent in pixels [DEFAULT: 512]
    pub tile_size: Option<u32>,
    /// Douglas-Peucker tolerance in pixels [DEFAULT: 1.0]
    pub simplify: Option<f64>,
    /// Clip margin around each tile in pixels [DEFAULT: 20]
    pub buffer: Option<u32>,
    /// Layer name [DEFAULT: input file stem]
    pub layer: Option<String>,
    /// Number of tiles generated at the same time [DEFAULT: number of CPUs]
    pub concurrency: Option<usize>,
    /// Gzip the tiles [DEFAULT: true]
    pub compress: Option<bool>,
    /// Maximum number of cached source features, 0 to disable [DEFAULT: 100000]
    pub feature_cache_size: Option<usize>,
    /// MBTiles `attribution` metadata
    pub attribution: Option<String>,
    /// MBTiles `description` metadata
    pub description: Option<String>,
    /// Additional MBTiles metadata values, written last
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

/// A validated run configuration with all defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct TilingJob {
    pub input: PathBuf,
    pub input_crs: InputCrs,
    pub output: OutputTarget,
    pub on_duplicate: Option<CopyDuplicateMode>,
    pub options: TilingOptions,
    pub attribution: Option<String>,
    pub description: Option<String>,
    pub metadata: Vec<(String, String)>,
}

impl Config {
    /// Validate the config and apply defaults. Unknown keys are reported and ignored.
    pub fn finalize(&self) -> MvtilerResult<TilingJob> {
        let mut unrecognized: Vec<_> = self.unrecognized.keys().collect();
        unrecognized.sort();
        for key in unrecognized {
            warn!(
                "Ignoring unrecognized configuration key '{key}'. Please check your configuration file for typos."
            );
        }

        let input = self.input.clone().ok_or(MvtilerError::NoInput)?;
        let output = self.output.as_deref().ok_or(MvtilerError::NoOutput)?;

        let default_zooms = ZoomRange::default();
        let zooms = ZoomRange::new(
            self.min_zoom.unwrap_or(default_zooms.min()),
            self.max_zoom.unwrap_or(default_zooms.max()),
        )?;

        let tile_size = self.tile_size.unwrap_or(DEFAULT_TILE_SIZE);
        if tile_size == 0 {
            return Err(TilerError::InvalidTileSize(tile_size).into());
        }
        let simplify_tolerance = self.simplify.unwrap_or(DEFAULT_SIMPLIFY_TOLERANCE);
        if !simplify_tolerance.is_finite() || simplify_tolerance < 0.0 {
            return Err(MvtilerError::InvalidSimplifyTolerance(simplify_tolerance));
        }
        let concurrency = match self.concurrency {
            Some(0) => {
                warn!("Concurrency must be at least 1, using 1");
                1
            }
            Some(concurrency) => concurrency,
            None => num_cpus::get(),
        };

        let layer_name = self.layer.clone().unwrap_or_else(|| {
            input
                .file_stem()
                .map_or_else(|| DEFAULT_LAYER_NAME.to_string(), |s| s.to_string_lossy().to_string())
        });

        Ok(TilingJob {
            input_crs: self.input_crs.unwrap_or_default(),
            output: OutputTarget::from_path(output),
            on_duplicate: self.on_duplicate,
            options: TilingOptions {
                zooms,
                tile_size,
                simplify_tolerance,
                buffer: self.buffer.unwrap_or(DEFAULT_BUFFER),
                layer_name,
                concurrency,
                compress: self.compress.unwrap_or(true),
                feature_cache_size: self
                    .feature_cache_size
                    .unwrap_or(DEFAULT_FEATURE_CACHE_SIZE),
            },
            attribution: self.attribution.clone(),
            description: self.description.clone(),
            metadata: self
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            input,
        })
    }

    pub fn save_to_file(&self, file_name: &Path) -> MvtilerResult<()> {
        let yaml = serde_yaml::to_string(&self).map_err(MvtilerError::ConfigSerializeError)?;
        if file_name.as_os_str() == OsStr::new("-") {
            info!("Current configuration:");
            println!("\n\n{yaml}\n");
            Ok(())
        } else {
            info!(
                "Saving config to {}, use --config to load it",
                file_name.display()
            );
            File::create(file_name)
                .map_err(|e| MvtilerError::ConfigWriteError(e, file_name.to_path_buf()))?
                .write_all(yaml.as_bytes())
                .map_err(|e| MvtilerError::ConfigWriteError(e, file_name.to_path_buf()))?;
            Ok(())
        }
    }
}

/// Read config from a file
pub fn read_config(file_name: &Path) -> MvtilerResult<Config> {
    let mut file =
        File::open(file_name).map_err(|e| MvtilerError::ConfigLoadError(e, file_name.into()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| MvtilerError::ConfigLoadError(e, file_name.into()))?;
    parse_config(&contents, file_name)
}

pub fn parse_config(contents: &str, file_name: &Path) -> MvtilerResult<Config> {
    serde_yaml::from_str(contents).map_err(|e| MvtilerError::ConfigParseError(e, file_name.into()))
}
