use std::sync::Arc;
use std::time::Duration;

use futures::TryFutureExt as _;
use mvtiler_core::pyramid::{PyramidOutcome, TileGenerator, generate_pyramid};
use tilejson::{Center, TileJSON, tilejson};
use tokio::sync::mpsc::channel;
use tokio::time::Instant;
use tokio::try_join;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

use crate::config::file::TilingJob;
use crate::input::GeoJsonSource;
use crate::output::{DirWriter, MbtilesWriter, OutputTarget, TileWriter};
use crate::progress::Progress;
use crate::{MvtilerError, MvtilerResult};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SAVE_EVERY: Duration = Duration::from_secs(60);
const PROGRESS_REPORT_AFTER: u64 = 100;
const PROGRESS_REPORT_EVERY: Duration = Duration::from_secs(2);
const BATCH_SIZE: usize = 1000;
const CHANNEL_SIZE: usize = 500;

/// Loads the input, generates the whole pyramid, and stores every non-empty tile.
///
/// Tiles are generated concurrently but written by a single task, in batches.
/// Cancelling `cancel` stops scheduling new tiles. Everything already generated is
/// still written before returning [`PyramidOutcome::Cancelled`].
pub async fn run(job: TilingJob, cancel: CancellationToken) -> MvtilerResult<PyramidOutcome> {
    let source = Arc::new(GeoJsonSource::from_file(&job.input, job.input_crs)?);
    let tilejson = tile_metadata(&job, &source);

    let mut writer: Box<dyn TileWriter> = match &job.output {
        OutputTarget::Mbtiles(path) => Box::new(
            MbtilesWriter::open(path, job.on_duplicate, &tilejson, job.metadata.clone()).await?,
        ),
        OutputTarget::Directory(path) => {
            if !job.metadata.is_empty() {
                warn!("Metadata values are only stored in MBTiles files, ignoring --set-meta");
            }
            Box::new(DirWriter::create(path).await?)
        }
    };

    let generator = Arc::new(TileGenerator::new(source, job.options)?);
    let zooms = generator.options().zooms;
    info!(
        "Generating zooms {}..={} of layer '{}' into {}",
        zooms.min(),
        zooms.max(),
        generator.options().layer_name,
        job.output
    );

    let progress = Progress::new();
    let (tx, mut rx) = channel(CHANNEL_SIZE);
    let (outcome, ()) = try_join!(
        generate_pyramid(generator, tx, &progress, &cancel).map_err(MvtilerError::from),
        async {
            let mut last_saved = Instant::now();
            let mut last_reported = Instant::now();
            let mut reported_at = 0;
            let mut batch = Vec::with_capacity(BATCH_SIZE);
            while let Some(tile) = rx.recv().await {
                trace!("Storing tile {}", tile.xyz);
                batch.push(tile);
                if batch.len() >= BATCH_SIZE || last_saved.elapsed() > SAVE_EVERY {
                    writer.write_tiles(&batch).await?;
                    batch.clear();
                    last_saved = Instant::now();
                }
                let done = progress.done();
                if done >= reported_at + PROGRESS_REPORT_AFTER
                    && last_reported.elapsed() > PROGRESS_REPORT_EVERY
                {
                    info!("{progress}");
                    reported_at = done;
                    last_reported = Instant::now();
                }
            }
            if !batch.is_empty() {
                writer.write_tiles(&batch).await?;
            }
            writer.finish().await
        }
    )?;

    info!("{progress}");
    let stats = outcome.stats();
    if outcome.is_cancelled() {
        warn!(
            "Tiling was cancelled. {} tiles with features were written into {}, the pyramid is incomplete",
            stats.non_empty, job.output
        );
    } else {
        info!(
            "Wrote {} tiles with {} features into {}, skipped {} empty tiles",
            stats.non_empty, stats.features, job.output, stats.empty
        );
    }
    Ok(outcome)
}

/// `TileJSON` stored as MBTiles metadata
fn tile_metadata(job: &TilingJob, source: &GeoJsonSource) -> TileJSON {
    let options = &job.options;
    let (min_zoom, max_zoom) = (options.zooms.min(), options.zooms.max());
    let bounds = source.wgs84_bounds();

    let mut tj = tilejson! { tiles: vec![] };
    tj.name = Some(options.layer_name.clone());
    tj.version = Some("1.0.0".to_string());
    tj.description.clone_from(&job.description);
    tj.attribution.clone_from(&job.attribution);
    tj.minzoom = Some(min_zoom);
    tj.maxzoom = Some(max_zoom);
    tj.center = Some(Center {
        longitude: (bounds.left + bounds.right) / 2.0,
        latitude: (bounds.bottom + bounds.top) / 2.0,
        zoom: min_zoom,
    });
    tj.bounds = Some(bounds);
    tj.vector_layers = Some(vec![source.vector_layer(
        &options.layer_name,
        min_zoom,
        max_zoom,
    )]);
    tj.other.insert(
        "format".to_string(),
        serde_json::Value::String("pbf".to_string()),
    );
    tj.other.insert(
        "generator".to_string(),
        serde_json::Value::String(format!("mvtiler v{VERSION}")),
    );
    tj
}
