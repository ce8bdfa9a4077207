//! Background workers for the slicing and dedup stages.
//!
//! Each stage runs as one blocking task that owns its input outright: the
//! caller moves the pixel data in and gets a single result back, with no
//! shared buffers left behind. Every stage runs under a timeout so a stuck
//! worker surfaces as an error instead of stalling the pipeline.
//!
//! The serde message types mirror the JSON contract used when the stages run
//! out of process; `handle_*` answer a request with either a result or an
//! `{ "error": ... }` message.

mod messages;

use std::time::Duration;

use tokio::task;
use tracing::debug;

use crate::dedup::{find_unique, UniqueTiles};
use crate::error::{PipelineStage, Result, TileError};
use crate::slicer::{slice, validate_dimensions, TileSet};
use crate::types::{PixelBuffer, Tile};

pub use messages::{
    handle_dedup_request, handle_slice_request, DedupRequest, DedupResponse, SliceRequest,
    SliceResponse, WireBuffer, WireTile,
};

/// Default time a worker may take before the stage is abandoned.
pub const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(30);

/// Run `work` on the blocking pool and wait for its single result.
///
/// On timeout the result is dropped; the blocking task cannot be interrupted
/// and finishes in the background.
pub(crate) async fn run_stage<T, F>(stage: PipelineStage, timeout: Duration, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let handle = task::spawn_blocking(work);

    match tokio::time::timeout(timeout, handle).await {
        Err(_) => Err(TileError::WorkerTimeout {
            stage,
            seconds: timeout.as_secs(),
        }),
        Ok(Err(join_error)) => Err(TileError::Worker {
            stage,
            message: if join_error.is_panic() {
                "worker panicked".to_string()
            } else {
                join_error.to_string()
            },
        }),
        Ok(Ok(result)) => result,
    }
}

/// Slice an image on a background worker.
///
/// Dimensions are checked on the calling task so configuration mistakes are
/// reported before any work is scheduled.
pub async fn slice_in_background(
    image: PixelBuffer,
    tile_width: u32,
    tile_height: u32,
    timeout: Duration,
) -> Result<TileSet> {
    validate_dimensions(image.width(), image.height(), tile_width, tile_height)?;
    debug!(
        width = image.width(),
        height = image.height(),
        "dispatching slice worker"
    );
    run_stage(PipelineStage::Slice, timeout, move || {
        slice(image, tile_width, tile_height)
    })
    .await
}

/// Find unique tiles on a background worker.
pub async fn find_unique_in_background(
    tiles: Vec<Tile>,
    tolerance: u8,
    timeout: Duration,
) -> Result<UniqueTiles> {
    debug!(tiles = tiles.len(), tolerance, "dispatching dedup worker");
    run_stage(PipelineStage::Dedup, timeout, move || {
        Ok(find_unique(tiles, tolerance))
    })
    .await
}
