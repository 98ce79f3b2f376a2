//! Background load and crop tasks.
//!
//! [`CropWorker`] runs two threads, one per lane: loading a bitmap for
//! display and cropping the result. Each lane holds at most one useful
//! request at a time. Submitting bumps the lane's generation counter, so
//! anything older still queued is skipped unprocessed and anything older
//! still running has its result thrown away.
//!
//! Requests are self-contained snapshots. Nothing here reads view state, so
//! a crop computed against a bitmap that has since been replaced is simply
//! a stale result.
//!
//! Replies from both lanes arrive on one channel for the UI thread to poll
//! with [`CropWorker::try_recv`] or wait on with [`CropWorker::recv_blocking`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use async_channel::{Receiver, Sender, TryRecvError};

use crate::bitmap::{
    crop_bitmap, crop_source, load_sampled, BitmapError, BitmapIo, DecodedImage, ImageSource,
    LoadedBitmap, OutputRequest, SampledImage,
};
use crate::geometry::Quad;
use crate::options::OutputFormat;
use crate::view::SourceCrop;

/// Decode `source` for display at about the requested size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub source: ImageSource,
    pub req_width: u32,
    pub req_height: u32,
}

/// Outcome of a [`LoadRequest`]. Exactly one of `bitmap` and `error` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    pub id: u32,
    pub source: ImageSource,
    pub bitmap: Option<LoadedBitmap>,
    pub error: Option<BitmapError>,
}

/// Pixels a crop is cut from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CropSource {
    /// Decode the full resolution source again, region only.
    Source(ImageSource),
    /// Reuse the sampled bitmap already on screen.
    Bitmap(Arc<DecodedImage>),
}

/// Where to write an encoded crop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTarget {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub quality: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CropRequest {
    pub source: CropSource,
    pub crop: SourceCrop,
    pub output: OutputRequest,
    pub save: Option<SaveTarget>,
}

/// Outcome of a [`CropRequest`], with the geometry it was cut with.
#[derive(Debug, Clone, PartialEq)]
pub struct CropResult {
    pub id: u32,
    pub image: Option<DecodedImage>,
    pub error: Option<BitmapError>,
    /// Set once the encoded image has been written.
    pub saved_to: Option<PathBuf>,
    pub points: Quad,
    pub rotation: f64,
    pub flip_horizontally: bool,
    pub flip_vertically: bool,
    pub sample_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerReply {
    Loaded(LoadResult),
    Cropped(CropResult),
}

#[derive(Debug)]
struct Envelope<T> {
    id: u32,
    payload: T,
}

/// Sending half of a lane. The generation holds the newest id handed out.
#[derive(Debug)]
struct Lane<T> {
    sender: Sender<Envelope<T>>,
    generation: Arc<AtomicU32>,
}

impl<T> Lane<T> {
    fn submit(&self, payload: T) -> u32 {
        let id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if self.sender.send_blocking(Envelope { id, payload }).is_err() {
            tracing::error!(id, "worker lane is closed, request dropped");
        }
        id
    }

    fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn is_current(&self, id: u32) -> bool {
        self.generation.load(Ordering::SeqCst) == id
    }
}

/// Serve one lane until its request channel closes.
fn run_lane<T, F>(
    lane: &'static str,
    requests: Receiver<Envelope<T>>,
    generation: Arc<AtomicU32>,
    replies: Sender<WorkerReply>,
    mut process: F,
) where
    F: FnMut(u32, T, &dyn Fn() -> bool) -> WorkerReply,
{
    while let Ok(Envelope { id, payload }) = requests.recv_blocking() {
        if generation.load(Ordering::SeqCst) != id {
            tracing::debug!(lane, id, "newer request queued, skipping");
            continue;
        }

        let is_cancelled = || generation.load(Ordering::SeqCst) != id;
        let reply = process(id, payload, &is_cancelled);
        if is_cancelled() {
            tracing::debug!(lane, id, "result superseded, discarding");
            continue;
        }
        if replies.send_blocking(reply).is_err() {
            break;
        }
    }
    tracing::debug!(lane, "worker lane stopped");
}

fn load<I: BitmapIo + ?Sized>(io: &I, id: u32, request: LoadRequest) -> WorkerReply {
    let (bitmap, error) = match load_sampled(io, &request.source, request.req_width, request.req_height) {
        Ok(bitmap) => (Some(bitmap), None),
        Err(err) => {
            tracing::warn!(%err, source = %request.source, "failed to load bitmap");
            (None, Some(err))
        }
    };
    WorkerReply::Loaded(LoadResult {
        id,
        source: request.source,
        bitmap,
        error,
    })
}

fn crop<I: BitmapIo + ?Sized>(
    io: &I,
    id: u32,
    request: CropRequest,
    is_cancelled: &dyn Fn() -> bool,
) -> WorkerReply {
    let CropRequest {
        source,
        crop,
        output,
        save,
    } = request;

    let cropped = match &source {
        CropSource::Source(source) => crop_source(io, source, &crop, &output, is_cancelled),
        CropSource::Bitmap(bitmap) => Ok(SampledImage {
            image: crop_bitmap(bitmap, &crop, &output),
            sample_size: crop.sample_size,
        }),
    };

    let mut result = CropResult {
        id,
        image: None,
        error: None,
        saved_to: None,
        points: crop.points,
        rotation: crop.rotation,
        flip_horizontally: crop.flip_horizontally,
        flip_vertically: crop.flip_vertically,
        sample_size: crop.sample_size,
    };

    match cropped {
        Ok(sampled) => {
            result.sample_size = sampled.sample_size;
            if let Some(target) = save {
                match io.encode(&sampled.image, &target.path, target.format, target.quality) {
                    Ok(()) => result.saved_to = Some(target.path),
                    Err(err) => {
                        tracing::warn!(%err, path = %target.path.display(), "failed to save crop");
                        result.error = Some(err);
                    }
                }
            }
            result.image = Some(sampled.image);
        }
        Err(err) => {
            if err != BitmapError::Cancelled {
                tracing::warn!(%err, "failed to crop bitmap");
            }
            result.error = Some(err);
        }
    }
    WorkerReply::Cropped(result)
}

/// Background loader and cropper for one view.
#[derive(Debug)]
pub struct CropWorker {
    load: Lane<LoadRequest>,
    crop: Lane<CropRequest>,
    replies: Receiver<WorkerReply>,
    _threads: [JoinHandle<()>; 2],
}

impl CropWorker {
    /// Spawn the load and crop threads over `io`.
    ///
    /// The threads exit once the worker is dropped.
    ///
    /// # Errors
    ///
    /// Returns `BitmapError::Io` if a thread cannot be spawned.
    pub fn new<I>(io: I) -> Result<Self, BitmapError>
    where
        I: BitmapIo + Send + Sync + 'static,
    {
        let io = Arc::new(io);
        let (reply_sender, replies) = async_channel::unbounded();

        let (load_sender, load_receiver) = async_channel::unbounded();
        let load_generation = Arc::new(AtomicU32::new(0));
        let load_thread = {
            let io = Arc::clone(&io);
            let generation = Arc::clone(&load_generation);
            let replies = reply_sender.clone();
            thread::Builder::new()
                .name("cropview-load".to_string())
                .spawn(move || {
                    run_lane("load", load_receiver, generation, replies, |id, request, _| {
                        load(io.as_ref(), id, request)
                    })
                })?
        };

        let (crop_sender, crop_receiver) = async_channel::unbounded();
        let crop_generation = Arc::new(AtomicU32::new(0));
        let crop_thread = {
            let generation = Arc::clone(&crop_generation);
            thread::Builder::new()
                .name("cropview-crop".to_string())
                .spawn(move || {
                    run_lane("crop", crop_receiver, generation, reply_sender, |id, request, is_cancelled| {
                        crop(io.as_ref(), id, request, is_cancelled)
                    })
                })?
        };

        Ok(Self {
            load: Lane {
                sender: load_sender,
                generation: load_generation,
            },
            crop: Lane {
                sender: crop_sender,
                generation: crop_generation,
            },
            replies,
            _threads: [load_thread, crop_thread],
        })
    }

    /// Queue a load, superseding any earlier one. Returns the request id.
    pub fn start_load(&self, request: LoadRequest) -> u32 {
        self.load.submit(request)
    }

    /// Queue a crop, superseding any earlier one. Returns the request id.
    pub fn start_crop(&self, request: CropRequest) -> u32 {
        self.crop.submit(request)
    }

    pub fn cancel_load(&self) {
        self.load.cancel();
    }

    pub fn cancel_crop(&self) {
        self.crop.cancel();
    }

    /// Whether `id` is still the newest load. A reply can race a newer
    /// request, so callers check before applying it.
    pub fn is_current_load(&self, id: u32) -> bool {
        self.load.is_current(id)
    }

    pub fn is_current_crop(&self, id: u32) -> bool {
        self.crop.is_current(id)
    }

    /// Next reply if one is ready.
    pub fn try_recv(&self) -> Option<WorkerReply> {
        match self.replies.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                tracing::error!("worker threads have stopped");
                None
            }
        }
    }

    /// Wait for the next reply. `None` once both lanes have stopped.
    pub fn recv_blocking(&self) -> Option<WorkerReply> {
        self.replies.recv_blocking().ok()
    }
}
