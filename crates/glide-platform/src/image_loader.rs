//! Asynchronous image loading into [`ImageSlot`]s.
//!
//! Reading and decoding happen on the worker pool. Completions are applied
//! on the UI thread by [`ImageLoader::pump`]; a completion whose slot has
//! since been asked for another image is dropped, so the newest request
//! wins. A failed load is logged and leaves the slot showing whatever it
//! showed before.

use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use glide_ui::ImageSlot;
use image::RgbaImage;
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

use crate::dispatch::{UiQueue, WorkerPool};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("malformed data uri: {0}")]
    DataUri(String),

    #[error("unsupported image source scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("image workers have shut down")]
    WorkerGone,
}

/// Where image bytes come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    File(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Accepts `data:` URIs, `file://` URLs and plain paths.
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        if let Some(rest) = source.strip_prefix("data:") {
            return parse_data_uri(rest).map(ImageSource::Bytes);
        }
        if let Some(path) = source.strip_prefix("file://") {
            return Ok(ImageSource::File(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = source.split_once("://") {
            return Err(LoadError::UnsupportedScheme(scheme.to_owned()));
        }
        Ok(ImageSource::File(PathBuf::from(source)))
    }

    /// Read and decode. Blocking.
    pub fn decode(&self) -> Result<RgbaImage, LoadError> {
        let decoded = match self {
            ImageSource::File(path) => {
                let bytes = std::fs::read(path)?;
                image::load_from_memory(&bytes)?
            }
            ImageSource::Bytes(bytes) => image::load_from_memory(bytes)?,
        };
        Ok(decoded.to_rgba8())
    }
}

fn parse_data_uri(rest: &str) -> Result<Vec<u8>, LoadError> {
    let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| LoadError::DataUri("missing `,`".into()))?;
    if meta.ends_with(";base64") {
        STANDARD
            .decode(data.trim())
            .map_err(|e| LoadError::DataUri(e.to_string()))
    } else {
        Ok(data.as_bytes().to_vec())
    }
}

new_key_type! {
    struct RequestKey;
}

struct Pending {
    slot: ImageSlot,
    generation: u64,
    source: String,
}

type Completion = (RequestKey, Result<RgbaImage, LoadError>);

pub struct ImageLoader {
    pool: WorkerPool,
    pending: SlotMap<RequestKey, Pending>,
    done: UiQueue<Completion>,
    failures: u64,
}

impl ImageLoader {
    pub fn new(workers: usize) -> std::io::Result<Self> {
        Ok(Self::with_pool(WorkerPool::new(workers)?))
    }

    pub fn with_pool(pool: WorkerPool) -> Self {
        Self {
            pool,
            pending: SlotMap::with_key(),
            done: UiQueue::new(),
            failures: 0,
        }
    }

    /// Start loading `source` into `slot`. Sources that cannot be understood
    /// fail here; read and decode errors surface later through `pump`.
    pub fn load(&mut self, slot: &ImageSlot, source: &str) -> Result<(), LoadError> {
        let parsed = ImageSource::parse(source)?;
        let generation = slot.begin_request(source);
        let key = self.pending.insert(Pending {
            slot: slot.clone(),
            generation,
            source: source.to_owned(),
        });
        let done = self.done.clone();
        let queued = self.pool.execute(move || {
            done.push((key, parsed.decode()));
        });
        if !queued {
            self.pending.remove(key);
            return Err(LoadError::WorkerGone);
        }
        log::debug!("image request {generation} queued for {}", short(source));
        Ok(())
    }

    /// Apply finished loads. Returns how many images landed in their slots.
    pub fn pump(&mut self) -> usize {
        let pending = &mut self.pending;
        let failures = &mut self.failures;
        let mut delivered = 0;
        self.done.pump(|(key, result)| {
            let Some(request) = pending.remove(key) else {
                return;
            };
            match result {
                Ok(image) => {
                    if request.slot.deliver(request.generation, image) {
                        delivered += 1;
                    }
                }
                Err(err) => {
                    *failures += 1;
                    log::warn!("image load failed for {}: {err}", short(&request.source));
                }
            }
        });
        delivered
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}

fn short(source: &str) -> &str {
    match source.char_indices().nth(48) {
        Some((i, _)) => &source[..i],
        None => source,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba};

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn data_uri(width: u32, height: u32) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(png(width, height)))
    }

    #[test]
    fn parses_sources() {
        assert_eq!(
            ImageSource::parse("file:///tmp/a.png").unwrap(),
            ImageSource::File(PathBuf::from("/tmp/a.png"))
        );
        assert_eq!(
            ImageSource::parse("icons/a.png").unwrap(),
            ImageSource::File(PathBuf::from("icons/a.png"))
        );
        assert!(matches!(
            ImageSource::parse("https://example.org/a.png"),
            Err(LoadError::UnsupportedScheme(s)) if s == "https"
        ));
        assert!(matches!(
            ImageSource::parse("data:image/png;base64"),
            Err(LoadError::DataUri(_))
        ));
    }

    #[test]
    fn data_uri_loads_on_pump() {
        let mut loader = ImageLoader::new(0).unwrap();
        let slot = ImageSlot::new();
        loader.load(&slot, &data_uri(3, 2)).unwrap();
        assert!(!slot.is_loaded());
        assert_eq!(loader.pump(), 1);
        let image = slot.image().unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(image.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
        assert_eq!(loader.pending(), 0);
    }

    #[test]
    fn newest_request_wins() {
        let mut loader = ImageLoader::new(0).unwrap();
        let slot = ImageSlot::new();
        loader.load(&slot, &data_uri(1, 1)).unwrap();
        loader.load(&slot, &data_uri(4, 4)).unwrap();
        assert_eq!(loader.pump(), 1);
        assert_eq!(slot.image().map(|i| i.width()), Some(4));
    }

    #[test]
    fn failure_keeps_previous_image() {
        let mut loader = ImageLoader::new(0).unwrap();
        let slot = ImageSlot::with_image(RgbaImage::new(5, 5));
        loader
            .load(&slot, "data:image/png;base64,bm90IGEgcG5n")
            .unwrap();
        loader.load(&slot, "/definitely/not/here.png").unwrap();
        assert_eq!(loader.pump(), 0);
        assert_eq!(loader.failures(), 2);
        assert_eq!(slot.image().map(|i| i.width()), Some(5));
    }

    #[test]
    fn threaded_loads_complete() {
        let mut loader = ImageLoader::new(2).unwrap();
        let slots: Vec<ImageSlot> = (0..6).map(|_| ImageSlot::new()).collect();
        for (i, slot) in slots.iter().enumerate() {
            loader.load(slot, &data_uri(i as u32 + 1, 1)).unwrap();
        }
        let mut delivered = 0;
        for _ in 0..500 {
            delivered += loader.pump();
            if loader.pending() == 0 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        assert_eq!(delivered, 6);
        for (i, slot) in slots.iter().enumerate() {
            assert_eq!(slot.image().map(|img| img.width()), Some(i as u32 + 1));
        }
    }
}
