use std::cell::RefCell;
use std::rc::Rc;

use glide_core::Color;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// How an image is fitted into the area it paints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stretch {
    /// Natural size, anchored top-left, cropped.
    None,
    #[default]
    Fill,
    /// Fit inside, keeping aspect ratio.
    Uniform,
    /// Cover, keeping aspect ratio; the overflow is cropped around the centre.
    UniformToFill,
    Tile,
}

#[derive(Default)]
struct SlotState {
    generation: u64,
    source: Option<String>,
    image: Option<Rc<RgbaImage>>,
    fresh: bool,
}

/// A shared cell an asynchronous image load writes into.
///
/// Every `begin_request` bumps the generation; completions carrying an older
/// generation are dropped, so the last request wins. The previous image stays
/// visible until its replacement has decoded.
#[derive(Clone, Default)]
pub struct ImageSlot(Rc<RefCell<SlotState>>);

impl ImageSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(image: RgbaImage) -> Self {
        let slot = Self::new();
        {
            let mut s = slot.0.borrow_mut();
            s.image = Some(Rc::new(image));
            s.fresh = true;
        }
        slot
    }

    pub fn begin_request(&self, source: impl Into<String>) -> u64 {
        let mut s = self.0.borrow_mut();
        s.generation += 1;
        s.source = Some(source.into());
        s.generation
    }

    pub fn generation(&self) -> u64 {
        self.0.borrow().generation
    }

    pub fn source(&self) -> Option<String> {
        self.0.borrow().source.clone()
    }

    /// Store a decoded image. Returns false when a newer request superseded
    /// this one.
    pub fn deliver(&self, generation: u64, image: RgbaImage) -> bool {
        let mut s = self.0.borrow_mut();
        if generation != s.generation {
            log::debug!(
                "dropping stale image (generation {generation}, current {})",
                s.generation
            );
            return false;
        }
        s.image = Some(Rc::new(image));
        s.fresh = true;
        true
    }

    /// True once after each successful delivery.
    pub fn take_fresh(&self) -> bool {
        std::mem::take(&mut self.0.borrow_mut().fresh)
    }

    pub fn image(&self) -> Option<Rc<RgbaImage>> {
        self.0.borrow().image.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.0.borrow().image.is_some()
    }
}

impl std::fmt::Debug for ImageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.0.borrow();
        f.debug_struct("ImageSlot")
            .field("generation", &s.generation)
            .field("source", &s.source)
            .field("loaded", &s.image.is_some())
            .finish()
    }
}

#[derive(Clone, Debug, Default)]
pub enum Background {
    #[default]
    None,
    Solid(Color),
    Image { slot: ImageSlot, stretch: Stretch },
}

impl Background {
    pub fn image(stretch: Stretch) -> (Self, ImageSlot) {
        let slot = ImageSlot::new();
        (
            Background::Image {
                slot: slot.clone(),
                stretch,
            },
            slot,
        )
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Background::None)
    }

    /// Consume a pending "image arrived" notification, if any.
    pub fn take_fresh(&self) -> bool {
        match self {
            Background::Image { slot, .. } => slot.take_fresh(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_request_wins() {
        let slot = ImageSlot::new();
        let first = slot.begin_request("a.png");
        let second = slot.begin_request("b.png");

        assert!(slot.deliver(second, RgbaImage::new(2, 2)));
        assert!(!slot.deliver(first, RgbaImage::new(9, 9)));
        assert_eq!(slot.image().map(|i| i.width()), Some(2));
        assert_eq!(slot.source().as_deref(), Some("b.png"));
    }

    #[test]
    fn fresh_is_reported_once() {
        let slot = ImageSlot::new();
        let g = slot.begin_request("x");
        assert!(!slot.take_fresh());
        slot.deliver(g, RgbaImage::new(1, 1));
        assert!(slot.take_fresh());
        assert!(!slot.take_fresh());
    }

    #[test]
    fn pending_request_keeps_previous_image() {
        let slot = ImageSlot::with_image(RgbaImage::new(3, 3));
        slot.take_fresh();
        slot.begin_request("next");
        assert!(slot.is_loaded());
        assert!(!slot.take_fresh());
    }
}
