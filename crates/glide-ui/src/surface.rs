//! Off-screen raster surfaces and a small software canvas over them.
//!
//! A `Surface` is an RGBA8 buffer whose allocation is fallible: running out
//! of memory (or exceeding the per-surface ceiling) is reported as
//! [`UiError::SurfaceAllocation`] instead of aborting, so painting can skip a
//! frame and try again on the next one.

use glide_core::{Color, Rect, Size, Vec2};
use image::{Pixel, Rgba, RgbaImage};

use crate::background::Stretch;
use crate::error::{Result, UiError};

/// Bytes taken by a `width x height` RGBA8 surface.
pub fn surface_bytes(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

#[derive(Debug)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    /// Allocate a cleared (fully transparent) surface.
    pub fn allocate(width: u32, height: u32, limit: Option<usize>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(UiError::EmptySurface);
        }
        let failed = |bytes| UiError::SurfaceAllocation {
            width,
            height,
            bytes,
        };
        let bytes = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(4))
            .ok_or_else(|| failed(usize::MAX))?;
        if limit.is_some_and(|l| bytes > l) {
            return Err(failed(bytes));
        }

        let mut buf: Vec<u8> = Vec::new();
        buf.try_reserve_exact(bytes).map_err(|_| failed(bytes))?;
        buf.resize(bytes, 0);
        let image = RgbaImage::from_raw(width, height, buf).ok_or_else(|| failed(bytes))?;
        Ok(Self { image })
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn bytes(&self) -> usize {
        surface_bytes(self.width(), self.height())
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn canvas(&mut self) -> Canvas<'_> {
        Canvas::new(&mut self.image)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PixelRect {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

impl PixelRect {
    fn intersect(self, o: PixelRect) -> PixelRect {
        PixelRect {
            x0: self.x0.max(o.x0),
            y0: self.y0.max(o.y0),
            x1: self.x1.min(o.x1),
            y1: self.y1.min(o.y1),
        }
    }

    fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }
}

fn rgba(c: Color) -> Rgba<u8> {
    Rgba(c.to_array())
}

/// A clipped, translated view onto an RGBA image. Coordinates passed to the
/// drawing calls are local to `origin`.
pub struct Canvas<'a> {
    image: &'a mut RgbaImage,
    origin: (f32, f32),
    clip: PixelRect,
}

impl<'a> Canvas<'a> {
    pub fn new(image: &'a mut RgbaImage) -> Self {
        let clip = PixelRect {
            x0: 0,
            y0: 0,
            x1: image.width() as i64,
            y1: image.height() as i64,
        };
        Self {
            image,
            origin: (0.0, 0.0),
            clip,
        }
    }

    /// A canvas restricted to `rect` (local coordinates), whose origin is the
    /// rect's top-left corner.
    pub fn sub(&mut self, rect: Rect) -> Canvas<'_> {
        let clip = self.to_pixels(rect);
        Canvas {
            origin: (self.origin.0 + rect.x, self.origin.1 + rect.y),
            clip,
            image: &mut *self.image,
        }
    }

    /// Visible size in local units.
    pub fn size(&self) -> Size {
        if self.clip.is_empty() {
            return Size::ZERO;
        }
        Size::new(
            (self.clip.x1 - self.clip.x0) as f32,
            (self.clip.y1 - self.clip.y0) as f32,
        )
    }

    pub fn is_clipped_out(&self) -> bool {
        self.clip.is_empty()
    }

    fn to_pixels(&self, rect: Rect) -> PixelRect {
        let x = self.origin.0 + rect.x;
        let y = self.origin.1 + rect.y;
        PixelRect {
            x0: x.round() as i64,
            y0: y.round() as i64,
            x1: (x + rect.w).round() as i64,
            y1: (y + rect.h).round() as i64,
        }
        .intersect(self.clip)
    }

    fn blend_at(&mut self, x: i64, y: i64, px: Rgba<u8>) {
        match px.0[3] {
            0 => {}
            255 => self.image.put_pixel(x as u32, y as u32, px),
            _ => self.image.get_pixel_mut(x as u32, y as u32).blend(&px),
        }
    }

    /// Overwrite every visible pixel, alpha included.
    pub fn clear(&mut self, color: Color) {
        let px = rgba(color);
        let r = self.clip;
        for y in r.y0.max(0)..r.y1 {
            for x in r.x0.max(0)..r.x1 {
                self.image.put_pixel(x as u32, y as u32, px);
            }
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        if color.is_transparent() {
            return;
        }
        let px = rgba(color);
        let r = self.to_pixels(rect);
        for y in r.y0..r.y1 {
            for x in r.x0..r.x1 {
                self.blend_at(x, y, px);
            }
        }
    }

    /// Alpha-composite `src` with its top-left corner at `at`.
    pub fn blit(&mut self, src: &RgbaImage, at: Vec2) {
        let dest = Rect::new(at.x, at.y, src.width() as f32, src.height() as f32);
        let r = self.to_pixels(dest);
        let x0 = (self.origin.0 + at.x).round() as i64;
        let y0 = (self.origin.1 + at.y).round() as i64;
        for y in r.y0..r.y1 {
            for x in r.x0..r.x1 {
                let sx = (x - x0) as u32;
                let sy = (y - y0) as u32;
                if sx < src.width() && sy < src.height() {
                    let px = *src.get_pixel(sx, sy);
                    self.blend_at(x, y, px);
                }
            }
        }
    }

    /// Copy (without blending) the part of `src` starting at `src_origin`
    /// into `dest`.
    pub fn copy_region(&mut self, src: &RgbaImage, src_origin: Vec2, dest: Rect) {
        let r = self.to_pixels(dest);
        let dx0 = (self.origin.0 + dest.x).round() as i64;
        let dy0 = (self.origin.1 + dest.y).round() as i64;
        let sx0 = src_origin.x.round() as i64;
        let sy0 = src_origin.y.round() as i64;
        for y in r.y0..r.y1 {
            let sy = y - dy0 + sy0;
            if sy < 0 || sy >= src.height() as i64 {
                continue;
            }
            for x in r.x0..r.x1 {
                let sx = x - dx0 + sx0;
                if sx < 0 || sx >= src.width() as i64 {
                    continue;
                }
                let px = *src.get_pixel(sx as u32, sy as u32);
                self.image.put_pixel(x as u32, y as u32, px);
            }
        }
    }

    /// Draw `src` into `dest` using nearest-neighbour sampling.
    pub fn draw_image(&mut self, src: &RgbaImage, dest: Rect, stretch: Stretch) {
        let (iw, ih) = (src.width() as f32, src.height() as f32);
        if iw == 0.0 || ih == 0.0 || dest.w <= 0.0 || dest.h <= 0.0 {
            return;
        }
        let placed = match stretch {
            Stretch::None | Stretch::Tile => Rect::new(dest.x, dest.y, iw, ih),
            Stretch::Fill => dest,
            Stretch::Uniform | Stretch::UniformToFill => {
                let sx = dest.w / iw;
                let sy = dest.h / ih;
                let s = if stretch == Stretch::Uniform {
                    sx.min(sy)
                } else {
                    sx.max(sy)
                };
                let (w, h) = (iw * s, ih * s);
                Rect::new(dest.x + (dest.w - w) / 2.0, dest.y + (dest.h - h) / 2.0, w, h)
            }
        };
        let area = if stretch == Stretch::Tile { dest } else { placed };
        let r = self.to_pixels(area).intersect(self.to_pixels(dest));
        let px0 = self.origin.0 + placed.x;
        let py0 = self.origin.1 + placed.y;
        for y in r.y0..r.y1 {
            let sy = if stretch == Stretch::Tile {
                ((y as f32 - py0).floor() as i64).rem_euclid(ih as i64)
            } else {
                (((y as f32 + 0.5 - py0) * ih / placed.h) as i64).clamp(0, ih as i64 - 1)
            };
            for x in r.x0..r.x1 {
                let sx = if stretch == Stretch::Tile {
                    ((x as f32 - px0).floor() as i64).rem_euclid(iw as i64)
                } else {
                    (((x as f32 + 0.5 - px0) * iw / placed.w) as i64).clamp(0, iw as i64 - 1)
                };
                let px = *src.get_pixel(sx as u32, sy as u32);
                self.blend_at(x, y, px);
            }
        }
    }

    /// A straight stroke made of square stamps.
    pub fn stroke_segment(&mut self, a: Vec2, b: Vec2, width: f32, color: Color) {
        let d = b - a;
        let steps = d.x.abs().max(d.y.abs()).ceil().max(1.0) as usize;
        let half = width / 2.0;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let p = Vec2::new(a.x + d.x * t, a.y + d.y * t);
            self.fill_rect(Rect::new(p.x - half, p.y - half, width, width), color);
        }
    }
}
