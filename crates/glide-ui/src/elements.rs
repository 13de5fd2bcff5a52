//! Built-in leaf elements.
//!
//! Text is not shaped here: labels and fields measure with a fixed advance
//! per character and paint each line as a solid bar. Hosts that need real
//! glyphs supply their own `Element`.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glide_core::{Color, Dirty, ElementId, Placement, Rect, Size, TextInputKind, Vec2};
use image::{ImageFormat, RgbaImage};

use crate::background::{Background, ImageSlot, Stretch};
use crate::element::{Element, ElementEvent};
use crate::error::Result;
use crate::impl_any;
use crate::surface::Canvas;

const CHAR_ADVANCE: f32 = 0.55;
const LINE_HEIGHT: f32 = 1.3;

struct Common {
    id: ElementId,
    placement: Placement,
    frame: Rect,
    dirty: Dirty,
}

impl Common {
    fn new() -> Self {
        Self {
            id: ElementId::next(),
            placement: Placement::default(),
            frame: Rect::default(),
            dirty: Dirty::LAYOUT | Dirty::PAINT,
        }
    }
}

macro_rules! common_accessors {
    () => {
        common_accessors!(custom_dirty);
        fn take_dirty(&mut self) -> Dirty {
            std::mem::take(&mut self.common.dirty)
        }
    };
    // For elements that fold their own sources into `take_dirty`.
    (custom_dirty) => {
        fn id(&self) -> ElementId {
            self.common.id
        }
        fn placement(&self) -> &Placement {
            &self.common.placement
        }
        fn placement_mut(&mut self) -> &mut Placement {
            &mut self.common.placement
        }
        fn frame(&self) -> Rect {
            self.common.frame
        }
        fn set_frame(&mut self, frame: Rect) {
            self.common.frame = frame;
        }
        impl_any!();
    };
}

fn bounds(frame: Rect) -> Rect {
    Rect::from_origin_size(Vec2::ZERO, frame.size())
}

/// Lines of `text` wrapped at `max_width`, as (chars per line) widths.
fn wrap(text: &str, font_size: f32, max_width: f32) -> Vec<f32> {
    let advance = font_size * CHAR_ADVANCE;
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut w = paragraph.chars().count() as f32 * advance;
        if max_width.is_finite() && max_width > advance {
            while w > max_width {
                lines.push(max_width);
                w -= max_width;
            }
        }
        lines.push(w);
    }
    lines
}

fn paint_text_bars(canvas: &mut Canvas<'_>, lines: &[f32], origin: Vec2, font_size: f32, color: Color) {
    let line_h = font_size * LINE_HEIGHT;
    for (i, w) in lines.iter().enumerate() {
        let y = origin.y + i as f32 * line_h + (line_h - font_size * 0.6) / 2.0;
        canvas.fill_rect(Rect::new(origin.x, y, *w, font_size * 0.6), color);
    }
}

/// A fixed-size coloured rectangle.
pub struct Block {
    common: Common,
    preferred: Size,
    color: Color,
}

impl Block {
    pub fn new(preferred: Size, color: Color) -> Self {
        Self {
            common: Common::new(),
            preferred,
            color,
        }
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.common.dirty |= Dirty::PAINT;
    }
}

impl Element for Block {
    common_accessors!();

    fn measure(&mut self, _available: Size) -> Size {
        self.preferred
    }

    fn paint(&self, canvas: &mut Canvas<'_>) {
        canvas.fill_rect(bounds(self.common.frame), self.color);
    }
}

pub struct Label {
    common: Common,
    text: String,
    font_size: f32,
    color: Color,
    highlight_color: Color,
    background: Color,
    highlighted: bool,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            common: Common::new(),
            text: text.into(),
            font_size: 16.0,
            color: Color::BLACK,
            highlight_color: Color::WHITE,
            background: Color::TRANSPARENT,
            highlighted: false,
        }
    }

    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.common.dirty |= Dirty::LAYOUT | Dirty::PAINT;
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }
}

impl Element for Label {
    common_accessors!();

    fn measure(&mut self, available: Size) -> Size {
        let lines = wrap(&self.text, self.font_size, available.width);
        let width = lines.iter().copied().fold(0.0, f32::max);
        Size::new(width, lines.len() as f32 * self.font_size * LINE_HEIGHT)
    }

    fn paint(&self, canvas: &mut Canvas<'_>) {
        let b = bounds(self.common.frame);
        canvas.fill_rect(b, self.background);
        let color = if self.highlighted {
            self.highlight_color
        } else {
            self.color
        };
        let lines = wrap(&self.text, self.font_size, b.w);
        paint_text_bars(canvas, &lines, Vec2::ZERO, self.font_size, color);
    }

    fn set_highlighted(&mut self, highlighted: bool) {
        if self.highlighted != highlighted {
            self.highlighted = highlighted;
            self.common.dirty |= Dirty::PAINT;
        }
    }
}

pub struct TextField {
    common: Common,
    kind: TextInputKind,
    value: String,
    submit_key: Option<String>,
    font_size: f32,
    focused: bool,
}

impl TextField {
    pub fn new(kind: TextInputKind) -> Self {
        Self {
            common: Common::new(),
            kind,
            value: String::new(),
            submit_key: None,
            font_size: 16.0,
            focused: false,
        }
    }

    pub fn single_line() -> Self {
        Self::new(TextInputKind::SingleLine)
    }

    pub fn multi_line() -> Self {
        Self::new(TextInputKind::MultiLine)
    }

    pub fn submit_key(mut self, key: impl Into<String>) -> Self {
        self.submit_key = Some(key.into());
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.common.dirty |= Dirty::PAINT;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }
}

impl Element for TextField {
    common_accessors!();

    fn measure(&mut self, available: Size) -> Size {
        let lines = match self.kind {
            TextInputKind::SingleLine => 1.0,
            TextInputKind::MultiLine => 3.0,
        };
        let width = if available.width.is_finite() {
            available.width
        } else {
            160.0
        };
        Size::new(width, lines * self.font_size * LINE_HEIGHT + 8.0)
    }

    fn paint(&self, canvas: &mut Canvas<'_>) {
        let b = bounds(self.common.frame);
        let border = if self.focused {
            Color::HIGHLIGHT
        } else {
            Color::from_rgb(160, 160, 160)
        };
        canvas.fill_rect(b, border);
        let inner = Rect::new(1.0, 1.0, (b.w - 2.0).max(0.0), (b.h - 2.0).max(0.0));
        canvas.fill_rect(inner, Color::WHITE);
        let lines = wrap(&self.value, self.font_size, inner.w - 8.0);
        paint_text_bars(canvas, &lines, Vec2::new(4.0, 4.0), self.font_size, Color::BLACK);
    }

    fn click(&mut self, _local: Vec2) -> bool {
        self.focused = true;
        self.common.dirty |= Dirty::PAINT;
        true
    }

    fn text_input(&self) -> Option<TextInputKind> {
        Some(self.kind)
    }

    fn collect_submissions(&self, out: &mut Vec<(String, String)>) {
        if let Some(key) = &self.submit_key {
            out.push((key.clone(), self.value.clone()));
        }
    }
}

/// An on/off switch.
pub struct Toggle {
    common: Common,
    on: bool,
    submit_key: String,
}

impl Toggle {
    pub fn new(submit_key: impl Into<String>) -> Self {
        Self {
            common: Common::new(),
            on: false,
            submit_key: submit_key.into(),
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn set_on(&mut self, on: bool) {
        self.on = on;
        self.common.dirty |= Dirty::PAINT;
    }
}

impl Element for Toggle {
    common_accessors!();

    fn measure(&mut self, _available: Size) -> Size {
        Size::new(51.0, 31.0)
    }

    fn paint(&self, canvas: &mut Canvas<'_>) {
        let b = bounds(self.common.frame);
        let track = if self.on {
            Color::from_rgb(76, 217, 100)
        } else {
            Color::from_rgb(200, 200, 200)
        };
        canvas.fill_rect(b, track);
        let knob = b.h - 4.0;
        let x = if self.on { b.w - knob - 2.0 } else { 2.0 };
        canvas.fill_rect(Rect::new(x, 2.0, knob, knob), Color::WHITE);
    }

    fn click(&mut self, _local: Vec2) -> bool {
        self.set_on(!self.on);
        true
    }

    fn collect_submissions(&self, out: &mut Vec<(String, String)>) {
        out.push((self.submit_key.clone(), self.on.to_string()));
    }
}

#[derive(Default)]
struct HeightInner {
    height: Cell<Option<f32>>,
    changed: Cell<bool>,
}

/// Write end for content whose height is only known after an external
/// renderer has run (for example an HTML fragment).
#[derive(Clone, Default)]
pub struct ContentHeight(Rc<HeightInner>);

impl ContentHeight {
    pub fn report(&self, height: f32) {
        if self.0.height.get() != Some(height) {
            self.0.height.set(Some(height));
            self.0.changed.set(true);
        }
    }

    pub fn get(&self) -> Option<f32> {
        self.0.height.get()
    }

    fn take_changed(&self) -> bool {
        self.0.changed.replace(false)
    }
}

/// Externally rendered rich content. Measures to the reported height plus
/// an 8 px pad, scaled by the DPI factor, and zero until a height arrives.
pub struct RichContent {
    common: Common,
    source: String,
    dpi_scale: f32,
    height: ContentHeight,
}

pub const RICH_CONTENT_PAD: f32 = 8.0;

impl RichContent {
    pub fn new(source: impl Into<String>, dpi_scale: f32) -> Self {
        Self {
            common: Common::new(),
            source: source.into(),
            dpi_scale,
            height: ContentHeight::default(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn height_handle(&self) -> ContentHeight {
        self.height.clone()
    }
}

impl Element for RichContent {
    common_accessors!(custom_dirty);

    fn measure(&mut self, available: Size) -> Size {
        let width = if available.width.is_finite() {
            available.width
        } else {
            0.0
        };
        let height = self
            .height
            .get()
            .map(|h| (h + RICH_CONTENT_PAD) * self.dpi_scale)
            .unwrap_or(0.0);
        Size::new(width, height)
    }

    fn paint(&self, canvas: &mut Canvas<'_>) {
        canvas.fill_rect(bounds(self.common.frame), Color::WHITE);
    }

    fn take_dirty(&mut self) -> Dirty {
        let mut d = std::mem::take(&mut self.common.dirty);
        if self.height.take_changed() {
            log::debug!("rich content {:?} reported {:?}", self.common.id, self.height.get());
            d |= Dirty::LAYOUT | Dirty::PAINT;
        }
        d
    }
}

pub struct ImageView {
    common: Common,
    slot: ImageSlot,
    stretch: Stretch,
    size: Option<Size>,
}

impl ImageView {
    pub fn new(slot: ImageSlot, stretch: Stretch) -> Self {
        Self {
            common: Common::new(),
            slot,
            stretch,
            size: None,
        }
    }

    /// Fix the measured size instead of using the bitmap's.
    pub fn sized(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn slot(&self) -> &ImageSlot {
        &self.slot
    }
}

impl Element for ImageView {
    common_accessors!(custom_dirty);

    fn measure(&mut self, _available: Size) -> Size {
        self.size.unwrap_or_else(|| {
            self.slot
                .image()
                .map(|img| Size::new(img.width() as f32, img.height() as f32))
                .unwrap_or(Size::ZERO)
        })
    }

    fn paint(&self, canvas: &mut Canvas<'_>) {
        if let Some(img) = self.slot.image() {
            canvas.draw_image(&img, bounds(self.common.frame), self.stretch);
        }
    }

    fn take_dirty(&mut self) -> Dirty {
        let mut d = std::mem::take(&mut self.common.dirty);
        if self.slot.take_fresh() {
            d |= Dirty::LAYOUT | Dirty::PAINT;
        }
        d
    }
}

/// A freehand drawing surface. Strokes are kept as point lists and can be
/// written out as PNG.
pub struct Sketch {
    common: Common,
    preferred: Size,
    strokes: Vec<Vec<Vec2>>,
    ink: Color,
    ink_width: f32,
    background: Background,
    events: Vec<ElementEvent>,
}

impl Sketch {
    pub fn new(preferred: Size) -> Self {
        Self {
            common: Common::new(),
            preferred,
            strokes: Vec::new(),
            ink: Color::BLACK,
            ink_width: 3.0,
            background: Background::Solid(Color::WHITE),
            events: Vec::new(),
        }
    }

    pub fn ink(mut self, color: Color, width: f32) -> Self {
        self.ink = color;
        self.ink_width = width;
        self
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    pub fn begin_stroke(&mut self, at: Vec2) {
        self.strokes.push(vec![at]);
        self.common.dirty |= Dirty::PAINT;
    }

    pub fn extend_stroke(&mut self, to: Vec2) {
        match self.strokes.last_mut() {
            Some(s) => s.push(to),
            None => self.strokes.push(vec![to]),
        }
        self.common.dirty |= Dirty::PAINT;
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.common.dirty |= Dirty::PAINT;
    }

    pub fn strokes(&self) -> &[Vec<Vec2>] {
        &self.strokes
    }

    fn draw(&self, canvas: &mut Canvas<'_>, with_background: bool) {
        let b = bounds(self.common.frame);
        if with_background {
            match &self.background {
                Background::None => {}
                Background::Solid(c) => canvas.fill_rect(b, *c),
                Background::Image { slot, stretch } => {
                    if let Some(img) = slot.image() {
                        canvas.draw_image(&img, b, *stretch);
                    }
                }
            }
        }
        for stroke in &self.strokes {
            match stroke.as_slice() {
                [] => {}
                [p] => canvas.stroke_segment(*p, *p, self.ink_width, self.ink),
                points => {
                    for pair in points.windows(2) {
                        canvas.stroke_segment(pair[0], pair[1], self.ink_width, self.ink);
                    }
                }
            }
        }
    }

    /// Render the strokes (optionally over the background) at the current
    /// size.
    pub fn render(&self, with_background: bool) -> RgbaImage {
        let (w, h) = self.common.frame.size().to_pixels();
        let mut img = RgbaImage::new(w.max(1), h.max(1));
        self.draw(&mut Canvas::new(&mut img), with_background);
        img
    }

    /// Write the drawing to `path` as PNG and queue a `DrawingSaved` event.
    pub fn save_png(&mut self, path: impl AsRef<Path>, with_background: bool) -> Result<PathBuf> {
        let path = path.as_ref().to_path_buf();
        self.render(with_background)
            .save_with_format(&path, ImageFormat::Png)?;
        log::info!("drawing saved to {}", path.display());
        self.events.push(ElementEvent::DrawingSaved(path.clone()));
        Ok(path)
    }
}

impl Element for Sketch {
    common_accessors!();

    fn measure(&mut self, _available: Size) -> Size {
        self.preferred
    }

    fn paint(&self, canvas: &mut Canvas<'_>) {
        self.draw(canvas, true);
    }

    /// A tap leaves a dot and keeps the row from being selected.
    fn click(&mut self, local: Vec2) -> bool {
        self.begin_stroke(local);
        true
    }

    fn drain_events(&mut self, out: &mut Vec<ElementEvent>) {
        out.append(&mut self.events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_wraps_to_available_width() {
        let mut l = Label::new("x".repeat(40)).font_size(10.0);
        let unbounded = l.measure(Size::INFINITE);
        assert!((unbounded.height - 13.0).abs() < 1e-3);
        assert!((unbounded.width - 220.0).abs() < 1e-3);
        let wrapped = l.measure(Size::new(100.0, f32::INFINITY));
        assert_eq!(wrapped.width, 100.0);
        assert!((wrapped.height - 39.0).abs() < 1e-3);
    }

    #[test]
    fn label_text_change_marks_layout() {
        let mut l = Label::new("a");
        l.take_dirty();
        l.set_text("a");
        assert!(l.take_dirty().is_empty());
        l.set_text("b");
        assert!(l.take_dirty().contains(Dirty::LAYOUT));
    }

    #[test]
    fn rich_content_height_includes_pad_and_scale() {
        let mut rc = RichContent::new("<p>hi</p>", 2.0);
        assert_eq!(rc.measure(Size::new(100.0, f32::INFINITY)).height, 0.0);
        rc.take_dirty();

        rc.height_handle().report(42.0);
        assert_eq!(rc.take_dirty(), Dirty::LAYOUT | Dirty::PAINT);
        assert_eq!(rc.measure(Size::new(100.0, f32::INFINITY)).height, 100.0);

        rc.height_handle().report(42.0);
        assert!(rc.take_dirty().is_empty());
    }

    #[test]
    fn image_view_reports_arrival_once() {
        let slot = ImageSlot::new();
        let mut view = ImageView::new(slot.clone(), Stretch::Fill);
        assert_eq!(view.take_dirty(), Dirty::LAYOUT | Dirty::PAINT);
        assert!(view.take_dirty().is_empty());
        assert_eq!(view.measure(Size::INFINITE), Size::ZERO);

        let generation = slot.begin_request("a.png");
        assert!(slot.deliver(generation, RgbaImage::new(6, 4)));
        assert_eq!(view.take_dirty(), Dirty::LAYOUT | Dirty::PAINT);
        assert!(view.take_dirty().is_empty());
        assert_eq!(view.measure(Size::INFINITE), Size::new(6.0, 4.0));

        view.set_frame(Rect::new(3.0, 5.0, 6.0, 4.0));
        assert_eq!(view.frame(), Rect::new(3.0, 5.0, 6.0, 4.0));
        assert_ne!(view.id(), ImageView::new(slot, Stretch::Fill).id());
    }

    #[test]
    fn text_field_submits_under_its_key() {
        let mut f = TextField::single_line().submit_key("name");
        f.set_value("Ada");
        let mut out = Vec::new();
        f.collect_submissions(&mut out);
        assert_eq!(out, vec![("name".to_string(), "Ada".to_string())]);
        assert_eq!(f.text_input(), Some(TextInputKind::SingleLine));
    }

    #[test]
    fn sketch_saves_png_and_reports_path() {
        let dir = std::env::temp_dir().join(format!("glide-sketch-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("drawing.png");

        let mut s = Sketch::new(Size::new(20.0, 10.0));
        s.set_frame(Rect::new(0.0, 0.0, 20.0, 10.0));
        s.begin_stroke(Vec2::new(2.0, 2.0));
        s.extend_stroke(Vec2::new(18.0, 8.0));
        s.save_png(&path, true).unwrap();

        let mut events = Vec::new();
        s.drain_events(&mut events);
        assert_eq!(events, vec![ElementEvent::DrawingSaved(path.clone())]);
        let back = image::open(&path).unwrap().to_rgba8();
        assert_eq!(back.dimensions(), (20, 10));
        assert_eq!(back.get_pixel(0, 9).0, [255; 4]);
        assert_eq!(back.get_pixel(2, 2).0, [0, 0, 0, 255]);
        std::fs::remove_dir_all(&dir).ok();
    }
}
