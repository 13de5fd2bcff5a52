use glide_core::{Color, Dirty, Rect, Size, TextInputKind, Vec2};

use crate::background::Background;
use crate::cache::SurfaceCache;
use crate::element::{Element, ElementEvent};
use crate::elements::Label;
use crate::grid::{Backdrop, GridContainer, PaintOutcome, Track};
use crate::surface::Canvas;

/// Stable identity of an item row, used to hand rows back for recycling.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ItemId(pub String);

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_owned())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    Header,
    Item,
    Footer,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionStyle {
    #[default]
    Highlight,
    /// Selection is tracked but not drawn.
    None,
}

/// One list row: a grid plus the row-level state the list needs.
pub struct GridCell {
    grid: GridContainer,
    kind: CellKind,
    background: Background,
    selection_style: SelectionStyle,
    selection_color: Option<Color>,
    highlighted: bool,
    min_height: f32,
    max_height: f32,
    link: Option<String>,
    item_id: Option<ItemId>,
}

impl GridCell {
    pub fn new(kind: CellKind) -> Self {
        Self {
            grid: GridContainer::new(),
            kind,
            background: Background::None,
            selection_style: SelectionStyle::Highlight,
            selection_color: None,
            highlighted: false,
            min_height: 0.0,
            max_height: f32::INFINITY,
            link: None,
            item_id: None,
        }
    }

    pub fn item() -> Self {
        Self::new(CellKind::Item)
    }

    /// A header or footer row showing `text`.
    pub fn banner(kind: CellKind, text: &str) -> Self {
        let mut cell = Self::new(kind).with_background(Background::Solid(Color::from_rgb(
            230, 230, 235,
        )));
        cell.grid.set_rows(vec![Track::Auto]);
        cell.grid.add_child(Label::new(text).font_size(14.0));
        cell.min_height = 24.0;
        cell
    }

    pub fn with_grid(mut self, grid: GridContainer) -> Self {
        self.grid = grid;
        self.grid.set_background(self.background.clone());
        self
    }

    pub fn with_child(mut self, child: impl Element) -> Self {
        self.grid.add_child(child);
        self
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.set_background(background);
        self
    }

    pub fn with_height(mut self, min: f32, max: f32) -> Self {
        self.min_height = min;
        self.max_height = max.max(min);
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_selection(mut self, style: SelectionStyle, color: Option<Color>) -> Self {
        self.selection_style = style;
        self.selection_color = color;
        self
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn grid(&self) -> &GridContainer {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut GridContainer {
        &mut self.grid
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn item_id(&self) -> Option<&ItemId> {
        self.item_id.as_ref()
    }

    pub(crate) fn set_item_id(&mut self, id: Option<ItemId>) {
        self.item_id = id;
    }

    pub fn is_selectable(&self) -> bool {
        self.kind == CellKind::Item
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn frame(&self) -> Rect {
        self.grid.frame()
    }

    pub fn top(&self) -> f32 {
        self.grid.frame().y
    }

    pub fn bottom(&self) -> f32 {
        self.grid.frame().bottom()
    }

    /// Row background when not highlighted. `Background::None` lets the
    /// list background show through.
    pub fn set_background(&mut self, background: Background) {
        self.background = background;
        if !self.highlighted || self.selection_style == SelectionStyle::None {
            self.grid.set_background(self.background.clone());
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.grid.background().is_none()
    }

    /// Measure at `width` and size the row, keeping its top edge. Returns
    /// the new height.
    pub fn layout(&mut self, width: f32) -> f32 {
        let min = Size::new(width, self.min_height);
        let desired = self.grid.measure(min, Size::new(width, f32::INFINITY));
        let height = desired.height.min(self.max_height);
        let frame = Rect::new(0.0, self.top(), width, height);
        if !self.grid.place(frame) {
            self.grid.perform_layout();
        }
        height
    }

    pub fn set_top(&mut self, top: f32) {
        let f = self.grid.frame();
        self.grid.place(Rect::new(f.x, top, f.w, f.h));
    }

    /// Highlight (or restore) the row. Children that support it switch to
    /// their highlighted look.
    pub fn set_highlighted(&mut self, highlighted: bool, default_color: Color) {
        if self.highlighted == highlighted {
            return;
        }
        self.highlighted = highlighted;
        if self.selection_style == SelectionStyle::None {
            return;
        }
        if highlighted {
            let color = self.selection_color.unwrap_or(default_color);
            self.grid.set_background(Background::Solid(color));
        } else {
            self.grid.set_background(self.background.clone());
        }
        Element::set_highlighted(&mut self.grid, highlighted);
    }

    pub fn take_dirty(&mut self) -> Dirty {
        self.grid.take_dirty()
    }

    pub fn click(&mut self, local: Vec2) -> bool {
        self.grid.click_at(local)
    }

    pub fn text_input(&self) -> Option<TextInputKind> {
        self.grid.text_input()
    }

    pub fn collect_submissions(&self, out: &mut Vec<(String, String)>) {
        self.grid.collect_submissions(out);
    }

    pub fn drain_events(&mut self, out: &mut Vec<ElementEvent>) {
        self.grid.drain_events(out);
    }

    pub fn paint(
        &mut self,
        cache: &mut SurfaceCache,
        target: &mut Canvas<'_>,
        at: Vec2,
        backdrop: Option<Backdrop<'_>>,
    ) -> PaintOutcome {
        self.grid.paint_cached(cache, target, at, backdrop)
    }
}

#[cfg(test)]
mod tests {
    use glide_core::{HorizontalAlignment, VerticalAlignment};
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::background::{ImageSlot, Stretch};
    use crate::element::PlacementExt;
    use crate::elements::Block;

    fn paint_at_origin(
        c: &mut GridCell,
        cache: &mut SurfaceCache,
        target: &mut RgbaImage,
    ) -> PaintOutcome {
        let mut canvas = Canvas::new(target);
        c.paint(cache, &mut canvas, Vec2::ZERO, None)
    }

    #[test]
    fn layout_respects_height_bounds() {
        let mut c = GridCell::item()
            .with_child(Block::new(Size::new(10.0, 5.0), Color::BLACK))
            .with_height(30.0, 100.0);
        assert_eq!(c.layout(200.0), 30.0);
        assert_eq!(c.frame(), Rect::new(0.0, 0.0, 200.0, 30.0));

        let mut tall = GridCell::item()
            .with_grid(GridContainer::new().with_rows([Track::Auto]))
            .with_child(Block::new(Size::new(10.0, 500.0), Color::BLACK))
            .with_height(0.0, 100.0);
        assert_eq!(tall.layout(200.0), 100.0);
    }

    #[test]
    fn highlight_swaps_and_restores_background() {
        let mut c = GridCell::item()
            .with_background(Background::Solid(Color::WHITE))
            .with_child(Label::new("row"));
        c.layout(100.0);
        c.set_highlighted(true, Color::HIGHLIGHT);
        assert!(matches!(c.grid().background(), Background::Solid(col) if *col == Color::HIGHLIGHT));
        assert!(c.grid().find::<Label>().is_some_and(|l| l.is_highlighted()));

        c.set_highlighted(false, Color::HIGHLIGHT);
        assert!(matches!(c.grid().background(), Background::Solid(col) if *col == Color::WHITE));
    }

    #[test]
    fn unhighlight_repaints_loaded_image_background() {
        let green = Rgba([10, 200, 10, 255]);
        let slot = ImageSlot::with_image(RgbaImage::from_pixel(50, 20, green));
        let mut c = GridCell::item()
            .with_background(Background::Image { slot, stretch: Stretch::Fill })
            .with_child(
                Block::new(Size::new(10.0, 10.0), Color::BLACK)
                    .align(HorizontalAlignment::Left, VerticalAlignment::Top),
            )
            .with_height(20.0, 20.0);
        c.layout(50.0);
        let mut cache = SurfaceCache::default();
        let mut target = RgbaImage::new(50, 20);
        paint_at_origin(&mut c, &mut cache, &mut target);
        assert_eq!(target.get_pixel(30, 10), &green);

        c.set_highlighted(true, Color::HIGHLIGHT);
        paint_at_origin(&mut c, &mut cache, &mut target);
        assert_eq!(target.get_pixel(30, 10), &Rgba(Color::HIGHLIGHT.to_array()));

        c.set_highlighted(false, Color::HIGHLIGHT);
        assert_eq!(
            paint_at_origin(&mut c, &mut cache, &mut target),
            PaintOutcome::Painted { reused: false }
        );
        assert_eq!(target.get_pixel(30, 10), &green);
    }

    #[test]
    fn selection_style_none_keeps_background() {
        let mut c = GridCell::item()
            .with_selection(SelectionStyle::None, None)
            .with_background(Background::Solid(Color::WHITE));
        c.set_highlighted(true, Color::HIGHLIGHT);
        assert!(c.is_highlighted());
        assert!(matches!(c.grid().background(), Background::Solid(col) if *col == Color::WHITE));
    }

    #[test]
    fn banners_are_not_selectable() {
        let c = GridCell::banner(CellKind::Header, "A");
        assert!(!c.is_selectable());
        assert_eq!(c.grid().find::<Label>().map(|l| l.text()), Some("A"));
    }

    #[test]
    fn moving_a_row_keeps_its_surface() {
        let mut c = GridCell::item().with_child(Block::new(Size::new(10.0, 20.0), Color::BLACK));
        c.layout(50.0);
        let mut cache = SurfaceCache::default();
        let mut target = image::RgbaImage::new(50, 100);
        let mut canvas = Canvas::new(&mut target);
        c.paint(&mut cache, &mut canvas, Vec2::ZERO, None);
        c.set_top(40.0);
        assert_eq!(c.top(), 40.0);
        assert_eq!(
            c.paint(&mut cache, &mut canvas, Vec2::new(0.0, 40.0), None),
            PaintOutcome::Painted { reused: true }
        );
    }
}
