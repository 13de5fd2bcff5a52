//! # Grid layout and paint engine
//!
//! A `GridContainer` places its children on rows and columns. Each track is
//! fixed, sized to its content (`Auto`) or takes a weighted share of what is
//! left (`Star`). Columns are resolved first, then rows (so auto rows can
//! measure children at their final width):
//!
//! 1. fixed tracks keep their declared size;
//! 2. auto tracks take the largest margin-inclusive measurement among the
//!    single-span children placed in them;
//! 3. star tracks split `available - fixed - auto` by weight. When the
//!    available space is unbounded they behave like auto tracks.
//!
//! An empty track list acts as one `Star(1.0)` track, and child indices are
//! clamped into range. Children are then aligned inside their cell.
//!
//! Rendering goes through the [`SurfaceCache`]: a container re-renders into a
//! freshly allocated surface only when its pixels were invalidated (resize,
//! background change, child add/remove or a dirty child) and otherwise blits
//! the cached one.

use glide_core::{
    Dirty, ElementId, HorizontalAlignment, Observers, Placement, Rect, Size, TextInputKind,
    Thickness, Vec2, VerticalAlignment,
};
use image::RgbaImage;
use smallvec::{SmallVec, smallvec};

use crate::background::Background;
use crate::cache::SurfaceCache;
use crate::element::{Element, ElementEvent};
use crate::impl_any;
use crate::surface::Canvas;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Track {
    Fixed(f32),
    Auto,
    Star(f32),
}

impl Track {
    pub fn star() -> Self {
        Track::Star(1.0)
    }
}

/// Observable properties of a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridProperty {
    Background,
    Children,
    Tracks,
    Size,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaintOutcome {
    Painted { reused: bool },
    /// No surface could be allocated this frame.
    Skipped,
    /// Zero-area container, nothing to draw.
    Empty,
}

/// A shared pre-rendered background the container shows through its
/// transparent pixels. `origin` is where the container's top-left corner
/// falls in `image`.
#[derive(Clone, Copy)]
pub struct Backdrop<'a> {
    pub image: &'a RgbaImage,
    pub origin: Vec2,
}

type Sizes = SmallVec<[f32; 8]>;

pub struct GridContainer {
    id: ElementId,
    placement: Placement,
    frame: Rect,
    columns: Vec<Track>,
    rows: Vec<Track>,
    children: Vec<Box<dyn Element>>,
    background: Background,
    padding: Thickness,

    column_sizes: Sizes,
    row_sizes: Sizes,
    desired: Size,

    surface_valid: bool,
    dirty: Dirty,
    in_layout: bool,
    observers: Observers<GridProperty>,
}

impl Default for GridContainer {
    fn default() -> Self {
        Self::new()
    }
}

fn effective(tracks: &[Track]) -> SmallVec<[Track; 8]> {
    if tracks.is_empty() {
        smallvec![Track::star()]
    } else {
        tracks.iter().copied().collect()
    }
}

/// Clamped `[start, end)` track range for a child.
fn span(start: usize, len: usize, count: usize) -> (usize, usize) {
    let s = start.min(count.saturating_sub(1));
    (s, (s + len.max(1)).min(count))
}

fn less(avail: f32, by: f32) -> f32 {
    if avail.is_finite() {
        (avail - by).max(0.0)
    } else {
        avail
    }
}

fn resolve_tracks(
    tracks: &[Track],
    available: f32,
    mut measure_auto: impl FnMut(usize, f32) -> f32,
) -> Sizes {
    let bounded = available.is_finite();
    let mut sizes: Sizes = smallvec![0.0; tracks.len()];

    let mut fixed = 0.0;
    for (i, t) in tracks.iter().enumerate() {
        if let Track::Fixed(v) = t {
            sizes[i] = v.max(0.0);
            fixed += sizes[i];
        }
    }
    let remaining = less(available, fixed);
    for (i, t) in tracks.iter().enumerate() {
        let auto_like = matches!(t, Track::Auto) || (!bounded && matches!(t, Track::Star(_)));
        if auto_like {
            sizes[i] = measure_auto(i, remaining);
        }
    }

    if bounded {
        let taken: f32 = tracks
            .iter()
            .zip(sizes.iter())
            .filter(|(t, _)| !matches!(t, Track::Star(_)))
            .map(|(_, s)| *s)
            .sum();
        let free = (available - taken).max(0.0);
        let weight: f32 = tracks
            .iter()
            .map(|t| match t {
                Track::Star(w) => w.max(0.0),
                _ => 0.0,
            })
            .sum();
        if weight > 0.0 {
            for (i, t) in tracks.iter().enumerate() {
                if let Track::Star(w) = t {
                    sizes[i] = free * w.max(0.0) / weight;
                }
            }
        }
    }
    sizes
}

fn align(cell: Rect, desired: Size, p: &Placement) -> Rect {
    let m = p.margin;
    let inner = Rect::new(
        cell.x + m.left,
        cell.y + m.top,
        (cell.w - m.horizontal()).max(0.0),
        (cell.h - m.vertical()).max(0.0),
    );
    let w = match p.h_align {
        HorizontalAlignment::Stretch => inner.w,
        _ => desired.width.min(inner.w),
    };
    let h = match p.v_align {
        VerticalAlignment::Stretch => inner.h,
        _ => desired.height.min(inner.h),
    };
    let x = match p.h_align {
        HorizontalAlignment::Left | HorizontalAlignment::Stretch => inner.x,
        HorizontalAlignment::Center => inner.x + (inner.w - w) / 2.0,
        HorizontalAlignment::Right => inner.right() - w,
    };
    let y = match p.v_align {
        VerticalAlignment::Top | VerticalAlignment::Stretch => inner.y,
        VerticalAlignment::Center => inner.y + (inner.h - h) / 2.0,
        VerticalAlignment::Bottom => inner.bottom() - h,
    };
    Rect::new(x, y, w, h)
}

fn sum(sizes: &[f32], from: usize, to: usize) -> f32 {
    sizes[from..to].iter().sum()
}

impl GridContainer {
    pub fn new() -> Self {
        Self {
            id: ElementId::next(),
            placement: Placement::default(),
            frame: Rect::default(),
            columns: Vec::new(),
            rows: Vec::new(),
            children: Vec::new(),
            background: Background::None,
            padding: Thickness::ZERO,
            column_sizes: SmallVec::new(),
            row_sizes: SmallVec::new(),
            desired: Size::ZERO,
            surface_valid: false,
            dirty: Dirty::LAYOUT | Dirty::PAINT,
            in_layout: false,
            observers: Observers::new(),
        }
    }

    pub fn with_columns(mut self, columns: impl IntoIterator<Item = Track>) -> Self {
        self.set_columns(columns.into_iter().collect());
        self
    }

    pub fn with_rows(mut self, rows: impl IntoIterator<Item = Track>) -> Self {
        self.set_rows(rows.into_iter().collect());
        self
    }

    pub fn with_child(mut self, child: impl Element) -> Self {
        self.add_child(child);
        self
    }

    pub fn with_padding(mut self, padding: Thickness) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.set_background(background);
        self
    }

    pub fn observers(&self) -> &Observers<GridProperty> {
        &self.observers
    }

    pub fn set_columns(&mut self, columns: Vec<Track>) {
        self.columns = columns;
        self.mark(Dirty::LAYOUT | Dirty::PAINT, GridProperty::Tracks);
    }

    pub fn set_rows(&mut self, rows: Vec<Track>) {
        self.rows = rows;
        self.mark(Dirty::LAYOUT | Dirty::PAINT, GridProperty::Tracks);
    }

    pub fn columns(&self) -> &[Track] {
        &self.columns
    }

    pub fn rows(&self) -> &[Track] {
        &self.rows
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Solid, empty and already loaded image backgrounds repaint
    /// immediately; an image still loading repaints once its bitmap arrives.
    pub fn set_background(&mut self, background: Background) {
        let immediate = match &background {
            Background::Image { slot, .. } => slot.is_loaded(),
            _ => true,
        };
        self.background = background;
        if immediate {
            self.invalidate_surface();
        }
        self.observers.notify(&GridProperty::Background);
    }

    /// Append a child; returns its index.
    pub fn add_child(&mut self, child: impl Element) -> usize {
        self.add_boxed(Box::new(child))
    }

    pub fn add_boxed(&mut self, child: Box<dyn Element>) -> usize {
        self.children.push(child);
        self.mark(Dirty::LAYOUT | Dirty::PAINT, GridProperty::Children);
        self.children.len() - 1
    }

    pub fn remove_child(&mut self, id: ElementId) -> Option<Box<dyn Element>> {
        let index = self.children.iter().position(|c| c.id() == id)?;
        let child = self.children.remove(index);
        self.mark(Dirty::LAYOUT | Dirty::PAINT, GridProperty::Children);
        Some(child)
    }

    pub fn children(&self) -> &[Box<dyn Element>] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child<T: Element>(&self, index: usize) -> Option<&T> {
        self.children.get(index)?.as_any().downcast_ref()
    }

    pub fn child_mut<T: Element>(&mut self, index: usize) -> Option<&mut T> {
        self.children.get_mut(index)?.as_any_mut().downcast_mut()
    }

    /// First child of type `T`, searching nested grids depth-first.
    pub fn find<T: Element>(&self) -> Option<&T> {
        self.children.iter().find_map(|c| {
            c.as_any().downcast_ref::<T>().or_else(|| {
                c.as_any()
                    .downcast_ref::<GridContainer>()
                    .and_then(|g| g.find::<T>())
            })
        })
    }

    pub fn find_mut<T: Element>(&mut self) -> Option<&mut T> {
        for c in self.children.iter_mut() {
            if c.as_any().is::<T>() {
                return c.as_any_mut().downcast_mut::<T>();
            }
            if let Some(g) = c.as_any_mut().downcast_mut::<GridContainer>() {
                if let Some(found) = g.find_mut::<T>() {
                    return Some(found);
                }
            }
        }
        None
    }

    pub fn column_sizes(&self) -> &[f32] {
        &self.column_sizes
    }

    pub fn row_sizes(&self) -> &[f32] {
        &self.row_sizes
    }

    pub fn desired_size(&self) -> Size {
        self.desired
    }

    pub fn is_surface_valid(&self) -> bool {
        self.surface_valid
    }

    pub fn invalidate_surface(&mut self) {
        self.surface_valid = false;
        self.dirty |= Dirty::PAINT;
    }

    /// Drop the cached surface if it no longer matches the contents.
    /// Returns true when one was released.
    pub fn release_stale(&mut self, cache: &mut SurfaceCache) -> bool {
        !self.surface_valid && cache.invalidate(self.id)
    }

    fn mark(&mut self, dirty: Dirty, property: GridProperty) {
        self.dirty |= dirty;
        if dirty.contains(Dirty::PAINT) {
            self.surface_valid = false;
        }
        self.observers.notify(&property);
    }

    fn resolve(&mut self, width: f32, height: f32) -> (Sizes, Sizes) {
        let columns = effective(&self.columns);
        let rows = effective(&self.rows);
        let (nc, nr) = (columns.len(), rows.len());
        let children = &mut self.children;

        let column_sizes = resolve_tracks(&columns, width, |track, remaining| {
            let mut best = 0.0f32;
            for c in children.iter_mut() {
                let p = *c.placement();
                if !p.takes_space() {
                    continue;
                }
                let (c0, c1) = span(p.column, p.column_span, nc);
                if c0 != track || c1 - c0 != 1 {
                    continue;
                }
                let avail = Size::new(
                    less(remaining, p.margin.horizontal()),
                    less(height, p.margin.vertical()),
                );
                best = best.max(c.measure(avail).width + p.margin.horizontal());
            }
            best
        });

        let row_sizes = resolve_tracks(&rows, height, |track, remaining| {
            let mut best = 0.0f32;
            for c in children.iter_mut() {
                let p = *c.placement();
                if !p.takes_space() {
                    continue;
                }
                let (r0, r1) = span(p.row, p.row_span, nr);
                if r0 != track || r1 - r0 != 1 {
                    continue;
                }
                let (c0, c1) = span(p.column, p.column_span, nc);
                let avail = Size::new(
                    (sum(&column_sizes, c0, c1) - p.margin.horizontal()).max(0.0),
                    less(remaining, p.margin.vertical()),
                );
                best = best.max(c.measure(avail).height + p.margin.vertical());
            }
            best
        });

        (column_sizes, row_sizes)
    }

    /// Choose a size within `[min, max]` and remember the resolved tracks.
    pub fn measure(&mut self, min: Size, max: Size) -> Size {
        let width = less(max.width, self.padding.horizontal());
        let height = less(max.height, self.padding.vertical());
        let (cols, rows) = self.resolve(width, height);
        let content = Size::new(
            cols.iter().sum::<f32>() + self.padding.horizontal(),
            rows.iter().sum::<f32>() + self.padding.vertical(),
        );
        self.column_sizes = cols;
        self.row_sizes = rows;
        self.desired = content.constrain(min, max);
        self.desired
    }

    /// Resolve tracks for exactly `size` and position every child.
    pub fn arrange(&mut self, size: Size) {
        let width = less(size.width, self.padding.horizontal());
        let height = less(size.height, self.padding.vertical());
        let (cols, rows) = self.resolve(width, height);
        let (nc, nr) = (cols.len(), rows.len());
        let (left, top) = (self.padding.left, self.padding.top);

        let mut resized_child = false;
        for c in self.children.iter_mut() {
            let p = *c.placement();
            let (c0, c1) = span(p.column, p.column_span, nc);
            let (r0, r1) = span(p.row, p.row_span, nr);
            let cell = Rect::new(
                left + sum(&cols, 0, c0),
                top + sum(&rows, 0, r0),
                sum(&cols, c0, c1),
                sum(&rows, r0, r1),
            );
            let frame = if p.takes_space() {
                let inner = Size::new(
                    (cell.w - p.margin.horizontal()).max(0.0),
                    (cell.h - p.margin.vertical()).max(0.0),
                );
                align(cell, c.measure(inner), &p)
            } else {
                Rect::new(cell.x, cell.y, 0.0, 0.0)
            };
            if frame.size() != c.frame().size() {
                resized_child = true;
            }
            if frame != c.frame() {
                c.set_frame(frame);
            }
        }
        if resized_child {
            self.invalidate_surface();
        }
        self.column_sizes = cols;
        self.row_sizes = rows;
    }

    /// Re-arrange children at the current size. A pass requested while one
    /// is running is dropped.
    pub fn perform_layout(&mut self) -> bool {
        if self.in_layout {
            log::debug!("grid {:?}: layout pass dropped, one is in progress", self.id);
            return false;
        }
        self.in_layout = true;
        self.arrange(self.frame.size());
        self.dirty.remove(Dirty::LAYOUT);
        self.in_layout = false;
        true
    }

    /// Move and resize. Returns true when the size changed, in which case
    /// the surface is invalidated and the children re-arranged.
    pub fn place(&mut self, frame: Rect) -> bool {
        if frame == self.frame {
            log::trace!("grid {:?}: unnecessary resize", self.id);
            return false;
        }
        let resized = frame.size() != self.frame.size();
        self.frame = frame;
        if resized {
            log::debug!(
                "grid {:?}: resized to {}x{}",
                self.id,
                frame.w,
                frame.h
            );
            self.invalidate_surface();
            self.perform_layout();
            self.observers.notify(&GridProperty::Size);
        }
        resized
    }

    /// Draw background and children straight into `canvas`.
    pub fn render_contents(&self, canvas: &mut Canvas<'_>) {
        let bounds = Rect::from_origin_size(Vec2::ZERO, self.frame.size());
        match &self.background {
            Background::None => {}
            Background::Solid(color) => canvas.fill_rect(bounds, *color),
            Background::Image { slot, stretch } => {
                if let Some(img) = slot.image() {
                    canvas.draw_image(&img, bounds, *stretch);
                }
            }
        }
        for child in &self.children {
            if !child.placement().paints() {
                continue;
            }
            let mut sub = canvas.sub(child.frame());
            if !sub.is_clipped_out() {
                child.paint(&mut sub);
            }
        }
    }

    /// Paint through the surface cache onto `target` at `at`.
    ///
    /// With a `backdrop`, the matching slice of the shared background is
    /// copied to `target` first and the surface is alpha-composited over it.
    pub fn paint_cached(
        &mut self,
        cache: &mut SurfaceCache,
        target: &mut Canvas<'_>,
        at: Vec2,
        backdrop: Option<Backdrop<'_>>,
    ) -> PaintOutcome {
        let (w, h) = self.frame.size().to_pixels();
        if w == 0 || h == 0 {
            cache.invalidate(self.id);
            return PaintOutcome::Empty;
        }
        if self.background.take_fresh() {
            self.invalidate_surface();
        }

        let reused = self.surface_valid
            && cache
                .get(self.id)
                .is_some_and(|s| s.width() == w && s.height() == h);
        if !reused {
            match cache.allocate(self.id, w, h) {
                Ok(surface) => {
                    let mut canvas = surface.canvas();
                    self.render_contents(&mut canvas);
                }
                Err(e) => {
                    log::warn!("grid {:?}: {e}; skipping this frame", self.id);
                    self.surface_valid = false;
                    return PaintOutcome::Skipped;
                }
            }
            self.surface_valid = true;
            self.dirty.remove(Dirty::PAINT);
        }

        let Some(surface) = cache.get(self.id) else {
            return PaintOutcome::Skipped;
        };
        if let Some(b) = backdrop {
            let dest = Rect::from_origin_size(at, self.frame.size());
            target.copy_region(b.image, b.origin, dest);
        }
        target.blit(surface.image(), at);
        PaintOutcome::Painted { reused }
    }

    /// Offer a tap to the topmost child under `local`.
    pub fn click_at(&mut self, local: Vec2) -> bool {
        for child in self.children.iter_mut().rev() {
            let f = child.frame();
            if child.placement().paints() && f.contains(local) && child.click(local - f.origin())
            {
                return true;
            }
        }
        false
    }
}

impl Element for GridContainer {
    fn id(&self) -> ElementId {
        self.id
    }
    fn placement(&self) -> &Placement {
        &self.placement
    }
    fn placement_mut(&mut self) -> &mut Placement {
        &mut self.placement
    }
    fn frame(&self) -> Rect {
        self.frame
    }
    fn set_frame(&mut self, frame: Rect) {
        self.place(frame);
    }
    fn measure(&mut self, available: Size) -> Size {
        GridContainer::measure(self, Size::ZERO, available)
    }
    fn paint(&self, canvas: &mut Canvas<'_>) {
        self.render_contents(canvas);
    }
    fn take_dirty(&mut self) -> Dirty {
        let mut d = std::mem::take(&mut self.dirty);
        if self.background.take_fresh() {
            d |= Dirty::PAINT;
        }
        for c in self.children.iter_mut() {
            d |= c.take_dirty();
        }
        if d.contains(Dirty::PAINT) {
            self.surface_valid = false;
        }
        d
    }
    fn click(&mut self, local: Vec2) -> bool {
        self.click_at(local)
    }
    fn text_input(&self) -> Option<TextInputKind> {
        self.children.iter().find_map(|c| c.text_input())
    }
    fn set_highlighted(&mut self, highlighted: bool) {
        for c in self.children.iter_mut() {
            c.set_highlighted(highlighted);
        }
    }
    fn collect_submissions(&self, out: &mut Vec<(String, String)>) {
        for c in &self.children {
            c.collect_submissions(out);
        }
    }
    fn drain_events(&mut self, out: &mut Vec<ElementEvent>) {
        for c in self.children.iter_mut() {
            c.drain_events(out);
        }
    }
    impl_any!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Block;
    use crate::background::{ImageSlot, Stretch};
    use crate::element::PlacementExt;
    use glide_core::Color;
    use image::Rgba;
    use proptest::prelude::*;

    fn block(w: f32, h: f32) -> Block {
        Block::new(Size::new(w, h), Color::BLACK)
    }

    #[test]
    fn star_takes_what_fixed_leaves() {
        let mut g = GridContainer::new().with_columns([Track::star(), Track::Fixed(80.0)]);
        g.measure(Size::ZERO, Size::new(300.0, 100.0));
        assert_eq!(g.column_sizes(), &[220.0, 80.0]);
    }

    #[test]
    fn stars_split_by_weight() {
        let mut g = GridContainer::new().with_columns([Track::Star(1.0), Track::Star(2.0)]);
        g.measure(Size::ZERO, Size::new(300.0, 100.0));
        assert_eq!(g.column_sizes(), &[100.0, 200.0]);
    }

    #[test]
    fn auto_tracks_take_largest_child() {
        let mut g = GridContainer::new()
            .with_columns([Track::Auto, Track::star()])
            .with_rows([Track::Auto, Track::Auto])
            .with_child(block(40.0, 10.0).at(0, 0))
            .with_child(block(60.0, 20.0).at(1, 0))
            .with_child(block(5.0, 30.0).at(1, 1));
        let s = g.measure(Size::ZERO, Size::new(200.0, f32::INFINITY));
        assert_eq!(g.column_sizes(), &[60.0, 140.0]);
        assert_eq!(g.row_sizes(), &[10.0, 30.0]);
        assert_eq!(s, Size::new(200.0, 40.0));
    }

    #[test]
    fn star_rows_behave_like_auto_when_unbounded() {
        let mut g = GridContainer::new()
            .with_rows([Track::star(), Track::Fixed(5.0)])
            .with_child(block(10.0, 25.0));
        let s = g.measure(Size::ZERO, Size::new(100.0, f32::INFINITY));
        assert_eq!(g.row_sizes(), &[25.0, 5.0]);
        assert_eq!(s.height, 30.0);
    }

    #[test]
    fn spanning_children_do_not_size_auto_tracks() {
        let mut g = GridContainer::new()
            .with_columns([Track::Auto, Track::Auto])
            .with_child(block(100.0, 10.0).span(1, 2))
            .with_child(block(10.0, 10.0).at(0, 1));
        g.measure(Size::ZERO, Size::new(500.0, 100.0));
        assert_eq!(g.column_sizes(), &[0.0, 10.0]);
    }

    #[test]
    fn out_of_range_indices_are_clamped() {
        let mut g = GridContainer::new()
            .with_columns([Track::Fixed(50.0), Track::Fixed(50.0)])
            .with_child(block(10.0, 10.0).at(7, 9));
        g.place(Rect::new(0.0, 0.0, 100.0, 40.0));
        let f = g.children()[0].frame();
        assert_eq!(f, Rect::new(50.0, 0.0, 50.0, 40.0));
    }

    #[test]
    fn arrange_applies_alignment_and_margin() {
        let mut g = GridContainer::new().with_child(
            block(20.0, 10.0)
                .margin(Thickness::uniform(5.0))
                .align(HorizontalAlignment::Right, VerticalAlignment::Center),
        );
        g.place(Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(g.children()[0].frame(), Rect::new(75.0, 20.0, 20.0, 10.0));
    }

    proptest! {
        #[test]
        fn layout_is_idempotent(
            sizes in prop::collection::vec((0.0f32..200.0, 0.0f32..200.0), 3),
            width in 1.0f32..600.0,
            height in 1.0f32..400.0,
        ) {
            let mut g = GridContainer::new()
                .with_columns([Track::Auto, Track::Star(1.0), Track::Star(3.0)])
                .with_rows([Track::Auto, Track::star()])
                .with_child(block(sizes[0].0, sizes[0].1).at(0, 0))
                .with_child(block(sizes[1].0, sizes[1].1).at(1, 1).align(
                    HorizontalAlignment::Center,
                    VerticalAlignment::Bottom,
                ))
                .with_child(block(sizes[2].0, sizes[2].1).at(1, 2).span(1, 1));
            let mut run = || {
                let s = g.measure(Size::ZERO, Size::new(width, height));
                g.arrange(s);
                g.children().iter().map(|c| c.frame()).collect::<Vec<_>>()
            };
            let first = run();
            let second = run();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn measure_respects_min_and_max() {
        let mut g = GridContainer::new()
            .with_rows([Track::Auto])
            .with_child(block(10.0, 500.0));
        let s = g.measure(Size::new(0.0, 20.0), Size::new(100.0, 300.0));
        assert_eq!(s.height, 300.0);
        let mut empty = GridContainer::new().with_rows([Track::Auto]);
        assert_eq!(empty.measure(Size::new(0.0, 20.0), Size::new(100.0, 300.0)).height, 20.0);
    }

    #[test]
    fn reentrant_layout_is_dropped() {
        let mut g = GridContainer::new().with_child(block(10.0, 10.0));
        g.in_layout = true;
        assert!(!g.perform_layout());
        g.in_layout = false;
        assert!(g.perform_layout());
    }

    #[test]
    fn resize_invalidates_surface_but_move_does_not() {
        let mut cache = SurfaceCache::default();
        let mut target = RgbaImage::new(100, 100);
        let mut canvas = Canvas::new(&mut target);
        let mut g = GridContainer::new().with_child(block(10.0, 10.0));

        assert!(g.place(Rect::new(0.0, 0.0, 50.0, 20.0)));
        assert_eq!(
            g.paint_cached(&mut cache, &mut canvas, Vec2::ZERO, None),
            PaintOutcome::Painted { reused: false }
        );
        assert!(!g.place(Rect::new(0.0, 30.0, 50.0, 20.0)));
        assert_eq!(
            g.paint_cached(&mut cache, &mut canvas, Vec2::ZERO, None),
            PaintOutcome::Painted { reused: true }
        );
        assert!(g.place(Rect::new(0.0, 30.0, 60.0, 20.0)));
        assert!(!g.is_surface_valid());
        assert_eq!(
            g.paint_cached(&mut cache, &mut canvas, Vec2::ZERO, None),
            PaintOutcome::Painted { reused: false }
        );
    }

    #[test]
    fn stale_surface_is_released() {
        let mut cache = SurfaceCache::default();
        let mut target = RgbaImage::new(100, 100);
        let mut canvas = Canvas::new(&mut target);
        let mut g = GridContainer::new().with_child(block(10.0, 10.0));
        g.place(Rect::new(0.0, 0.0, 50.0, 20.0));
        g.paint_cached(&mut cache, &mut canvas, Vec2::ZERO, None);
        let id = Element::id(&g);
        assert!(cache.contains(id));
        assert!(!g.release_stale(&mut cache));

        g.set_background(Background::Solid(Color::WHITE));
        assert!(g.release_stale(&mut cache));
        assert!(!cache.contains(id));
        assert_eq!(cache.bytes(), 0);
        assert_eq!(
            g.paint_cached(&mut cache, &mut canvas, Vec2::ZERO, None),
            PaintOutcome::Painted { reused: false }
        );
    }

    #[test]
    fn loaded_image_background_repaints_at_once() {
        let mut cache = SurfaceCache::default();
        let mut target = RgbaImage::new(100, 100);
        let mut canvas = Canvas::new(&mut target);
        let mut g = GridContainer::new();
        g.place(Rect::new(0.0, 0.0, 50.0, 20.0));
        g.paint_cached(&mut cache, &mut canvas, Vec2::ZERO, None);

        let loading = ImageSlot::new();
        g.set_background(Background::Image { slot: loading, stretch: Stretch::Fill });
        assert!(g.is_surface_valid());

        let loaded = ImageSlot::with_image(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255])));
        g.set_background(Background::Image { slot: loaded, stretch: Stretch::Fill });
        assert!(!g.is_surface_valid());
    }

    #[test]
    fn allocation_failure_skips_frame_then_retries() {
        let mut cache = SurfaceCache::new(crate::cache::CacheConfig {
            max_surface_bytes: Some(100),
            ..Default::default()
        });
        let mut target = RgbaImage::new(20, 20);
        let mut canvas = Canvas::new(&mut target);
        let mut g = GridContainer::new().with_background(Background::Solid(Color::WHITE));
        g.place(Rect::new(0.0, 0.0, 10.0, 10.0));

        assert_eq!(
            g.paint_cached(&mut cache, &mut canvas, Vec2::ZERO, None),
            PaintOutcome::Skipped
        );
        g.place(Rect::new(0.0, 0.0, 5.0, 5.0));
        assert_eq!(
            g.paint_cached(&mut cache, &mut canvas, Vec2::ZERO, None),
            PaintOutcome::Painted { reused: false }
        );
        drop(canvas);
        assert_eq!(target.get_pixel(0, 0).0, [255; 4]);
    }

    #[test]
    fn transparent_container_shows_backdrop() {
        let mut cache = SurfaceCache::default();
        let backdrop = RgbaImage::from_fn(10, 10, |_, y| image::Rgba([y as u8, 0, 0, 255]));
        let mut target = RgbaImage::new(10, 4);
        let mut canvas = Canvas::new(&mut target);
        let mut g = GridContainer::new()
            .with_columns([Track::Fixed(2.0), Track::star()])
            .with_child(Block::new(Size::new(2.0, 4.0), Color::WHITE));
        g.place(Rect::new(0.0, 0.0, 10.0, 4.0));

        let b = Backdrop {
            image: &backdrop,
            origin: Vec2::new(0.0, 6.0),
        };
        g.paint_cached(&mut cache, &mut canvas, Vec2::ZERO, Some(b));
        drop(canvas);
        assert_eq!(target.get_pixel(0, 1).0, [255; 4]);
        assert_eq!(target.get_pixel(5, 1).0, [7, 0, 0, 255]);
    }

    #[test]
    fn image_background_waits_for_bitmap() {
        let (bg, slot) = Background::image(crate::background::Stretch::Fill);
        let mut g = GridContainer::new().with_background(Background::Solid(Color::WHITE));
        g.place(Rect::new(0.0, 0.0, 4.0, 4.0));
        g.take_dirty();
        let mut cache = SurfaceCache::default();
        let mut target = RgbaImage::new(4, 4);
        let mut canvas = Canvas::new(&mut target);
        g.paint_cached(&mut cache, &mut canvas, Vec2::ZERO, None);

        g.set_background(bg);
        assert!(g.is_surface_valid());
        let generation = slot.begin_request("mem");
        slot.deliver(generation, RgbaImage::from_pixel(1, 1, image::Rgba([1, 2, 3, 255])));
        assert_eq!(
            g.paint_cached(&mut cache, &mut canvas, Vec2::ZERO, None),
            PaintOutcome::Painted { reused: false }
        );
        drop(canvas);
        assert_eq!(target.get_pixel(3, 3).0, [1, 2, 3, 255]);
    }

    #[test]
    fn child_changes_are_observed() {
        use std::cell::RefCell;
        use std::rc::Rc;
        let mut g = GridContainer::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        g.observers().subscribe(move |p| s.borrow_mut().push(*p));

        let id = {
            let b = block(1.0, 1.0);
            let id = b.id();
            g.add_child(b);
            id
        };
        assert!(g.remove_child(id).is_some());
        assert_eq!(*seen.borrow(), vec![GridProperty::Children, GridProperty::Children]);
    }

    #[test]
    fn click_goes_to_topmost_child() {
        let mut g = GridContainer::new()
            .with_columns([Track::Fixed(50.0), Track::Fixed(50.0)])
            .with_child(block(50.0, 20.0))
            .with_child(crate::elements::Toggle::new("agree").at(0, 1));
        g.place(Rect::new(0.0, 0.0, 100.0, 20.0));
        assert!(!g.click_at(Vec2::new(10.0, 10.0)));
        assert!(g.click_at(Vec2::new(60.0, 10.0)));
        assert_eq!(g.find::<crate::elements::Toggle>().map(|t| t.is_on()), Some(true));
    }
}
