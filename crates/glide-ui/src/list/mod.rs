//! # Virtualized list
//!
//! `ListController` shows an ordered set of [`Section`]s as one vertical
//! stack of rows. Rows are built lazily: only the prefix of logical rows
//! needed to cover the viewport (plus a read-ahead window) is materialized,
//! through an embedder callback that may hand back a recycled row. Rows
//! are never un-materialized, only moved.
//!
//! Scrolling runs on [`ScrollPhysics`]; the host calls [`ListController::tick`]
//! once per animation interval and [`ListController::paint`] once per frame.
//! Row height changes (a rich-content row learning its height, a label
//! changing text) are picked up in the tick and re-flowed in one coalesced
//! layout pass.

pub mod cell;
pub mod config;
pub mod input;
pub mod scroll;
pub mod section;
pub mod selection;

use std::collections::HashMap;
use std::path::PathBuf;

use glide_core::{Dirty, ElementId, Observers, Size, Vec2};
use image::RgbaImage;
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::background::Background;
use crate::cache::SurfaceCache;
use crate::element::{Element, ElementEvent};
use crate::error::{Result, UiError};
use crate::grid::{Backdrop, PaintOutcome};
use crate::schedule::{LayoutRequest, LayoutScheduler};
use crate::surface::Canvas;

pub use cell::{CellKind, GridCell, ItemId, SelectionStyle};
pub use config::{ListConfig, Virtualization};
pub use input::TapTarget;
pub use scroll::{Release, ScrollPhysics, ScrollState, ScrollStep};
pub use section::{RowSlot, Section, SectionCellRequested, Sections};

/// List-level cell factory: `(section, item, recycled cell) -> cell`.
pub type CellRequested = Box<dyn Fn(usize, usize, Option<GridCell>) -> Option<GridCell>>;

/// Stable id for an item, used to match recycled rows.
pub type ItemIdRequested = Box<dyn Fn(usize, usize) -> ItemId>;

#[derive(Clone, Debug, PartialEq)]
pub enum ListEvent {
    /// The list started moving. Fires once per gesture.
    Scrolling,
    SelectionChanged { row: Option<usize> },
    RowActivated { row: usize, link: Option<String> },
    DrawingSaved(PathBuf),
    /// Sections are being (re)loaded.
    Rendering,
    Activated,
    Deactivated,
}

pub struct MaterializedRow {
    pub position: usize,
    pub slot: RowSlot,
    pub cell: GridCell,
}

/// A materialized row intersecting the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibleRow {
    /// Index into the materialized rows.
    pub row: usize,
    /// Logical position across all sections.
    pub position: usize,
    pub slot: RowSlot,
    /// Content coordinates (add the scroll offset for viewport coordinates).
    pub top: f32,
    pub bottom: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub painted: usize,
    pub reused: usize,
    pub skipped: usize,
}

pub struct ListController {
    config: ListConfig,
    sections: Sections,
    rows: Vec<MaterializedRow>,
    /// Next logical position to materialize.
    cursor: usize,
    recycle: HashMap<ItemId, GridCell>,
    cell_requested: Option<CellRequested>,
    item_id_requested: Option<ItemIdRequested>,

    viewport: Size,
    /// Device-space position of the viewport's top-left corner.
    origin: Vec2,
    physics: ScrollPhysics,
    scrolling: bool,
    selected: Option<usize>,
    scheduler: LayoutScheduler,

    background: Background,
    backdrop: Option<RgbaImage>,
    released: Vec<ElementId>,

    submissions: IndexMap<String, String>,
    events: Observers<ListEvent>,
}

impl ListController {
    pub fn new(config: ListConfig) -> Self {
        let physics = ScrollPhysics::new(&config);
        Self {
            config,
            sections: Sections::default(),
            rows: Vec::new(),
            cursor: 0,
            recycle: HashMap::new(),
            cell_requested: None,
            item_id_requested: None,
            viewport: Size::ZERO,
            origin: Vec2::ZERO,
            physics,
            scrolling: false,
            selected: None,
            scheduler: LayoutScheduler::new(),
            background: Background::None,
            backdrop: None,
            released: Vec::new(),
            submissions: IndexMap::new(),
            events: Observers::new(),
        }
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    pub fn events(&self) -> &Observers<ListEvent> {
        &self.events
    }

    pub fn on_cell_requested(
        &mut self,
        f: impl Fn(usize, usize, Option<GridCell>) -> Option<GridCell> + 'static,
    ) {
        self.cell_requested = Some(Box::new(f));
    }

    pub fn on_item_id_requested(&mut self, f: impl Fn(usize, usize) -> ItemId + 'static) {
        self.item_id_requested = Some(Box::new(f));
    }

    pub fn physics(&self) -> &ScrollPhysics {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut ScrollPhysics {
        &mut self.physics
    }

    pub fn sections(&self) -> &Sections {
        &self.sections
    }

    pub fn rows(&self) -> &[MaterializedRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&MaterializedRow> {
        self.rows.get(index)
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut MaterializedRow> {
        self.rows.get_mut(index)
    }

    /// Scroll offset: 0 at the top, negative once scrolled down.
    pub fn offset(&self) -> f32 {
        self.physics.offset()
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Bottom of the last materialized row.
    pub fn content_height(&self) -> f32 {
        self.rows.last().map_or(0.0, |r| r.cell.bottom())
    }

    pub fn is_fully_materialized(&self) -> bool {
        self.cursor >= self.sections.logical_len()
    }

    pub fn set_origin(&mut self, origin: Vec2) {
        self.origin = origin;
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Resize the viewport. A width change re-lays out every row.
    pub fn set_viewport(&mut self, size: Size) {
        if size == self.viewport {
            log::debug!("list: unnecessary resize to {}x{}", size.width, size.height);
            return;
        }
        let width_changed = size.width != self.viewport.width;
        self.viewport = size;
        self.backdrop = None;
        if width_changed {
            self.scheduler.request(LayoutRequest::All);
            self.flush_layout();
        }
        self.fill_window();
    }

    /// Replace the sections. Materialized item rows go to the recycling pool
    /// keyed by item id; the scroll offset is kept and re-clamped on the next
    /// tick.
    pub fn reload_sections(&mut self, sections: Vec<Section>) {
        self.events.notify(&ListEvent::Rendering);
        if self.selected.take().is_some() {
            self.events
                .notify(&ListEvent::SelectionChanged { row: None });
        }
        self.released
            .extend(self.recycle.drain().map(|(_, c)| c.grid().id()));
        for row in self.rows.drain(..) {
            let mut cell = row.cell;
            cell.set_highlighted(false, self.config.selection_color);
            match cell.item_id().cloned() {
                Some(id) => {
                    self.recycle.insert(id, cell);
                }
                None => self.released.push(cell.grid().id()),
            }
        }
        log::debug!("list: reload, {} rows pooled", self.recycle.len());
        self.sections = Sections::new(sections);
        self.cursor = 0;
        self.fill_window();
    }

    fn build_cell(&mut self, slot: RowSlot) -> Option<GridCell> {
        match slot {
            RowSlot::Header { section } => {
                let text = self.sections.get(section)?.header_text()?;
                Some(GridCell::banner(CellKind::Header, text))
            }
            RowSlot::Footer { section } => {
                let text = self.sections.get(section)?.footer_text()?;
                Some(GridCell::banner(CellKind::Footer, text))
            }
            RowSlot::Item { section, index } => {
                let id = self.item_id_requested.as_ref().map(|f| f(section, index));
                let recycled = id.as_ref().and_then(|id| self.recycle.remove(id));
                let s = self.sections.get(section)?;
                let cell = match (&s.cell_requested, &self.cell_requested) {
                    (Some(f), _) => f(index, recycled),
                    (None, Some(f)) => f(section, index, recycled),
                    (None, None) => None,
                };
                cell.map(|mut c| {
                    c.set_item_id(id);
                    c
                })
            }
        }
    }

    /// Materialize the next logical row that yields a cell. Returns false
    /// once every row has been tried.
    fn materialize_next(&mut self) -> bool {
        let total = self.sections.logical_len();
        while self.cursor < total {
            let position = self.cursor;
            self.cursor += 1;
            let Some(slot) = self.sections.slot_at(position) else {
                break;
            };
            let Some(mut cell) = self.build_cell(slot) else {
                log::debug!("list: {slot} produced no cell, skipped");
                continue;
            };
            let top = self.content_height();
            cell.layout(self.viewport.width);
            cell.set_top(top);
            // A fresh row starts dirty; its first layout just ran.
            cell.take_dirty();
            log::trace!("list: materialized {slot} at {top}");
            self.rows.push(MaterializedRow {
                position,
                slot,
                cell,
            });
            return true;
        }
        false
    }

    /// Materialize rows up to logical `position`. Returns the index of the
    /// materialized row at that position, `None` when it produced no cell.
    pub fn materialize_through(&mut self, position: usize) -> Option<usize> {
        while self.rows.last().is_none_or(|r| r.position < position) {
            if !self.materialize_next() {
                break;
            }
        }
        self.sync_extent();
        self.rows.iter().rposition(|r| r.position == position)
    }

    /// Make sure materialized row `index` exists.
    pub(crate) fn ensure_row(&mut self, index: usize) -> bool {
        while self.rows.len() <= index {
            if !self.materialize_next() {
                self.sync_extent();
                return false;
            }
        }
        self.sync_extent();
        true
    }

    /// Materialize every remaining row.
    pub fn materialize_all(&mut self) {
        while self.materialize_next() {}
        self.sync_extent();
    }

    fn ensure_content(&mut self, bottom: f32) {
        while self.content_height() < bottom && self.materialize_next() {}
        self.sync_extent();
    }

    /// Grow the materialized prefix to cover the virtualization window.
    pub fn fill_window(&mut self) {
        let extent = self.config.window_extent(self.viewport.height);
        self.ensure_content(extent - self.physics.offset());
    }

    fn sync_extent(&mut self) {
        let content = self.content_height();
        self.physics.set_extent(content, self.viewport.height);
    }

    /// Rows intersecting the viewport, top to bottom. Recomputed on every
    /// call.
    pub fn visible_rows(&self) -> impl Iterator<Item = VisibleRow> + '_ {
        let offset = self.physics.offset();
        let height = self.viewport.height;
        let first = self
            .rows
            .partition_point(|r| r.cell.bottom() + offset <= 0.0);
        self.rows[first..]
            .iter()
            .enumerate()
            .take_while(move |(_, r)| r.cell.top() + offset < height)
            .filter(|(_, r)| r.cell.frame().h > 0.0)
            .map(move |(i, r)| VisibleRow {
                row: first + i,
                position: r.position,
                slot: r.slot,
                top: r.cell.top(),
                bottom: r.cell.bottom(),
            })
    }

    /// Pick up row invalidations and element events, then run one
    /// coalesced layout pass if anything asked for it.
    fn poll_rows(&mut self) {
        let mut events = Vec::new();
        for (i, row) in self.rows.iter_mut().enumerate() {
            if row.cell.take_dirty().contains(Dirty::LAYOUT) {
                self.scheduler.request(LayoutRequest::Row(i));
            }
            row.cell.drain_events(&mut events);
        }
        for e in events {
            match e {
                ElementEvent::DrawingSaved(path) => {
                    self.events.notify(&ListEvent::DrawingSaved(path))
                }
            }
        }
        self.flush_layout();
    }

    /// Run pending layout requests. Rows below the first re-laid-out row
    /// are moved so the stack stays contiguous.
    pub fn flush_layout(&mut self) -> bool {
        let Some(pass) = self.scheduler.begin_pass() else {
            return false;
        };
        let width = self.viewport.width;
        let mut reflow_from = None;
        for request in &pass.requests {
            match *request {
                LayoutRequest::All => {
                    for row in self.rows.iter_mut() {
                        row.cell.layout(width);
                    }
                    reflow_from = Some(0);
                }
                LayoutRequest::Row(i) => {
                    if let Some(row) = self.rows.get_mut(i) {
                        let before = row.cell.frame().h;
                        if row.cell.layout(width) != before {
                            log::debug!("list: row {i} resized, re-flowing");
                            reflow_from = Some(reflow_from.map_or(i, |r: usize| r.min(i)));
                        }
                    }
                }
            }
        }
        if let Some(from) = reflow_from {
            self.reflow_after(from);
        }
        self.scheduler.end_pass(pass);
        self.sync_extent();
        self.fill_window();
        true
    }

    fn reflow_after(&mut self, index: usize) {
        let mut top = match index.checked_sub(1).and_then(|i| self.rows.get(i)) {
            Some(prev) => prev.cell.bottom(),
            None => 0.0,
        };
        for row in self.rows.iter_mut().skip(index) {
            row.cell.set_top(top);
            top = row.cell.bottom();
        }
    }

    fn after_scroll(&mut self, delta: f32) {
        if delta == 0.0 {
            return;
        }
        if !self.scrolling {
            self.scrolling = true;
            self.events.notify(&ListEvent::Scrolling);
        }
        self.fill_window();
    }

    /// Advance one animation interval.
    pub fn tick(&mut self) -> ScrollStep {
        self.poll_rows();
        self.sync_extent();
        let step = self.physics.tick();
        self.after_scroll(step.delta);
        if step.at_rest {
            self.scrolling = false;
        }
        step
    }

    fn scroll_to_offset(&mut self, target: f32, animated: bool) {
        self.ensure_content(self.viewport.height - target);
        if animated {
            self.physics.animate_to(target);
        } else {
            let delta = self.physics.jump_to(target);
            self.after_scroll(delta);
        }
    }

    /// Scroll so the item's row is at the top (or as close as the content
    /// allows). An item that produced no cell scrolls to the next row that
    /// did, or to the end.
    pub fn scroll_to_cell(&mut self, section: usize, index: usize, animated: bool) -> Result<()> {
        let position = self.sections.position(section, index)?;
        self.materialize_through(position);
        let target = match self.rows.iter().find(|r| r.position >= position) {
            Some(row) => -row.cell.top(),
            None => -self.content_height(),
        };
        self.scroll_to_offset(target, animated);
        Ok(())
    }

    pub fn scroll_to_home(&mut self, animated: bool) {
        self.scroll_to_offset(0.0, animated);
    }

    pub fn scroll_to_end(&mut self, animated: bool) -> Result<()> {
        if self.sections.is_empty() {
            return Err(UiError::NoSections);
        }
        self.materialize_all();
        let target = -self.content_height();
        self.scroll_to_offset(target, animated);
        Ok(())
    }

    pub fn page_up(&mut self, animated: bool) {
        let target = self.physics.offset() + self.viewport.height;
        self.scroll_to_offset(target, animated);
    }

    pub fn page_down(&mut self, animated: bool) {
        let target = self.physics.offset() - self.viewport.height;
        self.scroll_to_offset(target, animated);
    }

    /// Paint the list background. Rows without a background of their own
    /// then show the matching slice of it.
    pub fn set_background(&mut self, background: Background) {
        self.background = background;
        self.backdrop = None;
    }

    fn prepare_backdrop(&mut self) {
        if self.background.take_fresh() {
            self.backdrop = None;
        }
        if self.backdrop.is_some() || self.background.is_none() {
            return;
        }
        let (w, h) = self.viewport.to_pixels();
        if w == 0 || h == 0 {
            return;
        }
        let mut img = RgbaImage::new(w, h);
        let mut canvas = Canvas::new(&mut img);
        canvas.clear(self.config.background);
        let bounds = glide_core::Rect::from_origin_size(Vec2::ZERO, self.viewport);
        match &self.background {
            Background::None => {}
            Background::Solid(c) => canvas.fill_rect(bounds, *c),
            Background::Image { slot, stretch } => {
                if let Some(src) = slot.image() {
                    canvas.draw_image(&src, bounds, *stretch);
                }
            }
        }
        self.backdrop = Some(img);
    }

    /// Paint the visible rows onto `canvas` (viewport sized).
    pub fn paint(&mut self, cache: &mut SurfaceCache, canvas: &mut Canvas<'_>) -> FrameStats {
        for id in self.released.drain(..) {
            cache.invalidate(id);
        }
        let mut stale = 0;
        for row in &mut self.rows {
            if row.cell.grid_mut().release_stale(cache) {
                stale += 1;
            }
        }
        if stale > 0 {
            log::trace!("list: released {stale} stale row surfaces");
        }
        self.prepare_backdrop();
        match &self.backdrop {
            Some(img) => canvas.blit(img, Vec2::ZERO),
            None => canvas.clear(self.config.background),
        }

        let offset = self.physics.offset();
        let visible: SmallVec<[usize; 16]> = self.visible_rows().map(|v| v.row).collect();
        let mut stats = FrameStats::default();
        for i in visible {
            let row = &mut self.rows[i];
            let at = Vec2::new(0.0, row.cell.top() + offset);
            let backdrop = match &self.backdrop {
                Some(image) if row.cell.is_transparent() => Some(Backdrop { image, origin: at }),
                _ => None,
            };
            match row.cell.paint(cache, canvas, at, backdrop) {
                PaintOutcome::Painted { reused } => {
                    stats.painted += 1;
                    if reused {
                        stats.reused += 1;
                    }
                }
                PaintOutcome::Skipped => stats.skipped += 1,
                PaintOutcome::Empty => {}
            }
        }
        stats
    }

    /// Field values from every materialized row, over the explicitly set
    /// ones.
    pub fn submission_values(&self) -> IndexMap<String, String> {
        let mut values = self.submissions.clone();
        let mut pairs = Vec::new();
        for row in &self.rows {
            row.cell.collect_submissions(&mut pairs);
        }
        values.extend(pairs);
        values
    }

    pub fn set_submission(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.submissions.insert(key.into(), value.into());
    }

    pub fn activate(&mut self) {
        self.events.notify(&ListEvent::Activated);
    }

    pub fn deactivate(&mut self) {
        self.physics.cancel();
        self.events.notify(&ListEvent::Deactivated);
    }
}
