//! Grid layout, cached raster painting and the virtualized momentum list.
//!
//! ```rust
//! use glide_core::{Color, Size};
//! use glide_ui::elements::Block;
//! use glide_ui::list::{GridCell, ListConfig, ListController, Section};
//!
//! let mut list = ListController::new(ListConfig::default());
//! list.set_viewport(Size::new(320.0, 480.0));
//! list.on_cell_requested(|_, _, recycled| {
//!     recycled.or_else(|| {
//!         Some(GridCell::item().with_child(Block::new(Size::new(10.0, 44.0), Color::BLACK)))
//!     })
//! });
//! list.reload_sections(vec![Section::new(100).header("Inbox")]);
//! assert_eq!(list.visible_rows().next().map(|r| r.position), Some(0));
//! ```

pub mod background;
pub mod cache;
pub mod element;
pub mod elements;
pub mod error;
pub mod grid;
pub mod list;
pub mod schedule;
pub mod surface;

pub use background::{Background, ImageSlot, Stretch};
pub use cache::{CacheConfig, CacheStats, SurfaceCache};
pub use element::{Element, ElementEvent, PlacementExt};
pub use error::{Result, UiError};
pub use grid::{Backdrop, GridContainer, GridProperty, PaintOutcome, Track};
pub use list::{ListController, ListEvent};
pub use schedule::{LayoutPass, LayoutRequest, LayoutScheduler};
pub use surface::{Canvas, Surface};
