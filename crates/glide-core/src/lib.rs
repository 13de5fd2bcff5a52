//! # Glide core
//!
//! Plain data shared by every Glide crate: geometry, colours, the easing
//! catalogue, clocks, input events, element placement and typed observer
//! lists. Nothing here paints or lays out; see `glide-ui` for that.
//!
//! ```rust
//! use glide_core::*;
//!
//! let r = Rect::new(0.0, 0.0, 100.0, 40.0);
//! assert!(r.contains(Vec2::new(100.0, 40.0)));
//!
//! let y = Easing::ExpoOut.apply(300.0, 0.0, -120.0, 300.0);
//! assert_eq!(y, -120.0);
//! ```

pub mod clock;
pub mod color;
pub mod easing;
pub mod element;
pub mod geometry;
pub mod input;
pub mod observe;

pub use clock::*;
pub use color::*;
pub use easing::{Easing, EasingFn};
pub use element::*;
pub use geometry::*;
pub use input::*;
pub use observe::*;
