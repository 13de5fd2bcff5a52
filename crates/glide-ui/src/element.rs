use std::any::Any;
use std::path::PathBuf;

use glide_core::{
    Dirty, ElementId, HorizontalAlignment, Placement, Rect, Size, TextInputKind, Thickness, Vec2,
    VerticalAlignment, Visibility,
};

use crate::surface::Canvas;

/// Notifications an element raises for its owning list.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementEvent {
    DrawingSaved(PathBuf),
}

/// The capability set every visual element provides to the grid that owns
/// it. Frames are in the parent's coordinate space.
pub trait Element: Any {
    fn id(&self) -> ElementId;
    fn placement(&self) -> &Placement;
    fn placement_mut(&mut self) -> &mut Placement;
    fn frame(&self) -> Rect;
    fn set_frame(&mut self, frame: Rect);

    /// Preferred size given the space on offer (either axis may be infinite).
    fn measure(&mut self, available: Size) -> Size;

    /// Draw into `canvas`, whose origin is this element's top-left corner.
    fn paint(&self, _canvas: &mut Canvas<'_>) {}

    /// Report and reset pending invalidations.
    fn take_dirty(&mut self) -> Dirty {
        Dirty::empty()
    }

    /// A tap at `local`. Returns true if the element consumed it.
    fn click(&mut self, _local: Vec2) -> bool {
        false
    }

    fn text_input(&self) -> Option<TextInputKind> {
        None
    }

    fn set_highlighted(&mut self, _highlighted: bool) {}

    /// Push `(submit key, value)` pairs for form-style elements.
    fn collect_submissions(&self, _out: &mut Vec<(String, String)>) {}

    fn drain_events(&mut self, _out: &mut Vec<ElementEvent>) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Builder-style placement setters for any element.
pub trait PlacementExt: Element + Sized {
    fn at(mut self, row: usize, column: usize) -> Self {
        let p = self.placement_mut();
        p.row = row;
        p.column = column;
        self
    }

    fn span(mut self, rows: usize, columns: usize) -> Self {
        let p = self.placement_mut();
        p.row_span = rows.max(1);
        p.column_span = columns.max(1);
        self
    }

    fn margin(mut self, margin: Thickness) -> Self {
        self.placement_mut().margin = margin;
        self
    }

    fn align(mut self, h: HorizontalAlignment, v: VerticalAlignment) -> Self {
        let p = self.placement_mut();
        p.h_align = h;
        p.v_align = v;
        self
    }

    fn visibility(mut self, visibility: Visibility) -> Self {
        self.placement_mut().visibility = visibility;
        self
    }
}

impl<T: Element> PlacementExt for T {}

/// Forward the `Any` plumbing for a concrete element type.
#[macro_export]
macro_rules! impl_any {
    () => {
        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
            self
        }
    };
}
