use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;

use crate::Thickness;

/// Process-unique identity of a visual element. Surfaces are keyed by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

impl ElementId {
    pub fn next() -> Self {
        ElementId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Visible,
    /// Takes up space but does not paint.
    Hidden,
    /// Takes no space and does not paint.
    Collapsed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
    #[default]
    Stretch,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
    #[default]
    Stretch,
}

/// Where an element sits inside its parent grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub row: usize,
    pub row_span: usize,
    pub column: usize,
    pub column_span: usize,
    pub margin: Thickness,
    pub h_align: HorizontalAlignment,
    pub v_align: VerticalAlignment,
    pub visibility: Visibility,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            row: 0,
            row_span: 1,
            column: 0,
            column_span: 1,
            margin: Thickness::ZERO,
            h_align: HorizontalAlignment::default(),
            v_align: VerticalAlignment::default(),
            visibility: Visibility::Visible,
        }
    }
}

impl Placement {
    pub fn takes_space(&self) -> bool {
        self.visibility != Visibility::Collapsed
    }

    pub fn paints(&self) -> bool {
        self.visibility == Visibility::Visible
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextInputKind {
    SingleLine,
    MultiLine,
}

bitflags! {
    /// What an element needs after a state change.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Dirty: u8 {
        const LAYOUT = 1 << 0;
        const PAINT = 1 << 1;
    }
}
