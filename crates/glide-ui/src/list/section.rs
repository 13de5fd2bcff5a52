use std::fmt;

use crate::error::{Result, UiError};
use crate::list::cell::GridCell;

/// Per-section cell factory: `(item index, recycled cell) -> cell`.
pub type SectionCellRequested = Box<dyn Fn(usize, Option<GridCell>) -> Option<GridCell>>;

/// A group of rows with optional header and footer text.
///
/// Headers and footers only occupy a row when their text is non-empty.
#[derive(Default)]
pub struct Section {
    pub header: Option<String>,
    pub footer: Option<String>,
    pub item_count: usize,
    pub(crate) cell_requested: Option<SectionCellRequested>,
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("header", &self.header)
            .field("footer", &self.footer)
            .field("item_count", &self.item_count)
            .field("cell_requested", &self.cell_requested.is_some())
            .finish()
    }
}

impl Section {
    pub fn new(item_count: usize) -> Self {
        Self {
            item_count,
            ..Self::default()
        }
    }

    pub fn header(mut self, text: impl Into<String>) -> Self {
        self.header = Some(text.into());
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    /// Build this section's cells here instead of with the list-level
    /// handler.
    pub fn on_cell_requested(
        mut self,
        f: impl Fn(usize, Option<GridCell>) -> Option<GridCell> + 'static,
    ) -> Self {
        self.cell_requested = Some(Box::new(f));
        self
    }

    pub fn header_text(&self) -> Option<&str> {
        self.header.as_deref().filter(|t| !t.is_empty())
    }

    pub fn footer_text(&self) -> Option<&str> {
        self.footer.as_deref().filter(|t| !t.is_empty())
    }

    fn row_count(&self) -> usize {
        self.header_text().is_some() as usize
            + self.item_count
            + self.footer_text().is_some() as usize
    }
}

/// A logical row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowSlot {
    Header { section: usize },
    Item { section: usize, index: usize },
    Footer { section: usize },
}

impl RowSlot {
    pub fn section(&self) -> usize {
        match *self {
            RowSlot::Header { section }
            | RowSlot::Item { section, .. }
            | RowSlot::Footer { section } => section,
        }
    }

    pub fn is_item(&self) -> bool {
        matches!(self, RowSlot::Item { .. })
    }
}

impl fmt::Display for RowSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowSlot::Header { section } => write!(f, "header {section}"),
            RowSlot::Item { section, index } => write!(f, "item {section}.{index}"),
            RowSlot::Footer { section } => write!(f, "footer {section}"),
        }
    }
}

/// The ordered sections of a list and the mapping between (section, item)
/// pairs and linear row positions.
#[derive(Debug, Default)]
pub struct Sections(Vec<Section>);

impl Sections {
    pub fn new(sections: Vec<Section>) -> Self {
        Self(sections)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, section: usize) -> Option<&Section> {
        self.0.get(section)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.0.iter()
    }

    /// Number of logical rows across every section.
    pub fn logical_len(&self) -> usize {
        self.0.iter().map(Section::row_count).sum()
    }

    /// Linear position of item `index` in `section`: the rows of every
    /// earlier section, plus this section's header, plus `index`.
    pub fn position(&self, section: usize, index: usize) -> Result<usize> {
        let s = self.0.get(section).ok_or(UiError::SectionOutOfRange {
            section,
            count: self.0.len(),
        })?;
        if index >= s.item_count {
            return Err(UiError::ItemOutOfRange {
                section,
                index,
                count: s.item_count,
            });
        }
        let before: usize = self.0[..section].iter().map(Section::row_count).sum();
        Ok(before + s.header_text().is_some() as usize + index)
    }

    pub fn slot_at(&self, position: usize) -> Option<RowSlot> {
        let mut rest = position;
        for (section, s) in self.0.iter().enumerate() {
            if s.header_text().is_some() {
                if rest == 0 {
                    return Some(RowSlot::Header { section });
                }
                rest -= 1;
            }
            if rest < s.item_count {
                return Some(RowSlot::Item {
                    section,
                    index: rest,
                });
            }
            rest -= s.item_count;
            if s.footer_text().is_some() {
                if rest == 0 {
                    return Some(RowSlot::Footer { section });
                }
                rest -= 1;
            }
        }
        None
    }
}
