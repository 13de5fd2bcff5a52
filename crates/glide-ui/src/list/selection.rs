//! Single selection over materialized rows.

use super::{ListController, ListEvent};
use crate::error::{Result, UiError};

impl ListController {
    /// Select materialized row `index`, materializing up to it if needed.
    /// Headers and footers cannot be selected; asking for one leaves the
    /// selection unchanged.
    pub fn select(&mut self, index: usize) -> Result<()> {
        if !self.ensure_row(index) {
            return Err(UiError::RowOutOfRange {
                index,
                count: self.rows.len(),
            });
        }
        if !self.rows[index].cell.is_selectable() {
            log::debug!("list: row {index} is not selectable");
            return Ok(());
        }
        self.select_row(index);
        Ok(())
    }

    pub fn deselect(&mut self) {
        if let Some(old) = self.selected.take() {
            if let Some(row) = self.rows.get_mut(old) {
                row.cell.set_highlighted(false, self.config.selection_color);
            }
            self.events
                .notify(&ListEvent::SelectionChanged { row: None });
        }
    }

    pub(crate) fn select_row(&mut self, index: usize) {
        if self.selected == Some(index) {
            return;
        }
        let color = self.config.selection_color;
        if let Some(row) = self.selected.and_then(|old| self.rows.get_mut(old)) {
            row.cell.set_highlighted(false, color);
        }
        self.rows[index].cell.set_highlighted(true, color);
        self.selected = Some(index);
        self.events
            .notify(&ListEvent::SelectionChanged { row: Some(index) });
        self.scroll_into_view(index);
    }

    /// Animate so `index` is fully visible when part of it is outside the
    /// viewport.
    fn scroll_into_view(&mut self, index: usize) {
        let offset = self.physics.offset();
        let (top, bottom) = {
            let cell = &self.rows[index].cell;
            (cell.top(), cell.bottom())
        };
        if top + offset < 0.0 || bottom + offset > self.viewport.height {
            self.scroll_to_offset(-top, true);
        }
    }

    /// Move the selection to the next selectable row, wrapping to the top.
    /// Stops after one full cycle, so rows that never materialize cannot
    /// make it spin.
    pub fn highlight_next(&mut self) -> Option<usize> {
        let begin = self.selected;
        let mut i = begin.map_or(0, |b| b + 1);
        let mut wrapped = false;
        loop {
            if Some(i) == begin {
                return begin;
            }
            if !self.ensure_row(i) {
                if wrapped || begin.is_none() {
                    return self.selected;
                }
                wrapped = true;
                i = 0;
                continue;
            }
            if self.rows[i].cell.is_selectable() {
                self.select_row(i);
                return Some(i);
            }
            i += 1;
        }
    }

    /// Move the selection to the previous selectable row, wrapping to the
    /// last row.
    pub fn highlight_previous(&mut self) -> Option<usize> {
        let begin = self.selected;
        let mut i = begin.and_then(|b| b.checked_sub(1));
        let mut wrapped = false;
        loop {
            let index = match i {
                Some(index) => index,
                None => {
                    if wrapped {
                        return self.selected;
                    }
                    wrapped = true;
                    self.materialize_all();
                    match self.rows.len().checked_sub(1) {
                        Some(last) => last,
                        None => return None,
                    }
                }
            };
            if Some(index) == begin {
                return begin;
            }
            if self.rows[index].cell.is_selectable() {
                self.select_row(index);
                return Some(index);
            }
            i = index.checked_sub(1);
        }
    }

    /// Raise `RowActivated` for the selected row. Returns false when
    /// nothing is selected.
    pub fn activate_selected(&mut self) -> bool {
        let Some(index) = self.selected else {
            return false;
        };
        let link = self.rows[index].cell.link().map(str::to_owned);
        log::debug!("list: row {index} activated ({link:?})");
        self.events
            .notify(&ListEvent::RowActivated { row: index, link });
        true
    }
}
