//! Pointer and keyboard routing for the list.

use glide_core::{
    Key, KeyEvent, Modifiers, PointerButton, PointerEvent, PointerEventKind, TextInputKind, Vec2,
};

use super::scroll::Release;
use super::ListController;

/// What a tap on the list ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapTarget {
    /// An element inside the row consumed it.
    Child { row: usize },
    /// The row itself was selected and activated.
    Row { row: usize },
    Nothing,
}

impl ListController {
    /// Feed a pointer event. Motion is applied on the next tick; a release
    /// that never left the drag lock is routed as a tap.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> Option<TapTarget> {
        match event.event {
            PointerEventKind::Down(PointerButton::Primary) => {
                self.physics.pointer_down(event.position);
                None
            }
            PointerEventKind::Move => {
                self.physics.pointer_move(event.position);
                None
            }
            PointerEventKind::Up(PointerButton::Primary) => {
                match self.physics.pointer_up(event.position)? {
                    Release::Click(at) => Some(self.tap(at)),
                    Release::Fling { .. } => None,
                }
            }
            PointerEventKind::Cancel => {
                self.physics.cancel();
                None
            }
            PointerEventKind::Down(_) | PointerEventKind::Up(_) => None,
        }
    }

    /// Route a tap at a device-space point. The row under it first offers
    /// the tap to its own elements; only if none takes it is the row
    /// selected and activated.
    pub fn tap(&mut self, device: Vec2) -> TapTarget {
        let local = device - self.origin;
        if local.y < 0.0 || local.y >= self.viewport.height {
            return TapTarget::Nothing;
        }
        let content = Vec2::new(local.x, local.y - self.physics.offset());
        let Some(index) = self
            .rows
            .iter()
            .position(|r| r.cell.frame().contains(content))
        else {
            return TapTarget::Nothing;
        };
        let frame = self.rows[index].cell.frame();
        if self.rows[index].cell.click(content - frame.origin()) {
            log::trace!("list: tap consumed inside row {index}");
            return TapTarget::Child { row: index };
        }
        if !self.rows[index].cell.is_selectable() {
            return TapTarget::Nothing;
        }
        self.select_row(index);
        self.activate_selected();
        TapTarget::Row { row: index }
    }

    fn selected_text_input(&self) -> Option<TextInputKind> {
        self.selected
            .and_then(|i| self.rows.get(i))
            .and_then(|r| r.cell.text_input())
    }

    /// Handle a key press. Returns true when the list used it.
    ///
    /// While the selected row holds a text field, keys that move a caret
    /// (arrows, Home/End, Space) are left to the field.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        let field = self.selected_text_input();
        let in_field = field.is_some();
        match event.key {
            Key::Tab => {
                if event.modifiers.contains(Modifiers::SHIFT) {
                    self.highlight_previous();
                } else {
                    self.highlight_next();
                }
                true
            }
            Key::ArrowUp if !in_field => {
                self.highlight_previous();
                true
            }
            Key::ArrowDown if !in_field => {
                self.highlight_next();
                true
            }
            Key::Home if !in_field => {
                self.scroll_to_home(true);
                true
            }
            Key::End if !in_field => self.scroll_to_end(true).is_ok(),
            Key::PageUp => {
                self.page_up(true);
                true
            }
            Key::PageDown => {
                self.page_down(true);
                true
            }
            Key::Enter => match field {
                Some(TextInputKind::SingleLine) => {
                    self.highlight_next();
                    true
                }
                Some(TextInputKind::MultiLine) => false,
                None => self.activate_selected(),
            },
            Key::Space if !in_field => self.activate_selected(),
            Key::Select => self.activate_selected(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use glide_core::{Color, Size};

    use super::*;
    use crate::elements::{Block, TextField, Toggle};
    use crate::element::PlacementExt;
    use crate::grid::{GridContainer, Track};
    use crate::list::{GridCell, ListConfig, Section};

    fn list() -> ListController {
        let mut l = ListController::new(ListConfig::default());
        l.set_viewport(Size::new(100.0, 80.0));
        l.set_origin(Vec2::new(0.0, 20.0));
        l.on_cell_requested(|_, i, _| {
            let grid = GridContainer::new()
                .with_columns([Track::star(), Track::Fixed(51.0)])
                .with_child(Block::new(Size::new(10.0, 40.0), Color::BLACK));
            let cell = GridCell::item().with_grid(grid);
            Some(match i {
                1 => cell.with_child(Toggle::new("t").at(0, 1)),
                3 => cell.with_child(TextField::single_line().at(0, 1)),
                _ => cell,
            })
        });
        l.reload_sections(vec![Section::new(8)]);
        l
    }

    fn press(l: &mut ListController, y: f32) -> Option<TapTarget> {
        let at = Vec2::new(10.0, y);
        l.handle_pointer(&PointerEvent::touch(
            PointerEventKind::Down(PointerButton::Primary),
            at,
        ));
        l.tick();
        l.handle_pointer(&PointerEvent::touch(
            PointerEventKind::Up(PointerButton::Primary),
            at,
        ))
    }

    #[test]
    fn tap_selects_row_under_pointer() {
        let mut l = list();
        // Device y 70 is list y 50: row 1.
        assert_eq!(press(&mut l, 70.0), Some(TapTarget::Row { row: 1 }));
        assert_eq!(l.selected(), Some(1));
    }

    #[test]
    fn child_takes_tap_before_row() {
        let mut l = list();
        let target = l.tap(Vec2::new(80.0, 70.0));
        assert_eq!(target, TapTarget::Child { row: 1 });
        assert_eq!(l.selected(), None);
        let on = l.rows()[1].cell.grid().find::<Toggle>().map(|t| t.is_on());
        assert_eq!(on, Some(true));
    }

    #[test]
    fn tap_outside_viewport_does_nothing() {
        let mut l = list();
        assert_eq!(l.tap(Vec2::new(10.0, 5.0)), TapTarget::Nothing);
    }

    #[test]
    fn drag_is_not_a_tap() {
        let mut l = list();
        l.handle_pointer(&PointerEvent::touch(
            PointerEventKind::Down(PointerButton::Primary),
            Vec2::new(10.0, 90.0),
        ));
        for y in [80.0, 60.0, 40.0] {
            l.handle_pointer(&PointerEvent::touch(PointerEventKind::Move, Vec2::new(10.0, y)));
            l.tick();
        }
        let up = l.handle_pointer(&PointerEvent::touch(
            PointerEventKind::Up(PointerButton::Primary),
            Vec2::new(10.0, 40.0),
        ));
        assert_eq!(up, None);
        assert_eq!(l.offset(), -40.0);
        assert_eq!(l.selected(), None);
    }

    #[test]
    fn arrow_keys_navigate_and_tab_wraps() {
        let mut l = list();
        assert!(l.handle_key(&KeyEvent::new(Key::ArrowDown)));
        assert_eq!(l.selected(), Some(0));
        assert!(l.handle_key(&KeyEvent::new(Key::Tab)));
        assert_eq!(l.selected(), Some(1));
        assert!(l.handle_key(&KeyEvent::new(Key::Tab).with_modifiers(Modifiers::SHIFT)));
        assert_eq!(l.selected(), Some(0));
        assert!(l.handle_key(&KeyEvent::new(Key::ArrowUp)));
        assert_eq!(l.selected(), Some(7));
    }

    #[test]
    fn text_field_keeps_caret_keys() {
        let mut l = list();
        l.select(3).unwrap();
        assert!(!l.handle_key(&KeyEvent::new(Key::ArrowDown)));
        assert!(!l.handle_key(&KeyEvent::new(Key::Space)));
        assert_eq!(l.selected(), Some(3));
        // Enter in a single-line field moves on.
        assert!(l.handle_key(&KeyEvent::new(Key::Enter)));
        assert_eq!(l.selected(), Some(4));
    }

    #[test]
    fn enter_activates_selected_row() {
        let mut l = list();
        assert!(!l.handle_key(&KeyEvent::new(Key::Enter)));
        l.select(0).unwrap();
        assert!(l.handle_key(&KeyEvent::new(Key::Enter)));
        assert!(!l.handle_key(&KeyEvent::new(Key::Escape)));
    }
}
