//! Popup for picking one entry from a list, used for starter prompts

use crate::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, StatefulWidget, Widget},
};
use unicode_width::UnicodeWidthStr;

const MAX_POPUP_WIDTH: u16 = 80;
const MAX_POPUP_HEIGHT: u16 = 20;

/// A centered popup listing choices
pub struct Selector<'a> {
    title: &'a str,
    items: &'a [String],
    selected: usize,
    theme: &'a Theme,
}

impl<'a> Selector<'a> {
    pub fn new(title: &'a str, items: &'a [String], theme: &'a Theme) -> Self {
        Self {
            title,
            items,
            selected: 0,
            theme,
        }
    }

    pub fn with_selected(mut self, index: usize) -> Self {
        self.selected = index.min(self.items.len().saturating_sub(1));
        self
    }

    /// Popup size for the current items, before clamping to the screen
    fn popup_size(&self) -> (u16, u16) {
        let widest = self
            .items
            .iter()
            .map(|item| item.width() + 6)
            .max()
            .unwrap_or(0)
            .max(self.title.width() + 4);
        let width = (widest.min(u16::MAX as usize) as u16).clamp(20, MAX_POPUP_WIDTH);
        let height = (self.items.len() as u16 + 2).min(MAX_POPUP_HEIGHT);
        (width, height)
    }

    /// Render the selector centered in the given area
    pub fn render_centered(&self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.popup_size();
        let width = width.min(area.width);
        let height = height.min(area.height);
        let popup = Rect::new(
            area.x + (area.width - width) / 2,
            area.y + (area.height - height) / 2,
            width,
            height,
        );

        Clear.render(popup, buf);

        let items: Vec<ListItem> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let style = if i == self.selected {
                    Style::default()
                        .bg(self.theme.accent)
                        .fg(self.theme.bg)
                        .add_modifier(Modifier::BOLD)
                } else {
                    self.theme.base_style()
                };
                ListItem::new(Line::from(Span::styled(format!("  {}", item), style)))
            })
            .collect();

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(self.theme.accent_bold())
            .borders(Borders::ALL)
            .border_style(self.theme.accent_style());

        let list = List::new(items)
            .block(block)
            .highlight_spacing(HighlightSpacing::Always);

        let mut state = ListState::default();
        state.select(Some(self.selected));
        StatefulWidget::render(list, popup, buf, &mut state);
    }
}

/// Visibility and cursor of a selector popup
#[derive(Debug, Default)]
pub struct SelectorState {
    pub selected: usize,
    pub visible: bool,
}

impl SelectorState {
    /// Show the popup with the first entry selected
    pub fn show(&mut self) {
        self.selected = 0;
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Move selection up, wrapping to the bottom
    pub fn up(&mut self, item_count: usize) {
        if item_count == 0 {
            return;
        }
        self.selected = if self.selected == 0 {
            item_count - 1
        } else {
            self.selected - 1
        };
    }

    /// Move selection down, wrapping to the top
    pub fn down(&mut self, item_count: usize) {
        if item_count == 0 {
            return;
        }
        self.selected = (self.selected + 1) % item_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_wraps() {
        let mut state = SelectorState::default();
        state.show();
        state.up(3);
        assert_eq!(state.selected, 2);
        state.down(3);
        assert_eq!(state.selected, 0);
        state.down(0);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_render_in_small_area() {
        let theme = Theme::dark();
        let items = vec!["Explain Rust lifetimes".to_string(), "Write a haiku".to_string()];
        let area = Rect::new(0, 0, 10, 3);
        let mut buf = Buffer::empty(area);
        Selector::new("Suggestions", &items, &theme)
            .with_selected(5)
            .render_centered(area, &mut buf);
    }
}
