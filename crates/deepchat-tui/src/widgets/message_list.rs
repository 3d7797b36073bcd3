//! Message list widget for displaying the conversation

use crate::theme::Theme;
use chrono::{DateTime, Local, Utc};
use deepchat_client::{Message, MessageId, Sender};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Who a displayed row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    /// Local notice (command output, help), never sent to the backend
    System,
}

/// A single message as shown on screen
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Conversation id; `None` for local notices
    pub id: Option<MessageId>,
    pub role: Role,
    pub content: String,
    /// Model label shown in the assistant header
    pub model: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub is_error: bool,
    pub is_streaming: bool,
}

impl ChatMessage {
    /// Create a local notice
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::System,
            content: content.into(),
            model: None,
            timestamp: Utc::now(),
            is_error: false,
            is_streaming: false,
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: Some(message.id),
            role: match message.sender {
                Sender::User => Role::User,
                Sender::Assistant => Role::Assistant,
            },
            content: message.content.clone(),
            model: message.model.clone(),
            timestamp: message.timestamp,
            is_error: message.is_error,
            is_streaming: message.is_streaming,
        }
    }
}

/// Widget for displaying a list of chat messages
pub struct MessageList<'a> {
    messages: &'a [ChatMessage],
    theme: &'a Theme,
    scroll: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(messages: &'a [ChatMessage], theme: &'a Theme) -> Self {
        Self {
            messages,
            theme,
            scroll: 0,
        }
    }

    /// Set scroll offset in lines
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }
}

fn header(msg: &ChatMessage, theme: &Theme) -> Line<'static> {
    let (label, style, prefix) = match msg.role {
        Role::User => ("You".to_string(), theme.accent_bold(), "▶ "),
        Role::Assistant if msg.is_error => ("Error".to_string(), theme.error_style(), "✖ "),
        Role::Assistant => (
            msg.model
                .clone()
                .unwrap_or_else(|| "Assistant".to_string()),
            theme.assistant_bold(),
            "◀ ",
        ),
        Role::System => ("deepchat".to_string(), theme.dim_style(), "● "),
    };

    let mut spans = vec![Span::styled(format!("{}{}", prefix, label), style)];
    if msg.role != Role::System {
        let time = msg.timestamp.with_timezone(&Local).format("%H:%M");
        spans.push(Span::styled(format!("  {}", time), theme.dim_style()));
    }
    if msg.is_streaming {
        spans.push(Span::styled(" ▌", style));
    }
    Line::from(spans)
}

/// Lines a message occupies at the given width, header and separator included
pub fn message_lines(msg: &ChatMessage, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut lines = vec![header(msg, theme)];
    let content_width = width.saturating_sub(2).max(1);

    if msg.content.is_empty() && msg.is_streaming {
        lines.push(Line::from(Span::styled(
            "  …",
            theme.warning_style(),
        )));
    } else {
        let style = if msg.is_error {
            theme.error_style()
        } else if msg.role == Role::System {
            theme.dim_style()
        } else {
            Style::default().fg(theme.fg)
        };
        for line in textwrap::wrap(&msg.content, content_width) {
            lines.push(Line::from(Span::styled(format!("  {}", line), style)));
        }
    }

    lines.push(Line::from(""));
    lines
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let width = area.width as usize;
        let visible: Vec<Line> = self
            .messages
            .iter()
            .flat_map(|msg| message_lines(msg, self.theme, width))
            .skip(self.scroll)
            .take(area.height as usize)
            .collect();

        Paragraph::new(visible).render(area, buf);
    }
}

/// Calculate total height of messages
pub fn calculate_message_height(messages: &[ChatMessage], width: usize) -> usize {
    let theme = Theme::dark();
    messages
        .iter()
        .map(|msg| message_lines(msg, &theme, width).len())
        .sum()
}
