//! TUI implementation for deepchat

use tokio::sync::{broadcast, mpsc};

use crossterm::event::{Event, EventStream, MouseEventKind};
use deepchat_client::Message;
use deepchat_session::{ChatMode, Session, SessionEvent};
use deepchat_tui::{
    TerminalSession, Theme,
    input::{Action, key_to_action},
    widgets::{
        ChatMessage, InputBox, MessageList, Selector, SelectorState, Spinner,
        message_list::calculate_message_height,
    },
};
use futures::StreamExt;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use std::time::Instant;

use crate::commands::{CommandResult, execute_command};

/// Input accepted with Enter, waiting for the driver loop to pick it up
#[derive(Debug, PartialEq, Eq)]
pub enum Submission {
    /// Text to send to the backend
    Prompt(String),
    /// Slash command
    Command(String),
}

/// Messages sent from UI to the session driver
#[derive(Debug)]
pub enum UiMessage {
    /// Clear the conversation
    Clear,
    /// Switch stream/sync mode
    ToggleMode,
    /// User requested quit
    Quit,
}

/// TUI application state
pub struct TuiState {
    /// Rendered copy of the conversation plus local notices
    messages: Vec<ChatMessage>,
    input: InputBox,
    /// Scroll offset in lines; `usize::MAX` means stick to the bottom
    scroll: usize,
    /// Whether a send is in flight
    is_busy: bool,
    status: String,
    theme: Theme,
    mode: ChatMode,
    model_label: String,
    ui_tx: mpsc::Sender<UiMessage>,
    spinner_start: Instant,
    suggestions: Vec<String>,
    suggestion_selector: SelectorState,
    /// Events were dropped by the broadcast channel during the last send
    lagged: bool,
    /// At most one accepted input; Enter is refused while it is occupied
    submission: Option<Submission>,
}

impl TuiState {
    pub fn new(
        mode: ChatMode,
        model_label: String,
        suggestions: Vec<String>,
        ui_tx: mpsc::Sender<UiMessage>,
    ) -> Self {
        let mut input = InputBox::new().with_placeholder("Type a message...");
        input.set_focused(true);
        input.set_title(mode.as_str());

        Self {
            messages: vec![],
            input,
            scroll: 0,
            is_busy: false,
            status: "Ready".to_string(),
            theme: Theme::dark(),
            mode,
            model_label,
            ui_tx,
            spinner_start: Instant::now(),
            suggestions,
            suggestion_selector: SelectorState::default(),
            lagged: false,
            submission: None,
        }
    }

    /// Take the accepted input, if any
    pub fn take_submission(&mut self) -> Option<Submission> {
        self.submission.take()
    }

    /// Accept input unless a previous one is still pending
    fn submit(&mut self, submission: Submission) {
        if self.is_busy || self.submission.is_some() {
            self.status = "Still waiting for the previous reply".to_string();
            return;
        }
        self.submission = Some(submission);
    }

    /// Position of the displayed copy of a conversation message
    fn position_of(&self, message: &Message) -> Option<usize> {
        self.messages
            .iter()
            .rposition(|m| m.id == Some(message.id))
    }

    /// Replace the displayed copy of a message, or append it
    fn upsert(&mut self, message: &Message) {
        let chat = ChatMessage::from(message);
        match self.position_of(message) {
            Some(pos) => self.messages[pos] = chat,
            None => self.messages.push(chat),
        }
        self.scroll_to_bottom();
    }

    /// Handle session events
    pub fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::SendStart { mode } => {
                self.is_busy = true;
                self.spinner_start = Instant::now();
                self.status = match mode {
                    ChatMode::Stream => "Streaming reply...".to_string(),
                    ChatMode::Sync => "Waiting for reply...".to_string(),
                };
            }
            SessionEvent::MessageAdded { message }
            | SessionEvent::MessageUpdated { message }
            | SessionEvent::MessageFinalized { message } => {
                self.upsert(&message);
            }
            SessionEvent::SendEnd { failed } => {
                self.is_busy = false;
                self.status = if failed {
                    "Send failed".to_string()
                } else {
                    "Ready".to_string()
                };
            }
            SessionEvent::Cleared => {
                self.messages.clear();
                self.scroll = 0;
                self.status = "Cleared".to_string();
            }
            SessionEvent::ModeChanged { mode } => {
                self.set_mode(mode);
            }
        }
    }

    /// Handle a receive error from the session event channel
    fn handle_recv_error(&mut self, error: broadcast::error::RecvError) {
        if let broadcast::error::RecvError::Lagged(skipped) = error {
            tracing::debug!(skipped, "UI lagged behind session events");
            self.lagged = true;
        }
    }

    /// Rebuild the displayed conversation after events were missed
    fn resync(&mut self, messages: &[Message]) {
        if !self.lagged {
            return;
        }
        self.lagged = false;
        self.messages = messages.iter().map(ChatMessage::from).collect();
        self.scroll_to_bottom();
    }

    fn set_mode(&mut self, mode: ChatMode) {
        self.mode = mode;
        self.input.set_title(mode.as_str());
        self.status = format!("Mode: {}", mode);
    }

    fn scroll_to_bottom(&mut self) {
        // Resolved during render once the content height is known
        self.scroll = usize::MAX;
    }

    /// Show a local notice
    pub fn show_system_message(&mut self, content: &str) {
        self.messages.push(ChatMessage::system(content));
        self.scroll_to_bottom();
    }

    fn open_suggestions(&mut self) {
        if self.suggestions.is_empty() {
            self.status = "No suggestions configured".to_string();
        } else {
            self.suggestion_selector.show();
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        self.scroll = if delta < 0 {
            self.scroll.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll.saturating_add(delta as usize)
        };
    }

    /// Handle a mouse wheel event
    fn handle_mouse(&mut self, kind: MouseEventKind) {
        match kind {
            MouseEventKind::ScrollUp => self.scroll_by(-3),
            MouseEventKind::ScrollDown => self.scroll_by(3),
            _ => {}
        }
    }

    /// Handle a key while a send is in flight; returns false to quit
    pub fn handle_busy_action(&mut self, action: Action, width: u16) -> bool {
        match action {
            Action::Interrupt | Action::Quit => false,
            Action::Submit => {
                self.status = "Still waiting for the previous reply".to_string();
                true
            }
            Action::PageUp => {
                self.scroll_by(-10);
                true
            }
            Action::PageDown => {
                self.scroll_by(10);
                true
            }
            Action::ToggleMode | Action::Clear | Action::Suggest => {
                self.status = "Busy: wait for the reply to finish".to_string();
                true
            }
            _ => {
                self.input.handle_action(&action, width);
                true
            }
        }
    }

    /// Handle keyboard action; returns false to quit
    pub async fn handle_action(&mut self, action: Action, width: u16) -> bool {
        if self.suggestion_selector.visible {
            let count = self.suggestions.len();
            match action {
                Action::Up => self.suggestion_selector.up(count),
                Action::Down => self.suggestion_selector.down(count),
                Action::Submit => {
                    self.suggestion_selector.hide();
                    if let Some(prompt) = self.suggestions.get(self.suggestion_selector.selected) {
                        self.submit(Submission::Prompt(prompt.clone()));
                    }
                }
                Action::Escape | Action::Suggest => self.suggestion_selector.hide(),
                _ => {}
            }
            return true;
        }

        match action {
            Action::Submit => {
                if self.input.content().trim().is_empty() {
                    return true;
                }
                if self.is_busy || self.submission.is_some() {
                    // Keep the typed text for a later Enter
                    self.status = "Still waiting for the previous reply".to_string();
                    return true;
                }
                let content = self.input.take();
                if content.trim_start().starts_with('/') {
                    self.submit(Submission::Command(content));
                } else {
                    self.submit(Submission::Prompt(content));
                }
                true
            }
            Action::Quit | Action::Interrupt => {
                let _ = self.ui_tx.send(UiMessage::Quit).await;
                false
            }
            Action::Escape => {
                self.input.clear();
                true
            }
            Action::PageUp => {
                self.scroll_by(-10);
                true
            }
            Action::PageDown => {
                self.scroll_by(10);
                true
            }
            Action::Clear => {
                let _ = self.ui_tx.send(UiMessage::Clear).await;
                true
            }
            Action::ToggleMode => {
                let _ = self.ui_tx.send(UiMessage::ToggleMode).await;
                true
            }
            Action::Suggest => {
                self.open_suggestions();
                true
            }
            _ => {
                self.input.handle_action(&action, width);
                true
            }
        }
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // Messages
                Constraint::Length(1), // Status
                Constraint::Length(3), // Input
            ])
            .split(size);

        self.render_messages(frame, chunks[0]);
        self.render_status(frame, chunks[1]);
        self.input.render(chunks[2], frame.buffer_mut(), &self.theme);

        if self.suggestion_selector.visible {
            Selector::new("Suggestions", &self.suggestions, &self.theme)
                .with_selected(self.suggestion_selector.selected)
                .render_centered(size, frame.buffer_mut());
        }
    }

    fn welcome_lines(&self) -> Vec<Line<'static>> {
        let key = |k: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("    {:<10}", k), Style::default().fg(Color::Cyan)),
                Span::styled(what, Style::default().fg(Color::White)),
            ])
        };

        let mut lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    "  deepchat",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" - chat with {}", self.model_label),
                    Style::default().fg(Color::DarkGray),
                ),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "  Keybindings",
                Style::default().fg(Color::Yellow),
            )),
            Line::from(""),
            key("Enter", "Send message"),
            key("Ctrl+T", "Toggle stream/sync mode"),
            key("Ctrl+S", "Starter prompts"),
            key("Ctrl+L", "Clear conversation"),
            key("PgUp/Dn", "Scroll history"),
            key("Ctrl+C", "Quit"),
        ];

        if !self.suggestions.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  Try asking",
                Style::default().fg(Color::Yellow),
            )));
            lines.push(Line::from(""));
            for suggestion in &self.suggestions {
                lines.push(Line::from(Span::styled(
                    format!("    • {}", suggestion),
                    Style::default().fg(Color::White),
                )));
            }
        }

        lines
    }

    fn render_messages(&mut self, frame: &mut Frame, area: Rect) {
        let title = format!(" deepchat │ {} ", self.model_label);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(title);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.height == 0 || self.messages.is_empty() {
            frame.render_widget(Paragraph::new(self.welcome_lines()), inner);
            return;
        }

        let content_height = calculate_message_height(&self.messages, inner.width as usize);
        let max_scroll = content_height.saturating_sub(inner.height as usize);
        self.scroll = self.scroll.min(max_scroll);

        let message_list = MessageList::new(&self.messages, &self.theme).scroll(self.scroll);
        frame.render_widget(message_list, inner);

        if content_height > inner.height as usize {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");

            let mut scrollbar_state = ScrollbarState::new(content_height)
                .position(self.scroll)
                .viewport_content_length(inner.height as usize);

            frame.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        if self.is_busy {
            let spinner =
                Spinner::new(&self.status, &self.theme).with_start_time(self.spinner_start);
            frame.render_widget(spinner, area);
            return;
        }

        let left_content = format!("{} │ {}", self.mode, self.status);
        let right_content = "Ctrl+T: mode │ Ctrl+S: suggest │ Ctrl+L: clear │ Ctrl+C: quit";

        let left_width = left_content.chars().count();
        let right_width = right_content.chars().count();
        let available = area.width as usize;

        let line = if left_width + right_width + 2 <= available {
            let spacing = available - left_width - right_width;
            Line::from(vec![
                Span::styled(&left_content, self.theme.dim_style()),
                Span::raw(" ".repeat(spacing)),
                Span::styled(right_content, Style::default().fg(Color::DarkGray)),
            ])
        } else {
            Line::from(Span::styled(&left_content, self.theme.dim_style()))
        };

        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Apply a slash command result; returns false to quit
fn apply_command(result: CommandResult, session: &mut Session, state: &mut TuiState) -> bool {
    match result {
        CommandResult::Message(msg) => state.show_system_message(&msg),
        CommandResult::Clear => session.clear(),
        CommandResult::SetMode(mode) => {
            session.set_mode(mode);
            state.set_mode(mode);
        }
        CommandResult::OpenSuggestions => state.open_suggestions(),
        CommandResult::Exit => return false,
        CommandResult::Unknown(cmd) => state.show_system_message(&format!(
            "Unknown command: /{}\nType /help for available commands.",
            cmd
        )),
    }
    true
}

/// Run the TUI application
pub async fn run_tui(session: &mut Session, suggestions: Vec<String>) -> anyhow::Result<()> {
    let mut tui = TerminalSession::enter()?;

    let (ui_tx, mut ui_rx) = mpsc::channel::<UiMessage>(32);
    let mut state = TuiState::new(
        session.mode(),
        session.config().model_label.clone(),
        suggestions,
        ui_tx,
    );

    let mut session_rx = session.subscribe();
    let mut event_stream = EventStream::new();

    // Tick interval for animations (80ms for smooth spinner)
    let mut tick_interval = tokio::time::interval(std::time::Duration::from_millis(80));

    let mut pending_prompt: Option<String> = None;

    loop {
        match state.take_submission() {
            Some(Submission::Prompt(content)) => pending_prompt = Some(content),
            Some(Submission::Command(cmd)) => {
                if let Some(result) = execute_command(&cmd, session.mode()) {
                    if !apply_command(result, session, &mut state) {
                        break;
                    }
                }
            }
            None => {}
        }

        if let Some(content) = pending_prompt.take() {
            // Poll the send alongside terminal events until it completes
            {
                let mut send_future = std::pin::pin!(session.send(&content));
                loop {
                    tui.terminal().draw(|frame| state.render(frame))?;
                    let width = tui.width()?;

                    tokio::select! {
                        biased;

                        result = &mut send_future => {
                            if let Err(e) = result {
                                state.status = e.to_string();
                            }
                            break;
                        }

                        event = session_rx.recv() => {
                            match event {
                                Ok(event) => state.handle_session_event(event),
                                Err(e) => state.handle_recv_error(e),
                            }
                        }

                        event = event_stream.next() => {
                            match event {
                                Some(Ok(Event::Key(key))) => {
                                    if !state.handle_busy_action(key_to_action(key), width) {
                                        return Ok(());
                                    }
                                }
                                Some(Ok(Event::Paste(text))) => {
                                    state.input.handle_action(&Action::Paste(text), width);
                                }
                                Some(Ok(Event::Mouse(mouse))) => state.handle_mouse(mouse.kind),
                                Some(Err(e)) => return Err(anyhow::anyhow!("Event error: {}", e)),
                                None => return Ok(()),
                                _ => {}
                            }
                        }

                        _ = tick_interval.tick() => {}
                    }
                }
            }

            // Drain events published after the last poll
            loop {
                match session_rx.try_recv() {
                    Ok(event) => state.handle_session_event(event),
                    Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                        state.handle_recv_error(broadcast::error::RecvError::Lagged(skipped))
                    }
                    Err(_) => break,
                }
            }
            state.resync(session.messages());
            state.is_busy = session.is_busy();

            continue;
        }

        tui.terminal().draw(|frame| state.render(frame))?;
        let width = tui.width()?;

        tokio::select! {
            biased;

            event = session_rx.recv() => {
                match event {
                    Ok(event) => state.handle_session_event(event),
                    Err(e) => state.handle_recv_error(e),
                }
            }

            event = event_stream.next() => {
                match event {
                    Some(Ok(Event::Key(key))) => {
                        if !state.handle_action(key_to_action(key), width).await {
                            break;
                        }
                    }
                    Some(Ok(Event::Paste(text))) => {
                        state.handle_action(Action::Paste(text), width).await;
                    }
                    Some(Ok(Event::Mouse(mouse))) => state.handle_mouse(mouse.kind),
                    Some(Err(e)) => return Err(anyhow::anyhow!("Event error: {}", e)),
                    None => break,
                    _ => {}
                }
            }

            _ = tick_interval.tick() => {}

            msg = ui_rx.recv() => {
                match msg {
                    Some(UiMessage::Clear) => session.clear(),
                    Some(UiMessage::ToggleMode) => {
                        let mode = session.toggle_mode();
                        state.set_mode(mode);
                    }
                    Some(UiMessage::Quit) | None => break,
                }
            }
        }
    }

    // Terminal is restored when `tui` drops
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_state() -> (TuiState, mpsc::Receiver<UiMessage>) {
        let (tx, rx) = mpsc::channel(8);
        let state = TuiState::new(
            ChatMode::Stream,
            "DeepSeek V3".into(),
            vec!["First prompt".into(), "Second prompt".into()],
            tx,
        );
        (state, rx)
    }

    #[test]
    fn test_streaming_updates_replace_one_row() {
        let (mut state, _rx) = make_state();
        let user = Message::user("Hi");
        let mut reply = Message::assistant_streaming("Hel", "DeepSeek V3");

        state.handle_session_event(SessionEvent::SendStart {
            mode: ChatMode::Stream,
        });
        state.handle_session_event(SessionEvent::MessageAdded { message: user });
        state.handle_session_event(SessionEvent::MessageAdded {
            message: reply.clone(),
        });
        reply.content = "Hello".into();
        state.handle_session_event(SessionEvent::MessageUpdated {
            message: reply.clone(),
        });
        reply.is_streaming = false;
        state.handle_session_event(SessionEvent::MessageFinalized { message: reply });
        state.handle_session_event(SessionEvent::SendEnd { failed: false });

        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].content, "Hello");
        assert!(!state.messages[1].is_streaming);
        assert!(!state.is_busy);
    }

    #[test]
    fn test_cleared_event() {
        let (mut state, _rx) = make_state();
        state.show_system_message("notice");
        state.handle_session_event(SessionEvent::Cleared);
        assert!(state.messages.is_empty());
    }

    #[test]
    fn test_resync_after_lag() {
        let (mut state, _rx) = make_state();
        let messages = vec![Message::user("a"), Message::assistant("b", "m")];

        state.resync(&messages);
        assert!(state.messages.is_empty());

        state.handle_recv_error(broadcast::error::RecvError::Lagged(3));
        state.resync(&messages);
        assert_eq!(state.messages.len(), 2);
        assert!(!state.lagged);
    }

    #[test]
    fn test_submit_while_busy_keeps_input() {
        let (mut state, _rx) = make_state();
        state.is_busy = true;
        for c in "next".chars() {
            state.handle_busy_action(Action::Char(c), 80);
        }
        assert!(state.handle_busy_action(Action::Submit, 80));
        assert_eq!(state.input.content(), "next");
        assert!(state.status.contains("waiting"));
    }

    #[tokio::test]
    async fn test_submit_sends_message() {
        let (mut state, _rx) = make_state();
        for c in "hello".chars() {
            state.handle_action(Action::Char(c), 80).await;
        }
        state.handle_action(Action::Submit, 80).await;

        assert_eq!(
            state.take_submission(),
            Some(Submission::Prompt("hello".into()))
        );
        assert!(state.input.is_empty());
        assert_eq!(state.take_submission(), None);
    }

    #[tokio::test]
    async fn test_blank_submit_ignored() {
        let (mut state, _rx) = make_state();
        state.handle_action(Action::Char(' '), 80).await;
        state.handle_action(Action::Submit, 80).await;
        assert_eq!(state.take_submission(), None);
    }

    #[tokio::test]
    async fn test_buffered_second_enter_not_queued() {
        let (mut state, _rx) = make_state();
        for action in [
            Action::Char('a'),
            Action::Submit,
            Action::Char('b'),
            Action::Submit,
        ] {
            state.handle_action(action, 80).await;
        }

        assert_eq!(state.take_submission(), Some(Submission::Prompt("a".into())));
        assert_eq!(state.take_submission(), None);
        assert_eq!(state.input.content(), "b");
        assert!(state.status.contains("waiting"));
    }

    #[tokio::test]
    async fn test_suggestion_refused_while_input_pending() {
        let (mut state, _rx) = make_state();
        state.handle_action(Action::Char('a'), 80).await;
        state.handle_action(Action::Submit, 80).await;

        state.handle_action(Action::Suggest, 80).await;
        state.handle_action(Action::Submit, 80).await;

        assert_eq!(state.take_submission(), Some(Submission::Prompt("a".into())));
        assert_eq!(state.take_submission(), None);
    }

    #[tokio::test]
    async fn test_slash_input_becomes_command() {
        let (mut state, _rx) = make_state();
        state.input.handle_action(&Action::Paste("/mode sync".into()), 80);
        state.handle_action(Action::Submit, 80).await;
        assert_eq!(
            state.take_submission(),
            Some(Submission::Command("/mode sync".into()))
        );
    }

    #[tokio::test]
    async fn test_suggestion_popup_submits_choice() {
        let (mut state, _rx) = make_state();
        state.handle_action(Action::Suggest, 80).await;
        assert!(state.suggestion_selector.visible);

        state.handle_action(Action::Down, 80).await;
        state.handle_action(Action::Submit, 80).await;

        assert!(!state.suggestion_selector.visible);
        assert_eq!(
            state.take_submission(),
            Some(Submission::Prompt("Second prompt".into()))
        );
    }

    #[tokio::test]
    async fn test_ctrl_l_requests_clear() {
        let (mut state, mut rx) = make_state();
        state.handle_action(Action::Clear, 80).await;
        assert!(matches!(rx.try_recv(), Ok(UiMessage::Clear)));
    }
}
