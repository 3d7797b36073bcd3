//! deepchat-tui: Terminal UI components
//!
//! Widgets and input mapping for the deepchat terminal client, built on
//! ratatui and crossterm.

pub mod input;
pub mod terminal;
pub mod theme;
pub mod widgets;

pub use terminal::TerminalSession;
pub use theme::Theme;
