//! UI rendering module for the headlines reader
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod article_detail;
pub mod article_list;
pub mod help_overlay;

pub use article_detail::render as render_article_detail;
pub use article_list::{render_article_list, visible_article_rows};
pub use help_overlay::render as render_help_overlay;
