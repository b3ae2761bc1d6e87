//! Article list screen rendering
//!
//! Renders the main headline list with a header, an error banner when the
//! initial load failed, the scrolling list itself, and a status footer showing
//! load-more progress and transient notifications.

use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::feed::{FeedPhase, OFFLINE_BANNER};

/// Splits the screen into header, banner, list, status and help rows
fn screen_layout(area: Rect, has_banner: bool) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),                            // Header
            Constraint::Length(if has_banner { 1 } else { 0 }), // Error banner
            Constraint::Min(3),                               // Article list
            Constraint::Length(1),                            // Load-more status
            Constraint::Length(1),                            // Help text
        ])
        .split(area)
        .to_vec()
}

/// Number of article rows the list shows in a screen of this size
pub fn visible_article_rows(area: Rect, app: &App) -> usize {
    let chunks = screen_layout(area, app.feed.banner().is_some());
    chunks[2].height.saturating_sub(2) as usize
}

/// Short relative age, e.g. "5m ago"
pub fn format_age(published_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - published_at;
    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_days() < 1 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        format!("{}d ago", elapsed.num_days())
    }
}

/// First and one-past-last article index shown for the current selection
fn list_window(selected: usize, len: usize, rows: usize) -> (usize, usize) {
    if rows == 0 || len == 0 {
        return (0, 0);
    }
    let start = selected.saturating_sub(rows - 1).min(len.saturating_sub(1));
    (start, (start + rows).min(len))
}

/// Truncates `text` to `width` characters, marking the cut with an ellipsis
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Renders the article list screen
///
/// # Arguments
/// * `frame` - The ratatui Frame to render to
/// * `app` - The application state containing the feed and selection
pub fn render_article_list(frame: &mut Frame, app: &App) {
    let chunks = screen_layout(frame.area(), app.feed.banner().is_some());

    render_header(frame, app, chunks[0]);
    render_banner(frame, app, chunks[1]);
    render_list(frame, app, chunks[2]);
    render_status(frame, app, chunks[3]);
    render_help(frame, app, chunks[4]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let time_str = Local::now().format("%a %b %d, %H:%M").to_string();

    let mut spans = vec![
        Span::styled(
            "HEADLINES",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(time_str, Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(
            format!("{} articles", app.article_count()),
            Style::default().fg(Color::Yellow),
        ),
    ];
    if app.feed.is_refreshing() {
        spans.push(Span::styled(
            "  ⟳ Refreshing…",
            Style::default().fg(Color::Cyan),
        ));
    }

    let separator = "─".repeat((area.width as usize).saturating_sub(2));
    let lines = vec![
        Line::from(spans),
        Line::from(Span::styled(separator, Style::default().fg(Color::DarkGray))),
    ];

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_banner(frame: &mut Frame, app: &App, area: Rect) {
    let Some(banner) = app.feed.banner() else {
        return;
    };

    // Offline mode still has content; a bare failure does not
    let style = if banner == OFFLINE_BANNER {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default().fg(Color::White).bg(Color::Red)
    };

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(format!(" ⚠ {} ", banner), style))),
        area,
    );
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let articles = app.feed.articles();
    let rows = area.height.saturating_sub(2) as usize;
    let width = area.width.saturating_sub(4) as usize;
    let now = Utc::now();

    let block = Block::default()
        .title(" Top Headlines ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if articles.is_empty() {
        let message = match app.feed.phase() {
            FeedPhase::Degraded => "No articles to show. Press r to retry.",
            _ => "No headlines right now.",
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            message,
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let (start, end) = list_window(app.selected_index, articles.len(), rows);
    let mut lines: Vec<Line> = Vec::with_capacity(end - start);

    for (index, article) in articles.iter().enumerate().take(end).skip(start) {
        let is_selected = index == app.selected_index;
        let cursor = if is_selected { "\u{25B8} " } else { "  " }; // ▸ or space

        let meta = match article.published_at {
            Some(published_at) => format!("  {} · {}", article.source_name, format_age(published_at, now)),
            None => format!("  {}", article.source_name),
        };
        let title_width = width.saturating_sub(meta.chars().count()).max(10);

        let title_style = if is_selected {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let cursor_style = if is_selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };

        lines.push(Line::from(vec![
            Span::styled(cursor, cursor_style),
            Span::styled(truncate(&article.title, title_width), title_style),
            Span::styled(meta, Style::default().fg(Color::DarkGray)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.feed.is_loading_more() {
        Line::from(Span::styled(
            "  ⟳ Loading more…",
            Style::default().fg(Color::Cyan),
        ))
    } else if !app.feed.pagination().has_more && app.article_count() > 0 {
        Line::from(Span::styled(
            "  — End of feed —",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from("")
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// Renders the help text at the bottom of the screen, or the current notice
fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(notice) = app.feed.notice() {
        let line = Line::from(vec![
            Span::styled(
                format!("✖ {}", notice.message),
                Style::default().fg(Color::Red),
            ),
            Span::styled("  (x to dismiss)", Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let mut help_spans = vec![
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Navigate  "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Read  "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" Refresh  "),
        Span::styled("?", Style::default().fg(Color::Yellow)),
        Span::raw(" Help  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" Quit"),
    ];

    // Add data freshness indicator
    if let Some(updated) = app.feed.last_updated() {
        let mins_ago = (Utc::now() - updated).num_minutes();
        let freshness_text = if mins_ago < 1 {
            " │ Updated: just now".to_string()
        } else if mins_ago < 60 {
            format!(" │ Updated: {}m ago", mins_ago)
        } else {
            format!(" │ Updated: {}h ago", mins_ago / 60)
        };
        help_spans.push(Span::styled(
            freshness_text,
            Style::default().fg(Color::DarkGray),
        ));
    }

    let paragraph =
        Paragraph::new(Line::from(help_spans)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}
