//! Article detail screen rendering
//!
//! Shows everything we know about one article: headline, byline, summary,
//! body excerpt and links.

use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::data::Article;

/// Builds the scrollable body of the detail view
fn detail_lines(article: &Article) -> Vec<Line<'static>> {
    let mut byline = vec![Span::styled(
        article.source_name.clone(),
        Style::default().fg(Color::Yellow),
    )];
    if let Some(ref author) = article.author {
        byline.push(Span::raw(" · "));
        byline.push(Span::raw(author.clone()));
    }
    if let Some(published_at) = article.published_at {
        byline.push(Span::raw(" · "));
        byline.push(Span::styled(
            published_at
                .with_timezone(&Local)
                .format("%a %b %d %Y, %H:%M")
                .to_string(),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let mut lines = vec![
        Line::from(Span::styled(
            article.title.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(byline),
        Line::from(""),
        Line::from(article.description.clone()),
    ];

    if let Some(ref content) = article.content {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            content.clone(),
            Style::default().fg(Color::Gray),
        )));
    }

    lines.push(Line::from(""));
    lines.push(link_line("Link", &article.url));
    if let Some(ref image_url) = article.image_url {
        lines.push(link_line("Image", image_url));
    }

    lines
}

fn link_line(label: &str, url: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<6} ", label), Style::default().fg(Color::DarkGray)),
        Span::styled(
            url.to_string(),
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
        ),
    ])
}

/// Renders the detail view for the article at `index`
pub fn render(frame: &mut Frame, app: &App, index: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let block = Block::default()
        .title(" Article ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let body = match app.feed.articles().get(index) {
        Some(article) => Paragraph::new(detail_lines(article))
            .wrap(Wrap { trim: false })
            .scroll((app.detail_scroll_offset, 0)),
        None => Paragraph::new("Article no longer available"),
    };
    frame.render_widget(body.block(block), chunks[0]);

    let help = Line::from(vec![
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Scroll  "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" Back  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" Quit"),
    ]);
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        chunks[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_article() -> Article {
        Article {
            title: "Harbour cleanup finishes early".to_string(),
            description: "Crews wrapped up a week ahead of schedule.".to_string(),
            url: "https://example.com/harbour".to_string(),
            image_url: Some("https://example.com/harbour.jpg".to_string()),
            published_at: Some(Utc.with_ymd_and_hms(2024, 7, 15, 14, 0, 0).unwrap()),
            source_name: "BBC News".to_string(),
            author: Some("Jane Reporter".to_string()),
            content: Some("Crews wrapped up... [+1200 chars]".to_string()),
        }
    }

    fn text_of(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_detail_lines_include_all_fields() {
        let text = text_of(&detail_lines(&sample_article()));

        assert!(text.contains("Harbour cleanup finishes early"));
        assert!(text.contains("BBC News · Jane Reporter"));
        assert!(text.contains("a week ahead of schedule"));
        assert!(text.contains("[+1200 chars]"));
        assert!(text.contains("https://example.com/harbour"));
        assert!(text.contains("https://example.com/harbour.jpg"));
    }

    #[test]
    fn test_detail_lines_skip_missing_optional_fields() {
        let mut article = sample_article();
        article.author = None;
        article.image_url = None;
        article.content = None;

        let text = text_of(&detail_lines(&article));

        assert!(!text.contains("Jane Reporter"));
        assert!(!text.contains("Image"));
        assert!(text.contains("Link"));
    }
}
