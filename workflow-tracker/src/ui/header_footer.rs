//! Header and footer rendering functions

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, View};

fn key(label: &'static str) -> Span<'static> {
    Span::styled(label, Style::default().add_modifier(Modifier::BOLD))
}

pub fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let title = match &app.current_view {
        View::Library => "Workflow Tracker - Library".to_string(),
        View::Workflow { workflow_id } => format!("Workflow Tracker - {}", workflow_id),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            title,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("      "),
        Span::styled(app.service_label.clone(), Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

pub fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let footer_text = if app.library.pending_confirmation().is_some() {
        Line::from(vec![key("[Y]"), Span::raw(" Delete  "), key("[N/Esc]"), Span::raw(" Keep")])
    } else {
        match &app.current_view {
            View::Library if app.library.is_filter_editing() => Line::from(vec![
                Span::styled(
                    "TYPE",
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" to filter  "),
                key("[Enter]"),
                Span::raw(" Keep  "),
                key("[Esc]"),
                Span::raw(" Clear"),
            ]),
            View::Library => Line::from(vec![
                key("[↑↓/jk]"),
                Span::raw(" Navigate  "),
                key("[Enter]"),
                Span::raw(" Open  "),
                key("[d]"),
                Span::raw(" Delete  "),
                key("[r]"),
                Span::raw(" Refresh  "),
                key("[/]"),
                Span::raw(" Filter  "),
                key("[Q]"),
                Span::raw(" Quit"),
            ]),
            View::Workflow { .. } => {
                let mut spans = vec![
                    key("[↑↓/jk]"),
                    Span::raw(" Navigate  "),
                    key("[Enter]"),
                    Span::raw(" Expand/Collapse  "),
                    key("[c]"),
                    Span::raw(" Cancel  "),
                ];
                if app.retry_available() {
                    spans.push(key("[Shift+R]"));
                    spans.push(Span::raw(" Retry  "));
                }
                spans.extend([
                    key("[f]"),
                    Span::raw(" Refresh  "),
                    key("[Esc/b]"),
                    Span::raw(" Back  "),
                    key("[Q]"),
                    Span::raw(" Quit"),
                ]);
                Line::from(spans)
            }
        }
    };

    let footer = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}
