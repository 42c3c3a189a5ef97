//! Reusable UI pieces: popups, colours, relative times

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use workflow_tracker_sdk::{ExecutionStatus, WorkflowSummary};

use crate::steps::Tone;

pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Muted => Color::Gray,
        Tone::Active => Color::Yellow,
        Tone::Success => Color::Green,
        Tone::Danger => Color::Red,
    }
}

pub fn status_color(status: ExecutionStatus) -> Color {
    tone_color(Tone::for_status(status))
}

/// "just now", "5m ago", "3h ago", "2d ago"
pub fn relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 60 {
        "just now".to_string()
    } else if secs < 3_600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3_600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

pub fn render_delete_confirmation(f: &mut Frame, area: Rect, workflow: &WorkflowSummary) {
    let popup_area = centered_rect(50, 25, area);

    let mut text = vec![
        Line::from(Span::styled(
            "Delete workflow?",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            workflow.title.clone(),
            Style::default().fg(Color::White),
        )),
    ];
    if let Some(report) = &workflow.report {
        text.push(Line::from(Span::styled(
            format!("Linked report: {}", report.display_name()),
            Style::default().fg(Color::DarkGray),
        )));
    }
    text.push(Line::from(""));
    text.push(Line::from(vec![
        Span::styled("[Y]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(" Delete  "),
        Span::styled("[N/Esc]", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" Keep"),
    ]));

    let dialog = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .style(Style::default().bg(Color::Black)),
        );

    f.render_widget(Clear, popup_area);
    f.render_widget(dialog, popup_area);
}

/// Helper to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = ratatui::layout::Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    ratatui::layout::Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
