//! Notification rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, NotificationLevel};

const MAX_VISIBLE: usize = 3;

/// Newest notifications as an overlay above the footer
pub fn render_notifications(f: &mut Frame, app: &App, area: Rect) {
    let notifications = app.notifications.get_active();

    if notifications.is_empty() {
        return;
    }

    let visible: Vec<_> = notifications.iter().rev().take(MAX_VISIBLE).collect();
    let height = (visible.len() * 4) as u16;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(height)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Percentage(45)])
        .split(rows[1]);

    let notification_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(visible.iter().map(|_| Constraint::Length(4)).collect::<Vec<_>>())
        .split(columns[1]);

    for (idx, notification) in visible.iter().enumerate() {
        let (color, icon) = match notification.level {
            NotificationLevel::Error => (Color::Red, "✗"),
            NotificationLevel::Warning => (Color::Yellow, "⚠"),
            NotificationLevel::Info => (Color::Blue, "ℹ"),
            NotificationLevel::Success => (Color::Green, "✓"),
        };

        let text = vec![
            Line::from(vec![Span::styled(
                format!("{} {}", icon, notification.title),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )]),
            Line::from(notification.message.clone()),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(Color::Black));

        let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

        f.render_widget(Clear, notification_chunks[idx]);
        f.render_widget(paragraph, notification_chunks[idx]);
    }
}
