//! Workflow view: live status of one tracked workflow

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap},
    Frame,
};
use workflow_tracker_sdk::{StepStatus, WorkflowStatus};

use super::components::{status_color, tone_color};
use crate::app::App;
use crate::steps::{affordance, format_duration, step_details, StepSelection};
use crate::tracker::{PollPhase, TrackerSnapshot};

pub fn render_workflow(f: &mut Frame, area: Rect, app: &App) {
    let Some(snapshot) = &app.tracker_snapshot else {
        let placeholder = Paragraph::new("No workflow open")
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(placeholder, area);
        return;
    };

    let Some(status) = &snapshot.status else {
        render_waiting(f, area, snapshot);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(area);

    render_summary(f, chunks[0], status, snapshot);
    render_progress(f, chunks[1], status);
    render_steps(f, chunks[2], &status.steps, &app.step_selection);
    render_outcome(f, chunks[3], status, snapshot);
}

fn render_waiting(f: &mut Frame, area: Rect, snapshot: &TrackerSnapshot) {
    let mut lines = vec![Line::from("")];
    if snapshot.workflow_id.trim().is_empty() {
        lines.push(Line::from(Span::styled(
            "No workflow id; nothing to track",
            Style::default().fg(Color::DarkGray),
        )));
    } else if snapshot.streaming {
        lines.push(Line::from(Span::styled(
            "Waiting for the response stream to finish…",
            Style::default().fg(Color::DarkGray),
        )));
    } else if let Some(error) = &snapshot.error {
        lines.push(Line::from(vec![
            Span::styled("✗ ", Style::default().fg(Color::Red)),
            Span::styled(error.to_string(), Style::default().fg(Color::Red)),
        ]));
        lines.push(Line::from(Span::styled(
            "[f] Try again",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Loading workflow status…",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", snapshot.workflow_id));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn phase_label(snapshot: &TrackerSnapshot) -> (String, Color) {
    match snapshot.phase {
        PollPhase::Idle if snapshot.streaming => ("waiting for stream".to_string(), Color::DarkGray),
        PollPhase::Idle => ("idle".to_string(), Color::DarkGray),
        PollPhase::Polling if snapshot.in_flight > 0 => ("refreshing…".to_string(), Color::Yellow),
        PollPhase::Polling => ("live".to_string(), Color::Yellow),
        PollPhase::Settled => ("final".to_string(), Color::DarkGray),
    }
}

fn render_summary(f: &mut Frame, area: Rect, status: &WorkflowStatus, snapshot: &TrackerSnapshot) {
    let (phase, phase_color) = phase_label(snapshot);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                status.title.clone(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                status.status.as_str().to_uppercase(),
                Style::default()
                    .fg(status_color(status.status))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(format!("[{}]", phase), Style::default().fg(phase_color)),
        ]),
        Line::from(vec![
            Span::styled("Query: ", Style::default().fg(Color::Gray)),
            Span::styled(status.query.clone(), Style::default().fg(Color::White)),
        ]),
    ];
    if let Some(description) = &status.description {
        lines.push(Line::from(Span::styled(
            description.clone(),
            Style::default().fg(Color::DarkGray),
        )));
    }
    let mut meta = vec![
        Span::styled("Started: ", Style::default().fg(Color::Gray)),
        Span::raw(status.created_at.format("%Y-%m-%d %H:%M").to_string()),
    ];
    if let Some(completed_at) = status.completed_at {
        meta.push(Span::styled("  Finished: ", Style::default().fg(Color::Gray)));
        meta.push(Span::raw(completed_at.format("%Y-%m-%d %H:%M").to_string()));
    }
    if let Some(format) = &status.output_format {
        meta.push(Span::styled("  Output: ", Style::default().fg(Color::Gray)));
        meta.push(Span::raw(format.clone()));
    }
    lines.push(Line::from(meta));

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", status.id));
    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
}

fn render_progress(f: &mut Frame, area: Rect, status: &WorkflowStatus) {
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(status_color(status.status)).bg(Color::Black))
        .percent(u16::from(status.percent_complete()))
        .label(status.progress_line());
    f.render_widget(gauge, area);
}

fn render_steps(f: &mut Frame, area: Rect, steps: &[StepStatus], selection: &StepSelection) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Steps ({}) ", steps.len()));

    if steps.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No steps reported yet",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let mut items: Vec<ListItem> = Vec::new();
    for (pos, step) in steps.iter().enumerate() {
        let a = affordance(step);
        let is_selected = pos == selection.cursor();
        let is_expanded = selection.is_expanded(pos);
        let expand_icon = if is_expanded { "▼" } else { "▶" };

        let mut spans = vec![
            Span::raw(if is_selected { " › " } else { "   " }),
            Span::styled(format!("{} ", a.glyph), Style::default().fg(tone_color(a.tone))),
            Span::styled(format!("{} ", expand_icon), Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{} ", a.icon), Style::default().fg(Color::Cyan)),
            Span::styled(
                step.title.clone(),
                Style::default()
                    .fg(if is_selected { Color::White } else { Color::Gray })
                    .add_modifier(if is_selected {
                        Modifier::BOLD
                    } else {
                        Modifier::empty()
                    }),
            ),
            Span::styled(format!("  {}", a.label), Style::default().fg(Color::DarkGray)),
        ];
        if let Some(ms) = step.duration {
            spans.push(Span::styled(
                format!("  {}", format_duration(ms)),
                Style::default().fg(Color::DarkGray),
            ));
        }

        let mut lines = vec![Line::from(spans)];
        if is_expanded {
            for (label, value) in step_details(step) {
                let value_style = if label == "Error" {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(Color::White)
                };
                lines.push(Line::from(vec![
                    Span::raw("         "),
                    Span::styled(format!("{}: ", label), Style::default().fg(Color::Gray)),
                    Span::styled(value, value_style),
                ]));
            }
        }
        items.push(ListItem::new(lines));
    }

    f.render_widget(List::new(items).block(block), area);
}

fn render_outcome(f: &mut Frame, area: Rect, status: &WorkflowStatus, snapshot: &TrackerSnapshot) {
    let line = if let Some(report) = status.report_ready() {
        Line::from(vec![
            Span::styled(
                "✓ Report ready: ",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::styled(report.display_name().to_string(), Style::default().fg(Color::White)),
            Span::styled(format!(" ({})", report.id), Style::default().fg(Color::DarkGray)),
        ])
    } else if let Some(error) = &snapshot.error {
        Line::from(vec![
            Span::styled("✗ Status fetch failed: ", Style::default().fg(Color::Red)),
            Span::raw(error.to_string()),
            Span::styled("  showing last known status  [f] Refresh", Style::default().fg(Color::DarkGray)),
        ])
    } else if let Some(error) = &status.error {
        let at = status
            .failed_step_status()
            .map(|s| format!(" at \"{}\"", s.title))
            .unwrap_or_default();
        Line::from(vec![
            Span::styled(format!("✗ Failed{}: ", at), Style::default().fg(Color::Red)),
            Span::raw(error.clone()),
        ])
    } else if !snapshot.pending_actions.is_empty() {
        let actions: Vec<String> = snapshot.pending_actions.iter().map(|a| a.to_string()).collect();
        Line::from(Span::styled(
            format!("Sending {}…", actions.join(", ")),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from(Span::styled(
            format!("{} polls", snapshot.polls_issued),
            Style::default().fg(Color::DarkGray),
        ))
    };

    f.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}
