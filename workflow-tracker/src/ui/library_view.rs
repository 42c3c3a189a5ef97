//! Library view: workflows grouped into active, completed and failed

use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use workflow_tracker_sdk::WorkflowSummary;

use super::components::{relative_age, status_color};
use crate::app::App;
use crate::steps::status_glyph;

pub fn render_library(f: &mut Frame, area: Rect, app: &App) {
    let library = &app.library;
    let show_filter = library.is_filter_editing() || !library.filter().is_empty();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if show_filter {
            vec![Constraint::Length(1), Constraint::Min(0)]
        } else {
            vec![Constraint::Length(0), Constraint::Min(0)]
        })
        .split(area);

    if show_filter {
        let cursor = if library.is_filter_editing() { "_" } else { "" };
        let filter = Paragraph::new(Line::from(vec![
            Span::styled(" / ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(format!("{}{}", library.filter(), cursor)),
        ]));
        f.render_widget(filter, chunks[0]);
    }

    let title = if library.is_loading() {
        " Workflows (loading…) ".to_string()
    } else {
        format!(" Workflows ({}) ", library.items().len())
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner_area = block.inner(chunks[1]);
    f.render_widget(block, chunks[1]);

    let groups = library.groups();
    if groups.is_empty() {
        let message = if !library.has_loaded() {
            Line::from(Span::styled("Loading workflows…", Style::default().fg(Color::DarkGray)))
        } else if let Some(error) = library.error() {
            Line::from(vec![
                Span::styled("✗ ", Style::default().fg(Color::Red)),
                Span::styled(error.to_string(), Style::default().fg(Color::Red)),
                Span::styled("   [R] Retry", Style::default().fg(Color::DarkGray)),
            ])
        } else if !library.filter().is_empty() {
            Line::from(Span::styled("No workflows match the filter", Style::default().fg(Color::DarkGray)))
        } else {
            Line::from(Span::styled("No workflows yet", Style::default().fg(Color::DarkGray)))
        };
        f.render_widget(Paragraph::new(vec![Line::from(""), message]), inner_area);
        return;
    }

    let now = Utc::now();
    let mut items: Vec<ListItem> = Vec::new();
    if let Some(error) = library.error() {
        items.push(ListItem::new(Line::from(Span::styled(
            format!(" Refresh failed: {}", error),
            Style::default().fg(Color::Red),
        ))));
    }

    let mut position = 0;
    for (group, workflows) in groups.sections() {
        items.push(ListItem::new(Line::from(Span::styled(
            format!(" {} ({})", group.title(), workflows.len()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))));

        for workflow in workflows {
            let is_selected = position == library.selected_index();
            let deleting = library.is_deleting(&workflow.id);
            items.push(workflow_row(workflow, is_selected, deleting, now));
            position += 1;
        }
        items.push(ListItem::new(Line::from("")));
    }

    f.render_widget(List::new(items), inner_area);
}

fn workflow_row(
    workflow: &WorkflowSummary,
    is_selected: bool,
    deleting: bool,
    now: chrono::DateTime<Utc>,
) -> ListItem<'static> {
    let bullet = if is_selected { "▶" } else { " " };
    let title_style = Style::default()
        .fg(if is_selected { Color::White } else { Color::Gray })
        .add_modifier(if is_selected {
            Modifier::BOLD
        } else {
            Modifier::empty()
        });

    let mut first = vec![
        Span::raw(format!(" {} ", bullet)),
        Span::styled(
            format!("{} ", status_glyph(workflow.status)),
            Style::default().fg(status_color(workflow.status)),
        ),
        Span::styled(workflow.title.clone(), title_style),
    ];
    if deleting {
        first.push(Span::styled("  deleting…", Style::default().fg(Color::Yellow)));
    }

    let mut details = vec![format!("     {}", relative_age(workflow.created_at, now))];
    if workflow.status.is_active() && workflow.total_steps > 0 {
        details.push(format!(
            "step {}/{} · {}%",
            workflow.display_step(),
            workflow.total_steps,
            workflow.percent_complete()
        ));
    }
    match workflow.sources.len() {
        0 => {}
        1 => details.push("1 source".to_string()),
        n => details.push(format!("{} sources", n)),
    }

    let mut second = vec![Span::styled(details.join(" · "), Style::default().fg(Color::DarkGray))];
    if let Some(report) = &workflow.report {
        second.push(Span::styled(
            format!(" · report: {}", report.display_name()),
            Style::default().fg(Color::Green),
        ));
    }
    if let Some(error) = &workflow.error {
        second.push(Span::styled(
            format!(" · {}", error),
            Style::default().fg(Color::Red),
        ));
    }

    ListItem::new(vec![Line::from(first), Line::from(second)])
}
