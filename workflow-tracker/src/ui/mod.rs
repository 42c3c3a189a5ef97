//! UI rendering functions for the workflow tracker TUI

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::app::{App, View};

mod components;
mod header_footer;
mod library_view;
mod notifications;
mod workflow_view;

pub use components::{centered_rect, relative_age, render_delete_confirmation};
pub use header_footer::{render_footer, render_header};
pub use library_view::render_library;
pub use notifications::render_notifications;
pub use workflow_view::render_workflow;

/// Main UI rendering function - orchestrates all view rendering
pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, chunks[0], app);

    match &app.current_view {
        View::Library => render_library(f, chunks[1], app),
        View::Workflow { .. } => render_workflow(f, chunks[1], app),
    }

    render_footer(f, chunks[2], app);

    render_notifications(f, app, chunks[1]);

    if let Some(workflow) = app.library.pending_confirmation() {
        let area = f.area();
        render_delete_confirmation(f, area, workflow);
    }
}
