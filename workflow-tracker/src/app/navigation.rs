//! Keyboard handling per view

use crossterm::event::KeyCode;

use super::{App, View};

impl App {
    pub fn handle_key(&mut self, code: KeyCode) {
        // Delete confirmation modal captures everything
        if self.library.pending_confirmation().is_some() {
            match code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.cancel_delete(),
                _ => {}
            }
            return;
        }

        match self.current_view {
            View::Library => self.handle_library_key(code),
            View::Workflow { .. } => self.handle_workflow_key(code),
        }
    }

    fn handle_library_key(&mut self, code: KeyCode) {
        if self.library.is_filter_editing() {
            match code {
                KeyCode::Char(c) => self.library.push_filter_char(c),
                KeyCode::Backspace => self.library.pop_filter_char(),
                KeyCode::Enter => self.library.finish_filter(),
                KeyCode::Esc => self.library.clear_filter(),
                _ => {}
            }
            return;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.library.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.library.select_previous(),
            KeyCode::Enter => self.open_selected_workflow(),
            KeyCode::Char('d') => self.request_delete_selected(),
            KeyCode::Char('r') => self.refresh_library(),
            KeyCode::Char('/') => self.library.start_filter(),
            KeyCode::Esc if !self.library.filter().is_empty() => self.library.clear_filter(),
            KeyCode::Char('x') => {
                self.notifications.dismiss_latest();
            }
            _ => {}
        }
    }

    fn handle_workflow_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Char('b') => self.close_workflow(),
            KeyCode::Down | KeyCode::Char('j') => {
                let steps = self.visible_step_count();
                self.step_selection.move_down(steps);
            }
            KeyCode::Up | KeyCode::Char('k') => self.step_selection.move_up(),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected_step(),
            KeyCode::Char('c') => self.cancel_workflow(),
            KeyCode::Char('R') => self.retry_workflow(),
            KeyCode::Char('f') | KeyCode::Char('F') => self.refresh_workflow(),
            KeyCode::Char('x') => {
                self.notifications.dismiss_latest();
            }
            _ => {}
        }
    }
}
