//! Command handler implementations for App

use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, warn};

use super::{App, AppCommand};

impl App {
    /// Drain every queued command without blocking
    pub fn process_commands(&mut self) {
        loop {
            match self.command_rx.try_recv() {
                Ok(cmd) => self.handle_command(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("Command channel closed");
                    break;
                }
            }
        }
    }

    /// Process a single command
    pub fn handle_command(&mut self, cmd: AppCommand) {
        match cmd {
            AppCommand::LibraryLoaded(result) => {
                if let Err(e) = &result {
                    self.notifications.error("Failed to load workflows", e.to_string());
                }
                self.library.finish_load(result);
                debug!(count = self.library.items().len(), "Library updated");
            }

            AppCommand::WorkflowDeleted {
                workflow_id,
                title,
                result,
            } => {
                let removed = self.library.finish_delete(&workflow_id, &result);
                match result {
                    Ok(()) if removed => {
                        self.notifications.success("Workflow deleted", title);
                    }
                    Ok(()) => {}
                    Err(e) => {
                        self.notifications
                            .error(format!("Could not delete \"{}\"", title), e.to_string());
                    }
                }
            }
        }
    }
}
