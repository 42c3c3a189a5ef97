//! Step presentation: affordances per (type, status) and the expanded-step selection
//!
//! Nothing here touches the network. Expanded details come only from the cached
//! [`StepStatus`].

use workflow_tracker_sdk::{ExecutionStatus, StepKind, StepStatus};

/// Colour family a step is drawn in; the UI maps it to terminal colours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Muted,
    Active,
    Success,
    Danger,
}

impl Tone {
    pub fn for_status(status: ExecutionStatus) -> Self {
        match status {
            ExecutionStatus::Pending => Tone::Muted,
            ExecutionStatus::Running => Tone::Active,
            ExecutionStatus::Completed => Tone::Success,
            ExecutionStatus::Failed => Tone::Danger,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepAffordance {
    /// Icon for the step type
    pub icon: &'static str,
    pub label: &'static str,
    /// Status marker drawn before the title
    pub glyph: &'static str,
    pub tone: Tone,
}

/// Icon and label for a step type. Unknown types get the document affordance.
pub fn kind_affordance(kind: &StepKind) -> (&'static str, &'static str) {
    match kind {
        StepKind::Search => ("⌕", "Search"),
        StepKind::Extract => ("⇣", "Extract"),
        StepKind::Analyze => ("◈", "Analyze"),
        StepKind::Aggregate => ("≡", "Aggregate"),
        StepKind::GenerateReport => ("▤", "Report"),
        StepKind::Other(_) => ("▢", "Document"),
    }
}

pub fn status_glyph(status: ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::Pending => "○",
        ExecutionStatus::Running => "▶",
        ExecutionStatus::Completed => "✓",
        ExecutionStatus::Failed => "✗",
    }
}

pub fn affordance(step: &StepStatus) -> StepAffordance {
    let (icon, label) = kind_affordance(&step.kind);
    StepAffordance {
        icon,
        label,
        glyph: status_glyph(step.status),
        tone: Tone::for_status(step.status),
    }
}

/// "850ms", "4.2s", "2m 05s"
pub fn format_duration(ms: u64) -> String {
    if ms < 1_000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else {
        let secs = ms / 1_000;
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// Label/value rows shown under an expanded step
pub fn step_details(step: &StepStatus) -> Vec<(&'static str, String)> {
    let mut rows = Vec::new();
    if let Some(description) = step.description.as_deref().filter(|d| !d.trim().is_empty()) {
        rows.push(("Description", description.to_string()));
    }
    if let StepKind::Other(tag) = &step.kind {
        rows.push(("Type", tag.clone()));
    }
    if let Some(error) = &step.error {
        rows.push(("Error", error.clone()));
    }
    if let Some(ms) = step.duration {
        rows.push(("Duration", format_duration(ms)));
    }
    if let Some(has_output) = step.has_output {
        let text = if has_output { "available" } else { "none" };
        rows.push(("Output", text.to_string()));
    }
    if rows.is_empty() {
        rows.push(("Details", "No further details".to_string()));
    }
    rows
}

/// Cursor plus at most one expanded step. Local to the open view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepSelection {
    cursor: usize,
    expanded: Option<usize>,
}

impl StepSelection {
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded == Some(index)
    }

    pub fn move_down(&mut self, len: usize) {
        if len > 0 && self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Expand the step under the cursor, collapsing any other
    pub fn toggle(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.toggle_at(self.cursor.min(len - 1));
    }

    pub fn toggle_at(&mut self, index: usize) {
        self.expanded = if self.expanded == Some(index) {
            None
        } else {
            Some(index)
        };
    }

    /// Keep the selection inside a step list that may have shrunk
    pub fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.reset();
            return;
        }
        self.cursor = self.cursor.min(len - 1);
        if self.expanded.is_some_and(|idx| idx >= len) {
            self.expanded = None;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
