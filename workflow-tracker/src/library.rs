//! Workflow library: the bulk-loaded list of workflow summaries
//!
//! The cached list is the only source; groups are recomputed from it on demand.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::collections::HashSet;
use workflow_tracker_sdk::{ApiResult, ExecutionStatus, WorkflowSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryGroup {
    Active,
    Completed,
    Failed,
}

impl LibraryGroup {
    pub fn of(status: ExecutionStatus) -> Self {
        match status {
            ExecutionStatus::Pending | ExecutionStatus::Running => LibraryGroup::Active,
            ExecutionStatus::Completed => LibraryGroup::Completed,
            ExecutionStatus::Failed => LibraryGroup::Failed,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            LibraryGroup::Active => "Active",
            LibraryGroup::Completed => "Completed",
            LibraryGroup::Failed => "Failed",
        }
    }
}

/// Display buckets borrowed from the cached list
#[derive(Debug, Default)]
pub struct LibraryGroups<'a> {
    pub active: Vec<&'a WorkflowSummary>,
    pub completed: Vec<&'a WorkflowSummary>,
    pub failed: Vec<&'a WorkflowSummary>,
}

impl<'a> LibraryGroups<'a> {
    pub fn len(&self) -> usize {
        self.active.len() + self.completed.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-empty groups in display order
    pub fn sections(&self) -> Vec<(LibraryGroup, &[&'a WorkflowSummary])> {
        [
            (LibraryGroup::Active, self.active.as_slice()),
            (LibraryGroup::Completed, self.completed.as_slice()),
            (LibraryGroup::Failed, self.failed.as_slice()),
        ]
        .into_iter()
        .filter(|(_, items)| !items.is_empty())
        .collect()
    }

    /// Flattened in display order; selection indexes into this
    pub fn ordered(&self) -> Vec<&'a WorkflowSummary> {
        self.active
            .iter()
            .chain(self.completed.iter())
            .chain(self.failed.iter())
            .copied()
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct WorkflowLibrary {
    items: Vec<WorkflowSummary>,
    loading: bool,
    loaded_once: bool,
    error: Option<String>,
    pending_deletes: HashSet<String>,
    /// Deleted after the in-flight load was requested; its response may still list them
    deleted_during_load: HashSet<String>,
    selected: usize,
    filter: String,
    filter_editing: bool,
    confirm_delete: Option<String>,
}

impl WorkflowLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[WorkflowSummary] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_loaded(&self) -> bool {
        self.loaded_once
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// First load for a freshly shown view. Returns true if a load should start.
    pub fn mount(&mut self) -> bool {
        if self.loaded_once {
            return false;
        }
        self.request_load()
    }

    /// Returns false while a load is already outstanding; the request is dropped
    pub fn request_load(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        self.deleted_during_load.clear();
        true
    }

    pub fn finish_load(&mut self, result: ApiResult<Vec<WorkflowSummary>>) {
        self.loading = false;
        self.loaded_once = true;
        let deleted = std::mem::take(&mut self.deleted_during_load);
        match result {
            Ok(mut items) => {
                items.retain(|w| !deleted.contains(&w.id));
                items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                self.items = items;
                self.error = None;
                self.clamp_selection();
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
    }

    /// Mark a delete as in flight. Returns false if one is already running for `id`.
    pub fn begin_delete(&mut self, id: &str) -> bool {
        self.pending_deletes.insert(id.to_string())
    }

    pub fn is_deleting(&self, id: &str) -> bool {
        self.pending_deletes.contains(id)
    }

    /// Drop the row only once the server confirmed the delete
    pub fn finish_delete(&mut self, id: &str, result: &ApiResult<()>) -> bool {
        self.pending_deletes.remove(id);
        if result.is_err() {
            return false;
        }
        if self.loading {
            self.deleted_during_load.insert(id.to_string());
        }
        self.items.retain(|w| w.id != id);
        self.clamp_selection();
        true
    }

    fn matches(&self, matcher: &SkimMatcherV2, workflow: &WorkflowSummary) -> bool {
        let haystack = format!("{} {}", workflow.title, workflow.query);
        matcher.fuzzy_match(&haystack, &self.filter).is_some()
    }

    pub fn filtered(&self) -> Vec<&WorkflowSummary> {
        if self.filter.is_empty() {
            return self.items.iter().collect();
        }
        let matcher = SkimMatcherV2::default();
        self.items
            .iter()
            .filter(|w| self.matches(&matcher, w))
            .collect()
    }

    pub fn groups(&self) -> LibraryGroups<'_> {
        let mut groups = LibraryGroups::default();
        for workflow in self.filtered() {
            match LibraryGroup::of(workflow.status) {
                LibraryGroup::Active => groups.active.push(workflow),
                LibraryGroup::Completed => groups.completed.push(workflow),
                LibraryGroup::Failed => groups.failed.push(workflow),
            }
        }
        groups
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_workflow(&self) -> Option<&WorkflowSummary> {
        self.groups().ordered().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let len = self.groups().len();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let len = self.groups().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn is_filter_editing(&self) -> bool {
        self.filter_editing
    }

    pub fn start_filter(&mut self) {
        self.filter_editing = true;
    }

    pub fn finish_filter(&mut self) {
        self.filter_editing = false;
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter.push(c);
        self.selected = 0;
    }

    pub fn pop_filter_char(&mut self) {
        self.filter.pop();
        self.clamp_selection();
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
        self.filter_editing = false;
        self.clamp_selection();
    }

    /// Ask for confirmation before deleting the selected workflow
    pub fn request_delete(&mut self) -> bool {
        let Some(id) = self.selected_workflow().map(|w| w.id.clone()) else {
            return false;
        };
        if self.is_deleting(&id) {
            return false;
        }
        self.confirm_delete = Some(id);
        true
    }

    pub fn pending_confirmation(&self) -> Option<&WorkflowSummary> {
        let id = self.confirm_delete.as_deref()?;
        self.items.iter().find(|w| w.id == id)
    }

    /// Id the user agreed to delete
    pub fn take_confirmed(&mut self) -> Option<String> {
        self.confirm_delete.take()
    }

    pub fn dismiss_confirmation(&mut self) {
        self.confirm_delete = None;
    }
}
