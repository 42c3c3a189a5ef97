//! Application view routing

/// Application view/route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Grouped list of every workflow
    Library,
    /// Live tracker for one workflow
    Workflow { workflow_id: String },
}
