// Configuration and logging
pub mod config;
pub mod logging;

// Execution service access
pub mod client;

// Status tracking
pub mod tracker;

// Presentation models
pub mod library;
pub mod steps;

// Terminal UI
pub mod app;
pub mod ui;

// One-shot commands
pub mod cli;

pub use client::HttpWorkflowClient;
pub use config::TrackerConfig;
pub use tracker::{spawn_tracker, TrackerHandle, TrackerOptions};
pub use workflow_tracker_sdk as sdk;
