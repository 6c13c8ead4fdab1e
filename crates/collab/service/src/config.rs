use serde::{Deserialize, Serialize};

/// Tuning knobs for the workflow service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Load/plan/commit cycles tried before a lost race is reported
    #[serde(default = "default_max_commit_attempts")]
    pub max_commit_attempts: u32,

    /// Capacity of the change broadcast channel
    #[serde(default = "default_notification_buffer")]
    pub notification_buffer: usize,
}

fn default_max_commit_attempts() -> u32 {
    5
}

fn default_notification_buffer() -> usize {
    256
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_commit_attempts: default_max_commit_attempts(),
            notification_buffer: default_notification_buffer(),
        }
    }
}
