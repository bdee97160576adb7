//! Error types for sizing runs.

use thiserror::Error;

/// Result type alias for sizing operations.
pub type SizingResult<T> = Result<T, SizingError>;

/// Errors that abort a sizing run. No partial results are returned.
#[derive(Debug, Error)]
pub enum SizingError {
    /// No machine set can host one of the workload's co-placement bundles.
    #[error(
        "workload {workload} cannot be scheduled on machine set {machine_set}: \
         {constraint} constraint; minimum viable machine set is \
         {min_cpu} CPU / {min_memory} GB memory"
    )]
    NotSchedulable {
        workload: String,
        machine_set: String,
        /// The failing dimension(s): "CPU", "memory", "disks", or a combination.
        constraint: String,
        min_cpu: u32,
        min_memory: u32,
    },

    /// Malformed caller input: missing platform, empty workloads, dangling
    /// service references, invalid resource values.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An internal invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_schedulable_message_names_workload_and_constraint() {
        let err = SizingError::NotSchedulable {
            workload: "db".to_string(),
            machine_set: "worker".to_string(),
            constraint: "CPU".to_string(),
            min_cpu: 102,
            min_memory: 24,
        };
        let msg = err.to_string();
        assert!(msg.contains("db"));
        assert!(msg.contains("worker"));
        assert!(msg.contains("CPU"));
        assert!(msg.contains("102"));
    }
}
