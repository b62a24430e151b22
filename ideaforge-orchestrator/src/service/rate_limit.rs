//! Per-project run rate limit

use std::time::Duration;
use uuid::Uuid;

use crate::store::{StoreError, WorkflowStore};

/// At most `max_runs` runs may be started for a project within `window`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_runs: u32,
    pub window: Duration,
}

impl RateLimit {
    pub fn new(max_runs: u32, window: Duration) -> Self {
        Self { max_runs, window }
    }

    /// Whether one more run may start now
    pub async fn allows(
        &self,
        store: &dyn WorkflowStore,
        project_id: Uuid,
    ) -> Result<bool, StoreError> {
        let window =
            chrono::Duration::from_std(self.window).unwrap_or_else(|_| chrono::Duration::zero());
        let since = chrono::Utc::now() - window;

        let recent = store.count_runs_since(project_id, since).await?;
        Ok(recent < i64::from(self.max_runs))
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryWorkflowStore;
    use ideaforge_core::domain::run::Run;

    #[tokio::test]
    async fn test_fourth_run_in_window_is_refused() {
        let store = MemoryWorkflowStore::new();
        let limit = RateLimit::default();
        let project = Uuid::new_v4();

        for _ in 0..3 {
            assert!(limit.allows(&store, project).await.unwrap());
            store.create_run(project).await.unwrap();
        }
        assert!(!limit.allows(&store, project).await.unwrap());

        // other projects are unaffected
        assert!(limit.allows(&store, Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_runs_outside_window_do_not_count() {
        let store = MemoryWorkflowStore::new();
        let limit = RateLimit::default();
        let project = Uuid::new_v4();

        for version in 1..=3 {
            let mut run = Run::start(project, version);
            run.started_at = chrono::Utc::now() - chrono::Duration::seconds(120);
            store.insert_run(run).await;
        }

        assert!(limit.allows(&store, project).await.unwrap());
    }
}
