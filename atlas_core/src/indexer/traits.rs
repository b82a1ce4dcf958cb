use async_trait::async_trait;

use super::models::RunContext;
use crate::Result;

/// One registered index variant, polymorphic over entity kind.
///
/// The orchestrator runs every registered index against every job; an index
/// that does not recognize the job's entity kind returns `Ok(())` without
/// side effects.
#[async_trait]
pub trait EntityIndex: Send + Sync {
    /// Stable index name, used in log fields.
    fn name(&self) -> &'static str;

    /// Process one entity. Errors are per-job: the caller logs them and moves
    /// on to the next job.
    async fn process(&self, ctx: &RunContext, entity_type: &str, entity_id: &str) -> Result<()>;
}
