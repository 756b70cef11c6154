use async_trait::async_trait;

use crate::error::Result;

/// Decides which of several candidate headlines is "the" headline. The
/// answer is a semantic judgment and is not guaranteed to be
/// byte-identical to any candidate, so callers must not assume
/// set-membership.
#[async_trait]
pub trait HeadlinePicker: Send + Sync {
    /// `temperature` overrides the picker's default determinism setting
    /// for this one call.
    async fn pick(&self, candidates: &[String], temperature: Option<f32>) -> Result<String>;
}
