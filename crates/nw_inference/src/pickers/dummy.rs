use async_trait::async_trait;

use nw_core::{Error, HeadlinePicker, Result};

/// Offline picker: the first candidate wins. Deterministic regardless of
/// the temperature argument.
pub struct DummyPicker;

#[async_trait]
impl HeadlinePicker for DummyPicker {
    async fn pick(&self, candidates: &[String], _temperature: Option<f32>) -> Result<String> {
        candidates
            .first()
            .cloned()
            .ok_or_else(|| Error::Picker("no candidates to pick from".to_string()))
    }
}
