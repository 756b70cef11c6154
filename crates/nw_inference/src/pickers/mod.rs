pub mod dummy;
pub mod openai;

pub use dummy::DummyPicker;
pub use openai::OpenAiPicker;

use std::sync::Arc;

use nw_core::config::PickerConfig;
use nw_core::HeadlinePicker;

/// Builds a picker from configuration. An API key selects the
/// chat-completions picker; without one the offline first-candidate
/// picker is used.
pub fn create_picker(config: &PickerConfig) -> Arc<dyn HeadlinePicker> {
    match config.api_key.as_deref() {
        Some(key) => Arc::new(OpenAiPicker::new(key, config)),
        None => Arc::new(DummyPicker),
    }
}
