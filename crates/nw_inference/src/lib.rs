pub mod pickers;

pub use pickers::{create_picker, DummyPicker, OpenAiPicker};

pub mod prelude {
    pub use super::pickers::{create_picker, DummyPicker, OpenAiPicker};
    pub use nw_core::{HeadlinePicker, Result};
}
