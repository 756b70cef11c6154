pub mod backends;

pub use backends::MemoryStore;

#[cfg(feature = "sqlite")]
pub use backends::SqliteStore;

pub mod prelude {
    pub use super::backends::*;
    pub use nw_core::ArticleStore;
}
