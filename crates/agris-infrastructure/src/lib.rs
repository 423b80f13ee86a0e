pub mod backend;
pub mod dto;
pub mod login_preferences;
pub mod paths;

pub use crate::backend::BackendClient;
pub use crate::login_preferences::{LoginPreferences, LoginPreferencesStore};
pub use crate::paths::AgrisPaths;
