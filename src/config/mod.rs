mod loader;
mod source;
mod types;

pub use loader::{default_config_path, load_config};
pub use source::{FileCredentialSource, StaticCredentials};
pub use types::*;
