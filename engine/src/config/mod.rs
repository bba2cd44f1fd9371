pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::{AppConfig, ConfigOverlay, ProviderKind};
