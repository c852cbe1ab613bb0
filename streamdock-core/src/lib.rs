pub mod catalog;
pub mod password;
pub mod state;
pub mod store;
pub mod system;

pub use catalog::{PLATFORMS, PlatformEntry};
pub use state::{AppState, Credential, Profile, Settings};
pub use store::{DEFAULT_PROFILE, Store, StoreError};
pub use system::{ActionRunner, HostRunner, SystemAction, SystemError};

/// Default location of the persisted launcher state.
pub const DEFAULT_CONFIG_PATH: &str = "/tmp/streamdock_config.json";
