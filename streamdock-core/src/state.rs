use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Application-wide scalar configuration.
///
/// Every field carries its own serde default so that a wholesale
/// replacement with fields omitted resets them to the type's zero value
/// instead of failing to parse. Hard-coded startup defaults live in the
/// `Default` impl and are merged over older files at load time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub interface_scale: f64,
    #[serde(default)]
    pub brightness: i64,
    #[serde(default)]
    pub gpu_acceleration: bool,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub active_profile: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interface_scale: 1.0,
            brightness: 50,
            gpu_acceleration: true,
            language: "en_US".to_owned(),
            theme: "dark".to_owned(),
            active_profile: "default".to_owned(),
        }
    }
}

/// A platform-scoped login. The password field holds a salted one-way
/// digest once the credential has passed through the store; plaintext is
/// only ever in flight, never at rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

/// A named bundle of per-platform credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub logins: BTreeMap<String, Credential>,
}

impl Profile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logins: BTreeMap::new(),
        }
    }
}

/// The root persisted aggregate.
///
/// The served front-end works against the flat `saved_logins` map; the
/// desktop front-end works against `profiles` keyed by
/// `settings.active_profile`. Both share settings, favorites and the UI
/// flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppState {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub saved_logins: BTreeMap<String, Credential>,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
    #[serde(default)]
    pub favorites: BTreeSet<String>,
    #[serde(default)]
    pub active_tab: String,
    #[serde(default)]
    pub cinema_mode: bool,
}
