//! The configuration store: one mutex-guarded `AppState` plus its JSON
//! file. All reads and writes go through accessor methods here; a mutation
//! and its persistence happen under a single write-lock hold, so settings,
//! credentials and the on-disk copy change as one unit.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    catalog, password,
    state::{AppState, Credential, Profile, Settings},
};

/// Sanity bound on the config file; the persisted state is tiny, so
/// anything bigger is treated as unreadable.
pub const MAX_CONFIG_BYTES: u64 = 256 * 1024;

/// Profile a dangling `active_profile` reference falls back to.
pub const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),
    #[error("unknown profile: {0}")]
    UnknownProfile(String),
    #[error("profile name cannot be empty")]
    EmptyProfileName,
    #[error(transparent)]
    Password(#[from] password::PasswordError),
}

#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    state: RwLock<AppState>,
}

impl Store {
    /// Open the store backed by `path`.
    ///
    /// A missing or unreadable file leaves the hard-coded defaults in
    /// place; malformed contents are logged and recovered best-effort.
    /// Neither case is an error.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = load_state(&path);
        if state.settings.active_profile != DEFAULT_PROFILE
            && !state.profiles.contains_key(&state.settings.active_profile)
        {
            warn!(
                "active profile '{}' does not exist, operations will fall back to '{}'",
                state.settings.active_profile, DEFAULT_PROFILE
            );
        }
        Self {
            path,
            state: RwLock::new(state),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full copy of the current aggregate.
    pub fn snapshot(&self) -> AppState {
        self.read().clone()
    }

    // Settings -----------------------------------------------------------

    pub fn settings(&self) -> Settings {
        self.read().settings.clone()
    }

    /// Replace the settings sub-object wholesale and persist. No merge and
    /// no range validation; fields the caller omitted arrive here already
    /// reset to their zero values.
    pub fn replace_settings(&self, settings: Settings) {
        let mut state = self.write();
        state.settings = settings;
        self.persist(&state);
    }

    // Flat credentials (served front-end) --------------------------------

    /// Credential stored for `platform`, or an empty default if none is.
    pub fn credential(&self, platform: &str) -> Result<Credential, StoreError> {
        ensure_known(platform)?;
        Ok(self
            .read()
            .saved_logins
            .get(platform)
            .cloned()
            .unwrap_or_default())
    }

    /// Store or remove the credential for `platform`: `remember == true`
    /// hashes the password and stores the entry, `remember == false`
    /// removes any existing entry.
    pub fn set_credential(&self, platform: &str, credential: Credential) -> Result<(), StoreError> {
        ensure_known(platform)?;
        let stored = hash_for_storage(credential)?;
        let mut state = self.write();
        match stored {
            Some(credential) => {
                state.saved_logins.insert(platform.to_owned(), credential);
            }
            None => {
                state.saved_logins.remove(platform);
            }
        }
        self.persist(&state);
        Ok(())
    }

    /// Check `plaintext` against the stored digest for `platform`.
    /// Absent credentials verify as `false`.
    pub fn verify_credential(&self, platform: &str, plaintext: &str) -> Result<bool, StoreError> {
        ensure_known(platform)?;
        let digest = match self.read().saved_logins.get(platform) {
            Some(credential) => credential.password.clone(),
            None => return Ok(false),
        };
        Ok(password::verify(&digest, plaintext))
    }

    pub fn clear_credentials(&self) {
        let mut state = self.write();
        state.saved_logins.clear();
        self.persist(&state);
    }

    // Profiles (desktop front-end) ---------------------------------------

    pub fn profile_names(&self) -> Vec<String> {
        self.read().profiles.keys().cloned().collect()
    }

    /// Name of the profile operations actually act on: the configured one
    /// if it exists, [`DEFAULT_PROFILE`] otherwise. The configured value is
    /// left untouched until a profile mutation resolves the fallback.
    pub fn active_profile(&self) -> String {
        let state = self.read();
        effective_active_profile(&state).to_owned()
    }

    /// Insert an empty-credentials profile and make it active. Re-creating
    /// an existing profile keeps its logins and just switches to it. There
    /// is no rename and no delete.
    pub fn create_profile(&self, name: &str) -> Result<(), StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::EmptyProfileName);
        }
        let mut state = self.write();
        state
            .profiles
            .entry(name.to_owned())
            .or_insert_with(|| Profile::named(name));
        state.settings.active_profile = name.to_owned();
        self.persist(&state);
        Ok(())
    }

    pub fn switch_profile(&self, name: &str) -> Result<(), StoreError> {
        let mut state = self.write();
        if !state.profiles.contains_key(name) {
            return Err(StoreError::UnknownProfile(name.to_owned()));
        }
        state.settings.active_profile = name.to_owned();
        self.persist(&state);
        Ok(())
    }

    /// Credential stored for `platform` under the active profile, or an
    /// empty default if none is.
    pub fn profile_credential(&self, platform: &str) -> Result<Credential, StoreError> {
        ensure_known(platform)?;
        let state = self.read();
        Ok(state
            .profiles
            .get(effective_active_profile(&state))
            .and_then(|profile| profile.logins.get(platform))
            .cloned()
            .unwrap_or_default())
    }

    /// Profile-scoped counterpart of [`Store::set_credential`].
    pub fn set_profile_credential(
        &self,
        platform: &str,
        credential: Credential,
    ) -> Result<(), StoreError> {
        ensure_known(platform)?;
        let stored = hash_for_storage(credential)?;
        let mut state = self.write();
        let profile = active_profile_mut(&mut state);
        match stored {
            Some(credential) => {
                profile.logins.insert(platform.to_owned(), credential);
            }
            None => {
                profile.logins.remove(platform);
            }
        }
        self.persist(&state);
        Ok(())
    }

    /// Check `plaintext` against the active profile's digest for
    /// `platform`. Absent credentials verify as `false`.
    pub fn verify_profile_credential(
        &self,
        platform: &str,
        plaintext: &str,
    ) -> Result<bool, StoreError> {
        ensure_known(platform)?;
        let state = self.read();
        let digest = state
            .profiles
            .get(effective_active_profile(&state))
            .and_then(|profile| profile.logins.get(platform))
            .map(|credential| credential.password.clone());
        drop(state);
        Ok(digest.is_some_and(|digest| password::verify(&digest, plaintext)))
    }

    /// Empty the active profile's credential map.
    pub fn clear_profile_credentials(&self) {
        let mut state = self.write();
        active_profile_mut(&mut state).logins.clear();
        self.persist(&state);
    }

    // Favorites and UI flags ---------------------------------------------

    pub fn favorites(&self) -> Vec<String> {
        self.read().favorites.iter().cloned().collect()
    }

    pub fn is_favorite(&self, platform: &str) -> bool {
        self.read().favorites.contains(platform)
    }

    /// Flip the favorite flag for `platform`; returns the new state.
    pub fn toggle_favorite(&self, platform: &str) -> Result<bool, StoreError> {
        ensure_known(platform)?;
        let mut state = self.write();
        let now_favorite = if state.favorites.remove(platform) {
            false
        } else {
            state.favorites.insert(platform.to_owned());
            true
        };
        self.persist(&state);
        Ok(now_favorite)
    }

    pub fn active_tab(&self) -> String {
        self.read().active_tab.clone()
    }

    pub fn set_active_tab(&self, tab: &str) {
        let mut state = self.write();
        state.active_tab = tab.to_owned();
        self.persist(&state);
    }

    pub fn cinema_mode(&self) -> bool {
        self.read().cinema_mode
    }

    pub fn set_cinema_mode(&self, enabled: bool) {
        let mut state = self.write();
        state.cinema_mode = enabled;
        self.persist(&state);
    }

    // Internals ----------------------------------------------------------

    // A panicking holder cannot leave a torn aggregate that matters: the
    // on-disk copy is always a complete snapshot, so poisoning is
    // recovered instead of propagated.
    fn read(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serialize the whole aggregate to disk. Failure is logged and never
    /// surfaced; memory keeps the mutation either way.
    fn persist(&self, state: &AppState) {
        if let Err(err) = write_state(&self.path, state) {
            warn!("failed to save config {}: {}", self.path.display(), err);
        }
    }
}

fn ensure_known(platform: &str) -> Result<(), StoreError> {
    if catalog::is_known(platform) {
        Ok(())
    } else {
        Err(StoreError::UnknownPlatform(platform.to_owned()))
    }
}

/// Prepare a caller-supplied credential for storage. `remember == false`
/// means "forget": the entry must not be persisted at all.
fn hash_for_storage(credential: Credential) -> Result<Option<Credential>, StoreError> {
    if !credential.remember {
        return Ok(None);
    }
    let password = password::hash(&credential.password)?;
    Ok(Some(Credential {
        password,
        ..credential
    }))
}

fn effective_active_profile(state: &AppState) -> &str {
    if state.profiles.contains_key(&state.settings.active_profile) {
        &state.settings.active_profile
    } else {
        DEFAULT_PROFILE
    }
}

/// Resolve the active profile for mutation, falling back to
/// [`DEFAULT_PROFILE`] (created on demand) if the reference dangles.
fn active_profile_mut(state: &mut AppState) -> &mut Profile {
    if !state.profiles.contains_key(&state.settings.active_profile) {
        if state.settings.active_profile != DEFAULT_PROFILE {
            warn!(
                "active profile '{}' does not exist, falling back to '{}'",
                state.settings.active_profile, DEFAULT_PROFILE
            );
        }
        state.settings.active_profile = DEFAULT_PROFILE.to_owned();
    }
    let name = state.settings.active_profile.clone();
    state
        .profiles
        .entry(name.clone())
        .or_insert_with(|| Profile::named(name))
}

fn load_state(path: &Path) -> AppState {
    let defaults = AppState::default();

    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(_) => {
            info!("no config file at {}, using defaults", path.display());
            return defaults;
        }
    };
    if meta.len() > MAX_CONFIG_BYTES {
        warn!(
            "config file {} is {} bytes (max {}), ignoring it",
            path.display(),
            meta.len(),
            MAX_CONFIG_BYTES
        );
        return defaults;
    }

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            info!(
                "config file {} unreadable ({}), using defaults",
                path.display(),
                err
            );
            return defaults;
        }
    };

    let mut value: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            warn!("failed to parse config {}: {}", path.display(), err);
            return defaults;
        }
    };

    // Keys the file does not carry are filled in from the serialized
    // defaults, so a file written by an older build keeps its preset
    // values instead of zeroing them.
    let default_value = serde_json::to_value(&defaults).unwrap_or(Value::Null);
    merge_missing_fields(&mut value, &default_value);

    match serde_json::from_value(value) {
        Ok(state) => state,
        Err(err) => {
            warn!("failed to interpret config {}: {}", path.display(), err);
            defaults
        }
    }
}

fn merge_missing_fields(target: &mut Value, defaults: &Value) {
    if let (Value::Object(target_map), Value::Object(defaults_map)) = (target, defaults) {
        for (key, default_value) in defaults_map {
            match target_map.get_mut(key) {
                Some(target_value) => merge_missing_fields(target_value, default_value),
                None => {
                    target_map.insert(key.clone(), default_value.clone());
                }
            }
        }
    }
}

/// Write the aggregate to a sibling temp file, then rename over the real
/// one, so a crash mid-write never leaves a truncated config behind.
fn write_state(path: &Path, state: &AppState) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let payload = serde_json::to_string_pretty(state).map_err(io::Error::other)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload.as_bytes())?;
    fs::rename(&tmp, path)?;
    Ok(())
}
