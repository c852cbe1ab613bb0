//! One-time process bootstrap for the kiosk session.
//!
//! The launcher always runs under a Wayland compositor; the backend and
//! rendering flags are forced through environment variables before the
//! window and GL context exist.

use streamdock_core::Settings;

/// Environment overrides derived from the persisted settings.
pub fn env_overrides(settings: &Settings) -> Vec<(&'static str, &'static str)> {
    let mut vars = vec![("WINIT_UNIX_BACKEND", "wayland")];
    if !settings.gpu_acceleration {
        vars.push(("LIBGL_ALWAYS_SOFTWARE", "1"));
        vars.push(("WGPU_POWER_PREF", "low"));
    }
    vars
}

/// Apply the overrides to the process environment. Must run before any
/// other thread exists.
pub fn apply_env_overrides(settings: &Settings) {
    for (key, value) in env_overrides(settings) {
        // SAFETY: called from main before threads are spawned.
        unsafe { std::env::set_var(key, value) };
    }
}
