//! Static catalog of launchable streaming platforms.
//!
//! The catalog is the source of truth for which platform names may appear
//! as credential or favorite keys; it is hard-coded, ordered for display
//! and never persisted.

/// One launcher tile: display name, target URL and an icon glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformEntry {
    pub name: &'static str,
    pub url: &'static str,
    pub icon: &'static str,
}

pub const PLATFORMS: &[PlatformEntry] = &[
    PlatformEntry {
        name: "Netflix",
        url: "https://www.netflix.com",
        icon: "🎬",
    },
    PlatformEntry {
        name: "YouTube",
        url: "https://www.youtube.com/tv",
        icon: "▶",
    },
    PlatformEntry {
        name: "Disney+",
        url: "https://www.disneyplus.com",
        icon: "✨",
    },
    PlatformEntry {
        name: "Prime Video",
        url: "https://www.primevideo.com",
        icon: "📦",
    },
    PlatformEntry {
        name: "HBO Max",
        url: "https://play.max.com",
        icon: "🎞",
    },
    PlatformEntry {
        name: "Twitch",
        url: "https://www.twitch.tv",
        icon: "🎮",
    },
    PlatformEntry {
        name: "Spotify",
        url: "https://open.spotify.com",
        icon: "🎵",
    },
];

pub fn find(name: &str) -> Option<&'static PlatformEntry> {
    PLATFORMS.iter().find(|entry| entry.name == name)
}

pub fn is_known(name: &str) -> bool {
    find(name).is_some()
}
