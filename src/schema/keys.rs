//! Well-known component keys
//!
//! Signal probes publish their values into the component bag under these
//! keys. The engine never invents keys of its own in the probe namespace;
//! everything it attaches lives under the reserved `'_'` prefix.

/// Platform string reported by the client (e.g. `"iPhone"`, `"Linux x86_64"`).
pub const PLATFORM: &str = "platform";
/// Canvas rendering digest.
pub const CANVAS: &str = "canvas";
/// Audio context digest.
pub const AUDIO: &str = "audio";
/// Enumerated font set.
pub const FONTS: &str = "fonts";
/// Enumerated plugin set.
pub const PLUGINS: &str = "plugins";
/// Basic WebGL parameters.
pub const WEBGL_BASICS: &str = "webGlBasics";
/// WebGL extension list.
pub const WEBGL_EXTENSIONS: &str = "webGlExtensions";
/// Screen resolution pair.
pub const SCREEN_RESOLUTION: &str = "screenResolution";
/// Available screen frame (insets).
pub const SCREEN_FRAME: &str = "screenFrame";
/// IANA timezone identifier.
pub const TIMEZONE: &str = "timezone";
/// Preferred language list.
pub const LANGUAGES: &str = "languages";
/// Color depth in bits.
pub const COLOR_DEPTH: &str = "colorDepth";
/// Touch capability probe result.
pub const TOUCH_SUPPORT: &str = "touchSupport";
/// Browser vendor string.
pub const VENDOR: &str = "vendor";
/// Vendor flavor markers.
pub const VENDOR_FLAVORS: &str = "vendorFlavors";
/// OS/CPU string.
pub const OS_CPU: &str = "osCpu";
/// Logical core count.
pub const HARDWARE_CONCURRENCY: &str = "hardwareConcurrency";
/// Device memory in GiB.
pub const DEVICE_MEMORY: &str = "deviceMemory";
/// Color gamut class.
pub const COLOR_GAMUT: &str = "colorGamut";
/// Reduced-motion preference.
pub const REDUCED_MOTION: &str = "reducedMotion";
/// Host-injected Telegram bridge introspection.
pub const TELEGRAM_WEB_APP: &str = "telegramWebApp";
/// WebView detection result.
pub const WEB_VIEW: &str = "webView";
/// Haptic capability probe result.
pub const HAPTIC: &str = "haptic";
/// Network timing/entropy measurement.
pub const NETWORK: &str = "network";
/// Windowed behavioral feature summary.
pub const BEHAVIORAL: &str = "behavioral";

/// Prefix marking keys attached by the engine rather than a probe.
pub const RESERVED_PREFIX: char = '_';

/// Reserved key carrying the weight table and execution context on an
/// enriched bag.
pub const META_KEY: &str = "_meta";

/// Whether a bag key belongs to the engine's reserved namespace.
pub fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

/// All well-known probe keys, in stable order.
pub fn known_keys() -> &'static [&'static str] {
    &[
        PLATFORM,
        CANVAS,
        AUDIO,
        FONTS,
        PLUGINS,
        WEBGL_BASICS,
        WEBGL_EXTENSIONS,
        SCREEN_RESOLUTION,
        SCREEN_FRAME,
        TIMEZONE,
        LANGUAGES,
        COLOR_DEPTH,
        TOUCH_SUPPORT,
        VENDOR,
        VENDOR_FLAVORS,
        OS_CPU,
        HARDWARE_CONCURRENCY,
        DEVICE_MEMORY,
        COLOR_GAMUT,
        REDUCED_MOTION,
        TELEGRAM_WEB_APP,
        WEB_VIEW,
        HAPTIC,
        NETWORK,
        BEHAVIORAL,
    ]
}
