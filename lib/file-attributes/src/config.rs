//! Instance configuration and the default identifier prefix.

use std::path::Path;
use std::sync::OnceLock;

/// Environment variable that overrides the default identifier prefix.
pub const PREFIX_ENV: &str = "FILE_ATTRIBUTES_PREFIX";

/// Prefix used when neither the environment nor the executable name gives one.
pub const FALLBACK_PREFIX: &str = "local.file-attributes";

/// Settings for a [`crate::FileAttributes`] instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributesConfig {
    /// Explicit prefix; `None` uses [`default_identifier_prefix`].
    pub identifier_prefix: Option<String>,
    /// Keep decoded values in memory after the first read or write.
    pub cached: bool,
}

impl Default for AttributesConfig {
    fn default() -> Self {
        Self {
            identifier_prefix: None,
            cached: true,
        }
    }
}

impl AttributesConfig {
    /// Configuration that reaches the primitive on every access.
    pub fn uncached() -> Self {
        Self {
            cached: false,
            ..Self::default()
        }
    }

    pub fn with_cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.identifier_prefix = Some(prefix.into());
        self
    }
}

impl From<&str> for AttributesConfig {
    fn from(prefix: &str) -> Self {
        AttributesConfig::default().with_prefix(prefix)
    }
}

impl From<String> for AttributesConfig {
    fn from(prefix: String) -> Self {
        AttributesConfig::default().with_prefix(prefix)
    }
}

/// The process-wide default prefix, resolved once.
pub fn default_identifier_prefix() -> &'static str {
    static DEFAULT: OnceLock<String> = OnceLock::new();
    DEFAULT.get_or_init(|| {
        resolve_identifier_prefix(
            std::env::var(PREFIX_ENV).ok(),
            std::env::current_exe().ok().as_deref(),
        )
    })
}

/// Pick a prefix from the environment override or the executable name.
///
/// An executable `/usr/bin/My Viewer` yields `local.my-viewer`.
pub fn resolve_identifier_prefix(env: Option<String>, exe: Option<&Path>) -> String {
    if let Some(prefix) = env.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()) {
        return prefix;
    }

    let stem = exe
        .and_then(Path::file_stem)
        .and_then(|s| s.to_str())
        .map(sanitize)
        .filter(|s| !s.is_empty());

    match stem {
        Some(stem) => format!("local.{}", stem),
        None => FALLBACK_PREFIX.to_string(),
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_wins() {
        let prefix = resolve_identifier_prefix(
            Some("com.example.viewer".into()),
            Some(Path::new("/usr/bin/other")),
        );
        assert_eq!(prefix, "com.example.viewer");
    }

    #[test]
    fn blank_env_is_ignored() {
        let prefix = resolve_identifier_prefix(Some("  ".into()), Some(Path::new("/bin/tool")));
        assert_eq!(prefix, "local.tool");
    }

    #[test]
    fn exe_name_is_sanitized() {
        let prefix = resolve_identifier_prefix(None, Some(Path::new("/opt/My Viewer.exe")));
        assert_eq!(prefix, "local.my-viewer");
    }

    #[test]
    fn fallback_without_exe() {
        assert_eq!(resolve_identifier_prefix(None, None), FALLBACK_PREFIX);
    }

    #[test]
    fn config_from_prefix() {
        let config = AttributesConfig::from("a.b");
        assert_eq!(config.identifier_prefix.as_deref(), Some("a.b"));
        assert!(config.cached);
        assert!(!AttributesConfig::uncached().cached);
    }
}
