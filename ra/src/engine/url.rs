//! Text to audio URL resolution

use tracing::debug;

/// Prefix marking reserved strings that map to fixed assets
pub const SPECIAL_PREFIX: &str = "special:";

/// The "still working" cue
pub const WAITING: &str = "special:waiting";

pub const TEXT_PLACEHOLDER: &str = "$text$";
pub const URL_PLACEHOLDER: &str = "$url$";

/// Resolves normalized text to the URL of its audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResolver {
    base: String,
    sounds_path: String,
    proxy: Option<String>,
}

impl UrlResolver {
    /// `base` must contain `$text$`; `proxy`, when set, must contain `$url$`
    pub fn new(base: impl Into<String>, sounds_path: impl Into<String>, proxy: Option<String>) -> Self {
        Self {
            base: base.into(),
            sounds_path: sounds_path.into(),
            proxy,
        }
    }

    /// URL for a normalized utterance string
    pub fn resolve(&self, text: &str) -> String {
        let url = match text.strip_prefix(SPECIAL_PREFIX).and_then(|name| self.asset(name)) {
            Some(asset) => asset,
            None => self.base.replacen(TEXT_PLACEHOLDER, &urlencoding::encode(text), 1),
        };
        let url = self.proxify(url);
        debug!(%text, %url, "UrlResolver::resolve: done");
        url
    }

    fn asset(&self, name: &str) -> Option<String> {
        match name {
            "waiting" => Some(format!("{}/waiting.mp3", self.sounds_path.trim_end_matches('/'))),
            _ => None,
        }
    }

    fn proxify(&self, url: String) -> String {
        match &self.proxy {
            Some(template) => template.replacen(URL_PLACEHOLDER, &urlencoding::encode(&url), 1),
            None => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(proxy: Option<&str>) -> UrlResolver {
        UrlResolver::new(
            "https://tts.example.org/speak?text=$text$",
            "https://assets.example.org/sounds/",
            proxy.map(str::to_string),
        )
    }

    #[test]
    fn test_resolve_encodes_text() {
        assert_eq!(
            resolver(None).resolve("hello world & more"),
            "https://tts.example.org/speak?text=hello%20world%20%26%20more"
        );
    }

    #[test]
    fn test_resolve_waiting_asset() {
        assert_eq!(
            resolver(None).resolve(WAITING),
            "https://assets.example.org/sounds/waiting.mp3"
        );
    }

    #[test]
    fn test_unknown_special_uses_template() {
        assert_eq!(
            resolver(None).resolve("special:other"),
            "https://tts.example.org/speak?text=special%3Aother"
        );
    }

    #[test]
    fn test_proxy_wraps_every_url() {
        let resolver = resolver(Some("https://proxy.example.org/get?u=$url$"));
        assert_eq!(
            resolver.resolve("hi"),
            "https://proxy.example.org/get?u=https%3A%2F%2Ftts.example.org%2Fspeak%3Ftext%3Dhi"
        );
        assert!(resolver.resolve(WAITING).starts_with("https://proxy.example.org/get?u=https%3A%2F%2Fassets"));
    }
}
