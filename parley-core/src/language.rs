use serde::{Deserialize, Serialize};

/// The closed set of conversation languages this client supports.
///
/// Validated in two places on purpose: the store refuses to select an
/// unknown tag, and the remote clients refuse to dispatch one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    Deutsch,
    #[serde(rename = "Français")]
    Francais,
    #[serde(rename = "Español")]
    Espanol,
    Italiano,
}

pub const ALLOWED_LANGUAGES: [Language; 5] = [
    Language::English,
    Language::Deutsch,
    Language::Francais,
    Language::Espanol,
    Language::Italiano,
];

impl Language {
    /// Parse a user-facing tag against the allow-list.
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        ALLOWED_LANGUAGES.iter().copied().find(|l| l.as_str() == tag)
    }

    /// The canonical tag, as shown in the language picker and sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Deutsch => "Deutsch",
            Language::Francais => "Français",
            Language::Espanol => "Español",
            Language::Italiano => "Italiano",
        }
    }

    /// Two-letter code for speech backends that take one.
    pub fn iso_code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Deutsch => "de",
            Language::Francais => "fr",
            Language::Espanol => "es",
            Language::Italiano => "it",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_allowed_language(tag: &str) -> bool {
    Language::parse(tag).is_some()
}
