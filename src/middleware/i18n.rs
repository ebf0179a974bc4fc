// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::common::i18n::{DEFAULT_LOCALE, SUPPORTED_LOCALES};

// Language of the caller, from Accept-Language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Locale {
    /// First supported primary language in the header, by preference.
    pub fn from_header(header_str: &str) -> Self {
        let lang = accept_language::parse(header_str)
            .iter()
            // "id-ID" -> "id"
            .map(|tag| tag.split('-').next().unwrap_or(tag).to_ascii_lowercase())
            .find(|lang| SUPPORTED_LOCALES.contains(&lang.as_str()))
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        Locale(lang)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LOCALE.to_string())
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(Locale::from_header)
            .unwrap_or_default();

        Ok(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_indonesian_from_a_regional_tag() {
        assert_eq!(Locale::from_header("id-ID,id;q=0.9,en;q=0.8").0, "id");
    }

    #[test]
    fn skips_unsupported_languages() {
        assert_eq!(Locale::from_header("pt-BR, id;q=0.5").0, "id");
        assert_eq!(Locale::from_header("fr").0, "en");
        assert_eq!(Locale::from_header("").0, "en");
    }
}
