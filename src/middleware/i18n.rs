// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

const DEFAULT_LANG: &str = "en";

// Idioma preferido do cliente, vindo do Accept-Language
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Locale {
    pub fn from_parts(parts: &Parts) -> Self {
        let lang = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .first() // Pega o idioma de maior peso (ex: "pt-BR")
                    .map(|tag| tag.split('-').next().unwrap_or(tag).to_lowercase())
            })
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Locale(lang)
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Locale::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn locale_for(header: Option<&str>) -> String {
        let mut builder = Request::builder();
        if let Some(value) = header {
            builder = builder.header(header::ACCEPT_LANGUAGE, value);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        Locale::from_parts(&parts).0
    }

    #[test]
    fn picks_primary_subtag_of_preferred_language() {
        assert_eq!(locale_for(Some("en-US,pt;q=0.5")), "en");
        assert_eq!(locale_for(Some("pt-BR")), "pt");
    }

    #[test]
    fn defaults_when_header_missing() {
        assert_eq!(locale_for(None), "en");
    }
}
