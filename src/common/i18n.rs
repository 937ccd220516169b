// src/common/i18n.rs

use std::collections::HashMap;

const DEFAULT_LANG: &str = "en";

// Catálogos embutidos no binário: não dependem do diretório de execução.
const CATALOGS: &[(&str, &str)] = &[
    ("pt", include_str!("../../locales/pt.json")),
    ("en", include_str!("../../locales/en.json")),
];

/// Mensagens traduzidas indexadas por idioma e chave.
#[derive(Debug, Clone, Default)]
pub struct I18nStore {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in CATALOGS {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("Catálogo '{}' inválido: {}", lang, e))?;
            catalogs.insert(lang.to_string(), messages);
        }
        tracing::debug!("🌐 {} catálogos de idioma carregados", catalogs.len());
        Ok(Self { catalogs })
    }

    /// Traduz `key` para `lang`, caindo para o idioma padrão e por fim para a própria chave.
    /// Placeholders `{nome}` são substituídos pelos `args`.
    pub fn translate(&self, lang: &str, key: &str, args: &[(&str, &str)]) -> String {
        let template = self
            .lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANG, key))
            .unwrap_or(key);

        args.iter().fold(template.to_string(), |msg, (name, value)| {
            msg.replace(&format!("{{{}}}", name), value)
        })
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.catalogs
            .get(lang)
            .and_then(|messages| messages.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_share_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let pt: Vec<_> = {
            let mut k: Vec<_> = store.catalogs["pt"].keys().collect();
            k.sort();
            k
        };
        let en: Vec<_> = {
            let mut k: Vec<_> = store.catalogs["en"].keys().collect();
            k.sort();
            k
        };
        assert_eq!(pt, en);
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let store = I18nStore::load().unwrap();
        assert_eq!(
            store.translate("de", "client_not_found", &[]),
            "Client not found."
        );
    }

    #[test]
    fn placeholders_are_replaced() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate("en", "invalid_contract_terms", &[("reason", "payment_day")]);
        assert_eq!(msg, "Invalid contract terms: payment_day.");
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::load().unwrap();
        assert_eq!(store.translate("pt", "nope", &[]), "nope");
    }
}
