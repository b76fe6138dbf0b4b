// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

pub use fluent::{FluentArgs, fluent_args};

use fluent::FluentResource;
use fluent_bundle::concurrent::FluentBundle;
use std::collections::HashMap;
use thiserror::Error;
use unic_langid::LanguageIdentifier;

/// Translation domains embedded in the binary
const DOMAINS: [&str; 2] = ["report", "labels"];

/// Supported report languages
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
pub enum Language {
    /// French (default)
    #[default]
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "nl")]
    Dutch,
}

impl Language {
    /// Get the language identifier string (e.g., "fr", "en")
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::French => "fr",
            Self::English => "en",
            Self::Dutch => "nl",
        }
    }

    /// Get the language display name
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::French => "Français",
            Self::English => "English",
            Self::Dutch => "Nederlands",
        }
    }

    /// List all supported languages
    pub const ALL: [Language; 3] = [Language::French, Language::English, Language::Dutch];

    /// Parse language from string code
    ///
    /// # Errors
    ///
    /// Returns `I18nError::UnsupportedLanguage` if the language code is not supported.
    pub fn from_code(code: &str) -> Result<Self, I18nError> {
        match code.trim().to_lowercase().as_str() {
            "fr" | "french" | "français" => Ok(Self::French),
            "en" | "english" => Ok(Self::English),
            "nl" | "dutch" | "nederlands" => Ok(Self::Dutch),
            _ => Err(I18nError::UnsupportedLanguage(code.to_owned())),
        }
    }

    /// Parse a language code, falling back to the default language
    #[must_use]
    pub fn from_code_or_default(code: &str) -> Self {
        Self::from_code(code).unwrap_or_default()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = I18nError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

/// Translation errors
#[derive(Debug, Error)]
pub enum I18nError {
    /// Translation key not found
    #[error("Translation key not found: {0}")]
    KeyNotFound(String),

    /// Failed to load translation resource
    #[error("Failed to load translation resource: {0}")]
    LoadError(String),

    /// Unsupported language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Formatting error
    #[error("Failed to format translation: {0}")]
    FormatError(String),
}

/// Localized string lookup for one language
pub struct I18n {
    bundles: HashMap<&'static str, FluentBundle<FluentResource>>,
    language: Language,
}

impl std::fmt::Debug for I18n {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("I18n")
            .field("language", &self.language)
            .field("domains", &self.bundles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl I18n {
    /// Create a new i18n instance for the specified language
    ///
    /// # Errors
    ///
    /// Returns `I18nError::LoadError` if translation files cannot be parsed.
    pub fn new(language: Language) -> Result<Self, I18nError> {
        let mut bundles = HashMap::new();
        for domain in DOMAINS {
            bundles.insert(domain, Self::load_domain(language, domain)?);
        }

        Ok(Self { bundles, language })
    }

    fn load_domain(
        language: Language,
        domain: &str,
    ) -> Result<FluentBundle<FluentResource>, I18nError> {
        let lang_code = language.code();
        let ftl_content = Self::load_ftl_file(lang_code, domain)?;

        let resource = FluentResource::try_new(ftl_content)
            .map_err(|e| I18nError::LoadError(format!("Failed to parse {domain}.ftl: {e:?}")))?;

        let lang_id: LanguageIdentifier = lang_code
            .parse()
            .map_err(|e| I18nError::LoadError(format!("Invalid language ID: {e}")))?;

        let mut bundle = FluentBundle::new_concurrent(vec![lang_id]);
        // Rendered report text must not carry bidi isolation marks
        bundle.set_use_isolating(false);
        bundle
            .add_resource(resource)
            .map_err(|e| I18nError::LoadError(format!("Failed to add resource: {e:?}")))?;

        Ok(bundle)
    }

    fn load_ftl_file(lang_code: &str, domain: &str) -> Result<String, I18nError> {
        match (lang_code, domain) {
            ("fr", "report") => Ok(include_str!("../locales/fr/report.ftl").to_owned()),
            ("fr", "labels") => Ok(include_str!("../locales/fr/labels.ftl").to_owned()),
            ("en", "report") => Ok(include_str!("../locales/en/report.ftl").to_owned()),
            ("en", "labels") => Ok(include_str!("../locales/en/labels.ftl").to_owned()),
            ("nl", "report") => Ok(include_str!("../locales/nl/report.ftl").to_owned()),
            ("nl", "labels") => Ok(include_str!("../locales/nl/labels.ftl").to_owned()),
            _ => Err(I18nError::LoadError(format!(
                "Translation file not found: {lang_code}/{domain}.ftl"
            ))),
        }
    }

    /// Get a translated string by key
    ///
    /// # Errors
    ///
    /// Returns `I18nError::KeyNotFound` if the translation key is not found in any domain.
    pub fn get(&self, key: &str) -> Result<String, I18nError> {
        self.format(key, None)
    }

    /// Format a translated string with arguments
    ///
    /// # Errors
    ///
    /// Returns `I18nError::KeyNotFound` if the translation key is not found.
    /// Returns `I18nError::FormatError` if formatting fails.
    pub fn format(&self, key: &str, args: Option<&FluentArgs<'_>>) -> Result<String, I18nError> {
        for bundle in self.bundles.values() {
            if let Some(message) = bundle.get_message(key).and_then(|msg| msg.value()) {
                let mut errors = vec![];
                let value = bundle.format_pattern(message, args, &mut errors);

                if !errors.is_empty() {
                    return Err(I18nError::FormatError(format!(
                        "Formatting errors: {errors:?}"
                    )));
                }

                return Ok(value.into_owned());
            }
        }

        Err(I18nError::KeyNotFound(key.to_owned()))
    }

    /// Translated string, or the key itself when no translation exists
    #[must_use]
    pub fn text(&self, key: &str) -> String {
        self.get(key).unwrap_or_else(|_| key.to_owned())
    }

    /// Formatted string, or the key itself when formatting fails
    #[must_use]
    pub fn text_with(&self, key: &str, args: &FluentArgs<'_>) -> String {
        self.format(key, Some(args))
            .unwrap_or_else(|_| key.to_owned())
    }

    /// Get the current language
    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }
}
