//! Pushed configuration bundles.
//!
//! The engine (or an operator) pushes a free-form configuration object.
//! The hub validates only what it consumes: the optional `translations`
//! block, whose top-level keys become the available locales. Everything
//! else is passed through untouched for plugins to read.

use crate::error::ConfigError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// A validated configuration bundle.
#[derive(Debug, Clone)]
pub struct ConfigBundle {
    /// Locale names found in the `translations` block, sorted.
    pub locales: Vec<String>,
    /// The raw bundle as received.
    pub raw: Value,
}

impl ConfigBundle {
    /// Validate a pushed payload.
    ///
    /// The payload must be a JSON object; `translations`, when present,
    /// must map locale names to objects. Validation never mutates hub
    /// state, so a rejected bundle leaves everything as it was.
    pub fn parse(payload: Value) -> Result<Self, ConfigError> {
        let Some(object) = payload.as_object() else {
            return Err(ConfigError::NotAnObject);
        };

        let mut locales = Vec::new();
        if let Some(translations) = object.get("translations") {
            let Some(map) = translations.as_object() else {
                return Err(ConfigError::InvalidTranslations(
                    "expected an object of locale -> strings".to_string(),
                ));
            };
            for (locale, strings) in map {
                if !strings.is_object() {
                    return Err(ConfigError::InvalidTranslations(format!(
                        "locale {locale} does not map to an object"
                    )));
                }
                locales.push(locale.clone());
            }
            locales.sort();
        }

        Ok(Self {
            locales,
            raw: payload,
        })
    }

    /// Whether this bundle carries translation data.
    pub fn has_translations(&self) -> bool {
        !self.locales.is_empty()
    }
}

/// Acknowledgement of an accepted bundle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigAck {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ConfigAck {
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
