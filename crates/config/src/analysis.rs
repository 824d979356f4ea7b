//! Per-run analysis configuration
//!
//! Combines the process-wide settings with the session's user overrides.
//! Resolution happens once at the start of every run, so an override changed
//! mid-run only affects the next one.

use deal_sim_core::Credential;
use serde::Serialize;

use crate::constants::env;
use crate::settings::Settings;
use crate::ConfigError;

/// Session-local overrides entered by the user
///
/// Held in memory only. Blank values count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserOverrides {
    pub credential: Option<Credential>,
    pub extraction_model: Option<String>,
    pub reasoning_model: Option<String>,
}

impl UserOverrides {
    /// Whether a non-blank credential override is present
    pub fn credential_set(&self) -> bool {
        self.credential.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Public view with the credential reduced to a flag
    pub fn view(&self) -> OverridesView {
        OverridesView {
            credential_set: self.credential_set(),
            extraction_model: non_blank(self.extraction_model.as_deref()).map(str::to_string),
            reasoning_model: non_blank(self.reasoning_model.as_deref()).map(str::to_string),
        }
    }
}

/// What the outside world may see of the overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverridesView {
    pub credential_set: bool,
    pub extraction_model: Option<String>,
    pub reasoning_model: Option<String>,
}

/// Everything one run needs to talk to the reasoning service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub credential: Credential,
    pub extraction_model_id: String,
    pub reasoning_model_id: String,
}

/// Resolves the per-run configuration
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    default_credential: Option<Credential>,
    extraction_model: String,
    reasoning_model: String,
}

impl ConfigResolver {
    pub fn new(
        default_credential: Option<Credential>,
        extraction_model: impl Into<String>,
        reasoning_model: impl Into<String>,
    ) -> Self {
        Self {
            default_credential: default_credential.filter(|c| !c.is_empty()),
            extraction_model: extraction_model.into(),
            reasoning_model: reasoning_model.into(),
        }
    }

    /// Build from settings, reading the credential fallbacks from the process environment
    pub fn from_settings(settings: &Settings) -> Self {
        Self::from_settings_with(settings, |key| std::env::var(key).ok())
    }

    /// Build from settings with an explicit environment lookup
    ///
    /// Process default credential order: `reasoning.api_key`, then
    /// `GEMINI_API_KEY`, then `API_KEY`.
    pub fn from_settings_with<F>(settings: &Settings, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_settings = non_blank(Some(settings.reasoning.api_key.as_str())).map(Credential::new);
        let default_credential = from_settings.or_else(|| {
            env::CREDENTIAL_FALLBACKS
                .into_iter()
                .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()))
                .map(Credential::new)
        });

        if default_credential.is_none() {
            tracing::info!("No process-default credential; runs require a user override");
        }

        Self::new(
            default_credential,
            settings.reasoning.extraction_model.clone(),
            settings.reasoning.reasoning_model.clone(),
        )
    }

    pub fn has_default_credential(&self) -> bool {
        self.default_credential.is_some()
    }

    /// Resolve the configuration for one run
    ///
    /// A non-blank override always wins. Without any credential the run must
    /// fail before reaching the network.
    pub fn resolve(&self, overrides: &UserOverrides) -> Result<AnalysisConfig, ConfigError> {
        let credential = overrides
            .credential
            .as_ref()
            .filter(|c| !c.is_empty())
            .or(self.default_credential.as_ref())
            .cloned()
            .ok_or(ConfigError::MissingCredential)?;

        let extraction_model_id = non_blank(overrides.extraction_model.as_deref())
            .unwrap_or(&self.extraction_model)
            .to_string();
        let reasoning_model_id = non_blank(overrides.reasoning_model.as_deref())
            .unwrap_or(&self.reasoning_model)
            .to_string();

        Ok(AnalysisConfig {
            credential,
            extraction_model_id,
            reasoning_model_id,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_override_wins() {
        let resolver = ConfigResolver::new(Some(Credential::new("process")), "flash", "pro");
        let overrides = UserOverrides {
            credential: Some(Credential::new("user")),
            extraction_model: Some("custom-flash".to_string()),
            reasoning_model: Some("   ".to_string()),
        };

        let config = resolver.resolve(&overrides).unwrap();
        assert_eq!(config.credential.expose(), "user");
        assert_eq!(config.extraction_model_id, "custom-flash");
        assert_eq!(config.reasoning_model_id, "pro");
    }

    #[test]
    fn test_blank_override_falls_back_to_default() {
        let resolver = ConfigResolver::new(Some(Credential::new("process")), "flash", "pro");
        let overrides = UserOverrides {
            credential: Some(Credential::new("")),
            ..Default::default()
        };

        let config = resolver.resolve(&overrides).unwrap();
        assert_eq!(config.credential.expose(), "process");
        assert!(!overrides.credential_set());
    }

    #[test]
    fn test_missing_credential_is_configuration_error() {
        let resolver = ConfigResolver::new(None, "flash", "pro");
        let err = resolver.resolve(&UserOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential));

        let err: deal_sim_core::Error = err.into();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_default_credential_order() {
        let mut settings = Settings::default();

        let resolver = ConfigResolver::from_settings_with(
            &settings,
            lookup(&[("GEMINI_API_KEY", "gemini"), ("API_KEY", "generic")]),
        );
        let config = resolver.resolve(&UserOverrides::default()).unwrap();
        assert_eq!(config.credential.expose(), "gemini");

        let resolver = ConfigResolver::from_settings_with(
            &settings,
            lookup(&[("GEMINI_API_KEY", " "), ("API_KEY", "generic")]),
        );
        let config = resolver.resolve(&UserOverrides::default()).unwrap();
        assert_eq!(config.credential.expose(), "generic");

        settings.reasoning.api_key = "from-settings".to_string();
        let resolver =
            ConfigResolver::from_settings_with(&settings, lookup(&[("GEMINI_API_KEY", "gemini")]));
        let config = resolver.resolve(&UserOverrides::default()).unwrap();
        assert_eq!(config.credential.expose(), "from-settings");
        assert_eq!(config.extraction_model_id, "gemini-3-flash-preview");
        assert_eq!(config.reasoning_model_id, "gemini-3-pro-preview");

        settings.reasoning.api_key.clear();
        let resolver = ConfigResolver::from_settings_with(&settings, lookup(&[]));
        assert!(!resolver.has_default_credential());
    }

    #[test]
    fn test_view_hides_credential() {
        let overrides = UserOverrides {
            credential: Some(Credential::new("user-secret")),
            extraction_model: None,
            reasoning_model: Some("gemini-3-pro-preview".to_string()),
        };

        let view = overrides.view();
        assert!(view.credential_set);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("user-secret"));
        assert!(json.contains("\"credential_set\":true"));
    }
}
