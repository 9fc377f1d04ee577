use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::expr::{BINDING_NAME, BUILTIN_FUNCTIONS, Env};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    /// Named functions, name → lambda source.
    #[serde(default)]
    pub functions: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub color: ColorMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self { namespace: default_namespace(), color: ColorMode::default() }
    }
}

fn default_namespace() -> String {
    "slrp".into()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    functions: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    namespace: Option<String>,
    color: Option<ColorMode>,
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration: embedded defaults, then the user overlay from
    /// `~/.config/slrp/config.toml` if it exists. Absence is not an error.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    fn load_overlay() -> Option<ConfigOverlay> {
        let path = shellexpand::tilde("~/.config/slrp/config.toml").into_owned();
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                log::warn!("config parse error, using defaults: {e}");
                None
            }
        }
    }

    /// Apply an overlay on top of this config. Scalars override; functions
    /// merge by name, with the user definition winning.
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(v) = overlay.settings.namespace {
            self.settings.namespace = v;
        }
        if let Some(v) = overlay.settings.color {
            self.settings.color = v;
        }
        for (name, source) in overlay.functions {
            self.functions.insert(name, source);
        }
    }

    /// Build the evaluation environment from this config, validating it.
    /// Both failure modes are fatal before any evaluation: a function body
    /// that is not a lambda, and a namespace alias shadowing a name the
    /// environment already uses.
    pub fn build_env(&self) -> Result<Env, Error> {
        let ns = self.settings.namespace.as_str();
        if ns == BINDING_NAME {
            return Err(Error::Config(format!(
                "namespace alias `{ns}` collides with the binding name"
            )));
        }
        if BUILTIN_FUNCTIONS.contains(&ns) {
            return Err(Error::Config(format!(
                "namespace alias `{ns}` collides with a built-in function"
            )));
        }
        if self.functions.contains_key(ns) {
            return Err(Error::Config(format!(
                "namespace alias `{ns}` collides with a registered function"
            )));
        }

        let mut env = Env::with_namespace(ns);
        for (name, source) in &self.functions {
            env.register(name.clone(), source).map_err(|e| {
                Error::Config(format!("function `{name}` (`{source}`): {e}"))
            })?;
        }
        Ok(env)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = Config::default_config();
        assert_eq!(config.settings.namespace, "slrp");
        assert_eq!(config.settings.color, ColorMode::Auto);
        assert!(config.functions.is_empty());
    }

    #[test]
    fn default_config_builds_env() {
        let env = Config::default_config().build_env().unwrap();
        assert_eq!(env.namespace(), "slrp");
        assert_eq!(env.function_names().count(), 0);
    }

    #[test]
    fn overlay_adds_functions() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [functions]
            size = "x => x.length"
            double = "x => x + x"
        "#,
        );
        let env = config.build_env().unwrap();
        assert!(env.contains_function("size"));
        assert!(env.contains_function("double"));
    }

    #[test]
    fn overlay_function_names_sorted() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [functions]
            zeta = "x => x"
            alpha = "x => x"
        "#,
        );
        let env = config.build_env().unwrap();
        let names: Vec<&str> = env.function_names().collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn overlay_overrides_namespace() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [settings]
            namespace = "util"
        "#,
        );
        assert_eq!(config.build_env().unwrap().namespace(), "util");
    }

    #[test]
    fn overlay_overrides_color() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [settings]
            color = "never"
        "#,
        );
        assert_eq!(config.settings.color, ColorMode::Never);
    }

    #[test]
    fn empty_overlay_changes_nothing() {
        let mut config = Config::default_config();
        config.apply_overlay_str("");
        assert_eq!(config.settings.namespace, "slrp");
        assert!(config.functions.is_empty());
    }

    // ── Validation ──

    #[test]
    fn namespace_collision_with_function_is_fatal() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [settings]
            namespace = "size"

            [functions]
            size = "x => x.length"
        "#,
        );
        let err = config.build_env().unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {err}");
    }

    #[test]
    fn namespace_collision_with_builtin_is_fatal() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [settings]
            namespace = "parse"
        "#,
        );
        assert!(config.build_env().is_err());
    }

    #[test]
    fn namespace_collision_with_binding_name_is_fatal() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [settings]
            namespace = "this"
        "#,
        );
        assert!(config.build_env().is_err());
    }

    #[test]
    fn non_lambda_function_is_fatal() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [functions]
            broken = "1 + 1"
        "#,
        );
        let err = config.build_env().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("broken"), "error should name the function: {msg}");
    }

    #[test]
    fn unparsable_function_is_fatal() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [functions]
            broken = "x => "
        "#,
        );
        assert!(config.build_env().is_err());
    }
}
