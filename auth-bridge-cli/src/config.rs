//! Scenario file loading and validation

use anyhow::{bail, Context, Result};
use auth_bridge::{BridgeConfig, RawSignal};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Main application configuration (loaded from a scenario TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default, rename = "scenario")]
    pub scenarios: Vec<ScenarioConfig>,
}

/// One scripted authentication attempt
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub name: String,
    /// Pin the session handle instead of letting the bridge issue one
    pub handle: Option<i64>,
    /// Cancel the session after this many events (0 = before the first)
    pub cancel_after: Option<usize>,
    #[serde(default)]
    pub events: Vec<EventConfig>,
}

/// A platform callback as written in a scenario file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EventConfig {
    Error {
        code: i32,
        message: Option<String>,
    },
    Failed,
    Help {
        code: i32,
        message: Option<String>,
    },
    Succeeded {
        #[serde(default)]
        authentication_type: i32,
    },
    Packed {
        #[serde(default)]
        error_code: i32,
        #[serde(default)]
        failed: bool,
        #[serde(default)]
        help_code: i32,
    },
}

impl EventConfig {
    /// The raw platform signal this entry stands for
    pub fn to_signal(&self) -> RawSignal {
        match self {
            EventConfig::Error { code, message } => RawSignal::Error {
                code: *code,
                message: message.clone(),
            },
            EventConfig::Failed => RawSignal::Failed,
            EventConfig::Help { code, message } => RawSignal::Help {
                code: *code,
                message: message.clone(),
            },
            EventConfig::Succeeded { authentication_type } => RawSignal::Succeeded {
                authentication_type: *authentication_type,
            },
            EventConfig::Packed {
                error_code,
                failed,
                help_code,
            } => RawSignal::from_packed(*error_code, *failed, *help_code),
        }
    }
}

impl AppConfig {
    /// Configuration for a single scenario given on the command line
    pub fn inline(events: Vec<EventConfig>, cancel_after: Option<usize>) -> Self {
        Self {
            bridge: BridgeConfig::default(),
            scenarios: vec![ScenarioConfig {
                name: "inline".to_string(),
                handle: None,
                cancel_after,
                events,
            }],
        }
    }

    /// Reject configurations the runner cannot execute meaningfully
    pub fn validate(&self) -> Result<()> {
        if self.scenarios.is_empty() {
            bail!("No scenarios defined");
        }

        let mut pinned = HashSet::new();
        for scenario in &self.scenarios {
            if scenario.name.trim().is_empty() {
                bail!("Scenario with empty name");
            }
            if let Some(cancel_after) = scenario.cancel_after {
                if cancel_after > scenario.events.len() {
                    bail!(
                        "Scenario '{}': cancel_after = {} exceeds its {} event(s)",
                        scenario.name,
                        cancel_after,
                        scenario.events.len()
                    );
                }
            }
            if let Some(handle) = scenario.handle {
                if handle == 0 {
                    bail!("Scenario '{}': handle 0 is reserved", scenario.name);
                }
                if !pinned.insert(handle) {
                    bail!("Scenario '{}': handle {} pinned twice", scenario.name, handle);
                }
            }
        }

        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse scenario file: {:?}", path))?;

    config
        .validate()
        .with_context(|| format!("Invalid scenario file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [bridge]
            forward_failed = false

            [[scenario]]
            name = "fingerprint ok"
            events = [
                { kind = "failed" },
                { kind = "help", code = 10, message = "center finger" },
                { kind = "succeeded" },
            ]

            [[scenario]]
            name = "cancelled"
            handle = 81
            cancel_after = 0
            events = [{ kind = "succeeded", authentication_type = 2 }]
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert!(!config.bridge.forward_failed);
        assert!(config.bridge.forward_help);
        assert_eq!(config.scenarios.len(), 2);
        assert_eq!(config.scenarios[0].events.len(), 3);
        assert_eq!(config.scenarios[1].handle, Some(81));
        assert_eq!(
            config.scenarios[1].events[0],
            EventConfig::Succeeded { authentication_type: 2 }
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_packed_event_to_signal() {
        let event = EventConfig::Packed { error_code: 0, failed: true, help_code: 0 };
        assert_eq!(event.to_signal(), RawSignal::Failed);
    }

    #[test]
    fn test_validation_rejects_bad_cancel_point() {
        let mut config = AppConfig::inline(vec![EventConfig::Failed], Some(2));
        assert!(config.validate().is_err());

        config.scenarios[0].cancel_after = Some(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_duplicate_pins() {
        let mut config = AppConfig::inline(vec![], None);
        config.scenarios[0].handle = Some(5);
        config.scenarios.push(config.scenarios[0].clone());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [[scenario]]
            name = "lockout"
            events = [{{ kind = "error", code = 7, message = "lockout" }}]
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.scenarios[0].name, "lockout");
        assert_eq!(config.bridge, BridgeConfig::default());
    }

    #[test]
    fn test_bundled_demo_parses() {
        let config: AppConfig = toml::from_str(include_str!("../scenarios/demo.toml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.scenarios.len(), 7);
        assert_eq!(
            config.scenarios[5].events[1].to_signal(),
            RawSignal::Help { code: 3, message: None }
        );
    }

    #[test]
    fn test_load_config_without_scenarios_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(load_config(file.path()).is_err());
    }
}
