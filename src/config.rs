use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use derive_builder::Builder;
use once_cell::sync::Lazy;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::source_code::Parser;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    #[default]
    Off,
    Warn,
    Error,
}

impl Severity {
    pub fn as_number(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Warn => 1,
            Self::Error => 2,
        }
    }

    /// Accepts the config spellings: `0 | 1 | 2 | "off" | "warn" | "error"`.
    pub fn from_config_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => match number.as_u64()? {
                0 => Some(Self::Off),
                1 => Some(Self::Warn),
                2 => Some(Self::Error),
                _ => None,
            },
            Value::String(text) => match &**text {
                "off" => Some(Self::Off),
                "warn" => Some(Self::Warn),
                "error" => Some(Self::Error),
                _ => None,
            },
            _ => None,
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_number())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_config_value(&value)
            .ok_or_else(|| de::Error::custom(format!("invalid severity: {value}")))
    }
}

/// Severity plus rule options, as configured for one rule id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleEntry {
    pub severity: Severity,
    pub options: Vec<Value>,
}

impl RuleEntry {
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            options: Default::default(),
        }
    }

    /// Accepts a bare severity or a `[severity, ...options]` array.
    pub fn from_config_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => {
                let (first, rest) = items.split_first()?;
                Some(Self {
                    severity: Severity::from_config_value(first)?,
                    options: rest.to_vec(),
                })
            }
            _ => Some(Self::new(Severity::from_config_value(value)?)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.severity != Severity::Off
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobalValue {
    Readonly,
    Writable,
    Off,
}

impl GlobalValue {
    /// Accepts current and legacy spellings from `/* global */`
    /// comments and config files.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "readonly" | "readable" | "false" => Some(Self::Readonly),
            "writable" | "writeable" | "true" => Some(Self::Writable),
            "off" => Some(Self::Off),
            _ => None,
        }
    }
}

/// `"latest"` is stored as-is and handed to the parser untouched; the
/// core never interprets it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum EcmaVersion {
    #[default]
    Latest,
    Numeric(u32),
}

impl EcmaVersion {
    /// Accepts `"latest"` or a year/edition number.
    pub fn from_config_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) if text == "latest" => Some(Self::Latest),
            Value::Number(number) => number.as_u64().map(|version| Self::Numeric(version as u32)),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Script,
    Module,
    Commonjs,
}

#[derive(Clone, Default)]
pub struct LanguageOptions {
    pub ecma_version: EcmaVersion,
    pub source_type: SourceType,
    pub parser: Option<Rc<dyn Parser>>,
    pub globals: BTreeMap<String, GlobalValue>,
}

impl fmt::Debug for LanguageOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageOptions")
            .field("ecma_version", &self.ecma_version)
            .field("source_type", &self.source_type)
            .field("parser", &self.parser.as_ref().map(|_| "<parser>"))
            .field("globals", &self.globals)
            .finish()
    }
}

/// The sealed per-run configuration. Inline directives never mutate
/// this; they produce a per-file overlay on top of it.
#[derive(Builder, Clone, Debug, Default)]
#[builder(default, setter(into))]
pub struct LintConfig {
    pub rules: BTreeMap<String, RuleEntry>,
    pub globals: BTreeMap<String, GlobalValue>,
    pub envs: BTreeSet<String>,
    pub language_options: LanguageOptions,
    pub settings: serde_json::Map<String, Value>,
}

impl LintConfig {
    pub fn rule(&self, rule_id: &str) -> Option<&RuleEntry> {
        self.rules.get(rule_id)
    }
}

pub struct Environment {
    pub globals: &'static [(&'static str, GlobalValue)],
}

macro_rules! readonly_globals {
    ($($name:literal),* $(,)?) => {
        &[$(($name, GlobalValue::Readonly)),*]
    };
}

static ENVIRONMENTS: Lazy<BTreeMap<&'static str, Environment>> = Lazy::new(|| {
    let mut environments: BTreeMap<&'static str, Environment> = Default::default();
    environments.insert(
        "es6",
        Environment {
            globals: readonly_globals![
                "Promise", "Symbol", "Map", "Set", "WeakMap", "WeakSet", "Proxy", "Reflect",
            ],
        },
    );
    environments.insert(
        "es2017",
        Environment {
            globals: readonly_globals![
                "Promise", "Symbol", "Map", "Set", "WeakMap", "WeakSet", "Proxy", "Reflect",
                "Atomics", "SharedArrayBuffer",
            ],
        },
    );
    environments.insert(
        "es2020",
        Environment {
            globals: readonly_globals![
                "Promise", "Symbol", "Map", "Set", "WeakMap", "WeakSet", "Proxy", "Reflect",
                "Atomics", "SharedArrayBuffer", "BigInt", "globalThis",
            ],
        },
    );
    environments.insert(
        "browser",
        Environment {
            globals: readonly_globals![
                "window", "document", "navigator", "console", "alert", "fetch", "localStorage",
                "sessionStorage", "setTimeout", "setInterval", "clearTimeout", "clearInterval",
            ],
        },
    );
    environments.insert(
        "node",
        Environment {
            globals: &[
                ("process", GlobalValue::Readonly),
                ("require", GlobalValue::Readonly),
                ("console", GlobalValue::Readonly),
                ("Buffer", GlobalValue::Readonly),
                ("__dirname", GlobalValue::Readonly),
                ("__filename", GlobalValue::Readonly),
                ("module", GlobalValue::Writable),
                ("exports", GlobalValue::Writable),
                ("global", GlobalValue::Writable),
            ],
        },
    );
    environments.insert(
        "commonjs",
        Environment {
            globals: &[
                ("require", GlobalValue::Readonly),
                ("module", GlobalValue::Writable),
                ("exports", GlobalValue::Writable),
                ("global", GlobalValue::Writable),
            ],
        },
    );
    environments.insert(
        "worker",
        Environment {
            globals: readonly_globals!["self", "postMessage", "importScripts", "console"],
        },
    );
    environments.insert(
        "shared-node-browser",
        Environment {
            globals: readonly_globals![
                "console", "URL", "URLSearchParams", "setTimeout", "setInterval", "clearTimeout",
                "clearInterval",
            ],
        },
    );
    environments
});

pub fn lookup_environment(name: &str) -> Option<&'static Environment> {
    ENVIRONMENTS.get(name)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_severity_spellings() {
        assert_eq!(Severity::from_config_value(&json!(2)), Some(Severity::Error));
        assert_eq!(
            Severity::from_config_value(&json!("warn")),
            Some(Severity::Warn)
        );
        assert_eq!(
            Severity::from_config_value(&json!("off")),
            Some(Severity::Off)
        );
        assert_eq!(Severity::from_config_value(&json!(3)), None);
        assert_eq!(Severity::from_config_value(&json!(true)), None);
    }

    #[test]
    fn test_rule_entry_with_options() {
        let entry = RuleEntry::from_config_value(&json!([
            "error",
            "always",
            { "omitLastInOneLineBlock": true }
        ]))
        .unwrap();
        assert_eq!(entry.severity, Severity::Error);
        assert_eq!(entry.options.len(), 2);
        assert_eq!(entry.options[0], json!("always"));
    }

    #[test]
    fn test_global_value_legacy_spellings() {
        assert_eq!(GlobalValue::parse("writeable"), Some(GlobalValue::Writable));
        assert_eq!(GlobalValue::parse("readable"), Some(GlobalValue::Readonly));
        assert_eq!(GlobalValue::parse("true"), Some(GlobalValue::Writable));
        assert_eq!(GlobalValue::parse("whatever"), None);
    }

    #[test]
    fn test_environment_lookup() {
        assert!(lookup_environment("node").is_some());
        assert!(lookup_environment("plan9").is_none());
    }
}
