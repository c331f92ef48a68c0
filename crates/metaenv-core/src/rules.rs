//! Replacement rules for `import.meta.env` references.
//!
//! Rules are tried in order and the first match wins. The well-known names
//! come before the prefix fallback, so `VITE_`-style prefixes never shadow
//! them.

use std::fmt;

/// Variables Vite always defines on `import.meta.env`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnown {
    /// `NODE_ENV` and its alias `MODE`.
    NodeEnv,
    BaseUrl,
    Dev,
    Prod,
}

impl WellKnown {
    /// Rule order for the well-known names.
    pub const ALL: [Self; 4] = [Self::NodeEnv, Self::BaseUrl, Self::Dev, Self::Prod];

    /// Match a variable name against the well-known rules.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rule| rule.matches(name))
    }

    #[must_use]
    pub fn matches(self, name: &str) -> bool {
        match self {
            Self::NodeEnv => name == "NODE_ENV" || name == "MODE",
            Self::BaseUrl => name == "BASE_URL",
            Self::Dev => name == "DEV",
            Self::Prod => name == "PROD",
        }
    }

    /// Expression source that stands in for the variable.
    #[must_use]
    pub fn source(self) -> &'static str {
        match self {
            Self::NodeEnv => "process.env.NODE_ENV || 'test'",
            Self::BaseUrl => "'/'",
            Self::Dev => "process.env.NODE_ENV !== 'production'",
            Self::Prod => "process.env.NODE_ENV === 'production'",
        }
    }
}

/// What a single `import.meta.env.NAME` reference becomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    WellKnown(WellKnown),
    /// A prefixed variable, read straight from `process.env` with no default.
    Prefixed(String),
}

impl Replacement {
    #[must_use]
    pub fn source(&self) -> String {
        match self {
            Self::WellKnown(rule) => rule.source().to_string(),
            Self::Prefixed(name) => format!("process.env.{name}"),
        }
    }
}

impl fmt::Display for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source())
    }
}

/// Find the replacement for `name`, or `None` when the reference must be
/// left alone.
#[must_use]
pub fn lookup(name: &str, prefixes: &[String]) -> Option<Replacement> {
    if let Some(rule) = WellKnown::from_name(name) {
        return Some(Replacement::WellKnown(rule));
    }

    prefixes
        .iter()
        .any(|prefix| name.starts_with(prefix.as_str()))
        .then(|| Replacement::Prefixed(name.to_string()))
}

/// Object-literal source that stands in for a bare `import.meta.env`.
///
/// One spread per prefix (later spreads win on duplicate keys), followed by
/// the well-known keys.
#[must_use]
pub fn whole_env_source(prefixes: &[String]) -> String {
    let mut source = String::from("{\n");

    for prefix in prefixes {
        // A JSON string is a valid JS string literal for any prefix text.
        let literal = serde_json::Value::String(prefix.clone());
        source.push_str(&format!(
            "  ...Object.fromEntries(Object.entries(process.env).filter(([k]) => k.startsWith({literal}))),\n"
        ));
    }

    let node_env = WellKnown::NodeEnv.source();
    source.push_str(&format!("  NODE_ENV: {node_env},\n"));
    source.push_str(&format!("  MODE: {node_env},\n"));
    source.push_str(&format!("  BASE_URL: {},\n", WellKnown::BaseUrl.source()));
    source.push_str(&format!("  DEV: {},\n", WellKnown::Dev.source()));
    source.push_str(&format!("  PROD: {}\n", WellKnown::Prod.source()));
    source.push('}');

    source
}
