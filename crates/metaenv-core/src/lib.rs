#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! Rewrites Vite's `import.meta.env` into plain `process.env` lookups so code
//! written for the bundler runs unmodified under Node-based tooling such as a
//! test runner.

pub mod config;
pub mod error;
pub mod plugin;
pub mod rules;
pub mod template;
pub mod transform;
pub mod version;
pub mod visitor;

pub use config::{resolve_prefixes, EnvPrefix, MetaEnvOptions, DEFAULT_ENV_PREFIX};
pub use error::Error;
pub use plugin::{MetaEnvPlugin, NodeShape, Plugin, PluginContainer, PLUGIN_NAME};
pub use rules::{lookup, Replacement, WellKnown};
pub use transform::{transform, TransformOutput, TransformSpec};
pub use version::VERSION;
pub use visitor::{MetaEnvVisitor, ReplaceStats};
