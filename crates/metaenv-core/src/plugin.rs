//! Host-pipeline surface for the rewrite.
//!
//! A host build pipeline sees the pass as a named plugin with a `transform`
//! hook, in the style of Rollup/Vite plugins:
//!
//! ```ignore
//! use metaenv_core::plugin::{MetaEnvPlugin, PluginContainer};
//! use metaenv_core::MetaEnvOptions;
//!
//! let mut container = PluginContainer::new();
//! container.add(Box::new(MetaEnvPlugin::new(MetaEnvOptions::new().with_env_prefix("APP_"))));
//!
//! let code = container.transform("export const url = import.meta.env.APP_URL;", "src/config.ts")?;
//! ```

use crate::config::MetaEnvOptions;
use crate::error::Error;
use crate::transform::{is_script_path, transform, TransformOutput, TransformSpec};
use crate::visitor::MetaEnvVisitor;
use std::fmt;

/// Name the plugin registers under.
pub const PLUGIN_NAME: &str = "vite-meta-env";

/// Result type for plugin hooks.
pub type HookResult<T> = Result<T, PluginError>;

/// Error from a plugin.
#[derive(Debug)]
pub struct PluginError {
    /// Plugin name that caused the error.
    pub plugin: String,
    /// Hook that failed.
    pub hook: &'static str,
    /// Module ID being processed.
    pub id: String,
    pub source: Error,
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}: {}", self.plugin, self.hook, self.id, self.source)
    }
}

impl std::error::Error for PluginError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// AST node shapes the plugin visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeShape {
    /// `import.meta.env.NAME`
    MemberExpression,
    /// `import.meta` directly under `.env`
    MetaProperty,
}

impl NodeShape {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MemberExpression => "MemberExpression",
            Self::MetaProperty => "MetaProperty",
        }
    }
}

impl fmt::Display for NodeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the transform hook.
#[derive(Debug, Clone)]
pub struct TransformResult {
    /// Transformed code.
    pub code: String,
    /// Optional source map.
    pub map: Option<String>,
}

impl TransformResult {
    /// Create a transform result with code only.
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
        }
    }
}

impl From<TransformOutput> for TransformResult {
    fn from(output: TransformOutput) -> Self {
        Self {
            code: output.code,
            map: output.source_map,
        }
    }
}

/// A build-pipeline plugin.
pub trait Plugin: Send + Sync {
    /// Plugin name for debugging and error messages.
    fn name(&self) -> &str;

    /// Transform module source code.
    ///
    /// Return `Some(result)` to transform the code, or `None` to pass it through.
    fn transform(&self, _code: &str, _id: &str) -> HookResult<Option<TransformResult>> {
        Ok(None)
    }
}

/// The `import.meta.env` plugin, configured for one invocation.
#[derive(Debug, Clone, Default)]
pub struct MetaEnvPlugin {
    options: MetaEnvOptions,
    sourcemap: bool,
}

impl MetaEnvPlugin {
    /// Plugin factory.
    #[must_use]
    pub fn new(options: MetaEnvOptions) -> Self {
        Self {
            options,
            sourcemap: false,
        }
    }

    /// Emit source maps from the transform hook.
    #[must_use]
    pub fn with_sourcemap(mut self, sourcemap: bool) -> Self {
        self.sourcemap = sourcemap;
        self
    }

    /// The node shapes [`Self::visitor`] rewrites.
    #[must_use]
    pub fn shapes(&self) -> [NodeShape; 2] {
        [NodeShape::MemberExpression, NodeShape::MetaProperty]
    }

    /// A fresh visitor for one program, for hosts that drive the AST walk
    /// themselves.
    #[must_use]
    pub fn visitor(&self) -> MetaEnvVisitor {
        MetaEnvVisitor::new(self.options.prefixes())
    }
}

impl Plugin for MetaEnvPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn transform(&self, code: &str, id: &str) -> HookResult<Option<TransformResult>> {
        if !is_script_path(id) {
            return Ok(None);
        }

        let filename = id.split(['?', '#']).next().unwrap_or(id);
        let spec = TransformSpec::new(filename).with_sourcemap(self.sourcemap);

        let output = transform(code, &spec, &self.options).map_err(|source| PluginError {
            plugin: PLUGIN_NAME.to_string(),
            hook: "transform",
            id: id.to_string(),
            source,
        })?;

        if output.stats.total() == 0 {
            return Ok(None);
        }

        Ok(Some(output.into()))
    }
}

/// Runs plugins in insertion order, feeding each one's output to the next.
#[derive(Default)]
pub struct PluginContainer {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginContainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Transform code through all plugins.
    pub fn transform(&self, code: &str, id: &str) -> HookResult<String> {
        let mut current = code.to_string();
        for plugin in &self.plugins {
            if let Some(result) = plugin.transform(&current, id)? {
                tracing::debug!(plugin = plugin.name(), id, "plugin transformed module");
                current = result.code;
            }
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swc_ecma_visit::VisitMutWith;

    #[test]
    fn test_plugin_descriptor() {
        let plugin = MetaEnvPlugin::new(MetaEnvOptions::default());
        assert_eq!(plugin.name(), "vite-meta-env");
        assert_eq!(
            plugin.shapes().map(|shape| shape.to_string()),
            ["MemberExpression", "MetaProperty"]
        );
    }

    #[test]
    fn test_visitor_uses_resolved_prefixes() {
        let plugin = MetaEnvPlugin::new(MetaEnvOptions::new().with_env_prefix("APP_"));
        assert_eq!(plugin.visitor().prefixes(), ["APP_".to_string()]);
    }

    #[test]
    fn test_transform_hook_rewrites() {
        let plugin = MetaEnvPlugin::new(MetaEnvOptions::default());
        let result = plugin
            .transform("export const api = import.meta.env.VITE_API;", "src/api.ts")
            .unwrap()
            .unwrap();

        assert!(result.code.contains("process.env.VITE_API"));
        assert!(result.map.is_none());
    }

    #[test]
    fn test_transform_hook_with_sourcemap() {
        let plugin = MetaEnvPlugin::new(MetaEnvOptions::default()).with_sourcemap(true);
        let result = plugin
            .transform("export const dev = import.meta.env.DEV;", "src/flags.js?v=1")
            .unwrap()
            .unwrap();

        assert!(result.map.unwrap().contains("flags.js"));
    }

    #[test]
    fn test_transform_hook_skips_non_scripts() {
        let plugin = MetaEnvPlugin::new(MetaEnvOptions::default());
        let result = plugin
            .transform("body { color: red; } /* import.meta */", "styles.css")
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_transform_hook_skips_sources_without_import_meta() {
        let plugin = MetaEnvPlugin::new(MetaEnvOptions::default());
        let result = plugin.transform("export const x = 1;", "src/x.js").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_transform_hook_sees_through_comments() {
        let plugin = MetaEnvPlugin::new(MetaEnvOptions::default());
        let result = plugin
            .transform("export const dev = import /* meta */ .meta.env.DEV;", "src/x.js")
            .unwrap()
            .unwrap();
        assert!(result.code.contains("process.env.NODE_ENV !== 'production'"));
    }

    #[test]
    fn test_transform_hook_passes_through_when_nothing_matches() {
        let plugin = MetaEnvPlugin::new(MetaEnvOptions::default());
        let result = plugin
            .transform("export const url = import.meta.url;", "src/x.js")
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_transform_hook_reports_parse_errors() {
        let plugin = MetaEnvPlugin::new(MetaEnvOptions::default());
        let err = plugin
            .transform("const x = import.meta.env.DEV +;", "src/broken.js")
            .unwrap_err();

        assert_eq!(err.plugin, "vite-meta-env");
        assert_eq!(err.hook, "transform");
        assert!(matches!(err.source, Error::Parse { .. }));
        assert!(err.to_string().starts_with("[vite-meta-env] transform src/broken.js"));
    }

    #[test]
    fn test_host_driven_visitor() {
        use swc_common::{sync::Lrc, FileName, SourceMap};
        use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax};

        let cm: Lrc<SourceMap> = Lrc::default();
        let fm = cm.new_source_file(
            Lrc::new(FileName::Anon),
            "a(import.meta.env.PROD, import.meta.env);".to_string(),
        );
        let lexer = Lexer::new(
            Syntax::default(),
            swc_ecma_ast::EsVersion::EsNext,
            StringInput::from(&*fm),
            None,
        );
        let mut module = Parser::new_from(lexer).parse_module().unwrap();

        let plugin = MetaEnvPlugin::new(MetaEnvOptions::default());
        let mut visitor = plugin.visitor();
        module.visit_mut_with(&mut visitor);

        let stats = visitor.finish().unwrap();
        assert_eq!(stats.properties, 1);
        assert_eq!(stats.objects, 1);
    }

    #[test]
    fn test_plugin_container_chains() {
        struct Suffix;

        impl Plugin for Suffix {
            fn name(&self) -> &str {
                "suffix"
            }

            fn transform(&self, code: &str, _id: &str) -> HookResult<Option<TransformResult>> {
                Ok(Some(TransformResult::code(format!("{code}// done\n"))))
            }
        }

        let mut container = PluginContainer::new();
        container.add(Box::new(MetaEnvPlugin::new(MetaEnvOptions::default())));
        container.add(Box::new(Suffix));

        let code = container
            .transform("const base = import.meta.env.BASE_URL;", "main.js")
            .unwrap();
        assert!(code.contains("const base = '/'"));
        assert!(code.ends_with("// done\n"));
    }
}
