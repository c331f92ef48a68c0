//! Parse → rewrite → emit driver for a single source file.
//!
//! The file is parsed as an ES module (TypeScript and JSX syntax are picked
//! from the extension), rewritten by [`MetaEnvVisitor`], run through SWC's
//! `fixer` so replacements that need parentheses get them, and printed back.

#![allow(clippy::default_trait_access)]

use crate::config::MetaEnvOptions;
use crate::error::Error;
use crate::visitor::{MetaEnvVisitor, ReplaceStats};
use std::path::Path;
use swc_common::{comments::SingleThreadedComments, sync::Lrc, FileName, SourceMap};
use swc_ecma_ast::EsVersion;
use swc_ecma_codegen::{text_writer::JsWriter, Emitter};
use swc_ecma_parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax, TsSyntax};
use swc_ecma_transforms_base::fixer::fixer;
use swc_ecma_visit::{FoldWith, VisitMutWith};

/// Extensions the transform accepts.
pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "ts", "mts", "cts", "tsx"];

/// Per-file transform settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSpec {
    /// File name used for syntax detection, diagnostics and source maps.
    pub filename: String,
    /// Whether to build a source map.
    pub sourcemap: bool,
}

impl TransformSpec {
    #[must_use]
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            sourcemap: false,
        }
    }

    #[must_use]
    pub fn with_sourcemap(mut self, sourcemap: bool) -> Self {
        self.sourcemap = sourcemap;
        self
    }

    fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
    }

    fn is_typescript(&self) -> bool {
        matches!(self.extension().as_deref(), Some("ts" | "tsx" | "mts" | "cts"))
    }

    fn is_jsx(&self) -> bool {
        matches!(self.extension().as_deref(), Some("jsx" | "tsx"))
    }

    fn syntax(&self) -> Syntax {
        if self.is_typescript() {
            Syntax::Typescript(TsSyntax {
                tsx: self.is_jsx(),
                decorators: true,
                ..Default::default()
            })
        } else {
            Syntax::Es(EsSyntax {
                jsx: self.is_jsx(),
                decorators: true,
                ..Default::default()
            })
        }
    }
}

/// Whether `path` has an extension the transform understands.
#[must_use]
pub fn is_script_path(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Result of transforming one file.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub code: String,
    /// Source map JSON, when requested.
    pub source_map: Option<String>,
    pub stats: ReplaceStats,
}

/// Rewrite every `import.meta.env` reference in `source`.
pub fn transform(
    source: &str,
    spec: &TransformSpec,
    options: &MetaEnvOptions,
) -> Result<TransformOutput, Error> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        Lrc::new(FileName::Custom(spec.filename.clone())),
        source.to_string(),
    );

    let comments = SingleThreadedComments::default();
    let lexer = Lexer::new(
        spec.syntax(),
        EsVersion::EsNext,
        StringInput::from(&*fm),
        Some(&comments),
    );

    let mut parser = Parser::new_from(lexer);
    let mut module = parser.parse_module().map_err(|e| Error::Parse {
        filename: spec.filename.clone(),
        message: format!("{:?}", e.kind()),
    })?;

    let errors: Vec<String> = parser
        .take_errors()
        .into_iter()
        .map(|e| format!("{:?}", e.kind()))
        .collect();
    if !errors.is_empty() {
        return Err(Error::Parse {
            filename: spec.filename.clone(),
            message: errors.join(", "),
        });
    }

    let prefixes = options.prefixes();
    tracing::debug!(file = %spec.filename, ?prefixes, "rewriting import.meta.env");

    let mut visitor = MetaEnvVisitor::new(prefixes);
    module.visit_mut_with(&mut visitor);
    let stats = visitor.finish()?;

    let module = module.fold_with(&mut fixer(Some(&comments)));

    let mut buf = Vec::new();
    let mut src_map_buf = Vec::new();
    {
        let src_map = spec.sourcemap.then_some(&mut src_map_buf);
        let writer = JsWriter::new(cm.clone(), "\n", &mut buf, src_map);

        let mut emitter = Emitter {
            cfg: swc_ecma_codegen::Config::default().with_target(EsVersion::EsNext),
            cm: cm.clone(),
            comments: Some(&comments),
            wr: writer,
        };

        emitter.emit_module(&module).map_err(|e| Error::Emit {
            filename: spec.filename.clone(),
            message: e.to_string(),
        })?;
    }

    let code = String::from_utf8(buf).map_err(|e| Error::Emit {
        filename: spec.filename.clone(),
        message: format!("Invalid UTF-8 output: {e}"),
    })?;

    let source_map = if spec.sourcemap {
        let srcmap = cm.build_source_map(&src_map_buf);
        let mut map_buf = Vec::new();
        srcmap.to_writer(&mut map_buf).map_err(|e| Error::Emit {
            filename: spec.filename.clone(),
            message: format!("Failed to write source map: {e}"),
        })?;
        Some(String::from_utf8(map_buf).map_err(|e| Error::Emit {
            filename: spec.filename.clone(),
            message: format!("Invalid UTF-8 source map: {e}"),
        })?)
    } else {
        None
    };

    tracing::debug!(
        file = %spec.filename,
        properties = stats.properties,
        objects = stats.objects,
        "rewrote import.meta.env"
    );

    Ok(TransformOutput {
        code,
        source_map,
        stats,
    })
}
