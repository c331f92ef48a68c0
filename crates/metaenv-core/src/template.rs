//! Source-string expression templates.
//!
//! Replacements are written as JavaScript source and parsed on demand, so the
//! rule table reads like the code it produces.

use crate::error::Error;
use swc_common::{sync::Lrc, FileName, SourceMap, Span};
use swc_ecma_ast::{EsVersion, Expr};
use swc_ecma_parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax};
use swc_ecma_visit::{VisitMut, VisitMutWith};

/// Compiles template sources into expression nodes.
pub struct ExprTemplate {
    cm: Lrc<SourceMap>,
}

impl Default for ExprTemplate {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprTemplate {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cm: Lrc::default(),
        }
    }

    /// Parse `source` as a single expression and give every node `span`.
    ///
    /// The span is the one of the node being replaced, so source maps for the
    /// rewritten file point at the original `import.meta.env` reference.
    pub fn compile(&self, source: &str, span: Span) -> Result<Box<Expr>, Error> {
        let fm = self
            .cm
            .new_source_file(Lrc::new(FileName::Anon), source.to_string());

        let lexer = Lexer::new(
            Syntax::Es(EsSyntax::default()),
            EsVersion::EsNext,
            StringInput::from(&*fm),
            None,
        );
        let mut parser = Parser::new_from(lexer);

        let mut expr = parser.parse_expr().map_err(|e| Error::Template {
            source_text: source.to_string(),
            message: format!("{:?}", e.kind()),
        })?;

        if let Some(e) = parser.take_errors().into_iter().next() {
            return Err(Error::Template {
                source_text: source.to_string(),
                message: format!("{:?}", e.kind()),
            });
        }

        expr.visit_mut_with(&mut Respan(span));
        Ok(expr)
    }
}

struct Respan(Span);

impl VisitMut for Respan {
    fn visit_mut_span(&mut self, span: &mut Span) {
        *span = self.0;
    }
}
