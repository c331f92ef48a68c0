//! The `import.meta.env` rewrite pass.
//!
//! Two shapes are rewritten, checked top-down on every expression:
//!
//! - `import.meta.env.NAME` becomes the output of the rule table for `NAME`.
//! - a bare `import.meta.env` becomes an object literal built from
//!   `process.env`.
//!
//! The outer member access is handled before its children are visited, so a
//! reference consumed by the first shape never reaches the second. Written-to
//! references (assignment, update and destructuring targets) are rewritten
//! only for prefixed names, since the other rules produce values that cannot
//! be assigned to.

use crate::error::Error;
use crate::plugin::NodeShape;
use crate::rules::{self, Replacement};
use crate::template::ExprTemplate;
use swc_common::Span;
use swc_ecma_ast::{Expr, MemberExpr, MemberProp, MetaPropKind, Pat, SimpleAssignTarget, UpdateExpr};
use swc_ecma_visit::{VisitMut, VisitMutWith};

/// Number of nodes replaced by each shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceStats {
    /// `import.meta.env.NAME` references replaced.
    pub properties: usize,
    /// Bare `import.meta.env` objects replaced.
    pub objects: usize,
}

impl ReplaceStats {
    #[must_use]
    pub fn total(&self) -> usize {
        self.properties + self.objects
    }
}

/// Rewrites `import.meta.env` references in one program.
pub struct MetaEnvVisitor {
    prefixes: Vec<String>,
    template: ExprTemplate,
    stats: ReplaceStats,
    error: Option<Error>,
}

impl MetaEnvVisitor {
    #[must_use]
    pub fn new(prefixes: Vec<String>) -> Self {
        Self {
            prefixes,
            template: ExprTemplate::new(),
            stats: ReplaceStats::default(),
            error: None,
        }
    }

    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    #[must_use]
    pub fn stats(&self) -> ReplaceStats {
        self.stats
    }

    /// Finish the pass, returning the first template failure if any.
    pub fn finish(self) -> Result<ReplaceStats, Error> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.stats),
        }
    }

    fn compile(&mut self, source: &str, span: Span) -> Option<Box<Expr>> {
        if self.error.is_some() {
            return None;
        }

        match self.template.compile(source, span) {
            Ok(replacement) => Some(replacement),
            Err(err) => {
                self.error = Some(err);
                None
            }
        }
    }

    fn count(&mut self, shape: NodeShape, source: &str) {
        tracing::trace!(shape = %shape, replacement = source, "rewrote import.meta.env reference");
        match shape {
            NodeShape::MemberExpression => self.stats.properties += 1,
            NodeShape::MetaProperty => self.stats.objects += 1,
        }
    }

    fn replace(&mut self, expr: &mut Expr, source: &str, span: Span, shape: NodeShape) {
        if let Some(replacement) = self.compile(source, span) {
            *expr = *replacement;
            self.count(shape, source);
        }
    }

    /// Whether `expr`, in a written-to position, must be left as is. Only
    /// prefixed `import.meta.env.NAME` references rewrite to something
    /// assignable; a bare `import.meta.env` never does.
    fn keeps_written_reference(&self, expr: &Expr) -> bool {
        let Expr::Member(member) = expr else {
            return false;
        };
        let Some(name) = env_property_name(member) else {
            return is_import_meta_env(member);
        };

        let keep = !matches!(
            rules::lookup(name, &self.prefixes),
            Some(Replacement::Prefixed(_))
        );
        if keep {
            tracing::trace!(name, "import.meta.env property written to, left as is");
        }
        keep
    }
}

impl VisitMut for MetaEnvVisitor {
    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        if let Expr::Member(member) = &*expr {
            if let Some(name) = env_property_name(member) {
                let span = member.span;
                match rules::lookup(name, &self.prefixes) {
                    Some(Replacement::WellKnown(rule)) => {
                        self.replace(expr, rule.source(), span, NodeShape::MemberExpression);
                    }
                    Some(replacement @ Replacement::Prefixed(_)) => {
                        let source = replacement.source();
                        self.replace(expr, &source, span, NodeShape::MemberExpression);
                    }
                    None => {
                        tracing::trace!(name, "no rule for import.meta.env property, left as is");
                    }
                }
                return;
            }

            if is_import_meta_env(member) {
                let span = member.span;
                let source = rules::whole_env_source(&self.prefixes);
                self.replace(expr, &source, span, NodeShape::MetaProperty);
                return;
            }
        }

        expr.visit_mut_children_with(self);
    }

    /// `import.meta.env.NAME = ...` and compound assignments. The target is
    /// not an `Expr`, so it never reaches [`Self::visit_mut_expr`].
    fn visit_mut_simple_assign_target(&mut self, target: &mut SimpleAssignTarget) {
        if let SimpleAssignTarget::Member(member) = target {
            if let Some(name) = env_property_name(member) {
                match rules::lookup(name, &self.prefixes) {
                    Some(replacement @ Replacement::Prefixed(_)) => {
                        let source = replacement.source();
                        let span = member.span;
                        if let Some(rewritten) = self.compile(&source, span) {
                            if let Expr::Member(rewritten) = *rewritten {
                                *member = rewritten;
                                self.count(NodeShape::MemberExpression, &source);
                            }
                        }
                    }
                    _ => {
                        tracing::trace!(name, "import.meta.env property written to, left as is");
                    }
                }
                return;
            }
        }

        target.visit_mut_children_with(self);
    }

    fn visit_mut_update_expr(&mut self, update: &mut UpdateExpr) {
        if self.keeps_written_reference(&update.arg) {
            return;
        }
        update.visit_mut_children_with(self);
    }

    /// Destructuring targets such as `[import.meta.env.NAME] = list`.
    fn visit_mut_pat(&mut self, pat: &mut Pat) {
        if let Pat::Expr(expr) = pat {
            if self.keeps_written_reference(expr) {
                return;
            }
        }
        pat.visit_mut_children_with(self);
    }
}

/// `NAME` in `import.meta.env.NAME`, for a static identifier property.
fn env_property_name(member: &MemberExpr) -> Option<&str> {
    let MemberProp::Ident(prop) = &member.prop else {
        return None;
    };
    let Expr::Member(env) = &*member.obj else {
        return None;
    };

    is_import_meta_env(env).then_some(&*prop.sym)
}

/// Whether `member` is exactly `import.meta.env`.
fn is_import_meta_env(member: &MemberExpr) -> bool {
    let Expr::MetaProp(meta) = &*member.obj else {
        return false;
    };

    meta.kind == MetaPropKind::ImportMeta
        && matches!(&member.prop, MemberProp::Ident(prop) if &*prop.sym == "env")
}

#[cfg(test)]
mod tests {
    use super::*;
    use swc_common::{sync::Lrc, FileName, SourceMap};
    use swc_ecma_ast::{EsVersion, Module};
    use swc_ecma_codegen::{text_writer::JsWriter, Emitter};
    use swc_ecma_parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax};

    fn parse(cm: &Lrc<SourceMap>, source: &str) -> Module {
        let fm = cm.new_source_file(Lrc::new(FileName::Anon), source.to_string());
        let lexer = Lexer::new(
            Syntax::Es(EsSyntax::default()),
            EsVersion::EsNext,
            StringInput::from(&*fm),
            None,
        );
        Parser::new_from(lexer).parse_module().unwrap()
    }

    fn emit(cm: &Lrc<SourceMap>, module: &Module) -> String {
        let mut buf = Vec::new();
        {
            let mut emitter = Emitter {
                cfg: swc_ecma_codegen::Config::default(),
                cm: cm.clone(),
                comments: None,
                wr: JsWriter::new(cm.clone(), "\n", &mut buf, None),
            };
            emitter.emit_module(module).unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    fn rewrite(source: &str, prefixes: &[&str]) -> (String, ReplaceStats) {
        let cm: Lrc<SourceMap> = Lrc::default();
        let mut module = parse(&cm, source);
        let mut visitor = MetaEnvVisitor::new(prefixes.iter().map(ToString::to_string).collect());
        module.visit_mut_with(&mut visitor);
        let stats = visitor.finish().unwrap();
        (emit(&cm, &module), stats)
    }

    fn normalized(source: &str) -> String {
        let cm: Lrc<SourceMap> = Lrc::default();
        emit(&cm, &parse(&cm, source))
    }

    #[test]
    fn test_mode_rewrites_to_node_env_with_fallback() {
        let (code, stats) = rewrite("x = import.meta.env.MODE;", &["VITE_"]);
        assert_eq!(code, normalized("x = process.env.NODE_ENV || 'test';"));
        assert_eq!(stats.properties, 1);
    }

    #[test]
    fn test_prefixed_variable_reads_process_env() {
        let (code, _) = rewrite("x = import.meta.env.VITE_API;", &["VITE_"]);
        assert_eq!(code, normalized("x = process.env.VITE_API;"));
    }

    #[test]
    fn test_unmatched_property_is_left_alone() {
        let source = "x = import.meta.env.VITE_X;";
        let (code, stats) = rewrite(source, &["APP_"]);
        assert_eq!(code, normalized(source));
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_bare_env_becomes_object() {
        let (code, stats) = rewrite("f(import.meta.env);", &["VITE_"]);
        assert!(code.contains("Object.fromEntries"));
        assert!(code.contains(r#"k.startsWith("VITE_")"#));
        assert!(!code.contains("import.meta"));
        assert_eq!(stats, ReplaceStats { properties: 0, objects: 1 });
    }

    #[test]
    fn test_computed_access_rewrites_inner_object_only() {
        let (code, stats) = rewrite("x = import.meta.env['VITE_X'];", &["VITE_"]);
        assert!(code.contains("VITE_X"));
        assert!(!code.contains("import.meta"));
        assert_eq!(stats.objects, 1);
    }

    #[test]
    fn test_other_meta_properties_are_ignored() {
        let source = "x = import.meta.url; y = import.meta.hot;";
        let (code, stats) = rewrite(source, &["VITE_"]);
        assert_eq!(code, normalized(source));
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_new_target_is_not_matched() {
        let source = "function F() { return new.target.env.PROD; }";
        let (code, stats) = rewrite(source, &["VITE_"]);
        assert_eq!(code, normalized(source));
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_nested_references_are_all_rewritten() {
        let (code, stats) = rewrite(
            "if (import.meta.env.DEV) { log(import.meta.env.VITE_A, import.meta.env.BASE_URL); }",
            &["VITE_"],
        );
        assert_eq!(
            code,
            normalized(
                "if (process.env.NODE_ENV !== 'production') { log(process.env.VITE_A, '/'); }"
            )
        );
        assert_eq!(stats.properties, 3);
    }

    #[test]
    fn test_assignment_to_prefixed_variable() {
        let (code, stats) = rewrite(
            "import.meta.env.VITE_X = 'a'; import.meta.env.VITE_Y += 'b';",
            &["VITE_"],
        );
        assert_eq!(
            code,
            normalized("process.env.VITE_X = 'a'; process.env.VITE_Y += 'b';")
        );
        assert_eq!(stats, ReplaceStats { properties: 2, objects: 0 });
    }

    #[test]
    fn test_assignment_to_well_known_or_unmatched_is_left_alone() {
        let source = "import.meta.env.MODE = 'b'; import.meta.env.OTHER = 1; import.meta.env = {};";
        let (code, stats) = rewrite(source, &["VITE_"]);
        assert_eq!(code, normalized(source));
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_update_targets() {
        let (code, stats) = rewrite(
            "import.meta.env.VITE_N++; --import.meta.env.DEV; import.meta.env++;",
            &["VITE_"],
        );
        assert_eq!(
            code,
            normalized("process.env.VITE_N++; --import.meta.env.DEV; import.meta.env++;")
        );
        assert_eq!(stats.properties, 1);
    }

    #[test]
    fn test_destructuring_targets() {
        let (code, stats) = rewrite(
            "[import.meta.env.VITE_A, import.meta.env.PROD] = xs; ({ b: import.meta.env.VITE_B } = o);",
            &["VITE_"],
        );
        assert_eq!(
            code,
            normalized("[process.env.VITE_A, import.meta.env.PROD] = xs; ({ b: process.env.VITE_B } = o);")
        );
        assert_eq!(stats.properties, 2);
    }

    #[test]
    fn test_delete_prefixed_variable() {
        let (code, _) = rewrite("delete import.meta.env.VITE_X;", &["VITE_"]);
        assert_eq!(code, normalized("delete process.env.VITE_X;"));
    }

    #[test]
    fn test_rewrite_keeps_original_span() {
        let cm: Lrc<SourceMap> = Lrc::default();
        let mut module = parse(&cm, "x = import.meta.env.PROD;");
        let original = match &module.body[0] {
            swc_ecma_ast::ModuleItem::Stmt(swc_ecma_ast::Stmt::Expr(stmt)) => match &*stmt.expr {
                Expr::Assign(assign) => match &*assign.right {
                    Expr::Member(member) => member.span,
                    other => panic!("unexpected {other:?}"),
                },
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        };

        let mut visitor = MetaEnvVisitor::new(vec!["VITE_".to_string()]);
        module.visit_mut_with(&mut visitor);

        match &module.body[0] {
            swc_ecma_ast::ModuleItem::Stmt(swc_ecma_ast::Stmt::Expr(stmt)) => match &*stmt.expr {
                Expr::Assign(assign) => match &*assign.right {
                    Expr::Bin(bin) => assert_eq!(bin.span, original),
                    other => panic!("unexpected {other:?}"),
                },
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }
}
