use std::collections::HashMap;

use swc_core::common::{Span, Spanned, DUMMY_SP};
use swc_core::ecma::ast::{Decl, Expr, Program, SimpleAssignTarget, Stmt};
use swc_core::ecma::visit::{Visit, VisitMut, VisitMutWith, VisitWith};

use crate::cache::{AnalysisCache, ProxyRecord};
use crate::utils::ast;

/// Deletes everything the earlier passes condemned: decoder definitions,
/// their support array and shuffler, proxy-object definitions and the
/// assignments that built them. Matching is by source span, which survives
/// both tree surgery and the beautifier's renames.
pub struct Visitor {
    kill_spans: Vec<Span>,
}

impl Visitor {
    pub fn new(cache: &AnalysisCache) -> Self {
        let mut kill_spans = cache.support_spans.clone();
        kill_spans.extend(cache.kill_spans.iter().copied());
        for record in cache.proxies.values() {
            match record {
                ProxyRecord::Confirmed { decl_span, .. } => kill_spans.push(*decl_span),
                ProxyRecord::Doubted {
                    props,
                    decl_span,
                    assign_spans,
                    ..
                } => {
                    // an empty doubted record never produced anything, so
                    // its declaration is left for the prune to judge
                    if !props.is_empty() {
                        kill_spans.push(*decl_span);
                        kill_spans.extend(assign_spans.iter().copied());
                    }
                }
            }
        }
        kill_spans.retain(|span| *span != DUMMY_SP);
        Self { kill_spans }
    }

    fn condemned(&self, stmt: &Stmt) -> bool {
        if self.kill_spans.contains(&stmt.span()) {
            return true;
        }
        // assignment spans are recorded on the expression, one level below
        // its statement
        match stmt {
            Stmt::Expr(stmt) => self.kill_spans.contains(&stmt.expr.span()),
            _ => false,
        }
    }
}

impl VisitMut for Visitor {
    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        stmts.visit_mut_children_with(self);
        stmts.retain(|stmt| !matches!(stmt, Stmt::Empty(_)) && !self.condemned(stmt));
    }
}

/// Removes obfuscator-generated declarations that nothing references any
/// more. Only hex-pattern names with side-effect-free initializers qualify,
/// so hand-written code passes through untouched.
pub struct Pruner {
    use_counts: HashMap<String, usize>,
}

impl Pruner {
    pub fn new(program: &Program) -> Self {
        #[derive(Default)]
        struct UseCounter {
            counts: HashMap<String, usize>,
        }
        impl Visit for UseCounter {
            fn visit_expr(&mut self, n: &Expr) {
                if let Expr::Ident(id) = n {
                    *self.counts.entry(id.sym.to_string()).or_insert(0) += 1;
                }
                n.visit_children_with(self);
            }
            fn visit_simple_assign_target(&mut self, n: &SimpleAssignTarget) {
                if let SimpleAssignTarget::Ident(binding) = n {
                    *self.counts.entry(binding.id.sym.to_string()).or_insert(0) += 1;
                }
                n.visit_children_with(self);
            }
        }

        let mut counter = UseCounter::default();
        program.visit_with(&mut counter);
        Self {
            use_counts: counter.counts,
        }
    }

    fn prunable(&self, stmt: &Stmt) -> bool {
        let Stmt::Decl(Decl::Var(var)) = stmt else {
            return false;
        };
        let Some(decl) = ast::single_declarator(var) else {
            return false;
        };
        let Some(id) = ast::declarator_name(decl) else {
            return false;
        };
        if !ast::is_hex_name(&id.sym) {
            return false;
        }
        if self.use_counts.get(&*id.sym).copied().unwrap_or(0) > 0 {
            return false;
        }
        decl.init.as_deref().map_or(true, ast::is_pure_expr)
    }
}

impl VisitMut for Pruner {
    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        stmts.visit_mut_children_with(self);
        stmts.retain(|stmt| !self.prunable(stmt));
    }
}
