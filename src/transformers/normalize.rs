use swc_core::common::Spanned;
use swc_core::ecma::ast::{Decl, Expr, ExprStmt, Stmt, VarDecl};
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

/// Splits comma sequences and multi-declarator statements into siblings so
/// later passes can replace or delete the pieces individually.
pub struct Visitor;

impl VisitMut for Visitor {
    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        stmts.visit_mut_children_with(self);

        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts.drain(..) {
            match stmt {
                // (a(), b(), c());  ->  a(); b(); c();
                Stmt::Expr(ExprStmt { expr, .. }) if matches!(*expr, Expr::Seq(_)) => {
                    let Expr::Seq(seq) = *expr else { unreachable!() };
                    for expr in seq.exprs {
                        out.push(Stmt::Expr(ExprStmt {
                            span: expr.span(),
                            expr,
                        }));
                    }
                }
                // var a, b;  ->  var a; var b;
                Stmt::Decl(Decl::Var(var)) if var.decls.len() > 1 => {
                    let kind = var.kind;
                    for decl in var.decls {
                        out.push(Stmt::Decl(Decl::Var(Box::new(VarDecl {
                            span: decl.span,
                            kind,
                            declare: false,
                            decls: vec![decl],
                        }))));
                    }
                }
                other => out.push(other),
            }
        }
        *stmts = out;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::codegen;
    use swc_core::ecma::ast::Program;

    fn normalize(source: &str) -> Vec<Stmt> {
        let (_, mut program) = codegen::parse(source).unwrap();
        program.visit_mut_with(&mut Visitor);
        let Program::Script(script) = program else {
            unreachable!()
        };
        script.body
    }

    #[test]
    fn flattens_top_level_sequences() {
        let stmts = normalize("a(), b(), c();");
        assert_eq!(stmts.len(), 3);
        assert!(stmts.iter().all(|s| matches!(s, Stmt::Expr(_))));
    }

    #[test]
    fn splits_multi_declarators() {
        let stmts = normalize("var a = 1, b = 2, c;");
        assert_eq!(stmts.len(), 3);
        for stmt in &stmts {
            let Stmt::Decl(Decl::Var(var)) = stmt else {
                panic!("expected var decl");
            };
            assert_eq!(var.decls.len(), 1);
        }
    }

    #[test]
    fn leaves_nested_sequences_alone() {
        let stmts = normalize("var x = (a(), b());");
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn reaches_into_function_bodies() {
        let stmts = normalize("function f() { var a = 1, b = 2; }");
        let Stmt::Decl(Decl::Fn(f)) = &stmts[0] else {
            panic!("expected fn decl");
        };
        assert_eq!(f.function.body.as_ref().unwrap().stmts.len(), 2);
    }
}
