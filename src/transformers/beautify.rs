use std::collections::{HashMap, HashSet};

use swc_core::ecma::ast::{
    AssignExpr, CallExpr, Callee, CatchClause, ComputedPropName, Expr, FnDecl, Ident,
    KeyValueProp, Lit, MemberExpr, MemberProp, NewExpr, Param, Pat, Program, Prop, PropName,
    SuperProp, SuperPropExpr, VarDeclarator,
};
use swc_core::ecma::visit::{Visit, VisitMut, VisitMutWith, VisitWith};

use crate::utils::ast;

/// Renames obfuscator-mangled identifiers from their declaration context:
/// `var _0x4a2f = []` becomes `_array`, a catch binding becomes `_error`,
/// and so on. One survey pass gathers hints and every name in use, then a
/// single substitution pass applies collision-free replacements everywhere.
pub struct Visitor;

impl VisitMut for Visitor {
    fn visit_mut_program(&mut self, program: &mut Program) {
        let mut survey = Survey::default();
        program.visit_with(&mut survey);
        let renames = assign_names(survey);
        if renames.is_empty() {
            return;
        }
        log::info!("renaming {} mangled identifiers", renames.len());
        program.visit_mut_with(&mut Renamer { renames });
    }
}

#[derive(Default)]
struct Survey {
    used: HashSet<String>,
    hinted: HashSet<String>,
    hints: Vec<(String, String)>,
}

impl Survey {
    fn hint(&mut self, name: &str, hint: impl Into<String>) {
        if self.hinted.insert(name.to_string()) {
            self.hints.push((name.to_string(), hint.into()));
        }
    }
}

impl Visit for Survey {
    fn visit_ident(&mut self, n: &Ident) {
        self.used.insert(n.sym.to_string());
    }

    fn visit_var_declarator(&mut self, n: &VarDeclarator) {
        n.visit_children_with(self);
        let Pat::Ident(binding) = &n.name else {
            return;
        };
        if !ast::is_hex_name(&binding.id.sym) {
            return;
        }
        if let Some(hint) = n.init.as_deref().and_then(init_hint) {
            self.hint(&binding.id.sym, hint);
        }
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        n.visit_children_with(self);
        if ast::is_hex_name(&n.ident.sym) {
            self.hint(&n.ident.sym, "func");
        }
    }

    fn visit_param(&mut self, n: &Param) {
        n.visit_children_with(self);
        if let Pat::Ident(binding) = &n.pat {
            if ast::is_hex_name(&binding.id.sym) {
                self.hint(&binding.id.sym, "param");
            }
        }
    }

    fn visit_catch_clause(&mut self, n: &CatchClause) {
        n.visit_children_with(self);
        if let Some(Pat::Ident(binding)) = &n.param {
            if ast::is_hex_name(&binding.id.sym) {
                self.hint(&binding.id.sym, "error");
            }
        }
    }

    // { name: _0x4a2f }  ->  the value binding is named after the key
    fn visit_key_value_prop(&mut self, n: &KeyValueProp) {
        n.visit_children_with(self);
        if let (PropName::Ident(key), Expr::Ident(value)) = (&n.key, &*n.value) {
            if !key.sym.starts_with('_') && value.sym.starts_with('_') {
                self.hint(&value.sym, key.sym.to_string());
            }
        }
    }

    // _0x4a2f.name = "jQuery"  /  _0x4a2f.define = ..
    fn visit_assign_expr(&mut self, n: &AssignExpr) {
        n.visit_children_with(self);
        let Some(member) = n.left.as_simple().and_then(|s| s.as_member()) else {
            return;
        };
        let Expr::Ident(obj) = &*member.obj else {
            return;
        };
        if !obj.sym.starts_with('_') {
            return;
        }
        match ast::member_key_string(&member.prop).as_deref() {
            Some("name") => {
                if let Expr::Lit(Lit::Str(s)) = &*n.right {
                    self.hint(&obj.sym, s.value.to_string());
                }
            }
            Some("define") => self.hint(&obj.sym, "lib"),
            _ => {}
        }
    }
}

fn init_hint(init: &Expr) -> Option<String> {
    match init {
        Expr::Array(_) => Some("array".into()),
        Expr::Lit(Lit::Bool(_)) => Some("bool".into()),
        Expr::Lit(Lit::Num(_)) => Some("num".into()),
        Expr::Lit(Lit::Str(_)) => Some("str".into()),
        Expr::Object(_) => Some("obj".into()),
        Expr::This(_) => Some("self".into()),
        Expr::Fn(_) | Expr::Arrow(_) => Some("func".into()),
        Expr::Call(CallExpr { callee, .. }) => match callee {
            Callee::Expr(callee) => match &**callee {
                Expr::Ident(id) => Some(id.sym.to_lowercase()),
                Expr::Fn(_) | Expr::Paren(_) => Some("funcValue".into()),
                _ => None,
            },
            _ => None,
        },
        Expr::Member(MemberExpr { prop, .. }) => ast::member_key_string(prop),
        Expr::New(NewExpr { callee, .. }) => match &**callee {
            Expr::Ident(id) => Some(id.sym.to_lowercase()),
            _ => None,
        },
        _ => None,
    }
}

/// Turns hints into fresh names that collide with nothing already in the
/// program nor with each other.
fn assign_names(mut survey: Survey) -> HashMap<String, String> {
    let hints = std::mem::take(&mut survey.hints);
    let mut renames = HashMap::new();
    for (old, hint) in hints {
        let base = sanitize(&hint);
        let mut candidate = format!("_{base}");
        let mut n = 1usize;
        while survey.used.contains(&candidate) {
            n += 1;
            candidate = format!("_{base}{n}");
        }
        survey.used.insert(candidate.clone());
        renames.insert(old, candidate);
    }
    renames
}

fn sanitize(hint: &str) -> String {
    let mut out = String::new();
    for ch in hint.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' {
            if out.is_empty() && ch.is_ascii_digit() {
                out.push('n');
            }
            out.push(ch);
        }
    }
    if out.is_empty() {
        out.push_str("tmp");
    }
    out
}

/// Applies the rename map to every binding and reference while leaving
/// dot-position member properties and literal object keys untouched.
struct Renamer {
    renames: HashMap<String, String>,
}

impl VisitMut for Renamer {
    fn visit_mut_ident(&mut self, n: &mut Ident) {
        if let Some(new) = self.renames.get(&*n.sym) {
            n.sym = new.as_str().into();
        }
    }

    fn visit_mut_member_expr(&mut self, n: &mut MemberExpr) {
        n.obj.visit_mut_with(self);
        if let MemberProp::Computed(computed) = &mut n.prop {
            computed.visit_mut_with(self);
        }
    }

    fn visit_mut_super_prop_expr(&mut self, n: &mut SuperPropExpr) {
        if let SuperProp::Computed(computed) = &mut n.prop {
            computed.visit_mut_with(self);
        }
    }

    fn visit_mut_prop_name(&mut self, n: &mut PropName) {
        if let PropName::Computed(ComputedPropName { expr, .. }) = n {
            expr.visit_mut_with(self);
        }
    }

    fn visit_mut_prop(&mut self, n: &mut Prop) {
        // { _0x4a2f }  ->  { _0x4a2f: _array }, keeping the emitted key
        if let Prop::Shorthand(id) = n {
            if let Some(new) = self.renames.get(&*id.sym) {
                *n = Prop::KeyValue(KeyValueProp {
                    key: PropName::Ident(id.clone()),
                    value: Box::new(Expr::Ident(Ident::new(new.as_str().into(), id.span))),
                });
                return;
            }
        }
        n.visit_mut_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::codegen;

    fn beautify(source: &str) -> String {
        let (cm, mut program) = codegen::parse(source).unwrap();
        program.visit_mut_with(&mut Visitor);
        codegen::generate(&cm, &program).unwrap()
    }

    #[test]
    fn renames_by_declaration_context() {
        let out = beautify("var _0x1a = []; _0x1a.push(1);");
        assert!(out.contains("var _array = []"), "{out}");
        assert!(out.contains("_array.push(1)"), "{out}");
    }

    #[test]
    fn picks_distinct_names_on_collision() {
        let out = beautify("var _0x1 = 1; var _0x2 = 2; var _num = 0;");
        assert!(out.contains("_num2"), "{out}");
        assert!(out.contains("_num3"), "{out}");
    }

    #[test]
    fn catch_and_params_get_hints() {
        let out = beautify(
            "function f(_0xaa) { try { return _0xaa; } catch (_0xbb) { return _0xbb; } }",
        );
        assert!(out.contains("_param"), "{out}");
        assert!(out.contains("catch (_error)"), "{out}");
    }

    #[test]
    fn member_properties_keep_their_names() {
        let out = beautify("var _0x1 = {}; win._0x1 = 2; var x = win._0x1;");
        assert!(out.contains("win._0x1"), "{out}");
    }

    #[test]
    fn sanitize_produces_identifier_bases() {
        assert_eq!(sanitize("split-me now"), "splitmenow");
        assert_eq!(sanitize("404"), "n404");
        assert_eq!(sanitize("~~~"), "tmp");
    }
}
