use once_cell::sync::Lazy;
use regex::Regex;
use swc_core::common::DUMMY_SP;
use swc_core::ecma::ast::{
    Bool, CallExpr, Decl, Expr, Function, Ident, Lit, MemberProp, Pat, Prop, PropName,
    PropOrSpread, Stmt, UnaryOp, VarDecl, VarDeclarator,
};

static IDENT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());

static HEX_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^_0x[0-9a-fA-F]+$").unwrap());

/// Whether `name` can be written in dot/key position without quoting.
/// Reserved words are fine there since ES5.
pub fn is_valid_ident_name(name: &str) -> bool {
    IDENT_NAME_RE.is_match(name)
}

/// Obfuscator-generated identifier, e.g. `_0x4a2f`.
pub fn is_hex_name(name: &str) -> bool {
    HEX_NAME_RE.is_match(name)
}

pub fn ident(sym: &str) -> Ident {
    Ident::new(sym.into(), DUMMY_SP)
}

pub fn bool_lit(value: bool) -> Expr {
    Expr::Lit(Lit::Bool(Bool {
        span: DUMMY_SP,
        value,
    }))
}

pub fn unwrap_parens(expr: &Expr) -> &Expr {
    let mut expr = expr;
    while let Expr::Paren(paren) = expr {
        expr = &paren.expr;
    }
    expr
}

pub fn single_declarator(var: &VarDecl) -> Option<&VarDeclarator> {
    match var.decls.as_slice() {
        [decl] => Some(decl),
        _ => None,
    }
}

pub fn declarator_name(decl: &VarDeclarator) -> Option<&Ident> {
    match &decl.name {
        Pat::Ident(binding) => Some(&binding.id),
        _ => None,
    }
}

/// `function f(..) {..}` or `var f = function (..) {..};` after declarator
/// splitting.
pub fn named_function(stmt: &Stmt) -> Option<(&Ident, &Function)> {
    match stmt {
        Stmt::Decl(Decl::Fn(f)) => Some((&f.ident, &f.function)),
        Stmt::Decl(Decl::Var(v)) => {
            let decl = single_declarator(v)?;
            let id = declarator_name(decl)?;
            match decl.init.as_deref() {
                Some(Expr::Fn(f)) => Some((id, &f.function)),
                _ => None,
            }
        }
        _ => None,
    }
}

pub fn declares_name(stmt: &Stmt, name: &str) -> bool {
    match stmt {
        Stmt::Decl(Decl::Var(v)) => single_declarator(v)
            .and_then(declarator_name)
            .map_or(false, |id| &*id.sym == name),
        _ => false,
    }
}

pub fn prop_key_string(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(id) => Some(id.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        _ => None,
    }
}

pub fn member_key_string(prop: &MemberProp) -> Option<String> {
    match prop {
        MemberProp::Ident(id) => Some(id.sym.to_string()),
        MemberProp::Computed(computed) => match &*computed.expr {
            Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
            _ => None,
        },
        _ => None,
    }
}

/// The returned expression of a body that is a single `return`, optionally
/// preceded by one variable declaration whose value does not matter.
pub fn single_return_body(function: &Function) -> Option<&Expr> {
    let body = function.body.as_ref()?;
    let ret = match body.stmts.as_slice() {
        [Stmt::Return(ret)] => ret,
        [Stmt::Decl(Decl::Var(_)), Stmt::Return(ret)] => ret,
        _ => return None,
    };
    ret.arg.as_deref()
}

/// The call of a body that is exactly `{ return f(..); }`.
pub fn sole_return_call(function: &Function) -> Option<&CallExpr> {
    let body = function.body.as_ref()?;
    let [Stmt::Return(ret)] = body.stmts.as_slice() else {
        return None;
    };
    match ret.arg.as_deref() {
        Some(Expr::Call(call)) => Some(call),
        _ => None,
    }
}

/// All parameters as plain identifiers, or nothing if any pattern is fancier.
pub fn param_idents(function: &Function) -> Option<Vec<&Ident>> {
    function
        .params
        .iter()
        .map(|p| match &p.pat {
            Pat::Ident(binding) => Some(&binding.id),
            _ => None,
        })
        .collect()
}

/// Conservative side-effect check used by the dead-declarator prune.
pub fn is_pure_expr(expr: &Expr) -> bool {
    match expr {
        Expr::Lit(_) | Expr::Ident(_) | Expr::Fn(_) | Expr::Arrow(_) | Expr::This(_) => true,
        Expr::Paren(p) => is_pure_expr(&p.expr),
        Expr::Unary(u) => u.op != UnaryOp::Delete && is_pure_expr(&u.arg),
        Expr::Bin(b) => is_pure_expr(&b.left) && is_pure_expr(&b.right),
        Expr::Array(a) => a.elems.iter().all(|el| {
            el.as_ref()
                .map_or(true, |el| el.spread.is_none() && is_pure_expr(&el.expr))
        }),
        Expr::Object(o) => o.props.iter().all(|prop| match prop {
            PropOrSpread::Prop(p) => match &**p {
                Prop::KeyValue(kv) => {
                    !matches!(kv.key, PropName::Computed(_)) && is_pure_expr(&kv.value)
                }
                Prop::Shorthand(_) => true,
                _ => false,
            },
            PropOrSpread::Spread(_) => false,
        }),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::codegen;
    use swc_core::ecma::ast::Program;

    fn first_stmt(source: &str) -> Stmt {
        let (_, program) = codegen::parse(source).unwrap();
        let Program::Script(script) = program else {
            unreachable!()
        };
        script.body.into_iter().next().unwrap()
    }

    #[test]
    fn ident_name_validity() {
        assert!(is_valid_ident_name("log"));
        assert!(is_valid_ident_name("_private$2"));
        assert!(!is_valid_ident_name("2fast"));
        assert!(!is_valid_ident_name("a-b"));
        assert!(!is_valid_ident_name(""));
    }

    #[test]
    fn hex_names() {
        assert!(is_hex_name("_0x4a2f"));
        assert!(is_hex_name("_0xABC"));
        assert!(!is_hex_name("_0x"));
        assert!(!is_hex_name("x0x12"));
    }

    #[test]
    fn named_function_forms() {
        let stmt = first_stmt("function f(a, b) { return a; }");
        let (id, func) = named_function(&stmt).unwrap();
        assert_eq!(&*id.sym, "f");
        assert_eq!(func.params.len(), 2);

        let stmt = first_stmt("var g = function (a) { return a; };");
        let (id, _) = named_function(&stmt).unwrap();
        assert_eq!(&*id.sym, "g");

        let stmt = first_stmt("var n = 1;");
        assert!(named_function(&stmt).is_none());
    }

    #[test]
    fn return_shapes() {
        let stmt = first_stmt("function f(a) { var t = 0; return a; }");
        let (_, func) = named_function(&stmt).unwrap();
        assert!(single_return_body(func).is_some());
        assert!(sole_return_call(func).is_none());

        let stmt = first_stmt("function f(a) { return g(a); }");
        let (_, func) = named_function(&stmt).unwrap();
        assert!(sole_return_call(func).is_some());
    }

    #[test]
    fn purity() {
        let pure = ["1", "x", "[1, 2]", "({ a: 1 })", "-x", "1 + 2"];
        for src in pure {
            let Stmt::Expr(stmt) = first_stmt(&format!("({src});")) else {
                unreachable!()
            };
            assert!(is_pure_expr(&stmt.expr), "{src} should be pure");
        }
        let Stmt::Expr(stmt) = first_stmt("f();") else {
            unreachable!()
        };
        assert!(!is_pure_expr(&stmt.expr));
    }
}
