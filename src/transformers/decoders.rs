use once_cell::sync::Lazy;
use regex::Regex;
use swc_core::common::Spanned;
use swc_core::ecma::ast::{
    Callee, Decl, Expr, Function, Ident, Stmt, Str,
};
use swc_core::ecma::visit::{Visit, VisitMut, VisitMutWith, VisitWith};

use crate::cache::AnalysisCache;
use crate::utils::{ast, codegen};
use crate::vm::Sandbox;

const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+/=";
const ALPHABET_SWAPPED: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";

// The obfuscator's self-defense wraps the decoder in function-source regex
// checks; these two rewrites neuter them before the code reaches the sandbox.
static SELF_DEFENSE_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+ *\(\) *\{\w+ *").unwrap());
static SELF_DEFENSE_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['|"].+['|"];? *\}"#).unwrap());

/// Finds the obfuscator's decryption functions and side-loads them, together
/// with their string table and shuffler, into the sandbox.
pub struct Visitor<'a> {
    cache: &'a mut AnalysisCache,
    vm: &'a mut Sandbox,
}

impl<'a> Visitor<'a> {
    pub fn new(cache: &'a mut AnalysisCache, vm: &'a mut Sandbox) -> Self {
        Self { cache, vm }
    }

    fn add_encrypt_function(&mut self, name: &str, index: usize, stmts: &[Stmt]) {
        if self.cache.decoders.contains(name) {
            return;
        }
        let Some(support_idx) = stmts[..index].iter().rposition(is_support_array) else {
            return;
        };
        let shuffler_idx = stmts[..index]
            .iter()
            .rposition(is_shuffler)
            .or_else(|| {
                stmts[index + 1..]
                    .iter()
                    .position(is_shuffler)
                    .map(|j| index + 1 + j)
            });

        let mut pieces = vec![stmts[support_idx].clone()];
        if let Some(j) = shuffler_idx {
            pieces.push(stmts[j].clone());
        }
        pieces.push(stmts[index].clone());
        let code = match codegen::stmts_to_code(pieces) {
            Ok(code) => code,
            Err(err) => {
                log::warn!("could not regenerate decoder {name}: {err}");
                return;
            }
        };
        let code = SELF_DEFENSE_HEAD.replace_all(&code, "");
        let code = SELF_DEFENSE_TAIL.replace_all(&code, ".");

        match self.vm.load(name, &code) {
            Ok(()) => {
                log::info!("side-loaded decoder {name}");
                self.cache.support_spans.push(stmts[support_idx].span());
                if let Some(j) = shuffler_idx {
                    self.cache.support_spans.push(stmts[j].span());
                }
                self.cache.condemn(stmts[index].span());
                self.cache.add_decoder(name);
            }
            Err(err) => log::warn!("skipping decoder {name}: {err}"),
        }
    }
}

impl VisitMut for Visitor<'_> {
    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        stmts.visit_mut_children_with(self);
        for i in 0..stmts.len() {
            if let Some(name) = decoder_candidate(&stmts[i]) {
                self.add_encrypt_function(&name, i, stmts);
            }
        }
    }
}

fn decoder_candidate(stmt: &Stmt) -> Option<String> {
    let (id, function) = ast::named_function(stmt)?;
    if function.params.len() != 2 {
        return None;
    }
    if is_self_reassigning(function) || contains_alphabet(function) {
        Some(id.sym.to_string())
    } else {
        None
    }
}

/// Fingerprint 1: `function f(a, b) { return (X = <expr>, X(a, b)); }` where
/// the assignment target and the callee are the same identifier.
fn is_self_reassigning(function: &Function) -> bool {
    let Some(body) = &function.body else {
        return false;
    };
    let [Stmt::Return(ret)] = body.stmts.as_slice() else {
        return false;
    };
    let Some(Expr::Seq(seq)) = ret.arg.as_deref() else {
        return false;
    };
    if seq.exprs.len() != 2 {
        return false;
    }
    let assigned: &Ident = match seq.exprs[0].as_ref() {
        Expr::Assign(assign) => match assign.left.as_simple().and_then(|s| s.as_ident()) {
            Some(binding) => &binding.id,
            None => return false,
        },
        _ => return false,
    };
    let Expr::Call(call) = seq.exprs[1].as_ref() else {
        return false;
    };
    match &call.callee {
        Callee::Expr(callee) => {
            matches!(&**callee, Expr::Ident(callee) if callee.sym == assigned.sym)
        }
        _ => false,
    }
}

/// Fingerprint 2: the base64 alphabet literal somewhere in the body, not
/// counting occurrences inside an inner two-parameter function (the nearest
/// enclosing candidate wins).
fn contains_alphabet(function: &Function) -> bool {
    #[derive(Default)]
    struct FindAlphabet {
        found: bool,
    }
    impl Visit for FindAlphabet {
        fn visit_function(&mut self, n: &Function) {
            if n.params.len() == 2 {
                return;
            }
            n.visit_children_with(self);
        }
        fn visit_str(&mut self, n: &Str) {
            if n.value == ALPHABET || n.value == ALPHABET_SWAPPED {
                self.found = true;
            }
        }
    }

    let mut finder = FindAlphabet::default();
    if let Some(body) = &function.body {
        body.visit_with(&mut finder);
    }
    finder.found
}

fn is_support_array(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Decl(Decl::Var(var)) => ast::single_declarator(var)
            .and_then(|d| d.init.as_deref())
            .map_or(false, |init| matches!(init, Expr::Array(_))),
        _ => false,
    }
}

/// `(function (a, b) { .. })(target, 0x123);` — the load-time array shuffle.
fn is_shuffler(stmt: &Stmt) -> bool {
    let Stmt::Expr(stmt) = stmt else {
        return false;
    };
    let Expr::Call(call) = &*stmt.expr else {
        return false;
    };
    let Callee::Expr(callee) = &call.callee else {
        return false;
    };
    let Expr::Fn(f) = ast::unwrap_parens(callee) else {
        return false;
    };
    f.function.params.len() == 2
        && call.args.len() == 2
        && call.args[0].spread.is_none()
        && matches!(&*call.args[0].expr, Expr::Ident(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::codegen;
    use swc_core::ecma::ast::Program;

    fn detect(source: &str) -> (AnalysisCache, Sandbox) {
        let (_, mut program) = codegen::parse(source).unwrap();
        program.visit_mut_with(&mut crate::transformers::normalize::Visitor);
        let mut cache = AnalysisCache::default();
        let mut vm = Sandbox::new();
        program.visit_mut_with(&mut Visitor::new(&mut cache, &mut vm));
        (cache, vm)
    }

    #[test]
    fn fingerprints_self_reassigning_decoder() {
        let (cache, mut vm) = detect(
            r#"
            var _0x5d2c = ["hello", "world"];
            (function (_0x1, _0x2) {})(_0x5d2c, 0x1ad);
            function _0xabc(_0x3, _0x4) {
                return (_0xabc = function (_0x5, _0x6) {
                    return _0x5d2c[_0x5];
                }, _0xabc(_0x3, _0x4));
            }
            "#,
        );
        assert!(cache.decoders.contains("_0xabc"));
        assert_eq!(cache.support_spans.len(), 2);
        assert!(matches!(
            vm.eval_to_lit("_0xabc(1);").unwrap(),
            swc_core::ecma::ast::Lit::Str(s) if &*s.value == "world"
        ));
    }

    #[test]
    fn fingerprints_alphabet_literal_without_shuffler() {
        let (cache, mut vm) = detect(
            r#"
            var _0x1f = ["alpha", "beta"];
            var _0x30 = function (_0xa, _0xb) {
                var _0xc = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+/=";
                return _0x1f[_0xa];
            };
            "#,
        );
        assert!(cache.decoders.contains("_0x30"));
        assert_eq!(cache.support_spans.len(), 1);
        assert!(matches!(
            vm.eval_to_lit("_0x30(0);").unwrap(),
            swc_core::ecma::ast::Lit::Str(s) if &*s.value == "alpha"
        ));
    }

    #[test]
    fn no_support_array_means_no_decoder() {
        let (cache, _) = detect(
            r#"
            function _0xabc(_0x3, _0x4) {
                return (_0xabc = function (_0x5, _0x6) {
                    return _0x5;
                }, _0xabc(_0x3, _0x4));
            }
            "#,
        );
        assert!(cache.decoders.is_empty());
    }

    #[test]
    fn two_parameter_guard_rejects_other_functions() {
        let (_, program) = codegen::parse("function f(a) { return (f = a, f(a)); }").unwrap();
        let Program::Script(script) = program else {
            unreachable!()
        };
        assert!(decoder_candidate(&script.body[0]).is_none());
    }
}
