use std::collections::HashSet;

use anyhow::{anyhow, Result};
use boa_engine::value::JsVariant;
use boa_engine::vm::RuntimeLimits;
use boa_engine::{Context, Source};
use swc_core::common::DUMMY_SP;
use swc_core::ecma::ast::{Bool, Lit, Null, Number, Str};

const LOOP_ITERATION_LIMIT: u64 = 500_000;
const RECURSION_LIMIT: usize = 256;
const STACK_SIZE_LIMIT: usize = 1024 * 1024;

/// Host evaluation scope for decoder machinery lifted out of the input.
///
/// The obfuscator's own decryption functions are executed here so their
/// results can be inlined back into the tree. The realm is fresh per
/// optimization run and capped so hostile input cannot spin forever.
pub struct Sandbox {
    context: Context,
    names: HashSet<String>,
}

impl Sandbox {
    pub fn new() -> Self {
        let mut context = Context::default();
        let mut limits = RuntimeLimits::default();
        limits.set_loop_iteration_limit(LOOP_ITERATION_LIMIT);
        limits.set_recursion_limit(RECURSION_LIMIT);
        limits.set_stack_size_limit(STACK_SIZE_LIMIT);
        context.set_runtime_limits(limits);
        Self {
            context,
            names: HashSet::new(),
        }
    }

    /// Runs `code` for its side effects and marks `name` as defined.
    /// Re-injecting a name shadows the earlier definition.
    pub fn load(&mut self, name: &str, code: &str) -> Result<()> {
        self.context
            .eval(Source::from_bytes(code.as_bytes()))
            .map_err(|e| anyhow!("definition of {name} rejected: {e}"))?;
        self.names.insert(name.to_string());
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Evaluates `code` and converts the completion value into a literal
    /// node. Anything that is not a printable primitive is an error.
    pub fn eval_to_lit(&mut self, code: &str) -> Result<Lit> {
        let value = self
            .context
            .eval(Source::from_bytes(code.as_bytes()))
            .map_err(|e| anyhow!("evaluation failed: {e}"))?;
        match value.variant() {
            JsVariant::Null => Ok(Lit::Null(Null { span: DUMMY_SP })),
            JsVariant::Boolean(b) => Ok(Lit::Bool(Bool {
                span: DUMMY_SP,
                value: b,
            })),
            JsVariant::Integer32(i) => Ok(Lit::Num(Number {
                span: DUMMY_SP,
                value: i as f64,
                raw: None,
            })),
            JsVariant::Float64(f) if f.is_finite() => Ok(Lit::Num(Number {
                span: DUMMY_SP,
                value: f,
                raw: None,
            })),
            JsVariant::Float64(_) => Err(anyhow!("non-finite numeric result")),
            JsVariant::String(s) => Ok(Lit::Str(Str {
                span: DUMMY_SP,
                value: s.to_std_string_escaped().into(),
                raw: None,
            })),
            _ => Err(anyhow!("completion value is not a primitive")),
        }
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_primitives() {
        let mut sandbox = Sandbox::new();
        assert!(matches!(
            sandbox.eval_to_lit("1 + 2;").unwrap(),
            Lit::Num(n) if n.value == 3.0
        ));
        assert!(matches!(
            sandbox.eval_to_lit("'a' + 'b';").unwrap(),
            Lit::Str(s) if &*s.value == "ab"
        ));
        assert!(matches!(
            sandbox.eval_to_lit("true + true;").unwrap(),
            Lit::Num(n) if n.value == 2.0
        ));
    }

    #[test]
    fn definitions_persist_across_evals() {
        let mut sandbox = Sandbox::new();
        sandbox
            .load("dec", "var table = ['x', 'y']; function dec(i) { return table[i]; }")
            .unwrap();
        assert!(sandbox.contains("dec"));
        assert!(matches!(
            sandbox.eval_to_lit("dec(1);").unwrap(),
            Lit::Str(s) if &*s.value == "y"
        ));
    }

    #[test]
    fn rejects_non_primitives_and_errors() {
        let mut sandbox = Sandbox::new();
        assert!(sandbox.eval_to_lit("({});").is_err());
        assert!(sandbox.eval_to_lit("missing(1);").is_err());
        assert!(sandbox.eval_to_lit("1 / 0;").is_err());
    }

    #[test]
    fn runaway_loops_are_capped() {
        let mut sandbox = Sandbox::new();
        assert!(sandbox.eval_to_lit("while (true) {} 1;").is_err());
    }
}
