use swc_core::common::util::take::Take;
use swc_core::common::{Span, DUMMY_SP};
use swc_core::ecma::ast::{
    AssignExpr, AssignOp, BinExpr, BinaryOp, CallExpr, Callee, Decl, EmptyStmt, Expr, ExprOrSpread,
    FnDecl, Function, Lit, MemberExpr, MemberProp, ObjectLit, Prop, PropName, PropOrSpread, Stmt,
    UnaryOp, UpdateOp, VarDecl,
};
use swc_core::ecma::visit::{Visit, VisitMut, VisitMutWith, VisitWith};

use crate::cache::{AnalysisCache, ProxyProp, ProxyRecord};
use crate::utils::{ast, codegen};
use crate::vm::Sandbox;

/// The main rewrite pass.
///
/// Runs post-order so every arm sees already-simplified children, and re-runs
/// its arms on a node it just replaced; every replacement strictly shrinks
/// the expression, so the loop terminates. No arm is allowed to fail the
/// traversal — an unexpected shape simply leaves the node as it was.
pub struct Visitor<'a> {
    cache: &'a mut AnalysisCache,
    vm: &'a mut Sandbox,
}

impl<'a> Visitor<'a> {
    pub fn new(cache: &'a mut AnalysisCache, vm: &'a mut Sandbox) -> Self {
        Self { cache, vm }
    }

    fn rewrite_expr(&mut self, e: &mut Expr) -> bool {
        match e {
            Expr::Ident(_) => self.replace_alias(e),
            Expr::Bin(_) => self.fold_binary(e),
            Expr::Unary(_) => fold_unary(e),
            Expr::Cond(_) => fold_conditional(e),
            Expr::Member(_) => self.replace_proxy_member(e),
            Expr::Call(_) => {
                self.replace_proxy_call(e) || inline_fn_call(e) || self.eval_decoder_call(e)
            }
            _ => false,
        }
    }

    /// `x` where `let x = decoder` was seen becomes `decoder`.
    fn replace_alias(&mut self, e: &mut Expr) -> bool {
        let Expr::Ident(id) = &*e else {
            return false;
        };
        let Some(target) = self.cache.aliases.get(&*id.sym) else {
            return false;
        };
        *e = Expr::Ident(ast::ident(target));
        true
    }

    fn fold_binary(&mut self, e: &mut Expr) -> bool {
        let Expr::Bin(bin) = &*e else {
            return false;
        };
        let foldable = match bin.op {
            // Mixed literal kinds are deliberate: `true + true` must reach 2
            // and `2 + true` must reach 3, so the sandbox supplies the
            // coercion rules.
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                arith_operand(&bin.left) && arith_operand(&bin.right)
            }
            BinaryOp::EqEqEq | BinaryOp::NotEqEq => match (lit_of(&bin.left), lit_of(&bin.right)) {
                (Some(left), Some(right)) => same_lit_kind(left, right),
                _ => false,
            },
            _ => false,
        };
        if !foldable {
            return false;
        }
        let Ok(code) = codegen::expr_to_code(e) else {
            return false;
        };
        match self.vm.eval_to_lit(&code) {
            Ok(lit) => {
                *e = Expr::Lit(lit);
                true
            }
            Err(err) => {
                log::debug!("constant fold left in place: {err}");
                false
            }
        }
    }

    /// `p.aaaaa` / `p["aaaaa"]` with a known proxy `p` and a leaf value.
    fn replace_proxy_member(&mut self, e: &mut Expr) -> bool {
        let Expr::Member(member) = &*e else {
            return false;
        };
        let Expr::Ident(obj) = &*member.obj else {
            return false;
        };
        let Some(key) = ast::member_key_string(&member.prop) else {
            return false;
        };
        let Some(record) = self.cache.proxy(&obj.sym) else {
            return false;
        };
        match record.lookup(&key) {
            Some(value @ (Expr::Lit(_) | Expr::Ident(_))) => {
                let value = value.clone();
                *e = value;
                true
            }
            _ => false,
        }
    }

    /// `p.aaaaa(x, y)` with a known proxy `p`: literal values replace the
    /// whole call (the obfuscator's proxy values are pure, arguments are
    /// dropped), function values are expanded in place.
    fn replace_proxy_call(&mut self, e: &mut Expr) -> bool {
        let Expr::Call(call) = &*e else {
            return false;
        };
        let Callee::Expr(callee) = &call.callee else {
            return false;
        };
        let Expr::Member(member) = &**callee else {
            return false;
        };
        let Expr::Ident(obj) = &*member.obj else {
            return false;
        };
        let Some(key) = ast::member_key_string(&member.prop) else {
            return false;
        };
        let Some(record) = self.cache.proxy(&obj.sym) else {
            return false;
        };
        match record.lookup(&key) {
            Some(Expr::Lit(lit)) => {
                let lit = lit.clone();
                *e = Expr::Lit(lit);
                true
            }
            Some(Expr::Fn(f)) => {
                let Some(replacement) = inline_call(&f.function, &call.args) else {
                    return false;
                };
                *e = replacement;
                true
            }
            _ => false,
        }
    }

    /// A call to a side-loaded decoder is evaluated in the sandbox and
    /// replaced by the resulting literal. A failed evaluation is only a
    /// diagnostic; the call stays.
    fn eval_decoder_call(&mut self, e: &mut Expr) -> bool {
        let Expr::Call(call) = &*e else {
            return false;
        };
        let Callee::Expr(callee) = &call.callee else {
            return false;
        };
        let Expr::Ident(id) = &**callee else {
            return false;
        };
        if !self.cache.is_decoder(&id.sym) || !self.vm.contains(self.cache.resolve(&id.sym)) {
            return false;
        }
        let Ok(code) = codegen::expr_to_code(e) else {
            return false;
        };
        match self.vm.eval_to_lit(&code) {
            Ok(lit) => {
                *e = Expr::Lit(lit);
                true
            }
            Err(err) => {
                log::warn!("decoder call left in place: {err}");
                false
            }
        }
    }

    /// `function g(..) { return core(..); }` with `core` already loaded: the
    /// wrapper is itself a decoder. Load it whole so later calls to `g`
    /// resolve through the sandbox, and keep out of its body — the inner
    /// call must not be collapsed.
    fn try_harvest(
        &mut self,
        name: &str,
        function: &Function,
        decl_span: Span,
        decl_code: impl FnOnce() -> Option<String>,
    ) -> bool {
        let Some(call) = ast::sole_return_call(function) else {
            return false;
        };
        let Callee::Expr(callee) = &call.callee else {
            return false;
        };
        let Expr::Ident(core) = &**callee else {
            return false;
        };
        if !self.vm.contains(self.cache.resolve(&core.sym)) {
            return false;
        }
        let Some(code) = decl_code() else {
            return false;
        };
        match self.vm.load(name, &code) {
            Ok(()) => {
                log::info!("harvested proxy decoder {name}");
                self.cache.condemn(decl_span);
                self.cache.add_decoder(name);
                true
            }
            Err(err) => {
                log::warn!("could not load proxy decoder {name}: {err}");
                false
            }
        }
    }

    /// Pre-order half of the variable-declaration handling: skip the bodies
    /// of known decoders, harvest proxy decoders. Returns true when the
    /// children must not be visited.
    fn skip_or_harvest_var(&mut self, n: &VarDecl) -> bool {
        if n.decls.len() != 1 {
            return false;
        }
        let Some(id) = ast::declarator_name(&n.decls[0]) else {
            return false;
        };
        if self.cache.decoders.contains(&*id.sym) {
            return true;
        }
        let Some(Expr::Fn(f)) = n.decls[0].init.as_deref() else {
            return false;
        };
        let name = id.sym.to_string();
        self.try_harvest(&name, &f.function, n.span, || {
            codegen::stmt_to_code(&Stmt::Decl(Decl::Var(Box::new(n.clone())))).ok()
        })
    }

    /// Post-order half: proxy-object records and alias links.
    fn finish_var_decl(&mut self, n: &VarDecl) {
        if n.decls.len() != 1 {
            return;
        }
        let Some(id) = ast::declarator_name(&n.decls[0]) else {
            return;
        };
        let name = id.sym.to_string();
        match n.decls[0].init.as_deref() {
            Some(Expr::Object(obj)) => self.record_proxy_object(&name, obj, n.span),
            Some(Expr::Ident(target)) => {
                let canonical = self.cache.resolve(&target.sym).to_string();
                if canonical != name
                    && (self.cache.decoders.contains(&canonical)
                        || self.cache.proxies.contains_key(&canonical))
                {
                    self.cache.aliases.insert(name, canonical);
                    self.cache.condemn(n.span);
                }
            }
            _ => {}
        }
    }

    fn record_proxy_object(&mut self, name: &str, obj: &ObjectLit, decl_span: Span) {
        if self.cache.decoders.contains(name) || self.cache.proxies.contains_key(name) {
            return;
        }
        if obj.props.is_empty() {
            self.cache.proxies.insert(
                name.to_string(),
                ProxyRecord::Doubted {
                    first_key_len: None,
                    props: Vec::new(),
                    decl_span,
                    assign_spans: Vec::new(),
                },
            );
            return;
        }
        let mut props = Vec::with_capacity(obj.props.len());
        for prop in &obj.props {
            let PropOrSpread::Prop(prop) = prop else {
                return;
            };
            let Prop::KeyValue(kv) = &**prop else {
                return;
            };
            let Some(key) = ast::prop_key_string(&kv.key) else {
                return;
            };
            if key.len() != 5 {
                return;
            }
            props.push(ProxyProp {
                key,
                value: (*kv.value).clone(),
            });
        }
        self.cache
            .proxies
            .insert(name.to_string(), ProxyRecord::Confirmed { props, decl_span });
    }

    /// `p["aaaaa"] = value;` grows a doubted proxy; any rule violation drops
    /// the record for good.
    fn grow_doubted_proxy(&mut self, n: &AssignExpr) {
        if n.op != AssignOp::Assign {
            return;
        }
        let Some(simple) = n.left.as_simple() else {
            return;
        };
        if let Some(binding) = simple.as_ident() {
            // re-assigning the object itself is a constant violation
            if matches!(
                self.cache.proxies.get(&*binding.id.sym),
                Some(ProxyRecord::Doubted { .. })
            ) {
                self.cache.proxies.remove(&*binding.id.sym);
            }
            return;
        }
        let Some(member) = simple.as_member() else {
            return;
        };
        let Expr::Ident(obj) = &*member.obj else {
            return;
        };
        let name = obj.sym.to_string();
        if !matches!(
            self.cache.proxies.get(&name),
            Some(ProxyRecord::Doubted { .. })
        ) {
            return;
        }
        let key = ast::member_key_string(&member.prop);
        let mut invalidate = false;
        if let Some(ProxyRecord::Doubted {
            first_key_len,
            props,
            assign_spans,
            ..
        }) = self.cache.proxies.get_mut(&name)
        {
            match key {
                Some(key)
                    if key.len() == 5 && first_key_len.map_or(true, |len| len == key.len()) =>
                {
                    *first_key_len = Some(key.len());
                    props.push(ProxyProp {
                        key,
                        value: (*n.right).clone(),
                    });
                    assign_spans.push(n.span);
                }
                _ => invalidate = true,
            }
        }
        if invalidate {
            self.cache.proxies.remove(&name);
        }
    }

    /// Rebuilds a flattened `while { switch(arr[ctr++]) ..; break; }` into
    /// the linear statement order encoded by the pad string.
    fn unflatten_switches(&mut self, stmts: &mut Vec<Stmt>) {
        let mut i = 0;
        while i < stmts.len() {
            let Some((arr, ctr)) = flattened_loop_vars(&stmts[i]) else {
                i += 1;
                continue;
            };
            let Some(arr_idx) = stmts[..i].iter().rposition(|s| ast::declares_name(s, &arr))
            else {
                i += 1;
                continue;
            };
            let ctr_idx = stmts[..i].iter().rposition(|s| ast::declares_name(s, &ctr));
            let Some((pad, sep)) = order_strings(&stmts[arr_idx]) else {
                i += 1;
                continue;
            };
            let Some(flat) = flatten_cases(&stmts[i], &pad, &sep) else {
                i += 1;
                continue;
            };
            log::info!("unflattened switch loop ordered by {:?}", pad);
            let flat_len = flat.len();
            stmts.splice(i..=i, flat);
            let mut drop_idx = vec![arr_idx];
            drop_idx.extend(ctr_idx);
            drop_idx.sort_unstable();
            let mut removed = 0;
            for idx in drop_idx.into_iter().rev() {
                stmts.remove(idx);
                removed += 1;
            }
            // continue past the spliced replacement without re-visiting it
            i = i + flat_len - removed;
        }
    }
}

impl VisitMut for Visitor<'_> {
    fn visit_mut_expr(&mut self, e: &mut Expr) {
        e.visit_mut_children_with(self);
        while self.rewrite_expr(e) {}
    }

    fn visit_mut_member_expr(&mut self, n: &mut MemberExpr) {
        n.visit_mut_children_with(self);
        beautify_member_prop(n);
    }

    fn visit_mut_prop(&mut self, n: &mut Prop) {
        n.visit_mut_children_with(self);
        // { "valid": x } -> { valid: x }
        if let Prop::KeyValue(kv) = n {
            if let PropName::Str(s) = &kv.key {
                if ast::is_valid_ident_name(&s.value) {
                    kv.key = PropName::Ident(ast::ident(&s.value));
                }
            }
        }
    }

    fn visit_mut_assign_expr(&mut self, n: &mut AssignExpr) {
        n.visit_mut_children_with(self);
        self.grow_doubted_proxy(n);
    }

    fn visit_mut_fn_decl(&mut self, n: &mut FnDecl) {
        if self.cache.decoders.contains(&*n.ident.sym) {
            return;
        }
        let name = n.ident.sym.to_string();
        let span = n.function.span;
        if self.try_harvest(&name, &n.function, span, || {
            codegen::stmt_to_code(&Stmt::Decl(Decl::Fn(n.clone()))).ok()
        }) {
            return;
        }
        n.visit_mut_children_with(self);
    }

    fn visit_mut_var_decl(&mut self, n: &mut VarDecl) {
        if self.skip_or_harvest_var(n) {
            return;
        }
        n.visit_mut_children_with(self);
        self.finish_var_decl(n);
    }

    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        stmts.visit_mut_children_with(self);
        self.unflatten_switches(stmts);

        let mut out = Vec::with_capacity(stmts.len());
        for mut stmt in stmts.drain(..) {
            // boolean `if` tests collapse to the taken branch; an `else if`
            // chain is unwrapped level by level
            loop {
                let Stmt::If(ifs) = &mut stmt else {
                    break;
                };
                let Expr::Lit(Lit::Bool(test)) = &*ifs.test else {
                    break;
                };
                let taken = if test.value {
                    Some(ifs.cons.take())
                } else {
                    ifs.alt.as_deref_mut().map(|alt| alt.take())
                };
                match taken {
                    Some(Stmt::Block(block)) => {
                        out.extend(block.stmts);
                        stmt = Stmt::Empty(EmptyStmt { span: DUMMY_SP });
                        break;
                    }
                    Some(next) => stmt = next,
                    None => {
                        stmt = Stmt::Empty(EmptyStmt { span: DUMMY_SP });
                        break;
                    }
                }
            }
            if !matches!(stmt, Stmt::Empty(_)) {
                out.push(stmt);
            }
        }
        *stmts = out;
    }
}

fn lit_of(e: &Expr) -> Option<&Lit> {
    match e {
        Expr::Lit(lit @ (Lit::Num(_) | Lit::Str(_) | Lit::Bool(_) | Lit::Null(_))) => Some(lit),
        _ => None,
    }
}

fn same_lit_kind(a: &Lit, b: &Lit) -> bool {
    matches!(
        (a, b),
        (Lit::Num(_), Lit::Num(_))
            | (Lit::Str(_), Lit::Str(_))
            | (Lit::Bool(_), Lit::Bool(_))
            | (Lit::Null(_), Lit::Null(_))
    )
}

/// A literal, or a numeric literal under unary minus (either side).
fn arith_operand(e: &Expr) -> bool {
    match e {
        Expr::Lit(Lit::Num(_) | Lit::Str(_) | Lit::Bool(_) | Lit::Null(_)) => true,
        Expr::Unary(u) => {
            u.op == UnaryOp::Minus && matches!(&*u.arg, Expr::Lit(Lit::Num(_)))
        }
        _ => false,
    }
}

fn fold_unary(e: &mut Expr) -> bool {
    let Expr::Unary(un) = e else {
        return false;
    };
    match un.op {
        UnaryOp::Bang => {
            let value = match &*un.arg {
                Expr::Lit(Lit::Num(n)) => Some(n.value == 0.0),
                Expr::Lit(Lit::Str(s)) => Some(s.value.is_empty()),
                Expr::Lit(Lit::Bool(b)) => Some(!b.value),
                Expr::Array(a) if a.elems.is_empty() => Some(false),
                Expr::Object(o) if o.props.is_empty() => Some(false),
                Expr::Ident(id) if id.sym == "undefined" => Some(true),
                _ => None,
            };
            match value {
                Some(value) => {
                    *e = ast::bool_lit(value);
                    true
                }
                None => false,
            }
        }
        UnaryOp::Plus if matches!(&*un.arg, Expr::Lit(Lit::Num(_))) => {
            let arg = un.arg.take();
            *e = arg;
            true
        }
        _ => false,
    }
}

fn fold_conditional(e: &mut Expr) -> bool {
    let Expr::Cond(cond) = e else {
        return false;
    };
    let Expr::Lit(Lit::Bool(test)) = &*cond.test else {
        return false;
    };
    let taken = if test.value {
        cond.cons.take()
    } else {
        cond.alt.take()
    };
    *e = taken;
    true
}

/// `obj["name"]` -> `obj.name` when the key reads as an identifier.
fn beautify_member_prop(member: &mut MemberExpr) {
    let obj_ok = matches!(
        &*member.obj,
        Expr::Ident(_)
            | Expr::Member(_)
            | Expr::Lit(Lit::Str(_))
            | Expr::This(_)
            | Expr::Call(_)
            | Expr::New(_)
            | Expr::Array(_)
            | Expr::Object(_)
            | Expr::Fn(_)
            | Expr::Bin(_)
            | Expr::Paren(_)
    );
    if !obj_ok {
        return;
    }
    let MemberProp::Computed(computed) = &member.prop else {
        return;
    };
    let Expr::Lit(Lit::Str(s)) = &*computed.expr else {
        return;
    };
    if !ast::is_valid_ident_name(&s.value) {
        return;
    }
    member.prop = MemberProp::Ident(ast::ident(&s.value));
}

/// A call whose callee is a literal function expression, as produced by
/// earlier rewrites, is always eligible for expansion.
fn inline_fn_call(e: &mut Expr) -> bool {
    let Expr::Call(call) = &*e else {
        return false;
    };
    let Callee::Expr(callee) = &call.callee else {
        return false;
    };
    let Expr::Fn(f) = ast::unwrap_parens(callee) else {
        return false;
    };
    let Some(replacement) = inline_call(&f.function, &call.args) else {
        return false;
    };
    *e = replacement;
    true
}

/// Expansion rules for a tiny wrapper body called with concrete arguments.
fn inline_call(function: &Function, args: &[ExprOrSpread]) -> Option<Expr> {
    if args.iter().any(|a| a.spread.is_some()) {
        return None;
    }
    let params = ast::param_idents(function)?;
    let ret = ast::single_return_body(function)?;
    match ret {
        // return a + b  ->  the binary over the matching arguments
        Expr::Bin(bin) if args.len() == 2 => {
            let left = binary_operand(&bin.left, &params, args)?;
            let right = binary_operand(&bin.right, &params, args)?;
            Some(Expr::Bin(BinExpr {
                span: DUMMY_SP,
                op: bin.op,
                left: Box::new(left),
                right: Box::new(right),
            }))
        }
        // return b  ->  the matching argument
        Expr::Ident(id) => {
            let idx = params.iter().position(|p| p.sym == id.sym)?;
            args.get(idx).map(|a| (*a.expr).clone())
        }
        Expr::Lit(lit) => Some(Expr::Lit(lit.clone())),
        Expr::Call(inner) => {
            let Callee::Expr(callee) = &inner.callee else {
                return None;
            };
            match &**callee {
                // return c(d, e)  ->  call through the matching argument,
                // passing the remaining arguments in order
                Expr::Ident(id) => {
                    let idx = params.iter().position(|p| p.sym == id.sym)?;
                    let target = args.get(idx)?.expr.clone();
                    let rest: Vec<ExprOrSpread> = args
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != idx)
                        .map(|(_, a)| a.clone())
                        .collect();
                    Some(Expr::Call(CallExpr {
                        span: DUMMY_SP,
                        callee: Callee::Expr(target),
                        args: rest,
                        type_args: None,
                    }))
                }
                // return o.m(..)  ->  that member called with the original
                // arguments
                Expr::Member(member) => {
                    if !matches!(&*member.obj, Expr::Ident(_))
                        || !matches!(member.prop, MemberProp::Ident(_))
                    {
                        return None;
                    }
                    Some(Expr::Call(CallExpr {
                        span: DUMMY_SP,
                        callee: Callee::Expr(Box::new(Expr::Member(member.clone()))),
                        args: args.to_vec(),
                        type_args: None,
                    }))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// A binary operand inside a wrapper body: one of the parameters (in either
/// position) or a literal.
fn binary_operand(
    side: &Expr,
    params: &[&swc_core::ecma::ast::Ident],
    args: &[ExprOrSpread],
) -> Option<Expr> {
    match side {
        Expr::Ident(id) => params
            .iter()
            .position(|p| p.sym == id.sym)
            .and_then(|i| args.get(i))
            .map(|a| (*a.expr).clone()),
        Expr::Lit(lit) => Some(Expr::Lit(lit.clone())),
        _ => None,
    }
}

fn flattened_loop_vars(stmt: &Stmt) -> Option<(String, String)> {
    let Stmt::While(w) = stmt else {
        return None;
    };
    let Stmt::Block(block) = &*w.body else {
        return None;
    };
    let [Stmt::Switch(sw), Stmt::Break(_)] = block.stmts.as_slice() else {
        return None;
    };
    let Expr::Member(member) = &*sw.discriminant else {
        return None;
    };
    let Expr::Ident(arr) = &*member.obj else {
        return None;
    };
    let MemberProp::Computed(computed) = &member.prop else {
        return None;
    };
    let Expr::Update(update) = &*computed.expr else {
        return None;
    };
    if update.op != UpdateOp::PlusPlus || update.prefix {
        return None;
    }
    let Expr::Ident(ctr) = &*update.arg else {
        return None;
    };
    Some((arr.sym.to_string(), ctr.sym.to_string()))
}

/// Pulls the pad (member-object position) and separator (call-argument
/// position) strings out of the order array's declaration, typically
/// `var order = "4|0|2".split("|");`.
fn order_strings(stmt: &Stmt) -> Option<(String, String)> {
    #[derive(Default)]
    struct FindOrderStrings {
        pad: Option<String>,
        sep: Option<String>,
    }
    impl Visit for FindOrderStrings {
        fn visit_member_expr(&mut self, n: &MemberExpr) {
            if let Expr::Lit(Lit::Str(s)) = &*n.obj {
                self.pad.get_or_insert_with(|| s.value.to_string());
            }
            n.visit_children_with(self);
        }
        fn visit_call_expr(&mut self, n: &CallExpr) {
            for arg in &n.args {
                if let Expr::Lit(Lit::Str(s)) = &*arg.expr {
                    self.sep.get_or_insert_with(|| s.value.to_string());
                }
            }
            n.visit_children_with(self);
        }
    }

    let Stmt::Decl(Decl::Var(var)) = stmt else {
        return None;
    };
    let init = ast::single_declarator(var)?.init.as_deref()?;
    let mut finder = FindOrderStrings::default();
    init.visit_with(&mut finder);
    match (finder.pad, finder.sep) {
        (Some(pad), Some(sep)) if !sep.is_empty() => Some((pad, sep)),
        _ => None,
    }
}

/// Case bodies in pad order, `continue` statements dropped. Misses nothing
/// or the loop is left alone.
fn flatten_cases(stmt: &Stmt, pad: &str, sep: &str) -> Option<Vec<Stmt>> {
    let Stmt::While(w) = stmt else {
        return None;
    };
    let Stmt::Block(block) = &*w.body else {
        return None;
    };
    let Stmt::Switch(sw) = &block.stmts[0] else {
        return None;
    };
    let mut flat = Vec::new();
    for label in pad.split(sep) {
        let case = sw.cases.iter().find(|c| {
            matches!(c.test.as_deref(), Some(Expr::Lit(Lit::Str(s))) if &*s.value == label)
        })?;
        for stmt in &case.cons {
            if !matches!(stmt, Stmt::Continue(_)) {
                flat.push(stmt.clone());
            }
        }
    }
    Some(flat)
}
