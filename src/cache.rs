use std::collections::{HashMap, HashSet};

use swc_core::common::{Span, DUMMY_SP};
use swc_core::ecma::ast::Expr;

/// One collapsible property of a proxy object.
#[derive(Debug, Clone)]
pub struct ProxyProp {
    pub key: String,
    pub value: Expr,
}

/// A proxy object as the rewriter knows it.
///
/// `Confirmed` is a literal `{ aaaaa: .., bbbbb: .. }` initializer with
/// uniform five-character keys. `Doubted` is the `var p = {};` form whose
/// properties arrive through later assignments; it grows in place and is
/// dropped entirely the moment an assignment breaks the key-length rule.
/// Both shapes answer the same lookup, which is why they share the type.
#[derive(Debug)]
pub enum ProxyRecord {
    Confirmed {
        props: Vec<ProxyProp>,
        decl_span: Span,
    },
    Doubted {
        first_key_len: Option<usize>,
        props: Vec<ProxyProp>,
        decl_span: Span,
        assign_spans: Vec<Span>,
    },
}

impl ProxyRecord {
    pub fn props(&self) -> &[ProxyProp] {
        match self {
            ProxyRecord::Confirmed { props, .. } => props,
            ProxyRecord::Doubted { props, .. } => props,
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&Expr> {
        self.props()
            .iter()
            .find(|p| p.key == key)
            .map(|p| &p.value)
    }
}

/// Shared analysis state for one optimization run.
///
/// Statements scheduled for deletion are identified by the span they carried
/// out of the parser; spans survive tree surgery and identifier renames,
/// which names do not.
#[derive(Default)]
pub struct AnalysisCache {
    /// Names callable in the sandbox. A name is added only after the sandbox
    /// accepted its definition.
    pub decoders: HashSet<String>,
    /// Spans of the support array and shuffler statements.
    pub support_spans: Vec<Span>,
    /// Proxy objects by name. A name holds at most one record, and never
    /// both a record and a decoder entry.
    pub proxies: HashMap<String, ProxyRecord>,
    /// `let x = y;` indirections onto decoders and proxies, pre-resolved to
    /// the canonical name.
    pub aliases: HashMap<String, String>,
    /// Statements condemned by the rewriter (decoder definitions, alias
    /// declarators).
    pub kill_spans: Vec<Span>,
}

impl AnalysisCache {
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn is_decoder(&self, name: &str) -> bool {
        self.decoders.contains(self.resolve(name))
    }

    /// Registers a decoder, displacing any proxy record of the same name.
    pub fn add_decoder(&mut self, name: &str) {
        self.proxies.remove(name);
        self.decoders.insert(name.to_string());
    }

    pub fn proxy(&self, name: &str) -> Option<&ProxyRecord> {
        let name = self.resolve(name);
        if self.decoders.contains(name) {
            return None;
        }
        self.proxies.get(name)
    }

    pub fn condemn(&mut self, span: Span) {
        if span != DUMMY_SP {
            self.kill_spans.push(span);
        }
    }
}
