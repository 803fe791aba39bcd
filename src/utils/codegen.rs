use anyhow::{anyhow, Result};
use swc_core::common::{sync::Lrc, FileName, SourceMap, Spanned, DUMMY_SP};
use swc_core::ecma::ast::{EsVersion, Expr, ExprStmt, Program, Script, Stmt};
use swc_core::ecma::codegen::{text_writer::JsWriter, Config, Emitter};
use swc_core::ecma::parser::{Lexer, Parser, StringInput, Syntax};

/// Parses one source file in script mode. Obfuscator output is always a
/// script, never a module.
pub fn parse(source: &str) -> Result<(Lrc<SourceMap>, Program)> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Anon, source.to_string());
    let lexer = Lexer::new(
        Syntax::default(),
        EsVersion::Es2022,
        StringInput::from(&*fm),
        None,
    );
    let mut parser = Parser::new_from(lexer);
    let script = parser
        .parse_script()
        .map_err(|e| anyhow!("parse error: {:?}", e))?;
    if let Some(err) = parser.take_errors().into_iter().next() {
        return Err(anyhow!("parse error: {:?}", err));
    }
    Ok((cm, Program::Script(script)))
}

pub fn generate(cm: &Lrc<SourceMap>, program: &Program) -> Result<String> {
    let mut buf = vec![];
    {
        let mut emitter = Emitter {
            cfg: Config::default(),
            cm: cm.clone(),
            comments: None,
            wr: JsWriter::new(cm.clone(), "\n", &mut buf, None),
        };
        emitter.emit_program(program)?;
    }
    Ok(String::from_utf8(buf)?)
}

/// Regenerates source text for a list of statements by emitting them as a
/// synthetic script.
pub fn stmts_to_code(stmts: Vec<Stmt>) -> Result<String> {
    let cm: Lrc<SourceMap> = Default::default();
    let script = Script {
        span: DUMMY_SP,
        body: stmts,
        shebang: None,
    };
    generate(&cm, &Program::Script(script))
}

pub fn stmt_to_code(stmt: &Stmt) -> Result<String> {
    stmts_to_code(vec![stmt.clone()])
}

pub fn expr_to_code(expr: &Expr) -> Result<String> {
    stmts_to_code(vec![Stmt::Expr(ExprStmt {
        span: expr.span(),
        expr: Box::new(expr.clone()),
    })])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_regenerate() {
        let (cm, program) = parse("var a = 1;").unwrap();
        let out = generate(&cm, &program).unwrap();
        assert_eq!(out.trim(), "var a = 1;");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse("var = = 1;").is_err());
    }

    #[test]
    fn expr_round_trip() {
        let (_, program) = parse("1 + 2;").unwrap();
        let Program::Script(script) = &program else {
            unreachable!()
        };
        let Stmt::Expr(stmt) = &script.body[0] else {
            unreachable!()
        };
        let code = expr_to_code(&stmt.expr).unwrap();
        assert_eq!(code.trim(), "1 + 2;");
    }
}
