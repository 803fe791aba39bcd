pub mod cache;
pub mod transformers;
pub mod utils;
pub mod vm;

use anyhow::Result;
use swc_core::ecma::visit::VisitMutWith;

use crate::cache::AnalysisCache;
use crate::vm::Sandbox;

/// Rewrites one obfuscated source file into readable, semantically
/// equivalent JavaScript.
///
/// Four stages over a single tree: normalize and side-load the obfuscator's
/// decoders, run the main rewrite pass, rename mangled identifiers, then
/// delete the machinery the rewrite made dead. Only a parse failure is an
/// error; everything recoverable inside the pipeline is a log diagnostic.
pub fn optimize(source: &str) -> Result<String> {
    let (cm, mut program) = utils::codegen::parse(source)?;
    let mut cache = AnalysisCache::default();
    let mut sandbox = Sandbox::new();

    program.visit_mut_with(&mut transformers::normalize::Visitor);
    program.visit_mut_with(&mut transformers::decoders::Visitor::new(
        &mut cache,
        &mut sandbox,
    ));
    program.visit_mut_with(&mut transformers::rewriter::Visitor::new(
        &mut cache,
        &mut sandbox,
    ));

    // prune before the renamer runs so the hex-name guard still sees the
    // obfuscator's spelling
    let mut pruner = transformers::cleanup::Pruner::new(&program);
    program.visit_mut_with(&mut pruner);

    program.visit_mut_with(&mut transformers::beautify::Visitor);
    program.visit_mut_with(&mut transformers::cleanup::Visitor::new(&cache));

    utils::codegen::generate(&cm, &program)
}
