//! JavaScript minification via oxc.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::Minifier;
use crate::debug;

/// oxc-backed JavaScript minifier.
///
/// Sources are parsed as classic scripts: bundles are plain concatenations,
/// not modules.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsMinifier;

impl JsMinifier {
    /// Minify JavaScript source code, `None` when it does not parse.
    pub fn try_minify(source: &str) -> Option<String> {
        let allocator = Allocator::default();
        let source_type = SourceType::cjs();
        let ret = Parser::new(&allocator, source, source_type).parse();
        if !ret.errors.is_empty() {
            return None;
        }
        let mut program = ret.program;
        let options = MinifierOptions {
            mangle: Some(MangleOptions::default()),
            compress: Some(CompressOptions::smallest()),
        };
        let ret = oxc::minifier::Minifier::new(options).minify(&allocator, &mut program);
        let code = Codegen::new()
            .with_options(CodegenOptions {
                minify: true,
                comments: CommentOptions::disabled(),
                ..CodegenOptions::default()
            })
            .with_scoping(ret.scoping)
            .build(&program)
            .code;
        Some(code)
    }
}

impl Minifier for JsMinifier {
    fn minify(&self, content: &str) -> String {
        Self::try_minify(content).unwrap_or_else(|| {
            debug!("minify"; "js did not parse, keeping source");
            content.to_string()
        })
    }
}
