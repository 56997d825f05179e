//! Asset minification for JS, CSS and JSON.
//!
//! Uses oxc for JavaScript, lightningcss for CSS and serde_json for JSON.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use thiserror::Error;

/// A minifier rejected its input.
#[derive(Debug, Error)]
pub enum MinifyError {
    #[error("JavaScript syntax error: {0}")]
    Js(String),

    #[error("CSS syntax error{}: {message}", at_line(.line))]
    Css { line: Option<u32>, message: String },

    #[error("CSS printing failed: {0}")]
    CssPrint(String),
}

fn at_line(line: &Option<u32>) -> String {
    line.map(|l| format!(" at line {l}")).unwrap_or_default()
}

/// Minify JavaScript source code.
///
/// Sources are parsed as classic scripts, so top-level bindings stay global
/// and keep their names; only local identifiers are mangled.
pub fn minify_js(source: &str) -> Result<String, MinifyError> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs().with_module(false);
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        let messages: Vec<_> = ret.errors.iter().map(ToString::to_string).collect();
        return Err(MinifyError::Js(messages.join("; ")));
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Result<String, MinifyError> {
    let stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| MinifyError::Css {
            // lightningcss lines are 0-based
            line: e.loc.as_ref().map(|loc| loc.line + 1),
            message: e.kind.to_string(),
        })?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| MinifyError::CssPrint(e.to_string()))?;
    Ok(result.code)
}

/// Reserialize JSON without insignificant whitespace.
///
/// Key order is preserved. Malformed input is an error; callers decide the
/// fallback.
pub fn minify_json(source: &str) -> Result<String, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(source)?;
    serde_json::to_string(&value)
}
