//! CSS minification via lightningcss.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

use super::Minifier;
use crate::debug;

/// lightningcss-backed CSS minifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssMinifier;

impl CssMinifier {
    /// Minify CSS source code, `None` when it does not parse.
    pub fn try_minify(source: &str) -> Option<String> {
        let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
        let result = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..PrinterOptions::default()
            })
            .ok()?;
        Some(result.code)
    }
}

impl Minifier for CssMinifier {
    fn minify(&self, content: &str) -> String {
        Self::try_minify(content).unwrap_or_else(|| {
            debug!("minify"; "css did not parse, keeping source");
            content.to_string()
        })
    }
}
