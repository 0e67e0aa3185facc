//! HTML tag formatting.
//!
//! ```text
//! <link rel="stylesheet" type="text/css" {attrs}href="{path}" />
//! <style type="text/css">{content}</style>
//! <script type="text/javascript" {attrs}src="{path}"></script>
//! <script type="text/javascript">{content}</script>
//! ```
//!
//! Attributes render as `key="value" ` in insertion order. Typeless bundles
//! drop the `type` attribute; deferred scripts get ` defer` before `>`.

use super::BundleKind;
use crate::asset::Attributes;
use crate::utils::path::is_external_link;

/// Tag shape shared by every tag of one bundle.
#[derive(Debug, Clone, Copy)]
pub struct TagStyle {
    pub kind: BundleKind,
    pub typeless: bool,
    pub defer: bool,
}

impl TagStyle {
    /// Tag referencing an external file.
    pub fn reference(&self, attributes: &Attributes, path: &str) -> String {
        let attrs = attributes.render();
        match (self.kind, self.typeless) {
            (BundleKind::Css, false) => {
                format!(r#"<link rel="stylesheet" type="text/css" {attrs}href="{path}" />"#)
            }
            (BundleKind::Css, true) => format!(r#"<link rel="stylesheet" {attrs}href="{path}" />"#),
            (BundleKind::JavaScript, typeless) => {
                let ty = if typeless {
                    ""
                } else {
                    r#"type="text/javascript" "#
                };
                let defer = if self.defer { " defer" } else { "" };
                format!(r#"<script {ty}{attrs}src="{path}"{defer}></script>"#)
            }
        }
    }

    /// Tag carrying content inline.
    pub fn inline(&self, content: &str) -> String {
        match (self.kind, self.typeless) {
            (BundleKind::Css, false) => format!(r#"<style type="text/css">{content}</style>"#),
            (BundleKind::Css, true) => format!("<style>{content}</style>"),
            (BundleKind::JavaScript, false) => {
                format!(r#"<script type="text/javascript">{content}</script>"#)
            }
            (BundleKind::JavaScript, true) => format!("<script>{content}</script>"),
        }
    }
}

/// Prefix a web path with `base_href`, leaving external URLs alone.
pub fn apply_base_href(base_href: Option<&str>, path: &str) -> String {
    match base_href {
        Some(base) if !base.is_empty() && !is_external_link(path) => {
            let base = base.trim_end_matches('/');
            let path = path.trim_start_matches('/');
            format!("{base}/{path}")
        }
        _ => path.to_string(),
    }
}
