//! Relative path math between a source directory and an output directory.
//!
//! ```text
//! source  /somepath/somesubpath/myfile.css
//! output  /somepath/someothersubpath/evendeeper/output.css
//! common  /somepath
//! ascend  2 (evendeeper, someothersubpath)
//! descend [somesubpath]
//!
//! ../img/something.jpg  ->  ../../somesubpath/../img/something.jpg
//!                       ->  ../../img/something.jpg
//! ```

use std::path::{Component, Path};

use crate::utils::path::lexical_normalize;

/// Re-bases relative URLs from one directory onto another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativePathAdapter {
    ascend: usize,
    descend: Vec<String>,
}

impl RelativePathAdapter {
    /// Adapter for content moving from `source_dir` to `output_dir`.
    pub fn between(source_dir: &Path, output_dir: &Path) -> Self {
        let source = components(source_dir);
        let output = components(output_dir);
        let common = source
            .iter()
            .zip(&output)
            .take_while(|(a, b)| same_component(a, b))
            .count();
        Self {
            ascend: output.len() - common,
            descend: source[common..].to_vec(),
        }
    }

    /// Whether source and output directories are the same.
    pub fn is_identity(&self) -> bool {
        self.ascend == 0 && self.descend.is_empty()
    }

    /// Rewrite a relative URL path (no query or fragment).
    pub fn adapt(&self, url_path: &str) -> String {
        if self.is_identity() {
            return url_path.to_string();
        }

        let mut stack: Vec<&str> = Vec::new();
        let ups = std::iter::repeat_n("..", self.ascend);
        let downs = self.descend.iter().map(String::as_str);
        for segment in ups.chain(downs).chain(url_path.split('/')) {
            match segment {
                "" | "." => {}
                ".." => match stack.last() {
                    Some(&last) if last != ".." => {
                        stack.pop();
                    }
                    _ => stack.push(".."),
                },
                other => stack.push(other),
            }
        }

        let mut out = stack.join("/");
        if url_path.ends_with('/') && !out.is_empty() {
            out.push('/');
        }
        out
    }
}

fn components(dir: &Path) -> Vec<String> {
    lexical_normalize(dir)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::Prefix(prefix) => Some(prefix.as_os_str().to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

#[cfg(windows)]
fn same_component(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[cfg(not(windows))]
fn same_component(a: &str, b: &str) -> bool {
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(source: &str, output: &str) -> RelativePathAdapter {
        RelativePathAdapter::between(Path::new(source), Path::new(output))
    }

    #[test]
    fn test_sibling_deeper_output() {
        let a = adapter("/somepath/somesubpath", "/somepath/someothersubpath/evendeeper");
        assert_eq!(a.adapt("../img/something.jpg"), "../../img/something.jpg");
    }

    #[test]
    fn test_sibling_directories() {
        let a = adapter("/a/b", "/a/c");
        assert_eq!(a.adapt("../img/x.jpg"), "../img/x.jpg");
        assert_eq!(a.adapt("img/x.jpg"), "../b/img/x.jpg");
    }

    #[test]
    fn test_output_above_source() {
        let a = adapter("/site/css/theme", "/site");
        assert_eq!(a.adapt("img/bg.png"), "css/theme/img/bg.png");
        assert_eq!(a.adapt("../fonts/f.woff"), "css/fonts/f.woff");
    }

    #[test]
    fn test_same_directory_is_untouched() {
        let a = adapter("/site/css", "/site/css/");
        assert!(a.is_identity());
        assert_eq!(a.adapt("./img/../img/x.png"), "./img/../img/x.png");
    }

    #[test]
    fn test_case_differences_are_preserved() {
        let a = adapter("/a/b", "/a/c");
        assert_eq!(a.adapt("Images/x.png"), "../b/Images/x.png");
        assert_eq!(a.adapt("images/x.png"), "../b/images/x.png");
    }
}
