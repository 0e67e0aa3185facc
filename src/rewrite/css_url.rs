//! `url(...)` rewriting for relocated CSS.
//!
//! Every occurrence is rewritten on its own, so references that differ only
//! in case (`Images/x.png` vs `images/x.png`) stay distinct. References are
//! never fed into a regex, so paths full of metacharacters are safe.
//!
//! Left untouched:
//! - empty references (`url()`, `url('')`, `url("")`)
//! - root-relative (`/a.png`), external (`http://`, `//cdn`) and `data:` URLs
//! - fragment-only references (`url(#gradient)`)
//! - anything inside a `behavior:` declaration
//! - identifiers that merely end in `url` (`.url(`, `my-url(`)
//!
//! Downloaded stylesheets have no directory on disk to rebase from. Their
//! relative references are resolved against the URL they came from instead
//! (see [`absolutize_remote`]).

use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use url::Url;

use super::RelativePathAdapter;
use crate::hash::{FileHashCache, Hasher};
use crate::host::PathTranslator;
use crate::utils::path::route::append_query;
use crate::utils::path::{is_external_link, lexical_normalize, split_suffix};

static RE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^)"']*?))\s*\)"#)
        .expect("static url() pattern")
});

static RE_IMPORT_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)@import\s+(?:"([^"]*)"|'([^']*)')"#).expect("static @import pattern")
});

/// Appends content hashes of referenced files to their URLs.
pub struct AssetHashing<'a> {
    /// Query-string key (`r` by default).
    pub key: &'a str,
    pub hasher: &'a dyn Hasher,
    pub cache: &'a FileHashCache,
    /// Resolves root-relative references to files.
    pub translator: &'a dyn PathTranslator,
}

/// Rewrites CSS so it can be served from `output_file`'s directory.
pub struct CssRewriter<'a> {
    output_dir: PathBuf,
    hashing: Option<AssetHashing<'a>>,
}

impl<'a> CssRewriter<'a> {
    pub fn new(output_file: &Path, hashing: Option<AssetHashing<'a>>) -> Self {
        let output_dir = output_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            output_dir,
            hashing,
        }
    }

    /// Rewrite every relative reference in `css`, which was read from
    /// `source_file`.
    pub fn rewrite(&self, css: &str, source_file: &Path) -> String {
        let source_dir = source_file.parent().unwrap_or_else(|| Path::new(""));
        let adapter = RelativePathAdapter::between(source_dir, &self.output_dir);
        replace_urls(css, |url| self.rewrite_reference(url, &adapter))
    }

    /// New text for one reference, `None` to keep it as written.
    fn rewrite_reference(&self, raw: &str, adapter: &RelativePathAdapter) -> Option<String> {
        let url = raw.trim();
        if url.is_empty() || url.starts_with('#') || is_external_link(url) {
            return None;
        }
        let (path, suffix) = split_suffix(url);
        if path.is_empty() {
            return None;
        }

        let root_relative = path.starts_with('/') || path.starts_with('\\');
        let new_path = if root_relative {
            path.to_string()
        } else {
            adapter.adapt(path)
        };

        let rewritten = format!("{new_path}{suffix}");
        let hashed = self
            .hashing
            .as_ref()
            .and_then(|hashing| self.append_hash(hashing, &new_path, &rewritten, root_relative));

        match hashed {
            Some(hashed) => Some(hashed),
            None if rewritten == url => None,
            None => Some(rewritten),
        }
    }

    fn append_hash(
        &self,
        hashing: &AssetHashing<'_>,
        new_path: &str,
        rewritten: &str,
        root_relative: bool,
    ) -> Option<String> {
        let file = if root_relative {
            hashing.translator.to_file_system_path(new_path)
        } else {
            lexical_normalize(&self.output_dir.join(new_path))
        };
        if !file.is_file() {
            return None;
        }
        let hash = hashing.cache.get_or_compute(&file, hashing.hasher)?;
        Some(append_query(rewritten, hashing.key, &hash))
    }
}

/// Resolve relative references in CSS downloaded from `source_url`.
///
/// Covers `url()` values and quoted `@import` targets. Root-relative paths
/// resolve against the remote host. Returns `css` unchanged when
/// `source_url` does not parse.
pub fn absolutize_remote(css: &str, source_url: &str) -> String {
    let Ok(base) = Url::parse(source_url) else {
        return css.to_string();
    };
    let resolve = |raw: &str| {
        let url = raw.trim();
        if url.is_empty() || url.starts_with('#') || is_external_link(url) {
            return None;
        }
        base.join(url).ok().map(String::from)
    };

    let css = replace_urls(css, &resolve);
    RE_IMPORT_STRING
        .replace_all(&css, |caps: &Captures<'_>| {
            let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
            let start = caps.get(0).map_or(0, |m| m.start());
            match caps.get(1).or_else(|| caps.get(2)) {
                Some(target) => splice(whole, start, &target, resolve(target.as_str())),
                None => whole.to_string(),
            }
        })
        .into_owned()
}

/// Apply `replace` to every `url()` reference outside `behavior:` values.
fn replace_urls(css: &str, replace: impl Fn(&str) -> Option<String>) -> String {
    RE_URL
        .replace_all(css, |caps: &Captures<'_>| {
            let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
            let Some(url) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)) else {
                return whole.to_string();
            };
            let start = caps.get(0).map_or(0, |m| m.start());
            if !is_url_function(css, start) || in_behavior_declaration(&css[..start]) {
                return whole.to_string();
            }
            splice(whole, start, &url, replace(url.as_str()))
        })
        .into_owned()
}

/// `whole` (matched at `start`) with `inner` swapped for `replacement`.
fn splice(whole: &str, start: usize, inner: &regex::Match<'_>, replacement: Option<String>) -> String {
    let Some(replacement) = replacement else {
        return whole.to_string();
    };
    let inner_start = inner.start() - start;
    let inner_end = inner.end() - start;
    format!(
        "{}{}{}",
        &whole[..inner_start],
        replacement,
        &whole[inner_end..]
    )
}

/// `url(` at `start` is a function call, not the tail of an identifier.
fn is_url_function(css: &str, start: usize) -> bool {
    css[..start].chars().next_back().is_none_or(|c| {
        !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '#' | '\\'))
    })
}

/// Whether the text before a `url(` ends inside a `behavior:` value.
fn in_behavior_declaration(before: &str) -> bool {
    let decl_start = before.rfind([';', '{', '}']).map_or(0, |i| i + 1);
    let decl = &before[decl_start..];
    let Some((property, value)) = decl.split_once(':') else {
        return false;
    };
    let property = property.trim();
    value.trim().is_empty()
        && (property.eq_ignore_ascii_case("behavior")
            || property.eq_ignore_ascii_case("-ms-behavior"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{DigestHasher, HashAlgorithm};
    use crate::host::RootPathTranslator;
    use std::fs;
    use tempfile::TempDir;

    fn rewrite(css: &str, source: &str, output: &str) -> String {
        CssRewriter::new(Path::new(output), None).rewrite(css, Path::new(source))
    }

    const SOURCE: &str = "/somepath/somesubpath/myfile.css";
    const OUTPUT: &str = "/somepath/someothersubpath/evendeeper/output.css";

    #[test]
    fn test_relative_reference_is_rebased() {
        let out = rewrite("a{background:url(../img/something.jpg)}", SOURCE, OUTPUT);
        assert_eq!(out, "a{background:url(../../img/something.jpg)}");
    }

    #[test]
    fn test_quotes_and_whitespace_are_kept() {
        let out = rewrite(
            "a{background:url( \"../img/a.jpg\" )} b{background:url('../img/b.jpg')}",
            SOURCE,
            OUTPUT,
        );
        assert_eq!(
            out,
            "a{background:url( \"../../img/a.jpg\" )} b{background:url('../../img/b.jpg')}"
        );
    }

    #[test]
    fn test_uppercase_url_function() {
        let out = rewrite("a{background:URL(../img/a.jpg)}", SOURCE, OUTPUT);
        assert_eq!(out, "a{background:URL(../../img/a.jpg)}");
    }

    #[test]
    fn test_query_and_fragment_survive() {
        let out = rewrite(
            "@font-face{src:url(../fonts/f.eot?#iefix) format('eot'),url(../fonts/f.svg#Font%20Name)}",
            SOURCE,
            OUTPUT,
        );
        assert!(out.contains("url(../../fonts/f.eot?#iefix)"));
        assert!(out.contains("url(../../fonts/f.svg#Font%20Name)"));
    }

    #[test]
    fn test_absolute_external_data_and_behavior_untouched() {
        let css = "a{background:url(/abs/path.png)}\
                   b{background:url(http://x/y.png)}\
                   c{background:url(//cdn/y.png)}\
                   d{background:url(data:image/png;base64,iVBORw0KGgo=)}\
                   e{behavior: url(../htc/pie.htc)}\
                   f{fill:url(#grad)}";
        assert_eq!(rewrite(css, SOURCE, OUTPUT), css);
    }

    #[test]
    fn test_empty_references_untouched() {
        let css = "a{background:url()} b{background:url('')} c{background:url(\"\")}";
        assert_eq!(rewrite(css, SOURCE, OUTPUT), css);
    }

    #[test]
    fn test_case_distinct_references_not_merged() {
        let out = rewrite(
            "a{background:url(Images/x.png)} b{background:url(images/x.png)}",
            "/a/b/s.css",
            "/a/c/o.css",
        );
        assert_eq!(
            out,
            "a{background:url(../b/Images/x.png)} b{background:url(../b/images/x.png)}"
        );
    }

    #[test]
    fn test_regex_metacharacters_in_paths() {
        let out = rewrite(
            "a{background:url(img/(a)+[b]*$^.png)}",
            "/a/b/s.css",
            "/a/c/o.css",
        );
        assert_eq!(out, "a{background:url(../b/img/(a)+[b]*$^.png)}");
    }

    #[test]
    fn test_url_class_selector_is_not_a_function() {
        let css = ".url{color:red} .url(x){} a.url{b:c}";
        assert_eq!(rewrite(css, "/a/b/s.css", "/a/c/o.css"), css);
    }

    #[test]
    fn test_long_data_uri_never_touches_fs() {
        let data = format!(
            "a{{background:url(data:image/png;base64,{})}}",
            "A".repeat(100_000)
        );
        assert_eq!(rewrite(&data, "/a/b/s.css", "/a/c/o.css"), data);
    }

    #[test]
    fn test_same_directory_untouched() {
        let css = "a{background:url(img/x.png)}";
        assert_eq!(rewrite(css, "/a/b/s.css", "/a/b/o.css"), css);
    }

    #[test]
    fn test_append_hash_for_assets() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("img")).unwrap();
        fs::create_dir_all(root.join("css")).unwrap();
        fs::write(root.join("img/a.png"), "png-a").unwrap();

        let hasher = DigestHasher::new(HashAlgorithm::Md5);
        let cache = FileHashCache::new();
        let translator = RootPathTranslator::new(root);
        let rewriter = CssRewriter::new(
            &root.join("css/out.css"),
            Some(AssetHashing {
                key: "r",
                hasher: &hasher,
                cache: &cache,
                translator: &translator,
            }),
        );
        let expected = hasher.hash(b"png-a");

        let css = "a{background:url(../img/a.png)}\
                   b{background:url(/img/a.png?v=1)}\
                   c{background:url(../img/missing.png)}";
        let out = rewriter.rewrite(css, &root.join("css/site.css"));

        assert!(out.contains(&format!("url(../img/a.png?r={expected})")));
        assert!(out.contains(&format!("url(/img/a.png?v=1&r={expected})")));
        assert!(out.contains("url(../img/missing.png)"));
    }

    #[test]
    fn test_remote_references_resolve_against_source_url() {
        let css = "@import 'parts/grid.css' screen;\
                   a{background:url(img/x.png)}\
                   b{background:url('../fonts/f.woff')}\
                   c{background:url(/root.png)}\
                   d{background:url(https://other.example.com/y.png)}\
                   e{fill:url(#grad)}\
                   f{background:url(data:image/gif;base64,R0lGOD==)}";
        let out = absolutize_remote(css, "https://cdn.example.com/lib/theme/site.css");
        assert_eq!(
            out,
            "@import 'https://cdn.example.com/lib/theme/parts/grid.css' screen;\
             a{background:url(https://cdn.example.com/lib/theme/img/x.png)}\
             b{background:url('https://cdn.example.com/lib/fonts/f.woff')}\
             c{background:url(https://cdn.example.com/root.png)}\
             d{background:url(https://other.example.com/y.png)}\
             e{fill:url(#grad)}\
             f{background:url(data:image/gif;base64,R0lGOD==)}"
        );
    }

    #[test]
    fn test_unparseable_source_url_leaves_css_alone() {
        let css = "a{background:url(img/x.png)}";
        assert_eq!(absolutize_remote(css, "not a url"), css);
    }
}
