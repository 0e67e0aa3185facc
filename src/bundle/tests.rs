//! End-to-end rendering tests against a temp web root.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use super::*;
use crate::error::BundleError;
use crate::hash::{DigestHasher, HashAlgorithm, Hasher};
use crate::host::StaticDebugStatus;
use crate::minify::NullMinifier;
use crate::resolve::{HttpResolver, ResolveContext, ResolvedFile, Resolver, StaticResources, TempStore};

// ============================================================================
// Fixtures
// ============================================================================

/// Hasher returning a fixed digest.
struct FixedHasher(&'static str);

impl Hasher for FixedHasher {
    fn hash(&self, _bytes: &[u8]) -> String {
        self.0.to_string()
    }
}

/// Minifier that drops all whitespace.
struct Squash;

impl Minifier for Squash {
    fn minify(&self, content: &str) -> String {
        content.split_whitespace().collect()
    }
}

/// Preprocessor for the `up` suffix tag.
struct Upper;

impl Preprocessor for Upper {
    fn extensions(&self) -> Vec<String> {
        vec!["up".to_string()]
    }

    fn process(&self, _path: &Path, content: &str) -> Result<String> {
        Ok(content.to_uppercase())
    }
}

/// Remote resolver that never touches the network.
struct FakeRemote;

impl Resolver for FakeRemote {
    fn resolve(&self, asset: &Asset, _ctx: &ResolveContext<'_>) -> Result<Vec<ResolvedFile>> {
        let url = asset.remote_url.clone().unwrap_or_default();
        Ok(vec![ResolvedFile {
            path: PathBuf::from("/remote").join(url.rsplit('/').next().unwrap_or_default()),
            content: format!("/* {url} */"),
        }])
    }
}

struct Site {
    dir: TempDir,
}

impl Site {
    fn new(files: &[(&str, &str)]) -> Self {
        let site = Self {
            dir: TempDir::new().unwrap(),
        };
        for (path, content) in files {
            site.write(path, content);
        }
        site
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel.trim_start_matches('/'))
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }

    fn builder(&self) -> BundlerBuilder {
        Bundler::builder()
            .root(self.dir.path())
            .lock_dir(self.dir.path().join(".locks"))
            .hasher(Arc::new(FixedHasher("hash")))
            .css_minifier(Arc::new(NullMinifier))
            .js_minifier(Arc::new(NullMinifier))
            .remote_resolver(Arc::new(FakeRemote))
    }

    fn bundler(&self, debug: bool) -> Bundler {
        self.builder().debug(debug).build().unwrap()
    }
}

fn link(href: &str) -> String {
    format!(r#"<link rel="stylesheet" type="text/css" href="{href}" />"#)
}

fn script(src: &str) -> String {
    format!(r#"<script type="text/javascript" src="{src}"></script>"#)
}

// ============================================================================
// Release
// ============================================================================

#[test]
fn test_end_to_end_css_release() {
    let site = Site::new(&[
        ("css/a.css", "li { margin-bottom: .1em; }"),
        ("css/b.css", "ul { margin: 0; }"),
    ]);
    let bundler = site.bundler(false);

    let tag = bundler
        .css()
        .add("/css/a.css")
        .add("/css/b.css")
        .with_minifier(Squash)
        .render("/css/output.css")
        .unwrap();

    assert_eq!(tag, link("/css/output.css?r=hash"));
    assert_eq!(
        site.read("css/output.css"),
        "li{margin-bottom:.1em;}ul{margin:0;}"
    );
}

#[test]
fn test_release_is_deterministic() {
    let site = Site::new(&[("css/a.css", "a{}"), ("css/b.css", "b{}")]);
    let render = || {
        let bundler = site
            .builder()
            .hash_algorithm(HashAlgorithm::Md5)
            .debug(false)
            .build()
            .unwrap();
        bundler
            .css()
            .add("/css/a.css")
            .add("/css/b.css")
            .render("/css/out.css")
            .unwrap()
    };
    let first = render();
    let first_content = site.read("css/out.css");
    assert_eq!(first, render());
    assert_eq!(first_content, site.read("css/out.css"));

    let expected = DigestHasher::new(HashAlgorithm::Md5).hash(first_content.as_bytes());
    assert!(first.contains(&format!("?r={expected}")));
}

#[test]
fn test_declaration_order_is_kept() {
    let site = Site::new(&[("js/c.js", "c();"), ("js/a.js", "a();"), ("js/b.js", "b();")]);
    site.bundler(false)
        .javascript()
        .add("/js/c.js")
        .add("/js/a.js")
        .add_string("inline();")
        .add("/js/b.js")
        .render("/js/app.js")
        .unwrap();
    assert_eq!(site.read("js/app.js"), "c();\na();\ninline();\nb();\n");
}

#[test]
fn test_duplicates_suppressed_first_wins() {
    let site = Site::new(&[
        ("css/lib/a.css", "a{}"),
        ("css/lib/b.css", "b{}"),
        ("css/site.css", "s{}"),
    ]);
    site.bundler(false)
        .css()
        .add("/css/lib/b.css")
        .add("/css/site.css")
        .add_directory("/css/lib", false)
        .add("~/css/site.css")
        .add_string("x{}")
        .add_string("x{}")
        .render("/css/out.css")
        .unwrap();
    assert_eq!(site.read("css/out.css"), "b{}\ns{}\na{}\nx{}\n");
}

#[test]
fn test_hash_placeholder_in_file_name() {
    let site = Site::new(&[("css/a.css", "a{}")]);
    let bundler = site.builder().hasher(Arc::new(FixedHasher("ABC123"))).build().unwrap();

    let tag = bundler.css().add("/css/a.css").render("/css/output_#.css").unwrap();
    assert_eq!(tag, link("/css/output_ABC123.css"));
    assert!(site.path("css/output_ABC123.css").is_file());

    let tag = bundler.css().add("/css/a.css").render("/css/output.css").unwrap();
    assert_eq!(tag, link("/css/output.css?r=ABC123"));
}

#[test]
fn test_existing_query_is_merged() {
    let site = Site::new(&[("css/a.css", "a{}")]);
    let tag = site
        .bundler(false)
        .css()
        .add("/css/a.css")
        .with_hash_key("v")
        .render("/css/out.css?theme=dark")
        .unwrap();
    assert_eq!(tag, link("/css/out.css?theme=dark&v=hash"));
    assert!(site.path("css/out.css").is_file());
}

#[test]
fn test_without_revision_hash() {
    let site = Site::new(&[("css/a.css", "a{}")]);
    let tag = site
        .bundler(false)
        .css()
        .add("/css/a.css")
        .without_revision_hash()
        .render("/css/out.css")
        .unwrap();
    assert_eq!(tag, link("/css/out.css"));
}

#[test]
fn test_cache_key_isolation() {
    let site = Site::new(&[("css/a.css", "a{}"), ("css/b.css", "b{}")]);
    let bundler = site
        .builder()
        .hash_algorithm(HashAlgorithm::Md5)
        .build()
        .unwrap();

    let plain = bundler.css().add("/css/a.css").render("/css/out.css").unwrap();
    let cdn = bundler
        .css()
        .add("/css/a.css")
        .with_output_base_href("https://static.example.com")
        .render("/css/out.css")
        .unwrap();
    let other = bundler.css().add("/css/b.css").render("/css/out.css").unwrap();

    assert_ne!(plain, cdn);
    assert_ne!(plain, other);
    assert!(cdn.contains("https://static.example.com/css/out.css?r="));
}

#[test]
fn test_remote_only_writes_nothing() {
    let site = Site::new(&[]);
    let tag = site
        .bundler(false)
        .javascript()
        .add_remote("/js/jquery.js", "https://cdn.example.com/jquery.js")
        .render("/js/app.js")
        .unwrap();
    assert_eq!(tag, script("https://cdn.example.com/jquery.js"));
    assert!(!site.path("js/app.js").exists());
}

#[test]
fn test_pass_through_tags_precede_bundle() {
    let site = Site::new(&[("css/a.css", "a{}")]);
    let tag = site
        .bundler(false)
        .css()
        .add("/css/a.css")
        .add_remote("/css/vendor.css", "https://cdn.example.com/vendor.css")
        .add_dynamic("/theme/current.css")
        .with_output_base_href("https://static.example.com/")
        .render("/css/out.css")
        .unwrap();
    let expected = [
        link("https://cdn.example.com/vendor.css"),
        link("https://static.example.com/theme/current.css"),
        link("https://static.example.com/css/out.css?r=hash"),
    ]
    .join("\n");
    assert_eq!(tag, expected);
}

#[test]
fn test_remote_bundled_content_is_included() {
    let site = Site::new(&[("js/app.js", "app();")]);
    site.bundler(false)
        .javascript()
        .add_remote_bundled("https://cdn.example.com/lib.js")
        .add("/js/app.js")
        .render("/js/out.js")
        .unwrap();
    assert_eq!(
        site.read("js/out.js"),
        "/* https://cdn.example.com/lib.js */\napp();\n"
    );
}

#[test]
fn test_remote_bundled_css_urls_resolve_against_origin() {
    let url = "https://cdn.example.com/lib/theme.css";
    let store = Arc::new(TempStore::new().unwrap());
    store
        .get_or_materialize(url, "css", || {
            Ok(b"a{background:url(img/x.png)}".to_vec())
        })
        .unwrap();
    let remote = HttpResolver::new(Arc::clone(&store)).unwrap();

    let site = Site::new(&[("css/site.css", "b{background:url(img/b.png)}")]);
    let bundler = site
        .builder()
        .remote_resolver(Arc::new(remote))
        .debug(false)
        .build()
        .unwrap();
    bundler
        .css()
        .add_remote_bundled(url)
        .add("/css/site.css")
        .process_imports()
        .render("/out/site.css")
        .unwrap();

    let out = site.read("out/site.css");
    assert_eq!(
        out,
        "a{background:url(https://cdn.example.com/lib/img/x.png)}\n\
         b{background:url(../css/img/b.png)}\n"
    );
    assert!(!out.contains("stitch-"));
}

#[test]
fn test_css_urls_are_rebased() {
    let site = Site::new(&[(
        "css/theme/site.css",
        "a{background:url(../img/a.png)} b{background:url(/img/b.png)} \
         c{background:url(data:image/gif;base64,R0lGOD==)} d{behavior:url(x.htc)}",
    )]);
    site.bundler(false)
        .css()
        .add("/css/theme/site.css")
        .render("/out/site.css")
        .unwrap();
    assert_eq!(
        site.read("out/site.css"),
        "a{background:url(../css/img/a.png)} b{background:url(/img/b.png)} \
         c{background:url(data:image/gif;base64,R0lGOD==)} d{behavior:url(x.htc)}\n"
    );
}

#[test]
fn test_process_imports_and_asset_hashes() {
    let site = Site::new(&[
        ("css/site.css", "@import 'parts/grid.css' screen;\nbody{background:url(img/bg.png)}"),
        ("css/parts/grid.css", ".grid{background:url(../img/grid.png)}"),
        ("css/img/bg.png", "bg"),
        ("css/img/grid.png", "grid"),
    ]);
    site.bundler(false)
        .css()
        .add("/css/site.css")
        .process_imports()
        .append_hash_for_assets()
        .render("/out/site.css")
        .unwrap();

    let out = site.read("out/site.css");
    assert_eq!(
        out,
        format!(
            "@media screen{{.grid{{background:url(../css/img/grid.png?r=hash)}}}}\n\
             body{{background:url(../css/img/bg.png?r=hash)}}\n"
        )
    );
}

#[test]
fn test_forced_minify_uses_builtin_when_default_is_identity() {
    let site = Site::new(&[
        ("css/a.css", "a{x:y}"),
        ("css/b.css", "b {  color : red ; }"),
    ]);
    site.bundler(false)
        .css()
        .add("/css/a.css")
        .add_minified("/css/b.css")
        .render("/css/out.css")
        .unwrap();
    assert_eq!(site.read("css/out.css"), "a{x:y}\nb{color:red}");
}

#[test]
fn test_missing_source_is_fatal_in_release() {
    let site = Site::new(&[]);
    let err = site
        .bundler(false)
        .css()
        .add("/css/missing.css")
        .render("/css/out.css")
        .unwrap_err();
    assert!(matches!(err, BundleError::MissingSource { .. }));
    assert!(err.to_string().contains("missing.css"));
}

#[test]
fn test_changed_source_invalidates_cache() {
    let site = Site::new(&[("css/a.css", "a{}")]);
    let bundler = site.bundler(false);
    let bundle = bundler.css().add("/css/a.css");

    bundle.render("/css/out.css").unwrap();
    assert_eq!(site.read("css/out.css"), "a{}\n");

    site.write("css/a.css", "a{color:red}");
    fs::File::options()
        .write(true)
        .open(site.path("css/a.css"))
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(10))
        .unwrap();

    bundle.render("/css/out.css").unwrap();
    assert_eq!(site.read("css/out.css"), "a{color:red}\n");
}

#[test]
fn test_file_added_to_directory_invalidates_cache() {
    let site = Site::new(&[("css/w/a.css", "a{}"), ("css/w/deep/c.css", "c{}")]);
    let bundler = site.bundler(false);
    let flat = bundler.css().add_directory("/css/w", false);
    let recursive = bundler.css().add_directory("/css/w", true);

    flat.render("/css/flat.css").unwrap();
    recursive.render("/css/all.css").unwrap();
    assert_eq!(site.read("css/flat.css"), "a{}\n");
    assert_eq!(site.read("css/all.css"), "a{}\nc{}\n");

    site.write("css/w/b.css", "b{}");
    site.write("css/w/deep/d.css", "d{}");
    for dir in ["css/w", "css/w/deep"] {
        fs::File::open(site.path(dir))
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(10))
            .unwrap();
    }

    flat.render("/css/flat.css").unwrap();
    recursive.render("/css/all.css").unwrap();
    assert_eq!(site.read("css/flat.css"), "a{}\nb{}\n");
    assert_eq!(site.read("css/all.css"), "a{}\nb{}\nc{}\nd{}\n");
}

#[test]
fn test_cache_hit_skips_pipeline() {
    let site = Site::new(&[("css/a.css", "a{}")]);
    let bundler = site.bundler(false);
    let bundle = bundler.css().add("/css/a.css");
    bundle.render("/css/out.css").unwrap();
    assert_eq!(bundler.cache().len(), 1);

    fs::remove_file(site.path("css/out.css")).unwrap();
    bundle.render("/css/out.css").unwrap();
    assert!(!site.path("css/out.css").exists());

    bundle.clear_cache();
    assert!(bundler.cache().is_empty());
    bundle.render("/css/out.css").unwrap();
    assert!(site.path("css/out.css").exists());
}

#[test]
fn test_render_only_if_output_file_missing() {
    let site = Site::new(&[("css/a.css", "a{}"), ("css/out.css", "existing")]);
    let bundler = site
        .builder()
        .hash_algorithm(HashAlgorithm::Md5)
        .build()
        .unwrap();
    let tag = bundler
        .css()
        .add("/css/a.css")
        .render_only_if_output_file_missing()
        .render("/css/out.css")
        .unwrap();

    let expected = DigestHasher::new(HashAlgorithm::Md5).hash(b"existing");
    assert_eq!(tag, link(&format!("/css/out.css?r={expected}")));
    assert_eq!(site.read("css/out.css"), "existing");
}

#[test]
fn test_js_tag_options() {
    let site = Site::new(&[("js/a.js", "a();")]);
    let tag = site
        .bundler(false)
        .javascript()
        .add("/js/a.js")
        .with_attribute("async", "async")
        .with_deferred_load()
        .without_type_attribute()
        .render("/js/app.js")
        .unwrap();
    assert_eq!(tag, r#"<script async="async" src="/js/app.js?r=hash" defer></script>"#);
}

#[test]
fn test_concurrent_renders_agree() {
    let site = Site::new(&[("css/a.css", "a{}"), ("css/b.css", "b{}")]);
    let bundler = site.bundler(false);

    let tags: Vec<String> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    bundler
                        .css()
                        .add("/css/a.css")
                        .add("/css/b.css")
                        .render("/css/out.css")
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(tags.iter().all(|t| t == &tags[0]));
    assert_eq!(site.read("css/out.css"), "a{}\nb{}\n");
}

// ============================================================================
// Debug
// ============================================================================

#[test]
fn test_debug_emits_one_tag_per_file() {
    let site = Site::new(&[
        ("css/a.css", "a{}"),
        ("css/widgets/x.css", "x{}"),
        ("css/widgets/y.css", "y{}"),
    ]);
    let tags = site
        .bundler(true)
        .css()
        .add("/css/a.css")
        .add_directory("/css/widgets", false)
        .add_string("s{}")
        .add_string("s{}")
        .render("/css/out.css")
        .unwrap();

    let expected = format!(
        "{}\n{}\n{}\n<style type=\"text/css\">s{{}}</style>\n",
        link("/css/a.css"),
        link("/css/widgets/x.css"),
        link("/css/widgets/y.css"),
    );
    assert_eq!(tags, expected);
    assert!(!site.path("css/out.css").exists());
}

#[test]
fn test_debug_tolerates_missing_files() {
    let site = Site::new(&[]);
    let tags = site
        .bundler(true)
        .javascript()
        .add("/js/later.js")
        .add_remote("/js/jquery.js", "https://cdn.example.com/jquery.js")
        .render("/js/app.js")
        .unwrap();
    assert_eq!(
        tags,
        format!("{}\n{}\n", script("/js/later.js"), script("/js/jquery.js"))
    );
}

#[test]
fn test_debug_tolerates_missing_directory() {
    let site = Site::new(&[("css/a.css", "a{}")]);
    let tags = site
        .bundler(true)
        .css()
        .add_directory("/css/later", true)
        .add("/css/a.css")
        .render("/css/out.css")
        .unwrap();
    assert_eq!(tags, format!("{}\n", link("/css/a.css")));
}

#[test]
fn test_force_modes_override_host() {
    let site = Site::new(&[("css/a.css", "a{}")]);
    let release_host = site.bundler(false);
    let debug_host = site.bundler(true);

    let tags = release_host.css().add("/css/a.css").force_debug().render("/css/o.css").unwrap();
    assert_eq!(tags, format!("{}\n", link("/css/a.css")));

    let tag = debug_host.css().add("/css/a.css").force_release().render("/css/o.css").unwrap();
    assert_eq!(tag, link("/css/o.css?r=hash"));
}

#[test]
fn test_force_debug_if_is_evaluated_per_render() {
    let site = Site::new(&[("css/a.css", "a{}")]);
    let bundler = site.bundler(false);
    let flag = Arc::new(AtomicBool::new(true));
    let predicate = Arc::clone(&flag);
    let bundle = bundler
        .css()
        .add("/css/a.css")
        .force_debug_if(move || predicate.load(Ordering::SeqCst));

    assert_eq!(bundle.render("/css/o.css").unwrap(), format!("{}\n", link("/css/a.css")));
    flag.store(false, Ordering::SeqCst);
    assert_eq!(bundle.render("/css/o.css").unwrap(), link("/css/o.css?r=hash"));
}

#[test]
fn test_preprocessed_file_debug_artifact_and_release() {
    let site = Site::new(&[("css/site.up.css", "a{color:red}")]);
    let bundler = site.bundler(true);
    bundler
        .register_preprocessor(PreprocessorScope::Css, Arc::new(Upper))
        .unwrap();

    let tags = bundler.css().add("/css/site.up.css").render("/css/o.css").unwrap();
    assert_eq!(tags, format!("{}\n", link("/css/site.up.css.debug.css")));
    assert_eq!(site.read("css/site.up.css.debug.css"), "A{COLOR:RED}");

    // The artifact is not picked up again by directory assets
    bundler
        .css()
        .add_directory("/css", false)
        .force_release()
        .render("/out/o.css")
        .unwrap();
    assert_eq!(site.read("out/o.css"), "A{COLOR:RED}\n");
}

#[test]
fn test_instance_preprocessor_does_not_leak() {
    let site = Site::new(&[("js/a.up.js", "a();")]);
    let bundler = site.bundler(false);

    bundler
        .javascript()
        .add("/js/a.up.js")
        .with_preprocessor(Upper)
        .render("/js/one.js")
        .unwrap();
    bundler.javascript().add("/js/a.up.js").render("/js/two.js").unwrap();

    assert_eq!(site.read("js/one.js"), "A();\n");
    assert_eq!(site.read("js/two.js"), "a();\n");
}

#[test]
fn test_duplicate_registered_preprocessor_rejected() {
    let site = Site::new(&[]);
    let bundler = site.bundler(false);
    bundler
        .register_preprocessor(PreprocessorScope::Global, Arc::new(Upper))
        .unwrap();
    let err = bundler
        .register_preprocessor(PreprocessorScope::Global, Arc::new(Upper))
        .unwrap_err();
    assert!(matches!(err, BundleError::InvalidConfiguration(_)));

    let result = site
        .builder()
        .preprocessor(PreprocessorScope::Css, Arc::new(Upper))
        .preprocessor(PreprocessorScope::Css, Arc::new(Upper))
        .build();
    assert!(result.is_err());
}

#[test]
fn test_embedded_resource_debug_and_release() {
    let site = Site::new(&[]);
    let resources = StaticResources::new().with("grid", b".grid{display:grid}");
    let bundler = site
        .builder()
        .resources(Arc::new(resources))
        .build()
        .unwrap();

    let tag = bundler
        .css()
        .add_embedded_resource("/css/grid.css", "grid")
        .render("/css/out.css")
        .unwrap();
    assert_eq!(tag, link("/css/out.css?r=hash"));
    assert_eq!(site.read("css/out.css"), ".grid{display:grid}\n");
    assert!(!site.path("css/grid.css").exists());

    let tags = bundler
        .css()
        .add_embedded_resource("/css/grid.css", "grid")
        .force_debug()
        .render("/css/out.css")
        .unwrap();
    assert_eq!(tags, format!("{}\n", link("/css/grid.css")));
    assert_eq!(site.read("css/grid.css"), ".grid{display:grid}");
}

// ============================================================================
// Named / cached
// ============================================================================

#[test]
fn test_named_bundle_keeps_registration_mode() {
    let site = Site::new(&[("css/a.css", "a{}")]);
    let status = Arc::new(StaticDebugStatus::new(true));
    let bundler = site
        .builder()
        .debug_status(status.clone())
        .build()
        .unwrap();

    let registered = bundler.css().add("/css/a.css").as_named("site", "/css/site.css").unwrap();
    assert_eq!(registered, format!("{}\n", link("/css/a.css")));

    status.set(false);
    assert_eq!(bundler.render_named("site").unwrap(), registered);

    let release = bundler.css().add("/css/a.css").as_named("site", "/css/site.css").unwrap();
    assert_eq!(release, link("/css/site.css?r=hash"));
    assert_eq!(bundler.render_named("site").unwrap(), release);
    assert_eq!(site.read("css/site.css"), "a{}\n");
}

#[test]
fn test_named_bundle_rerenders_when_stale() {
    let site = Site::new(&[("css/a.css", "a{}")]);
    let bundler = site.bundler(false);
    bundler.css().add("/css/a.css").as_named("site", "/css/site.css").unwrap();

    bundler.invalidate("site");
    fs::remove_file(site.path("css/site.css")).unwrap();
    bundler.render_named("site").unwrap();
    assert_eq!(site.read("css/site.css"), "a{}\n");
}

#[test]
fn test_unregistered_names_are_errors() {
    let site = Site::new(&[]);
    let bundler = site.bundler(false);
    for result in [
        bundler.render_named("nope"),
        bundler.render_cached("nope"),
        bundler.render_cached_asset_tag("nope"),
    ] {
        assert!(matches!(
            result,
            Err(BundleError::UnregisteredName { ref name }) if name == "nope"
        ));
    }
}

#[test]
fn test_cached_bundle_content_and_tag() {
    let site = Site::new(&[("js/a.js", "a();"), ("js/b.js", "b();")]);
    let bundler = site.bundler(false);
    let tag = bundler
        .javascript()
        .add("/js/a.js")
        .add("/js/b.js")
        .as_cached("app", "/js/app.js")
        .unwrap();

    assert_eq!(tag, script("/js/app.js?r=hash"));
    assert!(!site.path("js/app.js").exists());
    assert_eq!(bundler.render_cached("app").unwrap(), "a();\nb();\n");
    assert_eq!(bundler.render_cached_asset_tag("app").unwrap(), tag);
}

#[test]
fn test_cached_bundle_in_debug() {
    let site = Site::new(&[("js/a.js", "a();")]);
    let bundler = site.bundler(true);
    let tags = bundler.javascript().add("/js/a.js").as_cached("app", "/js/app.js").unwrap();

    assert_eq!(tags, format!("{}\n", script("/js/a.js")));
    assert_eq!(bundler.render_cached("app").unwrap(), "a();\n");
}

#[test]
fn test_forget_and_reset_registrations() {
    let site = Site::new(&[("css/a.css", "a{}"), ("js/a.js", "a();")]);
    let bundler = site.bundler(false);
    bundler.css().add("/css/a.css").as_named("site", "/css/site.css").unwrap();
    bundler.css().add("/css/a.css").as_named("print", "/css/print.css").unwrap();
    bundler.javascript().add("/js/a.js").as_cached("app", "/js/app.js").unwrap();
    assert_eq!(bundler.named_bundles(), ["print", "site"]);

    assert!(bundler.forget("site"));
    assert!(!bundler.forget("site"));
    assert!(matches!(
        bundler.render_named("site"),
        Err(BundleError::UnregisteredName { .. })
    ));
    assert_eq!(bundler.named_bundles(), ["print"]);
    assert!(bundler.forget("app"));
    assert!(bundler.render_cached("app").is_err());

    bundler.reset();
    assert!(bundler.named_bundles().is_empty());
    assert!(bundler.render_named("print").is_err());
}
