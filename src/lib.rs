//! Stitch - CSS/JavaScript bundling for server-rendered sites.
//!
//! Bundles concatenate local, remote and embedded sources, run preprocessors,
//! rewrite relative `url()` references, minify, hash and cache the result,
//! then emit the `<link>`/`<script>` tags pointing at it. In debug mode every
//! source gets its own tag instead.
//!
//! ```ignore
//! use stitch::Bundler;
//!
//! let bundler = Bundler::builder().root("public").build()?;
//! let tags = bundler
//!     .css()
//!     .add("/css/reset.css")
//!     .add_directory("/css/components", true)
//!     .process_imports()
//!     .render("/css/site.#.css")?;
//! ```

pub mod asset;
pub mod bundle;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod hash;
pub mod host;
pub mod lock;
pub mod logger;
pub mod minify;
pub mod preprocess;
pub mod resolve;
pub mod rewrite;
pub mod utils;
pub mod writer;

pub use bundle::{Bundle, BundleKind, Bundler, BundlerBuilder, Css, JavaScript, PreprocessorScope};
pub use config::StitchConfig;
pub use error::{BundleError, Result};
pub use host::{DebugStatus, EnvDebugStatus, PathTranslator, RootPathTranslator, StaticDebugStatus};
pub use minify::{CssMinifier, JsMinifier, Minifier, NullMinifier};
pub use preprocess::{CommandPreprocessor, Preprocessor};
pub use writer::{FileWriter, ReleaseWriter};
