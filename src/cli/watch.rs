//! `stitch watch`: re-render bundles when sources change.
//!
//! ```text
//! notify → debounce (300ms quiet) → filter → reload config? → render_named
//! ```
//!
//! Release output and debug artifacts land inside the watched root. Renders
//! whose inputs are unchanged hit the content cache and write nothing, so
//! our own writes settle after one extra round.

use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, channel};
use std::time::{Duration, Instant};

use super::RenderArgs;
use super::render::{render_all, select};
use crate::bundle::Bundler;
use crate::config::StitchConfig;
use crate::logger::{status_error, status_success};
use crate::utils::path::normalize_path;
use crate::{debug, log};

const DEBOUNCE_MS: u64 = 300;

/// Set by the Ctrl+C handler.
pub static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Whether the watch loop is running and will stop on [`SHUTDOWN`].
pub static WATCHING: AtomicBool = AtomicBool::new(false);

/// Check if path is a temp/backup file or a debug artifact
fn is_ignored(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp" | "lock")
        || name.ends_with('~')
        || name.starts_with('.')
        || name.contains(".debug.")
}

/// Collects changed paths until events go quiet.
struct Debouncer {
    changes: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            changes: FxHashSet::default(),
            last_event: None,
        }
    }

    fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        match event.kind {
            EventKind::Create(_) | EventKind::Remove(_) => {}
            EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => {}
            _ => return,
        }

        debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);
        for path in event.paths.iter().filter(|p| !is_ignored(p)) {
            self.changes.insert(normalize_path(path));
            self.last_event = Some(Instant::now());
        }
    }

    /// Changed paths once the debounce window has passed.
    fn take_if_ready(&mut self) -> Option<FxHashSet<PathBuf>> {
        let last = self.last_event?;
        if last.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
            return None;
        }
        self.last_event = None;
        Some(std::mem::take(&mut self.changes))
    }
}

/// Mutable state of one watch session.
struct Session {
    config: StitchConfig,
    bundler: Bundler,
    names: Vec<String>,
    /// Last emitted tags, to report only bundles whose output changed.
    tags: FxHashMap<String, String>,
}

impl Session {
    fn start(config: StitchConfig, args: &RenderArgs) -> Result<Self> {
        let names = select(&config, &args.names)?
            .iter()
            .map(|b| b.name.clone())
            .collect();
        let bundler = config.builder().build()?;
        let mut session = Self {
            config,
            bundler,
            names,
            tags: FxHashMap::default(),
        };
        session.register_all();
        Ok(session)
    }

    /// Register every selected bundle (initial render or config reload).
    fn register_all(&mut self) {
        let selected = match select(&self.config, &self.names) {
            Ok(selected) => selected,
            Err(e) => {
                status_error("bundle selection failed", &e.to_string());
                return;
            }
        };

        let rendered = render_all(&self.bundler, &selected);
        let mut errors = Vec::new();
        for item in rendered {
            match item.result {
                Ok(tag) => {
                    self.tags.insert(item.bundle.name.clone(), tag);
                }
                Err(e) => errors.push(format!("{}: {}", item.bundle.name, e)),
            }
        }

        debug!("watch"; "registered: {}", self.bundler.named_bundles().join(", "));
        if errors.is_empty() {
            status_success(&format!("rendered {} bundles", self.tags.len()));
        } else {
            status_error("render failed", &errors.join("\n"));
        }
    }

    /// Re-render registered bundles; stale cache entries rebuild themselves.
    fn refresh(&mut self) {
        let mut changed = Vec::new();
        let mut errors = Vec::new();

        for name in &self.names {
            match self.bundler.render_named(name) {
                Ok(tag) => {
                    if self.tags.get(name) != Some(&tag) {
                        changed.push(name.as_str());
                        self.tags.insert(name.clone(), tag);
                    }
                }
                // Failed at registration; registering again retries it.
                Err(crate::error::BundleError::UnregisteredName { .. }) => {
                    if let Some(bundle) = self.config.bundle(name) {
                        match bundle.register(&self.bundler) {
                            Ok(tag) => {
                                changed.push(name.as_str());
                                self.tags.insert(name.clone(), tag);
                            }
                            Err(e) => errors.push(format!("{name}: {e}")),
                        }
                    }
                }
                Err(e) => errors.push(format!("{name}: {e}")),
            }
        }

        if !errors.is_empty() {
            status_error("render failed", &errors.join("\n"));
        } else if !changed.is_empty() {
            status_success(&format!("rendered {}", changed.join(", ")));
        }
    }

    fn reload(&mut self, args: &RenderArgs) {
        let mut config = match StitchConfig::load(&self.config.config_path) {
            Ok(config) => config,
            Err(e) => {
                status_error("config reload failed", &format!("{e:#}"));
                return;
            }
        };
        args.apply(&mut config);

        match config.builder().build() {
            Ok(bundler) => {
                self.bundler = bundler;
                self.config = config;
                self.tags.clear();
                log!("watch"; "config reloaded");
                self.register_all();
            }
            Err(e) => status_error("config reload failed", &e.to_string()),
        }
    }
}

/// Entry point for `stitch watch`. Runs until Ctrl+C.
pub fn watch_bundles(config: StitchConfig, args: &RenderArgs) -> Result<()> {
    let (tx, rx) = channel();
    let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })?;

    let root = config.stitch.root.clone();
    let config_path = config.config_path.clone();
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", root.display()))?;
    if !config_path.starts_with(&root) {
        watcher.watch(&config_path, RecursiveMode::NonRecursive)?;
    }

    let mut session = Session::start(config, args)?;
    log!("watch"; "watching {} (Ctrl+C to stop)", root.display());
    run_loop(&rx, &mut session, &config_path, args);
    Ok(())
}

fn run_loop(
    rx: &Receiver<notify::Result<notify::Event>>,
    session: &mut Session,
    config_path: &Path,
    args: &RenderArgs,
) {
    let mut debouncer = Debouncer::new();
    WATCHING.store(true, Ordering::SeqCst);

    while !SHUTDOWN.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(DEBOUNCE_MS / 3)) {
            Ok(Ok(event)) => debouncer.add_event(&event),
            Ok(Err(e)) => log!("watch"; "notify error: {}", e),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let Some(changes) = debouncer.take_if_ready() else {
            continue;
        };
        if changes.is_empty() {
            continue;
        }
        debug!("watch"; "{} paths changed", changes.len());

        if changes.iter().any(|p| p == config_path) {
            session.reload(args);
        } else {
            session.refresh();
        }
    }

    WATCHING.store(false, Ordering::SeqCst);
    log!("watch"; "stopped");
}
