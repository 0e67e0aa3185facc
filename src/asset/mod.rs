//! Declared bundle inputs.
//!
//! An [`Asset`] is created by a builder call (`add`, `add_remote`, ...) and is
//! never mutated after it has been appended to a bundle.

mod attrs;
mod kind;

pub use attrs::Attributes;
pub use kind::AssetKind;

/// One declared input of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Asset {
    pub kind: AssetKind,
    /// Virtual path, local path of a remote asset, or inline source text.
    pub source: String,
    /// Remote URL used in release mode.
    pub remote_url: Option<String>,
    /// Identifier inside the embedded resource provider.
    pub resource_id: Option<String>,
    /// Extension hint for inline strings (drives preprocessor dispatch).
    pub extension: Option<String>,
    pub force_minify: bool,
    pub recursive: bool,
    /// Remote content is downloaded and bundled instead of passed through.
    pub download: bool,
    pub attributes: Attributes,
}

impl Asset {
    fn new(kind: AssetKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            remote_url: None,
            resource_id: None,
            extension: None,
            force_minify: false,
            recursive: false,
            download: false,
            attributes: Attributes::new(),
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self::new(AssetKind::File, path)
    }

    pub fn directory(path: impl Into<String>, recursive: bool) -> Self {
        Self {
            recursive,
            ..Self::new(AssetKind::Directory, path)
        }
    }

    /// Remote asset referenced by `local_path` in debug and `url` in release.
    pub fn remote(local_path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            remote_url: Some(url.into()),
            ..Self::new(AssetKind::Remote, local_path)
        }
    }

    /// Remote asset whose content is downloaded into the bundle.
    pub fn remote_bundled(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            remote_url: Some(url.clone()),
            download: true,
            ..Self::new(AssetKind::Remote, url)
        }
    }

    pub fn embedded(virtual_path: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: Some(resource_id.into()),
            ..Self::new(AssetKind::EmbeddedResource, virtual_path)
        }
    }

    pub fn string(content: impl Into<String>, extension: Option<String>) -> Self {
        Self {
            extension: extension.map(|ext| ext.trim_start_matches('.').to_ascii_lowercase()),
            ..Self::new(AssetKind::ArbitraryString, content)
        }
    }

    pub fn dynamic(path: impl Into<String>) -> Self {
        Self::new(AssetKind::Dynamic, path)
    }

    pub fn minified(mut self) -> Self {
        self.force_minify = true;
        self
    }

    /// Whether the asset is emitted as its own tag in release mode.
    pub fn is_pass_through(&self) -> bool {
        match self.kind {
            AssetKind::Dynamic => true,
            AssetKind::Remote => !self.download,
            _ => false,
        }
    }

    /// Path referenced by the pass-through tag for the given mode.
    pub fn pass_through_path(&self, debug: bool) -> &str {
        match (&self.remote_url, debug) {
            (Some(url), false) => url,
            _ => &self.source,
        }
    }

    /// Feed a stable description of this asset into a fingerprint hasher.
    pub(crate) fn fingerprint_into(&self, hasher: &mut blake3::Hasher) {
        let fields: [&str; 8] = [
            self.kind.as_str(),
            &self.source,
            self.remote_url.as_deref().unwrap_or_default(),
            self.resource_id.as_deref().unwrap_or_default(),
            self.extension.as_deref().unwrap_or_default(),
            if self.force_minify { "m" } else { "-" },
            if self.recursive { "r" } else { "-" },
            if self.download { "d" } else { "-" },
        ];
        for field in fields {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        for (key, value) in self.attributes.iter() {
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
            hasher.update(b"\0");
        }
    }
}
