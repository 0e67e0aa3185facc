//! Asset kind definitions.

/// Kind of declared bundle input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Single file addressed by virtual path.
    File,
    /// Every matching file under a directory.
    Directory,
    /// Remote URL (passed through, or downloaded when bundled).
    Remote,
    /// Resource compiled into the host binary.
    EmbeddedResource,
    /// Inline source text.
    ArbitraryString,
    /// Path served by the host at request time; always passed through.
    Dynamic,
}

impl AssetKind {
    /// Stable label used in fingerprints and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "dir",
            Self::Remote => "remote",
            Self::EmbeddedResource => "embedded",
            Self::ArbitraryString => "string",
            Self::Dynamic => "dynamic",
        }
    }
}
