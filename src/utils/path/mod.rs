//! Path and URL utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `lexical_normalize`)
//! - [`route`]: URL utilities (`is_external_link`, `split_suffix`, `trim_virtual_root`)

pub mod fs;
pub mod route;

pub use fs::{lexical_normalize, normalize_path};
pub use route::{is_external_link, split_suffix};
