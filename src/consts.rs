//! Project-wide constants.

use std::path::PathBuf;

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Account key for the stored credential. One credential set per
/// installation.
pub const DEFAULT_ACCOUNT: &str = "default";

/// Default database path: `~/.parley/parley.db`.
/// Single DB for credentials and config.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .expect("cannot determine home directory")
        .join(".parley")
        .join("parley.db")
}
