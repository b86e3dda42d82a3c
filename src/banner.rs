//! Startup banner display.

use crate::consts::{AUTHOR, HOMEPAGE, REPO};

/// Session configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub backend: &'a str,
    pub model: &'a str,
    pub auth_status: &'a str,
    pub db: &'a str,
}

/// Print the startup banner with session info.
pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║             P A R L E Y               ║
   ║        talk to whichever model        ║
   ╚═══════════════════════════════════════╝

   version   {}
   by        {}
   home      {}
   repo      {}
   backend   {} ({})
   auth      {}
   storage   {}
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.backend,
        info.model,
        info.auth_status,
        info.db,
    );
}

/// Printed when the REPL exits.
pub fn print_farewell() {
    println!("goodbye.");
}
