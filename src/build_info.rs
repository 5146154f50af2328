//! Build information module
//!
//! Contains compile-time constants for build number and timestamp.

use serde::Serialize;

/// Build number, incremented on each recompilation
pub const BUILD_NUMBER: u64 = match option_env!("LARDER_BUILD_NUMBER") {
    Some(s) => match parse_u64(s) {
        Some(n) => n,
        None => 0,
    },
    None => 0,
};

/// Build timestamp in ISO 8601 format
pub const BUILD_TIMESTAMP: &str = match option_env!("LARDER_BUILD_TIMESTAMP") {
    Some(s) => s,
    None => "unknown",
};

/// Package version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Package description from Cargo.toml
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Parse a decimal build number in const context
const fn parse_u64(s: &str) -> Option<u64> {
    let bytes = s.as_bytes();
    let mut result: u64 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < b'0' || b > b'9' {
            return None;
        }
        result = result * 10 + (b - b'0') as u64;
        i += 1;
    }
    Some(result)
}

/// Build information structure for serialization
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub description: &'static str,
}

impl BuildInfo {
    /// Get the current build info
    pub fn current() -> Self {
        Self {
            name: NAME,
            version: VERSION,
            build_number: BUILD_NUMBER,
            build_timestamp: BUILD_TIMESTAMP,
            description: DESCRIPTION,
        }
    }

    /// One-line identifier, e.g. `larder 0.3.0 (build 12, 2026-10-17T09:00:00Z)`
    pub fn label(&self) -> String {
        format!(
            "{} {} (build {}, {})",
            self.name, self.version, self.build_number, self.build_timestamp
        )
    }

    /// Startup banner lines, including which lookups are wired up
    pub fn banner_lines(
        &self,
        nutrition_sources: &[&str],
        grocery_configured: bool,
    ) -> Vec<String> {
        let sources = if nutrition_sources.is_empty() {
            "none".to_string()
        } else {
            nutrition_sources.join(" -> ")
        };
        let pricing = if grocery_configured {
            "Kroger"
        } else {
            "disabled (no credentials)"
        };
        vec![
            "===============================================".to_string(),
            format!("  {}", self.label()),
            "  Pantry nutrition, meal plans, shopping lists".to_string(),
            format!("  Nutrition lookup: {}", sources),
            format!("  Meal pricing: {}", pricing),
            "===============================================".to_string(),
        ]
    }
}

/// Print the startup banner to stderr
pub fn print_startup_banner(nutrition_sources: &[&str], grocery_configured: bool) {
    for line in BuildInfo::current().banner_lines(nutrition_sources, grocery_configured) {
        eprintln!("{}", line);
    }
}
