//! Build version string

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commit hash injected at build time (`GIT_COMMIT=$(git rev-parse HEAD)`)
pub const GIT_COMMIT: Option<&str> = option_env!("GIT_COMMIT");

/// Full version string, e.g. `0.1.0-1a2b3c4d` when a commit is known.
pub fn version() -> String {
    format_version(VERSION, GIT_COMMIT)
}

fn format_version(version: &str, commit: Option<&str>) -> String {
    match commit.filter(|c| !c.is_empty()) {
        Some(commit) => {
            let short: String = commit.chars().take(8).collect();
            format!("{}-{}", version, short)
        }
        None => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_version() {
        assert_eq!(format_version("0.1.0", None), "0.1.0");
        assert_eq!(format_version("0.1.0", Some("")), "0.1.0");
        assert_eq!(
            format_version("0.1.0", Some("1a2b3c4d5e6f")),
            "0.1.0-1a2b3c4d"
        );
        assert_eq!(format_version("0.1.0", Some("abc")), "0.1.0-abc");
    }
}
