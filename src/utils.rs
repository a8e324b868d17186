//! Miscellaneous helper utilities.

use crate::errors::{AppError, Result};
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Read private keys, one per line. Blank lines and `#` comments are ignored.
pub fn load_keys(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AppError::Config(format!(
            "key file {} not found; create it with one private key per line",
            path.display()
        )));
    }
    let keys = parse_keys(&std::fs::read_to_string(path)?);
    if keys.is_empty() {
        return Err(AppError::Config(format!(
            "key file {} contains no keys",
            path.display()
        )));
    }
    Ok(keys)
}

fn parse_keys(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_and_comments_are_skipped() {
        let body = "# main wallets\n  0xaaa  \n\n0xbbb\r\n   \n";
        assert_eq!(parse_keys(body), vec!["0xaaa", "0xbbb"]);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let res = load_keys("/definitely/not/here/pvt.txt");
        assert!(matches!(res, Err(AppError::Config(_))));
    }

    #[test]
    fn reads_keys_from_disk() {
        let path = std::env::temp_dir().join(format!("keys-{}.txt", std::process::id()));
        std::fs::write(&path, "0x01\n\n0x02\n").unwrap();
        let keys = load_keys(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(keys, vec!["0x01", "0x02"]);
    }

    #[test]
    fn empty_file_is_rejected() {
        let path = std::env::temp_dir().join(format!("empty-keys-{}.txt", std::process::id()));
        std::fs::write(&path, "\n# nothing\n").unwrap();
        let res = load_keys(&path);
        std::fs::remove_file(&path).ok();
        assert!(res.is_err());
    }
}
