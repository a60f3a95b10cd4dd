use anyhow::Result;
use std::path::{Path, PathBuf};

/// Expand a leading `~` in a path to the user's home directory.
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    Ok(PathBuf::from(shellexpand::tilde(path).into_owned()))
}

/// Ensure a directory exists, creating it (and parents) if necessary.
pub async fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        tokio::fs::create_dir_all(path).await?;
    }
    Ok(())
}

/// Human-readable file size, e.g. `"1.5 MB"`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.1} {}", size, UNITS[unit_index])
}

/// Delete a file if it exists, swallowing "not found" errors.
///
/// Used after failed download attempts and trimmed-transcript temp files,
/// where the caller doesn't care whether the file was ever created.
pub async fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_file_size(1536), "1.5 KB");
    }

    #[tokio::test]
    async fn test_remove_if_exists_missing_file_is_ok() {
        let path = std::env::temp_dir().join("podcast-digest-does-not-exist.tmp");
        assert!(remove_if_exists(&path).await.is_ok());
    }
}
