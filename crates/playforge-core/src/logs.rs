//! Reading back the log file

use std::io;
use std::path::Path;

/// Last `limit` non-empty lines of the log at `path`, oldest first
///
/// A missing file has no lines.
///
/// # Errors
/// Any I/O error other than the file not existing
pub async fn recent_log_lines(path: &Path, limit: usize) -> io::Result<Vec<String>> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    let skip = lines.len().saturating_sub(limit);
    Ok(lines[skip..].iter().map(|line| (*line).to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn keeps_only_the_tail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("playforge.log");
        std::fs::write(&path, "one\ntwo\n\nthree\nfour\n").unwrap();

        assert_eq!(
            recent_log_lines(&path, 2).await.unwrap(),
            vec!["three".to_string(), "four".to_string()]
        );
        assert_eq!(recent_log_lines(&path, 10).await.unwrap().len(), 4);
        assert!(recent_log_lines(&path, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_has_no_lines() {
        let dir = TempDir::new().unwrap();
        let lines = recent_log_lines(&dir.path().join("absent.log"), 20)
            .await
            .unwrap();
        assert!(lines.is_empty());
    }
}
