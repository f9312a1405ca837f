//! Artifact discovery in a run's output directory

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Every non-directory entry under `output_dir`, as sorted `/`-separated
/// relative paths. Symlinked directories are listed, not followed. A missing
/// directory yields no artifacts.
pub async fn collect_artifacts(output_dir: &Path) -> Vec<String> {
    let mut artifacts = Vec::new();
    let mut pending: Vec<PathBuf> = vec![output_dir.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => {
                log::warn!("Cannot list {}: {}", dir.display(), e);
                continue;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    log::warn!("Error while listing {}: {}", dir.display(), e);
                    break;
                }
            };

            let path = entry.path();
            match entry.file_type().await {
                Ok(file_type) if file_type.is_dir() => pending.push(path),
                Ok(_) => {
                    if let Some(relative) = relative_path(output_dir, &path) {
                        artifacts.push(relative);
                    }
                }
                Err(e) => log::warn!("Cannot stat {}: {}", path.display(), e),
            }
        }
    }

    artifacts.sort();
    artifacts
}

fn relative_path(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    Some(
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
    )
}
