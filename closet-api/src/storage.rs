//! File-blob store for uploaded item images
//!
//! Layout: `<storage root>/<user_id>/items/<file name>`. Stored paths are kept
//! relative to the storage root with forward slashes, which doubles as the
//! URL suffix under `/images`.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const FALLBACK_NAME: &str = "upload";

#[derive(Debug, Clone)]
pub struct ItemStorage {
    root: PathBuf,
}

impl ItemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a stored path
    pub fn absolute_path(&self, stored_path: &str) -> PathBuf {
        self.root.join(stored_path)
    }

    /// Write an upload without overwriting anything
    ///
    /// When the name is taken, `_1`, `_2`, ... is inserted before the
    /// extension. Returns the stored path relative to the root.
    pub async fn save_item_file(
        &self,
        user_id: i64,
        original_filename: &str,
        bytes: &[u8],
    ) -> io::Result<String> {
        let relative_dir = format!("{}/items", user_id);
        let dir = self.root.join(&relative_dir);
        fs::create_dir_all(&dir).await?;

        let name = sanitize_filename(original_filename);
        let (stem, extension) = split_extension(&name);

        for attempt in 0u32.. {
            let candidate = match attempt {
                0 => name.clone(),
                n => format!("{}_{}{}", stem, n, extension),
            };

            // create_new makes the existence check and the create one step
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(dir.join(&candidate))
                .await
            {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    let stored_path = format!("{}/{}", relative_dir, candidate);
                    debug!("Stored {} bytes at {}", bytes.len(), stored_path);
                    return Ok(stored_path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(io::ErrorKind::Other, "no free file name"))
    }

    /// Remove a stored file; failures are logged, not returned
    pub async fn delete_file(&self, stored_path: &str) {
        let path = self.absolute_path(stored_path);
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Failed to delete {}: {}", path.display(), e);
            }
        }
    }

    /// Remove everything stored for a user; failures are logged
    pub async fn delete_user_files(&self, user_id: i64) {
        let path = self.root.join(user_id.to_string());
        if let Err(e) = fs::remove_dir_all(&path).await {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Failed to delete {}: {}", path.display(), e);
            }
        }
    }
}

/// Keep only the final path component of a client-supplied name
///
/// Characters that would break the `/images/<stored_path>` URL (`#`, `?`,
/// `%` and whitespace) become `_`.
pub fn sanitize_filename(raw: &str) -> String {
    let last = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    match last {
        "" | "." | ".." => FALLBACK_NAME.to_string(),
        name => name
            .chars()
            .map(|c| match c {
                '#' | '?' | '%' => '_',
                c if c.is_whitespace() => '_',
                c => c,
            })
            .collect(),
    }
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}
