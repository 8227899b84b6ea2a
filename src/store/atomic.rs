//! Atomic snapshot replacement so readers never see a partially written file.

use std::io;
use std::path::Path;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

/// Write `content` to a sibling temporary file, fsync it, then rename it over `path`.
///
/// The parent directory is created if it does not exist yet.
pub(super) async fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "snapshot path has no parent")
    })?;

    fs::create_dir_all(parent).await?;

    // Same directory as the target so the rename never crosses filesystems.
    let temp_path = parent.join(format!(".{}.tmp", Uuid::new_v4()));

    let written = async {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .await?;
        file.write_all(content).await?;
        file.sync_all().await?;
        Ok::<(), io::Error>(())
    }
    .await;

    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path).await;
        return Err(err);
    }

    if let Err(err) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(err);
    }

    Ok(())
}
