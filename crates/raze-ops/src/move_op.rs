//! Moving a single file.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

/// Move a file, creating the destination's parent folder.
///
/// Tries a rename first and falls back to copy plus remove when the rename
/// fails (typically across filesystems). The destination must not exist.
pub fn move_file(source: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    if dest.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("destination exists: {}", dest.display()),
        ));
    }

    // Fast path for same filesystem
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(e) => {
            if !source.is_file() {
                return Err(e);
            }
            debug!(src = %source.display(), error = %e, "rename failed, copying instead");
            copy_then_remove(source, dest)
        }
    }
}

/// Copy `source` to `dest`, then remove `source`.
///
/// If the source cannot be removed the copy is deleted again.
fn copy_then_remove(source: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(source, dest)?;
    if let Err(e) = fs::remove_file(source) {
        // Keep exactly one copy.
        if let Err(cleanup) = fs::remove_file(dest) {
            warn!(dst = %dest.display(), error = %cleanup, "failed to remove copy after aborted move");
        }
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_move_creates_parent() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        fs::write(&src, "hello").unwrap();
        let dst = temp.path().join("Documents/notes/a.txt");

        move_file(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "hello");
    }

    #[test]
    fn test_move_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        let dst = temp.path().join("b.txt");
        fs::write(&src, "new").unwrap();
        fs::write(&dst, "old").unwrap();

        let err = move_file(&src, &dst).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&dst).unwrap(), "old");
        assert!(src.exists());
    }

    #[test]
    fn test_copy_fallback_removes_source() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        let dst = temp.path().join("b.txt");
        fs::write(&src, "hello").unwrap();

        copy_then_remove(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_fallback_rolls_back_when_source_is_stuck() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        let src = locked.join("a.txt");
        fs::write(&src, "hello").unwrap();
        let dst = temp.path().join("b.txt");

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
        // Privileged users ignore directory permissions.
        let enforced = fs::write(locked.join("canary"), "").is_err();

        let result = if enforced {
            Some(copy_then_remove(&src, &dst))
        } else {
            None
        };
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if let Some(result) = result {
            assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
            assert!(!dst.exists());
            assert_eq!(fs::read_to_string(&src).unwrap(), "hello");
        }
    }

    #[test]
    fn test_missing_source_fails() {
        let temp = TempDir::new().unwrap();
        let err = move_file(&temp.path().join("nope"), &temp.path().join("x")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
