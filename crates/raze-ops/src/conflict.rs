//! Destination collision handling.

use std::path::{Path, PathBuf};

/// Generate an auto-renamed path to avoid conflicts.
///
/// For "file.txt", tries "file (1).txt", "file (2).txt", etc.
pub fn auto_rename_path(path: &Path) -> PathBuf {
    auto_rename_with(path, &|p: &Path| p.exists())
}

/// [`auto_rename_path`] where `taken` decides which names are in use.
pub fn auto_rename_with(path: &Path, taken: &dyn Fn(&Path) -> bool) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    let name_for = |suffix: &str| match &extension {
        Some(ext) => format!("{stem} {suffix}.{ext}"),
        None => format!("{stem} {suffix}"),
    };

    for i in 1..10_000 {
        let new_path = parent.join(name_for(&format!("({i})")));
        if !taken(&new_path) {
            return new_path;
        }
    }

    // Fallback: use timestamp
    let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S%f").to_string();
    parent.join(name_for(&format!("({timestamp})")))
}

/// `path` itself when free, otherwise its first free auto-rename.
pub fn available_path(path: &Path) -> PathBuf {
    available_path_with(path, &|p: &Path| p.exists())
}

/// [`available_path`] where `taken` decides which names are in use.
pub fn available_path_with(path: &Path, taken: &dyn Fn(&Path) -> bool) -> PathBuf {
    if taken(path) {
        auto_rename_with(path, taken)
    } else {
        path.to_path_buf()
    }
}

/// Target for a file entering quarantine.
///
/// A clash on the plain name adds the short file id (`stem-<id8>.ext`);
/// a clash on that falls back to auto-rename.
pub fn quarantine_target(dir: &Path, file_name: &str, short_id: &str) -> PathBuf {
    quarantine_target_with(dir, file_name, short_id, &|p: &Path| p.exists())
}

/// [`quarantine_target`] where `taken` decides which names are in use.
pub fn quarantine_target_with(
    dir: &Path,
    file_name: &str,
    short_id: &str,
    taken: &dyn Fn(&Path) -> bool,
) -> PathBuf {
    let plain = dir.join(file_name);
    if !taken(&plain) {
        return plain;
    }

    let as_path = Path::new(file_name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tagged = match as_path.extension() {
        Some(ext) => format!("{stem}-{short_id}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{short_id}"),
    };
    available_path_with(&dir.join(tagged), taken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_auto_rename_path() {
        let path = PathBuf::from("/tmp/raze-missing-dir/test.txt");
        let renamed = auto_rename_path(&path);
        assert!(renamed.to_string_lossy().ends_with("test (1).txt"));
    }

    #[test]
    fn test_auto_rename_no_extension() {
        let path = PathBuf::from("/tmp/raze-missing-dir/testfile");
        let renamed = auto_rename_path(&path);
        assert!(renamed.to_string_lossy().ends_with("testfile (1)"));
    }

    #[test]
    fn test_auto_rename_skips_taken_names() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "").unwrap();
        fs::write(temp.path().join("a (1).txt"), "").unwrap();

        let next = available_path(&temp.path().join("a.txt"));
        assert_eq!(next, temp.path().join("a (2).txt"));
        assert_eq!(available_path(&temp.path().join("b.txt")), temp.path().join("b.txt"));
    }

    #[test]
    fn test_quarantine_target_uses_id_suffix() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        assert_eq!(quarantine_target(dir, "notes.txt", "abcd1234"), dir.join("notes.txt"));

        fs::write(dir.join("notes.txt"), "").unwrap();
        assert_eq!(
            quarantine_target(dir, "notes.txt", "abcd1234"),
            dir.join("notes-abcd1234.txt")
        );

        fs::write(dir.join("notes-abcd1234.txt"), "").unwrap();
        assert_eq!(
            quarantine_target(dir, "notes.txt", "abcd1234"),
            dir.join("notes-abcd1234 (1).txt")
        );

        fs::write(dir.join("README"), "").unwrap();
        assert_eq!(quarantine_target(dir, "README", "ff00ff00"), dir.join("README-ff00ff00"));
    }

    #[test]
    fn test_claimed_names_count_as_taken() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        let claimed = [dir.join("a.txt"), dir.join("a (1).txt")];
        let taken = |p: &Path| p.exists() || claimed.iter().any(|c| c == p);

        assert_eq!(available_path_with(&dir.join("a.txt"), &taken), dir.join("a (2).txt"));
        assert_eq!(
            quarantine_target_with(dir, "a.txt", "abcd1234", &taken),
            dir.join("a-abcd1234.txt")
        );
    }
}
