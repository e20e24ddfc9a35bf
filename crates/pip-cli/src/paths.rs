//! Output path conventions for encrypted files

use std::io;
use std::path::{Path, PathBuf};

/// Append `.{ext}` unless `path` already ends with it (case-insensitive).
pub fn ensure_extension(path: &Path, ext: &str) -> PathBuf {
    if has_extension(path, ext) {
        return path.to_path_buf();
    }
    encrypted_output_path(path, ext)
}

/// Default destination when encrypting `input`: always `{input}.{ext}`.
///
/// An input that already carries the extension gets it twice, so the
/// destination never names the source.
pub fn encrypted_output_path(input: &Path, ext: &str) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Whether `output` resolves to the same file as `input`.
///
/// An output that does not exist yet cannot be the input.
pub fn same_file(input: &Path, output: &Path) -> io::Result<bool> {
    if !output.exists() {
        return Ok(false);
    }
    Ok(input.canonicalize()? == output.canonicalize()?)
}

/// Default destination when decrypting `input`: strip `.{ext}`, or append `.out`.
pub fn decrypted_output_path(input: &Path, ext: &str) -> PathBuf {
    if has_extension(input, ext) {
        input.with_extension("")
    } else {
        encrypted_output_path(input, "out")
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_missing_extension() {
        assert_eq!(
            ensure_extension(Path::new("backup.tar"), "pip"),
            PathBuf::from("backup.tar.pip")
        );
    }

    #[test]
    fn test_keeps_existing_extension_any_case() {
        assert_eq!(
            ensure_extension(Path::new("backup.pip"), "pip"),
            PathBuf::from("backup.pip")
        );
        assert_eq!(
            ensure_extension(Path::new("BACKUP.PIP"), "pip"),
            PathBuf::from("BACKUP.PIP")
        );
    }

    #[test]
    fn test_extension_must_be_whole_suffix() {
        assert_eq!(
            ensure_extension(Path::new("notes.zip"), "pip"),
            PathBuf::from("notes.zip.pip")
        );
    }

    #[test]
    fn test_decrypted_path_strips_extension() {
        assert_eq!(
            decrypted_output_path(Path::new("dir/photo.jpg.pip"), "pip"),
            PathBuf::from("dir/photo.jpg")
        );
    }

    #[test]
    fn test_encrypted_path_never_names_input() {
        assert_eq!(
            encrypted_output_path(Path::new("backup.tar"), "pip"),
            PathBuf::from("backup.tar.pip")
        );
        assert_eq!(
            encrypted_output_path(Path::new("backup.pip"), "pip"),
            PathBuf::from("backup.pip.pip")
        );
    }

    #[test]
    fn test_same_file_detection() {
        let tmp = tempfile::TempDir::new().unwrap();
        let input = tmp.path().join("data.bin");
        std::fs::write(&input, b"x").unwrap();

        assert!(same_file(&input, &input).unwrap());
        assert!(same_file(&input, &tmp.path().join(".").join("data.bin")).unwrap());
        assert!(!same_file(&input, &tmp.path().join("other.bin")).unwrap());

        let other = tmp.path().join("copy.bin");
        std::fs::write(&other, b"x").unwrap();
        assert!(!same_file(&input, &other).unwrap());
    }

    #[test]
    fn test_decrypted_path_without_extension() {
        assert_eq!(
            decrypted_output_path(Path::new("blob.bin"), "pip"),
            PathBuf::from("blob.bin.out")
        );
    }
}
