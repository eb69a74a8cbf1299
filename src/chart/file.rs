use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RenderError;

const PLOT_FILE_EXTENSION: &str = "html";

/// Write `content` to `<dir>/<name>.html`, creating `dir` if needed.
///
/// Returns the written path and the number of characters written.
pub fn write_plot_file(dir: &Path, name: &str, content: &str) -> Result<(PathBuf, usize), RenderError> {
    fs::create_dir_all(dir).map_err(|source| RenderError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(format!("{}.{PLOT_FILE_EXTENSION}", sanitize_file_name(name)));
    fs::write(&path, content).map_err(|source| RenderError::Io {
        path: path.clone(),
        source,
    })?;

    let chars = content.chars().count();
    log::info!("wrote {chars} characters to {}", path.display());
    Ok((path, chars))
}

/// Keep names inside the plot directory: anything outside `[A-Za-z0-9_-]`
/// becomes `_`.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        crate::chart::DEFAULT_FILE_NAME.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_into_a_fresh_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("plot_files");
        let (path, chars) = write_plot_file(&dir, "co2", "<html>°C</html>").unwrap();
        assert_eq!(path, dir.join("co2.html"));
        assert_eq!(chars, 15);
        assert_eq!(fs::read_to_string(path).unwrap(), "<html>°C</html>");
    }

    #[test]
    fn names_cannot_escape_the_directory() {
        assert_eq!(sanitize_file_name("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_file_name("  "), crate::chart::DEFAULT_FILE_NAME);
        assert_eq!(sanitize_file_name("world-temp_2020"), "world-temp_2020");
    }

    #[test]
    fn unwritable_directory_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("taken");
        fs::write(&blocker, "file, not a directory").unwrap();
        assert!(matches!(
            write_plot_file(&blocker, "plot", "x"),
            Err(RenderError::Io { .. })
        ));
    }
}
