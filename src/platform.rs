use std::io;
use std::path::Path;
use std::process::Command;

#[cfg(target_os = "windows")]
const FILE_BROWSER: &str = "explorer";
#[cfg(target_os = "macos")]
const FILE_BROWSER: &str = "open";
#[cfg(all(unix, not(target_os = "macos")))]
const FILE_BROWSER: &str = "xdg-open";

/// Shows `dir` in the desktop file browser. The output and music folders may not exist yet
/// on a fresh checkout, so the directory is created first.
pub fn open_folder(dir: &Path) -> io::Result<()> {
    if dir.as_os_str().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty folder path"));
    }
    std::fs::create_dir_all(dir)?;
    Command::new(FILE_BROWSER).arg(dir).spawn().map(|_| ())
}
