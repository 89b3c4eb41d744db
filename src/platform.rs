use std::io;
use std::path::Path;
use std::process::Command;

fn opener() -> &'static str {
    if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

/// Opens `path` in the desktop file manager without waiting for it.
pub fn reveal_folder<P: AsRef<Path>>(path: P) -> io::Result<()> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty path"));
    }
    Command::new(opener()).arg(path).spawn().map(|_| ())
}
