//! Best-effort file shuffling around a profiled run.
//!
//! None of these abort the run: failures are logged and the caller carries
//! on, the way the staging tools always have.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::{trace, warn};

/// Copy `from` over `to`. Returns whether the copy succeeded.
pub fn copy_file(from: &Path, to: &Path) -> bool {
    match fs::copy(from, to) {
        Ok(bytes) => {
            trace!(from = %from.display(), to = %to.display(), bytes, "copied");
            true
        }
        Err(e) => {
            warn!(from = %from.display(), to = %to.display(), error = %e, "copy failed");
            false
        }
    }
}

/// Delete `path`; a missing file is not an error.
pub fn remove_quietly(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => trace!(path = %path.display(), "removed"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            trace!(path = %path.display(), "nothing to remove");
        }
        Err(e) => warn!(path = %path.display(), error = %e, "remove failed"),
    }
}

/// Move `from` to `to`, replacing `to`.
///
/// Falls back to copy + delete when a rename is not possible (e.g. across
/// filesystems).
pub fn move_file(from: &Path, to: &Path) {
    let Err(e) = fs::rename(from, to) else {
        trace!(from = %from.display(), to = %to.display(), "moved");
        return;
    };
    if e.kind() == io::ErrorKind::NotFound {
        warn!(from = %from.display(), to = %to.display(), "move failed: source missing");
        return;
    }
    trace!(from = %from.display(), to = %to.display(), error = %e, "rename failed, copying");
    if copy_file(from, to) {
        remove_quietly(from);
    }
}

/// Stream the contents of `path` into `out`.
pub fn print_file(path: &Path, out: &mut impl Write) {
    let result = fs::File::open(path).and_then(|mut file| {
        io::copy(&mut file, out)?;
        out.flush()
    });
    if let Err(e) = result {
        warn!(path = %path.display(), error = %e, "print failed");
    }
}
