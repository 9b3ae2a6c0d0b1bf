//! Generated source files: the public key table and per-level private key
//! sources.

pub mod private;
pub mod public;

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::crypto::Zeroizing;

/// Bytes buffered between writes to the output file.
const SINK_CAPACITY: usize = 8 * 1024;

/// Errors writing a generated file.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("unable to open {path} for writing: {source}")]
    Write {
        path: PathBuf,
        source: io::Error,
    },
}

/// Trait for source files this tool generates.
pub trait SourceArtifact {
    /// Write the complete file contents to `out`.
    fn write_source(&self, out: &mut dyn fmt::Write) -> fmt::Result;

    /// Render the complete file contents to a string.
    fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_source(&mut out);
        out
    }

    /// Whether the file holds secrets in the clear and must be readable by
    /// its owner only.
    fn owner_only(&self) -> bool {
        false
    }
}

/// Stream `artifact` into `path`, replacing whatever was there.
///
/// Files are always rewritten in full, never patched. Contents go straight
/// from [`SourceArtifact::write_source`] to the file through a fixed-size
/// buffer that is wiped afterwards. On Unix, an owner-only artifact gets
/// mode `0600` before anything is written, even if the file already existed.
pub fn write_artifact(path: &Path, artifact: &dyn SourceArtifact) -> Result<(), ArtifactError> {
    info!("Rewriting {}", path.display());
    let write_error = |source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    };

    let owner_only = artifact.owner_only();
    if owner_only {
        debug!(path = %path.display(), "restricting file to owner");
    }
    let file = open_for_rewrite(path, owner_only).map_err(write_error)?;
    let mut sink = FileSink::new(file);
    if artifact.write_source(&mut sink).is_err() {
        let source = sink
            .error
            .take()
            .unwrap_or_else(|| io::Error::other("failed to format generated source"));
        return Err(write_error(source));
    }
    sink.flush().map_err(write_error)
}

#[cfg(unix)]
fn open_for_rewrite(path: &Path, owner_only: bool) -> io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(false);
    if owner_only {
        options.mode(0o600);
    }
    let file = options.open(path)?;
    if owner_only {
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.set_len(0)?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_for_rewrite(path: &Path, _owner_only: bool) -> io::Result<File> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    file.set_len(0)?;
    Ok(file)
}

/// `fmt::Write` over a file. The buffer never grows past its initial
/// capacity and is zeroed on drop; the first I/O error is kept.
struct FileSink {
    file: File,
    buf: Zeroizing<Vec<u8>>,
    error: Option<io::Error>,
}

impl FileSink {
    fn new(file: File) -> Self {
        Self {
            file,
            buf: Zeroizing::new(Vec::with_capacity(SINK_CAPACITY)),
            error: None,
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.buf.len() + bytes.len() > SINK_CAPACITY {
            self.flush()?;
        }
        if bytes.len() > SINK_CAPACITY {
            self.file.write_all(bytes)
        } else {
            self.buf.extend_from_slice(bytes);
            Ok(())
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.write_all(&self.buf)?;
        self.buf.clear();
        Ok(())
    }
}

impl fmt::Write for FileSink {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes()).map_err(|err| {
            self.error = Some(err);
            fmt::Error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl SourceArtifact for Fixed {
        fn write_source(&self, out: &mut dyn fmt::Write) -> fmt::Result {
            out.write_str(self.0)
        }
    }

    struct Secret(&'static str);

    impl SourceArtifact for Secret {
        fn write_source(&self, out: &mut dyn fmt::Write) -> fmt::Result {
            out.write_str(self.0)
        }

        fn owner_only(&self) -> bool {
            true
        }
    }

    /// Many small writes adding up to more than one buffer's worth.
    struct Lines(usize);

    impl SourceArtifact for Lines {
        fn write_source(&self, out: &mut dyn fmt::Write) -> fmt::Result {
            for i in 0..self.0 {
                writeln!(out, "line {i}")?;
            }
            Ok(())
        }
    }

    #[test]
    fn write_artifact_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.cxx");
        std::fs::write(&path, "old contents that are longer").unwrap();

        write_artifact(&path, &Fixed("new")).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn write_artifact_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.cxx");

        let err = write_artifact(&path, &Fixed("x")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("unable to open"), "got: {msg}");
        assert!(msg.contains("out.cxx"), "got: {msg}");
    }

    #[test]
    fn write_artifact_streams_more_than_one_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.cxx");

        write_artifact(&path, &Lines(5000)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), Lines(5000).render());
    }

    #[test]
    fn oversized_single_write_is_kept_in_order() {
        let big: &'static str = Box::leak("y".repeat(SINK_CAPACITY * 2).into_boxed_str());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.cxx");

        write_artifact(&path, &Fixed(big)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), big);
    }

    #[cfg(unix)]
    #[test]
    fn owner_only_artifact_is_not_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("priv.cxx");
        std::fs::write(&path, "previous key").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_artifact(&path, &Secret("secret")).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "secret");

        let fresh = dir.path().join("fresh.cxx");
        write_artifact(&fresh, &Secret("secret")).unwrap();
        let mode = std::fs::metadata(&fresh).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
