use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

#[cfg(unix)]
const DEFAULT_PERMISSIONS: u32 = 0o644;

#[cfg(not(unix))]
const DEFAULT_PERMISSIONS: u32 = 0;

/// Naming and durability options for staged files.
#[derive(Clone, Copy, Debug)]
pub struct StageOptions {
    permissions: u32,
    prefix:      &'static str,
    suffix:      &'static str,
    sync:        bool,
}

impl Default for StageOptions {
    fn default() -> Self { Self::new() }
}

impl StageOptions {
    pub fn new() -> Self {
        Self {
            permissions: DEFAULT_PERMISSIONS,
            prefix:      ".",
            suffix:      ".tmp",
            sync:        true,
        }
    }

    #[cfg(unix)]
    #[must_use]
    pub fn permissions(mut self, permissions: u32) -> Self {
        self.permissions = permissions;
        self
    }

    #[cfg(not(unix))]
    #[must_use]
    pub fn permissions(self, _permissions: u32) -> Self { self }

    #[must_use]
    pub fn prefix(mut self, prefix: &'static str) -> Self {
        self.prefix = prefix;
        self
    }

    #[must_use]
    pub fn suffix(mut self, suffix: &'static str) -> Self {
        self.suffix = suffix;
        self
    }

    /// Whether to fsync before commit. Default: true.
    #[must_use]
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Temporary name for a file that will be committed as `name`.
    pub fn staging_name(&self, name: &str) -> String { format!("{}{}{}", self.prefix, name, self.suffix) }

    /// Whether `file_name` is a temporary name produced by these options.
    pub fn is_staging_name(&self, file_name: &str) -> bool {
        file_name.starts_with(self.prefix)
            && file_name.ends_with(self.suffix)
            && file_name.len() > self.prefix.len() + self.suffix.len()
    }

    #[cfg(unix)]
    fn apply_permissions(&self, path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(path, std::fs::Permissions::from_mode(self.permissions)).map_err(
            |e| Error::Write {
                path:   path.to_path_buf(),
                source: e,
            },
        )
    }

    #[cfg(not(unix))]
    fn apply_permissions(&self, _path: &Path) -> Result<()> { Ok(()) }
}

/// An append-only file written under a temporary name.
pub struct StagedFile {
    writer:       Option<BufWriter<File>>,
    staging_path: PathBuf,
    final_path:   PathBuf,
    len:          u64,
    options:      StageOptions,
    committed:    bool,
}

impl StagedFile {
    /// Create `dir/{prefix}{name}{suffix}`, failing if it already exists.
    ///
    /// The final path `dir/name` is not touched until [`commit`](Self::commit).
    pub fn create(dir: impl AsRef<Path>, name: &str, options: StageOptions) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| Error::Write {
                path:   dir.to_path_buf(),
                source: e,
            })?;
        }

        let staging_path = dir.join(options.staging_name(name));
        let final_path = dir.join(name);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&staging_path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => Error::AlreadyExists(staging_path.clone()),
                _ => Error::Write {
                    path:   staging_path.clone(),
                    source: e,
                },
            })?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            staging_path,
            final_path,
            len: 0,
            options,
            committed: false,
        })
    }

    /// Bytes appended so far.
    pub fn len(&self) -> u64 { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }

    pub fn staging_path(&self) -> &Path { &self.staging_path }

    pub fn final_path(&self) -> &Path { &self.final_path }

    /// Append `bytes`, returning the offset they were written at.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        let offset = self.len;
        let writer = self.writer.as_mut().ok_or_else(|| Error::Write {
            path:   self.staging_path.clone(),
            source: std::io::Error::other("staged file already finished"),
        })?;
        writer.write_all(bytes).map_err(|e| Error::Write {
            path:   self.staging_path.clone(),
            source: e,
        })?;
        self.len += bytes.len() as u64;
        Ok(offset)
    }

    /// Flush buffered bytes (and fsync if configured) without committing.
    ///
    /// After this the staging file is complete on disk and can be read or
    /// uploaded; further appends fail.
    pub fn finish(&mut self) -> Result<()> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        let file = writer.into_inner().map_err(|e| Error::Write {
            path:   self.staging_path.clone(),
            source: e.into_error(),
        })?;
        if self.options.sync {
            file.sync_all().map_err(|e| Error::Write {
                path:   self.staging_path.clone(),
                source: e,
            })?;
        }
        self.options.apply_permissions(&self.staging_path)
    }

    /// Make the file visible under its final name with a single rename.
    ///
    /// Refuses to replace an existing file at the final path.
    pub fn commit(mut self) -> Result<PathBuf> {
        self.finish()?;
        if self.final_path.exists() {
            return Err(Error::AlreadyExists(self.final_path.clone()));
        }
        std::fs::rename(&self.staging_path, &self.final_path).map_err(|e| Error::Commit {
            from:   self.staging_path.clone(),
            to:     self.final_path.clone(),
            source: e,
        })?;
        self.committed = true;
        Ok(self.final_path.clone())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            self.writer.take();
            let _ = std::fs::remove_file(&self.staging_path);
        }
    }
}
