//! In-memory model of the output archive.
//!
//! An [`Archive`] is an ordered map from entry path to [`EntrySource`]. Nothing
//! touches the filesystem until [`Archive::export`], which consumes the archive,
//! so an exported archive cannot be modified afterwards.
//!
//! Export is deterministic: `META-INF/MANIFEST.MF` comes first, then the rest
//! of `META-INF/`, then every other entry in path order. All entries carry the
//! same fixed timestamp and permissions, and the zip is written to a temporary
//! file next to the destination before being moved into place.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::consts::{JAR_MANIFEST_PATH, METADATA_DIR};

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("duplicate archive entry '{0}'")]
  Duplicate(String),

  #[error("entry '{file}' is also used as a directory by '{child}'")]
  PathConflict { file: String, child: String },

  #[error("invalid archive entry path '{0}'")]
  InvalidPath(String),

  #[error("failed to open archive {}: {source}", path.display())]
  Open {
    path: PathBuf,
    #[source]
    source: ZipError,
  },

  #[error("failed to read '{name}' from {}: {source}", archive.display())]
  Read {
    archive: PathBuf,
    name: String,
    #[source]
    source: ZipError,
  },

  #[error("I/O error on {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write archive {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: ZipError,
  },
}

/// Where the bytes of an entry come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
  Bytes(Vec<u8>),
  File(PathBuf),
  /// An entry forwarded from another zip archive.
  ArchiveEntry { archive: PathBuf, name: String },
}

#[derive(Debug, Clone, Default)]
pub struct Archive {
  entries: BTreeMap<String, EntrySource>,
}

impl Archive {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add an entry. Fails if the path is already taken.
  pub fn add(&mut self, path: impl Into<String>, source: EntrySource) -> Result<(), ArchiveError> {
    let path = path.into();
    validate_path(&path)?;
    if self.entries.contains_key(&path) {
      return Err(ArchiveError::Duplicate(path));
    }
    self.entries.insert(path, source);
    Ok(())
  }

  pub fn add_bytes(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Result<(), ArchiveError> {
    self.add(path, EntrySource::Bytes(bytes.into()))
  }

  /// Write a generated metadata document, replacing any previous content.
  ///
  /// Only paths under `META-INF/` may be overwritten this way.
  pub fn put_metadata(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Result<(), ArchiveError> {
    let path = path.into();
    validate_path(&path)?;
    if !path.starts_with(METADATA_DIR) {
      return Err(ArchiveError::InvalidPath(path));
    }
    self.entries.insert(path, EntrySource::Bytes(bytes.into()));
    Ok(())
  }

  /// Forward every leaf entry of the zip at `source` into this archive.
  ///
  /// Directory entries and anything under `META-INF/` are skipped. Returns the
  /// number of entries added.
  pub fn merge_archive(&mut self, source: &Path) -> Result<usize, ArchiveError> {
    let mut zip = open_zip(source)?;
    let mut merged = 0;

    for i in 0..zip.len() {
      let entry = zip.by_index(i).map_err(|e| ArchiveError::Read {
        archive: source.to_path_buf(),
        name: format!("#{}", i),
        source: e,
      })?;
      let name = entry.name().to_string();

      if entry.is_dir() || name.starts_with(METADATA_DIR) {
        continue;
      }
      if entry.enclosed_name().is_none() {
        return Err(ArchiveError::InvalidPath(name));
      }

      self.add(
        name.clone(),
        EntrySource::ArchiveEntry {
          archive: source.to_path_buf(),
          name,
        },
      )?;
      merged += 1;
    }

    debug!(archive = ?source, merged, "merged archive");
    Ok(merged)
  }

  /// Add every file beneath `dir` under `prefix/`. Returns the number of files added.
  pub fn add_directory(&mut self, dir: &Path, prefix: &str) -> Result<usize, ArchiveError> {
    let prefix = prefix.trim_matches('/');
    let mut added = 0;

    for entry in WalkDir::new(dir).sort_by_file_name() {
      let entry = entry.map_err(|e| ArchiveError::Io {
        path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
        source: e.into(),
      })?;
      if !entry.file_type().is_file() {
        continue;
      }

      let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
      let relative =
        relative_entry_name(relative).ok_or_else(|| ArchiveError::InvalidPath(relative.display().to_string()))?;
      let name = if prefix.is_empty() {
        relative
      } else {
        format!("{}/{}", prefix, relative)
      };

      self.add(name, EntrySource::File(entry.path().to_path_buf()))?;
      added += 1;
    }

    Ok(added)
  }

  pub fn contains(&self, path: &str) -> bool {
    self.entries.contains_key(path)
  }

  pub fn get(&self, path: &str) -> Option<&EntrySource> {
    self.entries.get(path)
  }

  /// Entry paths in export order.
  pub fn paths(&self) -> impl Iterator<Item = &str> {
    let mut paths: Vec<&str> = self.entries.keys().map(String::as_str).collect();
    paths.sort_by_key(|path| export_rank(path));
    paths.into_iter()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Check that no entry path is also the parent directory of another entry.
  pub fn validate(&self) -> Result<(), ArchiveError> {
    for path in self.entries.keys() {
      let dir = format!("{}/", path);
      if let Some((child, _)) = self.entries.range(dir.clone()..).next()
        && child.starts_with(&dir)
      {
        return Err(ArchiveError::PathConflict {
          file: path.clone(),
          child: child.clone(),
        });
      }
    }
    Ok(())
  }

  /// Validate and write the archive to `dest`, replacing any existing file.
  pub fn export(self, dest: &Path) -> Result<(), ArchiveError> {
    self.validate()?;

    let parent = match dest.parent() {
      Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
      _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|source| ArchiveError::Io {
      path: parent.clone(),
      source,
    })?;

    let mut temp = NamedTempFile::new_in(&parent).map_err(|source| ArchiveError::Io {
      path: parent.clone(),
      source,
    })?;

    let options = SimpleFileOptions::default()
      .compression_method(CompressionMethod::Deflated)
      .last_modified_time(DateTime::default())
      .unix_permissions(0o644);

    let write_err = |source: ZipError| ArchiveError::Write {
      path: dest.to_path_buf(),
      source,
    };

    {
      let mut writer = ZipWriter::new(temp.as_file_mut());
      let mut sources: HashMap<PathBuf, ZipArchive<BufReader<File>>> = HashMap::new();

      for name in self.paths() {
        let Some(source) = self.entries.get(name) else {
          continue;
        };
        writer.start_file(name, options).map_err(write_err)?;
        match source {
          EntrySource::Bytes(bytes) => {
            io::Write::write_all(&mut writer, bytes).map_err(|source| ArchiveError::Io {
              path: dest.to_path_buf(),
              source,
            })?;
          }
          EntrySource::File(path) => {
            let mut file = File::open(path).map_err(|source| ArchiveError::Io {
              path: path.clone(),
              source,
            })?;
            io::copy(&mut file, &mut writer).map_err(|source| ArchiveError::Io {
              path: path.clone(),
              source,
            })?;
          }
          EntrySource::ArchiveEntry { archive, name: inner } => {
            let zip = match sources.entry(archive.clone()) {
              Entry::Occupied(open) => open.into_mut(),
              Entry::Vacant(slot) => slot.insert(open_zip(archive)?),
            };
            let mut entry = zip.by_name(inner).map_err(|source| ArchiveError::Read {
              archive: archive.clone(),
              name: inner.clone(),
              source,
            })?;
            io::copy(&mut entry, &mut writer).map_err(|source| ArchiveError::Io {
              path: archive.clone(),
              source,
            })?;
          }
        }
      }

      writer.finish().map_err(write_err)?;
    }

    temp.persist(dest).map_err(|e| ArchiveError::Io {
      path: dest.to_path_buf(),
      source: e.error,
    })?;

    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      fs::set_permissions(dest, fs::Permissions::from_mode(0o644)).map_err(|source| ArchiveError::Io {
        path: dest.to_path_buf(),
        source,
      })?;
    }

    info!(path = ?dest, entries = self.entries.len(), "exported archive");
    Ok(())
  }
}

/// Jar readers expect the manifest to lead the archive.
fn export_rank(path: &str) -> u8 {
  if path == JAR_MANIFEST_PATH {
    0
  } else if path.starts_with(METADATA_DIR) {
    1
  } else {
    2
  }
}

fn validate_path(path: &str) -> Result<(), ArchiveError> {
  let invalid = path.is_empty()
    || path.starts_with('/')
    || path.ends_with('/')
    || path.contains('\\')
    || path.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..");
  if invalid {
    return Err(ArchiveError::InvalidPath(path.to_string()));
  }
  Ok(())
}

fn relative_entry_name(path: &Path) -> Option<String> {
  let mut parts = Vec::new();
  for component in path.components() {
    match component {
      Component::Normal(part) => parts.push(part.to_str()?.to_string()),
      _ => return None,
    }
  }
  Some(parts.join("/"))
}

fn open_zip(path: &Path) -> Result<ZipArchive<BufReader<File>>, ArchiveError> {
  let file = File::open(path).map_err(|source| ArchiveError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  ZipArchive::new(BufReader::new(file)).map_err(|source| ArchiveError::Open {
    path: path.to_path_buf(),
    source,
  })
}

/// Names of every entry in the zip at `path`, in stored order.
pub fn list_entries(path: &Path) -> Result<Vec<String>, ArchiveError> {
  let mut zip = open_zip(path)?;
  let mut names = Vec::with_capacity(zip.len());
  for i in 0..zip.len() {
    let entry = zip.by_index(i).map_err(|source| ArchiveError::Read {
      archive: path.to_path_buf(),
      name: format!("#{}", i),
      source,
    })?;
    names.push(entry.name().to_string());
  }
  Ok(names)
}

/// Read one entry. Returns `Ok(None)` if the zip has no such entry.
pub fn read_entry(path: &Path, name: &str) -> Result<Option<Vec<u8>>, ArchiveError> {
  let mut zip = open_zip(path)?;
  let mut entry = match zip.by_name(name) {
    Ok(entry) => entry,
    Err(ZipError::FileNotFound) => return Ok(None),
    Err(source) => {
      return Err(ArchiveError::Read {
        archive: path.to_path_buf(),
        name: name.to_string(),
        source,
      });
    }
  };

  let mut bytes = Vec::new();
  entry.read_to_end(&mut bytes).map_err(|source| ArchiveError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  Ok(Some(bytes))
}

/// Whether any entry name in the zip at `path` starts with `prefix`.
pub fn has_entry_with_prefix(path: &Path, prefix: &str) -> Result<bool, ArchiveError> {
  let zip = open_zip(path)?;
  Ok(zip.file_names().any(|name| name.starts_with(prefix)))
}
