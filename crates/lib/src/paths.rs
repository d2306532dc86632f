use std::path::PathBuf;

/// Overrides the repository that receives dependencies when bundling is off.
pub const LOCAL_REPO_ENV: &str = "SWARMPACK_LOCAL_REPO";

/// Returns the user's home directory, or the current directory when unset
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var_os("USERPROFILE")
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the user's home directory, or the current directory when unset
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var_os("HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the Maven-layout repository consulted at runtime when dependencies are not bundled
pub fn local_repository_dir() -> PathBuf {
  match std::env::var_os(LOCAL_REPO_ENV) {
    Some(dir) if !dir.is_empty() => PathBuf::from(dir),
    _ => home_dir().join(".m2").join("repository"),
  }
}
