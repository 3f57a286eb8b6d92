use std::{env, io, path::PathBuf};

use anyhow::{Context, Result};

/// Returns (and creates if needed) the default application state directory.
pub fn create_application_default_path() -> Result<PathBuf> {
    let mut path = base_state_dir()?;
    path.push("keystats");

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

#[cfg(windows)]
fn base_state_dir() -> Result<PathBuf> {
    env::var("APPDATA")
        .map(PathBuf::from)
        .context("APPDATA should be present on Windows")
}

#[cfg(target_os = "macos")]
fn base_state_dir() -> Result<PathBuf> {
    let mut path = env::var("HOME").map(PathBuf::from).context("HOME is not set")?;
    path.push("Library/Application Support");
    Ok(path)
}

#[cfg(all(unix, not(target_os = "macos")))]
fn base_state_dir() -> Result<PathBuf> {
    env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|_| {
            env::var("HOME").map(|home| {
                let mut path = PathBuf::from(home);
                path.push(".local/state");
                path
            })
        })
        .context("Couldn't find neither XDG_STATE_HOME nor HOME")
}
