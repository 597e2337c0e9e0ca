use std::{env, io, path::PathBuf};

use anyhow::Result;

const APP_DIR_NAME: &str = "worklog";

/// Resolves the directory all records, state and logs live in, creating it on
/// first use. Honors $XDG_STATE_HOME with a $HOME/.local/state fallback.
pub fn create_application_default_path() -> Result<PathBuf> {
    let mut path = base_state_dir();
    path.push(APP_DIR_NAME);

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

fn base_state_dir() -> PathBuf {
    #[cfg(windows)]
    {
        PathBuf::from(env::var("APPDATA").expect("APPDATA should be present on Windows"))
    }
    #[cfg(not(windows))]
    {
        env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .or_else(|_| {
                env::var("HOME").map(|home| {
                    let mut path = PathBuf::from(home);
                    path.push(".local/state");
                    path
                })
            })
            .expect("Couldn't find neither XDG_STATE_HOME nor HOME")
    }
}
