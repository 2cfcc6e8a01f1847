//! Runtime configuration: where data lives and the host's theme preference.

use std::env;
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::fields::Theme;

/// Environment variable naming the data directory.
pub const DIR_ENV: &str = "TASKLIST_DIR";
/// Environment variable forcing the initial theme.
pub const THEME_ENV: &str = "TASKLIST_THEME";

const DEFAULT_DIR_NAME: &str = ".tasklist";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    /// Used only when no theme has been stored yet.
    pub ambient_theme: Option<Theme>,
}

impl Config {
    /// Resolve configuration. `dir` is the explicit directory from the
    /// command line (or `TASKLIST_DIR`); otherwise `$HOME/.tasklist`.
    pub fn resolve(dir: Option<PathBuf>) -> Result<Config> {
        let data_dir = match dir {
            Some(dir) => dir,
            None => {
                let home = env::var_os("HOME").ok_or(Error::NoHome)?;
                PathBuf::from(home).join(DEFAULT_DIR_NAME)
            }
        };
        Ok(Config {
            data_dir,
            ambient_theme: ambient_theme(
                env::var(THEME_ENV).ok().as_deref(),
                env::var("COLORFGBG").ok().as_deref(),
            ),
        })
    }

    /// Create the data directory if it does not exist yet.
    pub fn ensure_data_dir(&self) -> Result<()> {
        if self.data_dir.exists() && !self.data_dir.is_dir() {
            return Err(Error::DataDir(self.data_dir.clone()));
        }
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

/// Host theme preference: an explicit override wins, then the terminal's
/// `COLORFGBG` ("fg;bg", background 0-6 or 8 is dark).
pub fn ambient_theme(explicit: Option<&str>, colorfgbg: Option<&str>) -> Option<Theme> {
    if let Some(theme) = explicit.and_then(Theme::parse) {
        return Some(theme);
    }
    let bg = colorfgbg?.rsplit(';').next()?.trim().parse::<u8>().ok()?;
    Some(match bg {
        0..=6 | 8 => Theme::Dark,
        _ => Theme::Light,
    })
}
