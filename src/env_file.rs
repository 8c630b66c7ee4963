use anyhow::{Context, Result, anyhow};
use std::fs::{DirBuilder, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{DEFAULT_MODEL_NAME, ENV_API_KEY, ENV_MODEL_NAME};

pub const CONFIG_DIR: &str = ".config/helpp";
pub const ENV_FILE: &str = "env";
const CONFIG_DIR_MODE: u32 = 0o755;
const ENV_FILE_MODE: u32 = 0o600;

/// Resolves `~/.config/helpp/env`, writing a default file on first run.
pub fn init_user_env() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Unable to resolve the home directory"))?;
    init_user_env_in(&home)
}

pub fn init_user_env_in(home: &Path) -> Result<PathBuf> {
    let config_dir = home.join(CONFIG_DIR);
    let env_path = config_dir.join(ENV_FILE);

    if env_path.exists() {
        debug!(path = %env_path.display(), "using existing config file");
        return Ok(env_path);
    }

    create_config_dir(&config_dir)?;
    write_default_env(&env_path)?;
    Ok(env_path)
}

pub fn default_env_contents() -> String {
    // Keys in sorted order, one pair per line.
    let mut pairs = [(ENV_API_KEY, ""), (ENV_MODEL_NAME, DEFAULT_MODEL_NAME)];
    pairs.sort_by_key(|(key, _)| *key);
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect()
}

fn create_config_dir(dir: &Path) -> Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(CONFIG_DIR_MODE);
    }
    builder
        .create(dir)
        .with_context(|| format!("Failed to create config directory '{}'", dir.display()))
}

fn write_default_env(path: &Path) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(ENV_FILE_MODE);
    }

    let mut file = match options.open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            debug!(path = %path.display(), "config file appeared concurrently, keeping it");
            return Ok(());
        }
        Err(err) => {
            return Err(err).with_context(|| {
                format!("Failed to create config file '{}'", path.display())
            });
        }
    };

    file.write_all(default_env_contents().as_bytes())
        .with_context(|| format!("Failed to write config file '{}'", path.display()))?;
    info!(path = %path.display(), "created default config file");
    Ok(())
}
