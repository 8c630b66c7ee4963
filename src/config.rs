use anyhow::{Context, Result, anyhow};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use tracing::info;

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_MODEL_NAME: &str = "GEMINI_MODEL_NAME";
pub const ENV_API_BASE_URL: &str = "GEMINI_API_BASE_URL";

pub const DEFAULT_MODEL_NAME: &str = "gemini-2.0-flash";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const SHORT_INSTRUCTION: &str = "You are a CLI helping tool, give me very short (1-2 lines) answers to user questions, with an example command/code snippet if applicable.";
const DETAILED_INSTRUCTION: &str = "You are a CLI helping tool, give me short (3-5 lines) answer to user question, with an example command/code snippet if applicable.";
const MORE_DETAILED_INSTRUCTION: &str = "You are a CLI helping tool, give me somewhat detailed (7-10 lines) answer to user question, with an example command/code snippets";

/// How long an answer the model is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailLevel {
    Default,
    Detailed,
    MoreDetailed,
    /// No system instruction; the API's own defaults apply.
    FullDetails,
}

impl DetailLevel {
    /// Maps a `-d` occurrence count to a level. The CLI rejects counts above
    /// three before they get here; anything larger still means full details.
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Self::Default,
            1 => Self::Detailed,
            2 => Self::MoreDetailed,
            _ => Self::FullDetails,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Detailed => "detailed",
            Self::MoreDetailed => "more-detailed",
            Self::FullDetails => "full-details",
        }
    }

    pub fn system_instruction(&self) -> Option<&'static str> {
        match self {
            Self::Default => Some(SHORT_INSTRUCTION),
            Self::Detailed => Some(DETAILED_INSTRUCTION),
            Self::MoreDetailed => Some(MORE_DETAILED_INSTRUCTION),
            Self::FullDetails => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub api_key: String,
    pub model_name: String,
    pub system_instruction: Option<String>,
    pub api_base_url: String,
}

impl ApiConfig {
    /// Loads the env file at `path`. Non-empty process environment values
    /// take precedence over the file; the environment is never modified.
    pub fn from_env_file(path: &Path, level: DetailLevel) -> Result<Self> {
        Self::from_env_file_with(path, level, |key| env::var(key).ok())
    }

    fn from_env_file_with(
        path: &Path,
        level: DetailLevel,
        mut get_var: impl FnMut(&str) -> Option<String>,
    ) -> Result<Self> {
        let file_vars = read_env_file(path).with_context(|| {
            format!(
                "Error loading env file, please check the config path ({})",
                path.display()
            )
        })?;

        let mut lookup = |key: &str| {
            get_var(key)
                .filter(|value| !value.is_empty())
                .or_else(|| file_vars.get(key).cloned())
        };

        let api_key = require(lookup(ENV_API_KEY), ENV_API_KEY, path)?;
        let model_name = require(lookup(ENV_MODEL_NAME), ENV_MODEL_NAME, path)?;
        let api_base_url = lookup(ENV_API_BASE_URL)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        info!(
            path = %path.display(),
            model = %model_name,
            detail_level = level.as_str(),
            "loaded runtime configuration"
        );

        Ok(Self {
            api_key,
            model_name,
            system_instruction: level.system_instruction().map(str::to_string),
            api_base_url,
        })
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        vars.insert(key, value);
    }
    Ok(vars)
}

fn require(value: Option<String>, key: &str, path: &Path) -> Result<String> {
    value.filter(|value| !value.trim().is_empty()).ok_or_else(|| {
        anyhow!(
            "{} isn't set, please check your config file ({})",
            key,
            path.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;

    use super::{
        ApiConfig, DEFAULT_API_BASE_URL, DETAILED_INSTRUCTION, DetailLevel, ENV_API_KEY,
        ENV_MODEL_NAME, MORE_DETAILED_INSTRUCTION, SHORT_INSTRUCTION,
    };

    fn write_env(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("env");
        fs::write(&path, contents).expect("env file should be written");
        path
    }

    fn load_with_env(
        path: &std::path::Path,
        level: DetailLevel,
        pairs: &[(&str, &str)],
    ) -> anyhow::Result<ApiConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        ApiConfig::from_env_file_with(path, level, |key| vars.get(key).cloned())
    }

    #[test]
    fn loads_values_from_populated_file() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = write_env(
            &dir,
            "GEMINI_API_KEY=abc123\nGEMINI_MODEL_NAME=gemini-2.5-flash\n",
        );

        let cfg = load_with_env(&path, DetailLevel::Default, &[]).expect("config should load");

        assert_eq!(cfg.api_key, "abc123");
        assert_eq!(cfg.model_name, "gemini-2.5-flash");
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(cfg.system_instruction.as_deref(), Some(SHORT_INSTRUCTION));
    }

    #[test]
    fn accepts_quoted_values() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = write_env(
            &dir,
            "GEMINI_API_KEY=\"abc 123\"\nGEMINI_MODEL_NAME='gemini-2.0-flash'\n",
        );

        let cfg = load_with_env(&path, DetailLevel::Default, &[]).expect("config should load");

        assert_eq!(cfg.api_key, "abc 123");
        assert_eq!(cfg.model_name, "gemini-2.0-flash");
    }

    #[test]
    fn fails_naming_empty_api_key() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = write_env(&dir, "GEMINI_API_KEY=\nGEMINI_MODEL_NAME=gemini-2.0-flash\n");

        let err = load_with_env(&path, DetailLevel::Default, &[]).expect_err("load should fail");
        let msg = format!("{err:#}");

        assert!(msg.contains(ENV_API_KEY), "unexpected message: {msg}");
        assert!(
            msg.contains(&path.display().to_string()),
            "unexpected message: {msg}"
        );
    }

    #[test]
    fn fails_naming_missing_model_name() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = write_env(&dir, "GEMINI_API_KEY=abc123\n");

        let err = load_with_env(&path, DetailLevel::Default, &[]).expect_err("load should fail");
        let msg = format!("{err:#}");

        assert!(msg.contains(ENV_MODEL_NAME), "unexpected message: {msg}");
        assert!(!msg.contains(ENV_API_KEY), "unexpected message: {msg}");
    }

    #[test]
    fn fails_with_path_when_file_is_missing() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("missing");

        let err = load_with_env(&path, DetailLevel::Default, &[]).expect_err("load should fail");
        let msg = format!("{err:#}");

        assert!(
            msg.contains("Error loading env file"),
            "unexpected message: {msg}"
        );
        assert!(
            msg.contains(&path.display().to_string()),
            "unexpected message: {msg}"
        );
    }

    #[test]
    fn process_environment_overrides_file_values() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = write_env(&dir, "GEMINI_API_KEY=\nGEMINI_MODEL_NAME=gemini-2.0-flash\n");

        let cfg = load_with_env(
            &path,
            DetailLevel::Default,
            &[
                ("GEMINI_API_KEY", "from-env"),
                ("GEMINI_API_BASE_URL", " http://localhost:9999 "),
            ],
        )
        .expect("config should load");

        assert_eq!(cfg.api_key, "from-env");
        assert_eq!(cfg.model_name, "gemini-2.0-flash");
        assert_eq!(cfg.api_base_url, "http://localhost:9999");
    }

    #[test]
    fn empty_environment_value_falls_back_to_file() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = write_env(&dir, "GEMINI_API_KEY=abc\nGEMINI_MODEL_NAME=gemini-2.0-flash\n");

        let cfg = load_with_env(&path, DetailLevel::Default, &[("GEMINI_API_KEY", "")])
            .expect("config should load");

        assert_eq!(cfg.api_key, "abc");
    }

    #[test]
    fn detail_levels_select_fixed_instructions() {
        assert_eq!(
            DetailLevel::Default.system_instruction(),
            Some(SHORT_INSTRUCTION)
        );
        assert_eq!(
            DetailLevel::Detailed.system_instruction(),
            Some(DETAILED_INSTRUCTION)
        );
        assert_eq!(
            DetailLevel::MoreDetailed.system_instruction(),
            Some(MORE_DETAILED_INSTRUCTION)
        );
        assert_eq!(DetailLevel::FullDetails.system_instruction(), None);
    }

    #[test]
    fn full_details_loads_without_instruction() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = write_env(&dir, "GEMINI_API_KEY=k\nGEMINI_MODEL_NAME=m\n");

        let cfg =
            load_with_env(&path, DetailLevel::FullDetails, &[]).expect("config should load");

        assert_eq!(cfg.system_instruction, None);
    }

    #[test]
    fn from_count_saturates_at_full_details() {
        assert_eq!(DetailLevel::from_count(0), DetailLevel::Default);
        assert_eq!(DetailLevel::from_count(1), DetailLevel::Detailed);
        assert_eq!(DetailLevel::from_count(2), DetailLevel::MoreDetailed);
        assert_eq!(DetailLevel::from_count(3), DetailLevel::FullDetails);
        assert_eq!(DetailLevel::from_count(7), DetailLevel::FullDetails);
    }
}
