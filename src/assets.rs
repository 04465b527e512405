//! Files compiled into the binary.

use anyhow::{Context, Result, anyhow};
use rust_embed::RustEmbed;
use std::borrow::Cow;
use std::path::Path;

#[derive(RustEmbed)]
#[folder = "resources/"]
pub struct Resources;

const ENV_TEMPLATE: &str = "env.template";

pub fn env_template() -> Result<Cow<'static, [u8]>> {
    Resources::get(ENV_TEMPLATE)
        .map(|file| file.data)
        .ok_or_else(|| anyhow!("could not find embedded asset \"{ENV_TEMPLATE}\""))
}

#[derive(Debug, PartialEq, Eq)]
pub enum EnvFileOutcome {
    Created,
    AlreadyExists,
}

/// Write the `.env` template to `path` unless a file is already there.
pub fn write_env_template(path: &Path) -> Result<EnvFileOutcome> {
    if path.exists() {
        return Ok(EnvFileOutcome::AlreadyExists);
    }

    let template = env_template()?;
    std::fs::write(path, template.as_ref())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(EnvFileOutcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_template_lists_every_setting() {
        let template = env_template().unwrap();
        let text = String::from_utf8_lossy(&template);
        for key in [
            "host=",
            "port=",
            "username=",
            "password=",
            "database=",
            "ai_api_key=",
            "ai_base_url=",
            "ai_model=",
        ] {
            assert!(text.contains(key), "missing {key}");
        }
    }

    #[test]
    fn test_write_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");

        assert_eq!(write_env_template(&path).unwrap(), EnvFileOutcome::Created);
        assert_eq!(
            std::fs::read(&path).unwrap(),
            env_template().unwrap().as_ref()
        );
    }

    #[test]
    fn test_existing_file_is_left_alone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "host=keep-me\n").unwrap();

        assert_eq!(
            write_env_template(&path).unwrap(),
            EnvFileOutcome::AlreadyExists
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "host=keep-me\n");
    }
}
