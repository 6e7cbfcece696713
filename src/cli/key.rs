//! API key subcommands.
//!
//! The key is imported into `$KINESIS_HOME/api.key`, which configuration
//! reads when neither `KINESIS_API_KEY` nor `provider.api_key` is set.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use crate::config::{self, API_KEY_FILE};

/// Key-related subcommands
#[derive(Subcommand, Debug)]
pub enum KeyCommands {
    /// Import an API key, given literally or as a path to a file holding it
    Import {
        /// Key text or key file
        source: String,
    },

    /// Show whether an API key is available
    Status,
}

/// Run a key subcommand against the configured home directory
pub async fn execute(command: KeyCommands) -> Result<()> {
    let cfg = config::config()?;

    match command {
        KeyCommands::Import { source } => {
            let path = import_key(&cfg.home, &source).await?;
            println!("API key saved to {}", path.display());
        }
        KeyCommands::Status => {
            let stored = stored_key(&cfg.home).await?;
            match cfg.api_key.as_deref().filter(|_| cfg.has_api_key()) {
                Some(key) => {
                    println!("API key: configured ({})", mask_key(key));
                    if stored.as_deref() == Some(key) {
                        println!("Source:  {}", cfg.home.join(API_KEY_FILE).display());
                    } else {
                        println!("Source:  environment or config file");
                    }
                }
                None => {
                    println!("API key: not configured");
                    println!("Import one with 'kinesis key import <key|file>'.");
                }
            }
        }
    }
    Ok(())
}

/// Write the key from `source` into `home`, returning the key file path.
///
/// `source` is read as a file when such a file exists, otherwise it is the
/// key itself.
pub async fn import_key(home: &Path, source: &str) -> Result<PathBuf> {
    let key = match tokio::fs::metadata(source).await {
        Ok(meta) if meta.is_file() => tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read key file: {}", source))?,
        _ => source.to_string(),
    };

    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("API key is empty");
    }

    tokio::fs::create_dir_all(home)
        .await
        .with_context(|| format!("Failed to create home directory: {}", home.display()))?;

    let path = home.join(API_KEY_FILE);
    tokio::fs::write(&path, key)
        .await
        .with_context(|| format!("Failed to write key file: {}", path.display()))?;

    info!(path = %path.display(), "Imported API key");
    Ok(path)
}

/// Key stored in `home`, if the key file exists and is non-empty
pub async fn stored_key(home: &Path) -> Result<Option<String>> {
    let path = home.join(API_KEY_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => {
            let key = text.trim();
            Ok((!key.is_empty()).then(|| key.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read key file: {}", path.display())),
    }
}

/// Last four characters of the key, the rest masked
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_import_literal_key() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");

        let path = import_key(&home, "  AIzaSecret123 \n").await.unwrap();
        assert_eq!(path, home.join("api.key"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "AIzaSecret123");
        assert_eq!(
            stored_key(&home).await.unwrap().as_deref(),
            Some("AIzaSecret123")
        );
    }

    #[tokio::test]
    async fn test_import_from_key_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("downloaded.key");
        std::fs::write(&source, "from-file-key\n").unwrap();

        let home = dir.path().join("home");
        import_key(&home, source.to_str().unwrap()).await.unwrap();
        assert_eq!(
            stored_key(&home).await.unwrap().as_deref(),
            Some("from-file-key")
        );
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(import_key(dir.path(), "   ").await.is_err());
        assert!(!dir.path().join("api.key").exists());
    }

    #[tokio::test]
    async fn test_missing_key_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(stored_key(dir.path()).await.unwrap(), None);
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("AIzaSecret123"), "****t123");
        assert_eq!(mask_key("ab"), "****ab");
    }
}
