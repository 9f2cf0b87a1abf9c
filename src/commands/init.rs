use crate::commands::Out;
use crate::Config;
use crate::Result;
use std::path::Path;

/// Creates the home directory, its backups subdirectory and an initial `config.json`.
///
/// # Arguments
/// - `receipts_home` - The directory that will be the home directory, e.g. `$HOME/receipts`
/// - `ledger` - Where the ledger CSV should live, if not `$RECEIPTS_HOME/expenses.csv`
/// - `model` - The model to request, if not the default
///
/// # Errors
/// - Returns a `Config` error if any file operations fail.
pub async fn init(
    receipts_home: &Path,
    ledger: Option<&Path>,
    model: Option<&str>,
) -> Result<Out<()>> {
    let config = Config::create(receipts_home, ledger, model).await?;
    Ok(format!(
        "Successfully created the receipts directory and config at {}, the ledger is {}",
        config.root().display(),
        config.ledger_path().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("receipts");
        let out = init(&home, None, Some("gpt-4o-mini")).await.unwrap();
        assert!(out.message().starts_with("Successfully created"));
        assert!(out.structure().is_none());

        let config = Config::load(&home).await.unwrap();
        assert_eq!(config.model(), "gpt-4o-mini");
        assert!(config.backups().is_dir());
    }
}
