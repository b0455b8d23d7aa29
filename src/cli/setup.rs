use crate::infra::config::{DEFAULT_DECKHAND_TOML_NAME, install_default_config};
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Writes the commented default `deckhand.toml` into `target_dir`. An
/// existing file is left alone.
pub fn install(target_dir: &Path) -> Result<()> {
    info!("📝 Preparing config in {:?}", target_dir);

    match install_default_config(target_dir)? {
        Some(path) => println!("✅ Wrote {}", path.display()),
        None => println!(
            "ℹ️  {} already exists in {}, left untouched",
            DEFAULT_DECKHAND_TOML_NAME,
            target_dir.display()
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_install_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested");

        install(&target).unwrap();
        let path = target.join(DEFAULT_DECKHAND_TOML_NAME);
        std::fs::write(&path, "# edited\n").unwrap();
        install(&target).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited\n");
    }
}
