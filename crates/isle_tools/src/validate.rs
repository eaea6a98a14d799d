//! Data validation utilities.

use std::path::Path;

use isle_core::catalog::StructureCatalog;
use isle_core::config::WorldConfig;
use isle_core::error::Result;

/// Kind of RON document to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DataKind {
    /// A [`StructureCatalog`].
    Catalog,
    /// A [`WorldConfig`].
    Config,
}

/// Load and validate a structure catalog file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, does not parse, or any
/// definition is invalid.
pub fn validate_catalog_file(path: &Path) -> Result<StructureCatalog> {
    let text = std::fs::read_to_string(path)?;
    let catalog = StructureCatalog::from_ron(&path.display().to_string(), &text)?;
    tracing::info!(path = %path.display(), structures = catalog.len(), "Catalog valid");
    Ok(catalog)
}

/// Load a world config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse.
pub fn validate_config_file(path: &Path) -> Result<WorldConfig> {
    let text = std::fs::read_to_string(path)?;
    let config = WorldConfig::from_ron(&path.display().to_string(), &text)?;
    let (width, height) = config.clamped_size();
    if (width, height) != (config.width, config.height) {
        tracing::warn!(
            requested_width = config.width,
            requested_height = config.height,
            width,
            height,
            "Config size will be clamped"
        );
    }
    Ok(config)
}

/// Validate a file, or every `.ron` file in a directory.
///
/// Returns the number of files checked.
///
/// # Errors
///
/// Returns the first failure.
pub fn validate_path(path: &Path, kind: DataKind) -> Result<usize> {
    let mut files = Vec::new();
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let file = entry?.path();
            if file.extension().is_some_and(|ext| ext == "ron") {
                files.push(file);
            }
        }
        files.sort();
    } else {
        files.push(path.to_path_buf());
    }

    for file in &files {
        match kind {
            DataKind::Catalog => {
                validate_catalog_file(file)?;
            }
            DataKind::Config => {
                validate_config_file(file)?;
            }
        }
    }
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use isle_core::error::IsleError;

    #[test]
    fn test_default_catalog_file_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("structures.ron");
        std::fs::write(&path, StructureCatalog::default().to_ron().unwrap()).unwrap();

        let catalog = validate_catalog_file(&path).unwrap();
        assert_eq!(catalog, StructureCatalog::default());
    }

    #[test]
    fn test_invalid_catalog_names_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ron");
        std::fs::write(
            &path,
            r#"StructureCatalog(structures: [
                StructureDef(kind: House, display_name: "House", allowed_terrain: []),
            ])"#,
        )
        .unwrap();

        let err = validate_catalog_file(&path).unwrap_err();
        assert!(matches!(err, IsleError::InvalidStructureDef { ref kind, .. } if kind == "house"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = validate_config_file(Path::new("/nonexistent/world.ron")).unwrap_err();
        assert!(matches!(err, IsleError::Io(_)));
    }

    #[test]
    fn test_shipped_assets_validate() {
        let assets = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets");
        assert_eq!(
            validate_path(&assets.join("data"), DataKind::Catalog).unwrap(),
            1
        );
        assert_eq!(
            validate_catalog_file(&assets.join("data/structures.ron")).unwrap(),
            StructureCatalog::default()
        );
        assert_eq!(
            validate_path(&assets.join("worlds"), DataKind::Config).unwrap(),
            2
        );
    }

    #[test]
    fn test_validate_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ron"), "(width: 30, height: 20)").unwrap();
        std::fs::write(dir.path().join("b.ron"), "(width: 48, height: 32)").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(validate_path(dir.path(), DataKind::Config).unwrap(), 2);
        assert!(validate_path(dir.path(), DataKind::Catalog).is_err());
    }
}
