use panelkit_core::catalog::{StaticCatalog, TechnologyCatalog};
use panelkit_core::config::{load_config, ConfigError, PanelConfig};
use panelkit_core::TechnologyId;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().expect("tempdir");
    let config = load_config(&dir.path().join("absent.toml")).expect("load");
    assert_eq!(config, PanelConfig::default());
}

#[test]
fn file_values_override_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "catalog_path = \"/srv/panelkit/technologies.toml\"\n\n[news]\nmax_name_length = 40\n",
    )
    .expect("write config");

    let config = load_config(&path).expect("load");
    assert_eq!(config.news.max_name_length, 40);
    assert_eq!(config.news.max_body_length, 2048);
    assert_eq!(
        config.catalog_path,
        Some(PathBuf::from("/srv/panelkit/technologies.toml"))
    );
}

#[test]
fn zero_limit_in_file_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    fs::write(&path, "[news]\nmax_body_length = 0\n").expect("write config");

    let err = load_config(&path).expect_err("zero limit");
    assert!(matches!(
        err,
        ConfigError::ZeroLimit {
            field: "max_body_length"
        }
    ));
}

#[test]
fn catalog_loads_from_disk() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("technologies.toml");
    fs::write(
        &path,
        r#"
[[technology]]
id = "Drones"
name = "Drones"
tier = 2
discipline = "Industrial"
cost = 10000
"#,
    )
    .expect("write catalog");

    let catalog = StaticCatalog::load(&path).expect("load catalog");
    assert_eq!(catalog.len(), 1);
    let drones = catalog
        .technology(&TechnologyId::from("Drones"))
        .expect("drones present");
    assert_eq!(drones.tier, 2);

    let missing = StaticCatalog::load(&dir.path().join("nope.toml"));
    assert!(matches!(missing, Err(ConfigError::Io { .. })));
}
