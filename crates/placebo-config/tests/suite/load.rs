use std::path::PathBuf;

use placebo_config::{ConfigError, PlaceboConfig, CONFIG_FILE_NAME};
use placebo_ir::Type;
use placebo_synth::{Abstraction, AbstractionKind};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const CONFIG: &str = r#"
[logging]
level = "debug"
json = true

[synthesis]
abstraction = "per-unit"
threads = 3
shared_set_class = "stubs.Library"
guard_field = "flag"

[reflection]
facts_file = "refl.log"

[output]
dir = "out"
"#;

#[test]
fn loads_every_section_from_a_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, CONFIG).unwrap();

    let config = PlaceboConfig::load_from_path(&path).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
    assert!(config.logging.stderr);
    assert_eq!(config.synthesis.abstraction, AbstractionKind::PerUnit);
    assert_eq!(config.reflection.facts_file, Some(PathBuf::from("refl.log")));
    assert_eq!(config.output.dir, PathBuf::from("out"));

    let options = config.synthesis.options();
    assert_eq!(options.threads, Some(3));
    assert_eq!(options.guard_field.class.as_str(), "placebo.Library");
    assert_eq!(options.guard_field.name, "flag");

    let shared = config.synthesis.shared_set();
    assert_eq!(shared.name(), "shared");
    assert_eq!(shared.field().class.as_str(), "stubs.Library");
    assert_eq!(shared.field().ty, Type::object());
}

#[test]
fn missing_file_reports_its_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = PlaceboConfig::load_from_path(&path).unwrap_err();
    match err {
        ConfigError::Io { path: reported, .. } => assert_eq!(reported, path.display().to_string()),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn discovers_config_in_directory() {
    let dir = tempdir().unwrap();
    assert_eq!(
        PlaceboConfig::discover(None, dir.path()).unwrap(),
        PlaceboConfig::default()
    );

    std::fs::write(dir.path().join(CONFIG_FILE_NAME), CONFIG).unwrap();
    let config = PlaceboConfig::discover(None, dir.path()).unwrap();
    assert_eq!(config.output.dir, PathBuf::from("out"));
}
