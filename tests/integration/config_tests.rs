use figment::providers::Serialized;
use recdupe::cli::OutputFormat;
use recdupe::config::{ConfigError, JobConfig, JobsConfig};
use recdupe::detect::Strategy;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = figment::Figment::from(Serialized::defaults(JobsConfig::default()));
    let config: JobsConfig = figment.extract().unwrap();

    assert!(config.jobs.is_empty());
    assert_eq!(config.defaults.strategy, "highest");
    assert_eq!(config.defaults.output, OutputFormat::Text);
}

#[test]
fn test_config_load_from_env() {
    std::env::set_var("RECDUPE_DEFAULTS__STRATEGY", "lowest");
    std::env::set_var("RECDUPE_DEFAULTS__OUTPUT", "json");

    // Use figment directly to test loading from environment
    use figment::{providers::Env, Figment};
    let figment = Figment::from(Serialized::defaults(JobsConfig::default()))
        .merge(Env::prefixed("RECDUPE_").split("__"));

    let config: JobsConfig = figment.extract().unwrap();

    assert_eq!(config.defaults.strategy, "lowest");
    assert_eq!(config.defaults.output, OutputFormat::Json);

    // Clean up
    std::env::remove_var("RECDUPE_DEFAULTS__STRATEGY");
    std::env::remove_var("RECDUPE_DEFAULTS__OUTPUT");
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("jobs.toml");

    let toml_content = r#"
[defaults]
strategy = "lowest"

[[job]]
name = "accounts by email"
input = "accounts.csv"
match_fields = ["email"]
master_field = "score"
strategy = "highest"

[[job]]
input = "contacts.json"
match_fields = ["email", "zip"]
master_field = "updated_at"
output = "csv"
"#;
    fs::write(&config_path, toml_content).unwrap();

    // Use figment directly to test loading from this specific file
    use figment::{
        providers::{Format, Toml},
        Figment,
    };
    let figment = Figment::from(Serialized::defaults(JobsConfig::default()))
        .merge(Toml::file(&config_path));

    let config: JobsConfig = figment.extract().unwrap();

    assert_eq!(config.jobs.len(), 2);
    assert_eq!(config.jobs[0].display_name(), "accounts by email");
    assert_eq!(config.jobs[0].match_fields, vec!["email"]);
    // Explicit job strategy wins over [defaults].
    assert_eq!(
        config.jobs[0].strategy(&config.defaults).unwrap(),
        Strategy::Highest
    );
    // The second job falls back to the lowered default.
    assert_eq!(config.jobs[1].input, PathBuf::from("contacts.json"));
    assert_eq!(
        config.jobs[1].strategy(&config.defaults).unwrap(),
        Strategy::Lowest
    );
    assert_eq!(config.jobs[1].output(&config.defaults), OutputFormat::Csv);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_save_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("jobs.toml");

    let mut config = JobsConfig::default();
    config.jobs.push(JobConfig {
        name: Some("accounts".to_string()),
        input: PathBuf::from("accounts.csv"),
        match_fields: vec!["email".to_string()],
        master_field: "score".to_string(),
        strategy: Some("lowest".to_string()),
        output: None,
    });

    let content = toml::to_string_pretty(&config).unwrap();
    fs::write(&config_path, content).unwrap();

    let saved_content = fs::read_to_string(&config_path).unwrap();
    assert!(saved_content.contains("[[job]]"));
    assert!(saved_content.contains("name = \"accounts\""));
    assert!(saved_content.contains("input = \"accounts.csv\""));
    assert!(saved_content.contains("strategy = \"lowest\""));
}

#[test]
fn test_config_invalid_toml_errors() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("jobs.toml");

    fs::write(&config_path, "invalid = toml").unwrap();

    let err = JobsConfig::load(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Load { .. }));
}

#[test]
fn test_load_rejects_invalid_job_strategy() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("jobs.toml");

    let toml_content = r#"
[[job]]
name = "broken"
input = "a.csv"
match_fields = ["email"]
master_field = "score"
strategy = "hihgest"
"#;
    fs::write(&config_path, toml_content).unwrap();

    let err = JobsConfig::load(&config_path).unwrap_err();
    match err {
        ConfigError::InvalidJob { job, source } => {
            assert_eq!(job, "broken");
            // The misspelling is close enough for a suggestion.
            assert!(source.to_string().contains("highest"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_load_rejects_empty_job_list() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("jobs.toml");
    fs::write(&config_path, "# no jobs here\n").unwrap();

    let err = JobsConfig::load(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::NoJobs));
}

#[test]
fn test_load_reports_missing_file() {
    let err = JobsConfig::load(Path::new("/no/such/jobs.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Missing { .. }));
}
