/// Tests for configuration resolution

#[cfg(test)]
mod tests {
    use crate::cli::{CliArgs, Command};
    use crate::config::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn args() -> CliArgs {
        CliArgs {
            config: None,
            backend_url: None,
            export_dir: None,
            no_color: false,
            console_width: None,
            command: Command::Status,
        }
    }

    #[test]
    fn test_defaults() {
        let config = merge_config(&args(), FileConfig::default(), None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.backend_url, "http://localhost:8080/api");
        assert_eq!(config.console_capacity, 500);
        assert_eq!(config.probe_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let file = FileConfig { backend_url: Some("http://file:1/api".into()), ..Default::default() };
        let env = Some("http://env:2/api".to_string());

        let config = merge_config(&args(), file.clone(), None).unwrap();
        assert_eq!(config.backend_url, "http://file:1/api");

        let config = merge_config(&args(), file.clone(), env.clone()).unwrap();
        assert_eq!(config.backend_url, "http://env:2/api");

        let mut cli = args();
        cli.backend_url = Some("https://cli:3/api/".into());
        let config = merge_config(&cli, file, env).unwrap();
        assert_eq!(config.backend_url, "https://cli:3/api");
    }

    #[test]
    fn test_parse_config_file() {
        let file = parse_config(
            r#"
backend_url = "http://10.0.0.5:8080/api"
probe_interval_secs = 10
console_capacity = 100
console_evict_batch = 10
export_dir = "/tmp/cherry"
colors = false
"#,
        )
        .unwrap();

        let config = merge_config(&args(), file, None).unwrap();
        assert_eq!(config.backend_url, "http://10.0.0.5:8080/api");
        assert_eq!(config.probe_interval, Duration::from_secs(10));
        assert_eq!(config.console_capacity, 100);
        assert_eq!(config.console_evict_batch, 10);
        assert_eq!(config.export_dir, PathBuf::from("/tmp/cherry"));
        assert!(!config.use_colors);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(parse_config("backend = \"http://x\"").is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_url = FileConfig { backend_url: Some("localhost:8080".into()), ..Default::default() };
        assert!(merge_config(&args(), bad_url, None).is_err());

        let zero = FileConfig { console_capacity: Some(0), ..Default::default() };
        assert!(merge_config(&args(), zero, None).is_err());

        let batch = FileConfig { console_capacity: Some(10), console_evict_batch: Some(20), ..Default::default() };
        assert!(merge_config(&args(), batch, None).is_err());

        let interval = FileConfig { probe_interval_secs: Some(0), ..Default::default() };
        assert!(merge_config(&args(), interval, None).is_err());
    }

    #[test]
    fn test_no_color_flag_wins() {
        let file = FileConfig { colors: Some(true), ..Default::default() };
        let mut cli = args();
        cli.no_color = true;
        assert!(!merge_config(&cli, file, None).unwrap().use_colors);
    }

    #[test]
    fn test_validate_backend_url() {
        assert_eq!(validate_backend_url(" http://h:1/api// ").unwrap(), "http://h:1/api");
        assert!(validate_backend_url("http://").is_err());
        assert!(validate_backend_url("ftp://h").is_err());
    }

    #[test]
    fn test_load_config_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "colors = false\n").unwrap();
        assert_eq!(load_config_file(&path).unwrap().colors, Some(false));

        let missing = dir.path().join("missing.toml");
        let err = load_config_file(&missing).unwrap_err();
        assert!(err.contains("missing.toml"));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let mut cli = args();
        cli.config = Some(PathBuf::from("/nonexistent/cherry/config.toml"));
        assert!(resolve_config(&cli).is_err());
    }
}
