use figment::Jail;
use lessonbook_core::{AppConfig, ConfigError};
use std::path::{Path, PathBuf};

fn load(file: Option<&Path>) -> Result<AppConfig, figment::Error> {
    AppConfig::load(file).map_err(|err| err.to_string().into())
}

#[test]
fn local_file_is_picked_up_without_explicit_path() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "lessonbook.toml",
            r#"
            db_path = "school.db"
            default_room = "Cab 4"

            [roster]
            teachers = ["Adina", "Assel"]
            students = ["Karima"]

            [roster.aliases]
            "адина" = "Adina"
            "#,
        )?;

        let config = load(None)?;
        assert_eq!(config.db_path, PathBuf::from("school.db"));
        assert_eq!(config.default_room, "Cab 4");
        assert_eq!(config.roster.teachers, vec!["Adina", "Assel"]);
        assert_eq!(
            config.roster.aliases.get("адина").map(String::as_str),
            Some("Adina")
        );
        assert_eq!(config.server.addr, "127.0.0.1:8000");
        Ok(())
    });
}

#[test]
fn environment_overrides_file_values() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
            [server]
            addr = "0.0.0.0:9000"

            [model]
            timeout_secs = 10
            "#,
        )?;
        jail.set_env("LESSONBOOK_SERVER__ADDR", "127.0.0.1:8100");
        jail.set_env("LESSONBOOK_MODEL__API_KEY", "test-key");

        let config = load(Some(Path::new("custom.toml")))?;
        assert_eq!(config.server.addr, "127.0.0.1:8100");
        assert_eq!(config.model.timeout_secs, 10);
        assert!(config.model.is_configured());
        assert_eq!(config.model.api_key.as_deref(), Some("test-key"));
        Ok(())
    });
}

#[test]
fn explicit_missing_file_is_an_error() {
    Jail::expect_with(|_jail| {
        let err = AppConfig::load(Some(Path::new("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile(path) if path == Path::new("absent.toml")));
        Ok(())
    });
}

#[test]
fn unusable_values_are_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file("lessonbook.toml", "default_room = \"  \"\n")?;
        let err = AppConfig::load(None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "default_room",
                ..
            }
        ));

        jail.create_file("lessonbook.toml", "[server]\nmax_body_bytes = \"lots\"\n")?;
        let err = AppConfig::load(None).unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
        Ok(())
    });
}
