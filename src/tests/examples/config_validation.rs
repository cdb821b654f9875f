#[cfg(test)]
mod tests {

    use std::path::Path;
    use std::sync::Arc;

    use serial_test::serial;

    use crate::app;
    use crate::config::proc_loader::{expand_env_vars, file_to_config, parse_config};
    use crate::config::settings::LogFormat;
    use crate::config::sources::{SecretsConfig, TtlUnit};
    use crate::secrets::StaticSecretStore;
    use crate::utils::constants::{DEFAULT_EMAIL_PATTERN, DEFAULT_HTTP_TIMEOUT_MS};
    use crate::utils::logging::{resolve, LogLevel};

    const MINIMAL: &str = r#"
settings:
  dry_run: true
secrets:
  type: file
  path: secrets.yaml
providers:
  les:
    url: "https://les.example.com/api/auth/login-email"
    credentials_key: les-integration-user
    token_pointer: /token
  firebase:
    url: "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword"
    credentials_key: PEER_JOB_CREDENTIALS
    token_pointer: /idToken
  service_account:
    path: service.json
services:
  base_data:
    url: "https://basedata.example.com/api/"
  les:
    url: "https://les.example.com"
  firebase:
    project_id: demo-project
    bucket: demo-project.appspot.com
"#;

    #[tokio::test]
    #[serial]
    async fn validate_demo_config_is_valid() {
        std::env::remove_var("DRY_RUN");
        let path = Path::new("demos/avatar-sync.yaml");
        let cfg = file_to_config(path)
            .await
            .expect("demos/avatar-sync.yaml must exist in repo root for tests");

        assert!(cfg.settings.dry_run);
        assert_eq!(cfg.secrets, SecretsConfig::Env);
        assert_eq!(cfg.providers.les.ttl_unit, TtlUnit::Milliseconds);
        assert_eq!(cfg.providers.firebase.api_key.as_ref().unwrap().query_param, "key");
        assert_eq!(cfg.services.les.url, "https://les.leverx-group.com");

        // wiring needs no network and no secrets until the first token request
        let secrets = Arc::new(StaticSecretStore::default());
        let client = app::build_http_client(&cfg).unwrap();
        let built = app::build_with(&cfg, client, secrets).unwrap();
        assert!(built.settings.dry_run);
        assert_eq!(built.settings.les_fetch_delay_ms, 1500);
    }

    #[tokio::test]
    #[serial]
    async fn env_overrides_demo_defaults() {
        std::env::set_var("DRY_RUN", "false");
        std::env::set_var("LES_URL", "http://localhost:9000");
        let cfg = file_to_config(Path::new("demos/avatar-sync.yaml")).await.unwrap();
        std::env::remove_var("DRY_RUN");
        std::env::remove_var("LES_URL");

        assert!(!cfg.settings.dry_run);
        assert_eq!(cfg.services.les.url, "http://localhost:9000");
        assert_eq!(cfg.providers.les.url, "http://localhost:9000/api/auth/login-email");
    }

    #[tokio::test]
    async fn defaults_fill_in_missing_settings() {
        let cfg = parse_config(MINIMAL.to_owned()).await.unwrap();

        assert_eq!(cfg.settings.http_timeout_ms, Some(DEFAULT_HTTP_TIMEOUT_MS));
        assert_eq!(cfg.settings.email_pattern.as_deref(), Some(DEFAULT_EMAIL_PATTERN));
        assert_eq!(cfg.settings.avatar_filename_template, "{{email}}");
        assert_eq!(cfg.services.base_data.url, "https://basedata.example.com/api");
        assert_eq!(cfg.services.firebase.avatar_folder, "images/avatars");
        assert_eq!(cfg.providers.les.identifier_field, "email");
        assert_eq!(cfg.providers.service_account.scopes.len(), 2);

        let logging = resolve(&cfg, Some(LogLevel::DEBUG));
        assert_eq!(logging.level, "DEBUG");
        let logging = resolve(&cfg, None);
        assert_eq!(logging.level, "info");
        assert!(matches!(logging.format, LogFormat::Compact | LogFormat::Json));
    }

    #[tokio::test]
    async fn invalid_config_reports_all_errors() {
        let invalid = MINIMAL
            .replace("dry_run: true", "dry_run: true\n  les_fetch_delay_sec: -1\n  avatar_filename_template: avatar.jpg\n  email_pattern: '(['")
            .replace("token_pointer: /token", "token_pointer: token")
            .replace("https://basedata.example.com/api/", "ftp://basedata")
            .replace("project_id: demo-project", "project_id: ''");

        let err = parse_config(invalid).await.unwrap_err().to_string();

        assert!(err.starts_with("config is not valid"), "{}", err);
        for needle in [
            "les_fetch_delay_sec",
            "avatar_filename_template",
            "email_pattern",
            "providers.les.token_pointer",
            "base_data.url",
            "project_id",
        ] {
            assert!(err.contains(needle), "missing '{}' in: {}", needle, err);
        }
    }

    #[tokio::test]
    async fn unknown_secret_store_type_is_rejected() {
        let invalid = MINIMAL.replace("type: file", "type: vault");
        assert!(parse_config(invalid).await.is_err());
    }

    #[tokio::test]
    async fn oversized_fallback_ttl_is_rejected() {
        let invalid = MINIMAL.replace(
            "credentials_key: les-integration-user",
            "credentials_key: les-integration-user\n    fallback_ttl_seconds: 99999999999999999",
        );
        let err = parse_config(invalid).await.unwrap_err().to_string();
        assert!(err.contains("providers.les.fallback_ttl_seconds"), "{}", err);
    }

    #[tokio::test]
    async fn wiring_refuses_fallback_ttl_beyond_duration_range() {
        let mut cfg = parse_config(MINIMAL.to_owned()).await.unwrap();
        cfg.providers.les.fallback_ttl_seconds = Some(u64::MAX);

        let client = app::build_http_client(&cfg).unwrap();
        let err = app::build_with(&cfg, client, Arc::new(StaticSecretStore::default())).err().unwrap();
        assert!(err.to_string().contains("fallback_ttl_seconds"), "{}", err);
    }

    #[test]
    #[serial]
    fn expand_env_vars_uses_value_then_default() {
        std::env::set_var("AVATAR_SYNC_TEST_HOST", "example.org");
        std::env::remove_var("AVATAR_SYNC_TEST_MISSING");

        let expanded = expand_env_vars(
            "a: ${AVATAR_SYNC_TEST_HOST:localhost}\nb: ${AVATAR_SYNC_TEST_MISSING:fallback}\nc: ${AVATAR_SYNC_TEST_MISSING}",
        )
        .unwrap();
        std::env::remove_var("AVATAR_SYNC_TEST_HOST");

        assert_eq!(expanded, "a: example.org\nb: fallback\nc: ");
    }
}
