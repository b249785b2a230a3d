//! Tests for db::factory module - repository creation and configuration.

mod support;

use std::io::Write;
use std::str::FromStr;

use survey_reports::db::factory::{RepositoryFactory, RepositoryType};
use survey_reports::db::RepositoryError;

#[test]
fn test_repository_type_from_str_postgres() {
    assert_eq!(
        RepositoryType::from_str("POSTGRES").unwrap(),
        RepositoryType::Postgres
    );
    assert_eq!(RepositoryType::from_str("pg").unwrap(), RepositoryType::Postgres);
}

#[test]
fn test_repository_type_from_str_invalid() {
    let result = RepositoryType::from_str("mysql");
    assert!(result.unwrap_err().contains("Unknown repository type"));
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("POSTGRES_URL", None),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
        },
    );
}

#[test]
fn test_repository_type_from_env_with_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", Some("postgres://localhost/surveys")),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres);
        },
    );
}

#[test]
fn test_repository_type_from_env_with_postgres_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("POSTGRES_URL", Some("postgres://localhost/surveys")),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres);
        },
    );
}

#[test]
fn test_explicit_type_wins_over_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", Some("postgres://localhost/surveys")),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
        },
    );
}

#[tokio::test]
async fn test_from_config_file_local() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[repository]\ntype = \"local\"").unwrap();

    let repo = RepositoryFactory::from_config_file(file.path()).await.unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn test_from_config_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let result = RepositoryFactory::from_config_file(dir.path().join("absent.toml")).await;
    assert!(matches!(
        result,
        Err(RepositoryError::ConfigurationError { .. })
    ));
}

#[tokio::test]
async fn test_from_config_file_unknown_type() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[repository]\ntype = \"mongo\"").unwrap();

    let result = RepositoryFactory::from_config_file(file.path()).await;
    assert!(matches!(
        result,
        Err(RepositoryError::ConfigurationError { .. })
    ));
}

#[cfg(feature = "postgres-repo")]
#[tokio::test]
async fn test_postgres_config_requires_url() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[repository]\ntype = \"postgres\"").unwrap();

    let result = RepositoryFactory::from_config_file(file.path()).await;
    assert!(matches!(
        result,
        Err(RepositoryError::ConfigurationError { .. })
    ));
}

#[cfg(not(feature = "postgres-repo"))]
#[tokio::test]
async fn test_postgres_without_feature_is_configuration_error() {
    let result = RepositoryFactory::create(RepositoryType::Postgres, None).await;
    assert!(matches!(
        result,
        Err(RepositoryError::ConfigurationError { .. })
    ));
}

#[test]
fn test_from_type_postgres_without_url_is_configuration_error() {
    support::with_scoped_env(&[("DATABASE_URL", None), ("POSTGRES_URL", None)], || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result = runtime.block_on(RepositoryFactory::from_type(RepositoryType::Postgres));
        assert!(matches!(
            result,
            Err(RepositoryError::ConfigurationError { .. })
        ));
    });
}

#[test]
fn test_server_config_type_drives_factory() {
    support::with_scoped_env(
        &[
            ("JWT_SECRET", Some("s3cret")),
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", Some("postgres://localhost/surveys")),
        ],
        || {
            let config = survey_reports::config::ServerConfig::from_env().unwrap();
            assert_eq!(config.repository_type, RepositoryType::Local);

            let runtime = tokio::runtime::Runtime::new().unwrap();
            let repo = runtime
                .block_on(RepositoryFactory::from_type(config.repository_type))
                .unwrap();
            assert!(runtime.block_on(repo.health_check()).unwrap());
        },
    );
}
