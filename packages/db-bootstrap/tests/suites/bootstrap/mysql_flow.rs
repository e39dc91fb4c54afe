use bootstrap_test_support::FakeServer;
use db_bootstrap::{ensure_database_exists, CreationOutcome, ErrorKind};

use crate::common::{error_chain, settings, ENV_NAME};

const DSN: &str = "root:s3cret@tcp(db:3306)/app?charset=utf8mb4&parseTime=true";

#[tokio::test]
async fn creates_missing_database_over_admin_connection() {
    let server = FakeServer::new();

    let outcome = ensure_database_exists(ENV_NAME, DSN, &server, &settings())
        .await
        .expect("bootstrap ok");

    assert_eq!(outcome, CreationOutcome::Created);
    assert!(server.has_database("app"));
    assert_eq!(server.executed_statements(), vec!["CREATE DATABASE `app`"]);
    // The admin connection selects no database and keeps credentials/options.
    assert_eq!(server.connect_attempts(), vec![""]);
    assert_eq!(
        server.connection_urls(),
        vec!["mysql://root:s3cret@db:3306/?charset=utf8mb4"]
    );
    assert_eq!(server.open_sessions(), 0);
    assert_eq!(server.closed_sessions(), 1);
}

#[tokio::test]
async fn existing_database_issues_no_create() {
    let server = FakeServer::new().with_database("app");

    let outcome = ensure_database_exists(ENV_NAME, DSN, &server, &settings())
        .await
        .expect("bootstrap ok");

    assert_eq!(outcome, CreationOutcome::AlreadyExisted);
    assert!(server.executed_statements().is_empty());
    assert_eq!(server.existence_checks(), 1);
    assert_eq!(server.open_sessions(), 0);
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let server = FakeServer::new();

    let first = ensure_database_exists(ENV_NAME, DSN, &server, &settings())
        .await
        .expect("first bootstrap ok");
    let second = ensure_database_exists(ENV_NAME, DSN, &server, &settings())
        .await
        .expect("second bootstrap ok");

    assert_eq!(first, CreationOutcome::Created);
    assert_eq!(second, CreationOutcome::AlreadyExisted);
    assert_eq!(server.executed_statements().len(), 1);
    assert_eq!(server.created_count(), 1);
    assert_eq!(server.open_sessions(), 0);
}

#[tokio::test]
async fn database_name_is_trimmed() {
    let server = FakeServer::new();

    let outcome = ensure_database_exists(ENV_NAME, "root@tcp(db)/%20app%20", &server, &settings())
        .await
        .expect("bootstrap ok");

    assert_eq!(outcome, CreationOutcome::Created);
    assert_eq!(server.databases(), vec!["app"]);
}

#[tokio::test]
async fn parse_failure_is_fatal_and_never_connects() {
    let server = FakeServer::new();

    let err = ensure_database_exists(ENV_NAME, "root:pw@tcp(db:3306/app", &server, &settings())
        .await
        .expect_err("unterminated address must fail");

    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(err.env_name(), ENV_NAME);
    assert!(server.connect_attempts().is_empty());
}

#[tokio::test]
async fn refused_connection_is_fatal_and_redacts_password() {
    let server = FakeServer::new().refuse("");

    let err = ensure_database_exists(ENV_NAME, DSN, &server, &settings())
        .await
        .expect_err("refused admin connection must fail");

    assert_eq!(err.kind(), ErrorKind::Connect);
    let message = error_chain(&err);
    assert!(message.contains(ENV_NAME), "{message}");
    assert!(message.contains("root:***@tcp(db:3306)/"), "{message}");
    assert!(!message.contains("s3cret"), "{message}");
    assert_eq!(server.connect_attempts().len(), 1);
    assert_eq!(server.open_sessions(), 0);
}

#[tokio::test]
async fn failed_liveness_probe_is_fatal_and_closes_session() {
    let server = FakeServer::new().fail_ping("");

    let err = ensure_database_exists(ENV_NAME, DSN, &server, &settings())
        .await
        .expect_err("failed ping must fail");

    assert_eq!(err.kind(), ErrorKind::Connect);
    assert_eq!(server.existence_checks(), 0);
    assert_eq!(server.open_sessions(), 0);
    assert_eq!(server.closed_sessions(), 1);
}

#[tokio::test]
async fn stalled_liveness_probe_times_out() {
    let server = FakeServer::new().stall_ping("");

    let err = ensure_database_exists(ENV_NAME, DSN, &server, &settings())
        .await
        .expect_err("stalled ping must time out");

    assert_eq!(err.kind(), ErrorKind::Connect);
    assert!(error_chain(&err).contains("not ready within 200ms"));
    assert_eq!(server.open_sessions(), 0);
}

#[tokio::test]
async fn existence_query_failure_is_fatal_and_closes_session() {
    let server = FakeServer::new().fail_existence_checks("SELECT command denied");

    let err = ensure_database_exists(ENV_NAME, DSN, &server, &settings())
        .await
        .expect_err("failed existence check must fail");

    assert_eq!(err.kind(), ErrorKind::Query);
    assert!(error_chain(&err).contains("SELECT command denied"));
    assert!(server.executed_statements().is_empty());
    assert_eq!(server.open_sessions(), 0);
}

#[tokio::test]
async fn create_failure_without_concurrent_winner_is_fatal() {
    let server = FakeServer::new().deny_create("1044 (42000): Access denied for user 'root'");

    let err = ensure_database_exists(ENV_NAME, DSN, &server, &settings())
        .await
        .expect_err("denied create must fail");

    assert_eq!(err.kind(), ErrorKind::Create);
    assert_eq!(err.env_name(), ENV_NAME);
    let message = error_chain(&err);
    assert!(message.contains("Access denied"), "{message}");
    // One check before the CREATE, one recheck after it failed.
    assert_eq!(server.existence_checks(), 2);
    assert!(!server.has_database("app"));
    assert_eq!(server.open_sessions(), 0);
}

#[tokio::test]
async fn failed_recheck_after_denied_create_returns_the_create_error() {
    let server = FakeServer::new()
        .deny_create("1044 (42000): Access denied for user 'root'")
        .fail_existence_checks_after(1, "2013: Lost connection to MySQL server");

    let err = ensure_database_exists(ENV_NAME, DSN, &server, &settings())
        .await
        .expect_err("denied create must fail");

    assert_eq!(err.kind(), ErrorKind::Create);
    let message = error_chain(&err);
    assert!(message.contains("Access denied"), "{message}");
    assert!(!message.contains("Lost connection"), "{message}");
    assert_eq!(server.existence_checks(), 2);
    assert_eq!(server.open_sessions(), 0);
}

#[tokio::test]
async fn stalled_connect_times_out() {
    let server = FakeServer::new().stall_connect("");

    let err = ensure_database_exists(ENV_NAME, DSN, &server, &settings())
        .await
        .expect_err("stalled connect must time out");

    assert_eq!(err.kind(), ErrorKind::Connect);
    assert!(error_chain(&err).contains("not ready within 200ms"));
    assert_eq!(server.connect_attempts().len(), 1);
    assert_eq!(server.existence_checks(), 0);
    assert_eq!(server.open_sessions(), 0);
}
