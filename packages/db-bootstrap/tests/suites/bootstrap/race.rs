use bootstrap_test_support::FakeServer;
use db_bootstrap::{ensure_database_exists, CreationOutcome};

use crate::common::settings;

async fn race_two_bootstraps(server: &FakeServer, dsn: &str) -> Vec<CreationOutcome> {
    let settings = settings();
    let (first, second) = tokio::join!(
        ensure_database_exists("SQL_DSN", dsn, server, &settings),
        ensure_database_exists("SQL_DSN", dsn, server, &settings),
    );
    let mut outcomes = vec![
        first.expect("first racer should succeed"),
        second.expect("second racer should succeed"),
    ];
    outcomes.sort_by_key(|outcome| format!("{outcome:?}"));
    outcomes
}

#[tokio::test]
async fn postgres_concurrent_creation_succeeds_for_both_callers() {
    // Both callers see the database as missing before either one creates it.
    let server = FakeServer::new().hold_existence_checks(2);

    let outcomes =
        race_two_bootstraps(&server, "postgres://owner:pw@db:5432/shared_app").await;

    assert_eq!(
        outcomes,
        vec![CreationOutcome::Created, CreationOutcome::CreatedByRaceWinner]
    );
    assert_eq!(server.created_count(), 1);
    assert_eq!(server.databases(), vec!["shared_app"]);
    // Both issued a CREATE; only one took effect and the loser rechecked.
    assert_eq!(server.executed_statements().len(), 2);
    assert_eq!(server.existence_checks(), 3);
    assert_eq!(server.open_sessions(), 0);
}

#[tokio::test]
async fn mysql_concurrent_creation_succeeds_for_both_callers() {
    let server = FakeServer::new().hold_existence_checks(2);

    let outcomes = race_two_bootstraps(&server, "owner:pw@tcp(db:3306)/shared_app").await;

    assert_eq!(
        outcomes,
        vec![CreationOutcome::Created, CreationOutcome::CreatedByRaceWinner]
    );
    assert_eq!(server.created_count(), 1);
    assert_eq!(server.open_sessions(), 0);
}

#[tokio::test]
async fn late_caller_sees_existing_database() {
    let server = FakeServer::new();
    let dsn = "postgres://owner:pw@db:5432/shared_app";

    let first = ensure_database_exists("SQL_DSN", dsn, &server, &settings())
        .await
        .expect("first bootstrap ok");
    let second = ensure_database_exists("LOG_SQL_DSN", dsn, &server, &settings())
        .await
        .expect("second bootstrap ok");

    assert_eq!(first, CreationOutcome::Created);
    assert_eq!(second, CreationOutcome::AlreadyExisted);
    assert_eq!(server.executed_statements().len(), 1);
}
