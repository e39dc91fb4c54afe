use bootstrap_test_support::FakeServer;
use db_bootstrap::{ensure_database_exists, CreationOutcome};

use crate::common::{settings, ENV_NAME};

#[tokio::test]
async fn postgres_name_with_double_quote_is_one_identifier() {
    let server = FakeServer::new();
    // a"; DROP DATABASE b; --
    let dsn = "postgres://owner:pw@db:5432/a%22%3B%20DROP%20DATABASE%20b%3B%20--";

    let outcome = ensure_database_exists(ENV_NAME, dsn, &server, &settings())
        .await
        .expect("hostile name should be created verbatim");

    assert_eq!(outcome, CreationOutcome::Created);
    assert_eq!(
        server.executed_statements(),
        vec!["CREATE DATABASE \"a\"\"; DROP DATABASE b; --\""]
    );
    assert_eq!(server.databases(), vec!["a\"; DROP DATABASE b; --"]);
}

#[tokio::test]
async fn mysql_name_with_backtick_is_one_identifier() {
    let server = FakeServer::new().with_database("b");
    // a`; DROP DATABASE b; --
    let dsn = "owner:pw@tcp(db:3306)/a%60%3B%20DROP%20DATABASE%20b%3B%20--";

    let outcome = ensure_database_exists(ENV_NAME, dsn, &server, &settings())
        .await
        .expect("hostile name should be created verbatim");

    assert_eq!(outcome, CreationOutcome::Created);
    assert_eq!(
        server.executed_statements(),
        vec!["CREATE DATABASE `a``; DROP DATABASE b; --`"]
    );
    assert!(server.has_database("a`; DROP DATABASE b; --"));
    assert!(server.has_database("b"));
}

#[tokio::test]
async fn existing_hostile_name_is_found_by_parameterized_lookup() {
    let name = "x\"y`z";
    let server = FakeServer::new().with_database(name);

    let outcome = ensure_database_exists(
        ENV_NAME,
        "postgres://owner:pw@db:5432/x%22y%60z",
        &server,
        &settings(),
    )
    .await
    .expect("bootstrap ok");

    assert_eq!(outcome, CreationOutcome::AlreadyExisted);
    assert!(server.executed_statements().is_empty());
}
