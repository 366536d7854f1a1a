//! Row creation, autoincrement and predicate queries.

use chrono::{TimeZone, Utc};
use jsdb_core::{Bean, Connection, DbError, Value};

use super::helpers::{create_test_db, open_test_db};

fn new_user(connection: &Connection, name: &str) -> Bean {
    let mut user = connection.create_row("users").unwrap();
    user.set("name", name)
        .unwrap()
        .set("email", format!("{}@example.com", name))
        .unwrap();
    user
}

#[tokio::test]
async fn test_create_row_assigns_autoincrement() {
    let (_dir, connection) = open_test_db().await;

    let first = connection.create_row("users").unwrap();
    let second = connection.create_row("users").unwrap();
    let post = connection.create_row("posts").unwrap();

    assert_eq!(first.get("id").unwrap(), &Value::Integer(0));
    assert_eq!(second.get("id").unwrap(), &Value::Integer(1));
    // Counters are per table field
    assert_eq!(post.get("id").unwrap(), &Value::Integer(0));
    assert!(first.get("name").unwrap().is_null());
    assert!(first.is_new());

    assert!(matches!(
        connection.create_row("comments"),
        Err(DbError::TableNotFound { ref table }) if table == "comments"
    ));
}

#[tokio::test]
async fn test_autoincrement_survives_reload() {
    let (_dir, path) = create_test_db().await;

    {
        let connection = Connection::load(&path).await.unwrap();
        let mut users: Vec<Bean> = ["ada", "bob", "cy"]
            .iter()
            .map(|name| new_user(&connection, name))
            .collect();
        connection.commit(&mut users).await.unwrap();
    }

    let connection = Connection::load(&path).await.unwrap();
    let document = connection.document().unwrap();
    assert_eq!(document.meta.autoincrement["users§id"], 3);

    let next = connection.create_row("users").unwrap();
    assert_eq!(next.get("id").unwrap().as_i64(), Some(3));
}

#[tokio::test]
async fn test_first_and_all_in_storage_order() {
    let (_dir, connection) = open_test_db().await;
    let mut users: Vec<Bean> = ["ada", "bob", "bea", "cy"]
        .iter()
        .map(|name| new_user(&connection, name))
        .collect();
    connection.commit(&mut users).await.unwrap();

    let b_names: Vec<String> = connection
        .all("users", |u| {
            u.get("name")
                .ok()
                .and_then(Value::as_str)
                .is_some_and(|n| n.starts_with('b'))
        })
        .unwrap()
        .iter()
        .map(|u| u.get("name").unwrap().as_str().unwrap().to_string())
        .collect();
    assert_eq!(b_names, vec!["bob", "bea"]);

    let first = connection
        .first("users", |u| u.get("id").unwrap().as_i64() > Some(0))
        .unwrap()
        .unwrap();
    assert_eq!(first.get("name").unwrap().as_str(), Some("bob"));
    assert!(!first.is_new());

    assert!(connection
        .first("users", |u| u.get("name").unwrap().as_str() == Some("zed"))
        .unwrap()
        .is_none());
    assert_eq!(connection.all("users", |_| true).unwrap().len(), 4);
    assert_eq!(connection.row_count("users").unwrap(), 4);
    assert!(connection.all("comments", |_| true).is_err());
}

#[tokio::test]
async fn test_query_round_trips_dates() {
    let (_dir, connection) = open_test_db().await;
    let mut user = new_user(&connection, "ada");
    connection.commit_one(&mut user).await.unwrap();

    let created = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    let mut post = connection.create_row("posts").unwrap();
    post.set("authorId", user.get("id").unwrap().clone())
        .unwrap()
        .set("title", "hello")
        .unwrap()
        .set("createdAt", created)
        .unwrap();
    connection.commit_one(&mut post).await.unwrap();

    let stored = connection.first("posts", |_| true).unwrap().unwrap();
    assert_eq!(stored.get("createdAt").unwrap().as_date(), Some(created));
    assert_eq!(
        connection.document().unwrap().data["posts"][0][3],
        serde_json::json!(1_700_000_000_123i64)
    );
}
