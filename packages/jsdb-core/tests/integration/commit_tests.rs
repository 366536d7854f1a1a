//! Commit constraints, update semantics and atomicity.

use std::sync::Arc;

use jsdb_core::schema::{FieldDefinition, TableDefinition};
use jsdb_core::table::TableDescriptor;
use jsdb_core::types::{type_ids, TypeRegistry};
use jsdb_core::{Bean, BeanState, ConstraintKind, Connection, DbError, Value};
use serde_json::json;

use super::helpers::{create_test_db, open_test_db, read_bytes};

fn new_user(connection: &Connection, name: &str) -> Bean {
    let mut user = connection.create_row("users").unwrap();
    user.set("name", name).unwrap().set("email", "").unwrap();
    user
}

fn new_post(connection: &Connection, author_id: i64, title: &str) -> Bean {
    let mut post = connection.create_row("posts").unwrap();
    post.set("authorId", author_id)
        .unwrap()
        .set("title", title)
        .unwrap()
        .set("createdAt", chrono::Utc::now())
        .unwrap();
    post
}

#[tokio::test]
async fn test_commit_persists_and_marks_beans() {
    let (_dir, path) = create_test_db().await;
    let connection = Connection::load(&path).await.unwrap();

    let mut user = new_user(&connection, "ada");
    assert_eq!(user.state(), BeanState::New);
    connection.commit_one(&mut user).await.unwrap();
    assert_eq!(user.state(), BeanState::Persisted);

    let reloaded = Connection::load(&path).await.unwrap();
    assert_eq!(reloaded.document().unwrap(), connection.document().unwrap());
    assert_eq!(
        reloaded.document().unwrap().data["users"],
        vec![vec![json!(0), json!("ada"), json!("")]]
    );
}

#[tokio::test]
async fn test_duplicate_primary_key_rejected() {
    let (_dir, connection) = open_test_db().await;
    let mut user = new_user(&connection, "ada");
    connection.commit_one(&mut user).await.unwrap();

    let mut clash = connection.create_row("users").unwrap();
    clash
        .set_multiple([
            ("id", Value::from(0)),
            ("name", Value::from("eve")),
            ("email", Value::from("")),
        ])
        .unwrap();

    let err = connection.commit_one(&mut clash).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Constraint { kind: ConstraintKind::PrimaryKey, ref table, ref field, ref value }
            if table == "users" && field == "id" && *value == json!(0)
    ));
    assert!(clash.is_new());
    assert_eq!(connection.row_count("users").unwrap(), 1);
}

#[tokio::test]
async fn test_duplicate_within_batch_rejected() {
    let (_dir, connection) = open_test_db().await;
    let first = new_user(&connection, "ada");
    let mut second = first.clone();
    second.set("name", "ada again").unwrap();

    let mut batch = vec![first, second];
    let err = connection.commit(&mut batch).await.unwrap_err();
    assert!(err.is_constraint());
    assert_eq!(connection.row_count("users").unwrap(), 0);
    assert!(batch.iter().all(Bean::is_new));
}

#[tokio::test]
async fn test_dangling_foreign_key_rejected() {
    let (_dir, connection) = open_test_db().await;

    let mut post = new_post(&connection, 42, "orphan");
    let err = connection.commit_one(&mut post).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Constraint { kind: ConstraintKind::ForeignKey, ref table, ref field, ref value }
            if table == "users" && field == "id" && *value == json!(42)
    ));
    assert_eq!(
        err.to_string(),
        "Foreign key constraint error: value (42) does not exist in (users,id)"
    );
    assert_eq!(connection.row_count("posts").unwrap(), 0);
}

#[tokio::test]
async fn test_parent_and_child_in_one_batch() {
    let (_dir, connection) = open_test_db().await;
    let user = new_user(&connection, "ada");
    let post = new_post(&connection, 0, "first");

    let mut batch = vec![user, post];
    connection.commit(&mut batch).await.unwrap();
    assert_eq!(connection.row_count("users").unwrap(), 1);
    assert_eq!(connection.row_count("posts").unwrap(), 1);

    // Child before parent fails
    let post = new_post(&connection, 1, "early");
    let user = new_user(&connection, "bob");
    let mut batch = vec![post, user];
    assert!(connection.commit(&mut batch).await.is_err());
}

#[tokio::test]
async fn test_failed_batch_is_atomic() {
    let (_dir, path) = create_test_db().await;
    let connection = Connection::load(&path).await.unwrap();
    let mut seed = new_user(&connection, "ada");
    connection.commit_one(&mut seed).await.unwrap();

    let document_before = connection.document().unwrap();
    let file_before = read_bytes(&path);

    let good = new_user(&connection, "bob");
    let good_post = new_post(&connection, 0, "kept?");
    let bad_post = new_post(&connection, 99, "dangling");
    let mut batch = vec![good, good_post, bad_post];
    assert!(connection.commit(&mut batch).await.is_err());

    // Rows are restored; counters advanced by create_row are not
    let document_after = connection.document().unwrap();
    assert_eq!(document_after.data, document_before.data);
    assert_eq!(document_after.schema, document_before.schema);
    assert_eq!(read_bytes(&path), file_before);

    // Serialization failures roll back the same way
    let good = new_user(&connection, "cy");
    let mut unserializable = new_user(&connection, "dee");
    unserializable.set("name", Value::Null).unwrap();
    let mut batch = vec![good, unserializable];
    let err = connection.commit(&mut batch).await.unwrap_err();
    assert!(matches!(err, DbError::SerializationError { ref field, .. } if field == "name"));
    assert_eq!(connection.document().unwrap().data, document_before.data);
    assert_eq!(read_bytes(&path), file_before);

    // Connection stays usable
    let mut user = new_user(&connection, "eve");
    connection.commit_one(&mut user).await.unwrap();
    assert_eq!(connection.row_count("users").unwrap(), 2);
}

#[tokio::test]
async fn test_update_overwrites_in_place() {
    let (_dir, path) = create_test_db().await;
    let connection = Connection::load(&path).await.unwrap();
    let mut users: Vec<Bean> = ["ada", "bob"].iter().map(|n| new_user(&connection, n)).collect();
    connection.commit(&mut users).await.unwrap();

    let mut bob = connection
        .first("users", |u| u.get("name").unwrap().as_str() == Some("bob"))
        .unwrap()
        .unwrap();
    bob.set("email", "bob@example.com").unwrap();
    connection.commit_one(&mut bob).await.unwrap();

    // A committed bean updates on later commits too
    let ada = &mut users[0];
    ada.set("name", "ada lovelace").unwrap();
    connection.commit_one(ada).await.unwrap();

    let reloaded = Connection::load(&path).await.unwrap();
    assert_eq!(reloaded.row_count("users").unwrap(), 2);
    assert_eq!(
        reloaded.document().unwrap().data["users"],
        vec![
            vec![json!(0), json!("ada lovelace"), json!("")],
            vec![json!(1), json!("bob"), json!("bob@example.com")],
        ]
    );
}

#[tokio::test]
async fn test_update_bypasses_constraints() {
    let (_dir, connection) = open_test_db().await;
    let user = new_user(&connection, "ada");
    let post = new_post(&connection, 0, "hello");
    let mut batch = vec![user, post];
    connection.commit(&mut batch).await.unwrap();

    // Updates are not re-validated: a dangling author is accepted
    let mut post = connection.first("posts", |_| true).unwrap().unwrap();
    post.set("authorId", 404).unwrap();
    connection.commit_one(&mut post).await.unwrap();

    let stored = connection.first("posts", |_| true).unwrap().unwrap();
    assert_eq!(stored.get("authorId").unwrap().as_i64(), Some(404));

    let issues = connection.check_integrity().unwrap();
    assert_eq!(issues.len(), 1);
    assert!(issues[0].to_string().contains("authorId"));
}

#[tokio::test]
async fn test_persist_failure_restores_memory() {
    let (_dir, path) = create_test_db().await;
    let connection = Connection::load(&path).await.unwrap();
    let document_before = connection.document().unwrap();

    // A non-empty directory in place of the file makes the rename fail
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("blocker"), b"x").unwrap();

    let mut user = new_user(&connection, "ada");
    let err = connection.commit_one(&mut user).await.unwrap_err();
    assert!(err.is_io(), "{:?}", err);
    assert!(user.is_new());
    assert_eq!(connection.document().unwrap().data, document_before.data);
    assert!(!path.with_file_name("app.json.tmp").exists());
}

#[tokio::test]
async fn test_concurrent_commits_are_serialized() {
    let (_dir, path) = create_test_db().await;
    let connection = Arc::new(Connection::load(&path).await.unwrap());

    let mut handles = Vec::new();
    for i in 0..8 {
        let connection = connection.clone();
        handles.push(tokio::spawn(async move {
            let mut user = new_user(&connection, &format!("user{}", i));
            connection.commit_one(&mut user).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let reloaded = Connection::load(&path).await.unwrap();
    assert_eq!(reloaded.row_count("users").unwrap(), 8);
    assert!(reloaded.check_integrity().unwrap().is_empty());
    assert_eq!(reloaded.document().unwrap(), connection.document().unwrap());
}

#[tokio::test]
async fn test_empty_commit_is_noop() {
    let (_dir, path) = create_test_db().await;
    let connection = Connection::load(&path).await.unwrap();
    let before = read_bytes(&path);

    connection.commit(&mut []).await.unwrap();
    assert_eq!(read_bytes(&path), before);
}

#[tokio::test]
async fn test_bean_with_other_layout_rejected() {
    let (_dir, path) = create_test_db().await;
    let connection = Connection::load(&path).await.unwrap();
    let file_before = read_bytes(&path);

    let definition = TableDefinition {
        table_name: "users".to_string(),
        fields: vec![FieldDefinition {
            field_name: "id".to_string(),
            type_id: type_ids::INTEGER.to_string(),
            flags: "cru".to_string(),
            fk: None,
        }],
    };
    let narrow =
        TableDescriptor::from_definition(&definition, &TypeRegistry::with_builtin_types()).unwrap();
    let mut bean = Bean::create_row(Arc::new(narrow));
    bean.set("id", 7).unwrap();

    let err = connection.commit_one(&mut bean).await.unwrap_err();
    assert!(matches!(err, DbError::DescriptorMismatch { ref table } if table == "users"));
    assert_eq!(connection.row_count("users").unwrap(), 0);
    assert_eq!(read_bytes(&path), file_before);

    // Table stays queryable, also after reload
    assert!(connection.all("users", |_| true).unwrap().is_empty());
    let reloaded = Connection::load(&path).await.unwrap();
    assert!(reloaded.all("users", |_| true).unwrap().is_empty());
}

#[tokio::test]
async fn test_bean_from_other_connection_accepted() {
    let (_dir, path) = create_test_db().await;
    let connection = Connection::load(&path).await.unwrap();
    let other = Connection::load(&path).await.unwrap();

    let mut user = new_user(&other, "ada");
    connection.commit_one(&mut user).await.unwrap();
    assert_eq!(connection.row_count("users").unwrap(), 1);
}
