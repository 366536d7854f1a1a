//! Schema export and load.

use std::sync::Arc;

use jsdb_core::types::{type_ids, TypeDef, TypeRegistry, Value};
use jsdb_core::{Connection, DbConfig, DbError, Document};
use serde_json::json;
use tempfile::tempdir;

use super::helpers::{create_test_db, users_and_posts};

#[tokio::test]
async fn test_export_then_load_has_empty_tables() {
    let (_dir, path) = create_test_db().await;
    let connection = Connection::load(&path).await.unwrap();

    assert_eq!(connection.table_names().unwrap(), vec!["users", "posts"]);
    for table in ["users", "posts"] {
        assert_eq!(connection.row_count(table).unwrap(), 0);
        assert_eq!(connection.table(table).unwrap().primary_key_name(), "id");
    }

    let posts = connection.table("posts").unwrap();
    let author = posts.field("authorId").unwrap();
    assert_eq!(author.type_id(), type_ids::INTEGER);
    assert_eq!(author.foreign_key.as_ref().unwrap().to_table, "users");

    let document = connection.document().unwrap();
    assert_eq!(document.schema, users_and_posts().tables());
    assert!(document.meta.autoincrement.is_empty());
}

#[tokio::test]
async fn test_missing_primary_key_writes_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");

    let mut builder = users_and_posts();
    builder
        .add_table("audit")
        .unwrap()
        .add_field("entry", type_ids::STRING, "r")
        .unwrap();

    let err = builder.export_to_file(&path).await.unwrap_err();
    assert!(matches!(err, DbError::MissingPrimaryKey { ref table } if table == "audit"));
    assert!(!path.exists());
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_pretty_export_loads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pretty.json");
    let config = DbConfig {
        pretty_json: true,
        ..Default::default()
    };

    users_and_posts()
        .with_config(config.clone())
        .export_to_file(&path)
        .await
        .unwrap();
    assert!(std::fs::read_to_string(&path).unwrap().contains("\n  "));

    let connection = Connection::load_with_config(&path, config).await.unwrap();
    assert_eq!(connection.path(), path.as_path());
}

#[tokio::test]
async fn test_load_errors() {
    let dir = tempdir().unwrap();

    let missing = dir.path().join("missing.json");
    let err = Connection::load(&missing).await.unwrap_err();
    assert!(err.is_io(), "{:?}", err);

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "{ not json").unwrap();
    assert!(matches!(
        Connection::load(&garbage).await,
        Err(DbError::ParseError(_))
    ));

    // Schema names a type the registry lacks
    let unknown = dir.path().join("unknown.json");
    let document = json!({
        "schema": [{
            "tableName": "files",
            "fields": [{ "fieldName": "path", "typeId": "Path", "flags": "cru" }]
        }],
        "meta": {},
        "data": { "files": [] }
    });
    std::fs::write(&unknown, document.to_string()).unwrap();
    assert!(Connection::load(&unknown).await.unwrap_err().is_schema());

    // Row data missing for a schema table
    let partial = dir.path().join("partial.json");
    let mut document: Document = users_and_posts().build().unwrap();
    document.data.remove("posts");
    std::fs::write(&partial, serde_json::to_vec(&document).unwrap()).unwrap();
    assert!(matches!(
        Connection::load(&partial).await,
        Err(DbError::DataCorruption(_))
    ));
}

/// Lower-case ASCII slug stored as a string.
#[derive(Debug)]
struct SlugType;

impl TypeDef for SlugType {
    fn type_id(&self) -> &str {
        "Slug"
    }

    fn can_serialize(&self, value: &Value) -> bool {
        value
            .as_str()
            .is_some_and(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase() || c == '-'))
    }

    fn serialize(&self, value: &Value) -> Option<serde_json::Value> {
        value.as_str().map(|s| json!(s))
    }

    fn can_deserialize(&self, stored: &serde_json::Value) -> bool {
        stored.is_string()
    }

    fn deserialize(&self, stored: &serde_json::Value) -> Option<Value> {
        stored.as_str().map(Value::from)
    }
}

#[tokio::test]
async fn test_custom_type_registry() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("slugs.json");

    let registry = Arc::new(TypeRegistry::with_builtin_types());
    registry.register(Arc::new(SlugType)).unwrap();

    let mut builder = jsdb_core::SchemaBuilder::with_type_registry(registry.clone());
    builder
        .add_table("pages")
        .unwrap()
        .add_primary_key("slug", "Slug", "")
        .unwrap();
    builder.export_to_file(&path).await.unwrap();

    // Stock registry cannot resolve the custom type
    assert!(Connection::load(&path).await.is_err());

    let connection = Connection::load_with(&path, DbConfig::default(), registry)
        .await
        .unwrap();
    let mut page = connection.create_row("pages").unwrap();
    page.set("slug", "Not A Slug").unwrap();
    assert!(matches!(
        connection.commit_one(&mut page).await,
        Err(DbError::SerializationError { ref expected, .. }) if expected == "Slug"
    ));

    page.set("slug", "hello-world").unwrap();
    connection.commit_one(&mut page).await.unwrap();
    assert_eq!(connection.row_count("pages").unwrap(), 1);
}
