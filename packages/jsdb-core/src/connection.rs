//! Loaded database: row creation, queries and transactional commits.

use std::path::Path;
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;

use crate::bean::Bean;
use crate::config::DbConfig;
use crate::error::DbError;
use crate::integrity::{check_document, IntegrityIssue};
use crate::persistence::JsonFile;
use crate::schema::Document;
use crate::table::{compile, Descriptors, TableDescriptor};
use crate::transaction::Transaction;
use crate::types::{type_ids, TypeRegistry};

/// An open database file.
///
/// The whole document lives in memory behind a lock. Queries read it
/// directly; commits stage beans, apply them and rewrite the file. Only one
/// commit runs at a time per connection.
#[derive(Debug)]
pub struct Connection {
    file: JsonFile,
    type_registry: Arc<TypeRegistry>,
    /// Compiled once at load, immutable afterwards
    descriptors: Descriptors,
    document: RwLock<Document>,
    commit_gate: Mutex<()>,
}

impl Connection {
    /// Loads a database file with the default configuration and stock types.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DbError> {
        Self::load_with_config(path, DbConfig::default()).await
    }

    /// Loads a database file with the given configuration and stock types.
    pub async fn load_with_config(path: impl AsRef<Path>, config: DbConfig) -> Result<Self, DbError> {
        Self::load_with(path, config, Arc::new(TypeRegistry::with_builtin_types())).await
    }

    /// Loads a database file, resolving field types against `type_registry`.
    ///
    /// # Arguments
    /// * `path` - Database file
    /// * `config` - Write behaviour for later commits
    /// * `type_registry` - Registry holding every type the schema names
    ///
    /// # Returns
    /// `Err(DbError::IoError)` if the file cannot be read,
    /// `Err(DbError::ParseError)` if it is not a valid document, or a schema
    /// error if its descriptors do not compile.
    pub async fn load_with(
        path: impl AsRef<Path>,
        config: DbConfig,
        type_registry: Arc<TypeRegistry>,
    ) -> Result<Self, DbError> {
        let file = JsonFile::new(path.as_ref(), config);
        let document: Document = file.read().await?;
        document.validate_data_tables()?;
        let descriptors = compile(&document.schema, &type_registry)?;

        tracing::debug!(
            "Loaded {} with {} tables",
            file.path().display(),
            descriptors.len()
        );

        Ok(Self {
            file,
            type_registry,
            descriptors,
            document: RwLock::new(document),
            commit_gate: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn type_registry(&self) -> &Arc<TypeRegistry> {
        &self.type_registry
    }

    /// Returns the compiled descriptor of a table.
    pub fn table(&self, table_name: &str) -> Result<Arc<TableDescriptor>, DbError> {
        self.descriptors
            .get(table_name)
            .cloned()
            .ok_or_else(|| DbError::TableNotFound {
                table: table_name.to_string(),
            })
    }

    /// Table names in schema order.
    pub fn table_names(&self) -> Result<Vec<String>, DbError> {
        let document = self.document.read().map_err(|_| DbError::LockPoisoned)?;
        Ok(document
            .schema
            .iter()
            .map(|t| t.table_name.clone())
            .collect())
    }

    /// Creates a new bean for `table_name`.
    ///
    /// Autoincrement Integer fields receive the next counter value; the
    /// counter advances even if the bean is never committed.
    pub fn create_row(&self, table_name: &str) -> Result<Bean, DbError> {
        let descriptor = self.table(table_name)?;
        let mut bean = Bean::create_row(descriptor.clone());

        let counted: Vec<_> = descriptor
            .fields()
            .iter()
            .filter(|f| f.is_autoincrement() && f.type_id() == type_ids::INTEGER)
            .collect();
        if !counted.is_empty() {
            let mut document = self.document.write().map_err(|_| DbError::LockPoisoned)?;
            for field in counted {
                let id = document.next_autoincrement(table_name, &field.name);
                bean.set(&field.name, id)?;
            }
        }

        Ok(bean)
    }

    /// Number of stored rows in a table.
    pub fn row_count(&self, table_name: &str) -> Result<usize, DbError> {
        let document = self.document.read().map_err(|_| DbError::LockPoisoned)?;
        Ok(document.rows(table_name)?.len())
    }

    /// Returns the first stored row matching `predicate`, in storage order.
    pub fn first<F>(&self, table_name: &str, mut predicate: F) -> Result<Option<Bean>, DbError>
    where
        F: FnMut(&Bean) -> bool,
    {
        let descriptor = self.table(table_name)?;
        let document = self.document.read().map_err(|_| DbError::LockPoisoned)?;
        for row in document.rows(table_name)? {
            let bean = Bean::import(descriptor.clone(), row)?;
            if predicate(&bean) {
                return Ok(Some(bean));
            }
        }
        Ok(None)
    }

    /// Returns every stored row matching `predicate`, in storage order.
    pub fn all<F>(&self, table_name: &str, mut predicate: F) -> Result<Vec<Bean>, DbError>
    where
        F: FnMut(&Bean) -> bool,
    {
        let descriptor = self.table(table_name)?;
        let document = self.document.read().map_err(|_| DbError::LockPoisoned)?;
        let mut matches = Vec::new();
        for row in document.rows(table_name)? {
            let bean = Bean::import(descriptor.clone(), row)?;
            if predicate(&bean) {
                matches.push(bean);
            }
        }
        Ok(matches)
    }

    /// Commits beans atomically and rewrites the database file.
    ///
    /// Inserts are checked for primary-key uniqueness and foreign-key
    /// integrity against stored rows and rows staged earlier in the batch.
    /// On any failure the row data is restored and the file is untouched.
    /// On success every bean is marked persisted.
    pub async fn commit(&self, beans: &mut [Bean]) -> Result<(), DbError> {
        if beans.is_empty() {
            return Ok(());
        }
        let _gate = self.commit_gate.lock().await;

        let (transaction, bytes) = self.prepare_commit(beans)?;

        if let Err(e) = self.file.write_bytes(&bytes).await {
            let mut document = self.document.write().map_err(|_| DbError::LockPoisoned)?;
            transaction.abort(&mut document);
            return Err(e);
        }

        for bean in beans.iter_mut() {
            bean.mark_persisted();
        }
        tracing::debug!(
            "Committed {} rows ({} inserts) to {}",
            transaction.writes().len(),
            transaction.insert_count(),
            self.file.path().display()
        );
        Ok(())
    }

    /// Commits a single bean.
    pub async fn commit_one(&self, bean: &mut Bean) -> Result<(), DbError> {
        self.commit(std::slice::from_mut(bean)).await
    }

    /// Stages and applies beans in memory, returning the encoded document.
    fn prepare_commit(&self, beans: &[Bean]) -> Result<(Transaction, Vec<u8>), DbError> {
        let mut document = self.document.write().map_err(|_| DbError::LockPoisoned)?;
        let mut transaction = Transaction::begin(&document);

        let staged = beans
            .iter()
            .try_for_each(|bean| transaction.stage(bean, &document, &self.descriptors));
        if let Err(e) = staged {
            transaction.abort(&mut document);
            return Err(e);
        }

        let applied = transaction
            .apply(&mut document)
            .and_then(|()| self.file.encode(&*document));
        match applied {
            Ok(bytes) => Ok((transaction, bytes)),
            Err(e) => {
                transaction.abort(&mut document);
                Err(e)
            }
        }
    }

    /// Returns a copy of the current document.
    pub fn document(&self) -> Result<Document, DbError> {
        let document = self.document.read().map_err(|_| DbError::LockPoisoned)?;
        Ok(document.clone())
    }

    /// Scans stored rows for unreadable values and broken keys.
    pub fn check_integrity(&self) -> Result<Vec<IntegrityIssue>, DbError> {
        let document = self.document.read().map_err(|_| DbError::LockPoisoned)?;
        Ok(check_document(&document, &self.descriptors))
    }
}
