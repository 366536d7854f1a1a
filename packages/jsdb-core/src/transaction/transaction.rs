use std::collections::BTreeMap;

use crate::bean::Bean;
use crate::error::{ConstraintKind, DbError};
use crate::schema::{Document, Row};
use crate::table::{Descriptors, FieldDescriptor};

use super::change::{RowTarget, StagedWrite};
use super::constraints::column_contains;

/// Commit-scoped transaction over a document.
///
/// Holds a copy of the document's row data taken at [`Transaction::begin`]
/// and the writes staged since. Nothing touches the document until
/// [`Transaction::apply`]; [`Transaction::abort`] puts the copy back.
#[derive(Debug)]
pub struct Transaction {
    /// Row data before any change
    backup: BTreeMap<String, Vec<Row>>,
    /// Serialized beans in staging order
    writes: Vec<StagedWrite>,
}

impl Transaction {
    /// Starts a transaction, snapshotting every table's rows.
    pub fn begin(document: &Document) -> Self {
        Self {
            backup: document.data.clone(),
            writes: Vec::new(),
        }
    }

    /// Serializes a bean, resolves its target row and checks constraints.
    ///
    /// The bean must have been built from the layout in `descriptors`;
    /// otherwise `Err(DbError::DescriptorMismatch)`.
    ///
    /// New beans always insert. Persisted beans overwrite the row holding
    /// their primary key, or insert if no such row exists. Only inserts are
    /// checked: primary-key fields must not collide with stored or earlier
    /// staged rows, and foreign keys must point at an existing or earlier
    /// staged row.
    pub fn stage(
        &mut self,
        bean: &Bean,
        document: &Document,
        descriptors: &Descriptors,
    ) -> Result<(), DbError> {
        let descriptor = descriptors
            .get(bean.table_name())
            .ok_or_else(|| DbError::TableNotFound {
                table: bean.table_name().to_string(),
            })?;
        if !descriptor.same_layout(bean.descriptor()) {
            return Err(DbError::DescriptorMismatch {
                table: descriptor.name.clone(),
            });
        }
        let row = bean.export()?;

        let target = if bean.is_new() {
            RowTarget::Append
        } else {
            let pk_index = descriptor.primary_key().index;
            let key = &row[pk_index];
            document
                .rows(&descriptor.name)?
                .iter()
                .position(|stored| stored.get(pk_index) == Some(key))
                .map_or(RowTarget::Append, RowTarget::Overwrite)
        };

        if target == RowTarget::Append {
            for (field, value) in descriptor.fields().iter().zip(&row) {
                if field.is_primary_key() && self.column_contains(document, field, value)? {
                    return Err(DbError::Constraint {
                        kind: ConstraintKind::PrimaryKey,
                        table: field.table_name.clone(),
                        field: field.name.clone(),
                        value: value.clone(),
                    });
                }

                if let Some(fk) = &field.foreign_key {
                    let foreign = descriptors
                        .get(&fk.to_table)
                        .ok_or_else(|| DbError::TableNotFound {
                            table: fk.to_table.clone(),
                        })?
                        .field(&fk.to_field)?;
                    if !self.column_contains(document, foreign, value)? {
                        return Err(DbError::Constraint {
                            kind: ConstraintKind::ForeignKey,
                            table: foreign.table_name.clone(),
                            field: foreign.name.clone(),
                            value: value.clone(),
                        });
                    }
                }
            }
        }

        self.writes.push(StagedWrite {
            table: descriptor.name.clone(),
            target,
            row,
        });
        Ok(())
    }

    /// Checks a column across stored rows and rows staged for insert.
    fn column_contains(
        &self,
        document: &Document,
        field: &FieldDescriptor,
        value: &serde_json::Value,
    ) -> Result<bool, DbError> {
        let stored = document
            .rows(&field.table_name)?
            .iter()
            .filter_map(|row| row.get(field.index));
        let staged = self
            .writes
            .iter()
            .filter(|write| write.is_insert() && write.table == field.table_name)
            .filter_map(|write| write.row.get(field.index));
        column_contains(stored.chain(staged), value)
    }

    /// Writes every staged row into the document.
    pub fn apply(&self, document: &mut Document) -> Result<(), DbError> {
        for write in &self.writes {
            let rows = document
                .data
                .get_mut(&write.table)
                .ok_or_else(|| DbError::TableNotFound {
                    table: write.table.clone(),
                })?;
            match write.target {
                RowTarget::Append => rows.push(write.row.clone()),
                RowTarget::Overwrite(index) => {
                    let slot = rows.get_mut(index).ok_or_else(|| {
                        DbError::DataCorruption(format!(
                            "Row {} of table '{}' vanished during commit",
                            index, write.table
                        ))
                    })?;
                    *slot = write.row.clone();
                }
            }
        }
        Ok(())
    }

    /// Restores the row data captured at `begin`.
    pub fn abort(self, document: &mut Document) {
        document.data = self.backup;
        tracing::warn!("Aborted transaction; restored previous row data");
    }

    /// Writes staged so far.
    pub fn writes(&self) -> &[StagedWrite] {
        &self.writes
    }

    /// Returns the number of staged inserts.
    pub fn insert_count(&self) -> usize {
        self.writes.iter().filter(|w| w.is_insert()).count()
    }
}
