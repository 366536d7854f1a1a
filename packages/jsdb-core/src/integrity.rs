//! Whole-document integrity scan.

use std::fmt;

use crate::bean::Bean;
use crate::schema::Document;
use crate::table::Descriptors;
use crate::transaction::constraints::column_contains;

/// A problem found in stored row data.
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrityIssue {
    /// Row does not import through its table's types
    UnreadableRow {
        table: String,
        row: usize,
        reason: String,
    },
    /// Primary-key value repeated within its column
    DuplicateKey {
        table: String,
        field: String,
        row: usize,
        value: serde_json::Value,
    },
    /// Foreign-key value missing from the referenced column
    DanglingForeignKey {
        table: String,
        field: String,
        row: usize,
        value: serde_json::Value,
    },
    /// Key value that cannot be compared (float, null, array, object)
    IncomparableKey {
        table: String,
        field: String,
        row: usize,
        value: serde_json::Value,
    },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnreadableRow { table, row, reason } => {
                write!(f, "{}[{}]: unreadable row: {}", table, row, reason)
            }
            Self::DuplicateKey { table, field, row, value } => {
                write!(f, "{}[{}].{}: duplicate key {}", table, row, field, value)
            }
            Self::DanglingForeignKey { table, field, row, value } => {
                write!(f, "{}[{}].{}: no referenced row for {}", table, row, field, value)
            }
            Self::IncomparableKey { table, field, row, value } => {
                write!(f, "{}[{}].{}: key {} is not comparable", table, row, field, value)
            }
        }
    }
}

/// Scans every stored row of `document`.
///
/// Checks that rows import, primary-key fields hold distinct values, and
/// foreign keys resolve. Tables are visited in schema order.
pub fn check_document(document: &Document, descriptors: &Descriptors) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();

    for definition in &document.schema {
        let Some(descriptor) = descriptors.get(&definition.table_name) else {
            continue;
        };
        let rows = match document.rows(&descriptor.name) {
            Ok(rows) => rows,
            Err(e) => {
                issues.push(IntegrityIssue::UnreadableRow {
                    table: descriptor.name.clone(),
                    row: 0,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        for (row_index, row) in rows.iter().enumerate() {
            if let Err(e) = Bean::import(descriptor.clone(), row) {
                issues.push(IntegrityIssue::UnreadableRow {
                    table: descriptor.name.clone(),
                    row: row_index,
                    reason: e.to_string(),
                });
                continue;
            }

            for field in descriptor.fields() {
                let value = &row[field.index];

                if field.is_primary_key() {
                    let earlier = rows[..row_index].iter().filter_map(|r| r.get(field.index));
                    match column_contains(earlier, value) {
                        Ok(false) => {}
                        Ok(true) => issues.push(IntegrityIssue::DuplicateKey {
                            table: descriptor.name.clone(),
                            field: field.name.clone(),
                            row: row_index,
                            value: value.clone(),
                        }),
                        Err(_) => issues.push(IntegrityIssue::IncomparableKey {
                            table: descriptor.name.clone(),
                            field: field.name.clone(),
                            row: row_index,
                            value: value.clone(),
                        }),
                    }
                }

                let Some(fk) = &field.foreign_key else {
                    continue;
                };
                let target = descriptors
                    .get(&fk.to_table)
                    .and_then(|t| t.field(&fk.to_field).ok());
                let referenced = match (target, document.rows(&fk.to_table)) {
                    (Some(target), Ok(target_rows)) => column_contains(
                        target_rows.iter().filter_map(|r| r.get(target.index)),
                        value,
                    ),
                    _ => Ok(false),
                };
                match referenced {
                    Ok(true) => {}
                    Ok(false) => issues.push(IntegrityIssue::DanglingForeignKey {
                        table: descriptor.name.clone(),
                        field: field.name.clone(),
                        row: row_index,
                        value: value.clone(),
                    }),
                    Err(_) => issues.push(IntegrityIssue::IncomparableKey {
                        table: descriptor.name.clone(),
                        field: field.name.clone(),
                        row: row_index,
                        value: value.clone(),
                    }),
                }
            }
        }
    }

    issues
}
