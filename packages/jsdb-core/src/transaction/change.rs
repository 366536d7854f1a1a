use crate::schema::Row;

/// Where a staged row is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTarget {
    /// Insert at the end of the table
    Append,
    /// Overwrite the row at this index
    Overwrite(usize),
}

/// A serialized bean waiting to be applied.
#[derive(Debug, Clone)]
pub struct StagedWrite {
    /// Target table name
    pub table: String,
    /// Insert or in-place update
    pub target: RowTarget,
    /// Serialized row data
    pub row: Row,
}

impl StagedWrite {
    pub fn is_insert(&self) -> bool {
        self.target == RowTarget::Append
    }
}
