use tracing::{trace, warn};

/// Display metadata for one field of the records.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub id: String,
    pub label: String,
    pub is_visible: bool,
}

impl ColumnDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            is_visible: true,
        }
    }
}

/// Ordered set of column descriptors.
///
/// The order is the render order. Ids are unique; duplicates passed to
/// [`ColumnRegistry::new`] are dropped, keeping the first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnRegistry {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnRegistry {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        let mut unique: Vec<ColumnDescriptor> = Vec::with_capacity(columns.len());
        for column in columns {
            if unique.iter().any(|c| c.id == column.id) {
                warn!("Dropping duplicate column id \"{}\"", column.id);
                continue;
            }
            unique.push(column);
        }
        Self { columns: unique }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ColumnDescriptor> {
        self.columns.get(index)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter()
    }

    /// Visible columns in render order.
    pub fn visible(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.is_visible)
    }

    /// Flips the visibility of `id`. Unknown ids are ignored.
    pub fn toggle_visibility(&mut self, id: &str) {
        if let Some(column) = self.columns.iter_mut().find(|c| c.id == id) {
            column.is_visible = !column.is_visible;
            trace!("Column \"{}\" visible: {}", column.id, column.is_visible);
        } else {
            trace!("Ignoring visibility toggle for unknown column \"{id}\"");
        }
    }

    /// Moves the column at `from` to position `to`.
    ///
    /// Returns `false` and leaves the order untouched if either index is out of range.
    pub fn move_column(&mut self, from: usize, to: usize) -> bool {
        let len = self.columns.len();
        if from >= len || to >= len {
            warn!("Rejecting column move {from} -> {to} with {len} columns");
            return false;
        }
        let column = self.columns.remove(from);
        self.columns.insert(to, column);
        trace!("Moved column {from} -> {to}");
        true
    }
}
