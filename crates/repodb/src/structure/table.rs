use super::field::Field;
use indexmap::IndexMap;
use std::fmt;

/// Schema of one table: an ordered set of [`Field`]s for model `M`.
pub struct Table<M> {
    name: String,
    fields: IndexMap<String, Field<M>>,
    auto_increment: Option<String>,
}

impl<M> fmt::Debug for Table<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("auto_increment", &self.auto_increment)
            .finish()
    }
}

impl<M> Table<M> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            auto_increment: None,
        }
    }

    /// Chainable form of [`Table::add_field`].
    pub fn with_field(mut self, field: Field<M>) -> Self {
        self.add_field(field);
        self
    }

    /// Add a field. A field with the same name is replaced in place; an
    /// auto-increment field replaces any earlier one.
    pub fn add_field(&mut self, field: Field<M>) -> &mut Self {
        let name = field.name().to_string();
        if field.is_auto_increment() {
            self.auto_increment = Some(name.clone());
        } else if self.auto_increment.as_deref() == Some(name.as_str()) {
            self.auto_increment = None;
        }
        self.fields.insert(name, field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, name: &str) -> Option<&Field<M>> {
        self.fields.get(name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field<M>> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn id_fields(&self) -> Vec<&Field<M>> {
        self.fields().filter(|field| field.is_id()).collect()
    }

    pub fn auto_increment_field(&self) -> Option<&Field<M>> {
        self.auto_increment
            .as_deref()
            .and_then(|name| self.fields.get(name))
    }

    fn is_auto_increment(&self, field: &Field<M>) -> bool {
        self.auto_increment.as_deref() == Some(field.name())
    }

    /// Fields written by INSERT.
    pub fn addable_fields(&self) -> Vec<&Field<M>> {
        self.fields()
            .filter(|field| field.is_addable() && !self.is_auto_increment(field))
            .collect()
    }

    /// Fields written by UPDATE.
    pub fn editable_fields(&self) -> Vec<&Field<M>> {
        self.fields()
            .filter(|field| field.is_editable() && !self.is_auto_increment(field))
            .collect()
    }
}
