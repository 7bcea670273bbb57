use crate::structure::{FieldValue, IntoFieldValue};
use indexmap::IndexMap;

/// Value side of one filter entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// `column = :name`
    One(FieldValue),
    /// `column IN (:name1, :name2, ...)`; one JSON array for JSON fields.
    List(Vec<FieldValue>),
}

/// Equality filter keyed by field name, in insertion order.
///
/// ```ignore
/// let filter = Filter::new().eq("active", true).in_list("type", [1, 2]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    entries: IndexMap<String, FilterValue>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match one value.
    pub fn eq(mut self, field: impl Into<String>, value: impl IntoFieldValue) -> Self {
        self.entries
            .insert(field.into(), FilterValue::One(value.into_field_value()));
        self
    }

    /// Match any of the values.
    pub fn in_list<I>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoFieldValue,
    {
        let values = values.into_iter().map(IntoFieldValue::into_field_value).collect();
        self.entries.insert(field.into(), FilterValue::List(values));
        self
    }

    /// Insert an entry, replacing any entry for the same field.
    pub fn insert(&mut self, field: impl Into<String>, value: FilterValue) -> &mut Self {
        self.entries.insert(field.into(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FilterValue> {
        self.entries.get(field)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name.into(), FilterValue::One(value)))
                .collect(),
        }
    }
}
