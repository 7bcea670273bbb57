//! Table and field metadata consumed by repositories.

mod convert;
mod field;
mod table;

pub use convert::{FieldValue, FromFieldValue, IntoFieldValue};
pub use field::{DATE_TIME_FORMAT, Field, FieldOptions, FieldType};
pub use table::Table;
