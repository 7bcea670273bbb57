//! Column ↔ model property mapping.

use super::convert::{FieldValue, FromFieldValue, IntoFieldValue};
use crate::error::{OrmError, OrmResult};
use crate::value::{ParamType, Value};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone};
use indexmap::IndexMap;
use std::fmt;

/// Storage format for date-time fields.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Wire values that decode to `false` for bool fields.
const FALSE_VALUES: [&str; 4] = ["false", "null", "", "0"];

/// Value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    String,
    /// Stored as `YYYY-MM-DD HH:MM:SS` text.
    DateTime,
    /// Stored as Unix epoch seconds.
    DateTimeTimestamp,
    Json,
    /// JSON whose objects decode to insertion-ordered maps.
    JsonAssoc,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::String => "string",
            FieldType::DateTime => "date-time",
            FieldType::DateTimeTimestamp => "date-time-timestamp",
            FieldType::Json => "json",
            FieldType::JsonAssoc => "json-assoc",
        }
    }

    pub fn is_json(self) -> bool {
        matches!(self, FieldType::Json | FieldType::JsonAssoc)
    }
}

/// Field flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOptions {
    pub id: bool,
    pub auto_increment: bool,
    pub created_at: bool,
    pub updated_at: bool,
    pub settable: bool,
    pub addable: bool,
    pub editable: bool,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            id: false,
            auto_increment: false,
            created_at: false,
            updated_at: false,
            settable: true,
            addable: true,
            editable: true,
        }
    }
}

type Getter<M> = Box<dyn Fn(&M) -> FieldValue>;
type Setter<M> = Box<dyn Fn(&mut M, FieldValue) -> OrmResult<()>>;

/// One column of a [`Table`](super::Table), bound to a property of `M`.
///
/// ```ignore
/// let field = Field::<Product>::int("id")
///     .id()
///     .auto_increment()
///     .accessor(|p| p.id, |p, id| p.id = id);
/// ```
pub struct Field<M> {
    name: String,
    db_name: String,
    field_type: FieldType,
    options: FieldOptions,
    getter: Option<Getter<M>>,
    setter: Option<Setter<M>>,
}

impl<M> fmt::Debug for Field<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("db_name", &self.db_name)
            .field("field_type", &self.field_type)
            .field("options", &self.options)
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

impl<M: 'static> Field<M> {
    /// Create a field whose storage name equals its name.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            db_name: name.clone(),
            name,
            field_type,
            options: FieldOptions::default(),
            getter: None,
            setter: None,
        }
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Bool)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn date_time(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::DateTime)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::DateTimeTimestamp)
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Json)
    }

    pub fn json_assoc(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::JsonAssoc)
    }

    /// Set the storage column name. An empty name keeps the field name.
    pub fn with_db_name(mut self, db_name: impl Into<String>) -> Self {
        let db_name = db_name.into();
        if !db_name.is_empty() {
            self.db_name = db_name;
        }
        self
    }

    pub fn options(mut self, options: FieldOptions) -> Self {
        self.options = options;
        self
    }

    /// Mark as (part of) the identifier.
    pub fn id(mut self) -> Self {
        self.options.id = true;
        self
    }

    /// Mark as generated by the database on insert.
    pub fn auto_increment(mut self) -> Self {
        self.options.auto_increment = true;
        self
    }

    /// Stamp with the current time on insert.
    pub fn created_at(mut self) -> Self {
        self.options.created_at = true;
        self
    }

    /// Stamp with the current time on insert and update.
    pub fn updated_at(mut self) -> Self {
        self.options.updated_at = true;
        self
    }

    pub fn settable(mut self, settable: bool) -> Self {
        self.options.settable = settable;
        self
    }

    pub fn addable(mut self, addable: bool) -> Self {
        self.options.addable = addable;
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.options.editable = editable;
        self
    }

    /// Register a typed getter.
    pub fn getter<T, G>(mut self, get: G) -> Self
    where
        T: IntoFieldValue,
        G: Fn(&M) -> T + 'static,
    {
        self.getter = Some(Box::new(move |model| get(model).into_field_value()));
        self
    }

    /// Register a typed setter.
    pub fn setter<T, S>(mut self, set: S) -> Self
    where
        T: FromFieldValue,
        S: Fn(&mut M, T) + 'static,
    {
        self.setter = Some(Box::new(move |model, value| {
            set(model, T::from_field_value(value)?);
            Ok(())
        }));
        self
    }

    /// Register a typed getter/setter pair.
    pub fn accessor<T, G, S>(self, get: G, set: S) -> Self
    where
        T: IntoFieldValue + FromFieldValue,
        G: Fn(&M) -> T + 'static,
        S: Fn(&mut M, T) + 'static,
    {
        self.getter(get).setter(set)
    }
}

impl<M> Field<M> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn is_json_type(&self) -> bool {
        self.field_type.is_json()
    }

    pub fn is_id(&self) -> bool {
        self.options.id
    }

    pub fn is_auto_increment(&self) -> bool {
        self.options.auto_increment
    }

    pub fn is_created_at(&self) -> bool {
        self.options.created_at
    }

    pub fn is_updated_at(&self) -> bool {
        self.options.updated_at
    }

    pub fn is_settable(&self) -> bool {
        self.options.settable
    }

    pub fn is_addable(&self) -> bool {
        self.options.addable && self.is_settable()
    }

    pub fn is_editable(&self) -> bool {
        self.options.editable && self.is_settable() && !self.is_created_at()
    }

    /// Decode a wire value.
    pub fn get_value(&self, db_value: &Value) -> OrmResult<FieldValue> {
        if db_value.is_null() {
            return Ok(FieldValue::Null);
        }

        match self.field_type {
            FieldType::Json | FieldType::JsonAssoc => match db_value {
                Value::String(text) => self.decode_json(text),
                _ => Ok(FieldValue::Null),
            },
            FieldType::Bool => Ok(FieldValue::Bool(match db_value {
                Value::Bool(b) => *b,
                other => !FALSE_VALUES.contains(&other.to_string().as_str()),
            })),
            FieldType::DateTime => match db_value {
                Value::String(text) => parse_date_time(text).map(FieldValue::DateTime).ok_or_else(|| {
                    OrmError::data(format!(
                        "String \"{text}\" in \"{}\" field can not be converted into a date.",
                        self.name
                    ))
                }),
                other => Err(OrmError::data(format!(
                    "Value \"{other}\" in \"{}\" field can not be converted into a date.",
                    self.name
                ))),
            },
            FieldType::DateTimeTimestamp => db_value
                .as_i64()
                .and_then(|secs| Local.timestamp_opt(secs, 0).single())
                .map(FieldValue::DateTime)
                .ok_or_else(|| {
                    OrmError::data(format!(
                        "Timestamp \"{db_value}\" in \"{}\" field can not be converted into date.",
                        self.name
                    ))
                }),
            FieldType::Float => match db_value {
                Value::Float(v) => Ok(FieldValue::Float(*v)),
                Value::Int(i) => Ok(FieldValue::Float(*i as f64)),
                Value::Bool(b) => Ok(FieldValue::Float(if *b { 1.0 } else { 0.0 })),
                other => other
                    .to_string()
                    .trim()
                    .parse()
                    .map(FieldValue::Float)
                    .map_err(|_| self.numeric_error(other)),
            },
            FieldType::Int => match db_value {
                Value::Int(i) => Ok(FieldValue::Int(*i)),
                Value::Float(v) => Ok(FieldValue::Int(v.trunc() as i64)),
                Value::Bool(b) => Ok(FieldValue::Int(i64::from(*b))),
                other => {
                    let text = other.to_string();
                    let text = text.trim();
                    text.parse::<i64>()
                        .ok()
                        .or_else(|| text.parse::<f64>().ok().map(|v| v.trunc() as i64))
                        .map(FieldValue::Int)
                        .ok_or_else(|| self.numeric_error(other))
                }
            },
            FieldType::String => Ok(FieldValue::String(db_value.to_string())),
        }
    }

    fn decode_json(&self, text: &str) -> OrmResult<FieldValue> {
        let json: serde_json::Value = serde_json::from_str(text).map_err(|e| {
            OrmError::data(format!(
                "Value in \"{}\" field is not valid JSON: {e}",
                self.name
            ))
        })?;
        if self.field_type == FieldType::JsonAssoc && json.is_object() {
            // Re-read to keep the document's key order.
            let map: IndexMap<String, serde_json::Value> = serde_json::from_str(text)?;
            return Ok(FieldValue::Assoc(map));
        }
        Ok(json.into_field_value())
    }

    fn numeric_error(&self, value: &Value) -> OrmError {
        OrmError::data(format!(
            "Value \"{value}\" in \"{}\" field is not a valid {}.",
            self.name,
            self.field_type.as_str()
        ))
    }

    /// Encode a typed value for the wire.
    pub fn get_db_value(&self, value: &FieldValue) -> OrmResult<Value> {
        Ok(match value {
            FieldValue::Null => Value::Null,
            FieldValue::Json(json) => Value::String(serde_json::to_string(json)?),
            FieldValue::Assoc(map) => Value::String(serde_json::to_string(map)?),
            FieldValue::DateTime(dt) if self.field_type == FieldType::DateTimeTimestamp => {
                Value::Int(dt.timestamp())
            }
            FieldValue::DateTime(dt) => Value::String(dt.format(DATE_TIME_FORMAT).to_string()),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::Int(*i),
            FieldValue::Float(v) => Value::Float(*v),
            FieldValue::String(s) => Value::String(s.clone()),
        })
    }

    /// Declared parameter kind for binding `value` through this field.
    pub fn get_db_type(&self, value: &FieldValue) -> ParamType {
        if value.is_null() {
            return ParamType::Null;
        }
        match self.field_type {
            FieldType::Json | FieldType::JsonAssoc => ParamType::String,
            FieldType::Bool => ParamType::Bool,
            FieldType::Float => ParamType::Float,
            FieldType::Int | FieldType::DateTimeTimestamp => ParamType::Int,
            FieldType::String | FieldType::DateTime => ParamType::String,
        }
    }

    /// Read the property through the getter; `Null` without one.
    pub fn value_from_model(&self, model: &M) -> FieldValue {
        self.getter
            .as_ref()
            .map_or(FieldValue::Null, |get| get(model))
    }

    /// Write the property through the setter.
    pub fn set_value_to_model(&self, model: &mut M, value: FieldValue) -> OrmResult<()> {
        let Some(set) = &self.setter else {
            return Err(OrmError::repository(format!(
                "There was impossible to set value \"{}\".",
                self.name
            )));
        };
        set(model, value).map_err(|e| match e {
            OrmError::Data(message) => {
                OrmError::Data(format!("Field \"{}\": {message}", self.name))
            }
            other => other,
        })
    }
}

fn parse_date_time(text: &str) -> Option<DateTime<Local>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Local));
    }
    let naive = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    resolve_local(&Local, &naive)
}

/// Place a wall-clock time in `tz`. Ambiguous times take the earlier
/// instant; times skipped by a DST gap move forward past the gap.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(naive).earliest().or_else(|| {
        let shifted = naive.checked_add_signed(TimeDelta::hours(1))?;
        tz.from_local_datetime(&shifted).earliest()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[derive(Default)]
    struct Item {
        count: i64,
        label: Option<String>,
    }

    fn s(text: &str) -> Value {
        Value::String(text.to_string())
    }

    #[test]
    fn option_defaults_and_derived_flags() {
        let field = Field::<Item>::int("a");
        assert!(!field.is_id());
        assert!(!field.is_created_at());
        assert!(field.is_settable() && field.is_addable() && field.is_editable());

        let field = Field::<Item>::int("a").settable(false);
        assert!(!field.is_addable());
        assert!(!field.is_editable());

        let field = Field::<Item>::date_time("created").created_at();
        assert!(field.is_addable());
        assert!(!field.is_editable());
    }

    #[test]
    fn db_name_defaults_to_name() {
        assert_eq!(Field::<Item>::string("title").db_name(), "title");
        assert_eq!(Field::<Item>::string("title").with_db_name("").db_name(), "title");
        assert_eq!(Field::<Item>::string("title").with_db_name("t_title").db_name(), "t_title");
    }

    #[test]
    fn bool_false_set() {
        let field = Field::<Item>::bool("flag");
        for text in ["false", "null", "", "0"] {
            assert_eq!(field.get_value(&s(text)).unwrap(), FieldValue::Bool(false), "{text}");
        }
        for text in ["1", "true", "yes", "no"] {
            assert_eq!(field.get_value(&s(text)).unwrap(), FieldValue::Bool(true), "{text}");
        }
        assert_eq!(field.get_value(&Value::Int(0)).unwrap(), FieldValue::Bool(false));
        assert_eq!(field.get_value(&Value::Null).unwrap(), FieldValue::Null);
    }

    #[test]
    fn scalar_values_survive_a_round_trip_textually() {
        let cases = [
            (Field::<Item>::string("s"), "hello"),
            (Field::<Item>::int("i"), "42"),
            (Field::<Item>::int("i"), "-7"),
            (Field::<Item>::float("f"), "1.5"),
        ];
        for (field, raw) in cases {
            let value = field.get_value(&s(raw)).unwrap();
            assert_eq!(field.get_db_value(&value).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn numeric_text_that_does_not_parse_is_data_error() {
        assert!(Field::<Item>::int("i").get_value(&s("abc")).unwrap_err().is_data());
        assert!(Field::<Item>::float("f").get_value(&s("x1")).unwrap_err().is_data());
        assert_eq!(
            Field::<Item>::int("i").get_value(&s("12.9")).unwrap(),
            FieldValue::Int(12)
        );
    }

    #[test]
    fn json_decoding() {
        let field = Field::<Item>::json("data");
        assert_eq!(
            field.get_value(&s(r#"[1,2]"#)).unwrap(),
            FieldValue::Json(serde_json::json!([1, 2]))
        );
        assert_eq!(field.get_value(&Value::Int(3)).unwrap(), FieldValue::Null);
        assert!(field.get_value(&s("{oops")).unwrap_err().is_data());

        let field = Field::<Item>::json_assoc("data");
        let FieldValue::Assoc(map) = field.get_value(&s(r#"{"z":1,"a":2}"#)).unwrap() else {
            panic!("expected an assoc map");
        };
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["z", "a"]);
        assert_eq!(
            field.get_db_value(&FieldValue::Assoc(map)).unwrap(),
            s(r#"{"z":1,"a":2}"#)
        );
    }

    #[test]
    fn date_time_formats() {
        let field = Field::<Item>::date_time("at");
        let FieldValue::DateTime(dt) = field.get_value(&s("2021-03-04 05:06:07")).unwrap() else {
            panic!("expected a date");
        };
        assert_eq!((dt.year(), dt.month(), dt.day()), (2021, 3, 4));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (5, 6, 7));
        assert_eq!(
            field.get_db_value(&FieldValue::DateTime(dt)).unwrap(),
            s("2021-03-04 05:06:07")
        );

        assert!(field.get_value(&s("2021-03-04")).is_ok());
        assert!(field.get_value(&s("2021-03-04T05:06:07")).is_ok());
        assert!(field.get_value(&s("not a date")).unwrap_err().is_data());
    }

    #[test]
    fn timestamps() {
        let field = Field::<Item>::timestamp("at");
        let value = field.get_value(&Value::Int(1_600_000_000)).unwrap();
        assert_eq!(field.get_db_value(&value).unwrap(), Value::Int(1_600_000_000));
        assert_eq!(field.get_db_type(&value), ParamType::Int);
        assert!(field.get_value(&s("soon")).unwrap_err().is_data());
    }

    #[test]
    fn db_types() {
        let v = FieldValue::String("x".into());
        assert_eq!(Field::<Item>::json("j").get_db_type(&v), ParamType::String);
        assert_eq!(Field::<Item>::bool("b").get_db_type(&v), ParamType::Bool);
        assert_eq!(Field::<Item>::float("f").get_db_type(&v), ParamType::Float);
        assert_eq!(Field::<Item>::int("i").get_db_type(&v), ParamType::Int);
        assert_eq!(Field::<Item>::date_time("d").get_db_type(&v), ParamType::String);
        assert_eq!(Field::<Item>::int("i").get_db_type(&FieldValue::Null), ParamType::Null);
    }

    #[test]
    fn accessors() {
        let count = Field::<Item>::int("count").accessor(|i: &Item| i.count, |i, v| i.count = v);
        let label = Field::<Item>::string("label")
            .accessor(|i: &Item| i.label.clone(), |i, v| i.label = v);
        let bare = Field::<Item>::string("bare");

        let mut item = Item::default();
        count.set_value_to_model(&mut item, FieldValue::Int(5)).unwrap();
        label.set_value_to_model(&mut item, FieldValue::Null).unwrap();
        assert_eq!(item.count, 5);
        assert_eq!(label.value_from_model(&item), FieldValue::Null);
        assert_eq!(count.value_from_model(&item), FieldValue::Int(5));

        assert_eq!(bare.value_from_model(&item), FieldValue::Null);
        assert!(bare
            .set_value_to_model(&mut item, FieldValue::Null)
            .unwrap_err()
            .is_repository());
        assert!(count
            .set_value_to_model(&mut item, FieldValue::String("x".into()))
            .unwrap_err()
            .is_data());
    }

    /// UTC, except that 02:00-02:59 local time does not exist.
    #[derive(Debug, Clone, Copy)]
    struct SpringForward;

    fn utc_offset() -> chrono::FixedOffset {
        chrono::FixedOffset::east_opt(0).unwrap()
    }

    impl TimeZone for SpringForward {
        type Offset = chrono::FixedOffset;

        fn from_offset(_offset: &chrono::FixedOffset) -> Self {
            SpringForward
        }

        fn offset_from_local_date(&self, _local: &NaiveDate) -> chrono::LocalResult<chrono::FixedOffset> {
            chrono::LocalResult::Single(utc_offset())
        }

        fn offset_from_local_datetime(
            &self,
            local: &NaiveDateTime,
        ) -> chrono::LocalResult<chrono::FixedOffset> {
            if local.hour() == 2 {
                chrono::LocalResult::None
            } else {
                chrono::LocalResult::Single(utc_offset())
            }
        }

        fn offset_from_utc_date(&self, _utc: &NaiveDate) -> chrono::FixedOffset {
            utc_offset()
        }

        fn offset_from_utc_datetime(&self, _utc: &NaiveDateTime) -> chrono::FixedOffset {
            utc_offset()
        }
    }

    #[test]
    fn wall_clock_in_dst_gap_moves_past_it() {
        let naive = |text: &str| NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT).unwrap();

        let skipped = resolve_local(&SpringForward, &naive("2021-03-28 02:30:00")).unwrap();
        assert_eq!(skipped.naive_local(), naive("2021-03-28 03:30:00"));

        let regular = resolve_local(&SpringForward, &naive("2021-03-28 01:30:00")).unwrap();
        assert_eq!(regular.naive_local(), naive("2021-03-28 01:30:00"));
    }
}
