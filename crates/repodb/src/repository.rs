//! Generic repository over a [`Table`] mapping.
//!
//! A [`Repository`] turns filters into parameterized SELECT/COUNT queries,
//! decodes rows into [`Record`]s and writes records back with INSERT, UPDATE
//! and DELETE. Multi-table reads go through [`ModelsRelationsQuery`], which
//! joins other repositories and wires decoded records together with
//! [`Bindings`].

mod cache;
mod filter;
mod relation;
mod relations_query;

use cache::QueryModelsCache;
pub use filter::{Filter, FilterValue};
pub use relation::Bindings;
pub use relations_query::ModelsRelationsQuery;

use crate::client::Connection;
use crate::clause::{IntoFragments, OrderTerm};
use crate::error::{OrmError, OrmResult};
use crate::pagination::{Page, PageRequest};
use crate::query::Query;
use crate::record::{AnyRecord, Record};
use crate::structure::{Field, FieldValue, IntoFieldValue, Table};
use crate::value::{Params, Row};
use chrono::{Local, Timelike};
use relations_query::ErasedRepository;
use std::collections::HashSet;
use std::fmt;

/// Column alias used by the counting queries.
const COUNT_COLUMN: &str = "count";

/// Data access for one model type `M` stored in one table.
pub struct Repository<M> {
    connection: Connection,
    table: Table<M>,
}

impl<M> fmt::Debug for Repository<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl<M> Repository<M> {
    pub fn new(connection: Connection, table: Table<M>) -> Self {
        Self { connection, table }
    }

    pub fn table(&self) -> &Table<M> {
        &self.table
    }

    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn begin_transaction(&self) -> OrmResult<()> {
        self.connection.begin_transaction()
    }

    pub fn commit(&self) -> OrmResult<()> {
        self.connection.commit()
    }

    pub fn roll_back(&self) -> OrmResult<()> {
        self.connection.roll_back()
    }

    /// Select items exposing every column of this table as
    /// `<slug>.<column> as <prefix>_<column>`.
    pub fn fields_with_prefix(&self, slug: &str, prefix: &str) -> Vec<String> {
        self.table
            .fields()
            .map(|field| {
                let column = field.db_name();
                format!("{slug}.{column} as {prefix}_{column}")
            })
            .collect()
    }

    /// The columns of `row` starting with `<prefix>_`, with the prefix removed.
    pub fn prefixed_values(&self, row: &Row, prefix: &str) -> Row {
        let prefix = format!("{prefix}_");
        row.iter()
            .filter_map(|(column, value)| {
                column
                    .strip_prefix(&prefix)
                    .map(|column| (column.to_string(), value.clone()))
            })
            .collect()
    }

    /// Start a SELECT over this table (or `table_name`), aliased by `slug`.
    pub fn create_select_query(
        &self,
        items: impl IntoFragments,
        slug: Option<&str>,
        table_name: Option<&str>,
    ) -> Query {
        self.connection
            .select(items, table_name.unwrap_or(self.table.name()), slug)
    }

    /// Run `query` and return the single `count` column, `0` unless exactly
    /// one row comes back.
    ///
    /// The query itself is left untouched; counting runs on a copy whose
    /// select list is replaced and whose LIMIT is dropped, so a query already
    /// limited to one page still counts every matching row.
    pub fn count_by_query(&self, query: &Query, params: &Params) -> OrmResult<u64> {
        let mut count_query = query.clone_select(format!("count(*) as {COUNT_COLUMN}"));
        count_query.clear_limit();
        let rows = count_query.fetch_all(params)?;
        match rows.as_slice() {
            [row] => Ok(read_count(row)),
            _ => Ok(0),
        }
    }

    /// Count the rows matching `filter`.
    ///
    /// A filter that can not be rendered (an empty value list) matches nothing
    /// and returns `0` without querying.
    pub fn count_by(&self, filter: &Filter) -> OrmResult<u64> {
        let mut query = self.connection.select(
            format!("COUNT(*) AS {COUNT_COLUMN}"),
            self.table.name(),
            None,
        );
        let mut params = Params::new();
        if !self.apply_filter(&mut query, filter, &mut params)? {
            return Ok(0);
        }
        let rows = query.fetch_all(&params)?;
        Ok(rows.first().map_or(0, read_count))
    }

    /// Bind every entry of `filter` naming a declared field and set the WHERE
    /// clause. Returns `false` for a malformed filter.
    fn apply_filter(&self, query: &mut Query, filter: &Filter, params: &mut Params) -> OrmResult<bool> {
        match self.bind_filter(query, filter, params) {
            Ok(()) => Ok(true),
            Err(err) if err.is_malformed_filter() => {
                tracing::debug!(
                    target: "repodb.repository",
                    table = %self.table.name(),
                    error = %err,
                    "filter matches nothing"
                );
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    fn bind_filter(&self, query: &mut Query, filter: &Filter, params: &mut Params) -> OrmResult<()> {
        let mut conditions = Vec::with_capacity(filter.len());
        for (name, value) in filter.iter() {
            if matches!(value, FilterValue::List(values) if values.is_empty()) {
                return Err(OrmError::malformed_filter(format!(
                    "Param \"{name}\" shouldn't be an empty array."
                )));
            }
            // Keys naming no declared field are ignored.
            let Some(field) = self.table.field(name) else {
                continue;
            };
            conditions.push(self.bind_field(query, field, value, params)?);
        }
        query.where_(conditions);
        Ok(())
    }

    /// Bind one value through `field` and return its condition or SET item.
    fn bind_field(
        &self,
        query: &mut Query,
        field: &Field<M>,
        value: &FilterValue,
        params: &mut Params,
    ) -> OrmResult<String> {
        let column = self.connection.escape(field.db_name());
        let name = format!(":{column}");

        match value {
            FilterValue::List(values) if !field.is_json_type() => {
                let mut names = Vec::with_capacity(values.len());
                for (index, item) in values.iter().enumerate() {
                    let item_name = format!("{name}{}", index + 1);
                    self.bind_one(query, field, &item_name, item, params)?;
                    names.push(item_name);
                }
                Ok(format!("{column} IN ({})", names.join(", ")))
            }
            FilterValue::List(values) => {
                let json = serde_json::Value::Array(values.iter().map(FieldValue::to_json).collect());
                self.bind_one(query, field, &name, &FieldValue::Json(json), params)?;
                Ok(format!("{column} = {name}"))
            }
            FilterValue::One(item) => {
                self.bind_one(query, field, &name, item, params)?;
                Ok(format!("{column} = {name}"))
            }
        }
    }

    fn bind_one(
        &self,
        query: &mut Query,
        field: &Field<M>,
        name: &str,
        value: &FieldValue,
        params: &mut Params,
    ) -> OrmResult<()> {
        query.bind_param(name, field.get_db_type(value));
        params.insert(name.to_string(), field.get_db_value(value)?);
        Ok(())
    }

    /// Bind the current values of `fields` read from `model`.
    fn bind_model(
        &self,
        query: &mut Query,
        model: &M,
        fields: &[&Field<M>],
        params: &mut Params,
    ) -> OrmResult<Vec<String>> {
        fields
            .iter()
            .map(|field| {
                let value = FilterValue::One(field.value_from_model(model));
                self.bind_field(query, field, &value, params)
            })
            .collect()
    }

    /// Set `value` on every created/updated timestamp field among `fields`.
    fn stamp(&self, record: &Record<M>, fields: &[&Field<M>], created: bool) -> OrmResult<()> {
        let now = Local::now();
        let now = now.with_nanosecond(0).unwrap_or(now);
        let mut model = record.try_borrow_mut()?;
        for field in fields {
            if field.is_updated_at() || (created && field.is_created_at()) {
                field.set_value_to_model(&mut model, FieldValue::DateTime(now))?;
            }
        }
        Ok(())
    }

    /// INSERT a new record and return the generated identifier.
    ///
    /// Created/updated timestamp fields are set to the current time first.
    /// The record is marked persisted afterwards.
    pub fn insert(&self, record: &Record<M>) -> OrmResult<i64> {
        let fields = self.table.addable_fields();
        self.stamp(record, &fields, true)?;

        let mut query = self.connection.insert(self.table.name(), None);
        let mut params = Params::new();
        let set = self.bind_model(&mut query, &*record.try_borrow()?, &fields, &mut params)?;
        query.set(set);
        query.execute(&params)?;

        record.mark_persisted();
        let id = self.connection.last_insert_id()?;
        tracing::debug!(target: "repodb.repository", table = %self.table.name(), id, "inserted");
        Ok(id)
    }

    /// UPDATE the editable fields of a record by its identifier fields.
    pub fn update(&self, record: &Record<M>) -> OrmResult<()> {
        let fields = self.table.editable_fields();
        self.stamp(record, &fields, false)?;

        let mut query = self.connection.update(self.table.name(), None);
        let mut params = Params::new();
        let model = record.try_borrow()?;
        let set = self.bind_model(&mut query, &model, &fields, &mut params)?;
        let conditions = self.bind_model(&mut query, &model, &self.table.id_fields(), &mut params)?;
        drop(model);

        query.set(set).where_(conditions);
        query.execute(&params)?;
        Ok(())
    }

    /// DELETE a persisted record by its identifier fields.
    pub fn delete(&self, record: &Record<M>) -> OrmResult<()> {
        if !record.is_persisted() {
            return Err(OrmError::repository(
                "Model instance hasn't been created from DB and can not be deleted.",
            ));
        }

        let mut query = self.connection.delete(self.table.name(), None);
        let mut params = Params::new();
        let conditions =
            self.bind_model(&mut query, &*record.try_borrow()?, &self.table.id_fields(), &mut params)?;
        query.where_(conditions);
        query.execute(&params)?;
        Ok(())
    }
}

impl<M: Default + 'static> Repository<M> {
    /// Build a record from `row`, keyed by column name.
    ///
    /// Returns `None` when no declared column is present or every present
    /// column is NULL (for instance the missing side of an outer join).
    pub fn create_db_model_instance(&self, row: &Row) -> OrmResult<Option<Record<M>>> {
        let mut values = Vec::new();
        for field in self.table.fields() {
            if let Some(db_value) = row.get(field.db_name()) {
                values.push((field, field.get_value(db_value)?));
            }
        }
        if values.iter().all(|(_, value)| value.is_null()) {
            return Ok(None);
        }

        let mut model = M::default();
        for (field, value) in values {
            field.set_value_to_model(&mut model, value)?;
        }
        Ok(Some(Record::persisted(model)))
    }

    /// Run `query` and decode every row.
    pub fn get_by_query(&self, query: &mut Query, params: &Params) -> OrmResult<Vec<Record<M>>> {
        let rows = query.fetch_all(params)?;
        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(record) = self.create_db_model_instance(row)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// [`get_by_query`](Self::get_by_query) restricted to one page.
    ///
    /// With `count_all` the total is counted before LIMIT is applied.
    pub fn get_by_query_paginated(
        &self,
        query: &mut Query,
        params: &Params,
        request: PageRequest,
        count_all: bool,
    ) -> OrmResult<Page<Record<M>>> {
        let total = if count_all {
            Some(self.count_by_query(query, params)?)
        } else {
            None
        };
        if let Some(limit) = request.limit() {
            query.limit(limit, Some(request.offset()));
        }
        let items = self.get_by_query(query, params)?;
        Ok(request.into_page(items, total))
    }

    /// Records matching `filter`, ordered by `(field, direction)` pairs.
    ///
    /// Directions are `ASC`/`DESC` (any case) on declared fields; `RAND` in
    /// any entry orders randomly. Other entries are skipped.
    pub fn get_by(
        &self,
        filter: &Filter,
        order: &[(&str, &str)],
        limit: Option<u64>,
        offset: u64,
    ) -> OrmResult<Vec<Record<M>>> {
        let mut query = self.create_select_query("*", None, None);
        let mut params = Params::new();
        if !self.apply_filter(&mut query, filter, &mut params)? {
            return Ok(Vec::new());
        }

        let terms = self.order_terms(order);
        if !terms.is_empty() {
            query.order_by(terms);
        }
        if let Some(limit) = limit {
            query.limit(limit, Some(offset));
        }
        self.get_by_query(&mut query, &params)
    }

    fn order_terms(&self, order: &[(&str, &str)]) -> Vec<OrderTerm> {
        order
            .iter()
            .filter_map(|(name, direction)| {
                if direction.eq_ignore_ascii_case("rand") {
                    return Some(OrderTerm::expression("RAND()"));
                }
                let field = self.table.field(name)?;
                OrderTerm::parse(&self.connection.escape(field.db_name()), direction)
            })
            .collect()
    }

    /// One page of records matching `filter`.
    pub fn get_paginated(
        &self,
        filter: &Filter,
        order: &[(&str, &str)],
        request: PageRequest,
        count_all: bool,
    ) -> OrmResult<Page<Record<M>>> {
        let total = if count_all {
            Some(self.count_by(filter)?)
        } else {
            None
        };
        let items = self.get_by(filter, order, request.limit(), request.offset())?;
        Ok(request.into_page(items, total))
    }

    /// First record matching `filter`.
    pub fn get_one_by(&self, filter: &Filter, order: &[(&str, &str)]) -> OrmResult<Option<Record<M>>> {
        Ok(self.get_by(filter, order, Some(1), 0)?.into_iter().next())
    }

    /// Like [`get_one_by`](Self::get_one_by), failing with
    /// [`OrmError::NotFound`] when nothing matches.
    pub fn get_one_by_or_404(&self, filter: &Filter, order: &[(&str, &str)]) -> OrmResult<Record<M>> {
        self.get_one_by(filter, order)?
            .ok_or_else(|| OrmError::not_found("Element not found."))
    }

    /// Record by identifier values, one per identifier field in declaration
    /// order.
    pub fn get_by_id<I>(&self, ids: I) -> OrmResult<Option<Record<M>>>
    where
        I: IntoIterator,
        I::Item: IntoFieldValue,
    {
        let ids = collect_ids(ids);
        let filter = self.id_filter(&ids)?;
        self.get_one_by(&filter, &[])
    }

    /// Like [`get_by_id`](Self::get_by_id), failing with
    /// [`OrmError::NotFound`] when the record does not exist.
    pub fn get_by_id_or_404<I>(&self, ids: I) -> OrmResult<Record<M>>
    where
        I: IntoIterator,
        I::Item: IntoFieldValue,
    {
        let ids = collect_ids(ids);
        let filter = self.id_filter(&ids)?;
        self.get_one_by(&filter, &[])?.ok_or_else(|| {
            let id = match ids.as_slice() {
                [single] => single.to_string(),
                many => format!(
                    "[{}]",
                    many.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
                ),
            };
            OrmError::not_found(format!("Element with ID {id} not found."))
        })
    }

    fn id_filter(&self, ids: &[FieldValue]) -> OrmResult<Filter> {
        let id_fields = self.table.id_fields();
        if ids.is_empty() {
            return Err(OrmError::configuration(format!(
                "At least one ID is required to load from \"{}\".",
                self.table.name()
            )));
        }
        if ids.len() != id_fields.len() {
            return Err(OrmError::configuration(format!(
                "Table \"{}\" has {} ID fields but {} IDs were given.",
                self.table.name(),
                id_fields.len(),
                ids.len()
            )));
        }
        Ok(id_fields
            .iter()
            .zip(ids)
            .map(|(field, id)| (field.name(), id.clone()))
            .collect())
    }

    /// Persist a record: UPDATE when it was loaded or saved before, INSERT
    /// otherwise.
    ///
    /// After an INSERT the stored row is read back by its identifier fields
    /// (using the generated identifier for the auto-increment field).
    pub fn save(&self, record: &Record<M>) -> OrmResult<Option<Record<M>>> {
        if record.is_persisted() {
            self.update(record)?;
            return Ok(Some(record.clone()));
        }

        let id = self.insert(record)?;
        let filter: Filter = {
            let model = record.try_borrow()?;
            self.table
                .id_fields()
                .into_iter()
                .map(|field| {
                    let value = if field.is_auto_increment() {
                        FieldValue::Int(id)
                    } else {
                        field.value_from_model(&model)
                    };
                    (field.name(), value)
                })
                .collect()
        };
        self.get_one_by(&filter, &[])
    }

    /// Start a multi-table query with this repository as the main table,
    /// aliased by `slug`.
    pub fn prepare_select_all_query(&self, slug: impl Into<String>) -> ModelsRelationsQuery<'_, M> {
        ModelsRelationsQuery::new(self, slug)
    }

    /// Generate the SELECT for a relations query: every participating
    /// table's columns prefixed by its slug, plus one JOIN per relation.
    ///
    /// The query is stored in `descriptor` and returned for further
    /// refinement (WHERE, ORDER BY, ...).
    pub fn create_select_all_query<'q>(
        &self,
        descriptor: &'q mut ModelsRelationsQuery<'_, M>,
    ) -> &'q mut Query {
        let items: Vec<String> = descriptor
            .repositories()
            .into_iter()
            .flat_map(|(slug, repository)| repository.prefixed_items(slug, slug))
            .collect();

        let mut query = self.create_select_query(
            items,
            Some(descriptor.slug.as_str()),
            Some(descriptor.main.table_name()),
        );
        for relation in &descriptor.relations {
            query.join_as(
                relation.join_type,
                relation.repository.table_name(),
                Some(relation.slug.as_str()),
                relation.condition.clone(),
            );
        }
        descriptor.query.insert(query)
    }

    /// Run a relations query and return the main records, each once, in
    /// first-seen order, with related records bound onto them.
    pub fn get_all_by_query(
        &self,
        descriptor: &mut ModelsRelationsQuery<'_, M>,
        params: &Params,
    ) -> OrmResult<Vec<Record<M>>> {
        let Some(query) = descriptor.query.as_mut() else {
            return Err(OrmError::repository(
                "The select-all query has not been created.",
            ));
        };
        let rows = query.fetch_all(params)?;

        let result = self.decode_relations(descriptor, &rows);
        for relation in &mut descriptor.relations {
            relation.record = None;
        }
        result
    }

    fn decode_relations(
        &self,
        descriptor: &mut ModelsRelationsQuery<'_, M>,
        rows: &[Row],
    ) -> OrmResult<Vec<Record<M>>> {
        let main_slug = descriptor.slug.clone();
        let main: &dyn ErasedRepository = descriptor.main;
        let mut cache = QueryModelsCache::new();
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for row in rows {
            let values = self.prefixed_values(row, &main_slug);
            let main_record = cache.support_model_instance(
                &main_slug,
                &main.id_parts(&values),
                || main.create_any(&values),
            )?;

            for relation in &mut descriptor.relations {
                let values = self.prefixed_values(row, &relation.slug);
                let repository = relation.repository;
                relation.record = cache.support_model_instance(
                    &relation.slug,
                    &repository.id_parts(&values),
                    || repository.create_any(&values),
                )?;
            }

            for from in &descriptor.relations {
                from.bind_with(&main_slug, main_record.as_ref(), &mut cache)?;
                for to in &descriptor.relations {
                    from.bind_with(&to.slug, to.record.as_ref(), &mut cache)?;
                }
            }

            if let Some(record) = main_record {
                if seen.insert(record.addr()) {
                    records.push(typed_main::<M>(&record)?);
                }
            }
        }

        tracing::debug!(
            target: "repodb.repository",
            table = %self.table.name(),
            rows = rows.len(),
            records = records.len(),
            "decoded relations query"
        );
        Ok(records)
    }

    /// [`get_all_by_query`](Self::get_all_by_query) restricted to one page.
    ///
    /// The query must have been created with
    /// [`create_select_all_query`](Self::create_select_all_query).
    pub fn get_all_by_query_paginated(
        &self,
        descriptor: &mut ModelsRelationsQuery<'_, M>,
        params: &Params,
        request: PageRequest,
        count_all: bool,
    ) -> OrmResult<Page<Record<M>>> {
        let Some(query) = descriptor.query.as_mut() else {
            return Err(OrmError::repository(
                "The select-all query has not been created.",
            ));
        };
        let total = if count_all {
            Some(self.count_by_query(query, params)?)
        } else {
            None
        };
        if let Some(limit) = request.limit() {
            query.limit(limit, Some(request.offset()));
        }
        let items = self.get_all_by_query(descriptor, params)?;
        Ok(request.into_page(items, total))
    }
}

fn typed_main<M: 'static>(record: &AnyRecord) -> OrmResult<Record<M>> {
    record
        .downcast::<M>()
        .ok_or_else(|| OrmError::repository("Main record has an unexpected model type."))
}

fn collect_ids<I>(ids: I) -> Vec<FieldValue>
where
    I: IntoIterator,
    I::Item: IntoFieldValue,
{
    ids.into_iter().map(IntoFieldValue::into_field_value).collect()
}

fn read_count(row: &Row) -> u64 {
    row.get(COUNT_COLUMN)
        .and_then(|value| value.as_i64())
        .and_then(|count| u64::try_from(count).ok())
        .unwrap_or(0)
}
