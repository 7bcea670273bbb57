use super::Repository;
use super::relation::{Bindings, ModelsRelation};
use crate::clause::{IntoFragments, JoinType};
use crate::error::OrmResult;
use crate::query::Query;
use crate::record::AnyRecord;
use crate::value::Row;
use indexmap::IndexMap;
use std::fmt;

/// Model-type-independent view of a repository, used for joined tables.
pub(crate) trait ErasedRepository {
    fn table_name(&self) -> &str;

    /// Select items `<slug>.<column> as <prefix>_<column>`.
    fn prefixed_items(&self, slug: &str, prefix: &str) -> Vec<String>;

    /// Identifier column values of an unprefixed row; empty when the row has
    /// no identifier to cache by.
    fn id_parts(&self, values: &Row) -> Vec<String>;

    /// Build a record from an unprefixed row.
    fn create_any(&self, values: &Row) -> OrmResult<Option<AnyRecord>>;
}

impl<M: Default + 'static> ErasedRepository for Repository<M> {
    fn table_name(&self) -> &str {
        self.table().name()
    }

    fn prefixed_items(&self, slug: &str, prefix: &str) -> Vec<String> {
        self.fields_with_prefix(slug, prefix)
    }

    fn id_parts(&self, values: &Row) -> Vec<String> {
        let parts: Vec<Option<String>> = self
            .table()
            .id_fields()
            .into_iter()
            .map(|field| values.get(field.db_name()).and_then(|value| value.to_text()))
            .collect();
        if parts.iter().all(Option::is_none) {
            return Vec::new();
        }
        parts.into_iter().map(Option::unwrap_or_default).collect()
    }

    fn create_any(&self, values: &Row) -> OrmResult<Option<AnyRecord>> {
        Ok(self.create_db_model_instance(values)?.map(AnyRecord::from))
    }
}

/// A multi-table SELECT under construction: the main repository, joined
/// repositories and their relation bindings.
///
/// Built with [`Repository::prepare_select_all_query`], turned into SQL with
/// [`Repository::create_select_all_query`] and run with
/// [`Repository::get_all_by_query`].
pub struct ModelsRelationsQuery<'r, M> {
    pub(crate) main: &'r Repository<M>,
    pub(crate) slug: String,
    pub(crate) relations: Vec<ModelsRelation<'r>>,
    pub(crate) query: Option<Query>,
}

impl<'r, M: Default + 'static> ModelsRelationsQuery<'r, M> {
    pub(crate) fn new(main: &'r Repository<M>, slug: impl Into<String>) -> Self {
        Self {
            main,
            slug: slug.into(),
            relations: Vec::new(),
            query: None,
        }
    }

    /// Attach a joined repository of any join type.
    pub fn join_as<R: Default + 'static>(
        &mut self,
        join_type: JoinType,
        repository: &'r Repository<R>,
        slug: impl Into<String>,
        condition: impl IntoFragments,
        bindings: Bindings<R>,
    ) -> &mut Self {
        self.relations.push(ModelsRelation::new(
            join_type,
            repository,
            slug.into(),
            condition.into_fragments(),
            bindings,
        ));
        self
    }

    /// `INNER JOIN` another repository.
    pub fn join<R: Default + 'static>(
        &mut self,
        repository: &'r Repository<R>,
        slug: impl Into<String>,
        condition: impl IntoFragments,
        bindings: Bindings<R>,
    ) -> &mut Self {
        self.join_as(JoinType::Join, repository, slug, condition, bindings)
    }

    /// `LEFT OUTER JOIN` another repository.
    pub fn left_join<R: Default + 'static>(
        &mut self,
        repository: &'r Repository<R>,
        slug: impl Into<String>,
        condition: impl IntoFragments,
        bindings: Bindings<R>,
    ) -> &mut Self {
        self.join_as(JoinType::LeftJoin, repository, slug, condition, bindings)
    }

    /// `RIGHT OUTER JOIN` another repository.
    pub fn right_join<R: Default + 'static>(
        &mut self,
        repository: &'r Repository<R>,
        slug: impl Into<String>,
        condition: impl IntoFragments,
        bindings: Bindings<R>,
    ) -> &mut Self {
        self.join_as(JoinType::RightJoin, repository, slug, condition, bindings)
    }

    /// `FULL OUTER JOIN` another repository.
    pub fn outer_join<R: Default + 'static>(
        &mut self,
        repository: &'r Repository<R>,
        slug: impl Into<String>,
        condition: impl IntoFragments,
        bindings: Bindings<R>,
    ) -> &mut Self {
        self.join_as(JoinType::OuterJoin, repository, slug, condition, bindings)
    }

    /// Slug of the main table.
    pub fn table_slug(&self) -> &str {
        &self.slug
    }

    /// Slugs of the joined tables in declaration order.
    pub fn relation_slugs(&self) -> Vec<&str> {
        self.relations.iter().map(|relation| relation.slug.as_str()).collect()
    }

    /// The generated query, once created.
    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn query_mut(&mut self) -> Option<&mut Query> {
        self.query.as_mut()
    }

    /// Every participating repository by slug; a later slug replaces an
    /// earlier one.
    pub(crate) fn repositories(&self) -> IndexMap<&str, &dyn ErasedRepository> {
        let mut repositories: IndexMap<&str, &dyn ErasedRepository> = IndexMap::new();
        repositories.insert(self.slug.as_str(), self.main);
        for relation in &self.relations {
            repositories.insert(relation.slug.as_str(), relation.repository);
        }
        repositories
    }
}

impl<M> fmt::Debug for ModelsRelationsQuery<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelsRelationsQuery")
            .field("slug", &self.slug)
            .field("relations", &self.relations)
            .field("query", &self.query)
            .finish()
    }
}
