use super::cache::QueryModelsCache;
use super::relations_query::ErasedRepository;
use crate::clause::JoinType;
use crate::error::{OrmError, OrmResult};
use crate::record::{AnyRecord, Record};
use std::any::type_name;
use std::fmt;

/// Erased binding: `(target, argument)`; the target is borrowed mutably.
type BindFn = Box<dyn Fn(&AnyRecord, &AnyRecord) -> OrmResult<()>>;

fn typed<M: 'static>(record: &AnyRecord) -> OrmResult<Record<M>> {
    record.downcast::<M>().ok_or_else(|| {
        OrmError::repository(format!(
            "Relation binding expects a {} model.",
            type_name::<M>()
        ))
    })
}

/// Typed relation bindings of a joined table whose model is `R`.
///
/// Bindings are keyed by the slug of the *other* table:
///
/// - [`bind_for`](Bindings::bind_for) runs on the other table's model and
///   receives this table's record;
/// - [`bind_to`](Bindings::bind_to) runs on this table's model and receives
///   the other table's record.
///
/// Binding both directions with strong handles forms a cycle that is never
/// freed, so one side stores a [`WeakRecord`](crate::WeakRecord):
///
/// ```ignore
/// let bindings = Bindings::<Product>::new()
///     .bind_for::<ProductType>("pt", |pt, product| pt.product = Some(product))
///     .bind_to::<ProductType>("pt", |product, pt| product.types.push(pt.downgrade()));
/// ```
pub struct Bindings<R> {
    for_other: Vec<(String, BindFn)>,
    to_other: Vec<(String, BindFn)>,
    _model: std::marker::PhantomData<fn(R)>,
}

impl<R> Default for Bindings<R> {
    fn default() -> Self {
        Self {
            for_other: Vec::new(),
            to_other: Vec::new(),
            _model: std::marker::PhantomData,
        }
    }
}

impl<R> fmt::Debug for Bindings<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slugs = |entries: &Vec<(String, BindFn)>| -> Vec<String> {
            entries.iter().map(|(slug, _)| slug.clone()).collect()
        };
        f.debug_struct("Bindings")
            .field("for", &slugs(&self.for_other))
            .field("to", &slugs(&self.to_other))
            .finish()
    }
}

impl<R: 'static> Bindings<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind this table's record onto the model of table `slug`.
    pub fn bind_for<O: 'static>(
        mut self,
        slug: impl Into<String>,
        bind: impl Fn(&mut O, Record<R>) + 'static,
    ) -> Self {
        let slug = slug.into();
        self.for_other.retain(|(existing, _)| *existing != slug);
        self.for_other.push((
            slug,
            Box::new(move |target, argument| {
                let target = typed::<O>(target)?;
                let argument = typed::<R>(argument)?;
                bind(&mut *target.try_borrow_mut()?, argument);
                Ok(())
            }),
        ));
        self
    }

    /// Bind the record of table `slug` onto this table's model.
    pub fn bind_to<O: 'static>(
        mut self,
        slug: impl Into<String>,
        bind: impl Fn(&mut R, Record<O>) + 'static,
    ) -> Self {
        let slug = slug.into();
        self.to_other.retain(|(existing, _)| *existing != slug);
        self.to_other.push((
            slug,
            Box::new(move |target, argument| {
                let target = typed::<R>(target)?;
                let argument = typed::<O>(argument)?;
                bind(&mut *target.try_borrow_mut()?, argument);
                Ok(())
            }),
        ));
        self
    }
}

/// One joined table of a [`ModelsRelationsQuery`](super::ModelsRelationsQuery).
pub(crate) struct ModelsRelation<'r> {
    pub(crate) join_type: JoinType,
    pub(crate) repository: &'r dyn ErasedRepository,
    pub(crate) slug: String,
    pub(crate) condition: Vec<String>,
    for_other: Vec<(String, BindFn)>,
    to_other: Vec<(String, BindFn)>,
    /// Record built from the current row.
    pub(crate) record: Option<AnyRecord>,
}

impl<'r> ModelsRelation<'r> {
    pub(crate) fn new<R>(
        join_type: JoinType,
        repository: &'r dyn ErasedRepository,
        slug: String,
        condition: Vec<String>,
        bindings: Bindings<R>,
    ) -> Self {
        Self {
            join_type,
            repository,
            slug,
            condition,
            for_other: bindings.for_other,
            to_other: bindings.to_other,
            record: None,
        }
    }

    /// Apply the bindings declared for `slug` between this relation's record
    /// and `other`, each at most once per pair of records.
    pub(crate) fn bind_with(
        &self,
        slug: &str,
        other: Option<&AnyRecord>,
        cache: &mut QueryModelsCache,
    ) -> OrmResult<()> {
        let (Some(own), Some(other)) = (self.record.as_ref(), other) else {
            return Ok(());
        };

        if let Some((_, bind)) = self.for_other.iter().find(|(key, _)| key == slug) {
            if !cache.relation_exists_once(&["for", slug, self.slug.as_str()], other, own) {
                tracing::trace!(
                    target: "repodb.repository",
                    direction = "for",
                    slug,
                    relation = %self.slug,
                    "binding relation"
                );
                bind(other, own)?;
            }
        }

        if let Some((_, bind)) = self.to_other.iter().find(|(key, _)| key == slug) {
            if !cache.relation_exists_once(&["to", slug, self.slug.as_str()], own, other) {
                tracing::trace!(
                    target: "repodb.repository",
                    direction = "to",
                    slug,
                    relation = %self.slug,
                    "binding relation"
                );
                bind(own, other)?;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for ModelsRelation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelsRelation")
            .field("join_type", &self.join_type)
            .field("table", &self.repository.table_name())
            .field("slug", &self.slug)
            .field("condition", &self.condition)
            .finish_non_exhaustive()
    }
}
