//! Shared model handles with persistence state.

use crate::error::{OrmError, OrmResult};
use std::any::Any;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

/// Whether a record is known to exist in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersistState {
    /// Created by the caller, not yet inserted.
    New,
    /// Built from a row, or inserted.
    Persisted,
}

struct RecordCell<M> {
    model: RefCell<M>,
    state: Cell<PersistState>,
}

/// A shared, mutable handle to one model instance.
///
/// Cloning a record clones the handle, so relation bindings can keep
/// references to each other's records.
///
/// Handles are reference counted. When two records point at each other,
/// one side must hold a [`WeakRecord`] from [`Record::downgrade`] or
/// neither is ever freed. Child to parent links are usually strong and
/// parent to children links weak.
pub struct Record<M>(Rc<RecordCell<M>>);

impl<M> Record<M> {
    /// Wrap a new, not yet persisted model.
    pub fn new(model: M) -> Self {
        Self::with_state(model, PersistState::New)
    }

    pub(crate) fn persisted(model: M) -> Self {
        Self::with_state(model, PersistState::Persisted)
    }

    fn with_state(model: M, state: PersistState) -> Self {
        Self(Rc::new(RecordCell {
            model: RefCell::new(model),
            state: Cell::new(state),
        }))
    }

    /// Borrow the model.
    ///
    /// # Panics
    ///
    /// Panics if the model is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, M> {
        self.0.model.borrow()
    }

    /// Mutably borrow the model.
    ///
    /// # Panics
    ///
    /// Panics if the model is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, M> {
        self.0.model.borrow_mut()
    }

    pub(crate) fn try_borrow(&self) -> OrmResult<Ref<'_, M>> {
        self.0
            .model
            .try_borrow()
            .map_err(|_| OrmError::repository("Model is already mutably borrowed."))
    }

    pub(crate) fn try_borrow_mut(&self) -> OrmResult<RefMut<'_, M>> {
        self.0
            .model
            .try_borrow_mut()
            .map_err(|_| OrmError::repository("Model is already borrowed."))
    }

    pub fn state(&self) -> PersistState {
        self.0.state.get()
    }

    pub fn is_persisted(&self) -> bool {
        self.state() == PersistState::Persisted
    }

    pub(crate) fn mark_persisted(&self) {
        self.0.state.set(PersistState::Persisted);
    }

    /// Returns `true` when both handles point to the same model.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the shared model, stable for the record's lifetime.
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// A non-owning handle to the same model.
    pub fn downgrade(&self) -> WeakRecord<M> {
        WeakRecord(Rc::downgrade(&self.0))
    }

    /// Take the model out when this is the only handle.
    pub fn try_unwrap(self) -> Result<M, Self> {
        Rc::try_unwrap(self.0)
            .map(|cell| cell.model.into_inner())
            .map_err(Self)
    }
}

impl<M> Clone for Record<M> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<M> fmt::Debug for Record<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("state", &self.state())
            .field("addr", &format_args!("{:#x}", self.addr()))
            .finish()
    }
}

/// A non-owning [`Record`] handle.
///
/// Does not keep the model alive. Use it for back references such as a
/// parent's list of children.
pub struct WeakRecord<M>(Weak<RecordCell<M>>);

impl<M> WeakRecord<M> {
    /// The record, if any strong handle still exists.
    pub fn upgrade(&self) -> Option<Record<M>> {
        self.0.upgrade().map(Record)
    }
}

impl<M> Clone for WeakRecord<M> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

impl<M> fmt::Debug for WeakRecord<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakRecord")
            .field("alive", &(self.0.strong_count() > 0))
            .finish()
    }
}

/// A [`Record`] with its model type erased.
///
/// Used where records of several model types travel together, such as the
/// rows of a multi-table query.
#[derive(Clone)]
pub struct AnyRecord {
    inner: Rc<dyn Any>,
    addr: usize,
}

impl AnyRecord {
    /// Address of the shared model; equal for handles of the same record.
    pub fn addr(&self) -> usize {
        self.addr
    }

    /// Recover the typed record, `None` when `M` is not the model type.
    pub fn downcast<M: 'static>(&self) -> Option<Record<M>> {
        Rc::clone(&self.inner)
            .downcast::<RecordCell<M>>()
            .ok()
            .map(Record)
    }

    pub fn ptr_eq(&self, other: &AnyRecord) -> bool {
        self.addr == other.addr
    }
}

impl<M: 'static> From<Record<M>> for AnyRecord {
    fn from(record: Record<M>) -> Self {
        let addr = record.addr();
        Self {
            inner: record.0,
            addr,
        }
    }
}

impl fmt::Debug for AnyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyRecord")
            .field("addr", &format_args!("{:#x}", self.addr))
            .finish()
    }
}
