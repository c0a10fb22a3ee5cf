//! Transactional in-memory record store
//!
//! Each module owns its tables as `Arc<Table<T>>` values that no other module can
//! reach. A [`Transaction`] is the unit of work shared across modules for one
//! write request:
//!
//! - beginning a transaction takes the database-wide write gate, so writers run
//!   one at a time,
//! - the first write to a table stages a private copy-on-write snapshot,
//! - [`Transaction::commit`] publishes every staged table,
//! - dropping the transaction without committing discards the staged copies.
//!
//! Readers call [`Table::snapshot`] and never wait for the write gate. A reader
//! racing a commit sees either the old or the new table, never a half-applied
//! write. Reads made on behalf of a write go through a [`View::Pending`] so they
//! see what earlier steps of the same transaction staged.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A committed, copy-on-write table
pub struct Table<T> {
    name: &'static str,
    committed: RwLock<Arc<T>>,
}

impl<T> Table<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a table with initial contents
    pub fn new(name: &'static str, initial: T) -> Arc<Self> {
        Arc::new(Self {
            name,
            committed: RwLock::new(Arc::new(initial)),
        })
    }

    /// Table name used in logs
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the latest committed contents
    pub fn snapshot(&self) -> Arc<T> {
        self.committed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, data: Arc<T>) {
        *self
            .committed
            .write()
            .unwrap_or_else(PoisonError::into_inner) = data;
    }
}

fn table_key<T>(table: &Arc<Table<T>>) -> usize {
    Arc::as_ptr(table) as *const () as usize
}

trait StagedChange: Send + Sync {
    fn key(&self) -> usize;
    fn table_name(&self) -> &'static str;
    fn publish(self: Box<Self>);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Staged<T> {
    table: Arc<Table<T>>,
    data: Arc<T>,
}

impl<T> StagedChange for Staged<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn key(&self) -> usize {
        table_key(&self.table)
    }

    fn table_name(&self) -> &'static str {
        self.table.name()
    }

    fn publish(self: Box<Self>) {
        self.table.publish(self.data);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Shared handle to the record store's write gate
#[derive(Clone, Default)]
pub struct Database {
    gate: Arc<Mutex<()>>,
}

impl Database {
    /// Creates an empty database handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a write transaction, waiting for any writer in flight
    pub async fn begin(&self) -> Transaction {
        let guard = self.gate.clone().lock_owned().await;
        Transaction {
            _gate: guard,
            staged: Vec::new(),
        }
    }
}

/// One write request's unit of work
///
/// Rolls back on drop unless [`Transaction::commit`] was called.
pub struct Transaction {
    _gate: OwnedMutexGuard<()>,
    staged: Vec<Box<dyn StagedChange>>,
}

impl Transaction {
    /// Reads a table as this transaction sees it (staged writes included)
    pub fn read<T>(&self, table: &Arc<Table<T>>) -> Arc<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let key = table_key(table);
        self.staged
            .iter()
            .find(|s| s.key() == key)
            .and_then(|s| s.as_any().downcast_ref::<Staged<T>>())
            .map(|s| s.data.clone())
            .unwrap_or_else(|| table.snapshot())
    }

    /// Returns a mutable view of a table, staging it on first use
    pub fn write<T>(&mut self, table: &Arc<Table<T>>) -> &mut T
    where
        T: Clone + Send + Sync + 'static,
    {
        let key = table_key(table);
        let index = match self.staged.iter().position(|s| s.key() == key) {
            Some(index) => index,
            None => {
                self.staged.push(Box::new(Staged {
                    table: table.clone(),
                    data: table.snapshot(),
                }));
                self.staged.len() - 1
            }
        };

        let staged = self.staged[index]
            .as_any_mut()
            .downcast_mut::<Staged<T>>()
            .expect("a table key always maps to the table's own element type");
        Arc::make_mut(&mut staged.data)
    }

    /// Number of tables touched so far
    pub fn staged_tables(&self) -> usize {
        self.staged.len()
    }

    /// Publishes every staged table and releases the write gate
    pub fn commit(self) -> usize {
        let Transaction { _gate, staged } = self;
        let count = staged.len();
        let names: Vec<&'static str> = staged.iter().map(|s| s.table_name()).collect();
        for change in staged {
            change.publish();
        }
        tracing::trace!(tables = ?names, "Transaction committed");
        count
    }

    /// Discards every staged table
    pub fn rollback(self) {
        tracing::trace!(tables = self.staged.len(), "Transaction rolled back");
    }
}

/// Where a read looks for table contents
#[derive(Clone, Copy)]
pub enum View<'a> {
    /// Latest committed contents
    Committed,
    /// Contents as an open transaction sees them
    Pending(&'a Transaction),
}

impl View<'_> {
    pub fn load<T>(self, table: &Arc<Table<T>>) -> Arc<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        match self {
            View::Committed => table.snapshot(),
            View::Pending(tx) => tx.read(table),
        }
    }
}

/// Rows keyed by surrogate id with a monotonically increasing id counter
#[derive(Debug, Clone)]
pub struct RecordSet<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for RecordSet<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> RecordSet<T> {
    /// Allocates the next surrogate id and stores the row built from it
    pub fn insert_with(&mut self, build: impl FnOnce(i64) -> T) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.insert(id, build(id));
        id
    }

    /// Like [`RecordSet::insert_with`], returning the stored row
    pub fn create(&mut self, build: impl FnOnce(i64) -> T) -> &mut T {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.entry(id).or_insert(build(id))
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn remove(&mut self, id: i64) -> Option<T> {
        self.rows.remove(&id)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.rows.values_mut()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
