//! Fixed-capacity connection slot table.
//!
//! Capacity is set at startup. Each slot is either free (`None`) or held by exactly one
//! active connection.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

pub type SlotId = usize;

#[derive(Debug)]
pub struct SlotTable<T> {
    slots: Vec<Option<T>>,
}

impl<T> SlotTable<T> {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Places `item` in the first free slot. Hands the item back when the table is full.
    pub fn acquire(&mut self, item: T) -> Result<SlotId, T> {
        match self.slots.iter().position(Option::is_none) {
            Some(id) => {
                self.slots[id] = Some(item);
                trace!(slot = id, "slot acquired");
                Ok(id)
            }
            None => Err(item),
        }
    }

    /// Frees slot `id`, returning what occupied it.
    pub fn release(&mut self, id: SlotId) -> Option<T> {
        let item = self.slots.get_mut(id)?.take();
        if item.is_some() {
            trace!(slot = id, "slot released");
        }
        item
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots.get(id)?.as_ref()
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots.get_mut(id)?.as_mut()
    }
}

/// A slot table shared between the accept loop and connection tasks.
pub type SharedSlots<T> = Arc<Mutex<SlotTable<T>>>;

/// Holds a claimed slot and frees it when dropped.
#[derive(Debug)]
pub struct SlotGuard<T> {
    table: SharedSlots<T>,
    id: SlotId,
}

impl<T> SlotGuard<T> {
    /// Claims a slot in `table` for `item`, or returns `None` when every slot is taken.
    pub fn claim(table: &SharedSlots<T>, item: T) -> Option<Self> {
        let id = lock(table).acquire(item).ok()?;
        Some(Self {
            table: Arc::clone(table),
            id,
        })
    }

    pub fn id(&self) -> SlotId {
        self.id
    }
}

impl<T> Drop for SlotGuard<T> {
    fn drop(&mut self) {
        lock(&self.table).release(self.id);
    }
}

fn lock<T>(table: &SharedSlots<T>) -> MutexGuard<'_, SlotTable<T>> {
    // Slot updates are single assignments, a poisoned table is still consistent.
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
