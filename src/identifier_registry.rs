// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A packed registry assigning small integer identifiers to elements.

This is the identifier-management workhorse of the crate: contexts use it to
name their resources, and it is exported for registering anything else that
can report an identifier.

The layout is an arena-with-indices. Identifiers live in a dense permutation
array whose first `len` entries are the currently used identifiers; a sparse
side table maps each identifier back to its current slot. Elements are stored
in a parallel dense vector, so `add`, `delete`, and both lookups are O(1).
Deletion swap-fills the freed slot from the end, which means iteration order
is not stable across structural mutation - callers must not rely on it.

Freed identifiers are reused before new ones are minted, most recently freed
first.
*/

use std::fmt::{Debug, Display, Formatter};

use crate::error::Error;

/// A small integer handle naming a registered element.
///
/// Identifiers are only unique within one registry instance. The reserved
/// value [Identifier::NULL] means "unassigned".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Identifier(u32);

impl Identifier {
    /// The reserved "unassigned" identifier.
    pub const NULL: Identifier = Identifier(u32::MAX);

    pub const fn new(raw: u32) -> Self {
        Identifier(raw)
    }

    pub const fn is_null(self) -> bool {
        self.0 == u32::MAX
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "NULL")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// An element that can live in an [IdentifierRegistry].
///
/// `same_instance` is identity, not value equality: two elements that merely
/// carry equal identifiers are not the same instance. The registry relies on
/// this to refuse deleting a stale handle after its identifier was reused.
pub trait Identifiable {
    fn identifier(&self) -> Identifier;
    fn same_instance(&self, other: &Self) -> bool;
}

// The sparse-set allocator underneath the registry. `dense` is a permutation
// of 0..capacity whose first `used` entries are the identifiers currently in
// use; `sparse[identifier]` is that identifier's slot in `dense`. Releasing
// an identifier parks it at slot `used`, so it is the next one handed out.
#[derive(Debug, Clone)]
struct IdentifierPool {
    dense: Vec<u32>,
    sparse: Vec<u32>,
    used: usize,
}

impl IdentifierPool {
    fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity < u32::MAX as usize,
            "identifier pool capacity must stay below the NULL identifier"
        );
        IdentifierPool {
            dense: (0..capacity as u32).collect(),
            sparse: (0..capacity as u32).collect(),
            used: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.dense.len()
    }

    /// Slot of `identifier` in the packed region, if it is in use.
    fn slot_of(&self, identifier: u32) -> Option<usize> {
        let slot = *self.sparse.get(identifier as usize)? as usize;
        (slot < self.used).then_some(slot)
    }

    fn at(&self, slot: usize) -> u32 {
        self.dense[slot]
    }

    /// Hands out the next available identifier. Caller ensures spare capacity.
    fn next(&mut self) -> u32 {
        debug_assert!(self.used < self.capacity());
        let identifier = self.dense[self.used];
        self.used += 1;
        identifier
    }

    /// Marks a specific identifier as used. Caller ensures it is in range and
    /// currently free.
    fn mark_used(&mut self, identifier: u32) {
        let slot = self.sparse[identifier as usize] as usize;
        debug_assert!(slot >= self.used);
        self.swap_slots(slot, self.used);
        self.used += 1;
    }

    /// Releases a used identifier, returning the packed slot it vacated.
    fn release(&mut self, identifier: u32) -> usize {
        let slot = self.sparse[identifier as usize] as usize;
        debug_assert!(slot < self.used);
        self.used -= 1;
        self.swap_slots(slot, self.used);
        slot
    }

    fn swap_slots(&mut self, left: usize, right: usize) {
        let (a, b) = (self.dense[left], self.dense[right]);
        self.dense.swap(left, right);
        self.sparse[a as usize] = right as u32;
        self.sparse[b as usize] = left as u32;
    }

    fn clear(&mut self) {
        self.used = 0;
    }

    fn reallocate(&mut self, capacity: usize) {
        assert!(
            capacity < u32::MAX as usize,
            "identifier pool capacity must stay below the NULL identifier"
        );
        if capacity >= self.capacity() {
            for identifier in self.capacity() as u32..capacity as u32 {
                self.dense.push(identifier);
                self.sparse.push(identifier);
            }
        } else {
            // Keep the surviving used identifiers first, in their packed
            // order, then the surviving free ones in their current order.
            let mut rebuilt = Vec::with_capacity(capacity);
            rebuilt.extend(
                self.dense[..self.used]
                    .iter()
                    .copied()
                    .filter(|&identifier| (identifier as usize) < capacity),
            );
            let used = rebuilt.len();
            rebuilt.extend(
                self.dense[self.used..]
                    .iter()
                    .copied()
                    .filter(|&identifier| (identifier as usize) < capacity),
            );
            debug_assert_eq!(rebuilt.len(), capacity);
            self.sparse = vec![0; capacity];
            for (slot, &identifier) in rebuilt.iter().enumerate() {
                self.sparse[identifier as usize] = slot as u32;
            }
            self.dense = rebuilt;
            self.used = used;
        }
    }
}

/// A dense, packed collection assigning, reusing and revoking [Identifier]s
/// for registered elements.
///
/// Invariants, maintained across every operation:
/// - used identifiers and stored elements are in bijection,
/// - elements occupy the first `len` dense slots with no gaps,
/// - a delete performs exactly one swap-fill and disturbs nothing else.
pub struct IdentifierRegistry<E> {
    pool: IdentifierPool,
    // elements[slot] is registered under pool.dense[slot]
    elements: Vec<E>,
}

impl<E: Identifiable> IdentifierRegistry<E> {
    /// An empty registry with the requested pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        IdentifierRegistry {
            pool: IdentifierPool::with_capacity(capacity),
            elements: Vec::with_capacity(capacity),
        }
    }

    /// The number of pre-allocated identifiers.
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// The number of registered elements.
    pub fn len(&self) -> usize {
        self.pool.used
    }

    pub fn is_empty(&self) -> bool {
        self.pool.used == 0
    }

    /// Adds an element and returns the identifier it is registered under.
    ///
    /// An element declaring [Identifier::NULL] gets the next available
    /// identifier, reusing freed ones before minting new ones; the caller
    /// must self-assign the returned identifier back onto the element. An
    /// element declaring a concrete identifier is registered under exactly
    /// that identifier, or the call fails with [Error::DuplicateIdentifier]
    /// and the registry is left unchanged.
    ///
    /// A full registry grows transparently before inserting.
    pub fn add(&mut self, element: E) -> Result<Identifier, Error> {
        let declared = element.identifier();
        if declared.is_null() {
            if self.len() == self.capacity() {
                self.reallocate(self.grown_capacity());
            }
            let assigned = self.pool.next();
            self.elements.push(element);
            Ok(Identifier::new(assigned))
        } else {
            if self.pool.slot_of(declared.raw()).is_some() {
                return Err(Error::DuplicateIdentifier(declared));
            }
            if declared.raw() as usize >= self.capacity() {
                self.reallocate((declared.raw() as usize + 1).max(self.grown_capacity()));
            }
            self.pool.mark_used(declared.raw());
            self.elements.push(element);
            Ok(declared)
        }
    }

    /// Deletes whatever is registered under `identifier`, returning it.
    ///
    /// Deleting an unused identifier is a no-op returning `None`; nothing
    /// else is disturbed.
    pub fn delete(&mut self, identifier: Identifier) -> Option<E> {
        let slot = self.pool.slot_of(identifier.raw())?;
        self.pool.release(identifier.raw());
        Some(self.elements.swap_remove(slot))
    }

    /// Deletes `element` only if the registered entry is the same instance.
    ///
    /// A stale handle whose identifier was reused for another element deletes
    /// nothing.
    pub fn delete_element(&mut self, element: &E) -> Option<E> {
        let identifier = element.identifier();
        let slot = self.pool.slot_of(identifier.raw())?;
        if !self.elements[slot].same_instance(element) {
            return None;
        }
        self.pool.release(identifier.raw());
        Some(self.elements.swap_remove(slot))
    }

    /// Looks an element up by identifier.
    pub fn get(&self, identifier: Identifier) -> Option<&E> {
        let slot = self.pool.slot_of(identifier.raw())?;
        Some(&self.elements[slot])
    }

    /// Looks an element up by packed position.
    pub fn nth(&self, index: usize) -> Option<&E> {
        self.elements.get(index)
    }

    /// True if `identifier` is currently in use.
    pub fn has_identifier(&self, identifier: Identifier) -> bool {
        !identifier.is_null() && self.pool.slot_of(identifier.raw()).is_some()
    }

    /// True if `element`'s identifier is in use *and* the registered entry is
    /// the same instance.
    pub fn has(&self, element: &E) -> bool {
        self.pool
            .slot_of(element.identifier().raw())
            .is_some_and(|slot| self.elements[slot].same_instance(element))
    }

    /// An iterator over all used identifiers, in packed order.
    pub fn identifiers(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.pool.dense[..self.pool.used]
            .iter()
            .map(|&raw| Identifier::new(raw))
    }

    /// An iterator over all registered elements, in packed order.
    pub fn values(&self) -> impl Iterator<Item = &E> {
        self.elements.iter()
    }

    /// Grows or shrinks the backing storage.
    ///
    /// Growing preserves every identifier-to-element association. Shrinking
    /// evicts exactly the elements whose identifier no longer fits
    /// (`identifier >= capacity`) and compacts the remainder, preserving
    /// their identifiers and relative packed order.
    pub fn reallocate(&mut self, capacity: usize) {
        if capacity < self.capacity() {
            let mut retained = Vec::with_capacity(capacity.min(self.elements.len()));
            let mut evicted = 0usize;
            for (slot, element) in self.elements.drain(..).enumerate() {
                if (self.pool.at(slot) as usize) < capacity {
                    retained.push(element);
                } else {
                    evicted += 1;
                }
            }
            if evicted > 0 {
                logwise::warn_sync!(
                    "registry shrink to capacity {capacity} evicted {evicted} elements",
                    capacity = capacity,
                    evicted = evicted
                );
            }
            self.elements = retained;
        }
        self.pool.reallocate(capacity);
    }

    /// Evicts everything; capacity is retained.
    pub fn clear(&mut self) {
        self.pool.clear();
        self.elements.clear();
    }

    fn grown_capacity(&self) -> usize {
        (self.capacity() * 2).max(1)
    }
}

impl<E: Identifiable> Default for IdentifierRegistry<E> {
    /// An empty registry with the default capacity of 32.
    fn default() -> Self {
        Self::with_capacity(32)
    }
}

/// Two registries are equal iff they have equal size and every element of one
/// is present, by identifier and instance, in the other.
impl<E: Identifiable> PartialEq for IdentifierRegistry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.values().all(|element| other.has(element))
    }
}

impl<E: Identifiable> Debug for IdentifierRegistry<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifierRegistry")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
