// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Per-context materializations of shared descriptors.

A [Contextualisation] is a resource like any other - it is registered into
its context and destroyed with it - plus the synchronization state machine:
it is either synchronized with its descriptor or not, and it remembers *when*
it last pulled, on a monotonic clock, so consumers can reason about freshness
windows independently of the boolean.
*/

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Error;
use crate::lifecycle::context::Context;
use crate::lifecycle::resource::{Resource, ResourceCore};
use crate::sync::descriptor::{Descriptor, DescriptorKey};

/// A point on the crate-wide monotonic synchronization clock.
///
/// Strictly increases across all `now` calls in the process; only ordering is
/// meaningful, never wall-clock duration.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Timestamp(u64);

static CLOCK: AtomicU64 = AtomicU64::new(1);

impl Timestamp {
    pub fn now() -> Self {
        Timestamp(CLOCK.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// The synchronization capability of a contextualisation, object-safe so a
/// context can hold contextualisations of unrelated descriptor kinds in one
/// map.
pub trait Contextualised: Resource {
    fn descriptor_key(&self) -> DescriptorKey;

    /// Moves to the Desynchronized state. The only way out of Synchronized;
    /// models "the descriptor's authoritative state changed".
    fn mark_desynchronized(&self);

    /// Pulls the descriptor's current state and moves to Synchronized.
    fn synchronize(&self);

    fn is_synchronized(&self) -> bool;

    /// When this contextualisation last pulled, independent of the boolean
    /// state.
    fn last_synchronized(&self) -> Timestamp;
}

/// The materialization of one [Descriptor] in one [Context].
///
/// Construction pulls an initial snapshot, so a fresh contextualisation
/// starts Synchronized. At most one may exist per descriptor per context;
/// a second attempt fails with [Error::AlreadyContextualised].
pub struct Contextualisation<D: Descriptor> {
    core: ResourceCore,
    descriptor: Arc<D>,
    state: Mutex<D::State>,
    synchronized: AtomicBool,
    pulled_at: AtomicU64,
}

impl<D: Descriptor> Contextualisation<D> {
    /// Contextualises `descriptor` in `context`.
    ///
    /// Registers the result into the context as part of construction; any
    /// registration failure fails the construction, so no contextualisation
    /// is ever observable unregistered.
    pub fn new(descriptor: &Arc<D>, context: &Context) -> Result<Arc<Self>, Error> {
        let contextualisation = Arc::new(Contextualisation {
            core: ResourceCore::new(context),
            descriptor: descriptor.clone(),
            state: Mutex::new(descriptor.snapshot()),
            synchronized: AtomicBool::new(true),
            pulled_at: AtomicU64::new(Timestamp::now().raw()),
        });
        context.add(contextualisation.clone())?;
        Ok(contextualisation)
    }

    /// The descriptor this contextualisation materializes.
    pub fn descriptor(&self) -> &Arc<D> {
        &self.descriptor
    }

    /// The state pulled at the last synchronization point.
    pub fn state(&self) -> MutexGuard<'_, D::State> {
        self.state.lock().unwrap()
    }

    /// Pulls the descriptor's current state, records the pull time, and
    /// marks this contextualisation synchronized.
    pub fn pull(&self) {
        let fresh = self.descriptor.snapshot();
        *self.state.lock().unwrap() = fresh;
        self.pulled_at.store(Timestamp::now().raw(), Ordering::Release);
        self.synchronized.store(true, Ordering::Release);
    }
}

impl<D: Descriptor> Resource for Contextualisation<D> {
    fn core(&self) -> &ResourceCore {
        &self.core
    }

    /// Contextualises the same descriptor in `target`, pulling the
    /// descriptor's current state.
    fn clone_into(&self, target: &Context) -> Result<Arc<dyn Resource>, Error> {
        if self.destroyed() {
            return Err(Error::ResourceAlreadyDestroyed);
        }
        let clone = Contextualisation::new(&self.descriptor, target)?;
        Ok(clone)
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn as_contextualised(self: Arc<Self>) -> Option<Arc<dyn Contextualised>> {
        Some(self)
    }
}

impl<D: Descriptor> Contextualised for Contextualisation<D> {
    fn descriptor_key(&self) -> DescriptorKey {
        DescriptorKey::of(&self.descriptor)
    }

    fn mark_desynchronized(&self) {
        self.synchronized.store(false, Ordering::Release);
    }

    fn synchronize(&self) {
        self.pull();
    }

    fn is_synchronized(&self) -> bool {
        self.synchronized.load(Ordering::Acquire)
    }

    fn last_synchronized(&self) -> Timestamp {
        Timestamp(self.pulled_at.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_strictly_increase() {
        let first = Timestamp::now();
        let second = Timestamp::now();
        let third = Timestamp::now();
        assert!(first < second);
        assert!(second < third);
    }
}
