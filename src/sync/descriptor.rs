// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The descriptor capability.

Anything context-independent that contexts materialize implements
[Descriptor]: it exposes a snapshot of its authoritative state (what a
contextualisation pulls), plus the copy/reset contract. Descriptors are
shared read-only across contexts - mutation happens through the concrete
type's own interior mutability, followed by an explicit
[commit](crate::ContextManager::commit).
*/

use std::sync::Arc;

/// A context-independent description that contexts may materialize, at most
/// once each.
pub trait Descriptor: Send + Sync + 'static {
    /// The state a contextualisation pulls. Snapshots are detached copies;
    /// holding one never observes later descriptor mutation.
    type State: Clone + PartialEq + Send + Sync + 'static;

    /// A snapshot of the current authoritative state.
    fn snapshot(&self) -> Self::State;

    /// Overwrites the authoritative state with a previously taken snapshot.
    fn restore(&self, state: &Self::State);

    /// Resets the authoritative state to its initial value.
    fn clear(&self);

    /// Copies another descriptor's current state into this one.
    fn copy_from(&self, other: &Self)
    where
        Self: Sized,
    {
        self.restore(&other.snapshot());
    }

    /// State equality between two descriptors of the same kind.
    fn state_eq(&self, other: &Self) -> bool
    where
        Self: Sized,
    {
        self.snapshot() == other.snapshot()
    }
}

/// Identity key for a shared descriptor, derived from its `Arc` allocation.
///
/// Valid for lookups while at least one contextualisation (which holds the
/// descriptor) is alive; heterogeneous over descriptor kinds, which is what
/// lets one context map contextualisations of unrelated descriptor types.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DescriptorKey(usize);

impl DescriptorKey {
    pub fn of<D: Descriptor>(descriptor: &Arc<D>) -> Self {
        DescriptorKey(Arc::as_ptr(descriptor) as *const () as usize)
    }
}
