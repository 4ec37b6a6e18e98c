// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Contexts and the manager that enumerates them.

A [Context] wraps one opaque rendering handle and owns every resource created
for it: a packed [IdentifierRegistry] of resources plus the
descriptor-to-contextualisation map that enforces the
one-contextualisation-per-descriptor invariant.

The [ContextManager] replaces what would otherwise be a process-wide set of
live contexts. It is owned by the application's composition root and passed
around explicitly; the commit/push broadcasts of the synchronization protocol
live on it because they must reach every live context.
*/

use std::any::Any;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::error::Error;
use crate::identifier_registry::IdentifierRegistry;
use crate::lifecycle::resource::{Resource, ResourceCore};
use crate::sync::contextualisation::{Contextualisation, Contextualised};
use crate::sync::descriptor::{Descriptor, DescriptorKey};
use crate::view::{HandleProvider, ViewConfiguration};

/// The opaque rendering-context handle a [Context] wraps.
///
/// Supplied at construction time by an external collaborator (see
/// [crate::view]); the core stores it and forwards it on [Context::duplicate],
/// never inspecting its contents.
pub type RenderingHandle = Arc<dyn Any + Send + Sync>;

/// Owns the set of live contexts and hosts the synchronization broadcasts.
///
/// Cheap to clone; clones share the same context set.
#[derive(Clone, Default)]
pub struct ContextManager {
    shared: Arc<ManagerShared>,
}

#[derive(Default)]
struct ManagerShared {
    contexts: Mutex<Vec<Arc<ContextShared>>>,
}

impl ContextManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a live context wrapping `handle`.
    pub fn create_context(&self, handle: RenderingHandle) -> Context {
        let shared = Arc::new(ContextShared {
            manager: self.clone(),
            handle,
            destroyed: AtomicBool::new(false),
            state: Mutex::new(ContextState {
                resources: IdentifierRegistry::default(),
                contextualisations: HashMap::new(),
            }),
        });
        let mut contexts = self.shared.contexts.lock().unwrap();
        contexts.push(shared.clone());
        logwise::trace_sync!(
            "created context ({live} live)",
            live = contexts.len()
        );
        drop(contexts);
        Context { shared }
    }

    /// Creates a context through the external handle-creation collaborator.
    ///
    /// Merges `configuration` with the documented defaults, forwards the
    /// result to `provider`, and propagates
    /// [Error::NoGraphicsContextAvailable] if it cannot obtain a handle.
    pub fn create_context_with(
        &self,
        provider: &dyn HandleProvider,
        configuration: &ViewConfiguration,
    ) -> Result<Context, Error> {
        let handle = provider.create_handle(&configuration.resolve())?;
        Ok(self.create_context(handle))
    }

    /// A snapshot of all currently live contexts.
    pub fn contexts(&self) -> Vec<Context> {
        self.shared
            .contexts
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .map(Context::from_shared)
            .collect()
    }

    /// Marks every live contextualisation of `descriptor` as out-of-sync.
    ///
    /// Call this after mutating the descriptor; it models "the authoritative
    /// state changed". A later [push](Self::push) re-synchronizes.
    pub fn commit<D: Descriptor>(&self, descriptor: &Arc<D>) {
        let key = DescriptorKey::of(descriptor);
        let mut reached = 0usize;
        for context in self.contexts() {
            if let Some(entry) = context.contextualised_entry(key) {
                entry.mark_desynchronized();
                reached += 1;
            }
        }
        logwise::trace_sync!(
            "commit reached {reached} contextualisations",
            reached = reached
        );
    }

    /// Pulls `descriptor`'s current state into every live contextualisation
    /// of it, marking each synchronized.
    ///
    /// The state observed is the descriptor's state at push time; a commit
    /// followed by further mutation and then a push never leaves a stale
    /// intermediate behind.
    pub fn push<D: Descriptor>(&self, descriptor: &Arc<D>) {
        let key = DescriptorKey::of(descriptor);
        let mut reached = 0usize;
        for context in self.contexts() {
            if let Some(entry) = context.contextualised_entry(key) {
                entry.synchronize();
                reached += 1;
            }
        }
        logwise::trace_sync!(
            "push reached {reached} contextualisations",
            reached = reached
        );
    }

    fn forget_context(&self, shared: &Arc<ContextShared>) {
        self.shared
            .contexts
            .lock()
            .unwrap()
            .retain(|candidate| !Arc::ptr_eq(candidate, shared));
    }
}

impl Debug for ContextManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextManager")
            .field("contexts", &self.shared.contexts.lock().unwrap().len())
            .finish()
    }
}

pub(crate) struct ContextShared {
    // Strong on purpose: a context deregisters itself on destroy, exactly
    // when the cycle with the manager's list must break.
    manager: ContextManager,
    handle: RenderingHandle,
    destroyed: AtomicBool,
    state: Mutex<ContextState>,
}

struct ContextState {
    resources: IdentifierRegistry<Arc<dyn Resource>>,
    contextualisations: HashMap<DescriptorKey, Arc<dyn Contextualised>>,
}

/// A handle to one live rendering context and the resources bound to it.
///
/// `Clone` here is the cheap alias clone; the deep cross-context copy is
/// [duplicate](Self::duplicate).
#[derive(Clone)]
pub struct Context {
    shared: Arc<ContextShared>,
}

impl Context {
    /// The opaque handle this context wraps.
    pub fn handle(&self) -> &RenderingHandle {
        &self.shared.handle
    }

    /// The manager this context was created by.
    pub fn manager(&self) -> ContextManager {
        self.shared.manager.clone()
    }

    /// True once [destroy](Self::destroy) has run; every mutating operation
    /// fails from then on.
    pub fn destroyed(&self) -> bool {
        self.shared.destroyed.load(Ordering::Acquire)
    }

    /// Registers `resource` with this context, assigning it an identifier.
    ///
    /// Fails with [Error::ContextDestroyed], [Error::ResourceAlreadyDestroyed]
    /// or [Error::ForeignResource] per the lifecycle contract. Adding a
    /// resource this context already tracks is a no-op. Registration is
    /// atomic: on failure nothing is partially registered.
    pub fn add(&self, resource: Arc<dyn Resource>) -> Result<(), Error> {
        if self.destroyed() {
            return Err(Error::ContextDestroyed);
        }
        let mut state = self.shared.state.lock().unwrap();

        let declared = resource.core().identifier();
        if !declared.is_null()
            && let Some(existing) = state.resources.get(declared)
            && Arc::ptr_eq(existing, &resource)
        {
            return Ok(());
        }
        if resource.destroyed() {
            return Err(Error::ResourceAlreadyDestroyed);
        }
        if !resource.core().owned_by(&self.shared) {
            return Err(Error::ForeignResource);
        }
        let contextualised = resource.clone().as_contextualised();
        if let Some(ref entry) = contextualised
            && state
                .contextualisations
                .contains_key(&entry.descriptor_key())
        {
            return Err(Error::AlreadyContextualised);
        }

        let assigned = state.resources.add(resource.clone())?;
        resource.core().assign_identifier(assigned);
        if let Some(entry) = contextualised {
            state.contextualisations.insert(entry.descriptor_key(), entry);
        }
        Ok(())
    }

    /// Removes `resource` from tracking and destroys it if it is not
    /// destroyed already.
    pub fn delete(&self, resource: &dyn Resource) -> Result<(), Error> {
        if self.destroyed() {
            return Err(Error::ContextDestroyed);
        }
        self.forget(resource.core());
        if !resource.destroyed() {
            resource.destroy();
        }
        Ok(())
    }

    /// Destroys and removes every tracked resource.
    pub fn clear(&self) -> Result<(), Error> {
        if self.destroyed() {
            return Err(Error::ContextDestroyed);
        }
        // Snapshot first: each destroy removes the resource from the tracked
        // set as a side effect.
        let snapshot: Vec<Arc<dyn Resource>> = self.resources();
        for resource in snapshot {
            resource.destroy();
        }
        Ok(())
    }

    /// A structurally equivalent copy of this context at this moment.
    ///
    /// Produces a new live context forwarding this one's handle, then asks
    /// every tracked resource to clone itself into it. The result is not a
    /// live view; later changes to either context do not affect the other.
    pub fn duplicate(&self) -> Result<Context, Error> {
        if self.destroyed() {
            return Err(Error::ContextDestroyed);
        }
        let duplicate = self
            .shared
            .manager
            .create_context(self.shared.handle.clone());
        for resource in self.resources() {
            Resource::clone_into(&*resource, &duplicate)?;
        }
        Ok(duplicate)
    }

    /// Destroys every tracked resource, deregisters this context from its
    /// manager, and marks it destroyed.
    ///
    /// A second call fails with [Error::ContextDestroyed].
    pub fn destroy(&self) -> Result<(), Error> {
        self.clear()?;
        self.shared.manager.forget_context(&self.shared);
        self.shared.destroyed.store(true, Ordering::Release);
        logwise::info_sync!("destroyed context");
        Ok(())
    }

    /// A snapshot of every resource this context currently tracks.
    pub fn resources(&self) -> Vec<Arc<dyn Resource>> {
        self.shared
            .state
            .lock()
            .unwrap()
            .resources
            .values()
            .cloned()
            .collect()
    }

    /// The number of resources this context currently tracks.
    pub fn resource_count(&self) -> usize {
        self.shared.state.lock().unwrap().resources.len()
    }

    /// True if this exact resource instance is currently tracked here.
    pub fn tracks(&self, resource: &dyn Resource) -> bool {
        let state = self.shared.state.lock().unwrap();
        state
            .resources
            .get(resource.core().identifier())
            .is_some_and(|element| std::ptr::eq(element.core(), resource.core()))
    }

    /// Explicitly contextualises `descriptor` here.
    ///
    /// Fails with [Error::AlreadyContextualised] if this context already
    /// holds a contextualisation of it.
    pub fn contextualise<D: Descriptor>(
        &self,
        descriptor: &Arc<D>,
    ) -> Result<Arc<Contextualisation<D>>, Error> {
        Contextualisation::new(descriptor, self)
    }

    /// The contextualisation of `descriptor` here, created lazily if absent.
    pub fn contextualisation<D: Descriptor>(
        &self,
        descriptor: &Arc<D>,
    ) -> Result<Arc<Contextualisation<D>>, Error> {
        if let Some(existing) = self.contextualisation_of(descriptor) {
            return Ok(existing);
        }
        Contextualisation::new(descriptor, self)
    }

    /// The existing contextualisation of `descriptor` here, if any.
    pub fn contextualisation_of<D: Descriptor>(
        &self,
        descriptor: &Arc<D>,
    ) -> Option<Arc<Contextualisation<D>>> {
        let entry = self.contextualised_entry(DescriptorKey::of(descriptor))?;
        entry.as_any().downcast::<Contextualisation<D>>().ok()
    }

    pub(crate) fn contextualised_entry(
        &self,
        key: DescriptorKey,
    ) -> Option<Arc<dyn Contextualised>> {
        self.shared
            .state
            .lock()
            .unwrap()
            .contextualisations
            .get(&key)
            .cloned()
    }

    /// Drops `core`'s resource from tracking, if this exact instance is
    /// tracked. Tolerant of misses: the destroy cascade may call it for
    /// resources that were already removed.
    pub(crate) fn forget(&self, core: &ResourceCore) {
        let mut state = self.shared.state.lock().unwrap();
        let identifier = core.identifier();
        if identifier.is_null() {
            return;
        }
        let matches = state
            .resources
            .get(identifier)
            .is_some_and(|element| std::ptr::eq(element.core(), core));
        if !matches {
            return;
        }
        if let Some(element) = state.resources.delete(identifier)
            && let Some(entry) = element.as_contextualised()
        {
            state.contextualisations.remove(&entry.descriptor_key());
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<ContextShared> {
        Arc::downgrade(&self.shared)
    }

    pub(crate) fn from_shared(shared: Arc<ContextShared>) -> Self {
        Context { shared }
    }
}

/// Identity, not structure: two handles are equal iff they refer to the same
/// live context.
impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}
impl Eq for Context {}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("destroyed", &self.destroyed())
            .field("resources", &self.resource_count())
            .finish()
    }
}
