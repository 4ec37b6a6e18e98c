// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The base lifecycle contract shared by everything a context tracks.

Concrete resource types embed a [ResourceCore] and implement [Resource] over
it. The construction protocol is: build the `Arc`, then register it with
[Context::add](crate::Context::add) before letting it escape - a failed
registration must fail the whole construction, so no resource is ever
observable in an unregistered state. See
[Contextualisation::new](crate::Contextualisation::new) for the canonical
shape.
*/

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};

use crate::error::Error;
use crate::identifier_registry::{Identifiable, Identifier};
use crate::lifecycle::context::{Context, ContextShared};
use crate::sync::contextualisation::Contextualised;

/// The per-instance lifecycle state every resource carries.
///
/// Binds the resource to its owning context, records the identifier the
/// context assigned it, and holds the monotonic destroyed flag.
#[derive(Debug)]
pub struct ResourceCore {
    context: Weak<ContextShared>,
    identifier: AtomicU32,
    destroyed: AtomicBool,
}

impl ResourceCore {
    /// A core bound to `context`, not yet registered or destroyed.
    pub fn new(context: &Context) -> Self {
        ResourceCore {
            context: context.downgrade(),
            identifier: AtomicU32::new(Identifier::NULL.raw()),
            destroyed: AtomicBool::new(false),
        }
    }

    /// The owning context, if it is still allocated.
    ///
    /// The binding itself is permanent; this returns `None` only once the
    /// context has been destroyed and every handle to it dropped.
    pub fn context(&self) -> Option<Context> {
        self.context.upgrade().map(Context::from_shared)
    }

    /// The identifier the owning context registered this resource under, or
    /// [Identifier::NULL] before registration.
    pub fn identifier(&self) -> Identifier {
        Identifier::new(self.identifier.load(Ordering::Acquire))
    }

    pub fn destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    pub(crate) fn assign_identifier(&self, identifier: Identifier) {
        self.identifier.store(identifier.raw(), Ordering::Release);
    }

    /// Claims the destroy transition; false if someone already did.
    pub(crate) fn begin_destroy(&self) -> bool {
        !self.destroyed.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn owned_by(&self, shared: &Arc<ContextShared>) -> bool {
        std::ptr::eq(self.context.as_ptr(), Arc::as_ptr(shared))
    }
}

/// The minimal contract for anything a [Context] tracks.
///
/// `destroy`, `identifier` and `destroyed` are provided over [ResourceCore];
/// implementors supply the core accessor, the cross-context copy, and the
/// `Any` bridge (invariably `{ self }`).
pub trait Resource: Send + Sync + 'static {
    fn core(&self) -> &ResourceCore;

    /// Constructs a structural copy of this resource bound to `target`.
    ///
    /// Fails with [Error::ResourceAlreadyDestroyed] if this resource was
    /// destroyed, and with whatever the target context's registration
    /// refuses.
    fn clone_into(&self, target: &Context) -> Result<Arc<dyn Resource>, Error>;

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// The synchronization capability, for resources that materialize a
    /// descriptor.
    fn as_contextualised(self: Arc<Self>) -> Option<Arc<dyn Contextualised>> {
        None
    }

    fn identifier(&self) -> Identifier {
        self.core().identifier()
    }

    fn destroyed(&self) -> bool {
        self.core().destroyed()
    }

    /// Marks this resource destroyed and asks the owning context to forget
    /// it. Re-destroying is a no-op.
    fn destroy(&self) {
        if self.core().begin_destroy() {
            if let Some(context) = self.core().context() {
                context.forget(self.core());
            }
        }
    }
}

impl Identifiable for Arc<dyn Resource> {
    fn identifier(&self) -> Identifier {
        self.core().identifier()
    }

    fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}
