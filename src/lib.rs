// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! contexts_and_resources is lifecycle-bookkeeping middleware for rendering
contexts and the GPU-adjacent resources bound to them.

It does not render anything and it does not interpret what a resource means
(shader, buffer, texture, ...). It answers three narrower questions that every
renderer otherwise reimplements by hand:

1. **Which resources exist, and who owns them?** Every [Resource] is bound to
   exactly one [Context] for its whole life. Destroying a resource removes it
   from its context; destroying or clearing a context destroys everything it
   tracks. Contexts can be duplicated, cloning each tracked resource into the
   duplicate.

2. **How do shared descriptions stay in sync with per-context state?** A
   [Descriptor] is a context-independent description that may be materialized
   at most once per context as a [Contextualisation]. Mutating the descriptor
   and calling [ContextManager::commit] marks every materialization
   out-of-sync; [ContextManager::push] pulls the descriptor's current state
   back into each of them.

3. **How do small integer handles get assigned and reused?** The
   [IdentifierRegistry] is a packed, swap-remove store that mints, reuses and
   revokes identifiers in O(1), with explicit capacity management. Contexts
   use it to name their resources, and it is exported for registering
   anything else [Identifiable].

# Threading

The intended scheduling model is one logical owner thread per context; no
operation blocks, suspends, or retries. State is still guarded (a mutex per
context, an independent one for the manager's context set) so that handing a
context to another owner is not instant UB.

# The rendering handle

A [Context] wraps an opaque [RenderingHandle] supplied at construction time,
typically by a windowing/surface collaborator behind the [view::HandleProvider]
boundary. The core stores it and forwards it on duplication; it never looks
inside.
*/

pub mod error;
pub mod identifier_registry;
pub mod lifecycle;
pub mod sync;
pub mod view;

pub use error::Error;
pub use identifier_registry::{Identifiable, Identifier, IdentifierRegistry};
pub use lifecycle::context::{Context, ContextManager, RenderingHandle};
pub use lifecycle::resource::{Resource, ResourceCore};
pub use sync::contextualisation::{Contextualisation, Contextualised, Timestamp};
pub use sync::descriptor::{Descriptor, DescriptorKey};
pub use view::{ContextOptions, HandleProvider, ViewConfiguration};
