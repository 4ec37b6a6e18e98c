// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Crate-wide error type.

Every variant here is a programming-contract violation rather than a
recoverable runtime condition. Callers are expected to check preconditions
(`destroyed`, ownership) before calling; the API still validates them and
reports violations synchronously, never swallowing or retrying.
*/

use crate::identifier_registry::Identifier;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    ///A mutating operation was called on a context after
    ///[destroy](crate::Context::destroy).
    #[error("this context was already destroyed")]
    ContextDestroyed,
    ///A destroyed resource was registered, or cloned into another context.
    #[error("this resource was already destroyed")]
    ResourceAlreadyDestroyed,
    ///A resource constructed for one context was added to a different one.
    #[error("this resource was instantiated for another context")]
    ForeignResource,
    ///An element declared an identifier that is already in use in the
    ///registry it was added to.
    #[error("identifier {0} is already in use by another element")]
    DuplicateIdentifier(Identifier),
    ///A second contextualisation of the same descriptor was created in one
    ///context.
    #[error("this descriptor was already contextualised in this context")]
    AlreadyContextualised,
    ///The external handle-creation collaborator could not obtain a usable
    ///rendering handle. Propagated from [HandleProvider](crate::HandleProvider)
    ///implementations, never produced by the core.
    #[error("no graphics context available: {0}")]
    NoGraphicsContextAvailable(String),
}
