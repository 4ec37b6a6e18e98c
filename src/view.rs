// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The boundary to surface/view construction.

Building the actual surface and the raw graphics context is an external
concern; this module only fixes the shape of that boundary. A caller
describes what it wants with a partial [ViewConfiguration], the core merges
it with the documented defaults into [ContextOptions], and a
[HandleProvider] turns the merged options into the opaque handle a context
wraps - or reports that no usable graphics context is available.
*/

use crate::error::Error;
use crate::lifecycle::context::RenderingHandle;

/// Partial surface options; unset fields take the documented defaults.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ViewConfiguration {
    pub alpha: Option<bool>,
    pub depth: Option<bool>,
    pub stencil: Option<bool>,
    pub antialias: Option<bool>,
}

impl ViewConfiguration {
    /// Merges this configuration with the defaults.
    pub fn resolve(&self) -> ContextOptions {
        let defaults = ContextOptions::default();
        ContextOptions {
            alpha: self.alpha.unwrap_or(defaults.alpha),
            depth: self.depth.unwrap_or(defaults.depth),
            stencil: self.stencil.unwrap_or(defaults.stencil),
            antialias: self.antialias.unwrap_or(defaults.antialias),
        }
    }
}

/// Fully resolved surface options, forwarded verbatim to the provider.
///
/// The effects of these flags are entirely delegated to the external
/// graphics API; the core never interprets them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ContextOptions {
    pub alpha: bool,
    pub depth: bool,
    pub stencil: bool,
    pub antialias: bool,
}

impl Default for ContextOptions {
    /// `alpha=true, depth=true, stencil=false, antialias=true`.
    fn default() -> Self {
        ContextOptions {
            alpha: true,
            depth: true,
            stencil: false,
            antialias: true,
        }
    }
}

/// The external collaborator that obtains rendering handles.
///
/// Implementations should fail with [Error::NoGraphicsContextAvailable] when
/// no usable handle can be produced; the core propagates that error without
/// retrying.
pub trait HandleProvider {
    fn create_handle(&self, options: &ContextOptions) -> Result<RenderingHandle, Error>;
}
