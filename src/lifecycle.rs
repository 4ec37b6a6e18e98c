// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Context/resource ownership and cascading destruction.

A [context::Context] is the sole authority over which resources are alive for
its underlying rendering handle; a [resource::Resource] is anything whose life
is tied to exactly one context. The [context::ContextManager] owns the set of
live contexts and hosts the commit/push broadcasts of
[crate::sync].
*/

pub mod context;
pub mod resource;
