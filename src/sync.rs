// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The descriptor/contextualisation synchronization protocol.

A [descriptor::Descriptor] is created once and shared; each context holds at
most one [contextualisation::Contextualisation] of it. Mutating the descriptor
followed by [ContextManager::commit](crate::ContextManager::commit) marks
every existing contextualisation out-of-sync;
[ContextManager::push](crate::ContextManager::push) pulls the descriptor's
current state back into each one. Within one owner thread, a commit strictly
precedes any push that observes it.
*/

pub mod contextualisation;
pub mod descriptor;
