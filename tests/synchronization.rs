// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Descriptor/contextualisation synchronization protocol tests.

use std::sync::{Arc, Mutex};

use contexts_and_resources::{
    Context, ContextManager, Contextualisation, Contextualised, Descriptor, Error,
    RenderingHandle, Resource,
};

/// A shared description of a clear color, mutated externally then committed.
struct ClearColor {
    value: Mutex<[u8; 4]>,
}

impl ClearColor {
    fn new(value: [u8; 4]) -> Arc<Self> {
        Arc::new(ClearColor {
            value: Mutex::new(value),
        })
    }

    fn set(&self, value: [u8; 4]) {
        *self.value.lock().unwrap() = value;
    }
}

impl Descriptor for ClearColor {
    type State = [u8; 4];

    fn snapshot(&self) -> [u8; 4] {
        *self.value.lock().unwrap()
    }

    fn restore(&self, state: &[u8; 4]) {
        *self.value.lock().unwrap() = *state;
    }

    fn clear(&self) {
        *self.value.lock().unwrap() = [0; 4];
    }
}

fn handle() -> RenderingHandle {
    Arc::new("fake rendering handle")
}

fn context(manager: &ContextManager) -> Context {
    manager.create_context(handle())
}

#[test]
fn fresh_contextualisation_starts_synchronized() {
    let manager = ContextManager::new();
    let context = context(&manager);
    let descriptor = ClearColor::new([1, 2, 3, 4]);

    let contextualisation = context.contextualise(&descriptor).unwrap();
    assert!(contextualisation.is_synchronized());
    assert_eq!(*contextualisation.state(), [1, 2, 3, 4]);
    assert!(context.tracks(&*contextualisation));
}

#[test]
fn one_contextualisation_per_descriptor_per_context() {
    let manager = ContextManager::new();
    let first_context = context(&manager);
    let second_context = context(&manager);
    let descriptor = ClearColor::new([0; 4]);

    first_context.contextualise(&descriptor).unwrap();
    assert!(matches!(
        first_context.contextualise(&descriptor),
        Err(Error::AlreadyContextualised)
    ));
    // the failed attempt registered nothing
    assert_eq!(first_context.resource_count(), 1);

    // a different context is fine
    second_context.contextualise(&descriptor).unwrap();
    assert_eq!(second_context.resource_count(), 1);
}

#[test]
fn lazy_contextualisation_returns_the_existing_instance() {
    let manager = ContextManager::new();
    let context = context(&manager);
    let descriptor = ClearColor::new([0; 4]);

    let first = context.contextualisation(&descriptor).unwrap();
    let second = context.contextualisation(&descriptor).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(context.resource_count(), 1);

    assert!(context.contextualisation_of(&descriptor).is_some());
}

#[test]
fn commit_then_push_across_all_live_contexts() {
    let manager = ContextManager::new();
    let contexts = [context(&manager), context(&manager), context(&manager)];
    let descriptor = ClearColor::new([10, 10, 10, 10]);

    let contextualisations: Vec<Arc<Contextualisation<ClearColor>>> = contexts
        .iter()
        .map(|context| context.contextualise(&descriptor).unwrap())
        .collect();
    let created_at: Vec<_> = contextualisations
        .iter()
        .map(|c| c.last_synchronized())
        .collect();

    descriptor.set([20, 20, 20, 20]);
    manager.commit(&descriptor);
    for contextualisation in &contextualisations {
        assert!(!contextualisation.is_synchronized());
        // commit alone does not pull
        assert_eq!(*contextualisation.state(), [10, 10, 10, 10]);
    }

    manager.push(&descriptor);
    for (contextualisation, created) in contextualisations.iter().zip(&created_at) {
        assert!(contextualisation.is_synchronized());
        assert_eq!(*contextualisation.state(), [20, 20, 20, 20]);
        assert!(contextualisation.last_synchronized() > *created);
    }
}

#[test]
fn push_observes_the_latest_state_not_the_committed_one() {
    let manager = ContextManager::new();
    let context = context(&manager);
    let descriptor = ClearColor::new([1; 4]);
    let contextualisation = context.contextualise(&descriptor).unwrap();

    descriptor.set([2; 4]);
    manager.commit(&descriptor);
    // the descriptor moves on before anyone pushes
    descriptor.set([3; 4]);
    manager.push(&descriptor);

    assert_eq!(*contextualisation.state(), [3; 4]);
    assert!(contextualisation.is_synchronized());
}

#[test]
fn commit_skips_contexts_without_a_contextualisation() {
    let manager = ContextManager::new();
    let materialized = context(&manager);
    let _empty = context(&manager);
    let descriptor = ClearColor::new([0; 4]);
    let contextualisation = materialized.contextualise(&descriptor).unwrap();

    manager.commit(&descriptor);
    assert!(!contextualisation.is_synchronized());
    manager.push(&descriptor);
    assert!(contextualisation.is_synchronized());
}

#[test]
fn destroyed_contextualisation_frees_the_descriptor_slot() {
    let manager = ContextManager::new();
    let context = context(&manager);
    let descriptor = ClearColor::new([0; 4]);

    let first = context.contextualise(&descriptor).unwrap();
    first.destroy();
    assert!(context.contextualisation_of(&descriptor).is_none());

    // contextualising again is now allowed
    let second = context.contextualise(&descriptor).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn broadcasts_ignore_destroyed_contexts() {
    let manager = ContextManager::new();
    let survivor = context(&manager);
    let doomed = context(&manager);
    let descriptor = ClearColor::new([5; 4]);

    let surviving = survivor.contextualise(&descriptor).unwrap();
    let dying = doomed.contextualise(&descriptor).unwrap();
    doomed.destroy().unwrap();
    assert!(dying.destroyed());

    descriptor.set([6; 4]);
    manager.commit(&descriptor);
    manager.push(&descriptor);
    assert!(surviving.is_synchronized());
    assert_eq!(*surviving.state(), [6; 4]);
}

#[test]
fn duplication_contextualises_the_same_descriptor() {
    let manager = ContextManager::new();
    let source = context(&manager);
    let descriptor = ClearColor::new([7; 4]);
    source.contextualise(&descriptor).unwrap();

    descriptor.set([8; 4]);
    let duplicate = source.duplicate().unwrap();

    let copied = duplicate.contextualisation_of(&descriptor).unwrap();
    assert!(Arc::ptr_eq(copied.descriptor(), &descriptor));
    assert!(copied.is_synchronized());
    // the copy pulled the descriptor's state at duplication time
    assert_eq!(*copied.state(), [8; 4]);
}

#[test]
fn descriptor_copy_and_reset_contract() {
    let left = ClearColor::new([1, 2, 3, 4]);
    let right = ClearColor::new([0; 4]);
    assert!(!left.state_eq(&right));

    right.copy_from(&left);
    assert!(left.state_eq(&right));
    assert_eq!(right.snapshot(), [1, 2, 3, 4]);

    right.clear();
    assert_eq!(right.snapshot(), [0; 4]);
}

#[test]
fn manual_pull_updates_state_and_timestamp() {
    let manager = ContextManager::new();
    let context = context(&manager);
    let descriptor = ClearColor::new([1; 4]);
    let contextualisation = context.contextualise(&descriptor).unwrap();
    let before = contextualisation.last_synchronized();

    descriptor.set([9; 4]);
    contextualisation.mark_desynchronized();
    assert_eq!(contextualisation.last_synchronized(), before);

    contextualisation.pull();
    assert!(contextualisation.is_synchronized());
    assert_eq!(*contextualisation.state(), [9; 4]);
    assert!(contextualisation.last_synchronized() > before);
}
