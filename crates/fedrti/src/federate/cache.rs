// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Federate-local cache of broker state.
//!
//! Updated only when broker messages (replies or events) are applied. A
//! local request never changes it before the broker has answered.

use crate::handles::{
    AttributeHandle, FederateHandle, FederationHandle, InteractionClassHandle, ObjectClassHandle,
    ObjectHandle,
};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedObject {
    pub class: ObjectClassHandle,
    pub name: String,
    /// Registered by this federate (as opposed to discovered).
    pub local: bool,
    pub owned: BTreeSet<AttributeHandle>,
}

/// Advisory switches as last acknowledged by the broker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Switches {
    pub class_relevance: bool,
    pub interaction_relevance: bool,
    pub attribute_relevance: bool,
    pub attribute_scope: bool,
}

#[derive(Debug, Default)]
pub struct FederateCache {
    federation: Option<(FederationHandle, FederateHandle)>,
    objects: BTreeMap<ObjectHandle, CachedObject>,
    publications: BTreeMap<ObjectClassHandle, BTreeSet<AttributeHandle>>,
    announced: BTreeMap<String, String>,
    synchronized: BTreeSet<String>,
    save_label: Option<String>,
    save_outcome: Option<bool>,
    restore_label: Option<String>,
    restore_outcome: Option<bool>,
    registration_enabled: BTreeSet<ObjectClassHandle>,
    interactions_on: BTreeSet<InteractionClassHandle>,
    pub switches: Switches,
}

impl FederateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn joined(&mut self, federation: FederationHandle, federate: FederateHandle) {
        self.federation = Some((federation, federate));
    }

    /// Forget everything tied to the federation left.
    pub fn resigned(&mut self) {
        *self = Self::default();
    }

    pub fn membership(&self) -> Option<(FederationHandle, FederateHandle)> {
        self.federation
    }

    pub fn is_joined(&self) -> bool {
        self.federation.is_some()
    }

    pub fn published(&mut self, class: ObjectClassHandle, attributes: &[AttributeHandle]) {
        self.publications
            .insert(class, attributes.iter().copied().collect());
    }

    pub fn unpublished(&mut self, class: ObjectClassHandle) {
        self.publications.remove(&class);
    }

    /// An object this federate registered: it owns what it publishes.
    pub fn registered(&mut self, object: ObjectHandle, class: ObjectClassHandle, name: &str) {
        let owned = self.publications.get(&class).cloned().unwrap_or_default();
        self.objects.insert(
            object,
            CachedObject {
                class,
                name: name.to_string(),
                local: true,
                owned,
            },
        );
    }

    pub fn discovered(&mut self, object: ObjectHandle, class: ObjectClassHandle, name: &str) {
        self.objects.entry(object).or_insert_with(|| CachedObject {
            class,
            name: name.to_string(),
            local: false,
            owned: BTreeSet::new(),
        });
    }

    pub fn removed(&mut self, object: ObjectHandle) {
        self.objects.remove(&object);
    }

    pub fn object(&self, object: ObjectHandle) -> Option<&CachedObject> {
        self.objects.get(&object)
    }

    pub fn knows(&self, object: ObjectHandle) -> bool {
        self.objects.contains_key(&object)
    }

    pub fn objects(&self) -> impl Iterator<Item = (&ObjectHandle, &CachedObject)> {
        self.objects.iter()
    }

    pub fn acquired(&mut self, object: ObjectHandle, attributes: &[AttributeHandle]) {
        if let Some(entry) = self.objects.get_mut(&object) {
            entry.owned.extend(attributes.iter().copied());
        }
    }

    pub fn divested(&mut self, object: ObjectHandle, attributes: &[AttributeHandle]) {
        if let Some(entry) = self.objects.get_mut(&object) {
            for attribute in attributes {
                entry.owned.remove(attribute);
            }
        }
    }

    pub fn owns(&self, object: ObjectHandle, attribute: AttributeHandle) -> bool {
        self.objects
            .get(&object)
            .is_some_and(|entry| entry.owned.contains(&attribute))
    }

    pub fn announced(&mut self, label: &str, tag: &str) {
        self.synchronized.remove(label);
        self.announced.insert(label.to_string(), tag.to_string());
    }

    pub fn synchronized(&mut self, label: &str) {
        self.announced.remove(label);
        self.synchronized.insert(label.to_string());
    }

    pub fn is_synchronized(&self, label: &str) -> bool {
        self.synchronized.contains(label)
    }

    pub fn pending_sync_points(&self) -> impl Iterator<Item = &String> {
        self.announced.keys()
    }

    pub fn save_initiated(&mut self, label: &str) {
        self.save_label = Some(label.to_string());
    }

    pub fn save_resolved(&mut self, saved: bool) {
        self.save_label = None;
        self.save_outcome = Some(saved);
    }

    pub fn save_in_progress(&self) -> Option<&str> {
        self.save_label.as_deref()
    }

    /// Outcome of the last resolved save, consumed once.
    pub fn take_save_outcome(&mut self) -> Option<bool> {
        self.save_outcome.take()
    }

    pub fn restore_initiated(&mut self, label: &str) {
        self.restore_label = Some(label.to_string());
    }

    pub fn restore_resolved(&mut self, restored: bool) {
        self.restore_label = None;
        self.restore_outcome = Some(restored);
    }

    pub fn restore_in_progress(&self) -> Option<&str> {
        self.restore_label.as_deref()
    }

    pub fn take_restore_outcome(&mut self) -> Option<bool> {
        self.restore_outcome.take()
    }

    pub fn set_registration(&mut self, class: ObjectClassHandle, enabled: bool) {
        if enabled {
            self.registration_enabled.insert(class);
        } else {
            self.registration_enabled.remove(&class);
        }
    }

    pub fn registration_enabled(&self, class: ObjectClassHandle) -> bool {
        self.registration_enabled.contains(&class)
    }

    pub fn set_interactions(&mut self, class: InteractionClassHandle, on: bool) {
        if on {
            self.interactions_on.insert(class);
        } else {
            self.interactions_on.remove(&class);
        }
    }

    pub fn interactions_on(&self, class: InteractionClassHandle) -> bool {
        self.interactions_on.contains(&class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASS: ObjectClassHandle = ObjectClassHandle(1);
    const X: AttributeHandle = AttributeHandle(1);
    const Y: AttributeHandle = AttributeHandle(2);

    #[test]
    fn test_registered_object_owns_published_attributes() {
        let mut cache = FederateCache::new();
        cache.published(CLASS, &[X]);
        cache.registered(ObjectHandle(5), CLASS, "o5");
        assert!(cache.owns(ObjectHandle(5), X));
        assert!(!cache.owns(ObjectHandle(5), Y));

        cache.acquired(ObjectHandle(5), &[Y]);
        cache.divested(ObjectHandle(5), &[X]);
        assert!(cache.owns(ObjectHandle(5), Y));
        assert!(!cache.owns(ObjectHandle(5), X));
    }

    #[test]
    fn test_save_outcome_consumed_once() {
        let mut cache = FederateCache::new();
        cache.save_initiated("s1");
        assert_eq!(cache.save_in_progress(), Some("s1"));
        cache.save_resolved(false);
        assert_eq!(cache.save_in_progress(), None);
        assert_eq!(cache.take_save_outcome(), Some(false));
        assert_eq!(cache.take_save_outcome(), None);
    }

    #[test]
    fn test_resign_clears_everything() {
        let mut cache = FederateCache::new();
        cache.joined(FederationHandle(1), FederateHandle(2));
        cache.discovered(ObjectHandle(1), CLASS, "o1");
        cache.synchronized("ready");
        cache.resigned();
        assert!(!cache.is_joined());
        assert!(!cache.knows(ObjectHandle(1)));
        assert!(!cache.is_synchronized("ready"));
    }
}
