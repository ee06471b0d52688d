// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Federate callbacks.
//!
//! Broker-originated messages become [`Callback`]s, which the event loop
//! hands to the application's [`FederateAmbassador`].
//!
//! # Usage
//!
//! ```ignore
//! use fedrti::federate::FederateAmbassador;
//! use fedrti::handles::{ObjectClassHandle, ObjectHandle};
//!
//! struct Tracker;
//!
//! impl FederateAmbassador for Tracker {
//!     fn discover_object_instance(&mut self, object: ObjectHandle, class: ObjectClassHandle, name: &str) {
//!         println!("discovered {} ({}) of {}", name, object, class);
//!     }
//! }
//! ```
//!
//! # Threading
//!
//! Callbacks run on the event-loop thread, including while the application
//! is blocked in a request or a tick. They must not call back into the
//! [`RtiAmbassador`](super::RtiAmbassador): the loop would wait on itself.

use crate::handles::{
    AttributeHandle, FederateHandle, InteractionClassHandle, ObjectClassHandle, ObjectHandle,
};
use crate::protocol::{AttributeValues, InteractionValues, ObjectAttributes, TaggedObjectAttributes};
use crate::time::FederationTime;

/// A callback produced by applying one broker message.
#[derive(Debug, Clone, PartialEq)]
pub enum Callback {
    DiscoverObject {
        class: ObjectClassHandle,
        object: ObjectHandle,
        name: String,
    },
    ReflectAttributeValues(AttributeValues),
    ReceiveInteraction(InteractionValues),
    RemoveObject {
        object: ObjectHandle,
        tag: String,
    },
    ProvideAttributeValueUpdate(ObjectAttributes),
    StartRegistrationForObjectClass(ObjectClassHandle),
    StopRegistrationForObjectClass(ObjectClassHandle),
    TurnInteractionsOn(InteractionClassHandle),
    TurnInteractionsOff(InteractionClassHandle),

    SynchronizationPointRegistrationSucceeded(String),
    AnnounceSynchronizationPoint {
        label: String,
        tag: String,
    },
    FederationSynchronized(String),

    InitiateFederateSave(String),
    FederationSaved,
    FederationNotSaved,
    RequestFederationRestoreSucceeded(String),
    RequestFederationRestoreFailed {
        label: String,
        reason: String,
    },
    FederationRestoreBegun,
    InitiateFederateRestore(String),
    FederationRestored,
    FederationNotRestored,

    RequestAttributeOwnershipAssumption(TaggedObjectAttributes),
    RequestAttributeOwnershipRelease(TaggedObjectAttributes),
    AttributeOwnershipAcquisitionNotification(ObjectAttributes),
    AttributeOwnershipDivestitureNotification(ObjectAttributes),
    AttributeOwnershipUnavailable(ObjectAttributes),
    ConfirmAttributeOwnershipAcquisitionCancellation(ObjectAttributes),
    InformAttributeOwnership {
        object: ObjectHandle,
        attribute: AttributeHandle,
        owner: FederateHandle,
    },
    AttributeIsNotOwned {
        object: ObjectHandle,
        attribute: AttributeHandle,
    },

    TimeRegulationEnabled(FederationTime),
    TimeConstrainedEnabled(FederationTime),
    TimeAdvanceGrant(FederationTime),
}

impl Callback {
    /// Invoke the matching ambassador method.
    pub fn dispatch(&self, ambassador: &mut dyn FederateAmbassador) {
        match self {
            Callback::DiscoverObject {
                class,
                object,
                name,
            } => ambassador.discover_object_instance(*object, *class, name),
            Callback::ReflectAttributeValues(values) => ambassador.reflect_attribute_values(values),
            Callback::ReceiveInteraction(values) => ambassador.receive_interaction(values),
            Callback::RemoveObject { object, tag } => ambassador.remove_object_instance(*object, tag),
            Callback::ProvideAttributeValueUpdate(set) => {
                ambassador.provide_attribute_value_update(set.object, &set.attributes)
            }
            Callback::StartRegistrationForObjectClass(class) => {
                ambassador.start_registration_for_object_class(*class)
            }
            Callback::StopRegistrationForObjectClass(class) => {
                ambassador.stop_registration_for_object_class(*class)
            }
            Callback::TurnInteractionsOn(class) => ambassador.turn_interactions_on(*class),
            Callback::TurnInteractionsOff(class) => ambassador.turn_interactions_off(*class),
            Callback::SynchronizationPointRegistrationSucceeded(label) => {
                ambassador.synchronization_point_registration_succeeded(label)
            }
            Callback::AnnounceSynchronizationPoint { label, tag } => {
                ambassador.announce_synchronization_point(label, tag)
            }
            Callback::FederationSynchronized(label) => ambassador.federation_synchronized(label),
            Callback::InitiateFederateSave(label) => ambassador.initiate_federate_save(label),
            Callback::FederationSaved => ambassador.federation_saved(),
            Callback::FederationNotSaved => ambassador.federation_not_saved(),
            Callback::RequestFederationRestoreSucceeded(label) => {
                ambassador.request_federation_restore_succeeded(label)
            }
            Callback::RequestFederationRestoreFailed { label, reason } => {
                ambassador.request_federation_restore_failed(label, reason)
            }
            Callback::FederationRestoreBegun => ambassador.federation_restore_begun(),
            Callback::InitiateFederateRestore(label) => ambassador.initiate_federate_restore(label),
            Callback::FederationRestored => ambassador.federation_restored(),
            Callback::FederationNotRestored => ambassador.federation_not_restored(),
            Callback::RequestAttributeOwnershipAssumption(set) => ambassador
                .request_attribute_ownership_assumption(set.object, &set.attributes, &set.tag),
            Callback::RequestAttributeOwnershipRelease(set) => ambassador
                .request_attribute_ownership_release(set.object, &set.attributes, &set.tag),
            Callback::AttributeOwnershipAcquisitionNotification(set) => ambassador
                .attribute_ownership_acquisition_notification(set.object, &set.attributes),
            Callback::AttributeOwnershipDivestitureNotification(set) => ambassador
                .attribute_ownership_divestiture_notification(set.object, &set.attributes),
            Callback::AttributeOwnershipUnavailable(set) => {
                ambassador.attribute_ownership_unavailable(set.object, &set.attributes)
            }
            Callback::ConfirmAttributeOwnershipAcquisitionCancellation(set) => ambassador
                .confirm_attribute_ownership_acquisition_cancellation(set.object, &set.attributes),
            Callback::InformAttributeOwnership {
                object,
                attribute,
                owner,
            } => ambassador.inform_attribute_ownership(*object, *attribute, *owner),
            Callback::AttributeIsNotOwned { object, attribute } => {
                ambassador.attribute_is_not_owned(*object, *attribute)
            }
            Callback::TimeRegulationEnabled(time) => ambassador.time_regulation_enabled(*time),
            Callback::TimeConstrainedEnabled(time) => ambassador.time_constrained_enabled(*time),
            Callback::TimeAdvanceGrant(time) => ambassador.time_advance_grant(*time),
        }
    }
}

/// Application callback interface. Every method defaults to a no-op.
pub trait FederateAmbassador: Send {
    /// A new object of a subscribed class became known.
    fn discover_object_instance(
        &mut self,
        object: ObjectHandle,
        class: ObjectClassHandle,
        name: &str,
    ) {
        let _ = (object, class, name);
    }

    /// New attribute values for a discovered object.
    ///
    /// `values.time` is set for time-stamp-order delivery; such reflections
    /// are only delivered once the federate's time has been granted past it.
    fn reflect_attribute_values(&mut self, values: &AttributeValues) {
        let _ = values;
    }

    fn receive_interaction(&mut self, values: &InteractionValues) {
        let _ = values;
    }

    fn remove_object_instance(&mut self, object: ObjectHandle, tag: &str) {
        let _ = (object, tag);
    }

    /// Another federate asked for current values of attributes owned here.
    fn provide_attribute_value_update(
        &mut self,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) {
        let _ = (object, attributes);
    }

    fn start_registration_for_object_class(&mut self, class: ObjectClassHandle) {
        let _ = class;
    }

    fn stop_registration_for_object_class(&mut self, class: ObjectClassHandle) {
        let _ = class;
    }

    fn turn_interactions_on(&mut self, class: InteractionClassHandle) {
        let _ = class;
    }

    fn turn_interactions_off(&mut self, class: InteractionClassHandle) {
        let _ = class;
    }

    fn synchronization_point_registration_succeeded(&mut self, label: &str) {
        let _ = label;
    }

    fn announce_synchronization_point(&mut self, label: &str, tag: &str) {
        let _ = (label, tag);
    }

    fn federation_synchronized(&mut self, label: &str) {
        let _ = label;
    }

    fn initiate_federate_save(&mut self, label: &str) {
        let _ = label;
    }

    fn federation_saved(&mut self) {}

    fn federation_not_saved(&mut self) {}

    fn request_federation_restore_succeeded(&mut self, label: &str) {
        let _ = label;
    }

    fn request_federation_restore_failed(&mut self, label: &str, reason: &str) {
        let _ = (label, reason);
    }

    fn federation_restore_begun(&mut self) {}

    fn initiate_federate_restore(&mut self, label: &str) {
        let _ = label;
    }

    fn federation_restored(&mut self) {}

    fn federation_not_restored(&mut self) {}

    /// The owner is divesting; this federate publishes the attributes and
    /// may acquire them.
    fn request_attribute_ownership_assumption(
        &mut self,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
        tag: &str,
    ) {
        let _ = (object, attributes, tag);
    }

    /// Someone wants attributes this federate owns.
    fn request_attribute_ownership_release(
        &mut self,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
        tag: &str,
    ) {
        let _ = (object, attributes, tag);
    }

    fn attribute_ownership_acquisition_notification(
        &mut self,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) {
        let _ = (object, attributes);
    }

    fn attribute_ownership_divestiture_notification(
        &mut self,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) {
        let _ = (object, attributes);
    }

    fn attribute_ownership_unavailable(
        &mut self,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) {
        let _ = (object, attributes);
    }

    fn confirm_attribute_ownership_acquisition_cancellation(
        &mut self,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) {
        let _ = (object, attributes);
    }

    fn inform_attribute_ownership(
        &mut self,
        object: ObjectHandle,
        attribute: AttributeHandle,
        owner: FederateHandle,
    ) {
        let _ = (object, attribute, owner);
    }

    fn attribute_is_not_owned(&mut self, object: ObjectHandle, attribute: AttributeHandle) {
        let _ = (object, attribute);
    }

    fn time_regulation_enabled(&mut self, time: FederationTime) {
        let _ = time;
    }

    fn time_constrained_enabled(&mut self, time: FederationTime) {
        let _ = time;
    }

    fn time_advance_grant(&mut self, time: FederationTime) {
        let _ = time;
    }
}

/// Ambassador that ignores every callback.
#[derive(Debug, Default)]
pub struct NullAmbassador;

impl FederateAmbassador for NullAmbassador {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        discovered: Vec<ObjectHandle>,
        grants: Vec<FederationTime>,
    }

    impl FederateAmbassador for Recorder {
        fn discover_object_instance(
            &mut self,
            object: ObjectHandle,
            _class: ObjectClassHandle,
            _name: &str,
        ) {
            self.discovered.push(object);
        }

        fn time_advance_grant(&mut self, time: FederationTime) {
            self.grants.push(time);
        }
    }

    #[test]
    fn test_dispatch_reaches_overridden_methods() {
        let mut recorder = Recorder::default();
        Callback::DiscoverObject {
            class: ObjectClassHandle(1),
            object: ObjectHandle(7),
            name: "tank".into(),
        }
        .dispatch(&mut recorder);
        Callback::TimeAdvanceGrant(FederationTime::new(3.0)).dispatch(&mut recorder);
        // Default no-op.
        Callback::FederationSaved.dispatch(&mut recorder);

        assert_eq!(recorder.discovered, vec![ObjectHandle(7)]);
        assert_eq!(recorder.grants, vec![FederationTime::new(3.0)]);
    }
}
