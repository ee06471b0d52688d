// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry-level federation scenarios, driven message by message.

use fedrti::protocol::{ObjectAttributes, TaggedObjectAttributes};
use fedrti::{
    AttributeHandle, Exception, FederateHandle, FederationHandle, Message, MessageKind,
    ObjectClassHandle, ObjectHandle, Payload,
};
use fedrti_broker::server::{ConnectionId, Delivery, FederationsList, InMemoryLoader, MemoryAudit};
use std::sync::Arc;

const MODEL: &str = r#"{
    "objects": [ { "name": "Vehicle", "attributes": ["position", "speed"] } ],
    "interactions": [ { "name": "Honk", "parameters": ["volume"] } ]
}"#;

const VEHICLE: ObjectClassHandle = ObjectClassHandle(1);
const POSITION: AttributeHandle = AttributeHandle(1);
const SPEED: AttributeHandle = AttributeHandle(2);

const CONN_A: ConnectionId = 10;
const CONN_B: ConnectionId = 20;
const CONN_C: ConnectionId = 30;

struct Harness {
    registry: FederationsList,
    audit: Arc<MemoryAudit>,
}

impl Harness {
    fn new() -> Self {
        let audit = Arc::new(MemoryAudit::new());
        let loader = InMemoryLoader::new().with("traffic.json", MODEL);
        let mut harness = Self {
            registry: FederationsList::new(Box::new(loader), audit.clone()),
            audit,
        };
        let created = harness.send(
            CONN_A,
            Payload::CreateFederationExecution {
                federation_name: "F".into(),
                descriptor: "traffic.json".into(),
            },
        );
        assert!(!created[0].message.is_rejection());
        harness
    }

    fn send(&mut self, connection: ConnectionId, payload: Payload) -> Vec<Delivery> {
        let (federation, federate) = self
            .registry
            .membership(connection)
            .unwrap_or((FederationHandle::NONE, FederateHandle::NONE));
        self.registry
            .process(connection, Message::new(federation, federate, payload))
    }

    fn join(&mut self, connection: ConnectionId, name: &str) -> FederateHandle {
        let deliveries = self.send(
            connection,
            Payload::JoinFederationExecution {
                federation_name: "F".into(),
                federate_name: name.into(),
                number_of_regulators: 0,
                multicast_address: 0,
                best_effort_address: 0,
                best_effort_peer: 0,
            },
        );
        assert!(!deliveries[0].message.is_rejection());
        deliveries[0].message.federate
    }

    fn publish(&mut self, connection: ConnectionId, attributes: Vec<AttributeHandle>) {
        let deliveries = self.send(
            connection,
            Payload::PublishObjectClass {
                class: VEHICLE,
                attributes,
            },
        );
        assert!(!deliveries[0].message.is_rejection());
    }

    fn register(&mut self, connection: ConnectionId, name: &str) -> ObjectHandle {
        let deliveries = self.send(
            connection,
            Payload::RegisterObject {
                class: VEHICLE,
                object: ObjectHandle::NONE,
                name: name.into(),
            },
        );
        match deliveries[0].message.payload() {
            Some(Payload::RegisterObject { object, .. }) => *object,
            other => panic!("unexpected reply {:?}", other),
        }
    }

    fn owner(&self, object: ObjectHandle, attribute: AttributeHandle) -> Option<FederateHandle> {
        self.registry
            .federation(FederationHandle(1))
            .and_then(|f| f.owner(object, attribute).ok())
            .flatten()
    }
}

fn kinds_to(deliveries: &[Delivery], connection: ConnectionId) -> Vec<MessageKind> {
    deliveries
        .iter()
        .filter(|d| d.connection == connection)
        .map(|d| d.message.kind())
        .collect()
}

fn rejection(deliveries: &[Delivery]) -> Option<Exception> {
    deliveries
        .first()
        .and_then(|d| d.message.body.as_ref().err())
        .map(|r| r.exception)
}

#[test]
fn test_subscriber_discovers_registered_object() {
    let mut h = Harness::new();
    h.join(CONN_A, "A");
    let b = h.join(CONN_B, "B");
    h.publish(CONN_A, vec![POSITION, SPEED]);
    let object = h.register(CONN_A, "car");

    let deliveries = h.send(
        CONN_B,
        Payload::SubscribeObjectClass {
            class: VEHICLE,
            attributes: vec![POSITION],
        },
    );

    assert_eq!(
        kinds_to(&deliveries, CONN_B),
        vec![MessageKind::SubscribeObjectClass, MessageKind::DiscoverObject]
    );
    assert!(kinds_to(&deliveries, CONN_A).is_empty());
    let discover = &deliveries[1].message;
    assert_eq!(discover.federate, b);
    assert_eq!(
        discover.payload(),
        Some(&Payload::DiscoverObject {
            class: VEHICLE,
            object,
            name: "car".into(),
        })
    );
}

#[test]
fn test_update_reflects_subscribed_attributes_only() {
    let mut h = Harness::new();
    h.join(CONN_A, "A");
    h.join(CONN_B, "B");
    h.publish(CONN_A, vec![POSITION, SPEED]);
    h.send(
        CONN_B,
        Payload::SubscribeObjectClass {
            class: VEHICLE,
            attributes: vec![SPEED],
        },
    );
    let object = h.register(CONN_A, "car");

    let deliveries = h.send(
        CONN_A,
        Payload::UpdateAttributeValues(fedrti::protocol::AttributeValues {
            class: VEHICLE,
            object,
            values: vec![(POSITION, vec![1]), (SPEED, vec![2])],
            tag: "t".into(),
            time: None,
        }),
    );
    let reflect = deliveries
        .iter()
        .find(|d| d.connection == CONN_B)
        .expect("reflection for B");
    assert!(reflect.best_effort);
    match reflect.message.payload() {
        Some(Payload::ReflectAttributeValues(values)) => {
            assert_eq!(values.values, vec![(SPEED, vec![2])]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_negotiated_divestiture_to_candidate() {
    let mut h = Harness::new();
    let a = h.join(CONN_A, "A");
    let b = h.join(CONN_B, "B");
    h.join(CONN_C, "C");
    h.publish(CONN_A, vec![POSITION, SPEED]);
    h.publish(CONN_B, vec![POSITION]);
    h.publish(CONN_C, vec![SPEED]);
    let object = h.register(CONN_A, "car");
    assert_eq!(h.owner(object, POSITION), Some(a));

    let deliveries = h.send(
        CONN_A,
        Payload::NegotiatedAttributeOwnershipDivestiture(TaggedObjectAttributes {
            object,
            attributes: vec![POSITION],
            tag: "handover".into(),
        }),
    );
    assert_eq!(
        kinds_to(&deliveries, CONN_B),
        vec![MessageKind::RequestAttributeOwnershipAssumption]
    );
    assert!(kinds_to(&deliveries, CONN_C).is_empty());

    let acquire = |h: &mut Harness, connection| {
        h.send(
            connection,
            Payload::AttributeOwnershipAcquisition(TaggedObjectAttributes {
                object,
                attributes: vec![POSITION],
                tag: String::new(),
            }),
        )
    };

    let refused = acquire(&mut h, CONN_C);
    assert_eq!(rejection(&refused), Some(Exception::AttributeNotPublished));
    assert_eq!(h.owner(object, POSITION), Some(a));

    let granted = acquire(&mut h, CONN_B);
    assert_eq!(rejection(&granted), None);
    assert_eq!(
        kinds_to(&granted, CONN_A),
        vec![MessageKind::AttributeOwnershipDivestitureNotification]
    );
    assert!(kinds_to(&granted, CONN_B)
        .contains(&MessageKind::AttributeOwnershipAcquisitionNotification));
    assert_eq!(h.owner(object, POSITION), Some(b));

    // A's divestiture is over: A can resign.
    let cancel = h.send(
        CONN_A,
        Payload::CancelNegotiatedAttributeOwnershipDivestiture(ObjectAttributes {
            object,
            attributes: vec![POSITION],
        }),
    );
    assert_eq!(rejection(&cancel), Some(Exception::AttributeNotOwned));
    let resigned = h.send(CONN_A, Payload::ResignFederationExecution);
    assert_eq!(rejection(&resigned), None);
}

#[test]
fn test_not_saved_reverts_to_active() {
    let mut h = Harness::new();
    h.join(CONN_A, "A");
    h.join(CONN_B, "B");

    let deliveries = h.send(
        CONN_A,
        Payload::RequestFederationSave {
            label: "checkpoint".into(),
            time: None,
        },
    );
    assert_eq!(
        kinds_to(&deliveries, CONN_A),
        vec![
            MessageKind::RequestFederationSave,
            MessageKind::InitiateFederateSave
        ]
    );
    assert_eq!(
        kinds_to(&deliveries, CONN_B),
        vec![MessageKind::InitiateFederateSave]
    );

    // Declarations wait for the save to resolve.
    let blocked = h.send(
        CONN_B,
        Payload::PublishObjectClass {
            class: VEHICLE,
            attributes: vec![POSITION],
        },
    );
    assert_eq!(rejection(&blocked), Some(Exception::SaveInProgress));

    assert!(h.send(CONN_A, Payload::FederateSaveBegun).is_empty());
    assert!(h.send(CONN_A, Payload::FederateSaveComplete).is_empty());
    let resolved = h.send(CONN_B, Payload::FederateSaveNotComplete);
    assert_eq!(kinds_to(&resolved, CONN_A), vec![MessageKind::FederationNotSaved]);
    assert_eq!(kinds_to(&resolved, CONN_B), vec![MessageKind::FederationNotSaved]);

    let published = h.send(
        CONN_B,
        Payload::PublishObjectClass {
            class: VEHICLE,
            attributes: vec![POSITION],
        },
    );
    assert_eq!(rejection(&published), None);
    assert!(!h.registry.federation(FederationHandle(1)).unwrap().is_saved("checkpoint"));
}

#[test]
fn test_save_then_restore() {
    let mut h = Harness::new();
    h.join(CONN_A, "A");
    h.join(CONN_B, "B");

    let failed = h.send(
        CONN_A,
        Payload::RequestFederationRestore {
            label: "checkpoint".into(),
        },
    );
    assert_eq!(
        kinds_to(&failed, CONN_A),
        vec![MessageKind::RequestFederationRestoreFailed]
    );

    h.send(
        CONN_A,
        Payload::RequestFederationSave {
            label: "checkpoint".into(),
            time: None,
        },
    );
    h.send(CONN_A, Payload::FederateSaveComplete);
    let saved = h.send(CONN_B, Payload::FederateSaveComplete);
    assert_eq!(kinds_to(&saved, CONN_A), vec![MessageKind::FederationSaved]);

    let restoring = h.send(
        CONN_B,
        Payload::RequestFederationRestore {
            label: "checkpoint".into(),
        },
    );
    assert_eq!(
        kinds_to(&restoring, CONN_B),
        vec![
            MessageKind::RequestFederationRestoreSucceeded,
            MessageKind::FederationRestoreBegun,
            MessageKind::InitiateFederateRestore,
        ]
    );

    // Forced removal of the last outstanding federate completes the restore.
    h.send(CONN_B, Payload::FederateRestoreComplete);
    let restored = h.registry.disconnect(CONN_A);
    assert_eq!(kinds_to(&restored, CONN_B), vec![MessageKind::FederationRestored]);
}

#[test]
fn test_sync_point_for_explicit_set() {
    let mut h = Harness::new();
    let a = h.join(CONN_A, "A");
    h.join(CONN_B, "B");

    let deliveries = h.send(
        CONN_B,
        Payload::RegisterFederationSynchronizationPoint {
            label: "only-a".into(),
            tag: "t".into(),
            federates: Some(vec![a]),
        },
    );
    assert_eq!(
        kinds_to(&deliveries, CONN_B),
        vec![MessageKind::SynchronizationPointRegistrationSucceeded]
    );
    assert_eq!(
        kinds_to(&deliveries, CONN_A),
        vec![MessageKind::AnnounceSynchronizationPoint]
    );

    // B was not addressed.
    assert!(h
        .send(CONN_B, Payload::SynchronizationPointAchieved { label: "only-a".into() })
        .is_empty());
    let last = h.audit.records().pop().unwrap();
    assert_eq!(last.rejected, Some("SynchronizationPointLabelWasNotAnnounced"));

    // A late joiner is not added to an explicit set.
    let late = h.join(CONN_C, "C");
    assert_ne!(late, FederateHandle::NONE);
    let synchronized = h.send(CONN_A, Payload::SynchronizationPointAchieved { label: "only-a".into() });
    assert_eq!(
        kinds_to(&synchronized, CONN_A),
        vec![MessageKind::FederationSynchronized]
    );
    assert!(kinds_to(&synchronized, CONN_C).is_empty());
}

#[test]
fn test_time_regulation_bounds_constrained_federates() {
    let mut h = Harness::new();
    h.join(CONN_A, "A");
    h.join(CONN_B, "B");

    let constrained = h.send(
        CONN_B,
        Payload::SetTimeConstrained {
            enabled: true,
            date: fedrti::FederationTime::ZERO,
        },
    );
    // Reply first, then the initial (infinite) bound.
    assert_eq!(
        kinds_to(&constrained, CONN_B),
        vec![MessageKind::TimeConstrainedEnabled, MessageKind::MessageNull]
    );

    let regulating = h.send(
        CONN_A,
        Payload::SetTimeRegulating {
            enabled: true,
            date: fedrti::FederationTime::new(2.0),
        },
    );
    assert_eq!(
        kinds_to(&regulating, CONN_A),
        vec![MessageKind::TimeRegulationEnabled]
    );
    assert!(kinds_to(&regulating, CONN_B).contains(&MessageKind::MessageNull));

    let advanced = h.send(
        CONN_A,
        Payload::MessageNull {
            date: fedrti::FederationTime::new(7.0),
        },
    );
    let bound = advanced
        .iter()
        .find(|d| d.connection == CONN_B)
        .and_then(|d| d.message.payload().cloned());
    assert_eq!(
        bound,
        Some(Payload::MessageNull {
            date: fedrti::FederationTime::new(7.0)
        })
    );
}
