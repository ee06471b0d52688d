// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Federation registry.
//!
//! [`FederationsList`] is the single authority of the broker. It owns every
//! live federation and the connection-to-member map, admits or rejects every
//! request, and turns the outcome into [`Delivery`]s: the requester's reply
//! first, then the events the request caused, then lower-bound updates.
//! Each request produces exactly one audit record.

use super::audit::{AuditRecord, AuditSink};
use super::federation::{Event, Federation};
use super::model::DescriptorLoader;
use super::router::ConnectionId;
use fedrti::{
    Exception, FederateHandle, FederationHandle, HandleAllocator, Message, MessageKind, Payload,
    Rejection,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A message to push on one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub connection: ConnectionId,
    pub message: Message,
    pub best_effort: bool,
}

/// Registry statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    pub requests: u64,
    pub rejections: u64,
    pub federations_created: u64,
    pub federations_destroyed: u64,
    pub forced_removals: u64,
}

struct Outcome {
    federation: FederationHandle,
    federate: FederateHandle,
    result: Result<Option<Payload>, Exception>,
    events: Vec<Event>,
    description: String,
}

impl Outcome {
    fn new(federation: FederationHandle, federate: FederateHandle) -> Self {
        Self {
            federation,
            federate,
            result: Ok(None),
            events: Vec::new(),
            description: String::new(),
        }
    }
}

pub struct FederationsList {
    federations: BTreeMap<FederationHandle, Federation>,
    handles: HandleAllocator,
    members: HashMap<ConnectionId, (FederationHandle, FederateHandle)>,
    loader: Box<dyn DescriptorLoader>,
    audit: Arc<dyn AuditSink>,
    stats: RegistryStats,
}

impl FederationsList {
    pub fn new(loader: Box<dyn DescriptorLoader>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            federations: BTreeMap::new(),
            handles: HandleAllocator::new(),
            members: HashMap::new(),
            loader,
            audit,
            stats: RegistryStats::default(),
        }
    }

    pub fn federation(&self, handle: FederationHandle) -> Option<&Federation> {
        self.federations.get(&handle)
    }

    pub fn federation_by_name(&self, name: &str) -> Option<&Federation> {
        self.federations.values().find(|f| f.name() == name)
    }

    pub fn federation_count(&self) -> usize {
        self.federations.len()
    }

    /// Federation and federate a connection joined as.
    pub fn membership(&self, connection: ConnectionId) -> Option<(FederationHandle, FederateHandle)> {
        self.members.get(&connection).copied()
    }

    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    fn handle_by_name(&self, name: &str) -> Option<FederationHandle> {
        self.federation_by_name(name).map(|f| f.handle())
    }

    /// Handle one message received on `connection`.
    pub fn process(&mut self, connection: ConnectionId, message: Message) -> Vec<Delivery> {
        self.stats.requests += 1;
        let kind = message.kind();
        let payload = match message.body {
            Ok(payload) => payload,
            Err(rejection) => {
                // Federates never send rejections.
                self.record(
                    connection,
                    message.federation,
                    message.federate,
                    kind,
                    Some(Exception::RtiInternalError),
                    rejection.reason,
                );
                return Vec::new();
            }
        };

        let (federation, federate) = self
            .membership(connection)
            .unwrap_or((FederationHandle::NONE, FederateHandle::NONE));
        let mut outcome = Outcome::new(federation, federate);
        outcome.description = describe(&payload);

        match payload {
            Payload::CreateFederationExecution {
                federation_name,
                descriptor,
            } => {
                outcome.result = self
                    .create(&federation_name, &descriptor, &mut outcome)
                    .map(|_| {
                        Some(Payload::CreateFederationExecution {
                            federation_name,
                            descriptor,
                        })
                    });
            }
            Payload::DestroyFederationExecution { federation_name } => {
                outcome.result = self
                    .destroy(&federation_name)
                    .map(|_| Some(Payload::DestroyFederationExecution { federation_name }));
            }
            Payload::JoinFederationExecution {
                federation_name,
                federate_name,
                multicast_address,
                best_effort_address,
                best_effort_peer,
                ..
            } => {
                outcome.result = self
                    .join(connection, &federation_name, &federate_name, &mut outcome)
                    .map(|number_of_regulators| {
                        Some(Payload::JoinFederationExecution {
                            federation_name,
                            federate_name,
                            number_of_regulators,
                            multicast_address,
                            best_effort_address,
                            best_effort_peer,
                        })
                    });
            }
            Payload::CloseConnexion => {
                if self.members.contains_key(&connection) {
                    self.force_remove(connection, &mut outcome.events);
                }
            }
            Payload::GetFedFileSuppressed => {}
            payload => {
                outcome.result = self.dispatch(connection, kind, payload, &mut outcome.events);
            }
        }

        self.finish(connection, kind, outcome)
    }

    /// The connection went away: remove its federate without ownership
    /// checks.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Vec<Delivery> {
        let Some((federation, federate)) = self.membership(connection) else {
            return Vec::new();
        };
        let mut outcome = Outcome::new(federation, federate);
        outcome.description = "connection lost".to_string();
        self.force_remove(connection, &mut outcome.events);
        self.finish(connection, MessageKind::CloseConnexion, outcome)
    }

    fn create(
        &mut self,
        name: &str,
        descriptor: &str,
        outcome: &mut Outcome,
    ) -> Result<(), Exception> {
        if self.handle_by_name(name).is_some() {
            return Err(Exception::FederationExecutionAlreadyExists);
        }
        let model = self.loader.load(descriptor).map_err(|e| {
            warn!("Cannot load descriptor for {}: {}", name, e);
            e.exception()
        })?;
        let handle = FederationHandle(self.handles.allocate().ok_or(Exception::MemoryExhausted)?);
        self.federations
            .insert(handle, Federation::new(handle, name, descriptor, model));
        self.stats.federations_created += 1;
        outcome.federation = handle;
        info!("Federation {} created as {} from {}", name, handle, descriptor);
        Ok(())
    }

    fn destroy(&mut self, name: &str) -> Result<(), Exception> {
        let handle = self
            .handle_by_name(name)
            .ok_or(Exception::FederationExecutionDoesNotExist)?;
        if let Some(federation) = self.federations.get(&handle) {
            if !federation.is_empty() {
                return Err(Exception::FederatesCurrentlyJoined);
            }
        }
        self.federations.remove(&handle);
        self.stats.federations_destroyed += 1;
        info!("Federation {} destroyed", name);
        Ok(())
    }

    /// Returns the federation's regulator count for the reply.
    fn join(
        &mut self,
        connection: ConnectionId,
        federation_name: &str,
        federate_name: &str,
        outcome: &mut Outcome,
    ) -> Result<u32, Exception> {
        if self.members.contains_key(&connection) {
            return Err(Exception::FederateAlreadyExecutionMember);
        }
        let handle = self
            .handle_by_name(federation_name)
            .ok_or(Exception::FederationExecutionDoesNotExist)?;
        let federation = self
            .federations
            .get_mut(&handle)
            .ok_or(Exception::FederationExecutionDoesNotExist)?;
        let federate = federation.join(federate_name, connection, &mut outcome.events)?;
        self.members.insert(connection, (handle, federate));
        outcome.federation = handle;
        outcome.federate = federate;
        Ok(federation.regulator_count() as u32)
    }

    fn dispatch(
        &mut self,
        connection: ConnectionId,
        kind: MessageKind,
        payload: Payload,
        events: &mut Vec<Event>,
    ) -> Result<Option<Payload>, Exception> {
        let (handle, federate) = self
            .membership(connection)
            .ok_or(Exception::FederateNotExecutionMember)?;
        if kind.is_broker_originated() {
            return Err(Exception::RtiInternalError);
        }
        let federation = self
            .federations
            .get_mut(&handle)
            .ok_or(Exception::FederationExecutionDoesNotExist)?;

        if let Payload::ResignFederationExecution = payload {
            federation.resign(federate, events)?;
            self.members.remove(&connection);
            info!("{} resigned from {}", federate, federation.name());
            return Ok(Some(Payload::ResignFederationExecution));
        }
        federation.handle_request(federate, payload, events)
    }

    fn force_remove(&mut self, connection: ConnectionId, events: &mut Vec<Event>) {
        let Some((handle, federate)) = self.members.remove(&connection) else {
            return;
        };
        if let Some(federation) = self.federations.get_mut(&handle) {
            federation.remove(federate, events);
            self.stats.forced_removals += 1;
        }
    }

    /// Build the deliveries and write the audit record.
    fn finish(&mut self, connection: ConnectionId, kind: MessageKind, outcome: Outcome) -> Vec<Delivery> {
        let Outcome {
            federation,
            federate,
            result,
            events,
            description,
        } = outcome;
        let mut deliveries = Vec::with_capacity(events.len() + 1);

        let rejected = match &result {
            Err(exception) => Some(*exception),
            Ok(_) => None,
        };
        match result {
            Ok(Some(reply)) => deliveries.push(Delivery {
                connection,
                message: Message::new(federation, federate, reply),
                best_effort: false,
            }),
            Ok(None) => {}
            Err(exception) => {
                self.stats.rejections += 1;
                warn!(
                    "conn={} {} rejected with {}: {}",
                    connection, kind, exception, description
                );
                if !kind.is_fire_and_forget() {
                    deliveries.push(Delivery {
                        connection,
                        message: Message::rejected(
                            federation,
                            federate,
                            Rejection::new(kind, exception, description.clone()),
                        ),
                        best_effort: false,
                    });
                }
            }
        }

        if let Some(target) = self.federations.get_mut(&federation) {
            let bounds = target.bound_changes();
            for event in events.into_iter().chain(bounds) {
                match target.federate(event.to) {
                    Some(record) => deliveries.push(Delivery {
                        connection: record.connection,
                        message: Message::new(federation, event.to, event.payload),
                        best_effort: event.best_effort,
                    }),
                    None => debug!("Dropping {} for departed {}", event.payload.kind(), event.to),
                }
            }
        }

        self.record(connection, federation, federate, kind, rejected, description);
        deliveries
    }

    fn record(
        &self,
        connection: ConnectionId,
        federation: FederationHandle,
        federate: FederateHandle,
        kind: MessageKind,
        rejected: Option<Exception>,
        description: String,
    ) {
        self.audit.record(&AuditRecord {
            connection,
            federation: federation.raw(),
            federate: federate.raw(),
            kind: kind.name(),
            rejected: rejected.map(Exception::name),
            description,
        });
    }
}

/// Short human-readable summary of a request for logs and the audit trail.
fn describe(payload: &Payload) -> String {
    match payload {
        Payload::CreateFederationExecution {
            federation_name,
            descriptor,
        } => format!("federation '{}' from '{}'", federation_name, descriptor),
        Payload::DestroyFederationExecution { federation_name } => {
            format!("federation '{}'", federation_name)
        }
        Payload::JoinFederationExecution {
            federation_name,
            federate_name,
            ..
        } => format!("'{}' into '{}'", federate_name, federation_name),
        Payload::MessageNull { date } => format!("date {}", date),
        Payload::SetTimeRegulating { enabled, date } | Payload::SetTimeConstrained { enabled, date } => {
            format!("{} at {}", if *enabled { "on" } else { "off" }, date)
        }
        Payload::RegisterFederationSynchronizationPoint { label, .. }
        | Payload::SynchronizationPointAchieved { label }
        | Payload::RequestFederationSave { label, .. }
        | Payload::RequestFederationRestore { label } => format!("label '{}'", label),
        Payload::PublishObjectClass { class, attributes }
        | Payload::SubscribeObjectClass { class, attributes }
        | Payload::RequestClassAttributeValueUpdate { class, attributes } => {
            format!("{} ({} attributes)", class, attributes.len())
        }
        Payload::UnpublishObjectClass { class } | Payload::UnsubscribeObjectClass { class } => {
            class.to_string()
        }
        Payload::PublishInteractionClass { class }
        | Payload::UnpublishInteractionClass { class }
        | Payload::SubscribeInteractionClass { class }
        | Payload::UnsubscribeInteractionClass { class } => class.to_string(),
        Payload::RegisterObject { class, name, .. } => format!("'{}' of {}", name, class),
        Payload::UpdateAttributeValues(values) => {
            format!("{} ({} values)", values.object, values.values.len())
        }
        Payload::SendInteraction(values) => {
            format!("{} ({} parameters)", values.class, values.parameters.len())
        }
        Payload::DeleteObject { object, .. } => object.to_string(),
        Payload::IsAttributeOwnedByFederate {
            object, attribute, ..
        }
        | Payload::QueryAttributeOwnership { object, attribute } => {
            format!("{} {}", object, attribute)
        }
        Payload::RequestObjectAttributeValueUpdate(set)
        | Payload::AttributeOwnershipAcquisitionIfAvailable(set)
        | Payload::UnconditionalAttributeOwnershipDivestiture(set)
        | Payload::CancelNegotiatedAttributeOwnershipDivestiture(set)
        | Payload::AttributeOwnershipReleaseResponse(set)
        | Payload::CancelAttributeOwnershipAcquisition(set) => {
            format!("{} ({} attributes)", set.object, set.attributes.len())
        }
        Payload::NegotiatedAttributeOwnershipDivestiture(set)
        | Payload::AttributeOwnershipAcquisition(set) => {
            format!("{} ({} attributes)", set.object, set.attributes.len())
        }
        Payload::DdmCreateRegion { space, extents, .. } => {
            format!("{} ({} extents)", space, extents.len())
        }
        Payload::DdmModifyRegion { region, .. } | Payload::DdmDeleteRegion { region } => {
            region.to_string()
        }
        other => other.kind().name().to_string(),
    }
}
