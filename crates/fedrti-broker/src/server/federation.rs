// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! One federation execution.
//!
//! A [`Federation`] owns every piece of state the broker keeps for a
//! federation: members, objects, attribute ownership, regulators, regions,
//! synchronization points and the save/restore phase. Requests come in
//! through [`Federation::handle_request`], which validates the whole request
//! before touching anything, then returns the requester's reply and pushes
//! the events other federates must see.
//!
//! ```text
//!            request_save                  all COMPLETE
//!   Active ---------------> Saving ---------------------> Active (saved)
//!     |                       `-- first NOT_COMPLETE ----> Active (not saved)
//!     |   request_restore (known label)
//!     `-----------------------> Restoring ---------------> Active
//! ```

use super::model::ClassModel;
use super::router::ConnectionId;
use fedrti::ddm::RegionTable;
use fedrti::federate::Switches;
use fedrti::ownership::{NoticeKind, OwnershipNotice, OwnershipTable, PublicationView};
use fedrti::protocol::{AttributeValues, InteractionValues, ObjectAttributes, TaggedObjectAttributes};
use fedrti::time_management::RegulatorSet;
use fedrti::{
    AttributeHandle, Exception, FederateHandle, FederationHandle, FederationTime,
    HandleAllocator, InteractionClassHandle, ObjectClassHandle, ObjectHandle, Payload,
    RegionHandle,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// A message for one member, produced while handling a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub to: FederateHandle,
    pub payload: Payload,
    /// Receive-order attribute reflection, eligible for the best-effort
    /// channel.
    pub best_effort: bool,
}

impl Event {
    fn reliable(to: FederateHandle, payload: Payload) -> Self {
        Self {
            to,
            payload,
            best_effort: false,
        }
    }
}

/// Lifecycle phase. Only `Active` accepts declarations, object traffic,
/// ownership changes and new save/restore requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Active,
    Saving {
        label: String,
        waiting: BTreeSet<FederateHandle>,
    },
    Restoring {
        label: String,
        waiting: BTreeSet<FederateHandle>,
    },
}

impl Phase {
    fn check_active(&self) -> Result<(), Exception> {
        match self {
            Phase::Active => Ok(()),
            Phase::Saving { .. } => Err(Exception::SaveInProgress),
            Phase::Restoring { .. } => Err(Exception::RestoreInProgress),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ClassSubscription {
    attributes: BTreeSet<AttributeHandle>,
    passive: bool,
}

/// A member of the federation.
#[derive(Debug, Clone)]
pub struct FederateRecord {
    pub handle: FederateHandle,
    pub name: String,
    pub connection: ConnectionId,
    pub switches: Switches,
    publications: BTreeMap<ObjectClassHandle, BTreeSet<AttributeHandle>>,
    interaction_publications: BTreeSet<InteractionClassHandle>,
    // Keyed by (class, region); `RegionHandle::NONE` is the plain subscription.
    subscriptions: BTreeMap<(ObjectClassHandle, RegionHandle), ClassSubscription>,
    interaction_subscriptions: BTreeMap<(InteractionClassHandle, RegionHandle), bool>,
}

impl FederateRecord {
    fn new(handle: FederateHandle, name: &str, connection: ConnectionId) -> Self {
        Self {
            handle,
            name: name.to_string(),
            connection,
            switches: Switches::default(),
            publications: BTreeMap::new(),
            interaction_publications: BTreeSet::new(),
            subscriptions: BTreeMap::new(),
            interaction_subscriptions: BTreeMap::new(),
        }
    }

    pub fn publishes_class(&self, class: ObjectClassHandle) -> bool {
        self.publications.contains_key(&class)
    }

    pub fn publishes_interaction(&self, class: InteractionClassHandle) -> bool {
        self.interaction_publications.contains(&class)
    }

    fn subscriptions_of(
        &self,
        class: ObjectClassHandle,
    ) -> impl Iterator<Item = &ClassSubscription> {
        self.subscriptions
            .range((class, RegionHandle(0))..=(class, RegionHandle(u32::MAX)))
            .map(|(_, subscription)| subscription)
    }

    pub fn subscribes_class(&self, class: ObjectClassHandle) -> bool {
        self.subscriptions_of(class).next().is_some()
    }

    /// Union of the attributes subscribed through every region.
    pub fn subscribed_attributes(&self, class: ObjectClassHandle) -> BTreeSet<AttributeHandle> {
        self.subscriptions_of(class)
            .flat_map(|s| s.attributes.iter().copied())
            .collect()
    }

    fn actively_subscribes_class(&self, class: ObjectClassHandle) -> bool {
        self.subscriptions_of(class).any(|s| !s.passive)
    }

    pub fn subscribes_interaction(&self, class: InteractionClassHandle) -> bool {
        self.interaction_subscriptions
            .range((class, RegionHandle(0))..=(class, RegionHandle(u32::MAX)))
            .next()
            .is_some()
    }

    fn actively_subscribes_interaction(&self, class: InteractionClassHandle) -> bool {
        self.interaction_subscriptions
            .range((class, RegionHandle(0))..=(class, RegionHandle(u32::MAX)))
            .any(|(_, passive)| !passive)
    }
}

#[derive(Debug, Clone)]
struct ObjectRecord {
    class: ObjectClassHandle,
    name: String,
    registrant: FederateHandle,
    discoverers: BTreeSet<FederateHandle>,
}

#[derive(Debug, Clone)]
struct SyncPoint {
    /// Registered for every member, so late joiners are addressed too.
    everyone: bool,
    tag: String,
    addressed: BTreeSet<FederateHandle>,
    waiting: BTreeSet<FederateHandle>,
}

/// Publication lookup for the ownership table, scoped to one class.
struct ClassPublications<'a> {
    class: ObjectClassHandle,
    federates: &'a BTreeMap<FederateHandle, FederateRecord>,
}

impl PublicationView for ClassPublications<'_> {
    fn publishes(&self, federate: FederateHandle, attribute: AttributeHandle) -> bool {
        self.federates
            .get(&federate)
            .and_then(|record| record.publications.get(&self.class))
            .is_some_and(|attributes| attributes.contains(&attribute))
    }

    fn publishers(&self, attribute: AttributeHandle) -> Vec<FederateHandle> {
        self.federates
            .values()
            .filter(|record| {
                record
                    .publications
                    .get(&self.class)
                    .is_some_and(|attributes| attributes.contains(&attribute))
            })
            .map(|record| record.handle)
            .collect()
    }
}

/// Publishers that currently have another active subscriber.
#[derive(Debug, Default, PartialEq, Eq)]
struct Relevance {
    objects: BTreeSet<(ObjectClassHandle, FederateHandle)>,
    interactions: BTreeSet<(InteractionClassHandle, FederateHandle)>,
}

fn notice_payload(notice: OwnershipNotice, tag: &str) -> Payload {
    let set = ObjectAttributes {
        object: notice.object,
        attributes: notice.attributes,
    };
    let tagged = |set: ObjectAttributes| TaggedObjectAttributes {
        object: set.object,
        attributes: set.attributes,
        tag: tag.to_string(),
    };
    match notice.kind {
        NoticeKind::AcquisitionNotification => Payload::AttributeOwnershipAcquisitionNotification(set),
        NoticeKind::DivestitureNotification => Payload::AttributeOwnershipDivestitureNotification(set),
        NoticeKind::AssumptionRequest => Payload::RequestAttributeOwnershipAssumption(tagged(set)),
        NoticeKind::ReleaseRequest => Payload::RequestAttributeOwnershipRelease(tagged(set)),
        NoticeKind::Unavailable => Payload::AttributeOwnershipUnavailable(set),
        NoticeKind::CancellationConfirmed => {
            Payload::ConfirmAttributeOwnershipAcquisitionCancellation(set)
        }
    }
}

fn changes_declarations(payload: &Payload) -> bool {
    matches!(
        payload,
        Payload::PublishObjectClass { .. }
            | Payload::UnpublishObjectClass { .. }
            | Payload::PublishInteractionClass { .. }
            | Payload::UnpublishInteractionClass { .. }
            | Payload::SubscribeObjectClass { .. }
            | Payload::UnsubscribeObjectClass { .. }
            | Payload::SubscribeInteractionClass { .. }
            | Payload::UnsubscribeInteractionClass { .. }
            | Payload::DdmSubscribeAttributes { .. }
            | Payload::DdmUnsubscribeAttributes { .. }
            | Payload::DdmSubscribeInteraction { .. }
            | Payload::DdmUnsubscribeInteraction { .. }
    )
}

pub struct Federation {
    handle: FederationHandle,
    name: String,
    descriptor: String,
    model: ClassModel,
    federates: BTreeMap<FederateHandle, FederateRecord>,
    federate_handles: HandleAllocator,
    object_handles: HandleAllocator,
    objects: BTreeMap<ObjectHandle, ObjectRecord>,
    object_names: BTreeMap<String, ObjectHandle>,
    ownership: OwnershipTable,
    time: RegulatorSet,
    regions: RegionTable,
    sync_points: BTreeMap<String, SyncPoint>,
    phase: Phase,
    saved_labels: BTreeSet<String>,
}

impl Federation {
    pub fn new(handle: FederationHandle, name: &str, descriptor: &str, model: ClassModel) -> Self {
        Self {
            handle,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            model,
            federates: BTreeMap::new(),
            federate_handles: HandleAllocator::new(),
            object_handles: HandleAllocator::new(),
            objects: BTreeMap::new(),
            object_names: BTreeMap::new(),
            ownership: OwnershipTable::new(),
            time: RegulatorSet::new(),
            regions: RegionTable::new(),
            sync_points: BTreeMap::new(),
            phase: Phase::Active,
            saved_labels: BTreeSet::new(),
        }
    }

    pub fn handle(&self) -> FederationHandle {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn model(&self) -> &ClassModel {
        &self.model
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_empty(&self) -> bool {
        self.federates.is_empty()
    }

    pub fn federate_count(&self) -> usize {
        self.federates.len()
    }

    pub fn federate(&self, federate: FederateHandle) -> Option<&FederateRecord> {
        self.federates.get(&federate)
    }

    pub fn regulator_count(&self) -> usize {
        self.time.regulator_count()
    }

    /// Current lower bound over all regulators.
    pub fn lower_bound(&self) -> FederationTime {
        self.time.lower_bound()
    }

    pub fn owner(
        &self,
        object: ObjectHandle,
        attribute: AttributeHandle,
    ) -> Result<Option<FederateHandle>, Exception> {
        self.ownership.owner(object, attribute)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn pending_sync_points(&self) -> impl Iterator<Item = &String> {
        self.sync_points.keys()
    }

    pub fn is_saved(&self, label: &str) -> bool {
        self.saved_labels.contains(label)
    }

    fn record(&self, federate: FederateHandle) -> Result<&FederateRecord, Exception> {
        self.federates
            .get(&federate)
            .ok_or(Exception::FederateNotExecutionMember)
    }

    fn record_mut(&mut self, federate: FederateHandle) -> Result<&mut FederateRecord, Exception> {
        self.federates
            .get_mut(&federate)
            .ok_or(Exception::FederateNotExecutionMember)
    }

    fn object(&self, object: ObjectHandle) -> Result<&ObjectRecord, Exception> {
        self.objects.get(&object).ok_or(Exception::ObjectNotKnown)
    }

    fn broadcast(&self, payload: Payload, out: &mut Vec<Event>) {
        for federate in self.federates.keys() {
            out.push(Event::reliable(*federate, payload.clone()));
        }
    }

    /// Admit a new member. Announces every pending all-member sync point to it.
    pub fn join(
        &mut self,
        name: &str,
        connection: ConnectionId,
        out: &mut Vec<Event>,
    ) -> Result<FederateHandle, Exception> {
        self.phase.check_active()?;
        if self.federates.values().any(|record| record.name == name) {
            return Err(Exception::FederateAlreadyExecutionMember);
        }
        let handle = FederateHandle(
            self.federate_handles
                .allocate()
                .ok_or(Exception::MemoryExhausted)?,
        );
        self.federates
            .insert(handle, FederateRecord::new(handle, name, connection));

        for (label, point) in self.sync_points.iter_mut().filter(|(_, p)| p.everyone) {
            point.addressed.insert(handle);
            point.waiting.insert(handle);
            out.push(Event::reliable(
                handle,
                Payload::AnnounceSynchronizationPoint {
                    label: label.clone(),
                    tag: point.tag.clone(),
                },
            ));
        }
        info!("Federate {} joined {} as {}", name, self.name, handle);
        Ok(handle)
    }

    /// Voluntary departure: refused while the federate still has ownership
    /// obligations.
    pub fn resign(&mut self, federate: FederateHandle, out: &mut Vec<Event>) -> Result<(), Exception> {
        self.record(federate)?;
        let released = self.ownership.release_federate(federate)?;
        debug!(
            "{} resigning from {}, {} attributes released",
            federate,
            self.name,
            released.len()
        );
        self.detach(federate, out);
        Ok(())
    }

    /// Forced removal: ownership is discarded without checks.
    pub fn remove(&mut self, federate: FederateHandle, out: &mut Vec<Event>) {
        if !self.federates.contains_key(&federate) {
            return;
        }
        let released = self.ownership.force_remove(federate);
        info!(
            "{} removed from {}, {} attributes released",
            federate,
            self.name,
            released.len()
        );
        self.detach(federate, out);
    }

    fn detach(&mut self, federate: FederateHandle, out: &mut Vec<Event>) {
        let before = self.relevance();
        self.federates.remove(&federate);
        self.time.remove_federate(federate);
        self.regions.remove_owner(federate);
        for object in self.objects.values_mut() {
            object.discoverers.remove(&federate);
        }

        let labels: Vec<String> = self.sync_points.keys().cloned().collect();
        for label in labels {
            if let Some(point) = self.sync_points.get_mut(&label) {
                point.addressed.remove(&federate);
                point.waiting.remove(&federate);
            }
            self.resolve_sync_point(&label, out);
        }

        match &mut self.phase {
            Phase::Saving { waiting, .. } | Phase::Restoring { waiting, .. } => {
                waiting.remove(&federate);
            }
            Phase::Active => {}
        }
        self.settle_phase(out);
        self.advise(&before, out);
    }

    /// Handle one request from `from`. Returns the reply payload, `None` for
    /// fire-and-forget kinds. A rejected request changes nothing.
    pub fn handle_request(
        &mut self,
        from: FederateHandle,
        payload: Payload,
        out: &mut Vec<Event>,
    ) -> Result<Option<Payload>, Exception> {
        self.record(from)?;
        let before = changes_declarations(&payload).then(|| self.relevance());
        let reply = self.dispatch(from, payload, out)?;
        if let Some(before) = before {
            self.advise(&before, out);
        }
        Ok(reply)
    }

    /// Bound notifications owed to constrained members, as null messages.
    pub fn bound_changes(&mut self) -> Vec<Event> {
        self.time
            .take_bound_changes()
            .into_iter()
            .map(|(federate, date)| Event::reliable(federate, Payload::MessageNull { date }))
            .collect()
    }

    fn dispatch(
        &mut self,
        from: FederateHandle,
        payload: Payload,
        out: &mut Vec<Event>,
    ) -> Result<Option<Payload>, Exception> {
        let reply = match payload {
            Payload::MessageNull { date } => {
                if self.time.is_regulator(from) {
                    self.time.update_regulator(from, date)?;
                }
                return Ok(None);
            }
            Payload::SetTimeRegulating { enabled: true, date } => {
                let granted = self.time.create_regulator(from, date)?;
                debug!("{} regulating from {}", from, granted);
                Payload::TimeRegulationEnabled { date: granted }
            }
            Payload::SetTimeRegulating { enabled: false, date } => {
                self.time.remove_regulator(from)?;
                Payload::SetTimeRegulating {
                    enabled: false,
                    date,
                }
            }
            Payload::SetTimeConstrained { enabled: true, date } => {
                self.time.add_constrained(from)?;
                Payload::TimeConstrainedEnabled { date }
            }
            Payload::SetTimeConstrained { enabled: false, date } => {
                self.time.remove_constrained(from)?;
                Payload::SetTimeConstrained {
                    enabled: false,
                    date,
                }
            }

            Payload::RegisterFederationSynchronizationPoint {
                label,
                tag,
                federates,
            } => self.register_sync_point(label, tag, federates, out)?,
            Payload::SynchronizationPointAchieved { label } => {
                self.sync_point_achieved(from, &label, out)?;
                return Ok(None);
            }

            Payload::RequestFederationSave { label, time } => {
                self.request_save(label, time, out)?
            }
            Payload::FederateSaveBegun => {
                self.saving_waits_on(from)?;
                return Ok(None);
            }
            Payload::FederateSaveComplete => {
                self.save_reported(from, true, out)?;
                return Ok(None);
            }
            Payload::FederateSaveNotComplete => {
                self.save_reported(from, false, out)?;
                return Ok(None);
            }
            Payload::RequestFederationRestore { label } => self.request_restore(label, out)?,
            Payload::FederateRestoreComplete => {
                self.restore_reported(from, true, out)?;
                return Ok(None);
            }
            Payload::FederateRestoreNotComplete => {
                self.restore_reported(from, false, out)?;
                return Ok(None);
            }

            Payload::PublishObjectClass { class, attributes } => {
                self.phase.check_active()?;
                self.model.check_attributes(class, &attributes)?;
                self.record_mut(from)?
                    .publications
                    .insert(class, attributes.iter().copied().collect());
                Payload::PublishObjectClass { class, attributes }
            }
            Payload::UnpublishObjectClass { class } => {
                self.phase.check_active()?;
                self.model.object_class(class)?;
                self.record_mut(from)?
                    .publications
                    .remove(&class)
                    .ok_or(Exception::ObjectClassNotPublished)?;
                Payload::UnpublishObjectClass { class }
            }
            Payload::PublishInteractionClass { class } => {
                self.phase.check_active()?;
                self.model.interaction_class(class)?;
                self.record_mut(from)?.interaction_publications.insert(class);
                Payload::PublishInteractionClass { class }
            }
            Payload::UnpublishInteractionClass { class } => {
                self.phase.check_active()?;
                self.model.interaction_class(class)?;
                if !self.record_mut(from)?.interaction_publications.remove(&class) {
                    return Err(Exception::InteractionClassNotPublished);
                }
                Payload::UnpublishInteractionClass { class }
            }
            Payload::SubscribeObjectClass { class, attributes } => {
                self.subscribe_object_class(from, class, RegionHandle::NONE, &attributes, false, out)?;
                Payload::SubscribeObjectClass { class, attributes }
            }
            Payload::UnsubscribeObjectClass { class } => {
                self.unsubscribe_object_class(from, class, RegionHandle::NONE)?;
                Payload::UnsubscribeObjectClass { class }
            }
            Payload::SubscribeInteractionClass { class } => {
                self.subscribe_interaction(from, class, RegionHandle::NONE, false)?;
                Payload::SubscribeInteractionClass { class }
            }
            Payload::UnsubscribeInteractionClass { class } => {
                self.unsubscribe_interaction(from, class, RegionHandle::NONE)?;
                Payload::UnsubscribeInteractionClass { class }
            }

            Payload::RegisterObject { class, name, .. } => {
                let (object, name) = self.register_object(from, class, name, None, out)?;
                Payload::RegisterObject {
                    class,
                    object,
                    name,
                }
            }
            Payload::UpdateAttributeValues(values) => {
                self.update_attribute_values(from, &values, out)?;
                Payload::UpdateAttributeValues(values)
            }
            Payload::SendInteraction(values) => {
                self.send_interaction(from, &values, out)?;
                Payload::SendInteraction(values)
            }
            Payload::DeleteObject { object, tag } => {
                self.delete_object(from, object, &tag, out)?;
                Payload::DeleteObject { object, tag }
            }
            Payload::RequestObjectAttributeValueUpdate(set) => {
                self.phase.check_active()?;
                let class = self.object(set.object)?.class;
                self.model.check_attributes(class, &set.attributes)?;
                self.request_provide(from, set.object, &set.attributes, out);
                Payload::RequestObjectAttributeValueUpdate(set)
            }
            Payload::RequestClassAttributeValueUpdate { class, attributes } => {
                self.phase.check_active()?;
                self.model.check_attributes(class, &attributes)?;
                let objects: Vec<ObjectHandle> = self
                    .objects
                    .iter()
                    .filter(|(_, record)| record.class == class)
                    .map(|(handle, _)| *handle)
                    .collect();
                for object in objects {
                    self.request_provide(from, object, &attributes, out);
                }
                Payload::RequestClassAttributeValueUpdate { class, attributes }
            }

            Payload::IsAttributeOwnedByFederate {
                object, attribute, ..
            } => {
                self.object(object)?;
                let owned = self.ownership.owner(object, attribute)? == Some(from);
                Payload::IsAttributeOwnedByFederate {
                    object,
                    attribute,
                    tag: if owned { "RTI_TRUE" } else { "RTI_FALSE" }.to_string(),
                }
            }
            Payload::QueryAttributeOwnership { object, attribute } => {
                self.object(object)?;
                match self.ownership.owner(object, attribute)? {
                    Some(owner) => Payload::InformAttributeOwnership {
                        object,
                        attribute,
                        owner,
                    },
                    None => Payload::AttributeIsNotOwned { object, attribute },
                }
            }
            Payload::NegotiatedAttributeOwnershipDivestiture(set) => {
                self.phase.check_active()?;
                let class = self.object(set.object)?.class;
                let view = ClassPublications {
                    class,
                    federates: &self.federates,
                };
                let notices =
                    self.ownership
                        .negotiated_divestiture(set.object, from, &set.attributes, &view)?;
                self.push_notices(notices, &set.tag, out);
                Payload::NegotiatedAttributeOwnershipDivestiture(set)
            }
            Payload::AttributeOwnershipAcquisition(set) => {
                self.phase.check_active()?;
                let class = self.object(set.object)?.class;
                let view = ClassPublications {
                    class,
                    federates: &self.federates,
                };
                let notices = self
                    .ownership
                    .acquisition(set.object, from, &set.attributes, &view)?;
                self.push_notices(notices, &set.tag, out);
                Payload::AttributeOwnershipAcquisition(set)
            }
            Payload::AttributeOwnershipAcquisitionIfAvailable(set) => {
                self.phase.check_active()?;
                let class = self.object(set.object)?.class;
                let view = ClassPublications {
                    class,
                    federates: &self.federates,
                };
                let notices = self.ownership.acquisition_if_available(
                    set.object,
                    from,
                    &set.attributes,
                    &view,
                )?;
                self.push_notices(notices, "", out);
                Payload::AttributeOwnershipAcquisitionIfAvailable(set)
            }
            Payload::UnconditionalAttributeOwnershipDivestiture(set) => {
                self.phase.check_active()?;
                self.object(set.object)?;
                let notices =
                    self.ownership
                        .unconditional_divestiture(set.object, from, &set.attributes)?;
                self.push_notices(notices, "", out);
                Payload::UnconditionalAttributeOwnershipDivestiture(set)
            }
            Payload::CancelNegotiatedAttributeOwnershipDivestiture(set) => {
                self.phase.check_active()?;
                self.object(set.object)?;
                self.ownership
                    .cancel_negotiated_divestiture(set.object, from, &set.attributes)?;
                Payload::CancelNegotiatedAttributeOwnershipDivestiture(set)
            }
            Payload::AttributeOwnershipReleaseResponse(set) => {
                self.phase.check_active()?;
                self.object(set.object)?;
                let notices = self
                    .ownership
                    .release_response(set.object, from, &set.attributes)?;
                self.push_notices(notices, "", out);
                Payload::AttributeOwnershipReleaseResponse(set)
            }
            Payload::CancelAttributeOwnershipAcquisition(set) => {
                self.phase.check_active()?;
                self.object(set.object)?;
                let notices = self
                    .ownership
                    .cancel_acquisition(set.object, from, &set.attributes)?;
                self.push_notices(notices, "", out);
                Payload::CancelAttributeOwnershipAcquisition(set)
            }

            Payload::DdmCreateRegion { space, extents, .. } => {
                self.phase.check_active()?;
                let dimensions = self.model.space_dimensions(space)?;
                let region = self.regions.create(from, space, dimensions, extents.clone())?;
                Payload::DdmCreateRegion {
                    space,
                    extents,
                    region,
                }
            }
            Payload::DdmModifyRegion { region, extents } => {
                self.phase.check_active()?;
                let space = self.regions.owned(from, region)?.space;
                let dimensions = self.model.space_dimensions(space)?;
                self.regions
                    .modify(from, region, dimensions, extents.clone())?;
                Payload::DdmModifyRegion { region, extents }
            }
            Payload::DdmDeleteRegion { region } => {
                self.phase.check_active()?;
                self.regions.delete(from, region)?;
                Payload::DdmDeleteRegion { region }
            }
            Payload::DdmAssociateRegion {
                object,
                region,
                attributes,
            } => {
                self.phase.check_active()?;
                let class = self.object(object)?.class;
                self.model.check_attributes(class, &attributes)?;
                self.regions.associate_object(from, region, object)?;
                Payload::DdmAssociateRegion {
                    object,
                    region,
                    attributes,
                }
            }
            Payload::DdmUnassociateRegion { object, region } => {
                self.phase.check_active()?;
                self.object(object)?;
                self.regions.unassociate_object(from, region, object)?;
                Payload::DdmUnassociateRegion { object, region }
            }
            Payload::DdmRegisterObject {
                class,
                name,
                region,
                attributes,
                ..
            } => {
                let (object, name) = self.register_object(
                    from,
                    class,
                    name,
                    Some((region, attributes.as_slice())),
                    out,
                )?;
                Payload::DdmRegisterObject {
                    class,
                    object,
                    name,
                    region,
                    attributes,
                }
            }
            Payload::DdmSubscribeAttributes {
                class,
                region,
                attributes,
                passive,
            } => {
                self.subscribe_object_class(from, class, region, &attributes, passive, out)?;
                Payload::DdmSubscribeAttributes {
                    class,
                    region,
                    attributes,
                    passive,
                }
            }
            Payload::DdmUnsubscribeAttributes { class, region } => {
                self.unsubscribe_object_class(from, class, region)?;
                Payload::DdmUnsubscribeAttributes { class, region }
            }
            Payload::DdmSubscribeInteraction {
                class,
                region,
                passive,
            } => {
                self.subscribe_interaction(from, class, region, passive)?;
                Payload::DdmSubscribeInteraction {
                    class,
                    region,
                    passive,
                }
            }
            Payload::DdmUnsubscribeInteraction { class, region } => {
                self.unsubscribe_interaction(from, class, region)?;
                Payload::DdmUnsubscribeInteraction { class, region }
            }

            Payload::SetClassRelevanceAdvisorySwitch { on } => {
                self.record_mut(from)?.switches.class_relevance = on;
                Payload::SetClassRelevanceAdvisorySwitch { on }
            }
            Payload::SetInteractionRelevanceAdvisorySwitch { on } => {
                self.record_mut(from)?.switches.interaction_relevance = on;
                Payload::SetInteractionRelevanceAdvisorySwitch { on }
            }
            Payload::SetAttributeRelevanceAdvisorySwitch { on } => {
                self.record_mut(from)?.switches.attribute_relevance = on;
                Payload::SetAttributeRelevanceAdvisorySwitch { on }
            }
            Payload::SetAttributeScopeAdvisorySwitch { on } => {
                self.record_mut(from)?.switches.attribute_scope = on;
                Payload::SetAttributeScopeAdvisorySwitch { on }
            }

            // Membership kinds belong to the registry; the rest are
            // broker-originated and never valid as requests.
            _ => return Err(Exception::RtiInternalError),
        };
        Ok(Some(reply))
    }

    fn push_notices(&self, notices: Vec<OwnershipNotice>, tag: &str, out: &mut Vec<Event>) {
        for notice in notices {
            let to = notice.federate;
            out.push(Event::reliable(to, notice_payload(notice, tag)));
        }
    }

    // Synchronization points

    fn register_sync_point(
        &mut self,
        label: String,
        tag: String,
        federates: Option<Vec<FederateHandle>>,
        out: &mut Vec<Event>,
    ) -> Result<Payload, Exception> {
        if self.sync_points.contains_key(&label) {
            return Err(Exception::SynchronizationPointAlreadyPending);
        }
        let (everyone, addressed): (bool, BTreeSet<FederateHandle>) = match federates {
            Some(set) if !set.is_empty() => (
                false,
                set.into_iter()
                    .filter(|f| self.federates.contains_key(f))
                    .collect(),
            ),
            _ => (true, self.federates.keys().copied().collect()),
        };
        for federate in &addressed {
            out.push(Event::reliable(
                *federate,
                Payload::AnnounceSynchronizationPoint {
                    label: label.clone(),
                    tag: tag.clone(),
                },
            ));
        }
        debug!(
            "Sync point '{}' registered in {} for {} federates",
            label,
            self.name,
            addressed.len()
        );
        self.sync_points.insert(
            label.clone(),
            SyncPoint {
                everyone,
                tag,
                waiting: addressed.clone(),
                addressed,
            },
        );
        Ok(Payload::SynchronizationPointRegistrationSucceeded { label })
    }

    fn sync_point_achieved(
        &mut self,
        from: FederateHandle,
        label: &str,
        out: &mut Vec<Event>,
    ) -> Result<(), Exception> {
        let point = self
            .sync_points
            .get_mut(label)
            .filter(|point| point.addressed.contains(&from))
            .ok_or(Exception::SynchronizationPointLabelWasNotAnnounced)?;
        point.waiting.remove(&from);
        self.resolve_sync_point(label, out);
        Ok(())
    }

    fn resolve_sync_point(&mut self, label: &str, out: &mut Vec<Event>) {
        let resolved = self
            .sync_points
            .get(label)
            .is_some_and(|point| point.waiting.is_empty());
        if !resolved {
            return;
        }
        if let Some(point) = self.sync_points.remove(label) {
            info!("Federation {} synchronized on '{}'", self.name, label);
            for federate in point.addressed {
                out.push(Event::reliable(
                    federate,
                    Payload::FederationSynchronized {
                        label: label.to_string(),
                    },
                ));
            }
        }
    }

    // Save / restore

    fn request_save(
        &mut self,
        label: String,
        time: Option<FederationTime>,
        out: &mut Vec<Event>,
    ) -> Result<Payload, Exception> {
        self.phase.check_active()?;
        info!("Federation {} saving '{}'", self.name, label);
        self.broadcast(
            Payload::InitiateFederateSave {
                label: label.clone(),
            },
            out,
        );
        self.phase = Phase::Saving {
            label: label.clone(),
            waiting: self.federates.keys().copied().collect(),
        };
        Ok(Payload::RequestFederationSave { label, time })
    }

    fn saving_waits_on(&self, federate: FederateHandle) -> Result<(), Exception> {
        match &self.phase {
            Phase::Saving { waiting, .. } if waiting.contains(&federate) => Ok(()),
            _ => Err(Exception::SaveNotInitiated),
        }
    }

    fn save_reported(
        &mut self,
        from: FederateHandle,
        complete: bool,
        out: &mut Vec<Event>,
    ) -> Result<(), Exception> {
        self.saving_waits_on(from)?;
        if !complete {
            info!("Federation {} not saved: {} reported failure", self.name, from);
            self.phase = Phase::Active;
            self.broadcast(Payload::FederationNotSaved, out);
            return Ok(());
        }
        if let Phase::Saving { waiting, .. } = &mut self.phase {
            waiting.remove(&from);
        }
        self.settle_phase(out);
        Ok(())
    }

    fn request_restore(&mut self, label: String, out: &mut Vec<Event>) -> Result<Payload, Exception> {
        self.phase.check_active()?;
        if !self.saved_labels.contains(&label) {
            return Ok(Payload::RequestFederationRestoreFailed {
                reason: format!("no save labelled '{}'", label),
                label,
            });
        }
        info!("Federation {} restoring '{}'", self.name, label);
        self.broadcast(Payload::FederationRestoreBegun, out);
        self.broadcast(
            Payload::InitiateFederateRestore {
                label: label.clone(),
            },
            out,
        );
        self.phase = Phase::Restoring {
            label: label.clone(),
            waiting: self.federates.keys().copied().collect(),
        };
        Ok(Payload::RequestFederationRestoreSucceeded { label })
    }

    fn restore_reported(
        &mut self,
        from: FederateHandle,
        complete: bool,
        out: &mut Vec<Event>,
    ) -> Result<(), Exception> {
        let expected = matches!(
            &self.phase,
            Phase::Restoring { waiting, .. } if waiting.contains(&from)
        );
        if !expected {
            return Err(Exception::RestoreNotRequested);
        }
        if !complete {
            info!("Federation {} not restored: {} reported failure", self.name, from);
            self.phase = Phase::Active;
            self.broadcast(Payload::FederationNotRestored, out);
            return Ok(());
        }
        if let Phase::Restoring { waiting, .. } = &mut self.phase {
            waiting.remove(&from);
        }
        self.settle_phase(out);
        Ok(())
    }

    /// Close a save or restore phase once nobody is left to report.
    fn settle_phase(&mut self, out: &mut Vec<Event>) {
        let settled = match &self.phase {
            Phase::Saving { label, waiting } if waiting.is_empty() => Some((true, label.clone())),
            Phase::Restoring { label, waiting } if waiting.is_empty() => {
                Some((false, label.clone()))
            }
            _ => None,
        };
        let Some((saving, label)) = settled else {
            return;
        };
        self.phase = Phase::Active;
        if saving {
            info!("Federation {} saved '{}'", self.name, label);
            self.saved_labels.insert(label);
            self.broadcast(Payload::FederationSaved, out);
        } else {
            info!("Federation {} restored '{}'", self.name, label);
            self.broadcast(Payload::FederationRestored, out);
        }
    }

    // Declarations

    fn subscribe_object_class(
        &mut self,
        from: FederateHandle,
        class: ObjectClassHandle,
        region: RegionHandle,
        attributes: &[AttributeHandle],
        passive: bool,
        out: &mut Vec<Event>,
    ) -> Result<(), Exception> {
        self.phase.check_active()?;
        self.model.check_attributes(class, attributes)?;
        if !region.is_none() {
            self.regions.subscribe_object_class(from, region, class)?;
        }
        self.record_mut(from)?.subscriptions.insert(
            (class, region),
            ClassSubscription {
                attributes: attributes.iter().copied().collect(),
                passive,
            },
        );

        for (handle, object) in self.objects.iter_mut() {
            if object.class == class
                && object.registrant != from
                && object.discoverers.insert(from)
            {
                out.push(Event::reliable(
                    from,
                    Payload::DiscoverObject {
                        class,
                        object: *handle,
                        name: object.name.clone(),
                    },
                ));
            }
        }
        Ok(())
    }

    fn unsubscribe_object_class(
        &mut self,
        from: FederateHandle,
        class: ObjectClassHandle,
        region: RegionHandle,
    ) -> Result<(), Exception> {
        self.phase.check_active()?;
        self.model.object_class(class)?;
        if region.is_none() {
            if !self.record(from)?.subscriptions.contains_key(&(class, region)) {
                return Err(Exception::ObjectClassNotSubscribed);
            }
        } else {
            self.regions.unsubscribe_object_class(from, region, class)?;
        }
        self.record_mut(from)?.subscriptions.remove(&(class, region));
        Ok(())
    }

    fn subscribe_interaction(
        &mut self,
        from: FederateHandle,
        class: InteractionClassHandle,
        region: RegionHandle,
        passive: bool,
    ) -> Result<(), Exception> {
        self.phase.check_active()?;
        self.model.interaction_class(class)?;
        if !region.is_none() {
            self.regions.subscribe_interaction(from, region, class)?;
        }
        self.record_mut(from)?
            .interaction_subscriptions
            .insert((class, region), passive);
        Ok(())
    }

    fn unsubscribe_interaction(
        &mut self,
        from: FederateHandle,
        class: InteractionClassHandle,
        region: RegionHandle,
    ) -> Result<(), Exception> {
        self.phase.check_active()?;
        self.model.interaction_class(class)?;
        if region.is_none() {
            if !self
                .record(from)?
                .interaction_subscriptions
                .contains_key(&(class, region))
            {
                return Err(Exception::InteractionClassNotSubscribed);
            }
        } else {
            self.regions.unsubscribe_interaction(from, region, class)?;
        }
        self.record_mut(from)?
            .interaction_subscriptions
            .remove(&(class, region));
        Ok(())
    }

    fn relevance(&self) -> Relevance {
        let mut relevance = Relevance::default();
        for publisher in self.federates.values() {
            for class in publisher.publications.keys() {
                let subscribed = self
                    .federates
                    .values()
                    .any(|f| f.handle != publisher.handle && f.actively_subscribes_class(*class));
                if subscribed {
                    relevance.objects.insert((*class, publisher.handle));
                }
            }
            for class in &publisher.interaction_publications {
                let subscribed = self.federates.values().any(|f| {
                    f.handle != publisher.handle && f.actively_subscribes_interaction(*class)
                });
                if subscribed {
                    relevance.interactions.insert((*class, publisher.handle));
                }
            }
        }
        relevance
    }

    /// Relevance advisories for publishers whose status changed since
    /// `before`, honoring each publisher's switches.
    fn advise(&self, before: &Relevance, out: &mut Vec<Event>) {
        let after = self.relevance();
        if after == *before {
            return;
        }
        let class_switch = |federate: &FederateHandle| {
            self.federates
                .get(federate)
                .is_some_and(|record| record.switches.class_relevance)
        };
        for (class, federate) in after.objects.difference(&before.objects) {
            if class_switch(federate) {
                out.push(Event::reliable(
                    *federate,
                    Payload::StartRegistrationForObjectClass { class: *class },
                ));
            }
        }
        for (class, federate) in before.objects.difference(&after.objects) {
            let still_publishes = self
                .federates
                .get(federate)
                .is_some_and(|record| record.publishes_class(*class));
            if still_publishes && class_switch(federate) {
                out.push(Event::reliable(
                    *federate,
                    Payload::StopRegistrationForObjectClass { class: *class },
                ));
            }
        }

        let interaction_switch = |federate: &FederateHandle| {
            self.federates
                .get(federate)
                .is_some_and(|record| record.switches.interaction_relevance)
        };
        for (class, federate) in after.interactions.difference(&before.interactions) {
            if interaction_switch(federate) {
                out.push(Event::reliable(
                    *federate,
                    Payload::TurnInteractionsOn { class: *class },
                ));
            }
        }
        for (class, federate) in before.interactions.difference(&after.interactions) {
            let still_publishes = self
                .federates
                .get(federate)
                .is_some_and(|record| record.publishes_interaction(*class));
            if still_publishes && interaction_switch(federate) {
                out.push(Event::reliable(
                    *federate,
                    Payload::TurnInteractionsOff { class: *class },
                ));
            }
        }
    }

    // Objects and interactions

    fn register_object(
        &mut self,
        from: FederateHandle,
        class: ObjectClassHandle,
        name: String,
        region: Option<(RegionHandle, &[AttributeHandle])>,
        out: &mut Vec<Event>,
    ) -> Result<(ObjectHandle, String), Exception> {
        self.phase.check_active()?;
        let attributes = self.model.object_class(class)?.attribute_handles();
        if !self.record(from)?.publishes_class(class) {
            return Err(Exception::ObjectClassNotPublished);
        }
        if !name.is_empty() && self.object_names.contains_key(&name) {
            return Err(Exception::ObjectAlreadyRegistered);
        }
        if let Some((region, associated)) = region {
            self.regions.owned(from, region)?;
            self.model.check_attributes(class, associated)?;
        }

        let object = ObjectHandle(
            self.object_handles
                .allocate()
                .ok_or(Exception::MemoryExhausted)?,
        );
        let name = if name.is_empty() {
            format!("HLAobject_{}", object.raw())
        } else {
            name
        };
        let view = ClassPublications {
            class,
            federates: &self.federates,
        };
        self.ownership
            .register_object(object, from, &attributes, &view);
        if let Some((region, _)) = region {
            self.regions.associate_object(from, region, object)?;
        }

        let discoverers: BTreeSet<FederateHandle> = self
            .federates
            .values()
            .filter(|record| record.handle != from && record.subscribes_class(class))
            .map(|record| record.handle)
            .collect();
        for federate in &discoverers {
            out.push(Event::reliable(
                *federate,
                Payload::DiscoverObject {
                    class,
                    object,
                    name: name.clone(),
                },
            ));
        }
        self.object_names.insert(name.clone(), object);
        self.objects.insert(
            object,
            ObjectRecord {
                class,
                name: name.clone(),
                registrant: from,
                discoverers,
            },
        );
        debug!("{} registered {} '{}' of {}", from, object, name, class);
        Ok((object, name))
    }

    fn update_attribute_values(
        &mut self,
        from: FederateHandle,
        values: &AttributeValues,
        out: &mut Vec<Event>,
    ) -> Result<(), Exception> {
        self.phase.check_active()?;
        let object = self.object(values.object)?;
        let class = object.class;
        let attributes = values.attributes();
        self.model.check_attributes(class, &attributes)?;
        self.ownership.check_owned(values.object, from, &attributes)?;
        let stamp = match values.time {
            Some(stamp) => self.time.check_stamp(from, stamp)?,
            None => None,
        };

        let recipients = object
            .discoverers
            .iter()
            .copied()
            .chain(std::iter::once(object.registrant))
            .filter(|federate| *federate != from)
            .collect::<BTreeSet<_>>();
        for federate in recipients {
            let Some(record) = self.federates.get(&federate) else {
                continue;
            };
            let subscribed = record.subscribed_attributes(class);
            let reflected: Vec<_> = values
                .values
                .iter()
                .filter(|(attribute, _)| subscribed.contains(attribute))
                .cloned()
                .collect();
            if reflected.is_empty() {
                continue;
            }
            out.push(Event {
                to: federate,
                payload: Payload::ReflectAttributeValues(AttributeValues {
                    class,
                    object: values.object,
                    values: reflected,
                    tag: values.tag.clone(),
                    time: stamp,
                }),
                best_effort: stamp.is_none(),
            });
        }
        Ok(())
    }

    fn send_interaction(
        &mut self,
        from: FederateHandle,
        values: &InteractionValues,
        out: &mut Vec<Event>,
    ) -> Result<(), Exception> {
        self.phase.check_active()?;
        let parameters: Vec<_> = values.parameters.iter().map(|(handle, _)| *handle).collect();
        self.model.check_parameters(values.class, &parameters)?;
        if !self.record(from)?.publishes_interaction(values.class) {
            return Err(Exception::InteractionClassNotPublished);
        }
        if !values.region.is_none() && self.regions.get(values.region).is_none() {
            return Err(Exception::RegionNotKnown);
        }
        let stamp = match values.time {
            Some(stamp) => self.time.check_stamp(from, stamp)?,
            None => None,
        };

        for record in self.federates.values() {
            if record.handle != from && record.subscribes_interaction(values.class) {
                out.push(Event::reliable(
                    record.handle,
                    Payload::ReceiveInteraction(InteractionValues {
                        time: stamp,
                        ..values.clone()
                    }),
                ));
            }
        }
        Ok(())
    }

    fn delete_object(
        &mut self,
        from: FederateHandle,
        object: ObjectHandle,
        tag: &str,
        out: &mut Vec<Event>,
    ) -> Result<(), Exception> {
        self.phase.check_active()?;
        if self.object(object)?.registrant != from {
            return Err(Exception::DeletePrivilegeNotHeld);
        }
        let Some(record) = self.objects.remove(&object) else {
            return Err(Exception::ObjectNotKnown);
        };
        self.object_names.remove(&record.name);
        self.ownership.remove_object(object);
        self.regions.forget_object(object);
        for federate in record.discoverers {
            out.push(Event::reliable(
                federate,
                Payload::RemoveObject {
                    class: record.class,
                    object,
                    tag: tag.to_string(),
                },
            ));
        }
        debug!("{} deleted {}", from, object);
        Ok(())
    }

    /// Ask the owners of `attributes` to provide fresh values.
    fn request_provide(
        &self,
        from: FederateHandle,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
        out: &mut Vec<Event>,
    ) {
        for (owner, owned) in self.ownership.owners(object, attributes) {
            if owner != from {
                out.push(Event::reliable(
                    owner,
                    Payload::ProvideAttributeValueUpdate(ObjectAttributes {
                        object,
                        attributes: owned,
                    }),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{
        "objects": [ { "name": "Vehicle", "attributes": ["position", "speed"] } ],
        "interactions": [ { "name": "Honk", "parameters": ["volume"] } ],
        "spaces": [ { "name": "Geo", "dimensions": ["x"] } ]
    }"#;

    const VEHICLE: ObjectClassHandle = ObjectClassHandle(1);
    const POSITION: AttributeHandle = AttributeHandle(1);
    const SPEED: AttributeHandle = AttributeHandle(2);

    fn federation() -> Federation {
        let model = ClassModel::from_json("traffic", MODEL).unwrap();
        Federation::new(FederationHandle(1), "F", "traffic", model)
    }

    fn join(federation: &mut Federation, name: &str) -> FederateHandle {
        let mut out = Vec::new();
        federation.join(name, 0, &mut out).unwrap()
    }

    fn request(
        federation: &mut Federation,
        from: FederateHandle,
        payload: Payload,
    ) -> (Result<Option<Payload>, Exception>, Vec<Event>) {
        let mut out = Vec::new();
        let reply = federation.handle_request(from, payload, &mut out);
        (reply, out)
    }

    fn kinds_for(events: &[Event], to: FederateHandle) -> Vec<fedrti::MessageKind> {
        events
            .iter()
            .filter(|e| e.to == to)
            .map(|e| e.payload.kind())
            .collect()
    }

    #[test]
    fn test_join_rejects_duplicate_name() {
        let mut federation = federation();
        join(&mut federation, "A");
        let mut out = Vec::new();
        assert_eq!(
            federation.join("A", 1, &mut out),
            Err(Exception::FederateAlreadyExecutionMember)
        );
        assert_eq!(federation.federate_count(), 1);
    }

    #[test]
    fn test_late_joiner_must_achieve_sync_point() {
        let mut federation = federation();
        let a = join(&mut federation, "A");
        let (reply, _) = request(
            &mut federation,
            a,
            Payload::RegisterFederationSynchronizationPoint {
                label: "ready".into(),
                tag: String::new(),
                federates: None,
            },
        );
        assert!(reply.is_ok());

        let mut out = Vec::new();
        let b = federation.join("B", 1, &mut out).unwrap();
        assert_eq!(
            kinds_for(&out, b),
            vec![fedrti::MessageKind::AnnounceSynchronizationPoint]
        );

        let (_, events) = request(
            &mut federation,
            a,
            Payload::SynchronizationPointAchieved {
                label: "ready".into(),
            },
        );
        assert!(events.is_empty());

        let (reply, events) = request(
            &mut federation,
            b,
            Payload::SynchronizationPointAchieved {
                label: "ready".into(),
            },
        );
        assert_eq!(reply, Ok(None));
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|e| e.payload.kind() == fedrti::MessageKind::FederationSynchronized));
    }

    #[test]
    fn test_removal_resolves_sync_point() {
        let mut federation = federation();
        let a = join(&mut federation, "A");
        let b = join(&mut federation, "B");
        request(
            &mut federation,
            a,
            Payload::RegisterFederationSynchronizationPoint {
                label: "go".into(),
                tag: String::new(),
                federates: Some(vec![a, b]),
            },
        );
        request(
            &mut federation,
            a,
            Payload::SynchronizationPointAchieved { label: "go".into() },
        );

        let mut out = Vec::new();
        federation.remove(b, &mut out);
        assert_eq!(
            kinds_for(&out, a),
            vec![fedrti::MessageKind::FederationSynchronized]
        );
        assert_eq!(federation.pending_sync_points().count(), 0);
    }

    #[test]
    fn test_phase_blocks_declarations() {
        let mut federation = federation();
        let a = join(&mut federation, "A");
        request(
            &mut federation,
            a,
            Payload::RequestFederationSave {
                label: "s".into(),
                time: None,
            },
        );
        let (reply, events) = request(
            &mut federation,
            a,
            Payload::PublishObjectClass {
                class: VEHICLE,
                attributes: vec![POSITION],
            },
        );
        assert_eq!(reply, Err(Exception::SaveInProgress));
        assert!(events.is_empty());

        let mut out = Vec::new();
        assert_eq!(
            federation.join("B", 1, &mut out),
            Err(Exception::SaveInProgress)
        );
    }

    #[test]
    fn test_resign_refused_while_divesting() {
        let mut federation = federation();
        let a = join(&mut federation, "A");
        request(
            &mut federation,
            a,
            Payload::PublishObjectClass {
                class: VEHICLE,
                attributes: vec![POSITION, SPEED],
            },
        );
        let (reply, _) = request(
            &mut federation,
            a,
            Payload::RegisterObject {
                class: VEHICLE,
                object: ObjectHandle::NONE,
                name: "car".into(),
            },
        );
        let Ok(Some(Payload::RegisterObject { object, .. })) = reply else {
            panic!("unexpected reply {:?}", reply);
        };
        request(
            &mut federation,
            a,
            Payload::NegotiatedAttributeOwnershipDivestiture(TaggedObjectAttributes {
                object,
                attributes: vec![POSITION],
                tag: String::new(),
            }),
        );

        let mut out = Vec::new();
        assert_eq!(
            federation.resign(a, &mut out),
            Err(Exception::FederateOwnsAttributes)
        );
        assert_eq!(federation.federate_count(), 1);

        federation.remove(a, &mut out);
        assert!(federation.is_empty());
        assert_eq!(federation.owner(object, POSITION), Ok(None));
    }

    #[test]
    fn test_class_relevance_advisory() {
        let mut federation = federation();
        let a = join(&mut federation, "A");
        let b = join(&mut federation, "B");
        request(
            &mut federation,
            a,
            Payload::SetClassRelevanceAdvisorySwitch { on: true },
        );
        request(
            &mut federation,
            a,
            Payload::PublishObjectClass {
                class: VEHICLE,
                attributes: vec![POSITION],
            },
        );

        let (_, events) = request(
            &mut federation,
            b,
            Payload::SubscribeObjectClass {
                class: VEHICLE,
                attributes: vec![POSITION],
            },
        );
        assert_eq!(
            kinds_for(&events, a),
            vec![fedrti::MessageKind::StartRegistrationForObjectClass]
        );

        let (_, events) = request(
            &mut federation,
            b,
            Payload::UnsubscribeObjectClass { class: VEHICLE },
        );
        assert_eq!(
            kinds_for(&events, a),
            vec![fedrti::MessageKind::StopRegistrationForObjectClass]
        );
    }

    #[test]
    fn test_regulator_stamp_below_contribution() {
        let mut federation = federation();
        let a = join(&mut federation, "A");
        request(
            &mut federation,
            a,
            Payload::PublishInteractionClass {
                class: InteractionClassHandle(1),
            },
        );
        request(
            &mut federation,
            a,
            Payload::SetTimeRegulating {
                enabled: true,
                date: FederationTime::new(5.0),
            },
        );
        let (reply, _) = request(
            &mut federation,
            a,
            Payload::SendInteraction(InteractionValues {
                class: InteractionClassHandle(1),
                parameters: vec![],
                tag: String::new(),
                time: Some(FederationTime::new(4.0)),
                region: RegionHandle::NONE,
            }),
        );
        assert_eq!(reply, Err(Exception::InvalidFederationTime));
    }
}
