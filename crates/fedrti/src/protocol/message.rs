// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Messages as a closed tagged variant.
//!
//! A [`Message`] carries the three fixed fields (federation, federate and the
//! outcome) and either a kind-specific [`Payload`] or a [`Rejection`]. The
//! kind is derived from whichever of the two is present, so a payload can
//! never be read under the wrong kind.

use super::kind::MessageKind;
use crate::ddm::Extent;
use crate::exception::Exception;
use crate::handles::{
    AttributeHandle, FederateHandle, FederationHandle, InteractionClassHandle, ObjectClassHandle,
    ObjectHandle, ParameterHandle, RegionHandle, SpaceHandle,
};
use crate::time::FederationTime;
use thiserror::Error;

/// Attribute values of one object, for updates and reflections.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeValues {
    pub class: ObjectClassHandle,
    pub object: ObjectHandle,
    pub values: Vec<(AttributeHandle, Vec<u8>)>,
    pub tag: String,
    /// Present for time-stamp-order delivery.
    pub time: Option<FederationTime>,
}

impl AttributeValues {
    pub fn attributes(&self) -> Vec<AttributeHandle> {
        self.values.iter().map(|(handle, _)| *handle).collect()
    }
}

/// Parameter values of one interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionValues {
    pub class: InteractionClassHandle,
    pub parameters: Vec<(ParameterHandle, Vec<u8>)>,
    pub tag: String,
    pub time: Option<FederationTime>,
    /// `RegionHandle::NONE` when sent without a region.
    pub region: RegionHandle,
}

/// An attribute set on one object, used by the ownership kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectAttributes {
    pub object: ObjectHandle,
    pub attributes: Vec<AttributeHandle>,
}

/// Same as [`ObjectAttributes`] plus a user tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedObjectAttributes {
    pub object: ObjectHandle,
    pub attributes: Vec<AttributeHandle>,
    pub tag: String,
}

/// Kind-specific content. One variant per implemented kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    CloseConnexion,
    MessageNull {
        date: FederationTime,
    },
    CreateFederationExecution {
        federation_name: String,
        descriptor: String,
    },
    DestroyFederationExecution {
        federation_name: String,
    },
    JoinFederationExecution {
        federation_name: String,
        federate_name: String,
        number_of_regulators: u32,
        multicast_address: u32,
        best_effort_address: u32,
        best_effort_peer: u32,
    },
    ResignFederationExecution,
    SetTimeRegulating {
        enabled: bool,
        date: FederationTime,
    },
    SetTimeConstrained {
        enabled: bool,
        date: FederationTime,
    },
    TimeRegulationEnabled {
        date: FederationTime,
    },
    TimeConstrainedEnabled {
        date: FederationTime,
    },

    // Synchronization points
    RegisterFederationSynchronizationPoint {
        label: String,
        tag: String,
        /// `None` addresses every member.
        federates: Option<Vec<FederateHandle>>,
    },
    SynchronizationPointRegistrationSucceeded {
        label: String,
    },
    AnnounceSynchronizationPoint {
        label: String,
        tag: String,
    },
    SynchronizationPointAchieved {
        label: String,
    },
    FederationSynchronized {
        label: String,
    },

    // Save / restore
    RequestFederationSave {
        label: String,
        time: Option<FederationTime>,
    },
    FederateSaveBegun,
    FederateSaveComplete,
    FederateSaveNotComplete,
    InitiateFederateSave {
        label: String,
    },
    FederationSaved,
    FederationNotSaved,
    RequestFederationRestore {
        label: String,
    },
    FederateRestoreComplete,
    FederateRestoreNotComplete,
    RequestFederationRestoreSucceeded {
        label: String,
    },
    RequestFederationRestoreFailed {
        label: String,
        reason: String,
    },
    FederationRestoreBegun,
    InitiateFederateRestore {
        label: String,
    },
    FederationRestored,
    FederationNotRestored,

    // Declarations
    PublishObjectClass {
        class: ObjectClassHandle,
        attributes: Vec<AttributeHandle>,
    },
    UnpublishObjectClass {
        class: ObjectClassHandle,
    },
    PublishInteractionClass {
        class: InteractionClassHandle,
    },
    UnpublishInteractionClass {
        class: InteractionClassHandle,
    },
    SubscribeObjectClass {
        class: ObjectClassHandle,
        attributes: Vec<AttributeHandle>,
    },
    UnsubscribeObjectClass {
        class: ObjectClassHandle,
    },
    SubscribeInteractionClass {
        class: InteractionClassHandle,
    },
    UnsubscribeInteractionClass {
        class: InteractionClassHandle,
    },
    TurnInteractionsOn {
        class: InteractionClassHandle,
    },
    TurnInteractionsOff {
        class: InteractionClassHandle,
    },

    // Objects and interactions
    RegisterObject {
        class: ObjectClassHandle,
        /// `ObjectHandle::NONE` in the request, allocated in the reply.
        object: ObjectHandle,
        name: String,
    },
    DiscoverObject {
        class: ObjectClassHandle,
        object: ObjectHandle,
        name: String,
    },
    UpdateAttributeValues(AttributeValues),
    ReflectAttributeValues(AttributeValues),
    SendInteraction(InteractionValues),
    ReceiveInteraction(InteractionValues),
    DeleteObject {
        object: ObjectHandle,
        tag: String,
    },
    RemoveObject {
        class: ObjectClassHandle,
        object: ObjectHandle,
        tag: String,
    },
    RequestClassAttributeValueUpdate {
        class: ObjectClassHandle,
        attributes: Vec<AttributeHandle>,
    },
    RequestObjectAttributeValueUpdate(ObjectAttributes),
    ProvideAttributeValueUpdate(ObjectAttributes),

    // Ownership
    IsAttributeOwnedByFederate {
        object: ObjectHandle,
        attribute: AttributeHandle,
        /// `RTI_TRUE` / `RTI_FALSE` in the reply.
        tag: String,
    },
    QueryAttributeOwnership {
        object: ObjectHandle,
        attribute: AttributeHandle,
    },
    AttributeIsNotOwned {
        object: ObjectHandle,
        attribute: AttributeHandle,
    },
    InformAttributeOwnership {
        object: ObjectHandle,
        attribute: AttributeHandle,
        owner: FederateHandle,
    },
    NegotiatedAttributeOwnershipDivestiture(TaggedObjectAttributes),
    AttributeOwnershipAcquisitionNotification(ObjectAttributes),
    AttributeOwnershipDivestitureNotification(ObjectAttributes),
    RequestAttributeOwnershipAssumption(TaggedObjectAttributes),
    AttributeOwnershipUnavailable(ObjectAttributes),
    AttributeOwnershipAcquisitionIfAvailable(ObjectAttributes),
    UnconditionalAttributeOwnershipDivestiture(ObjectAttributes),
    AttributeOwnershipAcquisition(TaggedObjectAttributes),
    RequestAttributeOwnershipRelease(TaggedObjectAttributes),
    CancelNegotiatedAttributeOwnershipDivestiture(ObjectAttributes),
    AttributeOwnershipReleaseResponse(ObjectAttributes),
    CancelAttributeOwnershipAcquisition(ObjectAttributes),
    ConfirmAttributeOwnershipAcquisitionCancellation(ObjectAttributes),

    // Data distribution
    DdmCreateRegion {
        space: SpaceHandle,
        extents: Vec<Extent>,
        /// `RegionHandle::NONE` in the request, allocated in the reply.
        region: RegionHandle,
    },
    DdmModifyRegion {
        region: RegionHandle,
        extents: Vec<Extent>,
    },
    DdmDeleteRegion {
        region: RegionHandle,
    },
    DdmAssociateRegion {
        object: ObjectHandle,
        region: RegionHandle,
        attributes: Vec<AttributeHandle>,
    },
    DdmRegisterObject {
        class: ObjectClassHandle,
        object: ObjectHandle,
        name: String,
        region: RegionHandle,
        attributes: Vec<AttributeHandle>,
    },
    DdmUnassociateRegion {
        object: ObjectHandle,
        region: RegionHandle,
    },
    DdmSubscribeAttributes {
        class: ObjectClassHandle,
        region: RegionHandle,
        attributes: Vec<AttributeHandle>,
        passive: bool,
    },
    DdmUnsubscribeAttributes {
        class: ObjectClassHandle,
        region: RegionHandle,
    },
    DdmSubscribeInteraction {
        class: InteractionClassHandle,
        region: RegionHandle,
        passive: bool,
    },
    DdmUnsubscribeInteraction {
        class: InteractionClassHandle,
        region: RegionHandle,
    },

    // Advisories
    GetFedFileSuppressed,
    SetClassRelevanceAdvisorySwitch {
        on: bool,
    },
    SetInteractionRelevanceAdvisorySwitch {
        on: bool,
    },
    SetAttributeRelevanceAdvisorySwitch {
        on: bool,
    },
    SetAttributeScopeAdvisorySwitch {
        on: bool,
    },
    StartRegistrationForObjectClass {
        class: ObjectClassHandle,
    },
    StopRegistrationForObjectClass {
        class: ObjectClassHandle,
    },
}

impl Payload {
    pub fn kind(&self) -> MessageKind {
        use MessageKind as K;
        match self {
            Payload::CloseConnexion => K::CloseConnexion,
            Payload::MessageNull { .. } => K::MessageNull,
            Payload::CreateFederationExecution { .. } => K::CreateFederationExecution,
            Payload::DestroyFederationExecution { .. } => K::DestroyFederationExecution,
            Payload::JoinFederationExecution { .. } => K::JoinFederationExecution,
            Payload::ResignFederationExecution => K::ResignFederationExecution,
            Payload::SetTimeRegulating { .. } => K::SetTimeRegulating,
            Payload::SetTimeConstrained { .. } => K::SetTimeConstrained,
            Payload::TimeRegulationEnabled { .. } => K::TimeRegulationEnabled,
            Payload::TimeConstrainedEnabled { .. } => K::TimeConstrainedEnabled,
            Payload::RegisterFederationSynchronizationPoint { .. } => {
                K::RegisterFederationSynchronizationPoint
            }
            Payload::SynchronizationPointRegistrationSucceeded { .. } => {
                K::SynchronizationPointRegistrationSucceeded
            }
            Payload::AnnounceSynchronizationPoint { .. } => K::AnnounceSynchronizationPoint,
            Payload::SynchronizationPointAchieved { .. } => K::SynchronizationPointAchieved,
            Payload::FederationSynchronized { .. } => K::FederationSynchronized,
            Payload::RequestFederationSave { .. } => K::RequestFederationSave,
            Payload::FederateSaveBegun => K::FederateSaveBegun,
            Payload::FederateSaveComplete => K::FederateSaveComplete,
            Payload::FederateSaveNotComplete => K::FederateSaveNotComplete,
            Payload::InitiateFederateSave { .. } => K::InitiateFederateSave,
            Payload::FederationSaved => K::FederationSaved,
            Payload::FederationNotSaved => K::FederationNotSaved,
            Payload::RequestFederationRestore { .. } => K::RequestFederationRestore,
            Payload::FederateRestoreComplete => K::FederateRestoreComplete,
            Payload::FederateRestoreNotComplete => K::FederateRestoreNotComplete,
            Payload::RequestFederationRestoreSucceeded { .. } => {
                K::RequestFederationRestoreSucceeded
            }
            Payload::RequestFederationRestoreFailed { .. } => K::RequestFederationRestoreFailed,
            Payload::FederationRestoreBegun => K::FederationRestoreBegun,
            Payload::InitiateFederateRestore { .. } => K::InitiateFederateRestore,
            Payload::FederationRestored => K::FederationRestored,
            Payload::FederationNotRestored => K::FederationNotRestored,
            Payload::PublishObjectClass { .. } => K::PublishObjectClass,
            Payload::UnpublishObjectClass { .. } => K::UnpublishObjectClass,
            Payload::PublishInteractionClass { .. } => K::PublishInteractionClass,
            Payload::UnpublishInteractionClass { .. } => K::UnpublishInteractionClass,
            Payload::SubscribeObjectClass { .. } => K::SubscribeObjectClass,
            Payload::UnsubscribeObjectClass { .. } => K::UnsubscribeObjectClass,
            Payload::SubscribeInteractionClass { .. } => K::SubscribeInteractionClass,
            Payload::UnsubscribeInteractionClass { .. } => K::UnsubscribeInteractionClass,
            Payload::TurnInteractionsOn { .. } => K::TurnInteractionsOn,
            Payload::TurnInteractionsOff { .. } => K::TurnInteractionsOff,
            Payload::RegisterObject { .. } => K::RegisterObject,
            Payload::DiscoverObject { .. } => K::DiscoverObject,
            Payload::UpdateAttributeValues(_) => K::UpdateAttributeValues,
            Payload::ReflectAttributeValues(_) => K::ReflectAttributeValues,
            Payload::SendInteraction(_) => K::SendInteraction,
            Payload::ReceiveInteraction(_) => K::ReceiveInteraction,
            Payload::DeleteObject { .. } => K::DeleteObject,
            Payload::RemoveObject { .. } => K::RemoveObject,
            Payload::RequestClassAttributeValueUpdate { .. } => {
                K::RequestClassAttributeValueUpdate
            }
            Payload::RequestObjectAttributeValueUpdate(_) => K::RequestObjectAttributeValueUpdate,
            Payload::ProvideAttributeValueUpdate(_) => K::ProvideAttributeValueUpdate,
            Payload::IsAttributeOwnedByFederate { .. } => K::IsAttributeOwnedByFederate,
            Payload::QueryAttributeOwnership { .. } => K::QueryAttributeOwnership,
            Payload::AttributeIsNotOwned { .. } => K::AttributeIsNotOwned,
            Payload::InformAttributeOwnership { .. } => K::InformAttributeOwnership,
            Payload::NegotiatedAttributeOwnershipDivestiture(_) => {
                K::NegotiatedAttributeOwnershipDivestiture
            }
            Payload::AttributeOwnershipAcquisitionNotification(_) => {
                K::AttributeOwnershipAcquisitionNotification
            }
            Payload::AttributeOwnershipDivestitureNotification(_) => {
                K::AttributeOwnershipDivestitureNotification
            }
            Payload::RequestAttributeOwnershipAssumption(_) => {
                K::RequestAttributeOwnershipAssumption
            }
            Payload::AttributeOwnershipUnavailable(_) => K::AttributeOwnershipUnavailable,
            Payload::AttributeOwnershipAcquisitionIfAvailable(_) => {
                K::AttributeOwnershipAcquisitionIfAvailable
            }
            Payload::UnconditionalAttributeOwnershipDivestiture(_) => {
                K::UnconditionalAttributeOwnershipDivestiture
            }
            Payload::AttributeOwnershipAcquisition(_) => K::AttributeOwnershipAcquisition,
            Payload::RequestAttributeOwnershipRelease(_) => K::RequestAttributeOwnershipRelease,
            Payload::CancelNegotiatedAttributeOwnershipDivestiture(_) => {
                K::CancelNegotiatedAttributeOwnershipDivestiture
            }
            Payload::AttributeOwnershipReleaseResponse(_) => K::AttributeOwnershipReleaseResponse,
            Payload::CancelAttributeOwnershipAcquisition(_) => {
                K::CancelAttributeOwnershipAcquisition
            }
            Payload::ConfirmAttributeOwnershipAcquisitionCancellation(_) => {
                K::ConfirmAttributeOwnershipAcquisitionCancellation
            }
            Payload::DdmCreateRegion { .. } => K::DdmCreateRegion,
            Payload::DdmModifyRegion { .. } => K::DdmModifyRegion,
            Payload::DdmDeleteRegion { .. } => K::DdmDeleteRegion,
            Payload::DdmAssociateRegion { .. } => K::DdmAssociateRegion,
            Payload::DdmRegisterObject { .. } => K::DdmRegisterObject,
            Payload::DdmUnassociateRegion { .. } => K::DdmUnassociateRegion,
            Payload::DdmSubscribeAttributes { .. } => K::DdmSubscribeAttributes,
            Payload::DdmUnsubscribeAttributes { .. } => K::DdmUnsubscribeAttributes,
            Payload::DdmSubscribeInteraction { .. } => K::DdmSubscribeInteraction,
            Payload::DdmUnsubscribeInteraction { .. } => K::DdmUnsubscribeInteraction,
            Payload::GetFedFileSuppressed => K::GetFedFileSuppressed,
            Payload::SetClassRelevanceAdvisorySwitch { .. } => K::SetClassRelevanceAdvisorySwitch,
            Payload::SetInteractionRelevanceAdvisorySwitch { .. } => {
                K::SetInteractionRelevanceAdvisorySwitch
            }
            Payload::SetAttributeRelevanceAdvisorySwitch { .. } => {
                K::SetAttributeRelevanceAdvisorySwitch
            }
            Payload::SetAttributeScopeAdvisorySwitch { .. } => K::SetAttributeScopeAdvisorySwitch,
            Payload::StartRegistrationForObjectClass { .. } => K::StartRegistrationForObjectClass,
            Payload::StopRegistrationForObjectClass { .. } => K::StopRegistrationForObjectClass,
        }
    }
}

/// A request refused by the broker, or a fatal local protocol error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{exception} ({kind}): {reason}")]
pub struct Rejection {
    /// Kind of the request this answers.
    pub kind: MessageKind,
    pub exception: Exception,
    pub reason: String,
}

impl Rejection {
    pub fn new(kind: MessageKind, exception: Exception, reason: impl Into<String>) -> Self {
        Self {
            kind,
            exception,
            reason: reason.into(),
        }
    }
}

/// One coordination message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub federation: FederationHandle,
    pub federate: FederateHandle,
    pub body: Result<Payload, Rejection>,
}

impl Message {
    pub fn new(federation: FederationHandle, federate: FederateHandle, payload: Payload) -> Self {
        Self {
            federation,
            federate,
            body: Ok(payload),
        }
    }

    pub fn rejected(
        federation: FederationHandle,
        federate: FederateHandle,
        rejection: Rejection,
    ) -> Self {
        Self {
            federation,
            federate,
            body: Err(rejection),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match &self.body {
            Ok(payload) => payload.kind(),
            Err(rejection) => rejection.kind,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.body.as_ref().ok()
    }

    pub fn is_rejection(&self) -> bool {
        self.body.is_err()
    }
}
