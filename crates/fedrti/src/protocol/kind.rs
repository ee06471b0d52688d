// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The closed catalogue of message kinds and their wire codes.

use std::fmt;

macro_rules! define_kinds {
    ($($variant:ident = $code:literal => $name:literal,)*) => {
        /// Every message kind exchanged between a federate and the broker.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum MessageKind {
            $($variant = $code,)*
        }

        impl MessageKind {
            /// Every kind, in wire-code order.
            pub const ALL: &'static [MessageKind] = &[$(MessageKind::$variant,)*];

            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some(MessageKind::$variant),)*
                    _ => None,
                }
            }

            pub const fn code(self) -> u8 {
                self as u8
            }

            pub const fn name(self) -> &'static str {
                match self {
                    $(MessageKind::$variant => $name,)*
                }
            }
        }
    };
}

define_kinds! {
    CloseConnexion = 1 => "CLOSE_CONNEXION",
    MessageNull = 2 => "MESSAGE_NULL",
    CreateFederationExecution = 3 => "CREATE_FEDERATION_EXECUTION",
    DestroyFederationExecution = 4 => "DESTROY_FEDERATION_EXECUTION",
    JoinFederationExecution = 5 => "JOIN_FEDERATION_EXECUTION",
    ResignFederationExecution = 6 => "RESIGN_FEDERATION_EXECUTION",
    SetTimeRegulating = 7 => "SET_TIME_REGULATING",
    SetTimeConstrained = 8 => "SET_TIME_CONSTRAINED",
    TimeRegulationEnabled = 9 => "TIME_REGULATION_ENABLED",
    TimeConstrainedEnabled = 10 => "TIME_CONSTRAINED_ENABLED",
    RegisterFederationSynchronizationPoint = 11 => "REGISTER_FEDERATION_SYNCHRONIZATION_POINT",
    SynchronizationPointRegistrationSucceeded = 12 => "SYNCHRONIZATION_POINT_REGISTRATION_SUCCEEDED",
    AnnounceSynchronizationPoint = 13 => "ANNOUNCE_SYNCHRONIZATION_POINT",
    SynchronizationPointAchieved = 14 => "SYNCHRONIZATION_POINT_ACHIEVED",
    FederationSynchronized = 15 => "FEDERATION_SYNCHRONIZED",
    RequestFederationSave = 16 => "REQUEST_FEDERATION_SAVE",
    FederateSaveBegun = 17 => "FEDERATE_SAVE_BEGUN",
    FederateSaveComplete = 18 => "FEDERATE_SAVE_COMPLETE",
    FederateSaveNotComplete = 19 => "FEDERATE_SAVE_NOT_COMPLETE",
    InitiateFederateSave = 20 => "INITIATE_FEDERATE_SAVE",
    FederationSaved = 21 => "FEDERATION_SAVED",
    FederationNotSaved = 22 => "FEDERATION_NOT_SAVED",
    RequestFederationRestore = 23 => "REQUEST_FEDERATION_RESTORE",
    FederateRestoreComplete = 24 => "FEDERATE_RESTORE_COMPLETE",
    FederateRestoreNotComplete = 25 => "FEDERATE_RESTORE_NOT_COMPLETE",
    RequestFederationRestoreSucceeded = 26 => "REQUEST_FEDERATION_RESTORE_SUCCEEDED",
    RequestFederationRestoreFailed = 27 => "REQUEST_FEDERATION_RESTORE_FAILED",
    FederationRestoreBegun = 28 => "FEDERATION_RESTORE_BEGUN",
    InitiateFederateRestore = 29 => "INITIATE_FEDERATE_RESTORE",
    FederationRestored = 30 => "FEDERATION_RESTORED",
    FederationNotRestored = 31 => "FEDERATION_NOT_RESTORED",
    PublishObjectClass = 32 => "PUBLISH_OBJECT_CLASS",
    UnpublishObjectClass = 33 => "UNPUBLISH_OBJECT_CLASS",
    PublishInteractionClass = 34 => "PUBLISH_INTERACTION_CLASS",
    UnpublishInteractionClass = 35 => "UNPUBLISH_INTERACTION_CLASS",
    SubscribeObjectClass = 36 => "SUBSCRIBE_OBJECT_CLASS",
    UnsubscribeObjectClass = 37 => "UNSUBSCRIBE_OBJECT_CLASS",
    SubscribeInteractionClass = 38 => "SUBSCRIBE_INTERACTION_CLASS",
    UnsubscribeInteractionClass = 39 => "UNSUBSCRIBE_INTERACTION_CLASS",
    TurnInteractionsOn = 40 => "TURN_INTERACTIONS_ON",
    TurnInteractionsOff = 41 => "TURN_INTERACTIONS_OFF",
    RegisterObject = 42 => "REGISTER_OBJECT",
    DiscoverObject = 43 => "DISCOVER_OBJECT",
    UpdateAttributeValues = 44 => "UPDATE_ATTRIBUTE_VALUES",
    ReflectAttributeValues = 45 => "REFLECT_ATTRIBUTE_VALUES",
    SendInteraction = 46 => "SEND_INTERACTION",
    ReceiveInteraction = 47 => "RECEIVE_INTERACTION",
    DeleteObject = 48 => "DELETE_OBJECT",
    RemoveObject = 49 => "REMOVE_OBJECT",
    ChangeAttributeTransportType = 50 => "CHANGE_ATTRIBUTE_TRANSPORT_TYPE",
    ChangeAttributeOrderType = 51 => "CHANGE_ATTRIBUTE_ORDER_TYPE",
    ChangeInteractionTransportType = 52 => "CHANGE_INTERACTION_TRANSPORT_TYPE",
    ChangeInteractionOrderType = 53 => "CHANGE_INTERACTION_ORDER_TYPE",
    RequestClassAttributeValueUpdate = 54 => "REQUEST_CLASS_ATTRIBUTE_VALUE_UPDATE",
    RequestObjectAttributeValueUpdate = 55 => "REQUEST_OBJECT_ATTRIBUTE_VALUE_UPDATE",
    IsAttributeOwnedByFederate = 56 => "IS_ATTRIBUTE_OWNED_BY_FEDERATE",
    QueryAttributeOwnership = 57 => "QUERY_ATTRIBUTE_OWNERSHIP",
    AttributeIsNotOwned = 58 => "ATTRIBUTE_IS_NOT_OWNED",
    InformAttributeOwnership = 59 => "INFORM_ATTRIBUTE_OWNERSHIP",
    NegotiatedAttributeOwnershipDivestiture = 60 => "NEGOTIATED_ATTRIBUTE_OWNERSHIP_DIVESTITURE",
    AttributeOwnershipAcquisitionNotification = 61 => "ATTRIBUTE_OWNERSHIP_ACQUISITION_NOTIFICATION",
    AttributeOwnershipDivestitureNotification = 62 => "ATTRIBUTE_OWNERSHIP_DIVESTITURE_NOTIFICATION",
    RequestAttributeOwnershipAssumption = 63 => "REQUEST_ATTRIBUTE_OWNERSHIP_ASSUMPTION",
    AttributeOwnershipUnavailable = 64 => "ATTRIBUTE_OWNERSHIP_UNAVAILABLE",
    AttributeOwnershipAcquisitionIfAvailable = 65 => "ATTRIBUTE_OWNERSHIP_ACQUISITION_IF_AVAILABLE",
    UnconditionalAttributeOwnershipDivestiture = 66 => "UNCONDITIONAL_ATTRIBUTE_OWNERSHIP_DIVESTITURE",
    AttributeOwnershipAcquisition = 67 => "ATTRIBUTE_OWNERSHIP_ACQUISITION",
    RequestAttributeOwnershipRelease = 68 => "REQUEST_ATTRIBUTE_OWNERSHIP_RELEASE",
    CancelNegotiatedAttributeOwnershipDivestiture = 69 => "CANCEL_NEGOTIATED_ATTRIBUTE_OWNERSHIP_DIVESTITURE",
    AttributeOwnershipReleaseResponse = 70 => "ATTRIBUTE_OWNERSHIP_RELEASE_RESPONSE",
    CancelAttributeOwnershipAcquisition = 71 => "CANCEL_ATTRIBUTE_OWNERSHIP_ACQUISITION",
    ConfirmAttributeOwnershipAcquisitionCancellation = 72 => "CONFIRM_ATTRIBUTE_OWNERSHIP_ACQUISITION_CANCELLATION",
    DdmCreateRegion = 73 => "DDM_CREATE_REGION",
    DdmModifyRegion = 74 => "DDM_MODIFY_REGION",
    DdmDeleteRegion = 75 => "DDM_DELETE_REGION",
    DdmAssociateRegion = 76 => "DDM_ASSOCIATE_REGION",
    DdmRegisterObject = 77 => "DDM_REGISTER_OBJECT",
    DdmUnassociateRegion = 78 => "DDM_UNASSOCIATE_REGION",
    DdmSubscribeAttributes = 79 => "DDM_SUBSCRIBE_ATTRIBUTES",
    DdmUnsubscribeAttributes = 80 => "DDM_UNSUBSCRIBE_ATTRIBUTES",
    DdmSubscribeInteraction = 81 => "DDM_SUBSCRIBE_INTERACTION",
    DdmUnsubscribeInteraction = 82 => "DDM_UNSUBSCRIBE_INTERACTION",
    ProvideAttributeValueUpdate = 83 => "PROVIDE_ATTRIBUTE_VALUE_UPDATE",
    GetFedFileSuppressed = 84 => "GET_FED_FILE_SUPPRESSED",
    SetClassRelevanceAdvisorySwitch = 85 => "SET_CLASS_RELEVANCE_ADVISORY_SWITCH",
    SetInteractionRelevanceAdvisorySwitch = 86 => "SET_INTERACTION_RELEVANCE_ADVISORY_SWITCH",
    SetAttributeRelevanceAdvisorySwitch = 87 => "SET_ATTRIBUTE_RELEVANCE_ADVISORY_SWITCH",
    SetAttributeScopeAdvisorySwitch = 88 => "SET_ATTRIBUTE_SCOPE_ADVISORY_SWITCH",
    StartRegistrationForObjectClass = 89 => "START_REGISTRATION_FOR_OBJECT_CLASS",
    StopRegistrationForObjectClass = 90 => "STOP_REGISTRATION_FOR_OBJECT_CLASS",
}

impl MessageKind {
    /// Kinds only the broker ever sends.
    pub const fn is_broker_originated(self) -> bool {
        use MessageKind::*;
        matches!(
            self,
            TimeRegulationEnabled
                | TimeConstrainedEnabled
                | SynchronizationPointRegistrationSucceeded
                | AnnounceSynchronizationPoint
                | FederationSynchronized
                | InitiateFederateSave
                | FederationSaved
                | FederationNotSaved
                | RequestFederationRestoreSucceeded
                | RequestFederationRestoreFailed
                | FederationRestoreBegun
                | InitiateFederateRestore
                | FederationRestored
                | FederationNotRestored
                | TurnInteractionsOn
                | TurnInteractionsOff
                | DiscoverObject
                | ReflectAttributeValues
                | ReceiveInteraction
                | RemoveObject
                | AttributeIsNotOwned
                | InformAttributeOwnership
                | AttributeOwnershipAcquisitionNotification
                | AttributeOwnershipDivestitureNotification
                | RequestAttributeOwnershipAssumption
                | AttributeOwnershipUnavailable
                | RequestAttributeOwnershipRelease
                | ConfirmAttributeOwnershipAcquisitionCancellation
                | ProvideAttributeValueUpdate
                | StartRegistrationForObjectClass
                | StopRegistrationForObjectClass
        )
    }

    /// Requests the broker processes without answering.
    pub const fn is_fire_and_forget(self) -> bool {
        use MessageKind::*;
        matches!(
            self,
            CloseConnexion
                | MessageNull
                | SynchronizationPointAchieved
                | FederateSaveBegun
                | FederateSaveComplete
                | FederateSaveNotComplete
                | FederateRestoreComplete
                | FederateRestoreNotComplete
                | GetFedFileSuppressed
        )
    }

    /// Kinds with no body layout. They exist in the catalogue but cannot be
    /// encoded, and decoding one is fatal.
    pub const fn is_unimplemented(self) -> bool {
        use MessageKind::*;
        matches!(
            self,
            ChangeAttributeTransportType
                | ChangeAttributeOrderType
                | ChangeInteractionTransportType
                | ChangeInteractionOrderType
        )
    }

    /// True if the broker sends a reply of kind `reply` to a successful
    /// request of this kind. Rejections always carry the request kind.
    pub fn accepts_reply(self, reply: MessageKind) -> bool {
        use MessageKind::*;
        match self {
            SetTimeRegulating => matches!(reply, TimeRegulationEnabled | SetTimeRegulating),
            SetTimeConstrained => matches!(reply, TimeConstrainedEnabled | SetTimeConstrained),
            RegisterFederationSynchronizationPoint => {
                reply == SynchronizationPointRegistrationSucceeded
            }
            RequestFederationRestore => matches!(
                reply,
                RequestFederationRestoreSucceeded | RequestFederationRestoreFailed
            ),
            QueryAttributeOwnership => {
                matches!(reply, InformAttributeOwnership | AttributeIsNotOwned)
            }
            other => other == reply,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_is_dense() {
        assert_eq!(MessageKind::ALL.len(), 90);
        for (index, kind) in MessageKind::ALL.iter().enumerate() {
            assert_eq!(kind.code() as usize, index + 1);
            assert_eq!(MessageKind::from_code(kind.code()), Some(*kind));
        }
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(MessageKind::from_code(0), None);
        assert_eq!(MessageKind::from_code(91), None);
    }

    #[test]
    fn test_reply_matching() {
        assert!(MessageKind::PublishObjectClass.accepts_reply(MessageKind::PublishObjectClass));
        assert!(MessageKind::SetTimeRegulating.accepts_reply(MessageKind::TimeRegulationEnabled));
        assert!(!MessageKind::RegisterObject.accepts_reply(MessageKind::DiscoverObject));
        assert!(MessageKind::QueryAttributeOwnership
            .accepts_reply(MessageKind::AttributeIsNotOwned));
    }

    #[test]
    fn test_direction_sets_are_disjoint() {
        for kind in MessageKind::ALL {
            assert!(!(kind.is_broker_originated() && kind.is_fire_and_forget()));
        }
    }
}
