// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Named exceptions carried back to a requester.
//!
//! The set is closed and each member has a stable one-byte wire code. Code
//! `0` is reserved for "no exception" in the message header.

use std::fmt;

macro_rules! define_exceptions {
    ($($variant:ident = $code:literal => $name:literal,)*) => {
        /// A request-rejected condition, named after the HLA exception it maps to.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Exception {
            $($variant = $code,)*
        }

        impl Exception {
            /// Every exception, in wire-code order.
            pub const ALL: &'static [Exception] = &[$(Exception::$variant,)*];

            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some(Exception::$variant),)*
                    _ => None,
                }
            }

            pub const fn code(self) -> u8 {
                self as u8
            }

            pub const fn name(self) -> &'static str {
                match self {
                    $(Exception::$variant => $name,)*
                }
            }
        }
    };
}

define_exceptions! {
    ArrayIndexOutOfBounds = 1 => "ArrayIndexOutOfBounds",
    AttributeAcquisitionWasNotRequested = 2 => "AttributeAcquisitionWasNotRequested",
    AttributeAlreadyBeingAcquired = 3 => "AttributeAlreadyBeingAcquired",
    AttributeAlreadyBeingDivested = 4 => "AttributeAlreadyBeingDivested",
    AttributeAlreadyOwned = 5 => "AttributeAlreadyOwned",
    AttributeDivestitureWasNotRequested = 6 => "AttributeDivestitureWasNotRequested",
    AttributeNotDefined = 7 => "AttributeNotDefined",
    AttributeNotKnown = 8 => "AttributeNotKnown",
    AttributeNotOwned = 9 => "AttributeNotOwned",
    AttributeNotPublished = 10 => "AttributeNotPublished",
    AttributeNotSubscribed = 11 => "AttributeNotSubscribed",
    CouldNotOpenFed = 12 => "CouldNotOpenFED",
    CouldNotRestore = 13 => "CouldNotRestore",
    DeletePrivilegeNotHeld = 14 => "DeletePrivilegeNotHeld",
    ErrorReadingFed = 15 => "ErrorReadingFED",
    FederateAlreadyExecutionMember = 16 => "FederateAlreadyExecutionMember",
    FederateInternalError = 17 => "FederateInternalError",
    FederateNotExecutionMember = 18 => "FederateNotExecutionMember",
    FederateOwnsAttributes = 19 => "FederateOwnsAttributes",
    FederateWasNotAskedToReleaseAttribute = 20 => "FederateWasNotAskedToReleaseAttribute",
    FederatesCurrentlyJoined = 21 => "FederatesCurrentlyJoined",
    FederationExecutionAlreadyExists = 22 => "FederationExecutionAlreadyExists",
    FederationExecutionDoesNotExist = 23 => "FederationExecutionDoesNotExist",
    FederationTimeAlreadyPassed = 24 => "FederationTimeAlreadyPassed",
    InteractionClassNotDefined = 25 => "InteractionClassNotDefined",
    InteractionClassNotPublished = 26 => "InteractionClassNotPublished",
    InteractionClassNotSubscribed = 27 => "InteractionClassNotSubscribed",
    InteractionParameterNotDefined = 28 => "InteractionParameterNotDefined",
    InvalidExtents = 29 => "InvalidExtents",
    InvalidFederationTime = 30 => "InvalidFederationTime",
    InvalidLookahead = 31 => "InvalidLookahead",
    InvalidRegionContext = 32 => "InvalidRegionContext",
    MemoryExhausted = 33 => "MemoryExhausted",
    ObjectAlreadyRegistered = 34 => "ObjectAlreadyRegistered",
    ObjectClassNotDefined = 35 => "ObjectClassNotDefined",
    ObjectClassNotPublished = 36 => "ObjectClassNotPublished",
    ObjectClassNotSubscribed = 37 => "ObjectClassNotSubscribed",
    ObjectNotKnown = 38 => "ObjectNotKnown",
    RegionInUse = 39 => "RegionInUse",
    RegionNotKnown = 40 => "RegionNotKnown",
    RestoreInProgress = 41 => "RestoreInProgress",
    RestoreNotRequested = 42 => "RestoreNotRequested",
    RtiInternalError = 43 => "RTIinternalError",
    SaveInProgress = 44 => "SaveInProgress",
    SaveNotInitiated = 45 => "SaveNotInitiated",
    SpaceNotDefined = 46 => "SpaceNotDefined",
    SynchronizationPointLabelWasNotAnnounced = 47 => "SynchronizationPointLabelWasNotAnnounced",
    SynchronizationPointAlreadyPending = 48 => "SynchronizationPointAlreadyPending",
    TimeAdvanceAlreadyInProgress = 49 => "TimeAdvanceAlreadyInProgress",
    TimeConstrainedAlreadyEnabled = 50 => "TimeConstrainedAlreadyEnabled",
    TimeConstrainedWasNotEnabled = 51 => "TimeConstrainedWasNotEnabled",
    TimeRegulationAlreadyEnabled = 52 => "TimeRegulationAlreadyEnabled",
    TimeRegulationWasNotEnabled = 53 => "TimeRegulationWasNotEnabled",
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for exception in Exception::ALL {
            assert_eq!(Exception::from_code(exception.code()), Some(*exception));
        }
    }

    #[test]
    fn test_code_zero_is_not_an_exception() {
        assert_eq!(Exception::from_code(0), None);
        assert_eq!(Exception::from_code(200), None);
    }

    #[test]
    fn test_display_uses_hla_name() {
        assert_eq!(Exception::RtiInternalError.to_string(), "RTIinternalError");
        assert_eq!(Exception::CouldNotOpenFed.to_string(), "CouldNotOpenFED");
    }
}
