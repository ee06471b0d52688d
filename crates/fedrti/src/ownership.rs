// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Attribute ownership transfer.
//!
//! One [`OwnershipEntry`] per (object, attribute). Every operation checks
//! all requested attributes first and mutates only when the whole request
//! is valid, so a rejected request leaves the table untouched. Operations
//! return the [`OwnershipNotice`]s the broker must deliver.
//!
//! ```text
//!             negotiated divest             acquire (candidate)
//!  Owned(f) -------------------> Divesting(f) ------------------> Owned(g)
//!     ^                              |
//!     +------- cancel divest --------+
//!
//!  Owned(f) -- acquire by g --> Owned(f) + acquirer g -- release --> Owned(g)
//!  Owned(f) -- unconditional divest --> Owned(next acquirer) | Unowned
//! ```

use crate::exception::Exception;
use crate::handles::{AttributeHandle, FederateHandle, ObjectHandle};
use std::collections::{BTreeMap, BTreeSet};

/// Which federates publish which attributes of an object's class.
pub trait PublicationView {
    fn publishes(&self, federate: FederateHandle, attribute: AttributeHandle) -> bool;

    /// Publishers of `attribute`, in handle order.
    fn publishers(&self, attribute: AttributeHandle) -> Vec<FederateHandle>;
}

/// Ownership state of one attribute of one object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnershipEntry {
    owner: Option<FederateHandle>,
    divesting: bool,
    acquirers: Vec<FederateHandle>,
}

impl OwnershipEntry {
    pub fn owner(&self) -> Option<FederateHandle> {
        self.owner
    }

    /// Owner asked for a negotiated divestiture that is still open.
    pub fn is_divesting(&self) -> bool {
        self.divesting
    }

    /// Federates waiting to acquire, in request order.
    pub fn acquirers(&self) -> &[FederateHandle] {
        &self.acquirers
    }

    fn transfer(&mut self, to: FederateHandle) -> Option<FederateHandle> {
        let previous = self.owner.replace(to);
        self.divesting = false;
        self.acquirers.retain(|f| *f != to);
        previous
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeKind {
    AcquisitionNotification,
    DivestitureNotification,
    AssumptionRequest,
    ReleaseRequest,
    Unavailable,
    CancellationConfirmed,
}

/// A notification for one federate about a set of attributes of one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipNotice {
    pub kind: NoticeKind,
    pub federate: FederateHandle,
    pub object: ObjectHandle,
    pub attributes: Vec<AttributeHandle>,
}

/// Collects per-attribute notices and groups them by (kind, federate).
struct Notices {
    object: ObjectHandle,
    grouped: BTreeMap<(NoticeKind, FederateHandle), Vec<AttributeHandle>>,
}

impl Notices {
    fn new(object: ObjectHandle) -> Self {
        Self {
            object,
            grouped: BTreeMap::new(),
        }
    }

    fn push(&mut self, kind: NoticeKind, federate: FederateHandle, attribute: AttributeHandle) {
        self.grouped
            .entry((kind, federate))
            .or_default()
            .push(attribute);
    }

    fn finish(self) -> Vec<OwnershipNotice> {
        let object = self.object;
        self.grouped
            .into_iter()
            .map(|((kind, federate), attributes)| OwnershipNotice {
                kind,
                federate,
                object,
                attributes,
            })
            .collect()
    }
}

/// Attribute lists come off the wire; a repeated handle counts once.
fn distinct(attributes: &[AttributeHandle]) -> Vec<AttributeHandle> {
    let mut seen = BTreeSet::new();
    attributes
        .iter()
        .copied()
        .filter(|attribute| seen.insert(*attribute))
        .collect()
}

/// Ownership of every attribute of every registered object of a federation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnershipTable {
    entries: BTreeMap<(ObjectHandle, AttributeHandle), OwnershipEntry>,
}

impl OwnershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create entries for a new object. The registrant owns the attributes
    /// it publishes; the rest start unowned.
    pub fn register_object(
        &mut self,
        object: ObjectHandle,
        registrant: FederateHandle,
        attributes: &[AttributeHandle],
        view: &dyn PublicationView,
    ) {
        for attribute in attributes {
            let owner = view
                .publishes(registrant, *attribute)
                .then_some(registrant);
            self.entries.insert(
                (object, *attribute),
                OwnershipEntry {
                    owner,
                    ..OwnershipEntry::default()
                },
            );
        }
    }

    pub fn remove_object(&mut self, object: ObjectHandle) {
        self.entries.retain(|(o, _), _| *o != object);
    }

    pub fn entry(&self, object: ObjectHandle, attribute: AttributeHandle) -> Option<&OwnershipEntry> {
        self.entries.get(&(object, attribute))
    }

    pub fn owner(
        &self,
        object: ObjectHandle,
        attribute: AttributeHandle,
    ) -> Result<Option<FederateHandle>, Exception> {
        self.entries
            .get(&(object, attribute))
            .map(|e| e.owner)
            .ok_or(Exception::AttributeNotDefined)
    }

    pub fn is_owned_by(
        &self,
        object: ObjectHandle,
        attribute: AttributeHandle,
        federate: FederateHandle,
    ) -> bool {
        matches!(self.owner(object, attribute), Ok(Some(owner)) if owner == federate)
    }

    /// Fail with `AttributeNotOwned` unless `federate` owns all `attributes`.
    pub fn check_owned(
        &self,
        object: ObjectHandle,
        federate: FederateHandle,
        attributes: &[AttributeHandle],
    ) -> Result<(), Exception> {
        for attribute in attributes {
            if self.owner(object, *attribute)? != Some(federate) {
                return Err(Exception::AttributeNotOwned);
            }
        }
        Ok(())
    }

    /// Distinct owners of `attributes`, unowned ones skipped.
    pub fn owners(
        &self,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> BTreeMap<FederateHandle, Vec<AttributeHandle>> {
        let mut owners: BTreeMap<FederateHandle, Vec<AttributeHandle>> = BTreeMap::new();
        for attribute in attributes {
            if let Some(Some(owner)) = self.entries.get(&(object, *attribute)).map(|e| e.owner) {
                owners.entry(owner).or_default().push(*attribute);
            }
        }
        owners
    }

    fn get(&self, object: ObjectHandle, attribute: AttributeHandle) -> Result<&OwnershipEntry, Exception> {
        self.entries
            .get(&(object, attribute))
            .ok_or(Exception::AttributeNotDefined)
    }

    fn get_mut(&mut self, object: ObjectHandle, attribute: AttributeHandle) -> &mut OwnershipEntry {
        self.entries.entry((object, attribute)).or_default()
    }

    pub fn negotiated_divestiture(
        &mut self,
        object: ObjectHandle,
        federate: FederateHandle,
        attributes: &[AttributeHandle],
        view: &dyn PublicationView,
    ) -> Result<Vec<OwnershipNotice>, Exception> {
        let attributes = &distinct(attributes);
        for attribute in attributes {
            let entry = self.get(object, *attribute)?;
            if entry.owner != Some(federate) {
                return Err(Exception::AttributeNotOwned);
            }
            if entry.divesting {
                return Err(Exception::AttributeAlreadyBeingDivested);
            }
        }

        let mut notices = Notices::new(object);
        for attribute in attributes {
            let entry = self.get_mut(object, *attribute);
            match entry.acquirers.first().copied() {
                Some(next) => {
                    entry.transfer(next);
                    notices.push(NoticeKind::DivestitureNotification, federate, *attribute);
                    notices.push(NoticeKind::AcquisitionNotification, next, *attribute);
                }
                None => {
                    entry.divesting = true;
                    for candidate in view.publishers(*attribute) {
                        if candidate != federate {
                            notices.push(NoticeKind::AssumptionRequest, candidate, *attribute);
                        }
                    }
                }
            }
        }
        Ok(notices.finish())
    }

    pub fn acquisition(
        &mut self,
        object: ObjectHandle,
        federate: FederateHandle,
        attributes: &[AttributeHandle],
        view: &dyn PublicationView,
    ) -> Result<Vec<OwnershipNotice>, Exception> {
        let attributes = &distinct(attributes);
        for attribute in attributes {
            let entry = self.get(object, *attribute)?;
            if !view.publishes(federate, *attribute) {
                return Err(Exception::AttributeNotPublished);
            }
            if entry.owner == Some(federate) {
                return Err(Exception::FederateOwnsAttributes);
            }
            if entry.acquirers.contains(&federate) {
                return Err(Exception::AttributeAlreadyBeingAcquired);
            }
        }

        let mut notices = Notices::new(object);
        for attribute in attributes {
            let entry = self.get_mut(object, *attribute);
            match entry.owner {
                None => {
                    entry.transfer(federate);
                    notices.push(NoticeKind::AcquisitionNotification, federate, *attribute);
                }
                Some(owner) if entry.divesting => {
                    entry.transfer(federate);
                    notices.push(NoticeKind::DivestitureNotification, owner, *attribute);
                    notices.push(NoticeKind::AcquisitionNotification, federate, *attribute);
                }
                Some(owner) => {
                    entry.acquirers.push(federate);
                    notices.push(NoticeKind::ReleaseRequest, owner, *attribute);
                }
            }
        }
        Ok(notices.finish())
    }

    /// Only unowned attributes are handed over; the others are reported
    /// unavailable.
    pub fn acquisition_if_available(
        &mut self,
        object: ObjectHandle,
        federate: FederateHandle,
        attributes: &[AttributeHandle],
        view: &dyn PublicationView,
    ) -> Result<Vec<OwnershipNotice>, Exception> {
        let attributes = &distinct(attributes);
        for attribute in attributes {
            let entry = self.get(object, *attribute)?;
            if !view.publishes(federate, *attribute) {
                return Err(Exception::AttributeNotPublished);
            }
            if entry.owner == Some(federate) {
                return Err(Exception::FederateOwnsAttributes);
            }
        }

        let mut notices = Notices::new(object);
        for attribute in attributes {
            let entry = self.get_mut(object, *attribute);
            if entry.owner.is_none() {
                entry.transfer(federate);
                notices.push(NoticeKind::AcquisitionNotification, federate, *attribute);
            } else {
                notices.push(NoticeKind::Unavailable, federate, *attribute);
            }
        }
        Ok(notices.finish())
    }

    pub fn unconditional_divestiture(
        &mut self,
        object: ObjectHandle,
        federate: FederateHandle,
        attributes: &[AttributeHandle],
    ) -> Result<Vec<OwnershipNotice>, Exception> {
        let attributes = &distinct(attributes);
        self.check_owned(object, federate, attributes)?;

        let mut notices = Notices::new(object);
        for attribute in attributes {
            let entry = self.get_mut(object, *attribute);
            match entry.acquirers.first().copied() {
                Some(next) => {
                    entry.transfer(next);
                    notices.push(NoticeKind::AcquisitionNotification, next, *attribute);
                }
                None => {
                    entry.owner = None;
                    entry.divesting = false;
                }
            }
        }
        Ok(notices.finish())
    }

    pub fn cancel_negotiated_divestiture(
        &mut self,
        object: ObjectHandle,
        federate: FederateHandle,
        attributes: &[AttributeHandle],
    ) -> Result<(), Exception> {
        let attributes = &distinct(attributes);
        self.check_owned(object, federate, attributes)?;
        for attribute in attributes {
            if !self.get(object, *attribute)?.divesting {
                return Err(Exception::AttributeDivestitureWasNotRequested);
            }
        }
        for attribute in attributes {
            self.get_mut(object, *attribute).divesting = false;
        }
        Ok(())
    }

    /// The owner agrees to release attributes someone asked for.
    pub fn release_response(
        &mut self,
        object: ObjectHandle,
        federate: FederateHandle,
        attributes: &[AttributeHandle],
    ) -> Result<Vec<OwnershipNotice>, Exception> {
        let attributes = &distinct(attributes);
        self.check_owned(object, federate, attributes)?;
        for attribute in attributes {
            if self.get(object, *attribute)?.acquirers.is_empty() {
                return Err(Exception::FederateWasNotAskedToReleaseAttribute);
            }
        }

        let mut notices = Notices::new(object);
        for attribute in attributes {
            let entry = self.get_mut(object, *attribute);
            if let Some(next) = entry.acquirers.first().copied() {
                entry.transfer(next);
                notices.push(NoticeKind::AcquisitionNotification, next, *attribute);
            }
        }
        Ok(notices.finish())
    }

    pub fn cancel_acquisition(
        &mut self,
        object: ObjectHandle,
        federate: FederateHandle,
        attributes: &[AttributeHandle],
    ) -> Result<Vec<OwnershipNotice>, Exception> {
        let attributes = &distinct(attributes);
        for attribute in attributes {
            let entry = self.get(object, *attribute)?;
            if entry.owner == Some(federate) {
                return Err(Exception::AttributeAlreadyOwned);
            }
            if !entry.acquirers.contains(&federate) {
                return Err(Exception::AttributeAcquisitionWasNotRequested);
            }
        }

        let mut notices = Notices::new(object);
        for attribute in attributes {
            self.get_mut(object, *attribute)
                .acquirers
                .retain(|f| *f != federate);
            notices.push(NoticeKind::CancellationConfirmed, federate, *attribute);
        }
        Ok(notices.finish())
    }

    /// Resign path: refused while `federate` is divesting or someone waits
    /// to acquire from it. Otherwise everything it owns becomes unowned.
    pub fn release_federate(
        &mut self,
        federate: FederateHandle,
    ) -> Result<Vec<(ObjectHandle, AttributeHandle)>, Exception> {
        let obligated = self.entries.values().any(|entry| {
            entry.owner == Some(federate) && (entry.divesting || !entry.acquirers.is_empty())
        });
        if obligated {
            return Err(Exception::FederateOwnsAttributes);
        }
        Ok(self.force_remove(federate))
    }

    /// Forced removal: drop everything `federate` owns or waits for.
    pub fn force_remove(&mut self, federate: FederateHandle) -> Vec<(ObjectHandle, AttributeHandle)> {
        let mut released = Vec::new();
        for (key, entry) in self.entries.iter_mut() {
            entry.acquirers.retain(|f| *f != federate);
            if entry.owner == Some(federate) {
                entry.owner = None;
                entry.divesting = false;
                released.push(*key);
            }
        }
        released
    }

    /// Attributes `federate` currently owns on `object`.
    pub fn owned_by(&self, object: ObjectHandle, federate: FederateHandle) -> BTreeSet<AttributeHandle> {
        self.entries
            .range((object, AttributeHandle(0))..=(object, AttributeHandle(u32::MAX)))
            .filter(|(_, entry)| entry.owner == Some(federate))
            .map(|((_, attribute), _)| *attribute)
            .collect()
    }
}
