// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data distribution regions.
//!
//! Only the bookkeeping lives here: who owns a region, which routing space
//! it belongs to, and what is associated with it. Extents are carried as
//! opaque per-dimension bounds.

use crate::exception::Exception;
use crate::handles::{
    FederateHandle, HandleAllocator, InteractionClassHandle, ObjectClassHandle, ObjectHandle,
    RegionHandle, SpaceHandle,
};
use std::collections::{BTreeMap, BTreeSet};

/// Half-open `[low, high)` bound on one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub low: u64,
    pub high: u64,
}

/// One extent: a range per dimension of the region's space.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extent {
    pub ranges: Vec<Range>,
}

impl Extent {
    pub fn new(ranges: Vec<Range>) -> Self {
        Self { ranges }
    }

    /// True when both extents intersect on every dimension.
    pub fn overlaps(&self, other: &Extent) -> bool {
        self.ranges.len() == other.ranges.len()
            && self
                .ranges
                .iter()
                .zip(&other.ranges)
                .all(|(a, b)| a.low < b.high && b.low < a.high)
    }
}

/// A region and everything that currently refers to it.
#[derive(Debug, Clone)]
pub struct Region {
    pub handle: RegionHandle,
    pub space: SpaceHandle,
    pub owner: FederateHandle,
    pub extents: Vec<Extent>,
    objects: BTreeSet<ObjectHandle>,
    object_subscriptions: BTreeSet<(FederateHandle, ObjectClassHandle)>,
    interaction_subscriptions: BTreeSet<(FederateHandle, InteractionClassHandle)>,
}

impl Region {
    /// True while any object or subscription refers to this region.
    pub fn in_use(&self) -> bool {
        !self.objects.is_empty()
            || !self.object_subscriptions.is_empty()
            || !self.interaction_subscriptions.is_empty()
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectHandle> {
        self.objects.iter()
    }
}

/// All regions of one federation.
#[derive(Debug, Default)]
pub struct RegionTable {
    regions: BTreeMap<RegionHandle, Region>,
    allocator: HandleAllocator,
}

fn check_extents(extents: &[Extent], dimensions: usize) -> Result<(), Exception> {
    if extents.is_empty() {
        return Err(Exception::InvalidExtents);
    }
    let well_formed = extents.iter().all(|extent| {
        extent.ranges.len() == dimensions && extent.ranges.iter().all(|r| r.low <= r.high)
    });
    if well_formed {
        Ok(())
    } else {
        Err(Exception::InvalidExtents)
    }
}

impl RegionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, region: RegionHandle) -> Option<&Region> {
        self.regions.get(&region)
    }

    /// Create a region in a space of `dimensions` dimensions.
    pub fn create(
        &mut self,
        owner: FederateHandle,
        space: SpaceHandle,
        dimensions: usize,
        extents: Vec<Extent>,
    ) -> Result<RegionHandle, Exception> {
        check_extents(&extents, dimensions)?;
        let handle = RegionHandle(self.allocator.allocate().ok_or(Exception::MemoryExhausted)?);
        self.regions.insert(
            handle,
            Region {
                handle,
                space,
                owner,
                extents,
                objects: BTreeSet::new(),
                object_subscriptions: BTreeSet::new(),
                interaction_subscriptions: BTreeSet::new(),
            },
        );
        Ok(handle)
    }

    /// Look up a region the caller owns.
    pub fn owned(&self, owner: FederateHandle, region: RegionHandle) -> Result<&Region, Exception> {
        match self.regions.get(&region) {
            Some(r) if r.owner == owner => Ok(r),
            _ => Err(Exception::RegionNotKnown),
        }
    }

    fn owned_mut(
        &mut self,
        owner: FederateHandle,
        region: RegionHandle,
    ) -> Result<&mut Region, Exception> {
        match self.regions.get_mut(&region) {
            Some(r) if r.owner == owner => Ok(r),
            _ => Err(Exception::RegionNotKnown),
        }
    }

    /// Replace the extents. The extent count may not change.
    pub fn modify(
        &mut self,
        owner: FederateHandle,
        region: RegionHandle,
        dimensions: usize,
        extents: Vec<Extent>,
    ) -> Result<(), Exception> {
        check_extents(&extents, dimensions)?;
        let entry = self.owned_mut(owner, region)?;
        if entry.extents.len() != extents.len() {
            return Err(Exception::InvalidExtents);
        }
        entry.extents = extents;
        Ok(())
    }

    pub fn delete(&mut self, owner: FederateHandle, region: RegionHandle) -> Result<(), Exception> {
        let entry = self.owned(owner, region)?;
        if entry.in_use() {
            return Err(Exception::RegionInUse);
        }
        self.regions.remove(&region);
        Ok(())
    }

    pub fn associate_object(
        &mut self,
        owner: FederateHandle,
        region: RegionHandle,
        object: ObjectHandle,
    ) -> Result<(), Exception> {
        self.owned_mut(owner, region)?.objects.insert(object);
        Ok(())
    }

    pub fn unassociate_object(
        &mut self,
        owner: FederateHandle,
        region: RegionHandle,
        object: ObjectHandle,
    ) -> Result<(), Exception> {
        let entry = self.owned_mut(owner, region)?;
        if entry.objects.remove(&object) {
            Ok(())
        } else {
            Err(Exception::InvalidRegionContext)
        }
    }

    pub fn subscribe_object_class(
        &mut self,
        owner: FederateHandle,
        region: RegionHandle,
        class: ObjectClassHandle,
    ) -> Result<(), Exception> {
        self.owned_mut(owner, region)?
            .object_subscriptions
            .insert((owner, class));
        Ok(())
    }

    pub fn unsubscribe_object_class(
        &mut self,
        owner: FederateHandle,
        region: RegionHandle,
        class: ObjectClassHandle,
    ) -> Result<(), Exception> {
        let entry = self.owned_mut(owner, region)?;
        if entry.object_subscriptions.remove(&(owner, class)) {
            Ok(())
        } else {
            Err(Exception::ObjectClassNotSubscribed)
        }
    }

    pub fn subscribe_interaction(
        &mut self,
        owner: FederateHandle,
        region: RegionHandle,
        class: InteractionClassHandle,
    ) -> Result<(), Exception> {
        self.owned_mut(owner, region)?
            .interaction_subscriptions
            .insert((owner, class));
        Ok(())
    }

    pub fn unsubscribe_interaction(
        &mut self,
        owner: FederateHandle,
        region: RegionHandle,
        class: InteractionClassHandle,
    ) -> Result<(), Exception> {
        let entry = self.owned_mut(owner, region)?;
        if entry.interaction_subscriptions.remove(&(owner, class)) {
            Ok(())
        } else {
            Err(Exception::InteractionClassNotSubscribed)
        }
    }

    /// Drop every association with a deleted object.
    pub fn forget_object(&mut self, object: ObjectHandle) {
        for region in self.regions.values_mut() {
            region.objects.remove(&object);
        }
    }

    /// Remove every region a departing federate created.
    pub fn remove_owner(&mut self, owner: FederateHandle) -> usize {
        let before = self.regions.len();
        self.regions.retain(|_, region| region.owner != owner);
        before - self.regions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: FederateHandle = FederateHandle(1);
    const B: FederateHandle = FederateHandle(2);
    const SPACE: SpaceHandle = SpaceHandle(1);

    fn extent(low: u64, high: u64) -> Extent {
        Extent::new(vec![Range { low, high }])
    }

    #[test]
    fn test_overlap_is_half_open() {
        assert!(extent(0, 10).overlaps(&extent(9, 20)));
        assert!(!extent(0, 10).overlaps(&extent(10, 20)));
        assert!(!extent(0, 10).overlaps(&Extent::new(vec![])));
    }

    #[test]
    fn test_create_requires_extents() {
        let mut table = RegionTable::new();
        assert_eq!(
            table.create(A, SPACE, 1, vec![]),
            Err(Exception::InvalidExtents)
        );
        assert_eq!(
            table.create(A, SPACE, 2, vec![extent(0, 10)]),
            Err(Exception::InvalidExtents)
        );
        assert!(table.create(A, SPACE, 1, vec![extent(0, 10)]).is_ok());
    }

    #[test]
    fn test_only_owner_may_modify_or_delete() {
        let mut table = RegionTable::new();
        let region = table.create(A, SPACE, 1, vec![extent(0, 10)]).unwrap();
        assert_eq!(
            table.modify(B, region, 1, vec![extent(5, 6)]),
            Err(Exception::RegionNotKnown)
        );
        assert_eq!(table.delete(B, region), Err(Exception::RegionNotKnown));
        table.modify(A, region, 1, vec![extent(5, 6)]).unwrap();
        assert_eq!(table.get(region).unwrap().extents, vec![extent(5, 6)]);
    }

    #[test]
    fn test_modify_keeps_extent_count() {
        let mut table = RegionTable::new();
        let region = table.create(A, SPACE, 1, vec![extent(0, 10)]).unwrap();
        assert_eq!(
            table.modify(A, region, 1, vec![extent(0, 1), extent(2, 3)]),
            Err(Exception::InvalidExtents)
        );
    }

    #[test]
    fn test_delete_refused_while_in_use() {
        let mut table = RegionTable::new();
        let region = table.create(A, SPACE, 1, vec![extent(0, 10)]).unwrap();
        table
            .subscribe_object_class(A, region, ObjectClassHandle(3))
            .unwrap();
        assert_eq!(table.delete(A, region), Err(Exception::RegionInUse));

        table
            .unsubscribe_object_class(A, region, ObjectClassHandle(3))
            .unwrap();
        table.associate_object(A, region, ObjectHandle(9)).unwrap();
        assert_eq!(table.delete(A, region), Err(Exception::RegionInUse));

        table.forget_object(ObjectHandle(9));
        assert!(table.delete(A, region).is_ok());
        assert!(table.is_empty());
    }

    #[test]
    fn test_remove_owner() {
        let mut table = RegionTable::new();
        table.create(A, SPACE, 1, vec![extent(0, 1)]).unwrap();
        table.create(B, SPACE, 1, vec![extent(0, 1)]).unwrap();
        assert_eq!(table.remove_owner(A), 1);
        assert_eq!(table.len(), 1);
    }
}
