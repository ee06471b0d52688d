// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Time management.
//!
//! [`RegulatorSet`] is the broker's authoritative view of one federation:
//! which federates regulate (and their promised times) and which are
//! constrained. [`FederateClock`] is the federate's side: its logical time,
//! the pending advance, the last lower bound the broker reported and the
//! queue of time-stamped messages waiting for a grant.

use crate::exception::Exception;
use crate::handles::FederateHandle;
use crate::time::FederationTime;
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

/// Regulating and constrained membership of one federation.
#[derive(Debug, Default, Clone)]
pub struct RegulatorSet {
    regulators: BTreeMap<FederateHandle, FederationTime>,
    constrained: BTreeSet<FederateHandle>,
    // Last bound reported to each constrained federate.
    last_sent: BTreeMap<FederateHandle, FederationTime>,
}

impl RegulatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum over all regulators, infinity when there are none.
    pub fn lower_bound(&self) -> FederationTime {
        self.regulators
            .values()
            .copied()
            .min()
            .unwrap_or(FederationTime::INFINITY)
    }

    /// The bound `federate` is subject to: its own contribution never
    /// constrains itself.
    pub fn lower_bound_excluding(&self, federate: FederateHandle) -> FederationTime {
        self.regulators
            .iter()
            .filter(|(handle, _)| **handle != federate)
            .map(|(_, time)| *time)
            .min()
            .unwrap_or(FederationTime::INFINITY)
    }

    pub fn is_regulator(&self, federate: FederateHandle) -> bool {
        self.regulators.contains_key(&federate)
    }

    pub fn is_constrained(&self, federate: FederateHandle) -> bool {
        self.constrained.contains(&federate)
    }

    pub fn regulator_time(&self, federate: FederateHandle) -> Option<FederationTime> {
        self.regulators.get(&federate).copied()
    }

    pub fn regulator_count(&self) -> usize {
        self.regulators.len()
    }

    /// Add a regulator. Its time is raised to the current bound so that
    /// joining the set never lowers it. Returns the time actually recorded.
    pub fn create_regulator(
        &mut self,
        federate: FederateHandle,
        time: FederationTime,
    ) -> Result<FederationTime, Exception> {
        if self.regulators.contains_key(&federate) {
            return Err(Exception::TimeRegulationAlreadyEnabled);
        }
        let granted = if self.regulators.is_empty() {
            time
        } else {
            time.max(self.lower_bound())
        };
        self.regulators.insert(federate, granted);
        Ok(granted)
    }

    /// Advance a regulator's contribution. Returns `true` if it moved.
    pub fn update_regulator(
        &mut self,
        federate: FederateHandle,
        time: FederationTime,
    ) -> Result<bool, Exception> {
        let current = self
            .regulators
            .get_mut(&federate)
            .ok_or(Exception::TimeRegulationWasNotEnabled)?;
        if time > *current {
            *current = time;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn remove_regulator(&mut self, federate: FederateHandle) -> Result<(), Exception> {
        self.regulators
            .remove(&federate)
            .map(|_| ())
            .ok_or(Exception::TimeRegulationWasNotEnabled)
    }

    pub fn add_constrained(&mut self, federate: FederateHandle) -> Result<(), Exception> {
        if self.constrained.insert(federate) {
            Ok(())
        } else {
            Err(Exception::TimeConstrainedAlreadyEnabled)
        }
    }

    pub fn remove_constrained(&mut self, federate: FederateHandle) -> Result<(), Exception> {
        if self.constrained.remove(&federate) {
            self.last_sent.remove(&federate);
            Ok(())
        } else {
            Err(Exception::TimeConstrainedWasNotEnabled)
        }
    }

    /// Drop a departing federate from both sets.
    pub fn remove_federate(&mut self, federate: FederateHandle) {
        self.regulators.remove(&federate);
        self.constrained.remove(&federate);
        self.last_sent.remove(&federate);
    }

    /// Check the stamp of an outgoing time-stamped message.
    ///
    /// A regulator may not stamp below its own contribution. A stamp from a
    /// non-regulator is dropped (`Ok(None)`): the message goes receive-order.
    pub fn check_stamp(
        &self,
        federate: FederateHandle,
        stamp: FederationTime,
    ) -> Result<Option<FederationTime>, Exception> {
        match self.regulators.get(&federate) {
            Some(contribution) if stamp < *contribution => Err(Exception::InvalidFederationTime),
            Some(_) => Ok(Some(stamp)),
            None => Ok(None),
        }
    }

    /// Bounds that changed since they were last reported, one per
    /// constrained federate. Marks them as reported.
    pub fn take_bound_changes(&mut self) -> Vec<(FederateHandle, FederationTime)> {
        let mut changes = Vec::new();
        for federate in &self.constrained {
            let bound = self.lower_bound_excluding(*federate);
            if self.last_sent.get(federate) != Some(&bound) {
                changes.push((*federate, bound));
            }
        }
        for (federate, bound) in &changes {
            self.last_sent.insert(*federate, *bound);
        }
        changes
    }
}

struct Queued<T> {
    stamp: FederationTime,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Queued<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Queued<T> {}

impl<T> PartialOrd for Queued<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Queued<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.stamp, self.seq).cmp(&(other.stamp, other.seq))
    }
}

/// A granted advance and the time-stamped items it releases, in stamp order.
#[derive(Debug)]
pub struct Grant<T> {
    pub time: FederationTime,
    pub released: Vec<T>,
}

/// Federate-local time state.
///
/// Local requests only validate and record intent; the regulating and
/// constrained flags change when the broker's reply is applied.
pub struct FederateClock<T> {
    time: FederationTime,
    lookahead: FederationTime,
    regulating: bool,
    constrained: bool,
    lbts: FederationTime,
    pending: Option<FederationTime>,
    queue: BinaryHeap<Reverse<Queued<T>>>,
    seq: u64,
}

impl<T> Default for FederateClock<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FederateClock<T> {
    pub fn new() -> Self {
        Self {
            time: FederationTime::ZERO,
            lookahead: FederationTime::ZERO,
            regulating: false,
            constrained: false,
            lbts: FederationTime::INFINITY,
            pending: None,
            queue: BinaryHeap::new(),
            seq: 0,
        }
    }

    pub fn time(&self) -> FederationTime {
        self.time
    }

    pub fn lookahead(&self) -> FederationTime {
        self.lookahead
    }

    pub fn lbts(&self) -> FederationTime {
        self.lbts
    }

    pub fn is_regulating(&self) -> bool {
        self.regulating
    }

    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    pub fn pending_advance(&self) -> Option<FederationTime> {
        self.pending
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Validate a regulation request. Returns the time to promise.
    pub fn request_regulation(
        &mut self,
        lookahead: FederationTime,
    ) -> Result<FederationTime, Exception> {
        if self.regulating {
            return Err(Exception::TimeRegulationAlreadyEnabled);
        }
        if lookahead < FederationTime::ZERO || lookahead.is_infinite() {
            return Err(Exception::InvalidLookahead);
        }
        if self.pending.is_some() {
            return Err(Exception::TimeAdvanceAlreadyInProgress);
        }
        self.lookahead = lookahead;
        Ok(self.time + lookahead)
    }

    /// Apply TIME_REGULATION_ENABLED. `promised` may have been raised by the
    /// broker to the federation bound.
    pub fn regulation_enabled(&mut self, promised: FederationTime) {
        self.regulating = true;
        let floor = FederationTime::new(promised.value() - self.lookahead.value());
        self.time = self.time.max(floor);
    }

    pub fn regulation_disabled(&mut self) {
        self.regulating = false;
    }

    pub fn check_regulating(&self) -> Result<(), Exception> {
        if self.regulating {
            Ok(())
        } else {
            Err(Exception::TimeRegulationWasNotEnabled)
        }
    }

    pub fn request_constrained(&self) -> Result<FederationTime, Exception> {
        if self.constrained {
            return Err(Exception::TimeConstrainedAlreadyEnabled);
        }
        if self.pending.is_some() {
            return Err(Exception::TimeAdvanceAlreadyInProgress);
        }
        Ok(self.time)
    }

    pub fn check_constrained(&self) -> Result<(), Exception> {
        if self.constrained {
            Ok(())
        } else {
            Err(Exception::TimeConstrainedWasNotEnabled)
        }
    }

    pub fn constrained_enabled(&mut self) {
        self.constrained = true;
    }

    /// Turning constraint off releases everything still queued.
    pub fn constrained_disabled(&mut self) -> Vec<T> {
        self.constrained = false;
        self.drain_up_to(FederationTime::INFINITY)
    }

    /// Start an advance to `target`. Returns the null-message date to send
    /// when regulating.
    pub fn request_advance(
        &mut self,
        target: FederationTime,
    ) -> Result<Option<FederationTime>, Exception> {
        if self.pending.is_some() {
            return Err(Exception::TimeAdvanceAlreadyInProgress);
        }
        if target < self.time {
            return Err(Exception::InvalidFederationTime);
        }
        self.pending = Some(target);
        Ok(self.regulating.then(|| target + self.lookahead))
    }

    /// Smallest stamp this federate may put on an outgoing message.
    pub fn earliest_stamp(&self) -> FederationTime {
        self.pending.unwrap_or(self.time) + self.lookahead
    }

    pub fn check_stamp(&self, stamp: FederationTime) -> Result<(), Exception> {
        if self.regulating && stamp < self.earliest_stamp() {
            Err(Exception::InvalidFederationTime)
        } else {
            Ok(())
        }
    }

    /// Record the bound carried by a broker null message.
    pub fn set_lbts(&mut self, bound: FederationTime) {
        self.lbts = bound;
    }

    /// True when a time-stamped message must wait for a grant.
    pub fn holds_time_stamped(&self) -> bool {
        self.constrained
    }

    pub fn enqueue(&mut self, stamp: FederationTime, item: T) {
        self.seq += 1;
        self.queue.push(Reverse(Queued {
            stamp,
            seq: self.seq,
            item,
        }));
    }

    /// Grant the pending advance if the bound allows it.
    pub fn try_grant(&mut self) -> Option<Grant<T>> {
        let target = self.pending?;
        if self.constrained && self.lbts < target {
            return None;
        }
        let released = self.drain_up_to(target);
        self.time = target;
        self.pending = None;
        Some(Grant {
            time: target,
            released,
        })
    }

    fn drain_up_to(&mut self, limit: FederationTime) -> Vec<T> {
        let mut released = Vec::new();
        while let Some(Reverse(head)) = self.queue.peek() {
            if head.stamp > limit {
                break;
            }
            if let Some(Reverse(queued)) = self.queue.pop() {
                released.push(queued.item);
            }
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: FederateHandle = FederateHandle(1);
    const B: FederateHandle = FederateHandle(2);
    const C: FederateHandle = FederateHandle(3);

    fn t(value: f64) -> FederationTime {
        FederationTime::new(value)
    }

    #[test]
    fn test_bound_is_minimum_of_regulators() {
        let mut set = RegulatorSet::new();
        assert!(set.lower_bound().is_infinite());
        set.create_regulator(A, t(5.0)).unwrap();
        set.create_regulator(B, t(8.0)).unwrap();
        assert_eq!(set.lower_bound(), t(5.0));
        assert_eq!(set.lower_bound_excluding(A), t(8.0));
        assert_eq!(set.lower_bound_excluding(C), t(5.0));
    }

    #[test]
    fn test_new_regulator_cannot_lower_bound() {
        let mut set = RegulatorSet::new();
        set.create_regulator(A, t(10.0)).unwrap();
        assert_eq!(set.create_regulator(B, t(2.0)), Ok(t(10.0)));
        assert_eq!(set.lower_bound(), t(10.0));
        assert_eq!(
            set.create_regulator(B, t(20.0)),
            Err(Exception::TimeRegulationAlreadyEnabled)
        );
    }

    #[test]
    fn test_updates_never_go_backwards() {
        let mut set = RegulatorSet::new();
        set.create_regulator(A, t(4.0)).unwrap();
        assert_eq!(set.update_regulator(A, t(3.0)), Ok(false));
        assert_eq!(set.regulator_time(A), Some(t(4.0)));
        assert_eq!(set.update_regulator(A, t(6.0)), Ok(true));
        assert_eq!(
            set.update_regulator(B, t(1.0)),
            Err(Exception::TimeRegulationWasNotEnabled)
        );
    }

    #[test]
    fn test_stamp_checks() {
        let mut set = RegulatorSet::new();
        set.create_regulator(A, t(4.0)).unwrap();
        assert_eq!(
            set.check_stamp(A, t(3.0)),
            Err(Exception::InvalidFederationTime)
        );
        assert_eq!(set.check_stamp(A, t(4.0)), Ok(Some(t(4.0))));
        assert_eq!(set.check_stamp(B, t(0.0)), Ok(None));
    }

    #[test]
    fn test_bound_changes_reported_once() {
        let mut set = RegulatorSet::new();
        set.add_constrained(B).unwrap();
        assert_eq!(set.take_bound_changes(), vec![(B, FederationTime::INFINITY)]);
        assert!(set.take_bound_changes().is_empty());

        set.create_regulator(A, t(1.0)).unwrap();
        assert_eq!(set.take_bound_changes(), vec![(B, t(1.0))]);
        set.update_regulator(A, t(2.0)).unwrap();
        assert_eq!(set.take_bound_changes(), vec![(B, t(2.0))]);

        set.remove_federate(A);
        assert_eq!(set.take_bound_changes(), vec![(B, FederationTime::INFINITY)]);
    }

    #[test]
    fn test_randomized_bound_is_monotone_minimum() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        let mut set = RegulatorSet::new();
        let federates: Vec<FederateHandle> = (1..=5).map(FederateHandle).collect();
        for federate in &federates {
            set.create_regulator(*federate, t(rng.f64() * 10.0)).unwrap();
        }
        let mut previous = set.lower_bound();
        for _ in 0..2_000 {
            let federate = federates[rng.usize(..federates.len())];
            let delta = rng.f64() * 4.0 - 1.0;
            let current = set.regulator_time(federate).unwrap_or(FederationTime::ZERO);
            set.update_regulator(federate, t(current.value() + delta))
                .unwrap();

            let bound = set.lower_bound();
            assert!(bound >= previous, "bound went from {} to {}", previous, bound);
            let expected = federates
                .iter()
                .filter_map(|f| set.regulator_time(*f))
                .min()
                .unwrap();
            assert_eq!(bound, expected);
            previous = bound;
        }
    }

    #[test]
    fn test_advance_preconditions() {
        let mut clock: FederateClock<u32> = FederateClock::new();
        clock.request_advance(t(5.0)).unwrap();
        assert_eq!(
            clock.request_advance(t(6.0)),
            Err(Exception::TimeAdvanceAlreadyInProgress)
        );
        assert!(clock.try_grant().is_some());
        assert_eq!(clock.time(), t(5.0));
        assert_eq!(
            clock.request_advance(t(4.0)),
            Err(Exception::InvalidFederationTime)
        );
    }

    #[test]
    fn test_regulator_sends_promise() {
        let mut clock: FederateClock<u32> = FederateClock::new();
        assert_eq!(clock.request_regulation(t(2.0)), Ok(t(2.0)));
        clock.regulation_enabled(t(2.0));
        assert_eq!(clock.request_advance(t(3.0)), Ok(Some(t(5.0))));
        assert_eq!(clock.earliest_stamp(), t(5.0));
        assert_eq!(
            clock.check_stamp(t(4.0)),
            Err(Exception::InvalidFederationTime)
        );
    }

    #[test]
    fn test_raised_promise_moves_time() {
        let mut clock: FederateClock<u32> = FederateClock::new();
        clock.request_regulation(t(1.0)).unwrap();
        clock.regulation_enabled(t(11.0));
        assert_eq!(clock.time(), t(10.0));
    }

    #[test]
    fn test_constrained_grant_waits_for_bound() {
        let mut clock = FederateClock::new();
        clock.constrained_enabled();
        clock.set_lbts(t(2.0));
        clock.enqueue(t(3.0), "late");
        clock.enqueue(t(1.0), "early");
        clock.enqueue(t(3.0), "late-second");

        clock.request_advance(t(3.0)).unwrap();
        assert!(clock.try_grant().is_none());

        clock.set_lbts(t(3.0));
        let grant = clock.try_grant().unwrap();
        assert_eq!(grant.time, t(3.0));
        assert_eq!(grant.released, vec!["early", "late", "late-second"]);
        assert_eq!(clock.queued(), 0);
    }

    #[test]
    fn test_grant_keeps_future_messages() {
        let mut clock = FederateClock::new();
        clock.constrained_enabled();
        clock.enqueue(t(9.0), 9);
        clock.enqueue(t(2.0), 2);
        clock.request_advance(t(5.0)).unwrap();
        let grant = clock.try_grant().unwrap();
        assert_eq!(grant.released, vec![2]);
        assert_eq!(clock.queued(), 1);
        assert_eq!(clock.constrained_disabled(), vec![9]);
    }
}
