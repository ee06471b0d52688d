// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Federate event loop.
//!
//! One thread owns all federate state and waits on two sources:
//!
//! ```text
//!   application ──Request──┐
//!                          ├──> EventLoop ──frames──> broker
//!   broker ─────Inbound────┘        │
//!                                   └──callbacks──> FederateAmbassador
//! ```
//!
//! In normal mode it serves whichever source is ready. A `Tick` request
//! switches to the tick sub-mode: only broker traffic is consumed, each
//! message is applied exactly as in normal mode, and the wait condition is
//! checked after each one. Both modes go through [`EventLoop::apply`].
//!
//! Replies are matched against a FIFO of pending requests (the broker
//! answers in request order). A message that is neither the expected reply
//! nor a broker-originated event is a contract violation and ends the loop.

use super::ambassador::{Callback, FederateAmbassador};
use super::cache::FederateCache;
use crate::error::{Result, RtiError};
use crate::exception::Exception;
use crate::handles::{FederateHandle, FederationHandle, ObjectHandle};
use crate::protocol::{Message, MessageKind, Payload};
use crate::time::FederationTime;
use crate::time_management::FederateClock;
use crate::transport::frame;
use crossbeam::channel::{select, Receiver, Sender};
use std::collections::VecDeque;
use std::io::Write;

/// Traffic from the broker side, produced by the reader threads.
#[derive(Debug)]
pub enum Inbound {
    Message(Message),
    /// The broker connection closed.
    Closed,
    /// A frame could not be decoded.
    Fatal(String),
}

/// What a tick waits for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// At least one callback was delivered.
    AnyCallback,
    /// No time advance is pending.
    TimeAdvanceGrant,
    FederationSynchronized(String),
    ObjectDiscovered(ObjectHandle),
    SaveResolved,
    RestoreResolved,
    /// This many broker messages were applied.
    Messages(usize),
}

/// The "tick satisfied" notification returned to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub messages: usize,
    pub callbacks: usize,
    pub time: FederationTime,
    /// Saved / restored, for the save and restore conditions.
    pub resolved: Option<bool>,
}

/// Work submitted by the application.
#[derive(Debug)]
pub enum Operation {
    /// Send and wait for the broker's reply.
    Call(Payload),
    /// Send without a reply.
    Notify(Payload),
    EnableRegulation(FederationTime),
    DisableRegulation,
    EnableConstrained,
    DisableConstrained,
    TimeAdvance(FederationTime),
    QueryTime,
    Tick(WaitCondition),
}

#[derive(Debug)]
pub enum Response {
    Done,
    Reply(Payload),
    /// Join reply; the handles travel in the header.
    Joined {
        federation: FederationHandle,
        federate: FederateHandle,
    },
    Time {
        time: FederationTime,
        lbts: FederationTime,
        pending: Option<FederationTime>,
    },
    Tick(TickOutcome),
}

#[derive(Debug)]
pub struct Request {
    pub op: Operation,
    pub reply: Sender<Result<Response>>,
}

struct Pending {
    kind: MessageKind,
    reply: Sender<Result<Response>>,
}

enum Termination {
    Closed,
    Failed(String),
}

pub struct EventLoop<W: Write> {
    writer: W,
    requests: Receiver<Request>,
    inbound: Receiver<Inbound>,
    ambassador: Box<dyn FederateAmbassador>,
    cache: FederateCache,
    clock: FederateClock<Callback>,
    pending: VecDeque<Pending>,
    advertised: (u32, u32),
    termination: Option<Termination>,
}

impl<W: Write> EventLoop<W> {
    pub fn new(
        writer: W,
        requests: Receiver<Request>,
        inbound: Receiver<Inbound>,
        ambassador: Box<dyn FederateAmbassador>,
    ) -> Self {
        Self {
            writer,
            requests,
            inbound,
            ambassador,
            cache: FederateCache::new(),
            clock: FederateClock::new(),
            pending: VecDeque::new(),
            advertised: (0, 0),
            termination: None,
        }
    }

    /// Best-effort endpoint put into the join header.
    pub fn with_best_effort_endpoint(mut self, address: u32, port: u32) -> Self {
        self.advertised = (address, port);
        self
    }

    pub fn cache(&self) -> &FederateCache {
        &self.cache
    }

    pub fn clock(&self) -> &FederateClock<Callback> {
        &self.clock
    }

    pub fn is_finished(&self) -> bool {
        self.termination.is_some()
    }

    /// Serve both sources until the connection closes or a fatal error.
    pub fn run(mut self) -> Result<()> {
        while !self.is_finished() {
            self.step()?;
        }
        Ok(())
    }

    /// Wait for one event from either source and handle it.
    pub fn step(&mut self) -> Result<()> {
        let requests = self.requests.clone();
        let inbound = self.inbound.clone();
        let outcome = select! {
            recv(requests) -> request => match request {
                Ok(request) => self.handle_request(request),
                Err(_) => {
                    log::debug!("[event-loop] application handles dropped");
                    self.terminate(Termination::Closed);
                    Ok(())
                }
            },
            recv(inbound) -> event => match event {
                Ok(event) => self.handle_inbound(event),
                Err(_) => Err(RtiError::ConnectionClosed),
            },
        };
        match outcome {
            Err(RtiError::ConnectionClosed) => {
                self.terminate(Termination::Closed);
                Ok(())
            }
            Err(e) if e.is_fatal() => {
                log::error!("[event-loop] fatal: {}", e);
                self.terminate(Termination::Failed(e.to_string()));
                Err(e)
            }
            other => other,
        }
    }

    fn terminate(&mut self, termination: Termination) {
        if self.termination.is_some() {
            return;
        }
        self.termination = Some(termination);
        for pending in self.pending.drain(..).collect::<Vec<_>>() {
            let _ = pending.reply.send(Err(self.terminal_error()));
        }
    }

    fn terminal_error(&self) -> RtiError {
        match &self.termination {
            Some(Termination::Failed(reason)) => RtiError::Internal(reason.clone()),
            _ => RtiError::ConnectionClosed,
        }
    }

    fn handle_inbound(&mut self, event: Inbound) -> Result<()> {
        match event {
            Inbound::Message(message) => self.apply(message).map(|_| ()),
            Inbound::Closed => {
                log::info!("[event-loop] broker connection closed");
                Err(RtiError::ConnectionClosed)
            }
            Inbound::Fatal(reason) => Err(RtiError::Internal(reason)),
        }
    }

    fn membership(&self) -> (FederationHandle, FederateHandle) {
        self.cache
            .membership()
            .unwrap_or((FederationHandle::NONE, FederateHandle::NONE))
    }

    fn send(&mut self, payload: Payload) -> Result<()> {
        let (federation, federate) = self.membership();
        let message = Message::new(federation, federate, payload);
        frame::send(&mut self.writer, &message)?;
        Ok(())
    }

    fn call(&mut self, payload: Payload, reply: Sender<Result<Response>>) -> Result<()> {
        let kind = payload.kind();
        self.send(payload)?;
        self.pending.push_back(Pending { kind, reply });
        Ok(())
    }

    /// Local preconditions checked before anything goes on the wire.
    fn precheck(&self, payload: &Payload) -> std::result::Result<(), Exception> {
        match payload {
            Payload::CreateFederationExecution { .. } | Payload::DestroyFederationExecution { .. } => {
                Ok(())
            }
            Payload::JoinFederationExecution { .. } if self.cache.is_joined() => {
                Err(Exception::FederateAlreadyExecutionMember)
            }
            Payload::JoinFederationExecution { .. } => Ok(()),
            _ if !self.cache.is_joined() => Err(Exception::FederateNotExecutionMember),
            Payload::UpdateAttributeValues(values) => match values.time {
                Some(stamp) => self.clock.check_stamp(stamp),
                None => Ok(()),
            },
            Payload::SendInteraction(values) => match values.time {
                Some(stamp) => self.clock.check_stamp(stamp),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    fn handle_request(&mut self, request: Request) -> Result<()> {
        let Request { op, reply } = request;
        if self.is_finished() {
            let _ = reply.send(Err(self.terminal_error()));
            return Ok(());
        }

        let refused = |exception: Exception, reason: &str| {
            let _ = reply.send(Err(RtiError::rejected(exception, reason)));
        };

        match op {
            Operation::Call(mut payload) => {
                if let Err(exception) = self.precheck(&payload) {
                    refused(exception, "refused locally");
                    return Ok(());
                }
                if let Payload::JoinFederationExecution {
                    best_effort_address,
                    best_effort_peer,
                    ..
                } = &mut payload
                {
                    *best_effort_address = self.advertised.0;
                    *best_effort_peer = self.advertised.1;
                }
                self.call(payload, reply)
            }
            Operation::Notify(payload) => {
                if let Err(exception) = self.precheck(&payload) {
                    refused(exception, "refused locally");
                    return Ok(());
                }
                self.send(payload)?;
                let _ = reply.send(Ok(Response::Done));
                Ok(())
            }
            Operation::EnableRegulation(lookahead) => {
                if !self.cache.is_joined() {
                    refused(Exception::FederateNotExecutionMember, "not joined");
                    return Ok(());
                }
                match self.clock.request_regulation(lookahead) {
                    Ok(date) => self.call(
                        Payload::SetTimeRegulating {
                            enabled: true,
                            date,
                        },
                        reply,
                    ),
                    Err(exception) => {
                        refused(exception, "time regulation");
                        Ok(())
                    }
                }
            }
            Operation::DisableRegulation => match self.clock.check_regulating() {
                Ok(()) => {
                    let date = self.clock.time();
                    self.call(
                        Payload::SetTimeRegulating {
                            enabled: false,
                            date,
                        },
                        reply,
                    )
                }
                Err(exception) => {
                    refused(exception, "time regulation");
                    Ok(())
                }
            },
            Operation::EnableConstrained => {
                if !self.cache.is_joined() {
                    refused(Exception::FederateNotExecutionMember, "not joined");
                    return Ok(());
                }
                match self.clock.request_constrained() {
                    Ok(date) => self.call(
                        Payload::SetTimeConstrained {
                            enabled: true,
                            date,
                        },
                        reply,
                    ),
                    Err(exception) => {
                        refused(exception, "time constrained");
                        Ok(())
                    }
                }
            }
            Operation::DisableConstrained => match self.clock.check_constrained() {
                Ok(()) => {
                    let date = self.clock.time();
                    self.call(
                        Payload::SetTimeConstrained {
                            enabled: false,
                            date,
                        },
                        reply,
                    )
                }
                Err(exception) => {
                    refused(exception, "time constrained");
                    Ok(())
                }
            },
            Operation::TimeAdvance(target) => match self.clock.request_advance(target) {
                Ok(promise) => {
                    if let Some(date) = promise {
                        self.send(Payload::MessageNull { date })?;
                    }
                    let callbacks = self.grant_if_possible();
                    self.deliver(&callbacks);
                    let _ = reply.send(Ok(Response::Done));
                    Ok(())
                }
                Err(exception) => {
                    refused(exception, "time advance request");
                    Ok(())
                }
            },
            Operation::QueryTime => {
                let _ = reply.send(Ok(Response::Time {
                    time: self.clock.time(),
                    lbts: self.clock.lbts(),
                    pending: self.clock.pending_advance(),
                }));
                Ok(())
            }
            Operation::Tick(condition) => match self.run_tick(&condition) {
                Ok(outcome) => {
                    let _ = reply.send(Ok(Response::Tick(outcome)));
                    Ok(())
                }
                Err(e) if e.is_fatal() => {
                    let message = e.to_string();
                    let _ = reply.send(Err(match &e {
                        RtiError::ConnectionClosed => RtiError::ConnectionClosed,
                        _ => RtiError::Internal(message),
                    }));
                    Err(e)
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                    Ok(())
                }
            },
        }
    }

    /// Tick sub-mode: consume broker traffic only, until `condition` holds.
    pub fn run_tick(&mut self, condition: &WaitCondition) -> Result<TickOutcome> {
        let mut outcome = TickOutcome {
            messages: 0,
            callbacks: 0,
            time: self.clock.time(),
            resolved: None,
        };
        if self.satisfied(condition, &mut outcome) {
            return Ok(outcome);
        }

        let inbound = self.inbound.clone();
        loop {
            let event = inbound.recv().map_err(|_| RtiError::ConnectionClosed)?;
            let message = match event {
                Inbound::Message(message) => message,
                other => {
                    self.handle_inbound(other)?;
                    continue;
                }
            };
            let callbacks = self.apply(message)?;
            outcome.messages += 1;
            outcome.callbacks += callbacks.len();
            outcome.time = self.clock.time();
            if self.satisfied(condition, &mut outcome) {
                log::debug!(
                    "[event-loop] tick satisfied after {} messages",
                    outcome.messages
                );
                return Ok(outcome);
            }
        }
    }

    fn satisfied(&mut self, condition: &WaitCondition, outcome: &mut TickOutcome) -> bool {
        match condition {
            WaitCondition::AnyCallback => outcome.callbacks > 0,
            WaitCondition::TimeAdvanceGrant => self.clock.pending_advance().is_none(),
            WaitCondition::FederationSynchronized(label) => self.cache.is_synchronized(label),
            WaitCondition::ObjectDiscovered(object) => self.cache.knows(*object),
            WaitCondition::SaveResolved => {
                outcome.resolved = self.cache.take_save_outcome();
                outcome.resolved.is_some()
            }
            WaitCondition::RestoreResolved => {
                outcome.resolved = self.cache.take_restore_outcome();
                outcome.resolved.is_some()
            }
            WaitCondition::Messages(count) => outcome.messages >= *count,
        }
    }

    /// Apply one broker message: complete the matching request or handle
    /// the event, update the cache, then deliver callbacks in order.
    pub fn apply(&mut self, message: Message) -> Result<Vec<Callback>> {
        let kind = message.kind();
        let is_reply = match self.pending.front() {
            Some(pending) if message.is_rejection() => pending.kind == kind,
            Some(pending) => pending.kind.accepts_reply(kind),
            None => false,
        };

        let mut callbacks = Vec::new();
        let mut completion = None;
        if is_reply {
            if let Some(pending) = self.pending.pop_front() {
                let result = match message.body {
                    Ok(payload) => {
                        self.apply_reply(
                            &message.federation,
                            &message.federate,
                            &payload,
                            &mut callbacks,
                        );
                        Ok(match payload {
                            Payload::JoinFederationExecution { .. } => Response::Joined {
                                federation: message.federation,
                                federate: message.federate,
                            },
                            payload => Response::Reply(payload),
                        })
                    }
                    Err(rejection) => {
                        log::debug!("[event-loop] {} rejected: {}", kind, rejection);
                        Err(RtiError::from(rejection))
                    }
                };
                completion = Some((pending.reply, result));
            }
        } else {
            match message.body {
                Ok(payload) if kind.is_broker_originated() || kind == MessageKind::MessageNull => {
                    self.apply_event(payload, &mut callbacks);
                }
                _ => {
                    return Err(RtiError::Internal(format!(
                        "unexpected {} while waiting for {:?}",
                        kind,
                        self.pending.front().map(|p| p.kind)
                    )));
                }
            }
        }

        callbacks.extend(self.grant_if_possible());
        self.deliver(&callbacks);
        if let Some((reply, result)) = completion {
            let _ = reply.send(result);
        }
        Ok(callbacks)
    }

    fn deliver(&mut self, callbacks: &[Callback]) {
        for callback in callbacks {
            callback.dispatch(self.ambassador.as_mut());
        }
    }

    fn grant_if_possible(&mut self) -> Vec<Callback> {
        match self.clock.try_grant() {
            Some(grant) => {
                log::debug!("[event-loop] time advance granted to {}", grant.time);
                let mut callbacks = grant.released;
                callbacks.push(Callback::TimeAdvanceGrant(grant.time));
                callbacks
            }
            None => Vec::new(),
        }
    }

    fn apply_reply(
        &mut self,
        federation: &FederationHandle,
        federate: &FederateHandle,
        payload: &Payload,
        callbacks: &mut Vec<Callback>,
    ) {
        match payload {
            Payload::JoinFederationExecution { federation_name, .. } => {
                log::info!(
                    "[event-loop] joined {} as {} of {}",
                    federation_name,
                    federate,
                    federation
                );
                self.cache.joined(*federation, *federate);
            }
            Payload::ResignFederationExecution => {
                self.cache.resigned();
                self.clock = FederateClock::new();
            }
            Payload::TimeRegulationEnabled { date } => {
                self.clock.regulation_enabled(*date);
                callbacks.push(Callback::TimeRegulationEnabled(self.clock.time()));
            }
            Payload::SetTimeRegulating { enabled: false, .. } => self.clock.regulation_disabled(),
            Payload::TimeConstrainedEnabled { .. } => {
                self.clock.constrained_enabled();
                callbacks.push(Callback::TimeConstrainedEnabled(self.clock.time()));
            }
            Payload::SetTimeConstrained { enabled: false, .. } => {
                callbacks.extend(self.clock.constrained_disabled());
            }
            Payload::SynchronizationPointRegistrationSucceeded { label } => {
                callbacks.push(Callback::SynchronizationPointRegistrationSucceeded(label.clone()));
            }
            Payload::RequestFederationRestoreSucceeded { label } => {
                callbacks.push(Callback::RequestFederationRestoreSucceeded(label.clone()));
            }
            Payload::RequestFederationRestoreFailed { label, reason } => {
                callbacks.push(Callback::RequestFederationRestoreFailed {
                    label: label.clone(),
                    reason: reason.clone(),
                });
            }
            Payload::InformAttributeOwnership {
                object,
                attribute,
                owner,
            } => callbacks.push(Callback::InformAttributeOwnership {
                object: *object,
                attribute: *attribute,
                owner: *owner,
            }),
            Payload::AttributeIsNotOwned { object, attribute } => {
                callbacks.push(Callback::AttributeIsNotOwned {
                    object: *object,
                    attribute: *attribute,
                })
            }
            Payload::PublishObjectClass { class, attributes } => {
                self.cache.published(*class, attributes)
            }
            Payload::UnpublishObjectClass { class } => self.cache.unpublished(*class),
            Payload::RegisterObject {
                class,
                object,
                name,
            }
            | Payload::DdmRegisterObject {
                class,
                object,
                name,
                ..
            } => self.cache.registered(*object, *class, name),
            Payload::DeleteObject { object, .. } => self.cache.removed(*object),
            Payload::UnconditionalAttributeOwnershipDivestiture(set)
            | Payload::AttributeOwnershipReleaseResponse(set) => {
                self.cache.divested(set.object, &set.attributes)
            }
            Payload::SetClassRelevanceAdvisorySwitch { on } => {
                self.cache.switches.class_relevance = *on
            }
            Payload::SetInteractionRelevanceAdvisorySwitch { on } => {
                self.cache.switches.interaction_relevance = *on
            }
            Payload::SetAttributeRelevanceAdvisorySwitch { on } => {
                self.cache.switches.attribute_relevance = *on
            }
            Payload::SetAttributeScopeAdvisorySwitch { on } => {
                self.cache.switches.attribute_scope = *on
            }
            _ => {}
        }
    }

    fn apply_event(&mut self, payload: Payload, callbacks: &mut Vec<Callback>) {
        let callback = match payload {
            Payload::MessageNull { date } => {
                self.clock.set_lbts(date);
                return;
            }
            Payload::DiscoverObject {
                class,
                object,
                name,
            } => {
                self.cache.discovered(object, class, &name);
                Callback::DiscoverObject {
                    class,
                    object,
                    name,
                }
            }
            Payload::ReflectAttributeValues(values) => match values.time {
                Some(stamp) if self.clock.holds_time_stamped() => {
                    self.clock
                        .enqueue(stamp, Callback::ReflectAttributeValues(values));
                    return;
                }
                _ => Callback::ReflectAttributeValues(values),
            },
            Payload::ReceiveInteraction(values) => match values.time {
                Some(stamp) if self.clock.holds_time_stamped() => {
                    self.clock.enqueue(stamp, Callback::ReceiveInteraction(values));
                    return;
                }
                _ => Callback::ReceiveInteraction(values),
            },
            Payload::RemoveObject { object, tag, .. } => {
                self.cache.removed(object);
                Callback::RemoveObject { object, tag }
            }
            Payload::ProvideAttributeValueUpdate(set) => Callback::ProvideAttributeValueUpdate(set),
            Payload::StartRegistrationForObjectClass { class } => {
                self.cache.set_registration(class, true);
                Callback::StartRegistrationForObjectClass(class)
            }
            Payload::StopRegistrationForObjectClass { class } => {
                self.cache.set_registration(class, false);
                Callback::StopRegistrationForObjectClass(class)
            }
            Payload::TurnInteractionsOn { class } => {
                self.cache.set_interactions(class, true);
                Callback::TurnInteractionsOn(class)
            }
            Payload::TurnInteractionsOff { class } => {
                self.cache.set_interactions(class, false);
                Callback::TurnInteractionsOff(class)
            }
            Payload::AnnounceSynchronizationPoint { label, tag } => {
                self.cache.announced(&label, &tag);
                Callback::AnnounceSynchronizationPoint { label, tag }
            }
            Payload::FederationSynchronized { label } => {
                self.cache.synchronized(&label);
                Callback::FederationSynchronized(label)
            }
            Payload::InitiateFederateSave { label } => {
                self.cache.save_initiated(&label);
                Callback::InitiateFederateSave(label)
            }
            Payload::FederationSaved => {
                self.cache.save_resolved(true);
                Callback::FederationSaved
            }
            Payload::FederationNotSaved => {
                self.cache.save_resolved(false);
                Callback::FederationNotSaved
            }
            Payload::FederationRestoreBegun => Callback::FederationRestoreBegun,
            Payload::InitiateFederateRestore { label } => {
                self.cache.restore_initiated(&label);
                Callback::InitiateFederateRestore(label)
            }
            Payload::FederationRestored => {
                self.cache.restore_resolved(true);
                Callback::FederationRestored
            }
            Payload::FederationNotRestored => {
                self.cache.restore_resolved(false);
                Callback::FederationNotRestored
            }
            Payload::RequestAttributeOwnershipAssumption(set) => {
                Callback::RequestAttributeOwnershipAssumption(set)
            }
            Payload::RequestAttributeOwnershipRelease(set) => {
                Callback::RequestAttributeOwnershipRelease(set)
            }
            Payload::AttributeOwnershipAcquisitionNotification(set) => {
                self.cache.acquired(set.object, &set.attributes);
                Callback::AttributeOwnershipAcquisitionNotification(set)
            }
            Payload::AttributeOwnershipDivestitureNotification(set) => {
                self.cache.divested(set.object, &set.attributes);
                Callback::AttributeOwnershipDivestitureNotification(set)
            }
            Payload::AttributeOwnershipUnavailable(set) => {
                Callback::AttributeOwnershipUnavailable(set)
            }
            Payload::ConfirmAttributeOwnershipAcquisitionCancellation(set) => {
                Callback::ConfirmAttributeOwnershipAcquisitionCancellation(set)
            }
            other => {
                // Reply-only kinds arriving without a request.
                log::warn!("[event-loop] ignoring unsolicited {}", other.kind());
                return;
            }
        };
        callbacks.push(callback);
    }
}
