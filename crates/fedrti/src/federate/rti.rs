// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Application request API and federate bootstrap.
//!
//! [`FederateAgent::connect`] opens the broker connection and starts the
//! threads:
//!
//! - `fedrti-reader`: decodes frames from the broker into the inbound channel
//! - `fedrti-best-effort`: same for datagrams (only with `best_effort`)
//! - `fedrti-loop`: the [`EventLoop`]
//!
//! [`RtiAmbassador`] is the cloneable handle the application calls. Every
//! call blocks until the event loop has applied the broker's reply.

use super::ambassador::FederateAmbassador;
use super::config::FederateConfig;
use super::event_loop::{
    EventLoop, Inbound, Operation, Request, Response, TickOutcome, WaitCondition,
};
use crate::ddm::Extent;
use crate::descriptor::DescriptorFile;
use crate::error::{Result, RtiError};
use crate::handles::{
    AttributeHandle, FederateHandle, InteractionClassHandle, ObjectClassHandle, ObjectHandle,
    RegionHandle, SpaceHandle,
};
use crate::protocol::{
    AttributeValues, InteractionValues, MessageKind, ObjectAttributes, Payload,
    TaggedObjectAttributes,
};
use crate::time::FederationTime;
use crate::transport::{frame, BestEffortChannel, TransportError};
use crossbeam::channel::{bounded, unbounded, Sender};
use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Poll period of the best-effort reader, bounds shutdown latency.
const BEST_EFFORT_POLL: Duration = Duration::from_millis(200);

/// Answer carried in the tag of an ownership query reply.
const RTI_TRUE: &str = "RTI_TRUE";

fn io_error(err: io::Error) -> RtiError {
    RtiError::Transport(TransportError::Io(err))
}

fn unexpected(response: Response) -> RtiError {
    RtiError::Internal(format!("unexpected response {:?}", response))
}

/// Handle used by the application to issue requests.
#[derive(Clone)]
pub struct RtiAmbassador {
    requests: Sender<Request>,
}

impl RtiAmbassador {
    pub(crate) fn new(requests: Sender<Request>) -> Self {
        Self { requests }
    }

    fn submit(&self, op: Operation) -> Result<Response> {
        let (reply, response) = bounded(1);
        self.requests
            .send(Request { op, reply })
            .map_err(|_| RtiError::ConnectionClosed)?;
        response.recv().map_err(|_| RtiError::ConnectionClosed)?
    }

    fn call(&self, payload: Payload) -> Result<Payload> {
        match self.submit(Operation::Call(payload))? {
            Response::Reply(payload) => Ok(payload),
            other => Err(unexpected(other)),
        }
    }

    fn notify(&self, payload: Payload) -> Result<()> {
        self.submit(Operation::Notify(payload)).map(|_| ())
    }

    fn done(&self, op: Operation) -> Result<()> {
        self.submit(op).map(|_| ())
    }

    // ---- Federation management ----

    pub fn create_federation_execution(
        &self,
        federation_name: &str,
        descriptor: &DescriptorFile,
    ) -> Result<()> {
        self.call(Payload::CreateFederationExecution {
            federation_name: federation_name.to_string(),
            descriptor: descriptor.identifier(),
        })?;
        Ok(())
    }

    pub fn destroy_federation_execution(&self, federation_name: &str) -> Result<()> {
        self.call(Payload::DestroyFederationExecution {
            federation_name: federation_name.to_string(),
        })?;
        Ok(())
    }

    /// Join `federation_name` under `federate_name`; returns the allocated
    /// federate handle.
    pub fn join_federation_execution(
        &self,
        federate_name: &str,
        federation_name: &str,
    ) -> Result<FederateHandle> {
        let response = self.submit(Operation::Call(Payload::JoinFederationExecution {
            federation_name: federation_name.to_string(),
            federate_name: federate_name.to_string(),
            number_of_regulators: 0,
            multicast_address: 0,
            best_effort_address: 0,
            best_effort_peer: 0,
        }))?;
        match response {
            Response::Joined { federate, .. } => Ok(federate),
            other => Err(unexpected(other)),
        }
    }

    pub fn resign_federation_execution(&self) -> Result<()> {
        self.call(Payload::ResignFederationExecution)?;
        Ok(())
    }

    // ---- Synchronization points ----

    /// `federates: None` addresses every member, late joiners included.
    pub fn register_federation_synchronization_point(
        &self,
        label: &str,
        tag: &str,
        federates: Option<&[FederateHandle]>,
    ) -> Result<()> {
        self.call(Payload::RegisterFederationSynchronizationPoint {
            label: label.to_string(),
            tag: tag.to_string(),
            federates: federates.map(<[FederateHandle]>::to_vec),
        })?;
        Ok(())
    }

    pub fn synchronization_point_achieved(&self, label: &str) -> Result<()> {
        self.notify(Payload::SynchronizationPointAchieved {
            label: label.to_string(),
        })
    }

    // ---- Save / restore ----

    pub fn request_federation_save(&self, label: &str, time: Option<FederationTime>) -> Result<()> {
        self.call(Payload::RequestFederationSave {
            label: label.to_string(),
            time,
        })?;
        Ok(())
    }

    pub fn federate_save_begun(&self) -> Result<()> {
        self.notify(Payload::FederateSaveBegun)
    }

    pub fn federate_save_complete(&self) -> Result<()> {
        self.notify(Payload::FederateSaveComplete)
    }

    pub fn federate_save_not_complete(&self) -> Result<()> {
        self.notify(Payload::FederateSaveNotComplete)
    }

    /// Returns false if the broker knows no save under `label`.
    pub fn request_federation_restore(&self, label: &str) -> Result<bool> {
        match self.call(Payload::RequestFederationRestore {
            label: label.to_string(),
        })? {
            Payload::RequestFederationRestoreSucceeded { .. } => Ok(true),
            Payload::RequestFederationRestoreFailed { .. } => Ok(false),
            other => Err(unexpected(Response::Reply(other))),
        }
    }

    pub fn federate_restore_complete(&self) -> Result<()> {
        self.notify(Payload::FederateRestoreComplete)
    }

    pub fn federate_restore_not_complete(&self) -> Result<()> {
        self.notify(Payload::FederateRestoreNotComplete)
    }

    // ---- Declarations ----

    pub fn publish_object_class(
        &self,
        class: ObjectClassHandle,
        attributes: &[AttributeHandle],
    ) -> Result<()> {
        self.call(Payload::PublishObjectClass {
            class,
            attributes: attributes.to_vec(),
        })?;
        Ok(())
    }

    pub fn unpublish_object_class(&self, class: ObjectClassHandle) -> Result<()> {
        self.call(Payload::UnpublishObjectClass { class })?;
        Ok(())
    }

    pub fn publish_interaction_class(&self, class: InteractionClassHandle) -> Result<()> {
        self.call(Payload::PublishInteractionClass { class })?;
        Ok(())
    }

    pub fn unpublish_interaction_class(&self, class: InteractionClassHandle) -> Result<()> {
        self.call(Payload::UnpublishInteractionClass { class })?;
        Ok(())
    }

    pub fn subscribe_object_class_attributes(
        &self,
        class: ObjectClassHandle,
        attributes: &[AttributeHandle],
    ) -> Result<()> {
        self.call(Payload::SubscribeObjectClass {
            class,
            attributes: attributes.to_vec(),
        })?;
        Ok(())
    }

    pub fn unsubscribe_object_class(&self, class: ObjectClassHandle) -> Result<()> {
        self.call(Payload::UnsubscribeObjectClass { class })?;
        Ok(())
    }

    pub fn subscribe_interaction_class(&self, class: InteractionClassHandle) -> Result<()> {
        self.call(Payload::SubscribeInteractionClass { class })?;
        Ok(())
    }

    pub fn unsubscribe_interaction_class(&self, class: InteractionClassHandle) -> Result<()> {
        self.call(Payload::UnsubscribeInteractionClass { class })?;
        Ok(())
    }

    // ---- Objects and interactions ----

    pub fn register_object_instance(
        &self,
        class: ObjectClassHandle,
        name: &str,
    ) -> Result<ObjectHandle> {
        match self.call(Payload::RegisterObject {
            class,
            object: ObjectHandle::NONE,
            name: name.to_string(),
        })? {
            Payload::RegisterObject { object, .. } => Ok(object),
            other => Err(unexpected(Response::Reply(other))),
        }
    }

    /// `values.time` set means time-stamp order; the stamp must not be
    /// earlier than the current time plus lookahead while regulating.
    pub fn update_attribute_values(&self, values: AttributeValues) -> Result<()> {
        self.call(Payload::UpdateAttributeValues(values))?;
        Ok(())
    }

    pub fn send_interaction(&self, values: InteractionValues) -> Result<()> {
        self.call(Payload::SendInteraction(values))?;
        Ok(())
    }

    pub fn delete_object_instance(&self, object: ObjectHandle, tag: &str) -> Result<()> {
        self.call(Payload::DeleteObject {
            object,
            tag: tag.to_string(),
        })?;
        Ok(())
    }

    pub fn request_object_attribute_value_update(
        &self,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<()> {
        self.call(Payload::RequestObjectAttributeValueUpdate(ObjectAttributes {
            object,
            attributes: attributes.to_vec(),
        }))?;
        Ok(())
    }

    pub fn request_class_attribute_value_update(
        &self,
        class: ObjectClassHandle,
        attributes: &[AttributeHandle],
    ) -> Result<()> {
        self.call(Payload::RequestClassAttributeValueUpdate {
            class,
            attributes: attributes.to_vec(),
        })?;
        Ok(())
    }

    // ---- Ownership ----

    pub fn is_attribute_owned_by_federate(
        &self,
        object: ObjectHandle,
        attribute: AttributeHandle,
    ) -> Result<bool> {
        match self.call(Payload::IsAttributeOwnedByFederate {
            object,
            attribute,
            tag: String::new(),
        })? {
            Payload::IsAttributeOwnedByFederate { tag, .. } => Ok(tag == RTI_TRUE),
            other => Err(unexpected(Response::Reply(other))),
        }
    }

    /// Current owner, `None` when unowned. The answer is also delivered
    /// as an ownership callback.
    pub fn query_attribute_ownership(
        &self,
        object: ObjectHandle,
        attribute: AttributeHandle,
    ) -> Result<Option<FederateHandle>> {
        match self.call(Payload::QueryAttributeOwnership { object, attribute })? {
            Payload::InformAttributeOwnership { owner, .. } => Ok(Some(owner)),
            Payload::AttributeIsNotOwned { .. } => Ok(None),
            other => Err(unexpected(Response::Reply(other))),
        }
    }

    pub fn negotiated_attribute_ownership_divestiture(
        &self,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
        tag: &str,
    ) -> Result<()> {
        self.call(Payload::NegotiatedAttributeOwnershipDivestiture(
            tagged(object, attributes, tag),
        ))?;
        Ok(())
    }

    pub fn attribute_ownership_acquisition(
        &self,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
        tag: &str,
    ) -> Result<()> {
        self.call(Payload::AttributeOwnershipAcquisition(tagged(
            object, attributes, tag,
        )))?;
        Ok(())
    }

    pub fn attribute_ownership_acquisition_if_available(
        &self,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<()> {
        self.call(Payload::AttributeOwnershipAcquisitionIfAvailable(plain(
            object, attributes,
        )))?;
        Ok(())
    }

    pub fn unconditional_attribute_ownership_divestiture(
        &self,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<()> {
        self.call(Payload::UnconditionalAttributeOwnershipDivestiture(plain(
            object, attributes,
        )))?;
        Ok(())
    }

    pub fn cancel_negotiated_attribute_ownership_divestiture(
        &self,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<()> {
        self.call(Payload::CancelNegotiatedAttributeOwnershipDivestiture(
            plain(object, attributes),
        ))?;
        Ok(())
    }

    pub fn attribute_ownership_release_response(
        &self,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<()> {
        self.call(Payload::AttributeOwnershipReleaseResponse(plain(
            object, attributes,
        )))?;
        Ok(())
    }

    pub fn cancel_attribute_ownership_acquisition(
        &self,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<()> {
        self.call(Payload::CancelAttributeOwnershipAcquisition(plain(
            object, attributes,
        )))?;
        Ok(())
    }

    // ---- Time ----

    /// Returns the federate time once regulation is enabled.
    pub fn enable_time_regulation(&self, lookahead: FederationTime) -> Result<FederationTime> {
        self.done(Operation::EnableRegulation(lookahead))?;
        self.query_federate_time()
    }

    pub fn disable_time_regulation(&self) -> Result<()> {
        self.done(Operation::DisableRegulation)
    }

    pub fn enable_time_constrained(&self) -> Result<FederationTime> {
        self.done(Operation::EnableConstrained)?;
        self.query_federate_time()
    }

    pub fn disable_time_constrained(&self) -> Result<()> {
        self.done(Operation::DisableConstrained)
    }

    /// Request an advance to `time`. The grant arrives as a
    /// `time_advance_grant` callback; wait for it with
    /// [`WaitCondition::TimeAdvanceGrant`].
    pub fn time_advance_request(&self, time: FederationTime) -> Result<()> {
        self.done(Operation::TimeAdvance(time))
    }

    pub fn query_federate_time(&self) -> Result<FederationTime> {
        match self.submit(Operation::QueryTime)? {
            Response::Time { time, .. } => Ok(time),
            other => Err(unexpected(other)),
        }
    }

    /// Lower bound on time stamps this federate can still receive.
    pub fn query_lbts(&self) -> Result<FederationTime> {
        match self.submit(Operation::QueryTime)? {
            Response::Time { lbts, .. } => Ok(lbts),
            other => Err(unexpected(other)),
        }
    }

    // ---- Data distribution ----

    pub fn create_region(&self, space: SpaceHandle, extents: Vec<Extent>) -> Result<RegionHandle> {
        match self.call(Payload::DdmCreateRegion {
            space,
            extents,
            region: RegionHandle::NONE,
        })? {
            Payload::DdmCreateRegion { region, .. } => Ok(region),
            other => Err(unexpected(Response::Reply(other))),
        }
    }

    pub fn modify_region(&self, region: RegionHandle, extents: Vec<Extent>) -> Result<()> {
        self.call(Payload::DdmModifyRegion { region, extents })?;
        Ok(())
    }

    pub fn delete_region(&self, region: RegionHandle) -> Result<()> {
        self.call(Payload::DdmDeleteRegion { region })?;
        Ok(())
    }

    pub fn associate_region_for_updates(
        &self,
        object: ObjectHandle,
        region: RegionHandle,
        attributes: &[AttributeHandle],
    ) -> Result<()> {
        self.call(Payload::DdmAssociateRegion {
            object,
            region,
            attributes: attributes.to_vec(),
        })?;
        Ok(())
    }

    pub fn unassociate_region_for_updates(
        &self,
        object: ObjectHandle,
        region: RegionHandle,
    ) -> Result<()> {
        self.call(Payload::DdmUnassociateRegion { object, region })?;
        Ok(())
    }

    pub fn subscribe_object_class_attributes_with_region(
        &self,
        class: ObjectClassHandle,
        region: RegionHandle,
        attributes: &[AttributeHandle],
        passive: bool,
    ) -> Result<()> {
        self.call(Payload::DdmSubscribeAttributes {
            class,
            region,
            attributes: attributes.to_vec(),
            passive,
        })?;
        Ok(())
    }

    pub fn unsubscribe_object_class_with_region(
        &self,
        class: ObjectClassHandle,
        region: RegionHandle,
    ) -> Result<()> {
        self.call(Payload::DdmUnsubscribeAttributes { class, region })?;
        Ok(())
    }

    pub fn subscribe_interaction_class_with_region(
        &self,
        class: InteractionClassHandle,
        region: RegionHandle,
        passive: bool,
    ) -> Result<()> {
        self.call(Payload::DdmSubscribeInteraction {
            class,
            region,
            passive,
        })?;
        Ok(())
    }

    pub fn unsubscribe_interaction_class_with_region(
        &self,
        class: InteractionClassHandle,
        region: RegionHandle,
    ) -> Result<()> {
        self.call(Payload::DdmUnsubscribeInteraction { class, region })?;
        Ok(())
    }

    pub fn register_object_instance_with_region(
        &self,
        class: ObjectClassHandle,
        name: &str,
        region: RegionHandle,
        attributes: &[AttributeHandle],
    ) -> Result<ObjectHandle> {
        match self.call(Payload::DdmRegisterObject {
            class,
            object: ObjectHandle::NONE,
            name: name.to_string(),
            region,
            attributes: attributes.to_vec(),
        })? {
            Payload::DdmRegisterObject { object, .. } => Ok(object),
            other => Err(unexpected(Response::Reply(other))),
        }
    }

    // ---- Advisories ----

    fn switch(&self, kind: MessageKind, on: bool) -> Result<()> {
        let payload = match kind {
            MessageKind::SetClassRelevanceAdvisorySwitch => {
                Payload::SetClassRelevanceAdvisorySwitch { on }
            }
            MessageKind::SetInteractionRelevanceAdvisorySwitch => {
                Payload::SetInteractionRelevanceAdvisorySwitch { on }
            }
            MessageKind::SetAttributeRelevanceAdvisorySwitch => {
                Payload::SetAttributeRelevanceAdvisorySwitch { on }
            }
            _ => Payload::SetAttributeScopeAdvisorySwitch { on },
        };
        self.call(payload)?;
        Ok(())
    }

    pub fn enable_class_relevance_advisory_switch(&self) -> Result<()> {
        self.switch(MessageKind::SetClassRelevanceAdvisorySwitch, true)
    }

    pub fn disable_class_relevance_advisory_switch(&self) -> Result<()> {
        self.switch(MessageKind::SetClassRelevanceAdvisorySwitch, false)
    }

    pub fn enable_interaction_relevance_advisory_switch(&self) -> Result<()> {
        self.switch(MessageKind::SetInteractionRelevanceAdvisorySwitch, true)
    }

    pub fn disable_interaction_relevance_advisory_switch(&self) -> Result<()> {
        self.switch(MessageKind::SetInteractionRelevanceAdvisorySwitch, false)
    }

    pub fn enable_attribute_relevance_advisory_switch(&self) -> Result<()> {
        self.switch(MessageKind::SetAttributeRelevanceAdvisorySwitch, true)
    }

    pub fn disable_attribute_relevance_advisory_switch(&self) -> Result<()> {
        self.switch(MessageKind::SetAttributeRelevanceAdvisorySwitch, false)
    }

    pub fn enable_attribute_scope_advisory_switch(&self) -> Result<()> {
        self.switch(MessageKind::SetAttributeScopeAdvisorySwitch, true)
    }

    pub fn disable_attribute_scope_advisory_switch(&self) -> Result<()> {
        self.switch(MessageKind::SetAttributeScopeAdvisorySwitch, false)
    }

    // ---- Waiting ----

    /// Block until `condition` holds, delivering callbacks meanwhile.
    pub fn tick(&self, condition: WaitCondition) -> Result<TickOutcome> {
        match self.submit(Operation::Tick(condition))? {
            Response::Tick(outcome) => Ok(outcome),
            other => Err(unexpected(other)),
        }
    }
}

fn plain(object: ObjectHandle, attributes: &[AttributeHandle]) -> ObjectAttributes {
    ObjectAttributes {
        object,
        attributes: attributes.to_vec(),
    }
}

fn tagged(object: ObjectHandle, attributes: &[AttributeHandle], tag: &str) -> TaggedObjectAttributes {
    TaggedObjectAttributes {
        object,
        attributes: attributes.to_vec(),
        tag: tag.to_string(),
    }
}

/// A federate connected to the broker.
///
/// Owns the connection and the worker threads. Dropping the agent closes
/// the connection, which the broker treats as a forced removal if the
/// federate has not resigned.
pub struct FederateAgent {
    rti: RtiAmbassador,
    stream: TcpStream,
    descriptor: Option<DescriptorFile>,
    best_effort: Option<SocketAddr>,
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl FederateAgent {
    /// Connect to the broker and start the event loop.
    pub fn connect(
        config: FederateConfig,
        ambassador: Box<dyn FederateAmbassador>,
    ) -> Result<Self> {
        config.validate().map_err(RtiError::Config)?;

        let stream = TcpStream::connect_timeout(&config.broker_address, config.connect_timeout)
            .map_err(io_error)?;
        stream.set_nodelay(true).map_err(io_error)?;
        log::info!(
            "[federate] connected to broker at {}",
            config.broker_address
        );

        let (inbound_tx, inbound_rx) = unbounded();
        let (request_tx, request_rx) = unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let mut threads = Vec::new();

        let mut reader = stream.try_clone().map_err(io_error)?;
        let max_message_size = config.max_message_size;
        let reader_tx = inbound_tx.clone();
        threads.push(
            thread::Builder::new()
                .name("fedrti-reader".into())
                .spawn(move || read_frames(&mut reader, max_message_size, reader_tx))
                .map_err(io_error)?,
        );

        let mut advertised = (0, 0);
        let mut best_effort = None;
        if config.best_effort {
            let local_ip = stream.local_addr().map_err(io_error)?.ip();
            let channel = BestEffortChannel::bind(SocketAddr::new(local_ip, 0)).map_err(io_error)?;
            channel
                .set_read_timeout(Some(BEST_EFFORT_POLL))
                .map_err(io_error)?;
            advertised = channel.advertised().map_err(io_error)?;
            best_effort = Some(channel.local_addr().map_err(io_error)?);

            let datagram_tx = inbound_tx.clone();
            let datagram_stop = stop.clone();
            threads.push(
                thread::Builder::new()
                    .name("fedrti-best-effort".into())
                    .spawn(move || read_datagrams(&channel, datagram_tx, &datagram_stop))
                    .map_err(io_error)?,
            );
        }
        drop(inbound_tx);

        let writer = stream.try_clone().map_err(io_error)?;
        let event_loop = EventLoop::new(writer, request_rx, inbound_rx, ambassador)
            .with_best_effort_endpoint(advertised.0, advertised.1);
        let loop_finished = finished.clone();
        threads.push(
            thread::Builder::new()
                .name("fedrti-loop".into())
                .spawn(move || {
                    if let Err(e) = event_loop.run() {
                        log::error!("[federate] event loop stopped: {}", e);
                    }
                    loop_finished.store(true, Ordering::SeqCst);
                })
                .map_err(io_error)?,
        );

        Ok(Self {
            rti: RtiAmbassador::new(request_tx),
            stream,
            descriptor: config.descriptor,
            best_effort,
            stop,
            finished,
            threads,
        })
    }

    /// Request handle; clone it freely.
    pub fn rti(&self) -> RtiAmbassador {
        self.rti.clone()
    }

    /// Descriptor from the configuration, for `create_federation_execution`.
    pub fn descriptor(&self) -> Option<&DescriptorFile> {
        self.descriptor.as_ref()
    }

    /// Local best-effort endpoint, if enabled.
    pub fn best_effort_addr(&self) -> Option<SocketAddr> {
        self.best_effort
    }

    /// True once the event loop has stopped (connection closed or fatal
    /// error). Every later request fails.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Close the connection and wait for the worker threads.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.threads.is_empty() {
            return;
        }
        self.stop.store(true, Ordering::SeqCst);
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            log::debug!("[federate] socket shutdown: {}", e);
        }
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                log::warn!("[federate] worker thread panicked");
            }
        }
    }
}

impl Drop for FederateAgent {
    fn drop(&mut self) {
        self.close();
    }
}

fn read_frames(reader: &mut TcpStream, max_message_size: usize, inbound: Sender<Inbound>) {
    loop {
        let event = match frame::receive(reader, max_message_size) {
            Ok(message) => Inbound::Message(message),
            Err(TransportError::Closed) | Err(TransportError::Io(_)) => {
                let _ = inbound.send(Inbound::Closed);
                return;
            }
            Err(e) => {
                log::error!("[federate] undecodable frame from broker: {}", e);
                let _ = inbound.send(Inbound::Fatal(e.to_string()));
                return;
            }
        };
        if inbound.send(event).is_err() {
            return;
        }
    }
}

fn read_datagrams(channel: &BestEffortChannel, inbound: Sender<Inbound>, stop: &AtomicBool) {
    while !stop.load(Ordering::SeqCst) {
        match channel.recv() {
            Ok((message, _)) if message.kind() == MessageKind::ReflectAttributeValues => {
                if inbound.send(Inbound::Message(message)).is_err() {
                    return;
                }
            }
            Ok((message, from)) => {
                log::warn!(
                    "[best-effort] ignoring {} from {}",
                    message.kind(),
                    from
                );
            }
            Err(TransportError::Io(e))
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) => {}
            Err(e) => log::warn!("[best-effort] dropped datagram: {}", e),
        }
    }
}
