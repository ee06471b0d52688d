// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary message codec.
//!
//! # Wire Format
//!
//! ```text
//! +------+-----------+-------+----------+------------+----------+----------+
//! | kind | exception | flags | reserved | federation | federate | body_len |
//! |  u8  |    u8     |  u8   |    u8    |    u32     |   u32    |   u32    |
//! +------+-----------+-------+----------+------------+----------+----------+
//! | handle (u32) | count (u32) | extra (u64)  |  <- kind-dependent part
//! +--------------+-------------+--------------+
//! | body (body_len bytes, optional)           |
//! +-------------------------------------------+
//! ```
//!
//! The 16-byte kind-dependent part holds the fields that let frequent kinds
//! skip the body: a class or region handle, the element count of the
//! kind's handle array, and a time stamp (or packed addresses for joins).
//! `flags` marks whether an optional time stamp or boolean is set.
//!
//! A message carrying an exception has a body made of the reason string
//! only, whatever its kind.

use super::cursor::{wire_len, Cursor, CursorMut};
use super::kind::MessageKind;
use super::message::{
    AttributeValues, InteractionValues, Message, ObjectAttributes, Payload, Rejection,
    TaggedObjectAttributes,
};
use crate::ddm::{Extent, Range};
use crate::exception::Exception;
use crate::handles::{
    FederateHandle, FederationHandle, InteractionClassHandle, ObjectClassHandle, ObjectHandle,
    RegionHandle, SpaceHandle,
};
use crate::time::FederationTime;
use thiserror::Error;

/// Size of the fixed header.
pub const HEADER_SIZE: usize = 32;

const FLAG_TIME: u8 = 0x01;
const FLAG_BOOL: u8 = 0x02;

/// Fatal decode failures. The connection that produced one is no longer
/// trustworthy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown message kind {0}")]
    UnknownKind(u8),

    #[error("no body layout for {0}")]
    Unimplemented(MessageKind),

    #[error("unknown exception code {0}")]
    UnknownException(u8),

    #[error("truncated at offset {offset}: {needed} more bytes needed")]
    Truncated { offset: usize, needed: usize },

    #[error("malformed body at offset {offset}: {reason}")]
    Malformed { offset: usize, reason: String },

    #[error("{kind} has {extra} trailing bytes")]
    TrailingBytes { kind: MessageKind, extra: usize },

    #[error("body length {declared} does not match {actual} received")]
    BodyLength { declared: usize, actual: usize },
}

impl DecodeError {
    /// Every decode failure surfaces as `RTIinternalError`.
    pub fn exception(&self) -> Exception {
        Exception::RtiInternalError
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("{kind} body of {len} bytes exceeds the frame limit")]
    TooLarge { kind: MessageKind, len: usize },

    #[error("length {len} does not fit a u32 prefix")]
    LengthOverflow { len: usize },
}

/// The kind-dependent part of the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Variable {
    handle: u32,
    count: u32,
    extra: u64,
}

impl Variable {
    fn date(&self) -> FederationTime {
        FederationTime::new(f64::from_bits(self.extra))
    }

    fn set_date(&mut self, date: FederationTime) {
        self.extra = date.value().to_bits();
    }

    fn count(&self) -> usize {
        self.count as usize
    }
}

/// Decoded fixed header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    kind: MessageKind,
    exception: Option<Exception>,
    flags: u8,
    federation: FederationHandle,
    federate: FederateHandle,
    body_len: u32,
    variable: Variable,
}

impl Header {
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn exception(&self) -> Option<Exception> {
        self.exception
    }

    pub fn body_len(&self) -> usize {
        self.body_len as usize
    }

    fn has_time(&self) -> bool {
        self.flags & FLAG_TIME != 0
    }

    fn flag(&self) -> bool {
        self.flags & FLAG_BOOL != 0
    }

    fn optional_time(&self) -> Option<FederationTime> {
        self.has_time().then(|| self.variable.date())
    }
}

/// Encode a message into one frame (header plus body).
pub fn encode(message: &Message) -> Result<Vec<u8>, EncodeError> {
    let kind = message.kind();
    let mut variable = Variable::default();
    let mut flags = 0u8;
    let mut body = CursorMut::new();
    let exception = match &message.body {
        Ok(payload) => {
            encode_payload(payload, &mut variable, &mut flags, &mut body)?;
            0
        }
        Err(rejection) => {
            body.write_string(&rejection.reason)?;
            rejection.exception.code()
        }
    };

    let body = body.into_inner();
    let body_len = u32::try_from(body.len()).map_err(|_| EncodeError::TooLarge {
        kind,
        len: body.len(),
    })?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + body.len());
    frame.push(kind.code());
    frame.push(exception);
    frame.push(flags);
    frame.push(0);
    frame.extend_from_slice(&message.federation.raw().to_be_bytes());
    frame.extend_from_slice(&message.federate.raw().to_be_bytes());
    frame.extend_from_slice(&body_len.to_be_bytes());
    frame.extend_from_slice(&variable.handle.to_be_bytes());
    frame.extend_from_slice(&variable.count.to_be_bytes());
    frame.extend_from_slice(&variable.extra.to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Decode one complete frame.
pub fn decode(bytes: &[u8]) -> Result<Message, DecodeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DecodeError::Truncated {
            offset: bytes.len(),
            needed: HEADER_SIZE - bytes.len(),
        });
    }
    let mut raw = [0u8; HEADER_SIZE];
    raw.copy_from_slice(&bytes[..HEADER_SIZE]);
    let header = decode_header(&raw)?;
    decode_body(&header, &bytes[HEADER_SIZE..])
}

/// Decode the fixed header. Unknown kinds and kinds without a body layout
/// fail here, before any body is read.
pub fn decode_header(raw: &[u8; HEADER_SIZE]) -> Result<Header, DecodeError> {
    let mut cursor = Cursor::new(raw);
    let code = cursor.read_u8()?;
    let kind = MessageKind::from_code(code).ok_or(DecodeError::UnknownKind(code))?;
    if kind.is_unimplemented() {
        return Err(DecodeError::Unimplemented(kind));
    }
    let exception = match cursor.read_u8()? {
        0 => None,
        other => Some(Exception::from_code(other).ok_or(DecodeError::UnknownException(other))?),
    };
    let flags = cursor.read_u8()?;
    let _reserved = cursor.read_u8()?;
    let federation = FederationHandle(cursor.read_u32()?);
    let federate = FederateHandle(cursor.read_u32()?);
    let body_len = cursor.read_u32()?;
    let variable = Variable {
        handle: cursor.read_u32()?,
        count: cursor.read_u32()?,
        extra: cursor.read_u64()?,
    };
    Ok(Header {
        kind,
        exception,
        flags,
        federation,
        federate,
        body_len,
        variable,
    })
}

/// Decode the body that followed `header`.
pub fn decode_body(header: &Header, body: &[u8]) -> Result<Message, DecodeError> {
    if body.len() != header.body_len() {
        return Err(DecodeError::BodyLength {
            declared: header.body_len(),
            actual: body.len(),
        });
    }
    let mut cursor = Cursor::new(body);
    let outcome = match header.exception {
        Some(exception) => {
            let reason = cursor.read_string()?;
            Err(Rejection::new(header.kind, exception, reason))
        }
        None => Ok(decode_payload(header, &mut cursor)?),
    };
    if !cursor.is_eof() {
        return Err(DecodeError::TrailingBytes {
            kind: header.kind,
            extra: cursor.remaining(),
        });
    }
    Ok(Message {
        federation: header.federation,
        federate: header.federate,
        body: outcome,
    })
}

fn write_values<H: Copy + Into<u32>>(
    variable: &mut Variable,
    body: &mut CursorMut,
    values: &[(H, Vec<u8>)],
) -> Result<(), EncodeError> {
    variable.count = wire_len(values.len())?;
    for (handle, _) in values {
        body.write_u32((*handle).into());
    }
    for (_, value) in values {
        body.write_value(value)?;
    }
    Ok(())
}

fn read_values<H: From<u32> + Copy>(
    cursor: &mut Cursor<'_>,
    count: usize,
) -> Result<Vec<(H, Vec<u8>)>, DecodeError> {
    let handles: Vec<H> = cursor.read_handles(count)?;
    let mut values = Vec::with_capacity(handles.len());
    for handle in handles {
        values.push((handle, cursor.read_value()?));
    }
    Ok(values)
}

fn write_extents(
    variable: &mut Variable,
    body: &mut CursorMut,
    extents: &[Extent],
) -> Result<(), EncodeError> {
    variable.count = wire_len(extents.len())?;
    for extent in extents {
        body.write_u32(wire_len(extent.ranges.len())?);
        for range in &extent.ranges {
            body.write_u64(range.low);
            body.write_u64(range.high);
        }
    }
    Ok(())
}

fn read_extents(cursor: &mut Cursor<'_>, count: usize) -> Result<Vec<Extent>, DecodeError> {
    if count.saturating_mul(4) > cursor.remaining() {
        return Err(DecodeError::Malformed {
            offset: cursor.offset(),
            reason: format!("{} extents exceed body", count),
        });
    }
    let mut extents = Vec::with_capacity(count);
    for _ in 0..count {
        let dimensions = cursor.read_u32()? as usize;
        if dimensions.saturating_mul(16) > cursor.remaining() {
            return Err(DecodeError::Malformed {
                offset: cursor.offset(),
                reason: format!("{} dimensions exceed body", dimensions),
            });
        }
        let mut ranges = Vec::with_capacity(dimensions);
        for _ in 0..dimensions {
            let low = cursor.read_u64()?;
            let high = cursor.read_u64()?;
            ranges.push(Range { low, high });
        }
        extents.push(Extent::new(ranges));
    }
    Ok(extents)
}

fn write_object_attributes(
    variable: &mut Variable,
    body: &mut CursorMut,
    set: &ObjectAttributes,
) -> Result<(), EncodeError> {
    variable.count = wire_len(set.attributes.len())?;
    body.write_u32(set.object.raw());
    body.write_handles(&set.attributes);
    Ok(())
}

fn read_object_attributes(
    header: &Header,
    cursor: &mut Cursor<'_>,
) -> Result<ObjectAttributes, DecodeError> {
    let object = ObjectHandle(cursor.read_u32()?);
    let attributes = cursor.read_handles(header.variable.count())?;
    Ok(ObjectAttributes { object, attributes })
}

fn write_tagged_attributes(
    variable: &mut Variable,
    body: &mut CursorMut,
    set: &TaggedObjectAttributes,
) -> Result<(), EncodeError> {
    variable.count = wire_len(set.attributes.len())?;
    body.write_u32(set.object.raw());
    body.write_string(&set.tag)?;
    body.write_handles(&set.attributes);
    Ok(())
}

fn read_tagged_attributes(
    header: &Header,
    cursor: &mut Cursor<'_>,
) -> Result<TaggedObjectAttributes, DecodeError> {
    let object = ObjectHandle(cursor.read_u32()?);
    let tag = cursor.read_string()?;
    let attributes = cursor.read_handles(header.variable.count())?;
    Ok(TaggedObjectAttributes {
        object,
        attributes,
        tag,
    })
}

fn write_attribute_values(
    variable: &mut Variable,
    flags: &mut u8,
    body: &mut CursorMut,
    update: &AttributeValues,
) -> Result<(), EncodeError> {
    variable.handle = update.class.raw();
    if let Some(time) = update.time {
        *flags |= FLAG_TIME;
        variable.set_date(time);
    }
    body.write_u32(update.object.raw());
    body.write_string(&update.tag)?;
    write_values(variable, body, &update.values)
}

fn read_attribute_values(
    header: &Header,
    cursor: &mut Cursor<'_>,
) -> Result<AttributeValues, DecodeError> {
    let object = ObjectHandle(cursor.read_u32()?);
    let tag = cursor.read_string()?;
    let values = read_values(cursor, header.variable.count())?;
    Ok(AttributeValues {
        class: ObjectClassHandle(header.variable.handle),
        object,
        values,
        tag,
        time: header.optional_time(),
    })
}

fn write_interaction_values(
    variable: &mut Variable,
    flags: &mut u8,
    body: &mut CursorMut,
    interaction: &InteractionValues,
) -> Result<(), EncodeError> {
    variable.handle = interaction.class.raw();
    if let Some(time) = interaction.time {
        *flags |= FLAG_TIME;
        variable.set_date(time);
    }
    body.write_string(&interaction.tag)?;
    body.write_u32(interaction.region.raw());
    write_values(variable, body, &interaction.parameters)
}

fn read_interaction_values(
    header: &Header,
    cursor: &mut Cursor<'_>,
) -> Result<InteractionValues, DecodeError> {
    let tag = cursor.read_string()?;
    let region = RegionHandle(cursor.read_u32()?);
    let parameters = read_values(cursor, header.variable.count())?;
    Ok(InteractionValues {
        class: InteractionClassHandle(header.variable.handle),
        parameters,
        tag,
        time: header.optional_time(),
        region,
    })
}

fn encode_payload(
    payload: &Payload,
    v: &mut Variable,
    flags: &mut u8,
    body: &mut CursorMut,
) -> Result<(), EncodeError> {
    match payload {
        Payload::CloseConnexion
        | Payload::ResignFederationExecution
        | Payload::FederateSaveBegun
        | Payload::FederateSaveComplete
        | Payload::FederateSaveNotComplete
        | Payload::FederationSaved
        | Payload::FederationNotSaved
        | Payload::FederateRestoreComplete
        | Payload::FederateRestoreNotComplete
        | Payload::FederationRestoreBegun
        | Payload::FederationRestored
        | Payload::FederationNotRestored
        | Payload::GetFedFileSuppressed => {}

        Payload::MessageNull { date }
        | Payload::TimeRegulationEnabled { date }
        | Payload::TimeConstrainedEnabled { date } => v.set_date(*date),

        Payload::SetTimeRegulating { enabled, date }
        | Payload::SetTimeConstrained { enabled, date } => {
            v.set_date(*date);
            if *enabled {
                *flags |= FLAG_BOOL;
            }
        }

        Payload::CreateFederationExecution {
            federation_name,
            descriptor,
        } => {
            body.write_string(federation_name)?;
            body.write_string(descriptor)?;
        }
        Payload::DestroyFederationExecution { federation_name } => {
            body.write_string(federation_name)?;
        }
        Payload::JoinFederationExecution {
            federation_name,
            federate_name,
            number_of_regulators,
            multicast_address,
            best_effort_address,
            best_effort_peer,
        } => {
            v.handle = *number_of_regulators;
            v.count = *multicast_address;
            v.extra = (u64::from(*best_effort_address) << 32) | u64::from(*best_effort_peer);
            body.write_string(federation_name)?;
            body.write_string(federate_name)?;
        }

        Payload::RegisterFederationSynchronizationPoint {
            label,
            tag,
            federates,
        } => {
            body.write_string(label)?;
            body.write_string(tag)?;
            if let Some(set) = federates {
                *flags |= FLAG_BOOL;
                v.count = wire_len(set.len())?;
                body.write_handles(set);
            }
        }
        Payload::AnnounceSynchronizationPoint { label, tag } => {
            body.write_string(label)?;
            body.write_string(tag)?;
        }
        Payload::SynchronizationPointRegistrationSucceeded { label }
        | Payload::SynchronizationPointAchieved { label }
        | Payload::FederationSynchronized { label }
        | Payload::InitiateFederateSave { label }
        | Payload::RequestFederationRestore { label }
        | Payload::RequestFederationRestoreSucceeded { label }
        | Payload::InitiateFederateRestore { label } => body.write_string(label)?,

        Payload::RequestFederationSave { label, time } => {
            if let Some(time) = time {
                *flags |= FLAG_TIME;
                v.set_date(*time);
            }
            body.write_string(label)?;
        }
        Payload::RequestFederationRestoreFailed { label, reason } => {
            body.write_string(label)?;
            body.write_string(reason)?;
        }

        Payload::PublishObjectClass { class, attributes }
        | Payload::SubscribeObjectClass { class, attributes }
        | Payload::RequestClassAttributeValueUpdate { class, attributes } => {
            v.handle = class.raw();
            v.count = wire_len(attributes.len())?;
            body.write_handles(attributes);
        }
        Payload::UnpublishObjectClass { class }
        | Payload::UnsubscribeObjectClass { class }
        | Payload::StartRegistrationForObjectClass { class }
        | Payload::StopRegistrationForObjectClass { class } => v.handle = class.raw(),
        Payload::PublishInteractionClass { class }
        | Payload::UnpublishInteractionClass { class }
        | Payload::SubscribeInteractionClass { class }
        | Payload::UnsubscribeInteractionClass { class }
        | Payload::TurnInteractionsOn { class }
        | Payload::TurnInteractionsOff { class } => v.handle = class.raw(),

        Payload::RegisterObject {
            class,
            object,
            name,
        }
        | Payload::DiscoverObject {
            class,
            object,
            name,
        } => {
            v.handle = class.raw();
            body.write_u32(object.raw());
            body.write_string(name)?;
        }
        Payload::UpdateAttributeValues(update) | Payload::ReflectAttributeValues(update) => {
            write_attribute_values(v, flags, body, update)?
        }
        Payload::SendInteraction(interaction) | Payload::ReceiveInteraction(interaction) => {
            write_interaction_values(v, flags, body, interaction)?
        }
        Payload::DeleteObject { object, tag } => {
            body.write_u32(object.raw());
            body.write_string(tag)?;
        }
        Payload::RemoveObject { class, object, tag } => {
            v.handle = class.raw();
            body.write_u32(object.raw());
            body.write_string(tag)?;
        }

        Payload::IsAttributeOwnedByFederate {
            object,
            attribute,
            tag,
        } => {
            body.write_u32(object.raw());
            body.write_u32(attribute.raw());
            body.write_string(tag)?;
        }
        Payload::QueryAttributeOwnership { object, attribute }
        | Payload::AttributeIsNotOwned { object, attribute } => {
            body.write_u32(object.raw());
            body.write_u32(attribute.raw());
        }
        Payload::InformAttributeOwnership {
            object,
            attribute,
            owner,
        } => {
            body.write_u32(object.raw());
            body.write_u32(attribute.raw());
            body.write_u32(owner.raw());
        }

        Payload::RequestObjectAttributeValueUpdate(set)
        | Payload::ProvideAttributeValueUpdate(set)
        | Payload::AttributeOwnershipAcquisitionNotification(set)
        | Payload::AttributeOwnershipDivestitureNotification(set)
        | Payload::AttributeOwnershipUnavailable(set)
        | Payload::AttributeOwnershipAcquisitionIfAvailable(set)
        | Payload::UnconditionalAttributeOwnershipDivestiture(set)
        | Payload::CancelNegotiatedAttributeOwnershipDivestiture(set)
        | Payload::AttributeOwnershipReleaseResponse(set)
        | Payload::CancelAttributeOwnershipAcquisition(set)
        | Payload::ConfirmAttributeOwnershipAcquisitionCancellation(set) => {
            write_object_attributes(v, body, set)?
        }
        Payload::NegotiatedAttributeOwnershipDivestiture(set)
        | Payload::RequestAttributeOwnershipAssumption(set)
        | Payload::AttributeOwnershipAcquisition(set)
        | Payload::RequestAttributeOwnershipRelease(set) => write_tagged_attributes(v, body, set)?,

        Payload::DdmCreateRegion {
            space,
            extents,
            region,
        } => {
            v.handle = space.raw();
            body.write_u32(region.raw());
            write_extents(v, body, extents)?;
        }
        Payload::DdmModifyRegion { region, extents } => {
            v.handle = region.raw();
            write_extents(v, body, extents)?;
        }
        Payload::DdmDeleteRegion { region } => v.handle = region.raw(),
        Payload::DdmAssociateRegion {
            object,
            region,
            attributes,
        } => {
            v.handle = region.raw();
            v.count = wire_len(attributes.len())?;
            body.write_u32(object.raw());
            body.write_handles(attributes);
        }
        Payload::DdmRegisterObject {
            class,
            object,
            name,
            region,
            attributes,
        } => {
            v.handle = class.raw();
            v.count = wire_len(attributes.len())?;
            body.write_u32(object.raw());
            body.write_string(name)?;
            body.write_u32(region.raw());
            body.write_handles(attributes);
        }
        Payload::DdmUnassociateRegion { object, region } => {
            v.handle = region.raw();
            body.write_u32(object.raw());
        }
        Payload::DdmSubscribeAttributes {
            class,
            region,
            attributes,
            passive,
        } => {
            v.handle = class.raw();
            v.count = wire_len(attributes.len())?;
            if *passive {
                *flags |= FLAG_BOOL;
            }
            body.write_u32(region.raw());
            body.write_handles(attributes);
        }
        Payload::DdmUnsubscribeAttributes { class, region } => {
            v.handle = class.raw();
            body.write_u32(region.raw());
        }
        Payload::DdmSubscribeInteraction {
            class,
            region,
            passive,
        } => {
            v.handle = class.raw();
            if *passive {
                *flags |= FLAG_BOOL;
            }
            body.write_u32(region.raw());
        }
        Payload::DdmUnsubscribeInteraction { class, region } => {
            v.handle = class.raw();
            body.write_u32(region.raw());
        }

        Payload::SetClassRelevanceAdvisorySwitch { on }
        | Payload::SetInteractionRelevanceAdvisorySwitch { on }
        | Payload::SetAttributeRelevanceAdvisorySwitch { on }
        | Payload::SetAttributeScopeAdvisorySwitch { on } => {
            if *on {
                *flags |= FLAG_BOOL;
            }
        }
    }
    Ok(())
}

fn decode_payload(header: &Header, c: &mut Cursor<'_>) -> Result<Payload, DecodeError> {
    use MessageKind as K;
    let v = header.variable;
    let object_class = ObjectClassHandle(v.handle);
    let interaction_class = InteractionClassHandle(v.handle);

    let payload = match header.kind {
        K::CloseConnexion => Payload::CloseConnexion,
        K::ResignFederationExecution => Payload::ResignFederationExecution,
        K::FederateSaveBegun => Payload::FederateSaveBegun,
        K::FederateSaveComplete => Payload::FederateSaveComplete,
        K::FederateSaveNotComplete => Payload::FederateSaveNotComplete,
        K::FederationSaved => Payload::FederationSaved,
        K::FederationNotSaved => Payload::FederationNotSaved,
        K::FederateRestoreComplete => Payload::FederateRestoreComplete,
        K::FederateRestoreNotComplete => Payload::FederateRestoreNotComplete,
        K::FederationRestoreBegun => Payload::FederationRestoreBegun,
        K::FederationRestored => Payload::FederationRestored,
        K::FederationNotRestored => Payload::FederationNotRestored,
        K::GetFedFileSuppressed => Payload::GetFedFileSuppressed,

        K::MessageNull => Payload::MessageNull { date: v.date() },
        K::TimeRegulationEnabled => Payload::TimeRegulationEnabled { date: v.date() },
        K::TimeConstrainedEnabled => Payload::TimeConstrainedEnabled { date: v.date() },
        K::SetTimeRegulating => Payload::SetTimeRegulating {
            enabled: header.flag(),
            date: v.date(),
        },
        K::SetTimeConstrained => Payload::SetTimeConstrained {
            enabled: header.flag(),
            date: v.date(),
        },

        K::CreateFederationExecution => Payload::CreateFederationExecution {
            federation_name: c.read_string()?,
            descriptor: c.read_string()?,
        },
        K::DestroyFederationExecution => Payload::DestroyFederationExecution {
            federation_name: c.read_string()?,
        },
        K::JoinFederationExecution => Payload::JoinFederationExecution {
            federation_name: c.read_string()?,
            federate_name: c.read_string()?,
            number_of_regulators: v.handle,
            multicast_address: v.count,
            best_effort_address: (v.extra >> 32) as u32,
            best_effort_peer: (v.extra & 0xFFFF_FFFF) as u32,
        },

        K::RegisterFederationSynchronizationPoint => {
            let label = c.read_string()?;
            let tag = c.read_string()?;
            let federates = if header.flag() {
                Some(c.read_handles(v.count())?)
            } else {
                None
            };
            Payload::RegisterFederationSynchronizationPoint {
                label,
                tag,
                federates,
            }
        }
        K::AnnounceSynchronizationPoint => Payload::AnnounceSynchronizationPoint {
            label: c.read_string()?,
            tag: c.read_string()?,
        },
        K::SynchronizationPointRegistrationSucceeded => {
            Payload::SynchronizationPointRegistrationSucceeded {
                label: c.read_string()?,
            }
        }
        K::SynchronizationPointAchieved => Payload::SynchronizationPointAchieved {
            label: c.read_string()?,
        },
        K::FederationSynchronized => Payload::FederationSynchronized {
            label: c.read_string()?,
        },
        K::InitiateFederateSave => Payload::InitiateFederateSave {
            label: c.read_string()?,
        },
        K::RequestFederationRestore => Payload::RequestFederationRestore {
            label: c.read_string()?,
        },
        K::RequestFederationRestoreSucceeded => Payload::RequestFederationRestoreSucceeded {
            label: c.read_string()?,
        },
        K::InitiateFederateRestore => Payload::InitiateFederateRestore {
            label: c.read_string()?,
        },
        K::RequestFederationSave => Payload::RequestFederationSave {
            label: c.read_string()?,
            time: header.optional_time(),
        },
        K::RequestFederationRestoreFailed => Payload::RequestFederationRestoreFailed {
            label: c.read_string()?,
            reason: c.read_string()?,
        },

        K::PublishObjectClass => Payload::PublishObjectClass {
            class: object_class,
            attributes: c.read_handles(v.count())?,
        },
        K::SubscribeObjectClass => Payload::SubscribeObjectClass {
            class: object_class,
            attributes: c.read_handles(v.count())?,
        },
        K::RequestClassAttributeValueUpdate => Payload::RequestClassAttributeValueUpdate {
            class: object_class,
            attributes: c.read_handles(v.count())?,
        },
        K::UnpublishObjectClass => Payload::UnpublishObjectClass {
            class: object_class,
        },
        K::UnsubscribeObjectClass => Payload::UnsubscribeObjectClass {
            class: object_class,
        },
        K::StartRegistrationForObjectClass => Payload::StartRegistrationForObjectClass {
            class: object_class,
        },
        K::StopRegistrationForObjectClass => Payload::StopRegistrationForObjectClass {
            class: object_class,
        },
        K::PublishInteractionClass => Payload::PublishInteractionClass {
            class: interaction_class,
        },
        K::UnpublishInteractionClass => Payload::UnpublishInteractionClass {
            class: interaction_class,
        },
        K::SubscribeInteractionClass => Payload::SubscribeInteractionClass {
            class: interaction_class,
        },
        K::UnsubscribeInteractionClass => Payload::UnsubscribeInteractionClass {
            class: interaction_class,
        },
        K::TurnInteractionsOn => Payload::TurnInteractionsOn {
            class: interaction_class,
        },
        K::TurnInteractionsOff => Payload::TurnInteractionsOff {
            class: interaction_class,
        },

        K::RegisterObject => Payload::RegisterObject {
            class: object_class,
            object: ObjectHandle(c.read_u32()?),
            name: c.read_string()?,
        },
        K::DiscoverObject => Payload::DiscoverObject {
            class: object_class,
            object: ObjectHandle(c.read_u32()?),
            name: c.read_string()?,
        },
        K::UpdateAttributeValues => {
            Payload::UpdateAttributeValues(read_attribute_values(header, c)?)
        }
        K::ReflectAttributeValues => {
            Payload::ReflectAttributeValues(read_attribute_values(header, c)?)
        }
        K::SendInteraction => Payload::SendInteraction(read_interaction_values(header, c)?),
        K::ReceiveInteraction => Payload::ReceiveInteraction(read_interaction_values(header, c)?),
        K::DeleteObject => Payload::DeleteObject {
            object: ObjectHandle(c.read_u32()?),
            tag: c.read_string()?,
        },
        K::RemoveObject => Payload::RemoveObject {
            class: object_class,
            object: ObjectHandle(c.read_u32()?),
            tag: c.read_string()?,
        },

        K::IsAttributeOwnedByFederate => Payload::IsAttributeOwnedByFederate {
            object: ObjectHandle(c.read_u32()?),
            attribute: c.read_u32()?.into(),
            tag: c.read_string()?,
        },
        K::QueryAttributeOwnership => Payload::QueryAttributeOwnership {
            object: ObjectHandle(c.read_u32()?),
            attribute: c.read_u32()?.into(),
        },
        K::AttributeIsNotOwned => Payload::AttributeIsNotOwned {
            object: ObjectHandle(c.read_u32()?),
            attribute: c.read_u32()?.into(),
        },
        K::InformAttributeOwnership => Payload::InformAttributeOwnership {
            object: ObjectHandle(c.read_u32()?),
            attribute: c.read_u32()?.into(),
            owner: FederateHandle(c.read_u32()?),
        },

        K::RequestObjectAttributeValueUpdate => {
            Payload::RequestObjectAttributeValueUpdate(read_object_attributes(header, c)?)
        }
        K::ProvideAttributeValueUpdate => {
            Payload::ProvideAttributeValueUpdate(read_object_attributes(header, c)?)
        }
        K::AttributeOwnershipAcquisitionNotification => {
            Payload::AttributeOwnershipAcquisitionNotification(read_object_attributes(header, c)?)
        }
        K::AttributeOwnershipDivestitureNotification => {
            Payload::AttributeOwnershipDivestitureNotification(read_object_attributes(header, c)?)
        }
        K::AttributeOwnershipUnavailable => {
            Payload::AttributeOwnershipUnavailable(read_object_attributes(header, c)?)
        }
        K::AttributeOwnershipAcquisitionIfAvailable => {
            Payload::AttributeOwnershipAcquisitionIfAvailable(read_object_attributes(header, c)?)
        }
        K::UnconditionalAttributeOwnershipDivestiture => {
            Payload::UnconditionalAttributeOwnershipDivestiture(read_object_attributes(header, c)?)
        }
        K::CancelNegotiatedAttributeOwnershipDivestiture => {
            Payload::CancelNegotiatedAttributeOwnershipDivestiture(read_object_attributes(
                header, c,
            )?)
        }
        K::AttributeOwnershipReleaseResponse => {
            Payload::AttributeOwnershipReleaseResponse(read_object_attributes(header, c)?)
        }
        K::CancelAttributeOwnershipAcquisition => {
            Payload::CancelAttributeOwnershipAcquisition(read_object_attributes(header, c)?)
        }
        K::ConfirmAttributeOwnershipAcquisitionCancellation => {
            Payload::ConfirmAttributeOwnershipAcquisitionCancellation(read_object_attributes(
                header, c,
            )?)
        }
        K::NegotiatedAttributeOwnershipDivestiture => {
            Payload::NegotiatedAttributeOwnershipDivestiture(read_tagged_attributes(header, c)?)
        }
        K::RequestAttributeOwnershipAssumption => {
            Payload::RequestAttributeOwnershipAssumption(read_tagged_attributes(header, c)?)
        }
        K::AttributeOwnershipAcquisition => {
            Payload::AttributeOwnershipAcquisition(read_tagged_attributes(header, c)?)
        }
        K::RequestAttributeOwnershipRelease => {
            Payload::RequestAttributeOwnershipRelease(read_tagged_attributes(header, c)?)
        }

        K::DdmCreateRegion => {
            let region = RegionHandle(c.read_u32()?);
            Payload::DdmCreateRegion {
                space: SpaceHandle(v.handle),
                extents: read_extents(c, v.count())?,
                region,
            }
        }
        K::DdmModifyRegion => Payload::DdmModifyRegion {
            region: RegionHandle(v.handle),
            extents: read_extents(c, v.count())?,
        },
        K::DdmDeleteRegion => Payload::DdmDeleteRegion {
            region: RegionHandle(v.handle),
        },
        K::DdmAssociateRegion => Payload::DdmAssociateRegion {
            object: ObjectHandle(c.read_u32()?),
            region: RegionHandle(v.handle),
            attributes: c.read_handles(v.count())?,
        },
        K::DdmRegisterObject => Payload::DdmRegisterObject {
            class: object_class,
            object: ObjectHandle(c.read_u32()?),
            name: c.read_string()?,
            region: RegionHandle(c.read_u32()?),
            attributes: c.read_handles(v.count())?,
        },
        K::DdmUnassociateRegion => Payload::DdmUnassociateRegion {
            object: ObjectHandle(c.read_u32()?),
            region: RegionHandle(v.handle),
        },
        K::DdmSubscribeAttributes => Payload::DdmSubscribeAttributes {
            class: object_class,
            region: RegionHandle(c.read_u32()?),
            attributes: c.read_handles(v.count())?,
            passive: header.flag(),
        },
        K::DdmUnsubscribeAttributes => Payload::DdmUnsubscribeAttributes {
            class: object_class,
            region: RegionHandle(c.read_u32()?),
        },
        K::DdmSubscribeInteraction => Payload::DdmSubscribeInteraction {
            class: interaction_class,
            region: RegionHandle(c.read_u32()?),
            passive: header.flag(),
        },
        K::DdmUnsubscribeInteraction => Payload::DdmUnsubscribeInteraction {
            class: interaction_class,
            region: RegionHandle(c.read_u32()?),
        },

        K::SetClassRelevanceAdvisorySwitch => Payload::SetClassRelevanceAdvisorySwitch {
            on: header.flag(),
        },
        K::SetInteractionRelevanceAdvisorySwitch => {
            Payload::SetInteractionRelevanceAdvisorySwitch { on: header.flag() }
        }
        K::SetAttributeRelevanceAdvisorySwitch => Payload::SetAttributeRelevanceAdvisorySwitch {
            on: header.flag(),
        },
        K::SetAttributeScopeAdvisorySwitch => Payload::SetAttributeScopeAdvisorySwitch {
            on: header.flag(),
        },

        K::ChangeAttributeTransportType
        | K::ChangeAttributeOrderType
        | K::ChangeInteractionTransportType
        | K::ChangeInteractionOrderType => return Err(DecodeError::Unimplemented(header.kind)),
    };
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::{AttributeHandle, ParameterHandle};
    use std::collections::BTreeSet;

    fn frame(payload: Payload) -> Message {
        Message::new(FederationHandle(3), FederateHandle(7), payload)
    }

    #[test]
    fn test_zero_payload_kind_has_no_body() {
        let bytes = encode(&frame(Payload::ResignFederationExecution)).unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(bytes[0], MessageKind::ResignFederationExecution.code());
    }

    #[test]
    fn test_time_stamp_lives_in_header() {
        let bytes = encode(&frame(Payload::MessageNull {
            date: FederationTime::new(12.5),
        }))
        .unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(
            decoded.payload(),
            Some(&Payload::MessageNull {
                date: FederationTime::new(12.5)
            })
        );
    }

    #[test]
    fn test_exception_body_is_only_reason() {
        let msg = Message::rejected(
            FederationHandle(1),
            FederateHandle(2),
            Rejection::new(
                MessageKind::UpdateAttributeValues,
                Exception::AttributeNotOwned,
                "attribute 4",
            ),
        );
        let bytes = encode(&msg).unwrap();
        // header + u32 length + "attribute 4"
        assert_eq!(bytes.len(), HEADER_SIZE + 4 + 11);
        assert_eq!(bytes[1], Exception::AttributeNotOwned.code());
        // Variable part stays zeroed.
        assert!(bytes[16..32].iter().all(|b| *b == 0));
        assert_eq!(decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_handle_array_size_travels_in_header() {
        let bytes = encode(&frame(Payload::PublishObjectClass {
            class: ObjectClassHandle(9),
            attributes: vec![AttributeHandle(1), AttributeHandle(2), AttributeHandle(3)],
        }))
        .unwrap();
        assert_eq!(&bytes[16..20], &9u32.to_be_bytes());
        assert_eq!(&bytes[20..24], &3u32.to_be_bytes());
        assert_eq!(bytes.len(), HEADER_SIZE + 12);
    }

    #[test]
    fn test_unknown_kind_is_fatal() {
        let mut bytes = encode(&frame(Payload::FederationSaved)).unwrap();
        bytes[0] = 0;
        assert_eq!(decode(&bytes), Err(DecodeError::UnknownKind(0)));
        bytes[0] = 200;
        let err = decode(&bytes).unwrap_err();
        assert_eq!(err, DecodeError::UnknownKind(200));
        assert_eq!(err.exception(), Exception::RtiInternalError);
    }

    #[test]
    fn test_unimplemented_kind_is_fatal() {
        let mut bytes = encode(&frame(Payload::FederationSaved)).unwrap();
        bytes[0] = MessageKind::ChangeAttributeOrderType.code();
        assert_eq!(
            decode(&bytes),
            Err(DecodeError::Unimplemented(MessageKind::ChangeAttributeOrderType))
        );
    }

    #[test]
    fn test_unknown_exception_code() {
        let mut bytes = encode(&frame(Payload::FederationSaved)).unwrap();
        bytes[1] = 250;
        assert_eq!(decode(&bytes), Err(DecodeError::UnknownException(250)));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode(&frame(Payload::DestroyFederationExecution {
            federation_name: "F".into(),
        }))
        .unwrap();
        bytes.push(0);
        let declared = (bytes.len() - HEADER_SIZE) as u32;
        bytes[12..16].copy_from_slice(&declared.to_be_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(DecodeError::TrailingBytes { extra: 1, .. })
        ));
    }

    #[test]
    fn test_body_length_mismatch() {
        let mut bytes = encode(&frame(Payload::DestroyFederationExecution {
            federation_name: "F".into(),
        }))
        .unwrap();
        bytes.pop();
        assert!(matches!(
            decode(&bytes),
            Err(DecodeError::BodyLength { .. })
        ));
    }

    #[test]
    fn test_short_frame() {
        assert!(matches!(
            decode(&[1, 2, 3]),
            Err(DecodeError::Truncated { offset: 3, .. })
        ));
    }

    #[test]
    fn test_join_packs_best_effort_endpoint() {
        let msg = frame(Payload::JoinFederationExecution {
            federation_name: "F".into(),
            federate_name: "A".into(),
            number_of_regulators: 2,
            multicast_address: 0xE000_00FB,
            best_effort_address: 0x7F00_0001,
            best_effort_peer: 60500,
        });
        assert_eq!(decode(&encode(&msg).unwrap()).unwrap(), msg);
    }

    #[test]
    fn test_interaction_with_region_and_time() {
        let msg = frame(Payload::ReceiveInteraction(InteractionValues {
            class: InteractionClassHandle(2),
            parameters: vec![(ParameterHandle(1), vec![0xAA; 3])],
            tag: "hit".into(),
            time: Some(FederationTime::new(4.0)),
            region: RegionHandle(5),
        }));
        assert_eq!(decode(&encode(&msg).unwrap()).unwrap(), msg);
    }

    fn t(value: f64) -> FederationTime {
        FederationTime::new(value)
    }

    fn attrs(handles: &[u32]) -> Vec<AttributeHandle> {
        handles.iter().map(|h| AttributeHandle(*h)).collect()
    }

    fn set(object: u32, handles: &[u32]) -> ObjectAttributes {
        ObjectAttributes {
            object: ObjectHandle(object),
            attributes: attrs(handles),
        }
    }

    fn tagged(object: u32, handles: &[u32], tag: &str) -> TaggedObjectAttributes {
        TaggedObjectAttributes {
            object: ObjectHandle(object),
            attributes: attrs(handles),
            tag: tag.into(),
        }
    }

    fn update(
        values: Vec<(AttributeHandle, Vec<u8>)>,
        time: Option<FederationTime>,
    ) -> AttributeValues {
        AttributeValues {
            class: ObjectClassHandle(4),
            object: ObjectHandle(12),
            values,
            tag: "u".into(),
            time,
        }
    }

    fn interaction(
        parameters: Vec<(ParameterHandle, Vec<u8>)>,
        time: Option<FederationTime>,
    ) -> InteractionValues {
        InteractionValues {
            class: InteractionClassHandle(2),
            parameters,
            tag: String::new(),
            time,
            region: RegionHandle::NONE,
        }
    }

    fn extents(dimensions: &[&[(u64, u64)]]) -> Vec<Extent> {
        dimensions
            .iter()
            .map(|ranges| {
                Extent::new(
                    ranges
                        .iter()
                        .map(|(low, high)| Range {
                            low: *low,
                            high: *high,
                        })
                        .collect(),
                )
            })
            .collect()
    }

    /// Representative payloads for every kind that has a body layout, with
    /// empty strings, empty handle arrays and a large value blob mixed in.
    fn samples() -> Vec<Payload> {
        let blob = vec![0x5A; 1 << 20];
        vec![
            Payload::CloseConnexion,
            Payload::MessageNull { date: t(0.0) },
            Payload::MessageNull {
                date: FederationTime::INFINITY,
            },
            Payload::CreateFederationExecution {
                federation_name: "F".into(),
                descriptor: "traffic.json".into(),
            },
            Payload::CreateFederationExecution {
                federation_name: String::new(),
                descriptor: String::new(),
            },
            Payload::DestroyFederationExecution {
                federation_name: "F".into(),
            },
            Payload::JoinFederationExecution {
                federation_name: "F".into(),
                federate_name: String::new(),
                number_of_regulators: 0,
                multicast_address: 0,
                best_effort_address: u32::MAX,
                best_effort_peer: u32::MAX,
            },
            Payload::ResignFederationExecution,
            Payload::SetTimeRegulating {
                enabled: true,
                date: t(1.5),
            },
            Payload::SetTimeRegulating {
                enabled: false,
                date: t(0.0),
            },
            Payload::SetTimeConstrained {
                enabled: true,
                date: t(3.0),
            },
            Payload::TimeRegulationEnabled { date: t(2.0) },
            Payload::TimeConstrainedEnabled { date: t(2.0) },
            Payload::RegisterFederationSynchronizationPoint {
                label: "ready".into(),
                tag: String::new(),
                federates: None,
            },
            Payload::RegisterFederationSynchronizationPoint {
                label: "ready".into(),
                tag: "t".into(),
                federates: Some(vec![]),
            },
            Payload::RegisterFederationSynchronizationPoint {
                label: "ready".into(),
                tag: "t".into(),
                federates: Some(vec![FederateHandle(1), FederateHandle(3)]),
            },
            Payload::SynchronizationPointRegistrationSucceeded {
                label: "ready".into(),
            },
            Payload::AnnounceSynchronizationPoint {
                label: "ready".into(),
                tag: "go".into(),
            },
            Payload::SynchronizationPointAchieved {
                label: String::new(),
            },
            Payload::FederationSynchronized {
                label: "ready".into(),
            },
            Payload::RequestFederationSave {
                label: "s1".into(),
                time: None,
            },
            Payload::RequestFederationSave {
                label: "s1".into(),
                time: Some(t(8.0)),
            },
            Payload::FederateSaveBegun,
            Payload::FederateSaveComplete,
            Payload::FederateSaveNotComplete,
            Payload::InitiateFederateSave { label: "s1".into() },
            Payload::FederationSaved,
            Payload::FederationNotSaved,
            Payload::RequestFederationRestore { label: "s1".into() },
            Payload::FederateRestoreComplete,
            Payload::FederateRestoreNotComplete,
            Payload::RequestFederationRestoreSucceeded { label: "s1".into() },
            Payload::RequestFederationRestoreFailed {
                label: "s2".into(),
                reason: "unknown label".into(),
            },
            Payload::FederationRestoreBegun,
            Payload::InitiateFederateRestore { label: "s1".into() },
            Payload::FederationRestored,
            Payload::FederationNotRestored,
            Payload::PublishObjectClass {
                class: ObjectClassHandle(1),
                attributes: attrs(&[1, 2]),
            },
            Payload::PublishObjectClass {
                class: ObjectClassHandle(1),
                attributes: vec![],
            },
            Payload::UnpublishObjectClass {
                class: ObjectClassHandle(1),
            },
            Payload::PublishInteractionClass {
                class: InteractionClassHandle(2),
            },
            Payload::UnpublishInteractionClass {
                class: InteractionClassHandle(2),
            },
            Payload::SubscribeObjectClass {
                class: ObjectClassHandle(1),
                attributes: attrs(&[2]),
            },
            Payload::UnsubscribeObjectClass {
                class: ObjectClassHandle(1),
            },
            Payload::SubscribeInteractionClass {
                class: InteractionClassHandle(2),
            },
            Payload::UnsubscribeInteractionClass {
                class: InteractionClassHandle(2),
            },
            Payload::TurnInteractionsOn {
                class: InteractionClassHandle(2),
            },
            Payload::TurnInteractionsOff {
                class: InteractionClassHandle(2),
            },
            Payload::RegisterObject {
                class: ObjectClassHandle(1),
                object: ObjectHandle::NONE,
                name: String::new(),
            },
            Payload::DiscoverObject {
                class: ObjectClassHandle(1),
                object: ObjectHandle(12),
                name: "car".into(),
            },
            Payload::UpdateAttributeValues(update(vec![], None)),
            Payload::UpdateAttributeValues(update(
                vec![(AttributeHandle(1), blob.clone()), (AttributeHandle(2), vec![])],
                Some(t(5.0)),
            )),
            Payload::ReflectAttributeValues(update(
                vec![(AttributeHandle(2), vec![1, 2, 3])],
                None,
            )),
            Payload::SendInteraction(interaction(vec![], Some(t(1.0)))),
            Payload::ReceiveInteraction(interaction(
                vec![(ParameterHandle(1), blob), (ParameterHandle(2), vec![0])],
                None,
            )),
            Payload::DeleteObject {
                object: ObjectHandle(12),
                tag: String::new(),
            },
            Payload::RemoveObject {
                class: ObjectClassHandle(1),
                object: ObjectHandle(12),
                tag: "gone".into(),
            },
            Payload::RequestClassAttributeValueUpdate {
                class: ObjectClassHandle(1),
                attributes: attrs(&[1]),
            },
            Payload::RequestObjectAttributeValueUpdate(set(12, &[])),
            Payload::ProvideAttributeValueUpdate(set(12, &[1, 2])),
            Payload::IsAttributeOwnedByFederate {
                object: ObjectHandle(12),
                attribute: AttributeHandle(1),
                tag: "RTI_TRUE".into(),
            },
            Payload::QueryAttributeOwnership {
                object: ObjectHandle(12),
                attribute: AttributeHandle(1),
            },
            Payload::AttributeIsNotOwned {
                object: ObjectHandle(12),
                attribute: AttributeHandle(1),
            },
            Payload::InformAttributeOwnership {
                object: ObjectHandle(12),
                attribute: AttributeHandle(1),
                owner: FederateHandle(2),
            },
            Payload::NegotiatedAttributeOwnershipDivestiture(tagged(12, &[1, 2], "take")),
            Payload::AttributeOwnershipAcquisitionNotification(set(12, &[1])),
            Payload::AttributeOwnershipDivestitureNotification(set(12, &[1])),
            Payload::RequestAttributeOwnershipAssumption(tagged(12, &[1], "")),
            Payload::AttributeOwnershipUnavailable(set(12, &[2])),
            Payload::AttributeOwnershipAcquisitionIfAvailable(set(12, &[1, 2])),
            Payload::UnconditionalAttributeOwnershipDivestiture(set(12, &[])),
            Payload::AttributeOwnershipAcquisition(tagged(12, &[], "")),
            Payload::RequestAttributeOwnershipRelease(tagged(12, &[1], "please")),
            Payload::CancelNegotiatedAttributeOwnershipDivestiture(set(12, &[1])),
            Payload::AttributeOwnershipReleaseResponse(set(12, &[1])),
            Payload::CancelAttributeOwnershipAcquisition(set(12, &[2])),
            Payload::ConfirmAttributeOwnershipAcquisitionCancellation(set(12, &[2])),
            Payload::DdmCreateRegion {
                space: SpaceHandle(1),
                extents: extents(&[&[(0, 10), (5, 6)], &[]]),
                region: RegionHandle::NONE,
            },
            Payload::DdmCreateRegion {
                space: SpaceHandle(1),
                extents: vec![],
                region: RegionHandle(3),
            },
            Payload::DdmModifyRegion {
                region: RegionHandle(3),
                extents: extents(&[&[(0, u64::MAX)]]),
            },
            Payload::DdmDeleteRegion {
                region: RegionHandle(3),
            },
            Payload::DdmAssociateRegion {
                object: ObjectHandle(12),
                region: RegionHandle(3),
                attributes: attrs(&[1]),
            },
            Payload::DdmRegisterObject {
                class: ObjectClassHandle(1),
                object: ObjectHandle::NONE,
                name: "truck".into(),
                region: RegionHandle(3),
                attributes: vec![],
            },
            Payload::DdmUnassociateRegion {
                object: ObjectHandle(12),
                region: RegionHandle(3),
            },
            Payload::DdmSubscribeAttributes {
                class: ObjectClassHandle(1),
                region: RegionHandle(3),
                attributes: attrs(&[1, 2]),
                passive: true,
            },
            Payload::DdmUnsubscribeAttributes {
                class: ObjectClassHandle(1),
                region: RegionHandle(3),
            },
            Payload::DdmSubscribeInteraction {
                class: InteractionClassHandle(2),
                region: RegionHandle(3),
                passive: false,
            },
            Payload::DdmUnsubscribeInteraction {
                class: InteractionClassHandle(2),
                region: RegionHandle(3),
            },
            Payload::GetFedFileSuppressed,
            Payload::SetClassRelevanceAdvisorySwitch { on: true },
            Payload::SetInteractionRelevanceAdvisorySwitch { on: false },
            Payload::SetAttributeRelevanceAdvisorySwitch { on: true },
            Payload::SetAttributeScopeAdvisorySwitch { on: false },
            Payload::StartRegistrationForObjectClass {
                class: ObjectClassHandle(1),
            },
            Payload::StopRegistrationForObjectClass {
                class: ObjectClassHandle(1),
            },
        ]
    }

    #[test]
    fn test_every_kind_round_trips() {
        let payloads = samples();
        let covered: BTreeSet<MessageKind> = payloads.iter().map(Payload::kind).collect();
        let expected: BTreeSet<MessageKind> = MessageKind::ALL
            .iter()
            .copied()
            .filter(|kind| !kind.is_unimplemented())
            .collect();
        assert_eq!(covered, expected);

        for payload in payloads {
            let kind = payload.kind();
            let msg = frame(payload);
            let bytes = encode(&msg).unwrap();
            assert_eq!(bytes[0], kind.code());
            assert_eq!(decode(&bytes).unwrap(), msg, "{} did not round-trip", kind);
        }
    }

    #[test]
    fn test_every_kind_round_trips_as_rejection() {
        for kind in MessageKind::ALL.iter().copied() {
            if kind.is_unimplemented() {
                continue;
            }
            for reason in ["", "not a member"] {
                let msg = Message::rejected(
                    FederationHandle(3),
                    FederateHandle(7),
                    Rejection::new(kind, Exception::FederateNotExecutionMember, reason),
                );
                let bytes = encode(&msg).unwrap();
                assert_eq!(bytes.len(), HEADER_SIZE + 4 + reason.len());
                assert_eq!(decode(&bytes).unwrap(), msg, "{} rejection", kind);
            }
        }
    }
}
