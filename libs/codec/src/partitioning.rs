//! Request partitioning (thread pool id) extension
//!
//! A server advertises the thread pool a client should target through a
//! proprietary tagged component in its IIOP profile. The client copies the
//! id into flags bits 2..7 of every request header. Versions without room
//! for the bits, profiles without the component and a disabled extension
//! all yield the configured default id.

use crate::cdr::{CdrReader, CdrWriter};
use crate::error::{ProtocolError, ProtocolResult};
use crate::policy::VersionPolicy;
use giop_config::PartitioningSettings;
use giop_types::{ByteOrder, GiopVersion, InvocationTarget, TaggedComponent, TAG_REQUEST_PARTITIONING_ID};
use tracing::debug;

/// Encode a partitioning component: an encapsulated ulong
pub fn partitioning_component(id: u32, byte_order: ByteOrder) -> TaggedComponent {
    let mut w = CdrWriter::for_encapsulation(byte_order);
    w.write_ulong(id);
    TaggedComponent {
        tag: TAG_REQUEST_PARTITIONING_ID,
        component_data: w.into_bytes(),
    }
}

/// Decode the id carried by a partitioning component
pub fn read_partitioning_component(component: &TaggedComponent) -> ProtocolResult<u32> {
    let mut r = CdrReader::for_encapsulation(&component.component_data)?;
    r.read_ulong()
}

/// Select the partitioning id for an outbound request
pub fn select_partitioning_id(
    settings: &PartitioningSettings,
    policy: &VersionPolicy,
    version: GiopVersion,
    target: &InvocationTarget,
) -> ProtocolResult<u8> {
    if !settings.enabled || !policy.supports_request_partitioning(version) {
        return Ok(settings.default_id);
    }

    let Some(component) = target.component(TAG_REQUEST_PARTITIONING_ID) else {
        debug!(
            version = %version,
            default_id = settings.default_id,
            "no request partitioning component on target, using default"
        );
        return Ok(settings.default_id);
    };

    let id = i64::from(read_partitioning_component(component)?);
    if !settings.contains(id) {
        return Err(ProtocolError::InvalidRequestPartitioningId {
            id,
            min: settings.min_id,
            max: settings.max_id,
        });
    }
    Ok(id as u8)
}
