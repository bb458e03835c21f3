//! Composite body fields shared by several message kinds

use crate::cdr::{CdrReader, CdrWriter};
use crate::error::{ProtocolError, ProtocolResult};
use giop_types::{
    AddressingDisposition, CompletionStatus, Ior, IorAddressingInfo, ObjectKey, ServiceContext,
    SystemExceptionInfo, TaggedProfile, TargetAddress,
};

pub(crate) fn read_service_contexts(r: &mut CdrReader<'_>) -> ProtocolResult<Vec<ServiceContext>> {
    let count = read_count(r, "service context list", 8)?;
    let mut contexts = Vec::with_capacity(count);
    for _ in 0..count {
        let context_id = r.read_ulong()?;
        let context_data = r.read_octet_seq()?;
        contexts.push(ServiceContext {
            context_id,
            context_data,
        });
    }
    Ok(contexts)
}

pub(crate) fn write_service_contexts(
    w: &mut CdrWriter,
    contexts: &[ServiceContext],
) -> ProtocolResult<()> {
    w.write_ulong(contexts.len() as u32);
    for context in contexts {
        w.write_ulong(context.context_id);
        w.write_octet_seq(&context.context_data)?;
    }
    Ok(())
}

pub(crate) fn read_tagged_profile(r: &mut CdrReader<'_>) -> ProtocolResult<TaggedProfile> {
    let tag = r.read_ulong()?;
    let profile_data = r.read_octet_seq()?;
    Ok(TaggedProfile { tag, profile_data })
}

pub(crate) fn write_tagged_profile(w: &mut CdrWriter, profile: &TaggedProfile) -> ProtocolResult<()> {
    w.write_ulong(profile.tag);
    w.write_octet_seq(&profile.profile_data)
}

pub(crate) fn read_ior(r: &mut CdrReader<'_>) -> ProtocolResult<Ior> {
    let type_id = r.read_string()?;
    let count = read_count(r, "IOR profile list", 8)?;
    let mut profiles = Vec::with_capacity(count);
    for _ in 0..count {
        profiles.push(read_tagged_profile(r)?);
    }
    Ok(Ior { type_id, profiles })
}

pub(crate) fn write_ior(w: &mut CdrWriter, ior: &Ior) -> ProtocolResult<()> {
    w.write_string(&ior.type_id)?;
    w.write_ulong(ior.profiles.len() as u32);
    for profile in &ior.profiles {
        write_tagged_profile(w, profile)?;
    }
    Ok(())
}

pub(crate) fn read_disposition(r: &mut CdrReader<'_>) -> ProtocolResult<AddressingDisposition> {
    let offset = r.position();
    let raw = r.read_short()?;
    AddressingDisposition::try_from(raw).map_err(|_| ProtocolError::InvalidEnumValue {
        type_name: "AddressingDisposition",
        value: i64::from(raw),
        offset,
    })
}

pub(crate) fn read_target_address(r: &mut CdrReader<'_>) -> ProtocolResult<TargetAddress> {
    match read_disposition(r)? {
        AddressingDisposition::KeyAddr => Ok(TargetAddress::Key(ObjectKey(r.read_octet_seq()?))),
        AddressingDisposition::ProfileAddr => Ok(TargetAddress::Profile(read_tagged_profile(r)?)),
        AddressingDisposition::ReferenceAddr => {
            let selected_profile_index = r.read_ulong()?;
            let ior = read_ior(r)?;
            Ok(TargetAddress::Reference(IorAddressingInfo {
                selected_profile_index,
                ior,
            }))
        }
    }
}

pub(crate) fn write_target_address(w: &mut CdrWriter, target: &TargetAddress) -> ProtocolResult<()> {
    w.write_short(target.disposition() as i16);
    match target {
        TargetAddress::Key(key) => w.write_octet_seq(key.as_bytes()),
        TargetAddress::Profile(profile) => write_tagged_profile(w, profile),
        TargetAddress::Reference(info) => {
            w.write_ulong(info.selected_profile_index);
            write_ior(w, &info.ior)
        }
    }
}

pub(crate) fn read_system_exception(r: &mut CdrReader<'_>) -> ProtocolResult<SystemExceptionInfo> {
    let exception_id = r.read_string()?;
    let minor_code = r.read_ulong()?;
    let offset = r.position();
    let raw = r.read_ulong()?;
    let completion_status =
        CompletionStatus::try_from(raw).map_err(|_| ProtocolError::InvalidEnumValue {
            type_name: "CompletionStatus",
            value: i64::from(raw),
            offset,
        })?;
    Ok(SystemExceptionInfo {
        exception_id,
        minor_code,
        completion_status,
    })
}

pub(crate) fn write_system_exception(
    w: &mut CdrWriter,
    info: &SystemExceptionInfo,
) -> ProtocolResult<()> {
    w.write_string(&info.exception_id)?;
    w.write_ulong(info.minor_code);
    w.write_ulong(info.completion_status as u32);
    Ok(())
}

/// Element count of a sequence; each element needs at least `min_element`
/// bytes, which bounds the count by what is left in the buffer
fn read_count(r: &mut CdrReader<'_>, what: &str, min_element: usize) -> ProtocolResult<usize> {
    let offset = r.position();
    let count = r.read_ulong()? as usize;
    if count.saturating_mul(min_element) > r.remaining() {
        return Err(ProtocolError::marshal(
            offset,
            format!("{} count {} exceeds remaining {} bytes", what, count, r.remaining()),
        ));
    }
    Ok(count)
}
