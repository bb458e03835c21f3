//! Object key resolution for request targets
//!
//! GIOP 1.0 and 1.1 requests name their target by object key. GIOP 1.2
//! sends a [`TargetAddress`] that may instead carry an IIOP profile or a
//! whole IOR. [`TargetResolver`] reduces any of these to an object key,
//! after checking the sender used a disposition the local
//! [`AddressingPolicy`] accepts, and hands the raw key to an
//! [`ObjectKeyResolver`] supplied by the object adapter layer.

use crate::cdr::{CdrReader, CdrWriter};
use crate::error::{ProtocolError, ProtocolResult};
use crate::messages::{LocateRequestMessage, RequestMessage};
use giop_config::{AddressingPolicy, OrbConfig};
use giop_types::{
    AddressingDisposition, ByteOrder, GiopVersion, ObjectKey, Revision,
    TaggedComponent, TaggedProfile, TargetAddress, TAG_INTERNET_IOP,
};

/// Turns raw object key bytes into the canonical key of the next layer
pub trait ObjectKeyResolver {
    fn resolve_key(&self, key: &[u8]) -> ProtocolResult<ObjectKey>;
}

impl<F> ObjectKeyResolver for F
where
    F: Fn(&[u8]) -> ProtocolResult<ObjectKey>,
{
    fn resolve_key(&self, key: &[u8]) -> ProtocolResult<ObjectKey> {
        self(key)
    }
}

/// Accepts any non-empty key as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct RawObjectKeys;

impl ObjectKeyResolver for RawObjectKeys {
    fn resolve_key(&self, key: &[u8]) -> ProtocolResult<ObjectKey> {
        if key.is_empty() {
            return Err(ProtocolError::invalid_object_key("empty object key"));
        }
        Ok(ObjectKey::new(key))
    }
}

#[derive(Debug, Clone)]
pub struct TargetResolver<R = RawObjectKeys> {
    policy: AddressingPolicy,
    resolver: R,
}

impl TargetResolver<RawObjectKeys> {
    pub fn new(policy: AddressingPolicy) -> Self {
        Self::with_resolver(policy, RawObjectKeys)
    }

    pub fn from_config(config: &OrbConfig) -> Self {
        Self::new(config.addressing.policy)
    }
}

impl<R: ObjectKeyResolver> TargetResolver<R> {
    pub fn with_resolver(policy: AddressingPolicy, resolver: R) -> Self {
        Self { policy, resolver }
    }

    pub fn policy(&self) -> AddressingPolicy {
        self.policy
    }

    /// Check the disposition against the policy, then extract and resolve
    /// the key
    pub fn resolve_target(&self, target: &TargetAddress) -> ProtocolResult<ObjectKey> {
        let actual = target.disposition();
        if let Some(expected) = self.policy.required_disposition() {
            if expected != actual {
                return Err(ProtocolError::AddressingDisposition { expected, actual });
            }
        }

        match target {
            TargetAddress::Key(key) => self.resolver.resolve_key(key.as_bytes()),
            TargetAddress::Profile(profile) => {
                let body = IiopProfile::decode(profile)?;
                self.resolver.resolve_key(body.object_key.as_bytes())
            }
            TargetAddress::Reference(info) => {
                let index = info.selected_profile_index as usize;
                let profile = info.ior.profiles.get(index).ok_or_else(|| {
                    ProtocolError::invalid_object_key(format!(
                        "selected profile {} out of range ({} profiles)",
                        index,
                        info.ior.profiles.len()
                    ))
                })?;
                let body = IiopProfile::decode(profile)?;
                self.resolver.resolve_key(body.object_key.as_bytes())
            }
        }
    }

    /// Object key of an inbound request
    ///
    /// The addressing policy only applies to GIOP 1.2, the first version in
    /// which a peer can choose a disposition.
    pub fn resolve_request(&self, request: &RequestMessage) -> ProtocolResult<ObjectKey> {
        self.resolve_versioned(request.revision(), &request.target)
    }

    pub fn resolve_locate_request(
        &self,
        request: &LocateRequestMessage,
    ) -> ProtocolResult<ObjectKey> {
        self.resolve_versioned(request.revision(), &request.target)
    }

    fn resolve_versioned(
        &self,
        revision: Revision,
        target: &TargetAddress,
    ) -> ProtocolResult<ObjectKey> {
        match (revision, target) {
            (Revision::V1_2, target) => self.resolve_target(target),
            (Revision::V1_0 | Revision::V1_1, TargetAddress::Key(key)) => {
                self.resolver.resolve_key(key.as_bytes())
            }
            (Revision::V1_0 | Revision::V1_1, other) => {
                Err(ProtocolError::AddressingDisposition {
                    expected: AddressingDisposition::KeyAddr,
                    actual: other.disposition(),
                })
            }
        }
    }
}

/// Body of a `TAG_INTERNET_IOP` profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IiopProfile {
    pub iiop_version: GiopVersion,
    pub host: String,
    pub port: u16,
    pub object_key: ObjectKey,
    /// Present from IIOP 1.1 on
    pub components: Vec<TaggedComponent>,
}

impl IiopProfile {
    pub fn decode(profile: &TaggedProfile) -> ProtocolResult<Self> {
        if profile.tag != TAG_INTERNET_IOP {
            return Err(ProtocolError::invalid_object_key(format!(
                "profile tag {} is not TAG_INTERNET_IOP",
                profile.tag
            )));
        }
        let mut r = CdrReader::for_encapsulation(&profile.profile_data)?;
        let major = r.read_octet()?;
        let minor = r.read_octet()?;
        let host = r.read_string()?;
        let port = r.read_ushort()?;
        let object_key = ObjectKey(r.read_octet_seq()?);

        let mut components = Vec::new();
        if minor >= 1 && !r.is_empty() {
            let count = r.read_ulong()?;
            for _ in 0..count {
                let tag = r.read_ulong()?;
                let component_data = r.read_octet_seq()?;
                components.push(TaggedComponent {
                    tag,
                    component_data,
                });
            }
        }

        Ok(Self {
            iiop_version: GiopVersion::new(major, minor),
            host,
            port,
            object_key,
            components,
        })
    }

    pub fn encode(&self, byte_order: ByteOrder) -> ProtocolResult<TaggedProfile> {
        let mut w = CdrWriter::for_encapsulation(byte_order);
        w.write_octet(self.iiop_version.major);
        w.write_octet(self.iiop_version.minor);
        w.write_string(&self.host)?;
        w.write_ushort(self.port);
        w.write_octet_seq(self.object_key.as_bytes())?;
        if self.iiop_version.minor >= 1 {
            w.write_ulong(self.components.len() as u32);
            for component in &self.components {
                w.write_ulong(component.tag);
                w.write_octet_seq(&component.component_data)?;
            }
        }
        Ok(TaggedProfile {
            tag: TAG_INTERNET_IOP,
            profile_data: w.into_bytes(),
        })
    }
}
