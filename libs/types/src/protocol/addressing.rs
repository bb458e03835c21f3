//! Object addressing: object keys, profiles, IORs and GIOP 1.2 target addresses
//!
//! These are opaque carriers for the framing layer. Interpreting profile
//! bodies or resolving keys to servants belongs to the object reference
//! machinery above it.

use num_enum::TryFromPrimitive;
use std::fmt;

/// Discriminator of a GIOP 1.2 `TargetAddress` (a short on the wire)
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AddressingDisposition {
    KeyAddr = 0,
    ProfileAddr = 1,
    ReferenceAddr = 2,
}

impl fmt::Display for AddressingDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressingDisposition::KeyAddr => "KeyAddr",
            AddressingDisposition::ProfileAddr => "ProfileAddr",
            AddressingDisposition::ReferenceAddr => "ReferenceAddr",
        };
        f.write_str(name)
    }
}

/// Raw object key bytes
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ObjectKey(pub Vec<u8>);

impl ObjectKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({})", hex::encode(&self.0))
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl From<&[u8]> for ObjectKey {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

/// Tagged profile: `{ ulong tag; sequence<octet> profile_data }`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TaggedProfile {
    pub tag: u32,
    pub profile_data: Vec<u8>,
}

/// Tagged component found inside an IIOP 1.1+ profile
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaggedComponent {
    pub tag: u32,
    /// Encapsulated component body (leading byte order octet included)
    pub component_data: Vec<u8>,
}

/// Interoperable object reference as it travels in location forwards
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Ior {
    pub type_id: String,
    pub profiles: Vec<TaggedProfile>,
}

/// `IORAddressingInfo`: a full reference plus the profile the client used
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IorAddressingInfo {
    pub selected_profile_index: u32,
    pub ior: Ior,
}

/// GIOP 1.2 target address union
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetAddress {
    Key(ObjectKey),
    Profile(TaggedProfile),
    Reference(IorAddressingInfo),
}

impl TargetAddress {
    pub fn disposition(&self) -> AddressingDisposition {
        match self {
            TargetAddress::Key(_) => AddressingDisposition::KeyAddr,
            TargetAddress::Profile(_) => AddressingDisposition::ProfileAddr,
            TargetAddress::Reference(_) => AddressingDisposition::ReferenceAddr,
        }
    }
}

/// Everything a client knows about the object it is invoking
///
/// The object reference layer fills this in from the IOR it resolved;
/// the framing layer only needs the key, the chosen profile, its tagged
/// components and the addressing disposition negotiated with the server.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InvocationTarget {
    pub object_key: ObjectKey,
    pub profile: TaggedProfile,
    pub components: Vec<TaggedComponent>,
    pub ior: Ior,
    pub selected_profile_index: u32,
    pub addressing: Option<AddressingDisposition>,
}

impl InvocationTarget {
    /// Target addressed by object key only
    pub fn from_key(object_key: ObjectKey) -> Self {
        Self {
            object_key,
            ..Self::default()
        }
    }

    pub fn with_component(mut self, component: TaggedComponent) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_addressing(mut self, disposition: AddressingDisposition) -> Self {
        self.addressing = Some(disposition);
        self
    }

    /// First component carrying `tag`
    pub fn component(&self, tag: u32) -> Option<&TaggedComponent> {
        self.components.iter().find(|c| c.tag == tag)
    }

    /// GIOP 1.2 target address for the negotiated disposition (KeyAddr when
    /// nothing was negotiated)
    pub fn target_address(&self) -> TargetAddress {
        match self.addressing.unwrap_or(AddressingDisposition::KeyAddr) {
            AddressingDisposition::KeyAddr => TargetAddress::Key(self.object_key.clone()),
            AddressingDisposition::ProfileAddr => TargetAddress::Profile(self.profile.clone()),
            AddressingDisposition::ReferenceAddr => TargetAddress::Reference(IorAddressingInfo {
                selected_profile_index: self.selected_profile_index,
                ior: self.ior.clone(),
            }),
        }
    }
}
