//! Reply and locate-reply status codes

use crate::protocol::version::GiopVersion;
use num_enum::TryFromPrimitive;
use std::fmt;

/// Reply status (GIOP `ReplyStatusType`, a ulong on the wire)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReplyStatus {
    NoException = 0,
    UserException = 1,
    SystemException = 2,
    LocationForward = 3,
    /// GIOP 1.2 and later
    LocationForwardPerm = 4,
    /// GIOP 1.2 and later
    NeedsAddressingMode = 5,
}

impl ReplyStatus {
    /// Whether the status value exists in the given protocol version
    pub fn is_defined_for(self, version: GiopVersion) -> bool {
        match self {
            ReplyStatus::NoException
            | ReplyStatus::UserException
            | ReplyStatus::SystemException
            | ReplyStatus::LocationForward => true,
            ReplyStatus::LocationForwardPerm | ReplyStatus::NeedsAddressingMode => {
                version >= GiopVersion::V1_2
            }
        }
    }
}

impl fmt::Display for ReplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReplyStatus::NoException => "NO_EXCEPTION",
            ReplyStatus::UserException => "USER_EXCEPTION",
            ReplyStatus::SystemException => "SYSTEM_EXCEPTION",
            ReplyStatus::LocationForward => "LOCATION_FORWARD",
            ReplyStatus::LocationForwardPerm => "LOCATION_FORWARD_PERM",
            ReplyStatus::NeedsAddressingMode => "NEEDS_ADDRESSING_MODE",
        };
        f.write_str(name)
    }
}

/// Locate status (GIOP `LocateStatusType`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LocateStatus {
    UnknownObject = 0,
    ObjectHere = 1,
    ObjectForward = 2,
    ObjectForwardPerm = 3,
    LocSystemException = 4,
    LocNeedsAddressingMode = 5,
}

impl LocateStatus {
    pub fn is_defined_for(self, version: GiopVersion) -> bool {
        match self {
            LocateStatus::UnknownObject | LocateStatus::ObjectHere | LocateStatus::ObjectForward => {
                true
            }
            LocateStatus::ObjectForwardPerm
            | LocateStatus::LocSystemException
            | LocateStatus::LocNeedsAddressingMode => version >= GiopVersion::V1_2,
        }
    }
}

impl fmt::Display for LocateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LocateStatus::UnknownObject => "UNKNOWN_OBJECT",
            LocateStatus::ObjectHere => "OBJECT_HERE",
            LocateStatus::ObjectForward => "OBJECT_FORWARD",
            LocateStatus::ObjectForwardPerm => "OBJECT_FORWARD_PERM",
            LocateStatus::LocSystemException => "LOC_SYSTEM_EXCEPTION",
            LocateStatus::LocNeedsAddressingMode => "LOC_NEEDS_ADDRESSING_MODE",
        };
        f.write_str(name)
    }
}

/// Completion status of a system exception
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompletionStatus {
    Yes = 0,
    No = 1,
    Maybe = 2,
}

/// System exception carried in a Reply or 1.2 LocateReply body
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SystemExceptionInfo {
    /// Repository id such as `IDL:omg.org/CORBA/OBJECT_NOT_EXIST:1.0`
    pub exception_id: String,
    pub minor_code: u32,
    pub completion_status: CompletionStatus,
}

impl SystemExceptionInfo {
    pub fn new(
        exception_id: impl Into<String>,
        minor_code: u32,
        completion_status: CompletionStatus,
    ) -> Self {
        Self {
            exception_id: exception_id.into(),
            minor_code,
            completion_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_status_version_gating() {
        assert!(ReplyStatus::LocationForward.is_defined_for(GiopVersion::V1_0));
        assert!(!ReplyStatus::LocationForwardPerm.is_defined_for(GiopVersion::V1_1));
        assert!(ReplyStatus::NeedsAddressingMode.is_defined_for(GiopVersion::V1_2));
        assert!(ReplyStatus::try_from(6u32).is_err());
    }

    #[test]
    fn test_locate_status_version_gating() {
        assert!(LocateStatus::ObjectHere.is_defined_for(GiopVersion::V1_0));
        assert!(!LocateStatus::LocSystemException.is_defined_for(GiopVersion::V1_1));
        assert!(LocateStatus::ObjectForwardPerm.is_defined_for(GiopVersion::V1_2));
    }
}
