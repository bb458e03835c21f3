//! Service contexts attached to requests and replies

/// `IOP::ServiceContext`; the framing layer carries the data opaquely
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceContext {
    pub context_id: u32,
    pub context_data: Vec<u8>,
}

impl ServiceContext {
    pub fn new(context_id: u32, context_data: impl Into<Vec<u8>>) -> Self {
        Self {
            context_id,
            context_data: context_data.into(),
        }
    }
}
