//! Visitor over decoded messages
//!
//! The layer above framing implements [`MessageHandler`] and calls
//! [`crate::Message::dispatch`]; each kind arrives at its own method with
//! its concrete type, so no consumer inspects the message type by hand.

use crate::messages::{
    CancelRequestMessage, ControlMessage, FragmentMessage, LocateReplyMessage,
    LocateRequestMessage, ReplyMessage, RequestMessage,
};

pub trait MessageHandler {
    type Output;

    fn handle_request(&mut self, message: &RequestMessage) -> Self::Output;

    fn handle_reply(&mut self, message: &ReplyMessage) -> Self::Output;

    fn handle_cancel_request(&mut self, message: &CancelRequestMessage) -> Self::Output;

    fn handle_locate_request(&mut self, message: &LocateRequestMessage) -> Self::Output;

    fn handle_locate_reply(&mut self, message: &LocateReplyMessage) -> Self::Output;

    fn handle_close_connection(&mut self, message: &ControlMessage) -> Self::Output;

    fn handle_message_error(&mut self, message: &ControlMessage) -> Self::Output;

    fn handle_fragment(&mut self, message: &FragmentMessage) -> Self::Output;
}
