use super::command::Command;
use crate::server::chancomms::ControlChanMsg;

// An event for the control loop to act upon: either a command from the
// client or a message from one of our own tasks.
#[derive(Debug)]
pub enum Event {
    // A command from a client (e.g. `LIST /tmp`)
    Command(Command),
    // An internal message, e.g. reporting the result of a transfer
    InternalMsg(ControlChanMsg),
}
