//! Actor Message Definitions
//!
//! ```text
//! transport --Inbound--> ConnectionActor --ServerMessage--> transport
//!                             ^
//! RootShared --Flush(root)----+
//! ```

use crate::component::InstanceId;

/// Messages to a ConnectionActor
#[derive(Debug)]
pub enum ConnMsg {
    /// Raw text frame from the client
    Inbound(String),
    /// State updates were queued on a bound root
    Flush(InstanceId),
    /// Transport closed (or the handle was dropped)
    Close,
}
