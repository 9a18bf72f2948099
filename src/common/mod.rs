pub mod adui;
pub mod payloadid;
pub mod pkt;
