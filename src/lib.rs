//! # RSFEC - Reed-Solomon Application-Level Forward Erasure Correction
//!
//! Implementation of the framing, buffering and block-lifecycle logic of the
//! FECFRAME Reed-Solomon scheme described in RFC 6865.
//!
//! Application Data Units (ADUs) are grouped into fixed-size source blocks of
//! `k` ADUs. Each block is protected with `r` Reed-Solomon repair symbols over
//! GF(2^8). Source and repair packets are framed independently and can be
//! recovered out of order on the receiving side: any `k` of the `k + r`
//! encoding symbols of a block are enough to rebuild all of its ADUs.
//!
//! Reed-Solomon is strictly used for erasure coding, *not* for detecting or
//! correcting corrupted symbols. The underlying transport must take care of
//! discarding corrupted data.
//!
//! # RFC
//!
//!| RFC      | Title      | Link       |
//!| -------- | ---------- | -----------|
//!| RFC 6865 | Simple Reed-Solomon Forward Error Correction (FEC) Scheme for FECFRAME | <https://www.rfc-editor.org/rfc/rfc6865.html> |
//!| RFC 6363 | Forward Error Correction (FEC) Framework                               | <https://www.rfc-editor.org/rfc/rfc6363.html> |
//!
//! # Encoding
//!
//!```rust
//! use rsfec::sender::{Config, Encoder};
//!
//! // Blocks of 4 source symbols protected by 2 repair symbols
//! let config = Config {
//!     nb_source_symbols: 4,
//!     nb_repair_symbols: 2,
//! };
//! let mut encoder = Encoder::new(&config).unwrap();
//!
//! for adu in [b"hello".as_slice(), b"world".as_slice()] {
//!     encoder.push_adu(adu).unwrap();
//!     // Source packets are available immediately, repair packets once
//!     // a full block of ADUs has been collected
//!     while let Some(pkt) = encoder.read() {
//!         // send pkt.payload over the network
//!     }
//! }
//!```
//!
//! # Decoding
//!
//!```rust
//! use rsfec::receiver::{writer::AduWriterBuffer, Decoder};
//! use std::rc::Rc;
//!
//! let writer = Rc::new(AduWriterBuffer::new());
//! let mut decoder = Decoder::new(&Default::default(), writer.clone()).unwrap();
//!
//! // Push FEC source and repair packets received from the network
//! // decoder.push_source_pkt(&pkt).unwrap();
//! // decoder.push_repair_pkt(&pkt).unwrap();
//!
//! // Signal end-of-stream on both paths to drain the remaining blocks
//! decoder.close_source().unwrap();
//! decoder.close_repair().unwrap();
//!
//! for _adu in writer.adus.borrow().iter() {
//!     // ADUs are delivered in (block number, ESI) order
//! }
//!```

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(test, deny(warnings))]

mod common;
mod fec;
mod tools;

pub mod receiver;
pub mod sender;
pub use crate::tools::error;

/// Core module with low-level function
pub mod core {
    pub use crate::common::payloadid::PayloadID;
    pub use crate::common::payloadid::FEC_PAYLOAD_ID_LENGTH;
    pub use crate::common::pkt::Pkt;
}
