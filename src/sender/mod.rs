//!
//! Group ADUs into source blocks and emit framed FEC source and repair packets
//!
//! # Example
//!
//! ```
//! use rsfec::sender::Encoder;
//!
//! let mut encoder = Encoder::new(&Default::default()).unwrap();
//! encoder.push_adu(b"hello").unwrap();
//! let pkt = encoder.read().unwrap();
//! assert!(pkt.is_source_packet);
//! ```

mod encoder;

pub use crate::common::pkt::Pkt;
pub use encoder::Config;
pub use encoder::Encoder;
