//!
//! Reassemble and recover ADUs from received FEC source and repair packets
//!
//! # Example
//!
//! ```
//! use rsfec::receiver::{writer::AduWriterBuffer, Decoder};
//! use std::rc::Rc;
//!
//! let writer = Rc::new(AduWriterBuffer::new());
//! let mut decoder = Decoder::new(&Default::default(), writer.clone()).unwrap();
//! ```

mod aging;
mod decoder;
mod sourceblock;
pub mod writer;

pub use decoder::Config;
pub use decoder::Decoder;
