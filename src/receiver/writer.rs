//!
//! Deliver ADUs reassembled by the `Decoder` to their final destination
//!
//! # Example
//!
//! ```
//! use rsfec::receiver::writer::AduWriterBuffer;
//!
//! let writer = AduWriterBuffer::new();
//! ```

use std::cell::{Cell, RefCell};
use std::time::SystemTime;

use crate::tools::error::Result;

///
/// A trait for receiving the ADUs delivered by the `Decoder`
///
pub trait AduWriter {
    /// Called for every delivered ADU, in delivery order.
    ///
    /// `timestamp` is set when timestamping is enabled in the decoder
    /// configuration. Returning an error abandons the remaining deliveries
    /// of the current batch and propagates to the caller of the decoder.
    fn push_adu(&self, adu: Vec<u8>, timestamp: Option<SystemTime>) -> Result<()>;

    /// Called once, when both packet paths signaled end-of-stream and the
    /// remaining source blocks have been drained
    fn complete(&self);
}

impl std::fmt::Debug for dyn AduWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "AduWriter {{  }}")
    }
}

///
/// Writer that collects the delivered ADUs into a buffer
///
#[derive(Debug, Default)]
pub struct AduWriterBuffer {
    /// ADUs in delivery order
    pub adus: RefCell<Vec<Vec<u8>>>,
    /// true when the decoding session completed
    pub complete: Cell<bool>,
}

impl AduWriterBuffer {
    /// Return a new `AduWriterBuffer`
    pub fn new() -> AduWriterBuffer {
        Default::default()
    }
}

impl AduWriter for AduWriterBuffer {
    fn push_adu(&self, adu: Vec<u8>, _timestamp: Option<SystemTime>) -> Result<()> {
        self.adus.borrow_mut().push(adu);
        Ok(())
    }

    fn complete(&self) {
        self.complete.set(true);
    }
}
