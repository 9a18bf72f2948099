use serde::Serialize;

use crate::tools::error::{Result, RsFecError};

/// Size of the FEC Payload ID attached to every FEC packet
pub const FEC_PAYLOAD_ID_LENGTH: usize = 6;

/// FEC Payload ID of the Reed-Solomon scheme (RFC 6865 section 5.1)
///
/// The same 6-byte layout is used for FEC source packets and FEC repair
/// packets, only the position differs: source packets carry the payload ID
/// as a suffix, repair packets as a prefix.
///
///```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|      Source Block Number (24 bits)            | Enc. Symb. ID |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|    Source Block Length (16 bits)              |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///```
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PayloadID {
    /// Source Block Number (SBN), wraps around the 24-bit space
    pub sbn: u32,
    /// Encoding Symbol ID, `0..k` for source symbols, `k..n` for repair symbols
    pub esi: u8,
    /// Number of source symbols (k) of the block
    pub source_block_length: u16,
}

impl PayloadID {
    /// Return a new `PayloadID`, the SBN is masked to its 24-bit range
    pub fn new(sbn: u32, esi: u8, source_block_length: u16) -> PayloadID {
        PayloadID {
            sbn: sbn & 0xFFFFFF,
            esi,
            source_block_length,
        }
    }

    /// Serialize to the 6-byte wire representation, all fields big-endian
    pub fn to_bytes(self) -> [u8; FEC_PAYLOAD_ID_LENGTH] {
        [
            ((self.sbn >> 16) & 0xFF) as u8,
            ((self.sbn >> 8) & 0xFF) as u8,
            (self.sbn & 0xFF) as u8,
            self.esi,
            ((self.source_block_length >> 8) & 0xFF) as u8,
            (self.source_block_length & 0xFF) as u8,
        ]
    }

    fn read(bytes: &[u8]) -> PayloadID {
        let sbn = ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | (bytes[2] as u32);
        let esi = bytes[3];
        let source_block_length = ((bytes[4] as u16) << 8) | (bytes[5] as u16);
        PayloadID {
            sbn,
            esi,
            source_block_length,
        }
    }

    /// Decode the payload ID of a FEC source packet (last 6 bytes)
    pub fn from_source_pkt(pkt: &[u8]) -> Result<PayloadID> {
        if pkt.len() < FEC_PAYLOAD_ID_LENGTH {
            return Err(RsFecError::new(format!(
                "FEC source packet too short ({} bytes)",
                pkt.len()
            )));
        }
        Ok(PayloadID::read(&pkt[pkt.len() - FEC_PAYLOAD_ID_LENGTH..]))
    }

    /// Decode the payload ID of a FEC repair packet (first 6 bytes)
    pub fn from_repair_pkt(pkt: &[u8]) -> Result<PayloadID> {
        if pkt.len() < FEC_PAYLOAD_ID_LENGTH {
            return Err(RsFecError::new(format!(
                "FEC repair packet too short ({} bytes)",
                pkt.len()
            )));
        }
        Ok(PayloadID::read(&pkt[..FEC_PAYLOAD_ID_LENGTH]))
    }
}

#[cfg(test)]
mod tests {
    use super::PayloadID;

    #[test]
    pub fn test_payload_id_source_pkt() {
        crate::tests::init();
        let id = PayloadID::new(0x123456, 3, 4);
        let mut pkt = vec![0xAAu8; 10];
        pkt.extend(id.to_bytes());
        let decoded = PayloadID::from_source_pkt(&pkt).unwrap();
        assert_eq!(id, decoded);
    }

    #[test]
    pub fn test_payload_id_repair_pkt() {
        crate::tests::init();
        let id = PayloadID::new(42, 5, 4);
        let mut pkt = id.to_bytes().to_vec();
        pkt.extend(vec![0xBBu8; 10]);
        let decoded = PayloadID::from_repair_pkt(&pkt).unwrap();
        assert_eq!(id, decoded);
    }

    #[test]
    pub fn test_payload_id_layout_is_big_endian() {
        crate::tests::init();
        let bytes = PayloadID::new(0x010203, 0x04, 0x0506).to_bytes();
        assert_eq!(bytes, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    }

    #[test]
    pub fn test_payload_id_sbn_masked_to_24_bits() {
        crate::tests::init();
        let id = PayloadID::new(0xFF123456, 0, 1);
        assert_eq!(id.sbn, 0x123456);
    }

    #[test]
    pub fn test_payload_id_too_short() {
        crate::tests::init();
        assert!(PayloadID::from_source_pkt(&[0u8; 5]).is_err());
        assert!(PayloadID::from_repair_pkt(&[0u8; 5]).is_err());
    }
}
