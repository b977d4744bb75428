//! Binary codec for the ledger header counter.

use byteorder::{BigEndian, ByteOrder};

/// Width in bytes of an encoded counter.
pub const COUNTER_SIZE: usize = 8;

/// Encodes a counter into its on-disk representation.
pub fn encode_counter(value: u64) -> [u8; COUNTER_SIZE] {
    let mut buf = [0u8; COUNTER_SIZE];
    BigEndian::write_u64(&mut buf, value);
    buf
}

/// Decodes a counter from its on-disk representation.
pub fn decode_counter(buf: &[u8; COUNTER_SIZE]) -> u64 {
    BigEndian::read_u64(buf)
}
