//! TFRecord framing:
//!
//! ```text
//! u64 length | u32 masked_crc32c(length) | data | u32 masked_crc32c(data)
//! ```
//!
//! All integers little-endian.

const MASK_DELTA: u32 = 0xa282_ead8;

/// CRC32C with TensorFlow's rotation and offset applied.
pub fn masked_crc32c(data: &[u8]) -> u32 {
    let crc = crc32c::crc32c(data);
    ((crc >> 15) | (crc << 17)).wrapping_add(MASK_DELTA)
}

/// Frames one record payload.
pub fn encode_record(data: &[u8]) -> Vec<u8> {
    let len = (data.len() as u64).to_le_bytes();

    let mut out = Vec::with_capacity(data.len() + 16);
    out.extend_from_slice(&len);
    out.extend_from_slice(&masked_crc32c(&len).to_le_bytes());
    out.extend_from_slice(data);
    out.extend_from_slice(&masked_crc32c(data).to_le_bytes());
    out
}

/// Splits a buffer of framed records back into payloads, checking both CRCs.
/// Returns `None` on truncation or checksum mismatch.
pub fn decode_records(mut buf: &[u8]) -> Option<Vec<Vec<u8>>> {
    let mut records = Vec::new();

    while !buf.is_empty() {
        let header = buf.get(..12)?;
        let (len_bytes, len_crc) = header.split_at(8);
        if masked_crc32c(len_bytes) != u32::from_le_bytes(len_crc.try_into().ok()?) {
            return None;
        }
        let len = usize::try_from(u64::from_le_bytes(len_bytes.try_into().ok()?)).ok()?;
        let data_end = 12usize.checked_add(len)?;
        let record_end = data_end.checked_add(4)?;

        let data = buf.get(12..data_end)?;
        let data_crc = buf.get(data_end..record_end)?;
        if masked_crc32c(data) != u32::from_le_bytes(data_crc.try_into().ok()?) {
            return None;
        }

        records.push(data.to_vec());
        buf = &buf[record_end..];
    }

    Some(records)
}
