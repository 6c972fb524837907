//! NFC Forum Type 2 tag memory: capability container and TLV blocks

use std::ops::Range;

use tracing::debug;

use crate::error::Pn532Error;

/// First byte of a Type 2 capability container formatted for NDEF
pub const CC_MAGIC: u8 = 0xE1;

const TLV_NULL: u8 = 0x00;
const TLV_NDEF: u8 = 0x03;
const TLV_TERMINATOR: u8 = 0xFE;

const FIRST_DATA_PAGE: u16 = 4;
const PAGES_PER_READ: u16 = 4;

/// Result of walking the TLV blocks read so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlvScan {
    /// Byte range of the NDEF message
    Ndef(Range<usize>),
    /// More of the data area is needed to decide
    Incomplete,
    /// A terminator came before any NDEF TLV
    Absent,
}

/// Find the first NDEF message TLV in a data area.
///
/// Lock control, memory control and proprietary TLVs are skipped.
pub fn scan_tlvs(data: &[u8]) -> TlvScan {
    let mut offset = 0;
    loop {
        let Some(&tag) = data.get(offset) else {
            return TlvScan::Incomplete;
        };
        match tag {
            TLV_NULL => {
                offset += 1;
                continue;
            }
            TLV_TERMINATOR => return TlvScan::Absent,
            _ => {}
        }

        let Some(&first) = data.get(offset + 1) else {
            return TlvScan::Incomplete;
        };
        let (length, header) = if first == 0xFF {
            match data.get(offset + 2..offset + 4) {
                Some(&[hi, lo]) => (usize::from(u16::from_be_bytes([hi, lo])), 4),
                _ => return TlvScan::Incomplete,
            }
        } else {
            (usize::from(first), 2)
        };

        let start = offset + header;
        let end = start + length;
        if tag == TLV_NDEF {
            return if end <= data.len() {
                TlvScan::Ndef(start..end)
            } else {
                TlvScan::Incomplete
            };
        }
        offset = end;
    }
}

/// Read the NDEF message of a Type 2 tag.
///
/// `read_block` performs a `READ` of four pages starting at the given page.
/// Returns `Ok(None)` for tags that are not NDEF formatted or carry no NDEF
/// TLV.
pub fn read_ndef<F>(mut read_block: F) -> Result<Option<Vec<u8>>, Pn532Error>
where
    F: FnMut(u8) -> Result<[u8; 16], Pn532Error>,
{
    let header = read_block(0)?;
    let cc = &header[12..16];
    if cc[0] != CC_MAGIC {
        debug!(magic = cc[0], "tag is not NDEF formatted");
        return Ok(None);
    }

    let area = usize::from(cc[2]) * 8;
    let mut data = Vec::with_capacity(area);
    let mut page = FIRST_DATA_PAGE;

    while data.len() < area {
        let Ok(start) = u8::try_from(page) else {
            break;
        };
        data.extend_from_slice(&read_block(start)?);
        data.truncate(area);
        page += PAGES_PER_READ;

        match scan_tlvs(&data) {
            TlvScan::Ndef(range) => return Ok(Some(data[range].to_vec())),
            TlvScan::Absent => return Ok(None),
            TlvScan::Incomplete => {}
        }
    }

    debug!(area, "no complete NDEF TLV in data area");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[0x03, 0x02, 0xAA, 0xBB, 0xFE], TlvScan::Ndef(2..4))]
    #[case(&[0x00, 0x00, 0x03, 0x01, 0xAA], TlvScan::Ndef(4..5))]
    #[case(&[0x01, 0x03, 0xA0, 0x0C, 0x34, 0x03, 0x00, 0xFE], TlvScan::Ndef(7..7))]
    #[case(&[0x03, 0xFF, 0x00, 0x02, 0xAA, 0xBB], TlvScan::Ndef(4..6))]
    #[case(&[0xFE, 0x03, 0x01, 0xAA], TlvScan::Absent)]
    #[case(&[0x03, 0x05, 0xAA], TlvScan::Incomplete)]
    #[case(&[0x03, 0xFF, 0x01], TlvScan::Incomplete)]
    #[case(&[], TlvScan::Incomplete)]
    fn test_scan_tlvs(#[case] data: &[u8], #[case] expected: TlvScan) {
        assert_eq!(scan_tlvs(data), expected);
    }

    fn tag_memory(cc_size: u8, data: &[u8]) -> Vec<u8> {
        let mut memory = vec![0u8; 16];
        memory[12..16].copy_from_slice(&[CC_MAGIC, 0x10, cc_size, 0x00]);
        memory.extend_from_slice(data);
        memory.resize(16 + usize::from(cc_size) * 8 + 16, 0);
        memory
    }

    fn reader<'a>(
        memory: &[u8],
        reads: &'a mut Vec<u8>,
    ) -> impl FnMut(u8) -> Result<[u8; 16], Pn532Error> + 'a {
        let memory = memory.to_vec();
        move |page| {
            reads.push(page);
            let start = usize::from(page) * 4;
            let mut block = [0u8; 16];
            for (i, slot) in block.iter_mut().enumerate() {
                *slot = memory.get(start + i).copied().unwrap_or_default();
            }
            Ok(block)
        }
    }

    #[test]
    fn test_reads_only_blocks_needed() {
        let mut message = vec![0x03, 20];
        message.extend(std::iter::repeat(0x42).take(20));
        message.push(TLV_TERMINATOR);
        let memory = tag_memory(0x12, &message);

        let mut reads = Vec::new();
        let ndef = read_ndef(reader(&memory, &mut reads)).unwrap();

        assert_eq!(ndef, Some(vec![0x42; 20]));
        assert_eq!(reads, vec![0, 4, 8]);
    }

    #[test]
    fn test_unformatted_tag() {
        let memory = vec![0u8; 64];
        let mut reads = Vec::new();
        assert_eq!(read_ndef(reader(&memory, &mut reads)).unwrap(), None);
        assert_eq!(reads, vec![0]);
    }

    #[test]
    fn test_empty_tag() {
        let memory = tag_memory(0x06, &[0x03, 0x00, TLV_TERMINATOR]);
        let mut reads = Vec::new();
        assert_eq!(read_ndef(reader(&memory, &mut reads)).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_message_larger_than_data_area() {
        let memory = tag_memory(0x02, &[0x03, 0x30, 0x01]);
        let mut reads = Vec::new();
        assert_eq!(read_ndef(reader(&memory, &mut reads)).unwrap(), None);
        assert_eq!(reads, vec![0, 4]);
    }

    #[test]
    fn test_read_error_propagates() {
        let result = read_ndef(|page| {
            if page == 0 {
                let mut block = [0u8; 16];
                block[12..16].copy_from_slice(&[CC_MAGIC, 0x10, 0x12, 0x00]);
                Ok(block)
            } else {
                Err(Pn532Error::TagStatus(0x01))
            }
        });
        assert_eq!(result, Err(Pn532Error::TagStatus(0x01)));
    }

    proptest! {
        #[test]
        fn prop_scan_never_panics(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            if let TlvScan::Ndef(range) = scan_tlvs(&data) {
                prop_assert!(range.end <= data.len());
            }
        }
    }
}
