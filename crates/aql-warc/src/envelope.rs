use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::{GzDecoder, MultiGzDecoder};
use flate2::write::GzEncoder;

use crate::record::WarcRecord;
use crate::{Error, Result};

pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Compress one record into its own gzip member.
///
/// Members can be concatenated into a valid `.warc.gz` stream while each one
/// stays decodable on its own from its byte offset.
pub fn encode_member(record: &WarcRecord) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&record.to_bytes())?;
    Ok(encoder.finish()?)
}

/// Decode exactly one gzip member back into a record.
pub fn decode_member(member: &[u8]) -> Result<WarcRecord> {
    if !member.starts_with(&GZIP_MAGIC) {
        return Err(Error::NotGzip);
    }
    let mut decoded = Vec::new();
    GzDecoder::new(member).read_to_end(&mut decoded)?;
    let (record, _) = WarcRecord::parse(&decoded)?;
    Ok(record)
}

/// Read every record of a concatenated-member stream, in order.
pub fn read_members<R: Read>(reader: R) -> Result<Vec<WarcRecord>> {
    let mut decoded = Vec::new();
    MultiGzDecoder::new(reader).read_to_end(&mut decoded)?;

    let mut records = Vec::new();
    let mut pos = 0;
    while pos < decoded.len() {
        let (record, used) = WarcRecord::parse(&decoded[pos..])?;
        records.push(record);
        pos += used;
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WarcRecordType;

    #[test]
    fn member_decodes_on_its_own() {
        let record = WarcRecord::new(WarcRecordType::Resource, vec![7u8; 4096]);
        let member = encode_member(&record).unwrap();

        assert!(member.starts_with(&GZIP_MAGIC));
        assert_eq!(decode_member(&member).unwrap(), record);
    }

    #[test]
    fn members_decode_from_their_offsets() {
        let records: Vec<_> = (0..3)
            .map(|i| WarcRecord::new(WarcRecordType::Resource, format!("record {i}")))
            .collect();

        let mut stream = Vec::new();
        let mut ranges = Vec::new();
        for record in &records {
            let member = encode_member(record).unwrap();
            ranges.push((stream.len(), member.len()));
            stream.extend(member);
        }

        for (record, (offset, length)) in records.iter().zip(&ranges).rev() {
            let decoded = decode_member(&stream[*offset..offset + length]).unwrap();
            assert_eq!(&decoded, record);
        }
        assert_eq!(read_members(stream.as_slice()).unwrap(), records);
    }

    #[test]
    fn rejects_offset_inside_member() {
        let member = encode_member(&WarcRecord::new(WarcRecordType::Resource, "abc")).unwrap();
        assert!(matches!(decode_member(&member[1..]), Err(Error::NotGzip)));
    }
}
