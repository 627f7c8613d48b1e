use aql_warc::{WarcRecord, WarcRecordType, decode_member, encode_member, read_members};

fn exchange() -> Vec<WarcRecord> {
    let info = WarcRecord::warcinfo(
        "0f1e.warc.gz",
        &[
            ("software".to_string(), "aql".to_string()),
            ("format".to_string(), "WARC File Format 1.1".to_string()),
        ],
    );
    let request = WarcRecord::request(
        "https://example.com/",
        "GET / HTTP/1.1\r\nHost: example.com\r\n\r\n",
    );
    let response = WarcRecord::response(
        "https://example.com/",
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<html></html>",
    )
    .with_header("WARC-Concurrent-To", request.record_id().unwrap_or_default());
    vec![info, request, response]
}

#[test]
fn container_reads_back_whole_and_by_range() {
    let records = exchange();
    let mut container = Vec::new();
    let mut ranges = Vec::new();
    for record in &records {
        let member = encode_member(record).unwrap();
        ranges.push(container.len()..container.len() + member.len());
        container.extend_from_slice(&member);
    }

    let all = read_members(std::io::Cursor::new(&container)).unwrap();
    assert_eq!(all, records);
    assert_eq!(all[0].record_type(), Some(WarcRecordType::Warcinfo));

    let response = decode_member(&container[ranges[2].clone()]).unwrap();
    assert_eq!(response.header("WARC-Concurrent-To"), records[1].record_id());
    assert!(response.block().ends_with(b"<html></html>"));
}

#[test]
fn binary_blocks_survive_unchanged() {
    let block: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
    let record = WarcRecord::new(WarcRecordType::Resource, block.clone());

    let decoded = decode_member(&encode_member(&record).unwrap()).unwrap();

    assert_eq!(decoded.block().as_ref(), block.as_slice());
    assert_eq!(decoded.content_length(), block.len());
}
