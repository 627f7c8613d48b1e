//! Pure container bookkeeping: naming, admission and the warcinfo header.

use aql_warc::WarcRecord;

use crate::data::StoreOptions;

pub const CONTAINER_SUFFIX: &str = ".warc.gz";

pub const SOFTWARE: &str = concat!("aql/", env!("CARGO_PKG_VERSION"));

pub const WARC_FORMAT: &str = "WARC File Format 1.1";

/// Keys are generated by the store; anything else is never a container.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

pub fn container_file_name(key: &str) -> String { format!("{key}{CONTAINER_SUFFIX}") }

/// Key of a finalized container file, `None` for staging or foreign files.
pub fn key_from_file_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(CONTAINER_SUFFIX)
        .filter(|key| is_valid_key(key))
}

/// Whether a member of `unit` bytes still fits a container currently
/// `size` bytes long and holding `records` data records.
pub fn fits(size: u64, unit: u64, records: usize, options: &StoreOptions) -> bool {
    size.saturating_add(unit) <= options.max_container_size
        && options
            .max_records_per_container
            .is_none_or(|max| records < max)
}

/// The leading `warcinfo` record of container `key`.
pub fn warcinfo_record(key: &str, options: &StoreOptions) -> WarcRecord {
    let mut fields = vec![
        ("software".to_string(), SOFTWARE.to_string()),
        ("format".to_string(), WARC_FORMAT.to_string()),
        ("max-size".to_string(), options.max_container_size.to_string()),
    ];
    fields.extend(
        options
            .warcinfo
            .iter()
            .map(|(name, value)| (name.clone(), value.clone())),
    );
    WarcRecord::warcinfo(&container_file_name(key), &fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_round_trip() {
        let key = "6f1c0d1e-8a7b-4c3d-9e2f-0a1b2c3d4e5f";
        assert_eq!(key_from_file_name(&container_file_name(key)), Some(key));
    }

    #[test]
    fn staging_and_foreign_names_are_not_containers() {
        assert_eq!(key_from_file_name(".abc.warc.gz.tmp"), None);
        assert_eq!(key_from_file_name(".abc.warc.gz"), None);
        assert_eq!(key_from_file_name("notes.txt"), None);
        assert_eq!(key_from_file_name(".warc.gz"), None);
    }

    #[test]
    fn keys_cannot_escape_the_store() {
        assert!(is_valid_key("abc-123_x"));
        assert!(!is_valid_key("../abc"));
        assert!(!is_valid_key("a/b"));
        assert!(!is_valid_key(""));
    }

    #[test]
    fn admission_respects_both_bounds() {
        let options = StoreOptions::default()
            .max_container_size(100)
            .max_records_per_container(2);

        assert!(fits(40, 60, 0, &options));
        assert!(!fits(41, 60, 0, &options));
        assert!(fits(10, 10, 1, &options));
        assert!(!fits(10, 10, 2, &options));
    }

    #[test]
    fn warcinfo_lists_format_and_extras() {
        let options = StoreOptions::default()
            .max_container_size(4096)
            .warcinfo_field("operator", "archive team");
        let record = warcinfo_record("abc", &options);
        let block = String::from_utf8_lossy(record.block());

        assert_eq!(record.header("WARC-Filename"), Some("abc.warc.gz"));
        assert!(block.contains("format: WARC File Format 1.1\r\n"));
        assert!(block.contains("max-size: 4096\r\n"));
        assert!(block.contains("operator: archive team\r\n"));
        assert!(block.starts_with("software: aql/"));
    }
}
