//! Unit tests for parsing specific structures.

mod common;

use common::*;
use creg_parser::*;
use proptest::prelude::*;

#[test]
fn test_file_header_constants() {
    assert_eq!(header::FILE_HEADER_SIZE, 32);
    assert_eq!(header::CREG_SIGNATURE, b"CREG");
}

#[test]
fn test_navigation_constants() {
    assert_eq!(hierarchy::KEY_NAVIGATION_HEADER_SIZE, 32);
    assert_eq!(hierarchy::RGKN_SIGNATURE, b"RGKN");
    assert_eq!(hierarchy::KEY_HIERARCHY_ENTRY_SIZE, 28);
}

#[test]
fn test_data_block_constants() {
    assert_eq!(data_block::DATA_BLOCK_HEADER_SIZE, 32);
    assert_eq!(data_block::RGDB_SIGNATURE, b"RGDB");
    assert_eq!(key_name_entry::KEY_NAME_ENTRY_HEADER_SIZE, 20);
    assert_eq!(key_name_entry::KEY_NAME_ENTRY_TERMINATOR, 0xFFFF);
    assert_eq!(value_entry::VALUE_ENTRY_HEADER_SIZE, 12);
}

#[test]
fn test_cache_bounds() {
    assert_eq!(MAX_CACHE_ENTRIES_KEYS, 128);
    assert_eq!(MAX_CACHE_ENTRIES_DATA_BLOCKS, 16);
    assert_eq!(MAX_SUB_KEY_RECURSION_DEPTH, 512);
}

#[test]
fn test_file_header_from_image() {
    let image = minimal_hive();
    let parsed = FileHeader::parse(&image).unwrap();

    assert_eq!(parsed.major_version, 1);
    assert_eq!(parsed.minor_version, 0);
    assert_eq!(parsed.navigation_offset, 0x20);
    assert_eq!(parsed.data_block_count, 0);
}

#[test]
fn test_hierarchy_entry_from_image() {
    let record = hierarchy_record(hash_of("Software"), 0, NONE, NONE, 1, 0);
    let parsed = KeyHierarchyEntry::parse(&record, 0x1C).unwrap();

    assert_eq!(parsed.name_hash, hash_of("Software"));
    assert_eq!(parsed.parent_offset, 0);
    assert_eq!(parsed.first_child_offset, NONE);
    assert_eq!(parsed.key_name_entry_index, 1);
    assert!(parsed.has_key_name_entry());
}

#[test]
fn test_root_record_has_no_name_entry() {
    let record = hierarchy_record(0, NONE, NONE, NONE, 0, NO_BLOCK);
    let parsed = KeyHierarchyEntry::parse(&record, 0).unwrap();
    assert!(!parsed.has_key_name_entry());
}

#[test]
fn test_data_block_from_image() {
    let entry = key_name_entry(1, b"Software", &[value_entry(1, b"Name", b"data\0")]);
    let block_bytes = data_block(0, &[entry]);

    let header = DataBlockHeader::parse(&block_bytes, 0).unwrap().unwrap();
    assert_eq!(header.size as usize, block_bytes.len());
    assert_eq!(header.index, 0);

    let block = DataBlock::parse_entries(header, &block_bytes[32..]).unwrap();
    assert_eq!(block.entry_count(), 1);

    let entry = block.entry_by_identifier(1).unwrap();
    assert_eq!(entry.name_bytes(), b"Software");
    assert_eq!(entry.value_count(), 1);
}

#[test]
fn test_value_type_numbers() {
    assert_eq!(ValueType::from_u32(0), ValueType::None);
    assert_eq!(ValueType::from_u32(1), ValueType::String);
    assert_eq!(ValueType::from_u32(2), ValueType::ExpandString);
    assert_eq!(ValueType::from_u32(3), ValueType::Binary);
    assert_eq!(ValueType::from_u32(4), ValueType::Dword);
    assert_eq!(ValueType::from_u32(5), ValueType::DwordBigEndian);
    assert_eq!(ValueType::from_u32(6), ValueType::Link);
    assert_eq!(ValueType::from_u32(7), ValueType::MultiString);
    assert_eq!(ValueType::from_u32(11), ValueType::Qword);
    assert!(matches!(ValueType::from_u32(999), ValueType::Unknown(999)));
}

#[test]
fn test_value_type_names() {
    assert_eq!(ValueType::None.name(), "REG_NONE");
    assert_eq!(ValueType::String.name(), "REG_SZ");
    assert_eq!(ValueType::ExpandString.name(), "REG_EXPAND_SZ");
    assert_eq!(ValueType::Binary.name(), "REG_BINARY");
    assert_eq!(ValueType::Dword.name(), "REG_DWORD");
    assert_eq!(ValueType::DwordBigEndian.name(), "REG_DWORD_BIG_ENDIAN");
    assert_eq!(ValueType::Link.name(), "REG_LINK");
    assert_eq!(ValueType::MultiString.name(), "REG_MULTI_SZ");
    assert_eq!(ValueType::Qword.name(), "REG_QWORD");
}

#[test]
fn test_codepage_option_strings() {
    for (literal, number) in [
        ("ascii", 20127),
        ("windows-874", 874),
        ("windows-932", 932),
        ("windows-936", 936),
        ("windows-949", 949),
        ("windows-950", 950),
        ("windows-1250", 1250),
        ("windows-1251", 1251),
        ("windows-1252", 1252),
        ("windows-1253", 1253),
        ("windows-1254", 1254),
        ("windows-1255", 1255),
        ("windows-1256", 1256),
        ("windows-1257", 1257),
        ("windows-1258", 1258),
    ] {
        let codepage = Codepage::from_option_string(literal).unwrap();
        assert_eq!(codepage.number(), number);
    }

    assert!(Codepage::from_option_string("utf-8").is_none());
    assert!(Codepage::from_option_string("windows-1259").is_none());
}

proptest! {
    // If two names hash differently, they differ case-insensitively.
    #[test]
    fn prop_name_hash_law(a in "\\PC{0,24}", b in "\\PC{0,24}") {
        let hash_a = utils::name_hash(a.chars());
        let hash_b = utils::name_hash(b.chars());

        if hash_a != hash_b {
            prop_assert!(!utils::names_equal(a.chars(), b.chars()));
        }
    }

    // Hashing ignores case the same way comparison does.
    #[test]
    fn prop_name_hash_case_insensitive(name in "[a-zA-Z0-9 ]{0,24}") {
        let upper: String = name.to_uppercase();
        let lower: String = name.to_lowercase();

        prop_assert_eq!(
            utils::name_hash(upper.chars()),
            utils::name_hash(lower.chars())
        );
        prop_assert!(utils::names_equal(upper.chars(), lower.chars()));
    }

    // A value entry survives a build/parse round trip.
    #[test]
    fn prop_value_entry_round_trip(
        value_type in 0u32..16,
        name in proptest::collection::vec(0x20u8..0x7F, 0..16),
        data in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let bytes = value_entry(value_type, &name, &data);
        let parsed = ValueEntry::parse(&bytes, 0).unwrap();

        prop_assert_eq!(parsed.value_type.to_u32(), value_type);
        prop_assert_eq!(parsed.name_bytes(), &name[..]);
        prop_assert_eq!(parsed.data_bytes(), &data[..]);
        prop_assert_eq!(parsed.size(), bytes.len());
    }
}
