//! Tests for record payloads
//!
//! These tests verify:
//! - Declared encoded widths
//! - Encode/decode of PCR tests and persons
//! - Fixed-width string fields (length prefix, NUL padding, truncation)
//! - Identity-key equality and key hashes

use linhashdb::record::fixed::{fixed_string_size, get_fixed_string, put_fixed_string};
use linhashdb::record::{Hashable, PcrTest, Person, Record};
use linhashdb::LinHashError;

// =============================================================================
// Helper Functions
// =============================================================================

fn sample_test() -> PcrTest {
    PcrTest::new(1_612_137_600_000, "a1b2c3d4e5", 4711, true, 27.25, "retest")
}

fn sample_person() -> Person {
    let mut person = Person::new("Ada", "Lovelace", -4_958_323_200_000, "p-0001");
    person.add_test(4711);
    person.add_test(4712);
    person
}

// =============================================================================
// Width Tests
// =============================================================================

#[test]
fn test_declared_sizes() {
    assert_eq!(PcrTest::SIZE, 71);
    assert_eq!(Person::SIZE, 126);
    assert_eq!(fixed_string_size(10), 24);
}

#[test]
fn test_encoded_width_independent_of_contents() {
    let short = PcrTest::new(0, "", 1, false, 0.0, "");
    let long = PcrTest::new(0, "0123456789abc", 2, true, 0.0, "a much longer note");

    assert_eq!(short.to_bytes().unwrap().len(), PcrTest::SIZE);
    assert_eq!(long.to_bytes().unwrap().len(), PcrTest::SIZE);
}

// =============================================================================
// PCR Test Tests
// =============================================================================

#[test]
fn test_pcr_decode_restores_fields() {
    let test = sample_test();
    let decoded = PcrTest::decode(&test.to_bytes().unwrap()).unwrap();

    assert_eq!(decoded, test);
    assert!(decoded.is_equal(&test));
}

#[test]
fn test_pcr_field_layout() {
    let test = PcrTest::new(1, "ab", 0x0102_0304, true, 0.0, "");
    let bytes = test.to_bytes().unwrap();

    // date_millis
    assert_eq!(&bytes[0..8], &[0, 0, 0, 0, 0, 0, 0, 1]);
    // uuid length prefix, then UTF-16 code units
    assert_eq!(&bytes[8..12], &[0, 0, 0, 2]);
    assert_eq!(&bytes[12..16], &[0, b'a', 0, b'b']);
    assert!(bytes[16..32].iter().all(|&b| b == 0));
    // code, then the boolean byte
    assert_eq!(&bytes[32..36], &[1, 2, 3, 4]);
    assert_eq!(bytes[36], 1);
}

#[test]
fn test_pcr_long_strings_truncated() {
    let test = PcrTest::new(0, "0123456789XYZ", 1, false, 0.0, "note that is too long");
    let decoded = PcrTest::decode(&test.to_bytes().unwrap()).unwrap();

    assert_eq!(decoded.patient_uuid, "0123456789");
    assert_eq!(decoded.note, "note that i");
}

#[test]
fn test_pcr_equality_by_code_only() {
    let a = sample_test();
    let mut b = sample_test();
    b.note = "other".to_string();
    b.value = -1.0;

    assert!(a.is_equal(&b));
    assert!(!a.is_equal(&PcrTest::with_code(1)));
    assert_eq!(a.key_hash(), 4711);
    assert_eq!(PcrTest::with_code(-5).key_hash(), -5);
}

#[test]
fn test_pcr_decode_wrong_length() {
    let result = PcrTest::decode(&[0u8; 70]);
    assert!(matches!(result, Err(LinHashError::Decode(_))));
}

// =============================================================================
// Person Tests
// =============================================================================

#[test]
fn test_person_decode_restores_fields() {
    let person = sample_person();
    let decoded = Person::decode(&person.to_bytes().unwrap()).unwrap();

    assert_eq!(decoded, person);
    assert_eq!(decoded.tests(), &[4711, 4712]);
}

#[test]
fn test_person_test_slots_limited() {
    let mut person = Person::with_uuid("p-0002");
    for code in 0..6 {
        assert!(person.add_test(code));
    }
    assert!(!person.add_test(6));
    assert_eq!(person.tests().len(), Person::MAX_TESTS);

    assert!(person.remove_test(3));
    assert!(!person.remove_test(3));
    assert_eq!(person.tests(), &[0, 1, 2, 4, 5]);
}

#[test]
fn test_person_corrupt_test_count() {
    let mut bytes = sample_person().to_bytes().unwrap();
    // The test count follows the three strings and the birth date
    let count_at = fixed_string_size(15) + fixed_string_size(14) + 8 + fixed_string_size(10);
    bytes[count_at..count_at + 4].copy_from_slice(&7i32.to_be_bytes());

    let result = Person::decode(&bytes);
    assert!(matches!(result, Err(LinHashError::Decode(_))));
}

#[test]
fn test_person_key_hash_stable() {
    let a = Person::with_uuid("p-0001");
    let b = sample_person();

    assert!(a.is_equal(&b));
    assert_eq!(a.key_hash(), b.key_hash());
    assert!(a.key_hash() >= 0);
    assert_ne!(a.key_hash(), Person::with_uuid("p-0003").key_hash());
}

#[test]
fn test_person_long_uuid_key_matches_stored_key() {
    let person = Person::new("A", "B", 0, "0123456789AB");
    assert_eq!(person.uuid(), "0123456789");

    let decoded = Person::decode(&person.to_bytes().unwrap()).unwrap();
    assert!(decoded.is_equal(&person));
    assert_eq!(decoded.key_hash(), person.key_hash());
    assert!(decoded.is_equal(&Person::with_uuid("0123456789AB")));
}

// =============================================================================
// Fixed String Tests
// =============================================================================

#[test]
fn test_fixed_string_non_ascii() {
    let mut buf = Vec::new();
    put_fixed_string(&mut buf, "Žilina", 8);
    assert_eq!(buf.len(), fixed_string_size(8));

    let mut cursor = &buf[..];
    assert_eq!(get_fixed_string(&mut cursor, 8).unwrap(), "Žilina");
    assert!(cursor.is_empty());
}

#[test]
fn test_fixed_string_bad_length_prefix() {
    let mut buf = Vec::new();
    put_fixed_string(&mut buf, "abc", 4);
    buf[0..4].copy_from_slice(&5i32.to_be_bytes());

    let mut cursor = &buf[..];
    assert!(matches!(
        get_fixed_string(&mut cursor, 4),
        Err(LinHashError::Decode(_))
    ));
}

#[test]
fn test_fixed_string_short_buffer() {
    let buf = [0u8; 6];
    let mut cursor = &buf[..];
    assert!(matches!(
        get_fixed_string(&mut cursor, 4),
        Err(LinHashError::Decode(_))
    ));
}
