//! Tests for conditional preamble parsing

use cir_wire::{ByteStream, EncodeOptions, Endian, WireDecode, WireEncode};
use pretty_assertions::assert_eq;

const MAGIC: u8 = 0x7E;

/// Reader used by every object that may or may not carry a preamble
fn read_payload(bytes: Vec<u8>) -> Vec<String> {
    let mut stream = ByteStream::from_bytes(bytes);
    if stream.validate_magic(MAGIC) {
        assert!(stream.validate_platform_compat());
    }
    Vec::<String>::decode(&mut stream).expect("payload should decode")
}

fn payload() -> Vec<String> {
    vec!["alpha".to_string(), "beta".to_string()]
}

#[test]
fn test_same_reader_accepts_both_layouts() {
    let mut with = EncodeOptions::default().begin(MAGIC);
    payload().encode(&mut with);

    let without = payload().to_wire();

    assert_eq!(read_payload(with.into_bytes()), payload());
    assert_eq!(read_payload(without), payload());
}

#[test]
fn test_big_endian_payload_is_readable() {
    let options = EncodeOptions {
        preamble: true,
        endian: Endian::Big,
    };
    let mut stream = options.begin(MAGIC);
    payload().encode(&mut stream);
    let bytes = stream.into_bytes();

    // Count is written big-endian right after the preamble
    assert_eq!(&bytes[2..6], &[0, 0, 0, 2]);
    assert_eq!(read_payload(bytes), payload());
}

#[test]
fn test_payload_starting_with_magic_value_is_ambiguous_only_with_preamble() {
    // A bare payload whose first byte differs from the magic is untouched
    let mut stream = ByteStream::new();
    stream.put_byte(0x01);
    stream.put_byte(MAGIC);
    let mut reader = ByteStream::from_bytes(stream.into_bytes());
    assert!(!reader.validate_magic(MAGIC));
    assert_eq!(reader.get_byte().unwrap(), 0x01);
    assert_eq!(reader.get_byte().unwrap(), MAGIC);
}
