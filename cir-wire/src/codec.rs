//! Codec traits implemented by every persistent IR object

use crate::error::WireResult;
use crate::stream::ByteStream;

/// Append this object's envelope to a stream
pub trait WireEncode {
    fn encode(&self, stream: &mut ByteStream);

    /// Encode into a fresh little-endian buffer without preamble
    fn to_wire(&self) -> Vec<u8> {
        let mut stream = ByteStream::new();
        self.encode(&mut stream);
        stream.into_bytes()
    }
}

/// Read an envelope back from a stream
pub trait WireDecode: Sized {
    fn decode(stream: &mut ByteStream) -> WireResult<Self>;

    /// Decode from a buffer without preamble
    fn from_wire(bytes: &[u8]) -> WireResult<Self> {
        let mut stream = ByteStream::from_bytes(bytes);
        Self::decode(&mut stream)
    }
}

impl WireEncode for u8 {
    fn encode(&self, stream: &mut ByteStream) {
        stream.put_byte(*self);
    }
}

impl WireDecode for u8 {
    fn decode(stream: &mut ByteStream) -> WireResult<Self> {
        stream.get_byte()
    }
}

impl WireEncode for u32 {
    fn encode(&self, stream: &mut ByteStream) {
        stream.put_word(*self);
    }
}

impl WireDecode for u32 {
    fn decode(stream: &mut ByteStream) -> WireResult<Self> {
        stream.get_word()
    }
}

impl WireEncode for u64 {
    fn encode(&self, stream: &mut ByteStream) {
        stream.put_dword(*self);
    }
}

impl WireDecode for u64 {
    fn decode(stream: &mut ByteStream) -> WireResult<Self> {
        stream.get_dword()
    }
}

impl WireEncode for bool {
    fn encode(&self, stream: &mut ByteStream) {
        stream.put_bool(*self);
    }
}

impl WireDecode for bool {
    fn decode(stream: &mut ByteStream) -> WireResult<Self> {
        stream.get_bool()
    }
}

impl WireEncode for String {
    fn encode(&self, stream: &mut ByteStream) {
        stream.put_string(self);
    }
}

impl WireDecode for String {
    fn decode(stream: &mut ByteStream) -> WireResult<Self> {
        stream.get_string()
    }
}

impl<T: WireEncode> WireEncode for Vec<T> {
    fn encode(&self, stream: &mut ByteStream) {
        stream.write_iter(self, |s, item| item.encode(s));
    }
}

impl<T: WireDecode> WireDecode for Vec<T> {
    fn decode(stream: &mut ByteStream) -> WireResult<Self> {
        stream.read_seq(T::decode)
    }
}

/// Optional fields are a presence byte followed by the value
impl<T: WireEncode> WireEncode for Option<T> {
    fn encode(&self, stream: &mut ByteStream) {
        match self {
            Some(value) => {
                stream.put_bool(true);
                value.encode(stream);
            }
            None => stream.put_bool(false),
        }
    }
}

impl<T: WireDecode> WireDecode for Option<T> {
    fn decode(stream: &mut ByteStream) -> WireResult<Self> {
        if stream.get_bool()? {
            Ok(Some(T::decode(stream)?))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_and_option() {
        let names = vec!["a".to_string(), "bc".to_string()];
        let mut stream = ByteStream::new();
        names.encode(&mut stream);
        Some(5u32).encode(&mut stream);
        None::<u32>.encode(&mut stream);

        assert_eq!(Vec::<String>::decode(&mut stream).unwrap(), names);
        assert_eq!(Option::<u32>::decode(&mut stream).unwrap(), Some(5));
        assert_eq!(Option::<u32>::decode(&mut stream).unwrap(), None);
        assert!(stream.is_exhausted());
    }

    #[test]
    fn test_wire_helpers() {
        let bytes = 0x0102_0304u32.to_wire();
        assert_eq!(bytes, vec![4, 3, 2, 1]);
        assert_eq!(u32::from_wire(&bytes).unwrap(), 0x0102_0304);
    }
}
