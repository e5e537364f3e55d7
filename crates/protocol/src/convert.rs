//! Filename encoding conversion between the wire's UTF-8 and a host's local
//! encoding.
//!
//! `SSH_FXP_NAME` and path arguments are UTF-8 on the wire from v4 onward,
//! but the underlying filesystem may use something else. [`Converter`] is
//! the seam a host crate plugs a concrete transcoder into; [`Utf8Passthrough`]
//! is always available, and [`EncodingRsConverter`] (behind the `iconv`
//! feature) handles everything `encoding_rs` names.

/// Converts filenames between the wire encoding (UTF-8) and a host's local
/// encoding.
pub trait Converter: Send + Sync {
    /// Converts wire bytes (UTF-8) into local-encoding bytes suitable for a
    /// filesystem call.
    fn to_local(&self, utf8: &[u8]) -> Vec<u8>;

    /// Converts local-encoding bytes (as returned by a filesystem call)
    /// into wire bytes (UTF-8).
    fn to_wire(&self, local: &[u8]) -> Vec<u8>;
}

/// A converter that performs no conversion at all, for hosts whose local
/// encoding already is UTF-8.
#[derive(Clone, Copy, Debug, Default)]
pub struct Utf8Passthrough;

impl Converter for Utf8Passthrough {
    fn to_local(&self, utf8: &[u8]) -> Vec<u8> {
        utf8.to_vec()
    }

    fn to_wire(&self, local: &[u8]) -> Vec<u8> {
        local.to_vec()
    }
}

#[cfg(feature = "iconv")]
pub use iconv::EncodingRsConverter;

#[cfg(feature = "iconv")]
mod iconv {
    use super::Converter;
    use encoding_rs::Encoding;

    /// A [`Converter`] backed by an [`encoding_rs::Encoding`].
    pub struct EncodingRsConverter {
        encoding: &'static Encoding,
    }

    impl EncodingRsConverter {
        /// Looks up `label` (a charset name such as `"ISO-8859-1"`) the way
        /// `encoding_rs` resolves labels from `Content-Type`-style strings.
        /// Returns `None` for an unrecognised label.
        #[must_use]
        pub fn for_label(label: &str) -> Option<Self> {
            Encoding::for_label(label.as_bytes()).map(|encoding| Self { encoding })
        }
    }

    impl Converter for EncodingRsConverter {
        fn to_local(&self, utf8: &[u8]) -> Vec<u8> {
            let text = String::from_utf8_lossy(utf8);
            let (bytes, _, _) = self.encoding.encode(&text);
            bytes.into_owned()
        }

        fn to_wire(&self, local: &[u8]) -> Vec<u8> {
            let (text, _, _) = self.encoding.decode(local);
            text.into_owned().into_bytes()
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_is_the_identity() {
        let converter = Utf8Passthrough;
        let bytes = b"caf\xc3\xa9.txt";
        assert_eq!(converter.to_local(bytes), bytes);
        assert_eq!(converter.to_wire(bytes), bytes);
    }
}
