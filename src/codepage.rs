//! ASCII codepage handling for names and string values.
//!
//! CREG hives store key names, value names and string data in a single-byte
//! or double-byte Windows codepage. The accepted set is exactly ASCII (20127)
//! and the Windows codepages 874, 932, 936, 949, 950 and 1250 through 1258;
//! the default is Windows-1252.

use crate::error::{CregError, Result};
use encoding_rs::Encoding;

/// An accepted ASCII codepage for decoding stored names and string data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codepage {
    /// US-ASCII (20127). Bytes >= 0x80 are conversion errors.
    Ascii,
    /// Thai.
    Windows874,
    /// Japanese Shift-JIS.
    Windows932,
    /// Simplified Chinese GBK.
    Windows936,
    /// Korean.
    Windows949,
    /// Traditional Chinese Big5.
    Windows950,
    /// Central European.
    Windows1250,
    /// Cyrillic.
    Windows1251,
    /// Western European.
    Windows1252,
    /// Greek.
    Windows1253,
    /// Turkish.
    Windows1254,
    /// Hebrew.
    Windows1255,
    /// Arabic.
    Windows1256,
    /// Baltic.
    Windows1257,
    /// Vietnamese.
    Windows1258,
}

impl Default for Codepage {
    fn default() -> Self {
        Codepage::Windows1252
    }
}

impl Codepage {
    /// Parses a Windows codepage number.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCodepage` for numbers outside the accepted set.
    pub fn from_number(number: u16) -> Result<Self> {
        match number {
            20127 => Ok(Codepage::Ascii),
            874 => Ok(Codepage::Windows874),
            932 => Ok(Codepage::Windows932),
            936 => Ok(Codepage::Windows936),
            949 => Ok(Codepage::Windows949),
            950 => Ok(Codepage::Windows950),
            1250 => Ok(Codepage::Windows1250),
            1251 => Ok(Codepage::Windows1251),
            1252 => Ok(Codepage::Windows1252),
            1253 => Ok(Codepage::Windows1253),
            1254 => Ok(Codepage::Windows1254),
            1255 => Ok(Codepage::Windows1255),
            1256 => Ok(Codepage::Windows1256),
            1257 => Ok(Codepage::Windows1257),
            1258 => Ok(Codepage::Windows1258),
            _ => Err(CregError::UnsupportedCodepage(number)),
        }
    }

    /// Returns the Windows codepage number.
    pub fn number(&self) -> u16 {
        match self {
            Codepage::Ascii => 20127,
            Codepage::Windows874 => 874,
            Codepage::Windows932 => 932,
            Codepage::Windows936 => 936,
            Codepage::Windows949 => 949,
            Codepage::Windows950 => 950,
            Codepage::Windows1250 => 1250,
            Codepage::Windows1251 => 1251,
            Codepage::Windows1252 => 1252,
            Codepage::Windows1253 => 1253,
            Codepage::Windows1254 => 1254,
            Codepage::Windows1255 => 1255,
            Codepage::Windows1256 => 1256,
            Codepage::Windows1257 => 1257,
            Codepage::Windows1258 => 1258,
        }
    }

    /// Parses a command-line codepage literal (`ascii`, `windows-1252`, ...).
    ///
    /// Returns `None` for unrecognized literals so the caller can warn and
    /// fall back to the default.
    pub fn from_option_string(option: &str) -> Option<Self> {
        match option {
            "ascii" => Some(Codepage::Ascii),
            "windows-874" => Some(Codepage::Windows874),
            "windows-932" => Some(Codepage::Windows932),
            "windows-936" => Some(Codepage::Windows936),
            "windows-949" => Some(Codepage::Windows949),
            "windows-950" => Some(Codepage::Windows950),
            "windows-1250" => Some(Codepage::Windows1250),
            "windows-1251" => Some(Codepage::Windows1251),
            "windows-1252" => Some(Codepage::Windows1252),
            "windows-1253" => Some(Codepage::Windows1253),
            "windows-1254" => Some(Codepage::Windows1254),
            "windows-1255" => Some(Codepage::Windows1255),
            "windows-1256" => Some(Codepage::Windows1256),
            "windows-1257" => Some(Codepage::Windows1257),
            "windows-1258" => Some(Codepage::Windows1258),
            _ => None,
        }
    }

    /// Returns the `encoding_rs` encoding backing this codepage.
    ///
    /// ASCII has no dedicated encoding and is validated by hand in
    /// [`Codepage::decode`].
    fn encoding(&self) -> Option<&'static Encoding> {
        match self {
            Codepage::Ascii => None,
            Codepage::Windows874 => Some(encoding_rs::WINDOWS_874),
            Codepage::Windows932 => Some(encoding_rs::SHIFT_JIS),
            Codepage::Windows936 => Some(encoding_rs::GBK),
            Codepage::Windows949 => Some(encoding_rs::EUC_KR),
            Codepage::Windows950 => Some(encoding_rs::BIG5),
            Codepage::Windows1250 => Some(encoding_rs::WINDOWS_1250),
            Codepage::Windows1251 => Some(encoding_rs::WINDOWS_1251),
            Codepage::Windows1252 => Some(encoding_rs::WINDOWS_1252),
            Codepage::Windows1253 => Some(encoding_rs::WINDOWS_1253),
            Codepage::Windows1254 => Some(encoding_rs::WINDOWS_1254),
            Codepage::Windows1255 => Some(encoding_rs::WINDOWS_1255),
            Codepage::Windows1256 => Some(encoding_rs::WINDOWS_1256),
            Codepage::Windows1257 => Some(encoding_rs::WINDOWS_1257),
            Codepage::Windows1258 => Some(encoding_rs::WINDOWS_1258),
        }
    }

    /// Decodes stored bytes into a string.
    ///
    /// # Arguments
    ///
    /// * `data` - Raw codepage-encoded bytes.
    /// * `offset` - Hive offset of the bytes, for error reporting.
    ///
    /// # Errors
    ///
    /// Returns `Conversion` if the bytes are not valid in this codepage.
    pub fn decode(&self, data: &[u8], offset: u64) -> Result<String> {
        if data.is_empty() {
            return Ok(String::new());
        }

        match self.encoding() {
            None => {
                if data.iter().any(|&b| b >= 0x80) {
                    return Err(CregError::Conversion {
                        offset,
                        reason: "byte outside the ASCII range",
                    });
                }
                // Validated above, every byte is < 0x80.
                Ok(data.iter().map(|&b| b as char).collect())
            }
            Some(encoding) => {
                let (decoded, _encoding, had_errors) = encoding.decode(data);

                if had_errors {
                    return Err(CregError::Conversion {
                        offset,
                        reason: "invalid byte sequence for codepage",
                    });
                }

                Ok(decoded.into_owned())
            }
        }
    }
}

/// Decodes a UTF-16 query string into characters, for name comparison.
///
/// Unpaired surrogates are conversion errors.
pub fn utf16_to_string(units: &[u16]) -> Result<String> {
    String::from_utf16(units).map_err(|_| CregError::Conversion {
        offset: 0,
        reason: "unpaired surrogate in UTF-16 string",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_codepage() {
        assert_eq!(Codepage::default(), Codepage::Windows1252);
    }

    #[test]
    fn test_from_number() {
        assert_eq!(Codepage::from_number(1252).unwrap(), Codepage::Windows1252);
        assert_eq!(Codepage::from_number(20127).unwrap(), Codepage::Ascii);
        assert_eq!(Codepage::from_number(932).unwrap(), Codepage::Windows932);
        assert!(matches!(
            Codepage::from_number(65001),
            Err(CregError::UnsupportedCodepage(65001))
        ));
    }

    #[test]
    fn test_number_round_trip() {
        for number in [20127, 874, 932, 936, 949, 950, 1250, 1255, 1258] {
            assert_eq!(Codepage::from_number(number).unwrap().number(), number);
        }
    }

    #[test]
    fn test_option_string() {
        assert_eq!(
            Codepage::from_option_string("windows-1252"),
            Some(Codepage::Windows1252)
        );
        assert_eq!(Codepage::from_option_string("ascii"), Some(Codepage::Ascii));
        assert_eq!(Codepage::from_option_string("utf-8"), None);
    }

    #[test]
    fn test_decode_windows_1252() {
        let cp = Codepage::Windows1252;
        assert_eq!(cp.decode(b"Software", 0).unwrap(), "Software");
        // 0xE9 is e-acute in Windows-1252
        assert_eq!(cp.decode(&[0xE9], 0).unwrap(), "\u{e9}");
    }

    #[test]
    fn test_decode_ascii_rejects_high_bytes() {
        let cp = Codepage::Ascii;
        assert_eq!(cp.decode(b"plain", 0).unwrap(), "plain");
        assert!(matches!(
            cp.decode(&[0x41, 0xE9], 0),
            Err(CregError::Conversion { .. })
        ));
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(Codepage::Windows1252.decode(b"", 0).unwrap(), "");
    }
}
