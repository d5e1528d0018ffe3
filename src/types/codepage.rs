//! # Codepage Registry
//!
//! Text items are stored as bytes in the codepage recorded in the buffer
//! header. The registry is a fixed table: resolving a codepage is a pure
//! lookup by numeric id or by case-insensitive name, and nothing in it can be
//! changed at runtime.
//!
//! | Id | Names | Encoding |
//! |----|-------|----------|
//! | 65001 | `utf-8`, `utf8` | UTF-8 |
//! | 1200 | `utf-16`, `utf-16le`, `unicode` | UTF-16 little-endian |
//! | 1201 | `utf-16be`, `unicodefffe` | UTF-16 big-endian |
//! | 12000 | `utf-32`, `utf-32le` | UTF-32 little-endian |
//! | 20127 | `us-ascii`, `ascii` | 7-bit ASCII |
//! | 28591 | `iso-8859-1`, `latin1` | ISO Latin-1 |
//!
//! Encoding fails with `UnmappableCharacter` when a character is outside the
//! codepage's repertoire; decoding fails with `MalformedBuffer` when the bytes
//! are not valid for the codepage.

use crate::error::CodecError;
use eyre::{bail, ensure, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Codepage {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Ascii,
    Latin1,
}

const REGISTRY: &[(Codepage, u16, &[&str])] = &[
    (Codepage::Utf8, 65001, &["utf-8", "utf8"]),
    (Codepage::Utf16Le, 1200, &["utf-16", "utf-16le", "unicode"]),
    (Codepage::Utf16Be, 1201, &["utf-16be", "unicodefffe"]),
    (Codepage::Utf32Le, 12000, &["utf-32", "utf-32le"]),
    (Codepage::Ascii, 20127, &["us-ascii", "ascii"]),
    (Codepage::Latin1, 28591, &["iso-8859-1", "latin1"]),
];

impl Codepage {
    pub fn id(self) -> u16 {
        self.entry().1
    }

    pub fn name(self) -> &'static str {
        self.entry().2[0]
    }

    fn entry(self) -> &'static (Codepage, u16, &'static [&'static str]) {
        REGISTRY
            .iter()
            .find(|(cp, _, _)| *cp == self)
            .unwrap_or(&REGISTRY[0])
    }

    pub fn from_id(id: u16) -> Result<Self> {
        match REGISTRY.iter().find(|(_, cp_id, _)| *cp_id == id) {
            Some((cp, _, _)) => Ok(*cp),
            None => bail!(CodecError::CodepageNotFound(id.to_string())),
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        let name = name.trim();
        match REGISTRY
            .iter()
            .find(|(_, _, names)| names.iter().any(|n| n.eq_ignore_ascii_case(name)))
        {
            Some((cp, _, _)) => Ok(*cp),
            None => bail!(CodecError::CodepageNotFound(name.to_string())),
        }
    }

    /// Resolves either a numeric id (`"1200"`) or a name (`"utf-16"`).
    pub fn lookup(name_or_id: &str) -> Result<Self> {
        match name_or_id.trim().parse::<u16>() {
            Ok(id) => Self::from_id(id),
            Err(_) => Self::from_name(name_or_id),
        }
    }

    /// Appends the encoded form of `text` to `out`.
    pub fn encode_into(self, text: &str, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Codepage::Utf8 => out.extend_from_slice(text.as_bytes()),
            Codepage::Utf16Le => {
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
            }
            Codepage::Utf16Be => {
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
            }
            Codepage::Utf32Le => {
                for ch in text.chars() {
                    out.extend_from_slice(&(ch as u32).to_le_bytes());
                }
            }
            Codepage::Ascii => self.encode_single_byte(text, 0x7F, out)?,
            Codepage::Latin1 => self.encode_single_byte(text, 0xFF, out)?,
        }
        Ok(())
    }

    fn encode_single_byte(self, text: &str, max: u32, out: &mut Vec<u8>) -> Result<()> {
        for ch in text.chars() {
            ensure!(
                ch as u32 <= max,
                CodecError::UnmappableCharacter {
                    ch,
                    codepage: self.id(),
                }
            );
            out.push(ch as u32 as u8);
        }
        Ok(())
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(text.len());
        self.encode_into(text, &mut out)?;
        Ok(out)
    }

    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            Codepage::Utf8 => match std::str::from_utf8(bytes) {
                Ok(s) => Ok(s.to_string()),
                Err(e) => bail!(CodecError::malformed(format!("invalid UTF-8 text: {}", e))),
            },
            Codepage::Utf16Le | Codepage::Utf16Be => {
                ensure!(
                    bytes.len() % 2 == 0,
                    CodecError::malformed(format!("odd UTF-16 byte length {}", bytes.len()))
                );
                let units = bytes.chunks_exact(2).map(|c| {
                    if self == Codepage::Utf16Le {
                        u16::from_le_bytes([c[0], c[1]])
                    } else {
                        u16::from_be_bytes([c[0], c[1]])
                    }
                });
                char::decode_utf16(units)
                    .map(|r| {
                        r.map_err(|e| {
                            eyre::Report::new(CodecError::malformed(format!(
                                "invalid UTF-16 text: {}",
                                e
                            )))
                        })
                    })
                    .collect()
            }
            Codepage::Utf32Le => {
                ensure!(
                    bytes.len() % 4 == 0,
                    CodecError::malformed(format!(
                        "UTF-32 byte length {} not a multiple of 4",
                        bytes.len()
                    ))
                );
                bytes
                    .chunks_exact(4)
                    .map(|c| {
                        let scalar = u32::from_le_bytes([c[0], c[1], c[2], c[3]]);
                        char::from_u32(scalar).ok_or_else(|| {
                            eyre::Report::new(CodecError::malformed(format!(
                                "invalid UTF-32 scalar {:#x}",
                                scalar
                            )))
                        })
                    })
                    .collect()
            }
            Codepage::Ascii => bytes
                .iter()
                .map(|&b| {
                    if b <= 0x7F {
                        Ok(b as char)
                    } else {
                        Err(eyre::Report::new(CodecError::malformed(format!(
                            "non-ASCII byte {:#04x}",
                            b
                        ))))
                    }
                })
                .collect(),
            Codepage::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

impl fmt::Display for Codepage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.id())
    }
}

impl FromStr for Codepage {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        Self::lookup(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codec_error;

    #[test]
    fn lookup_by_id_and_name() {
        assert_eq!(Codepage::lookup("65001").unwrap(), Codepage::Utf8);
        assert_eq!(Codepage::lookup("UTF-16").unwrap(), Codepage::Utf16Le);
        assert_eq!(Codepage::lookup(" latin1 ").unwrap(), Codepage::Latin1);
        assert_eq!("1201".parse::<Codepage>().unwrap(), Codepage::Utf16Be);
        assert_eq!(Codepage::from_id(Codepage::Ascii.id()).unwrap(), Codepage::Ascii);
    }

    #[test]
    fn unknown_codepage_fails() {
        let err = Codepage::lookup("klingon").unwrap_err();
        assert_eq!(
            codec_error(&err),
            Some(&CodecError::CodepageNotFound("klingon".to_string()))
        );
        assert!(Codepage::from_id(437).is_err());
    }

    #[test]
    fn utf16_encodes_surrogate_pairs() {
        let bytes = Codepage::Utf16Le.encode("a\u{1F600}").unwrap();
        assert_eq!(bytes.len(), 6);
        assert_eq!(Codepage::Utf16Le.decode(&bytes).unwrap(), "a\u{1F600}");

        let be = Codepage::Utf16Be.encode("a").unwrap();
        assert_eq!(be, vec![0x00, 0x61]);
    }

    #[test]
    fn single_byte_codepages_reject_unmappable() {
        let err = Codepage::Ascii.encode("caf\u{e9}").unwrap_err();
        assert_eq!(
            codec_error(&err),
            Some(&CodecError::UnmappableCharacter {
                ch: '\u{e9}',
                codepage: 20127
            })
        );
        assert_eq!(Codepage::Latin1.encode("caf\u{e9}").unwrap(), b"caf\xe9".to_vec());
        assert_eq!(Codepage::Latin1.decode(b"caf\xe9").unwrap(), "caf\u{e9}");
    }

    #[test]
    fn decode_rejects_invalid_bytes() {
        assert!(Codepage::Utf8.decode(&[0xC3]).is_err());
        assert!(Codepage::Utf16Le.decode(&[0x61]).is_err());
        assert!(Codepage::Utf16Le.decode(&[0x00, 0xD8]).is_err());
        assert!(Codepage::Utf32Le.decode(&[0x00, 0x00, 0x11, 0x00]).is_err());
        assert!(Codepage::Ascii.decode(&[0x80]).is_err());
    }
}
