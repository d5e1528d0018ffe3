//! # binarray Configuration Module
//!
//! Format limits and grammar characters live in [`constants`]. The only
//! runtime setting, the codepage used for Text buffers whose policy names
//! none, is carried by an explicit [`CodecConfig`] value rather than by
//! process-wide state, so two callers with different defaults never
//! interfere.
//!
//! ## Module Organization
//!
//! - [`constants`]: Numeric limits, flag layout, grammar characters
//! - [`CodecConfig`]: Per-call defaults threaded into constructors and parsers

pub mod constants;
pub use constants::*;

use crate::types::Codepage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    pub default_codepage: Codepage,
}

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_codepage(mut self, codepage: Codepage) -> Self {
        self.default_codepage = codepage;
        self
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            default_codepage: Codepage::from_id(DEFAULT_CODEPAGE_ID).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_utf8() {
        assert_eq!(CodecConfig::default().default_codepage, Codepage::Utf8);
        assert_eq!(
            CodecConfig::new()
                .with_default_codepage(Codepage::Latin1)
                .default_codepage,
            Codepage::Latin1
        );
    }
}
