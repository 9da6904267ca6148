use crate::market::Market;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Fixed width of an instrument code: two-character market tag plus symbol.
pub const CODE_WIDTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("undefined market tag in code {code}")]
    UnknownMarket { code: String },
    #[error("code {code} is {len} chars, expected {CODE_WIDTH}")]
    BadWidth { code: String, len: usize },
    #[error("code {code} contains non-alphanumeric characters")]
    BadCharset { code: String },
}

/// Validated instrument code, e.g. `SH600000`. Always uppercase, always
/// [`CODE_WIDTH`] characters, always carrying a known market tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code {
    market: Market,
    text: String,
}

impl Code {
    /// Normalize to uppercase and validate width, charset and market tag.
    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        let text = raw.trim().to_ascii_uppercase();
        if text.len() != CODE_WIDTH {
            return Err(CodeError::BadWidth {
                len: text.len(),
                code: text,
            });
        }
        if !text.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(CodeError::BadCharset { code: text });
        }
        let Some(market) = Market::from_tag(&text[..2]) else {
            return Err(CodeError::UnknownMarket { code: text });
        };
        Ok(Self { market, text })
    }

    pub fn market(&self) -> Market {
        self.market
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether this is the market's benchmark index code.
    pub fn is_index(&self) -> bool {
        self.text == self.market.index_code()
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl FromStr for Code {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Code::parse(s)
    }
}

impl TryFrom<String> for Code {
    type Error = CodeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Code::parse(&s)
    }
}

impl From<Code> for String {
    fn from(code: Code) -> String {
        code.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case() {
        let code = Code::parse("sh600000").unwrap();
        assert_eq!(code.as_str(), "SH600000");
        assert_eq!(code.market(), Market::SH);
        assert!(!code.is_index());
    }

    #[test]
    fn index_codes() {
        assert!(Code::parse("SH000001").unwrap().is_index());
        assert!(Code::parse("SZ399001").unwrap().is_index());
        assert!(!Code::parse("SZ399002").unwrap().is_index());
    }

    #[test]
    fn rejects_unknown_tag() {
        assert!(matches!(
            Code::parse("XX123456"),
            Err(CodeError::UnknownMarket { .. })
        ));
    }

    #[test]
    fn rejects_bad_width() {
        assert!(matches!(
            Code::parse("SH60000"),
            Err(CodeError::BadWidth { len: 7, .. })
        ));
        assert!(matches!(
            Code::parse("SH6000000"),
            Err(CodeError::BadWidth { len: 9, .. })
        ));
    }

    #[test]
    fn rejects_bad_charset() {
        assert!(matches!(
            Code::parse("SH60\"000"),
            Err(CodeError::BadCharset { .. })
        ));
    }
}
