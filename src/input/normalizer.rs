// Stock code normalizer.
//
// Users paste codes copied from spreadsheets, chat apps and broker terminals,
// so separators are a mix of any Unicode whitespace (non-breaking and
// ideographic spaces included), the enumeration comma (、) and both ASCII and
// full-width commas. Each token may
// carry a Shanghai/Shenzhen market prefix (SH600519, sz000001).

use std::borrow::Borrow;
use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Smallest batch the pipeline will classify.
pub const MIN_BATCH_SIZE: usize = 1;

/// Largest batch the pipeline will classify.
pub const MAX_BATCH_SIZE: usize = 500;

/// Market prefixes stripped before validation (compared case-insensitively).
const MARKET_PREFIXES: [&str; 2] = ["SH", "SZ"];

static SIX_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[0-9]{6}$").expect("code pattern is valid"));

/// A canonical six-digit stock code.
///
/// Only constructible through [`StockCode::parse`], so holding one means the
/// prefix has been stripped and the digits checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StockCode(String);

impl StockCode {
    /// Parse a raw token: strip an optional SH/SZ prefix, then require
    /// exactly six ASCII digits.
    pub fn parse(raw: &str) -> Option<Self> {
        let stripped = strip_market_prefix(raw.trim());
        SIX_DIGITS
            .is_match(stripped)
            .then(|| StockCode(stripped.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for StockCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StockCode {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        StockCode::parse(&value).ok_or_else(|| format!("invalid stock code: {value:?}"))
    }
}

impl From<StockCode> for String {
    fn from(code: StockCode) -> Self {
        code.0
    }
}

/// Result of parsing user input. Both lists keep input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedInput {
    pub valid: Vec<StockCode>,
    /// Rejected tokens, after prefix stripping.
    pub invalid: Vec<String>,
}

/// Split free text into validated codes and rejected tokens.
///
/// Repeated codes are kept; each occurrence becomes its own record later.
pub fn normalize(text: &str) -> NormalizedInput {
    let mut out = NormalizedInput::default();

    for token in text.split(is_separator).filter(|t| !t.is_empty()) {
        let stripped = strip_market_prefix(token);
        if SIX_DIGITS.is_match(stripped) {
            out.valid.push(StockCode(stripped.to_string()));
        } else {
            out.invalid.push(stripped.to_string());
        }
    }

    out
}

/// Enforce the batch size bounds before any classification work starts.
pub fn validate_batch(input: &NormalizedInput) -> Result<()> {
    let count = input.valid.len();
    if count < MIN_BATCH_SIZE {
        return Err(AnalysisError::NoValidCodes);
    }
    if count > MAX_BATCH_SIZE {
        return Err(AnalysisError::BatchTooLarge(count));
    }
    Ok(())
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '、' | ',' | '，')
}

fn strip_market_prefix(token: &str) -> &str {
    match token.get(..2) {
        Some(head) if MARKET_PREFIXES.iter().any(|p| head.eq_ignore_ascii_case(p)) => &token[2..],
        _ => token,
    }
}
