//! # i18n Module
//!
//! Bangla/English helpers used by document rendering and fee receipts.
//!
//! ```text
//! Language::Bn
//!   digits      2026      ──► ২০২৬
//!   month       March     ──► মার্চ
//!   name        "Rahim" / "রহিম" ──► "রহিম" (falls back to English when blank)
//! ```

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// Output language of a template or document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Bn,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Bn => "bn",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "bn" | "bangla" | "bengali" => Ok(Language::Bn),
            _ => Err(ValidationError::NotAllowed {
                field: "language".to_string(),
                allowed: vec!["en".to_string(), "bn".to_string()],
            }),
        }
    }
}

const BANGLA_DIGITS: [char; 10] = ['০', '১', '২', '৩', '৪', '৫', '৬', '৭', '৮', '৯'];

/// Replaces ASCII digits with Bangla digits; everything else is kept.
///
/// ```rust
/// use shikkha_core::i18n::to_bangla_digits;
///
/// assert_eq!(to_bangla_digits("Roll 42, 2026"), "Roll ৪২, ২০২৬");
/// ```
pub fn to_bangla_digits(input: &str) -> String {
    input
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d) if c.is_ascii_digit() => BANGLA_DIGITS[d as usize],
            _ => c,
        })
        .collect()
}

/// Inverse of [`to_bangla_digits`], for parsing form input typed in Bangla.
pub fn from_bangla_digits(input: &str) -> String {
    input
        .chars()
        .map(|c| match BANGLA_DIGITS.iter().position(|&b| b == c) {
            Some(d) => char::from(b'0' + d as u8),
            None => c,
        })
        .collect()
}

/// Renders digits for the given language.
pub fn localize_digits(input: &str, lang: Language) -> String {
    match lang {
        Language::En => input.to_string(),
        Language::Bn => to_bangla_digits(input),
    }
}

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const MONTHS_BN: [&str; 12] = [
    "জানুয়ারি",
    "ফেব্রুয়ারি",
    "মার্চ",
    "এপ্রিল",
    "মে",
    "জুন",
    "জুলাই",
    "আগস্ট",
    "সেপ্টেম্বর",
    "অক্টোবর",
    "নভেম্বর",
    "ডিসেম্বর",
];

/// Month name for `month` (1-12). Returns `None` outside that range.
pub fn month_name(month: u32, lang: Language) -> Option<&'static str> {
    let idx = month.checked_sub(1)? as usize;
    match lang {
        Language::En => MONTHS_EN.get(idx).copied(),
        Language::Bn => MONTHS_BN.get(idx).copied(),
    }
}

/// Formats a date as `19 October 2026` or `১৯ অক্টোবর ২০২৬`.
pub fn format_date(date: NaiveDate, lang: Language) -> String {
    let month = month_name(date.month(), lang).unwrap_or_default();
    let text = format!("{} {} {}", date.day(), month, date.year());
    localize_digits(&text, lang)
}

/// Picks the Bangla name when asked for and present, otherwise the English one.
pub fn localized<'a>(name_en: &'a str, name_bn: Option<&'a str>, lang: Language) -> &'a str {
    match (lang, name_bn) {
        (Language::Bn, Some(bn)) if !bn.trim().is_empty() => bn,
        _ => name_en,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!("bn".parse::<Language>().unwrap(), Language::Bn);
        assert_eq!("Bangla".parse::<Language>().unwrap(), Language::Bn);
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert!("fr".parse::<Language>().is_err());
        assert_eq!(Language::default(), Language::En);
    }

    #[test]
    fn test_digits_round_trip() {
        let bn = to_bangla_digits("0123456789");
        assert_eq!(bn, "০১২৩৪৫৬৭৮৯");
        assert_eq!(from_bangla_digits(&bn), "0123456789");
        assert_eq!(localize_digits("12", Language::En), "12");
    }

    #[test]
    fn test_month_names() {
        assert_eq!(month_name(1, Language::En), Some("January"));
        assert_eq!(month_name(10, Language::Bn), Some("অক্টোবর"));
        assert_eq!(month_name(0, Language::En), None);
        assert_eq!(month_name(13, Language::Bn), None);
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(format_date(date, Language::En), "19 October 2026");
        assert_eq!(format_date(date, Language::Bn), "১৯ অক্টোবর ২০২৬");
    }

    #[test]
    fn test_localized() {
        assert_eq!(localized("Rahim", Some("রহিম"), Language::Bn), "রহিম");
        assert_eq!(localized("Rahim", Some("রহিম"), Language::En), "Rahim");
        assert_eq!(localized("Rahim", Some(" "), Language::Bn), "Rahim");
        assert_eq!(localized("Rahim", None, Language::Bn), "Rahim");
    }
}
