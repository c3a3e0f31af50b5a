//! Value classification and coercion.
//!
//! Everything here is pure: the classifier only looks at its configuration
//! and the text it is handed.

use crate::config::MergeConfig;
use crate::header::normalize_header;
use crate::model::{CellValue, CellWriteDecision, FormatDecision};

#[derive(Debug, Clone)]
pub struct ValueClassifier {
    raw_keywords: Vec<String>,
    normalized_keywords: Vec<String>,
    currency_symbols: Vec<String>,
    long_number_threshold: usize,
}

impl ValueClassifier {
    pub fn new(config: &MergeConfig) -> Self {
        let raw_keywords: Vec<String> = config
            .amount_keywords
            .iter()
            .map(|keyword| keyword.to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        let normalized_keywords = config
            .amount_keywords
            .iter()
            .map(|keyword| normalize_header(keyword))
            .filter(|keyword| !keyword.is_empty())
            .collect();
        Self {
            raw_keywords,
            normalized_keywords,
            currency_symbols: config
                .currency_symbols
                .iter()
                .filter(|symbol| !symbol.is_empty())
                .cloned()
                .collect(),
            long_number_threshold: config.long_number_threshold,
        }
    }

    /// True when the label contains an amount keyword as a substring.
    ///
    /// Both the lower-cased raw label and its normalized form are checked, so
    /// `Total Amount`, `TOTALAMOUNT` and `总-金额` all match. Short keywords
    /// such as `款` over-match on purpose.
    pub fn is_amount_column(&self, label: &str) -> bool {
        let lowered = label.to_lowercase();
        if self
            .raw_keywords
            .iter()
            .any(|keyword| lowered.contains(keyword.as_str()))
        {
            return true;
        }
        let normalized = normalize_header(label);
        self.normalized_keywords
            .iter()
            .any(|keyword| normalized.contains(keyword.as_str()))
    }

    /// Digit-only text longer than the configured threshold.
    pub fn is_long_number(&self, raw: &str) -> bool {
        !raw.is_empty()
            && raw.chars().all(|ch| ch.is_ascii_digit())
            && raw.chars().count() > self.long_number_threshold
    }

    /// Decides how `raw` is written into a column.
    ///
    /// Amount columns are always right-aligned; values that parse as numbers
    /// after stripping separators and currency symbols become numbers with the
    /// inherited format, anything else stays text with the text format. Long
    /// digit strings outside amount columns stay text with the text format.
    /// Everything else passes through untouched.
    pub fn classify_and_coerce(&self, raw: &str, is_amount_column: bool) -> CellWriteDecision {
        if is_amount_column {
            return match self.parse_amount(raw) {
                Some(number) => CellWriteDecision {
                    value: CellValue::Number(number),
                    number_format: FormatDecision::Inherit,
                    force_right_align: true,
                },
                None => CellWriteDecision {
                    value: CellValue::Text(raw.to_string()),
                    number_format: FormatDecision::Text,
                    force_right_align: true,
                },
            };
        }

        if self.is_long_number(raw) {
            return CellWriteDecision {
                value: CellValue::Text(raw.to_string()),
                number_format: FormatDecision::Text,
                force_right_align: false,
            };
        }

        CellWriteDecision {
            value: CellValue::Text(raw.to_string()),
            number_format: FormatDecision::Inherit,
            force_right_align: false,
        }
    }

    fn parse_amount(&self, raw: &str) -> Option<f64> {
        let mut cleaned = raw.replace(',', "");
        for symbol in &self.currency_symbols {
            cleaned = cleaned.replace(symbol.as_str(), "");
        }
        cleaned
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ValueClassifier {
        ValueClassifier::new(&MergeConfig::default())
    }

    #[test]
    fn amount_keywords_match_regardless_of_case_and_spacing() {
        let classifier = classifier();
        assert!(classifier.is_amount_column("Total Amount"));
        assert!(classifier.is_amount_column("TOTALAMOUNT"));
        assert!(classifier.is_amount_column("总-金额"));
        assert!(classifier.is_amount_column("Check Sum"));
        assert!(!classifier.is_amount_column("订单号"));
        assert!(!classifier.is_amount_column("Note"));
    }

    #[test]
    fn keywords_with_separators_match_normalized_labels() {
        let config = MergeConfig {
            amount_keywords: vec!["net value".into()],
            ..MergeConfig::default()
        };
        let classifier = ValueClassifier::new(&config);
        assert!(classifier.is_amount_column("NET_VALUE (CNY)"));
        assert!(classifier.is_amount_column("Net Value"));
    }

    #[test]
    fn short_keywords_over_match() {
        // "款" is part of "款式" (style), which is still classified as amount.
        assert!(classifier().is_amount_column("款式"));
    }

    #[test]
    fn currency_amount_becomes_number() {
        let decision = classifier().classify_and_coerce("¥1,234.50", true);
        assert_eq!(decision.value, CellValue::Number(1234.50));
        assert_eq!(decision.number_format, FormatDecision::Inherit);
        assert!(decision.force_right_align);

        let decision = classifier().classify_and_coerce("￥ 2,000", true);
        assert_eq!(decision.value, CellValue::Number(2000.0));

        let decision = classifier().classify_and_coerce("$-3.5", true);
        assert_eq!(decision.value, CellValue::Number(-3.5));
    }

    #[test]
    fn unparseable_amount_stays_text_but_right_aligned() {
        for raw in ["N/A", "", "NaN", "inf", "12元"] {
            let decision = classifier().classify_and_coerce(raw, true);
            assert_eq!(decision.value, CellValue::Text(raw.to_string()), "raw {raw:?}");
            assert_eq!(decision.number_format, FormatDecision::Text);
            assert!(decision.force_right_align);
        }
    }

    #[test]
    fn long_digit_strings_are_kept_as_text() {
        let decision = classifier().classify_and_coerce("1234567890123", false);
        assert_eq!(decision.value, CellValue::Text("1234567890123".into()));
        assert_eq!(decision.number_format, FormatDecision::Text);
        assert!(!decision.force_right_align);
    }

    #[test]
    fn threshold_is_exclusive() {
        let classifier = classifier();
        assert!(!classifier.is_long_number("1234567890"));
        assert!(classifier.is_long_number("12345678901"));
        assert!(!classifier.is_long_number("1234567890a"));
        assert!(!classifier.is_long_number(""));
    }

    #[test]
    fn ordinary_values_pass_through() {
        let decision = classifier().classify_and_coerce("42", false);
        assert_eq!(decision.value, CellValue::Text("42".into()));
        assert_eq!(decision.number_format, FormatDecision::Inherit);
        assert!(!decision.force_right_align);
    }

    #[test]
    fn amount_column_wins_over_long_number_rule() {
        let decision = classifier().classify_and_coerce("12345678901234", true);
        assert_eq!(decision.value, CellValue::Number(12345678901234.0));
        assert!(decision.force_right_align);
    }
}
