//! Golden tests for result classification and barcode decoding.
//!
//! These tests verify the qualitative result rules against known analyzer
//! output strings.

use labsync_core::barcode::patient_id_from_barcode;
use labsync_core::mapper::{DetectionPolicy, ResultPolicy};
use labsync_core::AnalyteRow;
use proptest::prelude::*;

/// Test case from golden file.
struct GoldenCase {
    id: &'static str,
    result_text: &'static str,
    expected: Option<&'static str>,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "not-detected-basic",
            result_text: "MTB NOT DETECTED|NEG",
            expected: Some("NORMAL"),
        },
        GoldenCase {
            id: "not-detected-lowercase",
            result_text: "mtb not detected|neg",
            expected: Some("NORMAL"),
        },
        GoldenCase {
            id: "not-detected-padded",
            result_text: " MTB  NOT  DETECTED |neg",
            expected: Some("NORMAL"),
        },
        GoldenCase {
            id: "not-detected-no-delimiter",
            result_text: "MTB NOT DETECTED",
            expected: Some("NORMAL"),
        },
        GoldenCase {
            id: "detected-high",
            result_text: "MTB DETECTED HIGH|POSITIVE",
            expected: Some("POSITIVE"),
        },
        GoldenCase {
            id: "detected-trace",
            result_text: "MTB DETECTED TRACE|TRACE",
            expected: Some("TRACE"),
        },
        GoldenCase {
            id: "second-segment-verbatim",
            result_text: "A|B",
            expected: Some("B"),
        },
        GoldenCase {
            id: "extra-delimiters-kept-verbatim",
            result_text: "RIF RESISTANCE|INDETERMINATE|SEE NOTE",
            expected: Some("INDETERMINATE|SEE NOTE"),
        },
        GoldenCase {
            id: "no-second-segment",
            result_text: "INVALID",
            expected: None,
        },
        GoldenCase {
            id: "empty-text",
            result_text: "",
            expected: None,
        },
    ]
}

fn row_with_result(text: &str) -> AnalyteRow {
    AnalyteRow {
        test_id: 1,
        patient_id: "058246".into(),
        sample_id: None,
        analyte_name: "MTB".into(),
        cycle_threshold: None,
        endpoint: None,
        analyte_result: Some(text.to_owned()),
        probe_check_result: None,
    }
}

#[test]
fn golden_classification_cases() {
    let policy = DetectionPolicy::default();

    for case in get_golden_cases() {
        let value = policy.result_value(&row_with_result(case.result_text));
        assert_eq!(
            value.as_deref(),
            case.expected,
            "case {} failed for input {:?}",
            case.id,
            case.result_text
        );
    }
}

proptest! {
    #[test]
    fn decodes_any_plain_identifier(id in "[A-Za-z0-9][A-Za-z0-9_-]{0,30}") {
        let payload = format!(r#"<barcode data-barcode-value="{id}"/>"#);
        prop_assert_eq!(patient_id_from_barcode(&payload).unwrap(), id);
    }

    #[test]
    fn non_sentinel_text_yields_second_segment(
        first in "[A-Za-z0-9 ]{1,20}",
        second in "[A-Za-z0-9]{1,20}",
    ) {
        let canonical: String = first
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();
        prop_assume!(canonical != "MTBNOTDETECTED");

        let policy = DetectionPolicy::default();
        let value = policy.result_value(&row_with_result(&format!("{first}|{second}")));
        prop_assert_eq!(value.as_deref(), Some(second.as_str()));
    }

    #[test]
    fn sentinel_is_immune_to_case_and_spacing(spaces in 0usize..4) {
        let padding = " ".repeat(spaces);
        let text = format!("{padding}mtb NOT detected{padding}|ignored");
        let policy = DetectionPolicy::default();
        let row = row_with_result(&text);
        let value = policy.result_value(&row);
        prop_assert_eq!(value.as_deref(), Some("NORMAL"));
    }
}
