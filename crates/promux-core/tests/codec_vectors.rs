//! Exposition codec vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use promux_core::exposition::{decode, encode};

use vector_loader::{load, sorted_lines};

#[test]
fn valid_vectors_encode_and_round_trip() {
    let files = [
        "untyped_mixed.json",
        "histogram.json",
        "histogram_labelled.json",
        "histogram_missing_inf.json",
        "histogram_neg_inf.json",
        "summary.json",
        "counter_gauge_escapes.json",
        "special_floats.json",
    ];

    for f in files {
        let v = load(f);
        let decoded = decode(v.input.as_bytes())
            .unwrap_or_else(|e| panic!("vector={}: decode failed: {e}", v.description));

        let encoded = encode(&decoded).expect("encode");
        let text = String::from_utf8(encoded.clone()).expect("utf-8 output");
        assert!(text.ends_with('\n'), "vector={}", v.description);

        let mut expected = v.expect_lines.clone().expect("missing expect_lines");
        expected.sort();
        assert_eq!(sorted_lines(&text), expected, "vector={}", v.description);

        if !v.skip_round_trip {
            let again = decode(&encoded).expect("re-decode");
            assert_eq!(again, decoded, "vector={}", v.description);
        }
    }
}

#[test]
fn invalid_vectors_report_decode_errors() {
    let files = [
        "err_empty.json",
        "err_random_words.json",
        "err_duplicate_label.json",
        "err_bad_value.json",
        "err_type_after_samples.json",
        "err_second_type.json",
        "err_unknown_type.json",
        "err_bad_escape.json",
        "err_bad_help_escape.json",
        "err_unterminated_labels.json",
        "err_summary_without_quantile.json",
        "err_bad_timestamp.json",
    ];

    for f in files {
        let v = load(f);
        let ex = v.expect_error.expect("missing expect_error block");
        let err = decode(v.input.as_bytes()).expect_err("expected decode error");
        assert_eq!(err.kind().as_str(), ex.kind, "vector={}", v.description);
        assert!(
            err.to_string().contains(&ex.contains),
            "vector={}: {err} does not mention {:?}",
            v.description,
            ex.contains
        );
    }
}
