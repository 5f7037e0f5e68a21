use recdupe::detect::{Detection, DetectionSummary, DuplicateDetector, MasterRule, MatchingRule, Strategy};
use recdupe::error::ExitCode;
use recdupe::loader;
use recdupe::output::{CsvOutput, JsonOutput, TextOutput};

/// Run the full pipeline: raw bytes through the loader into the detector.
fn detect_bytes(
    name: &str,
    bytes: &[u8],
    match_fields: &[&str],
    master_field: &str,
    strategy: Strategy,
) -> (Vec<Detection>, DetectionSummary) {
    let records = loader::load_named(name, bytes).unwrap();
    let detector = DuplicateDetector::new(
        MatchingRule::new(match_fields.iter().copied()).unwrap(),
        MasterRule::new(master_field, strategy).unwrap(),
    );
    detector.detect_with_summary(records).unwrap()
}

#[test]
fn test_csv_to_text_pipeline() {
    let input = b"email,score\na@x.io,1\nb@x.io,5\na@x.io,9\n";
    let (detections, _) = detect_bytes("in.csv", input, &["email"], "score", Strategy::Highest);

    yansi::disable();
    let text = TextOutput::new(&detections).to_string().unwrap();

    // CSV fields are text, so "9" beats "1" lexicographically.
    let expected = "Match key: (a@x.io)\n\
                    Master record: {email: a@x.io, score: 9}\n\
                    Duplicates:\n\
                    \x20 {email: a@x.io, score: 1}\n\
                    \x20 {email: a@x.io, score: 9}\n\
                    -\n";
    assert_eq!(text, expected);
}

#[test]
fn test_text_summary_counts_come_from_full_input() {
    let input = b"email,score\na@x.io,1\nb@x.io,5\na@x.io,9\n";
    let (detections, summary) =
        detect_bytes("in.csv", input, &["email"], "score", Strategy::Highest);

    yansi::disable();
    let text = TextOutput::new(&detections)
        .with_summary(&summary)
        .to_string()
        .unwrap();

    assert!(text.contains("3 record(s) in 2 group(s)"));
    assert!(text.contains("1 duplicate group(s), 2 duplicate record(s) (66.7%)"));
}

#[test]
fn test_json_to_json_pipeline() {
    let input = br#"[
        {"email": "a@x.io", "score": 1, "phone": null},
        {"email": "b@x.io", "score": 5},
        {"email": "a@x.io", "score": 9}
    ]"#;
    let (detections, summary) =
        detect_bytes("in.json", input, &["email"], "score", Strategy::Highest);

    let json = JsonOutput::new(&detections, &summary, ExitCode::Success)
        .to_json()
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let groups = value["duplicates"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["match_key"], serde_json::json!(["a@x.io"]));
    // JSON input keeps numbers typed, so 9 beats 1 numerically.
    assert_eq!(groups[0]["master"]["score"], serde_json::json!(9.0));
    // Input null round-trips as null.
    assert!(groups[0]["duplicates"][0]["phone"].is_null());

    assert_eq!(value["summary"]["total_records"], serde_json::json!(3));
    assert_eq!(value["summary"]["duplicate_groups"], serde_json::json!(1));
    assert_eq!(value["summary"]["exit_code"], serde_json::json!(0));
    assert_eq!(value["summary"]["exit_code_name"], serde_json::json!("DQ000"));
}

#[test]
fn test_json_output_reports_no_duplicates() {
    let input = b"email,score\na@x.io,1\nb@x.io,5\n";
    let (detections, summary) =
        detect_bytes("in.csv", input, &["email"], "score", Strategy::Highest);
    assert!(detections.is_empty());

    let json = JsonOutput::new(&detections, &summary, ExitCode::NoDuplicates)
        .to_json()
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["duplicates"], serde_json::json!([]));
    assert_eq!(value["summary"]["exit_code"], serde_json::json!(2));
    assert_eq!(value["summary"]["exit_code_name"], serde_json::json!("DQ002"));
    assert_eq!(value["summary"]["unique_records"], serde_json::json!(2));
}

#[test]
fn test_pretty_json_is_indented() {
    let input = b"email,score\na@x.io,1\na@x.io,9\n";
    let (detections, summary) =
        detect_bytes("in.csv", input, &["email"], "score", Strategy::Highest);

    let output = JsonOutput::new(&detections, &summary, ExitCode::Success);
    let compact = output.to_json().unwrap();
    let pretty = output.to_json_pretty().unwrap();

    assert!(!compact.contains('\n'));
    assert!(pretty.contains("\n  \"duplicates\""));
    // Both render the same value.
    let a: serde_json::Value = serde_json::from_str(&compact).unwrap();
    let b: serde_json::Value = serde_json::from_str(&pretty).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_csv_output_end_to_end() {
    let input = b"email,score\na@x.io,9\nb@x.io,5\na@x.io,1\n";
    let (detections, _) = detect_bytes("in.csv", input, &["email"], "score", Strategy::Highest);

    let csv = CsvOutput::new(&detections).to_string().unwrap();
    let expected = "group_id,match_key,is_master,email,score\n\
                    1,(a@x.io),true,a@x.io,9\n\
                    1,(a@x.io),false,a@x.io,1\n";
    assert_eq!(csv, expected);
}

#[test]
fn test_csv_output_pads_ragged_records() {
    let input = br#"[
        {"email": "a@x.io", "score": 2, "nickname": "Ann"},
        {"email": "a@x.io", "score": 7}
    ]"#;
    let (detections, _) = detect_bytes("in.json", input, &["email"], "score", Strategy::Highest);

    let csv = CsvOutput::new(&detections).to_string().unwrap();
    // Field columns are the sorted union; the second record has no
    // nickname, so its cell stays empty.
    let expected = "group_id,match_key,is_master,email,nickname,score\n\
                    1,(a@x.io),false,a@x.io,Ann,2\n\
                    1,(a@x.io),true,a@x.io,,7\n";
    assert_eq!(csv, expected);
}

#[test]
fn test_csv_output_flags_one_master_per_group() {
    let input = b"email,score\na@x.io,5\na@x.io,5\nb@x.io,3\nb@x.io,3\n";
    let (detections, _) = detect_bytes("in.csv", input, &["email"], "score", Strategy::Highest);
    assert_eq!(detections.len(), 2);

    let csv = CsvOutput::new(&detections).to_string().unwrap();
    // Identical records tie with the master; the flag lands on the first.
    let masters = csv.lines().filter(|line| line.contains(",true,")).count();
    assert_eq!(masters, 2);
}
