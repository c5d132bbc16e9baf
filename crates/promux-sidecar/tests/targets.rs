#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use promux_sidecar::targets::{Target, TargetSet};

const NONE: &[&str] = &[];

#[test]
fn parses_repeated_and_comma_separated_entries() {
    let set = TargetSet::from_mappings(&["c1:8080,c2:8081", " c3:9000 "], NONE).unwrap();
    assert_eq!(set.len(), 3);
    assert_eq!(set.get("c1"), Some(Target::new("c1", 8080)));
    assert_eq!(set.get("c2"), Some(Target::new("c2", 8081)));
    assert_eq!(set.get("c3"), Some(Target::new("c3", 9000)));
    assert_eq!(set.get("c4"), None);
}

#[test]
fn malformed_entries_are_config_errors() {
    let cases = [
        ("c1", "exactly two fields"),
        ("c1:80:90", "exactly two fields"),
        (":8080", "missing container name"),
        ("c1:", "missing port"),
        ("c1:http", "invalid port"),
        ("c1:70000", "invalid port"),
    ];
    for (entry, expected) in cases {
        let err = TargetSet::from_mappings(&[entry], NONE).expect_err(entry);
        assert_eq!(err.kind().as_str(), "CONFIG");
        assert!(err.to_string().contains(expected), "{entry}: {err}");
    }
}

#[test]
fn empty_list_is_rejected() {
    let err = TargetSet::from_mappings(NONE, NONE).unwrap_err();
    assert!(err.to_string().contains("empty container:port list"));

    let err = TargetSet::from_mappings(&[" , "], NONE).unwrap_err();
    assert!(err.to_string().contains("empty container:port list"));
}

#[test]
fn duplicate_names_are_rejected() {
    let err = TargetSet::from_mappings(&["c1:1", "c1:2"], NONE).unwrap_err();
    assert!(err.to_string().contains("duplicate container name"));
}

#[test]
fn exclusions_remove_targets() {
    let set = TargetSet::from_mappings(&["c1:1,c2:2,c3:3"], &["c2", "unknown"]).unwrap();
    let mut names: Vec<&str> = set.names().collect();
    names.sort_unstable();
    assert_eq!(names, ["c1", "c3"]);
    assert_eq!(set.unmatched_exclusions(), ["unknown".to_string()]);
}

#[test]
fn matched_exclusions_are_not_reported() {
    let set = TargetSet::from_mappings(&["c1:1", "c2:2"], &["c2"]).unwrap();
    assert!(set.unmatched_exclusions().is_empty());
    assert_eq!(set.len(), 1);
}

#[test]
fn excluding_everything_is_rejected() {
    let err = TargetSet::from_mappings(&["c1:1", "c2:2"], &["c1,c2"]).unwrap_err();
    assert_eq!(err.kind().as_str(), "CONFIG");
    assert!(err.to_string().contains("every mapped container is excluded"));
}
