mod common;

use assert_cmd::cargo_bin;
use common::{ops_file, outcomes};
use std::process::Command;

#[test]
fn test_trashed_course_frees_its_name() {
    let file = ops_file(&[
        r#"{"op":"create_course","name":"Kotlin","description":"first","price":"150"}"#,
        r#"{"op":"create_course","name":"Kotlin","description":"clone","price":"200"}"#,
        r#"{"op":"trash_course","id":1}"#,
        r#"{"op":"create_course","name":"Kotlin","description":"second","price":"200"}"#,
        r#"{"op":"list_courses"}"#,
        r#"{"op":"get_course","id":1}"#,
    ]);

    let mut cmd = Command::new(cargo_bin!("coursebill"));
    cmd.arg(file.path());

    let output = cmd.output().expect("failed to run coursebill");
    assert!(output.status.success());

    let lines = outcomes(&output.stdout);
    assert_eq!(lines[0]["ok"]["id"], 1);
    assert_eq!(lines[1]["error"]["kind"], "already_exists");
    assert_eq!(lines[2]["ok"]["deleted"], true);
    // The replacement gets a fresh id; trashed ids are never reused.
    assert_eq!(lines[3]["ok"]["id"], 2);
    assert_eq!(lines[4]["ok"].as_array().unwrap().len(), 1);
    // Live read path no longer sees the trashed row.
    assert_eq!(lines[5]["error"]["kind"], "not_found");
}

#[test]
fn test_restore_brings_a_course_back_to_listings() {
    let file = ops_file(&[
        r#"{"op":"create_course","name":"Rust","description":"systems","price":"180"}"#,
        r#"{"op":"trash_course","id":1}"#,
        r#"{"op":"list_courses"}"#,
        r#"{"op":"restore_course","id":1}"#,
        r#"{"op":"list_courses"}"#,
        r#"{"op":"restore_course","id":99}"#,
    ]);

    let mut cmd = Command::new(cargo_bin!("coursebill"));
    cmd.arg(file.path());

    let output = cmd.output().expect("failed to run coursebill");
    let lines = outcomes(&output.stdout);
    assert_eq!(lines[2]["ok"].as_array().unwrap().len(), 0);
    assert_eq!(lines[3]["ok"]["deleted"], false);
    assert_eq!(lines[4]["ok"].as_array().unwrap().len(), 1);
    assert_eq!(lines[5]["error"]["kind"], "not_found");
}
