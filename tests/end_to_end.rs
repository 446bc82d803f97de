//! Pruebas de extremo a extremo: archivo `.jack` en disco -> `.xml` en disco,
//! pasando por toda la tubería (`driver::run`).

use jack_analyzer::driver;
use std::{fs, path::PathBuf};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "jack-analyzer-e2e-{}-{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn parses_a_single_file_into_a_sibling_xml() {
    let dir = scratch_dir("single-file");
    let input = dir.join("Main.jack");
    fs::write(&input, "class Main {\n  function void main() {\n    do Output.printInt(1);\n    return;\n  }\n}\n").unwrap();

    driver::run(&input, false).expect("processing should succeed");

    let output = dir.join("Main.xml");
    assert!(output.exists());

    let xml = fs::read_to_string(&output).unwrap();
    assert!(xml.starts_with("<class>\n"));
    assert!(xml.contains("<subroutineDec>"));
    assert!(xml.contains("<doStatement>"));
    assert!(xml.ends_with("</class>\n"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn leading_line_comment_does_not_change_the_parsed_tree() {
    let dir = scratch_dir("leading-comment");
    let input = dir.join("Y.jack");
    fs::write(&input, "// comment\nclass Y {}\n").unwrap();

    driver::run(&input, false).expect("processing should succeed");

    let xml = fs::read_to_string(dir.join("Y.xml")).unwrap();
    assert_eq!(
        xml,
        "<class>\n  <keyword>class</keyword>\n  <identifier>Y</identifier>\n  <symbol>{</symbol>\n  <symbol>}</symbol>\n</class>\n"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn token_test_mode_emits_flat_token_stream() {
    let dir = scratch_dir("token-test");
    let input = dir.join("Main.jack");
    fs::write(&input, "class Main {}\n").unwrap();

    driver::run(&input, true).expect("processing should succeed");

    let xml = fs::read_to_string(dir.join("Main.xml")).unwrap();
    assert!(xml.starts_with("<tokens>\n"));
    assert!(xml.ends_with("</tokens>\n"));
    assert!(xml.contains("<keyword>class</keyword>"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn a_malformed_file_leaves_no_output_behind() {
    let dir = scratch_dir("malformed");
    let input = dir.join("Broken.jack");
    fs::write(&input, "class 5 {}\n").unwrap();

    let result = driver::run(&input, false);
    assert!(result.is_err());

    assert!(!dir.join("Broken.xml").exists());
    assert!(!dir.join("Broken.xml.tmp").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn directory_mode_processes_every_jack_file_and_reports_failures() {
    let dir = scratch_dir("directory");
    fs::write(dir.join("Good.jack"), "class Good {}\n").unwrap();
    fs::write(dir.join("Bad.jack"), "class 5 {}\n").unwrap();
    fs::write(dir.join("notes.txt"), "not a jack file\n").unwrap();

    let result = driver::run(&dir, false);
    assert!(result.is_err(), "one bad file should make the run report failure");

    assert!(dir.join("Good.xml").exists());
    assert!(!dir.join("Bad.xml").exists());
    assert!(!dir.join("notes.xml").exists());

    let _ = fs::remove_dir_all(&dir);
}
