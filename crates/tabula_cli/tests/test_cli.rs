use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const TABLE: &str = "GO\tNS\tdepth\tp\n\
GO:0008150\tBP\t0\t0.5\n\
GO:0003674\tMF\t0\t0.01\n\
GO:0006412\tBP\t4\t0.002\n";

fn tabula(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tabula"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to run tabula")
}

fn write_input(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn test_tsv_to_stdout_sorted_and_filtered() {
    let tmp = tempfile::tempdir().expect("Failed to create tempdir");
    let input = write_input(tmp.path(), "terms.tsv", TABLE);
    let output = tabula(&[
        input.to_str().unwrap(),
        "--tsv",
        "--filter",
        "NS=BP",
        "--sort-by",
        "p",
    ]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "GO\tNS\tdepth\tp\nGO:0006412\tBP\t4\t0.002\nGO:0008150\tBP\t0\t0.5\n"
    );
}

#[test]
fn test_tsv_file_with_layout() {
    let tmp = tempfile::tempdir().expect("Failed to create tempdir");
    let input = write_input(tmp.path(), "terms.tsv", TABLE);
    let layout = write_input(
        tmp.path(),
        "layout.json",
        r#"{"columns": ["GO", "p"], "separator": ",", "field_formats": {"p": "{:.1e}"}}"#,
    );
    let out = tmp.path().join("out.csv");
    let output = tabula(&[
        input.to_str().unwrap(),
        "--layout",
        layout.to_str().unwrap(),
        &format!("--tsv={}", out.display()),
    ]);
    assert!(output.status.success());
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "GO,p\nGO:0008150,5.0e-01\nGO:0003674,1.0e-02\nGO:0006412,2.0e-03\n"
    );
    assert_eq!(
        stdout(&output),
        format!("      3 items WROTE: {}\n", out.display())
    );
}

#[test]
fn test_bare_tsv_before_input() {
    let tmp = tempfile::tempdir().expect("Failed to create tempdir");
    let input = write_input(tmp.path(), "terms.tsv", TABLE);
    let output = tabula(&["--tsv", input.to_str().unwrap(), "--sort-by", "p"]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("GO\tNS\tdepth\tp\nGO:0006412\t"));
    assert_eq!(std::fs::read_to_string(&input).unwrap(), TABLE);
}

#[test]
fn test_xlsx_written() {
    let tmp = tempfile::tempdir().expect("Failed to create tempdir");
    let input = write_input(tmp.path(), "terms.tsv", TABLE);
    let out = tmp.path().join("terms.xlsx");
    let output = tabula(&[input.to_str().unwrap(), "--xlsx", out.to_str().unwrap()]);
    assert!(output.status.success());
    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(&bytes[0..2], b"PK");
    assert!(stdout(&output).ends_with("terms.xlsx\n"));
}

#[test]
fn test_text_with_header() {
    let tmp = tempfile::tempdir().expect("Failed to create tempdir");
    let input = write_input(tmp.path(), "terms.csv", "name,score\na,0.5\nb,0.25\n");
    let output = tabula(&[
        input.to_str().unwrap(),
        "--text={name:4} {score:5.2f}",
        "--header",
    ]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "#name score\na     0.50\nb     0.25\n");
}

#[test]
fn test_empty_table_reports_skip() {
    let tmp = tempfile::tempdir().expect("Failed to create tempdir");
    let input = write_input(tmp.path(), "empty.csv", "name,score\n");
    let out = tmp.path().join("empty.xlsx");
    let output = tabula(&[input.to_str().unwrap(), "--xlsx", out.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(!out.exists());
    assert_eq!(
        stdout(&output),
        format!("      0 items. NOT WRITING {}\n", out.display())
    );
}

#[test]
fn test_mismatched_template_fails() {
    let tmp = tempfile::tempdir().expect("Failed to create tempdir");
    let input = write_input(tmp.path(), "terms.csv", "name,score\na,0.5\n");
    let layout = write_input(
        tmp.path(),
        "layout.json",
        r#"{"text_template": "{name} {depth}\n", "expected_fields": ["name", "score"]}"#,
    );
    let output = tabula(&[
        input.to_str().unwrap(),
        "--layout",
        layout.to_str().unwrap(),
        "--text",
    ]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("ERROR--> depth"));
}

#[test]
fn test_missing_input_fails() {
    let output = tabula(&["/no/such/input.csv", "--tsv"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("/no/such/input.csv"));
}
