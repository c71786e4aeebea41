use clap::Parser;
use dupecmp::cli::Cli;
use dupecmp::digest::DigestFunction;
use dupecmp::error::ExitCode;
use dupecmp::output::ReportError;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn run(args: &[&str]) -> anyhow::Result<(ExitCode, String)> {
    let cli = Cli::try_parse_from(std::iter::once("dupecmp").chain(args.iter().copied())).unwrap();
    let mut out = Vec::new();
    let code = dupecmp::run_with_output(cli, &mut out)?;
    Ok((code, String::from_utf8(out).unwrap()))
}

fn fixture() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), vec![b'x'; 100]).unwrap();
    fs::write(dir.path().join("b"), vec![b'x'; 50]).unwrap();
    fs::write(dir.path().join("c"), b"hello world!").unwrap();
    fs::write(dir.path().join("d"), b"hello world!").unwrap();
    dir
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_default_report() {
    let dir = fixture();
    let root = dir.path();
    let (code, out) = run(&["-q", "-r", arg(root)]).unwrap();

    let digest = DigestFunction::Sha1.digest_bytes(b"hello world!").to_hex();
    let expected = format!(
        "2 files in cluster 1 (12 bytes, digest {})\n{}\n{}\n",
        digest,
        root.join("c").display(),
        root.join("d").display()
    );
    assert_eq!(code, ExitCode::Success);
    assert_eq!(out, expected);
}

#[test]
fn test_thorough_report_uses_thorough_header() {
    let dir = fixture();
    let (_, out) = run(&["-q", "-rt", arg(dir.path())]).unwrap();
    assert!(out.starts_with("2 files in cluster 1 (12 bytes)\n"));
}

#[test]
fn test_digest_in_thorough_header_is_usage_error() {
    let dir = fixture();
    let err = run(&["-q", "-rt", "-f", "%d", arg(dir.path())]).unwrap_err();

    assert!(err.downcast_ref::<ReportError>().is_some());
    assert_eq!(ExitCode::for_error(&err), ExitCode::UsageError);
}

#[test]
fn test_excess_null_terminated() {
    let dir = fixture();
    let root = dir.path();
    let (_, out) = run(&["-q", "-re0", arg(root)]).unwrap();
    assert_eq!(out, format!("{}\0", root.join("d").display()));
}

#[test]
fn test_custom_header_and_digest_function() {
    let dir = fixture();
    let (_, out) = run(&["-q", "-r", "-d", "sha256", "-f", "#%i %n %d", arg(dir.path())]).unwrap();

    let digest = DigestFunction::Sha256.digest_bytes(b"hello world!").to_hex();
    assert_eq!(out.lines().next().unwrap(), format!("#1 2 {}", digest));
}

#[test]
fn test_file_operands_without_recursion() {
    let dir = fixture();
    let root = dir.path();
    let (_, out) = run(&[
        "-q",
        "-f",
        "",
        arg(&root.join("a")),
        arg(&root.join("c")),
        arg(&root.join("b")),
        arg(&root.join("d")),
    ])
    .unwrap();

    assert_eq!(
        out,
        format!("{}\n{}\n", root.join("c").display(), root.join("d").display())
    );
}

#[test]
fn test_unreadable_operand_does_not_fail_run() {
    let dir = fixture();
    let missing = dir.path().join("missing");
    let (code, out) = run(&["-q", "-f", "", arg(&missing), arg(&dir.path().join("c"))]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(out.is_empty());
}

#[test]
fn test_ignore_empty() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("e1"), b"").unwrap();
    fs::write(dir.path().join("e2"), b"").unwrap();

    let (_, out) = run(&["-q", "-r", "-f", "%s", arg(dir.path())]).unwrap();
    assert!(out.starts_with("0\n"));

    let (_, out) = run(&["-q", "-rz", arg(dir.path())]).unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_missing_config_file_is_usage_error() {
    let dir = fixture();
    let config = dir.path().join("absent.toml");
    let err = run(&["-q", "--config", arg(&config), arg(dir.path())]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::UsageError);
}

#[test]
fn test_config_file_selects_digest() {
    let dir = fixture();
    let config = tempdir().unwrap();
    let config_path = config.path().join("config.toml");
    fs::write(&config_path, "digest = \"sha512\"\nquiet = true\n").unwrap();

    let (_, out) = run(&["--config", arg(&config_path), "-r", "-f", "%d", arg(dir.path())]).unwrap();
    let digest = DigestFunction::Sha512.digest_bytes(b"hello world!").to_hex();
    assert_eq!(out.lines().next().unwrap(), digest);
}

#[test]
fn test_config_file_enables_thorough_comparison() {
    let dir = fixture();
    fs::write(dir.path().join("e"), b"hello World!").unwrap();
    let config = tempdir().unwrap();
    let config_path = config.path().join("config.toml");
    fs::write(&config_path, "thorough = true\nquiet = true\ndigest = \"blake3\"\n").unwrap();

    let (_, out) = run(&["--config", arg(&config_path), "-r", arg(dir.path())]).unwrap();

    let root = dir.path();
    assert_eq!(
        out,
        format!(
            "2 files in cluster 1 (12 bytes)\n{}\n{}\n",
            root.join("c").display(),
            root.join("d").display()
        )
    );
}
