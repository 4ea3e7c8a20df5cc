use std::io::Write;
use tempfile::NamedTempFile;

/// Writes a JSON-lines ops file for the CLI under test.
pub fn ops_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

/// Parses CLI stdout back into one JSON value per outcome line.
#[allow(dead_code)]
pub fn outcomes(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("outcome line is JSON"))
        .collect()
}
