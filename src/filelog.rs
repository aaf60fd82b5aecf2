use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/**
 * @brief Append a single line to the audit log, creating the file if missing.
 * @param path Path to the log file.
 * @param line Text line to append.
 */
pub fn write_line(path: impl AsRef<Path>, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)
}
