//! Hex-dump rendering for the wire logs.

/// Renders a nicely formatted table of the hexadecimal value of each octet,
/// eight per row:
///
/// ```text
///      0  1  2  3  4  5  6  7
///   0  56 41 00 03 45 6c 69
/// ```
pub fn hexdump(data: &[u8]) -> String {
    let mut lines = vec!["     0  1  2  3  4  5  6  7".to_string()];
    for (i, row) in data.chunks(8).enumerate() {
        let cells: Vec<String> = row.iter().map(|b| format!("{b:02x}")).collect();
        lines.push(format!("{:3}  {}", i * 8, cells.join(" ")));
    }
    lines.join("\n")
}
