//! Mapping character offsets to human-readable line/column positions

/// Resolve a byte offset in `content` to a 1-based (line, column) pair plus
/// the text of that line with trailing terminators stripped.
///
/// Offsets at the exact end of the content resolve to the last line; empty
/// content resolves to (1, 1, "").
pub fn line_col(content: &str, offset: usize) -> (usize, usize, String) {
    let mut acc = 0usize;
    let mut last: Option<(usize, usize, &str)> = None;

    for (i, line) in content.split_inclusive('\n').enumerate() {
        let len = line.len();
        if acc + len > offset {
            let col = offset - acc + 1;
            return (i + 1, col, trim_terminator(line).to_string());
        }
        last = Some((i + 1, acc, line));
        acc += len;
    }

    // Offset at (or past) the end of content: report the last line.
    match last {
        Some((line_no, line_start, line)) => {
            let col = offset.saturating_sub(line_start) + 1;
            (line_no, col, trim_terminator(line).to_string())
        }
        None => (1, 1, String::new()),
    }
}

fn trim_terminator(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}
