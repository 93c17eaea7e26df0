//! Subject Rewriter - Inserts a prefix into the Subject header

const SUBJECT_HEADER: &[u8] = b"Subject: ";

/// Return a copy of `data` with `prefix` and a space inserted right after
/// the first `Subject: ` header.
///
/// Only the header block (everything before the first empty line) is
/// scanned. The match is case-sensitive and must start a line; folded
/// continuation lines are left as they are. Without such a header the
/// message is returned unchanged.
pub fn prepend_subject(data: &[u8], prefix: &str) -> Vec<u8> {
    match find_subject_value(data) {
        Some(offset) => {
            let mut out = Vec::with_capacity(data.len() + prefix.len() + 1);
            out.extend_from_slice(&data[..offset]);
            out.extend_from_slice(prefix.as_bytes());
            out.push(b' ');
            out.extend_from_slice(&data[offset..]);
            out
        }
        None => data.to_vec(),
    }
}

/// Byte offset of the Subject value, i.e. just past `Subject: `
fn find_subject_value(data: &[u8]) -> Option<usize> {
    let mut line_start = 0;

    while line_start < data.len() {
        let rest = &data[line_start..];
        let line_len = rest
            .iter()
            .position(|&b| b == b'\n')
            .map_or(rest.len(), |i| i + 1);
        let line = &rest[..line_len];

        // Header/body separator
        if matches!(line, b"\n" | b"\r\n") {
            return None;
        }

        if line.starts_with(SUBJECT_HEADER) {
            return Some(line_start + SUBJECT_HEADER.len());
        }

        line_start += line_len;
    }

    None
}
