use std::fmt;

/// One part's bytes split at the blank line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk<'a> {
    /// Header lines with their terminators stripped.
    pub header_lines: Vec<&'a [u8]>,
    pub payload: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingSeparator;

impl fmt::Display for MissingSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no blank line between headers and payload")
    }
}

impl std::error::Error for MissingSeparator {}

/// Split a chunk into header lines and payload at the first empty line.
///
/// Lines end at `\n`, with an optional `\r` in front. Everything after the
/// empty line is returned untouched.
pub fn split(chunk: &[u8]) -> Result<RawChunk<'_>, MissingSeparator> {
    let mut header_lines = Vec::new();
    let mut pos = 0;

    loop {
        let newline = memchr::memchr(b'\n', &chunk[pos..]).ok_or(MissingSeparator)?;
        let line = &chunk[pos..pos + newline];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        pos += newline + 1;

        if line.is_empty() {
            return Ok(RawChunk {
                header_lines,
                payload: &chunk[pos..],
            });
        }
        header_lines.push(line);
    }
}
