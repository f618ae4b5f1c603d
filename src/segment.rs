use memchr::memmem;
use tracing::{debug, trace};

use crate::error::{InputError, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Delimiter,
    Terminal,
}

pub(crate) fn validate_boundary(boundary: &str) -> Result<(), ParseError> {
    if boundary.is_empty() || boundary.bytes().any(|b| b == b'\r' || b == b'\n') {
        return Err(ParseError::EmptyBoundary);
    }
    Ok(())
}

/// Length of the line terminator at the start of `rest`, CRLF winning over LF.
fn terminator_len(rest: &[u8]) -> Option<usize> {
    if rest.starts_with(b"\r\n") {
        Some(2)
    } else if rest.starts_with(b"\n") {
        Some(1)
    } else {
        None
    }
}

/// Find the next boundary marker at or after `from`.
///
/// Returns `(marker_start, marker_end, kind)`. An occurrence of `--boundary`
/// followed by neither a terminator nor `--` is ordinary content.
fn find_marker(
    finder: &memmem::Finder<'_>,
    input: &[u8],
    mut from: usize,
) -> Option<(usize, usize, Marker)> {
    loop {
        let start = from + finder.find(&input[from..])?;
        let after = start + finder.needle().len();
        let rest = &input[after..];

        if let Some(n) = terminator_len(rest) {
            return Some((start, after + n, Marker::Delimiter));
        }
        if rest.starts_with(b"--") {
            let end = after + 2;
            let n = terminator_len(&input[end..]).unwrap_or(0);
            return Some((start, end + n, Marker::Terminal));
        }

        trace!(offset = start, "boundary text not followed by terminator, skipping");
        from = start + 1;
    }
}

/// Split a buffered multipart body into the raw bytes of each part.
///
/// Each returned slice starts right after a `--boundary` line and ends right
/// before the next marker, so the line terminator preceding a marker stays
/// with the part. Preamble and epilogue bytes are dropped.
pub fn segment<'a>(boundary: &str, input: &'a [u8]) -> Result<Vec<&'a [u8]>, ParseError> {
    validate_boundary(boundary)?;

    let dash_boundary = format!("--{boundary}");
    let finder = memmem::Finder::new(dash_boundary.as_bytes());

    let mut pos = match find_marker(&finder, input, 0) {
        None => return Err(InputError::NoOpeningBoundary.into()),
        Some((_, _, Marker::Terminal)) => return Err(InputError::NoChunks.into()),
        Some((start, end, Marker::Delimiter)) => {
            if start > 0 {
                debug!(preamble_bytes = start, "skipping preamble");
            }
            end
        }
    };

    let mut chunks = Vec::new();
    loop {
        let Some((start, end, marker)) = find_marker(&finder, input, pos) else {
            debug!(
                chunks = chunks.len(),
                "input ended without terminal boundary"
            );
            return Err(InputError::NoTerminalBoundary.into());
        };

        trace!(chunk = chunks.len(), offset = pos, len = start - pos, "found chunk");
        chunks.push(&input[pos..start]);
        pos = end;

        if marker == Marker::Terminal {
            break;
        }
    }

    if pos < input.len() {
        debug!(epilogue_bytes = input.len() - pos, "ignoring epilogue");
    }

    Ok(chunks)
}
