use tracing::{debug, trace};

use crate::chunk;
use crate::error::ParseError;
use crate::header::parse_header;
use crate::segment::segment;
use crate::types::{MultiPartFormData, Part};

impl MultiPartFormData {
    pub fn parse(boundary: &str, input: &[u8]) -> Result<Self, ParseError> {
        parse(boundary, input)
    }
}

/// Parse a complete multipart/form-data body.
///
/// `boundary` is the bare token from the `Content-Type` header, without the
/// leading `--`. The first failure aborts the whole parse; nothing is
/// returned for the parts that were valid.
pub fn parse(boundary: &str, input: &[u8]) -> Result<MultiPartFormData, ParseError> {
    let chunks = segment(boundary, input)?;

    let mut parts = Vec::with_capacity(chunks.len());
    for (index, bytes) in chunks.into_iter().enumerate() {
        parts.push(assemble_part(index, bytes)?);
    }

    debug!(
        parts = parts.len(),
        bytes = input.len(),
        "parsed multipart body"
    );

    Ok(MultiPartFormData {
        boundary: boundary.to_owned(),
        parts,
    })
}

fn assemble_part(index: usize, bytes: &[u8]) -> Result<Part, ParseError> {
    let raw = chunk::split(bytes).map_err(|_| ParseError::MalformedChunk { chunk: index })?;

    let headers = raw
        .header_lines
        .iter()
        .enumerate()
        .map(|(line, text)| {
            parse_header(text).map_err(|source| ParseError::MalformedHeader {
                chunk: index,
                line,
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    trace!(
        chunk = index,
        headers = headers.len(),
        payload_len = raw.payload.len(),
        "assembled part"
    );

    Ok(Part {
        headers,
        payload: raw.payload.to_vec(),
    })
}
