use std::fmt;

/// Why the outer framing of a multipart body was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    NoOpeningBoundary,
    NoTerminalBoundary,
    NoChunks,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::NoOpeningBoundary => f.write_str("no opening boundary"),
            InputError::NoTerminalBoundary => f.write_str("no terminal boundary before end of input"),
            InputError::NoChunks => f.write_str("no parts between boundaries"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderErrorKind {
    /// No key could be read for the leading header name.
    MissingName,
    /// `=` without a key in front of it, or an empty attribute key.
    MissingKey,
    /// Something other than `;` after a closing quote, or a value on a bare
    /// header name (`form-data=x`).
    TrailingBytes,
}

/// Header line grammar violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderError {
    kind: HeaderErrorKind,
    offset: usize,
}

impl HeaderError {
    pub(crate) fn new(kind: HeaderErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    pub fn kind(&self) -> HeaderErrorKind {
        self.kind
    }

    /// Byte offset into the header line where the violation was detected.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            HeaderErrorKind::MissingName => "missing header name",
            HeaderErrorKind::MissingKey => "missing attribute key",
            HeaderErrorKind::TrailingBytes => "unexpected trailing bytes",
        };
        write!(f, "{what} at byte {}", self.offset)
    }
}

impl std::error::Error for HeaderError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    EmptyBoundary,
    MalformedInput(InputError),
    MalformedChunk {
        chunk: usize,
    },
    MalformedHeader {
        chunk: usize,
        line: usize,
        source: HeaderError,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyBoundary => {
                f.write_str("boundary is empty or contains a line terminator")
            }
            ParseError::MalformedInput(e) => write!(f, "malformed multipart input: {e}"),
            ParseError::MalformedChunk { chunk } => {
                write!(f, "part {chunk}: no blank line between headers and payload")
            }
            ParseError::MalformedHeader {
                chunk,
                line,
                source,
            } => write!(f, "part {chunk}, header line {line}: {source}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::MalformedHeader { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<InputError> for ParseError {
    fn from(e: InputError) -> Self {
        ParseError::MalformedInput(e)
    }
}
