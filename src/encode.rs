use std::fmt;

use crate::header::is_token_byte;
use crate::types::{Header, MultiPartFormData};

fn write_value(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    // A value containing `"` can only be written bare.
    if value.contains('"') {
        f.write_str(value)
    } else {
        write!(f, "\"{value}\"")
    }
}

/// Renders the header as a single line without terminator.
///
/// Names that are MIME tokens are written as `Name: first; key="value"`,
/// anything else as a bare `name; key="value"` list. A bare name containing
/// `:` or `;` does not read back as written: `a:b c` renders as `a:b c; k`,
/// which parses as the header `a`.
impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = !self.name.is_empty() && self.name.bytes().all(is_token_byte);
        f.write_str(&self.name)?;

        for (i, (key, value)) in self.attributes.iter().enumerate() {
            let sep = if field && i == 0 { ": " } else { "; " };
            f.write_str(sep)?;
            f.write_str(key)?;
            if let Some(value) = value {
                f.write_str("=")?;
                write_value(f, value)?;
            }
        }

        if field && self.attributes.is_empty() {
            f.write_str(":")?;
        }
        Ok(())
    }
}

impl MultiPartFormData {
    /// Serialize back into a multipart body with CRLF line endings.
    ///
    /// Payloads are written verbatim and directly followed by the next
    /// boundary marker, so `parse(&form.boundary, &form.to_bytes())` yields
    /// `form` again as long as no payload contains the marker, no value with
    /// a `"` is followed by another attribute, and no header name that is not
    /// a MIME token contains `:` or `;`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            for header in &part.headers {
                out.extend_from_slice(format!("{header}\r\n").as_bytes());
            }
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(&part.payload);
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}
