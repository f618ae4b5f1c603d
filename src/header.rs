use crate::error::{HeaderError, HeaderErrorKind};
use crate::types::Header;

struct Cursor<'a> {
    line: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a [u8]) -> Self {
        Cursor { line, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.line.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.line.len()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.line[start..self.pos]
    }

    fn take_rest(&mut self) -> &'a [u8] {
        let rest = &self.line[self.pos..];
        self.pos = self.line.len();
        rest
    }

    fn error(&self, kind: HeaderErrorKind) -> HeaderError {
        HeaderError::new(kind, self.pos)
    }
}

fn bytes_to_string(b: &[u8]) -> String {
    match std::str::from_utf8(b) {
        Ok(s) => s.to_owned(),
        Err(_) => String::from_utf8_lossy(b).into_owned(),
    }
}

fn is_key_byte(b: u8) -> bool {
    b != b'=' && b != b';'
}

pub(crate) fn is_token_byte(b: u8) -> bool {
    b.is_ascii_graphic() && !matches!(b, b':' | b';' | b'=' | b'"')
}

/// `Content-Disposition` in `Content-Disposition: form-data; ...`.
fn field_name(line: &[u8]) -> Option<&[u8]> {
    let len = line.iter().position(|&b| !is_token_byte(b))?;
    (len > 0 && line[len] == b':').then(|| &line[..len])
}

fn attribute(cur: &mut Cursor<'_>) -> Result<(String, Option<String>), HeaderError> {
    let key_start = cur.pos;
    let key = cur.take_while(is_key_byte);
    if key.is_empty() {
        return Err(HeaderError::new(HeaderErrorKind::MissingKey, key_start));
    }
    if !cur.eat(b'=') {
        return Ok((bytes_to_string(key), None));
    }

    let open = cur.pos;
    let value = if cur.eat(b'"') {
        let value = cur.take_while(|b| b != b'"');
        if cur.eat(b'"') {
            if !cur.at_end() && cur.peek() != Some(b';') {
                return Err(cur.error(HeaderErrorKind::TrailingBytes));
            }
            value
        } else {
            // No closing quote: the opening one is part of an unquoted value.
            cur.pos = open;
            cur.take_rest()
        }
    } else {
        cur.take_rest()
    };

    Ok((bytes_to_string(key), Some(bytes_to_string(value))))
}

fn attributes(cur: &mut Cursor<'_>, header: &mut Header) -> Result<(), HeaderError> {
    while cur.eat(b';') {
        cur.eat(b' ');
        if cur.at_end() {
            break;
        }
        header.attributes.push(attribute(cur)?);
    }
    if !cur.at_end() {
        return Err(cur.error(HeaderErrorKind::TrailingBytes));
    }
    Ok(())
}

/// Parse one header line (terminator already stripped).
///
/// Two shapes are accepted:
///
/// - `Name: first; key=value; key="quoted"`: a MIME header line. `Name` is
///   the header name and everything after the colon is attributes, `first`
///   included.
/// - `first; key=value`: a bare parameter list. `first` is the header name.
///
/// One space after `;` (and after the colon) is skipped. Quoted values end at
/// the next `"` with no escape processing, and an unquoted value runs to the
/// end of the line. A `"` that is never closed does not start a quoted value;
/// the value is then unquoted and keeps the `"`.
pub fn parse_header(line: &[u8]) -> Result<Header, HeaderError> {
    let mut cur = Cursor::new(line);

    if let Some(name) = field_name(line) {
        let mut header = Header::new(bytes_to_string(name));
        cur.pos = name.len() + 1;
        cur.eat(b' ');
        if !cur.at_end() {
            header.attributes.push(attribute(&mut cur)?);
            attributes(&mut cur, &mut header)?;
        }
        return Ok(header);
    }

    let name = cur.take_while(is_key_byte);
    if name.is_empty() {
        let kind = if cur.peek() == Some(b'=') {
            HeaderErrorKind::MissingKey
        } else {
            HeaderErrorKind::MissingName
        };
        return Err(cur.error(kind));
    }

    let mut header = Header::new(bytes_to_string(name));
    attributes(&mut cur, &mut header)?;
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(h: &Header) -> Vec<(&str, Option<&str>)> {
        h.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
            .collect()
    }

    fn err_kind(line: &[u8]) -> HeaderErrorKind {
        parse_header(line).unwrap_err().kind()
    }

    #[test]
    fn content_disposition_line() {
        let h = parse_header(b"Content-Disposition: form-data; name=\"f\"").unwrap();
        assert_eq!(h.name, "Content-Disposition");
        assert_eq!(attrs(&h), vec![("form-data", None), ("name", Some("f"))]);
    }

    #[test]
    fn bare_parameter_list() {
        let h = parse_header(b"form-data; name=\"a\"; filename=\"b.txt\"").unwrap();
        assert_eq!(h.name, "form-data");
        assert_eq!(
            attrs(&h),
            vec![("name", Some("a")), ("filename", Some("b.txt"))]
        );
    }

    #[test]
    fn name_only() {
        let h = parse_header(b"form-data").unwrap();
        assert_eq!(h.name, "form-data");
        assert!(h.attributes.is_empty());
    }

    #[test]
    fn content_type_line() {
        let h = parse_header(b"Content-Type: application/octet-stream").unwrap();
        assert_eq!(h.name, "Content-Type");
        assert_eq!(attrs(&h), vec![("application/octet-stream", None)]);
    }

    #[test]
    fn field_without_value() {
        let h = parse_header(b"X-Empty:").unwrap();
        assert_eq!(h.name, "X-Empty");
        assert!(h.attributes.is_empty());

        let h = parse_header(b"X-Empty: ").unwrap();
        assert!(h.attributes.is_empty());
    }

    #[test]
    fn field_colon_without_space() {
        let h = parse_header(b"Content-Type:text/plain").unwrap();
        assert_eq!(attrs(&h), vec![("text/plain", None)]);
    }

    #[test]
    fn colon_inside_value_is_not_a_field() {
        let h = parse_header(b"form-data; name=\"a:b\"").unwrap();
        assert_eq!(h.name, "form-data");
        assert_eq!(attrs(&h), vec![("name", Some("a:b"))]);
    }

    #[test]
    fn space_after_semicolon_is_optional() {
        let h = parse_header(b"form-data;name=\"a\";filename=\"b\"").unwrap();
        assert_eq!(attrs(&h), vec![("name", Some("a")), ("filename", Some("b"))]);
    }

    #[test]
    fn only_one_space_is_consumed() {
        let h = parse_header(b"form-data;  name=\"a\"").unwrap();
        assert_eq!(attrs(&h), vec![(" name", Some("a"))]);
        assert_eq!(h.attribute_value("name"), None);
    }

    #[test]
    fn casing_preserved() {
        let h = parse_header(b"content-DISPOSITION: Form-Data; NAME=\"X\"").unwrap();
        assert_eq!(h.name, "content-DISPOSITION");
        assert_eq!(attrs(&h), vec![("Form-Data", None), ("NAME", Some("X"))]);
        assert_eq!(h.attribute_value("name"), Some("X"));
    }

    #[test]
    fn quoted_value_keeps_interior_bytes() {
        let h = parse_header(b"form-data; filename=\"a; b=c \\x.txt\"").unwrap();
        assert_eq!(h.attribute_value("filename"), Some("a; b=c \\x.txt"));
    }

    #[test]
    fn quoted_value_stops_at_next_quote() {
        // Backslash does not escape the quote.
        assert_eq!(
            err_kind(b"form-data; filename=\"a\\\"b\""),
            HeaderErrorKind::TrailingBytes
        );
    }

    #[test]
    fn empty_quoted_value() {
        let h = parse_header(b"form-data; filename=\"\"").unwrap();
        assert_eq!(h.attribute_value("filename"), Some(""));
    }

    #[test]
    fn unquoted_value_runs_to_end_of_line() {
        let h = parse_header(b"form-data; name=abc; filename=x").unwrap();
        assert_eq!(attrs(&h), vec![("name", Some("abc; filename=x"))]);
    }

    #[test]
    fn empty_unquoted_value() {
        let h = parse_header(b"form-data; name=").unwrap();
        assert_eq!(attrs(&h), vec![("name", Some(""))]);
        assert!(h.has_attribute("name"));
    }

    #[test]
    fn trailing_semicolon_accepted() {
        let h = parse_header(b"form-data; name=\"a\";").unwrap();
        assert_eq!(attrs(&h), vec![("name", Some("a"))]);
        let h = parse_header(b"form-data; ").unwrap();
        assert!(h.attributes.is_empty());
    }

    #[test]
    fn utf8_filename() {
        let h = parse_header("form-data; filename=\"résumé.pdf\"".as_bytes()).unwrap();
        assert_eq!(h.attribute_value("filename"), Some("résumé.pdf"));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let h = parse_header(b"form-data; filename=\"a\xffb\"").unwrap();
        assert_eq!(h.attribute_value("filename"), Some("a\u{FFFD}b"));
    }

    #[test]
    fn error_value_without_key() {
        let err = parse_header(b"=value").unwrap_err();
        assert_eq!(err.kind(), HeaderErrorKind::MissingKey);
        assert_eq!(err.offset(), 0);

        assert_eq!(err_kind(b"form-data; =x"), HeaderErrorKind::MissingKey);
        assert_eq!(err_kind(b"Content-Type: =x"), HeaderErrorKind::MissingKey);
    }

    #[test]
    fn error_missing_name() {
        assert_eq!(err_kind(b""), HeaderErrorKind::MissingName);
        assert_eq!(err_kind(b"; name=\"a\""), HeaderErrorKind::MissingName);
    }

    #[test]
    fn error_empty_attribute_key() {
        let err = parse_header(b"form-data;;name=\"a\"").unwrap_err();
        assert_eq!(err.kind(), HeaderErrorKind::MissingKey);
        assert_eq!(err.offset(), 10);
    }

    #[test]
    fn unterminated_quote_is_an_unquoted_value() {
        let h = parse_header(b"form-data; name=\"abc").unwrap();
        assert_eq!(attrs(&h), vec![("name", Some("\"abc"))]);

        let h = parse_header(b"Content-Disposition: form-data; name=\"a; filename=b").unwrap();
        assert_eq!(
            attrs(&h),
            vec![("form-data", None), ("name", Some("\"a; filename=b"))]
        );

        let h = parse_header(b"form-data; name=\"").unwrap();
        assert_eq!(h.attribute_value("name"), Some("\""));
    }

    #[test]
    fn error_bytes_after_quote() {
        assert_eq!(
            err_kind(b"form-data; name=\"a\"b"),
            HeaderErrorKind::TrailingBytes
        );
    }

    #[test]
    fn error_value_on_bare_name() {
        assert_eq!(err_kind(b"form-data=x"), HeaderErrorKind::TrailingBytes);
    }
}
