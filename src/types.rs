/// One header line of a part, split into its name and `;`-separated attributes.
///
/// For `Content-Disposition: form-data; name="f"` the name is
/// `Content-Disposition` and the attributes are `form-data` (no value) and
/// `name=f`. Casing is kept as written; lookups ignore ASCII case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub attributes: Vec<(String, Option<String>)>,
}

impl Header {
    pub fn new(name: impl Into<String>) -> Self {
        Header {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Option<&str>) -> Self {
        self.attributes.push((key.into(), value.map(str::to_owned)));
        self
    }

    /// Value of the first attribute named `key`.
    ///
    /// `None` both when the attribute is absent and when it carries no value;
    /// use [`Header::has_attribute`] to tell those apart.
    pub fn attribute_value(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    /// First attribute key, which for MIME headers is the field value proper
    /// (`form-data`, `text/plain`).
    pub fn first_key(&self) -> Option<&str> {
        self.attributes.first().map(|(k, _)| k.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub headers: Vec<Header>,
    pub payload: Vec<u8>,
}

impl Part {
    pub fn header(&self, name: &str) -> Option<&Header> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
    }

    pub fn content_disposition(&self) -> Option<&Header> {
        self.header("Content-Disposition")
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type").and_then(Header::first_key)
    }

    /// Form field name from `Content-Disposition`.
    pub fn name(&self) -> Option<&str> {
        self.content_disposition()
            .and_then(|h| h.attribute_value("name"))
    }

    pub fn filename(&self) -> Option<&str> {
        self.content_disposition()
            .and_then(|h| h.attribute_value("filename"))
    }

    pub fn is_file(&self) -> bool {
        self.content_disposition()
            .is_some_and(|h| h.has_attribute("filename"))
    }

    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiPartFormData {
    pub boundary: String,
    pub parts: Vec<Part>,
}

impl MultiPartFormData {
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// First part whose form field name is exactly `name`.
    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name() == Some(name))
    }

    pub fn parts_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Part> + 'a {
        self.parts.iter().filter(move |p| p.name() == Some(name))
    }

    pub fn files(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter().filter(|p| p.is_file())
    }
}
