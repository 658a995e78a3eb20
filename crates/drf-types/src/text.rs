use crate::error::TypeError;
use crate::fields::{FieldReader, encode_bytes_field};

/// TEXT region — a titled run of text.
///
/// ```text
/// ┌──────────┬───────────┬─────────┐
/// │ Field ID │ Wire Type │ Name    │
/// ├──────────┼───────────┼─────────┤
/// │ 1        │ Bytes     │ title   │
/// │ 2        │ Bytes     │ content │
/// └──────────┴───────────┴─────────┘
/// ```
///
/// Text regions are small and always parsed in the initial pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextRegion {
    pub title: String,
    pub content: Vec<u8>,
}

impl TextRegion {
    pub fn encode_body(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_bytes_field(&mut buf, 1, self.title.as_bytes());
        encode_bytes_field(&mut buf, 2, &self.content);
        buf
    }

    /// # Errors
    ///
    /// Malformed fields, or a missing title. An absent content field is
    /// read as empty.
    pub fn decode_body(buf: &[u8]) -> Result<Self, TypeError> {
        let mut title = None;
        let mut content = Vec::new();

        let mut fields = FieldReader::new(buf);
        while let Some(field) = fields.next_field()? {
            match field.field_id {
                1 => title = Some(field.lossy_string()),
                2 => content = field.data.to_vec(),
                _ => {}
            }
        }

        Ok(Self {
            title: title.ok_or(TypeError::MissingRequiredField { field: "title" })?,
            content,
        })
    }
}
