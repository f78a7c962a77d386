/// Text round-trip format for authored motion data
///
/// Every record is a tag followed by parenthesized fields:
/// `LinearTFV(0)(10)(5)`. A field may itself hold a nested record,
/// e.g. `TranslationWrapperTFV(2)(ConstantTFV(1))`.

use thiserror::Error;

/// Errors raised while loading authored text
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    #[error("unknown {family} tag '{tag}'")]
    UnknownTag { family: &'static str, tag: String },

    #[error("expected tag '{expected}', found '{found}'")]
    UnexpectedTag { expected: &'static str, found: String },

    #[error("'{tag}' expects {expected} fields, found {found}")]
    FieldCount {
        tag: String,
        expected: usize,
        found: usize,
    },

    #[error("'{tag}' field {index} is not a valid number: '{raw}'")]
    InvalidNumber {
        tag: String,
        index: usize,
        raw: String,
    },

    #[error("syntax error at byte {position}: {reason}")]
    Syntax { position: usize, reason: &'static str },

    #[error("'{tag}' is invalid: {reason}")]
    Invalid { tag: String, reason: String },

    #[error("{0} cannot be formatted or loaded")]
    NotSerializable(&'static str),
}

/// Types that can be written to and reconstructed from the text format
pub trait TextFormat: Sized {
    fn format(&self) -> String;

    fn load(text: &str) -> Result<Self, FormatError>;
}

/// Concrete record types: one fixed tag and an ordered field list
pub trait RecordFormat: Sized {
    const TAG: &'static str;

    fn write_fields(&self, writer: RecordWriter) -> RecordWriter;

    fn read_fields(record: &Record<'_>) -> Result<Self, FormatError>;
}

impl<T: RecordFormat> TextFormat for T {
    fn format(&self) -> String {
        self.write_fields(RecordWriter::new(T::TAG)).finish()
    }

    fn load(text: &str) -> Result<Self, FormatError> {
        let record = Record::parse(text)?;
        record.expect_tag(T::TAG)?;
        T::read_fields(&record)
    }
}

/// A parsed record: its tag plus the raw text of each field
#[derive(Debug, Clone, PartialEq)]
pub struct Record<'a> {
    tag: &'a str,
    fields: Vec<&'a str>,
}

impl<'a> Record<'a> {
    /// Split `Tag(a)(b)...` into the tag and its top-level fields
    pub fn parse(text: &'a str) -> Result<Self, FormatError> {
        let text = text.trim();
        let bytes = text.as_bytes();

        let tag_end = text.find('(').unwrap_or(text.len());
        let tag = &text[..tag_end];
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FormatError::Syntax {
                position: 0,
                reason: "expected a tag",
            });
        }

        let mut fields = Vec::new();
        let mut i = tag_end;
        while i < bytes.len() {
            if bytes[i] != b'(' {
                return Err(FormatError::Syntax {
                    position: i,
                    reason: "expected '(' between fields",
                });
            }

            // Find the matching close paren, tracking nested records
            let open = i;
            let mut depth = 0usize;
            let mut close = None;
            for (j, &b) in bytes.iter().enumerate().skip(open) {
                match b {
                    b'(' => depth += 1,
                    b')' => {
                        depth -= 1;
                        if depth == 0 {
                            close = Some(j);
                            break;
                        }
                    }
                    _ => {}
                }
            }

            let close = close.ok_or(FormatError::Syntax {
                position: open,
                reason: "unbalanced parentheses",
            })?;
            fields.push(&text[open + 1..close]);
            i = close + 1;
        }

        Ok(Self { tag, fields })
    }

    pub fn tag(&self) -> &'a str {
        self.tag
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn expect_tag(&self, expected: &'static str) -> Result<(), FormatError> {
        if self.tag != expected {
            return Err(FormatError::UnexpectedTag {
                expected,
                found: self.tag.to_string(),
            });
        }
        Ok(())
    }

    /// Fail unless the record has exactly `expected` fields
    pub fn expect_fields(&self, expected: usize) -> Result<(), FormatError> {
        if self.fields.len() != expected {
            return Err(FormatError::FieldCount {
                tag: self.tag.to_string(),
                expected,
                found: self.fields.len(),
            });
        }
        Ok(())
    }

    pub fn field(&self, index: usize) -> Result<&'a str, FormatError> {
        self.fields
            .get(index)
            .copied()
            .ok_or_else(|| FormatError::FieldCount {
                tag: self.tag.to_string(),
                expected: index + 1,
                found: self.fields.len(),
            })
    }

    pub fn f32(&self, index: usize) -> Result<f32, FormatError> {
        let raw = self.field(index)?;
        raw.trim().parse::<f32>().map_err(|_| self.invalid_number(index, raw))
    }

    pub fn u32(&self, index: usize) -> Result<u32, FormatError> {
        let raw = self.field(index)?;
        raw.trim().parse::<u32>().map_err(|_| self.invalid_number(index, raw))
    }

    /// Load a nested record stored in a field
    pub fn nested<T: TextFormat>(&self, index: usize) -> Result<T, FormatError> {
        T::load(self.field(index)?)
    }

    /// Build an `Invalid` error attributed to this record
    pub fn invalid(&self, reason: impl Into<String>) -> FormatError {
        FormatError::Invalid {
            tag: self.tag.to_string(),
            reason: reason.into(),
        }
    }

    fn invalid_number(&self, index: usize, raw: &str) -> FormatError {
        FormatError::InvalidNumber {
            tag: self.tag.to_string(),
            index,
            raw: raw.to_string(),
        }
    }
}

/// Builds a record string field by field
pub struct RecordWriter {
    out: String,
}

impl RecordWriter {
    pub fn new(tag: &str) -> Self {
        Self {
            out: tag.to_string(),
        }
    }

    /// Floats use `Display`, which prints the shortest text that parses back
    /// to the same value
    pub fn f32(mut self, value: f32) -> Self {
        self.out.push_str(&format!("({value})"));
        self
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.out.push_str(&format!("({value})"));
        self
    }

    pub fn nested<T: TextFormat>(mut self, value: &T) -> Self {
        self.out.push('(');
        self.out.push_str(&value.format());
        self.out.push(')');
        self
    }

    pub fn finish(self) -> String {
        self.out
    }
}
