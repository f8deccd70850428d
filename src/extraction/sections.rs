//! Section splitting: locate the two family headers and slice the text.
//!
//! The first section runs from the end of the first header to the start of
//! the second header; the second section runs to end of input. The second
//! header is only searched for after the first one.

use crate::error::FormatError;
use crate::types::LogSchema;

/// A slice of the input belonging to one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    pub text: &'a str,
    /// 1-based line of the input on which `text` starts.
    pub start_line: usize,
}

impl<'a> Section<'a> {
    /// 1-based input line of a byte offset inside this section.
    pub fn line_of(&self, offset: usize) -> usize {
        self.start_line + self.text[..offset].matches('\n').count()
    }
}

/// Both family sections of one log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections<'a> {
    pub first: Section<'a>,
    pub second: Section<'a>,
}

/// Calculate 1-indexed line number from byte offset.
fn line_number(content: &str, byte_offset: usize) -> usize {
    content[..byte_offset].matches('\n').count() + 1
}

fn find_header(haystack: &str, header: &str) -> Option<usize> {
    if header.is_empty() {
        return None;
    }
    haystack.find(header)
}

/// Split `text` into the two sections named by `schema`.
pub fn split_sections<'a>(text: &'a str, schema: &LogSchema) -> Result<Sections<'a>, FormatError> {
    if text.trim().is_empty() {
        return Err(FormatError::EmptyInput);
    }

    let first_header = &schema.first.header;
    let first_start = find_header(text, first_header).ok_or_else(|| {
        FormatError::SeparatorNotFound {
            header: first_header.clone(),
        }
    })?;
    let first_body = first_start + first_header.len();

    let second_header = &schema.second.header;
    let second_start = find_header(&text[first_body..], second_header)
        .map(|pos| first_body + pos)
        .ok_or_else(|| FormatError::SeparatorNotFound {
            header: second_header.clone(),
        })?;
    let second_body = second_start + second_header.len();

    Ok(Sections {
        first: Section {
            text: &text[first_body..second_start],
            start_line: line_number(text, first_body),
        },
        second: Section {
            text: &text[second_body..],
            start_line: line_number(text, second_body),
        },
    })
}
