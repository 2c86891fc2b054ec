//! Canonical rendering of requests and of verification failure messages.
//!
//! Requests are pretty-printed as JSON in a fixed layout: objects open on
//! the current line and put each field on its own line, indented two spaces
//! per enclosing object, with `" : "` between key and value; arrays stay on
//! one line as `[ a, b ]`, and an empty array renders as `[ ]`. Field order
//! is the declaration order of [`HttpRequest`], so the same request always
//! renders to the same text.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;

use crate::{HttpRequest, Result, VerificationTimes};

/// Line separator used inside rendered requests.
pub const NEW_LINE: &str = if cfg!(windows) { "\r\n" } else { "\n" };

const INDENT: &[u8] = b"  ";

/// `serde_json` formatter producing the layout described in the module docs.
#[derive(Debug, Default)]
struct DescriptorFormatter {
    object_depth: usize,
    /// One flag per open container: whether it has written a value yet.
    has_value: Vec<bool>,
}

impl DescriptorFormatter {
    fn mark_value(&mut self) {
        if let Some(top) = self.has_value.last_mut() {
            *top = true;
        }
    }

    fn indent<W: ?Sized + io::Write>(writer: &mut W, depth: usize) -> io::Result<()> {
        writer.write_all(NEW_LINE.as_bytes())?;
        for _ in 0..depth {
            writer.write_all(INDENT)?;
        }
        Ok(())
    }
}

impl Formatter for DescriptorFormatter {
    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.object_depth += 1;
        self.has_value.push(false);
        writer.write_all(b"{")
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.object_depth -= 1;
        if self.has_value.pop().unwrap_or(false) {
            Self::indent(writer, self.object_depth)?;
            writer.write_all(b"}")
        } else {
            writer.write_all(b" }")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.mark_value();
        if !first {
            writer.write_all(b",")?;
        }
        Self::indent(writer, self.object_depth)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b" : ")
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.has_value.push(false);
        writer.write_all(b"[")
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.has_value.pop();
        writer.write_all(b" ]")
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.mark_value();
        if first {
            writer.write_all(b" ")
        } else {
            writer.write_all(b", ")
        }
    }
}

/// Renders requests and the two-sided "expected vs actual" failure text.
///
/// # Example
///
/// ```rust
/// use mockverify::{DiffFormatter, request};
///
/// let text = DiffFormatter::render(&request("one"))?;
/// assert_eq!(text, format!("{{{0}  \"path\" : \"one\"{0}}}", mockverify::NEW_LINE));
/// # Ok::<(), mockverify::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DiffFormatter {
    max_requests: usize,
}

impl Default for DiffFormatter {
    fn default() -> Self {
        Self { max_requests: 10 }
    }
}

impl DiffFormatter {
    /// A formatter that renders at most `max_requests` actual requests in a
    /// failure message.
    pub fn new(max_requests: usize) -> Self {
        Self { max_requests }
    }

    /// Render any serializable value in the canonical layout.
    pub fn render<S: Serialize + ?Sized>(value: &S) -> Result<String> {
        let mut buffer = Vec::with_capacity(128);
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buffer, DescriptorFormatter::default());
        value.serialize(&mut serializer)?;
        String::from_utf8(buffer)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
    }

    /// Render a list of requests as `[ {...}, {...} ]`, or `[ ]` when empty.
    pub fn render_list(requests: &[HttpRequest]) -> Result<String> {
        Self::render(requests)
    }

    /// Failure text of a sequence verification.
    ///
    /// `Request sequence not found, expected:<[ ... ]> but was:<[ ... ]>`
    pub fn sequence_mismatch(
        &self,
        expected: &[HttpRequest],
        actual: &[HttpRequest],
    ) -> Result<String> {
        Ok(format!(
            "Request sequence not found, expected:<{}>{}",
            Self::render_list(expected)?,
            self.actual_side(actual)?
        ))
    }

    /// Failure text of a cardinality verification.
    ///
    /// `Request not found exactly twice, expected:<{ ... }> but was:<[ ... ]>`
    pub fn times_mismatch(
        &self,
        expected: &HttpRequest,
        times: &VerificationTimes,
        actual: &[HttpRequest],
    ) -> Result<String> {
        Ok(format!(
            "Request not found {times}, expected:<{}>{}",
            Self::render(expected)?,
            self.actual_side(actual)?
        ))
    }

    fn actual_side(&self, actual: &[HttpRequest]) -> Result<String> {
        if actual.len() > self.max_requests {
            Ok(format!(
                " but was not found, found {} other requests",
                actual.len()
            ))
        } else {
            Ok(format!(" but was:<{}>", Self::render_list(actual)?))
        }
    }
}
