//! Minimal path-based text extraction over XML documents.
//!
//! This is not a DOM. The document is streamed with `quick_xml::Reader` and
//! the first element matching a predicate has its text content collected,
//! including text of nested descendants and CDATA sections.

use quick_xml::Reader;
use quick_xml::events::Event;

/// Read-only queries over a serialized XML document.
#[derive(Debug, Clone, Copy)]
pub struct DocumentQuery<'a> {
    xml: &'a str,
}

impl<'a> DocumentQuery<'a> {
    pub fn new(xml: &'a str) -> Self {
        Self {
            xml: xml.strip_prefix('\u{feff}').unwrap_or(xml),
        }
    }

    /// Local name of the document element, `None` for a document without one.
    pub fn root_name(&self) -> Result<Option<String>, quick_xml::Error> {
        let mut reader = Reader::from_str(self.xml);
        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => {
                    return Ok(Some(
                        String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                    ));
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }

    /// Text content of the first element named `tag`, at any depth.
    pub fn first_text(&self, tag: &str) -> Result<Option<String>, quick_xml::Error> {
        self.capture_text(|stack| stack.last().is_some_and(|name| name == tag))
    }

    /// Text content of the first element at the absolute `path`, starting
    /// with the document element, e.g. `["ServiceProvider", "ApplicationName"]`.
    pub fn text_at(&self, path: &[&str]) -> Result<Option<String>, quick_xml::Error> {
        self.capture_text(|stack| {
            stack.len() == path.len() && stack.iter().zip(path).all(|(a, b)| a == b)
        })
    }

    fn capture_text<F>(&self, is_target: F) -> Result<Option<String>, quick_xml::Error>
    where
        F: Fn(&[String]) -> bool,
    {
        let mut reader = Reader::from_str(self.xml);
        let mut stack: Vec<String> = Vec::new();
        // Depth at which capture started, and the text collected so far
        let mut capture: Option<(usize, String)> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    if capture.is_none() && is_target(&stack) {
                        capture = Some((stack.len(), String::new()));
                    }
                }
                Event::Empty(e) => {
                    if capture.is_none() {
                        stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                        if is_target(&stack) {
                            return Ok(Some(String::new()));
                        }
                        stack.pop();
                    }
                }
                Event::End(_) => {
                    if matches!(capture, Some((depth, _)) if depth == stack.len()) {
                        return Ok(capture.map(|(_, text)| text));
                    }
                    stack.pop();
                }
                Event::Text(t) => {
                    if let Some((_, text)) = capture.as_mut() {
                        text.push_str(&t.unescape()?);
                    }
                }
                Event::CData(c) => {
                    if let Some((_, text)) = capture.as_mut() {
                        text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}
