//! TwiML (Twilio Markup Language) builder for voice responses.
//!
//! Generates the XML Twilio executes to control a call. Only the verbs this
//! gateway uses are modeled.

use std::fmt::Write;

/// Builder for TwiML `<Response>` documents.
#[derive(Debug, Clone, Default)]
pub struct TwimlBuilder {
    verbs: Vec<TwimlVerb>,
}

/// TwiML verbs supported by the gateway.
#[derive(Debug, Clone)]
enum TwimlVerb {
    /// Speak text to the caller
    Say { text: String },
    /// Connect the call to a bidirectional media stream
    ConnectStream { url: String },
    /// Pause for a number of seconds
    Pause { length: u32 },
    /// End the call
    Hangup,
}

impl TwimlBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `<Say>` verb.
    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.verbs.push(TwimlVerb::Say { text: text.into() });
        self
    }

    /// Append `<Connect><Stream url="..."/></Connect>`.
    pub fn connect_stream(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(TwimlVerb::ConnectStream { url: url.into() });
        self
    }

    /// Append a `<Pause>` verb.
    pub fn pause(mut self, length: u32) -> Self {
        self.verbs.push(TwimlVerb::Pause { length });
        self
    }

    /// Append a `<Hangup>` verb.
    pub fn hangup(mut self) -> Self {
        self.verbs.push(TwimlVerb::Hangup);
        self
    }

    /// Render the document.
    pub fn build(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>");
        for verb in &self.verbs {
            match verb {
                TwimlVerb::Say { text } => {
                    let _ = write!(xml, "<Say>{}</Say>", escape_xml(text));
                }
                TwimlVerb::ConnectStream { url } => {
                    let _ = write!(
                        xml,
                        "<Connect><Stream url=\"{}\" /></Connect>",
                        escape_xml(url)
                    );
                }
                TwimlVerb::Pause { length } => {
                    let _ = write!(xml, "<Pause length=\"{length}\" />");
                }
                TwimlVerb::Hangup => xml.push_str("<Hangup />"),
            }
        }
        xml.push_str("</Response>");
        xml
    }
}

/// Escape text for inclusion in XML content or attribute values.
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
