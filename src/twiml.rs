//! TwiML generation and parsing.
//!
//! Covers the three verbs the webhook responder emits (`Say`, `Hangup`,
//! `Reject`). The parser is strict: anything that is not a well-formed
//! `<Response>` document built from known verbs is an error, which is what
//! lets the client observe the `invalid-twiml` webhook mode as a call
//! failure instead of silently ignoring it.

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

#[derive(Debug, thiserror::Error)]
pub enum TwimlError {
    /// Underlying XML reader/writer error
    #[error("XML error: {0}")]
    Xml(String),

    /// Root element is not `<Response>`
    #[error("Unexpected root element <{0}>, expected <Response>")]
    UnexpectedRoot(String),

    /// Element inside `<Response>` is not a known verb
    #[error("Unknown verb <{0}>")]
    UnknownVerb(String),

    /// Document contains no root element at all
    #[error("Empty TwiML document")]
    Empty,
}

/// A single TwiML instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    /// Speak an announcement to the caller.
    Say(String),
    /// Terminate the call.
    Hangup,
    /// Reject the call without answering it.
    Reject { reason: String },
}

/// An ordered list of verbs, serialized as a `<Response>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: &str) -> Self {
        self.verbs.push(Verb::Say(text.to_string()));
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn reject(mut self, reason: &str) -> Self {
        self.verbs.push(Verb::Reject {
            reason: reason.to_string(),
        });
        self
    }

    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    /// Serialize to an XML document with declaration.
    pub fn to_xml(&self) -> Result<String, TwimlError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| TwimlError::Xml(e.to_string()))?;
        writer
            .write_event(Event::Start(BytesStart::new("Response")))
            .map_err(|e| TwimlError::Xml(e.to_string()))?;

        for verb in &self.verbs {
            match verb {
                Verb::Say(text) => {
                    writer
                        .write_event(Event::Start(BytesStart::new("Say")))
                        .map_err(|e| TwimlError::Xml(e.to_string()))?;
                    writer
                        .write_event(Event::Text(BytesText::new(text)))
                        .map_err(|e| TwimlError::Xml(e.to_string()))?;
                    writer
                        .write_event(Event::End(BytesStart::new("Say").to_end()))
                        .map_err(|e| TwimlError::Xml(e.to_string()))?;
                }
                Verb::Hangup => {
                    writer
                        .write_event(Event::Empty(BytesStart::new("Hangup")))
                        .map_err(|e| TwimlError::Xml(e.to_string()))?;
                }
                Verb::Reject { reason } => {
                    let mut elem = BytesStart::new("Reject");
                    elem.push_attribute(("reason", reason.as_str()));
                    writer
                        .write_event(Event::Empty(elem))
                        .map_err(|e| TwimlError::Xml(e.to_string()))?;
                }
            }
        }

        writer
            .write_event(Event::End(BytesStart::new("Response").to_end()))
            .map_err(|e| TwimlError::Xml(e.to_string()))?;

        String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| TwimlError::Xml(e.to_string()))
    }
}

/// Parse a TwiML document, rejecting anything that is not a well-formed
/// `<Response>` built from known verbs.
pub fn parse(xml: &str) -> Result<VoiceResponse, TwimlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut verbs = Vec::new();
    let mut in_response = false;
    let mut seen_root = false;

    loop {
        match reader
            .read_event()
            .map_err(|e| TwimlError::Xml(e.to_string()))?
        {
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) => {}
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if !in_response {
                    if seen_root || name != "Response" {
                        return Err(TwimlError::UnexpectedRoot(name));
                    }
                    in_response = true;
                    seen_root = true;
                } else {
                    match name.as_str() {
                        "Say" => verbs.push(Verb::Say(read_say_text(&mut reader)?)),
                        "Hangup" => {
                            read_empty_body(&mut reader, "Hangup")?;
                            verbs.push(Verb::Hangup);
                        }
                        "Reject" => {
                            let reason = reject_reason(&e)?;
                            read_empty_body(&mut reader, "Reject")?;
                            verbs.push(Verb::Reject { reason });
                        }
                        other => return Err(TwimlError::UnknownVerb(other.to_string())),
                    }
                }
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if !in_response {
                    if seen_root || name != "Response" {
                        return Err(TwimlError::UnexpectedRoot(name));
                    }
                    seen_root = true;
                } else {
                    match name.as_str() {
                        "Say" => verbs.push(Verb::Say(String::new())),
                        "Hangup" => verbs.push(Verb::Hangup),
                        "Reject" => verbs.push(Verb::Reject {
                            reason: reject_reason(&e)?,
                        }),
                        other => return Err(TwimlError::UnknownVerb(other.to_string())),
                    }
                }
            }
            Event::End(_) => {
                in_response = false;
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| TwimlError::Xml(e.to_string()))?;
                if !text.trim().is_empty() {
                    return Err(TwimlError::Xml(format!(
                        "Unexpected text '{}' outside a verb",
                        text.trim()
                    )));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(TwimlError::Empty);
    }
    Ok(VoiceResponse { verbs })
}

fn read_say_text(reader: &mut Reader<&[u8]>) -> Result<String, TwimlError> {
    let mut text = String::new();
    loop {
        match reader
            .read_event()
            .map_err(|e| TwimlError::Xml(e.to_string()))?
        {
            Event::Text(t) => {
                text.push_str(&t.unescape().map_err(|e| TwimlError::Xml(e.to_string()))?);
            }
            Event::End(_) => return Ok(text),
            Event::Eof => return Err(TwimlError::Xml("Unexpected EOF inside <Say>".to_string())),
            _ => return Err(TwimlError::Xml("Unexpected content inside <Say>".to_string())),
        }
    }
}

fn read_empty_body(reader: &mut Reader<&[u8]>, verb: &str) -> Result<(), TwimlError> {
    match reader
        .read_event()
        .map_err(|e| TwimlError::Xml(e.to_string()))?
    {
        Event::End(_) => Ok(()),
        Event::Eof => Err(TwimlError::Xml(format!("Unexpected EOF inside <{verb}>"))),
        _ => Err(TwimlError::Xml(format!("Unexpected content inside <{verb}>"))),
    }
}

fn reject_reason(e: &BytesStart<'_>) -> Result<String, TwimlError> {
    match e
        .try_get_attribute("reason")
        .map_err(|err| TwimlError::Xml(err.to_string()))?
    {
        Some(attr) => Ok(attr
            .unescape_value()
            .map_err(|err| TwimlError::Xml(err.to_string()))?
            .into_owned()),
        // Vendor default when the attribute is omitted
        None => Ok("rejected".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_serialization() {
        let xml = VoiceResponse::new().reject("rejected").to_xml().unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Reject reason=\"rejected\"/></Response>"
        );
    }

    #[test]
    fn test_say_hangup_round_trip() {
        let response = VoiceResponse::new()
            .say("This call will be terminated.")
            .hangup();
        let xml = response.to_xml().unwrap();
        assert_eq!(parse(&xml).unwrap(), response);
    }

    #[test]
    fn test_say_text_is_escaped() {
        let xml = VoiceResponse::new().say("a < b & c").to_xml().unwrap();
        assert!(xml.contains("a &lt; b &amp; c"));
        assert_eq!(
            parse(&xml).unwrap().verbs(),
            &[Verb::Say("a < b & c".to_string())]
        );
    }

    #[test]
    fn test_parse_rejects_unknown_root() {
        let result = parse("<Invalid>Not valid TwiML</Invalid>");
        assert!(matches!(result, Err(TwimlError::UnexpectedRoot(name)) if name == "Invalid"));
    }

    #[test]
    fn test_parse_rejects_unknown_verb() {
        let result = parse("<Response><Dial>+15551234567</Dial></Response>");
        assert!(matches!(result, Err(TwimlError::UnknownVerb(name)) if name == "Dial"));
    }

    #[test]
    fn test_parse_rejects_truncated_document() {
        assert!(parse("<Response><Say>hello").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_input() {
        assert!(matches!(parse(""), Err(TwimlError::Empty)));
    }

    #[test]
    fn test_parse_empty_response() {
        assert!(parse("<Response/>").unwrap().verbs().is_empty());
        assert!(parse("<Response></Response>").unwrap().verbs().is_empty());
    }

    #[test]
    fn test_parse_reject_defaults_reason() {
        let parsed = parse("<Response><Reject/></Response>").unwrap();
        assert_eq!(
            parsed.verbs(),
            &[Verb::Reject {
                reason: "rejected".to_string()
            }]
        );
    }
}
