//! Voice document rendering for medication reminders.
//!
//! Produces the TwiML the telephony platform plays on a call leg: one
//! `<Say>` in Tamil with the medicine name, dosage and time spliced in.

use serde::Deserialize;

/// Language code of the `<Say>` element.
pub const LANGUAGE: &str = "ta-IN";

/// Synthetic voice of the `<Say>` element.
pub const VOICE: &str = "Polly.Kajal";

/// Parameters of one reminder. Every field is optional; a missing field
/// renders as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReminderRequest {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub time: Option<String>,
}

impl ReminderRequest {
    pub fn new(
        name: impl Into<String>,
        dosage: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            dosage: Some(dosage.into()),
            time: Some(time.into()),
        }
    }

    /// Build a request from decoded key/value pairs. The first value of a
    /// repeated key wins; unknown keys are ignored.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut req = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "name" => &mut req.name,
                "dosage" => &mut req.dosage,
                "time" => &mut req.time,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        req
    }

    /// Build a request from a JSON object. Strings are taken verbatim,
    /// numbers and booleans by their JSON text; anything else is absent.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let field = |key: &str| match value.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            v @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_)) => Some(v.to_string()),
            _ => None,
        };
        Self {
            name: field("name"),
            dosage: field("dosage"),
            time: field("time"),
        }
    }

    /// Fill fields still absent here from `other`.
    pub fn or(self, other: Self) -> Self {
        Self {
            name: self.name.or(other.name),
            dosage: self.dosage.or(other.dosage),
            time: self.time.or(other.time),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn dosage(&self) -> &str {
        self.dosage.as_deref().unwrap_or_default()
    }

    pub fn time(&self) -> &str {
        self.time.as_deref().unwrap_or_default()
    }
}

/// How caller values are inserted into the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Escaping {
    /// Values are inserted as given. Markup characters pass through and may
    /// break the document downstream.
    #[default]
    Verbatim,
    /// XML-special characters are replaced by entities before insertion.
    Xml,
}

/// A rendered voice document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceDocument(String);

impl VoiceDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for VoiceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VoiceDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Render the reminder document with values inserted verbatim.
pub fn render(request: &ReminderRequest) -> VoiceDocument {
    render_with(request, Escaping::Verbatim)
}

/// Render the reminder document using the given escaping mode.
pub fn render_with(request: &ReminderRequest, escaping: Escaping) -> VoiceDocument {
    let (name, dosage, time) = match escaping {
        Escaping::Verbatim => (
            request.name().to_string(),
            request.dosage().to_string(),
            request.time().to_string(),
        ),
        Escaping::Xml => (
            escape_xml(request.name()),
            escape_xml(request.dosage()),
            escape_xml(request.time()),
        ),
    };

    VoiceDocument(format!(
        "
<Response>
  <Say language=\"{LANGUAGE}\" voice=\"{VOICE}\">
    உங்கள் மருந்து {name} {dosage} எடுத்துக்கொள்ளும் நேரம் {time} ஆகிவிட்டது. தயவு செய்து மருந்தை எடுத்துக்கொள்ளுங்கள் நன்றி.
  </Say>
</Response>"
    ))
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
