//! Provider wire contract.
//!
//! The provider reports numbers as strings and sentence lists either as JSON
//! arrays or as JSON-encoded strings. Everything loose is decoded here, once,
//! into [`DecodedDetection`]; nothing past this module sees the raw shapes.

use serde::{Deserialize, Serialize};

/// Request body for the detection endpoint.
#[derive(Debug, Serialize)]
pub struct DetectTextRequest<'a> {
    pub input_text: &'a str,
}

/// A value the provider may send as a number, a numeric string, or a bool.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Loose {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Loose {
    /// Numeric reading. Text yields its leading number ("15.0%" is 15.0);
    /// text without one is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Loose::Bool(_) => None,
            Loose::Int(n) => Some(*n as f64),
            Loose::Float(f) => Some(*f),
            Loose::Text(s) => leading_number(s),
        }
    }

    /// Non-negative whole count; fractions truncate, garbage reads as 0.
    pub fn as_count(&self) -> u64 {
        self.as_f64()
            .filter(|f| *f > 0.0)
            .map(|f| f.trunc() as u64)
            .unwrap_or(0)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Loose::Bool(b) => *b,
            Loose::Int(n) => *n != 0,
            Loose::Float(f) => *f != 0.0,
            Loose::Text(s) => s.eq_ignore_ascii_case("true"),
        }
    }
}

/// Longest numeric prefix of `s` after leading whitespace:
/// sign, digits, fraction, exponent.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|f| f.is_finite())
}

/// A sentence list, already decoded or JSON-encoded in a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SentenceList {
    Items(Vec<String>),
    Encoded(String),
}

impl SentenceList {
    pub fn decode(&self) -> Result<Vec<String>, serde_json::Error> {
        match self {
            SentenceList::Items(items) => Ok(items.clone()),
            SentenceList::Encoded(s) if s.trim().is_empty() => Ok(Vec::new()),
            SentenceList::Encoded(s) => serde_json::from_str(s),
        }
    }
}

/// Top-level response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEnvelope {
    #[serde(default)]
    pub code: Option<Loose>,
    #[serde(default)]
    pub success: Option<Loose>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<ProviderData>,
}

impl ProviderEnvelope {
    /// The provider only succeeded when it says so and reports code 200.
    pub fn is_success(&self) -> bool {
        let success = self.success.as_ref().is_some_and(Loose::is_truthy);
        let code = self.code.as_ref().and_then(Loose::as_f64);
        success && code == Some(200.0)
    }

    /// Provider message, if it sent a non-empty one.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderData {
    #[serde(default, rename = "input_text")]
    pub input_text: Option<String>,
    #[serde(default)]
    pub original_paragraph: Option<String>,
    #[serde(default)]
    pub text_words: Option<Loose>,
    #[serde(default)]
    pub ai_words: Option<Loose>,
    #[serde(default)]
    pub fake_percentage: Option<Loose>,
    #[serde(default)]
    pub sentences: Option<SentenceList>,
    /// Sentences the provider flags as AI-generated.
    #[serde(default)]
    pub h: Option<SentenceList>,
    #[serde(default)]
    pub id: Option<Loose>,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Error body the provider sends with HTTP 422.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationErrorBody {
    #[serde(default)]
    pub detail: Vec<ValidationDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationDetail {
    #[serde(default)]
    pub msg: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// Strictly typed view of a successful provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedDetection {
    pub total_words: u64,
    pub ai_words: u64,
    pub ai_probability: f64,
    pub sentences: Vec<String>,
    pub highlighted: Vec<String>,
    pub feedback: Option<String>,
    pub result_id: String,
    pub original_text: String,
    pub preprocessed_text: String,
}

impl From<ProviderData> for DecodedDetection {
    fn from(data: ProviderData) -> Self {
        // A malformed list drops sentence detail entirely rather than half of it.
        let (sentences, highlighted) = match (decode_list(&data.sentences), decode_list(&data.h)) {
            (Ok(s), Ok(h)) => (s, h),
            (s, h) => {
                tracing::warn!(
                    sentences_ok = s.is_ok(),
                    highlighted_ok = h.is_ok(),
                    "Unparseable sentence lists from provider, continuing without them"
                );
                (Vec::new(), Vec::new())
            }
        };

        let result_id = match data.id {
            Some(Loose::Text(s)) => s,
            Some(Loose::Int(n)) => n.to_string(),
            Some(Loose::Float(f)) => f.to_string(),
            Some(Loose::Bool(_)) | None => String::new(),
        };

        Self {
            total_words: data.text_words.as_ref().map_or(0, Loose::as_count),
            ai_words: data.ai_words.as_ref().map_or(0, Loose::as_count),
            ai_probability: data
                .fake_percentage
                .as_ref()
                .and_then(Loose::as_f64)
                .unwrap_or(0.0),
            sentences,
            highlighted,
            feedback: data.feedback.filter(|f| !f.trim().is_empty()),
            result_id,
            original_text: data.original_paragraph.unwrap_or_default(),
            preprocessed_text: data.input_text.unwrap_or_default(),
        }
    }
}

fn decode_list(list: &Option<SentenceList>) -> Result<Vec<String>, serde_json::Error> {
    match list {
        Some(list) => list.decode(),
        None => Ok(Vec::new()),
    }
}
