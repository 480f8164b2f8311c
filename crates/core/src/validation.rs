//! Contact form validation.
//!
//! A raw `ContactForm` is turned into a `Submission` in a single pass:
//! - `email` must be a syntactically valid address and is normalized
//! - `name` and `message` are trimmed, must be non-empty and are HTML-escaped
//!
//! Every failing field produces one `FieldViolation`; the list is returned
//! whole so clients can highlight all problems at once.

use email_address::{EmailAddress, Options};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum email length (RFC 5321 path limit).
const MAX_EMAIL_LENGTH: usize = 254;

const INVALID_EMAIL: &str = "Invalid email address";
const NAME_REQUIRED: &str = "Name is required";
const MESSAGE_REQUIRED: &str = "Message is required";

/// Providers whose sub-addresses (`user+tag`) are folded into the base mailbox.
const PLUS_ADDRESSING_DOMAINS: &[&str] = &[
    "outlook.com",
    "hotmail.com",
    "hotmail.co.uk",
    "hotmail.fr",
    "hotmail.de",
    "live.com",
    "live.co.uk",
    "msn.com",
    "icloud.com",
    "me.com",
    "mac.com",
];

/// Yahoo uses `-` as the sub-address separator.
const YAHOO_DOMAINS: &[&str] = &[
    "yahoo.com",
    "yahoo.co.uk",
    "yahoo.fr",
    "yahoo.de",
    "yahoo.ca",
    "ymail.com",
    "rocketmail.com",
];

/// Raw contact form body as posted by the client.
///
/// Fields are kept as JSON values so that missing or non-string fields end up
/// as validation failures instead of body rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub message: Option<Value>,
}

/// A single field failure, serialized as `{ type, value, msg, path, location }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
    pub msg: &'static str,
    pub path: &'static str,
    pub location: &'static str,
}

impl FieldViolation {
    /// Violation of a field in the request body.
    #[must_use]
    pub fn body(path: &'static str, value: impl Into<String>, msg: &'static str) -> Self {
        Self {
            kind: "field",
            value: value.into(),
            msg,
            path,
            location: "body",
        }
    }
}

/// Validated and sanitized contact submission.
///
/// Only obtainable through [`ContactForm::validate`]: `name` and `message` are
/// non-empty and already HTML-escaped, `email` is valid and normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    name: String,
    email: String,
    message: String,
}

impl Submission {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ContactForm {
    /// Validate and sanitize the form.
    ///
    /// # Errors
    /// Returns one `FieldViolation` per failing field, ordered
    /// `email`, `name`, `message`.
    pub fn validate(self) -> Result<Submission, Vec<FieldViolation>> {
        let mut violations = Vec::new();

        let email = field_text(self.email);
        let email = match validate_email(&email) {
            Ok(normalized) => Some(normalized),
            Err(msg) => {
                violations.push(FieldViolation::body("email", email, msg));
                None
            }
        };

        let name = required_text("name", field_text(self.name), NAME_REQUIRED, &mut violations);
        let message = required_text(
            "message",
            field_text(self.message),
            MESSAGE_REQUIRED,
            &mut violations,
        );

        match (name, email, message) {
            (Some(name), Some(email), Some(message)) if violations.is_empty() => Ok(Submission {
                name,
                email,
                message,
            }),
            _ => Err(violations),
        }
    }
}

/// Validate an email address and return its normalized form.
///
/// # Errors
/// Returns the violation message if the address is not syntactically valid.
fn validate_email(candidate: &str) -> Result<String, &'static str> {
    if is_valid_email(candidate) {
        Ok(normalize_email(candidate))
    } else {
        Err(INVALID_EMAIL)
    }
}

fn is_valid_email(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.len() > MAX_EMAIL_LENGTH {
        return false;
    }

    // Bare addresses only; `Name <addr>` display forms are rejected.
    let options = Options::default().without_display_text();
    let Ok(address) = EmailAddress::parse_with_options(candidate, options) else {
        return false;
    };

    // Require a dotted host name; reject `user@localhost` and `[ip]` literals.
    let domain = address.domain();
    !domain.starts_with('[') && domain.contains('.') && !domain.ends_with('.')
}

/// Canonicalize an email address.
///
/// Lower-cases the whole address, maps `googlemail.com` to `gmail.com`, drops
/// dots from Gmail local parts and strips provider sub-addresses.
#[must_use]
pub fn normalize_email(address: &str) -> String {
    let lowered = address.to_lowercase();
    let Some((local, domain)) = lowered.rsplit_once('@') else {
        return lowered;
    };

    let (local, domain) = match domain {
        "gmail.com" | "googlemail.com" => (strip_subaddress(local, '+').replace('.', ""), "gmail.com"),
        d if PLUS_ADDRESSING_DOMAINS.contains(&d) => (strip_subaddress(local, '+').to_string(), d),
        d if YAHOO_DOMAINS.contains(&d) => (strip_subaddress(local, '-').to_string(), d),
        d => (local.to_string(), d),
    };

    format!("{local}@{domain}")
}

fn strip_subaddress(local: &str, separator: char) -> &str {
    match local.split_once(separator) {
        Some((base, _)) if !base.is_empty() => base,
        _ => local,
    }
}

/// Escape characters that could inject markup into generated HTML.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Trim, require non-empty, then escape.
fn required_text(
    path: &'static str,
    raw: String,
    msg: &'static str,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        violations.push(FieldViolation::body(path, trimmed, msg));
        None
    } else {
        Some(escape_html(trimmed))
    }
}

/// Coerce a JSON value to the text that gets validated.
fn field_text(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}
