//! Contact notification template.

use super::OutgoingEmail;

/// Contact notification data.
///
/// `name` and `message` must already be HTML-escaped; `email` is escaped here.
pub struct ContactEmail<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub message: &'a str,
}

impl ContactEmail<'_> {
    /// Subject line derived from the sender name.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("New message from {}", self.name)
    }

    /// Render HTML version of the email. Newlines become `<br>`.
    #[must_use]
    pub fn render_html(&self) -> String {
        format!(
            r"<h3>New message from {name}</h3>
<p><strong>Email:</strong> {email}</p>
<p><strong>Message:</strong></p>
<p>{message}</p>",
            name = self.name,
            email = html_escape(self.email),
            message = self.message.replace('\n', "<br>"),
        )
    }

    /// Render plain text version of the email.
    #[must_use]
    pub fn render_text(&self) -> String {
        self.message.to_string()
    }

    /// Compose the outbound message for `to`, replying to the submitter.
    #[must_use]
    pub fn compose(&self, to: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            reply_to: self.email.to_string(),
            subject: self.subject(),
            html_body: self.render_html(),
            text_body: self.render_text(),
        }
    }
}

/// Simple HTML escaping for template values.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> ContactEmail<'static> {
        ContactEmail {
            name: "Ada",
            email: "ada@example.com",
            message: "Hello\nWorld",
        }
    }

    #[test]
    fn renders_line_breaks_in_html() {
        let html = ada().render_html();
        assert!(html.contains("<h3>New message from Ada</h3>"));
        assert!(html.contains("<strong>Email:</strong> ada@example.com"));
        assert!(html.contains("<p>Hello<br>World</p>"));
    }

    #[test]
    fn text_body_keeps_newlines() {
        assert_eq!(ada().render_text(), "Hello\nWorld");
    }

    #[test]
    fn subject_uses_name() {
        assert_eq!(ada().subject(), "New message from Ada");
    }

    #[test]
    fn escapes_html_in_email() {
        let email = ContactEmail {
            name: "Ada",
            email: "o'brien@example.com",
            message: "Hi",
        };
        assert!(email.render_html().contains("o&#39;brien@example.com"));
    }

    #[test]
    fn compose_fills_envelope() {
        let outgoing = ada().compose("owner@example.com");
        assert_eq!(outgoing.to, "owner@example.com");
        assert_eq!(outgoing.reply_to, "ada@example.com");
        assert_eq!(outgoing.subject, "New message from Ada");
        assert_eq!(outgoing.text_body, "Hello\nWorld");
        assert!(outgoing.html_body.contains("Hello<br>World"));
    }
}
