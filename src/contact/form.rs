//! The in-terminal contact form and its background submission.

use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

/// Subject sent when the visitor leaves it blank.
pub const DEFAULT_SUBJECT: &str = "Message from CosmoMinds";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub const SENT_MESSAGE: &str = "Thanks! Your message was sent. We'll reply soon.";
pub const FAILED_MESSAGE: &str = "Sorry, something went wrong. Please try again.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Field {
    #[default]
    Name,
    Email,
    Subject,
    Message,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Name, Field::Email, Field::Subject, Field::Message];

    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Email => "Email",
            Field::Subject => "Subject",
            Field::Message => "Message",
        }
    }

    fn next(self) -> Field {
        match self {
            Field::Name => Field::Email,
            Field::Email => Field::Subject,
            Field::Subject => Field::Message,
            Field::Message => Field::Name,
        }
    }

    fn prev(self) -> Field {
        match self {
            Field::Name => Field::Message,
            Field::Email => Field::Name,
            Field::Subject => Field::Email,
            Field::Message => Field::Subject,
        }
    }
}

/// Result of one submission, reported back to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Sent,
    /// The service answered but refused (its `error` text)
    Rejected(String),
    /// The request never completed
    Failed(String),
}

#[derive(Deserialize)]
struct ServiceReply {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// `something@host.tld`, no whitespace anywhere.
pub fn email_looks_valid(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((user, host)) = email.split_once('@') else {
        return false;
    };
    match host.rsplit_once('.') {
        Some((domain, tld)) => !user.is_empty() && !domain.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[derive(Debug, Default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    /// Optional; blank sends [`DEFAULT_SUBJECT`]
    pub subject: String,
    pub message: String,
    focus: Field,
    loading: bool,
}

impl ContactForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Subject => &mut self.subject,
            Field::Message => &mut self.message,
        }
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Subject => &self.subject,
            Field::Message => &self.message,
        }
    }

    /// Typing is ignored while a submission is in flight.
    pub fn push_char(&mut self, c: char) {
        if !self.loading {
            let field = self.focus;
            self.value_mut(field).push(c);
        }
    }

    pub fn backspace(&mut self) {
        if !self.loading {
            let field = self.focus;
            self.value_mut(field).pop();
        }
    }

    /// Inline validation message for `field`, if it is not acceptable yet.
    pub fn error(&self, field: Field) -> Option<&'static str> {
        match field {
            Field::Name if self.name.trim().is_empty() => Some("Please enter your name"),
            Field::Email if !email_looks_valid(self.email.trim()) => Some("Please enter a valid email"),
            Field::Message if self.message.trim().is_empty() => Some("Please enter a message"),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        Field::ALL.iter().all(|f| self.error(*f).is_none())
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Submit is available only for a valid form with nothing in flight.
    pub fn can_submit(&self) -> bool {
        self.is_valid() && !self.loading
    }

    /// Post the form to `endpoint` on a background thread; the outcome
    /// arrives on `done`. Returns false when submission is not allowed.
    pub fn submit(&mut self, endpoint: &str, done: Sender<SubmitOutcome>) -> bool {
        if !self.can_submit() {
            return false;
        }
        self.loading = true;

        let endpoint = endpoint.to_string();
        let body = json!({
            "name": self.name.trim(),
            "email": self.email.trim(),
            "subject": self.subject_or_default(),
            "message": self.message.trim(),
            "botField": "",
        });
        thread::spawn(move || {
            let outcome = post(&endpoint, &body);
            debug!(?outcome, "contact submission finished");
            let _ = done.send(outcome);
        });
        true
    }

    pub fn subject_or_default(&self) -> &str {
        match self.subject.trim() {
            "" => DEFAULT_SUBJECT,
            subject => subject,
        }
    }

    /// Apply a finished submission. A successful send clears the form;
    /// anything else keeps it for a manual retry.
    pub fn finish(&mut self, outcome: &SubmitOutcome) {
        self.loading = false;
        if *outcome == SubmitOutcome::Sent {
            self.name.clear();
            self.email.clear();
            self.subject.clear();
            self.message.clear();
            self.focus = Field::Name;
        }
    }
}

fn post(endpoint: &str, body: &serde_json::Value) -> SubmitOutcome {
    let client = match reqwest::blocking::Client::builder().timeout(REQUEST_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => return SubmitOutcome::Failed(e.to_string()),
    };
    let resp = match client.post(endpoint).json(body).send() {
        Ok(resp) => resp,
        Err(e) => {
            warn!(error = %e, "contact request failed");
            return SubmitOutcome::Failed(e.to_string());
        }
    };

    let status = resp.status();
    let reply: ServiceReply = resp.json().unwrap_or(ServiceReply { ok: false, error: None });
    if status.is_success() && reply.ok {
        SubmitOutcome::Sent
    } else {
        SubmitOutcome::Rejected(reply.error.unwrap_or_else(|| format!("HTTP {status}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::testing::{spawn, RecordingMailer};
    use std::sync::mpsc;
    use std::sync::Arc;

    fn filled() -> ContactForm {
        let mut form = ContactForm::new();
        form.name = "Ann".to_string();
        form.email = "ann@example.org".to_string();
        form.message = "Lovely globe, thanks!".to_string();
        form
    }

    #[test]
    fn test_email_rule() {
        assert!(email_looks_valid("a@b.co"));
        assert!(email_looks_valid("first.last@sub.example.org"));
        assert!(!email_looks_valid("a@b"));
        assert!(!email_looks_valid("@b.co"));
        assert!(!email_looks_valid("a b@c.de"));
        assert!(!email_looks_valid("a@.de"));
        assert!(!email_looks_valid("a@b."));
    }

    #[test]
    fn test_inline_validation() {
        let mut form = ContactForm::new();
        assert!(!form.is_valid());
        assert!(form.error(Field::Name).is_some());

        form.name = "  ".to_string();
        assert!(form.error(Field::Name).is_some());
        form.name = "Ann".to_string();
        form.email = "ann@example.org".to_string();
        form.message = " \n ".to_string();
        assert_eq!(form.error(Field::Message), Some("Please enter a message"));
        // Short messages are fine, the service takes any non-empty text
        form.message = "Hi there".to_string();
        assert!(form.is_valid());
        // Subject is optional
        assert!(form.error(Field::Subject).is_none());
    }

    #[test]
    fn test_blank_subject_uses_default() {
        let mut form = filled();
        assert_eq!(form.subject_or_default(), DEFAULT_SUBJECT);
        form.subject = "  Data question ".to_string();
        assert_eq!(form.subject_or_default(), "Data question");
        form.finish(&SubmitOutcome::Sent);
        assert!(form.subject.is_empty());
    }

    #[test]
    fn test_typing_follows_focus() {
        let mut form = ContactForm::new();
        form.push_char('A');
        form.focus_next();
        form.push_char('x');
        form.focus_next();
        form.push_char('s');
        form.focus_prev();
        form.focus_prev();
        form.focus_prev();
        assert_eq!(form.focus(), Field::Message);
        form.push_char('m');
        form.backspace();
        assert_eq!(
            (form.value(Field::Name), form.value(Field::Email), form.value(Field::Subject), form.value(Field::Message)),
            ("A", "x", "s", "")
        );
    }

    #[test]
    fn test_invalid_form_does_not_submit() {
        let (tx, _rx) = mpsc::channel();
        let mut form = ContactForm::new();
        assert!(!form.submit("http://127.0.0.1:9/api/contact", tx));
        assert!(!form.is_loading());
    }

    #[test]
    fn test_unreachable_service_fails_and_keeps_form() {
        let (tx, rx) = mpsc::channel();
        let mut form = filled();
        // Port 9 (discard) is closed on test machines
        assert!(form.submit("http://127.0.0.1:9/api/contact", tx.clone()));
        assert!(form.is_loading());
        assert!(!form.submit("http://127.0.0.1:9/api/contact", tx));

        form.push_char('z');
        assert_eq!(form.name, "Ann");

        let outcome = rx.recv_timeout(Duration::from_secs(20)).expect("outcome");
        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        form.finish(&outcome);
        assert!(!form.is_loading());
        assert_eq!(form.name, "Ann");
    }

    #[test]
    fn test_round_trip_against_service() {
        let runtime = tokio::runtime::Runtime::new().expect("runtime");
        let mailer = Arc::new(RecordingMailer::default());
        let base = runtime.block_on(spawn(Arc::clone(&mailer)));

        let (tx, rx) = mpsc::channel();
        let mut form = filled();
        assert!(form.submit(&format!("{base}/api/contact"), tx));
        let outcome = rx.recv_timeout(Duration::from_secs(20)).expect("outcome");
        assert_eq!(outcome, SubmitOutcome::Sent);
        form.finish(&outcome);
        assert!(form.name.is_empty());
        assert_eq!(mailer.count(), 1);
    }

    #[test]
    fn test_service_rejection_is_reported() {
        let runtime = tokio::runtime::Runtime::new().expect("runtime");
        let mailer = Arc::new(RecordingMailer::failing());
        let base = runtime.block_on(spawn(mailer));

        let (tx, rx) = mpsc::channel();
        let mut form = filled();
        form.submit(&format!("{base}/api/contact"), tx);
        let outcome = rx.recv_timeout(Duration::from_secs(20)).expect("outcome");
        assert_eq!(outcome, SubmitOutcome::Rejected("Email failed".to_string()));
    }
}
