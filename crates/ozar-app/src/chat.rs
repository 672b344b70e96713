//! Rule-based chat responder.
//!
//! Input is lower-cased and checked against an ordered keyword table; the
//! first rule with a matching keyword answers. Rule order matters: "language"
//! appears in two rules and the earlier one always wins.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use ozar_types::models::{ChatMessage, Sender};

pub const WELCOME_MESSAGE: &str = "Hello! How can I help you today with Ozar Network Labs?";
pub const DEFAULT_REPLY: &str =
    "Thanks for your message! A team member will follow up shortly. Meanwhile, check our FAQ section.";
pub const DEFAULT_TYPING_DELAY: Duration = Duration::from_millis(1500);

pub struct Rule {
    pub keywords: &'static [&'static str],
    pub response: &'static str,
}

pub static RULES: &[Rule] = &[
    Rule {
        keywords: &["pricing", "cost", "price", "subscription", "plan"],
        response: "Our pricing starts at $19.99 per month. Visit our pricing page for all plans and details.",
    },
    Rule {
        keywords: &["lab", "environment", "virtual", "practice"],
        response: "Our virtual labs are available 24/7 and provide realistic, hands-on networking practice.",
    },
    Rule {
        keywords: &["support", "help", "contact", "assistance"],
        response: "Support is available Monday to Friday, 9AM–6PM ET. Premium users enjoy 24/7 support.",
    },
    Rule {
        keywords: &["certificate", "certification", "ccna", "ccnp", "exam"],
        response: "Yes, our labs are tailored to help you prepare for certifications like CCNA, CCNP, and more.",
    },
    Rule {
        keywords: &["account", "login", "sign in", "reset password"],
        response: "You can log in from the top-right corner. Trouble logging in? Try the 'Forgot Password' link.",
    },
    Rule {
        keywords: &["trial", "free", "demo", "sample"],
        response: "We offer a free trial with limited access. Just sign up to start exploring!",
    },
    Rule {
        keywords: &["cancel", "unsubscribe", "stop"],
        response: "You can cancel anytime from your account settings. Let us know if you need help with that.",
    },
    Rule {
        keywords: &["team", "group", "students", "organization"],
        response: "We offer special pricing for teams, students, and organizations. Contact us for a custom offer.",
    },
    Rule {
        keywords: &["bug", "error", "issue", "problem", "fail"],
        response: "Sorry for the trouble. Please describe the issue in detail and we'll look into it right away.",
    },
    Rule {
        keywords: &["mobile", "phone", "tablet", "ios", "android"],
        response: "Yes, our platform is fully accessible on mobile devices including iOS and Android.",
    },
    Rule {
        keywords: &["language", "arabic", "translation"],
        response: "Our platform currently supports English. Arabic interface is in progress — stay tuned!",
    },
    Rule {
        keywords: &["update", "new feature", "roadmap"],
        response: "We’re constantly improving! Check our blog or roadmap page for upcoming features and updates.",
    },
    Rule {
        keywords: &["browser", "chrome", "firefox", "compatibility"],
        response: "Our labs work best in Chrome or Firefox. Make sure your browser is up to date.",
    },
    Rule {
        keywords: &["dashboard", "control panel", "home screen"],
        response: "You can access your dashboard from the main menu after logging in. It shows your active labs and progress.",
    },
    Rule {
        keywords: &["payment", "billing", "invoice", "charged"],
        response: "All payment and billing details can be found in your account under the 'Billing' tab.",
    },
    Rule {
        keywords: &["student", "education", "school", "university"],
        response: "We offer discounts and special access for students. Reach out to us with a valid student email.",
    },
    Rule {
        keywords: &["teacher", "instructor", "trainer"],
        response: "Instructors can create class-based labs and monitor student progress. Contact us to set it up.",
    },
    Rule {
        keywords: &["delete account", "remove account", "close my account"],
        response: "We're sorry to see you go! You can delete your account from your profile settings.",
    },
    // Shadowed by the earlier "language" rule for any input containing "language"
    Rule {
        keywords: &["language", "translate", "interface language"],
        response: "Currently, our main interface is in English. We're working on adding more languages soon!",
    },
    Rule {
        keywords: &["api", "integration", "webhook"],
        response: "Our API and webhook documentation is available to advanced users. Contact us for access.",
    },
    Rule {
        keywords: &["linux", "windows", "mac"],
        response: "Our labs run in the cloud and can be accessed from any OS with a modern browser.",
    },
    Rule {
        keywords: &["data", "privacy", "security"],
        response: "We take data privacy seriously and follow strict security standards. Check our privacy policy for more.",
    },
    Rule {
        keywords: &["referral", "affiliate", "invite"],
        response: "We offer a referral program! Share your link and earn credits when friends sign up.",
    },
    Rule {
        keywords: &["feedback", "suggestion", "idea"],
        response: "We love feedback! Let us know what you'd like to see next on the platform.",
    },
    Rule {
        keywords: &["time limit", "session expired", "timeout"],
        response: "Lab sessions may time out after inactivity. You can restart them anytime from your dashboard.",
    },
    Rule {
        keywords: &["save", "progress", "history"],
        response: "Your progress is saved automatically. You can resume your labs anytime from where you left off.",
    },
    Rule {
        keywords: &["vpn", "firewall", "proxy"],
        response: "Some labs may require open ports. If you're on a VPN or restricted network, try switching or disabling it.",
    },
    Rule {
        keywords: &["browser issue", "display problem", "loading issue"],
        response: "Try clearing your browser cache or switching browsers. If the problem persists, let us know!",
    },
    Rule {
        keywords: &["multi-user", "shared account", "team access"],
        response: "Each user should have their own account. Team plans are available for group access.",
    },
    Rule {
        keywords: &["progress report", "lab completion", "score"],
        response: "You can view lab completion status and performance stats in your dashboard.",
    },
    Rule {
        keywords: &["live chat", "talk to agent", "human"],
        response: "We're here to help! A live agent will join the chat shortly if available.",
    },
    Rule {
        keywords: &["offline", "download", "access without internet"],
        response: "Currently, our labs require an internet connection. Offline mode is not yet supported.",
    },
    Rule {
        keywords: &["newsletter", "email updates", "subscribe"],
        response: "Join our newsletter to stay updated with new labs, features, and special offers!",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    /// Index into [`RULES`], `None` for the default reply.
    pub rule: Option<usize>,
    pub text: &'static str,
}

/// Pure: the same input always picks the same rule.
pub fn respond(input: &str) -> Reply {
    let lower = input.to_lowercase();
    RULES
        .iter()
        .position(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
        .map(|i| Reply {
            rule: Some(i),
            text: RULES[i].response,
        })
        .unwrap_or(Reply {
            rule: None,
            text: DEFAULT_REPLY,
        })
}

fn message(id: String, text: &str, sender: Sender) -> ChatMessage {
    ChatMessage {
        id,
        text: text.to_string(),
        sender,
        timestamp: Utc::now(),
    }
}

#[derive(Debug)]
struct Transcript {
    messages: Vec<ChatMessage>,
    typing: bool,
}

/// In-memory chat transcript. Nothing is persisted.
pub struct ChatSession {
    transcript: Arc<Mutex<Transcript>>,
    delay: Duration,
}

impl ChatSession {
    pub fn new(delay: Duration) -> Self {
        Self {
            transcript: Arc::new(Mutex::new(Transcript {
                messages: vec![message("welcome".into(), WELCOME_MESSAGE, Sender::Bot)],
                typing: false,
            })),
            delay,
        }
    }

    /// Record the user's message and schedule the bot reply after the typing
    /// delay. Blank input is ignored. The reply timer is not cancelled when
    /// the session is dropped.
    pub fn send(&self, text: &str) -> Option<JoinHandle<()>> {
        if text.trim().is_empty() {
            return None;
        }

        {
            let mut t = self.transcript.lock().ok()?;
            t.messages.push(message(Uuid::new_v4().to_string(), text, Sender::User));
            t.typing = true;
        }

        let reply = respond(text);
        debug!("Chat reply chosen: rule {:?}", reply.rule);
        let transcript = self.transcript.clone();
        let delay = self.delay;
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Ok(mut t) = transcript.lock() {
                t.messages.push(message(Uuid::new_v4().to_string(), reply.text, Sender::Bot));
                t.typing = false;
            }
        }))
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.transcript
            .lock()
            .map(|t| t.messages.clone())
            .unwrap_or_default()
    }

    pub fn is_typing(&self) -> bool {
        self.transcript.lock().map(|t| t.typing).unwrap_or(false)
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_DELAY)
    }
}
