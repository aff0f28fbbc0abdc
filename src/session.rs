use std::sync::RwLock;

use tokio::sync::broadcast::{self, Receiver, Sender};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    /// Admin endpoints live under `/admin/`, everything else is student-facing.
    pub fn for_path(path: &str) -> Role {
        if path.contains("/admin/") {
            Role::Admin
        } else {
            Role::Student
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    SignedOut(Role),
}

#[derive(Debug, Default)]
struct Tokens {
    admin: Option<String>,
    student: Option<String>,
}

/// Holds the opaque bearer tokens handed out by the backend.
#[derive(Debug)]
pub struct SessionStore {
    tokens: RwLock<Tokens>,
    events: Sender<SessionEvent>,
}

impl SessionStore {
    pub fn new(student_token: Option<String>, admin_token: Option<String>) -> SessionStore {
        let non_empty = |token: Option<String>| token.filter(|t| !t.trim().is_empty());

        SessionStore {
            tokens: RwLock::new(Tokens {
                admin: non_empty(admin_token),
                student: non_empty(student_token),
            }),
            events: broadcast::channel(16).0,
        }
    }

    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Picks the token to send with a request to `path`.
    ///
    /// Admin paths prefer the admin token, other paths prefer the student
    /// token. Either falls back to whichever token is present.
    pub fn bearer_for(&self, path: &str) -> Option<String> {
        let tokens = match self.tokens.read() {
            Ok(tokens) => tokens,
            Err(poisoned) => poisoned.into_inner(),
        };

        let (preferred, fallback) = match Role::for_path(path) {
            Role::Admin => (&tokens.admin, &tokens.student),
            Role::Student => (&tokens.student, &tokens.admin),
        };

        preferred.clone().or_else(|| fallback.clone())
    }

    pub fn is_signed_in(&self, role: Role) -> bool {
        let tokens = match self.tokens.read() {
            Ok(tokens) => tokens,
            Err(poisoned) => poisoned.into_inner(),
        };

        match role {
            Role::Admin => tokens.admin.is_some(),
            Role::Student => tokens.student.is_some(),
        }
    }

    /// Forgets the token of the role `path` belongs to and tells subscribers.
    pub fn expire_for(&self, path: &str) {
        let role = Role::for_path(path);

        {
            let mut tokens = match self.tokens.write() {
                Ok(tokens) => tokens,
                Err(poisoned) => poisoned.into_inner(),
            };

            match role {
                Role::Admin => tokens.admin = None,
                Role::Student => tokens.student = None,
            }
        }

        info!("Session of role {role:?} expired after a request to {path}");

        if self.events.send(SessionEvent::SignedOut(role)).is_err() {
            warn!("Nobody is listening for session events");
        }
    }
}
