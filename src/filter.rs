use std::fmt;

use alloy::primitives::Address;

use crate::event::RawEvent;

/// Optional equality constraints applied server-side on every log query.
///
/// Both fields correspond to indexed event parameters, so a constrained scan
/// transfers only the matching logs. An empty filter matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFilter {
    user: Option<Address>,
    token: Option<Address>,
}

impl EventFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the scan to events emitted for `user`.
    #[must_use]
    pub fn user(mut self, user: Address) -> Self {
        self.user = Some(user);
        self
    }

    /// Restricts the scan to events emitted for `token`.
    #[must_use]
    pub fn token(mut self, token: Address) -> Self {
        self.token = Some(token);
        self
    }

    #[must_use]
    pub fn user_constraint(&self) -> Option<Address> {
        self.user
    }

    #[must_use]
    pub fn token_constraint(&self) -> Option<Address> {
        self.token
    }

    /// Whether `event` satisfies every constraint. RPC sources translate the
    /// constraints into topic filters instead; in-memory sources apply this
    /// directly.
    #[must_use]
    pub fn matches(&self, event: &RawEvent) -> bool {
        self.user.is_none_or(|user| user == event.user)
            && self.token.is_none_or(|token| token == event.token)
    }
}

impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.user {
            Some(user) => write!(f, "user={user}")?,
            None => write!(f, "user=any")?,
        }
        match self.token {
            Some(token) => write!(f, ", token={token}"),
            None => write!(f, ", token=any"),
        }
    }
}
