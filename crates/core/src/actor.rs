use serde::{Deserialize, Serialize};

use crate::{AppResult, NonEmptyString};

/// Operator performing a state-changing action on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    login: NonEmptyString,
    display_name: Option<String>,
}

impl Actor {
    /// Creates an actor from a login and an optional display name.
    pub fn new(login: impl Into<String>, display_name: Option<String>) -> AppResult<Self> {
        Ok(Self {
            login: NonEmptyString::new(login.into().trim())?,
            display_name: display_name
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty()),
        })
    }

    /// Returns the login recorded in audit rows.
    #[must_use]
    pub fn login(&self) -> &str {
        self.login.as_str()
    }

    /// Returns the display name, falling back to the login.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(self.login.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Actor;

    #[test]
    fn actor_trims_login_and_falls_back_to_it_for_display() {
        let actor = Actor::new("  joana.s ", Some("   ".to_owned()));
        assert!(actor.is_ok());

        let actor = actor.unwrap_or_else(|_| unreachable!());
        assert_eq!(actor.login(), "joana.s");
        assert_eq!(actor.display_name(), "joana.s");
    }

    #[test]
    fn actor_rejects_blank_login() {
        assert!(Actor::new(" ", None).is_err());
    }
}
