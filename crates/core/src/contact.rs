//! Contact primitives shared by settings and follow-up records.

use serde::{Deserialize, Serialize};

/// A named message recipient (customer or staff member).
///
/// Either address may be absent; whether that matters depends on the channel
/// a message is sent over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Recipient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            phone: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }

    pub fn has_phone(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_addresses_do_not_count() {
        let r = Recipient::new("Dana").with_email("   ");
        assert!(!r.has_email());
        assert!(!r.has_phone());

        let r = Recipient::new("Dana").with_email("dana@example.com");
        assert!(r.has_email());
    }
}
