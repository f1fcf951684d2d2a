//! Settings snapshot types and their validation.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use promokit_core::Recipient;

/// Settings error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing settings: {0}")]
    Missing(String),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn missing(msg: impl Into<String>) -> Self {
        Self::Missing(msg.into())
    }
}

/// Per-queue automation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSettings {
    /// Disabled queues accept enqueues but are skipped by the dispatcher.
    pub enabled: bool,
    /// Priority applied when the caller does not specify one.
    pub default_priority: i32,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            default_priority: 0,
        }
    }
}

/// Automation settings for the job pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationSettings {
    pub product_generation: QueueSettings,
    pub seo_optimization: QueueSettings,
}

/// Which transports a follow-up rule fans out over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelToggles {
    pub email: bool,
    pub whatsapp: bool,
    pub sms: bool,
}

impl ChannelToggles {
    pub fn email_only() -> Self {
        Self {
            email: true,
            ..Self::default()
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.email || self.whatsapp || self.sms
    }
}

/// Message template for one follow-up rule.
///
/// Bodies may reference the placeholders `{customer_name}`,
/// `{product_names}`, `{product_links}`, `{product_details}`,
/// `{inquiry_date}` and `{inquiry_details}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub subject: Option<String>,
    pub body: String,
}

impl MessageTemplate {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            subject: None,
            body: body.into(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

/// One follow-up rule: when to send, over which channels, what to say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpRule {
    pub enabled: bool,
    /// Offset from the triggering event, in minutes.
    pub delay_minutes: i64,
    pub channels: ChannelToggles,
    pub template: MessageTemplate,
}

impl FollowUpRule {
    pub fn delay(&self) -> Duration {
        Duration::minutes(self.delay_minutes)
    }
}

/// Follow-up scheduling settings: one rule per communication the pipeline
/// fans out from an inquiry, plus the staff list the reminder rule targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpSettings {
    pub auto_response: FollowUpRule,
    pub staff_reminder: FollowUpRule,
    pub follow_up_1: FollowUpRule,
    pub follow_up_2: FollowUpRule,
    pub quote_follow_up: FollowUpRule,
    pub staff_recipients: Vec<Recipient>,
}

impl Default for FollowUpSettings {
    fn default() -> Self {
        Self {
            auto_response: FollowUpRule {
                enabled: true,
                delay_minutes: 0,
                channels: ChannelToggles::email_only(),
                template: MessageTemplate::new(
                    "Hi {customer_name}, thanks for your interest in {product_names}. \
                     We received your inquiry on {inquiry_date} and will get back to you shortly.\n\n\
                     {product_links}",
                )
                .with_subject("We received your inquiry"),
            },
            staff_reminder: FollowUpRule {
                enabled: true,
                delay_minutes: 60,
                channels: ChannelToggles::email_only(),
                template: MessageTemplate::new(
                    "New inquiry from {customer_name} ({inquiry_date}) about {product_names}.\n\n\
                     {inquiry_details}",
                )
                .with_subject("Inquiry awaiting a reply"),
            },
            follow_up_1: FollowUpRule {
                enabled: true,
                delay_minutes: 24 * 60,
                channels: ChannelToggles::email_only(),
                template: MessageTemplate::new(
                    "Hi {customer_name}, thank you again for asking about {product_names}. \
                     Here is everything in one place:\n\n{product_details}",
                )
                .with_subject("More about {product_names}"),
            },
            follow_up_2: FollowUpRule {
                enabled: true,
                delay_minutes: 3 * 24 * 60,
                channels: ChannelToggles::email_only(),
                template: MessageTemplate::new(
                    "Hi {customer_name}, just checking in. Is there anything else you would \
                     like to know about {product_names}?",
                )
                .with_subject("Still thinking it over?"),
            },
            quote_follow_up: FollowUpRule {
                enabled: true,
                delay_minutes: 2 * 24 * 60,
                channels: ChannelToggles::email_only(),
                template: MessageTemplate::new(
                    "Hi {customer_name}, we sent you a quote for {product_names}. Did it \
                     answer your questions?",
                )
                .with_subject("About your quote"),
            },
            staff_recipients: Vec::new(),
        }
    }
}

impl FollowUpSettings {
    /// Validate the snapshot before planning.
    ///
    /// Planning aborts on the first violation; the triggering inquiry is the
    /// caller's to persist either way.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, rule) in self.rules() {
            if !rule.enabled {
                continue;
            }
            if rule.delay_minutes < 0 {
                return Err(ConfigError::invalid(format!(
                    "{name}: delay_minutes must not be negative"
                )));
            }
            if rule.template.body.trim().is_empty() {
                return Err(ConfigError::invalid(format!(
                    "{name}: template body must not be empty"
                )));
            }
        }

        if self.staff_reminder.enabled
            && self.staff_reminder.channels.any_enabled()
            && self.staff_recipients.is_empty()
        {
            return Err(ConfigError::missing(
                "staff_recipients: staff reminder is enabled but no recipients are configured",
            ));
        }

        Ok(())
    }

    fn rules(&self) -> [(&'static str, &FollowUpRule); 5] {
        [
            ("auto_response", &self.auto_response),
            ("staff_reminder", &self.staff_reminder),
            ("follow_up_1", &self.follow_up_1),
            ("follow_up_2", &self.follow_up_2),
            ("quote_follow_up", &self.quote_follow_up),
        ]
    }
}
