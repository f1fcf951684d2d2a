//! Pure follow-up planning.
//!
//! One inbound event plus a settings snapshot produce the full batch of
//! scheduled records in a single computation. No clock, no store, no hidden
//! state: `scheduled_time` derives from the event's own timestamp.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use promokit_catalog::ProductSummary;
use promokit_config::{ConfigError, FollowUpRule, FollowUpSettings};
use promokit_core::{FollowUpId, InquiryId, ProductId, Recipient};

use crate::event::{InquiryCreated, InquiryQuoted};
use crate::model::{FollowUpChannel, FollowUpKind, FollowUpRecord, FollowUpStatus, MessageContent};
use crate::template::RenderContext;

/// Planning failure.
///
/// Fatal to the planning step only: the triggering inquiry is persisted by
/// the caller regardless of whether planning succeeded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Fan an inquiry-created event out into its scheduled follow-up batch.
///
/// Emits one record per (enabled rule × enabled channel × recipient):
/// auto-response and the two automated check-ins go to the customer, the
/// staff reminder fans out across every configured staff recipient.
pub fn plan_follow_ups(
    settings: &FollowUpSettings,
    event: &InquiryCreated,
) -> Result<Vec<FollowUpRecord>, PlanError> {
    settings.validate()?;

    let ctx = RenderContext::new(
        &event.customer,
        &event.products,
        event.message.as_deref(),
        event.created_at,
    );
    let customer = std::slice::from_ref(&event.customer);

    let mut records = Vec::new();
    let mut emit = |rule: &FollowUpRule, kind: FollowUpKind, recipients: &[Recipient]| {
        emit_rule(
            &mut records,
            rule,
            kind,
            recipients,
            event.inquiry_id,
            &event.products,
            &ctx,
            event.created_at,
        );
    };

    emit(&settings.auto_response, FollowUpKind::AutoResponse, customer);
    emit(
        &settings.staff_reminder,
        FollowUpKind::Reminder,
        &settings.staff_recipients,
    );
    emit(&settings.follow_up_1, FollowUpKind::ThankYou, customer);
    emit(&settings.follow_up_2, FollowUpKind::ThankYou, customer);

    Ok(records)
}

/// Re-trigger: the quote follow-up batch, scheduled from the moment the
/// inquiry was quoted.
pub fn plan_quote_follow_ups(
    settings: &FollowUpSettings,
    event: &InquiryQuoted,
) -> Result<Vec<FollowUpRecord>, PlanError> {
    settings.validate()?;

    let ctx = RenderContext::new(&event.customer, &event.products, None, event.quoted_at);

    let mut records = Vec::new();
    emit_rule(
        &mut records,
        &settings.quote_follow_up,
        FollowUpKind::QuoteFollowUp,
        std::slice::from_ref(&event.customer),
        event.inquiry_id,
        &event.products,
        &ctx,
        event.quoted_at,
    );

    Ok(records)
}

#[allow(clippy::too_many_arguments)]
fn emit_rule(
    records: &mut Vec<FollowUpRecord>,
    rule: &FollowUpRule,
    kind: FollowUpKind,
    recipients: &[Recipient],
    inquiry_id: InquiryId,
    products: &[ProductSummary],
    ctx: &RenderContext,
    base_time: DateTime<Utc>,
) {
    if !rule.enabled || !rule.channels.any_enabled() {
        return;
    }

    let scheduled_time = base_time + rule.delay();
    let body = ctx.render(&rule.template.body);
    let subject = rule.template.subject.as_deref().map(|s| ctx.render(s));
    let product_ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();

    for recipient in recipients {
        for channel in enabled_channels(rule) {
            if !deliverable(channel, recipient) {
                warn!(
                    inquiry_id = %inquiry_id,
                    kind = %kind,
                    channel = %channel,
                    recipient = %recipient.name,
                    "skipping follow-up: recipient has no address for this channel"
                );
                continue;
            }

            records.push(FollowUpRecord {
                id: FollowUpId::new(),
                inquiry_id,
                kind,
                channel,
                scheduled_time,
                sent_time: None,
                status: FollowUpStatus::Pending,
                content: MessageContent {
                    subject: subject.clone(),
                    body: body.clone(),
                    product_ids: product_ids.clone(),
                },
                recipient: recipient.clone(),
                error: None,
            });
        }
    }
}

fn enabled_channels(rule: &FollowUpRule) -> impl Iterator<Item = FollowUpChannel> + '_ {
    [
        (rule.channels.email, FollowUpChannel::Email),
        (rule.channels.whatsapp, FollowUpChannel::Whatsapp),
        (rule.channels.sms, FollowUpChannel::Sms),
    ]
    .into_iter()
    .filter_map(|(enabled, channel)| enabled.then_some(channel))
}

fn deliverable(channel: FollowUpChannel, recipient: &Recipient) -> bool {
    match channel {
        FollowUpChannel::Email => recipient.has_email(),
        FollowUpChannel::Whatsapp | FollowUpChannel::Sms => recipient.has_phone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::PLACEHOLDERS;
    use chrono::{Duration, TimeZone};
    use promokit_config::ChannelToggles;

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn settings() -> FollowUpSettings {
        FollowUpSettings {
            staff_recipients: vec![
                Recipient::new("Sales A").with_email("a@example.com"),
                Recipient::new("Sales B").with_email("b@example.com"),
            ],
            ..FollowUpSettings::default()
        }
    }

    fn two_product_event() -> InquiryCreated {
        InquiryCreated {
            inquiry_id: InquiryId::new(),
            products: vec![
                ProductSummary::new(ProductId::new(), "Widget"),
                ProductSummary::new(ProductId::new(), "Gadget"),
            ],
            customer: Recipient::new("Acme")
                .with_email("purchasing@acme.example")
                .with_phone("+4912345"),
            message: Some("Looking for a bulk discount.".to_string()),
            created_at: created_at(),
        }
    }

    #[test]
    fn full_fan_out_with_all_rules_enabled() {
        let settings = settings();
        let event = two_product_event();
        let records = plan_follow_ups(&settings, &event).unwrap();

        // 1 auto-response + 2 staff reminders + 2 automated check-ins.
        assert_eq!(records.len(), 5);

        let auto: Vec<_> = records
            .iter()
            .filter(|r| r.kind == FollowUpKind::AutoResponse)
            .collect();
        assert_eq!(auto.len(), 1);
        assert_eq!(auto[0].scheduled_time, created_at());
        assert_eq!(auto[0].recipient.name, "Acme");

        let reminders: Vec<_> = records
            .iter()
            .filter(|r| r.kind == FollowUpKind::Reminder)
            .collect();
        assert_eq!(reminders.len(), 2);
        for reminder in &reminders {
            assert_eq!(
                reminder.scheduled_time,
                created_at() + settings.staff_reminder.delay()
            );
        }
        let mut staff: Vec<_> = reminders.iter().map(|r| r.recipient.name.as_str()).collect();
        staff.sort_unstable();
        assert_eq!(staff, ["Sales A", "Sales B"]);

        let check_ins: Vec<_> = records
            .iter()
            .filter(|r| r.kind == FollowUpKind::ThankYou)
            .collect();
        assert_eq!(check_ins.len(), 2);
        let mut offsets: Vec<_> = check_ins
            .iter()
            .map(|r| r.scheduled_time - created_at())
            .collect();
        offsets.sort_unstable();
        assert_eq!(
            offsets,
            [settings.follow_up_1.delay(), settings.follow_up_2.delay()]
        );

        // All bodies fully substituted.
        for record in &records {
            assert_eq!(record.status, FollowUpStatus::Pending);
            assert_eq!(record.inquiry_id, event.inquiry_id);
            assert_eq!(record.content.product_ids.len(), 2);
            for placeholder in PLACEHOLDERS {
                assert!(
                    !record.content.body.contains(placeholder),
                    "{placeholder} leaked into a {} body",
                    record.kind
                );
            }
        }
    }

    #[test]
    fn minimal_scenario_produces_exactly_one_auto_response() {
        // Inquiry at 2024-01-01T00:00:00Z, auto-response delay 0 over email,
        // all other rules off.
        let mut settings = settings();
        settings.staff_reminder.enabled = false;
        settings.follow_up_1.enabled = false;
        settings.follow_up_2.enabled = false;
        settings.auto_response.delay_minutes = 0;
        settings.auto_response.channels = ChannelToggles::email_only();

        let event = InquiryCreated {
            inquiry_id: InquiryId::new(),
            products: vec![ProductSummary::new(ProductId::new(), "Widget")],
            customer: Recipient::new("Acme").with_email("acme@example.com"),
            message: None,
            created_at: created_at(),
        };

        let records = plan_follow_ups(&settings, &event).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.kind, FollowUpKind::AutoResponse);
        assert_eq!(record.channel, FollowUpChannel::Email);
        assert_eq!(record.scheduled_time, created_at());
        assert_eq!(record.status, FollowUpStatus::Pending);
        assert!(record.content.body.contains("Acme"));
        assert!(record.content.body.contains("Widget"));
    }

    #[test]
    fn disabled_rules_and_channels_emit_nothing() {
        let mut settings = settings();
        settings.auto_response.enabled = false;
        settings.follow_up_1.channels = ChannelToggles::default();

        let records = plan_follow_ups(&settings, &two_product_event()).unwrap();
        assert!(records.iter().all(|r| r.kind != FollowUpKind::AutoResponse));
        // follow_up_2 is the only remaining customer check-in.
        assert_eq!(
            records
                .iter()
                .filter(|r| r.kind == FollowUpKind::ThankYou)
                .count(),
            1
        );
    }

    #[test]
    fn multi_channel_rules_fan_out_per_channel() {
        let mut settings = settings();
        settings.auto_response.channels = ChannelToggles {
            email: true,
            whatsapp: true,
            sms: true,
        };

        let records = plan_follow_ups(&settings, &two_product_event()).unwrap();
        let mut channels: Vec<_> = records
            .iter()
            .filter(|r| r.kind == FollowUpKind::AutoResponse)
            .map(|r| r.channel)
            .collect();
        channels.sort_by_key(|c| c.as_str());
        assert_eq!(
            channels,
            [
                FollowUpChannel::Email,
                FollowUpChannel::Sms,
                FollowUpChannel::Whatsapp
            ]
        );
    }

    #[test]
    fn recipients_without_an_address_for_the_channel_are_skipped() {
        let mut settings = settings();
        settings.auto_response.channels = ChannelToggles {
            email: true,
            whatsapp: true,
            sms: false,
        };

        let mut event = two_product_event();
        event.customer = Recipient::new("Acme").with_email("acme@example.com"); // no phone

        let records = plan_follow_ups(&settings, &event).unwrap();
        let auto: Vec<_> = records
            .iter()
            .filter(|r| r.kind == FollowUpKind::AutoResponse)
            .collect();
        assert_eq!(auto.len(), 1);
        assert_eq!(auto[0].channel, FollowUpChannel::Email);
    }

    #[test]
    fn invalid_settings_abort_planning() {
        let mut settings = settings();
        settings.auto_response.template.body = String::new();

        let err = plan_follow_ups(&settings, &two_product_event()).unwrap_err();
        assert!(matches!(err, PlanError::Config(_)));
    }

    #[test]
    fn quote_event_produces_the_quote_batch_from_quoted_at() {
        let settings = settings();
        let quoted_at = created_at() + Duration::days(2);
        let event = InquiryQuoted {
            inquiry_id: InquiryId::new(),
            products: vec![ProductSummary::new(ProductId::new(), "Widget")],
            customer: Recipient::new("Acme").with_email("acme@example.com"),
            quoted_at,
        };

        let records = plan_quote_follow_ups(&settings, &event).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, FollowUpKind::QuoteFollowUp);
        assert_eq!(
            records[0].scheduled_time,
            quoted_at + settings.quote_follow_up.delay()
        );
        assert!(records[0].content.body.contains("Widget"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: every planned record is pending, scheduled exactly
            /// at `created_at + its rule's delay`, and bodies are fully
            /// rendered.
            #[test]
            fn planning_is_anchored_to_the_event_timestamp(
                auto_delay in 0i64..10_000,
                reminder_delay in 0i64..10_000,
                product_count in 0usize..4
            ) {
                let mut settings = settings();
                settings.auto_response.delay_minutes = auto_delay;
                settings.staff_reminder.delay_minutes = reminder_delay;

                let products = (0..product_count)
                    .map(|i| ProductSummary::new(ProductId::new(), format!("Product {i}")))
                    .collect();
                let event = InquiryCreated {
                    inquiry_id: InquiryId::new(),
                    products,
                    customer: Recipient::new("Acme").with_email("acme@example.com"),
                    message: None,
                    created_at: created_at(),
                };

                let records = plan_follow_ups(&settings, &event).unwrap();
                for record in &records {
                    prop_assert_eq!(record.status, FollowUpStatus::Pending);
                    let expected = match record.kind {
                        FollowUpKind::AutoResponse => settings.auto_response.delay(),
                        FollowUpKind::Reminder => settings.staff_reminder.delay(),
                        FollowUpKind::ThankYou if record.scheduled_time
                            == created_at() + settings.follow_up_1.delay() =>
                            settings.follow_up_1.delay(),
                        FollowUpKind::ThankYou => settings.follow_up_2.delay(),
                        FollowUpKind::QuoteFollowUp => unreachable!("not planned here"),
                    };
                    prop_assert_eq!(record.scheduled_time, created_at() + expected);
                    for placeholder in PLACEHOLDERS {
                        prop_assert!(!record.content.body.contains(placeholder));
                    }
                }
            }
        }
    }
}
