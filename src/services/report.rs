use crate::domain::batch::{BatchReport, DeliveryAttempt, RecipientOutcome};
use crate::services::dispatch::DeliveryPlan;
use std::collections::HashMap;

/// Folds finished attempts into per-recipient and global counters.
///
/// Recipients appear in `per_recipient` in the order their first attempt was made.
#[must_use]
pub fn aggregate(plan: &DeliveryPlan, attempts: Vec<DeliveryAttempt>) -> BatchReport {
    let mut per_recipient: Vec<RecipientOutcome> = Vec::new();
    let mut index = HashMap::new();
    let (mut total_sent, mut total_failed) = (0, 0);

    for attempt in &attempts {
        let slot = *index.entry(attempt.recipient.clone()).or_insert_with(|| {
            per_recipient.push(RecipientOutcome {
                recipient: attempt.recipient.clone(),
                messages_sent: 0,
                messages_failed: 0,
            });
            per_recipient.len() - 1
        });

        let outcome = &mut per_recipient[slot];
        if attempt.is_sent() {
            outcome.messages_sent += 1;
            total_sent += 1;
        } else {
            outcome.messages_failed += 1;
            total_failed += 1;
        }
    }

    BatchReport {
        mode: plan.mode,
        recipients: plan.recipients.clone(),
        messages: plan.messages.clone(),
        total_sent,
        total_failed,
        per_recipient,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::batch::{DeliveryOutcome, DispatchMode};
    use crate::domain::feed::FeedRow;
    use crate::domain::recipient::Recipient;

    fn attempt(sequence: usize, recipient: &str, sent: bool) -> DeliveryAttempt {
        DeliveryAttempt {
            sequence,
            recipient: Recipient::parse(recipient, "55").unwrap(),
            body: "msg".into(),
            outcome: if sent { DeliveryOutcome::Sent } else { DeliveryOutcome::Failed },
            error: (!sent).then(|| "boom".to_string()),
        }
    }

    fn plan(recipients: &[&str]) -> DeliveryPlan {
        let rows = recipients.iter().map(|r| FeedRow { recipient: (*r).to_string(), body: "msg".into() }).collect();
        DeliveryPlan::build(rows, DispatchMode::Paired, "55")
    }

    #[test]
    fn test_counts_per_recipient_in_first_encounter_order() {
        let attempts = vec![
            attempt(0, "5521", true),
            attempt(1, "5511", false),
            attempt(2, "5521", false),
            attempt(3, "5511", true),
            attempt(4, "5533", true),
        ];
        let report = aggregate(&plan(&["5521", "5511", "5521", "5511", "5533"]), attempts);

        assert_eq!(report.total_sent, 3);
        assert_eq!(report.total_failed, 2);
        let summary: Vec<_> = report
            .per_recipient
            .iter()
            .map(|o| (o.recipient.to_string(), o.messages_sent, o.messages_failed))
            .collect();
        assert_eq!(
            summary,
            vec![("5521".into(), 1, 1), ("5511".into(), 1, 1), ("5533".into(), 1, 0)]
        );
        assert_eq!(report.total_sent + report.total_failed, report.attempts.len());
    }

    #[test]
    fn test_empty_attempts() {
        let report = aggregate(&plan(&[]), Vec::new());
        assert_eq!(report.total_sent, 0);
        assert_eq!(report.total_failed, 0);
        assert!(report.per_recipient.is_empty());
    }
}
