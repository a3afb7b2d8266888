//! Status-visibility gate.
//!
//! An activity can hide registrants' statuses until a reveal time. The check
//! runs on every read, so there is no stored "revealed" flag to maintain.

use chrono::{DateTime, Utc};

use super::types::{status, ActivityRegistration, AdditionalConfig, StatusView};

/// Status a registrant is allowed to see at `now`.
pub fn check_status(
    registration: Option<&ActivityRegistration>,
    config: &AdditionalConfig,
    now: DateTime<Utc>,
) -> StatusView {
    let Some(registration) = registration else {
        return StatusView {
            status: status::NOT_REGISTERED.to_string(),
            visible_at: None,
        };
    };

    match &config.status_visibility {
        Some(rule) if !rule.is_visible => match rule.visible_at {
            Some(reveal) if now >= reveal => revealed(registration),
            visible_at => StatusView {
                status: status::NOT_ANNOUNCED.to_string(),
                visible_at,
            },
        },
        _ => revealed(registration),
    }
}

fn revealed(registration: &ActivityRegistration) -> StatusView {
    StatusView {
        status: registration.status.clone(),
        visible_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::types::StatusVisibility;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn passed() -> ActivityRegistration {
        let mut reg = ActivityRegistration::new(Uuid::new_v4(), 1, Default::default());
        reg.status = status::PASSED.to_string();
        reg
    }

    fn hidden_until(visible_at: Option<DateTime<Utc>>) -> AdditionalConfig {
        AdditionalConfig {
            status_visibility: Some(StatusVisibility {
                is_visible: false,
                visible_at,
            }),
            ..Default::default()
        }
    }

    fn reveal() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_no_rule_shows_true_status() {
        let view = check_status(Some(&passed()), &AdditionalConfig::default(), reveal());
        assert_eq!(view.status, status::PASSED);
        assert!(view.visible_at.is_none());
    }

    #[test]
    fn test_not_registered() {
        for config in [AdditionalConfig::default(), hidden_until(Some(reveal()))] {
            let view = check_status(None, &config, reveal());
            assert_eq!(view.status, status::NOT_REGISTERED);
            assert!(view.visible_at.is_none());
        }
    }

    #[test]
    fn test_explicitly_visible_rule() {
        let config = AdditionalConfig {
            status_visibility: Some(StatusVisibility {
                is_visible: true,
                visible_at: Some(reveal()),
            }),
            ..Default::default()
        };
        let view = check_status(Some(&passed()), &config, reveal() - Duration::days(1));
        assert_eq!(view.status, status::PASSED);
    }

    #[test]
    fn test_masked_before_reveal() {
        let before = reveal() - Duration::seconds(1);
        let view = check_status(Some(&passed()), &hidden_until(Some(reveal())), before);
        assert_eq!(view.status, status::NOT_ANNOUNCED);
        assert_eq!(view.visible_at, Some(reveal()));
    }

    #[test]
    fn test_revealed_at_and_after_reveal() {
        let config = hidden_until(Some(reveal()));
        for now in [reveal(), reveal() + Duration::hours(3)] {
            let view = check_status(Some(&passed()), &config, now);
            assert_eq!(view.status, status::PASSED);
            assert!(view.visible_at.is_none());
        }
    }

    #[test]
    fn test_hidden_without_reveal_time_never_reveals() {
        let far_future = reveal() + Duration::days(3650);
        let view = check_status(Some(&passed()), &hidden_until(None), far_future);
        assert_eq!(view.status, status::NOT_ANNOUNCED);
        assert!(view.visible_at.is_none());
    }
}
