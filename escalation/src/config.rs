//! Escalation configuration

use std::time::Duration;

use crate::platform::UserId;

/// Settings for the escalation subsystem.
#[derive(Debug, Clone, Default)]
pub struct EscalationConfig {
    /// Operator who receives escalated reports. `None` disables escalation:
    /// failures are shown as plain errors instead.
    pub operator: Option<UserId>,
    /// Upper bound on delivering a report to the operator. `None` waits as
    /// long as the platform call takes.
    pub delivery_timeout: Option<Duration>,
}

impl EscalationConfig {
    /// Build from a raw operator id; blank ids count as unset.
    pub fn from_operator_id(raw: Option<&str>) -> Self {
        let operator = raw
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(UserId::new);
        Self {
            operator,
            delivery_timeout: None,
        }
    }

    pub fn with_delivery_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    pub fn escalation_enabled(&self) -> bool {
        self.operator.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_operator_disables_escalation() {
        assert!(!EscalationConfig::from_operator_id(None).escalation_enabled());
        assert!(!EscalationConfig::from_operator_id(Some("")).escalation_enabled());
        assert!(!EscalationConfig::from_operator_id(Some("  ")).escalation_enabled());
    }

    #[test]
    fn test_operator_id_is_trimmed() {
        let config = EscalationConfig::from_operator_id(Some(" 1234 "));
        assert_eq!(config.operator, Some(UserId::new("1234")));
        assert!(config.delivery_timeout.is_none());
    }
}
