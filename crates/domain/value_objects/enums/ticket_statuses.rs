use std::fmt::Display;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    Open,
    Answered,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Answered => "answered",
            TicketStatus::Closed => "closed",
        }
    }

    /// Status a ticket takes after a new message, whatever it was before.
    /// A reply on a closed ticket reopens it.
    pub fn after_reply(staff: bool) -> Self {
        if staff {
            TicketStatus::Answered
        } else {
            TicketStatus::Open
        }
    }

    /// Sort rank for the staff queue: open first, closed last.
    pub fn priority(&self) -> u8 {
        match self {
            TicketStatus::Open => 0,
            TicketStatus::Answered => 1,
            TicketStatus::Closed => 2,
        }
    }
}

impl Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TicketStatus {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "open" => Ok(TicketStatus::Open),
            "answered" => Ok(TicketStatus::Answered),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(anyhow!("unknown ticket status {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_reply_answers_and_customer_reply_reopens() {
        assert_eq!(TicketStatus::after_reply(true), TicketStatus::Answered);
        assert_eq!(TicketStatus::after_reply(false), TicketStatus::Open);
    }

    #[test]
    fn stored_statuses_parse_and_unknown_ones_are_errors() {
        for status in [TicketStatus::Open, TicketStatus::Answered, TicketStatus::Closed] {
            assert_eq!(TicketStatus::try_from(status.as_str()).unwrap(), status);
        }
        assert!(TicketStatus::try_from("archived").is_err());
        assert!(TicketStatus::try_from("Open").is_err());
    }

    #[test]
    fn staff_queue_orders_open_before_answered_before_closed() {
        let mut statuses = vec![
            TicketStatus::Closed,
            TicketStatus::Open,
            TicketStatus::Answered,
        ];
        statuses.sort_by_key(TicketStatus::priority);
        assert_eq!(
            statuses,
            vec![
                TicketStatus::Open,
                TicketStatus::Answered,
                TicketStatus::Closed
            ]
        );
    }
}
