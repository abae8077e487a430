use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Job, OperationalStatus};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusLabel {
    Closed,
    Expired,
    Urgent,
    Active,
    #[serde(rename = "On Hold")]
    OnHold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Red,
    Orange,
    Green,
    Gray,
}

/// Presentation label shown next to a company's posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusInfo {
    pub label: StatusLabel,
    pub tone: Tone,
    pub description: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownStatus {
    Expired,
    Today,
    Remaining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownBasis {
    OnlineTest,
    Deadline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub days: i64,
    pub status: CountdownStatus,
    pub message: String,
    pub basis: CountdownBasis,
}

/// Whole days from `now` until `target`, rounded towards positive infinity.
pub fn days_until(target: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (target - now).num_milliseconds();
    -((-millis).div_euclid(DAY_MS))
}

/// Countdown to the online test when scheduled, otherwise to the application deadline.
pub fn countdown(job: &Job, now: DateTime<Utc>) -> Countdown {
    let (target, basis) = match job.timeline.online_test {
        Some(online_test) => (online_test, CountdownBasis::OnlineTest),
        None => (job.deadline, CountdownBasis::Deadline),
    };
    let days = days_until(target, now);
    let online = basis == CountdownBasis::OnlineTest;

    if days < 0 {
        let elapsed = days.abs();
        Countdown {
            days: elapsed,
            status: CountdownStatus::Expired,
            message: if online {
                format!("Online test passed {elapsed} day(s) ago")
            } else {
                format!("Expired {elapsed} day(s) ago")
            },
            basis,
        }
    } else if days == 0 {
        Countdown {
            days: 0,
            status: CountdownStatus::Today,
            message: if online {
                "Online test is today!".to_string()
            } else {
                "Deadline is today!".to_string()
            },
            basis,
        }
    } else {
        Countdown {
            days,
            status: CountdownStatus::Remaining,
            message: if online {
                format!("{days} day(s) until online test")
            } else {
                format!("{days} day(s) remaining")
            },
            basis,
        }
    }
}

fn info(label: StatusLabel, tone: Tone, description: String, reason: &str) -> StatusInfo {
    StatusInfo {
        label,
        tone,
        description,
        reason: reason.to_string(),
    }
}

pub fn status_info(job: &Job, now: DateTime<Utc>) -> StatusInfo {
    match job.status {
        OperationalStatus::Closed => info(
            StatusLabel::Closed,
            Tone::Red,
            "This job posting is no longer accepting applications".to_string(),
            if job.online_test_elapsed(now) {
                "Online test date passed"
            } else {
                "Manually closed"
            },
        ),
        OperationalStatus::OnHold => info(
            StatusLabel::OnHold,
            Tone::Gray,
            "Applications are paused for this posting".to_string(),
            "On hold",
        ),
        OperationalStatus::Open if job.online_test_elapsed(now) => info(
            StatusLabel::Expired,
            Tone::Orange,
            "Online test date has passed, job will be closed automatically".to_string(),
            "Online test date passed",
        ),
        OperationalStatus::Open => match job.timeline.online_test {
            Some(online_test) => {
                let days = days_until(online_test, now);
                if days <= 3 {
                    info(
                        StatusLabel::Urgent,
                        Tone::Red,
                        format!("Online test approaching! Only {days} day(s) left"),
                        "Online test soon",
                    )
                } else if days <= 7 {
                    info(
                        StatusLabel::Active,
                        Tone::Orange,
                        format!("{days} day(s) until online test"),
                        "Online test approaching",
                    )
                } else {
                    info(
                        StatusLabel::Active,
                        Tone::Green,
                        format!("{days} day(s) until online test"),
                        "Open for applications",
                    )
                }
            }
            None => {
                let days = days_until(job.deadline, now);
                if days <= 3 {
                    info(
                        StatusLabel::Urgent,
                        Tone::Red,
                        format!("Deadline approaching! Only {days} day(s) left"),
                        "Deadline soon",
                    )
                } else if days <= 7 {
                    info(
                        StatusLabel::Active,
                        Tone::Orange,
                        format!("{days} day(s) remaining to apply"),
                        "Deadline approaching",
                    )
                } else {
                    info(
                        StatusLabel::Active,
                        Tone::Green,
                        format!("{days} day(s) remaining to apply"),
                        "Open for applications",
                    )
                }
            }
        },
    }
}
