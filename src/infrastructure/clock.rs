use chrono::{DateTime, Utc};

use crate::domain::invoice::Clock;

/// Wall clock used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
  pub fn new(now: DateTime<Utc>) -> Self {
    Self(now)
  }

  /// Noon UTC on the given date.
  #[cfg(test)]
  pub fn at_date(year: i32, month: u32, day: u32) -> Self {
    let now = chrono::NaiveDate::from_ymd_opt(year, month, day)
      .and_then(|date| date.and_hms_opt(12, 0, 0))
      .expect("valid date")
      .and_utc();
    Self(now)
  }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    self.0
  }
}
