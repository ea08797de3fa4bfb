use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Offset, Utc, Weekday};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSession {
    PreMarket,
    Regular,
    PostMarket,
    Closed,
}

impl MarketSession {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Regular)
    }

    /// How often a live chart should refresh during this session.
    pub fn poll_interval(&self) -> Duration {
        match self {
            Self::Regular => Duration::from_secs(15),
            Self::PreMarket | Self::PostMarket => Duration::from_secs(60),
            Self::Closed => Duration::from_secs(300),
        }
    }
}

/// Exchange trading hours in exchange-local time.
#[derive(Debug, Clone, Copy)]
pub struct MarketClock {
    offset: FixedOffset,
    pre_open: NaiveTime,
    open: NaiveTime,
    close: NaiveTime,
    post_close: NaiveTime,
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

impl MarketClock {
    /// NSE-style session: pre-open 09:00, regular 09:15-15:30, post until 16:00.
    pub fn new(utc_offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix());

        Self {
            offset,
            pre_open: hm(9, 0),
            open: hm(9, 15),
            close: hm(15, 30),
            post_close: hm(16, 0),
        }
    }

    pub fn with_hours(
        mut self,
        pre_open: NaiveTime,
        open: NaiveTime,
        close: NaiveTime,
        post_close: NaiveTime,
    ) -> Self {
        self.pre_open = pre_open;
        self.open = open;
        self.close = close;
        self.post_close = post_close;
        self
    }

    pub fn session_at(&self, at: DateTime<Utc>) -> MarketSession {
        let local = at.with_timezone(&self.offset);

        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return MarketSession::Closed;
        }

        let t = local.time();
        if t >= self.pre_open && t < self.open {
            MarketSession::PreMarket
        } else if t >= self.open && t < self.close {
            MarketSession::Regular
        } else if t >= self.close && t < self.post_close {
            MarketSession::PostMarket
        } else {
            MarketSession::Closed
        }
    }

    pub fn session_now(&self) -> MarketSession {
        self.session_at(Utc::now())
    }

    pub fn poll_interval_at(&self, at: DateTime<Utc>) -> Duration {
        self.session_at(at).poll_interval()
    }

    pub fn local_time(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // 2024-01-15 is a Monday
    fn ist(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        FixedOffset::east_opt(330 * 60)
            .unwrap()
            .with_ymd_and_hms(2024, 1, day, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn classifies_weekday_sessions() {
        let clock = MarketClock::new(330);

        assert_eq!(clock.session_at(ist(15, 8, 59)), MarketSession::Closed);
        assert_eq!(clock.session_at(ist(15, 9, 0)), MarketSession::PreMarket);
        assert_eq!(clock.session_at(ist(15, 9, 15)), MarketSession::Regular);
        assert_eq!(clock.session_at(ist(15, 15, 29)), MarketSession::Regular);
        assert_eq!(clock.session_at(ist(15, 15, 30)), MarketSession::PostMarket);
        assert_eq!(clock.session_at(ist(15, 16, 0)), MarketSession::Closed);
    }

    #[test]
    fn weekends_are_closed() {
        let clock = MarketClock::new(330);
        // Saturday and Sunday at midday
        assert_eq!(clock.session_at(ist(13, 12, 0)), MarketSession::Closed);
        assert_eq!(clock.session_at(ist(14, 12, 0)), MarketSession::Closed);
    }

    #[test]
    fn intervals_follow_session() {
        let clock = MarketClock::new(330);
        assert_eq!(clock.poll_interval_at(ist(15, 10, 0)), Duration::from_secs(15));
        assert_eq!(clock.poll_interval_at(ist(15, 9, 5)), Duration::from_secs(60));
        assert_eq!(clock.poll_interval_at(ist(15, 15, 45)), Duration::from_secs(60));
        assert_eq!(clock.poll_interval_at(ist(15, 20, 0)), Duration::from_secs(300));
    }

    #[test]
    fn offset_moves_the_session() {
        // 09:30 New York (UTC-5) is 14:30 UTC
        let ny = MarketClock::new(-300).with_hours(hm(4, 0), hm(9, 30), hm(16, 0), hm(20, 0));
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap();
        assert_eq!(ny.session_at(at), MarketSession::Regular);
    }
}
