use crate::error::ConfigError;
use chrono::{DateTime, Days, Local, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::watch;

/// Wall clock the daily trigger is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleZone {
    Local,
    Named(Tz),
}

impl ScheduleZone {
    pub fn parse(name: Option<&str>) -> Result<Self, ConfigError> {
        match name.map(str::trim) {
            None | Some("") => Ok(ScheduleZone::Local),
            Some(raw) => raw
                .parse::<Tz>()
                .map(ScheduleZone::Named)
                .map_err(|_| ConfigError::Invalid(format!("unknown timezone `{raw}`"))),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ScheduleZone::Local => "local".to_string(),
            ScheduleZone::Named(tz) => tz.name().to_string(),
        }
    }

    /// Today's date in this zone as `YYYY-MM-DD`.
    pub fn today(&self) -> String {
        self.date_of(Utc::now())
    }

    pub fn date_of(&self, instant: DateTime<Utc>) -> String {
        match self {
            ScheduleZone::Local => instant.with_timezone(&Local).format("%Y-%m-%d").to_string(),
            ScheduleZone::Named(tz) => instant.with_timezone(tz).format("%Y-%m-%d").to_string(),
        }
    }

    pub fn next_run_after(&self, from: DateTime<Utc>, at: NaiveTime) -> Option<DateTime<Utc>> {
        match self {
            ScheduleZone::Local => {
                next_run_after(&from.with_timezone(&Local), at).map(|dt| dt.with_timezone(&Utc))
            }
            ScheduleZone::Named(tz) => {
                next_run_after(&from.with_timezone(tz), at).map(|dt| dt.with_timezone(&Utc))
            }
        }
    }
}

/// Next instant strictly after `from` whose wall-clock time in `from`'s zone
/// is `at`. Days where `at` falls into a DST gap are skipped.
pub fn next_run_after<Z: TimeZone>(from: &DateTime<Z>, at: NaiveTime) -> Option<DateTime<Z>> {
    let zone = from.timezone();
    let start_day = from.date_naive();
    for offset in 0..=2u64 {
        let day = start_day.checked_add_days(Days::new(offset))?;
        let Some(candidate) = zone.from_local_datetime(&day.and_time(at)).earliest() else {
            continue;
        };
        if candidate > *from {
            return Some(candidate);
        }
    }
    None
}

#[derive(Debug, Clone, Copy)]
pub struct DailySchedule {
    pub at: NaiveTime,
    pub zone: ScheduleZone,
}

/// Fire `job` once per day at the configured time until `shutdown` flips to
/// `true` or its sender goes away. The job runs on a blocking thread and is
/// never interrupted; shutdown is honoured between runs.
pub async fn run_daily<F>(schedule: DailySchedule, mut shutdown: watch::Receiver<bool>, job: F)
where
    F: Fn(String) + Send + Sync + 'static,
{
    let job = Arc::new(job);
    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        let now = Utc::now();
        let Some(next) = schedule.zone.next_run_after(now, schedule.at) else {
            tracing::error!(at = %schedule.at, "could not compute next run time; stopping scheduler");
            break;
        };
        tracing::info!(
            next_run = %next.to_rfc3339(),
            zone = %schedule.zone.label(),
            "next digest run scheduled"
        );

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        let date = schedule.zone.date_of(Utc::now());
        tracing::info!(%date, "scheduled digest run starting");
        let run = Arc::clone(&job);
        if let Err(err) = tokio::task::spawn_blocking(move || run(date)).await {
            tracing::error!("scheduled digest run panicked: {err}");
        }
        tracing::info!("scheduled digest run finished");
    }
    tracing::info!("scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};
    use std::sync::Mutex;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).single().expect("valid utc")
    }

    #[test]
    fn next_run_is_today_when_still_ahead() {
        let next = next_run_after(&utc(2024, 1, 1, 9, 0), at(18, 0)).expect("next");
        assert_eq!(next, utc(2024, 1, 1, 18, 0));
    }

    #[test]
    fn next_run_rolls_to_tomorrow_when_passed_or_equal() {
        let next = next_run_after(&utc(2024, 1, 1, 18, 0), at(18, 0)).expect("next");
        assert_eq!(next, utc(2024, 1, 2, 18, 0));

        let next = next_run_after(&utc(2024, 12, 31, 23, 59), at(18, 0)).expect("next");
        assert_eq!(next, utc(2025, 1, 1, 18, 0));
    }

    #[test]
    fn next_run_respects_fixed_offset() {
        let shanghai = FixedOffset::east_opt(8 * 3600).expect("offset");
        let from = utc(2024, 1, 1, 11, 0).with_timezone(&shanghai);
        let next = next_run_after(&from, at(18, 0)).expect("next");
        assert_eq!(next.with_timezone(&Utc), utc(2024, 1, 2, 10, 0));
    }

    #[test]
    fn named_zone_skips_dst_gap() {
        let zone = ScheduleZone::parse(Some("Europe/Berlin")).expect("zone");
        // 2024-03-31 02:30 does not exist in Berlin; the next valid 02:30 is April 1st.
        let from = utc(2024, 3, 30, 12, 0);
        let next = zone.next_run_after(from, at(2, 30)).expect("next");
        assert_eq!(next, utc(2024, 4, 1, 0, 30));
    }

    #[test]
    fn zone_next_run_is_strictly_in_the_future_for_every_zone() {
        let from = utc(2024, 6, 1, 12, 0);
        for zone in [
            ScheduleZone::Local,
            ScheduleZone::parse(Some("Asia/Shanghai")).expect("zone"),
        ] {
            let next = zone.next_run_after(from, at(18, 0)).expect("next");
            assert!(next > from, "{}", zone.label());
            assert!(next - from <= chrono::Duration::hours(26), "{}", zone.label());
        }
        let shanghai = ScheduleZone::parse(Some("Asia/Shanghai")).expect("zone");
        assert_eq!(
            shanghai.next_run_after(from, at(18, 0)).expect("next"),
            utc(2024, 6, 2, 10, 0)
        );
    }

    #[test]
    fn date_of_uses_zone_calendar() {
        let zone = ScheduleZone::parse(Some("Asia/Shanghai")).expect("zone");
        assert_eq!(zone.date_of(utc(2024, 1, 1, 20, 0)), "2024-01-02");
        assert!(NaiveDate::parse_from_str(&zone.today(), "%Y-%m-%d").is_ok());
    }

    #[test]
    fn parse_zone_handles_blank_and_unknown() {
        assert_eq!(ScheduleZone::parse(None).expect("local"), ScheduleZone::Local);
        assert_eq!(ScheduleZone::parse(Some(" ")).expect("local"), ScheduleZone::Local);
        assert!(ScheduleZone::parse(Some("Nowhere/Special")).is_err());
    }

    #[tokio::test]
    async fn run_daily_stops_on_shutdown_without_running_job() {
        let (tx, rx) = watch::channel(false);
        let runs = Arc::new(Mutex::new(Vec::<String>::new()));
        let seen = Arc::clone(&runs);
        let schedule = DailySchedule {
            at: at(18, 0),
            zone: ScheduleZone::Local,
        };

        let handle = tokio::spawn(run_daily(schedule, rx, move |date| {
            seen.lock().expect("lock").push(date);
        }));
        tx.send(true).expect("send shutdown");
        handle.await.expect("scheduler task");

        assert!(runs.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn run_daily_stops_when_sender_dropped() {
        let (tx, rx) = watch::channel(false);
        let schedule = DailySchedule {
            at: at(18, 0),
            zone: ScheduleZone::Local,
        };
        let handle = tokio::spawn(run_daily(schedule, rx, |_date| {}));
        drop(tx);
        handle.await.expect("scheduler task");
    }
}
