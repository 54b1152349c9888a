use crate::models::{DashboardSummary, DateRange, Report, ReportRow, Stay, Vehicle};
use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};

pub const DEFAULT_CAPACITY: usize = 50;
const RECENT_COUNT: usize = 5;

pub fn is_active(stay: &Stay, now: DateTime<Utc>) -> bool {
    match stay.exit {
        None => true,
        Some(exit) => exit > now,
    }
}

pub fn duration_minutes(entry: Option<DateTime<Utc>>, exit: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    let entry = entry?;
    let end = exit.unwrap_or(now);
    Some((end - entry).num_minutes().max(0))
}

pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

pub fn duration_label(entry: Option<DateTime<Utc>>, exit: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match duration_minutes(entry, exit, now) {
        Some(minutes) => format_duration(minutes),
        None => "N/A".to_string(),
    }
}

pub fn average_duration<'a>(stays: impl IntoIterator<Item = &'a Stay>, now: DateTime<Utc>) -> String {
    let (count, sum) = stays.into_iter().fold((0i64, 0i64), |(count, sum), stay| {
        let minutes = duration_minutes(stay.entry, stay.exit, now).unwrap_or(0);
        (count + 1, sum + minutes)
    });
    if count == 0 {
        return format_duration(0);
    }
    format_duration(sum / count)
}

fn entry_date_in<Tz: TimeZone>(stay: &Stay, tz: &Tz) -> Option<NaiveDate> {
    stay.entry.map(|entry| entry.with_timezone(tz).date_naive())
}

pub fn entered_on_in<'a, Tz: TimeZone>(
    stays: &'a [Stay],
    day: NaiveDate,
    tz: &'a Tz,
) -> impl Iterator<Item = &'a Stay> + 'a {
    stays
        .iter()
        .filter(move |stay| entry_date_in(stay, tz) == Some(day))
}

pub fn today_revenue_in<Tz: TimeZone>(stays: &[Stay], today: NaiveDate, tz: &Tz) -> f64 {
    entered_on_in(stays, today, tz)
        .map(|stay| stay.total.unwrap_or(0.0))
        .sum()
}

pub fn available_spots(capacity: usize, active: usize) -> usize {
    capacity.saturating_sub(active)
}

pub fn summarize(stays: &[Stay], capacity: usize) -> DashboardSummary {
    summarize_at(stays, capacity, Utc::now(), &Local)
}

pub fn summarize_at<Tz: TimeZone>(stays: &[Stay], capacity: usize, now: DateTime<Utc>, tz: &Tz) -> DashboardSummary {
    let today = now.with_timezone(tz).date_naive();
    let active_count = stays.iter().filter(|stay| is_active(stay, now)).count();

    DashboardSummary {
        active_count,
        today_count: entered_on_in(stays, today, tz).count(),
        today_revenue: today_revenue_in(stays, today, tz),
        available_spots: available_spots(capacity, active_count),
        recent: stays.iter().rev().take(RECENT_COUNT).cloned().collect(),
    }
}

pub fn default_report_range(today: NaiveDate) -> DateRange {
    let first = today.with_day(1).unwrap_or(today);
    DateRange { from: first, to: today }
}

pub fn build_report(stays: &[Stay], vehicles: &[Vehicle], range: DateRange, from_cache: bool) -> Report {
    build_report_at(stays, vehicles, range, from_cache, Utc::now(), &Local)
}

pub fn build_report_at<Tz: TimeZone>(
    stays: &[Stay],
    vehicles: &[Vehicle],
    range: DateRange,
    from_cache: bool,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Report {
    let selected: Vec<&Stay> = stays
        .iter()
        .filter(|stay| entry_date_in(stay, tz).is_some_and(|date| range.contains(date)))
        .collect();

    let revenue = selected.iter().map(|stay| stay.total.unwrap_or(0.0)).sum();
    let average_duration = average_duration(selected.iter().copied(), now);
    let rows = selected
        .iter()
        .map(|stay| {
            let vehicle = vehicles.iter().find(|vehicle| vehicle.plate == stay.plate);
            ReportRow {
                stay: (*stay).clone(),
                owner: vehicle.map(|v| v.owner.clone()).unwrap_or_default(),
                kind: vehicle.map(|v| v.kind.clone()).unwrap_or_default(),
            }
        })
        .collect();

    Report {
        range,
        total_stays: selected.len(),
        revenue,
        average_duration,
        rows,
        from_cache,
    }
}

/// Brazilian real, e.g. `R$ 1.234,56` (non-breaking space after the symbol).
pub fn format_currency(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let units = (cents / 100).to_string();

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (index, digit) in units.chars().enumerate() {
        if index > 0 && (units.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{sign}R$\u{a0}{grouped},{:02}", cents % 100)
}

pub fn format_date_time(value: Option<DateTime<Utc>>) -> String {
    format_date_time_in(value, &Local)
}

pub fn format_date_time_in<Tz: TimeZone>(value: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match value {
        Some(value) => value.with_timezone(tz).format("%d/%m/%Y %H:%M").to_string(),
        None => "N/A".to_string(),
    }
}
