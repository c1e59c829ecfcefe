use crate::error::{Condition, Diagnostics};
use crate::ir::AxisTick;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc, Weekday};
use std::collections::HashMap;

/// Map `t` from `domain` onto `range`; a zero-width domain maps to the range midpoint.
fn interpolate(domain: (f64, f64), range: (f64, f64), t: f64) -> f64 {
    let span = domain.1 - domain.0;
    if span == 0.0 || !span.is_finite() {
        return (range.0 + range.1) / 2.0;
    }
    range.0 + (t - domain.0) / span * (range.1 - range.0)
}

fn degenerate(diagnostics: &mut Diagnostics, scale: &str) {
    diagnostics.push(Condition::DegenerateDomain { scale: scale.to_string() });
}

// =============================================================================
// Linear
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        LinearScale { domain, range }
    }

    /// Domain `[0, max]` over the finite values, rounded outward to a nice bound.
    pub fn resolve<T>(
        series: &[T],
        accessor: impl Fn(&T) -> f64,
        range: (f64, f64),
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let max = series
            .iter()
            .map(&accessor)
            .filter(|v| v.is_finite())
            .fold(0.0_f64, f64::max);

        let scale = LinearScale::new((0.0, max), range).nice(10);
        if scale.is_degenerate() {
            degenerate(diagnostics, "linear");
        }
        scale
    }

    pub fn is_degenerate(&self) -> bool {
        self.domain.0 == self.domain.1
    }

    pub fn map(&self, value: f64) -> f64 {
        interpolate(self.domain, self.range, value)
    }

    /// Extend the domain so both ends fall on tick steps.
    pub fn nice(mut self, count: usize) -> Self {
        let (mut start, mut stop) = self.domain;
        if stop < start {
            std::mem::swap(&mut start, &mut stop);
        }
        let mut previous = None;
        for _ in 0..10 {
            let step = tick_increment(start, stop, count);
            if Some(step) == previous || step == 0.0 || !step.is_finite() {
                break;
            }
            if step > 0.0 {
                start = (start / step).floor() * step;
                stop = (stop / step).ceil() * step;
            } else {
                start = (start * step).ceil() / step;
                stop = (stop * step).floor() / step;
            }
            previous = Some(step);
        }
        self.domain = if self.domain.1 < self.domain.0 { (stop, start) } else { (start, stop) };
        self
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = if self.domain.0 <= self.domain.1 {
            self.domain
        } else {
            (self.domain.1, self.domain.0)
        };
        linear_ticks(lo, hi, count)
    }

    pub fn axis_ticks(&self, count: usize) -> Vec<AxisTick> {
        let ticks = self.ticks(count);
        let (lo, hi) = self.domain;
        let step = tick_step(lo.min(hi), lo.max(hi), count);
        ticks
            .into_iter()
            .map(|v| AxisTick { label: format_tick(v, step), position: self.map(v) })
            .collect()
    }
}

/// Power-of-ten step with a 1/2/5 factor; negative values encode 1/step.
pub fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    let step = (stop - start) / count.max(1) as f64;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    if power >= 0.0 {
        factor * 10f64.powf(power)
    } else {
        -10f64.powf(-power) / factor
    }
}

fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    let inc = tick_increment(start, stop, count);
    if inc < 0.0 { -1.0 / inc } else { inc }
}

pub fn linear_ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let inc = tick_increment(start, stop, count);
    if inc == 0.0 || !inc.is_finite() {
        return Vec::new();
    }
    if inc > 0.0 {
        let r0 = (start / inc).ceil() as i64;
        let r1 = (stop / inc).floor() as i64;
        (r0..=r1).map(|i| i as f64 * inc).collect()
    } else {
        let inc = -inc;
        let r0 = (start * inc).ceil() as i64;
        let r1 = (stop * inc).floor() as i64;
        (r0..=r1).map(|i| i as f64 / inc).collect()
    }
}

/// Fixed precision from the step, with thousands separators.
fn format_tick(value: f64, step: f64) -> String {
    let precision = if step > 0.0 && step < 1.0 {
        (-step.log10().floor()) as usize
    } else {
        0
    };
    let value = if value == 0.0 { 0.0 } else { value };
    let text = format!("{:.*}", precision, value);
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let mut grouped = String::from(sign);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(f) = frac_part {
        grouped.push('.');
        grouped.push_str(f);
    }
    grouped
}

// =============================================================================
// Time
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TimeScale {
    pub domain: (DateTime<Utc>, DateTime<Utc>),
    pub range: (f64, f64),
}

impl TimeScale {
    /// Domain is the instant extent; an empty series collapses to a single point.
    pub fn resolve<T>(
        series: &[T],
        accessor: impl Fn(&T) -> DateTime<Utc>,
        range: (f64, f64),
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut instants = series.iter().map(accessor);
        let domain = match instants.next() {
            Some(first) => instants.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))),
            None => (DateTime::<Utc>::UNIX_EPOCH, DateTime::<Utc>::UNIX_EPOCH),
        };
        let scale = TimeScale { domain, range };
        if scale.is_degenerate() {
            degenerate(diagnostics, "time");
        }
        scale
    }

    pub fn is_degenerate(&self) -> bool {
        self.domain.0 == self.domain.1
    }

    pub fn map(&self, instant: DateTime<Utc>) -> f64 {
        interpolate(
            (millis(self.domain.0), millis(self.domain.1)),
            self.range,
            millis(instant),
        )
    }

    pub fn ticks(&self, count: usize) -> Vec<DateTime<Utc>> {
        let (start, stop) = self.domain;
        if count == 0 {
            return Vec::new();
        }
        if start == stop {
            return vec![start];
        }
        let target = (millis(stop) - millis(start)) / count as f64;
        match choose_interval(target, millis(start), millis(stop), count) {
            Some(interval) => interval.range(start, stop),
            None => Vec::new(),
        }
    }

    pub fn axis_ticks(&self, count: usize) -> Vec<AxisTick> {
        self.ticks(count)
            .into_iter()
            .map(|t| AxisTick { label: format_instant(t), position: self.map(t) })
            .collect()
    }
}

fn millis(t: DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64
}

const SECOND: i64 = 1_000;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;
const MAX_TICKS: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq)]
enum TickInterval {
    Millis(f64),
    Fixed(i64),
    Days(u32),
    Week,
    Months(u32),
    Years(i32),
}

const INTERVALS: [(TickInterval, i64); 17] = [
    (TickInterval::Fixed(SECOND), SECOND),
    (TickInterval::Fixed(5 * SECOND), 5 * SECOND),
    (TickInterval::Fixed(15 * SECOND), 15 * SECOND),
    (TickInterval::Fixed(30 * SECOND), 30 * SECOND),
    (TickInterval::Fixed(MINUTE), MINUTE),
    (TickInterval::Fixed(5 * MINUTE), 5 * MINUTE),
    (TickInterval::Fixed(15 * MINUTE), 15 * MINUTE),
    (TickInterval::Fixed(30 * MINUTE), 30 * MINUTE),
    (TickInterval::Fixed(HOUR), HOUR),
    (TickInterval::Fixed(3 * HOUR), 3 * HOUR),
    (TickInterval::Fixed(6 * HOUR), 6 * HOUR),
    (TickInterval::Fixed(12 * HOUR), 12 * HOUR),
    (TickInterval::Days(1), DAY),
    (TickInterval::Days(2), 2 * DAY),
    (TickInterval::Week, WEEK),
    (TickInterval::Months(1), MONTH),
    (TickInterval::Months(3), 3 * MONTH),
];

fn choose_interval(target: f64, start: f64, stop: f64, count: usize) -> Option<TickInterval> {
    if !target.is_finite() || target <= 0.0 {
        return None;
    }
    if target > (3 * MONTH) as f64 {
        let years = tick_step(start / YEAR as f64, stop / YEAR as f64, count).max(1.0);
        return Some(TickInterval::Years(years.round() as i32));
    }
    if target < SECOND as f64 {
        return Some(TickInterval::Millis(tick_step(start, stop, count).max(1.0)));
    }
    let i = INTERVALS.iter().position(|(_, d)| (*d as f64) >= target).unwrap_or(INTERVALS.len() - 1);
    if i == 0 {
        return Some(INTERVALS[0].0);
    }
    let (below, below_ms) = INTERVALS[i - 1];
    let (above, above_ms) = INTERVALS[i];
    if target / (below_ms as f64) < (above_ms as f64) / target {
        Some(below)
    } else {
        Some(above)
    }
}

impl TickInterval {
    fn range(self, start: DateTime<Utc>, stop: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let mut out = Vec::new();
        match self {
            TickInterval::Millis(step) => {
                let step = step as i64;
                let mut t = ceil_to(start.timestamp_millis(), step);
                while t <= stop.timestamp_millis() && out.len() < MAX_TICKS {
                    out.extend(Utc.timestamp_millis_opt(t).single());
                    t += step;
                }
            }
            TickInterval::Fixed(step) => {
                let mut t = ceil_to(start.timestamp_millis(), step);
                while t <= stop.timestamp_millis() && out.len() < MAX_TICKS {
                    out.extend(Utc.timestamp_millis_opt(t).single());
                    t += step;
                }
            }
            TickInterval::Days(every) => {
                for day in days_between(start, stop) {
                    if (day.day() - 1) % every == 0 {
                        out.push(midnight(day));
                    }
                }
            }
            TickInterval::Week => {
                for day in days_between(start, stop) {
                    if day.weekday() == Weekday::Sun {
                        out.push(midnight(day));
                    }
                }
            }
            TickInterval::Months(every) => {
                let mut year = start.year();
                let mut month = start.month();
                loop {
                    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else { break };
                    let t = midnight(first);
                    if t > stop || out.len() >= MAX_TICKS {
                        break;
                    }
                    if t >= start && (month - 1) % every == 0 {
                        out.push(t);
                    }
                    month += 1;
                    if month > 12 {
                        month = 1;
                        year += 1;
                    }
                }
            }
            TickInterval::Years(every) => {
                let every = every.max(1);
                let mut year = start.year();
                while out.len() < MAX_TICKS {
                    let Some(first) = NaiveDate::from_ymd_opt(year, 1, 1) else { break };
                    let t = midnight(first);
                    if t > stop {
                        break;
                    }
                    if t >= start && year.rem_euclid(every) == 0 {
                        out.push(t);
                    }
                    year += 1;
                }
            }
        }
        out
    }
}

fn ceil_to(value: i64, step: i64) -> i64 {
    value.div_euclid(step) * step + if value.rem_euclid(step) == 0 { 0 } else { step }
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0).map(|n| n.and_utc()).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Calendar days whose midnight falls within `[start, stop]`.
fn days_between(start: DateTime<Utc>, stop: DateTime<Utc>) -> Vec<NaiveDate> {
    let mut day = start.date_naive();
    if midnight(day) < start {
        day += Duration::days(1);
    }
    let mut days = Vec::new();
    while midnight(day) <= stop && days.len() < MAX_TICKS * 7 {
        days.push(day);
        day += Duration::days(1);
    }
    days
}

/// Label by the coarsest boundary the instant falls on.
fn format_instant(t: DateTime<Utc>) -> String {
    let pattern = if t.nanosecond() / 1_000_000 != 0 {
        ".%3f"
    } else if t.second() != 0 {
        ":%S"
    } else if t.minute() != 0 {
        "%I:%M"
    } else if t.hour() != 0 {
        "%I %p"
    } else if t.day() != 1 {
        if t.weekday() != Weekday::Sun { "%a %d" } else { "%b %d" }
    } else if t.month() != 1 {
        "%B"
    } else {
        "%Y"
    };
    t.format(pattern).to_string()
}

// =============================================================================
// Band
// =============================================================================

/// Categorical scale: equal bands in first-seen category order.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    pub domain: Vec<String>,
    pub range: (f64, f64),
    pub padding: f64,
    index: HashMap<String, usize>,
}

impl BandScale {
    pub fn resolve<T>(
        series: &[T],
        accessor: impl Fn(&T) -> &str,
        range: (f64, f64),
        padding: f64,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut domain = Vec::new();
        let mut index = HashMap::new();
        for item in series {
            let category = accessor(item);
            if !index.contains_key(category) {
                index.insert(category.to_string(), domain.len());
                domain.push(category.to_string());
            }
        }
        if domain.is_empty() {
            degenerate(diagnostics, "band");
        }
        BandScale {
            domain,
            range,
            padding: padding.clamp(0.0, 1.0),
            index,
        }
    }

    /// Distance between the starts of adjacent bands.
    pub fn step(&self) -> f64 {
        if self.domain.is_empty() {
            return 0.0;
        }
        (self.range.1 - self.range.0) / self.domain.len() as f64
    }

    pub fn bandwidth(&self) -> f64 {
        self.step() * (1.0 - self.padding)
    }

    /// Start of the category's band; the padding gap is split around it.
    pub fn position(&self, category: &str) -> Option<f64> {
        let i = *self.index.get(category)?;
        let step = self.step();
        Some(self.range.0 + step * i as f64 + (step - self.bandwidth()) / 2.0)
    }

    pub fn axis_ticks(&self) -> Vec<AxisTick> {
        let half = self.bandwidth() / 2.0;
        self.domain
            .iter()
            .filter_map(|c| {
                self.position(c).map(|x| AxisTick { label: c.clone(), position: x + half })
            })
            .collect()
    }
}

// =============================================================================
// Angular
// =============================================================================

/// Linear value-to-angle law. Values outside the domain extrapolate.
#[derive(Debug, Clone, PartialEq)]
pub struct AngularScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl AngularScale {
    pub fn resolve(domain: (f64, f64), range: (f64, f64), diagnostics: &mut Diagnostics) -> Self {
        let scale = AngularScale { domain, range };
        if domain.0 == domain.1 {
            degenerate(diagnostics, "angular");
        }
        scale
    }

    pub fn map(&self, value: f64) -> f64 {
        interpolate(self.domain, self.range, value)
    }
}
