//! Nanosecond-precision time types: [`Duration`], [`TimePoint`], [`Timer`],
//! [`StopWatch`], and [`ScopedPerfTimer`].
//!
//! Ported from `rpp::Duration`/`rpp::TimePoint`/`rpp::Timer`/`rpp::StopWatch`
//! (`original_source/src/rpp/timer.h`). `Duration` is a signed nanosecond
//! count rather than `std::time::Duration`'s unsigned count, so it can
//! represent negative elapsed times (e.g. `a - b` where `b` is later than
//! `a`) without panicking.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Nanoseconds per whole second.
pub const NANOS_PER_SEC: i64 = 1_000_000_000;
/// Nanoseconds per millisecond.
pub const NANOS_PER_MILLI: i64 = 1_000_000;
/// Nanoseconds per microsecond.
pub const NANOS_PER_MICRO: i64 = 1_000;
/// Microseconds per second.
pub const MICROS_PER_SEC: i64 = 1_000_000;
/// Milliseconds per second.
pub const MILLIS_PER_SEC: i64 = 1_000;

/// A signed duration of nanosecond precision, covering roughly ±292 years.
///
/// # Examples
///
/// ```
/// use parking_lot_core_async::time::Duration;
///
/// let d = Duration::from_millis(1500);
/// assert_eq!(d.seconds(), 1.5);
/// assert_eq!(d.millis(), 1500);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration {
    nanos: i64,
}

impl Duration {
    /// The zero duration.
    pub const ZERO: Self = Self { nanos: 0 };

    /// Builds a `Duration` from a raw nanosecond count.
    #[must_use]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self { nanos }
    }

    /// Builds a `Duration` from a microsecond count.
    #[must_use]
    pub const fn from_micros(micros: i64) -> Self {
        Self {
            nanos: micros.saturating_mul(NANOS_PER_MICRO),
        }
    }

    /// Builds a `Duration` from a millisecond count.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self {
            nanos: millis.saturating_mul(NANOS_PER_MILLI),
        }
    }

    /// Builds a `Duration` from a floating-point second count.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_seconds(seconds: f64) -> Self {
        Self {
            nanos: (seconds * NANOS_PER_SEC as f64) as i64,
        }
    }

    /// Raw nanosecond count. Never truncates or overflows.
    #[must_use]
    pub const fn nanos(self) -> i64 {
        self.nanos
    }

    /// Microsecond count, truncated toward zero.
    #[must_use]
    pub const fn micros(self) -> i64 {
        self.nanos / NANOS_PER_MICRO
    }

    /// Millisecond count, truncated toward zero.
    #[must_use]
    pub const fn millis(self) -> i64 {
        self.nanos / NANOS_PER_MILLI
    }

    /// Duration in seconds as a floating-point value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn seconds(self) -> f64 {
        self.nanos as f64 / NANOS_PER_SEC as f64
    }

    /// `true` if this duration is exactly zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.nanos == 0
    }

    /// Converts to `std::time::Duration`, clamping negative values to zero.
    #[must_use]
    pub fn to_std(self) -> std::time::Duration {
        std::time::Duration::from_nanos(self.nanos.max(0).unsigned_abs())
    }

    /// Formats like `rpp::Duration::to_string`: an optional leading `-`, an
    /// optional `Y-` (years) and `D-` (days) when non-zero, then
    /// `HH:MM:SS` and an optional fractional tail gated by `fraction_digits`
    /// (0 = none, up to 9 = full nanosecond precision).
    #[must_use]
    pub fn to_string_with_precision(self, fraction_digits: u32) -> String {
        duration_to_string(self.nanos, fraction_digits)
    }

    /// Formats like `rpp::Duration::to_stopwatch_string`: always wrapped in
    /// `[...]`, `Nm ` only if at least one minute elapsed, `Xs` always
    /// shown, then a fractional tail (`Yms`/`Zus`/`Qns`) gated by
    /// `fraction_digits` (0, then tiers at 1, 4, 7).
    #[must_use]
    pub fn to_stopwatch_string(self, fraction_digits: u32) -> String {
        duration_to_stopwatch_string(self.nanos, fraction_digits)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_with_precision(3))
    }
}

impl Add for Duration {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            nanos: self.nanos.saturating_add(rhs.nanos),
        }
    }
}

impl Sub for Duration {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            nanos: self.nanos.saturating_sub(rhs.nanos),
        }
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Self) {
        self.nanos = self.nanos.saturating_add(rhs.nanos);
    }
}

impl SubAssign for Duration {
    fn sub_assign(&mut self, rhs: Self) {
        self.nanos = self.nanos.saturating_sub(rhs.nanos);
    }
}

impl Neg for Duration {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            nanos: self.nanos.saturating_neg(),
        }
    }
}

/// Ports `duration_to_string` from `original_source/src/rpp/timer.cpp`.
fn duration_to_string(nanos: i64, fraction_digits: u32) -> String {
    let negative = nanos < 0;
    // saturating_abs avoids UB on i64::MIN, matching the C++ overflow guard.
    let total_nanos = nanos.saturating_abs() as u64;

    let total_secs = total_nanos / NANOS_PER_SEC as u64;
    let years = total_secs / (365 * 24 * 3600);
    let rem_after_years = total_secs % (365 * 24 * 3600);
    let days = rem_after_years / (24 * 3600);
    let rem_after_days = rem_after_years % (24 * 3600);
    let hours = rem_after_days / 3600;
    let minutes = (rem_after_days % 3600) / 60;
    let secs = rem_after_days % 60;

    let mut out = String::with_capacity(32);
    if negative {
        out.push('-');
    }
    if years > 0 {
        out.push_str(&format!("{years}Y-"));
    }
    if days > 0 || years > 0 {
        out.push_str(&format!("{days}D-"));
    }
    out.push_str(&format!("{hours:02}:{minutes:02}:{secs:02}"));

    if fraction_digits > 0 {
        let frac_nanos = total_nanos % NANOS_PER_SEC as u64;
        let digits = fraction_digits.min(9) as usize;
        let scaled = frac_nanos / 10u64.pow(9 - digits as u32);
        out.push('.');
        out.push_str(&format!("{scaled:0width$}", width = digits));
    }
    out
}

/// Ports `duration_to_stopwatch_string` from
/// `original_source/src/rpp/timer.cpp`: compact `[Nm Xs Yms Zus Qns]` form.
fn duration_to_stopwatch_string(nanos: i64, fraction_digits: u32) -> String {
    let negative = nanos < 0;
    let total_nanos = nanos.saturating_abs() as u64;

    let total_secs = total_nanos / NANOS_PER_SEC as u64;
    let minutes = total_secs / 60;
    let secs = total_secs % 60;
    let frac_nanos = total_nanos % NANOS_PER_SEC as u64;

    let mut out = String::with_capacity(36);
    out.push('[');
    if negative {
        out.push('-');
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m "));
    }
    out.push_str(&format!("{secs}s"));

    if fraction_digits >= 1 {
        let millis = frac_nanos / NANOS_PER_MILLI as u64;
        out.push_str(&format!(" {millis}ms"));
    }
    if fraction_digits >= 4 {
        let micros = (frac_nanos / NANOS_PER_MICRO as u64) % 1000;
        out.push_str(&format!(" {micros}us"));
    }
    if fraction_digits >= 7 {
        let ns = frac_nanos % 1000;
        out.push_str(&format!(" {ns}ns"));
    }
    out.push(']');
    out
}

/// A point in time. Monotonic ([`TimePoint::now`]) or wall-clock
/// ([`TimePoint::local`]); both are represented as a [`Duration`] offset
/// from an implementation-defined epoch, so they are only meaningfully
/// comparable to other `TimePoint`s from the same source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimePoint {
    since_epoch: Duration,
}

impl TimePoint {
    /// Monotonic "now", suitable for measuring elapsed time. Backed by a
    /// single process-wide `std::time::Instant` epoch (immune to
    /// wall-clock adjustments), so `TimePoint`s produced on different
    /// threads share the same zero-point and remain comparable.
    #[must_use]
    pub fn now() -> Self {
        static EPOCH: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
        let elapsed = EPOCH.get_or_init(Instant::now).elapsed();
        Self {
            since_epoch: Duration::from_nanos(i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX)),
        }
    }

    /// Wall-clock "now" relative to the Unix epoch.
    ///
    /// Note: unlike the original's `TimePoint::local()`, this does not
    /// apply a local UTC offset (see `SPEC_FULL.md` Open Question 5) — no
    /// timezone-capable crate is part of the teacher's dependency stack,
    /// so this returns the same instant as UTC.
    #[must_use]
    pub fn local() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            since_epoch: Duration::from_nanos(i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX)),
        }
    }

    /// Duration elapsed since this point until `other`.
    #[must_use]
    pub fn elapsed_since(self, other: Self) -> Duration {
        other.since_epoch - self.since_epoch
    }

    /// Duration elapsed since this point until now. Only meaningful for
    /// monotonic points produced by [`TimePoint::now`].
    #[must_use]
    pub fn elapsed(self) -> Duration {
        self.elapsed_since(Self::now())
    }
}

impl Add<Duration> for TimePoint {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self {
        Self {
            since_epoch: self.since_epoch + rhs,
        }
    }
}

impl Sub<Duration> for TimePoint {
    type Output = Self;
    fn sub(self, rhs: Duration) -> Self {
        Self {
            since_epoch: self.since_epoch - rhs,
        }
    }
}

impl Sub for TimePoint {
    type Output = Duration;
    fn sub(self, rhs: Self) -> Duration {
        self.since_epoch - rhs.since_epoch
    }
}

/// Whether a [`Timer`] starts counting immediately on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Do not record a start point yet; call [`Timer::start`] later.
    NoStart,
    /// Record `TimePoint::now()` as the start point immediately.
    AutoStart,
}

/// A restartable elapsed-time measurer, grounded on `rpp::Timer`.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    started: TimePoint,
}

impl Timer {
    /// Creates a timer, optionally starting it immediately.
    #[must_use]
    pub fn new(mode: StartMode) -> Self {
        Self {
            started: match mode {
                StartMode::AutoStart => TimePoint::now(),
                StartMode::NoStart => TimePoint { since_epoch: Duration::ZERO },
            },
        }
    }

    /// (Re)starts the timer at the current moment.
    pub fn start(&mut self) {
        self.started = TimePoint::now();
    }

    /// Resets the timer's start point explicitly.
    pub fn reset(&mut self, at: TimePoint) {
        self.started = at;
    }

    /// Elapsed time since the timer was (re)started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Elapsed milliseconds since start, as an `i64`.
    #[must_use]
    pub fn elapsed_millis(&self) -> i64 {
        self.elapsed().millis()
    }

    /// Elapsed microseconds since start, as an `i64`.
    #[must_use]
    pub fn elapsed_micros(&self) -> i64 {
        self.elapsed().micros()
    }

    /// Elapsed time since start, then restarts the timer — matches
    /// `rpp::Timer::next()`.
    pub fn next(&mut self) -> Duration {
        let now = TimePoint::now();
        let elapsed = self.started.elapsed_since(now);
        self.started = now;
        elapsed
    }

    /// Measures the duration a closure takes to run.
    pub fn measure<F: FnOnce()>(f: F) -> Duration {
        let start = TimePoint::now();
        f();
        start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(StartMode::AutoStart)
    }
}

/// A start/stop/resume elapsed-time accumulator, grounded on
/// `rpp::StopWatch`. Unlike [`Timer`], time only accrues while running.
#[derive(Debug, Clone, Copy)]
pub struct StopWatch {
    begin: Option<TimePoint>,
    accumulated: Duration,
}

impl StopWatch {
    /// Creates a stopped `StopWatch` with zero accumulated time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            begin: None,
            accumulated: Duration::ZERO,
        }
    }

    /// Starts the watch if it is not already running. No-op if running.
    pub fn start(&mut self) {
        if self.begin.is_none() {
            self.begin = Some(TimePoint::now());
        }
    }

    /// Stops the watch, folding elapsed time into the accumulator. No-op
    /// if not running.
    pub fn stop(&mut self) {
        if let Some(begin) = self.begin.take() {
            self.accumulated += begin.elapsed();
        }
    }

    /// Resumes from the accumulated total without resetting it. Alias for
    /// [`StopWatch::start`] kept for parity with the original API, which
    /// distinguishes "first start" from "resume after stop" in prose only.
    pub fn resume(&mut self) {
        self.start();
    }

    /// Resets the accumulated time to zero and stops the watch.
    pub fn reset(&mut self) {
        self.begin = None;
        self.accumulated = Duration::ZERO;
    }

    /// `true` if the watch is currently running.
    #[must_use]
    pub fn started(&self) -> bool {
        self.begin.is_some()
    }

    /// `true` if the watch is currently stopped.
    #[must_use]
    pub fn stopped(&self) -> bool {
        self.begin.is_none()
    }

    /// Total elapsed time: accumulated plus any time since the last start,
    /// if currently running.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        match self.begin {
            Some(begin) => self.accumulated + begin.elapsed(),
            None => self.accumulated,
        }
    }

    /// Total elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_millis(&self) -> i64 {
        self.elapsed().millis()
    }
}

impl Default for StopWatch {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard that logs elapsed time via `tracing::debug!` on drop.
///
/// Supplements `spec.md`'s distilled time subsystem with
/// `rpp::ScopedPerfTimer` (`original_source/src/rpp/timer.h:270`), a
/// direct, cheap port that exercises the crate's `tracing` ambient stack.
///
/// ```
/// use parking_lot_core_async::time::ScopedPerfTimer;
///
/// {
///     let _t = ScopedPerfTimer::new("expensive_step");
///     // .. do work ..
/// } // logs "expensive_step took Xms" on drop
/// ```
pub struct ScopedPerfTimer {
    label: &'static str,
    start: TimePoint,
}

impl ScopedPerfTimer {
    /// Starts a new scoped perf timer labeled `label`.
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            start: TimePoint::now(),
        }
    }
}

impl Drop for ScopedPerfTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        tracing::debug!(label = self.label, elapsed_ms = elapsed.millis(), "scoped perf timer");
    }
}
