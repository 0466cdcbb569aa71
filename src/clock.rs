/*!
The clock synchronizer: turns one sampled instant per second into a render
payload describing two wall clocks.

The synchronizer owns the viewer's local time zone and the mutable
[`ClockState`] (active zone plus 12/24-hour mode). Each [`tick`](Synchronizer::tick)
samples a single instant and produces a [`Render`]: a local face, a remote
face and an optional cross-day marker. Formatting a tick is synchronous and
fast, so a one-second cadence never overlaps itself.

The remote face is deliberately produced by formatting the instant in the
active zone and parsing the formatter's output back into components, rather
than by offset arithmetic. The time zone database then accounts for DST and
half-hour or 45-minute zones without this crate carrying any rules of its
own.
*/

use std::time::Duration;

use jiff::{fmt::strtime, tz::TimeZone, Timestamp, Zoned};

use crate::error::{err, Error};

/// The two pieces of state a tick reads: which zone the remote clock shows,
/// and whether both clocks render in 24-hour form.
///
/// This is a plain value owned by the synchronizer. Selection changes swap
/// the zone; the format toggle flips the hour mode. Persistence of either is
/// the caller's business.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClockState {
    timezone: String,
    use_24_hour: bool,
}

impl ClockState {
    /// Creates a state for the given zone, rendering in 24-hour form.
    pub fn new(timezone: impl Into<String>) -> ClockState {
        ClockState { timezone: timezone.into(), use_24_hour: true }
    }

    /// The active IANA time zone identifier.
    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn set_timezone(&mut self, timezone: impl Into<String>) {
        self.timezone = timezone.into();
    }

    pub fn use_24_hour(&self) -> bool {
        self.use_24_hour
    }

    pub fn set_use_24_hour(&mut self, yes: bool) {
        self.use_24_hour = yes;
    }

    /// Flips between 24-hour and 12-hour rendering.
    pub fn toggle_format(&mut self) {
        self.use_24_hour = !self.use_24_hour;
    }
}

/// AM or PM, present on a clock face only in 12-hour mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Meridiem {
    AM,
    PM,
}

impl core::fmt::Display for Meridiem {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(match self {
            Meridiem::AM => "AM",
            Meridiem::PM => "PM",
        })
    }
}

/// One wall clock's worth of display components.
///
/// In 24-hour mode `hour` is `0..=23` and `period` is absent. In 12-hour
/// mode `hour` is `1..=12` (midnight and noon both read 12) and `period`
/// carries AM/PM.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClockFace {
    hour: i8,
    minute: i8,
    second: i8,
    period: Option<Meridiem>,
}

impl ClockFace {
    pub fn hour(&self) -> i8 {
        self.hour
    }

    pub fn minute(&self) -> i8 {
        self.minute
    }

    pub fn second(&self) -> i8 {
        self.second
    }

    pub fn period(&self) -> Option<Meridiem> {
        self.period
    }
}

impl core::fmt::Display for ClockFace {
    /// Renders the face the way the widget shows it: two digits per
    /// component, with the period appended in 12-hour mode.
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)?;
        if let Some(period) = self.period {
            write!(f, " {period}")?;
        }
        Ok(())
    }
}

/// The cross-day indicator next to the remote clock.
///
/// Shown only when the remote calendar day number differs from the local one
/// by exactly one. The computation is a difference of day-of-month numbers,
/// so a remote zone sitting across a month or year boundary produces a large
/// difference and the marker is suppressed entirely. That matches the
/// original widget and is intentional: the marker is only meaningful near
/// local midnight, where the true offset is genuinely one day.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DayMarker {
    /// The remote clock is a calendar day ahead (`+1`).
    Ahead,
    /// The remote clock is a calendar day behind (`−1`).
    Behind,
}

impl core::fmt::Display for DayMarker {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(match self {
            DayMarker::Ahead => "+1",
            // U+2212, the minus sign the widget renders.
            DayMarker::Behind => "\u{2212}1",
        })
    }
}

/// What one tick hands the presentation layer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Render {
    local: ClockFace,
    remote: ClockFace,
    day_marker: Option<DayMarker>,
}

impl Render {
    /// The viewer's own clock.
    pub fn local(&self) -> &ClockFace {
        &self.local
    }

    /// The clock for the active time zone.
    pub fn remote(&self) -> &ClockFace {
        &self.remote
    }

    pub fn day_marker(&self) -> Option<DayMarker> {
        self.day_marker
    }
}

/// Produces a render payload once per tick, and remembers the last one that
/// succeeded.
///
/// A synchronizer starts idle. The first successful selection activates it
/// with a zone; from then on it is running, and stays running even when a
/// tick fails (an unrecognized zone yields an error while the previous
/// good render is retained, so the display degrades to stale rather than
/// crashing). The next valid zone recovers it.
///
/// All mutation goes through `&mut self`, so state changes and tick reads
/// are sequenced by construction; share a synchronizer across threads with
/// a lock if the embedding needs to.
///
/// # Example
///
/// ```
/// use jiff::Timestamp;
/// use world_clock::{resolve, Catalog, Selection, Synchronizer};
///
/// let resolved = resolve(Catalog::bundled(), &Selection::default())?;
/// let mut sync = Synchronizer::new();
/// sync.activate(resolved.timezone());
/// let render = sync.tick(Timestamp::now())?;
/// println!("{} / {}", render.local(), render.remote());
/// # Ok::<(), world_clock::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Synchronizer {
    local: TimeZone,
    state: Option<ClockState>,
    last: Option<Render>,
}

impl Synchronizer {
    /// Creates an idle synchronizer using the system time zone for the
    /// local clock.
    pub fn new() -> Synchronizer {
        Synchronizer::with_local(TimeZone::system())
    }

    /// Creates an idle synchronizer with an explicit local time zone.
    pub fn with_local(local: TimeZone) -> Synchronizer {
        Synchronizer { local, state: None, last: None }
    }

    /// The zone driving the local clock face.
    pub fn local_time_zone(&self) -> &TimeZone {
        &self.local
    }

    /// Whether a zone has been activated yet.
    pub fn is_running(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&ClockState> {
        self.state.as_ref()
    }

    /// Points the remote clock at a zone, activating the synchronizer if
    /// this is the first selection.
    ///
    /// The identifier is not validated here; an unresolvable zone surfaces
    /// as an error on the next tick.
    pub fn activate(&mut self, timezone: impl Into<String>) {
        let timezone = timezone.into();
        match self.state.as_mut() {
            Some(state) => state.set_timezone(timezone),
            None => {
                debug!("clock synchronizer activated with zone {timezone:?}");
                self.state = Some(ClockState::new(timezone));
            }
        }
    }

    /// Flips 12/24-hour rendering. Idle synchronizers have no format to
    /// flip; this does nothing until a zone is activated.
    pub fn toggle_format(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.toggle_format();
        }
    }

    /// Replaces the clock state wholesale.
    pub fn set_state(&mut self, state: ClockState) {
        self.state = Some(state);
    }

    /// Renders both clock faces from a single sampled instant.
    ///
    /// On success the render is stored as the last good payload and
    /// returned. On failure (no zone activated yet, or the active zone is
    /// not recognized by the time zone database) the last good payload is
    /// left untouched; see [`last_render`](Synchronizer::last_render).
    pub fn tick(&mut self, now: Timestamp) -> Result<Render, Error> {
        let state = self.state.as_ref().ok_or_else(|| {
            err!("clock tick before any timezone was activated")
        })?;
        let render = render(&self.local, state, now).map_err(|e| {
            warn!("tick failed, retaining previous render: {e}");
            e
        })?;
        trace!("tick: {} / {}", render.local, render.remote);
        self.last = Some(render.clone());
        Ok(render)
    }

    /// The most recent successful render, if any tick has succeeded.
    pub fn last_render(&self) -> Option<&Render> {
        self.last.as_ref()
    }

    /// Drives the synchronizer at a once-per-second cadence.
    ///
    /// Each iteration samples the current instant, ticks, and hands the
    /// result to `emit`. The loop runs until `emit` returns `false` (the
    /// equivalent of the hosting page going away); there is nothing else to
    /// tear down, since the synchronizer holds no external resources.
    pub fn run<F>(&mut self, mut emit: F)
    where
        F: FnMut(Result<Render, Error>) -> bool,
    {
        loop {
            let outcome = self.tick(Timestamp::now());
            if !emit(outcome) {
                return;
            }
            std::thread::sleep(Duration::from_secs(1));
        }
    }
}

impl Default for Synchronizer {
    fn default() -> Synchronizer {
        Synchronizer::new()
    }
}

/// The per-tick computation. Pure: equal inputs produce equal renders.
fn render(
    local: &TimeZone,
    state: &ClockState,
    now: Timestamp,
) -> Result<Render, Error> {
    let remote_tz = TimeZone::get(state.timezone())
        .map_err(|e| Error::format(state.timezone(), e))?;
    let local_zdt = now.to_zoned(local.clone());
    let remote_zdt = now.to_zoned(remote_tz);

    let local_face = local_face(&local_zdt, state.use_24_hour());
    let remote_face =
        remote_face(state.timezone(), &remote_zdt, state.use_24_hour())?;

    // Difference of day-of-month numbers. Correct only for a genuine ±1 day
    // offset near local midnight; anything else (including month and year
    // boundaries) suppresses the marker.
    let day_marker =
        match i16::from(remote_zdt.day()) - i16::from(local_zdt.day()) {
            1 => Some(DayMarker::Ahead),
            -1 => Some(DayMarker::Behind),
            _ => None,
        };

    Ok(Render { local: local_face, remote: remote_face, day_marker })
}

/// Builds the local face from civil time components directly.
fn local_face(zdt: &Zoned, use_24_hour: bool) -> ClockFace {
    let (hour, minute, second) = (zdt.hour(), zdt.minute(), zdt.second());
    if use_24_hour {
        return ClockFace { hour, minute, second, period: None };
    }
    let period =
        if hour < 12 { Meridiem::AM } else { Meridiem::PM };
    let hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    ClockFace { hour, minute, second, period: Some(period) }
}

/// Builds the remote face by formatting the instant in the remote zone and
/// parsing the formatter's output back into components.
fn remote_face(
    timezone: &str,
    zdt: &Zoned,
    use_24_hour: bool,
) -> Result<ClockFace, Error> {
    let formatted = if use_24_hour {
        strtime::format("%H:%M:%S", zdt)
    } else {
        strtime::format("%I:%M:%S %p", zdt)
    }
    .map_err(|e| Error::format(timezone, e))?;
    parse_face(timezone, &formatted)
}

/// Parses `HH:MM:SS` with an optional trailing `AM`/`PM`.
fn parse_face(timezone: &str, formatted: &str) -> Result<ClockFace, Error> {
    let (time, period) = match formatted.split_once(' ') {
        Some((time, period)) => (time, Some(period)),
        None => (formatted, None),
    };
    let period = match period {
        None => None,
        Some("AM") => Some(Meridiem::AM),
        Some("PM") => Some(Meridiem::PM),
        Some(other) => {
            return Err(Error::format(
                timezone,
                format!("formatter produced unrecognized period {other:?}"),
            ))
        }
    };
    let mut parts = time.splitn(3, ':');
    let hour = component(timezone, parts.next())?;
    let minute = component(timezone, parts.next())?;
    let second = component(timezone, parts.next())?;
    Ok(ClockFace { hour, minute, second, period })
}

fn component(timezone: &str, part: Option<&str>) -> Result<i8, Error> {
    let part = part.ok_or_else(|| {
        Error::format(timezone, "formatter output missing a time component")
    })?;
    part.parse().map_err(|_| {
        Error::format(
            timezone,
            format!("formatter produced non-numeric component {part:?}"),
        )
    })
}
