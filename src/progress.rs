use std::io::{BufRead, ErrorKind};
use std::time::{Duration, Instant};

/// Used when the source duration could not be probed.
pub const FALLBACK_DURATION: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Eta {
    Calculating,
    Remaining(Duration),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressSample {
    /// Position reached in the source, in seconds.
    pub elapsed: f64,
    pub fraction: f64,
    pub eta: Eta,
}

impl ProgressSample {
    pub fn complete(duration: f64) -> Self {
        ProgressSample {
            elapsed: duration,
            fraction: 1.0,
            eta: Eta::Remaining(Duration::ZERO),
        }
    }
}

/// Pulls the `time=HH:MM:SS[.frac]` marker out of an encoder status line.
pub fn parse_time_marker(line: &str) -> Option<f64> {
    let start = line.find("time=")? + "time=".len();
    let value = line[start..].split_whitespace().next()?;
    parse_timestamp(value)
}

pub fn parse_timestamp(value: &str) -> Option<f64> {
    let mut parts = value.split(':');
    let hours = parts.next()?;
    let minutes = parts.next()?;
    let seconds = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(hours) || !digits(minutes) {
        return None;
    }
    let (whole, frac) = seconds.split_once('.').unwrap_or((seconds, "0"));
    if !digits(whole) || !digits(frac) {
        return None;
    }
    let hours: f64 = hours.parse().ok()?;
    let minutes: f64 = minutes.parse().ok()?;
    let seconds: f64 = format!("{whole}.{frac}").parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Turns source positions into monotonic completion samples for one job.
pub struct ProgressTracker {
    duration: f64,
    started: Instant,
    best: f64,
}

impl ProgressTracker {
    pub fn new(duration: Option<f64>) -> Self {
        ProgressTracker {
            duration: duration.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(FALLBACK_DURATION),
            started: Instant::now(),
            best: 0.0,
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn observe_line(&mut self, line: &str) -> Option<ProgressSample> {
        parse_time_marker(line).map(|elapsed| self.observe(elapsed, self.started.elapsed()))
    }

    pub fn observe(&mut self, elapsed: f64, wall_clock: Duration) -> ProgressSample {
        let fraction = (elapsed / self.duration).clamp(0.0, 1.0).max(self.best);
        self.best = fraction;
        let eta = if elapsed > 0.0 {
            let remaining = wall_clock.as_secs_f64() * (self.duration / elapsed - 1.0);
            Eta::Remaining(Duration::try_from_secs_f64(remaining.max(0.0)).unwrap_or(Duration::MAX))
        } else {
            Eta::Calculating
        };
        ProgressSample { elapsed, fraction, eta }
    }
}

/// Splits a diagnostic stream on `\n` and on the `\r` the encoder uses to
/// redraw its status line. Bytes are decoded lossily.
pub struct DiagnosticLines<R> {
    reader: R,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> DiagnosticLines<R> {
    pub fn new(reader: R) -> Self {
        DiagnosticLines { reader, buf: Vec::new(), done: false }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        line
    }
}

impl<R: BufRead> Iterator for DiagnosticLines<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if self.done {
                return None;
            }
            let available = match self.reader.fill_buf() {
                Ok(bytes) => bytes,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(_) => &[][..],
            };
            if available.is_empty() {
                self.done = true;
                if self.buf.is_empty() {
                    return None;
                }
                return Some(self.take_line());
            }
            match available.iter().position(|b| *b == b'\n' || *b == b'\r') {
                Some(i) => {
                    self.buf.extend_from_slice(&available[..i]);
                    self.reader.consume(i + 1);
                    if self.buf.is_empty() {
                        continue;
                    }
                    return Some(self.take_line());
                },
                None => {
                    let len = available.len();
                    self.buf.extend_from_slice(available);
                    self.reader.consume(len);
                },
            }
        }
    }
}
