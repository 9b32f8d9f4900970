//! Human time strings (`HH:MM:SS`, `MM:SS`) to whole seconds and back.

use std::fmt;

use super::error::{AppError, AppResult};

/// Parses `HH:MM:SS` or `MM:SS` into seconds.
///
/// `None`, an empty string, or whitespace yields `Ok(None)`, meaning the
/// bound is unspecified (start of video, or end of video for an end time).
pub fn parse_time(input: Option<&str>) -> AppResult<Option<u64>> {
    let raw = match input.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(s) => s,
    };

    let invalid = || AppError::InvalidFormat(raw.to_string());

    let fields = raw
        .split(':')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u64>().map_err(|_| invalid())
        })
        .collect::<AppResult<Vec<u64>>>()?;

    let (hours, minutes, seconds) = match fields.as_slice() {
        [m, s] => (0, *m, *s),
        [h, m, s] => {
            if *m >= 60 {
                return Err(invalid());
            }
            (*h, *m, *s)
        }
        _ => return Err(invalid()),
    };

    if seconds >= 60 {
        return Err(invalid());
    }

    hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes.checked_mul(60)?))
        .and_then(|hm| hm.checked_add(seconds))
        .map(Some)
        .ok_or_else(invalid)
}

/// Formats seconds as zero-padded `HH:MM:SS`.
pub fn format_time(total: u64) -> String {
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Trim window for a download. Both bounds are optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl TimeRange {
    pub fn parse(start: Option<&str>, end: Option<&str>) -> AppResult<Self> {
        let range = Self {
            start: parse_time(start)?,
            end: parse_time(end)?,
        };

        if let Some(end) = range.end {
            if end <= range.start.unwrap_or(0) {
                return Err(AppError::invalid_input(
                    "end_time must be after start_time",
                ));
            }
        }

        Ok(range)
    }

    /// True when the whole video is wanted.
    pub fn is_full(&self) -> bool {
        self.start.unwrap_or(0) == 0 && self.end.is_none()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_full() {
            return f.write_str("full");
        }
        let start = format_time(self.start.unwrap_or(0));
        match self.end {
            Some(end) => write!(f, "{}-{}", start, format_time(end)),
            None => write!(f, "{}-end", start),
        }
    }
}
