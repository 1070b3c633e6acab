//! Periodic archival copies of the grid.
//!
//! A [`Snapshot`] is keyed by a [`SnapshotPeriod`] (an ISO week such as
//! `2025-W38`). At most one snapshot exists per period.

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

use super::{Color, GridView};

/// ISO-8601 week identifier, rendered as `YYYY-Www`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotPeriod {
    year: i32,
    week: u32,
}

impl SnapshotPeriod {
    /// Returns the period containing `now`.
    #[must_use]
    pub fn containing(now: DateTime<Utc>) -> Self {
        let iso = now.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// Returns the week before this one.
    #[must_use]
    pub fn previous(self) -> Self {
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
            .and_then(|monday| monday.checked_sub_signed(TimeDelta::days(7)))
            .map_or(self, |date| {
                let iso = date.iso_week();
                Self {
                    year: iso.year(),
                    week: iso.week(),
                }
            })
    }

    /// ISO week-numbering year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// ISO week number (1–53).
    #[must_use]
    pub const fn week(self) -> u32 {
        self.week
    }
}

impl fmt::Display for SnapshotPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// Error returned when a period string is not a valid ISO week.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid snapshot period: {0}")]
pub struct InvalidPeriod(pub String);

impl FromStr for SnapshotPeriod {
    type Err = InvalidPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidPeriod(s.to_string());
        let (year, week) = s.split_once("-W").ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let week: u32 = week.parse().map_err(|_| invalid())?;
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).ok_or_else(invalid)?;
        Ok(Self { year, week })
    }
}

impl Serialize for SnapshotPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SnapshotPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Immutable copy of the full grid for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// `snapshot-<period>`.
    pub id: String,
    /// Week the snapshot belongs to.
    #[schema(value_type = String, example = "2025-W38")]
    pub period: SnapshotPeriod,
    /// Capture time.
    pub taken_at: DateTime<Utc>,
    /// Grid columns.
    pub width: u32,
    /// Grid rows.
    pub height: u32,
    /// Row-major colors; `null` is background.
    #[schema(value_type = Vec<Vec<Option<String>>>)]
    pub grid: Vec<Vec<Option<Color>>>,
    /// Placement count at capture time.
    pub total_pixels: u64,
    /// Distinct users at capture time.
    pub unique_users: u64,
    /// SVG rendering of the grid, one unit per cell.
    pub svg: String,
}

impl Snapshot {
    /// Captures `view` as the snapshot of the period containing `now`.
    #[must_use]
    pub fn capture(view: &GridView, now: DateTime<Utc>) -> Self {
        let period = SnapshotPeriod::containing(now);
        Self {
            id: format!("snapshot-{period}"),
            period,
            taken_at: now,
            width: view.width,
            height: view.height,
            grid: view.grid.clone(),
            total_pixels: view.total_pixels,
            unique_users: view.unique_users,
            svg: render_svg(view),
        }
    }
}

/// Renders the grid as an SVG: a white background with one 1×1 rect per
/// non-background cell.
#[must_use]
pub fn render_svg(view: &GridView) -> String {
    let (w, h) = (view.width, view.height);
    let mut svg = format!(
        r#"<svg width="{w}" height="{h}" xmlns="http://www.w3.org/2000/svg" style="image-rendering: pixelated;">"#
    );
    let _ = write!(
        svg,
        r#"<rect width="{w}" height="{h}" fill="{}"/>"#,
        Color::BACKGROUND_HEX
    );
    for (y, row) in view.grid.iter().enumerate() {
        for (x, color) in row.iter().enumerate() {
            if let Some(color) = color.as_ref().filter(|c| !c.is_background()) {
                let _ = write!(
                    svg,
                    r#"<rect x="{x}" y="{y}" width="1" height="1" fill="{color}"/>"#
                );
            }
        }
    }
    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Grid, UserId};
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        let Some(t) = Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).single() else {
            panic!("valid date");
        };
        t
    }

    #[test]
    fn period_uses_iso_week() {
        assert_eq!(SnapshotPeriod::containing(at(2025, 9, 17)).to_string(), "2025-W38");
        // 2021-01-01 belongs to ISO week 53 of 2020.
        assert_eq!(SnapshotPeriod::containing(at(2021, 1, 1)).to_string(), "2020-W53");
    }

    #[test]
    fn same_week_same_period() {
        assert_eq!(
            SnapshotPeriod::containing(at(2025, 9, 15)),
            SnapshotPeriod::containing(at(2025, 9, 21))
        );
        assert_ne!(
            SnapshotPeriod::containing(at(2025, 9, 21)),
            SnapshotPeriod::containing(at(2025, 9, 22))
        );
    }

    #[test]
    fn previous_crosses_year_boundary() {
        let Ok(p) = "2025-W01".parse::<SnapshotPeriod>() else {
            panic!("valid period");
        };
        assert_eq!(p.previous().to_string(), "2024-W52");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("2025-W54".parse::<SnapshotPeriod>().is_err());
        assert!("2025W01".parse::<SnapshotPeriod>().is_err());
        assert!("abcd-W01".parse::<SnapshotPeriod>().is_err());
    }

    #[test]
    fn period_serializes_as_string() {
        let p = SnapshotPeriod::containing(at(2025, 9, 17));
        let Ok(json) = serde_json::to_string(&p) else {
            panic!("serialize");
        };
        assert_eq!(json, "\"2025-W38\"");
    }

    #[test]
    fn capture_renders_painted_cells_only() {
        let mut grid = Grid::new(3, 2, 0);
        let user = UserId::from("u1");
        let now = at(2025, 9, 17);
        for (x, y, c) in [(0, 0, "#FF0000"), (2, 1, "#ffffff")] {
            if grid.apply_placement(x, y, c, &user, "u1", now).is_err() {
                panic!("placement failed");
            }
        }
        let snap = Snapshot::capture(&grid.get_grid(), now);
        assert_eq!(snap.id, "snapshot-2025-W38");
        assert_eq!(snap.total_pixels, 2);
        assert!(snap.svg.contains(r##"<rect x="0" y="0" width="1" height="1" fill="#FF0000"/>"##));
        assert!(!snap.svg.contains(r#"x="2" y="1""#));
        assert!(snap.svg.ends_with("</svg>"));
    }
}
