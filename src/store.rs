//! Snapshot persistence for scraped reviews.
//!
//! A scrape run writes one timestamped CSV snapshot; an analysis run loads
//! the latest one. The column set below is the sole interchange format
//! between the two runs and must stay compatible with prior snapshots.

use crate::csv;
use crate::models::{Review, Source};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Snapshot column contract, in order. One row per deduplicated review.
pub const COLUMNS: [&str; 8] = [
    "source",
    "company",
    "rating",
    "date",
    "title",
    "review_text",
    "username",
    "version",
];

const SNAPSHOT_PREFIX: &str = "reviews_";
const SNAPSHOT_EXT: &str = ".csv";

/// File name for a snapshot taken at `now`, e.g. `reviews_20260804_120000.csv`.
pub fn snapshot_filename(now: DateTime<Utc>) -> String {
    format!("{}{}{}", SNAPSHOT_PREFIX, now.format("%Y%m%d_%H%M%S"), SNAPSHOT_EXT)
}

/// Write a snapshot to `path`, creating parent directories as needed.
pub fn write_snapshot(path: &Path, reviews: &[Review]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create snapshot {}", path.display()))?;
    let mut out = BufWriter::new(file);

    csv::write_row(&mut out, &COLUMNS)?;
    for review in reviews {
        csv::write_row(&mut out, &review_to_row(review))?;
    }

    Ok(())
}

/// Load a snapshot written by [`write_snapshot`] (or a compatible tool).
///
/// The header must match the column contract. Rows with an unrecognized
/// source label are skipped with a warning; unparseable ratings and dates
/// degrade to `None`, and a missing text field becomes an empty string.
pub fn read_snapshot(path: &Path) -> Result<Vec<Review>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let mut rows = csv::parse_rows(&text).into_iter();

    let header = match rows.next() {
        Some(h) => h,
        None => return Ok(Vec::new()),
    };
    if header != COLUMNS {
        bail!(
            "snapshot {} has unexpected columns: {:?}",
            path.display(),
            header
        );
    }

    let mut reviews = Vec::new();
    for (line, row) in rows.enumerate() {
        match row_to_review(&row) {
            Some(review) => reviews.push(review),
            None => warn!(
                "Skipping row {} of {}: unrecognized source {:?}",
                line + 2,
                path.display(),
                row.first().map(String::as_str).unwrap_or("")
            ),
        }
    }

    Ok(reviews)
}

/// Find the most recent snapshot in `dir`, by file name (names embed a
/// sortable timestamp). Returns `Ok(None)` when the directory holds none.
pub fn latest_snapshot(dir: &Path) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut newest: Option<PathBuf> = None;
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };
        if !name.starts_with(SNAPSHOT_PREFIX) || !name.ends_with(SNAPSHOT_EXT) {
            continue;
        }
        let newer = match &newest {
            Some(current) => {
                name > current.file_name().and_then(|n| n.to_str()).unwrap_or("")
            }
            None => true,
        };
        if newer {
            newest = Some(path);
        }
    }

    Ok(newest)
}

fn review_to_row(review: &Review) -> Vec<String> {
    vec![
        review.source.as_str().to_string(),
        review.company.clone(),
        review.rating.map(|r| r.to_string()).unwrap_or_default(),
        review.date.map(|d| d.to_rfc3339()).unwrap_or_default(),
        review.title.clone().unwrap_or_default(),
        review.text.clone(),
        review.username.clone().unwrap_or_default(),
        review.app_version.clone().unwrap_or_default(),
    ]
}

fn row_to_review(row: &[String]) -> Option<Review> {
    let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
    let optional = |i: usize| {
        let v = cell(i);
        if v.is_empty() {
            None
        } else {
            Some(v.to_string())
        }
    };

    let source = Source::parse(cell(0))?;

    Some(Review {
        source,
        company: cell(1).to_string(),
        rating: parse_rating(cell(2)),
        date: parse_date(cell(3)),
        title: optional(4),
        text: cell(5).to_string(),
        username: optional(6),
        app_version: optional(7),
    })
}

/// Ratings may be persisted as "4" or, by spreadsheet tooling, as "4.0".
fn parse_rating(s: &str) -> Option<u8> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u8>() {
        return Some(n);
    }
    s.parse::<f64>().ok().map(|f| f.round() as u8)
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
