use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::Path;

use crate::listing::{BrochureEntry, ListingSnapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, ValueEnum)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    A3,
}

impl PageSize {
    /// portrait (width, height) in millimetres
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
            PageSize::A3 => (297.0, 420.0),
        }
    }

    /// portrait (width, height) in PDF points
    pub fn dimensions_pt(self) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        (mm_to_pt(w), mm_to_pt(h))
    }
}

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

/// parse a selection string like "3,1-2" into 0-indexed entry indices,
/// keeping the order in which they were written
pub fn parse_selection(s: &str, num_entries: usize) -> Result<Vec<usize>> {
    let mut picked = Vec::new();
    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((start, end)) = part.split_once('-') {
            let start: usize = start.trim().parse().context("Invalid entry number in range")?;
            let end: usize = end.trim().parse().context("Invalid entry number in range")?;
            anyhow::ensure!(
                start >= 1 && end >= start && end <= num_entries,
                "Selection {}-{} out of bounds ({} listings available)",
                start,
                end,
                num_entries
            );
            picked.extend(start - 1..end);
        } else {
            let n: usize = part.parse().context("Invalid entry number")?;
            anyhow::ensure!(
                n >= 1 && n <= num_entries,
                "Listing {} out of bounds ({} listings available)",
                n,
                num_entries
            );
            picked.push(n - 1);
        }
    }
    anyhow::ensure!(!picked.is_empty(), "No listings selected");
    picked.dedup();
    Ok(picked)
}

/// read one listing record exported from the listing store
pub fn load_listing(path: &Path) -> Result<ListingSnapshot> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&data)
        .with_context(|| format!("Failed to parse listing: {}", path.display()))
}

/// read an array of brochure entries
pub fn load_entries(path: &Path) -> Result<Vec<BrochureEntry>> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&data)
        .with_context(|| format!("Failed to parse brochure entries: {}", path.display()))
}

/// pick brochure entries: explicit selection in the given order, otherwise
/// every entry; sold boats are always left out
pub fn select_entries(
    entries: Vec<BrochureEntry>,
    selection: Option<&str>,
) -> Result<Vec<BrochureEntry>> {
    let picked: Vec<BrochureEntry> = match selection {
        Some(s) => parse_selection(s, entries.len())?
            .into_iter()
            .map(|i| entries[i].clone())
            .collect(),
        None => entries,
    };
    let unsold: Vec<BrochureEntry> = picked.into_iter().filter(|e| !e.sold).collect();
    anyhow::ensure!(!unsold.is_empty(), "No listings selected (sold listings are left out)");
    Ok(unsold)
}
