//! Read-only listing projections consumed by the composers.
//!
//! Records arrive as JSON exported from the listing store. Numeric fields
//! are stored inconsistently (sometimes numbers, sometimes strings), so they
//! are normalised to strings on the way in.

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether VAT has been paid on the vessel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaxStatus {
    Paid,
    #[default]
    NotPaid,
}

impl From<String> for TaxStatus {
    fn from(s: String) -> Self {
        if s.trim().eq_ignore_ascii_case("paid") {
            TaxStatus::Paid
        } else {
            TaxStatus::NotPaid
        }
    }
}

impl From<TaxStatus> for String {
    fn from(status: TaxStatus) -> Self {
        match status {
            TaxStatus::Paid => "paid".to_string(),
            TaxStatus::NotPaid => "notPaid".to_string(),
        }
    }
}

impl TaxStatus {
    /// wording used under the price on a spec sheet
    pub fn sheet_label(self) -> &'static str {
        match self {
            TaxStatus::Paid => "VAT paid",
            TaxStatus::NotPaid => "VAT not paid",
        }
    }

    /// wording used on brochure cards
    pub fn card_label(self) -> &'static str {
        match self {
            TaxStatus::Paid => "VAT Paid",
            TaxStatus::NotPaid => "VAT Not Paid",
        }
    }
}

/// Everything a spec sheet needs from one boat record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingSnapshot {
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub price: String,
    #[serde(deserialize_with = "string_or_number")]
    pub year: String,
    #[serde(deserialize_with = "string_or_number")]
    pub size_meters: String,
    #[serde(deserialize_with = "string_or_number")]
    pub beam_meters: String,
    pub location: String,
    pub propulsion_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub engines: String,
    #[serde(deserialize_with = "optional_string_or_number")]
    pub engine_hours: Option<String>,
    /// stored with escaped `\n` markers, held here with real line breaks
    #[serde(deserialize_with = "escaped_text")]
    pub description: String,
    #[serde(deserialize_with = "ordered_flags")]
    pub equipment: Vec<(String, bool)>,
    pub main_photo: String,
    pub other_photos: Vec<String>,
    pub tax_status: TaxStatus,
}

impl ListingSnapshot {
    /// equipment flags that are set, formatted for display, in record order
    pub fn equipment_labels(&self) -> Vec<String> {
        self.equipment
            .iter()
            .filter(|(_, on)| *on)
            .map(|(key, _)| format_equipment_key(key))
            .collect()
    }

    /// download name: lower-case listing name with whitespace runs as hyphens
    pub fn file_name(&self) -> String {
        let slug = self
            .name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();
        if slug.is_empty() {
            return "listing.pdf".to_string();
        }
        format!("{}.pdf", slug)
    }
}

/// The subset of a listing shown on a brochure card.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrochureEntry {
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub price: String,
    #[serde(deserialize_with = "string_or_number")]
    pub year: String,
    #[serde(deserialize_with = "string_or_number")]
    pub size_meters: String,
    pub location: String,
    pub main_photo: String,
    pub tax_status: TaxStatus,
    /// sold boats are left out of full-inventory brochures
    pub sold: bool,
}

impl From<&ListingSnapshot> for BrochureEntry {
    fn from(listing: &ListingSnapshot) -> Self {
        BrochureEntry {
            name: listing.name.clone(),
            price: listing.price.clone(),
            year: listing.year.clone(),
            size_meters: listing.size_meters.clone(),
            location: listing.location.clone(),
            main_photo: listing.main_photo.clone(),
            tax_status: listing.tax_status,
            sold: false,
        }
    }
}

/// Restore line breaks stored as the two characters `\` `n`.
pub fn unescape_newlines(s: &str) -> String {
    s.replace("\\n", "\n").replace("\r\n", "\n")
}

/// `hydraulicPasarelle` -> `Hydraulic Pasarelle`
pub fn format_equipment_key(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in key.chars() {
        if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Euro amount with comma thousands separators. Anything that is not a
/// number is shown as given.
pub fn format_price(price: &str) -> String {
    let trimmed = price.trim();
    let value: f64 = match trimmed.parse() {
        Ok(v) if f64::is_finite(v) => v,
        _ => return format!("€{}", trimmed),
    };
    // at most three fraction digits, trailing zeros dropped
    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if value < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
        "-"
    } else {
        ""
    };
    if frac_part.is_empty() {
        format!("€{}{}", sign, grouped)
    } else {
        format!("€{}{}.{}", sign, grouped, frac_part)
    }
}

/// Cut to `max` characters, appending an ellipsis when anything was cut.
pub fn truncate_name(name: &str, max: usize) -> String {
    if name.chars().count() > max {
        let cut: String = name.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        name.to_string()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_string_or_number(deserializer)?.unwrap_or_default())
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        serde_json::Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(de::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}

fn escaped_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(|s| unescape_newlines(&s)).unwrap_or_default())
}

/// equipment flags in the order the record lists them
fn ordered_flags<'de, D>(deserializer: D) -> Result<Vec<(String, bool)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagsVisitor;

    impl<'de> Visitor<'de> for FlagsVisitor {
        type Value = Vec<(String, bool)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of equipment flags")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut flags = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, Option<bool>>()? {
                flags.push((key, value.unwrap_or(false)));
            }
            Ok(flags)
        }
    }

    deserializer.deserialize_any(FlagsVisitor)
}
