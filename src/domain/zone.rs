use crate::error::{Result, ShippingError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Identifier of a coarse pricing bucket, e.g. `UK_IRELAND` or `ASIA`.
///
/// The rate table upstream is indexed by zone, never by country.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() {
            return Err(ShippingError::ValidationError(
                "Zone must not be empty".to_string(),
            ));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(ShippingError::ValidationError(format!(
                "Invalid zone identifier: {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ZoneId {
    type Error = ShippingError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ZoneId> for String {
    fn from(zone: ZoneId) -> Self {
        zone.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A declared zone and its human-readable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneEntry {
    pub zone: ZoneId,
    pub display_name: String,
}

/// A country mapped to its zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryEntry {
    pub country: String,
    pub zone: ZoneId,
}

/// The canonical country → zone mapping.
///
/// Built once from validated data and never mutated afterwards. Lookups are
/// case-insensitive and unmapped countries yield `None`, never a default zone.
#[derive(Debug, Clone)]
pub struct ZoneTable {
    zones: Vec<ZoneEntry>,
    countries: Vec<CountryEntry>,
    exact: HashMap<String, usize>,
}

impl ZoneTable {
    /// Builds the table, rejecting blank names, undeclared zones and
    /// countries listed twice (case-insensitively).
    pub fn new(zones: Vec<ZoneEntry>, countries: Vec<CountryEntry>) -> Result<Self> {
        if zones.is_empty() {
            return Err(ShippingError::ZoneTableError(
                "no zones declared".to_string(),
            ));
        }

        let mut declared: HashSet<&ZoneId> = HashSet::new();
        for entry in &zones {
            if entry.display_name.trim().is_empty() {
                return Err(ShippingError::ZoneTableError(format!(
                    "zone {} has no display name",
                    entry.zone
                )));
            }
            if !declared.insert(&entry.zone) {
                return Err(ShippingError::ZoneTableError(format!(
                    "zone {} declared twice",
                    entry.zone
                )));
            }
        }

        let countries: Vec<CountryEntry> = countries
            .into_iter()
            .map(|mut entry| {
                entry.country = entry.country.trim().to_string();
                entry
            })
            .collect();

        let mut exact = HashMap::with_capacity(countries.len());
        let mut folded: HashMap<String, &str> = HashMap::with_capacity(countries.len());
        for (idx, entry) in countries.iter().enumerate() {
            let name = entry.country.as_str();
            if name.is_empty() {
                return Err(ShippingError::ZoneTableError(format!(
                    "blank country name on row {}",
                    idx + 1
                )));
            }
            if !declared.contains(&entry.zone) {
                return Err(ShippingError::ZoneTableError(format!(
                    "country {name} maps to undeclared zone {}",
                    entry.zone
                )));
            }
            if let Some(previous) = folded.insert(name.to_lowercase(), name) {
                return Err(ShippingError::ZoneTableError(format!(
                    "country {name} listed twice (also as {previous})"
                )));
            }
            exact.insert(name.to_string(), idx);
        }

        Ok(Self {
            zones,
            countries,
            exact,
        })
    }

    /// Resolves a free-text country name to its zone.
    pub fn resolve_zone(&self, country: &str) -> Option<&ZoneId> {
        let normalized = country.trim();
        if normalized.is_empty() {
            return None;
        }

        if let Some(&idx) = self.exact.get(normalized) {
            return Some(&self.countries[idx].zone);
        }

        let lower = normalized.to_lowercase();
        self.countries
            .iter()
            .find(|entry| entry.country.to_lowercase() == lower)
            .map(|entry| &entry.zone)
    }

    pub fn display_name(&self, zone: &ZoneId) -> Option<&str> {
        self.zones
            .iter()
            .find(|entry| &entry.zone == zone)
            .map(|entry| entry.display_name.as_str())
    }

    pub fn contains_zone(&self, zone: &ZoneId) -> bool {
        self.zones.iter().any(|entry| &entry.zone == zone)
    }

    pub fn zones(&self) -> &[ZoneEntry] {
        &self.zones
    }

    pub fn countries(&self) -> &[CountryEntry] {
        &self.countries
    }

    pub fn countries_in<'a>(&'a self, zone: &'a ZoneId) -> impl Iterator<Item = &'a str> + 'a {
        self.countries
            .iter()
            .filter(move |entry| &entry.zone == zone)
            .map(|entry| entry.country.as_str())
    }
}
