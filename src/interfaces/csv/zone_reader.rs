use crate::domain::zone::{CountryEntry, ZoneEntry, ZoneTable};
use crate::error::{Result, ShippingError};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const EMBEDDED_ZONES: &str = include_str!("../../../data/zones.csv");
const EMBEDDED_COUNTRIES: &str = include_str!("../../../data/countries.csv");

pub const ZONES_FILE: &str = "zones.csv";
pub const COUNTRIES_FILE: &str = "countries.csv";

/// Reads zone data from CSV sources.
///
/// `zones` carries `zone,display_name` rows and `countries` carries
/// `country,zone` rows. Whitespace is trimmed and rows are deserialized
/// eagerly since the table is small and must be validated as a whole.
pub struct ZoneReader<Z: Read, C: Read> {
    zones: csv::Reader<Z>,
    countries: csv::Reader<C>,
}

fn reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source)
}

fn collect<T: DeserializeOwned, R: Read>(reader: csv::Reader<R>, file: &str) -> Result<Vec<T>> {
    reader
        .into_deserialize::<T>()
        .enumerate()
        .map(|(idx, row)| {
            row.map_err(|e| {
                ShippingError::ZoneTableError(format!("{file} row {}: {e}", idx + 1))
            })
        })
        .collect()
}

impl<Z: Read, C: Read> ZoneReader<Z, C> {
    pub fn new(zones: Z, countries: C) -> Self {
        Self {
            zones: reader(zones),
            countries: reader(countries),
        }
    }

    /// Parses both sources and builds a validated `ZoneTable`.
    pub fn into_table(self) -> Result<ZoneTable> {
        let zones: Vec<ZoneEntry> = collect(self.zones, ZONES_FILE)?;
        let countries: Vec<CountryEntry> = collect(self.countries, COUNTRIES_FILE)?;
        ZoneTable::new(zones, countries)
    }
}

/// The table compiled into the binary from `data/`.
pub fn embedded_table() -> Result<ZoneTable> {
    ZoneReader::new(EMBEDDED_ZONES.as_bytes(), EMBEDDED_COUNTRIES.as_bytes()).into_table()
}

/// Loads `zones.csv` and `countries.csv` from a directory.
pub fn load_table_from_dir<P: AsRef<Path>>(dir: P) -> Result<ZoneTable> {
    let dir = dir.as_ref();
    let zones = File::open(dir.join(ZONES_FILE))?;
    let countries = File::open(dir.join(COUNTRIES_FILE))?;
    ZoneReader::new(zones, countries).into_table()
}

/// Directory override when given, embedded table otherwise.
pub fn load_table(dir: Option<&Path>) -> Result<ZoneTable> {
    match dir {
        Some(dir) => load_table_from_dir(dir),
        None => embedded_table(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::zone::ZoneId;
    use std::io::Write;

    #[test]
    fn test_embedded_table_is_valid() {
        let table = embedded_table().unwrap();
        let ids: Vec<&str> = table.zones().iter().map(|z| z.zone.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "UK_IRELAND",
                "WEST_CENTRAAFRICA",
                "USA_CANADA",
                "EUROPE",
                "EAST_SOUTHAFRICA",
                "MIDDLEEAST",
                "ASIA",
                "SOUTHAMERICA"
            ]
        );
        assert!(table.countries().len() > 150);
    }

    #[test]
    fn test_every_zone_has_countries() {
        let table = embedded_table().unwrap();
        for entry in table.zones() {
            assert!(
                table.countries_in(&entry.zone).next().is_some(),
                "{} has no countries",
                entry.zone
            );
        }
    }

    #[test]
    fn test_embedded_lookups() {
        let table = embedded_table().unwrap();
        assert_eq!(table.resolve_zone("Nigeria").unwrap().as_str(), "WEST_CENTRAAFRICA");
        assert_eq!(table.resolve_zone("united kingdom").unwrap().as_str(), "UK_IRELAND");
        assert_eq!(table.resolve_zone("  Japan ").unwrap().as_str(), "ASIA");
        assert_eq!(
            table.display_name(&ZoneId::new("UK_IRELAND").unwrap()),
            Some("UK/Ireland")
        );
        assert!(table.resolve_zone("Atlantis").is_none());
    }

    #[test]
    fn test_reader_trims_whitespace() {
        let zones = "zone, display_name\n ASIA , Asia \n";
        let countries = "country, zone\n Japan , ASIA\n";
        let table = ZoneReader::new(zones.as_bytes(), countries.as_bytes())
            .into_table()
            .unwrap();
        assert_eq!(table.resolve_zone("Japan").unwrap().as_str(), "ASIA");
        assert_eq!(table.zones()[0].display_name, "Asia");
    }

    #[test]
    fn test_reader_reports_bad_row() {
        let zones = "zone,display_name\nASIA,Asia\n";
        let countries = "country,zone\nJapan,not a zone!\n";
        let err = ZoneReader::new(zones.as_bytes(), countries.as_bytes())
            .into_table()
            .unwrap_err();
        assert!(matches!(err, ShippingError::ZoneTableError(ref m) if m.contains("countries.csv row 1")));
    }

    #[test]
    fn test_reader_rejects_undeclared_zone() {
        let zones = "zone,display_name\nASIA,Asia\n";
        let countries = "country,zone\nFrance,EUROPE\n";
        let result = ZoneReader::new(zones.as_bytes(), countries.as_bytes()).into_table();
        assert!(matches!(result, Err(ShippingError::ZoneTableError(_))));
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut zones = File::create(dir.path().join(ZONES_FILE)).unwrap();
        writeln!(zones, "zone,display_name\nEUROPE,Europe").unwrap();
        let mut countries = File::create(dir.path().join(COUNTRIES_FILE)).unwrap();
        writeln!(countries, "country,zone\nFrance,EUROPE").unwrap();

        let table = load_table(Some(dir.path())).unwrap();
        assert_eq!(table.zones().len(), 1);
        assert_eq!(table.resolve_zone("france").unwrap().as_str(), "EUROPE");
    }

    #[test]
    fn test_load_from_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_table(Some(&dir.path().join("nope"))),
            Err(ShippingError::IoError(_))
        ));
    }
}
