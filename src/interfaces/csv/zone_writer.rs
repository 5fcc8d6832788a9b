use crate::domain::zone::ZoneTable;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct Row<'a> {
    country: &'a str,
    zone: &'a str,
    display_name: &'a str,
}

/// Writes the resolved table as `country,zone,display_name` rows.
pub struct ZoneWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ZoneWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_table(&mut self, table: &ZoneTable) -> Result<()> {
        for entry in table.zones() {
            for country in table.countries_in(&entry.zone) {
                self.writer.serialize(Row {
                    country,
                    zone: entry.zone.as_str(),
                    display_name: &entry.display_name,
                })?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}
