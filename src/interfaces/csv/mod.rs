pub mod zone_reader;
pub mod zone_writer;
