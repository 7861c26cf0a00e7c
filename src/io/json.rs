// Dev/test-only reference codec: exercises the Exporter/Importer contract
// end-to-end without committing this crate to any particular wire format

use std::cell::RefCell;
use std::io::{Read, Write};

use crate::error::{PtnError, PtnResult};
use crate::io::{Exporter, Importer, NetDescription};

/// Writes a [`NetDescription`] as pretty-printed JSON to any `Write` sink.
pub struct JsonExporter<W: Write> {
    sink: W,
}

impl<W: Write> JsonExporter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }
}

impl<W: Write> Exporter for JsonExporter<W> {
    fn export(&mut self, net: &NetDescription) -> PtnResult<()> {
        serde_json::to_writer_pretty(&mut self.sink, net).map_err(|e| PtnError::ImportFormat(e.to_string()))
    }
}

/// Reads a [`NetDescription`] back from JSON. `Importer::import` takes `&self`
/// rather than `&mut self`, so the source reader sits behind a `RefCell` --
/// reading is still a one-shot, exclusive operation, just asserted at
/// runtime instead of in the type.
pub struct JsonImporter<R: Read> {
    source: RefCell<R>,
}

impl<R: Read> JsonImporter<R> {
    pub fn new(source: R) -> Self {
        Self {
            source: RefCell::new(source),
        }
    }
}

impl<R: Read> Importer for JsonImporter<R> {
    fn import(&self) -> PtnResult<NetDescription> {
        serde_json::from_reader(&mut *self.source.borrow_mut()).map_err(|e| PtnError::ImportFormat(e.to_string()))
    }
}
