use crate::error::{ErrorKind, Result};
use crate::index::SnapshotIndex;
use crate::provenance::{Provenance, ProvenanceLine};
use crate::record::{FileRecord, RecordLine};
use exn::{OptionExt, ResultExt};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::instrument;

impl SnapshotIndex {
    /// Writes the snapshot: the provenance line, then one line per record
    /// (failed records included) in insertion order.
    #[instrument(skip_all, fields(index = self.label()))]
    pub fn persist(&self, mut writer: impl Write) -> Result<()> {
        let provenance = self.provenance.as_ref().ok_or_raise(|| ErrorKind::NoProvenance)?;
        write_line(&mut writer, &provenance.to_line())?;
        let mut count = 0usize;
        for record in self.entries() {
            write_line(&mut writer, &RecordLine::from(record))?;
            count += 1;
        }
        writer.flush().or_raise(|| ErrorKind::Io)?;
        tracing::info!(records = count, "Snapshot written");
        Ok(())
    }

    /// Writes the snapshot to a file, replacing it if it exists.
    pub fn persist_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref()).or_raise(|| ErrorKind::Io)?;
        self.persist(BufWriter::new(file))
    }

    /// Merges a persisted snapshot into this index, returning the number of
    /// records read.
    ///
    /// The whole source is parsed before anything is added, so a malformed
    /// line leaves the index untouched. If the index already has provenance,
    /// the source's is discarded.
    #[instrument(skip_all, fields(index = self.label(), origin = origin.as_deref()))]
    pub fn restore(&mut self, reader: impl BufRead, origin: Option<String>) -> Result<usize> {
        let mut lines = reader.lines();
        let header = lines.next().ok_or_raise(|| ErrorKind::Empty)?.or_raise(|| ErrorKind::Io)?;
        let header: ProvenanceLine = serde_json::from_str(&header).or_raise(|| ErrorKind::Malformed(1))?;
        let provenance = Provenance::from_line(header, origin)?;

        let mut records = Vec::new();
        for (number, line) in (2..).zip(lines) {
            let line = line.or_raise(|| ErrorKind::Io)?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed: RecordLine = serde_json::from_str(&line).or_raise(|| ErrorKind::Malformed(number))?;
            records.push(FileRecord::try_from(parsed).or_raise(|| ErrorKind::Malformed(number))?);
        }

        self.set_provenance_if_absent(provenance);
        let count = records.len();
        for record in records {
            self.add(record);
        }
        tracing::info!(records = count, "Snapshot loaded");
        Ok(count)
    }

    /// Merges the snapshot stored at `path`; the path becomes the origin
    /// label of the provenance.
    pub fn restore_from(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let file = File::open(path).or_raise(|| ErrorKind::Io)?;
        self.restore(BufReader::new(file), Some(path.display().to_string()))
    }

    /// Loads the snapshot stored at `path` into a fresh index.
    pub fn load(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let mut index = Self::named(name);
        index.restore_from(path)?;
        Ok(index)
    }
}

fn write_line(writer: &mut impl Write, value: &impl serde::Serialize) -> Result<()> {
    serde_json::to_writer(&mut *writer, value).or_raise(|| ErrorKind::Io)?;
    writer.write_all(b"\n").or_raise(|| ErrorKind::Io)
}
