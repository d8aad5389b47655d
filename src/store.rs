//! Durable, append-only record store.
//!
//! The record file is delimited text with a fixed header row
//! (`id,title,body,summary1,summary2,summary3`) followed by one row per
//! captured article in capture order. The store is the resumability
//! contract: on open it seeds the caller's visited set from the leading
//! field of every existing row, and every appended row is flushed before
//! control returns, so a crash after [`RecordStore::append`] never loses a
//! reported capture and never duplicates it on the next run.
//!
//! Storage failures are fatal to the whole process. The crawl has no
//! recovery path for an untrustworthy store, because dedup across restarts
//! depends on the file contents being exactly what was reported as written.

use crate::models::ArticleRecord;
use std::collections::HashSet;
use std::error::Error;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Column names of the record file's header row, written exactly once when
/// the file is first created.
pub const HEADER: [&str; 6] = ["id", "title", "body", "summary1", "summary2", "summary3"];

/// Append handle over the record file.
///
/// Obtained from [`RecordStore::open`] together with the set of identifiers
/// already persisted by prior runs.
pub struct RecordStore {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl RecordStore {
    /// Open the record file at `path`, creating it if absent.
    ///
    /// A missing file is created with the header row written and flushed
    /// immediately; the returned seed set is empty. An existing file is read
    /// in full: every line after the header contributes its first field,
    /// parsed as an integer identifier, to the seed set. Lines whose id does
    /// not parse are skipped without aborting the load, so a truncated or
    /// hand-edited trailing line never prevents a resume.
    ///
    /// # Returns
    ///
    /// The store positioned to append after the last existing row, plus the
    /// seed set of previously persisted identifiers.
    ///
    /// # Errors
    ///
    /// Any failure to create, read, or open the underlying file. These are
    /// fatal to the crawl by design.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<(Self, HashSet<u64>), Box<dyn Error>> {
        let path = path.as_ref();

        if !path.exists() {
            let file = File::create(path)?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);
            writer.write_record(HEADER)?;
            writer.flush()?;
            info!("Created record file with header row");
            return Ok((
                Self {
                    writer,
                    path: path.to_path_buf(),
                },
                HashSet::new(),
            ));
        }

        let mut seed = HashSet::new();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;
        for row in reader.records() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable record line");
                    continue;
                }
            };
            match row.get(0).map(str::parse::<u64>) {
                Some(Ok(id)) => {
                    seed.insert(id);
                }
                _ => {
                    debug!(
                        line = row.position().map(|p| p.line()).unwrap_or_default(),
                        "Skipping row with unparsable id"
                    );
                }
            }
        }

        let file = OpenOptions::new().append(true).open(path)?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        info!(seeded = seed.len(), "Opened existing record file for append");
        Ok((
            Self {
                writer,
                path: path.to_path_buf(),
            },
            seed,
        ))
    }

    /// Append one record as a single row and flush it durably.
    ///
    /// The row is visible in the file before this returns: a crash between
    /// two appends loses nothing that was already reported as captured.
    ///
    /// # Errors
    ///
    /// Any failure to serialize, write, or flush. Fatal to the crawl.
    pub fn append(&mut self, record: &ArticleRecord) -> Result<(), Box<dyn Error>> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        debug!(id = record.id, "Appended record row");
        Ok(())
    }

    /// Path of the underlying record file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64) -> ArticleRecord {
        ArticleRecord {
            id,
            title: format!("title-{id}"),
            body: format!("body-{id}"),
            summary1: "s1".to_string(),
            summary2: "s2".to_string(),
            summary3: "s3".to_string(),
        }
    }

    #[test]
    fn test_open_creates_file_with_only_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");

        let (store, seed) = RecordStore::open(&path).unwrap();
        assert!(seed.is_empty());
        drop(store);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "id,title,body,summary1,summary2,summary3\n");
    }

    #[test]
    fn test_append_is_visible_before_store_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");

        let (mut store, _) = RecordStore::open(&path).unwrap();
        store.append(&record(42)).unwrap();

        // Re-read fresh while the store is still open: the row must already
        // be durable, with the identifier as its leading field.
        let contents = std::fs::read_to_string(&path).unwrap();
        let second_line = contents.lines().nth(1).unwrap();
        assert!(second_line.starts_with("42,"));
    }

    #[test]
    fn test_reopen_seeds_ids_and_appends_after_last_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");

        let (mut store, _) = RecordStore::open(&path).unwrap();
        store.append(&record(1)).unwrap();
        store.append(&record(2)).unwrap();
        drop(store);

        let (mut store, seed) = RecordStore::open(&path).unwrap();
        assert_eq!(seed, HashSet::from([1, 2]));

        store.append(&record(3)).unwrap();
        drop(store);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4); // header + 3 rows
        assert!(lines[0].starts_with("id,"));
        assert!(lines[1].starts_with("1,"));
        assert!(lines[2].starts_with("2,"));
        assert!(lines[3].starts_with("3,"));
    }

    #[test]
    fn test_unparsable_id_rows_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        std::fs::write(
            &path,
            "id,title,body,summary1,summary2,summary3\n\
             7,t,b,a,b,c\n\
             not-a-number,t,b,a,b,c\n\
             9,t,b,a,b,c\n",
        )
        .unwrap();

        let (_store, seed) = RecordStore::open(&path).unwrap();
        assert_eq!(seed, HashSet::from([7, 9]));
    }

    #[test]
    fn test_rows_with_wrong_field_count_still_seed_their_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        std::fs::write(
            &path,
            "id,title,body,summary1,summary2,summary3\n\
             11,short-row\n\
             12,t,b,a,b,c\n",
        )
        .unwrap();

        let (_store, seed) = RecordStore::open(&path).unwrap();
        assert_eq!(seed, HashSet::from([11, 12]));
    }

    #[test]
    fn test_normalized_fields_round_trip_unquoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");

        let (mut store, _) = RecordStore::open(&path).unwrap();
        store
            .append(&ArticleRecord {
                id: 12345,
                title: "A".to_string(),
                body: "B、 with、 commas".to_string(),
                summary1: "S1".to_string(),
                summary2: "S2".to_string(),
                summary3: "S3".to_string(),
            })
            .unwrap();
        drop(store);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents.lines().nth(1).unwrap(),
            "12345,A,B、 with、 commas,S1,S2,S3"
        );
    }
}
