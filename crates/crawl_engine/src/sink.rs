use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::ScrapedRecord;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Receives records in emission order.
pub trait RecordSink: Send {
    fn accept(&mut self, record: &ScrapedRecord) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Writes one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<BufWriter<File>> {
    /// Create (or truncate) `path`, creating missing parent directories.
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn accept(&mut self, record: &ScrapedRecord) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

impl RecordSink for Vec<ScrapedRecord> {
    fn accept(&mut self, record: &ScrapedRecord) -> Result<(), SinkError> {
        self.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonLinesSink, RecordSink};
    use crate::ScrapedRecord;
    use chrono::{TimeZone, Utc};
    use crawl_core::ContentKind;

    fn record(url: &str) -> ScrapedRecord {
        ScrapedRecord {
            url: url.to_string(),
            kind: ContentKind::Html,
            title: "Start".to_string(),
            text: "Hallo".to_string(),
            date_scraped: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            date_updated: None,
        }
    }

    #[test]
    fn writes_one_line_per_record() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.accept(&record("https://www.thws.de/a")).unwrap();
        sink.accept(&record("https://www.thws.de/b")).unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.written(), 2);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(r#""url":"https://www.thws.de/a""#));
        assert!(lines[1].contains(r#""date_updated":null"#));
    }
}
