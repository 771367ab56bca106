//! CSV text -> service-area records
//!
//! The first line names the columns; rows are read by header name so the
//! sheet may reorder or add columns freely. Parsing never fails as a whole:
//! blank lines are skipped and a malformed line (an unbalanced quote) is
//! dropped on its own, leaving the lines after it intact.

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use crate::models::ServiceAreaRecord;

pub const ZIP_CODE_HEADER: &str = "ZipCode";
pub const CITY_HEADER: &str = "City";
pub const LAT_HEADER: &str = "Lat";
pub const LON_HEADER: &str = "Lon";

/// Column positions of the expected headers, if the sheet has them
#[derive(Debug, Default, Clone, Copy)]
struct HeaderIndex {
    zip_code: Option<usize>,
    city: Option<usize>,
    lat: Option<usize>,
    lon: Option<usize>,
}

impl HeaderIndex {
    fn from_headers(headers: &StringRecord) -> Self {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        Self {
            zip_code: position(ZIP_CODE_HEADER),
            city: position(CITY_HEADER),
            lat: position(LAT_HEADER),
            lon: position(LON_HEADER),
        }
    }

    fn read(&self, row: &StringRecord) -> ServiceAreaRecord {
        let field = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(str::to_string);
        ServiceAreaRecord {
            zip_code: field(self.zip_code),
            city: field(self.city),
            lat: field(self.lat),
            lon: field(self.lon),
        }
    }
}

/// Outcome of a parse, with the count of rows that were thrown away.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub records: Vec<ServiceAreaRecord>,
    pub dropped: usize,
}

/// Parse CSV text into records, keeping file order.
pub fn parse(raw: &str) -> Vec<ServiceAreaRecord> {
    parse_with_report(raw).records
}

pub fn parse_with_report(raw: &str) -> ParseReport {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let index = match lines.next().map(|(_, line)| read_line(line)) {
        None => return ParseReport::default(),
        Some(Ok(headers)) => {
            let index = HeaderIndex::from_headers(&headers);
            if index.zip_code.is_none() {
                warn!("Dataset header has no {} column: {:?}", ZIP_CODE_HEADER, headers);
            }
            index
        }
        Some(Err(e)) => {
            warn!("Unreadable dataset header: {}", e);
            return ParseReport::default();
        }
    };

    let mut report = ParseReport::default();
    for (n, line) in lines {
        match read_line(line) {
            Ok(row) => report.records.push(index.read(&row)),
            Err(e) => {
                if report.dropped < 5 {
                    debug!("Dropping malformed line {}: {}", n + 1, e);
                }
                report.dropped += 1;
            }
        }
    }

    debug!(
        "Parsed {} records ({} dropped)",
        report.records.len(),
        report.dropped
    );
    report
}

#[derive(Debug, thiserror::Error)]
enum LineError {
    #[error("unbalanced quote")]
    UnbalancedQuote,
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Read one physical line as a row. Quoted fields may not span lines, so a
/// stray quote only costs its own line.
fn read_line(line: &str) -> Result<StringRecord, LineError> {
    if line.matches('"').count() % 2 != 0 {
        return Err(LineError::UnbalancedQuote);
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut row = StringRecord::new();
    reader.read_record(&mut row)?;
    Ok(row)
}
