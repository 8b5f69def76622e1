//! CSV row source with encoding and delimiter auto-detection.
//!
//! Turns a metadata spreadsheet export into ordered [`Row`]s keyed by
//! header name. No FOXML-specific logic here.

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::Row;

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed rows, in file order
    pub rows: Vec<Row>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        // UTF-8, ASCII and anything unknown: lossy UTF-8
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    match decoded.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => decoded,
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Printable form of a delimiter (`\t` for tabs).
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

/// Parse CSV text into rows with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use xmlgen::parse_str;
///
/// let rows = parse_str("XML Type,Title\nUMDM,Reel 1", ',').unwrap();
/// assert_eq!(rows.rows[0].value("Title"), "Reel 1");
/// ```
pub fn parse_str(content: &str, delimiter: char) -> CsvResult<ParseResult> {
    parse_string_with_metadata(content, delimiter, "utf-8".to_string())
}

/// Parse CSV file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);

    parse_string_with_metadata(&content, delimiter, encoding)
}

/// Parse CSV string with explicit delimiter and return metadata.
pub fn parse_string_with_metadata(
    content: &str,
    delimiter: char,
    encoding: String,
) -> CsvResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let delimiter_byte = u8::try_from(delimiter).map_err(|_| CsvError::ParseError {
        line: 1,
        message: format!("delimiter '{}' is not a single byte", delimiter),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| to_parse_error(e, 1))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| to_parse_error(e, idx + 2))?;

        if record.iter().all(|v| v.is_empty()) {
            continue;
        }

        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);
        let mut row = Row::new(line);

        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = record.get(i).unwrap_or("");
            row.fields.insert(header.clone(), value.to_string());
        }

        rows.push(row);
    }

    Ok(ParseResult {
        rows,
        encoding,
        delimiter,
        headers,
    })
}

fn to_parse_error(err: csv::Error, fallback_line: usize) -> CsvError {
    let line = err
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(fallback_line);
    CsvError::ParseError {
        line,
        message: err.to_string(),
    }
}
