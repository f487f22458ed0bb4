use std::fs::File;
use std::io::Read;

use camino::Utf8Path;
use flate2::read::GzDecoder;

use crate::error::KiraError;

pub const DELIMITER: u8 = b',';

/// Reads a whole table into memory, gunzipping `.gz` files.
pub fn read_table_text(path: &Utf8Path) -> Result<String, KiraError> {
    let mut file = File::open(path.as_std_path())
        .map_err(|err| KiraError::Filesystem(format!("open {path}: {err}")))?;
    let mut text = String::new();
    if path.extension() == Some("gz") {
        GzDecoder::new(file)
            .read_to_string(&mut text)
            .map_err(|err| KiraError::Filesystem(format!("decompress {path}: {err}")))?;
    } else {
        file.read_to_string(&mut text)
            .map_err(|err| KiraError::Filesystem(format!("read {path}: {err}")))?;
    }
    Ok(text)
}

/// Splits table text into lines. A trailing newline (or several) does not
/// produce empty rows; an empty text yields no lines at all.
pub fn table_lines(text: &str) -> Vec<&str> {
    let trimmed = text.trim_end_matches(['\n', '\r']);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('\n').collect()
}
