use csv::{ReaderBuilder, StringRecord};

/// Reads one table line as a delimited record.
///
/// Quoted fields may contain the delimiter and come back without their
/// quotes. A trailing carriage return is not part of the last field, and a
/// blank line is a record with no fields.
pub fn read_record(line: &str, delimiter: u8) -> StringRecord {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(line.as_bytes());
    // a line the reader cannot decode counts as having no fields
    reader
        .records()
        .flatten()
        .next()
        .unwrap_or_else(StringRecord::new)
}

/// Splits `record` into exactly `n_fields` fields.
///
/// The field at `free_text_index` may itself contain `delimiter` unquoted: the
/// first `free_text_index` fields and the last `n_fields - free_text_index - 1`
/// fields are taken as they are, everything in between is joined back into
/// one field. Returns `None` when the record has fewer than `n_fields` fields.
pub fn split_record(
    record: &StringRecord,
    delimiter: u8,
    n_fields: usize,
    free_text_index: usize,
) -> Option<Vec<String>> {
    debug_assert!(free_text_index < n_fields);
    if record.len() < n_fields {
        return None;
    }

    let physical = record.iter().collect::<Vec<_>>();
    let trailing = n_fields - free_text_index - 1;
    let free_end = physical.len() - trailing;

    let mut fields = Vec::with_capacity(n_fields);
    fields.extend(physical[..free_text_index].iter().map(|f| f.to_string()));
    let separator = char::from(delimiter).to_string();
    fields.push(physical[free_text_index..free_end].join(separator.as_str()));
    fields.extend(physical[free_end..].iter().map(|f| f.to_string()));
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(line: &str, n_fields: usize, free_text_index: usize) -> Option<Vec<String>> {
        split_record(&read_record(line, b','), b',', n_fields, free_text_index)
    }

    #[test]
    fn exact_field_count() {
        let fields = split("a,b,c,d", 4, 2).unwrap();
        assert_eq!(fields, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn rejoins_free_text() {
        let fields = split("GO,GO:1,lipid, sterol, and fat,1/2,3", 5, 2).unwrap();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[2], "lipid, sterol, and fat");
        assert_eq!(fields[3], "1/2");
        assert_eq!(fields[4], "3");
    }

    #[test]
    fn too_few_fields() {
        assert_eq!(split("a,b,c", 4, 2), None);
    }

    #[test]
    fn quoted_fields_and_carriage_return() {
        let fields = split("x,\"a, b\",y\r", 3, 1).unwrap();
        assert_eq!(fields, vec!["x", "a, b", "y"]);
        let fields = split("\"GO\",\"GO:1\",\"a \"\"b\"\"\"", 3, 2).unwrap();
        assert_eq!(fields, vec!["GO", "GO:1", "a \"b\""]);
    }

    #[test]
    fn free_text_first_or_last() {
        let first = split("a,b,c,d", 3, 0).unwrap();
        assert_eq!(first, vec!["a,b", "c", "d"]);
        let last = split("a,b,c,d", 3, 2).unwrap();
        assert_eq!(last, vec!["a", "b", "c,d"]);
    }

    #[test]
    fn blank_line_has_no_fields() {
        assert_eq!(read_record("", b',').len(), 0);
        assert_eq!(read_record("\r", b',').len(), 0);
        assert_eq!(read_record(",", b',').len(), 2);
    }
}
