//! Quote-aware CSV tokenizer.
//!
//! Single pass with one character of lookahead. Quoted fields may contain
//! commas, line breaks and doubled quotes. Rows whose fields are all blank
//! are dropped.

/// A tokenized CSV row.
pub type Row = Vec<String>;

/// Accumulates fields for the row being scanned.
#[derive(Default)]
struct RowInProgress {
    fields: Vec<String>,
    field: String,
}

impl RowInProgress {
    fn end_field(&mut self) {
        self.fields.push(std::mem::take(&mut self.field));
    }

    /// Finish the row, keeping it only if some field has content.
    fn end_row(&mut self, rows: &mut Vec<Row>) {
        self.end_field();
        let fields = std::mem::take(&mut self.fields);
        if fields.iter().any(|f| !f.trim().is_empty()) {
            rows.push(fields);
        }
    }

    fn is_untouched(&self) -> bool {
        self.fields.is_empty() && self.field.is_empty()
    }
}

/// Split decoded CSV text into rows of fields.
///
/// Line breaks may be LF, CR or CR-LF. An unterminated quoted field at end
/// of input is closed implicitly.
pub fn tokenize(content: &str) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut current = RowInProgress::default();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    chars.next();
                    current.field.push('"');
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => current.end_field(),
            '\r' | '\n' if !in_quotes => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                current.end_row(&mut rows);
            }
            _ => current.field.push(c),
        }
    }

    if !current.is_untouched() {
        current.end_row(&mut rows);
    }

    rows
}
