//! CSV export of a user's records.
//!
//! The format backslash-escapes `"`, `,` and newlines inside fields instead
//! of RFC 4180 quoting; importers split rows on unescaped commas. Dates are
//! rendered `DD-MM-YYYY`.

use crate::records::models::DiaryRecord;

pub const HEADER: &str = "id,date,time-spent,language,rating,description";

fn escape(field: &str) -> String {
    field
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace(',', "\\,")
}

pub fn render(records: &[DiaryRecord]) -> String {
    let mut lines = format!("{HEADER}\n");
    for record in records {
        lines.push_str(&format!(
            "{},{},{},{},{},\"{}\"\n",
            record.id,
            record.date.format("%d-%m-%Y"),
            record.time_spent,
            escape(&record.language),
            record.rating,
            escape(&record.description),
        ));
    }
    lines
}
