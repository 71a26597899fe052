//! CSV views of a page's forms and tables.
//!
//! Tables use a marker layout so downstream readers can split them again:
//! a `Table` row, the table rows, then two empty rows.

use crate::models::{FormField, Table};

pub const FORM_HEADERS: [&str; 2] = ["Key", "Value"];
pub const TABLE_MARKER: &str = "Table";
const TABLE_SEPARATOR_ROWS: usize = 2;

/// `Key,Value` header then one row per field, in source order.
pub fn forms_csv(fields: &[FormField]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(FORM_HEADERS)?;
    for field in fields {
        writer.write_record([field.key_text(), field.value_text()])?;
    }
    into_bytes(writer)
}

pub fn tables_csv(tables: &[Table]) -> Result<Vec<u8>, csv::Error> {
    let mut out = Vec::new();
    for table in tables {
        write_row(&mut out, &[TABLE_MARKER])?;
        for row in &table.rows {
            if row.cells.is_empty() {
                out.push(b'\n');
            } else {
                write_row(&mut out, &row.cells)?;
            }
        }
        for _ in 0..TABLE_SEPARATOR_ROWS {
            out.push(b'\n');
        }
    }
    Ok(out)
}

// The csv writer quotes a record with zero fields, so empty rows are pushed
// as a bare terminator and only non-empty rows go through a writer.
fn write_row<I, T>(out: &mut Vec<u8>, record: I) -> Result<(), csv::Error>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(out);
    writer.write_record(record)?;
    writer.flush()?;
    Ok(())
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, csv::Error> {
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}
