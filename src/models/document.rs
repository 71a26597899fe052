use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Axis-aligned box in page-relative coordinates (0.0..=1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn centre_x(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

/// One key/value pair from a form. Either side may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub key: Option<String>,
    pub value: Option<String>,
}

impl FormField {
    pub fn key_text(&self) -> &str {
        self.key.as_deref().unwrap_or("")
    }

    pub fn value_text(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

/// A single page of an analysis result. `blocks` are the raw records as
/// received and are written back verbatim.
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based.
    pub number: usize,
    pub blocks: Vec<Value>,
    pub lines: Vec<Line>,
    pub form_fields: Vec<FormField>,
    pub tables: Vec<Table>,
}

impl Page {
    /// Text with lines grouped into columns, left column first.
    pub fn text_in_reading_order(&self) -> String {
        let mut text = String::new();
        for line in self.lines_in_reading_order() {
            text.push_str(&line.text);
            text.push('\n');
        }
        text
    }

    pub fn lines_in_reading_order(&self) -> Vec<&Line> {
        // (left, right) spans of the columns discovered so far
        let mut columns: Vec<(f64, f64)> = Vec::new();
        let mut placed: Vec<(usize, &Line)> = Vec::with_capacity(self.lines.len());

        for line in &self.lines {
            let Some(bbox) = line.bbox else {
                placed.push((0, line));
                continue;
            };
            let line_left = bbox.left;
            let line_right = bbox.right();
            let line_centre = bbox.centre_x();

            let found = columns.iter().position(|&(left, right)| {
                let column_centre = (left + right) / 2.0;
                (line_centre > left && line_centre < right)
                    || (column_centre > line_left && column_centre < line_right)
            });

            match found {
                Some(idx) => placed.push((idx, line)),
                None => {
                    columns.push((line_left, line_right));
                    placed.push((columns.len() - 1, line));
                }
            }
        }

        placed.sort_by_key(|(column, _)| *column);
        placed.into_iter().map(|(_, line)| line).collect()
    }
}

/// Parsed view over an analysis result.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub pages: Vec<Page>,
    pub block_count: usize,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, left: f64, width: f64) -> Line {
        Line {
            text: text.to_string(),
            bbox: Some(BoundingBox {
                left,
                top: 0.0,
                width,
                height: 0.02,
            }),
        }
    }

    fn page(lines: Vec<Line>) -> Page {
        Page {
            number: 1,
            blocks: vec![],
            lines,
            form_fields: vec![],
            tables: vec![],
        }
    }

    #[test]
    fn two_columns_are_read_left_then_right() {
        let p = page(vec![
            line("left 1", 0.05, 0.35),
            line("right 1", 0.55, 0.35),
            line("left 2", 0.05, 0.30),
            line("right 2", 0.56, 0.30),
        ]);
        assert_eq!(p.text_in_reading_order(), "left 1\nleft 2\nright 1\nright 2\n");
        let source: Vec<&str> = p.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(source, vec!["left 1", "right 1", "left 2", "right 2"]);
    }

    #[test]
    fn full_width_lines_stay_in_one_column() {
        let p = page(vec![line("title", 0.1, 0.8), line("body", 0.1, 0.7)]);
        assert_eq!(p.text_in_reading_order(), "title\nbody\n");
    }

    #[test]
    fn lines_without_geometry_land_in_first_column() {
        let p = page(vec![
            line("a", 0.05, 0.3),
            line("b", 0.6, 0.3),
            Line {
                text: "c".to_string(),
                bbox: None,
            },
        ]);
        assert_eq!(p.text_in_reading_order(), "a\nc\nb\n");
    }

    #[test]
    fn missing_form_sides_read_as_empty() {
        let field = FormField {
            key: Some("Name".to_string()),
            value: None,
        };
        assert_eq!(field.key_text(), "Name");
        assert_eq!(field.value_text(), "");
    }
}
