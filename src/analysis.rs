//! Builds the page/line/form/table model from a Textract-style block graph.
//!
//! Blocks reference each other by `Id` through `Relationships`; a `PAGE`
//! block opens a page and every following block belongs to it until the
//! next `PAGE`.

use crate::error::{ExportError, ExportResult};
use crate::models::{BoundingBox, Document, FormField, Line, Page, Table, TableRow};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

type BlockMap<'a> = HashMap<&'a str, &'a Value>;

/// Parse a single analysis response or an array of paginated responses.
pub fn parse_document(response: &Value) -> ExportResult<Document> {
    let (responses, non_empty): (Vec<&Value>, bool) = match response {
        Value::Null => return Ok(Document::default()),
        Value::Object(map) => (vec![response], !map.is_empty()),
        Value::Array(items) => (items.iter().collect(), !items.is_empty()),
        other => {
            return Err(ExportError::malformed(format!(
                "expected an object or array, got {}",
                json_kind(other)
            )))
        }
    };

    let mut blocks: Vec<&Value> = Vec::new();
    for (idx, item) in responses.iter().enumerate() {
        if !item.is_object() {
            return Err(ExportError::malformed(format!(
                "response entry {} is {}, expected an object",
                idx,
                json_kind(item)
            )));
        }
        match item.get("Blocks") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => blocks.extend(items.iter()),
            Some(other) => {
                return Err(ExportError::malformed(format!(
                    "Blocks in response entry {} is {}, expected an array",
                    idx,
                    json_kind(other)
                )))
            }
        }
    }

    if non_empty && blocks.is_empty() {
        return Err(ExportError::malformed(
            "analysis result is not empty but contains no blocks",
        ));
    }

    let block_map: BlockMap = blocks
        .iter()
        .filter_map(|b| b.get("Id").and_then(|id| id.as_str()).map(|id| (id, *b)))
        .collect();

    let mut page_blocks: Vec<Vec<&Value>> = Vec::new();
    let mut orphans = 0usize;
    for block in &blocks {
        if block_type(block) == "PAGE" {
            page_blocks.push(vec![*block]);
        } else if let Some(current) = page_blocks.last_mut() {
            current.push(*block);
        } else {
            orphans += 1;
        }
    }
    if orphans > 0 {
        tracing::warn!(target: "analysis", orphans, "blocks before the first PAGE block were ignored");
    }

    let pages = page_blocks
        .into_iter()
        .enumerate()
        .map(|(idx, blocks)| build_page(idx + 1, &blocks, &block_map))
        .collect();

    Ok(Document {
        pages,
        block_count: blocks.len(),
    })
}

fn build_page(number: usize, blocks: &[&Value], block_map: &BlockMap) -> Page {
    let mut lines = Vec::new();
    let mut form_fields = Vec::new();
    let mut tables = Vec::new();

    for block in blocks {
        match block_type(block) {
            "LINE" => lines.push(Line {
                text: block_text(block).to_string(),
                bbox: bounding_box(block),
            }),
            "KEY_VALUE_SET" if has_entity_type(block, "KEY") => {
                form_fields.push(build_field(block, block_map));
            }
            "TABLE" => tables.push(build_table(block, block_map)),
            _ => {}
        }
    }

    Page {
        number,
        blocks: blocks.iter().map(|b| (*b).clone()).collect(),
        lines,
        form_fields,
        tables,
    }
}

fn build_field(key_block: &Value, block_map: &BlockMap) -> FormField {
    let mut field = FormField::default();

    let key_children = related_ids(key_block, "CHILD");
    if has_relationship(key_block, "CHILD") {
        field.key = Some(content_text(&key_children, block_map));
    }

    for value_id in related_ids(key_block, "VALUE") {
        let Some(value_block) = resolve(value_id, block_map) else {
            continue;
        };
        if !has_entity_type(value_block, "VALUE") {
            continue;
        }
        if has_relationship(value_block, "CHILD") {
            let children = related_ids(value_block, "CHILD");
            field.value = Some(content_text(&children, block_map));
        }
    }

    field
}

fn build_table(table_block: &Value, block_map: &BlockMap) -> Table {
    let mut rows: BTreeMap<u64, Vec<(u64, String)>> = BTreeMap::new();

    for cell_id in related_ids(table_block, "CHILD") {
        let Some(cell) = resolve(cell_id, block_map) else {
            continue;
        };
        if block_type(cell) != "CELL" {
            continue;
        }
        let row = cell.get("RowIndex").and_then(|v| v.as_u64()).unwrap_or(0);
        let column = cell.get("ColumnIndex").and_then(|v| v.as_u64()).unwrap_or(0);
        let children = related_ids(cell, "CHILD");
        let parts = content_parts(&children, block_map);
        rows.entry(row).or_default().push((column, parts.join(" ")));
    }

    Table {
        rows: rows
            .into_values()
            .map(|mut cells| {
                cells.sort_by_key(|(column, _)| *column);
                TableRow {
                    cells: cells.into_iter().map(|(_, text)| text).collect(),
                }
            })
            .collect(),
    }
}

/// Word text joined by spaces; a lone selection element yields its status.
fn content_text(ids: &[&str], block_map: &BlockMap) -> String {
    let mut words = Vec::new();
    let mut selection = None;
    for id in ids {
        let Some(child) = resolve(id, block_map) else {
            continue;
        };
        match block_type(child) {
            "WORD" => words.push(block_text(child)),
            "SELECTION_ELEMENT" => selection = selection_status(child),
            _ => {}
        }
    }
    if words.is_empty() {
        selection.unwrap_or_default().to_string()
    } else {
        words.join(" ")
    }
}

fn content_parts<'a>(ids: &[&str], block_map: &BlockMap<'a>) -> Vec<&'a str> {
    ids.iter()
        .filter_map(|id| resolve(id, block_map))
        .filter_map(|child| match block_type(child) {
            "WORD" => Some(block_text(child)),
            "SELECTION_ELEMENT" => selection_status(child),
            _ => None,
        })
        .collect()
}

fn resolve<'a>(id: &str, block_map: &BlockMap<'a>) -> Option<&'a Value> {
    let found = block_map.get(id).copied();
    if found.is_none() {
        tracing::warn!(target: "analysis", id, "relationship points at a missing block");
    }
    found
}

fn block_type(block: &Value) -> &str {
    block.get("BlockType").and_then(|t| t.as_str()).unwrap_or("")
}

fn block_text(block: &Value) -> &str {
    block.get("Text").and_then(|t| t.as_str()).unwrap_or("")
}

fn selection_status(block: &Value) -> Option<&str> {
    block.get("SelectionStatus").and_then(|s| s.as_str())
}

fn has_entity_type(block: &Value, entity: &str) -> bool {
    block
        .get("EntityTypes")
        .and_then(|e| e.as_array())
        .map(|types| types.iter().any(|t| t.as_str() == Some(entity)))
        .unwrap_or(false)
}

fn relationships<'a>(block: &'a Value, kind: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
    block
        .get("Relationships")
        .and_then(|r| r.as_array())
        .into_iter()
        .flatten()
        .filter(move |rel| rel.get("Type").and_then(|t| t.as_str()) == Some(kind))
}

fn has_relationship(block: &Value, kind: &str) -> bool {
    relationships(block, kind).next().is_some()
}

fn related_ids<'a>(block: &'a Value, kind: &'a str) -> Vec<&'a str> {
    relationships(block, kind)
        .filter_map(|rel| rel.get("Ids").and_then(|ids| ids.as_array()))
        .flatten()
        .filter_map(|id| id.as_str())
        .collect()
}

fn bounding_box(block: &Value) -> Option<BoundingBox> {
    let raw = block.get("Geometry")?.get("BoundingBox")?;
    serde_json::from_value(raw.clone()).ok()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn word(id: &str, text: &str) -> Value {
        json!({ "BlockType": "WORD", "Id": id, "Text": text })
    }

    fn line(id: &str, text: &str, left: f64, words: &[&str]) -> Value {
        json!({
            "BlockType": "LINE",
            "Id": id,
            "Text": text,
            "Geometry": { "BoundingBox": { "Width": 0.3, "Height": 0.02, "Left": left, "Top": 0.1 } },
            "Relationships": [{ "Type": "CHILD", "Ids": words }]
        })
    }

    #[test]
    fn empty_inputs_give_zero_pages() {
        for input in [Value::Null, json!({}), json!([])] {
            let doc = parse_document(&input).unwrap();
            assert!(doc.is_empty());
        }
    }

    #[test]
    fn non_empty_input_without_blocks_is_malformed() {
        let err = parse_document(&json!({ "DocumentMetadata": { "Pages": 1 } })).unwrap_err();
        assert!(matches!(err, ExportError::MalformedResult { .. }));

        let err = parse_document(&json!("not a result")).unwrap_err();
        assert!(matches!(err, ExportError::MalformedResult { .. }));

        let err = parse_document(&json!({ "Blocks": 7 })).unwrap_err();
        assert!(matches!(err, ExportError::MalformedResult { .. }));
    }

    #[test]
    fn blocks_without_page_give_zero_pages() {
        let doc = parse_document(&json!({ "Blocks": [word("w1", "stray")] })).unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.block_count, 1);
    }

    #[test]
    fn splits_blocks_into_pages() {
        let input = json!({
            "Blocks": [
                { "BlockType": "PAGE", "Id": "p1" },
                line("l1", "first page", 0.1, &["w1", "w2"]),
                word("w1", "first"),
                word("w2", "page"),
                { "BlockType": "PAGE", "Id": "p2" },
                line("l2", "second page", 0.1, &[]),
            ]
        });
        let doc = parse_document(&input).unwrap();
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].number, 1);
        assert_eq!(doc.pages[0].blocks.len(), 4);
        assert_eq!(doc.pages[0].text_in_reading_order(), "first page\n");
        assert_eq!(doc.pages[1].number, 2);
        assert_eq!(doc.pages[1].blocks[0]["Id"], "p2");
    }

    #[test]
    fn paginated_responses_are_concatenated() {
        let input = json!([
            { "Blocks": [{ "BlockType": "PAGE", "Id": "p1" }, line("l1", "one", 0.1, &[])] },
            { "Blocks": [{ "BlockType": "PAGE", "Id": "p2" }, line("l2", "two", 0.1, &[])] }
        ]);
        let doc = parse_document(&input).unwrap();
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[1].text_in_reading_order(), "two\n");
    }

    #[test]
    fn resolves_key_value_pairs() {
        let input = json!({
            "Blocks": [
                { "BlockType": "PAGE", "Id": "p1" },
                {
                    "BlockType": "KEY_VALUE_SET", "Id": "k1", "EntityTypes": ["KEY"],
                    "Relationships": [
                        { "Type": "VALUE", "Ids": ["v1"] },
                        { "Type": "CHILD", "Ids": ["w1", "w2"] }
                    ]
                },
                {
                    "BlockType": "KEY_VALUE_SET", "Id": "v1", "EntityTypes": ["VALUE"],
                    "Relationships": [{ "Type": "CHILD", "Ids": ["w3"] }]
                },
                {
                    "BlockType": "KEY_VALUE_SET", "Id": "k2", "EntityTypes": ["KEY"],
                    "Relationships": [
                        { "Type": "VALUE", "Ids": ["v2"] },
                        { "Type": "CHILD", "Ids": ["w4"] }
                    ]
                },
                {
                    "BlockType": "KEY_VALUE_SET", "Id": "v2", "EntityTypes": ["VALUE"],
                    "Relationships": [{ "Type": "CHILD", "Ids": ["s1"] }]
                },
                word("w1", "Policy"),
                word("w2", "Number"),
                word("w3", "P-77"),
                word("w4", "Insured"),
                { "BlockType": "SELECTION_ELEMENT", "Id": "s1", "SelectionStatus": "SELECTED" }
            ]
        });
        let doc = parse_document(&input).unwrap();
        let fields = &doc.pages[0].form_fields;
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].key.as_deref(), Some("Policy Number"));
        assert_eq!(fields[0].value.as_deref(), Some("P-77"));
        assert_eq!(fields[1].key.as_deref(), Some("Insured"));
        assert_eq!(fields[1].value.as_deref(), Some("SELECTED"));
    }

    #[test]
    fn value_without_children_is_absent() {
        let input = json!({
            "Blocks": [
                { "BlockType": "PAGE", "Id": "p1" },
                {
                    "BlockType": "KEY_VALUE_SET", "Id": "k1", "EntityTypes": ["KEY"],
                    "Relationships": [
                        { "Type": "VALUE", "Ids": ["v1"] },
                        { "Type": "CHILD", "Ids": ["w1"] }
                    ]
                },
                { "BlockType": "KEY_VALUE_SET", "Id": "v1", "EntityTypes": ["VALUE"] },
                word("w1", "Name")
            ]
        });
        let doc = parse_document(&input).unwrap();
        let field = &doc.pages[0].form_fields[0];
        assert_eq!(field.key.as_deref(), Some("Name"));
        assert_eq!(field.value, None);
    }

    #[test]
    fn table_cells_are_ordered_by_row_then_column() {
        let input = json!({
            "Blocks": [
                { "BlockType": "PAGE", "Id": "p1" },
                {
                    "BlockType": "TABLE", "Id": "t1",
                    "Relationships": [{ "Type": "CHILD", "Ids": ["c22", "c11", "c12", "c21", "gone"] }]
                },
                { "BlockType": "CELL", "Id": "c11", "RowIndex": 1, "ColumnIndex": 1,
                  "Relationships": [{ "Type": "CHILD", "Ids": ["w1"] }] },
                { "BlockType": "CELL", "Id": "c12", "RowIndex": 1, "ColumnIndex": 2,
                  "Relationships": [{ "Type": "CHILD", "Ids": ["w2", "w3"] }] },
                { "BlockType": "CELL", "Id": "c21", "RowIndex": 2, "ColumnIndex": 1 },
                { "BlockType": "CELL", "Id": "c22", "RowIndex": 2, "ColumnIndex": 2,
                  "Relationships": [{ "Type": "CHILD", "Ids": ["w4"] }] },
                word("w1", "Item"),
                word("w2", "Unit"),
                word("w3", "Cost"),
                word("w4", "12.50")
            ]
        });
        let doc = parse_document(&input).unwrap();
        let table = &doc.pages[0].tables[0];
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells, vec!["Item", "Unit Cost"]);
        assert_eq!(table.rows[1].cells, vec!["", "12.50"]);
    }
}
