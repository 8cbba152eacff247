//! Table output formatting

use tabled::{
    Table, Tabled,
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

use crate::client::models::display_value;
use crate::grid::GridView;

/// Placeholder shown in the id column of unsaved rows
const NEW_ROW: &str = "(new)";

/// Format data as a table
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    if data.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new(data);
    style(&mut table);
    table.to_string()
}

/// Format a grid with columns taken from its inferred schema.
///
/// The identifier column comes first; rows in edit mode are marked with `*`.
pub fn format_grid(view: &GridView, id_field: &str) -> String {
    if view.items.is_empty() {
        return "No results found.".to_string();
    }

    let mut builder = Builder::default();

    let mut header = vec![String::new(), id_field.to_uppercase()];
    header.extend(view.schema.fields().iter().map(|f| f.to_uppercase()));
    builder.push_record(header);

    for item in &view.items {
        let marker = if item.active { "*" } else { "" };
        let id = item
            .id(id_field)
            .map(|id| id.to_string())
            .unwrap_or_else(|| NEW_ROW.to_string());

        let mut row = vec![marker.to_string(), id];
        row.extend(
            view.schema
                .fields()
                .iter()
                .map(|f| item.record.get(f).map(display_value).unwrap_or_default()),
        );
        builder.push_record(row);
    }

    let mut table = builder.build();
    style(&mut table);
    table.to_string()
}

fn style(table: &mut Table) {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::Record;
    use crate::grid::{GridItem, ItemKey, Schema};
    use serde_json::json;

    #[derive(Debug, Tabled)]
    struct TestRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "NAME")]
        name: String,
    }

    fn item(key: u64, value: serde_json::Value, active: bool) -> GridItem {
        let record: Record = value.as_object().cloned().unwrap();
        let mut item = GridItem::from_record(ItemKey(key), record);
        item.active = active;
        item
    }

    #[test]
    fn test_format_table_empty() {
        let items: Vec<TestRow> = vec![];
        let result = format_table(&items);
        assert_eq!(result, "No results found.");
    }

    #[test]
    fn test_format_table_uses_rounded_style() {
        let items = vec![TestRow {
            id: "1".to_string(),
            name: "Test".to_string(),
        }];

        let result = format_table(&items);

        assert!(result.contains("NAME"));
        assert!(result.contains("╭"));
        assert!(result.contains("╰"));
    }

    #[test]
    fn test_format_grid_uses_schema_columns() {
        let view = GridView {
            items: vec![
                item(1, json!({"id": 7, "abbreviation": "CERT-EU", "secret": "x"}), false),
                item(2, json!({"abbreviation": "NEW"}), true),
            ],
            schema: Schema::new(vec!["abbreviation".to_string()]),
        };

        let result = format_grid(&view, "id");

        assert!(result.contains("ID"));
        assert!(result.contains("ABBREVIATION"));
        assert!(result.contains("CERT-EU"));
        assert!(result.contains("(new)"));
        assert!(result.contains("*"));
        assert!(!result.contains("secret"));
        assert!(!result.contains("SECRET"));
    }

    #[test]
    fn test_format_grid_empty() {
        assert_eq!(format_grid(&GridView::default(), "id"), "No results found.");
    }
}
