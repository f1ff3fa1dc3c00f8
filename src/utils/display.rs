// file: src/utils/display.rs
// description: console tables for events, similarity matches and generated datasets
// reference: https://docs.rs/comfy-table

use crate::models::{SimilarityMatch, TabularEvent, VectorRecord};
use crate::utils::validation::Validator;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};

const PREVIEW_TEXT_CHARS: usize = 48;

fn base_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::White))
            .collect::<Vec<_>>(),
    );
    table
}

pub fn events_table(events: &[TabularEvent]) -> Table {
    let mut table = base_table(&["event_id", "event_time", "customer_id", "event_type", "amount"]);
    for event in events {
        table.add_row(vec![
            Cell::new(event.event_id).fg(Color::Cyan),
            Cell::new(event.event_time.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(event.customer_id),
            Cell::new(&event.event_type),
            Cell::new(event.amount),
        ]);
    }
    table
}

pub fn matches_table(matches: &[SimilarityMatch]) -> Table {
    let mut table = base_table(&["rank", "item_id", "category", "distance"]);
    for (rank, m) in matches.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(m.item_id).fg(Color::Cyan),
            Cell::new(&m.category),
            Cell::new(format!("{:.4}", m.score)).fg(Color::DarkGrey),
        ]);
    }
    table
}

/// Generated dataset preview: one row per record with its vector width.
pub fn vector_preview_table(records: &[VectorRecord]) -> Table {
    let mut table = base_table(&["item_id", "category", "text", "vector_dim"]);
    for record in records {
        let text = record
            .text
            .as_deref()
            .map(|t| Validator::truncate_text(t, PREVIEW_TEXT_CHARS))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(record.item_id).fg(Color::Cyan),
            Cell::new(&record.category),
            Cell::new(text).fg(Color::DarkGrey),
            Cell::new(record.dimension()),
        ]);
    }
    table
}

pub fn key_value_table(rows: &[(String, String)]) -> Table {
    let mut table = base_table(&["name", "value"]);
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name).fg(Color::Cyan), Cell::new(value)]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Amount;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_events_table_renders_rows() {
        let events = vec![TabularEvent {
            event_id: 2,
            event_time: Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap(),
            customer_id: 20,
            event_type: "purchase".to_string(),
            amount: Amount::from_cents(4950),
        }];

        let rendered = events_table(&events).to_string();
        assert!(rendered.contains("event_type"));
        assert!(rendered.contains("2024-01-01 11:00:00"));
        assert!(rendered.contains("49.50"));
    }

    #[test]
    fn test_matches_table_ranks_from_one() {
        let matches = vec![SimilarityMatch {
            item_id: 3,
            category: "home".to_string(),
            score: 0.125,
        }];

        let rendered = matches_table(&matches).to_string();
        assert!(rendered.contains("0.1250"));
        assert!(rendered.contains("home"));
    }

    #[test]
    fn test_vector_preview_reports_dimension() {
        let records = vec![VectorRecord {
            item_id: 1,
            category: "books".to_string(),
            text: Some("A paperback mystery novel".to_string()),
            model: None,
            vector: vec![0.0; 7],
        }];

        let rendered = vector_preview_table(&records).to_string();
        assert!(rendered.contains("vector_dim"));
        assert!(rendered.contains("7"));
        assert!(rendered.contains("paperback"));
    }
}
