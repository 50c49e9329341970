//! Output encoding
//!
//! Encodes the computed table into the two downstream artifacts:
//! - the flat CSV table the dashboard consumes
//! - a JSON payload wrapping the same rows in producer/provenance metadata

use chrono::Utc;
use uuid::Uuid;

use crate::error::IndexError;
use crate::types::{IndexPayload, IndexProducer, IndexProvenance, IndexTable};
use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Fixed column order of the tabular artifact.
pub const CSV_HEADER: [&str; 9] = [
    "month",
    "Market",
    "Credit",
    "Capex_Supply",
    "Infra",
    "Adoption",
    "Sentiment",
    "AIBPS",
    "AIBPS_RA",
];

/// Encoder for the output table, carrying a per-run instance id.
pub struct TableEncoder {
    instance_id: String,
}

impl Default for TableEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableEncoder {
    /// Create an encoder with a unique instance id.
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance id.
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode the table as CSV. Missing cells are empty fields; present
    /// values use a fixed six-decimal format so reruns are byte-identical.
    pub fn encode_csv(&self, table: &IndexTable) -> Result<String, IndexError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADER)?;

        for row in table.rows() {
            let cells = [
                row.market,
                row.credit,
                row.capex_supply,
                row.infra,
                row.adoption,
                row.sentiment,
                row.aibps,
                row.aibps_ra,
            ];
            let mut record = Vec::with_capacity(CSV_HEADER.len());
            record.push(row.month.format("%Y-%m-%d").to_string());
            record.extend(cells.iter().map(|cell| format_cell(*cell)));
            writer.write_record(&record)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| IndexError::Encode(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| IndexError::Encode(e.to_string()))
    }

    /// Wrap the table rows in the JSON payload envelope.
    pub fn encode_payload(&self, table: &IndexTable) -> IndexPayload {
        let timeline = table.timeline();
        let provenance = IndexProvenance {
            start_month: (!timeline.is_empty()).then(|| timeline.month(0)),
            last_month: (!timeline.is_empty()).then(|| timeline.month(timeline.len() - 1)),
            months: timeline.len(),
            computed_at_utc: Utc::now().to_rfc3339(),
        };

        IndexPayload {
            aibps_version: ENGINE_VERSION.to_string(),
            producer: IndexProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            provenance,
            rows: table.rows().collect(),
        }
    }

    /// Encode the payload to pretty JSON.
    pub fn encode_json(&self, table: &IndexTable) -> Result<String, IndexError> {
        Ok(serde_json::to_string_pretty(&self.encode_payload(table))?)
    }
}

fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.6}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompositeSeries, MonthlySeries, Pillar, Timeline};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn make_table() -> IndexTable {
        let timeline = Timeline::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 2);
        let pillars = Pillar::ALL
            .into_iter()
            .map(|pillar| {
                let values = if pillar == Pillar::Market {
                    vec![Some(61.25), None]
                } else {
                    vec![None, None]
                };
                (pillar, MonthlySeries::from_values(timeline, values))
            })
            .collect();
        let composite = CompositeSeries {
            aibps: MonthlySeries::from_values(timeline, vec![Some(61.25), None]),
            aibps_ra: MonthlySeries::missing(timeline),
        };
        IndexTable::new(timeline, pillars, composite)
    }

    #[test]
    fn test_csv_header_and_missing_cells() {
        let encoder = TableEncoder::with_instance_id("test".to_string());
        let csv = encoder.encode_csv(&make_table()).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "month,Market,Credit,Capex_Supply,Infra,Adoption,Sentiment,AIBPS,AIBPS_RA"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2024-01-01,61.250000,,,,,,61.250000,"
        );
        assert_eq!(lines.next().unwrap(), "2024-02-01,,,,,,,,");
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_payload_metadata_and_rows() {
        let encoder = TableEncoder::with_instance_id("run-1".to_string());
        let payload = encoder.encode_payload(&make_table());

        assert_eq!(payload.producer.name, PRODUCER_NAME);
        assert_eq!(payload.producer.instance_id, "run-1");
        assert_eq!(
            payload.provenance.start_month,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(
            payload.provenance.last_month,
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
        assert_eq!(payload.provenance.months, 2);
        assert_eq!(payload.rows.len(), 2);
        assert_eq!(payload.rows[0].market, Some(61.25));
        assert_eq!(payload.rows[1].aibps, None);
    }

    #[test]
    fn test_payload_json_uses_output_column_names() {
        let encoder = TableEncoder::with_instance_id("run-1".to_string());
        let json = encoder.encode_json(&make_table()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let row = &value["rows"][0];
        assert_eq!(row["Market"], 61.25);
        assert!(row.get("Capex_Supply").is_some());
        assert!(row.get("AIBPS_RA").is_some());
    }

    #[test]
    fn test_empty_table_encodes_header_only() {
        let timeline = Timeline::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 0);
        let pillars = Pillar::ALL
            .into_iter()
            .map(|p| (p, MonthlySeries::missing(timeline)))
            .collect();
        let composite = CompositeSeries {
            aibps: MonthlySeries::missing(timeline),
            aibps_ra: MonthlySeries::missing(timeline),
        };
        let table = IndexTable::new(timeline, pillars, composite);

        let encoder = TableEncoder::with_instance_id("test".to_string());
        let csv = encoder.encode_csv(&table).unwrap();
        assert_eq!(csv.lines().count(), 1);

        let payload = encoder.encode_payload(&table);
        assert_eq!(payload.provenance.start_month, None);
        assert_eq!(payload.provenance.months, 0);
    }
}
