//! Broker CSV schemas and record normalization.
//!
//! Each supported export format is a [`Schema`] variant. A schema matches a
//! header when every one of its required columns is present; the first
//! matching variant in [`Schema::ALL`] wins.

use crate::parsers::{
    normalize_time_string, parse_currency, parse_date_time, parse_decimal, parse_integer,
    to_iso_date,
};
use serde::Serialize;
use std::collections::HashMap;
use tradecal_core::TradeRecord;

const BOM: char = '\u{feff}';

/// Header name to column position for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldIndexMap {
    indices: HashMap<String, usize>,
}

impl FieldIndexMap {
    /// Build from a header row. Names are trimmed, a BOM on the first cell is
    /// dropped, and a repeated name maps to its last column.
    pub fn from_header(header: &[String]) -> Self {
        let indices = header
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let name = if i == 0 {
                    name.trim_start_matches(BOM)
                } else {
                    name.as_str()
                };
                (name.trim().to_string(), i)
            })
            .collect();
        Self { indices }
    }

    /// Column position of a header name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    /// Cell for a named column in `row`, or `""` when the column or cell is
    /// missing.
    pub fn cell<'a>(&self, row: &'a [String], name: &str) -> &'a str {
        self.index_of(name)
            .and_then(|i| row.get(i))
            .map_or("", String::as_str)
    }

    /// Trimmed cell for a named column.
    fn text(&self, row: &[String], name: &str) -> String {
        self.cell(row, name).trim().to_string()
    }
}

mod kabucom {
    pub const DATE: &str = "成立日";
    pub const TIME: &str = "成立時間";
    pub const SYMBOL: &str = "銘柄";
    pub const CONTRACT_MONTH: &str = "限月";
    pub const SIDE: &str = "売買";
    pub const ACTION: &str = "取引";
    pub const QUANTITY: &str = "取引数量（枚）";
    pub const PRICE: &str = "成立値段";
    pub const FEE: &str = "手数料";
    pub const GROSS_PROFIT: &str = "売買損益";
    pub const NET_PROFIT: &str = "確定損益";

    pub const REQUIRED: &[&str] = &[DATE, SIDE, QUANTITY, NET_PROFIT];
}

mod sbi_otc_cfd {
    pub const DATE_TIME: &str = "約定日時";
    pub const SYMBOL: &str = "銘柄";
    pub const SIDE: &str = "売/買";
    pub const ACTION: &str = "取引区分";
    pub const QUANTITY: &str = "数量";
    pub const PRICE: &str = "約定価格";
    pub const POSITION_PROFIT: &str = "建玉損益(円)";
    pub const INTEREST: &str = "金利調整額合計(円)";
    pub const PRICE_ADJUSTMENT: &str = "価格調整額合計(円)";
    pub const FUNDING: &str = "ファンディングレート合計(円)";
    pub const SETTLEMENT: &str = "受渡金額(円)";

    pub const REQUIRED: &[&str] = &[DATE_TIME, SIDE, QUANTITY, POSITION_PROFIT];
}

/// Supported broker export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Schema {
    /// kabu.com futures/options execution history.
    Kabucom,
    /// SBI Securities OTC CFD execution history.
    SbiOtcCfd,
}

impl Schema {
    /// All schemas in detection order.
    pub const ALL: [Schema; 2] = [Schema::Kabucom, Schema::SbiOtcCfd];

    /// Stable identifier.
    pub fn id(self) -> &'static str {
        match self {
            Schema::Kabucom => "kabucom",
            Schema::SbiOtcCfd => "sbiOtcCfd",
        }
    }

    /// Header names that must all be present for this schema to match.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Schema::Kabucom => kabucom::REQUIRED,
            Schema::SbiOtcCfd => sbi_otc_cfd::REQUIRED,
        }
    }

    /// Whether the header contains every required field.
    pub fn matches(self, fields: &FieldIndexMap) -> bool {
        self.required_fields().iter().all(|f| fields.contains(f))
    }

    /// Normalize one data row. `None` discards the row (unparseable date).
    pub fn normalize(self, row: &[String], fields: &FieldIndexMap) -> Option<TradeRecord> {
        match self {
            Schema::Kabucom => normalize_kabucom(row, fields),
            Schema::SbiOtcCfd => normalize_sbi_otc_cfd(row, fields),
        }
    }
}

/// First registered schema whose required fields are all in the header.
pub fn detect_schema(fields: &FieldIndexMap) -> Option<Schema> {
    Schema::ALL.into_iter().find(|schema| schema.matches(fields))
}

fn normalize_kabucom(row: &[String], fields: &FieldIndexMap) -> Option<TradeRecord> {
    use kabucom::*;

    let iso_date = to_iso_date(fields.cell(row, DATE))?;
    let iso_time = normalize_time_string(fields.cell(row, TIME));
    let iso_date_time = format!("{}T{}:00", iso_date, iso_time);

    Some(TradeRecord {
        iso_date,
        iso_time,
        iso_date_time,
        symbol: fields.text(row, SYMBOL),
        contract_month: fields.text(row, CONTRACT_MONTH),
        side: fields.text(row, SIDE),
        action: fields.text(row, ACTION),
        quantity: parse_integer(fields.cell(row, QUANTITY)) as f64,
        price: parse_decimal(fields.cell(row, PRICE)),
        fee: parse_currency(fields.cell(row, FEE)),
        gross_profit: parse_currency(fields.cell(row, GROSS_PROFIT)),
        net_profit: parse_currency(fields.cell(row, NET_PROFIT)),
    })
}

/// Net profit for a CFD line.
///
/// A settlement amount of exactly zero counts as absent, so the component
/// sum is used instead.
fn sbi_net_profit(settlement: f64, gross: f64, interest: f64, price_adj: f64, funding: f64) -> f64 {
    let from_components = gross + interest + price_adj + funding;
    if settlement != 0.0 {
        settlement
    } else if from_components != 0.0 {
        from_components
    } else {
        0.0
    }
}

fn normalize_sbi_otc_cfd(row: &[String], fields: &FieldIndexMap) -> Option<TradeRecord> {
    use sbi_otc_cfd::*;

    let date_time = parse_date_time(fields.cell(row, DATE_TIME))?;
    let currency = |name: &str| parse_currency(fields.cell(row, name));

    let gross_profit = currency(POSITION_PROFIT);
    let net_profit = sbi_net_profit(
        currency(SETTLEMENT),
        gross_profit,
        currency(INTEREST),
        currency(PRICE_ADJUSTMENT),
        currency(FUNDING),
    );

    Some(TradeRecord {
        iso_date: date_time.iso_date,
        iso_time: date_time.iso_time,
        iso_date_time: date_time.iso_date_time,
        symbol: fields.text(row, SYMBOL),
        contract_month: String::new(),
        side: fields.text(row, SIDE),
        action: fields.text(row, ACTION),
        quantity: parse_decimal(fields.cell(row, QUANTITY)),
        price: parse_decimal(fields.cell(row, PRICE)),
        fee: 0.0,
        gross_profit,
        net_profit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn strings(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    fn kabucom_header() -> Vec<String> {
        strings(&[
            "\u{feff}成立日",
            "成立時間",
            "銘柄",
            "限月",
            "売買",
            "取引",
            "取引数量（枚）",
            "成立値段",
            "手数料",
            "売買損益",
            "確定損益",
        ])
    }

    fn sbi_header() -> Vec<String> {
        strings(&[
            "約定日時",
            "銘柄",
            "売/買",
            "取引区分",
            "数量",
            "約定価格",
            "建玉損益(円)",
            "金利調整額合計(円)",
            "価格調整額合計(円)",
            "ファンディングレート合計(円)",
            "受渡金額(円)",
        ])
    }

    #[test]
    fn test_field_index_map_strips_bom_and_trims() {
        let fields = FieldIndexMap::from_header(&strings(&["\u{feff} 成立日 ", " 売買"]));
        assert_eq!(fields.index_of("成立日"), Some(0));
        assert_eq!(fields.index_of("売買"), Some(1));
        assert_eq!(fields.index_of("\u{feff}成立日"), None);
    }

    #[test]
    fn test_field_index_map_last_duplicate_wins() {
        let fields = FieldIndexMap::from_header(&strings(&["銘柄", "数量", "銘柄"]));
        assert_eq!(fields.index_of("銘柄"), Some(2));
    }

    #[test]
    fn test_cell_missing_column_or_short_row() {
        let fields = FieldIndexMap::from_header(&strings(&["a", "b", "c"]));
        let row = strings(&["1"]);
        assert_eq!(fields.cell(&row, "a"), "1");
        assert_eq!(fields.cell(&row, "c"), "");
        assert_eq!(fields.cell(&row, "zzz"), "");
    }

    #[test]
    fn test_schema_serializes_as_id() {
        for schema in Schema::ALL {
            assert_eq!(serde_json::to_value(schema).unwrap(), schema.id());
        }
    }

    #[test]
    fn test_detect_schema() {
        let kabucom = FieldIndexMap::from_header(&kabucom_header());
        assert_eq!(detect_schema(&kabucom), Some(Schema::Kabucom));

        let sbi = FieldIndexMap::from_header(&sbi_header());
        assert_eq!(detect_schema(&sbi), Some(Schema::SbiOtcCfd));

        let minimal =
            FieldIndexMap::from_header(&strings(&["確定損益", "取引数量（枚）", "売買", "成立日"]));
        assert_eq!(detect_schema(&minimal), Some(Schema::Kabucom));
    }

    #[test]
    fn test_detect_schema_no_match() {
        let partial = FieldIndexMap::from_header(&strings(&["成立日", "売買", "取引数量（枚）"]));
        assert_eq!(detect_schema(&partial), None);

        let foreign = FieldIndexMap::from_header(&strings(&["date", "side", "qty", "pnl"]));
        assert_eq!(detect_schema(&foreign), None);
    }

    #[test]
    fn test_detect_schema_prefers_registration_order() {
        let mut header = kabucom_header();
        header.extend(sbi_header());
        let both = FieldIndexMap::from_header(&header);
        assert_eq!(detect_schema(&both), Some(Schema::Kabucom));
    }

    #[test]
    fn test_normalize_kabucom() {
        let fields = FieldIndexMap::from_header(&kabucom_header());
        let row = strings(&[
            "2024/1/10",
            "9:05",
            " 日経225mini ",
            "2024/03",
            "買",
            "新規",
            "1,000",
            "33,250.5",
            "77円",
            "-",
            "−1,234円",
        ]);

        let record = Schema::Kabucom.normalize(&row, &fields).unwrap();
        assert_eq!(record.iso_date, "2024-01-10");
        assert_eq!(record.iso_time, "09:05");
        assert_eq!(record.iso_date_time, "2024-01-10T09:05:00");
        assert_eq!(record.symbol, "日経225mini");
        assert_eq!(record.contract_month, "2024/03");
        assert_eq!(record.side, "買");
        assert_eq!(record.action, "新規");
        assert_relative_eq!(record.quantity, 1000.0);
        assert_relative_eq!(record.price, 33250.5);
        assert_relative_eq!(record.fee, 77.0);
        assert_eq!(record.gross_profit, 0.0);
        assert_relative_eq!(record.net_profit, -1234.0);
    }

    #[test]
    fn test_normalize_kabucom_bad_date_discards() {
        let fields = FieldIndexMap::from_header(&kabucom_header());
        let row = strings(&["2024/1", "9:05", "x", "", "買", "", "1", "1", "", "", "100"]);
        assert!(Schema::Kabucom.normalize(&row, &fields).is_none());
    }

    #[test]
    fn test_normalize_sbi_settlement_amount() {
        let fields = FieldIndexMap::from_header(&sbi_header());
        let row = strings(&[
            "2024/2/1 21:30:15",
            "米国NQ100",
            "売",
            "決済",
            "0.5",
            "17,800.25",
            "3,000",
            "-10",
            "5",
            "-2",
            "2,950",
        ]);

        let record = Schema::SbiOtcCfd.normalize(&row, &fields).unwrap();
        assert_eq!(record.iso_date, "2024-02-01");
        assert_eq!(record.iso_time, "21:30");
        assert_eq!(record.iso_date_time, "2024-02-01T21:30:15");
        assert_eq!(record.contract_month, "");
        assert_eq!(record.action, "決済");
        assert_relative_eq!(record.quantity, 0.5);
        assert_relative_eq!(record.price, 17800.25);
        assert_eq!(record.fee, 0.0);
        assert_relative_eq!(record.gross_profit, 3000.0);
        assert_relative_eq!(record.net_profit, 2950.0);
    }

    #[test]
    fn test_normalize_sbi_zero_settlement_falls_through_to_components() {
        // A settlement of exactly zero is treated as missing, not as a
        // confirmed zero result.
        let fields = FieldIndexMap::from_header(&sbi_header());
        let row = strings(&[
            "2024/2/1 10:00",
            "米国NQ100",
            "買",
            "決済",
            "1",
            "100",
            "3,000",
            "-10",
            "5",
            "-2",
            "0",
        ]);

        let record = Schema::SbiOtcCfd.normalize(&row, &fields).unwrap();
        assert_relative_eq!(record.net_profit, 2993.0);
    }

    #[test]
    fn test_sbi_net_profit_chain() {
        assert_eq!(sbi_net_profit(120.0, 1.0, 2.0, 3.0, 4.0), 120.0);
        assert_eq!(sbi_net_profit(0.0, 100.0, -5.0, 0.0, 0.0), 95.0);
        assert_eq!(sbi_net_profit(0.0, 10.0, -10.0, 0.0, 0.0), 0.0);
        assert_eq!(sbi_net_profit(0.0, 0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_normalize_sbi_date_only() {
        let fields = FieldIndexMap::from_header(&sbi_header());
        let row = strings(&["2024/2/1", "米国NQ100", "買", "新規", "1", "100", "", "", "", "", ""]);
        let record = Schema::SbiOtcCfd.normalize(&row, &fields).unwrap();
        assert_eq!(record.iso_time, "00:00");
        assert_eq!(record.iso_date_time, "2024-02-01T00:00:00");
        assert_eq!(record.net_profit, 0.0);
    }

    #[test]
    fn test_normalize_sbi_blank_date_discards() {
        let fields = FieldIndexMap::from_header(&sbi_header());
        let row = strings(&["", "米国NQ100", "買", "新規", "1", "100", "", "", "", "", ""]);
        assert!(Schema::SbiOtcCfd.normalize(&row, &fields).is_none());
    }

    #[test]
    fn test_schema_ids() {
        assert_eq!(Schema::Kabucom.id(), "kabucom");
        assert_eq!(Schema::SbiOtcCfd.id(), "sbiOtcCfd");
    }
}
