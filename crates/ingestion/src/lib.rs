//! Trade CSV ingestion for the trade calendar system.
//!
//! This crate handles:
//! - Byte decoding with encoding inference (UTF-8 / Shift_JIS)
//! - Quote-aware CSV tokenizing
//! - Broker schema detection and record normalization
//! - Loading trade records from files or in-memory content

pub mod decoder;
pub mod tokenizer;
pub mod parsers;
pub mod schema;
pub mod loader;

pub use decoder::{decode_csv_bytes, detect_and_decode, DecodedText, SourceEncoding};
pub use tokenizer::tokenize;
pub use schema::{detect_schema, FieldIndexMap, Schema};
pub use loader::{
    create_csv_loader_from_content, create_default_trade_csv_loader, create_file_csv_loader,
    records_from_bytes, records_from_text, FileCsvLoader, InlineCsvLoader, TradeCsvLoader,
};
