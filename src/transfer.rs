//! Export, import and share links.
//!
//! Exported files and share tokens carry the same payload: a JSON array of
//! item records. A share token is that array base64-encoded and placed in
//! the `#data=` fragment of a link.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::Item;

/// Fragment prefix marking a share token in a link.
pub const SHARE_FRAGMENT: &str = "#data=";

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("Failed to read {0}: {1}")]
    ReadError(PathBuf, std::io::Error),
    #[error("Failed to write {0}: {1}")]
    WriteError(PathBuf, std::io::Error),
    #[error("Not valid JSON: {0}")]
    InvalidJson(serde_json::Error),
    #[error("Expected a JSON array of items")]
    NotAnArray,
    #[error("Invalid item record: {0}")]
    InvalidItem(serde_json::Error),
    #[error("Item {0} has an empty name")]
    EmptyName(String),
    #[error("Duplicate item id: {0}")]
    DuplicateId(String),
    #[error("Share token is not valid base64")]
    InvalidToken,
    #[error("Address has no share token")]
    NoShareToken,
}

/// Date an export made at `now` is named after. Always the UTC date, so the
/// same moment gives the same file name in every time zone.
pub fn export_date<Tz: TimeZone>(now: DateTime<Tz>) -> NaiveDate {
    now.with_timezone(&Utc).date_naive()
}

/// File name used for an export made on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("shopping-list-{}.json", date.format("%Y-%m-%d"))
}

/// Pretty-printed JSON array, the export file contents.
pub fn export_json(items: &[Item]) -> Result<String, TransferError> {
    serde_json::to_string_pretty(items).map_err(TransferError::InvalidJson)
}

/// Writes an export file into `dir` and returns its path.
pub fn write_export(dir: &Path, items: &[Item], date: NaiveDate) -> Result<PathBuf, TransferError> {
    let path = dir.join(export_file_name(date));
    let json = export_json(items)?;
    fs::write(&path, json).map_err(|e| TransferError::WriteError(path.clone(), e))?;
    Ok(path)
}

/// Parses and validates an item array.
///
/// Anything that is not a JSON array is rejected outright. Elements must be
/// item records with unique ids and non-blank names.
pub fn parse_items(text: &str) -> Result<Vec<Item>, TransferError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(TransferError::InvalidJson)?;
    if !value.is_array() {
        return Err(TransferError::NotAnArray);
    }

    let items: Vec<Item> = serde_json::from_value(value).map_err(TransferError::InvalidItem)?;

    let mut seen = HashSet::new();
    for item in &items {
        if item.name.trim().is_empty() {
            return Err(TransferError::EmptyName(item.id.to_string()));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(TransferError::DuplicateId(item.id.to_string()));
        }
    }

    Ok(items)
}

/// Reads and validates an import file.
pub fn read_import(path: &Path) -> Result<Vec<Item>, TransferError> {
    let text =
        fs::read_to_string(path).map_err(|e| TransferError::ReadError(path.to_path_buf(), e))?;
    parse_items(&text)
}

/// Encodes the items as a URL-safe share token.
pub fn encode_share_token(items: &[Item]) -> Result<String, TransferError> {
    let json = serde_json::to_string(items).map_err(TransferError::InvalidJson)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decodes a share token.
///
/// Tokens made with the standard alphabet, with or without padding, are
/// accepted too.
pub fn decode_share_token(token: &str) -> Result<Vec<Item>, TransferError> {
    let token = token.trim();
    let bytes = [&URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD, &STANDARD_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(token).ok())
        .ok_or(TransferError::InvalidToken)?;
    let text = String::from_utf8(bytes).map_err(|_| TransferError::InvalidToken)?;
    parse_items(&text)
}

/// Builds `<base>#data=<token>`, dropping any fragment already on `base`.
pub fn share_link(base_url: &str, items: &[Item]) -> Result<String, TransferError> {
    let base = base_url.split('#').next().unwrap_or(base_url);
    Ok(format!("{}{}{}", base, SHARE_FRAGMENT, encode_share_token(items)?))
}

/// Splits a share token off an address.
///
/// Returns the address with the fragment stripped and the token, or `None`
/// if the address carries no share token.
pub fn take_share_token(address: &str) -> Option<(String, String)> {
    let (base, token) = address.split_once(SHARE_FRAGMENT)?;
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some((base.to_string(), token.to_string()))
}

/// Reads the items carried by a share link.
pub fn open_share_link(address: &str) -> Result<(String, Vec<Item>), TransferError> {
    let (stripped, token) = take_share_token(address).ok_or(TransferError::NoShareToken)?;
    let items = decode_share_token(&token)?;
    Ok((stripped, items))
}
