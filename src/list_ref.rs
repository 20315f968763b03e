//! Choosing which remote list to open.
//!
//! The list id comes from one of three places depending on [`ListMode`]:
//! an explicit id or a link carrying `?list=<id>`, an id generated on first
//! use and remembered in the data directory, or one fixed shared list.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::models::{is_valid_list_id, ShoppingList};

/// Id of the single list used in `fixed` mode.
pub const FIXED_LIST_ID: &str = "shared";

/// File inside the data directory remembering the auto-created list.
pub const REMEMBERED_LIST_FILE: &str = "list-id";

/// Query parameter carrying the list id in a link.
pub const LIST_QUERY_PARAM: &str = "list";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListMode {
    /// The id must be given explicitly or through a link.
    Url,
    /// Given id, else the remembered one, else a new one.
    #[default]
    Auto,
    /// Always [`FIXED_LIST_ID`].
    Fixed,
}

impl fmt::Display for ListMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListMode::Url => write!(f, "url"),
            ListMode::Auto => write!(f, "auto"),
            ListMode::Fixed => write!(f, "fixed"),
        }
    }
}

impl FromStr for ListMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "url" => Ok(ListMode::Url),
            "auto" => Ok(ListMode::Auto),
            "fixed" => Ok(ListMode::Fixed),
            _ => Err(format!(
                "Invalid list mode '{}'. Valid options: url, auto, fixed",
                s
            )),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListRefError {
    #[error("No list id given. Pass --list <id> or --link <url>")]
    MissingListId,
    #[error("Invalid list id: {0}")]
    InvalidListId(String),
    #[error("Link has no 'list' parameter: {0}")]
    NoListInLink(String),
    #[error("Failed to remember list id in {0}: {1}")]
    RememberError(PathBuf, std::io::Error),
}

/// Extracts the list id from the query string of a link.
pub fn list_id_from_link(link: &str) -> Option<String> {
    let without_fragment = link.split('#').next().unwrap_or(link);
    let (_, query) = without_fragment.split_once('?')?;

    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key != LIST_QUERY_PARAM {
            return None;
        }
        urlencoding::decode(value)
            .ok()
            .map(|v| v.into_owned())
            .filter(|v| !v.is_empty())
    })
}

/// Builds a link that opens `list_id`.
pub fn list_link(base_url: &str, list_id: &str) -> String {
    let base = base_url.split(['?', '#']).next().unwrap_or(base_url);
    format!(
        "{}?{}={}",
        base,
        LIST_QUERY_PARAM,
        urlencoding::encode(list_id)
    )
}

/// Picks the list id for this run.
///
/// `explicit` is a `--list` value, `link` a `--link` value; the explicit id
/// wins when both are given.
pub fn resolve_list_id(
    mode: ListMode,
    explicit: Option<&str>,
    link: Option<&str>,
    data_dir: &Path,
) -> Result<String, ListRefError> {
    let given = match (explicit, link) {
        (Some(id), _) => Some(id.trim().to_string()),
        (None, Some(link)) => Some(
            list_id_from_link(link).ok_or_else(|| ListRefError::NoListInLink(link.to_string()))?,
        ),
        (None, None) => None,
    };

    if let Some(id) = &given {
        if !is_valid_list_id(id) {
            return Err(ListRefError::InvalidListId(id.clone()));
        }
    }

    match mode {
        ListMode::Url => given.ok_or(ListRefError::MissingListId),
        ListMode::Fixed => {
            if let Some(id) = given.filter(|id| id != FIXED_LIST_ID) {
                tracing::warn!(
                    "Ignoring list '{}': list mode is fixed to '{}'",
                    id,
                    FIXED_LIST_ID
                );
            }
            Ok(FIXED_LIST_ID.to_string())
        }
        ListMode::Auto => match given {
            Some(id) => Ok(id),
            None => remembered_or_new(data_dir),
        },
    }
}

fn remembered_or_new(data_dir: &Path) -> Result<String, ListRefError> {
    let path = data_dir.join(REMEMBERED_LIST_FILE);

    if let Ok(contents) = fs::read_to_string(&path) {
        let id = contents.trim();
        if is_valid_list_id(id) {
            return Ok(id.to_string());
        }
        tracing::warn!("Ignoring invalid remembered list id in {}", path.display());
    }

    let id = ShoppingList::generate_id();
    remember_list_id(data_dir, &id)?;
    tracing::info!("Created new list id {}", id);

    Ok(id)
}

/// Makes `list_id` the list `auto` mode opens from now on.
pub fn remember_list_id(data_dir: &Path, list_id: &str) -> Result<(), ListRefError> {
    let path = data_dir.join(REMEMBERED_LIST_FILE);
    fs::create_dir_all(data_dir)
        .map_err(|e| ListRefError::RememberError(data_dir.to_path_buf(), e))?;
    fs::write(&path, list_id).map_err(|e| ListRefError::RememberError(path, e))
}
