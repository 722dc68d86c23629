//! Page session context
//!
//! The game keeps its shareable state in the page URL. This module defines
//! the traits the rest of the crate uses to read and rewrite that state and
//! to copy links, so the browser can be replaced by an in-memory stand-in.

use std::str::FromStr;

use reqwest::Url;

/// Error returned when a page address cannot be parsed
pub type ParseError = <Url as FromStr>::Err;

/// How a URL change is recorded in the browser history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    /// Adds a new history entry
    Push,
    /// Rewrites the current history entry
    Replace,
}

/// Trait for reading and updating the page's query parameters
///
/// Implementations never navigate: changing a parameter only rewrites the
/// address so that copying it yields a link to the current state.
pub trait SessionContext {
    /// Returns the value of a query parameter, if present
    fn get(&self, key: &str) -> Option<String>;

    /// Sets a query parameter
    ///
    /// # Arguments
    ///
    /// * `key` - Parameter name
    /// * `value` - Parameter value
    /// * `mode` - Whether to push a new history entry or replace the current one
    fn set(&mut self, key: &str, value: &str, mode: HistoryMode);

    /// Removes a query parameter
    fn remove(&mut self, key: &str, mode: HistoryMode);

    /// Returns the full shareable address of the current state
    fn href(&self) -> String;
}

/// Trait for the write-only clipboard sink used by copy-to-share actions
pub trait Clipboard {
    /// Places text on the clipboard
    fn write_text(&mut self, text: &str);
}

/// A session context backed by a parsed page address
///
/// This is the in-memory equivalent of the browser's location and history:
/// it holds one address, rewrites its query string in place, and counts how
/// many history entries have been pushed. Parameters other than the one
/// being changed keep their order and repetitions.
#[derive(Debug, Clone)]
pub struct UrlSession {
    url: Url,
    pushed: usize,
}

impl UrlSession {
    /// Creates a session from a page address
    ///
    /// # Errors
    ///
    /// Returns a parse error if `href` is not an absolute URL.
    pub fn parse(href: &str) -> Result<Self, ParseError> {
        Ok(Self {
            url: Url::parse(href)?,
            pushed: 0,
        })
    }

    /// Number of history entries pushed since creation
    pub fn pushed(&self) -> usize {
        self.pushed
    }

    fn params(&self) -> Vec<(String, String)> {
        self.url.query_pairs().into_owned().collect()
    }

    fn write_params(&mut self, params: &[(String, String)], mode: HistoryMode) {
        if params.is_empty() {
            self.url.set_query(None);
        } else {
            self.url.query_pairs_mut().clear().extend_pairs(params);
        }
        if mode == HistoryMode::Push {
            self.pushed += 1;
        }
    }
}

impl SessionContext for UrlSession {
    fn get(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    fn set(&mut self, key: &str, value: &str, mode: HistoryMode) {
        let mut params = self.params();
        let mut found = false;
        params.retain_mut(|(k, v)| {
            if *k != key {
                return true;
            }
            if found {
                return false;
            }
            found = true;
            value.clone_into(v);
            true
        });
        if !found {
            params.push((key.to_owned(), value.to_owned()));
        }
        self.write_params(&params, mode);
    }

    fn remove(&mut self, key: &str, mode: HistoryMode) {
        let mut params = self.params();
        params.retain(|(k, _)| k != key);
        self.write_params(&params, mode);
    }

    fn href(&self) -> String {
        self.url.to_string()
    }
}
