use std::cell::{Cell, RefCell};

use futures::future::LocalBoxFuture;
use game_map_shared::MapData;
use web_sys::CssStyleSheet;

use crate::config::STYLESHEET_PATH;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("fetch error: {0}")]
    Fetch(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("image decode failed: {0}")]
    Image(String),
    #[error("stylesheet error: {0}")]
    Stylesheet(String),
}

/// Monotonic token for single-flight loads. Only the most recently issued
/// token is current; completions carrying an older one are stale.
#[derive(Debug, Default)]
pub struct LoadGeneration {
    current: Cell<u64>,
}

impl LoadGeneration {
    pub fn advance(&self) -> u64 {
        let next = self.current.get().wrapping_add(1);
        self.current.set(next);
        next
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.current.get() == token
    }
}

/// Resolves a `data-src` value to a map description.
pub trait DataLoader {
    fn load(&self, source: &str) -> LocalBoxFuture<'static, Result<MapData, LoadError>>;
}

/// Fetches the source over HTTP and parses it as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpDataLoader;

impl DataLoader for HttpDataLoader {
    fn load(&self, source: &str) -> LocalBoxFuture<'static, Result<MapData, LoadError>> {
        let url = source.to_owned();
        Box::pin(async move { fetch_map_data(&url).await })
    }
}

pub async fn fetch_map_data(url: &str) -> Result<MapData, LoadError> {
    let body = fetch_text(url).await?;
    MapData::from_json(&body).map_err(|e| LoadError::Parse(e.to_string()))
}

async fn fetch_text(url: &str) -> Result<String, LoadError> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| LoadError::Fetch(e.to_string()))?;
    if !resp.ok() {
        return Err(LoadError::Status(resp.status()));
    }
    resp.text()
        .await
        .map_err(|e| LoadError::Fetch(e.to_string()))
}

thread_local! {
    static STYLESHEET: RefCell<Option<CssStyleSheet>> = const { RefCell::new(None) };
}

/// The widget stylesheet, fetched once per page and shared by every instance.
pub async fn load_stylesheet() -> Result<CssStyleSheet, LoadError> {
    if let Some(sheet) = STYLESHEET.with(|slot| slot.borrow().clone()) {
        return Ok(sheet);
    }
    let css = fetch_text(STYLESHEET_PATH).await?;
    let sheet = CssStyleSheet::new().map_err(|e| LoadError::Stylesheet(format!("{e:?}")))?;
    sheet
        .replace_sync(&css)
        .map_err(|e| LoadError::Stylesheet(format!("{e:?}")))?;
    // A concurrent first load may have finished meanwhile; keep the earlier sheet.
    let sheet = STYLESHEET.with(|slot| slot.borrow_mut().get_or_insert(sheet).clone());
    Ok(sheet)
}
