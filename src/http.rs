//! [`RosterSource`] backed by the browser fetch API.
//!
//! Every request owns an `AbortController`; dropping the request future
//! before it finishes aborts the browser request.

use crate::config::API_BASE;
use crate::source::RosterSource;
use crate::{LadderError, PageNumber, RosterHandle, RosterInfo, RowRecord};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, Headers, RequestInit, Response};

#[derive(Deserialize)]
struct PageResponse {
    results: Vec<RowRecord>,
}

/// Aborts the browser request when dropped, unless disarmed first.
struct AbortOnDrop {
    controller: AbortController,
    armed: bool,
}

impl AbortOnDrop {
    fn new() -> Result<Self, LadderError> {
        Ok(Self {
            controller: AbortController::new().map_err(js_error)?,
            armed: true,
        })
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.controller.abort();
        }
    }
}

fn js_error(value: JsValue) -> LadderError {
    let message = value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value));
    LadderError::Network(message)
}

async fn send(
    guard: &AbortOnDrop,
    method: &str,
    url: &str,
    body: Option<serde_json::Value>,
) -> Result<Response, LadderError> {
    let init = RequestInit::new();
    init.set_method(method);
    init.set_signal(Some(&guard.controller.signal()));
    if let Some(body) = body {
        let headers = Headers::new().map_err(js_error)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(js_error)?;
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&body.to_string()));
    }

    let response = JsFuture::from(gloo_utils::window().fetch_with_str_and_init(url, &init))
        .await
        .map_err(js_error)?;
    let response: Response = response.dyn_into().map_err(js_error)?;
    if !response.ok() {
        return Err(LadderError::Http {
            status: response.status(),
        });
    }
    Ok(response)
}

async fn get_json<T: DeserializeOwned>(url: String) -> Result<T, LadderError> {
    let guard = AbortOnDrop::new()?;
    let response = send(&guard, "GET", &url, None).await?;
    let body = JsFuture::from(response.json().map_err(js_error)?)
        .await
        .map_err(js_error)?;
    guard.disarm();
    serde_wasm_bindgen::from_value(body).map_err(|e| LadderError::Malformed(e.to_string()))
}

async fn mutate(method: &str, url: String, body: Option<serde_json::Value>) -> Result<(), LadderError> {
    let guard = AbortOnDrop::new()?;
    send(&guard, method, &url, body).await?;
    guard.disarm();
    Ok(())
}

/// Ladder API client.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRosterSource {
    base: String,
}

impl Default for HttpRosterSource {
    fn default() -> Self {
        Self::new(API_BASE)
    }
}

impl HttpRosterSource {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    fn roster_url(&self, handle: RosterHandle) -> String {
        format!("{}ladders/{}", self.base, handle)
    }

    fn players_url(&self, handle: RosterHandle) -> String {
        format!("{}/players", self.roster_url(handle))
    }

    fn page_url(&self, handle: RosterHandle, page: PageNumber, page_size: usize) -> String {
        format!("{}?page={}&page_size={}", self.players_url(handle), page, page_size)
    }

    /// Join the ladder as the current user.
    pub async fn join(&self, handle: RosterHandle) -> Result<(), LadderError> {
        mutate("POST", self.players_url(handle), Some(serde_json::json!({}))).await
    }

    /// Withdraw the current user from the ladder.
    pub async fn leave(&self, handle: RosterHandle) -> Result<(), LadderError> {
        mutate("DELETE", self.players_url(handle), None).await
    }

    /// Start a ladder game against `player_id`.
    pub async fn challenge(&self, handle: RosterHandle, player_id: u64) -> Result<(), LadderError> {
        let url = format!("{}/challenge", self.players_url(handle));
        mutate("POST", url, Some(serde_json::json!({ "player_id": player_id }))).await
    }
}

impl RosterSource for HttpRosterSource {
    fn fetch_roster(&self, handle: RosterHandle) -> LocalBoxFuture<'static, Result<RosterInfo, LadderError>> {
        get_json::<RosterInfo>(self.roster_url(handle)).boxed_local()
    }

    fn fetch_page(
        &self,
        handle: RosterHandle,
        page: PageNumber,
        page_size: usize,
    ) -> LocalBoxFuture<'static, Result<Vec<RowRecord>, LadderError>> {
        let url = self.page_url(handle, page, page_size);
        async move {
            let response: PageResponse = get_json(url).await?;
            Ok(response.results)
        }
        .boxed_local()
    }
}
