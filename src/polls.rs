//! Paginated poll list backed by a single session cache.
//!
//! The cached page is either present (valid) or absent (stale). It is only ever
//! replaced as a whole or dropped as a whole, never patched item by item: after
//! a mutation the client cannot know what the server actually did, so the next
//! read goes back to the server.

use log::{info, warn};

use crate::error::PanelError;
use crate::models::{
    CrudOperation, CrudRequest, CrudResponse, PollDataRequest, PollSummary, PollsPage, STATUS_COMPLETED,
};
use crate::network::{ActionGateway, GET_POLL_DATA, MANAGE_POLL_CRUD};

pub const LOAD_FAILED: &str = "Failed to load polls or no polls found.";
pub const NO_POLLS: &str = "No polls managed by this action yet.";

#[derive(Debug, Default, Clone)]
pub struct PollsCache(Option<PollsPage>);

impl PollsCache {
    pub fn get(&self) -> Option<&PollsPage> {
        self.0.as_ref()
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }

    pub fn store(&mut self, page: PollsPage) -> &PollsPage {
        self.0.insert(page)
    }

    pub fn invalidate(&mut self) {
        self.0 = None;
    }

    fn current(&mut self) -> &PollsPage {
        self.0.get_or_insert_with(PollsPage::default)
    }
}

/// Result of asking for the current page.
#[derive(Debug)]
pub struct PageLoad<'a> {
    pub page: &'a PollsPage,
    /// Set when this call went to the server and the answer was unusable. The
    /// page is then the canonical empty one.
    pub failure: Option<PanelError>,
}

#[derive(Debug)]
pub struct PollList {
    page: u32,
    limit: u32,
    pub cache: PollsCache,
    selected: Option<String>,
}

impl PollList {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            cache: PollsCache::default(),
            selected: None,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn total_pages(&self) -> u32 {
        self.cache.get().map_or(1, |p| p.total_pages)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, id: &str) {
        self.selected = Some(id.to_string());
    }

    /// Returns the cached page, fetching it only when the cache is absent.
    pub async fn get_page<G: ActionGateway>(&mut self, gateway: &G) -> PageLoad<'_> {
        let failure = if self.cache.is_present() {
            None
        } else {
            match self.fetch(gateway).await {
                Ok(page) => {
                    info!(
                        "loaded poll page {}/{} ({} items)",
                        self.page,
                        page.total_pages,
                        page.items.len()
                    );
                    self.cache.store(page);
                    None
                }
                Err(err) => {
                    warn!("poll list load failed: {}", err);
                    self.cache.store(PollsPage::default());
                    Some(err)
                }
            }
        };

        PageLoad {
            page: self.cache.current(),
            failure,
        }
    }

    async fn fetch<G: ActionGateway>(&self, gateway: &G) -> Result<PollsPage, PanelError> {
        let payload = serde_json::to_value(PollDataRequest::summaries(self.page, self.limit))
            .map_err(|e| PanelError::remote(e.to_string(), None))?;
        let value = gateway.exec(GET_POLL_DATA, payload).await?;
        PollsPage::decode(value)
    }

    /// Moves one page back. Returns false (and changes nothing) on the first page.
    pub fn prev(&mut self) -> bool {
        if self.page <= 1 {
            return false;
        }
        self.page -= 1;
        self.cache.invalidate();
        true
    }

    /// Moves one page forward. Returns false (and changes nothing) on the last page.
    pub fn next(&mut self) -> bool {
        if self.page >= self.total_pages() {
            return false;
        }
        self.page += 1;
        self.cache.invalidate();
        true
    }

    pub fn refresh(&mut self) {
        self.cache.invalidate();
        self.selected = None;
    }

    pub async fn archive<G: ActionGateway>(&mut self, gateway: &G, id: &str) -> Result<&'static str, PanelError> {
        self.mutate(gateway, CrudOperation::Archive, id, None).await
    }

    /// Returns `None` without calling out when the poll is already completed or
    /// archived.
    pub async fn mark_completed<G: ActionGateway>(
        &mut self,
        gateway: &G,
        poll: &PollSummary,
    ) -> Option<Result<&'static str, PanelError>> {
        if !poll.can_complete() {
            return None;
        }
        let result = self
            .mutate(
                gateway,
                CrudOperation::UpdateStatus,
                &poll.internal_poll_group_id,
                Some(STATUS_COMPLETED),
            )
            .await;
        Some(result)
    }

    pub async fn delete<G: ActionGateway>(&mut self, gateway: &G, id: &str) -> Result<&'static str, PanelError> {
        self.mutate(gateway, CrudOperation::Delete, id, None).await
    }

    async fn mutate<G: ActionGateway>(
        &mut self,
        gateway: &G,
        operation: CrudOperation,
        id: &str,
        new_status: Option<&str>,
    ) -> Result<&'static str, PanelError> {
        let request = CrudRequest {
            operation,
            internal_poll_group_id: id.to_string(),
            new_status: new_status.map(str::to_string),
        };
        let result = send_crud(gateway, &request).await;
        // whatever happened server side, the cached page can no longer be trusted
        self.cache.invalidate();
        match &result {
            Ok(_) => info!("{:?} on poll {} succeeded", operation, id),
            Err(err) => warn!("{:?} on poll {} failed: {}", operation, id, err),
        }
        result
    }
}

async fn send_crud<G: ActionGateway>(
    gateway: &G,
    request: &CrudRequest,
) -> Result<&'static str, PanelError> {
    let failure = |message: String| {
        PanelError::remote(format!("{}: {}", request.operation.failure_prefix(), message), None)
    };

    let payload = serde_json::to_value(request).map_err(|e| failure(e.to_string()))?;
    let value = gateway
        .exec(MANAGE_POLL_CRUD, payload)
        .await
        .map_err(|e| failure(e.to_string()))?;
    let response: CrudResponse = serde_json::from_value(value).unwrap_or_default();

    if response.succeeded() {
        Ok(request.operation.success_message())
    } else {
        Err(failure(response.message.unwrap_or_else(|| "Unknown error".into())))
    }
}
