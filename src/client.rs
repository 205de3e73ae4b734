//! Google Drive API facade: search, reconciling upload, delete-all and
//! folder creation.

use std::path::Path;

use futures::stream::{self, Stream};
use futures::TryStreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};

use crate::auth::{Authenticator, Credential};
use crate::error::{DriveError, Result};
use crate::models::{ApiErrorResponse, FileListResponse, FileResource, FileSummary, OauthCredentials};

/// Base URL for Google Drive API v2.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v2";

/// Upload URL for Google Drive API v2.
const UPLOAD_API_BASE: &str = "https://www.googleapis.com/upload/drive/v2";

/// MIME type marking a resource as a folder.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Results requested per list page.
const MAX_RESULTS_PER_PAGE: &str = "1000";

/// Client for interacting with Google Drive.
///
/// Holds one authenticator and one HTTP client for its lifetime; the access
/// credential is fetched lazily on the first call and reused afterwards.
pub struct DriveClient {
    auth: Authenticator,
    http: Client,
    api_base: String,
    upload_base: String,
}

impl DriveClient {
    /// Create a new DriveClient against the Google API endpoints.
    pub fn new(credentials: OauthCredentials) -> Self {
        Self::with_endpoints(
            Authenticator::new(credentials),
            DRIVE_API_BASE.to_string(),
            UPLOAD_API_BASE.to_string(),
        )
    }

    /// Create a DriveClient against custom endpoints.
    /// Useful for tests and API emulators.
    pub fn with_endpoints(auth: Authenticator, api_base: String, upload_base: String) -> Self {
        Self {
            auth,
            http: Client::new(),
            api_base,
            upload_base,
        }
    }

    /// The underlying authenticator, for callers batching several raw
    /// requests under one credential.
    pub fn auth(&self) -> &Authenticator {
        &self.auth
    }

    /// The memoized access credential (fetched on first use).
    pub async fn credential(&self) -> Result<&Credential> {
        self.auth.credential().await
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Search for files whose title contains `title`, optionally restricted
    /// to children of `parent_id`. Accumulates every result page.
    pub async fn search(&self, title: &str, parent_id: Option<&str>) -> Result<Vec<FileResource>> {
        self.query_all(contains_query(title, parent_id)).await
    }

    /// Lazy page-by-page variant of [`search`](Self::search).
    ///
    /// Each item is one result page in API order; the stream ends after the
    /// first page without a continuation token. Very large result sets can
    /// be consumed without materializing everything.
    pub fn search_pages(
        &self,
        title: &str,
        parent_id: Option<&str>,
    ) -> impl Stream<Item = Result<Vec<FileResource>>> + '_ {
        self.query_pages(contains_query(title, parent_id))
    }

    /// Delete every file matching (`title`, `parent_id`), strictly one at a
    /// time, returning what was matched in simplified form.
    ///
    /// Deletion order follows search order. The first failing delete aborts
    /// the rest and propagates; files deleted before the failure stay
    /// deleted. A blind retry is safe because a 404 on an individual delete
    /// is treated as already-gone.
    pub async fn delete_all(
        &self,
        title: &str,
        parent_id: Option<&str>,
    ) -> Result<Vec<FileSummary>> {
        let matched: Vec<FileSummary> = self
            .search(title, parent_id)
            .await?
            .into_iter()
            .map(FileSummary::from)
            .collect();

        if matched.is_empty() {
            tracing::info!(title, "no existing files, deletion is unnecessary");
            return Ok(matched);
        }

        // One delete at a time. Firing these concurrently trips Drive's
        // per-user rate limit when many files share a title.
        for file in &matched {
            self.delete_file(&file.id).await?;
        }

        Ok(matched)
    }

    /// Delete a single file by id. Not-found counts as success.
    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        let token = self.auth.access_token().await?;

        let response = self
            .http
            .delete(format!("{}/files/{}", self.api_base, file_id))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() && status.as_u16() != 404 {
            return Err(api_error(response).await);
        }

        Ok(())
    }

    /// Upload a local file, overwriting any same-titled files in the target
    /// folder.
    ///
    /// The resource title is the final path segment of `local_path`. The
    /// file read and the deletion of existing matches run concurrently; the
    /// insert happens once both succeed. Upload is delete-then-create, not a
    /// transaction: if the insert fails the deleted files are not restored.
    pub async fn upload<P: AsRef<Path>>(
        &self,
        local_path: P,
        mime_type: &str,
        parent_id: Option<&str>,
    ) -> Result<FileResource> {
        let local_path = local_path.as_ref();
        let title = file_title(local_path)
            .ok_or_else(|| DriveError::InvalidFilename(local_path.display().to_string()))?;

        let (content, _removed) = tokio::try_join!(
            async { tokio::fs::read(local_path).await.map_err(DriveError::from) },
            self.delete_all(&title, parent_id),
        )?;

        self.insert_file(&title, mime_type, content, parent_id).await
    }

    /// Find or create a folder named `name`, optionally nested under
    /// `parent_id`.
    ///
    /// Drive does not deduplicate folders by (title, parent), so the
    /// existence check here is what makes repeated calls return the same id.
    pub async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<FileResource> {
        if let Some(existing) = self.find_folder(name, parent_id).await? {
            tracing::debug!(folder = name, id = %existing.id, "folder already exists");
            return Ok(existing);
        }

        let token = self.auth.access_token().await?;

        let response = self
            .http
            .post(format!("{}/files", self.api_base))
            .bearer_auth(token)
            .json(&resource_metadata(name, FOLDER_MIME_TYPE, parent_id))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response.json().await?)
    }

    /// Find a folder by exact title, optionally under a parent.
    pub async fn find_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Option<FileResource>> {
        let mut query = format!(
            "title = '{}' and mimeType = '{}'",
            escape_query_term(name),
            FOLDER_MIME_TYPE
        );
        if let Some(parent) = parent_id {
            query.push_str(&format!(" and '{}' in parents", escape_query_term(parent)));
        }

        let mut folders = self.query_all(query).await?;
        Ok(if folders.is_empty() {
            None
        } else {
            Some(folders.remove(0))
        })
    }

    fn query_pages(&self, query: String) -> impl Stream<Item = Result<Vec<FileResource>>> + '_ {
        // State machine over the continuation token:
        //   Some(None)        -> first page not yet fetched
        //   Some(Some(token)) -> next page continues at `token`
        //   None              -> done
        stream::try_unfold(Some(None::<String>), move |state| {
            let query = query.clone();
            async move {
                let page_token = match state {
                    Some(token) => token,
                    None => return Ok(None),
                };
                let page = self.list_page(&query, page_token.as_deref()).await?;
                let next_state = page.next_page_token.map(Some);
                Ok(Some((page.items, next_state)))
            }
        })
    }

    async fn query_all(&self, query: String) -> Result<Vec<FileResource>> {
        let pages = self.query_pages(query);
        futures::pin_mut!(pages);

        let mut all = Vec::new();
        while let Some(items) = pages.try_next().await? {
            all.extend(items);
        }
        Ok(all)
    }

    async fn list_page(&self, query: &str, page_token: Option<&str>) -> Result<FileListResponse> {
        let token = self.auth.access_token().await?;

        let mut request = self
            .http
            .get(format!("{}/files", self.api_base))
            .bearer_auth(token)
            .query(&[("q", query), ("maxResults", MAX_RESULTS_PER_PAGE)]);

        if let Some(page) = page_token {
            request = request.query(&[("pageToken", page)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response.json().await?)
    }

    async fn insert_file(
        &self,
        title: &str,
        mime_type: &str,
        content: Vec<u8>,
        parent_id: Option<&str>,
    ) -> Result<FileResource> {
        let token = self.auth.access_token().await?;

        let metadata_part = Part::text(resource_metadata(title, mime_type, parent_id).to_string())
            .mime_str("application/json")?;
        let content_part = Part::bytes(content)
            .file_name(title.to_string())
            .mime_str(mime_type)?;
        let form = Form::new()
            .part("metadata", metadata_part)
            .part("file", content_part);

        let response = self
            .http
            .post(format!("{}/files", self.upload_base))
            .bearer_auth(token)
            .query(&[("uploadType", "multipart")])
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response.json().await?)
    }
}

/// Decode a non-2xx response into an ApiError, preferring the structured
/// Drive error envelope over the raw body.
async fn api_error(response: Response) -> DriveError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&body) {
        DriveError::ApiError {
            status: api_error.error.code,
            message: api_error.error.message,
        }
    } else {
        DriveError::ApiError {
            status,
            message: body,
        }
    }
}

/// Escape a term for interpolation into a Drive query string.
fn escape_query_term(term: &str) -> String {
    term.replace('\\', "\\\\").replace('\'', "\\'")
}

fn contains_query(title: &str, parent_id: Option<&str>) -> String {
    let mut query = format!("title contains '{}'", escape_query_term(title));
    if let Some(parent) = parent_id {
        query.push_str(&format!(" and '{}' in parents", escape_query_term(parent)));
    }
    query
}

/// Resource metadata body for insert calls.
fn resource_metadata(title: &str, mime_type: &str, parent_id: Option<&str>) -> serde_json::Value {
    let mut metadata = serde_json::json!({
        "title": title,
        "mimeType": mime_type,
    });
    if let Some(parent) = parent_id {
        metadata["parents"] =
            serde_json::json!([{ "kind": "drive#parentReference", "id": parent }]);
    }
    metadata
}

/// Derive the resource title from a local path: the final segment after the
/// last `/` or `\`. Paths ending in a separator, `.` or `..` have no usable
/// title, and neither do paths that are not valid UTF-8.
fn file_title(path: &Path) -> Option<String> {
    let raw = path.to_str()?;
    let name = raw.rsplit(['/', '\\']).next().unwrap_or("");
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}
