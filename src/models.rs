//! Data models for Google Drive API v2 responses.

use serde::{Deserialize, Serialize};

/// Metadata for a file or folder in Google Drive.
///
/// This is a snapshot returned by the API; it goes stale as soon as any
/// mutating call touches the underlying resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResource {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub parents: Vec<ParentReference>,
    #[serde(default, deserialize_with = "deserialize_size")]
    pub file_size: Option<u64>,
}

/// Reference to a parent folder of a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentReference {
    pub id: String,
    #[serde(default)]
    pub kind: Option<String>,
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // Drive v2 serializes fileSize as a JSON string
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) => s.parse::<u64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

impl std::fmt::Display for FileResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size_str = self
            .file_size
            .map(format_size)
            .unwrap_or_else(|| "-".to_string());
        let mime = self.mime_type.as_deref().unwrap_or("-");
        write!(f, "{}\t{}\t{}\t{}", self.id, size_str, mime, self.title)
    }
}

/// Format bytes into human-readable size.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// A matched file in the simplified form returned by `delete_all`:
/// parent references are flattened to bare folder ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub id: String,
    pub title: String,
    pub parents: Vec<String>,
}

impl From<FileResource> for FileSummary {
    fn from(file: FileResource) -> Self {
        Self {
            id: file.id,
            title: file.title,
            parents: file.parents.into_iter().map(|p| p.id).collect(),
        }
    }
}

/// Response from the files.list API endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    #[serde(default)]
    pub items: Vec<FileResource>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}

/// OAuth2 client credentials used for the refresh-token grant.
#[derive(Debug, Clone, Deserialize)]
pub struct OauthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// OAuth2 token endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
        assert_eq!(format_size(1073741824), "1.00 GB");
    }

    #[test]
    fn test_file_resource_deserialize() {
        let json = r#"{
            "id": "abc123",
            "title": "test.txt",
            "mimeType": "text/plain",
            "parents": [{"kind": "drive#parentReference", "id": "root1"}],
            "fileSize": "1024"
        }"#;

        let file: FileResource = serde_json::from_str(json).unwrap();
        assert_eq!(file.id, "abc123");
        assert_eq!(file.title, "test.txt");
        assert_eq!(file.mime_type, Some("text/plain".to_string()));
        assert_eq!(file.parents.len(), 1);
        assert_eq!(file.parents[0].id, "root1");
        assert_eq!(file.file_size, Some(1024));
    }

    #[test]
    fn test_folder_resource_without_size() {
        let json = r#"{
            "id": "folder123",
            "title": "My Folder",
            "mimeType": "application/vnd.google-apps.folder"
        }"#;

        let file: FileResource = serde_json::from_str(json).unwrap();
        assert_eq!(file.id, "folder123");
        assert!(file.parents.is_empty());
        assert_eq!(file.file_size, None);
    }

    #[test]
    fn test_file_summary_flattens_parents() {
        let json = r#"{
            "id": "f1",
            "title": "report.txt",
            "parents": [{"id": "p1"}, {"id": "p2"}]
        }"#;

        let file: FileResource = serde_json::from_str(json).unwrap();
        let summary = FileSummary::from(file);
        assert_eq!(summary.id, "f1");
        assert_eq!(summary.parents, vec!["p1".to_string(), "p2".to_string()]);
    }

    #[test]
    fn test_file_list_response_deserialize() {
        let json = r#"{
            "items": [
                {"id": "f1", "title": "file1.txt"},
                {"id": "f2", "title": "file2.txt"}
            ],
            "nextPageToken": "token123"
        }"#;

        let response: FileListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.next_page_token, Some("token123".to_string()));
    }

    #[test]
    fn test_file_list_response_empty() {
        let response: FileListResponse = serde_json::from_str("{}").unwrap();
        assert!(response.items.is_empty());
        assert!(response.next_page_token.is_none());
    }

    #[test]
    fn test_token_response_requires_access_token() {
        let ok = r#"{"access_token": "tok", "token_type": "Bearer", "expires_in": 3600}"#;
        let token: TokenResponse = serde_json::from_str(ok).unwrap();
        assert_eq!(token.access_token, "tok");
        assert_eq!(token.expires_in, Some(3600));

        let missing = r#"{"error": "invalid_grant"}"#;
        assert!(serde_json::from_str::<TokenResponse>(missing).is_err());
    }

    #[test]
    fn test_file_resource_display() {
        let file = FileResource {
            id: "abc123".to_string(),
            title: "test.txt".to_string(),
            mime_type: Some("text/plain".to_string()),
            parents: Vec::new(),
            file_size: Some(1024),
        };

        let display = format!("{}", file);
        assert!(display.contains("abc123"));
        assert!(display.contains("test.txt"));
        assert!(display.contains("1.00 KB"));
    }
}
