//! Resource records and the arrival-ordered log they accumulate in.

use std::collections::HashMap;

use chromiumoxide::cdp::browser_protocol::network::Response;
use serde::{Deserialize, Serialize};

/// One network resource observed while rendering the page.
///
/// Field names follow the `resources.json` schema: `url`, `status`,
/// `headers`, `contentType`, `size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub url: String,
    pub status: i64,
    pub headers: serde_json::Value,
    pub content_type: String,
    /// Encoded body size; patched when the resource finishes loading.
    pub size: u64,
}

impl ResourceRecord {
    pub(crate) fn from_response(response: &Response) -> Self {
        Self {
            url: response.url.clone(),
            status: response.status,
            headers: serde_json::to_value(&response.headers).unwrap_or_default(),
            content_type: response.mime_type.clone(),
            size: response.encoded_data_length.max(0.0) as u64,
        }
    }
}

/// A network notification relevant to the snapshot.
#[derive(Debug)]
pub(crate) enum NetworkEvent {
    /// Response headers arrived; a record is appended.
    Response {
        request_id: String,
        record: ResourceRecord,
    },
    /// A resource finished loading; its final body size is known.
    Finished { request_id: String, size: u64 },
}

/// Accumulates resource records in arrival order.
pub(crate) struct ResourceLog {
    records: Vec<ResourceRecord>,
    by_request: HashMap<String, usize>,
    echo: bool,
}

impl ResourceLog {
    /// With `echo` set, each observed resource URL is printed to stdout as
    /// it arrives (the cookie-jar variant's diagnostic output).
    pub fn new(echo: bool) -> Self {
        Self {
            records: Vec::new(),
            by_request: HashMap::new(),
            echo,
        }
    }

    pub fn apply(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::Response { request_id, record } => {
                if self.echo {
                    println!("{}", record.url);
                }
                // Redirect chains reuse a request id; the size patch below
                // must land on the latest response for it.
                self.by_request.insert(request_id, self.records.len());
                self.records.push(record);
            }
            NetworkEvent::Finished { request_id, size } => {
                if let Some(&ix) = self.by_request.get(&request_id) {
                    self.records[ix].size = size;
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn into_records(self) -> Vec<ResourceRecord> {
        self.records
    }
}
