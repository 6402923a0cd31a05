pub mod scraper;

use serde::{Serialize, Serializer};

pub use scraper::ScraperClient;

pub const MAX_MENTIONS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MentionItem {
    pub title: String,
    pub snippet: String,
    pub link: String,
    pub source: String,
}

/// Outcome of an external mention lookup. Lookups never fail past this value.
///
/// Serializes as `{status, items, message?}`; `items` is always present and
/// empty for every status except `ready`.
#[derive(Debug, Clone, PartialEq)]
pub enum MentionStatus {
    /// No provider credential configured; no call was made.
    Disabled,
    Empty,
    Ready { items: Vec<MentionItem> },
    Error { message: String },
}

impl MentionStatus {
    /// `Empty` for no items, otherwise `Ready` with at most [`MAX_MENTIONS`].
    pub fn from_items(mut items: Vec<MentionItem>) -> Self {
        if items.is_empty() {
            return MentionStatus::Empty;
        }
        items.truncate(MAX_MENTIONS);
        MentionStatus::Ready { items }
    }

    pub fn items(&self) -> &[MentionItem] {
        match self {
            MentionStatus::Ready { items } => items,
            _ => &[],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MentionStatus::Disabled => "disabled",
            MentionStatus::Empty => "empty",
            MentionStatus::Ready { .. } => "ready",
            MentionStatus::Error { .. } => "error",
        }
    }
}

#[derive(Serialize)]
struct MentionStatusWire<'a> {
    status: &'static str,
    items: &'a [MentionItem],
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

impl Serialize for MentionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let message = match self {
            MentionStatus::Error { message } => Some(message.as_str()),
            _ => None,
        };
        MentionStatusWire {
            status: self.label(),
            items: self.items(),
            message,
        }
        .serialize(serializer)
    }
}

#[async_trait::async_trait]
pub trait MentionSearch: Send + Sync {
    async fn fetch_mentions(&self, business_name: &str, city: &str) -> MentionStatus;
}
