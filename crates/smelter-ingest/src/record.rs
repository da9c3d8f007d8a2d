//! The pipeline's unit of output.

use serde::Serialize;

use crate::document::Document;
use crate::forum::ForumThread;

/// A converted record headed for the writer.
///
/// Serializes untagged: each variant writes its own wire schema with no
/// wrapper object.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Record {
    /// General corpus document.
    Document(Document),
    /// Forum thread.
    Forum(ForumThread),
}

impl Record {
    /// Identifier of the underlying record, for logging.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            Record::Document(doc) => doc.id.clone(),
            Record::Forum(thread) => thread.id.to_string(),
        }
    }
}

impl From<Document> for Record {
    fn from(doc: Document) -> Self {
        Record::Document(doc)
    }
}

impl From<ForumThread> for Record {
    fn from(thread: ForumThread) -> Self {
        Record::Forum(thread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forum::ForumReply;

    #[test]
    fn test_record_serializes_untagged() {
        let mut thread = ForumThread::new(9, "subject", "20240101");
        thread.push_reply(ForumReply::new("0", "content"));
        let record = Record::from(thread);

        let value = serde_json::to_value(&record).unwrap();
        // No enum wrapper: the thread keys sit at the top level
        assert_eq!(value["ID"], 9);
        assert!(value.get("Forum").is_none());
    }

    #[test]
    fn test_record_id() {
        let thread = ForumThread::new(12, "s", "20240101");
        assert_eq!(Record::from(thread).id(), "12");
    }
}
