//! Wire shape for the Spec Executor's oracle call (§4.4): one of seven
//! tagged actions the oracle may return per iteration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action")]
pub enum IterationReply {
    #[serde(rename = "SPEC_COMPLETE")]
    SpecComplete,
    #[serde(rename = "stuck")]
    Stuck { reason: String },
    #[serde(rename = "dry-run")]
    DryRun { notes: String },
    #[serde(rename = "change")]
    Change {
        #[serde(rename = "filePath")]
        file_path: String,
        #[serde(rename = "oldText")]
        old_text: String,
        #[serde(rename = "newText")]
        new_text: String,
    },
    #[serde(rename = "multi-change")]
    MultiChange { changes: Vec<ChangeEntry> },
    #[serde(rename = "create")]
    Create {
        #[serde(rename = "filePath")]
        file_path: String,
        content: String,
    },
    #[serde(rename = "multi-create")]
    MultiCreate { creates: Vec<CreateEntry> },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChangeEntry {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "oldText")]
    pub old_text: String,
    #[serde(rename = "newText")]
    pub new_text: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateEntry {
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_spec_complete() {
        let reply: IterationReply = serde_json::from_str(r#"{"action": "SPEC_COMPLETE"}"#).unwrap();
        assert!(matches!(reply, IterationReply::SpecComplete));
    }

    #[test]
    fn decodes_stuck_with_reason() {
        let reply: IterationReply =
            serde_json::from_str(r#"{"action": "stuck", "reason": "cannot locate target"}"#).unwrap();
        match reply {
            IterationReply::Stuck { reason } => assert_eq!(reason, "cannot locate target"),
            other => panic!("expected Stuck, got {other:?}"),
        }
    }

    #[test]
    fn decodes_change() {
        let reply: IterationReply = serde_json::from_str(
            r#"{"action": "change", "filePath": "src/a.ts", "oldText": "x", "newText": "y"}"#,
        )
        .unwrap();
        assert!(matches!(reply, IterationReply::Change { .. }));
    }

    #[test]
    fn decodes_multi_create() {
        let reply: IterationReply = serde_json::from_str(
            r#"{"action": "multi-create", "creates": [{"filePath": "a.ts", "content": "x"}]}"#,
        )
        .unwrap();
        match reply {
            IterationReply::MultiCreate { creates } => assert_eq!(creates.len(), 1),
            other => panic!("expected MultiCreate, got {other:?}"),
        }
    }
}
