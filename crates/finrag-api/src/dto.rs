use finrag_core::models::{AnswerResult, SourceRef, UnitCounts};
use finrag_retrieval::session::{SessionState, UploadReceipt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub grounded: bool,
    pub sources: Vec<SourceDto>,
}

#[derive(Debug, Serialize)]
pub struct SourceDto {
    pub chunk_id: u64,
    pub page_number: usize,
    pub kind: String,
    pub score: f32,
    pub excerpt: String,
}

impl From<&SourceRef> for SourceDto {
    fn from(source: &SourceRef) -> Self {
        Self {
            chunk_id: source.chunk_id.0,
            page_number: source.page_number,
            kind: source.kind.to_string(),
            score: source.score,
            excerpt: source.excerpt.clone(),
        }
    }
}

impl From<AnswerResult> for AskResponse {
    fn from(result: AnswerResult) -> Self {
        Self {
            answer: result.answer_text,
            grounded: result.grounded,
            sources: result.sources.iter().map(SourceDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsDto {
    pub text_count: usize,
    pub table_count: usize,
    pub figure_count: usize,
}

impl From<UnitCounts> for AnalyticsDto {
    fn from(counts: UnitCounts) -> Self {
        Self {
            text_count: counts.text,
            table_count: counts.table,
            figure_count: counts.figure,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: String,
    pub document_id: Uuid,
    pub page_count: usize,
    pub chunk_count: usize,
    pub analytics: AnalyticsDto,
}

impl From<UploadReceipt> for UploadResponse {
    fn from(receipt: UploadReceipt) -> Self {
        Self {
            status: "ok".to_string(),
            document_id: receipt.document_id,
            page_count: receipt.page_count,
            chunk_count: receipt.chunk_count,
            analytics: receipt.analytics.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub state: SessionState,
    pub document_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use finrag_core::models::{ChunkId, UnitKind};

    #[test]
    fn test_analytics_dto_field_names() {
        let dto = AnalyticsDto::from(UnitCounts { text: 2, table: 1, figure: 0 });
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["text_count"], 2);
        assert_eq!(json["table_count"], 1);
        assert_eq!(json["figure_count"], 0);
    }

    #[test]
    fn test_ask_response_from_answer_result() {
        let result = AnswerResult {
            question: "revenue?".to_string(),
            retrieved_chunk_ids: vec![ChunkId(1)],
            answer_text: "4.2M".to_string(),
            grounded: true,
            sources: vec![SourceRef {
                chunk_id: ChunkId(1),
                page_number: 2,
                kind: UnitKind::Table,
                score: 0.47,
                excerpt: "Year | Revenue".to_string(),
            }],
        };

        let response = AskResponse::from(result);
        assert!(response.grounded);
        assert_eq!(response.sources[0].kind, "table");
        assert_eq!(response.sources[0].chunk_id, 1);
    }
}
