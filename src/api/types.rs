use serde::{Deserialize, Serialize};

use crate::models::{CtfRecord, LeaderboardEntry, SubmissionRecord};

/// Query parameters of the CTF listing. Absent values are not sent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CtfListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CtfListResponse {
    #[serde(default)]
    pub ctfs: Vec<CtfRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CtfDetailResponse {
    Wrapped { ctf: CtfRecord },
    Bare(CtfRecord),
}

impl From<CtfDetailResponse> for CtfRecord {
    fn from(value: CtfDetailResponse) -> Self {
        match value {
            CtfDetailResponse::Wrapped { ctf } => ctf,
            CtfDetailResponse::Bare(ctf) => ctf,
        }
    }
}

/// Paging for the progress reads. Absent means the backend default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LimitParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardResponse {
    #[serde(default, alias = "topUsers")]
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionsResponse {
    #[serde(default)]
    pub submissions: Vec<SubmissionRecord>,
}

#[derive(Debug, Deserialize)]
pub struct JoinedResponse {
    #[serde(default)]
    pub joined: bool,
}

#[derive(Debug, Serialize)]
pub struct FlagSubmission<'a> {
    pub flag: &'a str,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub points: Option<u32>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_log::test;

    use crate::models::{CtfId, CtfRecord};

    use super::{
        CtfDetailResponse, CtfListParams, CtfListResponse, LeaderboardResponse, LimitParams,
        SubmissionReceipt, SubmissionsResponse,
    };

    #[test]
    fn params_skip_absent_values() {
        let params = CtfListParams {
            status: Some("active".to_string()),
            search: None,
            category: Some("Pwn".to_string()),
        };

        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({ "status": "active", "category": "Pwn" })
        );
    }

    #[test]
    fn listing_without_ctfs_field() {
        let response: CtfListResponse = serde_json::from_value(json!({ "total": 0 })).unwrap();
        assert!(response.ctfs.is_empty());
    }

    #[test]
    fn detail_wrapped_and_bare() {
        let wrapped: CtfDetailResponse =
            serde_json::from_value(json!({ "ctf": { "_id": "a", "title": "A" } })).unwrap();
        let bare: CtfDetailResponse =
            serde_json::from_value(json!({ "_id": "b", "title": "B" })).unwrap();

        assert_eq!(CtfRecord::from(wrapped).id, CtfId::from("a"));
        assert_eq!(CtfRecord::from(bare).id, CtfId::from("b"));
    }

    #[test]
    fn receipt() {
        let receipt: SubmissionReceipt = serde_json::from_value(json!({
            "message": "Correct flag!",
            "isCorrect": true,
            "points": 100,
            "submission": { "_id": "s1" }
        }))
        .unwrap();

        assert_eq!(
            receipt,
            SubmissionReceipt {
                message: Some("Correct flag!".to_string()),
                is_correct: Some(true),
                points: Some(100),
            }
        );
    }

    #[test]
    fn leaderboard_envelopes() {
        let global: LeaderboardResponse = serde_json::from_value(json!({
            "leaderboard": [{ "user": { "fullName": "A" }, "totalPoints": 10 }]
        }))
        .unwrap();
        let ranking: LeaderboardResponse = serde_json::from_value(json!({
            "topUsers": [{ "totalPoints": 5 }, { "totalPoints": 3 }]
        }))
        .unwrap();
        let empty: LeaderboardResponse = serde_json::from_value(json!({})).unwrap();

        assert_eq!(global.leaderboard.len(), 1);
        assert_eq!(ranking.leaderboard.len(), 2);
        assert!(empty.leaderboard.is_empty());
    }

    #[test]
    fn submissions_envelope_and_limit() {
        let response: SubmissionsResponse = serde_json::from_value(json!({
            "submissions": [{ "ctf": "c1", "isCorrect": true }],
            "pagination": { "page": 1 }
        }))
        .unwrap();
        assert_eq!(response.submissions.len(), 1);

        assert_eq!(
            serde_json::to_value(LimitParams { limit: Some(10) }).unwrap(),
            json!({ "limit": 10 })
        );
        assert_eq!(
            serde_json::to_value(LimitParams::default()).unwrap(),
            json!({})
        );
    }
}
