//! In-memory portal used by unit tests.

use super::PortalApi;
use crate::error::{ApiError, ApiResult};
use crate::model::{
    Candidate, LoginRequest, LoginResponse, RoundLevel, RoundLevels, SearchEnvelope,
    StatusUpdate, Task,
};
use async_trait::async_trait;
use std::sync::Mutex;

/// Serves candidates from memory and applies status updates to them, so a re-fetch
/// observes the write.
#[derive(Debug, Default)]
pub(crate) struct FakePortal {
    records: Mutex<Vec<Candidate>>,
    searches: Mutex<Vec<(String, String)>>,
    updates: Mutex<Vec<(String, StatusUpdate)>>,
    fail_search: Mutex<bool>,
    fail_updates: Mutex<bool>,
    unsuccessful: Mutex<bool>,
}

pub(crate) fn candidate(id: &str, regno: &str, levels: RoundLevels) -> Candidate {
    Candidate {
        id: id.into(),
        regno: Some(regno.into()),
        username: Some(format!("user-{id}")),
        email: None,
        personal_email: None,
        mobile: None,
        is_senior_core: false,
        is_junior_core: false,
        applied_domains: vec!["tech".into()],
        tech: levels.tech,
        design: levels.design,
        management: levels.management,
        tech_tasks: vec![Task::default()],
        design_tasks: Vec::new(),
        management_tasks: Vec::new(),
        participated_events: None,
        volunteered_events: None,
    }
}

impl FakePortal {
    pub(crate) fn with(records: Vec<Candidate>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub(crate) fn searches(&self) -> Vec<(String, String)> {
        self.searches.lock().unwrap().clone()
    }

    pub(crate) fn updates(&self) -> Vec<(String, StatusUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    pub(crate) fn fail_search(&self, fail: bool) {
        *self.fail_search.lock().unwrap() = fail;
    }

    pub(crate) fn fail_updates(&self, fail: bool) {
        *self.fail_updates.lock().unwrap() = fail;
    }

    pub(crate) fn unsuccessful(&self, flag: bool) {
        *self.unsuccessful.lock().unwrap() = flag;
    }
}

#[async_trait]
impl PortalApi for FakePortal {
    async fn search(&self, token: &str, reg_no: &str) -> ApiResult<SearchEnvelope> {
        self.searches
            .lock()
            .unwrap()
            .push((token.to_string(), reg_no.to_string()));
        if *self.fail_search.lock().unwrap() {
            return Err(ApiError::Network {
                message: "connection refused".into(),
            });
        }
        let data: Vec<Candidate> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.regno.as_deref() == Some(reg_no))
            .cloned()
            .collect();
        Ok(SearchEnvelope {
            success: !*self.unsuccessful.lock().unwrap(),
            data,
        })
    }

    async fn update_status(
        &self,
        _token: &str,
        candidate_id: &str,
        update: &StatusUpdate,
    ) -> ApiResult<()> {
        self.updates
            .lock()
            .unwrap()
            .push((candidate_id.to_string(), update.clone()));
        if *self.fail_updates.lock().unwrap() {
            return Err(ApiError::Status {
                status: 500,
                message: "boom".into(),
            });
        }
        let level = |v: u8| RoundLevel::new(v).ok_or_else(|| ApiError::Status {
            status: 400,
            message: format!("bad level {v}"),
        });
        let mut records = self.records.lock().unwrap();
        if let Some(c) = records.iter_mut().find(|c| c.id == candidate_id) {
            c.tech = level(update.tech)?;
            c.design = level(update.design)?;
            c.management = level(update.management)?;
        }
        Ok(())
    }

    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        Ok(LoginResponse {
            token: Some(format!("token-for-{}", request.email)),
            email: Some(request.email.clone()),
            ..Default::default()
        })
    }
}
