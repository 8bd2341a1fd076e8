//! Dashboard backend as the task store.
//!
//! `GET {base}/tasks/tasks` lists every task; `PUT {base}/tasks/tasks/{id}/priority`
//! stores one code. Both take `Authorization: Bearer <token>`.

use anyhow::{bail, Context, Result};
use matrix_core::{rank_tasks, PriorityCode, RecomputeReport, Scope, Task};
use matrix_ingest::{group_by_scope, normalize_all, RawTask, StatusEnvelope, TaskEnvelope};
use reqwest::header::AUTHORIZATION;
use serde::Serialize;

pub struct RemoteTaskStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Serialize)]
struct PriorityUpdate {
    priority: u32,
}

impl RemoteTaskStore {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn tasks_url(&self) -> String {
        format!("{}/tasks/tasks", self.base_url)
    }

    fn priority_url(&self, task_id: &str) -> String {
        format!("{}/tasks/tasks/{}/priority", self.base_url, task_id)
    }

    pub async fn fetch_tasks(&self) -> Result<Vec<RawTask>> {
        let resp = self
            .client
            .get(self.tasks_url())
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await
            .context("list tasks request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("list tasks failed: {status} {txt}");
        }

        let envelope: TaskEnvelope = resp.json().await.context("parse task list")?;
        if envelope.is_failure() {
            bail!(
                "list tasks failed: {}",
                envelope.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
        Ok(envelope.tasks)
    }

    pub async fn update_priority(&self, task_id: &str, code: PriorityCode) -> Result<()> {
        let resp = self
            .client
            .put(self.priority_url(task_id))
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&PriorityUpdate { priority: code.get() })
            .send()
            .await
            .context("update priority request")?;

        let status = resp.status();
        let txt = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            bail!("{status} {txt}");
        }
        // Some deployments answer 200 with `{"success": false}`.
        if let Ok(ack) = serde_json::from_str::<StatusEnvelope>(&txt) {
            if let Some(reason) = ack.failure_reason() {
                bail!(reason);
            }
        }
        Ok(())
    }

    /// Fetch the task list once, then rank and write back each scope in turn.
    ///
    /// Only a failed listing is an error. Writes go out one at a time in
    /// listing order; a failed write is recorded and the pass continues.
    pub async fn recompute_scopes(&self, scopes: &[Scope], timezone: &str) -> Result<Vec<RecomputeReport>> {
        let raws = self.fetch_tasks().await?;
        let mut groups = group_by_scope(normalize_all(&raws, timezone));

        let mut reports = Vec::with_capacity(scopes.len());
        for &scope in scopes {
            let tasks = groups.remove(&scope).unwrap_or_default();
            reports.push(self.persist_ranked(scope, rank_tasks(tasks)).await);
        }
        Ok(reports)
    }

    async fn persist_ranked(&self, scope: Scope, ranked: Vec<Task>) -> RecomputeReport {
        let mut report = RecomputeReport::new(
            scope,
            ranked
                .iter()
                .filter_map(|t| t.priority_code.map(|c| (t.id.clone(), c)))
                .collect(),
        );

        for task in &ranked {
            let Some(code) = task.priority_code else { continue };
            if let Err(e) = self.update_priority(&task.id, code).await {
                tracing::warn!(task_id = %task.id, %code, error = %e, "failed to persist priority code");
                report.record_failure(&task.id, format!("{e:#}"));
            }
        }

        tracing::info!(
            %scope,
            persisted = report.persisted_count(),
            failed = report.failures.len(),
            "remote recompute complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    type Log = Arc<Mutex<Vec<String>>>;
    type Responder = fn(&str) -> (&'static str, String);

    #[test]
    fn urls_are_built_from_trimmed_base() {
        let store = RemoteTaskStore::new("https://tasks.example.com/api/", "tok");
        assert_eq!(store.tasks_url(), "https://tasks.example.com/api/tasks/tasks");
        assert_eq!(
            store.priority_url("65f0c0ffee"),
            "https://tasks.example.com/api/tasks/tasks/65f0c0ffee/priority"
        );
    }

    /// One request per connection: returns the request line and body.
    async fn read_request(sock: &mut TcpStream) -> (String, String) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = sock.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let len = head
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < header_end + len {
            let n = sock.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before body");
            buf.extend_from_slice(&chunk[..n]);
        }
        let line = head.lines().next().unwrap_or_default().to_string();
        let body = String::from_utf8_lossy(&buf[header_end..header_end + len]).to_string();
        (line, body)
    }

    /// Minimal HTTP/1.1 backend on a random local port. Every request line
    /// (plus body, when present) is appended to the returned log.
    async fn spawn_backend(respond: Responder) -> (String, Log) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/api", listener.local_addr().unwrap());
        let log: Log = Arc::default();
        let seen = log.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut sock, _)) = listener.accept().await else { return };
                let (line, body) = read_request(&mut sock).await;
                seen.lock().unwrap().push(format!("{line} {body}").trim_end().to_string());
                let (status, reply) = respond(&line);
                let resp = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
                    reply.len()
                );
                let _ = sock.write_all(resp.as_bytes()).await;
                let _ = sock.shutdown().await;
            }
        });
        (base, log)
    }

    fn store_for(base: &str) -> RemoteTaskStore {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        RemoteTaskStore::with_client(client, base, "tok")
    }

    fn dashboard(line: &str) -> (&'static str, String) {
        if line.starts_with("GET /api/tasks/tasks ") {
            let tasks = json!({"success": true, "tasks": [
                {"_id": "a", "taskName": "ship", "timeframe": "day", "quadrant": "urgent",
                 "endDate": "2026-03-02T10:00:00Z", "numberOfUnits": 8, "completedUnits": 0},
                {"_id": "b", "taskName": "review", "timeframe": "day", "quadrant": "medium",
                 "endDate": "2026-03-04T09:00:00Z", "numberOfUnits": 2, "completedUnits": 0},
                {"_id": "c", "taskName": "someday", "timeframe": "day"},
                {"_id": "w", "taskName": "plan", "timeframe": "week", "quadrant": "high"}
            ]});
            return ("200 OK", tasks.to_string());
        }
        if line.starts_with("PUT /api/tasks/tasks/b/priority ") {
            return ("200 OK", json!({"success": false, "error": "task locked"}).to_string());
        }
        if line.starts_with("PUT /api/tasks/tasks/w/priority ") {
            return ("500 Internal Server Error", "boom".to_string());
        }
        ("200 OK", json!({"success": true}).to_string())
    }

    #[tokio::test]
    async fn failed_writes_are_reported_and_the_pass_continues() {
        let (base, log) = spawn_backend(dashboard).await;
        let store = store_for(&base);

        let reports = store.recompute_scopes(&Scope::ALL, "UTC").await.unwrap();
        assert_eq!(reports.len(), 3);

        let day = &reports[0];
        assert_eq!(day.scope, Scope::Day);
        assert_eq!(day.codes.len(), 3);
        assert_eq!(day.codes["a"].get(), 433);
        assert_eq!(day.codes["b"].get(), 222);
        assert_eq!(day.codes["c"].get(), 11);
        assert_eq!(day.failures.len(), 1);
        assert_eq!(day.failures[0].task_id, "b");
        assert_eq!(day.failures[0].reason, "task locked");
        assert_eq!(day.persisted_count(), 2);

        let week = &reports[1];
        assert_eq!(week.codes["w"].get(), 311);
        assert_eq!(week.failures.len(), 1);
        assert_eq!(week.failures[0].task_id, "w");
        assert!(week.failures[0].reason.starts_with("500"), "{}", week.failures[0].reason);

        let month = &reports[2];
        assert!(month.codes.is_empty() && month.is_complete());

        let log = log.lock().unwrap().clone();
        assert_eq!(
            log,
            vec![
                "GET /api/tasks/tasks HTTP/1.1".to_string(),
                r#"PUT /api/tasks/tasks/a/priority HTTP/1.1 {"priority":433}"#.to_string(),
                r#"PUT /api/tasks/tasks/b/priority HTTP/1.1 {"priority":222}"#.to_string(),
                r#"PUT /api/tasks/tasks/c/priority HTTP/1.1 {"priority":11}"#.to_string(),
                r#"PUT /api/tasks/tasks/w/priority HTTP/1.1 {"priority":311}"#.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn failed_listing_is_an_error_and_writes_nothing() {
        fn unauthorized(_: &str) -> (&'static str, String) {
            ("401 Unauthorized", json!({"success": false, "error": "bad token"}).to_string())
        }
        let (base, log) = spawn_backend(unauthorized).await;

        let err = store_for(&base).recompute_scopes(&[Scope::Day], "UTC").await.unwrap_err();
        assert!(err.to_string().contains("401"), "{err:#}");
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unsuccessful_list_envelope_is_an_error() {
        fn refused(_: &str) -> (&'static str, String) {
            ("200 OK", json!({"success": false, "error": "session expired"}).to_string())
        }
        let (base, _log) = spawn_backend(refused).await;

        let err = store_for(&base).recompute_scopes(&[Scope::Day], "UTC").await.unwrap_err();
        assert!(err.to_string().contains("session expired"), "{err:#}");
    }
}
