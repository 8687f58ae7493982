//! Cloud Scheduler REST client

use super::{BUILD_REQUEST_TOPIC, JobScheduler};
use crate::error::{SchedulerError, SchedulerResult};
use crate::project::job_id;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloud Scheduler location and target settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudSchedulerConfig {
    /// API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Cloud project owning the jobs and the topic
    #[serde(default)]
    pub project_id: String,

    /// Region the jobs live in
    #[serde(default = "default_location")]
    pub location: String,

    /// Pub/Sub topic name, without the `projects/<id>/topics/` prefix
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Bearer token sent with every request
    #[serde(default, skip_serializing)]
    pub auth_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for CloudSchedulerConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            project_id: String::new(),
            location: default_location(),
            topic: default_topic(),
            auth_token: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "https://cloudscheduler.googleapis.com/v1".to_string()
}

fn default_location() -> String {
    "us-central1".to_string()
}

fn default_topic() -> String {
    BUILD_REQUEST_TOPIC.to_string()
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Job<'a> {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pubsub_target: Option<PubsubTarget>,
    schedule: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PubsubTarget {
    topic_name: String,
    /// Base64 of the message payload
    data: String,
}

/// Client for the Cloud Scheduler jobs API
#[derive(Debug, Clone)]
pub struct CloudSchedulerClient {
    client: Client,
    base_url: String,
    parent: String,
    topic_name: String,
    auth_token: Option<String>,
}

impl CloudSchedulerClient {
    pub fn new(config: &CloudSchedulerConfig) -> SchedulerResult<Self> {
        if config.project_id.is_empty() {
            return Err(SchedulerError::Config("project_id is not set".into()));
        }
        if config.location.is_empty() {
            return Err(SchedulerError::Config("location is not set".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            parent: format!(
                "projects/{}/locations/{}",
                config.project_id, config.location
            ),
            topic_name: format!("projects/{}/topics/{}", config.project_id, config.topic),
            auth_token: config.auth_token.clone(),
        })
    }

    /// Fully qualified job name for a project
    pub fn job_name(&self, project_name: &str) -> String {
        format!("{}/jobs/{}", self.parent, job_id(project_name))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, job_name: &str) -> SchedulerResult<()> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else if status == StatusCode::NOT_FOUND {
            Err(SchedulerError::NotFound(job_name.to_string()))
        } else if status == StatusCode::CONFLICT {
            Err(SchedulerError::AlreadyExists(job_name.to_string()))
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(SchedulerError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl JobScheduler for CloudSchedulerClient {
    async fn create_job(&self, project_name: &str, schedule: &str) -> SchedulerResult<()> {
        let job = Job {
            name: self.job_name(project_name),
            pubsub_target: Some(PubsubTarget {
                topic_name: self.topic_name.clone(),
                data: STANDARD.encode(project_name.as_bytes()),
            }),
            schedule,
        };
        let url = format!("{}/{}/jobs", self.base_url, self.parent);
        self.send(self.client.post(&url).json(&job), &job.name).await
    }

    async fn update_job(&self, project_name: &str, schedule: &str) -> SchedulerResult<()> {
        let job = Job {
            name: self.job_name(project_name),
            pubsub_target: None,
            schedule,
        };
        let url = format!("{}/{}", self.base_url, job.name);
        let request = self
            .client
            .patch(&url)
            .query(&[("updateMask", "schedule")])
            .json(&job);
        self.send(request, &job.name).await
    }

    async fn delete_job(&self, project_name: &str) -> SchedulerResult<()> {
        let name = self.job_name(project_name);
        let url = format!("{}/{}", self.base_url, name);
        self.send(self.client.delete(&url), &name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CloudSchedulerClient {
        CloudSchedulerClient::new(&CloudSchedulerConfig {
            api_url: server.uri(),
            project_id: "test-project".into(),
            auth_token: Some("sched-token".into()),
            ..CloudSchedulerConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_requires_project_id() {
        let result = CloudSchedulerClient::new(&CloudSchedulerConfig::default());
        assert!(matches!(result, Err(SchedulerError::Config(_))));
    }

    #[test]
    fn test_job_name() {
        let client = CloudSchedulerClient::new(&CloudSchedulerConfig {
            project_id: "oss-fuzz".into(),
            ..CloudSchedulerConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.job_name("libpng"),
            "projects/oss-fuzz/locations/us-central1/jobs/libpng-scheduler"
        );
    }

    #[tokio::test]
    async fn test_create_job_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/test-project/locations/us-central1/jobs"))
            .and(header("authorization", "Bearer sched-token"))
            .and(body_json(serde_json::json!({
                "name": "projects/test-project/locations/us-central1/jobs/libpng-scheduler",
                "pubsubTarget": {
                    "topicName": "projects/test-project/topics/request-build",
                    "data": "bGlicG5n"
                },
                "schedule": "0 6 * * *"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .create_job("libpng", "0 6 * * *")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_job_uses_schedule_mask() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(
                "/projects/test-project/locations/us-central1/jobs/libpng-scheduler",
            ))
            .and(query_param("updateMask", "schedule"))
            .and(body_json(serde_json::json!({
                "name": "projects/test-project/locations/us-central1/jobs/libpng-scheduler",
                "schedule": "0 6,18 * * *"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .update_job("libpng", "0 6,18 * * *")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(
                "/projects/test-project/locations/us-central1/jobs/gone-scheduler",
            ))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/projects/test-project/locations/us-central1/jobs"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.delete_job("gone").await,
            Err(SchedulerError::NotFound(_))
        ));
        assert!(matches!(
            client.create_job("dup", "0 6 * * *").await,
            Err(SchedulerError::AlreadyExists(_))
        ));
        assert!(matches!(
            client.update_job("any", "0 6 * * *").await,
            Err(SchedulerError::Api { status: 503, .. })
        ));
    }
}
