use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{info, warn};

use feedscope_types::TopicLabel;

use crate::error::HealthError;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetch and parse the health document
pub async fn fetch_health(client: &Client, url: &Url) -> Result<Value, HealthError> {
    let body = client
        .get(url.clone())
        .timeout(HEALTH_TIMEOUT)
        .send()
        .await?
        .text()
        .await?;
    Ok(serde_json::from_str(&body)?)
}

/// Pick the topic label out of a parsed health document
pub fn topic_from_health(health: &Value) -> TopicLabel {
    match health.get("kafka_topic").and_then(Value::as_str) {
        Some(topic) if !topic.is_empty() => TopicLabel::Topic(topic.to_string()),
        _ => TopicLabel::Unknown,
    }
}

/// Label for a raw health response body
pub fn topic_label_from_body(body: &str) -> TopicLabel {
    match serde_json::from_str::<Value>(body) {
        Ok(health) => topic_from_health(&health),
        Err(_) => TopicLabel::Error,
    }
}

/// Look up the topic label. Failures only change the label.
pub async fn load_topic(client: &Client, url: &Url) -> TopicLabel {
    match fetch_health(client, url).await {
        Ok(health) => {
            let label = topic_from_health(&health);
            info!(topic = label.label(), "loaded topic info");
            label
        }
        Err(e) => {
            warn!(error = %e, "error fetching topic info");
            TopicLabel::Error
        }
    }
}
