//! Nova Poshta JSON API client
//!
//! Every call is a POST of `{apiKey, modelName, calledMethod, methodProperties}`
//! answered by `{success, data, errors}`. Calls are never retried.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use postal_assistant_config::PostalApiConfig;
use postal_assistant_core::ToolError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostalRequest<'a> {
    api_key: &'a str,
    model_name: &'a str,
    called_method: &'a str,
    method_properties: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostalResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub errors: Vec<Value>,
}

impl PostalResponse {
    /// First data item of a successful response
    pub fn first(&self) -> Option<&Value> {
        if self.success {
            self.data.first()
        } else {
            None
        }
    }
}

pub struct PostalApiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl PostalApiClient {
    pub fn new(config: &PostalApiConfig) -> Result<Self, ToolError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ToolError::internal(format!("Failed to create HTTP client: {}", e)))?;

        if config.api_key.is_empty() {
            tracing::warn!("Postal API key is not set, requests may be rejected");
        }

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub async fn call(
        &self,
        model_name: &str,
        called_method: &str,
        method_properties: Value,
    ) -> Result<PostalResponse, ToolError> {
        let request = PostalRequest {
            api_key: &self.api_key,
            model_name,
            called_method,
            method_properties,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ToolError::upstream(format!("Postal API request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ToolError::upstream(format!(
                "Postal API returned HTTP {}",
                response.status()
            )));
        }

        let body: PostalResponse = response
            .json()
            .await
            .map_err(|e| ToolError::upstream(format!("Invalid postal API response: {}", e)))?;

        if !body.success {
            tracing::debug!(
                model = model_name,
                method = called_method,
                errors = ?body.errors,
                "Postal API reported failure"
            );
        }
        Ok(body)
    }

    /// Settlement reference for a city name, `None` if not found
    pub async fn find_settlement(&self, city: &str) -> Result<Option<String>, ToolError> {
        let response = self
            .call(
                "Address",
                "searchSettlements",
                json!({"CityName": city, "Limit": "1", "Page": "1"}),
            )
            .await?;

        Ok(response
            .first()
            .and_then(|d| d.get("Addresses"))
            .and_then(|a| a.get(0))
            .and_then(|a| a.get("Ref"))
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty())
            .map(str::to_string))
    }
}

/// Field value rendered for display; missing and null become empty
pub fn field(data: &Value, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: String) -> PostalApiConfig {
        PostalApiConfig {
            endpoint,
            api_key: "np-key".to_string(),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_request_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "apiKey": "np-key",
                "modelName": "Address",
                "calledMethod": "searchSettlements",
                "methodProperties": {"CityName": "Львів", "Limit": "1", "Page": "1"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"Addresses": [{"Ref": "city-ref-lviv"}]}],
                "errors": []
            })))
            .mount(&server)
            .await;

        let client = PostalApiClient::new(&config(server.uri())).unwrap();
        let reference = client.find_settlement("Львів").await.unwrap();
        assert_eq!(reference.as_deref(), Some("city-ref-lviv"));
    }

    #[tokio::test]
    async fn test_settlement_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"TotalCount": 0, "Addresses": []}],
                "errors": []
            })))
            .mount(&server)
            .await;

        let client = PostalApiClient::new(&config(server.uri())).unwrap();
        assert_eq!(client.find_settlement("Атлантида").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_http_error_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = PostalApiClient::new(&config(server.uri())).unwrap();
        let err = client.call("Address", "searchSettlements", json!({})).await.unwrap_err();
        assert_eq!(err.code, postal_assistant_core::ErrorCode::Upstream);
    }

    #[test]
    fn test_field_rendering() {
        let data = json!({"Weight": 1.5, "Status": "Отримано", "Empty": null});
        assert_eq!(field(&data, "Weight"), "1.5");
        assert_eq!(field(&data, "Status"), "Отримано");
        assert_eq!(field(&data, "Empty"), "");
        assert_eq!(field(&data, "Missing"), "");
    }
}
