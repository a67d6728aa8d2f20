//! Parcel tracking tool

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use postal_assistant_core::{InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema};

use crate::arguments::{self, missing_arguments_prompt};
use crate::postal_api::{field, PostalApiClient};

pub const PACKAGE_NOT_FOUND: &str = "Відправлення не знайдено";
const MISSING_HEADER: &str = "Щоб знайти відправлення потрібно надати:\n";

/// Status code the tracking API uses for unknown numbers
const UNKNOWN_NUMBER_STATUS: &str = "3";

/// Display label and response field, in output order
const FIELDS: &[(&str, &str)] = &[
    ("Статус", "Status"),
    ("Дата створення", "DateCreated"),
    ("Адреса відправки", "WarehouseSender"),
    ("Адреса доставки", "WarehouseRecipient"),
    ("Вага", "DocumentWeight"),
    ("Об'ємна вага", "VolumeWeight"),
    ("Вартість доставки", "DocumentCost"),
    ("Очікувана дата доставки", "ScheduledDeliveryDate"),
    ("Фактична дата доставки", "ActualDeliveryDate"),
];

pub struct PackageInfoTool {
    api: Arc<PostalApiClient>,
    timeout_secs: u64,
}

impl PackageInfoTool {
    pub fn new(api: Arc<PostalApiClient>, timeout_secs: u64) -> Self {
        Self { api, timeout_secs }
    }

    fn render(data: &Value) -> String {
        FIELDS
            .iter()
            .map(|(label, key)| format!("{}: {}", label, field(data, key)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Tool for PackageInfoTool {
    fn name(&self) -> &str {
        "package_info"
    }

    fn description(&self) -> &str {
        "Useful for when you need to get tracking details and other information about the package"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object().property(
                "tracking_number",
                PropertySchema::string(
                    "Unique number assigned to each package, which consists of 14 digits",
                ),
                true,
            ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let Some(number) = arguments::tracking_number(&input, "tracking_number") else {
            return Ok(ToolOutput::text(missing_arguments_prompt(
                MISSING_HEADER,
                &self.schema().input_schema,
                &["tracking_number"],
            )));
        };

        let response = self
            .api
            .call(
                "TrackingDocument",
                "getStatusDocuments",
                json!({"Documents": [{"DocumentNumber": number, "Phone": ""}]}),
            )
            .await?;

        let Some(data) = response
            .first()
            .filter(|d| field(d, "StatusCode") != UNKNOWN_NUMBER_STATUS)
        else {
            tracing::debug!(tracking_number = %number, "Package not found");
            return Ok(ToolOutput::text(PACKAGE_NOT_FOUND));
        };

        Ok(ToolOutput::text(Self::render(data)))
    }

    fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}
