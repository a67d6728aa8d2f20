//! Delivery date estimate between two cities

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use postal_assistant_core::{InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema};

use crate::arguments::{self, missing_arguments_prompt};
use crate::postal_api::{field, PostalApiClient};

pub const CITY_NOT_FOUND: &str = "Місто не знайдено";
pub const CHECK_INPUT: &str = "Перевірте правильність введення даних";
const MISSING_HEADER: &str = "Щоб оцінити час доставки потрібно надати:\n";
const SERVICE_TYPE: &str = "WarehouseWarehouse";

pub struct DeliveryDateTool {
    api: Arc<PostalApiClient>,
    timeout_secs: u64,
}

impl DeliveryDateTool {
    pub fn new(api: Arc<PostalApiClient>, timeout_secs: u64) -> Self {
        Self { api, timeout_secs }
    }
}

#[async_trait]
impl Tool for DeliveryDateTool {
    fn name(&self) -> &str {
        "estimate_delivery_date"
    }

    fn description(&self) -> &str {
        "Useful for when you need to estimate package delivery date"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property(
                    "date",
                    PropertySchema::string("Дата відправлення у форматі дд.мм.рррр"),
                    true,
                )
                .property(
                    "city_sender",
                    PropertySchema::string("Назва міста відправника"),
                    true,
                )
                .property(
                    "city_recipient",
                    PropertySchema::string("Назва міста отримувача"),
                    true,
                ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let date = arguments::date(&input, "date");
        let sender = arguments::text(&input, "city_sender");
        let recipient = arguments::text(&input, "city_recipient");

        let (Some(date), Some(sender), Some(recipient)) = (&date, &sender, &recipient) else {
            let missing: Vec<&str> = [
                ("date", date.is_none()),
                ("city_sender", sender.is_none()),
                ("city_recipient", recipient.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            return Ok(ToolOutput::text(missing_arguments_prompt(
                MISSING_HEADER,
                &self.schema().input_schema,
                &missing,
            )));
        };

        let (sender_ref, recipient_ref) = tokio::try_join!(
            self.api.find_settlement(sender),
            self.api.find_settlement(recipient)
        )?;
        let (Some(sender_ref), Some(recipient_ref)) = (sender_ref, recipient_ref) else {
            tracing::debug!(sender = %sender, recipient = %recipient, "City not found");
            return Ok(ToolOutput::text(CITY_NOT_FOUND));
        };

        let response = self
            .api
            .call(
                "InternetDocument",
                "getDocumentDeliveryDate",
                json!({
                    "DateTime": date,
                    "ServiceType": SERVICE_TYPE,
                    "CitySender": sender_ref,
                    "CityRecipient": recipient_ref,
                }),
            )
            .await?;

        let Some(delivery) = response.first().and_then(|d| d.get("DeliveryDate")) else {
            return Ok(ToolOutput::text(CHECK_INPUT));
        };

        Ok(ToolOutput::text(format!(
            "Дата доставки: {}\nЧасова зона: {}",
            field(delivery, "date"),
            field(delivery, "timezone")
        )))
    }

    fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}
