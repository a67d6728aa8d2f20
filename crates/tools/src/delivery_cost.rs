//! Delivery cost estimate from the configured tariff
//!
//! ```text
//! volumetric = L × W × H / divisor            (cm → kg)
//! billable   = max(weight, volumetric)
//! price      = (base_fee + per_kg × billable + rate × declared) × multiplier
//! ```

use async_trait::async_trait;
use serde_json::Value;

use postal_assistant_config::TariffConfig;
use postal_assistant_core::{InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema};

use crate::arguments::{self, missing_arguments_prompt};

const MISSING_HEADER: &str = "Щоб оцінити вартість відправлення потрібно надати:\n";

/// Validated cost estimate inputs
#[derive(Debug, Clone, PartialEq)]
pub struct Shipment {
    pub package_type: String,
    pub declared_value: f64,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub width_cm: f64,
    pub length_cm: f64,
}

pub struct DeliveryCostTool {
    tariff: TariffConfig,
}

impl DeliveryCostTool {
    pub fn new(tariff: TariffConfig) -> Self {
        Self { tariff }
    }

    pub fn estimate(&self, shipment: &Shipment) -> Option<f64> {
        let multiplier = self.tariff.multiplier(&shipment.package_type)?;
        let volumetric = shipment.length_cm * shipment.width_cm * shipment.height_cm
            / self.tariff.volumetric_divisor;
        let billable = shipment.weight_kg.max(volumetric);

        Some(
            (self.tariff.base_fee
                + self.tariff.per_kg * billable
                + self.tariff.declared_value_rate * shipment.declared_value)
                * multiplier,
        )
    }

    fn parse(&self, input: &Value) -> Result<Shipment, Vec<&'static str>> {
        let package_type =
            arguments::one_of(input, "package_type", &self.tariff.package_type_names());
        let cost = arguments::positive_number(input, "cost");
        let weight = arguments::positive_number(input, "weight");
        let height = arguments::positive_number(input, "height");
        let width = arguments::positive_number(input, "width");
        let length = arguments::positive_number(input, "length");

        match (package_type, cost, weight, height, width, length) {
            (Some(package_type), Some(cost), Some(weight), Some(height), Some(width), Some(length)) => {
                Ok(Shipment {
                    package_type,
                    declared_value: cost,
                    weight_kg: weight,
                    height_cm: height,
                    width_cm: width,
                    length_cm: length,
                })
            },
            (package_type, cost, weight, height, width, length) => {
                let mut missing = Vec::new();
                for (name, present) in [
                    ("package_type", package_type.is_some()),
                    ("cost", cost.is_some()),
                    ("weight", weight.is_some()),
                    ("height", height.is_some()),
                    ("width", width.is_some()),
                    ("length", length.is_some()),
                ] {
                    if !present {
                        missing.push(name);
                    }
                }
                Err(missing)
            },
        }
    }
}

#[async_trait]
impl Tool for DeliveryCostTool {
    fn name(&self) -> &str {
        "calculate_delivery_cost"
    }

    fn description(&self) -> &str {
        "Useful for when you need to estimate the delivery cost"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property(
                    "package_type",
                    PropertySchema::enum_type("Вид відправлення", self.tariff.package_type_names()),
                    true,
                )
                .property(
                    "cost",
                    PropertySchema::number("Оголошена вартість відправлення, грн"),
                    true,
                )
                .property("weight", PropertySchema::number("Вага відправлення, кг"), true)
                .property(
                    "height",
                    PropertySchema::number("Висота відправлення, сантиметри"),
                    true,
                )
                .property(
                    "width",
                    PropertySchema::number("Ширина відправлення, сантиметри"),
                    true,
                )
                .property(
                    "length",
                    PropertySchema::number("Довжина відправлення, сантиметри"),
                    true,
                ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let shipment = match self.parse(&input) {
            Ok(shipment) => shipment,
            Err(missing) => {
                return Ok(ToolOutput::text(missing_arguments_prompt(
                    MISSING_HEADER,
                    &self.schema().input_schema,
                    &missing,
                )))
            },
        };

        let price = self.estimate(&shipment).ok_or_else(|| {
            ToolError::internal(format!("No tariff for package type {}", shipment.package_type))
        })?;

        tracing::debug!(package_type = %shipment.package_type, price, "Estimated delivery cost");
        Ok(ToolOutput::text(format!(
            "Орієнтовна вартість перевезення: {:.2} грн",
            price
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_input() -> Value {
        json!({
            "package_type": "Вантажі",
            "cost": 1000,
            "weight": 2,
            "height": 20,
            "width": 20,
            "length": 20
        })
    }

    #[tokio::test]
    async fn test_estimate_uses_actual_weight() {
        let tool = DeliveryCostTool::new(TariffConfig::default());
        let output = tool.execute(full_input()).await.unwrap();

        // volumetric 8000/4000 = 2 kg, billable 2 kg: 60 + 24 + 5
        assert_eq!(output.as_text(), "Орієнтовна вартість перевезення: 89.00 грн");
    }

    #[tokio::test]
    async fn test_estimate_uses_volumetric_weight() {
        let tool = DeliveryCostTool::new(TariffConfig::default());
        let mut input = full_input();
        input["package_type"] = json!("Палети");
        input["weight"] = json!(1);
        input["height"] = json!(100);
        input["width"] = json!(40);
        input["length"] = json!(50);

        // volumetric 200000/4000 = 50 kg: (60 + 600 + 5) * 2.5
        let output = tool.execute(input).await.unwrap();
        assert_eq!(output.as_text(), "Орієнтовна вартість перевезення: 1662.50 грн");
    }

    #[tokio::test]
    async fn test_single_missing_argument() {
        let tool = DeliveryCostTool::new(TariffConfig::default());
        let mut input = full_input();
        input.as_object_mut().unwrap().remove("weight");

        let output = tool.execute(input).await.unwrap();
        assert_eq!(
            output.as_text(),
            "Щоб оцінити вартість відправлення потрібно надати:\n1. Вага відправлення, кг"
        );
        assert!(!output.is_error);
    }

    #[tokio::test]
    async fn test_zero_and_unknown_type_are_missing() {
        let tool = DeliveryCostTool::new(TariffConfig::default());
        let mut input = full_input();
        input["package_type"] = json!("Коробка");
        input["length"] = json!(0);

        let output = tool.execute(input).await.unwrap();
        assert_eq!(
            output.as_text(),
            "Щоб оцінити вартість відправлення потрібно надати:\n\
             1. Вид відправлення\n\
             2. Довжина відправлення, сантиметри"
        );
    }

    #[test]
    fn test_schema_enum() {
        let tool = DeliveryCostTool::new(TariffConfig::default());
        let json = tool.schema().input_schema.to_json();
        assert_eq!(json["properties"]["package_type"]["enum"][3], "Палети");
        assert_eq!(json["required"].as_array().unwrap().len(), 6);
    }
}
