use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
pub enum Unit {
    #[serde(rename = "%")]
    Percent,
    #[serde(rename = "$")]
    Currency,
    #[serde(rename = "x")]
    Multiple,
    #[serde(rename = " days")]
    Days,
    #[serde(rename = "")]
    Dimensionless,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Percent => "%",
            Unit::Currency => "$",
            Unit::Multiple => "x",
            Unit::Days => " days",
            Unit::Dimensionless => "",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum KpiCategory {
    Profitability,
    Growth,
    Financial,
    Marketing,
    Retention,
    Sales,
    Operations,
    Manufacturing,
    Quality,
    Risk,
    Compliance,
    Healthcare,
    Satisfaction,
    Ecommerce,
}

impl KpiCategory {
    /// Weight of a category in the weighted health score.
    pub fn importance(&self) -> f64 {
        match self {
            KpiCategory::Profitability | KpiCategory::Growth => 3.0,
            KpiCategory::Financial => 2.5,
            KpiCategory::Marketing
            | KpiCategory::Retention
            | KpiCategory::Compliance
            | KpiCategory::Risk => 2.0,
            KpiCategory::Operations | KpiCategory::Quality | KpiCategory::Satisfaction => 1.5,
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KpiDefinition {
    pub key: String,
    pub name: String,
    pub description: String,
    pub unit: Unit,
    pub category: KpiCategory,
    pub higher_is_better: bool,
    /// Extra spellings used when suggesting column mappings (e.g. "cac").
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl KpiDefinition {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        unit: Unit,
        category: KpiCategory,
        higher_is_better: bool,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
            unit,
            category,
            higher_is_better,
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }
}

/// Immutable set of KPI definitions, in display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiRegistry {
    definitions: Vec<KpiDefinition>,
}

impl KpiRegistry {
    /// Builds a registry. Later definitions reusing an existing key are ignored.
    pub fn new(definitions: Vec<KpiDefinition>) -> Self {
        let mut unique: Vec<KpiDefinition> = Vec::with_capacity(definitions.len());
        for definition in definitions {
            if unique.iter().any(|d| d.key == definition.key) {
                warn!("Duplicate KPI key '{}' ignored", definition.key);
                continue;
            }
            unique.push(definition);
        }
        Self {
            definitions: unique,
        }
    }

    pub fn get(&self, key: &str) -> Option<&KpiDefinition> {
        self.definitions.iter().find(|d| d.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KpiDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn standard() -> Self {
        use KpiCategory::*;
        use Unit::*;

        Self::new(vec![
            KpiDefinition::new(
                "gross_margin",
                "Gross Margin",
                "Revenue minus cost of goods sold, expressed as percentage",
                Percent,
                Profitability,
                true,
            )
            .with_aliases(&["gm", "gross margin pct", "margin"]),
            KpiDefinition::new(
                "cac",
                "Customer Acquisition Cost",
                "Average cost to acquire one new customer",
                Currency,
                Marketing,
                false,
            )
            .with_aliases(&["acquisition cost", "cost per acquisition", "cpa"]),
            KpiDefinition::new(
                "ltv",
                "Customer Lifetime Value",
                "Total revenue expected from a customer over their lifetime",
                Currency,
                Marketing,
                true,
            )
            .with_aliases(&["clv", "lifetime value", "cltv"]),
            KpiDefinition::new(
                "churn_rate",
                "Churn Rate",
                "Percentage of customers who stop using service in a period",
                Percent,
                Retention,
                false,
            )
            .with_aliases(&["churn", "customer churn"]),
            KpiDefinition::new(
                "arr_growth",
                "ARR Growth",
                "Annual recurring revenue growth rate",
                Percent,
                Growth,
                true,
            )
            .with_aliases(&["arr growth rate", "revenue growth"]),
            KpiDefinition::new(
                "burn_rate",
                "Burn Rate",
                "Monthly cash consumption rate",
                Currency,
                Financial,
                false,
            )
            .with_aliases(&["monthly burn", "cash burn"]),
            KpiDefinition::new(
                "inventory_turnover",
                "Inventory Turnover",
                "How many times inventory is sold and replaced over a period",
                Multiple,
                Operations,
                true,
            )
            .with_aliases(&["inventory turns", "stock turnover"]),
            KpiDefinition::new(
                "conversion_rate",
                "Conversion Rate",
                "Percentage of visitors who complete desired action",
                Percent,
                Marketing,
                true,
            )
            .with_aliases(&["conversion", "cvr"]),
            KpiDefinition::new(
                "aov",
                "Average Order Value",
                "Average dollar amount spent per order",
                Currency,
                Sales,
                true,
            )
            .with_aliases(&["avg order value", "basket size"]),
            KpiDefinition::new(
                "return_rate",
                "Return Rate",
                "Percentage of products returned by customers",
                Percent,
                Operations,
                false,
            )
            .with_aliases(&["returns", "product returns"]),
            KpiDefinition::new(
                "oee",
                "Overall Equipment Effectiveness",
                "Measure of manufacturing productivity",
                Percent,
                Manufacturing,
                true,
            )
            .with_aliases(&["equipment effectiveness"]),
            KpiDefinition::new(
                "defect_rate",
                "Defect Rate",
                "Percentage of products with defects",
                Percent,
                Quality,
                false,
            )
            .with_aliases(&["defects", "defect pct"]),
            KpiDefinition::new(
                "lead_time",
                "Lead Time",
                "Time between order and delivery",
                Days,
                Operations,
                false,
            )
            .with_aliases(&["lead time days", "delivery time"]),
            KpiDefinition::new(
                "capacity_utilization",
                "Capacity Utilization",
                "Percentage of available capacity being used",
                Percent,
                Operations,
                true,
            )
            .with_aliases(&["utilization", "capacity"]),
            KpiDefinition::new(
                "transaction_volume",
                "Transaction Volume",
                "Total value of transactions processed",
                Currency,
                Financial,
                true,
            )
            .with_aliases(&["tpv", "payment volume"]),
            KpiDefinition::new(
                "fraud_rate",
                "Fraud Rate",
                "Percentage of transactions flagged as fraudulent",
                Percent,
                Risk,
                false,
            )
            .with_aliases(&["fraud"]),
            KpiDefinition::new(
                "regulatory_capital",
                "Regulatory Capital",
                "Capital ratio required by regulators",
                Percent,
                Compliance,
                true,
            )
            .with_aliases(&["capital ratio", "tier 1 capital"]),
            KpiDefinition::new(
                "patient_acquisition",
                "Patient Acquisition Cost",
                "Cost to acquire one new patient",
                Currency,
                Healthcare,
                false,
            )
            .with_aliases(&["patient cac"]),
            KpiDefinition::new(
                "patient_retention",
                "Patient Retention",
                "Percentage of patients retained over a period",
                Percent,
                Healthcare,
                true,
            )
            .with_aliases(&["patient retention rate"]),
            KpiDefinition::new(
                "compliance_score",
                "Compliance Score",
                "Overall regulatory compliance rating",
                Percent,
                Compliance,
                true,
            )
            .with_aliases(&["compliance"]),
            KpiDefinition::new(
                "readmission_rate",
                "Readmission Rate",
                "Percentage of patients readmitted within 30 days",
                Percent,
                Healthcare,
                false,
            )
            .with_aliases(&["readmissions", "30 day readmission"]),
            KpiDefinition::new(
                "nps",
                "Net Promoter Score",
                "Customer satisfaction and loyalty metric",
                Dimensionless,
                Satisfaction,
                true,
            )
            .with_aliases(&["promoter score"]),
            KpiDefinition::new(
                "cart_abandonment",
                "Cart Abandonment Rate",
                "Percentage of shopping carts abandoned before checkout",
                Percent,
                Ecommerce,
                false,
            )
            .with_aliases(&["cart abandonment", "abandonment rate"]),
        ])
    }
}

impl Default for KpiRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
