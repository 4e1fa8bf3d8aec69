use crate::comparison::{ComparisonRecord, Status};
use crate::insights::templates::{fill, InsightTemplates, StrategicTemplate};
use crate::schema::{sort_by_priority, Insight, InsightType, Priority};
use log::debug;

const STRATEGIC_MAGNITUDE: i64 = 20;
const LTV_CAC_FLOOR: f64 = 3.0;
const LTV_CAC_CEILING: f64 = 5.0;

/// Deterministic insight generator. Always available; used as the LLM fallback.
pub struct RuleBasedGenerator<'a> {
    templates: &'a InsightTemplates,
}

impl<'a> RuleBasedGenerator<'a> {
    pub fn new(templates: &'a InsightTemplates) -> Self {
        Self { templates }
    }

    pub fn generate(&self, records: &[ComparisonRecord], industry_name: &str) -> Vec<Insight> {
        let mut insights: Vec<Insight> = records
            .iter()
            .map(|record| self.kpi_insight(record, industry_name))
            .collect();

        let strategic = self.strategic_insights(records, industry_name);
        debug!(
            "Rule-based generator: {} KPI insights, {} strategic",
            insights.len(),
            strategic.len()
        );
        insights.extend(strategic);

        sort_by_priority(&mut insights);
        insights
    }

    fn kpi_insight(&self, record: &ComparisonRecord, industry_name: &str) -> Insight {
        let priority = Priority::from_magnitude(record.percent_difference.abs());
        let pct = record.percent_difference.abs().to_string();
        let vars = [
            ("pct", pct.as_str()),
            ("industry", industry_name),
            ("name", record.name.as_str()),
        ];

        if let Some(pair) = self.templates.curated(&record.kpi) {
            let template = match record.status {
                Status::Negative => &pair.negative,
                Status::Positive | Status::Neutral => &pair.positive,
            };
            return Insight::new(
                record.name.clone(),
                template.insight_type,
                priority,
                fill(&template.message, &vars),
                template.recommendations.clone(),
            );
        }

        let insight_type = if record.status == Status::Negative {
            InsightType::Weakness
        } else {
            InsightType::Strength
        };
        let direction = match record.percent_difference {
            d if d > 0 => "above",
            d if d < 0 => "below",
            _ => "in line with",
        };
        let message = if record.percent_difference == 0 {
            fill(&self.templates.generic_neutral_message, &vars)
        } else {
            let mut with_direction = vars.to_vec();
            with_direction.push(("direction", direction));
            fill(&self.templates.generic_message, &with_direction)
        };
        let recommendations = self
            .templates
            .generic_recommendations
            .iter()
            .map(|r| fill(r, &vars))
            .collect();

        Insight::new(
            record.name.clone(),
            insight_type,
            priority,
            message,
            recommendations,
        )
    }

    fn strategic_insights(&self, records: &[ComparisonRecord], industry_name: &str) -> Vec<Insight> {
        let strategic = &self.templates.strategic;
        let industry = [("industry", industry_name)];
        let find = |key: &str| records.iter().find(|r| r.kpi == key);
        let has_status =
            |key: &str, status: Status| find(key).map(|r| r.status == status).unwrap_or(false);

        let mut insights = Vec::new();

        let strong_positives = records
            .iter()
            .filter(|r| r.status == Status::Positive && r.percent_difference.abs() >= STRATEGIC_MAGNITUDE)
            .count();
        let weak_negatives = records
            .iter()
            .filter(|r| r.status == Status::Negative && r.percent_difference.abs() >= STRATEGIC_MAGNITUDE)
            .count();

        if strong_positives >= 3 && weak_negatives <= 1 {
            insights.push(render(&strategic.overall_strength, &industry));
        } else if weak_negatives >= 3 && strong_positives <= 1 {
            insights.push(render(&strategic.overall_risk, &industry));
        }

        if let (Some(cac), Some(ltv)) = (find("cac"), find("ltv")) {
            if cac.raw_value != 0.0 {
                let ratio = ltv.raw_value / cac.raw_value;
                let ratio_text = format!("{:.1}", ratio);
                let vars = [("industry", industry_name), ("ratio", ratio_text.as_str())];
                if ratio < LTV_CAC_FLOOR {
                    insights.push(render(&strategic.unit_economics_risk, &vars));
                } else if ratio > LTV_CAC_CEILING {
                    insights.push(render(&strategic.unit_economics_opportunity, &vars));
                }
            } else {
                debug!("Skipping LTV:CAC insight: CAC is zero");
            }
        }

        if has_status("conversion_rate", Status::Positive) && has_status("churn_rate", Status::Negative) {
            insights.push(render(&strategic.retention_gap, &industry));
        } else if has_status("conversion_rate", Status::Negative)
            && has_status("churn_rate", Status::Positive)
        {
            insights.push(render(&strategic.acquisition_gap, &industry));
        }

        if has_status("inventory_turnover", Status::Negative) && has_status("defect_rate", Status::Negative) {
            insights.push(render(&strategic.operational_excellence, &industry));
        }

        if has_status("gross_margin", Status::Negative) && has_status("burn_rate", Status::Negative) {
            insights.push(render(&strategic.financial_health, &industry));
        }

        insights
    }
}

fn render(template: &StrategicTemplate, vars: &[(&str, &str)]) -> Insight {
    Insight::new(
        template.label.clone(),
        template.insight_type,
        template.priority,
        fill(&template.message, vars),
        template.recommendations.clone(),
    )
}
