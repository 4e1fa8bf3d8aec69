use crate::schema::{InsightType, Priority};
use std::collections::BTreeMap;

/// Replaces `{name}` placeholders. Unknown placeholders are left as-is.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{}}}", name), value)
    })
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightTemplate {
    pub insight_type: InsightType,
    pub message: String,
    pub recommendations: Vec<String>,
}

impl InsightTemplate {
    pub fn new(insight_type: InsightType, message: &str, recommendations: &[&str]) -> Self {
        Self {
            insight_type,
            message: message.to_string(),
            recommendations: owned(recommendations),
        }
    }
}

/// Templates for one KPI. `positive` also covers neutral results.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplatePair {
    pub positive: InsightTemplate,
    pub negative: InsightTemplate,
}

/// A cross-KPI insight with a fixed label and priority.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategicTemplate {
    pub label: String,
    pub insight_type: InsightType,
    pub priority: Priority,
    pub message: String,
    pub recommendations: Vec<String>,
}

impl StrategicTemplate {
    pub fn new(
        label: &str,
        insight_type: InsightType,
        priority: Priority,
        message: &str,
        recommendations: &[&str],
    ) -> Self {
        Self {
            label: label.to_string(),
            insight_type,
            priority,
            message: message.to_string(),
            recommendations: owned(recommendations),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategicTemplates {
    pub overall_strength: StrategicTemplate,
    pub overall_risk: StrategicTemplate,
    pub unit_economics_risk: StrategicTemplate,
    pub unit_economics_opportunity: StrategicTemplate,
    pub retention_gap: StrategicTemplate,
    pub acquisition_gap: StrategicTemplate,
    pub operational_excellence: StrategicTemplate,
    pub financial_health: StrategicTemplate,
}

/// Message and recommendation text for the rule-based generator.
///
/// Placeholders: `{pct}` absolute percent difference, `{industry}` industry
/// display name, `{name}` KPI display name, `{direction}` above/below,
/// `{ratio}` LTV:CAC ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightTemplates {
    pub curated: BTreeMap<String, TemplatePair>,
    pub generic_message: String,
    pub generic_neutral_message: String,
    pub generic_recommendations: Vec<String>,
    pub strategic: StrategicTemplates,
}

impl InsightTemplates {
    pub fn curated(&self, kpi_key: &str) -> Option<&TemplatePair> {
        self.curated.get(kpi_key)
    }

    pub fn with_curated(mut self, kpi_key: &str, pair: TemplatePair) -> Self {
        self.curated.insert(kpi_key.to_string(), pair);
        self
    }

    pub fn standard() -> Self {
        use InsightType::*;

        let mut curated = BTreeMap::new();

        curated.insert(
            "gross_margin".to_string(),
            TemplatePair {
                positive: InsightTemplate::new(
                    Strength,
                    "Your gross margin is {pct}% above the {industry} median. This indicates strong pricing power and/or efficient cost management.",
                    &[
                        "Maintain current pricing strategy",
                        "Consider premium product positioning",
                        "Invest savings in growth initiatives",
                    ],
                ),
                negative: InsightTemplate::new(
                    Weakness,
                    "Your gross margin is {pct}% below the {industry} median. This suggests pricing pressure or high cost of goods sold.",
                    &[
                        "Analyze cost structure and identify reduction opportunities",
                        "Review pricing strategy and competitor positioning",
                        "Negotiate better terms with suppliers",
                        "Consider product mix optimization",
                    ],
                ),
            },
        );

        curated.insert(
            "cac".to_string(),
            TemplatePair {
                positive: InsightTemplate::new(
                    Strength,
                    "Your customer acquisition cost is {pct}% below the {industry} median. Your marketing efficiency is excellent.",
                    &[
                        "Scale successful acquisition channels",
                        "Document and replicate best practices",
                        "Consider increasing marketing spend for growth",
                    ],
                ),
                negative: InsightTemplate::new(
                    Weakness,
                    "Your customer acquisition cost is {pct}% above the {industry} median. Marketing efficiency needs improvement.",
                    &[
                        "Audit marketing channels for ROI performance",
                        "Improve conversion funnel optimization",
                        "Test lower-cost acquisition channels",
                        "Enhance targeting and segmentation",
                    ],
                ),
            },
        );

        curated.insert(
            "churn_rate".to_string(),
            TemplatePair {
                positive: InsightTemplate::new(
                    Strength,
                    "Your churn rate is {pct}% below the {industry} median. Customer retention is a key competitive advantage.",
                    &[
                        "Document retention best practices",
                        "Invest in customer success programs",
                        "Use retention strength in marketing messaging",
                    ],
                ),
                negative: InsightTemplate::new(
                    Weakness,
                    "Your churn rate is {pct}% above the {industry} median. Customer retention is a critical issue requiring immediate attention.",
                    &[
                        "Implement customer health scoring",
                        "Develop proactive retention campaigns",
                        "Analyze exit interviews for improvement areas",
                        "Enhance onboarding and customer success",
                    ],
                ),
            },
        );

        curated.insert(
            "conversion_rate".to_string(),
            TemplatePair {
                positive: InsightTemplate::new(
                    Strength,
                    "Your conversion rate is {pct}% above the {industry} median. Your sales process or website is highly effective.",
                    &[
                        "Scale traffic to capitalize on high conversion",
                        "A/B test to maintain conversion excellence",
                        "Share conversion best practices across channels",
                    ],
                ),
                negative: InsightTemplate::new(
                    Weakness,
                    "Your conversion rate is {pct}% below the {industry} median. There are significant optimization opportunities.",
                    &[
                        "Conduct user experience audits",
                        "Implement A/B testing program",
                        "Optimize landing pages and checkout flow",
                        "Analyze customer journey friction points",
                    ],
                ),
            },
        );

        curated.insert(
            "inventory_turnover".to_string(),
            TemplatePair {
                positive: InsightTemplate::new(
                    Strength,
                    "Your inventory turnover is {pct}% above the {industry} median. Inventory management is very efficient.",
                    &[
                        "Maintain optimal stock levels",
                        "Consider just-in-time inventory strategies",
                        "Use freed cash flow for growth investments",
                    ],
                ),
                negative: InsightTemplate::new(
                    Weakness,
                    "Your inventory turnover is {pct}% below the {industry} median. Excess inventory is tying up capital.",
                    &[
                        "Implement demand forecasting improvements",
                        "Review slow-moving inventory for clearance",
                        "Optimize supplier relationships and lead times",
                        "Consider inventory management software",
                    ],
                ),
            },
        );

        curated.insert(
            "ltv".to_string(),
            TemplatePair {
                positive: InsightTemplate::new(
                    Strength,
                    "Your customer lifetime value is {pct}% above the {industry} median. Customers are highly valuable.",
                    &[
                        "Focus on acquiring similar high-value customers",
                        "Develop loyalty and upselling programs",
                        "Invest in customer experience improvements",
                    ],
                ),
                negative: InsightTemplate::new(
                    Opportunity,
                    "Your customer lifetime value is {pct}% below the {industry} median. There's opportunity to increase customer value.",
                    &[
                        "Develop upselling and cross-selling strategies",
                        "Improve customer engagement and retention",
                        "Consider subscription or recurring revenue models",
                        "Analyze high-value customer characteristics",
                    ],
                ),
            },
        );

        let strategic = StrategicTemplates {
            overall_strength: StrategicTemplate::new(
                "Overall Performance",
                Strength,
                Priority::High,
                "Your company is performing exceptionally well across most key metrics compared to {industry} peers. You have strong competitive positioning.",
                &[
                    "Leverage strengths for market expansion",
                    "Consider premium positioning strategy",
                    "Document and scale successful practices",
                    "Address remaining weak areas for optimization",
                ],
            ),
            overall_risk: StrategicTemplate::new(
                "Overall Performance",
                Risk,
                Priority::High,
                "Multiple key metrics are underperforming compared to {industry} standards. Comprehensive performance improvement is needed.",
                &[
                    "Conduct thorough operational review",
                    "Prioritize critical performance gaps",
                    "Consider bringing in industry expertise",
                    "Develop systematic improvement plan",
                ],
            ),
            unit_economics_risk: StrategicTemplate::new(
                "Unit Economics",
                Risk,
                Priority::High,
                "Your LTV:CAC ratio is {ratio}:1, which is below the healthy 3:1 threshold. This indicates unsustainable unit economics.",
                &[
                    "Focus on increasing customer lifetime value",
                    "Optimize customer acquisition costs",
                    "Improve retention and reduce churn",
                    "Consider pricing strategy adjustments",
                ],
            ),
            unit_economics_opportunity: StrategicTemplate::new(
                "Unit Economics",
                Opportunity,
                Priority::Medium,
                "Your LTV:CAC ratio is {ratio}:1, which is excellent. You may be under-investing in growth.",
                &[
                    "Consider increasing marketing spend",
                    "Scale successful acquisition channels",
                    "Explore new market segments",
                    "Invest in product development",
                ],
            ),
            retention_gap: StrategicTemplate::new(
                "Growth Strategy",
                Opportunity,
                Priority::Medium,
                "You excel at acquiring customers but struggle with retention. Focus on the full customer lifecycle.",
                &[
                    "Implement customer onboarding improvements",
                    "Develop customer success programs",
                    "Analyze why customers leave despite good acquisition",
                    "Create retention-focused KPIs and incentives",
                ],
            ),
            acquisition_gap: StrategicTemplate::new(
                "Growth Strategy",
                Opportunity,
                Priority::Medium,
                "You retain customers well but have acquisition challenges. Leverage retention strength for growth.",
                &[
                    "Implement referral programs leveraging loyal customers",
                    "Use customer testimonials in acquisition marketing",
                    "Analyze successful customer profiles for targeting",
                    "Optimize conversion funnel based on retention insights",
                ],
            ),
            operational_excellence: StrategicTemplate::new(
                "Operational Excellence",
                Weakness,
                Priority::High,
                "Both inventory management and quality control are below industry standards. Operational improvements are critical.",
                &[
                    "Implement lean manufacturing principles",
                    "Invest in quality management systems",
                    "Review and optimize supply chain processes",
                    "Consider operational consulting or training",
                ],
            ),
            financial_health: StrategicTemplate::new(
                "Financial Health",
                Risk,
                Priority::High,
                "Low gross margins combined with high burn rate create financial sustainability risks.",
                &[
                    "Immediately review cost structure",
                    "Consider pricing strategy adjustments",
                    "Evaluate non-essential expenses",
                    "Develop scenario planning for cash management",
                ],
            ),
        };

        Self {
            curated,
            generic_message: "Your {name} is {pct}% {direction} the {industry} industry median."
                .to_string(),
            generic_neutral_message: "Your {name} is in line with the {industry} industry median."
                .to_string(),
            generic_recommendations: owned(&[
                "Analyze factors contributing to {name} performance",
                "Benchmark against industry best practices",
                "Consider strategic adjustments if needed",
            ]),
            strategic,
        }
    }
}

impl Default for InsightTemplates {
    fn default() -> Self {
        Self::standard()
    }
}
