use dotenv::dotenv;
use kpi_benchmark::*;
use std::error::Error;
use std::path::Path;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    dotenv().ok();

    let settings = LlmSettings::from_env();
    match &settings {
        Some(s) => println!("🤖 Using {} at {}", s.model, s.base_url),
        None => println!("🔄 GROQ_API_KEY not set, insights will be rule-based"),
    }
    println!("📐 Expected model response schema:\n{}\n", InsightPayload::schema_as_json()?);

    let engine = InsightEngine::from_settings(InsightTemplates::standard(), settings.as_ref());
    let pipeline = BenchmarkPipeline::bundled()?.with_insight_engine(engine);

    let table = parse_csv_file(Path::new("demos/data/ecommerce_wide.csv"))?;
    let mapping = ColumnMapper::new(&table.rows).suggested_mapping(pipeline.registry());

    let mut session = ReportSession::new();
    let token = session.begin();
    let report = pipeline
        .run_table(&table, &mapping, None, "ecommerce")
        .await?;
    session.commit(token, report);

    if let Some(report) = session.current() {
        println!("Insight source: {:?}\n", report.insight_source);

        let categorized = report.categorized_insights();
        for (label, insights) in [
            ("Financial", &categorized.financial),
            ("Operational", &categorized.operational),
            ("Marketing", &categorized.marketing),
            ("Strategic", &categorized.strategic),
            ("Risk", &categorized.risk),
        ] {
            if insights.is_empty() {
                continue;
            }
            println!("== {} ==", label);
            for insight in insights {
                println!("• {} ({:?}): {}", insight.kpi, insight.impact, insight.message);
                for recommendation in &insight.recommendations {
                    println!("    - {}", recommendation);
                }
            }
            println!();
        }

        println!("{}", report.to_json_pretty()?);
    }

    Ok(())
}
