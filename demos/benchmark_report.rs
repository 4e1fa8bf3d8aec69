use kpi_benchmark::*;
use std::error::Error;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/data/saas_long.csv"));
    let industry = args.next().unwrap_or_else(|| "saas".to_string());

    println!("📄 Reading {}", path.display());
    let table = parse_csv_file(&path)?;

    let classification = detect_format(&table.rows);
    println!(
        "🔎 {} (confidence {:.0}%)",
        classification.description,
        classification.confidence * 100.0
    );

    let pipeline = BenchmarkPipeline::bundled()?;
    println!("\n🏭 Available industries:");
    for benchmark in pipeline.store().industries() {
        let metrics: Vec<String> = benchmark
            .preview(3)
            .into_iter()
            .map(|(kpi, median)| format!("{}={}", kpi, median))
            .collect();
        println!("   {:<12} {:<24} {}, ...", benchmark.id, benchmark.name, metrics.join(", "));
    }
    let mapper = ColumnMapper::new(&table.rows);
    let mapping = mapper.suggested_mapping(pipeline.registry());

    println!("\n🧭 Suggested mapping ({:?} layout):", mapper.layout());
    for (kpi, option) in &mapping {
        println!("   {:<20} <- {}", kpi, option);
    }

    let validation = mapper.validate(pipeline.registry(), &mapping);
    for warning in &validation.warnings {
        println!("   ⚠️  {}", warning);
    }

    let report = pipeline.run_table(&table, &mapping, None, &industry).await?;

    println!("\n📊 {} benchmark", report.industry_name);
    for record in &report.comparisons {
        println!(
            "   {:<32} {:>10} vs {:>10}  {:>8}  {:>+5}%  {:?}",
            record.name,
            format!("{}{}", record.your_value, record.unit.symbol()),
            format!("{}{}", record.benchmark, record.unit.symbol()),
            record.difference,
            record.percent_difference,
            record.status
        );
    }

    println!(
        "\n🏁 Overall score {} | weighted health {} ({:?})",
        report.overall_score, report.health.score, report.health.level
    );
    println!("\n📝 {}", report.summary.summary);

    println!("\n💡 Insights:");
    for insight in &report.insights {
        println!(
            "   [{:?}/{:?}] {}: {}",
            insight.priority, insight.insight_type, insight.kpi, insight.message
        );
    }

    if !report.summary.top_recommendations.is_empty() {
        println!("\n✅ Top recommendations:");
        for recommendation in &report.summary.top_recommendations {
            println!("   - {}", recommendation);
        }
    }

    Ok(())
}
