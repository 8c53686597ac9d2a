use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use ziwei_bazi::analysis::{TokenSink, FAILURE_MESSAGE};
use ziwei_bazi::utils::error::ErrorSeverity;
use ziwei_bazi::utils::{logger, validation::Validate};
use ziwei_bazi::{
    format_as_plain_text, Astrolabe, ChartConfig, ChartEngine, ChartError, CliConfig,
    NarrativeService, OpenAiNarrator, SnapshotOracle,
};

/// 串流輸出：正文寫到 stdout，推理過程寫到 stderr
struct ConsoleSink;

impl TokenSink for ConsoleSink {
    fn on_token(&mut self, token: &str) {
        print!("{}", token);
        let _ = std::io::stdout().flush();
    }

    fn on_reasoning_token(&mut self, token: &str) {
        eprint!("{}", token);
    }
}

fn exit_code(e: &ChartError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,      // 警告，但成功
        ErrorSeverity::Medium => 2,   // 資料來源錯誤
        ErrorSeverity::High => 1,     // 輸入或配置錯誤
        ErrorSeverity::Critical => 3, // 系統錯誤
    }
}

fn fail(e: &ChartError) -> ! {
    tracing::error!(
        "❌ Chart calculation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(exit_code(e).max(1));
}

async fn analyze(chart: &Astrolabe, config: &ChartConfig) -> ziwei_bazi::Result<()> {
    let narrator = OpenAiNarrator::from_config(&config.analysis)?;
    tracing::info!("🤖 Requesting narrative analysis ({})", config.analysis.model);

    println!();
    if config.analysis.stream {
        let mut sink = ConsoleSink;
        narrator.analyze_stream(chart, &mut sink).await?;
        println!();
    } else {
        println!("{}", narrator.analyze(chart).await?);
    }
    Ok(())
}

async fn run(cli: &CliConfig, config: &ChartConfig) -> ziwei_bazi::Result<()> {
    let snapshot = cli
        .snapshot
        .clone()
        .or_else(|| config.oracle.snapshot.clone())
        .ok_or_else(|| ChartError::MissingConfig {
            field: "oracle.snapshot (or --snapshot)".to_string(),
        })?;
    let oracle = Arc::new(SnapshotOracle::from_file(&snapshot)?);
    let engine = ChartEngine::new(oracle.clone(), oracle.clone(), oracle)
        .with_options(config.engine.clone());

    let spec = cli.birth_spec()?;
    let focus = match cli.focus()? {
        Some(date) => date,
        None => {
            let today = chrono::Local::now().date_naive();
            tracing::info!("No focus date given, using today ({})", today);
            today
        }
    };

    let chart = engine.compute_chart(&spec, Some(focus))?;
    tracing::info!(
        "✅ Chart computed ({} palaces, {} decades)",
        chart.palaces.len(),
        chart.bazi.da_yun.len()
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&chart)?);
    } else {
        println!("{}", format_as_plain_text(&chart));
    }

    if cli.analyze {
        // 解盤失敗不影響命盤輸出
        if let Err(e) = analyze(&chart, config).await {
            tracing::error!("❌ Narrative analysis failed: {}", e);
            eprintln!("❌ {}", FAILURE_MESSAGE);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    let config = match &cli.config {
        Some(path) => ChartConfig::from_file(path),
        None => Ok(ChartConfig::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(exit_code(&e).max(1));
        }
    };

    // 初始化日誌
    if config.logging.json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting ziwei-bazi CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = cli.validate().and_then(|_| config.validate()) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(&cli, &config).await {
        fail(&e);
    }

    Ok(())
}
