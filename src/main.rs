use clap::Parser;
use nonworkday_etl::config::cli::{prompt_date_range, ConsolePrompt};
use nonworkday_etl::domain::ports::ExportConfirmation;
use nonworkday_etl::utils::error::ErrorSeverity;
use nonworkday_etl::utils::{logger, validation::Validate};
use nonworkday_etl::{AuditSettings, BackgroundRunner, CliConfig, EtlError, ExportOutcome};

fn exit_with(e: &EtlError) -> ! {
    tracing::error!(
        "❌ Audit failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn display_config_summary(settings: &AuditSettings) {
    println!("📋 Configuration Summary:");
    println!("  Input: {}", settings.input_path);
    println!("  Output: {}", settings.output_path);
    match (&settings.start, &settings.end) {
        (Some(start), Some(end)) => println!("  Range: {} .. {}", start, end),
        _ => println!("  Range: unbounded"),
    }
    println!("  Date column: {}", settings.date_column);
    println!("  Batch size: {}", settings.batch_size);
    for spec in &settings.validators {
        println!("  Validator: {} ~ {}", spec.column, spec.pattern);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::info!("Starting nonworkday-etl");

    let mut settings = cli.resolve().unwrap_or_else(|e| exit_with(&e));

    if cli.ask_range {
        let (start, end) = prompt_date_range()?;
        settings.start = start;
        settings.end = end;
    }

    if let Err(e) = settings.validate() {
        exit_with(&e);
    }
    tracing::debug!("Resolved settings: {:?}", settings);
    // --json 時 stdout 只留給最後的摘要
    if !cli.json {
        display_config_summary(&settings);
    }

    let engine = settings.build_engine().unwrap_or_else(|e| exit_with(&e));

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No rows will be filtered or written");
        let columns = engine.pipeline().check_source().unwrap_or_else(|e| exit_with(&e));
        println!("✅ Input header OK: {}", columns.join(", "));
        return Ok(());
    }

    let confirmation: Box<dyn ExportConfirmation> = if settings.auto_confirm {
        Box::new(true)
    } else {
        Box::new(ConsolePrompt::new(settings.preview_rows))
    };

    if !cli.json {
        println!("⏳ Processing in background...");
    }
    let runner = BackgroundRunner::new();
    let handle = runner
        .spawn(engine, confirmation)
        .unwrap_or_else(|e| exit_with(&e));

    let summary = handle.wait().await.unwrap_or_else(|e| exit_with(&e));

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "🔎 {} of {} connections fall on non-working days",
        summary.matched, summary.stats.rows_read
    );
    match &summary.outcome {
        ExportOutcome::Written { destination, rows } => {
            println!("✅ Exported {} rows to {}", rows, destination);
        }
        ExportOutcome::Cancelled => println!("Export cancelled by the user."),
    }

    Ok(())
}
