use clap::Parser;
use facility_access::adapters::report::format_summary_table;
use facility_access::utils::{logger, validation::Validate};
use facility_access::{data_source_for, CliConfig, ReportPresenter, RunConfig, Session};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 合併 TOML 與 CLI 設定
    let config = match RunConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting facility-access");
    tracing::debug!("Run config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let source = match data_source_for(&config.data_root) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let presenter = Arc::new(match &config.output_path {
        Some(path) => ReportPresenter::with_output(path, config.geojson),
        None => ReportPresenter::new(),
    });

    let session = match Session::start(source, presenter.clone(), config.session_options()).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("❌ Startup failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 套用啟動後的施設選擇
    if let Some(code) = &config.only_region {
        session.deselect_all().await;
        session.select_region(code).await;
    }
    for name in &config.deselect {
        if session.is_active(name).await {
            session.toggle_facility(name).await;
        } else {
            tracing::warn!("⚠️ Facility '{}' is not active or unknown", name);
        }
    }
    session.wait_for_updates().await;

    let rows = session.current_summary().await;
    let (active, total) = session.active_count().await;
    println!(
        "Summary for {} (有効施設: {} / {})",
        session.summary_scope().await,
        active,
        total
    );
    println!("{}", format_summary_table(&rows));

    match presenter.write_outputs() {
        Ok(Some(dir)) => println!("📁 Output saved to: {}", dir.display()),
        Ok(None) => {}
        Err(e) => {
            tracing::error!("❌ Failed to write report: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    }

    Ok(())
}
