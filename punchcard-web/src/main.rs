//! Punchcard Web Server
//!
//! The HTTP API for Punchcard attendance tracking.

use clap::Parser;
use punchcard_core::logging::{init_logging, LoggingConfig};
use punchcard_web::server::PunchcardServerBuilder;
use punchcard_web::WebConfig;

/// Punchcard Web Server - attendance and work session tracking
#[derive(Parser)]
#[command(name = "punchcard-web")]
#[command(about = "The Punchcard attendance tracking API server")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory for saved CSV reports
    #[arg(long)]
    export_dir: Option<String>,

    /// Refresh grace window in milliseconds
    #[arg(long)]
    refresh_grace_ms: Option<u64>,

    /// Display timezone as a UTC offset in minutes
    #[arg(long)]
    utc_offset_minutes: Option<i32>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging first
    let mut log_config = LoggingConfig {
        level: args.log_level.clone(),
        filter_directives: vec![
            format!("punchcard_core={}", args.log_level),
            format!("punchcard_applications={}", args.log_level),
            format!("punchcard_web={}", args.log_level),
            "tower_http=debug".to_string(),
        ],
        ..Default::default()
    };
    if let Some(log_file) = &args.log_file {
        log_config = log_config.with_log_file(log_file.clone());
    }
    if let Err(e) = init_logging(&log_config) {
        eprintln!("❌ Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    println!("🔧 Starting Punchcard Web Server initialization...");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Create web configuration
    let mut config = WebConfig::from_env();

    // Override with command line arguments
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(export_dir) = args.export_dir {
        config.export_dir = export_dir;
    }
    if let Some(grace_ms) = args.refresh_grace_ms {
        config.refresh_grace_ms = grace_ms;
    }
    if let Some(minutes) = args.utc_offset_minutes {
        config.utc_offset_minutes = Some(minutes);
    }

    // Print startup information
    println!("🚀 Starting Punchcard Web Server");
    println!("📍 Server: http://{}:{}", config.host, config.port);
    println!("📁 Export directory: {}", config.export_dir);

    if std::env::var("PUNCHCARD_JWT_SECRET").is_err() {
        println!("⚠️  Warning: PUNCHCARD_JWT_SECRET is not set.");
        println!("   Tokens will be signed with the built-in development secret.");
    }

    // Build and start the server
    let mut builder = PunchcardServerBuilder::new()
        .host(config.host.clone())
        .port(config.port)
        .export_dir(config.export_dir.clone())
        .refresh_grace_ms(config.refresh_grace_ms);
    if let Some(minutes) = config.utc_offset_minutes {
        builder = builder.utc_offset_minutes(minutes);
    }

    let server = match builder.build() {
        Ok(server) => {
            println!("✅ Server built successfully");
            server
        }
        Err(e) => {
            eprintln!("❌ Failed to build server: {}", e);
            std::process::exit(1);
        }
    };

    // Start the server (this will block until shutdown)
    if let Err(e) = server.start().await {
        eprintln!("❌ Server failed to start: {}", e);
        std::process::exit(1);
    }

    println!("✅ Server shut down gracefully");
}
