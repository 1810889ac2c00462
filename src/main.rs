use clap::{Arg, Command};
use log::LevelFilter;
use phishguard::config::DEFAULT_CONFIG_PATH;
use phishguard::file_analyzer::format_file_size;
use phishguard::sandbox::SandboxExecutor;
use phishguard::{AnalysisEngine, Config, MessageRelay};
use std::process;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let matches = Command::new("phishguard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Heuristic phishing and malware risk scoring for email text and files")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value(DEFAULT_CONFIG_PATH),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("email")
                .short('e')
                .long("email")
                .value_name("FILE")
                .help("Analyze an email text file for phishing indicators")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("scan")
                .short('s')
                .long("scan")
                .value_name("FILE")
                .help("Analyze a file for malicious indicators")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Emit raw JSON results instead of a report")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("status")
                .long("status")
                .help("Show model status and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("serve")
                .long("serve")
                .help("Serve newline-delimited JSON requests on stdin/stdout")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches.get_one::<String>("config").unwrap();
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    let json_output = matches.get_flag("json");

    if matches.get_flag("status") {
        show_status(&config);
        return;
    }

    if let Some(email_file) = matches.get_one::<String>("email") {
        analyze_email_file(&config, email_file, json_output);
        return;
    }

    if let Some(scan_file) = matches.get_one::<String>("scan") {
        analyze_scan_file(&config, scan_file, json_output).await;
        return;
    }

    if matches.get_flag("serve") {
        run_relay(&config).await;
        return;
    }

    eprintln!("No action specified. Use --email, --scan, --status, or --serve.");
    process::exit(2);
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn show_status(config: &Config) {
    let engine = AnalysisEngine::new(config);
    if engine.model_status().loaded {
        println!("✅ Model manifest loaded (inference unavailable, pattern analysis in use)");
    } else {
        println!("⚠️  Model not loaded. Using pattern-based analysis.");
    }
}

fn analyze_email_file(config: &Config, path: &str, json_output: bool) {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("❌ Error reading email file: {e}");
            process::exit(1);
        }
    };

    let engine = AnalysisEngine::new(config);
    let result = engine.analyze_text(&content);

    if json_output {
        print_json(&result);
        return;
    }

    println!("🧪 Analyzing email: {path}");
    println!();
    println!("   Phishing score: {}%", (result.score * 100.0).round() as u32);

    if result.is_phishing {
        println!("🚨 Verdict: LIKELY PHISHING");
    } else {
        println!("✅ Verdict: LIKELY LEGITIMATE");
    }

    if result.features.is_empty() {
        println!("   No suspicious features detected");
    } else {
        println!("   Indicators:");
        for feature in &result.features {
            println!("     - {feature}");
        }
    }
}

async fn analyze_scan_file(config: &Config, path: &str, json_output: bool) {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("❌ Error reading file: {e}");
            process::exit(1);
        }
    };

    let file_name = std::path::Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
        .to_string();

    let sandbox = SandboxExecutor::new(Duration::from_secs(config.sandbox.timeout_seconds));
    let analysis = match sandbox.analyze_file(data, file_name).await {
        Ok(analysis) => analysis,
        Err(e) => {
            eprintln!("❌ Analysis failed: {e}");
            process::exit(1);
        }
    };

    if json_output {
        print_json(&analysis);
        return;
    }

    println!("🧪 Analyzing file: {}", analysis.file_name);
    println!();
    println!("   Type: {}", analysis.file_type);
    println!("   Size: {}", format_file_size(analysis.file_size));
    println!(
        "   Risk score: {}%",
        (analysis.risk_score * 100.0).round() as u32
    );

    if analysis.is_malicious {
        println!("🚨 Verdict: MALICIOUS");
    } else {
        println!("✅ Verdict: LIKELY SAFE");
    }

    if !analysis.detected_features.is_empty() {
        println!("   Findings:");
        for feature in &analysis.detected_features {
            println!("     - {feature}");
        }
    }

    for warning in &analysis.warnings {
        println!("   ⚠️  {warning}");
    }
}

async fn run_relay(config: &Config) {
    log::info!("Starting PhishGuard relay on stdin/stdout...");
    let relay = MessageRelay::new(config);
    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let output = tokio::io::stdout();

    if let Err(e) = relay.serve(input, output).await {
        log::error!("Relay error: {e}");
        process::exit(1);
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("Error encoding result: {e}");
            process::exit(1);
        }
    }
}
