//! CLI for sending prompts through the inference bridge.
//!
//! # Usage
//!
//! ```bash
//! # Hosted endpoint from TABULA_API_URL / TABULA_API_KEY
//! cargo run -p tb-sim --features cli --bin tb-ask -- "How many rows are there?"
//!
//! # Explicit endpoint with prior conversation
//! cargo run -p tb-sim --features cli --bin tb-ask -- --endpoint http://localhost:8000/v1/chat/completions \
//!     --history history.json "And by region?"
//!
//! # Simulated host, no network
//! cargo run -p tb-sim --features cli --bin tb-ask -- --simulate "Describe the table"
//!
//! # Full simulated query cycle with progress events
//! SIM_SEED=42 cargo run -p tb-sim --features cli --bin tb-ask -- --demo "Total sales by region"
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tb_bridge::{HostedConfig, HttpInference, InferenceBridge, InferenceError, LanguageModel};
use tb_core::{BridgeConfig, ChatMessage, ConfigError, InferenceRequest, ProgressEvent};
use tb_lifecycle::{FnSink, Session};
use tb_sim::{drive_cycle, get_or_generate_seed, FaultConfig, SimEnv};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tb-ask", version, about = "Send a prompt through the inference bridge")]
struct Args {
    /// Prompt, or query for --demo
    prompt: String,

    /// JSON file holding an array of {"role", "content"} messages
    #[arg(long)]
    history: Option<PathBuf>,

    /// Chat completions URL (default: TABULA_API_URL)
    #[arg(long)]
    endpoint: Option<String>,

    /// Bearer credential (default: TABULA_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    temperature: Option<f32>,

    /// Answer from the simulated host instead of a real endpoint
    #[arg(long)]
    simulate: bool,

    /// Run a simulated generate/execute/fix cycle and print progress
    #[arg(long)]
    demo: bool,

    /// Simulation seed (default: SIM_SEED or random)
    #[arg(long)]
    seed: Option<u64>,

    /// Regeneration attempts allowed in --demo
    #[arg(long, default_value_t = 3)]
    max_retries: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    if args.demo {
        return run_demo(&args);
    }

    let history = match args.history.as_deref().map(load_history).transpose() {
        Ok(history) => history.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let model = match build_model(&args) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Error configuring model: {}", e);
            eprintln!();
            eprintln!("Pass --endpoint/--api-key, set TABULA_API_URL and TABULA_API_KEY, or use --simulate.");
            return ExitCode::FAILURE;
        }
    };

    let request = InferenceRequest::with_history(args.prompt.clone(), history);
    match model.complete(&request) {
        Ok(reply) => {
            println!("{}", reply);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Inference failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_history(path: &Path) -> Result<Vec<ChatMessage>, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("reading {}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("parsing {}: {}", path.display(), e))
}

fn model_config(args: &Args, mut config: BridgeConfig) -> Result<BridgeConfig, ConfigError> {
    if let Some(ref model) = args.model {
        config.model = model.clone();
    }
    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }
    config.validate()?;
    Ok(config)
}

fn build_model(args: &Args) -> Result<InferenceBridge, InferenceError> {
    if args.simulate {
        let config = model_config(args, BridgeConfig::default())?;
        let seed = args.seed.unwrap_or_else(get_or_generate_seed);
        let host = SimEnv::with_fault_config(seed, FaultConfig::none()).host();
        return Ok(InferenceBridge::new(host, config));
    }

    let mut hosted = match args.endpoint {
        Some(ref endpoint) => HostedConfig::new(
            endpoint.clone(),
            args.api_key.clone().unwrap_or_default(),
            BridgeConfig::default(),
        ),
        None => HostedConfig::from_env()?,
    };
    hosted.model = model_config(args, hosted.model)?;

    let model = hosted.model.clone();
    let client = HttpInference::new(hosted)?;
    Ok(InferenceBridge::with_model_type(std::sync::Arc::new(client), model, "hosted"))
}

fn run_demo(args: &Args) -> ExitCode {
    let config = match model_config(args, BridgeConfig::default()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let seed = args.seed.unwrap_or_else(get_or_generate_seed);
    let mut env = SimEnv::new(seed);
    let sink = FnSink(|event: ProgressEvent| match event.detail() {
        Some(detail) => println!("[{}]\n{}\n", event.tag(), detail),
        None => println!("[{}]", event.tag()),
    });

    let mut session = Session::with_host(env.host(), config, sink);
    let library = env.library(session.model().clone());
    let mut lifecycle = session.instrument(library);

    println!("Query: {}", args.prompt);
    println!();
    match drive_cycle(&mut lifecycle, &args.prompt, args.max_retries) {
        Ok(outcome) => {
            println!();
            println!("Attempts: {}", outcome.attempts);
            println!("Final code:");
            println!("{}", outcome.code);
            println!("Result: {}", outcome.output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Query failed: {} (reproduce with {})", e, env.format_seed());
            ExitCode::FAILURE
        }
    }
}
