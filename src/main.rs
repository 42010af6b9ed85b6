use clap::Parser;
use faqsync::cli::{
    handle_completions, handle_config_init, kv, models, probe, rate_limits, settings, AppContext,
    Cli, Commands, ConfigCommands, KvCommands, ModelsCommands, RateLimitsCommands,
    SettingsCommands,
};
use faqsync::logging::init_tracing;

async fn run(cli: Cli) -> Result<String, Box<dyn std::error::Error>> {
    // These commands never read the configuration file
    match &cli.command {
        Commands::Completions(args) => {
            handle_completions(args);
            return Ok(String::new());
        }
        Commands::Config(ConfigCommands::Init(args)) => return handle_config_init(args),
        _ => {}
    }

    let ctx = AppContext::load(&cli.config, cli.log_level.as_deref())?;
    if let Err(e) = init_tracing(&ctx.config.logging) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    match cli.command {
        Commands::Probe(args) => probe::handle_probe(&args, &ctx).await,
        Commands::ProbeAll(args) => probe::handle_probe_all(&args, &ctx).await,
        Commands::Watch(args) => probe::handle_watch(&args, &ctx).await,
        Commands::Models(cmd) => match cmd {
            ModelsCommands::Show(args) => models::handle_models_show(&args, &ctx).await,
            ModelsCommands::Current(args) => models::handle_models_current(&args, &ctx).await,
            ModelsCommands::Set(args) => models::handle_models_set(&args, &ctx).await,
            ModelsCommands::Reset(args) => models::handle_models_reset(&args, &ctx).await,
        },
        Commands::RateLimits(cmd) => match cmd {
            RateLimitsCommands::Show(args) => {
                rate_limits::handle_rate_limits_show(&args, &ctx).await
            }
            RateLimitsCommands::Set(args) => rate_limits::handle_rate_limits_set(&args, &ctx).await,
            RateLimitsCommands::Reset(args) => {
                rate_limits::handle_rate_limits_reset(&args, &ctx).await
            }
        },
        Commands::Settings(SettingsCommands::Show(args)) => {
            settings::handle_settings_show(&args, &ctx).await
        }
        Commands::Kv(cmd) => match cmd {
            KvCommands::Test => kv::handle_kv_test(&ctx).await,
            KvCommands::Get(args) => kv::handle_kv_get(&args, &ctx).await,
            KvCommands::Delete(args) => kv::handle_kv_delete(&args, &ctx).await,
        },
        Commands::Config(_) | Commands::Completions(_) => Ok(String::new()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
