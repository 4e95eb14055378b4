use anyhow::Result;
use clap::{CommandFactory, Parser};
use hushmic::app::{run_denoise_command, run_process_command};
use hushmic::audio::device::enumerate_devices;
use hushmic::cli::{Cli, Commands, ModelsAction};
use hushmic::config::Config;
use hushmic::models::catalog::{get_model, list_models};
use owo_colors::OwoColorize;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        None => {
            let config = load_config(&cli)?;
            run_denoise_command(config, cli.quiet, cli.verbose)?;
        }
        Some(Commands::Devices) => {
            list_audio_devices()?;
        }
        Some(Commands::Models { action }) => {
            handle_models_command(action)?;
        }
        Some(Commands::Process { input, output }) => {
            let config = load_config(&cli)?;
            run_process_command(config, input, output, cli.quiet)?;
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(*shell, &mut Cli::command(), "hushmic", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Load the config file, apply env and CLI overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_default(&path)?.with_env_overrides();
    cli.apply_to(&mut config);
    Ok(config)
}

fn list_audio_devices() -> Result<()> {
    hushmic::audio::device::suppress_audio_warnings();
    let devices = enumerate_devices()?;
    if devices.is_empty() {
        println!("No audio devices found.");
        return Ok(());
    }

    println!("{}", "Available audio devices:".bold());
    for device in devices {
        let marker = if device.recommended {
            " [recommended]".green().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:>2}  {}{}  (in: {} ch, out: {} ch, {} Hz)",
            device.id,
            device.name,
            marker,
            device.max_input_channels,
            device.max_output_channels,
            device.default_sample_rate,
        );
    }
    Ok(())
}

fn handle_models_command(action: &ModelsAction) -> Result<()> {
    match action {
        ModelsAction::List => {
            println!("{}", "Available denoising models:".bold());
            for model in list_models() {
                println!(
                    "  {:<18} {}  ({})",
                    model.name.bold(),
                    model.display_name,
                    model.default_path
                );
            }
        }
        ModelsAction::Info { name } => match get_model(name) {
            Some(model) => {
                println!("{}: {}", "Name".bold(), model.name);
                println!("{}: {}", "Display name".bold(), model.display_name);
                println!("{}: {}", "Default path".bold(), model.default_path);
                println!("{}: {}", "Format".bold(), model.format);
                println!("{}: {}", "Notes".bold(), model.notes);
            }
            None => {
                eprintln!("Unknown model '{}'. Available models:", name);
                for model in list_models() {
                    eprintln!("  {}", model.name);
                }
                std::process::exit(1);
            }
        },
    }
    Ok(())
}
