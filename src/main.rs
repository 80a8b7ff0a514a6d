use hoymiles_stats::options::Command;
use hoymiles_stats::prelude::*;
use hoymiles_stats::replay;

#[tokio::main]
async fn main() -> Result<()> {
    let options = Options::new();

    let config = ConfigWrapper::new(options.config_file).unwrap_or_else(|err| {
        eprintln!("Failed to load config: {:?}", err);
        std::process::exit(255);
    });

    hoymiles_stats::init_logging(&config.loglevel());
    config.snapshot().log_summary();

    match options.command {
        Some(Command::Decode { capture }) => {
            let cycles = replay::read_capture(&capture)?;
            let live = hoymiles_stats::replay_cycles(&config, &cycles).await?;
            println!("{}", serde_json::to_string_pretty(&live)?);
        }
        Some(Command::Encode { serial, values }) => {
            let serial = Serial::from_str(&serial)?;
            let values = replay::read_values(&values)?;
            for fragment in hoymiles_stats::encode(&config, serial, &values)? {
                println!("{}", serde_json::to_string(&fragment)?);
            }
        }
        None => hoymiles_stats::app(config).await?,
    }

    Ok(())
}
