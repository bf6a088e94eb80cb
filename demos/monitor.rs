use samsungac_cli::{Config, SamsungAcClientBuilder};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> samsungac_cli::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let config_path = args
        .get(1)
        .expect("usage: monitor <config.toml> [--interval <secs>]");
    let interval: u64 = args
        .iter()
        .position(|a| a == "--interval")
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);

    let config = Config::load(config_path)?;
    let mut client = SamsungAcClientBuilder::from_config(&config)
        .on_event(|event| {
            println!("{event:?}");
        })
        .on_state(|state| {
            if !state.available {
                println!("[unavailable]");
                return;
            }
            println!(
                "{} -> {} | mode: {:?} | action: {:?} | fan: {:?} | power: {}",
                state.current_temperature,
                state.target_temperature,
                state.mode,
                state.action,
                state.fan_mode,
                state.power_consumption,
            );
        })
        .build()?;

    println!("Watching {} ({})...", client.name(), client.device_id());
    client.on_added().await;

    loop {
        tokio::time::sleep(Duration::from_secs(interval)).await;
        client.update().await;
        if let Some(err) = client.last_error() {
            eprintln!("Update error: {err}");
        }
    }
}
