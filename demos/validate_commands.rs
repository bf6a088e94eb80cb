use samsungac_cli::{
    Config, FanMode, HvacMode, MessageLogMode, SamsungAcClient, SamsungAcClientBuilder, Temperature,
};
use std::env;
use std::io::{self, BufRead, Write as _};

#[derive(Debug, Clone, Copy)]
enum Action {
    Mode(HvacMode),
    Setpoint(f64),
    Fan(FanMode),
}

#[tokio::main]
async fn main() -> samsungac_cli::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let config_path = args
        .get(1)
        .expect("usage: validate_commands <config.toml> [--no-log]");
    let no_log = args.iter().any(|a| a == "--no-log");

    let config = Config::load(config_path)?;
    let mut builder = SamsungAcClientBuilder::from_config(&config);

    let log_path = if !no_log {
        let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = format!("logs/validate_{ts}.ndjson");
        std::fs::create_dir_all("logs").ok();
        println!("Logging all CLI traffic to {path}");
        builder = builder.message_log(MessageLogMode::Full, &path);
        Some(path)
    } else {
        None
    };

    let mut client = builder.build()?;

    println!("Reading current state...");
    client.update().await;
    if !client.available() {
        eprintln!("Device unavailable: {:?}", client.last_error());
        return Ok(());
    }
    println!("\n=== Current State ===");
    print_state(&client);
    println!();

    let orig_mode = client.hvac_mode().unwrap_or(HvacMode::Off);
    let orig_target = client.target_temperature();
    let orig_fan = client.fan_mode().unwrap_or(FanMode::Auto);

    let test_mode = if orig_mode == HvacMode::Cool {
        HvacMode::FanOnly
    } else {
        HvacMode::Cool
    };
    let test_fan = if orig_fan == FanMode::High {
        FanMode::Low
    } else {
        FanMode::High
    };
    let test_target = Temperature::from_celsius(orig_target.celsius() + 1.0);

    let cases = [
        ("HVAC Mode", Action::Mode(test_mode), Action::Mode(orig_mode)),
        (
            "Setpoint",
            Action::Setpoint(test_target.celsius()),
            Action::Setpoint(orig_target.celsius()),
        ),
        ("Fan Mode", Action::Fan(test_fan), Action::Fan(orig_fan)),
    ];

    let total = cases.len();
    for (i, (name, apply, revert)) in cases.into_iter().enumerate() {
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("Test {}/{total}: {name}", i + 1);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        println!("\n  → Will execute: {apply:?}");
        wait_for_enter("Press Enter to apply (Ctrl-C to abort)...");
        run(&mut client, apply).await;
        print_state(&client);

        wait_for_enter("Verify at the unit, then press Enter to revert...");
        run(&mut client, revert).await;
        print_state(&client);
        println!("  ✓ Reverted\n");
    }

    println!("All tests complete.");
    if let Some(path) = log_path {
        println!("Full CLI log: {path}");
    }
    Ok(())
}

async fn run(client: &mut SamsungAcClient, action: Action) {
    match action {
        Action::Mode(mode) => client.set_hvac_mode(Some(mode)).await,
        Action::Setpoint(c) => client.set_temperature(Some(c)).await,
        Action::Fan(fan) => client.set_fan_mode(Some(fan)).await,
    }
    match client.last_command_error() {
        Some(err) => println!("  ⚠ {err}"),
        None => println!("  ✓ Command sent"),
    }
}

fn print_state(client: &SamsungAcClient) {
    println!(
        "  {} | temp: {} | target: {} | mode: {} | action: {} | fan: {} | range: {}..{}",
        if client.available() { "available" } else { "unavailable" },
        client.current_temperature(),
        client.target_temperature(),
        client.hvac_mode().map_or("-", |m| m.as_str()),
        client.hvac_action().map_or("-", |a| a.as_str()),
        client.fan_mode().map_or("-", |f| f.as_str()),
        client.min_temp(),
        client.max_temp(),
    );
}

fn wait_for_enter(prompt: &str) {
    print!("  {prompt} ");
    io::stdout().flush().unwrap();
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).unwrap();
}
