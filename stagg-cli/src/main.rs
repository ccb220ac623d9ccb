use clap::{Parser, Subcommand};
use stagg_lib::ble::BleTransport;
use stagg_lib::{CounterPolicy, Kettle, KettleState, RawFrame, ScheduleMode, Transport};
use std::error::Error;
use tracing::info;

#[derive(Parser)]
#[command(name = "stagg", about = "Control a Fellow Stagg EKG kettle over BLE")]
struct Cli {
    /// Device name or address fragment to connect to
    #[arg(long, global = true)]
    device: Option<String>,

    /// Keep the schedule submode in a shadow field instead of the wire's
    /// counter-aliased bit
    #[arg(long, global = true)]
    shadow_submode: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read and print the current kettle state
    Status {
        /// Print the state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Subscribe to notifications and print each state change
    Watch,
    /// Set the target temperature in Celsius
    SetTemp { celsius: f32 },
    /// Set the hold time in minutes (0-60)
    SetHold { minutes: u8 },
    /// Configure the schedule
    SetSchedule {
        /// off, once or daily
        #[arg(value_parser = parse_mode)]
        mode: ScheduleMode,
        #[arg(long, default_value_t = 0)]
        hour: u8,
        #[arg(long, default_value_t = 0)]
        minute: u8,
        /// Schedule temperature in Celsius
        #[arg(long, default_value_t = 100.0)]
        temp: f32,
    },
    /// Decode a 17-byte frame given as hex, without connecting
    Decode { hex: String },
}

fn parse_mode(s: &str) -> Result<ScheduleMode, String> {
    s.parse()
        .map_err(|_| format!("invalid schedule mode '{s}', expected off, once or daily"))
}

fn print_state(state: &KettleState) {
    println!("Kettle state:");
    println!("  Target: {:.1} °C", state.target_temperature);
    println!("  Units: {}", state.units);
    println!("  Pre-boil: {}", state.pre_boil_enabled);
    println!("  Altitude: {} m", state.altitude_meters);
    println!("  Hold time: {} min", state.hold_time_minutes);
    println!("  Schedule: {}", state.schedule);
    println!("  Clock: {:02}:{:02}", state.clock.hour, state.clock.minute);
}

async fn connect(
    device: Option<&str>,
    shadow_submode: bool,
) -> Result<Kettle<BleTransport>, Box<dyn Error>> {
    let policy = if shadow_submode {
        CounterPolicy::ShadowSubmode
    } else {
        CounterPolicy::WireCompatible
    };

    let transport = BleTransport::connect(device).await?;
    let kettle = Kettle::with_policy(transport, policy).await?;
    info!("connected");
    Ok(kettle)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();
    let Cli {
        device,
        shadow_submode,
        command,
    } = Cli::parse();

    match command {
        // Offline command, no connection needed
        Command::Decode { hex } => {
            let bytes = hex::decode(hex.trim())?;
            let state = RawFrame::parse(&bytes)?.decode();
            print_state(&state);
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Command::Status { json } => {
            let kettle = connect(device.as_deref(), shadow_submode).await?;
            let state = kettle.state().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                print_state(&state);
            }
        }
        Command::Watch => {
            let kettle = connect(device.as_deref(), shadow_submode).await?;
            let mut notifications = kettle.transport().subscribe().await?;
            println!("Watching for state changes, Ctrl-C to stop...");
            while let Some(bytes) = notifications.recv().await {
                match kettle.on_notification(&bytes).await {
                    Ok(state) => println!("{state}"),
                    Err(err) => eprintln!("bad notification: {err}"),
                }
            }
        }
        Command::SetTemp { celsius } => {
            let kettle = connect(device.as_deref(), shadow_submode).await?;
            let state = kettle.set_temperature(celsius).await?;
            println!("Target set to {:.1} °C", state.target_temperature);
        }
        Command::SetHold { minutes } => {
            let kettle = connect(device.as_deref(), shadow_submode).await?;
            let state = kettle.set_hold_time(minutes).await?;
            println!("Hold time set to {} min", state.hold_time_minutes);
        }
        Command::SetSchedule {
            mode,
            hour,
            minute,
            temp,
        } => {
            let kettle = connect(device.as_deref(), shadow_submode).await?;
            let state = kettle.set_schedule(mode, hour, minute, temp).await?;
            println!("Schedule: {}", state.schedule);
        }
    }

    Ok(())
}
