//! # Headless Towns Client
//!
//! Drives the full protocol flow without graphics: connect, check the
//! version, log in, pick the first character, follow the handoff, load the
//! map, and then idle in game pinging the server.
//!
//! ## Usage
//!
//! ```bash
//! towns_client --config towns.toml --user alice --password secret --duration 30
//! ```

use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use towns_core::{BeingId, BeingManager, CharacterInfo};
use towns_networking::{
    ClientConfig, ClientState, ConnectWatchdog, GameStates, NetworkManager, Phase,
    UdpTransport, UserInterface, WatchdogStatus,
};

/// Time between process() calls.
const FRAME: Duration = Duration::from_millis(10);

/// Time between pings once in game.
const PING_INTERVAL: Duration = Duration::from_secs(2);

/// Tracks the most recent state request.
#[derive(Default)]
struct HeadlessStates {
    current: Option<ClientState>,
}

impl GameStates for HeadlessStates {
    fn request_state_change(&mut self, state: ClientState) {
        info!("State -> {:?}", state);
        self.current = Some(state);
    }

    fn load_map(&mut self, map: &str) -> Result<(), String> {
        if map.is_empty() {
            return Err("no map name".to_string());
        }
        info!("Loading map {} (headless, nothing to render)", map);
        Ok(())
    }
}

/// Prints to the terminal.
#[derive(Default)]
struct ConsoleInterface {
    characters: Vec<CharacterInfo>,
}

impl UserInterface for ConsoleInterface {
    fn report_error(&mut self, message: &str) {
        eprintln!("error: {message}");
    }

    fn show_characters(&mut self, characters: &[CharacterInfo]) {
        println!("Characters:");
        for character in characters {
            println!(
                "  [{}] {} (level {})",
                character.slot, character.name, character.level
            );
        }
        self.characters = characters.to_vec();
    }

    fn show_character_created(&mut self, character: &CharacterInfo) {
        println!("Created {} in slot {}", character.name, character.slot);
    }

    fn show_chat(&mut self, speaker: Option<BeingId>, text: &str) {
        match speaker {
            Some(id) => println!("<{id}> {text}"),
            None => println!("[server] {text}"),
        }
    }
}

/// Sends the password as-is. The server decides what it expects.
fn plain_password(_username: &str, password: &str) -> String {
    password.to_string()
}

struct Options {
    config: ClientConfig,
    username: String,
    password: String,
    duration: Option<Duration>,
    verbose: bool,
}

fn usage() {
    println!("Usage: towns_client [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>      TOML configuration file");
    println!("  -H, --host <HOST>        Account server host (overrides config)");
    println!("  -p, --port <PORT>        Account server port (overrides config)");
    println!("  -u, --user <NAME>        Account name");
    println!("  -w, --password <PASS>    Account password");
    println!("  -d, --duration <SECS>    Stay in game for N seconds then exit");
    println!("  -v, --verbose            Debug logging");
    println!("  -h, --help               Show this help");
}

fn parse_args() -> Result<Option<Options>, String> {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut host: Option<String> = None;
    let mut port: Option<u16> = None;
    let mut username = String::new();
    let mut password = String::new();
    let mut duration = None;
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match args[i].as_str() {
            "--config" | "-c" => {
                config_path = value;
                i += 1;
            }
            "--host" | "-H" => {
                host = value;
                i += 1;
            }
            "--port" | "-p" => {
                port = value.and_then(|v| v.parse().ok());
                i += 1;
            }
            "--user" | "-u" => {
                username = value.unwrap_or_default();
                i += 1;
            }
            "--password" | "-w" => {
                password = value.unwrap_or_default();
                i += 1;
            }
            "--duration" | "-d" => {
                duration = value
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_secs);
                i += 1;
            }
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" => {
                usage();
                return Ok(None);
            }
            other => return Err(format!("unknown argument {other}")),
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(path) => ClientConfig::load(&path).map_err(|e| e.to_string())?,
        None => ClientConfig::default(),
    };
    if let Some(host) = host {
        config.account.host = host;
    }
    if let Some(port) = port {
        config.account.port = port;
    }

    Ok(Some(Options {
        config,
        username,
        password,
        duration,
        verbose,
    }))
}

/// Steps of the scripted session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    AwaitConnection,
    AwaitVersion,
    AwaitLogin,
    AwaitCharacters,
    AwaitHandoff,
    InGame,
}

fn main() -> ExitCode {
    let options = match parse_args() {
        Ok(Some(options)) => options,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            usage();
            return ExitCode::FAILURE;
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if options.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("error: failed to install logger: {e}");
        return ExitCode::FAILURE;
    }

    warn!("Passwords are sent unhashed; use only against development servers");

    let config = options.config;
    let mut network = NetworkManager::new(
        UdpTransport::new(config.transport.clone()),
        &config,
        HeadlessStates::default(),
        ConsoleInterface::default(),
        BeingManager::new(),
    );
    let mut watchdog = ConnectWatchdog::new(config.connect_timeout());

    network.connect_default();
    watchdog.start(Instant::now());

    let mut step = Step::AwaitConnection;
    let mut in_game_since: Option<Instant> = None;
    let mut last_ping = Instant::now();

    loop {
        network.process();
        let now = Instant::now();

        if watchdog.poll(now, network.is_connected()) == WatchdogStatus::TimedOut {
            network.disconnect();
            eprintln!("error: Unable to connect to server");
            return ExitCode::FAILURE;
        }
        if network.game_states().current == Some(ClientState::Error) {
            network.disconnect();
            return ExitCode::FAILURE;
        }

        step = match step {
            Step::AwaitConnection if network.is_connected() => {
                network.send_version();
                Step::AwaitVersion
            }
            Step::AwaitVersion if network.phase() == Phase::VersionChecked => {
                if let Some(update_host) = network.update_host() {
                    info!("Updates available from {}", update_host);
                }
                network.login(&options.username, &options.password, &plain_password);
                Step::AwaitLogin
            }
            Step::AwaitLogin if network.phase() == Phase::Authenticated => {
                network.request_character_list();
                Step::AwaitCharacters
            }
            // Rejected logins fall back to the version-checked phase.
            Step::AwaitLogin if network.phase() == Phase::VersionChecked => {
                network.disconnect();
                return ExitCode::FAILURE;
            }
            Step::AwaitCharacters if network.phase() == Phase::Authenticated => {
                match network.ui().characters.first() {
                    Some(character) => {
                        info!("Playing {}", character.name);
                        let slot = character.slot;
                        network.choose_character(slot);
                        Step::AwaitHandoff
                    }
                    None => {
                        eprintln!("error: account has no characters");
                        network.disconnect();
                        return ExitCode::FAILURE;
                    }
                }
            }
            Step::AwaitHandoff if network.phase() == Phase::HandedOff => {
                if !watchdog.is_armed() {
                    watchdog.start(now);
                }
                Step::AwaitHandoff
            }
            Step::AwaitHandoff if network.phase() == Phase::Synchronized => {
                in_game_since = Some(now);
                Step::InGame
            }
            Step::InGame => {
                if network.phase() == Phase::Disconnected {
                    eprintln!("error: connection lost");
                    return ExitCode::FAILURE;
                }
                if now.duration_since(last_ping) >= PING_INTERVAL {
                    network.ping();
                    last_ping = now;
                    if let Some(latency) = network.latency() {
                        info!("Latency {:?}", latency);
                    }
                }
                let elapsed = in_game_since.map_or(Duration::ZERO, |t| now.duration_since(t));
                if options.duration.is_some_and(|limit| elapsed >= limit) {
                    info!("Session finished, {} beings in view", network.beings().len());
                    network.disconnect();
                    return ExitCode::SUCCESS;
                }
                Step::InGame
            }
            other => other,
        };

        thread::sleep(FRAME);
    }
}
