// Main entry point for the MockBase console
// An interactive shell over an in-memory mock backend, for poking at fixture data

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use mockbase::response::format_table;
use mockbase::{Credentials, MockClient, MockConfig, QueryParser, Record, Response, SingleRowPolicy};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// MockBase - query an in-memory mock of the workout tracker's backend
#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with mock behaviour settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Error when a single-row query matches more than one row
    #[arg(long)]
    strict_single: bool,

    /// Return only the columns named in SELECT
    #[arg(long)]
    project: bool,

    /// JSON file of `{ "table": [records...] }` to load at startup
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// Execute a single SQL command and exit
    #[arg(short, long)]
    execute: Option<String>,

    /// Print results as `{ data, error }` JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Log evaluation details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;
    let mut client = MockClient::with_config(&config);

    if let Some(path) = &args.seed {
        load_seed(&mut client, path)?;
    }

    // If a command was provided, execute it and exit
    if let Some(sql) = &args.execute {
        return execute_query(&mut client, sql, args.json);
    }

    println!("╔════════════════════════════════════════════╗");
    println!("║         MockBase Interactive Shell         ║");
    println!("║   An in-memory backend for workout data    ║");
    println!("╚════════════════════════════════════════════╝");
    println!();
    println!("Type SQL commands or '.help' for help");
    println!("Type '.exit' to quit");
    println!();

    let json = args.json;
    repl(|input| {
        if input.starts_with('.') {
            run_dot_command(&mut client, input)
        } else {
            execute_query(&mut client, input, json).map(|_| true)
        }
    })
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("mockbase=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mockbase=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

/// Load the config file (if any) and apply command line overrides
fn load_config(args: &Args) -> Result<MockConfig> {
    let mut config = match &args.config {
        Some(path) => MockConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => MockConfig::default(),
    };

    if args.strict_single {
        config.single_row_policy = SingleRowPolicy::Strict;
    }
    if args.project {
        config.enforce_projection = true;
    }

    Ok(config)
}

fn load_seed(client: &mut MockClient, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    let fixtures = serde_json::from_str(&content)?;
    client.load_fixtures(fixtures)?;
    Ok(())
}

/// REPL (Read-Eval-Print Loop)
/// The handler returns Ok(false) to stop the loop
fn repl<F>(mut handle: F) -> Result<()>
where
    F: FnMut(&str) -> Result<bool>,
{
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("mockbase> ");
        stdout.flush()?;

        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match handle(input) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("Error: {:#}", e),
        }
    }

    Ok(())
}

/// Handle a console command starting with '.'
fn run_dot_command(client: &mut MockClient, input: &str) -> Result<bool> {
    let mut parts = input.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let argument = parts.next();

    match (command, argument) {
        (".exit" | ".quit", _) => {
            println!("Goodbye!");
            return Ok(false);
        }
        (".help", _) => print_help(),
        (".tables", _) => {
            for name in client.store().table_names() {
                println!("  {} ({} rows)", name, client.store().row_count(&name));
            }
        }
        (".reset", _) => {
            client.reset_mock_data();
            println!("All tables emptied");
        }
        (".seed", Some(path)) => {
            load_seed(client, Path::new(path))?;
            println!("Seeded from {}", path);
        }
        (".signup", Some(email)) => {
            let password = parts.next().unwrap_or_default();
            let response = client.auth().sign_up(&Credentials::new(email, password));
            let user = response.into_result()?;
            println!("Signed up {}", display_user(user.map(|data| data.user)));
        }
        (".login", Some(email)) => {
            let response = client
                .auth()
                .sign_in_with_password(&Credentials::new(email, ""));
            let user = response.into_result()?;
            println!("Signed in {}", display_user(user.map(|data| data.user)));
        }
        (".logout", _) => {
            client.auth().sign_out();
            println!("Signed out");
        }
        (".whoami", _) => {
            println!("{}", display_user(client.auth().get_user().data.user));
        }
        _ => {
            println!("Unknown command: {}", input);
            println!("Type '.help' for help");
        }
    }

    Ok(true)
}

fn display_user(user: Option<Record>) -> String {
    user.and_then(|user| user.get("email").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| "(nobody)".to_string())
}

/// Parse and run one SQL statement, printing the result
fn execute_query(client: &mut MockClient, sql: &str, json: bool) -> Result<()> {
    let statement = QueryParser::parse(sql)?;
    let (store, executor) = client.parts();
    let response = executor.execute(store, statement);
    print_response(&response, json)
}

fn print_response(response: &Response<Vec<Record>>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }

    match &response.error {
        Some(error) => eprintln!("Error: {}", error),
        None => println!("{}", format_table(&response.data)),
    }
    Ok(())
}

/// Print help information
fn print_help() {
    println!("Special Commands:");
    println!("  .help                      Show this help message");
    println!("  .tables                    List tables and row counts");
    println!("  .reset                     Empty every table and sign out");
    println!("  .seed <file.json>          Load {{\"table\": [records...]}} fixtures");
    println!("  .signup <email> <password> Create a user and sign in");
    println!("  .login <email>             Sign in as an existing user");
    println!("  .logout                    Sign out");
    println!("  .whoami                    Show the signed-in user");
    println!("  .exit, .quit               Exit the shell");
    println!();
    println!("Supported SQL:");
    println!("  SELECT * FROM workouts WHERE user_id = 'u1' ORDER BY date DESC LIMIT 5");
    println!("  SELECT name, muscle FROM exercises WHERE name LIKE '%press%'");
    println!("  INSERT INTO exercises (name, muscle) VALUES ('squat', 'legs')");
    println!("  INSERT INTO workouts VALUES ('{{\"user_id\": \"u1\", \"sets\": [5, 5, 5]}}')");
    println!("  UPDATE workouts SET status = 'done' WHERE id = 'w1'");
    println!("  DELETE FROM workouts WHERE volume < 100");
    println!();
    println!("Notes:");
    println!("  - WHERE supports =, <>, >, >=, <, <=, LIKE and IN, joined with AND");
    println!("  - LIKE strips '%' and matches substrings");
    println!("  - UPDATE and DELETE without WHERE touch every row");
    println!();
}
