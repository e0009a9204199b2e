use std::io::{self, BufRead, StdinLock, Write};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use consultant_api::assessment::models::QUESTION_COUNT;
use consultant_api::client::api::HttpAssessmentApi;
use consultant_api::client::backend::{AuthService, HistoryStore, SupabaseClient};
use consultant_api::client::flow::{Flow, HistorySink};
use consultant_api::client::render::{render_evaluation, render_history, render_questions};
use consultant_api::client::session::SessionContext;
use consultant_api::config::ClientConfig;

#[derive(Parser, Debug)]
#[command(
    name = "consultant",
    version,
    about = "AI business consultant for the terminal.",
    long_about = None,
    propagate_version = true
)]
struct Cli {
    /// Assessment API base URL. Overrides CONSULTANT_API_URL.
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer four questions about your business and get an evaluation (default)
    Assess {
        /// Business field, e.g. "E-commerce". Prompted for when omitted.
        #[arg(long, value_name = "FIELD")]
        field: Option<String>,
    },
    /// Show your past evaluations
    History,
    /// Check that the API server is reachable
    Ping,
}

/// What the user chose at the end of an assessment.
enum Next {
    Again,
    Logout,
    Quit,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(error) = run_cli().await {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    let api = HttpAssessmentApi::new(&config.api_url);
    let mut console = Console::new();

    match cli.command.unwrap_or(Command::Assess { field: None }) {
        Command::Ping => ping(&api).await,
        Command::History => history(&config, &mut console).await,
        Command::Assess { field } => assess(&config, &api, &mut console, field).await,
    }
}

async fn ping(api: &HttpAssessmentApi) -> Result<()> {
    let health = api.health().await?;
    println!("{} v{}: {}", health.service, health.version, health.status);
    Ok(())
}

async fn history(config: &ClientConfig, console: &mut Console) -> Result<()> {
    let Some(supabase) = &config.supabase else {
        bail!("history needs SUPABASE_URL and SUPABASE_ANON_KEY");
    };
    let backend = SupabaseClient::new(supabase, &config.history_table);
    let mut session = SessionContext::attach(None, backend.on_auth_state_change());

    recheck_session(&backend, &mut session).await;
    if !session.is_signed_in() && !sign_in_gate(&backend, &mut session, console).await? {
        return Ok(());
    }
    let Some(current) = session.current() else {
        return Ok(());
    };
    let records = backend.list_history(&current).await?;
    println!("{}", render_history(&records));
    Ok(())
}

async fn assess(
    config: &ClientConfig,
    api: &HttpAssessmentApi,
    console: &mut Console,
    mut preset_field: Option<String>,
) -> Result<()> {
    let backend = config
        .supabase
        .as_ref()
        .map(|supabase| SupabaseClient::new(supabase, &config.history_table));
    let mut session = backend
        .as_ref()
        .map(|b| SessionContext::attach(None, b.on_auth_state_change()));

    loop {
        if let (Some(backend), Some(session)) = (&backend, session.as_mut()) {
            recheck_session(backend, session).await;
            if !session.is_signed_in() && !sign_in_gate(backend, session, console).await? {
                return Ok(());
            }
        }

        // Every sign-in starts from a clean slate.
        let mut flow = Flow::new();

        let next = loop {
            let sink = match (&backend, &session) {
                (Some(store), Some(session)) => Some(HistorySink { session, store }),
                _ => None,
            };
            if !run_assessment(&mut flow, api, sink, console, preset_field.take()).await? {
                break Next::Quit;
            }
            match choose_next(console, backend.is_some())? {
                Next::Again => continue,
                other => break other,
            }
        };

        match next {
            Next::Quit => return Ok(()),
            Next::Again => {}
            Next::Logout => {
                if let (Some(backend), Some(session)) = (&backend, session.as_mut()) {
                    if let Some(current) = session.current() {
                        if let Err(e) = backend.sign_out(&current).await {
                            println!("Logout reported an error: {e}");
                        }
                    }
                    session.wait_until(false).await;
                    println!("Logged out.");
                }
            }
        }
    }
}

/// Runs one field → questions → answers → evaluation pass.
/// Returns false when input ends or the user stops.
async fn run_assessment(
    flow: &mut Flow,
    api: &HttpAssessmentApi,
    sink: Option<HistorySink<'_>>,
    console: &mut Console,
    mut preset_field: Option<String>,
) -> Result<bool> {
    loop {
        let field = match preset_field.take() {
            Some(field) => field,
            None => match console.prompt("\nEnter your business field (e.g., E-commerce, SaaS, Retail): ")? {
                Some(field) => field,
                None => return Ok(false),
            },
        };
        flow.set_field(field);
        if !flow.can_generate() {
            println!("A business field is required.");
            continue;
        }

        println!("Generating questions...");
        flow.submit_field(api).await?;
        match flow.error() {
            Some(error) => println!("Error: {error}"),
            None => break,
        }
    }

    println!("\n{}", render_questions(flow.questions()));

    for i in 0..QUESTION_COUNT {
        loop {
            let Some(answer) = console.prompt(&format!("Your answer to Q{}: ", i + 1))? else {
                return Ok(false);
            };
            if answer.trim().is_empty() {
                println!("Please enter an answer.");
                continue;
            }
            flow.edit_answer(i, answer)?;
            break;
        }
    }

    loop {
        println!("Evaluating answers...");
        flow.submit_answers(api, sink).await?;
        let Some(error) = flow.error() else {
            break;
        };
        println!("Error: {error}");
        match console.prompt("Press Enter to retry, or type q to stop: ")? {
            Some(input) if !input.trim().eq_ignore_ascii_case("q") => continue,
            _ => return Ok(false),
        }
    }

    if let Some(evaluation) = flow.evaluation() {
        println!("\n{}", render_evaluation(evaluation));
    }
    Ok(true)
}

fn choose_next(console: &mut Console, can_logout: bool) -> Result<Next> {
    let menu = if can_logout {
        "\n[n]ew assessment, [l]ogout, [q]uit: "
    } else {
        "\n[n]ew assessment, [q]uit: "
    };
    loop {
        let Some(choice) = console.prompt(menu)? else {
            return Ok(Next::Quit);
        };
        match choice.trim().to_ascii_lowercase().as_str() {
            "n" | "new" => return Ok(Next::Again),
            "l" | "logout" if can_logout => return Ok(Next::Logout),
            "q" | "quit" => return Ok(Next::Quit),
            _ => println!("Unknown choice."),
        }
    }
}

/// Asks the service whether the current session is still good before it is
/// used. A network failure keeps the session as it is.
async fn recheck_session(backend: &SupabaseClient, session: &mut SessionContext) {
    let was_signed_in = session.is_signed_in();
    match session.confirm_session(backend).await {
        Ok(None) if was_signed_in => println!("Your session has expired. Please login again."),
        Ok(_) => {}
        Err(e) => warn!("Could not confirm session: {e}"),
    }
}

/// Login/register form. Returns false when the user leaves without signing in.
async fn sign_in_gate(
    backend: &SupabaseClient,
    session: &mut SessionContext,
    console: &mut Console,
) -> Result<bool> {
    let mut registering = false;
    loop {
        let title = if registering { "Register" } else { "Login" };
        let toggle = if registering {
            "Already have an account? Type 'switch' to login."
        } else {
            "Don't have an account? Type 'switch' to register."
        };
        println!("\n== {title} ==\n{toggle} Leave email empty to quit.");

        let Some(email) = console.prompt("Email: ")? else {
            return Ok(false);
        };
        let email = email.trim().to_string();
        if email.is_empty() {
            return Ok(false);
        }
        if email.eq_ignore_ascii_case("switch") {
            registering = !registering;
            continue;
        }
        let password = rpassword::prompt_password("Password: ")?;

        if registering {
            match backend.sign_up(&email, &password).await {
                Ok(()) => {
                    println!("Registered! Now login.");
                    registering = false;
                }
                Err(e) => println!("{e}"),
            }
        } else {
            match backend.sign_in_with_password(&email, &password).await {
                Ok(_) => {
                    session.wait_until(true).await;
                    println!("Login successful!");
                    if let Some(email) = session.current_user().and_then(|user| user.email) {
                        println!("Signed in as {email}");
                    }
                    return Ok(true);
                }
                Err(e) => println!("{e}"),
            }
        }
    }
}

struct Console {
    input: StdinLock<'static>,
}

impl Console {
    fn new() -> Self {
        Self {
            input: io::stdin().lock(),
        }
    }

    /// Prints `label` and reads one line. `None` at end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        print!("{label}");
        io::stdout().flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}
