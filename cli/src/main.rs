use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use session::config::ClientConfig;
use session::dashboard::{self, DashboardSummary};
use session::error::ConfigError;
use session::forms::{DEFAULT_PAGE_LIMIT, FormsApi};
use session::token::FileTokenStore;
use session::types::{FormInput, FormSettings, ProfileUpdate};
use session::{ApiError, HttpClient, SessionController, SessionError, TokenStore};


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("not signed in; run `formbase login` first")]
    NotSignedIn,
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("missing `{0}`; pass it as a flag or set it in the environment")]
    MissingArgument(&'static str),
    #[error("invalid JSON output: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "formbase", about = "Formbase account and forms CLI")]
struct Cli {
    #[arg(long, env = "FORMBASE_API_URL")]
    api_url: Option<String>,

    /// Where the session token is persisted.
    #[arg(long, env = "FORMBASE_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login(CredentialArgs),
    Signup(CredentialArgs),
    Logout,
    Whoami,
    /// Adopt a token from an OAuth redirect.
    Callback {
        #[arg(long)]
        token: String,
    },
    ResetPassword {
        #[arg(long)]
        token: String,
        #[arg(long, env = "FORMBASE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Profile(ProfileCommand),
    Forms(FormsCommand),
    Dashboard,
}

#[derive(Args, Debug)]
struct CredentialArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "FORMBASE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
        #[arg(long)]
        website: Option<String>,
    },
}

#[derive(Args, Debug)]
struct FormsCommand {
    #[command(subcommand)]
    command: FormsSubcommand,
}

#[derive(Subcommand, Debug)]
enum FormsSubcommand {
    List,
    Get {
        form_id: String,
    },
    Create(FormArgs),
    Update {
        form_id: String,
        #[command(flatten)]
        form: FormArgs,
    },
    Delete {
        form_id: String,
    },
    Submissions {
        form_id: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: u32,
    },
    Stats {
        form_id: String,
    },
}

#[derive(Args, Debug, Clone)]
struct FormArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    redirect_url: Option<String>,
    #[arg(long)]
    notify_email: Option<String>,
    #[arg(long)]
    honeypot_field: Option<String>,
    #[arg(long = "allowed-origin")]
    allowed_origins: Vec<String>,
}

impl From<FormArgs> for FormInput {
    fn from(args: FormArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            settings: FormSettings {
                redirect_url: args.redirect_url,
                notify_email: args.notify_email,
                honeypot_field: args.honeypot_field,
                allowed_origins: args.allowed_origins,
            },
        }
    }
}

struct CliContext {
    session: SessionController,
    forms: FormsApi,
}

impl CliContext {
    fn new(config: &ClientConfig, token_file: PathBuf) -> Result<Self, CliError> {
        let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(token_file, &config.base_url));
        let http = HttpClient::native(config, tokens)?;
        let session = SessionController::from_config(http.clone(), config);
        Ok(Self { session, forms: FormsApi::new(http) })
    }

    /// Restore the persisted session and require it to be valid.
    async fn require_session(&self) -> Result<(), CliError> {
        self.session.hydrate().await?;
        if self.session.is_authenticated() { Ok(()) } else { Err(CliError::NotSignedIn) }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = resolve_config(cli.api_url.as_deref())?;
    let token_file = cli.token_file.unwrap_or_else(default_token_file);
    tracing::debug!(api = %config.base_url, token_file = %token_file.display(), "starting");

    let ctx = CliContext::new(&config, token_file)?;
    let result = run(&ctx, cli.command).await;
    ctx.session.shutdown();
    result
}

fn resolve_config(api_url: Option<&str>) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = api_url {
        config.base_url = url.trim().trim_end_matches('/').to_owned();
    }
    Ok(config)
}

fn default_token_file() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".formbase").join("session.json"))
        .unwrap_or_else(|| PathBuf::from(".formbase-session.json"))
}

async fn run(ctx: &CliContext, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login(args) => {
            let password = args.password.ok_or(CliError::MissingArgument("password"))?;
            ctx.session.hydrate().await?;
            let route = ctx.session.login(&args.email, &password).await?;
            print_json(&serde_json::json!({ "user": ctx.session.user(), "next": route.path() }))
        }
        Command::Signup(args) => {
            let password = args.password.ok_or(CliError::MissingArgument("password"))?;
            let message = ctx.session.signup(&args.email, &password).await?;
            print_json(&serde_json::json!({ "message": message }))
        }
        Command::Logout => {
            let route = ctx.session.logout();
            print_json(&serde_json::json!({ "next": route.path() }))
        }
        Command::Whoami => {
            ctx.require_session().await?;
            print_json(&ctx.session.user())
        }
        Command::Callback { token } => {
            ctx.session.hydrate().await?;
            let route = ctx.session.set_token_from_callback(&token).await?;
            print_json(&serde_json::json!({ "user": ctx.session.user(), "next": route.path() }))
        }
        Command::ResetPassword { token, password } => {
            let message = ctx.session.reset_password(&token, &password).await?;
            print_json(&serde_json::json!({ "message": message }))
        }
        Command::Profile(profile) => run_profile(ctx, profile).await,
        Command::Forms(forms) => run_forms(ctx, forms).await,
        Command::Dashboard => {
            ctx.require_session().await?;
            let summary = dashboard::load_dashboard(&ctx.forms).await?;
            print_json(&dashboard_json(&summary))
        }
    }
}

async fn run_profile(ctx: &CliContext, profile: ProfileCommand) -> Result<(), CliError> {
    ctx.require_session().await?;
    match profile.command {
        ProfileSubcommand::Update { name, bio, avatar_url, website } => {
            let update = ProfileUpdate { name, bio, avatar_url, website };
            let user = ctx.session.update_profile(&update).await?;
            print_json(&user)
        }
    }
}

async fn run_forms(ctx: &CliContext, forms: FormsCommand) -> Result<(), CliError> {
    ctx.require_session().await?;
    match forms.command {
        FormsSubcommand::List => print_json(&ctx.forms.list().await?),
        FormsSubcommand::Get { form_id } => print_json(&ctx.forms.get(&form_id).await?),
        FormsSubcommand::Create(form) => print_json(&ctx.forms.create(&form.into()).await?),
        FormsSubcommand::Update { form_id, form } => {
            print_json(&ctx.forms.update(&form_id, &form.into()).await?)
        }
        FormsSubcommand::Delete { form_id } => {
            ctx.forms.delete(&form_id).await?;
            print_json(&serde_json::json!({ "deleted": form_id }))
        }
        FormsSubcommand::Submissions { form_id, page, limit } => {
            print_json(&ctx.forms.submissions(&form_id, page, limit).await?)
        }
        FormsSubcommand::Stats { form_id } => print_json(&ctx.forms.statistics(&form_id).await?),
    }
}

fn dashboard_json(summary: &DashboardSummary) -> serde_json::Value {
    let forms: Vec<serde_json::Value> = summary
        .forms
        .iter()
        .map(|row| {
            serde_json::json!({
                "id": row.form.id,
                "name": row.form.name,
                "totalSubmissions": row.stats.total_submissions,
                "submissionsToday": row.stats.submissions_today,
                "statsLoaded": row.stats_loaded,
            })
        })
        .collect();
    serde_json::json!({
        "formCount": summary.form_count,
        "totalSubmissions": summary.total_submissions,
        "submissionsToday": summary.submissions_today,
        "submissionsThisWeek": summary.submissions_this_week,
        "busiestForm": summary.busiest_form,
        "forms": forms,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
