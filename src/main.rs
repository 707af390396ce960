mod admin;
mod config;
mod console;
mod display;
mod files;
mod filter;
mod gateway;
mod indeed;
mod logging;
mod models;
mod mutation;
mod pipeline;
mod store;
#[cfg(test)]
mod testing;
mod tui;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use config::{Config, ConfigFile};
use console::{ConsoleNotifier, StdinConfirm};
use files::FileBrowser;
use filter::{CandidateFilter, Choice, EmployeeFilter, FileFilter, UserFilter};
use gateway::{Gateway, UploadForm};
use models::{
    Activity, AdminApproval, Candidate, CandidateUpdate, DEFAULT_PTO_HOURS, Employee, EntityKind, FileCategory,
    NewAbsence, NewAdministrativeAction, NewAward, NewCandidate, NewContract, NewEmployee, NewLicensure, NewUser,
    PipelineStatus, Role, SubCollectionItem, User, UserUpdate,
};
use mutation::{Coordinator, Outcome};
use pipeline::{Decision, STAGES};
use store::Collection;

#[derive(Parser)]
#[command(name = "staffdesk")]
#[command(about = "Admin console for the staffing backend - candidates, employees, files and users")]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true, env = "STAFFDESK_API_URL")]
    api_url: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, global = true, env = "STAFFDESK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    yes: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage candidates and the hiring pipeline
    Candidate {
        #[command(subcommand)]
        command: CandidateCommands,
    },

    /// Manage employees and their records
    Employee {
        #[command(subcommand)]
        command: EmployeeCommands,
    },

    /// Browse, upload and delete files
    File {
        #[command(subcommand)]
        command: FileCommands,
    },

    /// Manage console users (admin only)
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Database statistics and backups (admin only)
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// Indeed ATS synchronisation
    Indeed {
        #[command(subcommand)]
        command: IndeedCommands,
    },

    /// Show or change saved settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Interactive terminal browser for candidates and employees
    Browse,
}

#[derive(Subcommand)]
enum CandidateCommands {
    /// List candidates
    List {
        /// Match first name, last name or email
        #[arg(short, long, default_value = "")]
        search: String,

        /// Filter by pipeline status (all, applied, interviewing, offered, ...)
        #[arg(short, long, default_value = "all")]
        pipeline: Choice<PipelineStatus>,

        /// Filter by admin approval (all, pending, approved, denied)
        #[arg(short, long, default_value = "all")]
        approval: Choice<AdminApproval>,
    },

    /// Show one candidate
    Show {
        /// Candidate ID
        id: i64,
    },

    /// Add a candidate
    Add {
        first_name: String,
        last_name: String,
        email: String,

        #[arg(long)]
        phone: Option<String>,

        /// Path of an already uploaded resume
        #[arg(long)]
        resume: Option<String>,
    },

    /// Change contact details
    Update {
        /// Candidate ID
        id: i64,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },

    /// Move a candidate to a pipeline stage (applied, interviewing, offered)
    Status {
        /// Candidate ID
        id: i64,

        stage: PipelineStatus,
    },

    /// Approve a pending candidate
    Approve {
        /// Candidate ID
        id: i64,
    },

    /// Deny a pending candidate
    Deny {
        /// Candidate ID
        id: i64,
    },

    /// Delete a candidate
    Delete {
        /// Candidate ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum EmployeeCommands {
    /// List employees
    List {
        /// Match first name, last name or email
        #[arg(short, long, default_value = "")]
        search: String,

        /// Filter by status (all, active, former)
        #[arg(long, default_value = "all")]
        status: Choice<Activity>,
    },

    /// Show an employee with PTO and all records
    Show {
        /// Employee ID
        id: i64,
    },

    /// Add an employee
    Add {
        first_name: String,
        last_name: String,
        email: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<NaiveDate>,

        /// Initial PTO balance in hours
        #[arg(long, default_value_t = DEFAULT_PTO_HOURS)]
        pto: u32,
    },

    /// Add a record to an employee's file
    Record {
        /// Employee ID
        id: i64,

        #[command(subcommand)]
        item: RecordCommands,
    },

    /// Delete an employee
    Delete {
        /// Employee ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum RecordCommands {
    /// Add a contract
    Contract {
        title: String,

        /// Sign date (YYYY-MM-DD)
        #[arg(long)]
        signed: Option<NaiveDate>,

        /// Path of an already uploaded contract file
        #[arg(long)]
        path: Option<String>,
    },

    /// Add an administrative action
    Action {
        /// Action date (YYYY-MM-DD)
        date: NaiveDate,

        description: String,

        #[arg(long)]
        document: Option<String>,
    },

    /// Add an absence
    Absence {
        /// Absence date (YYYY-MM-DD)
        date: NaiveDate,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Add a licensure
    License {
        name: String,

        #[arg(long)]
        issuer: Option<String>,

        #[arg(long)]
        issued: Option<NaiveDate>,

        #[arg(long)]
        expires: Option<NaiveDate>,
    },

    /// Add an award
    Award {
        name: String,

        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        description: Option<String>,
    },
}

impl RecordCommands {
    fn into_item(self) -> SubCollectionItem {
        match self {
            RecordCommands::Contract { title, signed, path } => SubCollectionItem::Contract(NewContract {
                contract_title: title,
                sign_date: signed,
                contract_path: path,
            }),
            RecordCommands::Action { date, description, document } => {
                SubCollectionItem::AdministrativeAction(NewAdministrativeAction {
                    action_date: date,
                    description,
                    document_path: document,
                })
            }
            RecordCommands::Absence { date, reason } => SubCollectionItem::Absence(NewAbsence {
                absence_date: date,
                reason,
            }),
            RecordCommands::License { name, issuer, issued, expires } => SubCollectionItem::Licensure(NewLicensure {
                license_name: name,
                issuing_body: issuer,
                issue_date: issued,
                expiry_date: expires,
            }),
            RecordCommands::Award { name, date, description } => SubCollectionItem::Award(NewAward {
                award_name: name,
                award_date: date,
                description,
            }),
        }
    }
}

#[derive(Subcommand)]
enum FileCommands {
    /// List files, one table per category
    List {
        /// Only this category
        #[arg(short, long)]
        category: Option<FileCategory>,

        /// Match file name
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Upload a file
    Upload {
        /// Local file to send
        path: PathBuf,

        #[arg(short, long)]
        category: FileCategory,

        /// Attach to a candidate or employee
        #[arg(long, requires = "entity_id")]
        entity_kind: Option<EntityKind>,

        #[arg(long, requires = "entity_kind")]
        entity_id: Option<i64>,
    },

    /// Delete a file
    Delete {
        category: FileCategory,
        filename: String,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List users
    List {
        /// Match username or email
        #[arg(short, long, default_value = "")]
        search: String,

        /// Filter by role (all, admin, user, hr)
        #[arg(short, long, default_value = "all")]
        role: Choice<Role>,

        /// Filter by status (all, active, inactive)
        #[arg(long, default_value = "all", value_parser = filter::parse_active)]
        active: Choice<bool>,
    },

    /// Add a user
    Add {
        username: String,
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long, default_value = "user")]
        role: Role,

        /// Create the account disabled
        #[arg(long)]
        inactive: bool,
    },

    /// Change a user's details
    Update {
        /// User ID
        id: i64,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        role: Option<Role>,

        /// Enable or disable the account
        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete a user
    Delete {
        /// User ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Record counts and pipeline breakdown
    Stats,

    /// Ask the server to write a backup
    Backup,
}

#[derive(Subcommand)]
enum IndeedCommands {
    /// Show how many candidates are synced
    Status,

    /// Pull candidates from Indeed
    Sync,

    /// Push one candidate's pipeline status to Indeed
    Push {
        /// Candidate ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show effective settings
    Show,

    /// Save the backend base URL
    SetUrl { url: String },

    /// Save the bearer token
    SetToken { token: String },

    /// Forget the saved token
    ClearToken,

    /// Save the request timeout in seconds
    SetTimeout { seconds: u64 },
}

/// Turns a mutation outcome into the process exit code. Failures were
/// already reported by the notifier.
fn finish(outcome: Outcome) -> ExitCode {
    match outcome {
        Outcome::Applied | Outcome::Reloaded => ExitCode::SUCCESS,
        Outcome::Declined => {
            println!("Cancelled.");
            ExitCode::SUCCESS
        }
        Outcome::NotOffered | Outcome::Failed(_) => ExitCode::FAILURE,
    }
}

fn connect(api_url: Option<String>, token: Option<String>) -> Result<Gateway> {
    let path = ConfigFile::default_path()?;
    let file = ConfigFile::load(&path)?;
    let config = Config::resolve(api_url, token, &file)?;
    debug!(base_url = %config.base_url, token = %config.masked_token(), "connecting");
    Gateway::connect(&config)
}

fn load<R: gateway::Resource>(gateway: &Gateway) -> Result<Collection<R>> {
    let items = gateway
        .list::<R>()
        .with_context(|| format!("Failed to load {}s", R::NOUN))?;
    let mut store = Collection::new();
    store.load(items);
    Ok(store)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match &cli.command {
        Commands::Browse => match logging::init_file(&logging::log_dir(), cli.verbose) {
            Ok(guard) => Some(guard),
            Err(err) => {
                eprintln!("error: {:#}", err);
                return ExitCode::FAILURE;
            }
        },
        _ => {
            logging::init_stderr(cli.verbose);
            None
        }
    };

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let Cli { api_url, token, yes, command, .. } = cli;
    let confirm = StdinConfirm { assume_yes: yes };
    let notify = ConsoleNotifier;

    match command {
        Commands::Candidate { command } => {
            let gateway = connect(api_url, token)?;
            let coordinator = Coordinator::new(&gateway, &confirm, &notify);
            run_candidate(&coordinator, command)
        }

        Commands::Employee { command } => {
            let gateway = connect(api_url, token)?;
            let coordinator = Coordinator::new(&gateway, &confirm, &notify);
            run_employee(&coordinator, command)
        }

        Commands::File { command } => {
            let gateway = connect(api_url, token)?;
            let coordinator = Coordinator::new(&gateway, &confirm, &notify);
            run_file(&coordinator, command)
        }

        Commands::User { command } => {
            let gateway = connect(api_url, token)?;
            let coordinator = Coordinator::new(&gateway, &confirm, &notify);
            run_user(&coordinator, command)
        }

        Commands::Db { command } => {
            let gateway = connect(api_url, token)?;
            match command {
                DbCommands::Stats => {
                    let stats = admin::database_stats(&gateway).context("Failed to load database statistics")?;
                    print!("{}", display::stats_card(&stats));
                }
                DbCommands::Backup => {
                    let result = admin::backup(&gateway).context("Backup failed")?;
                    println!("Backup written: {}", result.backup_file);
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Indeed { command } => {
            let gateway = connect(api_url, token)?;
            let coordinator = Coordinator::new(&gateway, &confirm, &notify);
            match command {
                IndeedCommands::Status => {
                    let status = indeed::sync_status(&gateway).context("Failed to load Indeed sync status")?;
                    print!("{}", display::sync_card(&status));
                    Ok(ExitCode::SUCCESS)
                }
                IndeedCommands::Sync => {
                    let mut store = Collection::new();
                    Ok(finish(indeed::sync_candidates(&coordinator, &mut store)))
                }
                IndeedCommands::Push { id } => {
                    let mut store = load::<Candidate>(&gateway)?;
                    let outcome = indeed::push_status(&coordinator, &mut store, id);
                    if outcome.succeeded() {
                        if let Some(c) = store.get(id) {
                            println!("Indeed: {}", c.indeed_status.as_deref().unwrap_or("Not synced"));
                        }
                    }
                    Ok(finish(outcome))
                }
            }
        }

        Commands::Config { command } => {
            run_config(command, api_url, token)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Browse => {
            let gateway = connect(api_url, token)?;
            tui::run_browse(&gateway)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_candidate(coordinator: &Coordinator, command: CandidateCommands) -> Result<ExitCode> {
    let gateway = coordinator.gateway();
    match command {
        CandidateCommands::List { search, pipeline, approval } => {
            let store = load::<Candidate>(gateway)?;
            let predicate = CandidateFilter { search, pipeline, approval };
            let rows = filter::apply(store.items(), &predicate);
            if rows.is_empty() {
                println!("No candidates found.");
            } else {
                print!("{}", display::candidate_table(&rows));
            }
            Ok(ExitCode::SUCCESS)
        }

        CandidateCommands::Show { id } => {
            let store = load::<Candidate>(gateway)?;
            match store.get(id) {
                Some(candidate) => {
                    print!("{}", display::candidate_card(candidate));
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    println!("Candidate #{} not found.", id);
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        CandidateCommands::Add { first_name, last_name, email, phone, resume } => {
            let mut store: Collection<Candidate> = Collection::new();
            let body = NewCandidate {
                first_name,
                last_name,
                email,
                phone,
                resume_path: resume,
                pipeline_status: PipelineStatus::Applied,
            };
            Ok(finish(coordinator.create(&mut store, &body)))
        }

        CandidateCommands::Update { id, first_name, last_name, email, phone } => {
            let fields = CandidateUpdate {
                first_name,
                last_name,
                email,
                phone,
                pipeline_status: None,
            };
            if fields.first_name.is_none()
                && fields.last_name.is_none()
                && fields.email.is_none()
                && fields.phone.is_none()
            {
                bail!("Nothing to update; pass at least one field");
            }
            let mut store = load::<Candidate>(gateway)?;
            Ok(finish(coordinator.update(&mut store, id, &fields)))
        }

        CandidateCommands::Status { id, stage } => {
            if !STAGES.contains(&stage) {
                bail!("'{}' is not a pipeline stage; use applied, interviewing or offered", stage);
            }
            let mut store = load::<Candidate>(gateway)?;
            Ok(finish(coordinator.transition(&mut store, id, stage)))
        }

        CandidateCommands::Approve { id } => {
            let mut store = load::<Candidate>(gateway)?;
            Ok(finish(coordinator.decide(&mut store, id, Decision::Approve)))
        }

        CandidateCommands::Deny { id } => {
            let mut store = load::<Candidate>(gateway)?;
            Ok(finish(coordinator.decide(&mut store, id, Decision::Deny)))
        }

        CandidateCommands::Delete { id } => {
            let mut store: Collection<Candidate> = Collection::new();
            Ok(finish(coordinator.delete(&mut store, id)))
        }
    }
}

fn run_employee(coordinator: &Coordinator, command: EmployeeCommands) -> Result<ExitCode> {
    let gateway = coordinator.gateway();
    match command {
        EmployeeCommands::List { search, status } => {
            let store = load::<Employee>(gateway)?;
            let predicate = EmployeeFilter { search, activity: status };
            let rows = filter::apply(store.items(), &predicate);
            if rows.is_empty() {
                println!("No employees found.");
            } else {
                print!("{}", display::employee_table(&rows));
            }
            Ok(ExitCode::SUCCESS)
        }

        EmployeeCommands::Show { id } => {
            let employee = gateway
                .get::<Employee>(id)
                .with_context(|| format!("Failed to load employee #{}", id))?;
            print!("{}", display::employee_card(&employee));
            Ok(ExitCode::SUCCESS)
        }

        EmployeeCommands::Add { first_name, last_name, email, phone, address, start_date, pto } => {
            let mut store = Collection::new();
            let body = NewEmployee {
                first_name,
                last_name,
                email,
                phone,
                address,
                start_date,
                initial_pto_hours: pto,
            };
            Ok(finish(coordinator.create::<Employee, _>(&mut store, &body)))
        }

        EmployeeCommands::Record { id, item } => {
            let mut detail = gateway
                .get::<Employee>(id)
                .with_context(|| format!("Failed to load employee #{}", id))?;
            let outcome = coordinator.add_record(&mut detail, &item.into_item());
            if outcome.succeeded() {
                print!("{}", display::employee_card(&detail));
            }
            Ok(finish(outcome))
        }

        EmployeeCommands::Delete { id } => {
            let mut store: Collection<Employee> = Collection::new();
            Ok(finish(coordinator.delete(&mut store, id)))
        }
    }
}

fn run_file(coordinator: &Coordinator, command: FileCommands) -> Result<ExitCode> {
    let gateway = coordinator.gateway();
    let mut browser = FileBrowser::new();
    match command {
        FileCommands::List { category, search } => {
            let (categories, failed) = match category {
                Some(category) => (vec![category], usize::from(browser.refresh(gateway, category).is_err())),
                None => (FileCategory::ALL.to_vec(), browser.refresh_all(gateway)),
            };
            let predicate = FileFilter { search };
            for category in categories {
                let rows = filter::apply(browser.listing(category), &predicate);
                print!("{}", display::file_table(category, &rows, browser.error(category)));
                println!();
            }
            Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }

        FileCommands::Upload { path, category, entity_kind, entity_id } => {
            if !path.is_file() {
                bail!("Not a file: {}", path.display());
            }
            let form = UploadForm { path, category, entity_kind, entity_id };
            let outcome = browser.upload(coordinator, form);
            if outcome.succeeded() {
                let rows: Vec<_> = browser.listing(category).iter().collect();
                print!("{}", display::file_table(category, &rows, None));
            }
            Ok(finish(outcome))
        }

        FileCommands::Delete { category, filename } => Ok(finish(browser.delete(coordinator, category, &filename))),
    }
}

fn run_user(coordinator: &Coordinator, command: UserCommands) -> Result<ExitCode> {
    let gateway = coordinator.gateway();
    match command {
        UserCommands::List { search, role, active } => {
            let store = load::<User>(gateway)?;
            let predicate = UserFilter { search, role, active };
            let rows = filter::apply(store.items(), &predicate);
            if rows.is_empty() {
                println!("No users found.");
            } else {
                print!("{}", display::user_table(&rows));
            }
            Ok(ExitCode::SUCCESS)
        }

        UserCommands::Add { username, email, password, role, inactive } => {
            let mut store = Collection::new();
            let body = NewUser {
                username,
                email,
                password,
                role,
                is_active: !inactive,
            };
            Ok(finish(coordinator.create::<User, _>(&mut store, &body)))
        }

        UserCommands::Update { id, username, email, password, role, active } => {
            let fields = UserUpdate {
                username,
                email,
                password,
                role,
                is_active: active,
            };
            if fields.is_empty() {
                bail!("Nothing to update; pass at least one field");
            }
            let mut store = load::<User>(gateway)?;
            Ok(finish(coordinator.update(&mut store, id, &fields)))
        }

        UserCommands::Delete { id } => {
            let mut store: Collection<User> = Collection::new();
            Ok(finish(coordinator.delete(&mut store, id)))
        }
    }
}

fn run_config(command: ConfigCommands, api_url: Option<String>, token: Option<String>) -> Result<()> {
    let path = ConfigFile::default_path()?;
    let mut file = ConfigFile::load(&path)?;

    match command {
        ConfigCommands::Show => {
            let config = Config::resolve(api_url, token, &file)?;
            println!("Config file: {}", path.display());
            println!("API URL: {}", config.base_url);
            println!("Token: {}", config.masked_token());
            println!("Timeout: {}s", config.timeout_secs);
            println!("Log directory: {}", logging::log_dir().display());
            return Ok(());
        }
        ConfigCommands::SetUrl { url } => {
            let url = config::normalize_url(&url)?;
            println!("API URL set to {}", url);
            file.api_url = Some(url);
        }
        ConfigCommands::SetToken { token } => {
            if token.trim().is_empty() {
                bail!("Token must not be empty");
            }
            println!("Token saved ({})", config::mask(Some(&token)));
            file.token = Some(token);
        }
        ConfigCommands::ClearToken => {
            file.token = None;
            println!("Token cleared.");
        }
        ConfigCommands::SetTimeout { seconds } => {
            if seconds == 0 {
                bail!("Timeout must be at least one second");
            }
            file.timeout_secs = Some(seconds);
            println!("Timeout set to {}s", seconds);
        }
    }

    file.save(&path)
}
