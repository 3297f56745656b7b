use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use gportal_core::{
    ClientConfig, DateRange, FileCache, FileSessionStore, GportalClient, SessionState, group_by_day,
    sort_by_period,
};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const CACHE_TTL_SECS: u64 = 60 * 60;

#[derive(Parser)]
#[command(name = "gportal", version, about = "Student portal client for the college ERP")]
struct Args {
    /// Where the session, cookies and page cache are kept
    #[arg(long, default_value = ".gportal", global = true)]
    state_dir: PathBuf,

    /// Overrides GPORTAL_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in; the captcha image is written to the state dir for you to read
    Login {
        #[arg(long)]
        user: String,
    },
    /// End the session on the server and forget it locally
    Logout,
    /// Print whether a session is stored
    Status,
    Attendance {
        #[arg(value_enum, default_value_t = AttendanceKind::Today)]
        view: AttendanceKind,
        /// dd/MM/yyyy, for subject and date views
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    /// Semesters and exams available for grade lookups
    GradeOptions,
    Grades {
        semester: String,
        #[arg(long, default_value = "All")]
        exam: String,
    },
    Profile,
    Official,
    Qualification,
    Timetable {
        #[arg(long)]
        weekly: bool,
        /// Group events by day, each day sorted by period
        #[arg(long)]
        by_day: bool,
    },
    Alerts,
}

#[derive(Clone, Copy, ValueEnum)]
enum AttendanceKind {
    Today,
    Monthly,
    Semester,
    Subject,
    Date,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gportal_core=info")),
        )
        .init();

    let args = Args::parse();
    tokio::fs::create_dir_all(&args.state_dir)
        .await
        .with_context(|| format!("could not create {}", args.state_dir.display()))?;

    let mut config = ClientConfig::from_env();
    if let Some(base_url) = args.base_url.clone() {
        config = config.with_base_url(base_url);
    }

    let client = GportalClient::new(config)?
        .with_store(Arc::new(FileSessionStore::new(args.state_dir.join("session.json"))))
        .with_cache(
            Arc::new(FileCache::new(args.state_dir.join("cache"))),
            CACHE_TTL_SECS,
        );
    client.init().await;

    let cookie_file = args.state_dir.join("cookies.json");
    if cookie_file.exists() {
        if let Err(e) = client.load_cookies(&cookie_file).await {
            tracing::warn!(error = %e, "ignoring unreadable cookie file");
        }
    }

    let outcome = run(&client, &args).await;
    client
        .save_cookies(&cookie_file)
        .await
        .context("could not save cookies")?;
    outcome
}

async fn run(client: &GportalClient, args: &Args) -> anyhow::Result<()> {
    match &args.command {
        Command::Login { user } => login(client, &args.state_dir, user).await,
        Command::Logout => {
            client.logout().await;
            println!("Logged out.");
            Ok(())
        }
        Command::Status => {
            match client.session().await {
                Ok(state) => println!("Logged in (student id {}).", state.subject_id),
                Err(_) => println!("Not logged in."),
            }
            Ok(())
        }
        Command::Attendance { view, from, to } => {
            let state = session(client).await?;
            match view {
                AttendanceKind::Today => print_json(&client.fetch_today_attendance(&state).await?),
                AttendanceKind::Monthly => print_json(&client.fetch_monthly_attendance(&state).await?),
                AttendanceKind::Semester => print_json(&client.fetch_semester_attendance(&state).await?),
                AttendanceKind::Subject => {
                    let range = date_range(from.as_deref(), to.as_deref())?;
                    print_json(&client.fetch_subject_attendance(&state, range).await?)
                }
                AttendanceKind::Date => {
                    let range = date_range(from.as_deref(), to.as_deref())?;
                    print_json(&client.fetch_date_attendance(&state, range).await?)
                }
            }
        }
        Command::GradeOptions => {
            let state = session(client).await?;
            let options = client.fetch_grade_options(&state).await?;
            print_json(&(&options.semesters, &options.exams))
        }
        Command::Grades { semester, exam } => {
            let state = session(client).await?;
            // The exam page hands out its own tokens; the landing page's are refused.
            let options = client.fetch_grade_options(&state).await?;
            print_json(&client.fetch_grades_for_exam(&options.state, semester, exam).await?)
        }
        Command::Profile => {
            let state = session(client).await?;
            print_json(&client.fetch_profile(&state).await?)
        }
        Command::Official => {
            let state = session(client).await?;
            print_json(&client.fetch_official_details(&state).await?)
        }
        Command::Qualification => {
            let state = session(client).await?;
            print_json(&client.fetch_qualification(&state).await?)
        }
        Command::Timetable { weekly, by_day } => {
            let state = session(client).await?;
            let mut events = if *weekly {
                client.fetch_weekly_timetable(&state).await?
            } else {
                client.fetch_today_timetable(&state).await?
            };
            if *by_day {
                print_json(&group_by_day(&events))
            } else {
                sort_by_period(&mut events);
                print_json(&events)
            }
        }
        Command::Alerts => {
            let state = session(client).await?;
            print_json(&client.fetch_alerts(&state).await?)
        }
    }
}

async fn login(client: &GportalClient, state_dir: &Path, user: &str) -> anyhow::Result<()> {
    let challenge = client.fetch_login_challenge().await?;
    let image = client.captcha_image(&challenge).await?;
    let captcha_file = state_dir.join("captcha.png");
    tokio::fs::write(&captcha_file, image)
        .await
        .with_context(|| format!("could not write {}", captcha_file.display()))?;
    println!("Captcha saved to {}", captcha_file.display());

    let password = match std::env::var("GPORTAL_PASSWORD") {
        Ok(password) => password,
        Err(_) => prompt("Password: ")?,
    };
    let captcha = prompt("Captcha: ")?;

    let state = client.login(user, &password, &captcha).await?;
    println!("Logged in (student id {}).", state.subject_id);
    Ok(())
}

async fn session(client: &GportalClient) -> anyhow::Result<SessionState> {
    client
        .session()
        .await
        .context("no stored session, run `gportal login` first")
}

fn date_range(from: Option<&str>, to: Option<&str>) -> anyhow::Result<DateRange> {
    let (Some(from), Some(to)) = (from, to) else {
        bail!("--from and --to are required for this view (dd/MM/yyyy)");
    };
    Ok(DateRange::parse(from, to)?)
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
