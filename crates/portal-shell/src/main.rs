use anyhow::{anyhow, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use portal_apps::AppView;
use portal_nav::NavItem;
use portal_shell::{PortalShell, ShellConfig};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn cli() -> Command {
    Command::new("portal")
        .version(portal_shell::VERSION)
        .about("Portal shell: mini-app runtime and navigation")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .default_value("portal.toml")
                .value_parser(value_parser!(PathBuf))
                .help("Shell config file (.toml, .json, .yaml)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("Log filter, overrides RUST_LOG (e.g. debug, portal_apps=trace)"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("apps")
                .about("List configured mini-apps")
                .arg(
                    Arg::new("load")
                        .long("load")
                        .action(ArgAction::SetTrue)
                        .help("Load every manifest and report failures"),
                ),
        )
        .subcommand(
            Command::new("nav")
                .about("Show filtered navigation")
                .arg(Arg::new("context").long("context").help("Select context"))
                .arg(Arg::new("persona").long("persona").help("Select persona"))
                .arg(
                    Arg::new("roles")
                        .long("roles")
                        .value_delimiter(',')
                        .help("Comma separated user roles"),
                )
                .arg(
                    Arg::new("permissions")
                        .long("permissions")
                        .value_delimiter(',')
                        .help("Comma separated user permissions"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("open")
                .about("Open an app path and print what the shell renders")
                .arg(Arg::new("path").required(true).help("e.g. /portal/apps/cms")),
        )
}

fn init_tracing(level: Option<&String>) {
    let filter = level.map_or_else(
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        EnvFilter::new,
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_one::<String>("log-level"));

    let config_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("portal.toml"));
    let config = ShellConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let shell = PortalShell::from_config(config).context("building shell")?;

    match matches.subcommand() {
        Some(("apps", args)) => list_apps(&shell, args.get_flag("load")).await,
        Some(("nav", args)) => show_nav(&shell, args),
        Some(("open", args)) => {
            let path = args
                .get_one::<String>("path")
                .context("missing path")?;
            open(&shell, path).await
        }
        _ => Ok(()),
    }
}

async fn list_apps(shell: &PortalShell, load: bool) -> Result<()> {
    for entry in &shell.config().apps {
        if !load {
            println!("{}\t{}", entry.app_id, entry.locator);
            continue;
        }
        match shell.registry().load_app(entry.app_id.clone(), &entry.locator).await {
            Ok(module) => {
                let summary = module.summary();
                println!(
                    "{}\t{} v{}\t{}",
                    summary.id,
                    summary.display_name,
                    module.config().version,
                    summary.category
                );
            }
            Err(e) => println!("{}\terror: {}", entry.app_id, e),
        }
    }
    Ok(())
}

fn show_nav(shell: &PortalShell, args: &ArgMatches) -> Result<()> {
    let navigation = shell.navigation();
    if let Some(context) = args.get_one::<String>("context") {
        navigation.set_active_context_id(context.as_str());
    }
    if let Some(persona) = args.get_one::<String>("persona") {
        navigation.set_active_persona_id(persona.as_str());
    }
    let roles: Vec<String> = args
        .get_many::<String>("roles")
        .map(|v| v.cloned().collect())
        .unwrap_or_default();
    let permissions: Vec<String> = args
        .get_many::<String>("permissions")
        .map(|v| v.cloned().collect())
        .unwrap_or_default();
    navigation.set_access(roles, permissions);

    let state = navigation.snapshot();
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    println!(
        "context: {}",
        state.active_context_id.as_deref().unwrap_or("-")
    );
    println!(
        "persona: {}",
        state.active_persona_id.as_deref().unwrap_or("-")
    );
    print_items(&state.filtered_nav_items, 0);
    Ok(())
}

fn print_items(items: &[NavItem], depth: usize) {
    for item in items {
        println!("{}{}\t{}", "  ".repeat(depth), item.title, item.url);
        print_items(&item.children, depth + 1);
    }
}

async fn open(shell: &PortalShell, path: &str) -> Result<()> {
    let view = shell.open(path).await?;
    let trail: Vec<&str> = view.breadcrumbs.iter().map(|c| c.label.as_str()).collect();
    println!("{}", trail.join(" / "));
    println!("{}", render_app(view.app)?);
    Ok(())
}

/// Text for the app panel; a failed load becomes the command's error
fn render_app(app: AppView) -> Result<String> {
    match app {
        AppView::Idle => Ok("(no app selected)".to_string()),
        AppView::Loading { app_id } => Ok(format!("loading {app_id}...")),
        AppView::Error { message, .. } => Err(anyhow!(message)),
        AppView::App { title, body, .. } => Ok(format!("== {title} ==\n{body}")),
    }
}
