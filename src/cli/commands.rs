use crate::config::{AppConfig, RuntimeConfig};
use crate::dispatcher::{DispatchRequest, Dispatcher};
use crate::echo::echo_handler;
use crate::middleware::{CsrfGuard, MetricsMiddleware, Middleware, SessionGuard, TracingMiddleware};
use crate::server::{AppService, HttpServer};
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use http::Method;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command-line interface for routewise
#[derive(Parser, Debug)]
#[command(name = "routewise")]
#[command(about = "Route matching and request dispatch", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the configured routes with echo handlers
    Serve {
        /// Path to the YAML configuration file
        #[arg(short, long, env = "ROUTEWISE_CONFIG")]
        config: PathBuf,

        /// Address to bind; overrides `server.addr`
        #[arg(long)]
        addr: Option<String>,
    },
    /// List the configured routes in registration order
    Routes {
        #[arg(short, long, env = "ROUTEWISE_CONFIG")]
        config: PathBuf,
    },
    /// Show the route a request would be dispatched to
    Match {
        #[arg(short, long, env = "ROUTEWISE_CONFIG")]
        config: PathBuf,

        /// Request method, e.g. GET
        method: String,

        /// Request target; query string and fragment are ignored for matching
        target: String,
    },
}

/// Build the dispatcher described by `config`.
///
/// The pipeline runs `metrics`, `tracing`, then `session` and `csrf` when
/// configured. The returned metrics handle is the same instance the pipeline uses.
///
/// # Errors
///
/// Returns an error when a route cannot be registered.
pub fn build_dispatcher(config: &AppConfig) -> anyhow::Result<(Dispatcher, Arc<MetricsMiddleware>)> {
    let mut dispatcher = Dispatcher::with_config(config.dispatcher_config());

    let metrics = Arc::new(MetricsMiddleware::new());
    dispatcher.add_middleware(Arc::clone(&metrics) as Arc<dyn Middleware>);
    dispatcher.add_middleware(Arc::new(TracingMiddleware));

    if let Some(session) = &config.session {
        let mut guard = SessionGuard::with_tokens(session.tokens.clone())
            .header(&session.header)
            .cookie(session.cookie.as_deref());
        if let Some(location) = &session.login_redirect {
            guard = guard.redirect_to(location);
        }
        dispatcher.add_middleware(Arc::new(guard));
    }

    if let Some(csrf) = config.csrf.as_ref().filter(|c| c.enabled) {
        dispatcher.add_middleware(Arc::new(CsrfGuard::new(&csrf.cookie, &csrf.header)));
    }

    for (index, entry) in config.routes.iter().enumerate() {
        let method = entry
            .method()
            .ok_or_else(|| anyhow!("routes[{index}]: unsupported method '{}'", entry.method))?;
        dispatcher
            .register_with(method, &entry.template, entry.options(), echo_handler)
            .with_context(|| format!("routes[{index}]: {}", entry.template))?;
    }

    Ok((dispatcher, metrics))
}

/// Describe how `method target` would be routed, one line per fact.
///
/// # Errors
///
/// Returns an error when `method` is not a valid method token.
pub fn match_report(dispatcher: &Dispatcher, method: &str, target: &str) -> anyhow::Result<String> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid method '{method}'"))?;
    let req = DispatchRequest::from_target(method, target);

    let Some(matched) = dispatcher.routes().route(req.method(), req.path()) else {
        return Ok(format!("{} {} -> no match", req.method(), req.path()));
    };

    let mut report = format!(
        "{} {} -> {} {}",
        req.method(),
        req.path(),
        matched.route.method(),
        matched.route.template()
    );
    if let Some(name) = matched.route.name() {
        report.push_str(&format!(" [{name}]"));
    }
    for (name, value) in matched.params.iter() {
        report.push_str(&format!("\n  {name} = {value}"));
    }
    Ok(report)
}

/// Execute a parsed command.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded, a route is invalid, or the
/// server fails to start.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Serve { config, addr } => {
            let app = AppConfig::load(config)?;
            let runtime = RuntimeConfig::from_env();
            runtime.apply();

            let (dispatcher, metrics) = build_dispatcher(&app)?;
            info!(
                routes = dispatcher.routes().len(),
                middleware = ?dispatcher.pipeline().names(),
                stack_size = runtime.stack_size,
                "Dispatcher ready"
            );

            let service = AppService::new(Arc::new(dispatcher)).with_metrics(metrics);
            let addr = addr.as_deref().unwrap_or(&app.server.addr);
            let handle = HttpServer(service).start(addr)?;
            handle
                .join()
                .map_err(|e| anyhow!("server coroutine panicked: {e:?}"))?;
            Ok(())
        }
        Commands::Routes { config } => {
            let app = AppConfig::load(config)?;
            let (dispatcher, _) = build_dispatcher(&app)?;
            for line in dispatcher.routes().describe() {
                println!("{line}");
            }
            Ok(())
        }
        Commands::Match {
            config,
            method,
            target,
        } => {
            let app = AppConfig::load(config)?;
            let (dispatcher, _) = build_dispatcher(&app)?;
            println!("{}", match_report(&dispatcher, method, target)?);
            Ok(())
        }
    }
}

/// Parse the process arguments and execute the command.
///
/// # Errors
///
/// See [`run`].
pub fn run_cli() -> anyhow::Result<()> {
    run(&Cli::parse())
}
