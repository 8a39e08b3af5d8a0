//! Command dispatch

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::args::{Args, Command, ProfileCommand, RunArgs, SessionCommand};
use crate::chain::ChainExecutor;
use crate::client::HttpExecutor;
use crate::config::Config;
use crate::context::Workspace;
use crate::errors::{ReqtreeError, Result};
use crate::output::{self, Painter, ProgressObserver};
use crate::requests::AnyFileParser;
use crate::status::ExitStatus;
use crate::variables::{TerminalPrompter, TextResolver};

/// Runs the parsed command line, reporting errors on stderr.
pub async fn run(args: Args, cancel: CancellationToken) -> ExitStatus {
    match execute(&args, &cancel).await {
        Ok(status) => status,
        Err(e) => {
            eprintln!("{} {}", Painter::for_stderr().error("error:"), e);
            ExitStatus::from(&e)
        }
    }
}

async fn execute(args: &Args, cancel: &CancellationToken) -> Result<ExitStatus> {
    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring invalid config file");
        Config::default()
    });

    let root = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };
    let mut workspace = Workspace::open(root, config)?;

    if let Some(profile) = &args.profile {
        workspace.switch_profile(profile)?;
    }

    match &args.command {
        Command::Run(run) => run_chain(&mut workspace, run, args, cancel).await,
        Command::Plan { file } => plan(&workspace, file),
        Command::Session(command) => session(&mut workspace, command),
        Command::Profile(command) => profile(&mut workspace, command),
    }
}

/// A relative FILE resolves against the working directory `base`. The
/// current directory is only tried when `base` has no such file.
fn target_path(file: &Path, base: &Path) -> PathBuf {
    if file.is_absolute() {
        return file.to_path_buf();
    }
    let in_base = base.join(file);
    let in_cwd = std::env::current_dir().map(|cwd| cwd.join(file)).ok();

    match in_cwd {
        Some(in_cwd) if in_cwd.is_file() && !in_base.is_file() => {
            debug!(path = %in_cwd.display(), "Using request file from the current directory");
            in_cwd
        }
        Some(in_cwd) if in_cwd.is_file() && in_cwd != in_base => {
            warn!(
                using = %in_base.display(),
                ignored = %in_cwd.display(),
                "Request file exists in both the working and current directory"
            );
            in_base
        }
        _ => in_base,
    }
}

fn resolver(workspace: &Workspace, args: &Args) -> TextResolver {
    let resolver = TextResolver::new(workspace.config().shell_runner());
    if args.no_prompt || !std::io::stdin().is_terminal() {
        resolver
    } else {
        resolver.with_prompter(Arc::new(TerminalPrompter))
    }
}

async fn run_chain(
    workspace: &mut Workspace,
    run: &RunArgs,
    args: &Args,
    cancel: &CancellationToken,
) -> Result<ExitStatus> {
    for (name, value) in &run.set {
        workspace.store_mut().set_session(name.as_str(), value.as_str());
    }

    let config = workspace.config().clone();
    let parser = AnyFileParser;
    let executor = HttpExecutor::new(config.http_timeout, config.user_agent.as_deref())?;
    let resolver = resolver(workspace, args);
    let base = workspace.working_dir();
    let observer = ProgressObserver::new(&base, args.verbose || args.debug);
    let target = target_path(&run.file, &base);
    debug!(target = %target.display(), base = %base.display(), "Running chain");

    let mut chain = ChainExecutor::new(&parser, &executor, &resolver, &base)
        .with_default_headers(workspace.default_headers())
        .with_observer(&observer);

    if run.dry_run {
        let plan = chain.plan(&target)?;
        workspace.persist()?;
        print!("{}", output::render_plan(&plan, workspace.store(), &base, &Painter::for_stdout()));
        return Ok(ExitStatus::Success);
    }

    let outcome = chain.run(&target, workspace.store_mut(), cancel).await;
    // Values extracted before a failure are kept
    let persisted = workspace.persist();
    let outcome = outcome?;
    persisted?;

    print!("{}", output::render_response(&outcome.result, &Painter::for_stdout()));

    if run.check_status && !outcome.result.is_success() {
        return Ok(ExitStatus::Error);
    }
    Ok(ExitStatus::Success)
}

fn plan(workspace: &Workspace, file: &Path) -> Result<ExitStatus> {
    let resolver = TextResolver::default();
    let parser = AnyFileParser;
    let executor = HttpExecutor::new(workspace.config().http_timeout, None)?;
    let base = workspace.working_dir();

    let plan = ChainExecutor::new(&parser, &executor, &resolver, &base).plan(&target_path(file, &base))?;
    print!("{}", output::render_plan(&plan, workspace.store(), &base, &Painter::for_stdout()));
    Ok(ExitStatus::Success)
}

fn session(workspace: &mut Workspace, command: &SessionCommand) -> Result<ExitStatus> {
    match command {
        SessionCommand::Show => {
            print!("{}", output::render_variables(workspace.store(), &Painter::for_stdout()));
            return Ok(ExitStatus::Success);
        }
        SessionCommand::Set { name, value } => {
            workspace.store_mut().set_session(name.as_str(), value.as_str());
        }
        SessionCommand::Unset { name } => {
            if workspace.store_mut().remove_session(name).is_none() {
                return Err(ReqtreeError::Argument(format!("No session variable '{}'", name)));
            }
        }
        SessionCommand::Clear => workspace.store_mut().clear_session(),
    }
    workspace.persist()?;
    Ok(ExitStatus::Success)
}

fn profile(workspace: &mut Workspace, command: &ProfileCommand) -> Result<ExitStatus> {
    match command {
        ProfileCommand::List => {
            print!("{}", output::render_profiles(workspace, &Painter::for_stdout()));
        }
        ProfileCommand::Use { name } => {
            workspace.switch_profile(name)?;
            eprintln!("Active profile: {}", workspace.active_profile());
        }
        ProfileCommand::Select { variable, option } => {
            workspace.select(variable, option)?;
            let value = workspace.store().get(variable)?.unwrap_or_default();
            eprintln!("{} = {}", variable, value);
        }
    }
    Ok(ExitStatus::Success)
}
