//! Subcommand: `sanctum run` -- interactive shell.
//!
//! Boots the system, launches an app and forwards each input line to it.
//! Lines starting with `:` are shell commands handled here instead.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use sanctum_system::{Pid, Priority, System, SystemConfig};
use tracing::info;

use crate::boot_system;

const SHELL_HELP: &str = "\
Shell commands:
  :apps              list installed apps
  :ps                list processes
  :windows           list windows, back to front
  :notifications     list notifications, newest first
  :launch <app-id>   launch an app and attach to it
  :attach <pid>      send input to another process
  :kill <pid>        terminate a process
  :notify <text>     post a notification
  :help              show this help
  :quit              shut down and exit";

/// What the loop should do after a shell command.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub async fn cmd_run(config: SystemConfig, app_id: &str) -> Result<()> {
    // 1. Boot.
    let mut system = boot_system(config).await;

    // 2. Attach to the requested app.
    let mut current = launch(&mut system, app_id)
        .await
        .with_context(|| format!("failed to launch {app_id}"))?;

    // 3. Print startup banner.
    let state = system.state();
    println!();
    println!("  Sanctum v{}", state.system_info.version);
    println!("  Platform: {}", state.system_info.platform);
    println!("  Apps: {}", state.apps.len());
    println!("  Type :help for shell commands, or :quit to exit.");
    println!();
    print_banner(&system, current).await;

    // 4. Set up Ctrl+C handler.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n  Interrupted. Goodbye!");
            std::process::exit(0);
        }
    });

    // 5. Input loop.
    let stdin = io::stdin();
    let mut line_buf = String::new();

    loop {
        print!("[{current}]> ");
        io::stdout().flush().ok();

        line_buf.clear();
        match stdin.lock().read_line(&mut line_buf) {
            Ok(0) => {
                println!();
                info!("EOF received, exiting");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("  Error reading input: {e}");
                continue;
            }
        }

        let trimmed = line_buf.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed == "quit" || trimmed == "exit" {
            info!("user requested exit");
            break;
        }

        if let Some(command) = trimmed.strip_prefix(':') {
            match shell_command(&mut system, &mut current, command).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => eprintln!("  Error: {e:#}"),
            }
            continue;
        }

        if system.kernel().process(current).is_none() {
            eprintln!("  Process {current} is gone. Use :launch or :attach.");
            continue;
        }

        match system.send_to_app(current, trimmed).await {
            Ok(output) if output.is_empty() => {}
            Ok(output) => println!("{output}"),
            Err(e) => eprintln!("  Error: {e}"),
        }
    }

    // 6. Shut down.
    system.shutdown();
    println!("  Goodbye!");
    Ok(())
}

async fn launch(system: &mut System, app_id: &str) -> Result<Pid> {
    let pid = system.launch_app(app_id).await?;
    info!(app_id, pid, "attached to app");
    Ok(pid)
}

async fn print_banner(system: &System, pid: Pid) {
    match system.app_banner(pid).await {
        Ok(Some(banner)) => {
            println!("{banner}");
            println!();
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(pid, error = %e, "app banner unavailable"),
    }
}

async fn shell_command(system: &mut System, current: &mut Pid, command: &str) -> Result<Flow> {
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "help" => println!("{SHELL_HELP}"),
        "quit" | "q" => return Ok(Flow::Quit),
        "apps" => {
            for app in system.registry().installed() {
                println!("  {:<20} {}", app.id, app.name);
            }
        }
        "ps" => {
            for process in system.state().processes {
                let marker = if process.pid == *current { "*" } else { " " };
                println!("{marker} {:>4}  {}", process.pid, process.name);
            }
        }
        "windows" => {
            for window in system.state().windows {
                println!(
                    "  {}  pid={} {}x{} at ({}, {}) {}{}",
                    window.title,
                    window.pid,
                    window.width,
                    window.height,
                    window.x,
                    window.y,
                    window.state,
                    if window.focused { " [focused]" } else { "" }
                );
            }
        }
        "notifications" => {
            for n in system.state().notifications {
                println!(
                    "  [{}] {}: {}  ({})",
                    n.priority,
                    n.title,
                    n.body,
                    n.timestamp.format("%H:%M:%S")
                );
            }
        }
        "launch" => {
            if arg.is_empty() {
                bail!("usage: :launch <app-id>");
            }
            *current = launch(system, arg).await?;
            print_banner(system, *current).await;
        }
        "attach" => {
            let pid = parse_pid(arg)?;
            if system.registry().instance(pid).is_none() {
                bail!("no app instance for pid {pid}");
            }
            *current = pid;
        }
        "kill" => {
            let pid = parse_pid(arg)?;
            if !system.terminate_process(pid) {
                bail!("no process {pid}");
            }
            println!("  Terminated {pid}");
        }
        "notify" => {
            if arg.is_empty() {
                bail!("usage: :notify <text>");
            }
            system.show_notification("Shell", arg, Priority::Normal);
        }
        other => bail!("unknown shell command :{other} (try :help)"),
    }
    Ok(Flow::Continue)
}

fn parse_pid(arg: &str) -> Result<Pid> {
    arg.parse()
        .with_context(|| format!("expected a pid, got {arg:?}"))
}
