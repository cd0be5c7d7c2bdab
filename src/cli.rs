//! Terminal front end for the brewing guide.

use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    audio::AlertPlayer,
    catalog::{available_flavors, BrewingMethod},
    models::StepOutcome,
    session::BrewSession,
    timer::TimerState,
    AppState,
};

#[derive(Parser, Debug)]
#[command(name = "brewflow", version, about = "Step-by-step coffee brewing guide")]
pub struct Cli {
    /// Settings file (created on first change)
    #[arg(long, env = "BREWFLOW_SETTINGS", default_value = "brewflow-settings.json")]
    pub settings: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every brewing method in the catalog
    List,
    /// List the flavor tags methods are labelled with
    Flavors,
    /// Suggest a method for a flavor
    Suggest { flavor: String },
    /// Show a method's recipe for a number of cups
    Show {
        id: String,
        #[arg(long, default_value_t = 1)]
        cups: u32,
    },
    /// Walk through a method step by step
    Brew {
        id: String,
        #[arg(long, default_value_t = 1)]
        cups: u32,
    },
}

pub async fn execute(state: &AppState, command: Command) -> Result<()> {
    let methods = state.catalog.load().await;
    if methods.is_empty() {
        println!("No brewing methods available right now.");
        return Ok(());
    }

    match command {
        Command::List => {
            for method in &methods {
                println!("{:<16} {} (1-{} cups)", method.id, method.name, method.max_cups);
            }
        }
        Command::Flavors => {
            println!("{}", available_flavors(&methods).join(", "));
        }
        Command::Suggest { flavor } => match state.suggest(&flavor) {
            Some(method) => print_recipe(&method, 1),
            None => println!("Nothing in the catalog tastes '{flavor}'."),
        },
        Command::Show { id, cups } => {
            let method = state
                .method(&id)
                .ok_or_else(|| anyhow!("unknown brewing method '{id}'"))?;
            print_recipe(&method, method.clamp_cups(cups));
        }
        Command::Brew { id, cups } => {
            let method = state
                .method(&id)
                .ok_or_else(|| anyhow!("unknown brewing method '{id}'"))?;
            let session = state.start_brew(&id, method.clamp_cups(cups))?;
            guide(state, session).await?;
        }
    }

    Ok(())
}

fn print_recipe(method: &BrewingMethod, cups: u32) {
    println!("{}", method.name);
    if let Some(description) = &method.description {
        println!("  {description}");
    }
    println!("  Cups:   {cups} (max {})", method.max_cups);
    println!("  Coffee: {} g", method.coffee_grams(cups));
    println!("  Water:  {} ml", method.water_ml(cups));
    if let Some(grind) = &method.grind_size {
        println!("  Grind:  {grind}");
    }
    if !method.flavor_profiles.is_empty() {
        println!("  Flavor: {}", method.flavor_profiles.join(", "));
    }
}

fn print_step(session: &BrewSession) {
    let view = session.current_step_view();
    println!();
    println!(
        "{} - step {}/{}: {}",
        session.method().name,
        view.number,
        view.total,
        view.title
    );
    if let Some(description) = &view.description {
        println!("  {description}");
    }
    if let Some(water) = view.water_ml {
        println!("  ~{water} ml of water");
    }
    if view.time_seconds > 0 {
        println!("  Timer: {}s  [enter] start  [s] stop", view.display_seconds);
    }
    let next = if view.is_last { "finish" } else { "next" };
    println!("  [n] {next}  [b] back  [q] quit");
}

async fn guide(state: &AppState, mut session: BrewSession) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut timer_rx = session.subscribe_timer();

    print_step(&session);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if handle_input(&state.alert, &mut session, line.trim()) == Guide::Exit {
                    break;
                }
            }
            changed = timer_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let timer = *timer_rx.borrow_and_update();
                match timer {
                    TimerState::Running { seconds_remaining } => {
                        print!("\r  {seconds_remaining:>4}s remaining ");
                        io::stdout().flush()?;
                    }
                    TimerState::Finished => println!("\r  Time's up!          "),
                    TimerState::Idle => {}
                }
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guide {
    Continue,
    Exit,
}

/// Applies one line of guide input to the session.
fn handle_input(alert: &AlertPlayer, session: &mut BrewSession, input: &str) -> Guide {
    match input {
        "" if session.timer_state() == TimerState::Idle && session.current_step().has_timer() => {
            let _ = session.start_step_timer(alert.completion_callback());
        }
        "" | "n" => {
            if advance(session) {
                return Guide::Exit;
            }
        }
        "b" => {
            session.retreat_step();
            print_step(session);
        }
        "s" => {
            session.cancel_timer();
            alert.stop();
        }
        "q" => {
            session.cancel_timer();
            alert.stop();
            return Guide::Exit;
        }
        other => println!("Unknown input '{other}'. Use enter, n, b, s or q."),
    }
    Guide::Continue
}

/// Returns `true` once the last step is done.
fn advance(session: &mut BrewSession) -> bool {
    match session.complete_or_advance() {
        StepOutcome::Advanced(_) => {
            print_step(session);
            false
        }
        StepOutcome::Finished => {
            println!("\nDone. Enjoy your {}!", session.method().name);
            true
        }
    }
}
