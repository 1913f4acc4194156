use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

use braingain::catalog;
use braingain::config::AppConfig;
use braingain::context::AppContext;
use braingain::journal::JournalDebouncer;
use braingain::notify::{LogNotifier, Notifier, Permission};
use braingain::onboarding::{FocusMode, OnboardingDraft};
use braingain::session::JournalReflection;
use braingain::timer::{FocusTimer, TimerState, spawn_ticker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let _log_guard = init_tracing(&config);

    eprintln!("🧠 BrainGain v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   Type 'help' for commands. 'quit' to exit.\n");

    let ctx = AppContext::init(config.clone()).await?;
    let controller = ctx.controller();
    let store = ctx.store();
    let debouncer = JournalDebouncer::new(controller.clone(), config.journal_debounce);
    let notifier = LogNotifier::new();

    if ctx.is_first_time() {
        eprintln!("   First run — answer the setup prompts (task / why / duration / apps / mode / notify), then 'onboard'.\n");
    }

    // The timer callback runs on the ticker task; it signals expiry back to
    // this loop through a channel.
    let (expired_tx, mut expired_rx) = tokio::sync::mpsc::unbounded_channel::<()>();

    let mut timer: Option<Arc<FocusTimer>> = None;
    let mut ticker: Option<JoinHandle<()>> = None;

    let stdin = tokio::io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    eprint!("> ");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                let line = line.trim();
                if line.is_empty() {
                    eprint!("> ");
                    continue;
                }

                let (command, rest) = match line.split_once(' ') {
                    Some((c, r)) => (c, r.trim()),
                    None => (line, ""),
                };

                match command {
                    "help" => print_help(),
                    "quit" => break,

                    // ── Onboarding ──────────────────────────────
                    "task" => {
                        controller.update_onboarding_data(OnboardingDraft {
                            focus_task: Some(rest.to_string()),
                            ..Default::default()
                        }).await;
                    }
                    "why" => {
                        controller.update_onboarding_data(OnboardingDraft {
                            focus_why: Some(rest.to_string()),
                            ..Default::default()
                        }).await;
                    }
                    "duration" => match rest.parse::<u32>() {
                        Ok(minutes) => {
                            controller.update_onboarding_data(OnboardingDraft {
                                focus_duration_minutes: Some(minutes),
                                ..Default::default()
                            }).await;
                        }
                        Err(_) => println!("duration takes minutes, e.g. 'duration 25'"),
                    },
                    "apps" => {
                        let apps: Vec<String> = rest
                            .split(',')
                            .map(|a| a.trim().to_string())
                            .filter(|a| !a.is_empty())
                            .collect();
                        controller.update_onboarding_data(OnboardingDraft {
                            distraction_apps: Some(apps),
                            ..Default::default()
                        }).await;
                    }
                    "mode" => {
                        let mode = match rest {
                            "light" => Some(FocusMode::Light),
                            "reminder" => Some(FocusMode::Reminder),
                            _ => None,
                        };
                        match mode {
                            Some(mode) => {
                                controller.update_onboarding_data(OnboardingDraft {
                                    focus_mode: Some(mode),
                                    ..Default::default()
                                }).await;
                            }
                            None => println!("mode is 'light' or 'reminder'"),
                        }
                    }
                    "notify" => {
                        controller.update_onboarding_data(OnboardingDraft {
                            allow_notifications: Some(rest == "on"),
                            ..Default::default()
                        }).await;
                    }
                    "onboard" => {
                        let data = controller.complete_onboarding().await;
                        if data.allow_notifications
                            && notifier.request_permission().await != Permission::Granted
                        {
                            println!("Notifications unavailable — continuing without them.");
                        }
                        println!("Setup saved: \"{}\" for {} min.", data.focus_task, data.focus_duration_minutes);
                    }

                    // ── Session ─────────────────────────────────
                    "start" => {
                        let session = controller.start_session().await;
                        if let Some(handle) = ticker.take() {
                            handle.abort();
                        }
                        let fresh = Arc::new(FocusTimer::new(session.duration_minutes));
                        let tx = expired_tx.clone();
                        fresh.set_on_complete(move || {
                            let _ = tx.send(());
                        });
                        fresh.start();
                        ticker = Some(spawn_ticker(Arc::clone(&fresh), config.tick_interval));
                        timer = Some(fresh);
                        println!(
                            "Focusing on \"{}\" for {} min. {}",
                            session.focus_task,
                            session.duration_minutes,
                            catalog::random_quote()
                        );
                    }
                    "pause" => {
                        if let Some(timer) = &timer {
                            timer.pause();
                        }
                    }
                    "resume" => {
                        if let Some(timer) = &timer {
                            timer.resume();
                        }
                    }
                    "journal" => debouncer.submit(rest.to_string()),
                    "complete" => {
                        debouncer.flush_now().await;
                        controller.complete_session(parse_reflection(rest)).await;
                        stop_timer(&mut timer, &mut ticker);
                        println!("Session completed. 'start' begins the next one.");
                    }
                    "abandon" => {
                        debouncer.flush_now().await;
                        controller.abandon_session().await;
                        stop_timer(&mut timer, &mut ticker);
                    }
                    "exit" => {
                        debouncer.flush_now().await;
                        controller.emergency_exit().await;
                        stop_timer(&mut timer, &mut ticker);
                    }

                    // ── Info ────────────────────────────────────
                    "status" => {
                        let this_week = store.completed_sessions_this_week().await.unwrap_or(0);
                        let total = store.total_completed_sessions().await.unwrap_or(0);
                        println!("Completed sessions: {total} all time, {this_week} this week.");
                        match (&timer, controller.current_session().await) {
                            (Some(timer), Some(session)) if session.is_active() => {
                                let state = match timer.state() {
                                    TimerState::Running => "running",
                                    TimerState::Paused => "paused",
                                    TimerState::Idle => "idle",
                                    TimerState::Expired => "done",
                                };
                                println!(
                                    "Current: \"{}\" — {} remaining ({state}, {:.0}% in).",
                                    session.focus_task,
                                    timer.format_remaining(),
                                    timer.percent_complete(),
                                );
                            }
                            _ => println!("No session running."),
                        }
                    }
                    "stats" => {
                        let draft = controller.onboarding_draft().await;
                        let apps = draft.distraction_apps.unwrap_or_default();
                        let hours = catalog::total_weekly_hours(&apps);
                        for stat in catalog::stats_for_apps(&apps) {
                            println!("{}: {} daily — {}", stat.app, stat.daily_usage, stat.attention_span_effect);
                        }
                        println!(
                            "≈{hours:.1} h/week. {}",
                            catalog::impact_level(hours).message()
                        );
                    }
                    "quote" => println!("{}", catalog::random_quote()),

                    _ => println!("Unknown command '{command}' — try 'help'."),
                }
                eprint!("> ");
            }

            Some(()) = expired_rx.recv() => {
                notifier
                    .notify("Focus session complete", "Take a breath, then reflect.")
                    .await;
                println!("\n⏰ Time's up! 'complete did; distracted by; takeaway' to reflect, or 'abandon'.");
                eprint!("> ");
            }
        }
    }

    debouncer.flush_now().await;
    Ok(())
}

/// Parse "did; distracted by; takeaway" into a reflection. Empty input means
/// no reflection.
fn parse_reflection(rest: &str) -> Option<JournalReflection> {
    if rest.is_empty() {
        return None;
    }
    let mut parts = rest.splitn(3, ';').map(|p| p.trim().to_string());
    Some(JournalReflection {
        did: parts.next().unwrap_or_default(),
        distracted_by: parts.next().unwrap_or_default(),
        takeaway: parts.next().unwrap_or_default(),
    })
}

fn stop_timer(timer: &mut Option<Arc<FocusTimer>>, ticker: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = ticker.take() {
        handle.abort();
    }
    if let Some(timer) = timer.take() {
        timer.reset();
    }
}

fn print_help() {
    println!("Setup:    task <text> | why <text> | duration <min> | apps <a, b> | mode light|reminder | notify on|off | onboard");
    println!("Session:  start | pause | resume | journal <text> | complete [did; distracted; takeaway] | abandon | exit");
    println!("Info:     status | stats | quote | quit");
}

/// Initialize tracing; returns the appender guard when file logging is on.
fn init_tracing(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "braingain.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .init();
            None
        }
    }
}
