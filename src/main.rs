mod batches;
mod clock;
mod date;
mod error;
mod export;
mod health;
mod model;
mod output;
mod quest_catalog;
mod quests;
mod settings;
mod status;
mod store;

use crate::batches::{
    build_stats, create_batch, delete_batch, parse_flavoring_arg, plan_batch,
    refresh_day_counters, set_status, start_f2, unarchive_batch, update_batch, BatchUpdate,
    NewBatch,
};
use crate::clock::{date_of_ts, system_now_rfc3339, until_next_local_midnight, validate_rfc3339};
use crate::date::{parse_date_string, system_today_utc};
use crate::error::CliError;
use crate::export::{apply_bundle, build_bundle, read_bundle, write_bundle};
use crate::health::{mood_label, status_label, sync_from_batches, SyncOutcome};
use crate::model::{Batch, BatchStatus};
use crate::output::{render_progress_bar, render_simple_table, Styler};
use crate::quests::{
    build_quest_stats, complete_quest, recompute_progress, record_activity,
};
use crate::settings::{apply_setting, reset_settings};
use crate::status::build_dashboard;
use crate::store::{stable_to_string_pretty, Store};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "scoby", version, about = "Kombucha brewing companion CLI")]
struct Cli {
    /// Overrides the state directory for this invocation.
    #[arg(long, global = true)]
    state_dir: Option<String>,

    /// Overrides logical "today" (YYYY-MM-DD) for deterministic output/testing.
    #[arg(long, global = true)]
    today: Option<String>,

    /// Overrides the current timestamp (RFC3339) for deterministic output/testing.
    #[arg(long, global = true)]
    now: Option<String>,

    #[arg(long, global = true, value_enum, default_value = "table")]
    format: Format,

    /// Disables ANSI color output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Batch(BatchArgs),
    /// Aggregate batch statistics.
    Stats,
    /// Dashboard: active batches, pet health, suggestions.
    Status,
    Health(HealthArgs),
    Quest(QuestArgs),
    Avatar(AvatarArgs),
    Settings(SettingsArgs),
    /// Writes the entire state as one JSON bundle.
    Export(ExportArgs),
    /// Replaces the entire state from a previously exported bundle.
    Import(ImportArgs),
    /// Keeps day counters and health fresh across midnights.
    Watch(WatchArgs),
}

#[derive(Args, Debug)]
struct BatchArgs {
    #[command(subcommand)]
    command: BatchCommand,
}

#[derive(Subcommand, Debug)]
enum BatchCommand {
    /// Starts brewing a new batch today.
    Add(BatchAddArgs),
    /// Schedules a batch for a future start date.
    Plan(BatchPlanArgs),
    List(BatchListArgs),
    Show(BatchSelectorArgs),
    Edit(BatchEditArgs),
    /// Moves a batch along the lifecycle graph.
    SetStatus(BatchSetStatusArgs),
    /// Begins second fermentation with flavorings.
    StartF2(BatchStartF2Args),
    Archive(BatchSelectorArgs),
    Unarchive(BatchSelectorArgs),
    /// Permanent removal; requires --yes.
    Delete(BatchDeleteArgs),
}

#[derive(Args, Debug)]
struct BatchAddArgs {
    name: String,

    /// Defaults to the configured tea type.
    #[arg(long)]
    tea_type: Option<String>,

    /// 1-30. Defaults to the configured target days.
    #[arg(long)]
    target_days: Option<u32>,

    #[arg(long)]
    notes: Option<String>,

    #[arg(long)]
    tea_amount: Option<String>,

    #[arg(long)]
    tea_amount_unit: Option<String>,

    #[arg(long)]
    sugar_amount: Option<String>,

    #[arg(long)]
    sugar_amount_unit: Option<String>,
}

#[derive(Args, Debug)]
struct BatchPlanArgs {
    name: String,

    /// Start date (YYYY-MM-DD), must be after today.
    #[arg(long)]
    start_date: String,

    #[arg(long)]
    tea_type: Option<String>,

    #[arg(long)]
    target_days: Option<u32>,

    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args, Debug)]
struct BatchListArgs {
    /// Include archived batches.
    #[arg(long)]
    all: bool,
}

#[derive(Args, Debug)]
struct BatchSelectorArgs {
    /// Batch id (b0001).
    batch: String,
}

#[derive(Args, Debug)]
struct BatchEditArgs {
    /// Batch id (b0001).
    batch: String,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    tea_type: Option<String>,

    /// Empty string clears the notes.
    #[arg(long)]
    notes: Option<String>,

    #[arg(long)]
    target_days: Option<u32>,

    #[arg(long)]
    tea_amount: Option<String>,

    #[arg(long)]
    tea_amount_unit: Option<String>,

    #[arg(long)]
    sugar_amount: Option<String>,

    #[arg(long)]
    sugar_amount_unit: Option<String>,
}

#[derive(Args, Debug)]
struct BatchSetStatusArgs {
    /// Batch id (b0001).
    batch: String,

    /// One of: planned, brewing, ready, f2_brewing, f2_ready, bottled, archived
    status: String,
}

#[derive(Args, Debug)]
struct BatchStartF2Args {
    /// Batch id (b0001).
    batch: String,

    /// 1-14.
    #[arg(long, default_value_t = 3)]
    days: u32,

    /// Repeatable: name:kind:amount[:notes], e.g. "Ginger:spice:20g".
    #[arg(long = "flavoring")]
    flavorings: Vec<String>,
}

#[derive(Args, Debug)]
struct BatchDeleteArgs {
    /// Batch id (b0001).
    batch: String,

    #[arg(long)]
    yes: bool,
}

#[derive(Args, Debug)]
struct HealthArgs {
    #[command(subcommand)]
    command: HealthCommand,
}

#[derive(Subcommand, Debug)]
enum HealthCommand {
    Show,
    /// Re-derives health from the current batches. Safe to repeat.
    Sync,
    Events(HealthEventsArgs),
    /// Restores initial health and clears the event log; requires --yes.
    Reset(HealthResetArgs),
}

#[derive(Args, Debug)]
struct HealthEventsArgs {
    /// Show the full log instead of the last 7 days.
    #[arg(long)]
    all: bool,
}

#[derive(Args, Debug)]
struct HealthResetArgs {
    #[arg(long)]
    yes: bool,
}

#[derive(Args, Debug)]
struct QuestArgs {
    #[command(subcommand)]
    command: QuestCommand,
}

#[derive(Subcommand, Debug)]
enum QuestCommand {
    List,
    Show(QuestSelectorArgs),
    /// Recomputes requirement progress from the current batches.
    Sync,
    /// Claims a quest: awards XP, rewards, and a health bonus.
    Complete(QuestSelectorArgs),
}

#[derive(Args, Debug)]
struct QuestSelectorArgs {
    /// Quest id (e.g. first-batch).
    quest: String,
}

#[derive(Args, Debug)]
struct AvatarArgs {
    #[command(subcommand)]
    command: AvatarCommand,
}

#[derive(Subcommand, Debug)]
enum AvatarCommand {
    Show,
}

#[derive(Args, Debug)]
struct SettingsArgs {
    #[command(subcommand)]
    command: SettingsCommand,
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    Show,
    Set(SettingsSetArgs),
    Reset,
}

#[derive(Args, Debug)]
struct SettingsSetArgs {
    /// Dotted key, e.g. brewing.default_target_days.
    key: String,
    value: String,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(long, default_value = "scoby-export.json")]
    out: String,
}

#[derive(Args, Debug)]
struct ImportArgs {
    file: String,
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Run a single refresh cycle and exit.
    #[arg(long)]
    once: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let exit = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code
        }
    };

    std::process::exit(exit);
}

fn print_line(s: &str) {
    println!("{}", s);
}

fn print_json<T: serde::Serialize>(obj: &T) -> Result<(), CliError> {
    let s = stable_to_string_pretty(obj).map_err(|_| CliError::io("State IO error"))?;
    println!("{}", s);
    Ok(())
}

fn resolve_today(cli_today: Option<&str>) -> Result<String, CliError> {
    if let Some(t) = cli_today {
        parse_date_string(t, "today")?;
        return Ok(t.to_string());
    }

    if let Ok(t) = std::env::var("SCOBYCLI_TODAY") {
        let tt = t.trim();
        if !tt.is_empty() {
            parse_date_string(tt, "today")?;
            return Ok(tt.to_string());
        }
    }

    Ok(system_today_utc())
}

fn resolve_now(cli_now: Option<&str>) -> Result<String, CliError> {
    if let Some(n) = cli_now {
        validate_rfc3339(n, "now")?;
        return Ok(n.to_string());
    }

    if let Ok(n) = std::env::var("SCOBYCLI_NOW") {
        let nn = n.trim();
        if !nn.is_empty() {
            validate_rfc3339(nn, "now")?;
            return Ok(nn.to_string());
        }
    }

    Ok(system_now_rfc3339())
}

fn resolve_color_enabled(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    true
}

/// Brings cached day counters up to the current calendar day, then re-derives
/// health and quest progress from the refreshed snapshot. Every command runs
/// this first, which is how "midnight" happens in a process that is not
/// usually alive at midnight.
fn refresh_world(
    store: &Store,
    today: &str,
    now: &str,
) -> Result<(crate::model::BatchDb, SyncOutcome), CliError> {
    let mut batch_db = store.load_batches()?;
    refresh_day_counters(&mut batch_db, today, now)?;
    store.save_batches(&batch_db)?;

    let mut health_db = store.load_health(now)?;
    let outcome = sync_from_batches(&mut health_db, &batch_db.batches, today, now)?;
    store.save_health(&health_db)?;

    let mut quest_db = store.load_quests(now)?;
    recompute_progress(&mut quest_db, &batch_db.batches);
    store.save_quests(&quest_db)?;

    Ok((batch_db, outcome))
}

/// Re-derives health and quest progress after a batch mutation, and counts
/// the interaction toward the streak.
fn sync_after_mutation(
    store: &Store,
    batches: &[Batch],
    today: &str,
    now: &str,
) -> Result<(), CliError> {
    let mut health_db = store.load_health(now)?;
    sync_from_batches(&mut health_db, batches, today, now)?;
    store.save_health(&health_db)?;

    let mut quest_db = store.load_quests(now)?;
    record_activity(&mut quest_db.avatar, today, now);
    recompute_progress(&mut quest_db, batches);
    store.save_quests(&quest_db)?;

    Ok(())
}

fn parse_status_arg(s: &str) -> Result<BatchStatus, CliError> {
    BatchStatus::parse(s).ok_or_else(|| {
        CliError::usage(format!(
            "Invalid status: {} (planned, brewing, ready, f2_brewing, f2_ready, bottled, archived)",
            s
        ))
    })
}

fn batch_row(b: &Batch) -> Vec<String> {
    let day = match b.status {
        BatchStatus::F2Brewing | BatchStatus::F2Ready => format!(
            "{}/{}",
            b.f2_current_day.unwrap_or(0),
            b.f2_target_days.unwrap_or(0)
        ),
        _ => format!("{}/{}", b.current_day, b.target_days),
    };
    vec![
        b.id.clone(),
        b.name.clone(),
        b.tea_type.clone(),
        b.status.as_str().to_string(),
        day,
    ]
}

fn print_batch(format: Format, b: &Batch) -> Result<(), CliError> {
    if format == Format::Json {
        #[derive(serde::Serialize)]
        struct Out<'a> {
            batch: &'a Batch,
        }
        return print_json(&Out { batch: b });
    }

    print_line(&format!("{} ({})", b.name, b.id));
    print_line(&format!("tea_type: {}", b.tea_type));
    print_line(&format!("status: {}", b.status.as_str()));
    print_line(&format!("start_date: {}", b.start_date));
    print_line(&format!("day: {} of {}", b.current_day, b.target_days));
    if let Some(ref f2_start) = b.f2_start_date {
        print_line(&format!(
            "f2: day {} of {} (started {})",
            b.f2_current_day.unwrap_or(0),
            b.f2_target_days.unwrap_or(0),
            f2_start
        ));
    }
    if !b.f2_flavorings.is_empty() {
        print_line("flavorings:");
        for f in b.f2_flavorings.iter() {
            print_line(&format!("- {} ({}, {})", f.name, f.kind.as_str(), f.amount));
        }
    }
    if let Some(ref amount) = b.tea_amount {
        print_line(&format!(
            "tea: {} {}",
            amount,
            b.tea_amount_unit.as_deref().unwrap_or("")
        ));
    }
    if let Some(ref amount) = b.sugar_amount {
        print_line(&format!(
            "sugar: {} {}",
            amount,
            b.sugar_amount_unit.as_deref().unwrap_or("")
        ));
    }
    if let Some(ref n) = b.notes {
        print_line(&format!("notes: {}", n));
    }
    print_line(&format!("created_at: {}", b.created_at));
    print_line(&format!("updated_at: {}", b.updated_at));
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let store = Store::resolve(cli.state_dir.as_deref())?;
    let today = resolve_today(cli.today.as_deref())?;
    let now = resolve_now(cli.now.as_deref())?;

    let styler = Styler::new(resolve_color_enabled(cli.no_color));

    match cli.command {
        Command::Batch(args) => match args.command {
            BatchCommand::Add(a) => {
                refresh_world(&store, &today, &now)?;
                let settings = store.load_settings()?;

                let mut batch_db = store.load_batches()?;
                let created = create_batch(
                    &mut batch_db,
                    NewBatch {
                        name: a.name,
                        tea_type: a
                            .tea_type
                            .unwrap_or_else(|| settings.brewing.default_tea_type.clone()),
                        notes: a.notes,
                        target_days: a
                            .target_days
                            .unwrap_or(settings.brewing.default_target_days),
                        tea_amount: a.tea_amount,
                        tea_amount_unit: a.tea_amount_unit,
                        sugar_amount: a.sugar_amount,
                        sugar_amount_unit: a.sugar_amount_unit,
                    },
                    &today,
                    &now,
                )?;
                store.save_batches(&batch_db)?;
                sync_after_mutation(&store, &batch_db.batches, &today, &now)?;

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out {
                        batch: Batch,
                    }
                    print_json(&Out { batch: created })?;
                } else {
                    print_line(&render_simple_table(
                        &["id", "name", "tea", "status", "day"],
                        &[batch_row(&created)],
                    ));
                }
                Ok(())
            }

            BatchCommand::Plan(a) => {
                refresh_world(&store, &today, &now)?;
                let settings = store.load_settings()?;

                let mut batch_db = store.load_batches()?;
                let created = plan_batch(
                    &mut batch_db,
                    NewBatch {
                        name: a.name,
                        tea_type: a
                            .tea_type
                            .unwrap_or_else(|| settings.brewing.default_tea_type.clone()),
                        notes: a.notes,
                        target_days: a
                            .target_days
                            .unwrap_or(settings.brewing.default_target_days),
                        tea_amount: None,
                        tea_amount_unit: None,
                        sugar_amount: None,
                        sugar_amount_unit: None,
                    },
                    &a.start_date,
                    &today,
                    &now,
                )?;
                store.save_batches(&batch_db)?;
                sync_after_mutation(&store, &batch_db.batches, &today, &now)?;

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out {
                        batch: Batch,
                    }
                    print_json(&Out { batch: created })?;
                } else {
                    print_line(&format!(
                        "Planned: {} ({}) starting {}",
                        created.name, created.id, created.start_date
                    ));
                }
                Ok(())
            }

            BatchCommand::List(a) => {
                let (batch_db, _) = refresh_world(&store, &today, &now)?;
                let listed: Vec<&Batch> = batch_db
                    .batches
                    .iter()
                    .filter(|b| a.all || b.status != BatchStatus::Archived)
                    .collect();

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out<'a> {
                        batches: Vec<&'a Batch>,
                    }
                    print_json(&Out { batches: listed })?;
                } else {
                    let rows: Vec<Vec<String>> = listed.iter().map(|b| batch_row(b)).collect();
                    print_line(&render_simple_table(
                        &["id", "name", "tea", "status", "day"],
                        &rows,
                    ));
                }
                Ok(())
            }

            BatchCommand::Show(a) => {
                let (batch_db, _) = refresh_world(&store, &today, &now)?;
                let idx = crate::batches::find_batch_index(&batch_db, &a.batch)?;
                print_batch(cli.format, &batch_db.batches[idx])
            }

            BatchCommand::Edit(a) => {
                refresh_world(&store, &today, &now)?;
                let mut batch_db = store.load_batches()?;
                let updated = update_batch(
                    &mut batch_db,
                    &a.batch,
                    BatchUpdate {
                        name: a.name,
                        tea_type: a.tea_type,
                        notes: a.notes,
                        target_days: a.target_days,
                        tea_amount: a.tea_amount,
                        tea_amount_unit: a.tea_amount_unit,
                        sugar_amount: a.sugar_amount,
                        sugar_amount_unit: a.sugar_amount_unit,
                    },
                    &now,
                )?;
                store.save_batches(&batch_db)?;
                sync_after_mutation(&store, &batch_db.batches, &today, &now)?;

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out {
                        batch: Batch,
                    }
                    print_json(&Out { batch: updated })?;
                } else {
                    print_line(&format!("Updated: {} ({})", updated.name, updated.id));
                }
                Ok(())
            }

            BatchCommand::SetStatus(a) => {
                let status = parse_status_arg(&a.status)?;
                refresh_world(&store, &today, &now)?;

                let mut batch_db = store.load_batches()?;
                let updated = set_status(&mut batch_db, &a.batch, status, &now)?;
                store.save_batches(&batch_db)?;
                sync_after_mutation(&store, &batch_db.batches, &today, &now)?;

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out {
                        batch: Batch,
                    }
                    print_json(&Out { batch: updated })?;
                } else {
                    print_line(&format!(
                        "{} ({}) is now {}",
                        updated.name,
                        updated.id,
                        updated.status.as_str()
                    ));
                }
                Ok(())
            }

            BatchCommand::StartF2(a) => {
                refresh_world(&store, &today, &now)?;

                let mut flavorings = Vec::new();
                for (i, spec) in a.flavorings.iter().enumerate() {
                    flavorings.push(parse_flavoring_arg(spec, i)?);
                }

                let mut batch_db = store.load_batches()?;
                let updated = start_f2(&mut batch_db, &a.batch, a.days, flavorings, &today, &now)?;
                store.save_batches(&batch_db)?;
                sync_after_mutation(&store, &batch_db.batches, &today, &now)?;

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out {
                        batch: Batch,
                    }
                    print_json(&Out { batch: updated })?;
                } else {
                    print_line(&format!(
                        "Started F2: {} ({}) for {} days with {} flavoring(s)",
                        updated.name,
                        updated.id,
                        a.days,
                        updated.f2_flavorings.len()
                    ));
                }
                Ok(())
            }

            BatchCommand::Archive(a) => {
                refresh_world(&store, &today, &now)?;
                let mut batch_db = store.load_batches()?;
                let updated = crate::batches::archive_batch(&mut batch_db, &a.batch, &now)?;
                store.save_batches(&batch_db)?;
                sync_after_mutation(&store, &batch_db.batches, &today, &now)?;

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out {
                        batch: Batch,
                    }
                    print_json(&Out { batch: updated })?;
                } else {
                    print_line(&format!("Archived: {} ({})", updated.name, updated.id));
                }
                Ok(())
            }

            BatchCommand::Unarchive(a) => {
                refresh_world(&store, &today, &now)?;
                let mut batch_db = store.load_batches()?;
                let updated = unarchive_batch(&mut batch_db, &a.batch, &now)?;
                store.save_batches(&batch_db)?;
                sync_after_mutation(&store, &batch_db.batches, &today, &now)?;

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out {
                        batch: Batch,
                    }
                    print_json(&Out { batch: updated })?;
                } else {
                    print_line(&format!(
                        "Unarchived: {} ({}) back to {}",
                        updated.name,
                        updated.id,
                        updated.status.as_str()
                    ));
                }
                Ok(())
            }

            BatchCommand::Delete(a) => {
                if !a.yes {
                    return Err(CliError::usage(
                        "Deleting a batch is permanent; pass --yes to confirm",
                    ));
                }
                refresh_world(&store, &today, &now)?;
                let mut batch_db = store.load_batches()?;
                let removed = delete_batch(&mut batch_db, &a.batch)?;
                store.save_batches(&batch_db)?;
                sync_after_mutation(&store, &batch_db.batches, &today, &now)?;

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out {
                        batch: Batch,
                    }
                    print_json(&Out { batch: removed })?;
                } else {
                    print_line(&format!("Deleted: {} ({})", removed.name, removed.id));
                }
                Ok(())
            }
        },

        Command::Stats => {
            let (batch_db, _) = refresh_world(&store, &today, &now)?;
            let stats = build_stats(&batch_db);

            if cli.format == Format::Json {
                print_json(&stats)?;
            } else {
                print_line(&format!("total: {}", stats.total_batches));
                print_line(&format!("active: {}", stats.active_batches));
                print_line(&format!("completed: {}", stats.completed_batches));
                print_line(&format!("avg brewing days: {}", stats.average_brewing_days));
                if let Some(ref b) = stats.longest_running_batch {
                    print_line(&format!(
                        "longest running: {} ({}) day {}",
                        b.name, b.id, b.current_day
                    ));
                }
            }
            Ok(())
        }

        Command::Status => {
            let (batch_db, _) = refresh_world(&store, &today, &now)?;
            let health_db = store.load_health(&now)?;
            let dash = build_dashboard(&batch_db.batches, &health_db, &today);

            if cli.format == Format::Json {
                print_json(&dash)?;
            } else {
                print_line(&styler.bold(&format!("Today ({})", dash.date)));
                if dash.batches.is_empty() {
                    print_line(&styler.gray("(no active batches)"));
                } else {
                    for b in dash.batches.iter() {
                        print_line(&format!(
                            "- {} [{}] {} day {}/{} {}",
                            b.id,
                            b.status.as_str(),
                            b.name,
                            b.day,
                            b.target_days,
                            render_progress_bar(b.percent, 10)
                        ));
                    }
                }

                print_line("");
                let health_line = format!(
                    "Pet health: {}/{} ({}) {}",
                    dash.health.current_health,
                    dash.health.max_health,
                    dash.health.status,
                    render_progress_bar(
                        (dash.health.current_health.max(0) as u32 * 100)
                            / dash.health.max_health.max(1) as u32,
                        10
                    )
                );
                if dash.health.current_health >= 60 {
                    print_line(&styler.green(&health_line));
                } else if dash.health.current_health >= 40 {
                    print_line(&styler.yellow(&health_line));
                } else {
                    print_line(&styler.red(&health_line));
                }

                if !dash.suggestions.is_empty() {
                    print_line("");
                    for s in dash.suggestions.iter() {
                        print_line(&format!("! {}", s.message));
                    }
                }
            }
            Ok(())
        }

        Command::Health(args) => match args.command {
            HealthCommand::Show => {
                refresh_world(&store, &today, &now)?;
                let health_db = store.load_health(&now)?;

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out {
                        current_health: i32,
                        max_health: i32,
                        status: String,
                        mood: String,
                        trend: String,
                        recent_events: usize,
                    }
                    print_json(&Out {
                        current_health: health_db.current_health,
                        max_health: health_db.max_health,
                        status: status_label(health_db.current_health).to_string(),
                        mood: mood_label(health_db.current_health).to_string(),
                        trend: crate::health::trend(&health_db, &today).as_str().to_string(),
                        recent_events: crate::health::recent_events(&health_db, &today).len(),
                    })?;
                } else {
                    print_line(&format!(
                        "health: {}/{} {}",
                        health_db.current_health,
                        health_db.max_health,
                        render_progress_bar(
                            (health_db.current_health.max(0) as u32 * 100)
                                / health_db.max_health.max(1) as u32,
                            20
                        )
                    ));
                    print_line(&format!(
                        "status: {}",
                        status_label(health_db.current_health)
                    ));
                    print_line(&format!("mood: {}", mood_label(health_db.current_health)));
                    print_line(&format!(
                        "trend: {}",
                        crate::health::trend(&health_db, &today).as_str()
                    ));
                }
                Ok(())
            }

            HealthCommand::Sync => {
                let (_, outcome) = refresh_world(&store, &today, &now)?;

                if cli.format == Format::Json {
                    print_json(&outcome)?;
                } else {
                    print_line(&format!(
                        "Health sync: {} event(s), delta {:+}, now {}",
                        outcome.events.len(),
                        outcome.delta,
                        outcome.current_health
                    ));
                }
                Ok(())
            }

            HealthCommand::Events(a) => {
                refresh_world(&store, &today, &now)?;
                let health_db = store.load_health(&now)?;

                let events: Vec<&crate::model::HealthEvent> = if a.all {
                    health_db.health_events.iter().collect()
                } else {
                    crate::health::recent_events(&health_db, &today)
                };

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out<'a> {
                        events: Vec<&'a crate::model::HealthEvent>,
                    }
                    print_json(&Out { events })?;
                } else if events.is_empty() {
                    print_line(&styler.gray("(no health events)"));
                } else {
                    for e in events.iter() {
                        print_line(&format!(
                            "- {} {:+} {} ({})",
                            date_of_ts(&e.ts),
                            e.value,
                            e.description,
                            e.kind.as_str()
                        ));
                    }
                }
                Ok(())
            }

            HealthCommand::Reset(a) => {
                if !a.yes {
                    return Err(CliError::usage(
                        "Resetting health clears the event log; pass --yes to confirm",
                    ));
                }
                let mut health_db = store.load_health(&now)?;
                crate::health::reset(&mut health_db, &now);
                store.save_health(&health_db)?;
                print_line(&format!("Health reset to {}", health_db.current_health));
                Ok(())
            }
        },

        Command::Quest(args) => match args.command {
            QuestCommand::List => {
                refresh_world(&store, &today, &now)?;
                let quest_db = store.load_quests(&now)?;

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out<'a> {
                        quests: &'a [crate::model::Quest],
                    }
                    print_json(&Out {
                        quests: &quest_db.quests,
                    })?;
                } else {
                    let rows: Vec<Vec<String>> = quest_db
                        .quests
                        .iter()
                        .map(|q| {
                            let state = if q.is_completed {
                                styler.green("done")
                            } else if q.is_unlocked {
                                "open".to_string()
                            } else {
                                styler.gray("locked")
                            };
                            vec![
                                q.id.clone(),
                                q.title.clone(),
                                q.kind.as_str().to_string(),
                                state,
                                format!("{}%", q.progress),
                                format!("{} xp", q.xp_reward),
                            ]
                        })
                        .collect();
                    print_line(&render_simple_table(
                        &["id", "title", "kind", "state", "progress", "reward"],
                        &rows,
                    ));
                }
                Ok(())
            }

            QuestCommand::Show(a) => {
                refresh_world(&store, &today, &now)?;
                let quest_db = store.load_quests(&now)?;
                let quest = quest_db
                    .quests
                    .iter()
                    .find(|q| q.id == a.quest)
                    .ok_or_else(|| CliError::not_found(format!("Quest not found: {}", a.quest)))?;

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out<'a> {
                        quest: &'a crate::model::Quest,
                    }
                    print_json(&Out { quest })?;
                } else {
                    print_line(&format!("{} ({})", quest.title, quest.id));
                    print_line(&quest.description.to_string());
                    print_line(&format!(
                        "kind: {} / {} / {}",
                        quest.kind.as_str(),
                        quest.category,
                        quest.difficulty.as_str()
                    ));
                    print_line(&format!(
                        "progress: {}% {}",
                        quest.progress,
                        render_progress_bar(quest.progress, 10)
                    ));
                    for r in quest.requirements.iter() {
                        print_line(&format!(
                            "- {} ({}/{})",
                            r.description, r.current_progress, r.target_progress
                        ));
                    }
                    for r in quest.rewards.iter() {
                        print_line(&format!("reward: {}", r.description));
                    }
                    if quest.is_completed {
                        print_line(&styler.green(&format!(
                            "completed at {}",
                            quest.completed_at.as_deref().unwrap_or("?")
                        )));
                    } else if !quest.is_unlocked {
                        print_line(&styler.gray("locked"));
                    }
                }
                Ok(())
            }

            QuestCommand::Sync => {
                refresh_world(&store, &today, &now)?;
                let quest_db = store.load_quests(&now)?;
                let stats = build_quest_stats(&quest_db);

                if cli.format == Format::Json {
                    print_json(&stats)?;
                } else {
                    print_line(&format!(
                        "Quests: {}/{} complete, tutorial {}%",
                        stats.completed_quests, stats.total_quests, stats.tutorial_progress
                    ));
                }
                Ok(())
            }

            QuestCommand::Complete(a) => {
                refresh_world(&store, &today, &now)?;

                let mut quest_db = store.load_quests(&now)?;
                let outcome = complete_quest(&mut quest_db, &a.quest, &now)?;
                record_activity(&mut quest_db.avatar, &today, &now);
                store.save_quests(&quest_db)?;

                let mut health_delta = 0;
                if !outcome.already_completed {
                    let mut health_db = store.load_health(&now)?;
                    health_delta = crate::health::apply_quest_bonus(
                        &mut health_db,
                        &outcome.quest_id,
                        &outcome.quest_title,
                        &now,
                    );
                    store.save_health(&health_db)?;
                }

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out {
                        completion: crate::quests::CompletionOutcome,
                        health_delta: i32,
                    }
                    print_json(&Out {
                        completion: outcome,
                        health_delta,
                    })?;
                } else if outcome.already_completed {
                    print_line(&format!("Already completed: {}", outcome.quest_title));
                } else {
                    print_line(&styler.green(&format!(
                        "Completed: {} (+{} xp)",
                        outcome.quest_title, outcome.xp_awarded
                    )));
                    if outcome.levels_gained > 0 {
                        print_line(&format!(
                            "Level up! Now level {} ({})",
                            outcome.level,
                            outcome.evolution_stage.as_str()
                        ));
                    }
                    for c in outcome.new_cosmetics.iter() {
                        print_line(&format!("Unlocked cosmetic: {}", c));
                    }
                    if let Some(ref next) = outcome.unlocked_next {
                        print_line(&format!("New quest available: {}", next));
                    }
                }
                Ok(())
            }
        },

        Command::Avatar(args) => match args.command {
            AvatarCommand::Show => {
                refresh_world(&store, &today, &now)?;
                let quest_db = store.load_quests(&now)?;
                let avatar = &quest_db.avatar;

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out<'a> {
                        avatar: &'a crate::model::Avatar,
                    }
                    print_json(&Out { avatar })?;
                } else {
                    print_line(&format!(
                        "level {} ({})",
                        avatar.level,
                        avatar.evolution_stage.as_str()
                    ));
                    let percent = if avatar.xp_to_next_level == 0 {
                        100
                    } else {
                        avatar.xp * 100 / avatar.xp_to_next_level
                    };
                    print_line(&format!(
                        "xp: {}/{} {}",
                        avatar.xp,
                        avatar.xp_to_next_level,
                        render_progress_bar(percent, 20)
                    ));
                    print_line(&format!("mood: {}", avatar.mood.as_str()));
                    print_line(&format!("streak: {} day(s)", avatar.streak_days));
                    if !avatar.cosmetic_unlocks.is_empty() {
                        print_line("cosmetics:");
                        for c in avatar.cosmetic_unlocks.iter() {
                            print_line(&format!("- {} ({})", c.name, c.rarity.as_str()));
                        }
                    }
                }
                Ok(())
            }
        },

        Command::Settings(args) => match args.command {
            SettingsCommand::Show => {
                let settings = store.load_settings()?;
                if cli.format == Format::Json {
                    print_json(&settings)?;
                } else {
                    print_line(&format!(
                        "brewing.default_target_days: {}",
                        settings.brewing.default_target_days
                    ));
                    print_line(&format!(
                        "brewing.default_tea_type: {}",
                        settings.brewing.default_tea_type
                    ));
                    print_line(&format!(
                        "notifications.batch_reminders: {}",
                        settings.notifications.batch_reminders
                    ));
                    print_line(&format!(
                        "notifications.health_alerts: {}",
                        settings.notifications.health_alerts
                    ));
                }
                Ok(())
            }

            SettingsCommand::Set(a) => {
                let mut settings = store.load_settings()?;
                apply_setting(&mut settings, &a.key, &a.value)?;
                store.save_settings(&settings)?;
                print_line(&format!("{} = {}", a.key, a.value));
                Ok(())
            }

            SettingsCommand::Reset => {
                let mut settings = store.load_settings()?;
                reset_settings(&mut settings);
                store.save_settings(&settings)?;
                print_line("Settings reset to defaults");
                Ok(())
            }
        },

        Command::Export(args) => {
            refresh_world(&store, &today, &now)?;
            let bundle = build_bundle(&store, &now)?;
            write_bundle(&bundle, &args.out)?;
            print_line(&format!("Exported state to {}", args.out));
            Ok(())
        }

        Command::Import(args) => {
            let bundle = read_bundle(&args.file)?;
            apply_bundle(&store, &bundle)?;
            print_line(&format!(
                "Imported {} batch(es), {} quest(s) from {}",
                bundle.batches.batches.len(),
                bundle.quests.quests.len(),
                args.file
            ));
            Ok(())
        }

        Command::Watch(args) => loop {
            let today = resolve_today(cli.today.as_deref())?;
            let now = resolve_now(cli.now.as_deref())?;
            let (batch_db, outcome) = refresh_world(&store, &today, &now)?;

            print_line(&format!(
                "[{}] refreshed {} batch(es), health {} ({:+})",
                today,
                batch_db.batches.len(),
                outcome.current_health,
                outcome.delta
            ));
            if outcome.is_notable() {
                let note = format!("notable health change: {:+}", outcome.delta);
                if outcome.delta < 0 {
                    print_line(&styler.red(&note));
                } else {
                    print_line(&styler.green(&note));
                }
            }

            if args.once {
                return Ok(());
            }
            std::thread::sleep(until_next_local_midnight());
        },
    }
}
