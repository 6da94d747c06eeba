use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use wod_core::config::DataConfig;
use wod_core::csv_rollup::{cleanup_processed_wals, wal_to_csv_and_archive};
use wod_core::periodization::{needs_deload, weekly_volume};
use wod_core::*;

#[derive(Parser)]
#[command(name = "wod")]
#[command(about = "Daily workout composer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Plan as of this date (YYYY-MM-DD) instead of today
    #[arg(long, global = true)]
    date: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose today's workout (default)
    Today {
        /// Dry run - show the workout without recording it
        #[arg(long)]
        dry_run: bool,

        /// Seed the random tie-breaks for a reproducible workout
        #[arg(long)]
        seed: Option<u64>,

        /// Compose a mobility day instead of a strength day
        #[arg(long)]
        mobility: bool,
    },

    /// Show average weekly volume per muscle group
    Volume,

    /// Show deload status
    Deload,

    /// Roll up WAL workouts to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },

    /// Stop recommending an exercise
    Ignore {
        /// Exercise id from the catalog
        exercise_id: u32,
    },

    /// Move an exercise's skill score one progression step
    Skill {
        /// Exercise id from the catalog
        exercise_id: u32,

        #[arg(value_enum)]
        direction: Direction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Up,
    Down,
}

/// Everything a command needs, resolved once from flags and config.
struct Env {
    config: Config,
    data: DataConfig,
    today: NaiveDate,
    catalog: &'static Catalog,
}

impl Env {
    fn history(&self) -> FileHistory {
        FileHistory::new(self.data.wal_path(), self.data.csv_path())
    }

    fn state_store(&self) -> JsonStateStore {
        JsonStateStore::new(self.data.state_dir())
    }

    /// Full history plus the user profile built from config.
    ///
    /// Without a configured creation date the oldest record stands in, or
    /// today for a user with no history.
    fn user_and_records(&self) -> Result<(User, Vec<WorkoutRecord>)> {
        let user_id = UserId(self.config.user.id);
        let records = self.history().workouts_since(user_id, NaiveDate::MIN)?;
        let created = records.iter().map(|r| r.date).min().unwrap_or(self.today);
        Ok((self.config.to_user(self.catalog, created), records))
    }

    fn exercise(&self, id: u32) -> Result<&'static Exercise> {
        self.catalog
            .exercise(ExerciseId(id))
            .ok_or_else(|| Error::State(format!("Unknown exercise id {}", id)))
    }
}

fn main() -> Result<()> {
    // Initialize logging
    wod_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data = DataConfig {
        data_dir: cli
            .data_dir
            .unwrap_or_else(|| config.data.data_dir.clone()),
    };

    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    let env = Env {
        config,
        data,
        today: cli.date.unwrap_or_else(|| Local::now().date_naive()),
        catalog,
    };

    match cli.command {
        Some(Commands::Today {
            dry_run,
            seed,
            mobility,
        }) => cmd_today(&env, dry_run, seed, mobility),
        Some(Commands::Volume) => cmd_volume(&env),
        Some(Commands::Deload) => cmd_deload(&env),
        Some(Commands::Rollup { cleanup }) => cmd_rollup(&env, cleanup),
        Some(Commands::Ignore { exercise_id }) => cmd_ignore(&env, exercise_id),
        Some(Commands::Skill {
            exercise_id,
            direction,
        }) => cmd_skill(&env, exercise_id, direction),
        None => {
            // Default to "today" command
            cmd_today(&env, false, None, false)
        }
    }
}

fn cmd_today(env: &Env, dry_run: bool, seed: Option<u64>, mobility: bool) -> Result<()> {
    let (user, _) = env.user_and_records()?;
    let user_id = user.id;
    let mut store = env.state_store();
    let ctx = UserContext {
        state: store.load(user_id)?,
        user,
        today: env.today,
    };

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let kind = if mobility {
        WorkoutKind::Mobility
    } else {
        WorkoutKind::Strength
    };

    let workout = plan_workout(
        env.catalog,
        &ctx,
        &env.history(),
        kind,
        &env.config.workout,
        &mut rng,
    )?;
    display_workout(&workout);

    if dry_run {
        println!("\n[Dry run - not recording workout]");
        return Ok(());
    }

    let mut sink = JsonlSink::new(env.data.wal_path());
    sink.append(&workout.record)?;
    tracing::info!("Recorded workout {} to {:?}", workout.record.id, sink.path());
    store.mark_seen(
        user_id,
        &workout.seen,
        env.config.periodization.refresh,
        env.today,
    )?;

    println!("\n✓ Workout recorded!");
    Ok(())
}

fn cmd_volume(env: &Env) -> Result<()> {
    let (user, records) = env.user_and_records()?;
    let Some(volume) = weekly_volume(&user, env.catalog, &records, env.today) else {
        println!("Not enough data yet - volume tracking starts once you are past the new-user period.");
        return Ok(());
    };

    if volume.is_empty() {
        println!(
            "No workouts in the last {} weeks.",
            user.volume_window_weeks
        );
        return Ok(());
    }

    println!("Weekly volume (last {} weeks):", user.volume_window_weeks);
    for (muscle, sets) in volume.iter() {
        let preference = user
            .volume_preferences
            .iter()
            .find(|p| p.muscle.contains(muscle));
        match preference {
            Some(p) => println!(
                "  {:<15} {:>6.1}  (preferred {:.0}-{:.0})",
                muscle.display_name(),
                sets,
                p.min,
                p.max
            ),
            None => println!("  {:<15} {:>6.1}", muscle.display_name(), sets),
        }
    }
    Ok(())
}

fn cmd_deload(env: &Env) -> Result<()> {
    let (user, records) = env.user_and_records()?;
    let status = needs_deload(&user, &records, env.today);

    if status.needs_deload {
        println!("Deload week: yes");
    } else {
        println!("Deload week: no");
        println!(
            "  Next deload in {} days",
            status.time_until_deload.num_days()
        );
    }
    Ok(())
}

fn cmd_rollup(env: &Env, cleanup: bool) -> Result<()> {
    let wal_path = env.data.wal_path();
    let csv_path = env.data.csv_path();

    if !wal_path.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = wal_to_csv_and_archive(&wal_path, &csv_path)?;

    println!("✓ Rolled up {} workouts to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        let cleaned = cleanup_processed_wals(&env.data.data_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}

fn cmd_ignore(env: &Env, exercise_id: u32) -> Result<()> {
    let exercise = env.exercise(exercise_id)?;
    let mut store = env.state_store();
    store.update(UserId(env.config.user.id), |state| {
        state.exercises.entry(exercise.id).or_default().seen.ignore = true;
        Ok(())
    })?;

    println!("✓ {} will no longer be recommended", exercise.name);
    Ok(())
}

fn cmd_skill(env: &Env, exercise_id: u32, direction: Direction) -> Result<()> {
    let exercise = env.exercise(exercise_id)?;
    let harder = matches!(direction, Direction::Up);
    let mut store = env.state_store();
    let state = store.update(UserId(env.config.user.id), |state| {
        state.adjust_skill(exercise.id, harder);
        Ok(())
    })?;

    println!(
        "✓ {} skill is now {}",
        exercise.name,
        state.skill(exercise.id)
    );
    Ok(())
}

fn display_workout(workout: &ComposedWorkout<'_>) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", workout.rotation.name.to_uppercase());
    println!("╰─────────────────────────────────────────╯");
    if workout.deload.needs_deload {
        println!("  Deload week - keep the weights light.");
    }

    if workout.is_empty() {
        println!("\n  Nothing to recommend today - check your equipment and ignored exercises.\n");
        return;
    }

    for section in &workout.sections {
        println!();
        println!("  {}", section.section);

        if section.exercises.is_empty() {
            println!("    nothing to recommend");
            continue;
        }

        let intensity = section.section.intensity(workout.deload.needs_deload);
        let proficiency = intensity.proficiency();
        for selected in &section.exercises {
            println!(
                "    → {} ({}): {} x {}",
                selected.variation.name, selected.exercise.name, proficiency.sets, proficiency.reps
            );
            if let Some(reason) = selected.facts.current_reason() {
                println!("      ℹ Current progression unavailable: {}", reason);
            }
        }
    }

    println!();
}
