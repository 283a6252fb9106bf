use anyhow::{anyhow, bail, Context};
use config::{Config, File};
use hexfleet::{
    hex::axial_to_world,
    movement::TerrainMap,
    selection::{MouseButton, SelectionContext},
    timed, AxialCoordinate, OccupantId, Tactics, TacticsConfig, Unit,
    WorldPosition,
};
use log::{info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use simple_logger::SimpleLogger;
use std::{
    cell::{Cell, RefCell},
    fmt::Debug,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    process,
    rc::Rc,
};
use structopt::StructOpt;
use strum::{Display, EnumString};

/// CLI for playing out scripted scenarios on the Hexfleet tactics core.
#[derive(Debug, StructOpt)]
#[structopt(name = "hexfleet")]
struct Opt {
    /// Path to a scenario file, which defines the grid, the units on it, and
    /// a list of commands to run. Supported formats: JSON, TOML
    scenario: PathBuf,

    /// If given, results will be saved to this directory. The exact files
    /// that appear in the directory are defined by the output formats. See
    /// `--output-formats` for more info
    #[structopt(short, long)]
    output: Option<PathBuf>,

    /// The format(s) to output results in. Supported formats:
    ///
    /// events - Every selection and movement event published while the
    ///   scenario ran, in JSON format
    ///
    /// snapshot - The final state of every unit and the selection, in JSON
    ///   format
    ///
    /// cfg - The full config used for the scenario, in TOML format
    #[structopt(short = "f", long)]
    output_formats: Vec<OutputFormat>,

    /// The logging level to use while running the scenario. See
    /// https://docs.rs/log/0.4.11/log/enum.LevelFilter.html for options
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,
}

/// Different output formats.
#[derive(Copy, Clone, Debug, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
enum OutputFormat {
    // If you change this, make sure to update the help text for
    // `--output-formats`!
    /// Every event published during the run
    Events,
    /// Final game state
    Snapshot,
    /// The scenario's full config, with defaults filled in
    Cfg,
}

impl OutputFormat {
    fn file_name(self) -> &'static str {
        match self {
            Self::Events => "events.json",
            Self::Snapshot => "snapshot.json",
            Self::Cfg => "config.toml",
        }
    }
}

/// Everything needed to set up and play out a game
#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    config: TacticsConfig,
    #[serde(default)]
    units: Vec<ScenarioUnit>,
    #[serde(default)]
    terrain: ScenarioTerrain,
    #[serde(default)]
    commands: Vec<Command>,
}

#[derive(Debug, Deserialize)]
struct ScenarioUnit {
    id: OccupantId,
    name: String,
    #[serde(default)]
    owner: u32,
    position: AxialCoordinate,
    movement_points: u32,
    #[serde(default = "default_selectable")]
    selectable: bool,
}

fn default_selectable() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScenarioTerrain {
    /// Cost to enter any cell without an explicit cost. If not given, the
    /// config's default step cost is used.
    default_cost: Option<u32>,
    costs: Vec<CellCost>,
    impassable: Vec<AxialCoordinate>,
}

#[derive(Debug, Deserialize)]
struct CellCost {
    cell: AxialCoordinate,
    cost: u32,
}

/// One step of player input
#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum Command {
    Select {
        unit: OccupantId,
        #[serde(default)]
        additive: bool,
    },
    Toggle {
        unit: OccupantId,
    },
    Clear,
    /// Click at a point on the grid plane
    Click {
        x: f64,
        z: f64,
        #[serde(default)]
        button: MouseButton,
        #[serde(default)]
        alternate: bool,
    },
    /// Click dead center on a cell
    ClickCell {
        cell: AxialCoordinate,
        #[serde(default)]
        button: MouseButton,
        #[serde(default)]
        alternate: bool,
    },
    StartMovement,
    ToggleMovement,
    Preview {
        target: AxialCoordinate,
    },
    Execute {
        target: AxialCoordinate,
    },
    Cancel,
    Tick {
        dt: f64,
    },
    /// Snap the animating unit straight to its destination
    SkipAnimation,
    Remove {
        unit: OccupantId,
    },
    EndTurn,
}

/// An event as it appears in the events output
#[derive(Debug, Serialize)]
struct RecordedEvent {
    /// Index of the command that triggered the event
    step: usize,
    source: &'static str,
    event: serde_json::Value,
}

/// Collects events from both buses, tagged with the command that was
/// running when they fired
#[derive(Debug, Default)]
struct EventLog {
    step: Cell<usize>,
    events: RefCell<Vec<RecordedEvent>>,
}

impl EventLog {
    fn record<E: Debug + Serialize>(&self, source: &'static str, event: &E) {
        info!("[{}] {:?}", source, event);
        match serde_json::to_value(event) {
            Ok(event) => self.events.borrow_mut().push(RecordedEvent {
                step: self.step.get(),
                source,
                event,
            }),
            Err(err) => warn!("Error serializing {} event: {}", source, err),
        }
    }
}

fn load_scenario(scenario_path: &Path) -> anyhow::Result<Scenario> {
    let mut settings = Config::new();
    let scenario_path = scenario_path.to_str().ok_or_else(|| {
        anyhow!("invalid character in path {:?}", scenario_path)
    })?;
    settings
        .merge(File::with_name(scenario_path))
        .context("error reading scenario file")?;
    settings.try_into().context("error reading scenario")
}

/// Set up the board: terrain first, then every unit
fn build_tactics(scenario: &Scenario) -> anyhow::Result<Tactics> {
    let terrain_def = &scenario.terrain;
    let mut terrain = TerrainMap::new(
        terrain_def
            .default_cost
            .unwrap_or(scenario.config.default_step_cost),
    );
    for CellCost { cell, cost } in &terrain_def.costs {
        terrain.set_cost(*cell, *cost);
    }
    for &cell in &terrain_def.impassable {
        terrain.set_impassable(cell);
    }

    let mut tactics = Tactics::new(scenario.config)
        .context("invalid config")?
        .with_terrain(terrain);
    for entry in &scenario.units {
        let mut unit = Unit::new(entry.name.as_str(), entry.owner);
        unit.selectable = entry.selectable;
        tactics
            .deploy(entry.id, unit, entry.position, entry.movement_points)
            .with_context(|| format!("error deploying unit {}", entry.id))?;
    }
    Ok(tactics)
}

fn click_context(
    tactics: &Tactics,
    point: WorldPosition,
    button: MouseButton,
    alternate: bool,
) -> SelectionContext {
    SelectionContext::resolve(point, &tactics.config().grid, &tactics.layout())
        .button(button)
        .alternate(alternate)
        .source("cli")
}

/// Run a single command. Commands that the game rejects (e.g. an illegal
/// move) are logged and skipped, they don't abort the scenario.
fn run_command(tactics: &mut Tactics, command: &Command) {
    match *command {
        Command::Select { unit, additive } => {
            let context = SelectionContext::default().additive(additive);
            if !tactics.select(unit, &context) {
                warn!("Couldn't select {}", unit);
            }
        }
        Command::Toggle { unit } => {
            tactics.toggle(unit, &SelectionContext::default());
        }
        Command::Clear => tactics.clear_selection(),
        Command::Click {
            x,
            z,
            button,
            alternate,
        } => {
            let context = click_context(
                tactics,
                WorldPosition::new(x, 0.0, z),
                button,
                alternate,
            );
            let layout = tactics.layout();
            let outcome = tactics.handle_click(&context, &layout);
            info!("Click at ({}, {}): {:?}", x, z, outcome);
        }
        Command::ClickCell {
            cell,
            button,
            alternate,
        } => {
            let point = axial_to_world(cell, tactics.config().grid.hex_size);
            let context = click_context(tactics, point, button, alternate);
            let layout = tactics.layout();
            let outcome = tactics.handle_click(&context, &layout);
            info!("Click on {}: {:?}", cell, outcome);
        }
        Command::StartMovement => {
            if !tactics.start_movement() {
                warn!("Couldn't start movement");
            }
        }
        Command::ToggleMovement => {
            tactics.toggle_movement_mode();
        }
        Command::Preview { target } => {
            if tactics.preview_target(target).is_none() {
                warn!("No path preview for {}", target);
            }
        }
        Command::Execute { target } => {
            let layout = tactics.layout();
            // Rejections are already logged by the coordinator
            if let Ok(outcome) = tactics.execute_movement(target, &layout) {
                info!(
                    "{} has {} movement points left",
                    outcome.unit, outcome.remaining_points
                );
            }
        }
        Command::Cancel => {
            tactics.cancel_movement();
        }
        Command::Tick { dt } => {
            tactics.tick(dt);
        }
        Command::SkipAnimation => {
            if tactics.skip_animation().is_none() {
                warn!("No animation to skip");
            }
        }
        Command::Remove { unit } => {
            if tactics.remove_unit(unit).is_none() {
                warn!("No unit {} to remove", unit);
            }
        }
        Command::EndTurn => tactics.end_turn(),
    }
}

/// Generate an output form of the results in the given format.
fn gen_output(
    output_dir: &Path,
    output_format: OutputFormat,
    tactics: &Tactics,
    event_log: &EventLog,
) -> anyhow::Result<()> {
    fn generate_bytes(
        output_format: OutputFormat,
        tactics: &Tactics,
        event_log: &EventLog,
    ) -> anyhow::Result<Vec<u8>> {
        let bytes = match output_format {
            OutputFormat::Events => {
                serde_json::to_vec_pretty(&*event_log.events.borrow())?
            }
            OutputFormat::Snapshot => tactics.snapshot().to_json()?.into(),
            OutputFormat::Cfg => {
                // Go through a toml Value so nested tables end up after
                // plain values, which toml requires
                let value = toml::Value::try_from(tactics.config())?;
                toml::to_string_pretty(&value)?.into_bytes()
            }
        };
        Ok(bytes)
    }

    let output_file_path = output_dir.join(output_format.file_name());

    timed!(
        format!(
            "Generating {} output and writing to {:?}",
            output_format, &output_file_path
        ),
        log::Level::Info,
        {
            let bytes = generate_bytes(output_format, tactics, event_log)
                .with_context(|| {
                    format!("error generating {} output", output_format)
                })?;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&output_file_path)
                .with_context(|| {
                    format!("error opening output file {:?}", &output_file_path)
                })?;
            file.write_all(&bytes).with_context(|| {
                format!("error writing to file {:?}", &output_file_path)
            })?;
        }
    );

    Ok(())
}

/// Run the CLI with some options
fn run(opt: Opt) -> anyhow::Result<()> {
    SimpleLogger::new().with_level(opt.log_level).init()?;

    let scenario = load_scenario(&opt.scenario)?;
    let mut tactics = build_tactics(&scenario)?;
    info!(
        "Loaded scenario {:?} with {} units and {} commands",
        &opt.scenario,
        scenario.units.len(),
        scenario.commands.len()
    );

    let event_log = Rc::new(EventLog::default());
    {
        let event_log = Rc::clone(&event_log);
        tactics
            .selection_events()
            .subscribe(move |event| event_log.record("selection", event));
    }
    {
        let event_log = Rc::clone(&event_log);
        tactics
            .movement_events()
            .subscribe(move |event| event_log.record("movement", event));
    }

    timed!("Running scenario", log::Level::Info, {
        for (step, command) in scenario.commands.iter().enumerate() {
            event_log.step.set(step);
            run_command(&mut tactics, command);
        }
        // Don't leave an animation hanging
        tactics.skip_animation();
    });

    // If an output dir was specified, write out output format(s) there
    if let Some(output_dir) = opt.output {
        if opt.output_formats.is_empty() {
            bail!("output dir was specified, but no output formats were given")
        }
        fs::create_dir_all(&output_dir)?;

        for output_format in opt.output_formats {
            gen_output(&output_dir, output_format, &tactics, &event_log)?;
        }
    }

    Ok(())
}

fn main() {
    let exit_code = match run(Opt::from_args()) {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    };
    process::exit(exit_code);
}
