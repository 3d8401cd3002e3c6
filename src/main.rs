use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use log::info;
use street_sim::simulation::{Axes, ButtonState, InputFrame, PossessionState, SandboxWorld};

#[derive(Parser)]
#[command(name = "street_sim")]
#[command(about = "Headless street simulation driven by a scripted player")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "600")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.1")]
    delta: f32,

    /// Seed for the simulation RNG
    #[arg(long, default_value = "7")]
    seed: u64,

    /// Size of the initial pedestrian crowd
    #[arg(long, default_value = "10")]
    pedestrians: usize,

    /// Print a summary every N ticks, 0 to only print the final state
    #[arg(long, default_value = "100")]
    report_every: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn,street_sim=info"))
        .init();

    let cli = Cli::parse();
    run_headless(&cli)
}

/// Run the demo world with the scripted pilot at the controls
fn run_headless(cli: &Cli) -> Result<()> {
    println!("Running street simulation in headless mode...");
    println!(
        "Ticks: {}, Delta: {}s, Seed: {}",
        cli.ticks, cli.delta, cli.seed
    );
    println!();

    let mut world = SandboxWorld::create_demo_world(cli.seed, cli.pedestrians)
        .context("Failed to create the demo world")?;

    println!("Initial state:");
    world.print_summary();
    println!();

    let mut pilot = Pilot::new();
    for tick in 1..=cli.ticks {
        let input = pilot.next_input(&world);
        world.tick(cli.delta, &input);

        if cli.report_every > 0 && tick % cli.report_every == 0 {
            println!(
                "--- After tick {} ({:.1}s simulated time, pilot {:?}) ---",
                tick, world.time, pilot.stage
            );
            world.print_summary();
            println!();
        }
    }

    println!("=== SIMULATION COMPLETE ===");
    world.print_summary();
    Ok(())
}

/// Board when a vehicle is closer than this
const BOARDING_RANGE: f32 = 8.0;
/// Get out once the vehicle has slowed below this
const STOPPED_SPEED: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum PilotStage {
    Stroll { until: f32 },
    Shoot { until: f32 },
    Approach { give_up_at: f32 },
    Boarding,
    Drive { until: f32 },
    Stop,
    Leave,
    Idle,
}

/// Scripted player: walks, shoots at the crowd, takes a car, drives it,
/// brakes and gets out
struct Pilot {
    stage: PilotStage,
}

impl Pilot {
    fn new() -> Self {
        Self {
            stage: PilotStage::Stroll { until: 3.0 },
        }
    }

    fn advance_to(&mut self, stage: PilotStage) {
        info!("Pilot: {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    fn next_input(&mut self, world: &SandboxWorld) -> InputFrame {
        let now = world.time;
        let position = world.player.position();
        let mut input = InputFrame::default();

        match self.stage {
            PilotStage::Stroll { until } => {
                input.axes = Axes::new(1.0, 0.0);
                if now >= until {
                    self.advance_to(PilotStage::Shoot { until: now + 2.0 });
                }
            }
            PilotStage::Shoot { until } => {
                // Creep towards the closest pedestrian so the character faces it
                let target = world
                    .pedestrians
                    .iter()
                    .filter(|pedestrian| !pedestrian.is_dead())
                    .map(|pedestrian| pedestrian.position)
                    .min_by(|a, b| a.distance(position).total_cmp(&b.distance(position)));
                if let Some(target) = target {
                    let direction = flat_direction(position, target);
                    if world.player.pose.forward().dot(direction) > 0.99 {
                        input.aim = ButtonState::Held;
                        input.fire = ButtonState::Held;
                    } else {
                        // Aiming locks the heading, so turn first
                        let step = direction * 0.1;
                        input.axes = Axes::new(step.x, step.z);
                    }
                }
                if now >= until {
                    self.advance_to(PilotStage::Approach {
                        give_up_at: now + 60.0,
                    });
                }
            }
            PilotStage::Approach { give_up_at } => {
                let nearest = world
                    .vehicles
                    .nearest_within(position, f32::INFINITY)
                    .and_then(|id| world.vehicles.get(id));
                match nearest {
                    Some(vehicle) if vehicle.position().distance(position) < BOARDING_RANGE => {
                        input.interact = ButtonState::Down;
                        self.advance_to(PilotStage::Boarding);
                    }
                    Some(vehicle) => {
                        let direction = flat_direction(position, vehicle.position());
                        input.axes = Axes::new(direction.x, direction.z);
                        input.sprint = ButtonState::Held;
                    }
                    None => {}
                }
                if self.stage != PilotStage::Boarding && now >= give_up_at {
                    self.advance_to(PilotStage::Idle);
                }
            }
            PilotStage::Boarding => match world.possession.state() {
                PossessionState::Driving => self.advance_to(PilotStage::Drive { until: now + 5.0 }),
                PossessionState::OnFoot => self.advance_to(PilotStage::Approach {
                    give_up_at: now + 30.0,
                }),
                _ => {}
            },
            PilotStage::Drive { until } => {
                input.axes = Axes::new(0.2, 1.0);
                if now >= until {
                    self.advance_to(PilotStage::Stop);
                }
            }
            PilotStage::Stop => {
                input.brake = ButtonState::Held;
                let speed = world
                    .possession
                    .driving_vehicle()
                    .and_then(|id| world.vehicles.get(id))
                    .map(|vehicle| vehicle.speed());
                match speed {
                    Some(speed) if speed >= STOPPED_SPEED => {}
                    Some(_) => {
                        input.interact = ButtonState::Down;
                        self.advance_to(PilotStage::Leave);
                    }
                    None => self.advance_to(PilotStage::Leave),
                }
            }
            PilotStage::Leave => {
                if world.possession.state() == PossessionState::OnFoot {
                    self.advance_to(PilotStage::Idle);
                }
            }
            PilotStage::Idle => {}
        }

        input
    }
}

fn flat_direction(from: Vec3, to: Vec3) -> Vec3 {
    Vec3::new(to.x - from.x, 0.0, to.z - from.z).normalize_or_zero()
}
