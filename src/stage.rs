use anyhow::{anyhow, Context, Result};
use log::{debug, info, trace, warn};
use prop_common::coord_ops;
use prop_common::{CoordMemory, NamedPosition, Snapshot, StageConfig, Step, TrackedDistance};
use std::collections::HashMap;

/// A declared coordinate and where it currently lives in memory.
#[derive(Debug, Clone)]
struct Slot {
    name: String,
    /// `None` once the coordinate has been removed.
    loc: Option<usize>,
}

/// Replays a configured step list over named coordinates held in block memory.
pub struct Stage {
    /// The stage configuration, including the coordinates and the step list.
    pub config: StageConfig,
    memory: CoordMemory,
    slots: Vec<Slot>,
    /// Coordinate name to index in `slots`.
    index: HashMap<String, usize>,
    /// Number of completed replays of the step list.
    pub current_iteration: u32,
    recorded_snapshots: Vec<Snapshot>,
}

impl Stage {
    /// Places every declared coordinate in a fresh buffer.
    pub fn new(config: StageConfig) -> Result<Self> {
        config.validate()?;

        let mut memory = CoordMemory::with_pages(config.memory.initial_pages);
        let mut slots = Vec::with_capacity(config.coords.len());
        let mut index = HashMap::with_capacity(config.coords.len());

        for coord in &config.coords {
            let loc = memory.write_block(coord.x, coord.y);
            debug!("Placed '{}' = ({}, {}) at location {}", coord.name, coord.x, coord.y, loc);
            index.insert(coord.name.clone(), slots.len());
            slots.push(Slot { name: coord.name.clone(), loc: Some(loc) });
        }
        info!(
            "Stage initialized with {} coordinates and {} steps.",
            slots.len(),
            config.steps.len()
        );

        Ok(Stage {
            config,
            memory,
            slots,
            index,
            current_iteration: 0,
            recorded_snapshots: Vec::new(),
        })
    }

    /// Runs the whole step list once.
    pub fn step(&mut self) -> Result<()> {
        for (i, step) in self.config.steps.iter().enumerate() {
            trace!("Iteration {} step {}: {:?}", self.current_iteration + 1, i + 1, step);
            apply_step(&mut self.memory, &mut self.slots, &self.index, step)
                .map_err(|e| anyhow!("Step {} ({}) failed: {}", i + 1, step_name(step), e))?;
        }
        self.current_iteration += 1;
        Ok(())
    }

    /// Records the initial state, replays the step list `timing.iterations` times
    /// and records every `record_interval` iterations plus the last one.
    pub fn run(&mut self) -> Result<()> {
        let total_iterations = self.config.timing.iterations;
        let mut record_interval = self.config.timing.record_interval;
        if record_interval == 0 {
            warn!("Record interval is 0. Recording every iteration.");
            record_interval = 1;
        }
        info!("Recording snapshot every {} iterations.", record_interval);

        // --- Initial Snapshot (iteration 0) ---
        self.record_snapshot().context("Failed to record initial snapshot")?;

        info!("Replaying step list for {} iterations...", total_iterations);
        for iteration in 1..=total_iterations {
            self.step()
                .with_context(|| format!("Stage iteration {} failed", iteration))?;

            if iteration % record_interval == 0 || iteration == total_iterations {
                info!(
                    "Iteration [{}/{}] | Live coordinates: {}",
                    iteration,
                    total_iterations,
                    self.live_count()
                );
                self.record_snapshot()
                    .with_context(|| format!("Failed to record snapshot at iteration {}", iteration))?;
            } else {
                trace!("Iteration [{}/{}] completed", iteration, total_iterations);
            }
        }
        Ok(())
    }

    /// Current value of a live coordinate.
    pub fn position(&self, name: &str) -> Result<[f32; 2]> {
        let loc = live_location(&self.slots, &self.index, name)?;
        Ok(*self.memory.coord(loc)?)
    }

    /// Positions of all live coordinates in declaration order.
    pub fn get_results(&self) -> Vec<NamedPosition> {
        self.slots
            .iter()
            .filter_map(|slot| {
                let loc = slot.loc?;
                let c = self.memory.coord(loc).ok()?;
                Some(NamedPosition { name: slot.name.clone(), x: c[0], y: c[1] })
            })
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.memory.live_blocks()
    }

    pub fn memory(&self) -> &CoordMemory {
        &self.memory
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Records the current positions and tracked distances.
    pub fn record_snapshot(&mut self) -> Result<()> {
        let distances = self
            .config
            .track_distance
            .iter()
            .map(|pair| -> Result<TrackedDistance> {
                let from = live_location(&self.slots, &self.index, &pair.from).ok();
                let to = live_location(&self.slots, &self.index, &pair.to).ok();
                let distance = match (from, to) {
                    (Some(a), Some(b)) => Some(coord_ops::dist(self.memory.coord(a)?, self.memory.coord(b)?)),
                    _ => None,
                };
                Ok(TrackedDistance { from: pair.from.clone(), to: pair.to.clone(), distance })
            })
            .collect::<Result<Vec<_>>>()?;

        let snapshot = Snapshot {
            iteration: self.current_iteration,
            positions: self.get_results(),
            distances,
        };
        debug!(
            "Snapshot at iteration {}: {} live coordinates",
            snapshot.iteration,
            snapshot.positions.len()
        );
        self.recorded_snapshots.push(snapshot);
        Ok(())
    }

    pub fn get_recorded_snapshots(&self) -> &Vec<Snapshot> {
        &self.recorded_snapshots
    }
}

fn step_name(step: &Step) -> &'static str {
    match step {
        Step::Add { .. } => "add",
        Step::Subtract { .. } => "subtract",
        Step::Multiply { .. } => "multiply",
        Step::Divide { .. } => "divide",
        Step::Factor { .. } => "factor",
        Step::Divisor { .. } => "divisor",
        Step::Set { .. } => "set",
        Step::Copy { .. } => "copy",
        Step::Remove { .. } => "remove",
    }
}

fn slot_index(index: &HashMap<String, usize>, name: &str) -> Result<usize> {
    index
        .get(name)
        .copied()
        .ok_or_else(|| anyhow!("Unknown coordinate '{}'", name))
}

fn live_location(slots: &[Slot], index: &HashMap<String, usize>, name: &str) -> Result<usize> {
    let slot = &slots[slot_index(index, name)?];
    slot.loc.ok_or_else(|| anyhow!("Coordinate '{}' has been removed", name))
}

fn apply_step(
    memory: &mut CoordMemory,
    slots: &mut [Slot],
    index: &HashMap<String, usize>,
    step: &Step,
) -> Result<()> {
    match step {
        Step::Add { target, operand } => binary(memory, slots, index, target, operand, coord_ops::add),
        Step::Subtract { target, operand } => binary(memory, slots, index, target, operand, coord_ops::subtract),
        Step::Multiply { target, operand } => binary(memory, slots, index, target, operand, coord_ops::multiply),
        Step::Divide { target, operand } => binary(memory, slots, index, target, operand, coord_ops::divide),
        Step::Factor { target, scalar } => {
            let loc = live_location(slots, index, target)?;
            coord_ops::factor(memory.coord_mut(loc)?, *scalar);
            Ok(())
        }
        Step::Divisor { target, scalar } => {
            let loc = live_location(slots, index, target)?;
            coord_ops::divisor(memory.coord_mut(loc)?, *scalar);
            Ok(())
        }
        Step::Set { target, x, y } => place(memory, slots, index, target, *x, *y),
        Step::Copy { target, source } => {
            let [x, y] = *memory.coord(live_location(slots, index, source)?)?;
            place(memory, slots, index, target, x, y)
        }
        Step::Remove { target } => {
            let i = slot_index(index, target)?;
            let loc = slots[i]
                .loc
                .take()
                .ok_or_else(|| anyhow!("Coordinate '{}' has already been removed", target))?;
            memory.remove_block(loc)
        }
    }
}

/// Writes `(x, y)` into `target`, placing a new block if it was removed.
fn place(
    memory: &mut CoordMemory,
    slots: &mut [Slot],
    index: &HashMap<String, usize>,
    target: &str,
    x: f32,
    y: f32,
) -> Result<()> {
    let i = slot_index(index, target)?;
    match slots[i].loc {
        Some(loc) => memory.write_block_at(loc, x, y)?,
        None => {
            let loc = memory.write_block(x, y);
            debug!("Re-placed '{}' at location {}", target, loc);
            slots[i].loc = Some(loc);
        }
    }
    Ok(())
}

fn binary(
    memory: &mut CoordMemory,
    slots: &[Slot],
    index: &HashMap<String, usize>,
    target: &str,
    operand: &str,
    op: fn(&mut [f32; 2], &[f32; 2]),
) -> Result<()> {
    let loc = live_location(slots, index, target)?;
    let other = live_location(slots, index, operand)?;
    memory.apply(loc, other, op)
}
