//! Trainer Example
//!
//! A toy training script configured entirely from the command line.
//!
//! # Configuration Tree
//!
//! ```text
//! TrainConfig { run_name, steps, batch_size, bs -> batch_size, snapshot, model, optim }
//! ├── ModelConfig { layers, width, dropout, dims }
//! └── Wrapper<Optimizer> { lr, momentum, nesterov }
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package trainer -- run_name=demo steps=100 optim.lr=(3e-4 * 2)
//! cargo run --package trainer -- run_name=wide --in model layers=4 width=512 in-- .double_batch --show
//! cargo run --package trainer -- run_name=demo --list model.dims 64 128 list-- bs=32
//! ```
//!
//! Engine settings come from `pliant.toml` and `PLIANT_*` variables, e.g.
//! `PLIANT_LOGGING__LEVEL=debug` to trace every applied command.

use std::path::PathBuf;

use anyhow::Result;
use pliant::prelude::*;
use pliant::runtime::persist;
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Record)]
#[record(crate = "pliant::core")]
struct Optimizer {
    #[record(default = 1e-3)]
    lr: f64,
    #[record(default = 0.9)]
    momentum: f64,
    #[record(default)]
    nesterov: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Config)]
#[config(crate = "pliant::core", finalize = finish)]
struct ModelConfig {
    layers: u32,
    width: u32,
    dropout: f64,
    dims: Vec<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            layers: 2,
            width: 256,
            dropout: 0.1,
            dims: Vec::new(),
        }
    }
}

impl ModelConfig {
    /// Fills explicit layer widths when none were given.
    fn finish(&mut self) -> HookResult {
        anyhow::ensure!((0.0..1.0).contains(&self.dropout), "dropout must be in [0, 1)");
        if self.dims.is_empty() {
            self.dims = vec![self.width; self.layers as usize];
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Config)]
#[config(crate = "pliant::core", finalize = finish, methods(double_batch, schedule))]
struct TrainConfig {
    run_name: Required<String>,
    steps: i64,
    batch_size: i64,
    bs: Alias,
    warmup: i64,
    snapshot: Option<PathBuf>,
    model: ModelConfig,
    optim: Wrapper<Optimizer>,
    #[config(skip)]
    #[serde(skip)]
    optimizer: Option<Optimizer>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            run_name: Required::Unset,
            steps: 1000,
            batch_size: 16,
            bs: Alias::to("batch_size"),
            warmup: 0,
            snapshot: None,
            model: ModelConfig::default(),
            optim: Wrapper::new(),
            optimizer: None,
        }
    }
}

impl TrainConfig {
    fn finish(&mut self) -> HookResult {
        self.optimizer = Some(self.optim.build()?);
        if self.warmup == 0 {
            self.warmup = self.steps / 10;
        }
        Ok(())
    }

    /// `.double_batch`: doubles the batch size and halves the step count.
    fn double_batch(&mut self, args: CallArgs) -> HookResult {
        args.expect_none()?;
        self.batch_size *= 2;
        self.steps /= 2;
        Ok(())
    }

    /// `.schedule(steps, warmup=0)`
    fn schedule(&mut self, args: CallArgs) -> HookResult {
        let mut args = args.bind(&["steps", "warmup"])?;
        self.steps = args.required("steps")?;
        self.warmup = args.optional("warmup")?.unwrap_or(0);
        Ok(())
    }
}

// ============================================================================
// Entry Point
// ============================================================================

fn train(config: TrainConfig) -> Result<()> {
    let run_name = config.run_name.require("run_name")?;
    let optimizer = config
        .optimizer
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("optimizer was not built"))?;

    info!(
        run = %run_name,
        steps = config.steps,
        batch_size = config.batch_size,
        warmup = config.warmup,
        lr = optimizer.lr,
        momentum = optimizer.momentum,
        nesterov = optimizer.nesterov,
        dims = ?config.model.dims,
        "Starting training"
    );

    let mut loss = 1.0_f64;
    for step in 0..config.steps {
        loss *= 1.0 - optimizer.lr;
        if step % (config.steps / 5).max(1) == 0 {
            info!(step, loss, "Training step");
        }
    }

    if let Some(path) = &config.snapshot {
        persist::save_snapshot(&config, path)?;
        info!(path = %path.display(), "Saved snapshot");
    }

    println!("{run_name}: final loss {loss:.6}");
    Ok(())
}

fn main() -> Result<()> {
    App::<TrainConfig>::load()?.run(train)?.transpose()?;
    Ok(())
}
