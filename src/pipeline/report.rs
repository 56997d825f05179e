//! Build report types and formatting.

use std::fmt;
use std::path::PathBuf;

use owo_colors::OwoColorize;

use crate::asset::AssetClass;
use crate::debug;
use crate::utils::{plural_count, plural_s};

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Transformed output written.
    Written { output: PathBuf },
    /// Original bytes written in place of the transformed output.
    Fallback { output: PathBuf, reason: String },
    /// Nothing written.
    Failed { reason: String },
}

/// Outcome for one input file, paths relative to the stage roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub source: PathBuf,
    pub outcome: ItemOutcome,
}

impl ItemReport {
    pub fn written(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            outcome: ItemOutcome::Written {
                output: output.into(),
            },
        }
    }

    pub fn fallback(
        source: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            outcome: ItemOutcome::Fallback {
                output: output.into(),
                reason: reason.into(),
            },
        }
    }

    pub fn failed(source: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            outcome: ItemOutcome::Failed {
                reason: reason.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Completed,
    Skipped { reason: String },
    Failed { error: String },
}

/// Result of one pipeline stage.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub class: AssetClass,
    pub status: StageStatus,
    pub items: Vec<ItemReport>,
}

impl StageReport {
    pub fn completed(class: AssetClass, items: Vec<ItemReport>) -> Self {
        Self {
            class,
            status: StageStatus::Completed,
            items,
        }
    }

    pub fn skipped(class: AssetClass, reason: impl Into<String>) -> Self {
        Self {
            class,
            status: StageStatus::Skipped {
                reason: reason.into(),
            },
            items: Vec::new(),
        }
    }

    pub fn failed(class: AssetClass, error: impl Into<String>) -> Self {
        Self {
            class,
            status: StageStatus::Failed {
                error: error.into(),
            },
            items: Vec::new(),
        }
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.outcome)).count()
    }

    pub fn written_count(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Written { .. }))
    }

    pub fn fallback_count(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Fallback { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed { .. }))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, StageStatus::Failed { .. })
    }
}

/// Aggregated result of a build run.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Destination root.
    pub output: PathBuf,
    /// One entry per stage, in execution order.
    pub stages: Vec<StageReport>,
}

impl BuildReport {
    pub fn failed_stages(&self) -> usize {
        self.stages.iter().filter(|s| s.is_failed()).count()
    }

    pub fn failed_items(&self) -> usize {
        self.stages.iter().map(StageReport::failed_count).sum()
    }

    /// No stage failed and every item produced output.
    pub fn is_complete(&self) -> bool {
        self.failed_stages() == 0 && self.failed_items() == 0
    }

    /// Print the per-stage table to stdout.
    pub fn print(&self) {
        println!();
        for stage in &self.stages {
            let label = format!("{:<6}", stage.class.label());
            match &stage.status {
                StageStatus::Completed => println!(
                    "{} {} written, {} fallback, {} failed",
                    label.bold(),
                    stage.written_count(),
                    stage.fallback_count(),
                    stage.failed_count()
                ),
                StageStatus::Skipped { reason } => {
                    println!("{} {}", label.bold(), format!("skipped ({reason})").dimmed())
                }
                StageStatus::Failed { error } => {
                    println!("{} {} {}", label.bold(), "failed".red().bold(), error)
                }
            }

            for item in &stage.items {
                match &item.outcome {
                    ItemOutcome::Written { output } => {
                        debug!("build"; "{} -> {}", item.source.display(), output.display());
                    }
                    ItemOutcome::Fallback { output, reason } => println!(
                        "  {} {} -> {} {}",
                        "→".yellow(),
                        item.source.display(),
                        output.display(),
                        reason.dimmed()
                    ),
                    ItemOutcome::Failed { reason } => println!(
                        "  {} {} {}",
                        "→".red(),
                        item.source.display(),
                        reason
                    ),
                }
            }
        }
        println!();
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages = self.failed_stages();
        let items = self.failed_items();
        if stages == 0 && items == 0 {
            return write!(f, "build complete: {}", self.output.display());
        }

        let mut parts = Vec::new();
        if stages > 0 {
            parts.push(format!("{stages} failed stage{}", plural_s(stages)));
        }
        if items > 0 {
            parts.push(plural_count(items, "failed file"));
        }
        write!(
            f,
            "build finished with {}: {}",
            parts.join(", "),
            self.output.display()
        )
    }
}
