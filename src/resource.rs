//! Resource estimation and gating.
//!
//! Predicts memory, CPU and disk needs of a planned operation and decides
//! whether it may proceed silently, needs a confirmation, or needs the
//! stronger confirmation reserved for elevated compression levels.
//!
//! Live system state is read through [`SystemProbe`] on every call; nothing is
//! cached between estimates.

use std::path::{Path, PathBuf};

use sysinfo::{Disks, System};
use tracing::{debug, warn};

use crate::config::{CPU_LOAD_THRESHOLD, DISK_COMFORT_FACTOR, DISK_LOW_BYTES, DISK_REQUIRED_FACTOR, MEMORY_FLOOR_GB, MEMORY_TABLE_GB, RATIO_TABLE};
use crate::error::ResourceWarning;
use crate::file::source_size;
use crate::types::CompressionLevel;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Source of live system measurements.
///
/// Every method returns `None` when the measurement is unavailable.
pub trait SystemProbe {
    /// Memory that can be handed to a new process, in bytes.
    fn available_memory(&self) -> Option<u64>;

    /// One-minute load average divided by the core count, as a percentage.
    fn cpu_load_percent(&self) -> Option<f64>;

    /// Free space on the filesystem holding `dir`, in bytes.
    fn available_disk(&self, dir: &Path) -> Option<u64>;
}

/// [`SystemProbe`] backed by `sysinfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveProbe;

impl SystemProbe for LiveProbe {
    fn available_memory(&self) -> Option<u64> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return None;
        }

        let mut sys = System::new();
        sys.refresh_memory();
        // sysinfo reports zero when it cannot read the counters.
        Some(sys.available_memory()).filter(|&bytes| bytes > 0)
    }

    fn cpu_load_percent(&self) -> Option<f64> {
        if !sysinfo::IS_SUPPORTED_SYSTEM || cfg!(windows) {
            return None;
        }

        let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        let load = System::load_average().one;
        Some(load / cores as f64 * 100.0)
    }

    fn available_disk(&self, dir: &Path) -> Option<u64> {
        let target = dir.canonicalize().ok()?;
        let disks = Disks::new_with_refreshed_list();

        disks
            .list()
            .iter()
            .filter(|disk| target.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .map(sysinfo::Disk::available_space)
    }
}

/// How the caller must proceed after an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No warning fired; no prompt needed.
    Proceed,

    /// At least one warning fired; an affirmative answer is required.
    Confirm,

    /// Elevated compression level; an affirmative answer is required even
    /// without warnings.
    ConfirmElevated,
}

/// Snapshot of the measurements behind one estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceReport {
    pub level: CompressionLevel,
    pub required_memory_gb: f64,
    pub available_memory_gb: Option<f64>,
    pub cpu_load_percent: Option<f64>,
    pub available_disk: Option<u64>,
    pub estimated_output: u64,
    /// Crossed thresholds; any entry requires confirmation.
    pub warnings: Vec<ResourceWarning>,
    /// Informational remarks that never gate the operation.
    pub notices: Vec<String>,
}

impl ResourceReport {
    pub fn verdict(&self) -> Verdict {
        if self.level.is_elevated() {
            Verdict::ConfirmElevated
        } else if self.warnings.is_empty() {
            Verdict::Proceed
        } else {
            Verdict::Confirm
        }
    }

    /// Whether the operation may start without any explicit override.
    #[inline]
    pub fn safe_to_proceed(&self) -> bool {
        self.verdict() == Verdict::Proceed
    }
}

/// Estimates resource needs against live system state.
pub struct ResourceEstimator<P = LiveProbe> {
    probe: P,
}

impl ResourceEstimator<LiveProbe> {
    pub fn live() -> Self {
        Self { probe: LiveProbe }
    }
}

impl<P: SystemProbe> ResourceEstimator<P> {
    pub fn new(probe: P) -> Self {
        Self { probe }
    }

    /// Builds a report for writing roughly `estimated_output` bytes into `destination`.
    ///
    /// `estimated_output` of zero means the size is unknown; the disk check then
    /// only reports a generally low free space.
    pub fn estimate(&self, level: CompressionLevel, estimated_output: u64, destination: &Path) -> ResourceReport {
        let required_memory_gb = memory_required_gb(level);
        let mut report = ResourceReport {
            level,
            required_memory_gb,
            available_memory_gb: None,
            cpu_load_percent: None,
            available_disk: None,
            estimated_output,
            warnings: Vec::new(),
            notices: Vec::new(),
        };

        self.check_memory(&mut report);
        self.check_cpu(&mut report);
        self.check_disk(&mut report, destination);

        debug!(level = level.get(), warnings = report.warnings.len(), verdict = ?report.verdict(), "resource estimate");
        report
    }

    fn check_memory(&self, report: &mut ResourceReport) {
        let Some(available) = self.probe.available_memory() else {
            warn!("could not read available memory");
            if report.level.is_elevated() {
                report.warnings.push(ResourceWarning::ExtremeLevel { level: report.level.get() });
            }
            return;
        };

        let available_gb = available as f64 / GIB;
        report.available_memory_gb = Some(available_gb);

        if report.required_memory_gb > available_gb {
            report.warnings.push(ResourceWarning::MemoryShortfall { level: report.level.get(), required_gb: report.required_memory_gb, available_gb });
        }

        if available_gb < MEMORY_FLOOR_GB {
            report.warnings.push(ResourceWarning::LowMemory { available_gb });
        }
    }

    fn check_cpu(&self, report: &mut ResourceReport) {
        let Some(percent) = self.probe.cpu_load_percent() else {
            debug!("load average unavailable");
            return;
        };

        report.cpu_load_percent = Some(percent);
        if percent > CPU_LOAD_THRESHOLD {
            report.warnings.push(ResourceWarning::HighCpuLoad { percent });
        }
    }

    fn check_disk(&self, report: &mut ResourceReport, destination: &Path) {
        let dir = containing_dir(destination);
        let Some(available) = self.probe.available_disk(&dir) else {
            report.notices.push(format!("Could not check disk space for {}", dir.display()));
            return;
        };

        report.available_disk = Some(available);

        if report.estimated_output == 0 {
            if available < DISK_LOW_BYTES {
                report.notices.push(format!("Low disk space: {} MB available", available / (1024 * 1024)));
            }
            return;
        }

        let required = (report.estimated_output as f64 * DISK_REQUIRED_FACTOR).ceil() as u64;
        let comfortable = (report.estimated_output as f64 * DISK_COMFORT_FACTOR).ceil() as u64;

        if available < required {
            report.warnings.push(ResourceWarning::DiskShortfall { required, available });
        } else if available < comfortable {
            report.notices.push(format!("Disk space is tight: {:.1} GB available", available as f64 / GIB));
        }
    }
}

/// Estimated working memory for a level, in GB.
#[inline]
pub fn memory_required_gb(level: CompressionLevel) -> f64 {
    MEMORY_TABLE_GB[level.index()]
}

/// Estimated archive size for `total_bytes` of input at `level`.
#[inline]
pub fn output_size_for(total_bytes: u64, level: CompressionLevel) -> u64 {
    (total_bytes as f64 * RATIO_TABLE[level.index()]).round() as u64
}

/// Estimates the archive size of the given sources.
///
/// An approximation from a fixed ratio table, not a guarantee.
pub fn estimate_output_size<P: AsRef<Path>, S: AsRef<str>>(sources: &[P], exclusions: &[S], level: CompressionLevel) -> u64 {
    output_size_for(source_size(sources, exclusions).bytes, level)
}

/// Directory whose filesystem receives `destination`.
///
/// Walks up to the nearest existing ancestor so not-yet-created output
/// directories still resolve to a mount point.
fn containing_dir(destination: &Path) -> PathBuf {
    let start = if destination.is_dir() { destination } else { destination.parent().unwrap_or(destination) };

    start
        .ancestors()
        .find(|p| !p.as_os_str().is_empty() && p.is_dir())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}
