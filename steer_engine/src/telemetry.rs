//! Telemetry sink.
//!
//! Ring buffer of per-iteration records, flushed to a whitespace-aligned
//! text file in one batch when the buffer fills. Writes are O(1); the flush
//! is O(depth) and happens only at the wrap, so the control path never pays
//! for file I/O on ordinary iterations. A zero depth disables the sink
//! entirely.
//!
//! Records still buffered at teardown are flushed on drop rather than
//! discarded. Flush failures are logged and swallowed; telemetry must never
//! take the control loop down.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::warn;

use steer_common::constraint::Constraint;

/// Snapshot of one filter's scalars for a telemetry row.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterSnapshot {
    pub x_hat_minus: f64,
    pub x_hat: f64,
    pub p_minus: f64,
    pub p: f64,
    pub h: f64,
    pub k: f64,
}

/// One period-boundary record.
#[derive(Debug, Clone, Copy)]
pub struct Record {
    /// Host-supplied iteration tag.
    pub tag: u64,
    /// Constraint active when the record was taken.
    pub constraint: Constraint,
    /// Measured iteration rate.
    pub perf: f64,
    /// Performance-filter scalars.
    pub perf_filter: FilterSnapshot,
    /// Current speedup output and its tracking error.
    pub speedup: f64,
    pub speedup_error: f64,
    /// Measured power.
    pub power: f64,
    /// Cost-filter scalars.
    pub cost_filter: FilterSnapshot,
    /// Current powerup output and its tracking error.
    pub powerup: f64,
    pub powerup_error: f64,
    /// Workload estimates.
    pub time_workload: f64,
    pub energy_workload: f64,
    /// Planned schedule; ids are -1 when no pair qualified.
    pub lower_id: i64,
    pub upper_id: i64,
    pub low_state_iters: u32,
    pub idle_ns: u64,
}

/// Buffered telemetry writer.
#[derive(Debug)]
pub struct Telemetry {
    sink: Option<Sink>,
}

#[derive(Debug)]
struct Sink {
    out: BufWriter<File>,
    records: Vec<Record>,
    depth: usize,
}

impl Telemetry {
    /// A sink that drops every record.
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// Create the log file, write the header row, and size the ring buffer.
    pub fn create(path: &Path, depth: usize) -> io::Result<Self> {
        let mut out = BufWriter::new(File::create(path)?);
        write_header(&mut out)?;
        out.flush()?;
        Ok(Self {
            sink: Some(Sink {
                out,
                records: Vec::with_capacity(depth),
                depth,
            }),
        })
    }

    /// Buffer one record; flush the batch when the buffer wraps.
    pub fn push(&mut self, record: Record) {
        let Some(sink) = &mut self.sink else { return };
        sink.records.push(record);
        if sink.records.len() >= sink.depth {
            sink.flush();
        }
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        if let Some(sink) = &mut self.sink {
            sink.flush();
        }
    }
}

impl Sink {
    fn flush(&mut self) {
        for record in &self.records {
            if let Err(e) = write_record(&mut self.out, record) {
                warn!(error = %e, "telemetry write failed, dropping batch");
                break;
            }
        }
        self.records.clear();
        if let Err(e) = self.out.flush() {
            warn!(error = %e, "telemetry flush failed");
        }
    }
}

fn write_header<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "{:>10} {:>12}", "TAG", "CONSTRAINT")?;
    write!(out, " {:>14}", "RATE")?;
    for name in ["PF_XH_MINUS", "PF_XHAT", "PF_P_MINUS", "PF_P", "PF_H", "PF_K"] {
        write!(out, " {:>14}", name)?;
    }
    write!(out, " {:>14} {:>14}", "SPEEDUP", "S_ERROR")?;
    write!(out, " {:>14}", "POWER")?;
    for name in ["CF_XH_MINUS", "CF_XHAT", "CF_P_MINUS", "CF_P", "CF_H", "CF_K"] {
        write!(out, " {:>14}", name)?;
    }
    write!(out, " {:>14} {:>14}", "POWERUP", "P_ERROR")?;
    write!(out, " {:>14} {:>14}", "T_WORKLOAD", "E_WORKLOAD")?;
    writeln!(out, " {:>9} {:>9} {:>10} {:>12}", "LOWER_ID", "UPPER_ID", "LOW_ITERS", "IDLE_NS")
}

fn write_record<W: Write>(out: &mut W, r: &Record) -> io::Result<()> {
    write!(out, "{:>10} {:>12}", r.tag, r.constraint.as_str())?;
    write!(out, " {:>14.6}", r.perf)?;
    write_filter(out, &r.perf_filter)?;
    write!(out, " {:>14.6} {:>14.6}", r.speedup, r.speedup_error)?;
    write!(out, " {:>14.6}", r.power)?;
    write_filter(out, &r.cost_filter)?;
    write!(out, " {:>14.6} {:>14.6}", r.powerup, r.powerup_error)?;
    write!(out, " {:>14.6} {:>14.6}", r.time_workload, r.energy_workload)?;
    writeln!(
        out,
        " {:>9} {:>9} {:>10} {:>12}",
        r.lower_id, r.upper_id, r.low_state_iters, r.idle_ns
    )
}

fn write_filter<W: Write>(out: &mut W, f: &FilterSnapshot) -> io::Result<()> {
    write!(
        out,
        " {:>14.6} {:>14.6} {:>14.6} {:>14.6} {:>14.6} {:>14.6}",
        f.x_hat_minus, f.x_hat, f.p_minus, f.p, f.h, f.k
    )
}

// ─── Tests ──────────────────────────────────────────────────────────
