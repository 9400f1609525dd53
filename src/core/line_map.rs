use crate::types::{Noaa1bError, Noaa1bResult};

/// Scan line attributes needed to place one physical record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEntry {
    /// 1-based scan line number from the record
    pub scan_line: u32,
    pub navigable: bool,
}

/// Contiguous run of mapped lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRun {
    pub start: usize,
    pub len: usize,
}

/// Logical row to physical record index map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMap {
    rows: Vec<Option<usize>>,
    first_scan_line: u32,
}

impl LineMap {
    /// Build the map for a file whose last record reports `lines` scan
    /// lines, keeping only the largest contiguous run of navigable lines.
    pub fn build<I>(lines: usize, records: I) -> Noaa1bResult<Self>
    where
        I: IntoIterator<Item = LineEntry>,
    {
        let mut full: Vec<Option<usize>> = vec![None; lines];
        let mut out_of_range = 0usize;
        let mut unnavigable = 0usize;

        for (index, entry) in records.into_iter().enumerate() {
            let line = entry.scan_line as usize;
            if line < 1 || line > lines {
                out_of_range += 1;
                continue;
            }
            if !entry.navigable {
                unnavigable += 1;
                continue;
            }
            full[line - 1] = Some(index);
        }

        if out_of_range > 0 {
            log::warn!(
                "Skipped {} records with scan line outside [1, {}]",
                out_of_range,
                lines
            );
        }
        if unnavigable > 0 {
            log::debug!("Skipped {} records without usable navigation", unnavigable);
        }

        let runs = find_runs(&full);
        let best = largest_run(&runs).ok_or(Noaa1bError::NoUsableLines)?;

        let discarded: usize = runs.iter().map(|r| r.len).sum::<usize>() - best.len;
        if discarded > 0 {
            log::warn!(
                "Keeping {} lines starting at scan line {}, discarding {} valid lines in {} other segments",
                best.len,
                best.start + 1,
                discarded,
                runs.len() - 1
            );
        }

        let rows = full[best.start..best.start + best.len].to_vec();
        log::info!("Line map: {} rows from {} scan lines", rows.len(), lines);

        Ok(Self {
            rows,
            first_scan_line: (best.start + 1) as u32,
        })
    }

    /// Wrap an explicit row map, first row at scan line 1
    pub fn from_rows(rows: Vec<Option<usize>>) -> Self {
        Self {
            rows,
            first_scan_line: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Physical record index for a logical row
    pub fn record_index(&self, row: usize) -> Option<usize> {
        self.rows.get(row).copied().flatten()
    }

    /// Scan line number of logical row 0
    pub fn first_scan_line(&self) -> u32 {
        self.first_scan_line
    }

    pub fn rows(&self) -> &[Option<usize>] {
        &self.rows
    }
}

/// Find maximal runs of mapped entries
pub fn find_runs(rows: &[Option<usize>]) -> Vec<LineRun> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;

    for (i, row) in rows.iter().enumerate() {
        match (row.is_some(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push(LineRun { start: s, len: i - s });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(LineRun {
            start: s,
            len: rows.len() - s,
        });
    }
    runs
}

/// Longest run; among equal lengths the later run wins
pub fn largest_run(runs: &[LineRun]) -> Option<LineRun> {
    runs.iter().fold(None, |best: Option<LineRun>, &run| match best {
        Some(b) if b.len > run.len => Some(b),
        _ => Some(run),
    })
}
