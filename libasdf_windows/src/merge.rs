use std::collections::BTreeMap;
use std::str::FromStr;

use super::pairing::{ResultTree, StationWindows};
use super::trace::TraceId;

/// Keep only the windows of the best instrument at a station.
///
/// Stations often record the same motion on several instruments (00.LH, 10.LH, ...).
/// The instrument with the most windows summed over its components wins; ties go to
/// the lexicographically smallest instrument id. A station with no windows at all is
/// returned unchanged.
pub fn merge_instruments_window(sta_win: StationWindows) -> StationWindows {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for (trace_id, windows) in sta_win.iter() {
        *counts.entry(instrument_of(trace_id)).or_default() += windows.len();
    }

    let mut best: Option<(&String, usize)> = None;
    for (inst, count) in counts.iter() {
        match best {
            Some((_, best_count)) if *count <= best_count => (),
            _ => best = Some((inst, *count)),
        }
    }

    match best {
        Some((inst, count)) if count > 0 => {
            let inst = inst.clone();
            sta_win
                .into_iter()
                .filter(|(trace_id, _)| instrument_of(trace_id) == inst)
                .collect()
        }
        _ => sta_win,
    }
}

/// Apply the instrument merge to every station of the tree
pub fn merge_windows(results: ResultTree) -> ResultTree {
    results
        .into_iter()
        .map(|(station, sta_win)| (station, sta_win.map(merge_instruments_window)))
        .collect()
}

fn instrument_of(trace_id: &str) -> String {
    match TraceId::from_str(trace_id) {
        Ok(id) => id.instrument(),
        Err(_) => trace_id.to_string(),
    }
}
