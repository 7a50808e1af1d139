//! `--notes` parsing: `pitch:start:end` triples separated by commas.

use anyhow::{anyhow, bail, Context, Result};

/// Phrase mutated when neither `--input` nor `--notes` is given.
pub const DEFAULT_PHRASE: [(u8, f64, f64); 4] = [
    (60, 0.0, 1.0),
    (62, 1.0, 2.0),
    (64, 2.0, 3.0),
    (65, 3.0, 4.0),
];

pub fn parse_notes(list: &str) -> Result<Vec<(u8, f64, f64)>> {
    let events = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_note)
        .collect::<Result<Vec<_>>>()?;
    if events.is_empty() {
        bail!("no notes in {list:?}");
    }
    Ok(events)
}

fn parse_note(triple: &str) -> Result<(u8, f64, f64)> {
    let mut parts = triple.split(':');
    let mut next = |what: &str| {
        parts
            .next()
            .map(str::trim)
            .ok_or_else(|| anyhow!("{triple:?} is missing its {what}"))
    };

    let pitch = next("pitch")?
        .parse::<u8>()
        .with_context(|| format!("bad pitch in {triple:?}"))?;
    let start = next("start")?
        .parse::<f64>()
        .with_context(|| format!("bad start in {triple:?}"))?;
    let end = next("end")?
        .parse::<f64>()
        .with_context(|| format!("bad end in {triple:?}"))?;

    if parts.next().is_some() {
        bail!("{triple:?} has more than pitch:start:end");
    }
    Ok((pitch, start, end))
}
