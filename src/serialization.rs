use std::io::{self, BufRead, Write};

use crate::model::cc::ControlLane;
use crate::model::note::Tick;
use crate::model::store::NoteStore;

/// Version tag on the first line of the text format.
pub const FORMAT_TAG: &str = "PPR1";

/// Write notes and CC lanes as the PPR1 line format:
///
/// ```text
/// PPR1
/// N <tick> <duration> <key> <velocity> <channel>
/// C <cc_number> <tick> <value>
/// ```
///
/// Notes are written in storage order, then each lane's points in tick
/// order. Ids are not preserved across a round trip.
pub fn serialize(notes: &NoteStore, lanes: &[ControlLane], out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", FORMAT_TAG)?;

    for n in notes.notes() {
        writeln!(
            out,
            "N {} {} {} {} {}",
            n.tick, n.duration, n.key, n.velocity, n.channel
        )?;
    }

    for lane in lanes {
        let cc = lane.cc_number();
        for p in lane.points() {
            writeln!(out, "C {} {} {}", cc, p.tick, p.value)?;
        }
    }

    Ok(())
}

/// Read the PPR1 format, replacing the contents of the given containers.
/// Malformed and unknown lines are skipped with a warning; CC points are
/// bucketed into lanes in encounter order of their CC numbers.
pub fn deserialize(
    notes: &mut NoteStore,
    lanes: &mut Vec<ControlLane>,
    input: impl BufRead,
) -> io::Result<()> {
    notes.clear();
    lanes.clear();

    let mut first_line = true;
    for line in input.lines() {
        let line = line?;
        let mut fields = line.split_whitespace();
        let Some(kind) = fields.next() else {
            continue;
        };

        if first_line {
            first_line = false;
            if kind.starts_with('P') {
                continue;
            }
        }

        match kind {
            "N" => {
                let parsed = (|| {
                    let tick: Tick = fields.next()?.parse().ok()?;
                    let duration: Tick = fields.next()?.parse().ok()?;
                    let key: i32 = fields.next()?.parse().ok()?;
                    let velocity: i32 = fields.next()?.parse().ok()?;
                    let channel: i32 = fields.next()?.parse().ok()?;
                    Some((tick, duration, key, velocity, channel))
                })();
                match parsed {
                    Some((tick, duration, key, velocity, channel)) => {
                        // The file is trusted for overlaps but not for ranges;
                        // out-of-range events are dropped by the store.
                        let id =
                            notes.create_note(tick, duration, key, velocity, channel, false, false, true);
                        if id == 0 {
                            log::warn!("skipping out-of-range note event: {}", line);
                        }
                    }
                    None => log::warn!("skipping malformed note line: {}", line),
                }
            }
            "C" => {
                let parsed = (|| {
                    let cc: i32 = fields.next()?.parse().ok()?;
                    let tick: Tick = fields.next()?.parse().ok()?;
                    let value: i32 = fields.next()?.parse().ok()?;
                    Some((cc, tick, value))
                })();
                match parsed {
                    Some((cc, tick, value)) => {
                        let lane = match lanes.iter_mut().find(|l| l.cc_number() == cc) {
                            Some(lane) => lane,
                            None => {
                                lanes.push(ControlLane::new(cc));
                                lanes.last_mut().unwrap()
                            }
                        };
                        lane.add_point(tick, value);
                    }
                    None => log::warn!("skipping malformed CC line: {}", line),
                }
            }
            _ => {}
        }
    }

    Ok(())
}
