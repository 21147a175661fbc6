//! Lane-range assignment between incoming and outgoing links at a node. The
//! ranges are 0-based positions; negative values mean the distribution
//! couldn't give that movement a real lane and the movement gets skipped
//! downstream.

use geom::angle_between_lines;

use crate::macroscopic::MacroLink;

const DEFAULT_LEFT_MOST_LANES: i32 = 1;
const DEFAULT_RIGHT_MOST_LANES: i32 = 1;

/// One movement's lane spans: (start, end) positions on the income side and
/// on the outcome side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectionSpan {
    pub income: (i32, i32),
    pub outcome: (i32, i32),
}

/// Sorts `links` left-to-right as seen from `reference` (descending signed
/// angle) and returns the permutation.
fn sort_left_to_right(reference: &MacroLink, links: &[&MacroLink], incoming: bool) -> Vec<usize> {
    let angles: Vec<f64> = links
        .iter()
        .map(|link| {
            if incoming {
                angle_between_lines(&link.geom_euclidean, &reference.geom_euclidean)
            } else {
                angle_between_lines(&reference.geom_euclidean, &link.geom_euclidean)
            }
        })
        .collect();
    let mut order: Vec<usize> = (0..links.len()).collect();
    order.sort_by(|a, b| angles[*b].partial_cmp(&angles[*a]).unwrap());
    order
}

/// The merge case: several incoming links feed the single outgoing one. The
/// leftmost incoming keeps the outgoing link's leftmost lanes; everybody
/// else is pushed to the right.
pub fn merge_connections(outgoing: &MacroLink, incoming: &[&MacroLink]) -> Vec<ConnectionSpan> {
    let order = sort_left_to_right(outgoing, incoming, true);
    let out_lanes = outgoing.lanes_in() as i32;

    let mut spans = vec![
        ConnectionSpan {
            income: (0, 0),
            outcome: (0, 0),
        };
        incoming.len()
    ];
    for (rank, original_idx) in order.iter().enumerate() {
        let in_lanes = incoming[*original_idx].lanes_out() as i32;
        let min_connections = out_lanes.min(in_lanes);
        spans[*original_idx] = if rank == 0 {
            ConnectionSpan {
                income: (in_lanes - min_connections, in_lanes - 1),
                outcome: (0, min_connections - 1),
            }
        } else {
            ConnectionSpan {
                income: (0, min_connections - 1),
                outcome: (out_lanes - min_connections, out_lanes - 1),
            }
        };
    }
    spans
}

/// The diverge/intersection case: one incoming link fans out to several
/// outgoing ones.
pub fn diverge_connections(incoming: &MacroLink, outgoing: &[&MacroLink]) -> Vec<ConnectionSpan> {
    let order = sort_left_to_right(incoming, outgoing, false);
    let out_lanes = incoming.lanes_out() as i32;
    let mut spans = vec![
        ConnectionSpan {
            income: (0, 0),
            outcome: (0, 0),
        };
        outgoing.len()
    ];

    if out_lanes == 1 {
        // A single lane serves everything; the leftmost target gets it
        // head-on, the rest cross over from their own leftmost lane.
        for (rank, original_idx) in order.iter().enumerate() {
            let link_in = outgoing[*original_idx].lanes_in() as i32;
            spans[*original_idx] = if rank == 0 {
                ConnectionSpan {
                    income: (0, 0),
                    outcome: (0, 0),
                }
            } else {
                ConnectionSpan {
                    income: (0, 0),
                    outcome: (link_in - 1, link_in - 1),
                }
            };
        }
        return spans;
    }

    match order.len() {
        1 => {
            let idx = order[0];
            let min_connections = out_lanes.min(outgoing[idx].lanes_in() as i32);
            spans[idx] = ConnectionSpan {
                income: (0, min_connections - 1),
                outcome: (0, min_connections - 1),
            };
        }
        2 => {
            // One default lane peels off to the right; the rest goes left
            let left = order[0];
            let min_connections =
                (out_lanes - DEFAULT_LEFT_MOST_LANES).min(outgoing[left].lanes_in() as i32);
            spans[left] = ConnectionSpan {
                income: (0, min_connections - 1),
                outcome: (0, min_connections - 1),
            };
            let right = order[1];
            let right_in = outgoing[right].lanes_in() as i32;
            spans[right] = ConnectionSpan {
                income: (out_lanes - DEFAULT_RIGHT_MOST_LANES, out_lanes - 1),
                outcome: (right_in - DEFAULT_RIGHT_MOST_LANES, right_in - 1),
            };
        }
        _ => {
            let left = order[0];
            spans[left] = ConnectionSpan {
                income: (0, DEFAULT_LEFT_MOST_LANES - 1),
                outcome: (0, DEFAULT_LEFT_MOST_LANES - 1),
            };

            let middle: Vec<usize> = order[1..order.len() - 1].to_vec();
            let middle_lanes = out_lanes - DEFAULT_LEFT_MOST_LANES - DEFAULT_RIGHT_MOST_LANES;
            if middle_lanes >= middle.len() as i32 {
                // Round-robin the middle lanes across the middle links
                let mut capacity: Vec<i32> =
                    middle.iter().map(|i| outgoing[*i].lanes_in() as i32).collect();
                let mut assigned = vec![0i32; middle.len()];
                let mut lanes_left = middle_lanes;
                while lanes_left > 0 && capacity.iter().sum::<i32>() > 0 {
                    for idx in 0..middle.len() {
                        if capacity[idx] == 0 || lanes_left == 0 {
                            continue;
                        }
                        capacity[idx] -= 1;
                        assigned[idx] += 1;
                        lanes_left -= 1;
                    }
                }
                let mut start_lane = DEFAULT_LEFT_MOST_LANES;
                for (idx, original_idx) in middle.iter().enumerate() {
                    let link_in = outgoing[*original_idx].lanes_in() as i32;
                    spans[*original_idx] = ConnectionSpan {
                        income: (start_lane, start_lane + assigned[idx] - 1),
                        outcome: (link_in - assigned[idx], link_in - 1),
                    };
                    start_lane += assigned[idx];
                }
            } else if out_lanes < middle.len() as i32 {
                // More middle links than lanes: consecutive own lanes, then
                // spill-over links reuse lane 0
                for (idx, original_idx) in middle.iter().enumerate() {
                    let lane = if (idx as i32) < out_lanes { idx as i32 } else { 0 };
                    let link_in = outgoing[*original_idx].lanes_in() as i32;
                    spans[*original_idx] = ConnectionSpan {
                        income: (lane, lane),
                        outcome: (link_in - 1, link_in - 1),
                    };
                }
            } else {
                // Tight fit: one lane per middle link, starting against the
                // left default lane only when the count lines up exactly
                let mut start_lane = if out_lanes - DEFAULT_LEFT_MOST_LANES == middle.len() as i32 {
                    DEFAULT_LEFT_MOST_LANES
                } else {
                    0
                };
                for original_idx in &middle {
                    let link_in = outgoing[*original_idx].lanes_in() as i32;
                    spans[*original_idx] = ConnectionSpan {
                        income: (start_lane, start_lane),
                        outcome: (link_in - 1, link_in - 1),
                    };
                    start_lane += 1;
                }
            }

            let right = order[order.len() - 1];
            let right_in = outgoing[right].lanes_in() as i32;
            spans[right] = ConnectionSpan {
                income: (out_lanes - DEFAULT_RIGHT_MOST_LANES, out_lanes - 1),
                outcome: (right_in - DEFAULT_RIGHT_MOST_LANES, right_in - 1),
            };
        }
    }
    spans
}
