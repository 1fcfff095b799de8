//! Terminal rendering of states and step events.

use colored::Colorize;

use bankviz_kernel::SystemState;
use bankviz_types::{ProcessId, ResourceVector, StepEvent};

/// `P1 -> P3 -> P4`.
pub fn format_sequence(sequence: &[ProcessId]) -> String {
    sequence
        .iter()
        .map(ProcessId::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Plain-text table with one row per process, right-aligned columns.
pub fn format_matrix(title: &str, rows: &[ResourceVector]) -> String {
    let width = rows
        .iter()
        .flat_map(|row| row.as_slice().iter())
        .map(|units| units.to_string().len())
        .max()
        .unwrap_or(1)
        .max(2);
    let label_width = format!("P{}", rows.len().saturating_sub(1)).len();
    let columns = rows.first().map_or(0, ResourceVector::len);

    let mut out = String::new();
    out.push_str(&format!("{title}\n"));
    out.push_str(&format!("{:label_width$} ", ""));
    for j in 0..columns {
        out.push_str(&format!(" {:>width$}", format!("R{j}")));
    }
    out.push('\n');
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!("{:<label_width$} ", format!("P{i}")));
        for units in row.as_slice() {
            out.push_str(&format!(" {units:>width$}"));
        }
        out.push('\n');
    }
    out
}

/// Display state of a process in the status strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Pending,
    Evaluating,
    Finished,
}

/// One cell of the status strip: `( P0 )` pending, `[>P1<]` evaluating,
/// `[ P2 ]` finished.
fn status_cell(index: usize, status: ProcessStatus) -> String {
    match status {
        ProcessStatus::Pending => format!("( P{index} )"),
        ProcessStatus::Evaluating => format!("[>P{index}<]"),
        ProcessStatus::Finished => format!("[ P{index} ]"),
    }
}

/// Human-readable lines for one event.
pub fn describe(event: &StepEvent) -> Vec<String> {
    match event {
        StepEvent::Evaluating { process, work } => {
            vec![format!("Process {process} can execute. Work={work}")]
        }
        StepEvent::Selected { process, work, .. } => {
            vec![format!("Process {process} finished and released its resources. Work={work}")]
        }
        StepEvent::SafeComplete { sequence } => vec![
            "System is in SAFE STATE.".to_string(),
            format!("Safe Sequence: {}", format_sequence(sequence)),
        ],
        StepEvent::Deadlocked { sequence } if sequence.is_empty() => vec![
            "Deadlock detected. System is NOT safe.".to_string(),
            "No process could finish.".to_string(),
        ],
        StepEvent::Deadlocked { sequence } => vec![
            "Deadlock detected. System is NOT safe.".to_string(),
            format!("Finished before deadlock: {}", format_sequence(sequence)),
        ],
    }
}

/// One line per process of a replayed order.  `trace[k]` is the work after
/// `order[k]` released its allocation.
pub fn describe_replay(order: &[ProcessId], trace: &[ResourceVector]) -> Vec<String> {
    order
        .iter()
        .zip(trace)
        .map(|(process, work)| format!("{process} finished. Work={work}"))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Renderer
// ─────────────────────────────────────────────────────────────────────────────

/// Stateful event printer used during animated runs.
pub struct Renderer {
    statuses: Vec<ProcessStatus>,
}

impl Renderer {
    pub fn new(process_count: usize) -> Self {
        Self {
            statuses: vec![ProcessStatus::Pending; process_count],
        }
    }

    /// Update the status strip and print the event.
    pub fn on_event(&mut self, event: &StepEvent) {
        self.apply(event);
        let lines = describe(event);
        match event {
            StepEvent::Evaluating { .. } => {
                self.print_strip();
                for line in lines {
                    println!("  {}", line.yellow());
                }
            }
            StepEvent::Selected { .. } => {
                for line in lines {
                    println!("  {}", line.dimmed());
                }
                self.print_strip();
                println!();
            }
            StepEvent::SafeComplete { .. } => {
                for line in lines {
                    println!("  {}", line.green().bold());
                }
            }
            StepEvent::Deadlocked { .. } => {
                for line in lines {
                    println!("  {}", line.red().bold());
                }
            }
        }
    }

    fn apply(&mut self, event: &StepEvent) {
        match event {
            StepEvent::Evaluating { process, .. } => {
                self.set(*process, ProcessStatus::Evaluating);
            }
            StepEvent::Selected { process, .. } => {
                self.set(*process, ProcessStatus::Finished);
            }
            StepEvent::SafeComplete { .. } | StepEvent::Deadlocked { .. } => {}
        }
    }

    fn set(&mut self, process: ProcessId, status: ProcessStatus) {
        if let Some(slot) = self.statuses.get_mut(process.index()) {
            *slot = status;
        }
    }

    fn print_strip(&self) {
        let cells: Vec<String> = self
            .statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let cell = status_cell(i, *status);
                match status {
                    ProcessStatus::Pending => cell.normal().to_string(),
                    ProcessStatus::Evaluating => cell.yellow().bold().to_string(),
                    ProcessStatus::Finished => cell.green().to_string(),
                }
            })
            .collect();
        println!("  {}", cells.join(" "));
    }
}

/// Print allocation, maximum, optionally need, and available.
pub fn print_state(state: &SystemState, show_need: bool) {
    let allocation: Vec<ResourceVector> = state.processes().map(|p| p.allocation.clone()).collect();
    let maximum: Vec<ResourceVector> = state.processes().map(|p| p.maximum.clone()).collect();

    println!();
    println!(
        "  {} processes, {} resource types",
        state.process_count().to_string().bold(),
        state.resource_count().to_string().bold()
    );
    print_block(&format_matrix("Allocation", &allocation));
    print_block(&format_matrix("Maximum", &maximum));
    if show_need {
        print_block(&format_matrix("Need", state.need_matrix()));
    }
    println!("  {} {}", "Available".bold(), state.available());
    println!();
}

fn print_block(block: &str) {
    let mut lines = block.lines();
    if let Some(title) = lines.next() {
        println!("  {}", title.bold().underline());
    }
    for line in lines {
        println!("  {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rv(units: &[u32]) -> ResourceVector {
        ResourceVector::new(units.to_vec())
    }

    #[test]
    fn sequence_uses_arrows() {
        let seq = [ProcessId(1), ProcessId(3), ProcessId(0)];
        assert_eq!(format_sequence(&seq), "P1 -> P3 -> P0");
        assert_eq!(format_sequence(&[]), "");
    }

    #[test]
    fn matrix_has_header_and_one_row_per_process() {
        let table = format_matrix("Need", &[rv(&[7, 4, 3]), rv(&[1, 2, 2])]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Need");
        assert_eq!(lines[1], "    R0 R1 R2");
        assert_eq!(lines[2], "P0   7  4  3");
        assert_eq!(lines[3], "P1   1  2  2");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn matrix_widens_for_large_values() {
        let table = format_matrix("Max", &[rv(&[100, 2])]);
        assert!(table.contains("P0  100   2"));
    }

    #[test]
    fn evaluating_line_matches_classic_output() {
        let event = StepEvent::Evaluating {
            process: ProcessId(1),
            work: rv(&[3, 3, 2]),
        };
        assert_eq!(describe(&event), vec!["Process P1 can execute. Work=[3, 3, 2]"]);
    }

    #[test]
    fn verdict_lines() {
        let safe = StepEvent::SafeComplete {
            sequence: vec![ProcessId(1), ProcessId(3)],
        };
        assert_eq!(
            describe(&safe),
            vec!["System is in SAFE STATE.", "Safe Sequence: P1 -> P3"]
        );

        let partial = StepEvent::Deadlocked {
            sequence: vec![ProcessId(0)],
        };
        let lines = describe(&partial);
        assert_eq!(lines[0], "Deadlock detected. System is NOT safe.");
        assert!(lines[1].ends_with("P0"));

        let none = StepEvent::Deadlocked { sequence: vec![] };
        assert_eq!(describe(&none)[1], "No process could finish.");
    }

    #[test]
    fn replay_lines_pair_each_process_with_its_own_release() {
        let state = SystemState::new(
            vec![
                vec![0, 1, 0],
                vec![2, 0, 0],
                vec![3, 0, 2],
                vec![2, 1, 1],
                vec![0, 0, 2],
            ],
            vec![
                vec![7, 5, 3],
                vec![3, 2, 2],
                vec![9, 0, 2],
                vec![2, 2, 2],
                vec![4, 3, 3],
            ],
            vec![3, 3, 2],
        )
        .unwrap();
        let order = [1, 3, 4, 0, 2].map(ProcessId);
        let trace = bankviz_kernel::SequenceVerifier::new(&state)
            .verify(&order)
            .unwrap();

        let lines = describe_replay(&order, &trace);
        assert_eq!(
            lines,
            vec![
                "P1 finished. Work=[5, 3, 2]",
                "P3 finished. Work=[7, 4, 3]",
                "P4 finished. Work=[7, 4, 5]",
                "P0 finished. Work=[7, 5, 5]",
                "P2 finished. Work=[10, 5, 7]",
            ]
        );
    }

    #[test]
    fn renderer_tracks_process_status() {
        let mut renderer = Renderer::new(3);
        renderer.apply(&StepEvent::Evaluating {
            process: ProcessId(2),
            work: rv(&[1]),
        });
        assert_eq!(
            renderer.statuses,
            vec![ProcessStatus::Pending, ProcessStatus::Pending, ProcessStatus::Evaluating]
        );
        renderer.apply(&StepEvent::Selected {
            process: ProcessId(2),
            work: rv(&[2]),
            sequence: vec![ProcessId(2)],
        });
        assert_eq!(renderer.statuses[2], ProcessStatus::Finished);
        let strip: Vec<String> = renderer
            .statuses
            .iter()
            .enumerate()
            .map(|(i, s)| status_cell(i, *s))
            .collect();
        assert_eq!(strip.join(" "), "( P0 ) ( P1 ) [ P2 ]");
    }

    #[test]
    fn renderer_ignores_out_of_range_process() {
        let mut renderer = Renderer::new(1);
        renderer.apply(&StepEvent::Evaluating {
            process: ProcessId(5),
            work: rv(&[0]),
        });
        assert_eq!(renderer.statuses, vec![ProcessStatus::Pending]);
    }
}
