use chrono::Local;
use colored::Colorize;

use crate::application::dtos::{AccountStatusDto, Countdown, StatusRowDto};

const HEADERS: [&str; 4] = ["Job ID", "Next Run At", "Countdown", "Log"];

/// Render one titled table per account.
pub fn render(view: &[AccountStatusDto]) -> String {
    view.iter()
        .map(render_account)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_account(status: &AccountStatusDto) -> String {
    let cells: Vec<[String; 4]> = status.rows.iter().map(cells).collect();

    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&format!("{}\n", format!("{}'s Scheduled Jobs", status.username).bold()));
    out.push_str(&separator(&widths));
    out.push_str(&line(&HEADERS.map(|h| h.bold().to_string()), &HEADERS.map(str::len), &widths));
    out.push_str(&separator(&widths));

    for (row, dto) in cells.iter().zip(&status.rows) {
        let mut styled = row.clone();
        if dto.countdown == Countdown::Unknown {
            styled[2] = styled[2].dimmed().to_string();
        }
        let visible = row.clone().map(|cell| cell.chars().count());
        out.push_str(&line(&styled, &visible, &widths));
    }

    out.push_str(&separator(&widths));
    out
}

fn cells(row: &StatusRowDto) -> [String; 4] {
    [
        row.job_id.clone(),
        row.next_run_at
            .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string()),
        row.countdown.to_string(),
        row.log.clone(),
    ]
}

// Padding is computed from the visible length so colour codes do not skew columns.
fn line(cells: &[String; 4], visible: &[usize; 4], widths: &[usize; 4]) -> String {
    let mut out = String::from("|");
    for ((cell, len), width) in cells.iter().zip(visible).zip(widths) {
        out.push(' ');
        out.push_str(cell);
        out.push_str(&" ".repeat(width - len));
        out.push_str(" |");
    }
    out.push('\n');
    out
}

fn separator(widths: &[usize; 4]) -> String {
    let mut out = String::from("+");
    for width in widths {
        out.push_str(&"-".repeat(width + 2));
        out.push('+');
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn view() -> Vec<AccountStatusDto> {
        vec![AccountStatusDto {
            username: "alice".to_string(),
            rows: vec![
                StatusRowDto {
                    job_id: "alice_adventures".to_string(),
                    next_run_at: Some(Utc::now()),
                    countdown: Countdown::Seconds(42),
                    log: "Adventure started".to_string(),
                },
                StatusRowDto {
                    job_id: "alice_spend_all".to_string(),
                    next_run_at: None,
                    countdown: Countdown::Unknown,
                    log: String::new(),
                },
            ],
        }]
    }

    #[test]
    fn test_table_lists_every_job() {
        colored::control::set_override(false);
        let table = render(&view());

        assert!(table.contains("alice's Scheduled Jobs"));
        assert!(table.contains("| Job ID"));
        assert!(table.contains("alice_adventures"));
        assert!(table.contains("Adventure started"));
        assert!(table.contains("unknown"));
    }

    #[test]
    fn test_columns_are_aligned() {
        colored::control::set_override(false);
        let table = render(&view());

        let widths: Vec<usize> = table
            .lines()
            .skip(1)
            .map(|line| line.chars().count())
            .collect();
        assert!(widths.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
