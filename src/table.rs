//! Minimal ASCII table rendering for summaries. Formatting only; the
//! structured values come from `aggregate::Summary`.

use crate::aggregate::Summary;

/// Render header + rows with every column padded to its widest cell.
pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(| header | header.len()).collect();
    for row in rows {
        for (column, cell) in row.iter().enumerate() {
            if column < widths.len() {
                widths[column] = widths[column].max(cell.len());
            }
        }
    }

    let rule = rule_line(&widths);
    let mut out = String::new();
    out.push_str(&rule);
    push_row(&mut out, &widths, headers.iter().copied());
    out.push_str(&rule);
    for row in rows {
        push_row(&mut out, &widths, row.iter().map(String::as_str));
    }
    out.push_str(&rule);
    out
}

/// Rows of {metric, min, Q1, median, Q3, max}, one per named summary, two
/// decimal places throughout.
pub fn distribution_table(summaries: &[(&str, Summary)]) -> String {
    let rows: Vec<Vec<String>> = summaries
        .iter()
        .filter_map(| (name, summary) | {
            let dist = summary.distribution?;
            Some(vec![
                (*name).to_string(),
                format!("{:.2}", dist.min),
                format!("{:.2}", dist.q1),
                format!("{:.2}", dist.median),
                format!("{:.2}", dist.q3),
                format!("{:.2}", dist.max),
            ])
        })
        .collect();
    render(&["metric", "min", "Q1", "median", "Q3", "max"], &rows)
}

fn rule_line(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    line.push('\n');
    line
}

fn push_row<'a>(out: &mut String, widths: &[usize], cells: impl Iterator<Item = &'a str>) {
    out.push('|');
    for (cell, width) in cells.zip(widths) {
        out.push_str(&format!(" {cell:<width$} |", width = width));
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use crate::aggregate::Aggregator;

    use super::*;

    #[test]
    fn columns_pad_to_widest_cell() {
        let table = render(
            &["metric", "min"],
            &[
                vec!["clock".to_string(), "1.00".to_string()],
                vec!["rss_max".to_string(), "12345.00".to_string()],
            ],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "+---------+----------+");
        assert_eq!(lines[1], "| metric  | min      |");
        assert_eq!(lines[3], "| clock   | 1.00     |");
        assert!(lines.iter().all(| line | line.len() == lines[0].len()));
    }

    #[test]
    fn distribution_table_has_one_row_per_metric() {
        let mut aggregator = Aggregator::with_distribution();
        for value in [1, 2, 3, 4] {
            aggregator.observe(value);
        }
        let summary = aggregator.summarize().unwrap();
        let table = distribution_table(&[("cpu_usage", summary)]);
        assert!(table.contains("cpu_usage"));
        assert!(table.contains("1.75"));
        assert!(table.contains("2.50"));
        assert!(table.contains("3.25"));
    }
}
