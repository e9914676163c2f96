// Structure detection for schedule pages.
//
// Finds the container holding the schedule and the selector for its
// repeating rows. Patterns are tried from most to least specific; a row
// pattern only counts when it repeats more than `min_rows` times.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordered container and row patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructurePatterns {
    pub containers: Vec<String>,
    pub rows: Vec<String>,
    /// A row pattern must match strictly more elements than this.
    pub min_rows: usize,
}

impl Default for StructurePatterns {
    fn default() -> Self {
        let containers = [
            ".sidearm-schedule-games-container",
            ".sidearm-schedule-games",
            ".sidearm-schedule",
            "[class*='schedule-list']",
            "[id*='schedule']",
            "[class*='schedule']",
            "[class*='events']",
            "main",
            "table",
        ];
        let rows = [
            ".sidearm-schedule-game",
            ".s-game-card",
            ".schedule-game",
            ".event-row",
            "tr[data-url]",
            ".event",
            "tbody tr",
            "li",
        ];
        Self {
            containers: containers.into_iter().map(String::from).collect(),
            rows: rows.into_iter().map(String::from).collect(),
            min_rows: 3,
        }
    }
}

/// A detected schedule: the container element and the rows inside it.
#[derive(Debug, Clone)]
pub struct ScheduleStructure<'a> {
    pub container: ElementRef<'a>,
    pub container_selector: String,
    pub row_selector: String,
    pub rows: Vec<ElementRef<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no schedule structure found ({containers_present} of {containers_tried} container patterns present, best row count {best_row_count})")]
pub struct StructureNotFound {
    pub containers_tried: usize,
    pub containers_present: usize,
    pub best_row_count: usize,
}

/// Find the first container/row pattern pair that clears the row threshold.
pub fn detect<'a>(
    document: &'a Html,
    patterns: &StructurePatterns,
) -> Result<ScheduleStructure<'a>, StructureNotFound> {
    let row_selectors: Vec<(&str, Selector)> = patterns
        .rows
        .iter()
        .filter_map(|p| compile(p).map(|s| (p.as_str(), s)))
        .collect();

    let mut containers_present = 0;
    let mut best_row_count = 0;

    for container_pattern in &patterns.containers {
        let Some(container_sel) = compile(container_pattern) else {
            continue;
        };
        let Some(container) = document.select(&container_sel).next() else {
            continue;
        };
        containers_present += 1;

        for (row_pattern, row_sel) in &row_selectors {
            let rows: Vec<ElementRef<'a>> = container.select(row_sel).collect();
            best_row_count = best_row_count.max(rows.len());

            if rows.len() > patterns.min_rows {
                tracing::debug!(
                    container = %container_pattern,
                    rows_selector = %row_pattern,
                    rows = rows.len(),
                    "Detected schedule structure"
                );
                return Ok(ScheduleStructure {
                    container,
                    container_selector: container_pattern.clone(),
                    row_selector: row_pattern.to_string(),
                    rows,
                });
            }
        }
    }

    Err(StructureNotFound {
        containers_tried: patterns.containers.len(),
        containers_present,
        best_row_count,
    })
}

fn compile(pattern: &str) -> Option<Selector> {
    match Selector::parse(pattern) {
        Ok(sel) => Some(sel),
        Err(e) => {
            tracing::warn!(pattern = %pattern, error = ?e, "Skipping invalid selector pattern");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sidearm_page(games: usize) -> String {
        let items: String = (0..games)
            .map(|i| {
                format!(
                    r#"<li class="sidearm-schedule-game sidearm-schedule-home-game">
                         <div class="sidearm-schedule-game-opponent-date"><span>Sep {}</span></div>
                       </li>"#,
                    i + 1
                )
            })
            .collect();
        format!(
            r#"<html><body>
               <nav><ul><li>Home</li><li>Roster</li></ul></nav>
               <ul class="sidearm-schedule-games-container">{items}</ul>
               </body></html>"#
        )
    }

    #[test]
    fn test_detects_sidearm_list() {
        let doc = Html::parse_document(&sidearm_page(5));
        let found = detect(&doc, &StructurePatterns::default()).unwrap();
        assert_eq!(found.container_selector, ".sidearm-schedule-games-container");
        assert_eq!(found.row_selector, ".sidearm-schedule-game");
        assert_eq!(found.rows.len(), 5);
    }

    #[test]
    fn test_three_rows_is_not_enough() {
        let doc = Html::parse_document(&sidearm_page(3));
        let err = detect(&doc, &StructurePatterns::default()).unwrap_err();
        assert!(err.containers_present >= 1);
        assert_eq!(err.best_row_count, 3);
    }

    #[test]
    fn test_falls_through_to_generic_table() {
        let rows: String = (0..6)
            .map(|i| format!("<tr data-url=\"/game/{i}\"><td>Oct {i}</td><td>Brown</td></tr>"))
            .collect();
        let html = format!(r#"<html><body><div id="main-schedule"><table><tbody>{rows}</tbody></table></div></body></html>"#);
        let doc = Html::parse_document(&html);
        let found = detect(&doc, &StructurePatterns::default()).unwrap();
        assert_eq!(found.container_selector, "[id*='schedule']");
        assert_eq!(found.row_selector, "tr[data-url]");
        assert_eq!(found.rows.len(), 6);
    }

    #[test]
    fn test_custom_patterns_and_invalid_selectors() {
        let doc = Html::parse_document(&sidearm_page(4));
        let patterns = StructurePatterns {
            containers: vec!["[[bad".to_string(), "ul.sidearm-schedule-games-container".to_string()],
            rows: vec!["li".to_string()],
            min_rows: 3,
        };
        let found = detect(&doc, &patterns).unwrap();
        assert_eq!(found.row_selector, "li");
        assert_eq!(found.rows.len(), 4);
    }

    #[test]
    fn test_page_without_schedule() {
        let doc = Html::parse_document("<html><body><p>Nothing to see</p></body></html>");
        let err = detect(&doc, &StructurePatterns::default()).unwrap_err();
        assert_eq!(err.best_row_count, 0);
        assert_eq!(err.containers_tried, StructurePatterns::default().containers.len());
    }
}
