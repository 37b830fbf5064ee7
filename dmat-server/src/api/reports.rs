//! Area summary and the downloadable assessment report

use std::fmt::Write as _;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDate};
use dmat_common::db::{Area, Dimension};
use serde::Serialize;

use crate::db::{areas, dimensions};
use crate::error::ApiResult;
use crate::AppState;

/// Progress of one area against its target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaSummary {
    pub area_id: i64,
    pub area_name: String,
    pub desired_level: Option<i64>,
    /// Mean current level, one decimal
    pub avg_current_level: f64,
    pub total_dimensions: usize,
    /// At most one level below target
    pub on_track_count: usize,
    /// At or above target
    pub completed_count: usize,
    pub needs_attention: usize,
}

pub fn summarize_area(area: &Area, dims: &[Dimension]) -> AreaSummary {
    let total = dims.len();
    let avg = if total == 0 {
        0.0
    } else {
        let sum: i64 = dims.iter().map(|d| d.current_level).sum();
        (sum as f64 / total as f64 * 10.0).round() / 10.0
    };
    let on_track = dims
        .iter()
        .filter(|d| d.current_level >= d.desired_level - 1)
        .count();
    let completed = dims
        .iter()
        .filter(|d| d.current_level >= d.desired_level)
        .count();

    AreaSummary {
        area_id: area.id,
        area_name: area.name.clone(),
        desired_level: area.desired_level,
        avg_current_level: avg,
        total_dimensions: total,
        on_track_count: on_track,
        completed_count: completed,
        needs_attention: total - on_track,
    }
}

async fn areas_with_dimensions(state: &AppState) -> ApiResult<Vec<(Area, Vec<Dimension>)>> {
    let areas = areas::list_areas(&state.db).await?;
    let all = dimensions::list_dimensions(&state.db).await?;

    Ok(areas
        .into_iter()
        .map(|area| {
            let dims = all.iter().filter(|d| d.area_id == area.id).cloned().collect();
            (area, dims)
        })
        .collect())
}

/// GET /api/mm/reports/summary
pub async fn reports_summary(State(state): State<AppState>) -> ApiResult<Json<Vec<AreaSummary>>> {
    let grouped = areas_with_dimensions(&state).await?;
    Ok(Json(
        grouped
            .iter()
            .map(|(area, dims)| summarize_area(area, dims))
            .collect(),
    ))
}

/// Status label for a dimension `gap` levels below target
pub fn gap_status(gap: i64) -> &'static str {
    if gap <= 0 {
        "On Track"
    } else if gap <= 2 {
        "Below Target"
    } else {
        "Critical Gap"
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const REPORT_STYLE: &str = r#"
    body { font-family: Arial, sans-serif; margin: 40px; }
    h1 { color: #004A96; border-bottom: 4px solid #0066CC; padding-bottom: 10px; }
    h2 { color: #0066CC; margin-top: 30px; }
    table { width: 100%; border-collapse: collapse; margin: 20px 0; }
    th { background: #004A96; color: white; padding: 12px; text-align: left; }
    td { padding: 10px; border: 1px solid #ddd; }
    .level-1 { background: #fee; } .level-2 { background: #fed; }
    .level-3 { background: #ffc; } .level-4 { background: #cef; }
    .level-5 { background: #cfc; }
    .summary { background: #f0f8ff; padding: 20px; border-left: 4px solid #0066CC; }
"#;

/// Render the HTML report
pub fn render_report(date: NaiveDate, grouped: &[(Area, Vec<Dimension>)]) -> String {
    let total_dimensions: usize = grouped.iter().map(|(_, dims)| dims.len()).sum();
    let mut html = String::new();

    // Writing into a String cannot fail
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>Digital Maturity Assessment Report</title>\n<style>{}</style>\n</head>\n<body>\n\
         <h1>Digital Maturity Assessment Report</h1>\n<div class=\"summary\">\n\
         <p><strong>Assessment Date:</strong> {}</p>\n\
         <p><strong>Total Areas:</strong> {}</p>\n\
         <p><strong>Total Dimensions:</strong> {}</p>\n</div>\n",
        REPORT_STYLE,
        date.format("%B %d, %Y"),
        grouped.len(),
        total_dimensions
    );

    for (area, dims) in grouped {
        let _ = write!(
            html,
            "<h2>{}</h2>\n<p><strong>Description:</strong> {}</p>\n\
             <p><strong>Target Level:</strong> Level {}</p>\n<table>\n<thead><tr>\
             <th>Dimension</th><th>Current Level</th><th>Target Level</th><th>Gap</th><th>Status</th>\
             </tr></thead>\n<tbody>\n",
            escape_html(&area.name),
            escape_html(area.description.as_deref().unwrap_or("")),
            area.desired_level.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string()),
        );

        for dim in dims {
            let gap = dim.desired_level - dim.current_level;
            let _ = writeln!(
                html,
                "<tr class=\"level-{}\"><td>{}</td><td>Level {}</td><td>Level {}</td><td>{}</td><td>{}</td></tr>",
                dim.current_level,
                escape_html(&dim.name),
                dim.current_level,
                dim.desired_level,
                gap.max(0),
                gap_status(gap)
            );
        }

        html.push_str("</tbody>\n</table>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// POST /api/mm/generate-report
///
/// Served as an attachment named `Assessment_Report_YYYYMMDD.html`.
pub async fn generate_report(State(state): State<AppState>) -> ApiResult<Response> {
    let grouped = areas_with_dimensions(&state).await?;
    let today = Local::now().date_naive();
    let html = render_report(today, &grouped);
    let disposition = format!(
        "attachment; filename=Assessment_Report_{}.html",
        today.format("%Y%m%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        html,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn area(name: &str) -> Area {
        Area {
            id: 1,
            name: name.to_string(),
            description: Some(format!("{} Digital Maturity Assessment", name)),
            desired_level: Some(4),
            created_at: stamp(),
            updated_at: stamp(),
        }
    }

    fn dim(id: i64, name: &str, current: i64, desired: i64) -> Dimension {
        Dimension {
            id,
            area_id: 1,
            name: name.to_string(),
            current_level: current,
            desired_level: desired,
            created_at: stamp(),
            updated_at: stamp(),
        }
    }

    #[test]
    fn test_summary_counts() {
        let dims = vec![
            dim(1, "Quality", 4, 4),
            dim(2, "Maintenance", 3, 4),
            dim(3, "Logistics", 1, 4),
        ];
        let summary = summarize_area(&area("Press Shop"), &dims);

        assert_eq!(summary.total_dimensions, 3);
        assert_eq!(summary.completed_count, 1);
        assert_eq!(summary.on_track_count, 2);
        assert_eq!(summary.needs_attention, 1);
        assert_eq!(summary.avg_current_level, 2.7);
    }

    #[test]
    fn test_summary_of_empty_area() {
        let summary = summarize_area(&area("Paint Shop"), &[]);
        assert_eq!(summary.total_dimensions, 0);
        assert_eq!(summary.avg_current_level, 0.0);
        assert_eq!(summary.needs_attention, 0);
    }

    #[test]
    fn test_gap_status() {
        assert_eq!(gap_status(-1), "On Track");
        assert_eq!(gap_status(0), "On Track");
        assert_eq!(gap_status(2), "Below Target");
        assert_eq!(gap_status(3), "Critical Gap");
    }

    #[test]
    fn test_report_escapes_names() {
        let grouped = vec![(area("Body & Paint"), vec![dim(1, "<Quality>", 2, 5)])];
        let html = render_report(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), &grouped);

        assert!(html.contains("Body &amp; Paint"));
        assert!(html.contains("&lt;Quality&gt;"));
        assert!(html.contains("Critical Gap"));
        assert!(html.contains("March 05, 2024"));
    }
}
