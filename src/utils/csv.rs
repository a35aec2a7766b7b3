//! CSV rendering for the admin export. The header and filename are the
//! Czech strings the web UI expects verbatim.

use chrono::NaiveDate;
use crate::models::activity::ActivityWithUser;

pub const EXPORT_HEADER: &str = "Uživatel,Aktivita,Popis,Začátek,Konec,Doba trvání (s)";

/// Renders the export: header line plus one quoted row per activity.
pub fn render_export(activities: &[ActivityWithUser]) -> String {
    let mut out = String::from(EXPORT_HEADER);
    out.push('\n');

    let rows: Vec<String> = activities
        .iter()
        .map(|activity| {
            let fields = [
                activity.user_name.clone(),
                activity.name.clone(),
                activity.description.clone().unwrap_or_default(),
                activity.start_time.to_rfc3339(),
                activity
                    .end_time
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
                activity.duration.unwrap_or(0).to_string(),
            ];
            fields.iter().map(|f| quote(f)).collect::<Vec<_>>().join(",")
        })
        .collect();

    out.push_str(&rows.join("\n"));
    out
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("aktivity_{}.csv", date.format("%Y-%m-%d"))
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
