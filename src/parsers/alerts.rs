use crate::document::{Document, Node};
use crate::models::{Alert, AlertsData};

const UNREAD_TABLE: &str = "MCPH1_SCPH_gvAlerts";
const READ_TABLE: &str = "MCPH1_SCPH_gvReadMessege";
const ALERT_ROW_CLASS: &str = "GrdAltRow";

pub fn parse_alerts(html: &str) -> AlertsData {
    let document = Document::parse(html);
    AlertsData {
        unread: parse_alert_table(&document, UNREAD_TABLE),
        read: parse_alert_table(&document, READ_TABLE),
    }
}

// Alert rows are templated: each field sits in a control whose id ends in
// the field name, so they are found by id substring rather than position.
fn parse_alert_table(document: &Document, id: &str) -> Vec<Alert> {
    let Some(table) = document.by_id(id) else {
        return Vec::new();
    };
    table
        .select("tr")
        .into_iter()
        .filter(|row| row.has_class(ALERT_ROW_CLASS))
        .filter_map(|row| parse_alert_row(&row))
        .collect()
}

fn parse_alert_row(row: &Node<'_>) -> Option<Alert> {
    let labelled = |needle: &str| {
        row.find_by_attr_contains("id", needle)
            .map(|node| node.text())
            .unwrap_or_default()
    };

    let id = row
        .first("input[type=\"hidden\"][name*=\"hdnIdcode\"]")
        .and_then(|input| input.attr("value"))
        .unwrap_or_default()
        .to_string();
    let date = row
        .find_by_attr_contains("id", "lblUpdate")
        .or_else(|| row.find_by_attr_contains("id", "lblReadMessege"))
        .map(|node| node.text())
        .unwrap_or_default();

    let alert = Alert {
        id,
        title: labelled("lblTitle"),
        heading: labelled("lblHeading"),
        description: labelled("lblDescription"),
        read_status: labelled("lblReadStatus"),
        date,
    };

    let complete = [&alert.id, &alert.title, &alert.heading, &alert.description]
        .iter()
        .all(|field| !field.is_empty());
    complete.then_some(alert)
}
