use web_sys::{Document, Element, HtmlElement};

use prizewheel_shared::HistoryEntry;

use crate::util::format_timestamp;

fn text_element(document: &Document, tag: &str, class: &str, text: &str) -> Option<Element> {
    let element = document.create_element(tag).ok()?;
    let _ = element.set_attribute("class", class);
    element.set_text_content(Some(text));
    Some(element)
}

pub fn completed_label(entry: &HistoryEntry) -> String {
    match entry.completed_at {
        Some(ms) => format_timestamp(ms),
        None => "Completed".to_string(),
    }
}

/// Replaces the list contents with one item per completed draw.
pub fn render_history(document: &Document, list_el: &HtmlElement, entries: &[HistoryEntry]) {
    list_el.set_inner_html("");
    if entries.is_empty() {
        if let Some(empty) = text_element(document, "li", "history-empty", "No completed draws yet")
        {
            let _ = list_el.append_child(&empty);
        }
        return;
    }
    for entry in entries {
        let Ok(item) = document.create_element("li") else {
            continue;
        };
        let _ = item.set_attribute("class", "history-item");
        let _ = item.set_attribute("data-session", &entry.session_id);
        let parts = [
            text_element(document, "span", "history-title", &entry.title),
            text_element(document, "strong", "history-winner", &entry.winner.name),
            text_element(
                document,
                "span",
                "history-meta",
                &format!("{} participants", entry.participant_count),
            ),
            text_element(document, "time", "history-time", &completed_label(entry)),
        ];
        for part in parts.into_iter().flatten() {
            let _ = item.append_child(&part);
        }
        let _ = list_el.append_child(&item);
    }
}
