//! Debug page renderer.
//!
//! `render` is a total function: success or failure, it returns a
//! well-formed HTML document. The snapshot is serialized to a JSON
//! object keyed by view name, embedded in an attribute of a fixed
//! template, and expanded client-side into a two-column table. A fetch
//! failure embeds a fixed placeholder of the same JSON shape, so the
//! page never breaks regardless of the underlying error.

use statz_client::ClientError;
use statz_core::Snapshot;

/// Display name of the placeholder entry shown when the fetch fails.
pub const ACCESS_ERROR_NAME: &str = "Snapshot Access Error";

/// Fixed diagnostic shown as the placeholder's payload. The real error
/// goes to the logs, not the page.
pub const ACCESS_ERROR_DIAGNOSTIC: &str = "snapshot source unreachable; is the server running?";

const HTML_HEADER: &str = "<!DOCTYPE html><html><head><style>\
table { border-collapse: collapse; width: 100%; }\
table, td, th { border: 1px solid black; }\
td { vertical-align: top; }\
</style></head><body>\
<div id='stats' stats='";

const HTML_FOOTER: &str = "' class='hidden'></div>\
<h1>statz</h1><div id='table'></div>\
<script>\
var views = JSON.parse(document.getElementById('stats').getAttribute('stats'));\
var table = document.createElement('table');\
for (var name in views) {\
  var row = table.insertRow(-1);\
  row.insertCell(0).innerText = name;\
  var pre = document.createElement('pre');\
  pre.innerText = JSON.stringify(views[name]['aggregation'], null, ' ');\
  row.insertCell(1).appendChild(pre);\
}\
document.getElementById('table').appendChild(table);\
</script></body></html>";

/// Render the debug page for a fetch result. Never fails.
pub fn render(fetch: Result<Snapshot, ClientError>) -> String {
    let stats_json = match fetch {
        Ok(snapshot) => snapshot_json(&snapshot),
        Err(_) => placeholder_json(),
    };
    format!("{HTML_HEADER}{}{HTML_FOOTER}", escape_attribute(&stats_json))
}

/// Canonical JSON form: one object keyed by view name, every view
/// included verbatim, Unknown payloads and all.
fn snapshot_json(snapshot: &Snapshot) -> String {
    let mut stats = serde_json::Map::new();
    for view in &snapshot.views {
        stats.insert(
            view.name.clone(),
            serde_json::json!({
                "description": &view.description,
                "aggregation": &view.aggregation,
            }),
        );
    }
    serde_json::Value::Object(stats).to_string()
}

/// The fixed placeholder, shaped exactly like a one-view snapshot so
/// the template script renders it unchanged.
fn placeholder_json() -> String {
    serde_json::json!({
        (ACCESS_ERROR_NAME): {
            "description": ACCESS_ERROR_NAME,
            "aggregation": ACCESS_ERROR_DIAGNOSTIC,
        }
    })
    .to_string()
}

/// Escape for embedding inside a single-quoted HTML attribute.
fn escape_attribute(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use statz_core::{Aggregation, View};

    fn snapshot() -> Snapshot {
        Snapshot {
            views: vec![
                View {
                    name: "rpc.latency".to_string(),
                    description: "rpc latency distribution".to_string(),
                    aggregation: Aggregation::Distribution {
                        bucket_bounds: vec![0.0, 10.0, 100.0],
                        bucket_counts: vec![1, 2, 3],
                        sum: 150.0,
                        count: 6,
                    },
                },
                View {
                    name: "rpc.count".to_string(),
                    description: "completed rpcs".to_string(),
                    aggregation: Aggregation::Interval { value: 42.0 },
                },
            ],
        }
    }

    #[test]
    fn success_embeds_every_view() {
        let html = render(Ok(snapshot()));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</html>"));
        assert!(html.contains("rpc.latency"));
        assert!(html.contains("rpc.count"));
    }

    #[test]
    fn unknown_views_are_shown_verbatim() {
        let raw = serde_json::json!({"ddsketch": [1, 2, 3]});
        let snap = Snapshot {
            views: vec![View {
                name: "rpc.sketch".to_string(),
                description: "future shape".to_string(),
                aggregation: Aggregation::Unknown(raw),
            }],
        };
        let html = render(Ok(snap));
        assert!(html.contains("rpc.sketch"));
        assert!(html.contains("ddsketch"));
    }

    #[test]
    fn failure_renders_fixed_placeholder() {
        let html = render(Err(ClientError::Connect {
            addr: "127.0.0.1:8080".to_string(),
            reason: "connection refused".to_string(),
        }));
        assert!(html.contains(ACCESS_ERROR_NAME));
        assert!(html.contains(ACCESS_ERROR_DIAGNOSTIC));
    }

    #[test]
    fn placeholder_is_independent_of_the_error() {
        let a = render(Err(ClientError::Connect {
            addr: "a:1".to_string(),
            reason: "refused".to_string(),
        }));
        let b = render(Err(ClientError::Deadline {
            uri: "http://b:2/snapshot".to_string(),
            millis: 500,
        }));
        assert_eq!(a, b);
        // The underlying error text never leaks into the page.
        assert!(!a.contains("refused"));
    }

    #[test]
    fn placeholder_has_the_snapshot_json_shape() {
        let value: serde_json::Value = serde_json::from_str(&super::placeholder_json()).unwrap();
        let entry = &value[ACCESS_ERROR_NAME];
        assert!(entry["description"].is_string());
        assert!(!entry["aggregation"].is_null());
    }

    #[test]
    fn attribute_escaping_keeps_the_document_well_formed() {
        let snap = Snapshot {
            views: vec![View {
                name: "tricky".to_string(),
                description: "it's a <b>bold</b> & dangerous description".to_string(),
                aggregation: Aggregation::Interval { value: 1.0 },
            }],
        };
        let html = render(Ok(snap));
        assert!(!html.contains("it's"), "raw quote would end the attribute");
        assert!(html.contains("&#39;"));
        assert!(html.contains("&amp;"));
        assert!(!html.contains("<b>bold</b>"));
    }

    #[test]
    fn render_is_total_for_empty_snapshots() {
        let html = render(Ok(Snapshot { views: vec![] }));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("stats='{}'"));
    }
}
