use identity_graph_viz::contact::read_snapshot_file;
use identity_graph_viz::dashboard::Dashboard;
use identity_graph_viz::graph::{Position, derive};
use identity_graph_viz::render::render_html_dashboard;
use pretty_assertions::assert_eq;

fn fixture() -> String {
    format!("{}/tests/fixtures/contacts.json", env!("CARGO_MANIFEST_DIR"))
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn consolidates_backend_snapshot() {
    let contacts = read_snapshot_file(&fixture()).unwrap();
    assert_eq!(contacts.len(), 7);

    let graph = derive(&contacts);

    let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "23", "11", "27", "28", "40"]);

    let lorraine = &graph.nodes[0];
    assert_eq!(
        lorraine.emails,
        strings(&["lorraine@hillvalley.edu", "mcfly@hillvalley.edu"])
    );
    assert_eq!(lorraine.phone_numbers, strings(&["123456"]));
    assert_eq!(lorraine.secondary_count, 1);

    let george = &graph.nodes[2];
    assert_eq!(
        george.emails,
        strings(&["george@hillvalley.edu", "biffsucks@hillvalley.edu"])
    );
    assert_eq!(george.phone_numbers, strings(&["919191", "717171"]));
    assert_eq!(george.position, Position { x: 100, y: 400 });

    let biff = &graph.nodes[4];
    assert!(!biff.is_primary);
    assert!(biff.phone_numbers.is_empty());
    assert_eq!(biff.position, Position { x: 500, y: 600 });

    let bare = &graph.nodes[5];
    assert!(bare.emails.is_empty() && bare.phone_numbers.is_empty());
    assert_eq!(bare.position, Position { x: 100, y: 900 });

    // The orphan (linked to 500) contributes nothing.
    assert_eq!(graph.edges.len(), 3);
    assert!(graph.nodes.iter().all(|n| n.id.as_str() != "99"));
}

#[test]
fn renders_fixture_dashboard() {
    let mut dashboard = Dashboard::new();
    dashboard.contacts_loaded(read_snapshot_file(&fixture()).unwrap());

    let view = dashboard.view();
    assert_eq!(view.totals.contacts, 7);
    assert_eq!(view.totals.primaries, 3);
    assert_eq!(view.totals.secondaries, 3);
    assert_eq!(view.totals.links, 3);

    let html = render_html_dashboard(&view).unwrap();
    assert!(html.contains("biffsucks@hillvalley.edu"));
    assert!(!html.contains("orphan@hillvalley.edu"));
}
