
use std::net::SocketAddr;

use axum::Router;
use serde_json::json;
use tokio::net::TcpListener;

use crate::directory::{
    group_records, placeholder_categories, DirectoryView, FetchError, LivePayload, LoadOutcome,
    RecordError, SkipReason, ViewStatus, UNCATEGORIZED,
};
use crate::output::{self, OutputFormat};

pub(crate) async fn spawn_app(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn section_names(view: &DirectoryView) -> Vec<String> {
    view.rendered().iter().map(|c| c.name.clone()).collect()
}

#[test]
fn grouping_drops_records_without_a_name() {
    let records = vec![
        json!({"fields": {"Company Name": "Acme", "Type": "Suppliers"}}),
        json!({"fields": {"Type": "Suppliers"}}),
    ];
    let grouped = group_records(&records, &placeholder_categories()).unwrap();
    assert_eq!(grouped.len(), 1);
    assert_eq!(grouped[0].name, "Suppliers");
    assert_eq!(grouped[0].companies, vec!["Acme".to_string()]);
    assert_eq!(
        grouped[0].description,
        "Trusted vendors providing quality components, materials and raw goods."
    );
}

#[test]
fn grouping_defaults_missing_type_to_uncategorized() {
    let records = vec![
        json!({"fields": {"Company Name": "Nobody Knows LLC"}}),
        json!({"fields": {"Company Name": "Blank Type Co", "Type": ""}}),
    ];
    let grouped = group_records(&records, &placeholder_categories()).unwrap();
    assert_eq!(grouped.len(), 1);
    assert_eq!(grouped[0].name, UNCATEGORIZED);
    assert_eq!(grouped[0].companies, vec!["Nobody Knows LLC", "Blank Type Co"]);
    assert_eq!(grouped[0].description, "");
}

#[test]
fn grouping_keeps_first_seen_order_and_duplicates() {
    let records = vec![
        json!({"fields": {"Company Name": "B1", "Type": "Retailers"}}),
        json!({"fields": {"Company Name": "A1", "Type": "Manufacturers"}}),
        json!({"fields": {"Company Name": "B1", "Type": "Retailers"}}),
        json!({"id": "rec1"}),
        json!({"fields": {"Company Name": "", "Type": "Retailers"}}),
    ];
    let grouped = group_records(&records, &placeholder_categories()).unwrap();
    let names: Vec<_> = grouped.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Retailers", "Manufacturers"]);
    assert_eq!(grouped[0].companies, vec!["B1", "B1"]);
}

#[test]
fn description_inheritance_is_case_sensitive() {
    let records = vec![json!({"fields": {"Company Name": "Acme", "Type": "suppliers"}})];
    let grouped = group_records(&records, &placeholder_categories()).unwrap();
    assert_eq!(grouped[0].name, "suppliers");
    assert_eq!(grouped[0].description, "");
}

#[test]
fn grouping_joins_multi_select_types() {
    let records = vec![json!({
        "fields": {"Company Name": "Dual", "Type": ["Suppliers", "Retailers"]}
    })];
    let grouped = group_records(&records, &[]).unwrap();
    assert_eq!(grouped[0].name, "Suppliers,Retailers");
}

#[test]
fn grouping_prints_whole_numbers_without_a_fraction() {
    let records = vec![
        json!({"fields": {"Company Name": 1.0, "Type": "Suppliers"}}),
        json!({"fields": {"Company Name": 2.5, "Type": ["Suppliers", 7.0]}}),
        json!({"fields": {"Company Name": 42, "Type": 0}}),
    ];
    let grouped = group_records(&records, &[]).unwrap();
    assert_eq!(grouped[0].name, "Suppliers");
    assert_eq!(grouped[0].companies, vec!["1"]);
    assert_eq!(grouped[1].name, "Suppliers,7");
    assert_eq!(grouped[1].companies, vec!["2.5"]);
    assert_eq!(grouped[2].name, UNCATEGORIZED);
    assert_eq!(grouped[2].companies, vec!["42"]);
}

#[test]
fn null_record_rejects_the_batch() {
    let records = vec![
        json!({"fields": {"Company Name": "Acme", "Type": "Suppliers"}}),
        json!(null),
    ];
    assert_eq!(
        group_records(&records, &placeholder_categories()),
        Err(RecordError::NullRecord { index: 1 })
    );
    // Non-object entries without fields are only dropped.
    let grouped = group_records(&[json!("stray"), json!(3), records[0].clone()], &[]).unwrap();
    assert_eq!(grouped.len(), 1);
}

#[test]
fn null_record_leaves_the_view_on_placeholder() {
    let mut view = DirectoryView::default();
    let outcome = view
        .apply_live(Ok(LivePayload::Records(vec![
            json!(null),
            json!({"fields": {"Company Name": "Acme", "Type": "Suppliers"}}),
        ])))
        .clone();
    match outcome {
        LoadOutcome::Failed { error } => assert!(error.contains("null"), "{error}"),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(view.status(), ViewStatus::Placeholder);
    assert_eq!(view.state().live(), placeholder_categories().as_slice());
}

#[test]
fn view_starts_on_placeholder_data() {
    let view = DirectoryView::default();
    assert_eq!(view.status(), ViewStatus::Placeholder);
    assert_eq!(view.last_load(), &LoadOutcome::NotAttempted);
    assert_eq!(view.rendered(), view.state().backup());
    assert_eq!(view.rendered().len(), 5);
}

#[test]
fn filter_omits_categories_that_empty_out() {
    let mut view = DirectoryView::default();
    view.filter("iron");
    assert_eq!(section_names(&view), vec!["Manufacturers"]);
    assert_eq!(view.rendered()[0].companies, vec!["U.S. Ironworks"]);

    view.filter("zzz-no-such-company");
    assert!(view.rendered().is_empty());
}

#[test]
fn filter_trims_and_ignores_case() {
    let mut view = DirectoryView::default();
    view.filter("  LIBERTY ");
    assert_eq!(section_names(&view), vec!["Suppliers", "Retailers"]);
    assert_eq!(view.rendered()[0].companies, vec!["Liberty Components"]);
    assert_eq!(view.rendered()[1].companies, vec!["Liberty Retail Group"]);
    assert_eq!(
        view.rendered()[1].description,
        "Stores and shops that stock American\u{2011}made products."
    );
}

#[test]
fn empty_filter_restores_backup_after_any_filters() {
    let mut view = DirectoryView::default();
    let backup = view.state().backup().to_vec();
    view.filter("star");
    view.filter("works");
    view.filter("   ");
    assert_eq!(view.rendered(), backup.as_slice());
    view.filter("");
    assert_eq!(view.rendered(), backup.as_slice());
    assert_eq!(view.state().backup(), backup.as_slice());
}

#[test]
fn filter_is_idempotent() {
    let mut view = DirectoryView::default();
    view.filter("co");
    let first = view.rendered().to_vec();
    view.filter("co");
    assert_eq!(view.rendered(), first.as_slice());
    assert!(!first.is_empty());
}

#[test]
fn live_payload_classifies_bodies() {
    assert_eq!(LivePayload::from_body(json!([])), LivePayload::Empty);
    assert_eq!(LivePayload::from_body(json!({"error": "x"})), LivePayload::NotAList);
    assert_eq!(LivePayload::from_body(json!(null)), LivePayload::NotAList);
    assert_eq!(
        LivePayload::from_body(json!([{"fields": {}}])),
        LivePayload::Records(vec![json!({"fields": {}})])
    );
}

#[test]
fn failed_load_keeps_placeholder_and_is_observable() {
    let mut view = DirectoryView::default();
    view.filter("iron");
    let before = view.rendered().to_vec();
    let outcome = view
        .apply_live(Err(FetchError::Status {
            url: "http://localhost/.netlify/functions/getCompanies".to_string(),
            status: 500,
        }))
        .clone();
    match outcome {
        LoadOutcome::Failed { error } => assert!(error.contains("500")),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(view.status(), ViewStatus::Placeholder);
    assert_eq!(view.rendered(), before.as_slice());
    assert_eq!(view.state().live(), placeholder_categories().as_slice());
}

#[test]
fn empty_or_non_list_payloads_are_skipped() {
    let mut view = DirectoryView::default();
    assert_eq!(
        view.apply_live(Ok(LivePayload::Empty)),
        &LoadOutcome::Skipped {
            reason: SkipReason::EmptyBody
        }
    );
    assert_eq!(view.status(), ViewStatus::Placeholder);

    let mut view = DirectoryView::default();
    assert_eq!(
        view.apply_live(Ok(LivePayload::NotAList)),
        &LoadOutcome::Skipped {
            reason: SkipReason::NotAList
        }
    );
    assert_eq!(view.status(), ViewStatus::Placeholder);
}

#[test]
fn live_records_replace_snapshot_and_backup_once() {
    let mut view = DirectoryView::default();
    view.filter("iron");
    let records = vec![
        json!({"fields": {"Company Name": "Acme Iron", "Type": "Manufacturers"}}),
        json!({"fields": {"Company Name": "Corner Shop", "Type": "Retailers"}}),
        json!({"fields": {"Company Name": "Loose Co"}}),
    ];
    let outcome = view.apply_live(Ok(LivePayload::Records(records))).clone();
    assert_eq!(
        outcome,
        LoadOutcome::Loaded {
            categories: 3,
            companies: 3
        }
    );
    assert_eq!(view.status(), ViewStatus::Live);
    assert_eq!(view.state().live(), view.state().backup());
    // Re-render after load is unfiltered.
    assert_eq!(
        section_names(&view),
        vec!["Manufacturers", "Retailers", UNCATEGORIZED]
    );

    view.filter("iron");
    assert_eq!(view.rendered().len(), 1);
    assert_eq!(view.rendered()[0].companies, vec!["Acme Iron"]);

    let again = view.apply_live(Ok(LivePayload::Records(vec![
        json!({"fields": {"Company Name": "Late Arrival", "Type": "Suppliers"}}),
    ])));
    assert_eq!(again, &outcome);
    assert_eq!(view.state().live().len(), 3);
}

#[test]
fn output_format_parsing_and_inference() {
    assert_eq!(OutputFormat::parse(" HTML "), Some(OutputFormat::Html));
    assert_eq!(OutputFormat::parse("txt"), Some(OutputFormat::Text));
    assert_eq!(OutputFormat::parse("xml"), None);
    assert_eq!(
        output::infer_format_from_path("out/Directory.JSON"),
        Some(OutputFormat::Json)
    );
    assert_eq!(output::infer_format_from_path("directory"), None);
}

#[test]
fn html_fragment_escapes_names() {
    let view = DirectoryView::new(vec![crate::directory::Category::new(
        "Tools & <Dies>",
        "\"quoted\"",
        &["O'Brien & Sons"],
    )]);
    let html = output::page::render_results_fragment(view.rendered());
    assert!(html.contains("<h2>Tools &amp; &lt;Dies&gt;</h2>"));
    assert!(html.contains("<p class=\"category-desc\">&quot;quoted&quot;</p>"));
    assert!(html.contains("<li>O&#39;Brien &amp; Sons</li>"));
    assert_eq!(html.matches("<section class=\"category-section\">").count(), 1);
}

#[test]
fn page_carries_search_input_and_results() {
    let mut view = DirectoryView::default();
    view.filter("star");
    let page = output::page::render_page(view.rendered(), "star<");
    assert!(page.contains("id=\"searchInput\""));
    assert!(page.contains("value=\"star&lt;\""));
    assert!(page.contains("<div id=\"results\">"));
    assert!(page.contains("North Star Contractors"));
    assert!(!page.contains("Patriot Supplies"));
}

#[test]
fn page_script_discards_stale_filter_responses() {
    let page = output::page::render_page(&[], "");
    assert!(page.contains("var seq = ++latest;"));
    assert!(page.contains("if (pending) pending.abort();"));
    assert!(page.contains("seq === latest) results.innerHTML = html"));
    // Exactly one write into the results container, and it is the guarded one.
    assert_eq!(page.matches("results.innerHTML =").count(), 1);
}

#[test]
fn text_output_lists_companies_under_categories() {
    let mut view = DirectoryView::default();
    view.filter("outlet");
    let text = String::from_utf8(output::render_text(view.rendered(), false)).unwrap();
    assert_eq!(
        text,
        "Retailers\nStores and shops that stock American\u{2011}made products.\n  - American Goods Outlet\n"
    );
}

#[test]
fn json_output_is_an_array_of_categories() {
    let view = DirectoryView::default();
    let value: serde_json::Value =
        serde_json::from_slice(&output::render_json(view.rendered())).unwrap();
    let arr = value.as_array().unwrap();
    assert_eq!(arr.len(), 5);
    assert_eq!(arr[0]["name"], "Suppliers");
    assert_eq!(arr[0]["companies"].as_array().unwrap().len(), 5);
}

#[test]
fn config_file_parses_partial_yaml() {
    let cfg = crate::config::parse_config("port: 9000\nno_color: true\n").unwrap();
    assert_eq!(cfg.port, Some(9000));
    assert_eq!(cfg.no_color, Some(true));
    assert!(cfg.bind.is_none());

    let defaults = crate::config::parse_config(&crate::config::default_config_yaml()).unwrap();
    assert_eq!(defaults.port, Some(8888));
    assert_eq!(defaults.bind.as_deref(), Some("127.0.0.1"));

    assert!(crate::config::parse_config("port: not-a-number\n").is_err());
}

#[test]
fn missing_config_file_is_allowed_only_when_asked() {
    let path = std::env::temp_dir().join("company-directory-no-such-config.yml");
    assert_eq!(
        crate::config::load_config(&path, true).unwrap(),
        crate::config::ConfigFile::default()
    );
    assert!(crate::config::load_config(&path, false).is_err());
}
