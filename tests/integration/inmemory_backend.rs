#![allow(missing_docs)]

use velum::graph::{ExtendedDataRowId, ExtendedDataTable, Graph, HistoricalEventId};
use velum::inmemory::InMemoryGraph;
use velum::{
    Authorizations, Element, ElementInit, ElementMutation, ElementType, FetchHints, Result, User,
    Value, Visibility,
};

fn user(tokens: &[&str]) -> User {
    User::new("tester", Authorizations::new(tokens.iter().copied()))
}

fn row(element_id: &str, table: &str, row: &str) -> ExtendedDataRowId {
    ExtendedDataRowId::new(ElementType::Vertex, element_id, table, row)
}

#[test]
fn extended_data_rows_round_trip_with_authorization_filtering() -> Result<()> {
    let backend = InMemoryGraph::new();
    let row_id = row("v1", "reviews", "r1");

    backend.add_data(
        &row_id,
        "stars",
        "k1",
        Value::Int(5),
        100,
        &Visibility::empty(),
    )?;
    backend.add_data(
        &row_id,
        "comment",
        "k1",
        Value::String("great".into()),
        100,
        &Visibility::new("staff"),
    )?;

    let tables = backend.table_names(ElementType::Vertex, "v1", &FetchHints::all(), &user(&[]));
    assert_eq!(tables, vec!["reviews".to_owned()]);

    // A reader without the staff token sees only the public cell.
    let rows: Vec<_> = backend
        .extended_data(
            ElementType::Vertex,
            "v1",
            "reviews",
            &FetchHints::all(),
            &user(&[]),
        )
        .collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].properties.len(), 1);
    assert_eq!(rows[0].properties[0].name(), "stars");

    let rows: Vec<_> = backend
        .extended_data(
            ElementType::Vertex,
            "v1",
            "reviews",
            &FetchHints::all(),
            &user(&["staff"]),
        )
        .collect();
    assert_eq!(rows[0].properties.len(), 2);
    Ok(())
}

#[test]
fn add_data_replaces_the_same_cell_identity() -> Result<()> {
    let backend = InMemoryGraph::new();
    let row_id = row("v1", "reviews", "r1");

    backend.add_data(&row_id, "stars", "k1", Value::Int(3), 100, &Visibility::empty())?;
    backend.add_data(&row_id, "stars", "k1", Value::Int(5), 200, &Visibility::empty())?;

    let rows: Vec<_> = backend
        .table(
            ElementType::Vertex,
            "v1",
            "reviews",
            &FetchHints::all(),
            &user(&[]),
        )
        .collect();
    assert_eq!(rows[0].properties.len(), 1);
    assert_eq!(rows[0].properties[0].value(), &Value::Int(5));
    assert_eq!(rows[0].properties[0].timestamp(), 200);
    Ok(())
}

#[test]
fn remove_column_and_remove_row() -> Result<()> {
    let backend = InMemoryGraph::new();
    let row_id = row("v1", "reviews", "r1");

    backend.add_data(&row_id, "stars", "k1", Value::Int(5), 100, &Visibility::empty())?;
    backend.add_data(&row_id, "comment", "k1", Value::from("ok"), 100, &Visibility::empty())?;

    backend.remove_column(&row_id, "stars", "k1", &Visibility::empty())?;
    let rows: Vec<_> = backend
        .table(
            ElementType::Vertex,
            "v1",
            "reviews",
            &FetchHints::all(),
            &user(&[]),
        )
        .collect();
    assert_eq!(rows[0].properties.len(), 1);

    backend.remove(&row_id)?;
    assert!(backend
        .table_names(ElementType::Vertex, "v1", &FetchHints::all(), &user(&[]))
        .is_empty());
    Ok(())
}

#[test]
fn row_additional_visibilities_toggle() -> Result<()> {
    let backend = InMemoryGraph::new();
    let row_id = row("v1", "reviews", "r1");

    assert!(backend.add_additional_visibility(&row_id, "wsA").is_err());

    backend.add_data(&row_id, "stars", "k1", Value::Int(5), 100, &Visibility::empty())?;
    backend.add_additional_visibility(&row_id, "wsA")?;
    assert!(backend.row_additional_visibilities(&row_id).contains("wsA"));
    backend.delete_additional_visibility(&row_id, "wsA")?;
    assert!(backend.row_additional_visibilities(&row_id).is_empty());
    Ok(())
}

#[test]
fn historical_events_stream_through_the_element() -> Result<()> {
    let backend = InMemoryGraph::new();
    let caller = user(&["a"]);

    ElementMutation::new_vertex("v1", Visibility::empty())
        .timestamp(100)
        .save(&backend, &caller)?;
    ElementMutation::new_vertex("v2", Visibility::empty())
        .timestamp(110)
        .save(&backend, &caller)?;

    let element = Element::from_parts(ElementInit::vertex(
        "v1",
        Visibility::empty(),
        100,
        FetchHints::all(),
        caller.clone(),
    ))?;

    let mutation = element.prepare_mutation().add_additional_visibility("wsA");
    mutation.save(&backend, &caller)?;

    // Only v1's events come back, in log order.
    let events: Vec<_> = element
        .historical_events(&backend, None, &FetchHints::all(), &caller)
        .collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].description, "vertex created");
    assert_eq!(events[1].description, "element mutated");

    // The after cursor skips already-seen events.
    let after: HistoricalEventId = events[0].id;
    let tail: Vec<_> = element
        .historical_events(&backend, Some(&after), &FetchHints::all(), &caller)
        .collect();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].description, "element mutated");
    Ok(())
}

#[test]
fn element_extended_data_delegates_with_its_own_identity() -> Result<()> {
    let backend = InMemoryGraph::new();
    let caller = user(&[]);
    let row_id = row("v1", "reviews", "r1");
    backend.add_data(&row_id, "stars", "k1", Value::Int(5), 100, &Visibility::empty())?;

    let element = Element::from_parts(ElementInit::vertex(
        "v1",
        Visibility::empty(),
        100,
        FetchHints::all(),
        caller,
    ))?;
    let rows: Vec<_> = element
        .extended_data(&backend, "reviews", &FetchHints::all())
        .collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, row_id);
    Ok(())
}
