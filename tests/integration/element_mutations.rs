#![allow(missing_docs)]

use velum::{
    Authorizations, Element, ElementInit, ElementMutation, FetchHints, GraphError, GraphObject,
    Property, PropertyDeleteMutation, Result, User, Value, Visibility,
};
use velum::inmemory::InMemoryGraph;

fn user() -> User {
    User::new("tester", Authorizations::new(["a"]))
}

fn prop(key: &str, name: &str, value: i64, timestamp: i64) -> Property {
    Property::new(key, name, value, Visibility::empty(), timestamp).unwrap()
}

#[test]
fn save_new_vertex_then_load_and_read() -> Result<()> {
    let backend = InMemoryGraph::new();
    let user = user();

    let mutation = ElementMutation::new_vertex("v1", Visibility::new("a"))
        .add_property(prop("k1", "age", 30, 100))
        .add_property(prop("k2", "age", 10, 100))
        .timestamp(100);
    mutation.save(&backend, &user)?;

    let saved = backend.saved_mutations("v1");
    assert_eq!(saved.len(), 1);

    // A backend loads the element by replaying the persisted mutation.
    let mut init = ElementInit::vertex("v1", Visibility::new("a"), 100, FetchHints::all(), user);
    init.properties = saved[0].add_properties().to_vec();
    let element = Element::from_parts(init)?;
    assert_eq!(element.properties()?.count(), 2);
    assert_eq!(
        element.property_value_at(None, "age", 0)?,
        Some(&Value::Int(10))
    );
    Ok(())
}

#[test]
fn existing_element_save_then_local_reflection() -> Result<()> {
    let backend = InMemoryGraph::new();
    let user = user();

    let mut element = Element::from_parts(ElementInit::vertex(
        "v1",
        Visibility::empty(),
        100,
        FetchHints::all(),
        user.clone(),
    ))?;
    element.add_property_internal(prop("k1", "age", 30, 100))?;

    let mutation = element
        .prepare_mutation()
        .add_property(prop("k1", "name", 7, 200))
        .soft_delete_property("k1", "age", Visibility::empty(), 200);
    // Persist first; only then reflect locally. There is no rollback of the
    // local reflection if the durable call fails.
    mutation.save(&backend, &user)?;
    element.apply_mutation(&mutation)?;

    assert!(element.property("age")?.is_none());
    assert!(element.property("name")?.is_some());
    assert_eq!(element.property_soft_delete_mutations().len(), 1);
    assert_eq!(backend.saved_mutations("v1").len(), 1);
    Ok(())
}

#[test]
fn delete_then_add_within_one_mutation() -> Result<()> {
    let backend = InMemoryGraph::new();
    let user = user();

    let mut element = Element::from_parts(ElementInit::vertex(
        "v1",
        Visibility::empty(),
        100,
        FetchHints::all(),
        user.clone(),
    ))?;
    element.add_property_internal(prop("k1", "age", 30, 100))?;

    let mutation = element
        .prepare_mutation()
        .delete_property("k1", "age", Visibility::empty())
        .add_property(prop("k1", "age", 31, 200));
    mutation.save(&backend, &user)?;
    element.apply_mutation(&mutation)?;

    // Both facts hold: the new property is present and the delete is logged.
    assert_eq!(
        element.property_value_at(Some("k1"), "age", 0)?,
        Some(&Value::Int(31))
    );
    assert_eq!(
        element.property_delete_mutations(),
        vec![PropertyDeleteMutation::new(
            "k1",
            "age",
            Visibility::empty()
        )]
    );
    Ok(())
}

#[test]
fn applying_the_same_add_twice_is_idempotent_for_updatable_cells() -> Result<()> {
    let backend = InMemoryGraph::new();
    let user = user();

    let mut element = Element::from_parts(ElementInit::vertex(
        "v1",
        Visibility::empty(),
        100,
        FetchHints::all(),
        user.clone(),
    ))?;
    element.add_property_internal(prop("k1", "age", 30, 100).updatable())?;

    let mutation = element
        .prepare_mutation()
        .add_property(prop("k1", "age", 31, 200));
    mutation.save(&backend, &user)?;
    element.apply_mutation(&mutation)?;
    mutation.save(&backend, &user)?;
    element.apply_mutation(&mutation)?;

    let cells: Vec<&Property> = element
        .properties_with_key_and_name(Some("k1"), "age")?
        .collect();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].value(), &Value::Int(31));
    assert_eq!(cells[0].timestamp(), 200);
    assert_eq!(backend.saved_mutations("v1").len(), 2);
    Ok(())
}

#[test]
fn update_against_frozen_cell_is_rejected_not_coerced() -> Result<()> {
    let user = user();
    let mut element = Element::from_parts(ElementInit::vertex(
        "v1",
        Visibility::empty(),
        100,
        FetchHints::all(),
        user,
    ))?;
    element.add_property_internal(prop("k1", "age", 30, 100))?;

    let mutation = element
        .prepare_mutation()
        .add_property(prop("k1", "age", 31, 200));
    let err = element.apply_mutation(&mutation).unwrap_err();
    assert!(matches!(err, GraphError::InvalidMutation(_)));
    assert_eq!(
        element.property_value_at(Some("k1"), "age", 0)?,
        Some(&Value::Int(30))
    );
    Ok(())
}

#[test]
fn edge_mutation_dispatches_to_the_edge_save_path() -> Result<()> {
    let backend = InMemoryGraph::new();
    let user = user();

    ElementMutation::new_edge("e1", "knows", "v1", "v2", Visibility::empty())
        .timestamp(100)
        .save(&backend, &user)?;

    let saved = backend.saved_mutations("e1");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].kind().element_type().as_str(), "edge");
    Ok(())
}
