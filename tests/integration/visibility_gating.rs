#![allow(missing_docs)]

use velum::property::ID_PROPERTY_NAME;
use velum::{
    Authorizations, Element, ElementInit, FetchHints, GraphError, GraphObject, Property, Result,
    User, Value, Visibility,
};

fn user(tokens: &[&str]) -> User {
    User::new("tester", Authorizations::new(tokens.iter().copied()))
}

#[test]
fn anded_visibility_matches_each_component_token() {
    let combined = Visibility::and(["workspace-1", "", "secret"]);
    assert_eq!(combined.as_str(), "(workspace-1)&(secret)");
    assert!(combined.has_authorization("workspace-1"));
    assert!(combined.has_authorization("secret"));
    assert!(!combined.has_authorization("workspace"));

    let auths = Authorizations::new(["secret"]);
    assert!(auths.can_read(&combined));
    assert!(!Authorizations::new(["other"]).can_read(&combined));
}

#[test]
fn properties_read_fails_without_the_capability() -> Result<()> {
    let mut init = ElementInit::vertex(
        "v1",
        Visibility::empty(),
        100,
        FetchHints::none(),
        user(&["a"]),
    );
    init.properties = vec![Property::new(
        "k1",
        "age",
        30i64,
        Visibility::empty(),
        100,
    )?];
    let element = Element::from_parts(init)?;

    match element.properties() {
        Err(GraphError::MissingFetchHint { fetch_hints, hint }) => {
            assert_eq!(hint, "includeProperties");
            // The error carries the hints the element was loaded with.
            assert_eq!(fetch_hints, FetchHints::none());
        }
        Err(other) => panic!("expected MissingFetchHint, got {other:?}"),
        Ok(_) => panic!("expected MissingFetchHint, got Ok(..)"),
    }

    // Reserved names stay resolvable regardless of hints.
    assert_eq!(
        element.property_value_at(None, ID_PROPERTY_NAME, 0)?,
        Some(&Value::String("v1".into()))
    );
    Ok(())
}

#[test]
fn name_policy_admits_only_the_named_properties() -> Result<()> {
    let hints = FetchHints::builder()
        .property_names_to_include(["age"])
        .build();
    let mut init = ElementInit::vertex("v1", Visibility::empty(), 100, hints, user(&["a"]));
    init.properties = vec![Property::new(
        "k1",
        "age",
        30i64,
        Visibility::empty(),
        100,
    )?];
    let element = Element::from_parts(init)?;

    assert_eq!(
        element.property_value_at(Some("k1"), "age", 0)?,
        Some(&Value::Int(30))
    );
    assert!(matches!(
        element.property_value_at(Some("k1"), "salary", 0),
        Err(GraphError::MissingFetchHint { .. })
    ));
    Ok(())
}

#[test]
fn element_hiding_follows_token_membership() -> Result<()> {
    let mut init = ElementInit::vertex(
        "v1",
        Visibility::empty(),
        100,
        FetchHints::all(),
        user(&["a"]),
    );
    init.hidden_visibilities = vec![Visibility::new("ws1|ws2")];
    let element = Element::from_parts(init)?;

    assert!(element.is_hidden(&Authorizations::new(["ws1"])));
    assert!(element.is_hidden(&Authorizations::new(["ws2"])));
    assert!(!element.is_hidden(&Authorizations::new(["ws3"])));
    Ok(())
}

#[test]
fn property_cells_are_distinct_per_visibility() -> Result<()> {
    let mut element = Element::from_parts(ElementInit::vertex(
        "v1",
        Visibility::empty(),
        100,
        FetchHints::all(),
        user(&["a", "b"]),
    ))?;
    element.add_property_internal(Property::new(
        "k1",
        "status",
        "public".to_owned(),
        Visibility::new("a"),
        100,
    )?)?;
    element.add_property_internal(Property::new(
        "k1",
        "status",
        "private".to_owned(),
        Visibility::new("b"),
        100,
    )?)?;

    // Exact visibility match only; no hierarchy is consulted.
    let b = Visibility::new("b");
    let cell = element.property_with(Some("k1"), "status", Some(&b))?.unwrap();
    assert_eq!(cell.value(), &Value::String("private".into()));
    let c = Visibility::new("c");
    assert!(element.property_with(Some("k1"), "status", Some(&c))?.is_none());
    assert_eq!(element.properties()?.count(), 2);
    Ok(())
}

#[test]
fn metadata_reads_respect_the_key_policy() -> Result<()> {
    let hints = FetchHints::builder()
        .include_all_properties(true)
        .metadata_keys_to_include(["modifiedBy"])
        .build();
    let mut element = Element::from_parts(ElementInit::vertex(
        "v1",
        Visibility::empty(),
        100,
        hints,
        user(&["a"]),
    ))?;
    let mut metadata = velum::Metadata::new();
    metadata.add("modifiedBy", Visibility::empty(), "joe");
    metadata.add("source", Visibility::empty(), "import");
    element.add_property_internal(
        Property::new("k1", "age", 30i64, Visibility::empty(), 100)?.with_metadata(metadata),
    )?;

    assert_eq!(
        element.property_metadata("k1", "age", &Visibility::empty(), "modifiedBy")?,
        Some(&Value::String("joe".into()))
    );
    assert!(matches!(
        element.property_metadata("k1", "age", &Visibility::empty(), "source"),
        Err(GraphError::MissingFetchHint { .. })
    ));
    Ok(())
}
