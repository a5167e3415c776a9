//! Integration tests: containers whose elements are entities of a declared
//! class, wired through the element adapter's class-reference arm.

use std::rc::Rc;

use attrix_core::{Host, ValidationError, Value};
use attrix_props::{IntProp, ItemType, ListProp, MapProp, Property, TextProp};
use attrix_host::{Entity, HostClass};

fn point_class() -> Rc<HostClass> {
    HostClass::builder("Point")
        .prop("x", IntProp::new("x coordinate"))
        .unwrap()
        .prop("y", IntProp::new("y coordinate"))
        .unwrap()
        .build()
}

fn point(class: &Rc<HostClass>, x: i64, y: i64) -> Value {
    let entity = Entity::new(Rc::clone(class)).unwrap();
    entity.set("x", x.into()).unwrap();
    entity.set("y", y.into()).unwrap();
    Value::Entity(entity.host_ref())
}

#[test]
fn test_class_reference_becomes_instance_validator() {
    let points = point_class();
    let prop = ListProp::new("points", HostClass::as_item(&points));
    assert_eq!(prop.item().info(), "an instance of Point");
}

#[test]
fn test_container_accepts_instances_of_the_class() {
    let points = point_class();
    let prop = ListProp::new("points", HostClass::as_item(&points));

    let value = prop
        .validate(None, Value::seq([point(&points, 1, 2), point(&points, 3, 4)]))
        .unwrap();
    assert_eq!(value.as_seq().unwrap().len(), 2);
}

#[test]
fn test_container_rejects_foreign_values() {
    let points = point_class();
    let prop = ListProp::new("points", HostClass::as_item(&points));

    let err = prop
        .validate(None, Value::seq([point(&points, 1, 2), 5.into()]))
        .unwrap_err();
    assert!(matches!(err, ValidationError::InvalidItem { index: 1, .. }));

    let other = HostClass::builder("Size")
        .prop("w", IntProp::new(""))
        .unwrap()
        .build();
    let stranger = Entity::new(other).unwrap();
    let err = prop
        .validate(None, Value::seq([Value::Entity(stranger.host_ref())]))
        .unwrap_err();
    assert!(matches!(err, ValidationError::InvalidItem { index: 0, .. }));
}

#[test]
fn test_entity_elements_serialize_and_reconstruct() {
    let points = point_class();
    let polygon_class = HostClass::builder("Polygon")
        .prop("label", TextProp::new(""))
        .unwrap()
        .prop("corners", ListProp::new("", HostClass::as_item(&points)))
        .unwrap()
        .build();

    let polygon = Entity::new(Rc::clone(&polygon_class)).unwrap();
    polygon.set("label", "triangle".into()).unwrap();
    polygon
        .set(
            "corners",
            Value::seq([
                point(&points, 0, 0),
                point(&points, 1, 0),
                point(&points, 0, 1),
            ]),
        )
        .unwrap();

    let plain = polygon.serialize(&Default::default()).unwrap();
    assert_eq!(plain["__class__"], serde_json::json!("Polygon"));
    assert_eq!(plain["corners"][1]["x"], serde_json::json!(1));

    let back = Entity::deserialize(polygon_class, &plain, &Default::default()).unwrap();
    let corners = back.get("corners").unwrap();
    let first = corners.as_seq().unwrap().get(0).unwrap();
    let first = first.as_entity().unwrap();
    assert_eq!(first.class_name(), "Point");
    assert_eq!(first.get("y"), Some(Value::Int(0)));

    // Reconstruction builds fresh entities; equality falls back to the
    // exported state, not object identity.
    let prop = back.class().property("corners").unwrap();
    assert!(prop.equal(&corners, &polygon.get("corners").unwrap()));
}

#[test]
fn test_entity_valued_mapping() {
    let points = point_class();
    let prop = MapProp::new("named points")
        .with_key(ItemType::prop(TextProp::new("")))
        .with_value(HostClass::as_item(&points));

    let value = prop
        .validate(None, Value::map([("origin".into(), point(&points, 0, 0))]))
        .unwrap();
    let plain = prop.serialize(&value, &Default::default()).unwrap();
    assert_eq!(plain["origin"]["x"], serde_json::json!(0));

    let err = prop
        .validate(None, Value::map([("origin".into(), 3.into())]))
        .unwrap_err();
    assert!(matches!(err, ValidationError::InvalidValue { .. }));
}

#[test]
fn test_generic_export_serializes_nested_entities() {
    let points = point_class();
    let value = Value::seq([point(&points, 2, 3)]);
    let json = ListProp::to_json(&value).unwrap();
    assert_eq!(json[0]["x"], serde_json::json!(2));
    assert_eq!(json[0]["__class__"], serde_json::json!("Point"));

    // Generic import cannot reconstruct element types: entities come back
    // as plain text-keyed mappings.
    let back = ListProp::from_json(&json).unwrap();
    let first = back.as_seq().unwrap().get(0).unwrap();
    assert!(first.as_map().is_some());
}
