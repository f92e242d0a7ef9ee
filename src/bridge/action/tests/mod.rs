//! Tests for action signatures and direct-call compilation


use crate::bridge::action::{ActionDefinition, ActionId, ActionTable, ActionType};
use crate::bridge::engine::EngineKind;
use crate::bridge::error::BridgeError;

fn table() -> ActionTable {
    ActionTable::new()
        .with(ActionDefinition::new(
            0,
            "Random",
            ActionType::Int,
            [ActionType::Int],
        ))
        .with(
            ActionDefinition::new(
                1,
                "GetNearestObject",
                ActionType::Object,
                [ActionType::Int, ActionType::Object, ActionType::Int],
            )
            .with_min_params(0),
        )
        .with(ActionDefinition::new(
            2,
            "EffectHeal",
            ActionType::Engine(EngineKind::EFFECT),
            [ActionType::Int],
        ))
}

#[test]
fn test_table_lookup() {
    let table = table();
    assert_eq!(table.len(), 3);
    assert_eq!(table.get(ActionId(0)).map(|d| d.name.as_ref()), Ok("Random"));
    assert_eq!(
        table.get(ActionId(99)),
        Err(BridgeError::UnknownAction(ActionId(99)))
    );

    let ids: Vec<u32> = table.sorted().iter().map(|d| d.id.0).collect();
    assert_eq!(ids, [0, 1, 2]);
}

#[test]
fn test_arg_count_bounds() {
    let table = table();
    let nearest = table.get(ActionId(1)).unwrap();
    assert!(nearest.check_arg_count(0).is_ok());
    assert!(nearest.check_arg_count(3).is_ok());
    assert!(nearest.check_arg_count(4).is_err());

    let random = table.get(ActionId(0)).unwrap();
    assert!(random.check_arg_count(0).is_err());
}

#[test]
fn test_definition_display() {
    let table = table();
    assert_eq!(
        table.get(ActionId(1)).unwrap().to_string(),
        "object GetNearestObject([int], [object], [int])"
    );
    assert_eq!(
        table.get(ActionId(2)).unwrap().to_string(),
        "engine0 EffectHeal(int)"
    );
}

#[test]
fn test_type_widths() {
    assert_eq!(ActionType::Vector.width(), 3);
    assert_eq!(ActionType::Action.width(), 0);
    assert_eq!(ActionType::String.width(), 1);
    assert!(ActionType::Vector.operand_kind().is_none());
}
