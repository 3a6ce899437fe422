//! Random operation sequences must never leave the model index out of sync
//! with the graph model, whether individual operations succeed or fail.

use dynlang_core::{
    BoundDataPolicy, ChangeMode, DiagramState, ElementBounds, ElementId, Language, Operation,
    OperationContext, Point, TypeTag,
};
use proptest::prelude::*;
use serde_json::json;

fn language() -> Language {
    Language::from_json(json!({
        "id": "graph",
        "nodes": {
            "box": {
                "label": "Box",
                "visualTemplate": {
                    "type": "node",
                    "children": [
                        {"type": "label", "text": "${name}"},
                        {
                            "type": "iteration",
                            "iterable": "${ports}",
                            "iterand": "port",
                            "template": {"type": "label", "text": "${port}"}
                        }
                    ]
                },
                "defaultModel": {"name": "box_${autoincrement}", "ports": ["in", "out"]}
            }
        },
        "edges": {"wire": {"label": "Wire"}}
    }))
    .expect("language compiles")
}

/// An operation template; ids are picked from the live model when applied.
#[derive(Debug, Clone)]
enum Step {
    CreateNode(f64, f64),
    CreateUnknownNode,
    CreateEdge(usize, usize),
    CreateDanglingEdge(usize),
    Delete(Vec<usize>),
    DeleteMissing,
    Move(usize, f64, f64),
    Reconnect(usize, usize, usize),
    RenameLabel(usize, String),
    Merge(usize),
    CutPaste(Vec<usize>),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (0.0..500.0f64, 0.0..500.0f64).prop_map(|(x, y)| Step::CreateNode(x, y)),
        1 => Just(Step::CreateUnknownNode),
        3 => (any::<usize>(), any::<usize>()).prop_map(|(s, t)| Step::CreateEdge(s, t)),
        1 => any::<usize>().prop_map(Step::CreateDanglingEdge),
        2 => prop::collection::vec(any::<usize>(), 1..3).prop_map(Step::Delete),
        1 => Just(Step::DeleteMissing),
        1 => (any::<usize>(), 0.0..500.0f64, 0.0..500.0f64).prop_map(|(i, x, y)| Step::Move(i, x, y)),
        1 => (any::<usize>(), any::<usize>(), any::<usize>()).prop_map(|(e, s, t)| Step::Reconnect(e, s, t)),
        1 => (any::<usize>(), "[a-z]{1,8}").prop_map(|(i, s)| Step::RenameLabel(i, s)),
        1 => any::<usize>().prop_map(Step::Merge),
        1 => prop::collection::vec(any::<usize>(), 1..3).prop_map(Step::CutPaste),
    ]
}

fn pick<'a>(ids: &'a [ElementId], i: usize) -> Option<&'a ElementId> {
    if ids.is_empty() {
        None
    } else {
        ids.get(i % ids.len())
    }
}

fn to_operations(state: &DiagramState, step: &Step) -> Vec<Operation> {
    let nodes: Vec<ElementId> = state.model().nodes.keys().cloned().collect();
    let edges: Vec<ElementId> = state.model().edges.keys().cloned().collect();
    let all: Vec<ElementId> = nodes.iter().chain(edges.iter()).cloned().collect();
    let missing = ElementId::from("missing");

    match step {
        Step::CreateNode(x, y) => vec![Operation::CreateNode {
            element_type_id: TypeTag::from("box"),
            location: Some(Point::new(*x, *y)),
        }],
        Step::CreateUnknownNode => vec![Operation::CreateNode {
            element_type_id: TypeTag::from("ghost"),
            location: None,
        }],
        Step::CreateEdge(s, t) => match (pick(&nodes, *s), pick(&nodes, *t)) {
            (Some(s), Some(t)) => vec![Operation::CreateEdge {
                element_type_id: TypeTag::from("wire"),
                source_element_id: s.clone(),
                target_element_id: t.clone(),
            }],
            _ => vec![],
        },
        Step::CreateDanglingEdge(s) => vec![Operation::CreateEdge {
            element_type_id: TypeTag::from("wire"),
            source_element_id: pick(&nodes, *s).cloned().unwrap_or_else(|| missing.clone()),
            target_element_id: missing,
        }],
        Step::Delete(picks) => {
            let ids: Vec<ElementId> = picks.iter().filter_map(|i| pick(&all, *i).cloned()).collect();
            vec![Operation::DeleteElement { element_ids: ids }]
        }
        Step::DeleteMissing => vec![Operation::DeleteElement {
            element_ids: vec![missing],
        }],
        Step::Move(i, x, y) => pick(&nodes, *i)
            .map(|id| Operation::ChangeBounds {
                new_bounds: vec![ElementBounds {
                    element_id: id.clone(),
                    new_position: Some(Point::new(*x, *y)),
                    new_size: None,
                }],
            })
            .into_iter()
            .collect(),
        Step::Reconnect(e, s, t) => match (pick(&edges, *e), pick(&nodes, *s), pick(&nodes, *t)) {
            (Some(e), Some(s), Some(t)) => vec![Operation::ReconnectEdge {
                edge_element_id: e.clone(),
                source_element_id: s.clone(),
                target_element_id: t.clone(),
            }],
            _ => vec![],
        },
        Step::RenameLabel(i, text) => pick(&nodes, *i)
            .map(|id| Operation::ApplyLabelEdit {
                label_id: format!("{id}_child1_port0"),
                text: text.clone(),
            })
            .into_iter()
            .collect(),
        Step::Merge(i) => pick(&all, *i)
            .map(|id| Operation::ChangeBoundData {
                element_id: id.clone(),
                bound_data: json!({"touched": true}),
                mode: ChangeMode::Merge,
            })
            .into_iter()
            .collect(),
        Step::CutPaste(picks) => {
            let ids: Vec<ElementId> = picks.iter().filter_map(|i| pick(&all, *i).cloned()).collect();
            if ids.is_empty() {
                return vec![];
            }
            // the paste payload is filled in after the cut runs
            vec![Operation::Cut {
                selected_element_ids: ids,
            }]
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn index_stays_consistent(steps in prop::collection::vec(step(), 1..40)) {
        let language = language();
        let ctx = OperationContext { language: &language, policy: BoundDataPolicy::Permissive };
        let mut state = DiagramState::empty();

        for step in &steps {
            for op in to_operations(&state, step) {
                let before = state.model().clone();
                match op.apply(&mut state, ctx) {
                    Ok(outcome) => {
                        if let Some(clipboard) = outcome.clipboard {
                            let paste = Operation::Paste { clipboard, location: None };
                            prop_assert!(paste.apply(&mut state, ctx).is_ok());
                        }
                    }
                    Err(_) => prop_assert_eq!(state.model(), &before),
                }
                prop_assert!(state.check_consistency().is_ok(), "{:?}", state.check_consistency());

                let rendered = state.render(&language);
                prop_assert!(rendered.is_ok());
                prop_assert!(state.check_consistency().is_ok());
            }
        }

        // every rendered element walks up to a model element
        let rendered = state.render(&language).expect("renders");
        for root in &rendered.graph.children {
            let mut ok = true;
            root.walk(&mut |element, _| {
                let owner = state.index().nearest_element(&element.id);
                ok &= owner.as_ref().is_some_and(|id| state.lookup(id).is_some());
            });
            prop_assert!(ok, "orphan visual under {}", root.id);
        }
    }
}
