use proptest::{
    prelude::{any, prop, Just, Strategy},
    prop_oneof,
    test_runner::{Config, TestCaseError, TestRunner},
};
use tagflow_core::{compat, CheckOptions, FlowKind, Resolver};
use tagflow_model::{
    DimensionUnit, ExprBuilder, ResourceType, Slot, SlotId, SlotRegistry, TagKind, TagSet,
};

fn resource_type() -> impl Strategy<Value = ResourceType> {
    prop::sample::select(ResourceType::ALL.to_vec())
}

fn tag_kind() -> impl Strategy<Value = TagKind> {
    prop_oneof![
        resource_type().prop_map(TagKind::ResourceType),
        Just(TagKind::AnyRes),
        Just(TagKind::ColorInt),
        Just(TagKind::HalfFloat),
        prop::sample::select(vec![
            DimensionUnit::Px,
            DimensionUnit::Dp,
            DimensionUnit::Sp,
            DimensionUnit::Unknown,
        ])
        .prop_map(TagKind::Dimension),
        (-100i64..100, 0i64..100).prop_map(|(from, width)| TagKind::int_range(from, from + width)),
    ]
}

fn tag_set() -> impl Strategy<Value = TagSet> {
    prop::collection::vec(tag_kind(), 0..4).prop_map(|tags| tags.into_iter().collect())
}

fn runner() -> TestRunner {
    TestRunner::new(Config {
        cases: 256,
        ..Config::default()
    })
}

#[test]
fn slot_refs_propagate_their_contract_verbatim() {
    runner()
        .run(&tag_set(), |required| {
            let mut registry = SlotRegistry::new();
            let id = SlotId::field("CONTRACT");
            let accepted = registry.register_slot(Slot::new(id.clone(), required.clone()));

            let mut b = ExprBuilder::new();
            let expr = b.slot_ref(id.clone());
            let mut resolver = Resolver::new(&registry);
            let resolved = resolver.resolve_tags(&expr);

            let expected = registry.lookup(&id).cloned().unwrap_or_default();
            if resolved != expected {
                return Err(TestCaseError::fail(format!("{resolved:?} != {expected:?}")));
            }
            if accepted.is_ok() && resolved != required {
                return Err(TestCaseError::fail("registered contract was altered"));
            }
            Ok(())
        })
        .expect("propagation identity");
}

#[test]
fn unconstrained_values_are_never_rejected() {
    let strat = (tag_set(), any::<bool>(), 0u8..3);
    runner()
        .run(&strat, |(required, via_call, flow)| {
            let mut registry = SlotRegistry::new();
            let target = SlotId::parameter("consume", 0);
            let _ = registry.register_slot(Slot::new(target.clone(), required));

            let mut b = ExprBuilder::new();
            let expr = if via_call {
                b.call("helper", vec![], None)
            } else {
                b.slot_ref(SlotId::field("unannotated"))
            };
            let flow = match flow {
                0 => FlowKind::Argument,
                1 => FlowKind::Assignment,
                _ => FlowKind::Return,
            };

            let mut resolver = Resolver::new(&registry);
            let Some(slot) = registry.slot(&target) else {
                return Err(TestCaseError::fail("target slot missing"));
            };
            let rejections =
                compat::check_slot(&mut resolver, &expr, slot, flow, &CheckOptions::default());
            if !rejections.is_empty() {
                return Err(TestCaseError::fail(format!("{rejections:?}")));
            }
            Ok(())
        })
        .expect("optimism law");
}

#[test]
fn sentinels_pass_every_resource_slot() {
    let strat = (resource_type(), prop::sample::select(vec![0i64, -1]));
    runner()
        .run(&strat, |(ty, sentinel)| {
            let mut registry = SlotRegistry::new();
            let target = SlotId::parameter("consume", 0);
            registry
                .register_slot(Slot::new(
                    target.clone(),
                    [TagKind::ResourceType(ty)].into_iter().collect(),
                ))
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            let mut b = ExprBuilder::new();
            let expr = b.int(sentinel);
            let mut resolver = Resolver::new(&registry);
            let Some(slot) = registry.slot(&target) else {
                return Err(TestCaseError::fail("target slot missing"));
            };
            let rejections = compat::check_slot(
                &mut resolver,
                &expr,
                slot,
                FlowKind::Argument,
                &CheckOptions::default(),
            );
            if !rejections.is_empty() {
                return Err(TestCaseError::fail(format!("{ty:?} rejected {sentinel}")));
            }
            Ok(())
        })
        .expect("sentinel law");
}
