use tagflow_core::{
    check_unit, AnalysisUnit, ArithOp, CheckOptions, CompareOp, FlowKind, Issue, UseSite,
    Violation,
};
use tagflow_model::{
    span, DimensionUnit, ExprBuilder, IntDefMember, LiteralValue, NumericType, ResourceType, Slot,
    SlotId, TagKind, TagSet,
};

fn tags(list: &[TagKind]) -> TagSet {
    list.iter().cloned().collect()
}

fn res(ty: ResourceType) -> TagKind {
    TagKind::ResourceType(ty)
}

fn messages(unit: &AnalysisUnit) -> Vec<String> {
    check_unit(unit, &CheckOptions::default())
        .findings
        .into_iter()
        .map(|f| f.message)
        .collect()
}

#[test]
fn end_to_end_string_slot_fed_a_drawable() {
    let mut b = ExprBuilder::new();
    let icon = SlotId::field("R.drawable.icon");
    let x = b.slot_ref(icon.clone());
    let call = b.call("setLabels", vec![x.clone()], None);

    let unit = AnalysisUnit::new("Labels.java")
        .with_slot(Slot::new(
            SlotId::parameter("setLabels", 0),
            tags(&[res(ResourceType::String)]),
        ))
        .with_slot(Slot::new(icon, tags(&[res(ResourceType::Drawable)])))
        .with_site(UseSite::Call(call));

    let report = check_unit(&unit, &CheckOptions::default());
    assert_eq!(report.findings.len(), 1);
    let finding = &report.findings[0];
    assert_eq!(finding.span, x.span);
    assert_eq!(finding.issue, Issue::ResourceType);
    assert_eq!(
        finding.violation,
        Violation::ResourceTypeMismatch {
            expected: vec![ResourceType::String],
            actual: vec![ResourceType::Drawable],
        }
    );
    assert_eq!(finding.message, "Expected resource of type string");
}

#[test]
fn chain_propagation_reports_at_the_call_argument() {
    let mut b = ExprBuilder::new();
    let title = SlotId::field("R.string.title");
    let def = b.slot_ref(title.clone());
    let constant = b.chained("TITLE", def);
    let local = b.chained("label", constant);
    let call = b.call("setIcon", vec![local.clone()], None);

    let unit = AnalysisUnit::new("Chain.java")
        .with_slot(Slot::new(title, tags(&[res(ResourceType::String)])))
        .with_slot(Slot::new(
            SlotId::parameter("setIcon", 0),
            tags(&[res(ResourceType::Drawable)]),
        ))
        .with_site(UseSite::Call(call));

    let report = check_unit(&unit, &CheckOptions::default());
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].span, local.span);
    assert_eq!(report.findings[0].message, "Expected resource of type drawable");
}

fn branch_unit(first_bad: bool, second_bad: bool) -> (AnalysisUnit, Vec<tagflow_model::Span>) {
    let mut b = ExprBuilder::new();
    let good = SlotId::field("R.drawable.ok");
    let bad = SlotId::field("R.string.nope");
    let pick = |b: &mut ExprBuilder, is_bad: bool| {
        b.slot_ref(if is_bad { bad.clone() } else { good.clone() })
    };
    let b1 = pick(&mut b, first_bad);
    let b2 = pick(&mut b, second_bad);
    let spans = vec![b1.span, b2.span];
    let cond = b.conditional(vec![b1, b2]);
    let call = b.call("setIcon", vec![cond], None);
    let unit = AnalysisUnit::new("Branches.java")
        .with_slot(Slot::new(good, tags(&[res(ResourceType::Drawable)])))
        .with_slot(Slot::new(bad, tags(&[res(ResourceType::String)])))
        .with_slot(Slot::new(
            SlotId::parameter("setIcon", 0),
            tags(&[res(ResourceType::Drawable)]),
        ))
        .with_site(UseSite::Call(call));
    (unit, spans)
}

#[test]
fn one_bad_branch_yields_one_finding_at_that_branch() {
    let (unit, spans) = branch_unit(true, false);
    let report = check_unit(&unit, &CheckOptions::default());
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].span, spans[0]);
}

#[test]
fn two_bad_branches_yield_two_findings() {
    let (unit, spans) = branch_unit(true, true);
    let report = check_unit(&unit, &CheckOptions::default());
    let located: Vec<_> = report.findings.iter().map(|f| f.span).collect();
    assert_eq!(located, spans);
}

#[test]
fn local_defined_by_a_ternary_is_checked_per_branch() {
    let mut b = ExprBuilder::new();
    let bad = SlotId::field("R.string.nope");
    let ok = b.int(0);
    let wrong = b.slot_ref(bad.clone());
    let cond = b.conditional(vec![ok, wrong.clone()]);
    let local = b.chained("res", cond);
    let call = b.call("setIcon", vec![local], None);
    let unit = AnalysisUnit::new("Ternary.java")
        .with_slot(Slot::new(bad, tags(&[res(ResourceType::String)])))
        .with_slot(Slot::new(
            SlotId::parameter("setIcon", 0),
            tags(&[res(ResourceType::Drawable)]),
        ))
        .with_site(UseSite::Call(call));
    let report = check_unit(&unit, &CheckOptions::default());
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].span, wrong.span);
}

#[test]
fn sentinels_never_find_in_resource_slots() {
    for required in [res(ResourceType::Layout), TagKind::AnyRes, res(ResourceType::Styleable)] {
        for sentinel in [0, -1] {
            let mut b = ExprBuilder::new();
            let arg = b.int(sentinel);
            let call = b.call("inflate", vec![arg], None);
            let unit = AnalysisUnit::new("Sentinel.java")
                .with_slot(Slot::new(
                    SlotId::parameter("inflate", 0),
                    tags(&[required.clone()]),
                ))
                .with_site(UseSite::Call(call));
            assert!(messages(&unit).is_empty(), "{required:?} fed {sentinel}");
        }
    }
}

fn drawable_fed_color(options: &CheckOptions) -> Vec<String> {
    let mut b = ExprBuilder::new();
    let red = SlotId::field("R.color.red");
    let arg = b.slot_ref(red.clone());
    let call = b.call("setBackgroundResource", vec![arg], None);
    let unit = AnalysisUnit::new("Promote.java")
        .with_slot(Slot::new(red, tags(&[res(ResourceType::Color)])))
        .with_slot(Slot::new(
            SlotId::parameter("setBackgroundResource", 0),
            tags(&[res(ResourceType::Drawable)]),
        ))
        .with_site(UseSite::Call(call));
    check_unit(&unit, options)
        .findings
        .into_iter()
        .map(|f| f.message)
        .collect()
}

#[test]
fn color_promotes_into_drawable_slots_by_default() {
    assert!(drawable_fed_color(&CheckOptions::default()).is_empty());
}

#[test]
fn without_promotion_drawable_slots_reject_colors_generically() {
    let strict = CheckOptions {
        color_promotion: false,
        ..CheckOptions::default()
    };
    assert_eq!(
        drawable_fed_color(&strict),
        vec!["Expected resource of type drawable"]
    );
}

#[test]
fn color_slots_never_accept_drawables() {
    let mut b = ExprBuilder::new();
    let icon = SlotId::field("R.drawable.icon");
    let arg = b.slot_ref(icon.clone());
    let call = b.call("getColorStateList", vec![arg], None);
    let unit = AnalysisUnit::new("Reverse.java")
        .with_slot(Slot::new(icon, tags(&[res(ResourceType::Drawable)])))
        .with_slot(Slot::new(
            SlotId::parameter("getColorStateList", 0),
            tags(&[res(ResourceType::Color)]),
        ))
        .with_site(UseSite::Call(call));
    assert_eq!(messages(&unit), vec!["Expected resource of type color"]);
}

#[test]
fn color_and_resource_id_use_distinct_classes() {
    let mut b = ExprBuilder::new();
    let red_res = SlotId::field("R.color.red");
    let packed = SlotId::returns("getPackedColor");
    let id_arg = b.slot_ref(red_res.clone()).with_text("R.color.red");
    let set_color = b.call("setTextColor", vec![id_arg], None);
    let int_arg = b.call("getPackedColor", vec![], Some(packed.clone()));
    let set_res = b.call("setTextColorResource", vec![int_arg], None);

    let unit = AnalysisUnit::new("Colors.java")
        .with_slot(Slot::new(red_res, tags(&[res(ResourceType::Color)])))
        .with_slot(Slot::new(packed, tags(&[TagKind::ColorInt])))
        .with_slot(Slot::new(
            SlotId::parameter("setTextColor", 0),
            tags(&[TagKind::ColorInt]),
        ))
        .with_slot(Slot::new(
            SlotId::parameter("setTextColorResource", 0),
            tags(&[res(ResourceType::Color)]),
        ))
        .with_site(UseSite::Call(set_color))
        .with_site(UseSite::Call(set_res));

    let report = check_unit(&unit, &CheckOptions::default());
    let classes: Vec<_> = report.findings.iter().map(|f| f.violation.class()).collect();
    assert_eq!(classes, vec!["resource-id-as-color", "color-as-resource-id"]);
    assert_eq!(report.findings[0].issue, Issue::ResourceAsColor);
    assert_eq!(
        report.findings[0].message,
        "Should pass resolved color instead of resource id here: \
         `getResources().getColor(R.color.red)`"
    );
    assert_eq!(
        report.findings[1].message,
        "Expected a color resource id (`R.color.`) but received an RGB integer"
    );
}

fn unit_mismatch(expected: DimensionUnit, actual: DimensionUnit) -> Vec<String> {
    let mut b = ExprBuilder::new();
    let source = SlotId::returns("getSize");
    let arg = b.call("getSize", vec![], Some(source.clone()));
    let call = b.call("setSize", vec![arg], None);
    let unit = AnalysisUnit::new("Units.java")
        .with_slot(Slot::new(source, tags(&[TagKind::Dimension(actual)])))
        .with_slot(Slot::new(
            SlotId::parameter("setSize", 0),
            tags(&[TagKind::Dimension(expected)]),
        ))
        .with_site(UseSite::Call(call));
    messages(&unit)
}

#[test]
fn dp_slot_fed_sp_value() {
    assert_eq!(
        unit_mismatch(DimensionUnit::Dp, DimensionUnit::Sp),
        vec![
            "Mismatched @Dimension units here; expected density-independent (dp) integer \
             but received a scale-independent (sp) integer"
        ]
    );
}

#[test]
fn sp_slot_fed_dp_value() {
    assert_eq!(
        unit_mismatch(DimensionUnit::Sp, DimensionUnit::Dp),
        vec![
            "Mismatched @Dimension units here; expected a scale-independent (sp) integer \
             but received density-independent (dp) integer"
        ]
    );
}

#[test]
fn px_slot_fed_dp_value() {
    assert_eq!(
        unit_mismatch(DimensionUnit::Px, DimensionUnit::Dp),
        vec![
            "Mismatched @Dimension units here; expected a pixel integer \
             but received density-independent (dp) integer"
        ]
    );
    assert!(unit_mismatch(DimensionUnit::Px, DimensionUnit::Unknown).is_empty());
}

#[test]
fn int_def_lists_every_member() {
    let members = ["A", "B", "C"]
        .iter()
        .zip(1..)
        .map(|(name, value)| IntDefMember {
            name: (*name).to_string(),
            value: LiteralValue::Int(value),
        })
        .collect::<Vec<_>>();
    let mut b = ExprBuilder::new();
    let arg = b.int(9);
    let call = b.call("setMode", vec![arg], None);
    let unit = AnalysisUnit::new("Modes.java")
        .with_slot(Slot::new(
            SlotId::parameter("setMode", 0),
            tags(&[TagKind::IntDef {
                name: "Mode".into(),
                members,
                flag: false,
                open: false,
            }]),
        ))
        .with_site(UseSite::Call(call));
    let report = check_unit(&unit, &CheckOptions::default());
    assert_eq!(report.findings.len(), 1);
    let Violation::NotMember { members, .. } = &report.findings[0].violation else {
        panic!("unexpected {:?}", report.findings[0].violation);
    };
    assert_eq!(members, &["A", "B", "C"]);
    assert_eq!(report.findings[0].issue, Issue::WrongConstant);
}

fn comparison(op: CompareOp) -> Vec<String> {
    let mut b = ExprBuilder::new();
    let icon = SlotId::field("R.drawable.icon");
    let lhs = b.slot_ref(icon.clone());
    let rhs = b.int(0);
    let unit = AnalysisUnit::new("Compare.java")
        .with_slot(Slot::new(icon, tags(&[res(ResourceType::Drawable)])))
        .with_site(UseSite::Compare {
            op,
            lhs,
            rhs,
            span: span(200, 12),
        });
    messages(&unit)
}

#[test]
fn ordinal_comparisons_always_find() {
    for op in [CompareOp::Lt, CompareOp::Le, CompareOp::Gt, CompareOp::Ge] {
        assert_eq!(
            comparison(op),
            vec![
                "Comparing resource types (`@DrawableRes`) other than equality is dangerous \
                 and usually wrong;  some resource types set top bit which turns the value \
                 negative"
            ],
            "{op:?}"
        );
    }
}

#[test]
fn equality_comparisons_never_find() {
    assert!(comparison(CompareOp::Eq).is_empty());
    assert!(comparison(CompareOp::Ne).is_empty());
}

#[test]
fn half_float_widening_in_arithmetic_and_flows() {
    let mut b = ExprBuilder::new();
    let half = SlotId::returns("getHalf");
    let operand = b.call("getHalf", vec![], Some(half.clone()));
    let other = b.int(1);
    let flowed = b.call("getHalf", vec![], Some(half.clone()));
    let unit = AnalysisUnit::new("Half.java")
        .with_slot(Slot::new(half, tags(&[TagKind::HalfFloat])))
        .with_slot(
            Slot::new(SlotId::field("total"), TagSet::new()).with_value_type(NumericType::Int),
        )
        .with_site(UseSite::Arithmetic {
            op: ArithOp::Add,
            operands: vec![operand.clone(), other],
            result: NumericType::Int,
            span: span(300, 9),
        })
        .with_site(UseSite::Flow {
            expr: flowed.clone(),
            target: SlotId::field("total"),
            kind: FlowKind::Assignment,
        });
    let report = check_unit(&unit, &CheckOptions::default());
    let located: Vec<_> = report
        .findings
        .iter()
        .map(|f| (f.span, f.message.as_str()))
        .collect();
    assert_eq!(
        located,
        vec![
            (operand.span, "Half-float type in expression widened to int"),
            (flowed.span, "Half-float type in expression widened to int"),
        ]
    );
}

#[test]
fn styleable_assignment_is_exempt() {
    let mut b = ExprBuilder::new();
    let value = b.int(42);
    let target = SlotId::field("attrs");
    let unit = AnalysisUnit::new("Styleable.java")
        .with_slot(Slot::new(
            target.clone(),
            tags(&[res(ResourceType::Styleable)]),
        ))
        .with_site(UseSite::Flow {
            expr: value.clone(),
            target: target.clone(),
            kind: FlowKind::Assignment,
        })
        .with_site(UseSite::Flow {
            expr: value,
            target,
            kind: FlowKind::Argument,
        });
    assert_eq!(messages(&unit), vec!["Expected resource of type styleable"]);
}

#[test]
fn inherited_contracts_point_back_at_their_declaration() {
    let mut b = ExprBuilder::new();
    let arg = b.int(7);
    let call = b.call("Child.setIcon", vec![arg], None);
    let unit = AnalysisUnit::new("Inherit.java")
        .with_slot(
            Slot::new(
                SlotId::parameter("Child.setIcon", 0),
                tags(&[res(ResourceType::Drawable)]),
            )
            .declared_at(span(500, 20))
            .inherited(),
        )
        .with_site(UseSite::Call(call));
    let report = check_unit(&unit, &CheckOptions::default());
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].secondary, Some(span(500, 20)));
}

#[test]
fn one_hop_return_contracts_only() {
    let mut b = ExprBuilder::new();
    let annotated = SlotId::returns("getTitle");
    let direct = b.call("getTitle", vec![], Some(annotated.clone()));
    // A helper with no declared return contract is unconstrained, whatever its body does.
    let helper = b.call("wrapTitle", vec![], None);
    let c1 = b.call("setIcon", vec![direct.clone()], None);
    let c2 = b.call("setIcon", vec![helper], None);
    let unit = AnalysisUnit::new("Hops.java")
        .with_slot(Slot::new(annotated, tags(&[res(ResourceType::String)])))
        .with_slot(Slot::new(
            SlotId::parameter("setIcon", 0),
            tags(&[res(ResourceType::Drawable)]),
        ))
        .with_site(UseSite::Call(c1))
        .with_site(UseSite::Call(c2));
    let report = check_unit(&unit, &CheckOptions::default());
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].span, direct.span);
}
