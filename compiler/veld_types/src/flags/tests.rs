use super::*;

#[test]
fn flags_size() {
    assert_eq!(std::mem::size_of::<TypeFlags>(), 2);
}

#[test]
fn abstractness_accessors() {
    assert!(TypeFlags::ABSTRACT.is_abstract());
    assert!(!TypeFlags::IS_PRIMITIVE.is_abstract());
    assert!(TypeFlags::FORWARDED.is_forwarded());
    assert!(!TypeFlags::ABSTRACT.is_forwarded());
}

#[test]
fn propagate_from_works() {
    let child = TypeFlags::ABSTRACT | TypeFlags::IS_FIRST_CLASS;
    let propagated = TypeFlags::propagate_from(child);

    // ABSTRACT should propagate
    assert!(propagated.contains(TypeFlags::ABSTRACT));
    // Category bits should NOT propagate
    assert!(!propagated.contains(TypeFlags::IS_FIRST_CLASS));
}

#[test]
fn propagate_all_works() {
    let child1 = TypeFlags::ABSTRACT;
    let child2 = TypeFlags::IS_PRIMITIVE | TypeFlags::IS_FLOATING;

    let combined = TypeFlags::propagate_all([child1, child2]);

    assert!(combined.contains(TypeFlags::ABSTRACT));
    assert!(!combined.contains(TypeFlags::IS_PRIMITIVE));
    assert!(!combined.contains(TypeFlags::IS_FLOATING));
}

#[test]
fn param_attrs_describe() {
    assert_eq!(ParamAttrs::empty().describe(), "");
    assert_eq!(ParamAttrs::ZEXT.describe(), "zeroext");
    assert_eq!(
        (ParamAttrs::SEXT | ParamAttrs::STRUCT_RET).describe(),
        "signext sret"
    );
    assert_eq!(ParamAttrs::IN_REG.to_string(), "inreg");
}
